mod engine;
mod utils;

use anyhow::Context as _;
use clap::Parser;
use tracing::{debug, info, warn};

use engine::animation_loop::AnimationLoop;
use engine::app::ArApp;
use engine::cli::{Cli, CliCommand, RunArgs, ScriptArgs};
use engine::demos::sunflower::sunflower_template;
use engine::graphics::{FrameSnapshots, SoftwareRenderer};
use engine::rendering_inspector::RenderingInspector;
use engine::scene::scene_codec::SceneCodec;
use engine::xr::device_script::DeviceScript;
use engine::xr::headless::HeadlessXr;

fn main() -> anyhow::Result<()> {
    utils::logger::init();

    let cli = Cli::parse();
    match cli.command {
        CliCommand::Run(args) => cmd_run(args),
        CliCommand::Script(args) => cmd_script(args),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let cfg = args.resolve().context("resolve run configuration")?;
    let script = cfg.device_script().context("load device script")?;

    let mut app = ArApp::new(HeadlessXr::new(script), cfg.variant, cfg.canvas(), SoftwareRenderer::new);
    if !app.bootstrap() {
        warn!("device cannot run immersive-ar; nothing to do");
        return Ok(());
    }
    app.click().context("enter AR")?;
    debug!(button_visible = app.button().visible, "entered AR");

    let controller = app.active_mut().context("no active session after entering AR")?;

    let snapshots = cfg
        .snapshot
        .dir
        .as_ref()
        .map(|dir| FrameSnapshots::new(dir, cfg.snapshot.every))
        .transpose()
        .context("prepare snapshot directory")?;

    let mut driver = AnimationLoop::new(controller)
        .with_frame_limit(cfg.max_frames)
        .with_snapshots(snapshots);
    if cfg.variant.uses_hit_test() {
        driver = driver.with_deferred_template(cfg.template_ready_frame, sunflower_template());
    }
    if cfg.inspect {
        driver = driver.with_inspector(RenderingInspector::new());
    }

    let exit = driver.run().context("frame loop")?;
    let frames = driver.frames();
    let (written, failed) = driver.snapshots().map(|s| (s.written(), s.failed())).unwrap_or((0, 0));

    if let Some(controller) = app.active() {
        let stats = controller.stats();
        info!(
            ?exit,
            frames,
            rendered = stats.rendered,
            render_errors = stats.render_errors,
            skipped_no_pose = stats.skipped_no_pose,
            placed = stats.placed,
            snapshots = written,
            snapshot_failures = failed,
            "run finished"
        );

        if let Some(path) = &cfg.dump_scene {
            SceneCodec::write(controller.scene(), path)
                .with_context(|| format!("write scene dump '{}'", path.display()))?;
            info!(path = %path.display(), "scene dumped");
        }
    }

    app.discard_session();
    Ok(())
}

fn cmd_script(args: ScriptArgs) -> anyhow::Result<()> {
    let script = DeviceScript::orbit(&args.orbit_params());
    match &args.out {
        Some(path) => {
            script
                .save(path)
                .with_context(|| format!("write device script '{}'", path.display()))?;
            info!(path = %path.display(), frames = script.frames.len(), "device script written");
        }
        None => println!("{}", serde_json::to_string_pretty(&script)?),
    }
    Ok(())
}
