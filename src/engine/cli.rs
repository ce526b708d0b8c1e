//! Command-line interface for ar-garden.
//!
//! - `ar-garden run [--config demo.json] [overrides...]` drives a demo on the headless device
//! - `ar-garden script --out orbit.json` writes a procedural device script for replay

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::engine::EngineResult;
use crate::engine::config::DemoConfig;
use crate::engine::demos::Variant;
use crate::engine::xr::device_script::OrbitParams;

#[derive(Parser, Debug)]
#[command(name = "ar-garden", version, about = "Immersive-AR demos on a headless XR device")]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Run a demo session until the device script ends.
    Run(RunArgs),
    /// Emit a procedural orbit device script as JSON.
    Script(ScriptArgs),
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// JSON config file; flags below override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub variant: Option<Variant>,

    #[arg(long)]
    pub width: Option<u32>,

    #[arg(long)]
    pub height: Option<u32>,

    /// Replay this device script instead of generating an orbit.
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Length of the generated orbit.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Leading orbit frames without a viewer pose.
    #[arg(long)]
    pub tracking_lost_frames: Option<u32>,

    /// Select gesture every N orbit frames (0 = never).
    #[arg(long)]
    pub select_every: Option<u32>,

    /// Frame callbacks before the sunflower model is available.
    #[arg(long)]
    pub template_ready_frame: Option<u64>,

    /// Stop after this many frame callbacks.
    #[arg(long)]
    pub max_frames: Option<u64>,

    /// Write rendered frames as PNG into this directory.
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,

    #[arg(long)]
    pub snapshot_every: Option<u64>,

    /// Write the final scene graph as JSON.
    #[arg(long)]
    pub dump_scene: Option<PathBuf>,

    /// Log a scene summary whenever it changes.
    #[arg(long)]
    pub inspect: bool,
}

impl RunArgs {
    /// Config file (or defaults) with flags applied on top.
    pub fn resolve(&self) -> EngineResult<DemoConfig> {
        let mut cfg = match &self.config {
            Some(path) => DemoConfig::load(path)?,
            None => DemoConfig::default(),
        };

        if let Some(v) = self.variant {
            cfg.variant = v;
        }
        if let Some(w) = self.width {
            cfg.canvas.width = w;
        }
        if let Some(h) = self.height {
            cfg.canvas.height = h;
        }
        if let Some(p) = &self.script {
            cfg.device.script = Some(p.clone());
        }
        if let Some(n) = self.frames {
            cfg.device.orbit.frames = n;
        }
        if let Some(n) = self.tracking_lost_frames {
            cfg.device.orbit.tracking_lost_frames = n;
        }
        if let Some(n) = self.select_every {
            cfg.device.orbit.select_every = n;
        }
        if let Some(n) = self.template_ready_frame {
            cfg.template_ready_frame = n;
        }
        if self.max_frames.is_some() {
            cfg.max_frames = self.max_frames;
        }
        if let Some(d) = &self.snapshot_dir {
            cfg.snapshot.dir = Some(d.clone());
        }
        if let Some(n) = self.snapshot_every {
            cfg.snapshot.every = n;
        }
        if let Some(p) = &self.dump_scene {
            cfg.dump_scene = Some(p.clone());
        }
        cfg.inspect |= self.inspect;

        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Args, Debug)]
pub struct ScriptArgs {
    /// Output path; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long, default_value_t = 300)]
    pub frames: u32,

    #[arg(long, default_value_t = 10)]
    pub tracking_lost_frames: u32,

    #[arg(long, default_value_t = 90)]
    pub select_every: u32,

    #[arg(long, default_value_t = 1.5)]
    pub radius: f32,

    #[arg(long, default_value_t = -1.2, allow_negative_numbers = true)]
    pub floor_y: f32,
}

impl ScriptArgs {
    pub fn orbit_params(&self) -> OrbitParams {
        OrbitParams {
            frames: self.frames,
            tracking_lost_frames: self.tracking_lost_frames,
            select_every: self.select_every,
            radius: self.radius,
            floor_y: self.floor_y,
            ..OrbitParams::default()
        }
    }
}
