//! Drives one immersive-ar session from acquisition through per-frame rendering.
//!
//! The controller never schedules frames itself. `on_frame` reports
//! [`FrameControl::Continue`] and the driver (`AnimationLoop`) turns that into exactly
//! one `request_animation_frame`, so the loop stays alive whether or not a frame
//! had a pose or rendered successfully.

use std::cell::OnceCell;
use std::rc::Rc;

use tracing::{debug, info, trace, warn};

use crate::engine::camera::XrCamera;
use crate::engine::demos::{self, Variant};
use crate::engine::graphics::{Canvas, RenderingContext, SceneRenderer};
use crate::engine::marker::{Marker, MarkerAdapter};
use crate::engine::scene::{NodeId, NodeTemplate, Scene};
use crate::engine::xr::{
    HitTestSource, ReferenceSpace, ReferenceSpaceKind, SessionMode, XrFrame, XrSession, XrSystem,
};
use crate::engine::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Starting,
    Active,
}

/// What the frame callback asks of its driver.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    /// Schedule exactly one more frame.
    Continue,
}

/// Model template shared with whoever loads it. Written once, read afterwards.
pub type TemplateSlot = Rc<OnceCell<NodeTemplate>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub rendered: u64,
    pub render_errors: u64,
    pub skipped_no_pose: u64,
    pub hit_frames: u64,
    pub placed: u64,
    pub ignored_selects: u64,
    pub last_frame_tracked: bool,
}

pub struct SessionController<S: XrSession, R: SceneRenderer> {
    variant: Variant,
    state: ControllerState,
    canvas: Canvas,
    renderer: R,
    scene: Scene,
    camera: XrCamera,
    marker: Option<Marker>,
    template: TemplateSlot,
    session: Option<S>,
    local_space: Option<ReferenceSpace>,
    hit_test_source: Option<HitTestSource>,
    select_handler: bool,
    stats: FrameStats,
}

impl<S: XrSession, R: SceneRenderer> SessionController<S, R> {
    pub fn new(variant: Variant, canvas: Canvas, renderer: R) -> Self {
        Self {
            variant,
            state: ControllerState::Idle,
            canvas,
            renderer,
            scene: Scene::new(),
            camera: XrCamera::new(),
            marker: None,
            template: Rc::new(OnceCell::new()),
            session: None,
            local_space: None,
            hit_test_source: None,
            select_handler: false,
            stats: FrameStats::default(),
        }
    }

    /// Acquire the context, build the scene, open the session and schedule the first frame.
    ///
    /// Any rejection in the chain is returned as-is; the controller is left in
    /// `Starting` and is not meant to be retried.
    pub fn start<X>(&mut self, xr: &mut X) -> EngineResult<()>
    where
        X: XrSystem<Session = S>,
    {
        if self.state != ControllerState::Idle {
            return Err(EngineError::InvalidState {
                actual: self.state,
                expected: ControllerState::Idle,
            });
        }
        self.state = ControllerState::Starting;

        let context = RenderingContext::acquire(&self.canvas, true);
        self.renderer.attach(&context);

        let demo = demos::build(self.variant);
        self.scene = demo.scene;
        self.marker = demo.marker;
        self.camera = XrCamera::new();

        let mut session = xr.request_session(SessionMode::ImmersiveAr, &self.variant.session_init())?;
        let layer = session.create_base_layer(&context)?;
        session.update_render_state(layer);

        let local = session.request_reference_space(ReferenceSpaceKind::Local)?;
        self.local_space = Some(local);

        if self.variant.uses_hit_test() {
            let viewer = session.request_reference_space(ReferenceSpaceKind::Viewer)?;
            self.hit_test_source = Some(session.request_hit_test_source(&viewer)?);
            self.select_handler = true;
        }

        session.request_animation_frame();
        self.session = Some(session);
        self.state = ControllerState::Active;

        info!(
            variant = %self.variant,
            width = self.canvas.width,
            height = self.canvas.height,
            nodes = self.scene.len(),
            "AR session started"
        );
        Ok(())
    }

    /// Per-frame callback. Always asks for the next frame.
    pub fn on_frame(&mut self, time: f64, frame: &S::Frame) -> FrameControl {
        self.stats.frames += 1;

        let Some(session) = self.session.as_ref() else {
            warn!(time, "frame delivered without a session");
            return FrameControl::Continue;
        };
        let layer = session.base_layer();
        if let Some(layer) = layer {
            self.renderer.bind_framebuffer(layer.framebuffer);
        }

        let Some(local) = self.local_space else {
            return FrameControl::Continue;
        };

        let pose = frame.viewer_pose(&local);
        let Some(view) = pose.as_ref().and_then(|p| p.views.first()) else {
            self.stats.skipped_no_pose += 1;
            self.stats.last_frame_tracked = false;
            trace!(time, "no viewer pose, skipping frame");
            return FrameControl::Continue;
        };
        self.stats.last_frame_tracked = true;

        if let Some(layer) = layer {
            let viewport = layer.viewport(view);
            self.renderer.set_size(viewport.width, viewport.height);
        }

        self.camera.copy_from_view(view);
        self.camera.update_matrix_world(true);

        if let (Some(source), Some(marker)) = (self.hit_test_source.as_ref(), self.marker.as_mut()) {
            // No hit leaves the marker exactly where and how it was.
            let hit = frame
                .hit_test_results(source)
                .first()
                .and_then(|r| frame.hit_test_pose(r, &local));
            if let Some(hit) = hit {
                marker.place(hit.transform.position());
                MarkerAdapter::apply(marker, &mut self.scene);
                self.stats.hit_frames += 1;
            }
        }

        match self.renderer.render(&mut self.scene, &self.camera) {
            Ok(()) => self.stats.rendered += 1,
            Err(e) => {
                self.stats.render_errors += 1;
                warn!(time, error = %e, "render failed");
            }
        }

        FrameControl::Continue
    }

    /// Select gesture. Plants a copy of the template at the marker, if both exist.
    pub fn on_select(&mut self) -> Option<NodeId> {
        if !self.select_handler {
            return None;
        }
        let Some(template) = self.template.get() else {
            self.stats.ignored_selects += 1;
            debug!("select before the model finished loading");
            return None;
        };
        let marker = self.marker?;

        // Placed at the marker even if it has never been shown.
        let id = self.scene.instantiate(template, marker.position);
        self.stats.placed += 1;
        info!(
            x = marker.position.x,
            y = marker.position.y,
            z = marker.position.z,
            placed = self.stats.placed,
            "model placed"
        );
        Some(id)
    }

    /// Late completion of the model load. Only the first call has any effect.
    pub fn install_template(&self, template: NodeTemplate) -> bool {
        let installed = self.template.set(template).is_ok();
        if installed {
            info!("model template ready");
        }
        installed
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn session_mut(&mut self) -> Option<&mut S> {
        self.session.as_mut()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

#[cfg(test)]
impl<S: XrSession, R: SceneRenderer> SessionController<S, R> {
    pub fn template_slot(&self) -> TemplateSlot {
        Rc::clone(&self.template)
    }

    pub fn camera(&self) -> &XrCamera {
        &self.camera
    }

    pub fn session(&self) -> Option<&S> {
        self.session.as_ref()
    }

    pub fn hit_test_source(&self) -> Option<&HitTestSource> {
        self.hit_test_source.as_ref()
    }
}
