use tracing::{debug, info, warn};

use crate::engine::graphics::{FrameSnapshots, SceneRenderer};
use crate::engine::rendering_inspector::RenderingInspector;
use crate::engine::scene::NodeTemplate;
use crate::engine::session_controller::{ControllerState, FrameControl, SessionController};
use crate::engine::xr::{SessionEvent, XrFrame, XrSession};
use crate::engine::{EngineError, EngineResult};

/// Why [`AnimationLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The runtime ended the session.
    SessionEnded,
    /// The configured frame budget ran out.
    FrameLimit,
    /// Nobody asked for another frame.
    NoPendingFrame,
}

/// Pumps session events and frames into a started controller.
///
/// Per iteration: deliver queued events (select between frames, end stops the loop),
/// take the next frame, run the callback, and turn its `Continue` into exactly one
/// `request_animation_frame`.
pub struct AnimationLoop<'a, S: XrSession, R: SceneRenderer> {
    controller: &'a mut SessionController<S, R>,
    frame_limit: Option<u64>,
    deferred_template: Option<(u64, NodeTemplate)>,
    snapshots: Option<FrameSnapshots>,
    inspector: Option<RenderingInspector>,
    frames: u64,
}

impl<'a, S: XrSession, R: SceneRenderer> AnimationLoop<'a, S, R> {
    pub fn new(controller: &'a mut SessionController<S, R>) -> Self {
        Self {
            controller,
            frame_limit: None,
            deferred_template: None,
            snapshots: None,
            inspector: None,
            frames: 0,
        }
    }

    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    /// Hand `template` to the controller once `frame` callbacks have run.
    pub fn with_deferred_template(mut self, frame: u64, template: NodeTemplate) -> Self {
        self.deferred_template = Some((frame, template));
        self
    }

    pub fn with_snapshots(mut self, snapshots: Option<FrameSnapshots>) -> Self {
        self.snapshots = snapshots;
        self
    }

    pub fn with_inspector(mut self, inspector: RenderingInspector) -> Self {
        self.inspector = Some(inspector);
        self
    }

    /// Frame callbacks run so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn snapshots(&self) -> Option<&FrameSnapshots> {
        self.snapshots.as_ref()
    }

    pub fn run(&mut self) -> EngineResult<LoopExit> {
        let state = self.controller.state();
        if state != ControllerState::Active {
            return Err(EngineError::InvalidState {
                actual: state,
                expected: ControllerState::Active,
            });
        }

        loop {
            while let Some(event) = self.session()?.poll_event() {
                match event {
                    SessionEvent::Select => {
                        self.controller.on_select();
                    }
                    SessionEvent::End => {
                        info!(frames = self.frames, "session ended");
                        return Ok(LoopExit::SessionEnded);
                    }
                }
            }

            if self.frame_limit.is_some_and(|limit| self.frames >= limit) {
                info!(frames = self.frames, "frame limit reached");
                return Ok(LoopExit::FrameLimit);
            }

            let Some(frame) = self.session()?.next_frame() else {
                debug!(frames = self.frames, "no frame pending");
                return Ok(LoopExit::NoPendingFrame);
            };

            let rendered_before = self.controller.stats().rendered;
            match self.controller.on_frame(frame.time(), &frame) {
                FrameControl::Continue => {
                    self.session()?.request_animation_frame();
                }
            }
            let index = self.frames;
            self.frames += 1;

            self.after_frame(index, rendered_before);
        }
    }

    fn session(&mut self) -> EngineResult<&mut S> {
        self.controller.session_mut().ok_or(EngineError::SessionEnded)
    }

    fn after_frame(&mut self, index: u64, rendered_before: u64) {
        if self.deferred_template.as_ref().is_some_and(|(at, _)| self.frames >= *at) {
            if let Some((_, template)) = self.deferred_template.take() {
                self.controller.install_template(template);
            }
        }

        if self.controller.stats().rendered > rendered_before {
            if let (Some(snaps), Some(image)) = (self.snapshots.as_mut(), self.controller.renderer().frame_image()) {
                // A lost snapshot never stops the loop.
                if let Err(e) = snaps.maybe_capture(index, image) {
                    warn!(frame = index, failed = snaps.failed(), error = %e, "snapshot write failed");
                }
            }
        }

        if let Some(inspector) = self.inspector.as_mut() {
            inspector.observe("frame", self.controller.scene(), self.controller.stats(), self.controller.marker());
        }
    }
}
