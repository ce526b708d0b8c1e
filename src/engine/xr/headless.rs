//! Headless XR runtime.
//!
//! Plays a [`DeviceScript`] instead of talking to tracking hardware. Used by the CLI
//! demos and by every controller test; it keeps enough bookkeeping (request counts,
//! bound layer) to assert on the frame-loop contract.

use std::collections::VecDeque;

use glam::Vec3;
use tracing::debug;

use crate::engine::graphics::RenderingContext;
use crate::engine::xr::device_script::{DeviceScript, ScriptedFrame};
use crate::engine::xr::{
    BaseLayer, Feature, FrameRequestId, FramebufferHandle, HitTestResult, HitTestSource, Pose,
    ReferenceSpace, ReferenceSpaceKind, RigidTransform, SessionEvent, SessionInit, SessionMode,
    ViewerPose, XrFrame, XrSession, XrSystem, XrView,
};
use crate::engine::{EngineError, EngineResult};

/// Simulated device / runtime.
#[derive(Debug, Clone)]
pub struct HeadlessXr {
    supported_modes: Vec<SessionMode>,
    supported_features: Vec<Feature>,
    deny_permission: bool,
    script: DeviceScript,
}

impl HeadlessXr {
    /// A handheld AR device supporting every feature the demos use.
    pub fn new(script: DeviceScript) -> Self {
        Self {
            supported_modes: vec![SessionMode::Inline, SessionMode::ImmersiveAr],
            supported_features: vec![Feature::HitTest, Feature::DomOverlay],
            deny_permission: false,
            script,
        }
    }
}

#[cfg(test)]
impl HeadlessXr {
    pub fn with_modes(mut self, modes: &[SessionMode]) -> Self {
        self.supported_modes = modes.to_vec();
        self
    }

    pub fn with_features(mut self, features: &[Feature]) -> Self {
        self.supported_features = features.to_vec();
        self
    }

    /// Simulate the user declining the session prompt.
    pub fn denying_permission(mut self) -> Self {
        self.deny_permission = true;
        self
    }
}

impl XrSystem for HeadlessXr {
    type Session = HeadlessSession;

    fn is_session_supported(&self, mode: SessionMode) -> bool {
        self.supported_modes.contains(&mode)
    }

    fn request_session(&mut self, mode: SessionMode, init: &SessionInit) -> EngineResult<HeadlessSession> {
        if !self.is_session_supported(mode) {
            return Err(EngineError::SessionNotSupported(mode));
        }
        if let Some(f) = init
            .required_features
            .iter()
            .find(|f| !self.supported_features.contains(f))
        {
            return Err(EngineError::FeatureNotSupported(*f));
        }
        if self.deny_permission {
            return Err(EngineError::PermissionDenied(mode));
        }

        debug!(%mode, frames = self.script.frames.len(), "headless session granted");
        Ok(HeadlessSession::new(mode, init.clone(), self.script.clone()))
    }
}

#[derive(Debug)]
pub struct HeadlessSession {
    mode: SessionMode,
    init: SessionInit,
    frames: VecDeque<ScriptedFrame>,
    delivered: usize,
    pending: Option<FrameRequestId>,
    request_count: u64,
    select_pending: bool,
    ended: bool,
    end_delivered: bool,
    base_layer: Option<BaseLayer>,
    next_id: u32,
    hit_sources: Vec<HitTestSource>,
}

impl HeadlessSession {
    fn new(mode: SessionMode, init: SessionInit, script: DeviceScript) -> Self {
        let frames: VecDeque<ScriptedFrame> = script.frames.into();
        let select_pending = frames.front().is_some_and(|f| f.select_before);
        Self {
            mode,
            init,
            frames,
            delivered: 0,
            pending: None,
            request_count: 0,
            select_pending,
            ended: false,
            end_delivered: false,
            base_layer: None,
            next_id: 1,
            hit_sources: Vec::new(),
        }
    }

    /// Runtime-initiated end (user left AR from the system UI).
    pub fn end(&mut self) {
        if !self.ended {
            debug!(delivered = self.delivered, remaining = self.frames.len(), "session ending");
        }
        self.ended = true;
    }

    fn alloc_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[cfg(test)]
impl HeadlessSession {
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Total `request_animation_frame` calls so far.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    pub fn frames_delivered(&self) -> usize {
        self.delivered
    }

    pub fn has_pending_request(&self) -> bool {
        self.pending.is_some()
    }

    pub fn hit_test_sources(&self) -> &[HitTestSource] {
        &self.hit_sources
    }
}

impl XrSession for HeadlessSession {
    type Frame = HeadlessFrame;

    fn create_base_layer(&mut self, ctx: &RenderingContext) -> EngineResult<BaseLayer> {
        if self.ended {
            return Err(EngineError::SessionEnded);
        }
        if !ctx.xr_compatible {
            return Err(EngineError::render("rendering context is not XR compatible"));
        }
        let id = self.alloc_id();
        Ok(BaseLayer {
            framebuffer: FramebufferHandle(id),
            framebuffer_width: ctx.canvas.width,
            framebuffer_height: ctx.canvas.height,
        })
    }

    fn update_render_state(&mut self, layer: BaseLayer) {
        self.base_layer = Some(layer);
    }

    fn base_layer(&self) -> Option<BaseLayer> {
        self.base_layer
    }

    fn request_reference_space(&mut self, kind: ReferenceSpaceKind) -> EngineResult<ReferenceSpace> {
        if self.ended {
            return Err(EngineError::SessionEnded);
        }
        // Inline sessions only get the viewer space.
        if self.mode == SessionMode::Inline && kind != ReferenceSpaceKind::Viewer {
            return Err(EngineError::ReferenceSpaceUnavailable(kind));
        }
        let id = self.alloc_id();
        Ok(ReferenceSpace { id, kind })
    }

    fn request_hit_test_source(&mut self, space: &ReferenceSpace) -> EngineResult<HitTestSource> {
        if self.ended {
            return Err(EngineError::SessionEnded);
        }
        if !self.init.required_features.contains(&Feature::HitTest) {
            return Err(EngineError::FeatureNotSupported(Feature::HitTest));
        }
        let source = HitTestSource {
            id: self.alloc_id(),
            space: *space,
        };
        self.hit_sources.push(source);
        Ok(source)
    }

    fn request_animation_frame(&mut self) -> FrameRequestId {
        self.request_count += 1;
        let id = FrameRequestId(self.request_count);
        // A second request before the callback fires replaces the first.
        self.pending = Some(id);
        id
    }

    fn poll_event(&mut self) -> Option<SessionEvent> {
        if self.end_delivered {
            return None;
        }
        if !self.ended && self.select_pending {
            self.select_pending = false;
            return Some(SessionEvent::Select);
        }
        if self.frames.front().is_some_and(|f| f.end_before) {
            self.end();
        }
        if self.ended || self.frames.is_empty() {
            self.ended = true;
            self.end_delivered = true;
            return Some(SessionEvent::End);
        }
        None
    }

    fn next_frame(&mut self) -> Option<HeadlessFrame> {
        if self.ended {
            return None;
        }
        self.pending.take()?;
        let scripted = self.frames.pop_front()?;

        self.delivered += 1;
        self.select_pending = self.frames.front().is_some_and(|f| f.select_before);

        Some(HeadlessFrame::new(
            scripted,
            self.hit_sources.iter().map(|s| s.id).collect(),
        ))
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessFrame {
    time: f64,
    view: Option<XrView>,
    hits: Vec<Vec3>,
    sources: Vec<u32>,
}

impl HeadlessFrame {
    fn new(scripted: ScriptedFrame, sources: Vec<u32>) -> Self {
        let view = scripted.viewer.map(|v| XrView {
            eye: v.eye,
            transform: RigidTransform { matrix: v.transform },
            projection_matrix: v.projection,
        });
        Self {
            time: scripted.time_ms,
            view,
            hits: scripted.hits.into_iter().map(Vec3::from_array).collect(),
            sources,
        }
    }
}

impl XrFrame for HeadlessFrame {
    fn time(&self) -> f64 {
        self.time
    }

    fn viewer_pose(&self, space: &ReferenceSpace) -> Option<ViewerPose> {
        let view = self.view?;
        let transform = match space.kind {
            ReferenceSpaceKind::Local => view.transform,
            ReferenceSpaceKind::Viewer => RigidTransform::IDENTITY,
        };
        Some(ViewerPose {
            transform,
            views: vec![XrView { transform, ..view }],
        })
    }

    fn hit_test_results(&self, source: &HitTestSource) -> Vec<HitTestResult> {
        if !self.sources.contains(&source.id) {
            return Vec::new();
        }
        self.hits
            .iter()
            .map(|&p| HitTestResult {
                source: source.id,
                local: RigidTransform::from_position(p),
            })
            .collect()
    }

    fn hit_test_pose(&self, result: &HitTestResult, space: &ReferenceSpace) -> Option<Pose> {
        if !self.sources.contains(&result.source) {
            return None;
        }
        match space.kind {
            ReferenceSpaceKind::Local => Some(Pose {
                transform: result.local,
            }),
            ReferenceSpaceKind::Viewer => {
                let local_from_viewer = self.view?.transform.to_mat4();
                Some(Pose {
                    transform: RigidTransform::from_mat4(local_from_viewer.inverse() * result.local.to_mat4()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::Canvas;
    use crate::engine::xr::device_script::{OrbitParams, ScriptedView};

    fn script(n: u32) -> DeviceScript {
        DeviceScript::orbit(&OrbitParams {
            frames: n,
            tracking_lost_frames: 0,
            select_every: 0,
            ..OrbitParams::default()
        })
    }

    fn ctx() -> RenderingContext {
        RenderingContext::acquire(&Canvas::new(64, 32), true)
    }

    #[test]
    fn unsupported_mode_is_rejected() {
        let mut xr = HeadlessXr::new(script(1)).with_modes(&[SessionMode::Inline]);
        assert!(!xr.is_session_supported(SessionMode::ImmersiveAr));
        let err = xr
            .request_session(SessionMode::ImmersiveAr, &SessionInit::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionNotSupported(SessionMode::ImmersiveAr)));
    }

    #[test]
    fn missing_feature_is_rejected() {
        let mut xr = HeadlessXr::new(script(1)).with_features(&[Feature::HitTest]);
        let err = xr
            .request_session(SessionMode::ImmersiveAr, &SessionInit::hit_test_with_overlay())
            .unwrap_err();
        assert!(matches!(err, EngineError::FeatureNotSupported(Feature::DomOverlay)));
    }

    #[test]
    fn permission_denial_is_rejected() {
        let mut xr = HeadlessXr::new(script(1)).denying_permission();
        let err = xr
            .request_session(SessionMode::ImmersiveAr, &SessionInit::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::PermissionDenied(_)));
    }

    #[test]
    fn frames_require_a_pending_request() {
        let mut xr = HeadlessXr::new(script(3));
        let mut s = xr
            .request_session(SessionMode::ImmersiveAr, &SessionInit::default())
            .unwrap();

        assert!(s.next_frame().is_none());
        s.request_animation_frame();
        assert!(s.next_frame().is_some());
        assert!(s.next_frame().is_none());
        assert_eq!(s.frames_delivered(), 1);
    }

    #[test]
    fn end_is_delivered_once_after_script_runs_out() {
        let mut xr = HeadlessXr::new(script(1));
        let mut s = xr
            .request_session(SessionMode::ImmersiveAr, &SessionInit::default())
            .unwrap();
        s.request_animation_frame();
        assert!(s.poll_event().is_none());
        assert!(s.next_frame().is_some());

        assert_eq!(s.poll_event(), Some(SessionEvent::End));
        assert_eq!(s.poll_event(), None);
        s.request_animation_frame();
        assert!(s.next_frame().is_none());
    }

    #[test]
    fn flagged_frame_ends_the_session_instead() {
        let mut sc = script(3);
        sc.frames[1].end_before = true;
        let mut xr = HeadlessXr::new(sc);
        let mut s = xr
            .request_session(SessionMode::ImmersiveAr, &SessionInit::default())
            .unwrap();
        s.request_animation_frame();
        s.next_frame().unwrap();

        assert_eq!(s.poll_event(), Some(SessionEvent::End));
        s.request_animation_frame();
        assert!(s.next_frame().is_none());
        assert_eq!(s.frames_delivered(), 1);
    }

    #[test]
    fn select_is_delivered_before_its_frame() {
        let mut sc = script(3);
        sc.frames[1].select_before = true;
        let mut xr = HeadlessXr::new(sc);
        let mut s = xr
            .request_session(SessionMode::ImmersiveAr, &SessionInit::default())
            .unwrap();

        assert_eq!(s.poll_event(), None);
        s.request_animation_frame();
        s.next_frame().unwrap();
        assert_eq!(s.poll_event(), Some(SessionEvent::Select));
        assert_eq!(s.poll_event(), None);
    }

    #[test]
    fn hit_test_source_needs_the_feature() {
        let mut xr = HeadlessXr::new(script(1));
        let mut s = xr
            .request_session(SessionMode::ImmersiveAr, &SessionInit::default())
            .unwrap();
        let viewer = s.request_reference_space(ReferenceSpaceKind::Viewer).unwrap();
        assert!(matches!(
            s.request_hit_test_source(&viewer),
            Err(EngineError::FeatureNotSupported(Feature::HitTest))
        ));
    }

    #[test]
    fn inline_sessions_have_no_local_space() {
        let mut xr = HeadlessXr::new(script(1));
        let mut s = xr
            .request_session(SessionMode::Inline, &SessionInit::default())
            .unwrap();
        assert!(s.request_reference_space(ReferenceSpaceKind::Viewer).is_ok());
        assert!(matches!(
            s.request_reference_space(ReferenceSpaceKind::Local),
            Err(EngineError::ReferenceSpaceUnavailable(ReferenceSpaceKind::Local))
        ));
    }

    #[test]
    fn base_layer_requires_xr_compatible_context() {
        let mut xr = HeadlessXr::new(script(1));
        let mut s = xr
            .request_session(SessionMode::ImmersiveAr, &SessionInit::default())
            .unwrap();
        let plain = RenderingContext::acquire(&Canvas::new(8, 8), false);
        assert!(s.create_base_layer(&plain).is_err());

        let layer = s.create_base_layer(&ctx()).unwrap();
        assert_eq!((layer.framebuffer_width, layer.framebuffer_height), (64, 32));
    }

    #[test]
    fn hit_pose_resolves_in_local_and_viewer_space() {
        let eye = Vec3::new(0.0, 1.0, 0.0);
        let sc = DeviceScript {
            frames: vec![ScriptedFrame {
                time_ms: 0.0,
                viewer: Some(ScriptedView {
                    transform: RigidTransform::from_position(eye).matrix,
                    projection: RigidTransform::IDENTITY.matrix,
                    eye: crate::engine::xr::Eye::None,
                }),
                hits: vec![[0.0, 0.0, -2.0]],
                ..ScriptedFrame::default()
            }],
        };
        let mut xr = HeadlessXr::new(sc);
        let mut s = xr
            .request_session(SessionMode::ImmersiveAr, &SessionInit::hit_test_with_overlay())
            .unwrap();
        let local = s.request_reference_space(ReferenceSpaceKind::Local).unwrap();
        let viewer = s.request_reference_space(ReferenceSpaceKind::Viewer).unwrap();
        let source = s.request_hit_test_source(&viewer).unwrap();

        s.request_animation_frame();
        let frame = s.next_frame().unwrap();
        let results = frame.hit_test_results(&source);
        assert_eq!(results.len(), 1);

        let in_local = frame.hit_test_pose(&results[0], &local).unwrap();
        assert_eq!(in_local.transform.position(), Vec3::new(0.0, 0.0, -2.0));

        let in_viewer = frame.hit_test_pose(&results[0], &viewer).unwrap();
        assert_eq!(in_viewer.transform.position(), Vec3::new(0.0, -1.0, -2.0));
    }
}
