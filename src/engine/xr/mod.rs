//! Seam between the session controller and an XR device runtime.
//!
//! The traits mirror the shape of a browser XR API (system -> session -> frame) so a
//! real runtime binding and the headless simulator can sit behind the same controller.
//! Matrices cross this boundary as column-major `[f32; 16]`, unmodified.

pub mod device_script;
pub mod headless;

use std::fmt;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::engine::EngineResult;
use crate::engine::graphics::RenderingContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionMode {
    Inline,
    ImmersiveVr,
    ImmersiveAr,
}

impl SessionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionMode::Inline => "inline",
            SessionMode::ImmersiveVr => "immersive-vr",
            SessionMode::ImmersiveAr => "immersive-ar",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    HitTest,
    DomOverlay,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::HitTest => "hit-test",
            Feature::DomOverlay => "dom-overlay",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Element the platform composites on top of the camera feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayRoot {
    Body,
}

/// Options passed along with a session request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInit {
    pub required_features: Vec<Feature>,
    pub dom_overlay: Option<OverlayRoot>,
}

impl SessionInit {
    /// Hit-testing plus an on-page overlay rooted at the document body.
    pub fn hit_test_with_overlay() -> Self {
        Self {
            required_features: vec![Feature::HitTest, Feature::DomOverlay],
            dom_overlay: Some(OverlayRoot::Body),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSpaceKind {
    /// Device-relative; origin tracks the viewer.
    Viewer,
    /// World-stable; origin near the viewer's position at session start.
    Local,
}

impl fmt::Display for ReferenceSpaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceSpaceKind::Viewer => "viewer",
            ReferenceSpaceKind::Local => "local",
        })
    }
}

/// Handle to a coordinate frame granted by a session. Read-only once issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceSpace {
    pub id: u32,
    pub kind: ReferenceSpaceKind,
}

/// Standing ray-cast request; yields results every frame until the session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSource {
    pub id: u32,
    pub space: ReferenceSpace,
}

/// Column-major rigid transform as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub matrix: [f32; 16],
}

impl RigidTransform {
    pub const IDENTITY: Self = Self {
        matrix: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn from_mat4(m: Mat4) -> Self {
        Self {
            matrix: m.to_cols_array(),
        }
    }

    pub fn from_position(p: Vec3) -> Self {
        Self::from_mat4(Mat4::from_translation(p))
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols_array(&self.matrix)
    }

    /// Translation column.
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.matrix[12], self.matrix[13], self.matrix[14])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Eye {
    None,
    Left,
    Right,
}

/// One view of the viewer pose (a handheld AR device reports exactly one).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XrView {
    pub eye: Eye,
    pub transform: RigidTransform,
    pub projection_matrix: [f32; 16],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerPose {
    pub transform: RigidTransform,
    pub views: Vec<XrView>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub transform: RigidTransform,
}

/// Opaque ray/surface intersection candidate; resolve it with [`XrFrame::hit_test_pose`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestResult {
    pub(crate) source: u32,
    pub(crate) local: RigidTransform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Render target the session composites each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseLayer {
    pub framebuffer: FramebufferHandle,
    pub framebuffer_width: u32,
    pub framebuffer_height: u32,
}

impl BaseLayer {
    /// Sub-rectangle of the framebuffer belonging to `view`.
    ///
    /// Monoscopic views get the whole framebuffer; stereo views split it side by side.
    pub fn viewport(&self, view: &XrView) -> Viewport {
        let half = self.framebuffer_width / 2;
        match view.eye {
            Eye::None => Viewport {
                x: 0,
                y: 0,
                width: self.framebuffer_width,
                height: self.framebuffer_height,
            },
            Eye::Left => Viewport {
                x: 0,
                y: 0,
                width: half,
                height: self.framebuffer_height,
            },
            Eye::Right => Viewport {
                x: half,
                y: 0,
                width: self.framebuffer_width - half,
                height: self.framebuffer_height,
            },
        }
    }
}

/// Events the runtime delivers between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Primary user gesture (screen tap on handheld AR).
    Select,
    /// The runtime ended the session; no frame follows.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRequestId(pub u64);

/// Entry point of the runtime: capability check + session acquisition.
pub trait XrSystem {
    type Session: XrSession;

    fn is_session_supported(&self, mode: SessionMode) -> bool;

    fn request_session(&mut self, mode: SessionMode, init: &SessionInit) -> EngineResult<Self::Session>;
}

/// An active immersive session.
///
/// Contract:
/// - `next_frame` yields at most one frame per `request_animation_frame` call.
/// - After `SessionEvent::End` has been delivered, `next_frame` returns `None` forever.
pub trait XrSession {
    type Frame: XrFrame;

    /// Allocate the session-owned framebuffer compatible with `ctx`.
    fn create_base_layer(&mut self, ctx: &RenderingContext) -> EngineResult<BaseLayer>;

    fn update_render_state(&mut self, layer: BaseLayer);

    fn base_layer(&self) -> Option<BaseLayer>;

    fn request_reference_space(&mut self, kind: ReferenceSpaceKind) -> EngineResult<ReferenceSpace>;

    fn request_hit_test_source(&mut self, space: &ReferenceSpace) -> EngineResult<HitTestSource>;

    fn request_animation_frame(&mut self) -> FrameRequestId;

    fn poll_event(&mut self) -> Option<SessionEvent>;

    fn next_frame(&mut self) -> Option<Self::Frame>;
}

/// Per-callback snapshot of tracking state. Single use.
pub trait XrFrame {
    /// Predicted display time in milliseconds.
    fn time(&self) -> f64;

    fn viewer_pose(&self, space: &ReferenceSpace) -> Option<ViewerPose>;

    fn hit_test_results(&self, source: &HitTestSource) -> Vec<HitTestResult>;

    fn hit_test_pose(&self, result: &HitTestResult, space: &ReferenceSpace) -> Option<Pose>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(eye: Eye) -> XrView {
        XrView {
            eye,
            transform: RigidTransform::IDENTITY,
            projection_matrix: RigidTransform::IDENTITY.matrix,
        }
    }

    #[test]
    fn mono_view_covers_whole_layer() {
        let layer = BaseLayer {
            framebuffer: FramebufferHandle(1),
            framebuffer_width: 640,
            framebuffer_height: 480,
        };
        assert_eq!(
            layer.viewport(&view(Eye::None)),
            Viewport { x: 0, y: 0, width: 640, height: 480 }
        );
    }

    #[test]
    fn stereo_views_split_side_by_side() {
        let layer = BaseLayer {
            framebuffer: FramebufferHandle(1),
            framebuffer_width: 641,
            framebuffer_height: 480,
        };
        let l = layer.viewport(&view(Eye::Left));
        let r = layer.viewport(&view(Eye::Right));
        assert_eq!(l.x + l.width, r.x);
        assert_eq!(l.width + r.width, 641);
    }

    #[test]
    fn rigid_transform_position_is_translation_column() {
        let t = RigidTransform::from_position(Vec3::new(1.0, -2.0, 3.5));
        assert_eq!(t.position(), Vec3::new(1.0, -2.0, 3.5));
        assert_eq!(t.to_mat4().transform_point3(Vec3::ZERO), t.position());
    }

    #[test]
    fn session_mode_uses_platform_spelling() {
        assert_eq!(SessionMode::ImmersiveAr.to_string(), "immersive-ar");
        assert_eq!(
            serde_json::to_string(&SessionMode::ImmersiveAr).unwrap(),
            "\"immersive-ar\""
        );
    }
}
