pub mod animation_loop;
pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod demos;
pub mod graphics;
pub mod marker;
pub mod rendering_inspector;
pub mod scene;
pub mod session_controller;
pub mod xr;

use crate::engine::session_controller::ControllerState;
use crate::engine::xr::{Feature, ReferenceSpaceKind, SessionMode};

/// Engine-level error type.
///
/// Start-chain variants (`SessionNotSupported` .. `ReferenceSpaceUnavailable`) are never
/// retried: they terminate the "enter AR" flow and bubble up to the caller.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("session mode `{0}` is not supported")]
    SessionNotSupported(SessionMode),

    #[error("required feature `{0}` is not supported")]
    FeatureNotSupported(Feature),

    #[error("permission denied for `{0}` session")]
    PermissionDenied(SessionMode),

    #[error("reference space `{0}` is unavailable")]
    ReferenceSpaceUnavailable(ReferenceSpaceKind),

    #[error("session has ended")]
    SessionEnded,

    #[error("an AR session is already active")]
    AlreadyActive,

    #[error("controller is {actual:?}, expected {expected:?}")]
    InvalidState {
        actual: ControllerState,
        expected: ControllerState,
    },

    #[error("device script error: {0}")]
    Script(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("scene error: {0}")]
    Scene(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl EngineError {
    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_rejected_capability() {
        let e = EngineError::FeatureNotSupported(Feature::HitTest);
        assert!(e.to_string().contains("hit-test"));

        let e = EngineError::SessionNotSupported(SessionMode::ImmersiveAr);
        assert!(e.to_string().contains("immersive-ar"));

        let e = EngineError::ReferenceSpaceUnavailable(ReferenceSpaceKind::Viewer);
        assert!(e.to_string().contains("viewer"));
    }

    #[test]
    fn helper_constructors_prefix_messages() {
        assert!(EngineError::script("x").to_string().starts_with("device script error:"));
        assert!(EngineError::render("x").to_string().starts_with("render error:"));
        assert!(EngineError::scene("x").to_string().starts_with("scene error:"));
    }
}
