//! Page-level glue: the "enter AR" button and the single live session handle.

use tracing::{info, warn};

use crate::engine::demos::Variant;
use crate::engine::graphics::{Canvas, SceneRenderer};
use crate::engine::session_controller::SessionController;
use crate::engine::xr::{SessionMode, XrSystem};
use crate::engine::{EngineError, EngineResult};

/// The single on-page control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryButton {
    pub visible: bool,
    /// Whether clicking it does anything.
    pub wired: bool,
}

impl Default for EntryButton {
    fn default() -> Self {
        Self {
            visible: true,
            wired: false,
        }
    }
}

type RendererFactory<R> = Box<dyn Fn() -> R>;

/// Owns the XR system and at most one running controller.
pub struct ArApp<X: XrSystem, R: SceneRenderer> {
    xr: X,
    variant: Variant,
    canvas: Canvas,
    make_renderer: RendererFactory<R>,
    button: EntryButton,
    active: Option<SessionController<X::Session, R>>,
}

impl<X: XrSystem, R: SceneRenderer> ArApp<X, R> {
    pub fn new(xr: X, variant: Variant, canvas: Canvas, make_renderer: impl Fn() -> R + 'static) -> Self {
        Self {
            xr,
            variant,
            canvas,
            make_renderer: Box::new(make_renderer),
            button: EntryButton::default(),
            active: None,
        }
    }

    /// Page load: wire the button only if immersive-ar is available.
    pub fn bootstrap(&mut self) -> bool {
        let supported = self.xr.is_session_supported(SessionMode::ImmersiveAr);
        self.button.wired = supported;
        if supported {
            info!(variant = %self.variant, "immersive-ar supported, entry button wired");
        } else {
            warn!("immersive-ar not supported, entry button left inert");
        }
        supported
    }

    /// Button press. `Ok(false)` when the button isn't wired.
    pub fn click(&mut self) -> EngineResult<bool> {
        if !self.button.wired {
            return Ok(false);
        }
        self.enter_ar()?;
        Ok(true)
    }

    /// Start a fresh controller. A failed start leaves no handle behind.
    pub fn enter_ar(&mut self) -> EngineResult<()> {
        if self.active.is_some() {
            return Err(EngineError::AlreadyActive);
        }

        let mut controller = SessionController::new(self.variant, self.canvas, (self.make_renderer)());
        if self.variant.hides_entry_button() {
            self.button.visible = false;
        }
        controller.start(&mut self.xr)?;
        self.active = Some(controller);
        Ok(())
    }

    pub fn button(&self) -> EntryButton {
        self.button
    }

    pub fn active(&self) -> Option<&SessionController<X::Session, R>> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> Option<&mut SessionController<X::Session, R>> {
        self.active.as_mut()
    }

    /// Drop the handle once its session is over.
    pub fn discard_session(&mut self) -> Option<SessionController<X::Session, R>> {
        self.active.take()
    }
}
