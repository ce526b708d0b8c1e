use image::RgbaImage;

use crate::engine::EngineResult;
use crate::engine::camera::XrCamera;
use crate::engine::scene::Scene;
use crate::engine::xr::FramebufferHandle;

/// Drawing surface the rendering context is created on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Rendering context bound to a canvas.
///
/// `xr_compatible` must be set for a session to allocate a layer against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderingContext {
    pub canvas: Canvas,
    pub xr_compatible: bool,
}

impl RenderingContext {
    pub fn acquire(canvas: &Canvas, xr_compatible: bool) -> Self {
        Self {
            canvas: *canvas,
            xr_compatible,
        }
    }
}

/// Rasterizes a scene into the framebuffer the XR session hands out each frame.
///
/// Contract:
/// - `attach` once, before any other call.
/// - Per frame: `bind_framebuffer`, then optionally `set_size`, then at most one `render`.
/// - `render` refreshes world matrices of auto-updating nodes; manual nodes keep theirs.
pub trait SceneRenderer {
    fn attach(&mut self, ctx: &RenderingContext);

    fn bind_framebuffer(&mut self, framebuffer: FramebufferHandle);

    fn set_size(&mut self, width: u32, height: u32);

    fn render(&mut self, scene: &mut Scene, camera: &XrCamera) -> EngineResult<()>;

    /// Last rendered image, for backends that can read it back.
    fn frame_image(&self) -> Option<&RgbaImage> {
        None
    }
}
