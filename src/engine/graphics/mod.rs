pub mod mesh;
pub mod primitives;
pub mod renderer;
pub mod snapshot;
pub mod software_renderer;

pub use renderer::{Canvas, RenderingContext, SceneRenderer};
pub use snapshot::FrameSnapshots;
pub use software_renderer::SoftwareRenderer;
