//! CPU triangle rasterizer.
//!
//! Stands in for a GPU backend on the headless device: one RGBA color target plus a
//! depth buffer, cleared to transparent black whenever a framebuffer is bound (the
//! camera feed shows through untouched pixels). No auto-clear between renders.

use glam::{Mat3, Vec3, Vec4Swizzles};
use image::{Rgba, RgbaImage};
use tracing::trace;

use crate::engine::camera::XrCamera;
use crate::engine::graphics::mesh::MeshFactory;
use crate::engine::graphics::primitives::{Color, Material};
use crate::engine::graphics::renderer::{RenderingContext, SceneRenderer};
use crate::engine::scene::{NodeKind, Scene};
use crate::engine::xr::FramebufferHandle;
use crate::engine::{EngineError, EngineResult};

const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

pub struct SoftwareRenderer {
    context: Option<RenderingContext>,
    framebuffer: Option<FramebufferHandle>,
    color: RgbaImage,
    depth: Vec<f32>,
    renders: u64,
    triangles_drawn: usize,
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftwareRenderer {
    pub fn new() -> Self {
        Self {
            context: None,
            framebuffer: None,
            color: RgbaImage::from_pixel(1, 1, CLEAR),
            depth: vec![f32::INFINITY],
            renders: 0,
            triangles_drawn: 0,
        }
    }

    /// Number of `render` calls that completed.
    #[cfg(test)]
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Triangles that touched at least one pixel in the last render.
    #[cfg(test)]
    pub fn triangles_drawn(&self) -> usize {
        self.triangles_drawn
    }

    #[cfg(test)]
    pub fn size(&self) -> (u32, u32) {
        self.color.dimensions()
    }

    fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.color.dimensions() == (width, height) {
            return;
        }
        self.color = RgbaImage::from_pixel(width, height, CLEAR);
        self.depth = vec![f32::INFINITY; width as usize * height as usize];
    }

    fn clear(&mut self) {
        for p in self.color.pixels_mut() {
            *p = CLEAR;
        }
        self.depth.fill(f32::INFINITY);
    }

    /// Fill a screen-space triangle (x, y in pixels; z in NDC) with depth testing.
    fn fill_triangle(&mut self, s: [Vec3; 3], rgba: [u8; 4]) -> bool {
        let (w, h) = self.color.dimensions();
        let area = edge(s[0], s[1], s[2].x, s[2].y);
        if area.abs() < 1e-9 {
            return false;
        }

        let (lo, hi) = s.iter().fold((Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)), |(lo, hi), p| {
            (lo.min(*p), hi.max(*p))
        });
        let x0 = lo.x.floor().clamp(0.0, w as f32) as u32;
        let x1 = hi.x.ceil().clamp(0.0, w as f32) as u32;
        let y0 = lo.y.floor().clamp(0.0, h as f32) as u32;
        let y1 = hi.y.ceil().clamp(0.0, h as f32) as u32;

        let mut touched = false;
        for y in y0..y1 {
            for x in x0..x1 {
                let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
                let b0 = edge(s[1], s[2], px, py) / area;
                let b1 = edge(s[2], s[0], px, py) / area;
                let b2 = edge(s[0], s[1], px, py) / area;
                if b0 < 0.0 || b1 < 0.0 || b2 < 0.0 {
                    continue;
                }

                let z = b0 * s[0].z + b1 * s[1].z + b2 * s[2].z;
                if !(-1.0..=1.0).contains(&z) {
                    continue;
                }

                let idx = (y * w + x) as usize;
                if z < self.depth[idx] {
                    self.depth[idx] = z;
                    self.color.put_pixel(x, y, Rgba(rgba));
                    touched = true;
                }
            }
        }
        touched
    }
}

fn edge(a: Vec3, b: Vec3, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

struct Lighting {
    ambient: Vec3,
    /// (unit direction towards the light, radiance)
    directional: Vec<(Vec3, Vec3)>,
}

impl Lighting {
    fn gather(scene: &Scene) -> Self {
        let mut lighting = Lighting {
            ambient: Vec3::ZERO,
            directional: Vec::new(),
        };
        for (id, node) in scene.iter() {
            if !scene.world_visible(id) {
                continue;
            }
            match node.kind {
                NodeKind::AmbientLight { color, intensity } => {
                    lighting.ambient += color.to_vec3() * intensity;
                }
                // Directional lights aim from their position at the origin.
                NodeKind::DirectionalLight { color, intensity } => {
                    let towards = node.matrix_world.w_axis.xyz().normalize_or_zero();
                    lighting.directional.push((towards, color.to_vec3() * intensity));
                }
                _ => {}
            }
        }
        lighting
    }

    fn shade(&self, material: &Material, group: usize, normal: Vec3) -> Option<[u8; 4]> {
        match material {
            Material::Basic { colors } if !colors.is_empty() => Some(colors[group % colors.len()].to_rgba(255)),
            Material::Basic { .. } => None,
            Material::Lambert { color } => {
                let light = self
                    .directional
                    .iter()
                    .fold(self.ambient, |acc, (dir, radiance)| acc + *radiance * normal.dot(*dir).max(0.0));
                Some(Color::from_vec3(color.to_vec3() * light).to_rgba(255))
            }
            // No shadow maps here, so a shadow catcher never shows.
            Material::Shadow { .. } => None,
        }
    }
}

impl SceneRenderer for SoftwareRenderer {
    fn attach(&mut self, ctx: &RenderingContext) {
        self.context = Some(*ctx);
        self.resize(ctx.canvas.width, ctx.canvas.height);
    }

    fn bind_framebuffer(&mut self, framebuffer: FramebufferHandle) {
        self.framebuffer = Some(framebuffer);
        self.clear();
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.resize(width, height);
    }

    fn render(&mut self, scene: &mut Scene, camera: &XrCamera) -> EngineResult<()> {
        if self.context.is_none() {
            return Err(EngineError::render("no rendering context attached"));
        }
        if self.framebuffer.is_none() {
            return Err(EngineError::render("no framebuffer bound"));
        }

        scene.update_matrix_world();
        let lighting = Lighting::gather(scene);
        let view_proj = camera.projection_matrix * camera.view_matrix();
        let (w, h) = self.color.dimensions();

        let mut drawn = 0;
        for (id, node) in scene.iter() {
            let NodeKind::Mesh { geometry, material } = &node.kind else {
                continue;
            };
            if !scene.world_visible(id) {
                continue;
            }

            let mesh = MeshFactory::for_geometry(geometry);
            let mvp = view_proj * node.matrix_world;
            let normal_matrix = Mat3::from_mat4(node.matrix_world).inverse().transpose();

            for t in 0..mesh.triangle_count() {
                let (tri, normal, group) = mesh.triangle(t);
                let Some(rgba) = lighting.shade(material, group as usize, (normal_matrix * normal).normalize_or_zero())
                else {
                    continue;
                };

                let clip = tri.map(|p| mvp * p.extend(1.0));
                // Reject instead of clipping against the near plane.
                if clip.iter().any(|c| c.w <= 1e-5) {
                    continue;
                }
                let ndc = clip.map(|c| c.xyz() / c.w);
                if ndc.iter().all(|p| p.x < -1.0)
                    || ndc.iter().all(|p| p.x > 1.0)
                    || ndc.iter().all(|p| p.y < -1.0)
                    || ndc.iter().all(|p| p.y > 1.0)
                {
                    continue;
                }

                let screen = ndc.map(|p| Vec3::new((p.x * 0.5 + 0.5) * w as f32, (0.5 - p.y * 0.5) * h as f32, p.z));
                if self.fill_triangle(screen, rgba) {
                    drawn += 1;
                }
            }
        }

        self.triangles_drawn = drawn;
        self.renders += 1;
        trace!(
            render = self.renders,
            triangles = self.triangles_drawn,
            width = w,
            height = h,
            "software render"
        );
        Ok(())
    }

    fn frame_image(&self) -> Option<&RgbaImage> {
        Some(&self.color)
    }
}
