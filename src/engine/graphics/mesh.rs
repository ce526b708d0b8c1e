//! CPU-side procedural mesh generation.
//!
//! The software renderer tessellates each `Geometry` through `MeshFactory` on demand;
//! every triangle carries a face-group index so multi-material boxes can pick a color
//! per side.

use glam::Vec3;

use crate::engine::graphics::primitives::Geometry;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

/// CPU-side mesh data.
///
/// Contract:
/// - `indices_u32` is a triangle list into `vertices`.
/// - `groups[t]` is the face group of triangle `t` (`groups.len() == indices_u32.len() / 3`).
/// - Front faces wind counter-clockwise seen from outside.
#[derive(Debug, Clone)]
pub struct CpuMesh {
    pub vertices: Vec<CpuVertex>,
    pub indices_u32: Vec<u32>,
    pub groups: Vec<u8>,
}

impl CpuMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices_u32.len() / 3
    }

    /// Corner positions + face group of triangle `t`.
    pub fn triangle(&self, t: usize) -> ([Vec3; 3], Vec3, u8) {
        let i = &self.indices_u32[t * 3..t * 3 + 3];
        let p = |k: usize| Vec3::from_array(self.vertices[i[k] as usize].pos);
        let n = Vec3::from_array(self.vertices[i[0] as usize].normal);
        ([p(0), p(1), p(2)], n, self.groups[t])
    }
}

pub struct MeshFactory;

impl MeshFactory {
    pub fn for_geometry(geometry: &Geometry) -> CpuMesh {
        match *geometry {
            Geometry::Box { width, height, depth } => Self::box_mesh(width, height, depth),
            Geometry::Plane { width, depth } => Self::plane(width, depth),
            Geometry::Ring {
                inner_radius,
                outer_radius,
                segments,
            } => Self::ring(inner_radius, outer_radius, segments),
        }
    }

    /// 24 vertices (4 per face so normals stay flat), 12 triangles.
    pub fn box_mesh(width: f32, height: f32, depth: f32) -> CpuMesh {
        // (normal, u, v) with u x v == normal.
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let half = Vec3::new(width, height, depth) * 0.5;

        let mut vertices = Vec::with_capacity(24);
        let mut indices_u32 = Vec::with_capacity(36);
        let mut groups = Vec::with_capacity(12);

        for (g, (n, u, v)) in faces.into_iter().enumerate() {
            let base = vertices.len() as u32;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let p = (n + u * su + v * sv) * half;
                vertices.push(CpuVertex {
                    pos: p.to_array(),
                    normal: n.to_array(),
                });
            }
            indices_u32.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
            groups.extend([g as u8; 2]);
        }

        CpuMesh {
            vertices,
            indices_u32,
            groups,
        }
    }

    pub fn plane(width: f32, depth: f32) -> CpuMesh {
        let (hw, hd) = (width * 0.5, depth * 0.5);
        let v = |x: f32, z: f32| CpuVertex {
            pos: [x, 0.0, z],
            normal: [0.0, 1.0, 0.0],
        };
        CpuMesh {
            vertices: vec![v(-hw, hd), v(hw, hd), v(hw, -hd), v(-hw, -hd)],
            indices_u32: vec![0, 1, 2, 0, 2, 3],
            groups: vec![0, 0],
        }
    }

    pub fn ring(inner_radius: f32, outer_radius: f32, segments: u32) -> CpuMesh {
        let segments = segments.max(3);
        let mut vertices = Vec::with_capacity(segments as usize * 2);
        for s in 0..segments {
            let a = s as f32 / segments as f32 * std::f32::consts::TAU;
            let (sin, cos) = a.sin_cos();
            for r in [inner_radius, outer_radius] {
                vertices.push(CpuVertex {
                    pos: [r * cos, 0.0, -r * sin],
                    normal: [0.0, 1.0, 0.0],
                });
            }
        }

        let mut indices_u32 = Vec::with_capacity(segments as usize * 6);
        for s in 0..segments {
            let i0 = s * 2;
            let o0 = i0 + 1;
            let i1 = ((s + 1) % segments) * 2;
            let o1 = i1 + 1;
            indices_u32.extend([i0, o0, o1, i0, o1, i1]);
        }

        let groups = vec![0; indices_u32.len() / 3];
        CpuMesh {
            vertices,
            indices_u32,
            groups,
        }
    }
}
