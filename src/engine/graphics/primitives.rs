/// Scene-facing primitives: colors, transforms, geometry and material descriptions.
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::from_hex(0xffffff);

    /// `0xRRGGBB`.
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.r as f32, self.g as f32, self.b as f32) / 255.0
    }

    pub fn from_vec3(v: Vec3) -> Self {
        let c = (v.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
        Self {
            r: c.x as u8,
            g: c.y as u8,
            b: c.z as u8,
        }
    }

    pub fn to_rgba(self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

/// Position / rotation / scale, composed as T * R * S.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    /// Axis-aligned box centered on the origin. Six face groups: +x, -x, +y, -y, +z, -z.
    Box { width: f32, height: f32, depth: f32 },
    /// Horizontal plane (XZ), facing +y.
    Plane { width: f32, depth: f32 },
    /// Flat annulus in XZ, facing +y.
    Ring { inner_radius: f32, outer_radius: f32, segments: u32 },
}

impl Geometry {
    pub fn cube(size: f32) -> Self {
        Geometry::Box {
            width: size,
            height: size,
            depth: size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Material {
    /// Unlit. Face group `i` uses `colors[i % colors.len()]`.
    Basic { colors: Vec<Color> },
    /// Diffuse lit by the scene's ambient + directional lights.
    Lambert { color: Color },
    /// Only darkens where shadows fall; invisible otherwise.
    Shadow { color: Color, opacity: f32 },
}

impl Material {
    pub fn basic(color: Color) -> Self {
        Material::Basic { colors: vec![color] }
    }

    pub fn lambert(color: Color) -> Self {
        Material::Lambert { color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_split_into_channels() {
        assert_eq!(Color::from_hex(0xff00ff), Color { r: 255, g: 0, b: 255 });
        assert_eq!(Color::from_hex(0x111111).to_rgba(7), [17, 17, 17, 7]);
    }

    #[test]
    fn vec3_round_trip_clamps() {
        let c = Color::from_vec3(Vec3::new(2.0, -1.0, 0.5));
        assert_eq!(c, Color { r: 255, g: 0, b: 128 });
    }

    #[test]
    fn transform_composes_translation_last() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(2.0),
        };
        let p = t.to_mat4().transform_point3(Vec3::ONE);
        assert_eq!(p, Vec3::new(3.0, 4.0, 5.0));
    }
}
