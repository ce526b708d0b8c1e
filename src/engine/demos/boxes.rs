use glam::Vec3;

use crate::engine::graphics::primitives::{Color, Geometry, Material};
use crate::engine::scene::{Node, Scene};

pub const ROW_COUNT: i32 = 4;
pub const SPREAD: f32 = 1.0;
pub const BOX_SIZE: f32 = 0.2;

/// One color per box face, in face-group order (+x, -x, +y, -y, +z, -z).
pub const FACE_COLORS: [Color; 6] = [
    Color::from_hex(0xff0000),
    Color::from_hex(0x0000ff),
    Color::from_hex(0x00ff00),
    Color::from_hex(0xff00ff),
    Color::from_hex(0x00ffff),
    Color::from_hex(0xffff00),
];

/// ROW_COUNT^3 boxes on integer offsets from -ROW_COUNT/2, scaled by SPREAD.
pub fn box_grid() -> Scene {
    let mut scene = Scene::new();
    let half = ROW_COUNT / 2;
    let material = Material::Basic {
        colors: FACE_COLORS.to_vec(),
    };

    for i in 0..ROW_COUNT {
        for j in 0..ROW_COUNT {
            for k in 0..ROW_COUNT {
                let position = Vec3::new((i - half) as f32, (j - half) as f32, (k - half) as f32) * SPREAD;
                scene.add(
                    Node::mesh(format!("box_{i}_{j}_{k}"), Geometry::cube(BOX_SIZE), material.clone())
                        .with_position(position),
                );
            }
        }
    }
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::scene::NodeKind;

    #[test]
    fn grid_has_sixty_four_boxes_in_range() {
        let scene = box_grid();
        assert_eq!(scene.len(), 64);

        for (_, node) in scene.iter() {
            let p = node.transform.position;
            for c in p.to_array() {
                assert!((-2.0..=1.0).contains(&c), "{p:?}");
                assert_eq!(c.fract(), 0.0);
            }
            let NodeKind::Mesh { geometry, material } = &node.kind else {
                panic!("expected a mesh");
            };
            assert_eq!(*geometry, Geometry::cube(0.2));
            assert_eq!(
                *material,
                Material::Basic {
                    colors: FACE_COLORS.to_vec()
                }
            );
        }
    }

    #[test]
    fn corners_are_present() {
        let scene = box_grid();
        let corner = |p: Vec3| scene.iter().any(|(_, n)| n.transform.position == p);
        assert!(corner(Vec3::splat(-2.0)));
        assert!(corner(Vec3::splat(1.0)));
    }
}
