use glam::{Quat, Vec3};

use crate::engine::graphics::primitives::{Color, Geometry, Material};
use crate::engine::scene::{Node, NodeTemplate, Scene};

pub const SHADOW_MESH_NAME: &str = "shadowMesh";
pub const RETICLE_NAME: &str = "reticle";
pub const SUNFLOWER_NAME: &str = "sunflower";

/// Ambient fill, one directional key light and a far-away shadow catcher plane.
pub fn lit_scene() -> Scene {
    let mut scene = Scene::new();

    scene.add(
        Node::mesh(
            SHADOW_MESH_NAME,
            Geometry::Plane {
                width: 2000.0,
                depth: 2000.0,
            },
            Material::Shadow {
                color: Color::from_hex(0x111111),
                opacity: 0.2,
            },
        )
        .with_position(Vec3::new(0.0, 10000.0, 0.0))
        .with_shadows(false, true),
    );
    scene.add(Node::ambient_light(Color::WHITE, 1.0));
    scene.add(
        Node::directional_light(Color::WHITE, 0.3)
            .with_position(Vec3::new(10.0, 15.0, 10.0))
            .with_shadows(true, false),
    );

    scene
}

/// Flat ring lying on the detected surface. Starts hidden.
pub fn reticle_template() -> NodeTemplate {
    NodeTemplate::group(RETICLE_NAME).with_visible(false).with_child(NodeTemplate::mesh(
        "reticle_ring",
        Geometry::Ring {
            inner_radius: 0.075,
            outer_radius: 0.1,
            segments: 32,
        },
        Material::basic(Color::WHITE),
    ))
}

/// Procedural stand-in for the sunflower model: stem, two leaves, seed head, petals.
/// The root sits on the ground plane; the plant grows along +y.
pub fn sunflower_template() -> NodeTemplate {
    let green = Material::lambert(Color::from_hex(0x3d8b37));
    let leaf = Material::lambert(Color::from_hex(0x4caf50));

    let leaf_geometry = Geometry::Box {
        width: 0.12,
        height: 0.01,
        depth: 0.05,
    };

    let head = NodeTemplate::group("head")
        .with_position(Vec3::new(0.0, 0.42, 0.0))
        .with_rotation(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2))
        .with_child(NodeTemplate::mesh(
            "petals",
            Geometry::Ring {
                inner_radius: 0.04,
                outer_radius: 0.1,
                segments: 20,
            },
            Material::lambert(Color::from_hex(0xffc107)),
        ))
        .with_child(
            NodeTemplate::mesh(
                "seeds",
                Geometry::Box {
                    width: 0.08,
                    height: 0.02,
                    depth: 0.08,
                },
                Material::lambert(Color::from_hex(0x5d4037)),
            )
            .with_position(Vec3::new(0.0, 0.005, 0.0)),
        );

    let flower = NodeTemplate::group(SUNFLOWER_NAME)
        .with_cast_shadow(true)
        .with_child(
            NodeTemplate::mesh(
                "stem",
                Geometry::Box {
                    width: 0.02,
                    height: 0.4,
                    depth: 0.02,
                },
                green,
            )
            .with_position(Vec3::new(0.0, 0.2, 0.0)),
        )
        .with_child(
            NodeTemplate::mesh("leaf_left", leaf_geometry, leaf.clone())
                .with_position(Vec3::new(-0.06, 0.15, 0.0))
                .with_rotation(Quat::from_rotation_z(0.4)),
        )
        .with_child(
            NodeTemplate::mesh("leaf_right", leaf_geometry, leaf)
                .with_position(Vec3::new(0.06, 0.22, 0.0))
                .with_rotation(Quat::from_rotation_z(-0.4)),
        )
        .with_child(head);

    NodeTemplate::group("sunflower_scene").with_child(flower)
}
