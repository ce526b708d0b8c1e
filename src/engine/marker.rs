use glam::Vec3;

use crate::engine::scene::{NodeId, NodeTemplate, Scene};

/// Where a placement would land.
///
/// Plain data; the scene node that shows it is only touched through
/// [`MarkerAdapter`]. Starts hidden at the origin until the first surface hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: Vec3,
    pub visible: bool,
    pub node: NodeId,
}

impl Marker {
    pub fn new(node: NodeId) -> Self {
        Self {
            position: Vec3::ZERO,
            visible: false,
            node,
        }
    }

    /// Snap to a hit and show.
    pub fn place(&mut self, position: Vec3) {
        self.position = position;
        self.visible = true;
    }
}

/// Writes a [`Marker`] into its scene node.
pub struct MarkerAdapter;

impl MarkerAdapter {
    /// Insert the marker visual as a root and return a hidden record bound to it.
    pub fn spawn(scene: &mut Scene, visual: &NodeTemplate) -> Marker {
        let node = scene.instantiate(visual, Vec3::ZERO);
        let marker = Marker::new(node);
        Self::sync(&marker, scene);
        marker
    }

    /// Copy position and visibility onto the node. Returns false if the node is gone.
    pub fn sync(marker: &Marker, scene: &mut Scene) -> bool {
        let Some(node) = scene.node_mut(marker.node) else {
            return false;
        };
        node.transform.position = marker.position;
        node.visible = marker.visible;
        true
    }

    /// `sync`, then refresh the node's world matrix right away.
    pub fn apply(marker: &Marker, scene: &mut Scene) -> bool {
        if !Self::sync(marker, scene) {
            return false;
        }
        scene.update_node_matrix_world(marker.node);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::graphics::primitives::{Color, Geometry, Material};

    fn ring() -> NodeTemplate {
        NodeTemplate::mesh(
            "reticle",
            Geometry::Ring {
                inner_radius: 0.08,
                outer_radius: 0.1,
                segments: 24,
            },
            Material::basic(Color::WHITE),
        )
    }

    #[test]
    fn spawned_marker_is_hidden_at_origin() {
        let mut scene = Scene::new();
        let marker = MarkerAdapter::spawn(&mut scene, &ring());

        assert!(!marker.visible);
        assert_eq!(marker.position, Vec3::ZERO);
        assert!(!scene.node(marker.node).unwrap().visible);
    }

    #[test]
    fn apply_moves_node_and_world_matrix() {
        let mut scene = Scene::new();
        let mut marker = MarkerAdapter::spawn(&mut scene, &ring());

        marker.place(Vec3::new(0.5, -1.2, -0.7));
        assert!(MarkerAdapter::apply(&marker, &mut scene));

        let node = scene.node(marker.node).unwrap();
        assert!(node.visible);
        assert_eq!(node.transform.position, marker.position);
        assert_eq!(node.matrix_world.w_axis.truncate(), marker.position);
    }

    #[test]
    fn apply_on_missing_node_reports_false() {
        let mut scene = Scene::new();
        let marker = Marker::new(NodeId::default());
        assert!(!MarkerAdapter::apply(&marker, &mut scene));
    }
}
