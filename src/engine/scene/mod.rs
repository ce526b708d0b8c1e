pub mod scene_codec;

#[cfg(test)]
mod scene_graph_tests;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use slotmap::{SlotMap, new_key_type};
use uuid::Uuid;

use crate::engine::graphics::primitives::{Color, Geometry, Material, Transform};

new_key_type! {
    pub struct NodeId;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Group,
    Mesh { geometry: Geometry, material: Material },
    AmbientLight { color: Color, intensity: f32 },
    /// Shines from the node's world position towards the origin.
    DirectionalLight { color: Color, intensity: f32 },
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Group => "group",
            NodeKind::Mesh { .. } => "mesh",
            NodeKind::AmbientLight { .. } => "ambient_light",
            NodeKind::DirectionalLight { .. } => "directional_light",
        }
    }
}

/// One scene-graph node.
///
/// `matrix` is the local matrix. With `matrix_auto_update` it is rebuilt from
/// `transform` on every world update; otherwise whoever owns the node writes it.
#[derive(Debug, Clone)]
pub struct Node {
    pub guid: Uuid,
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,
    pub matrix_auto_update: bool,
    pub matrix: Mat4,
    pub matrix_world: Mat4,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            guid: Uuid::new_v4(),
            name: name.into(),
            kind,
            transform: Transform::default(),
            visible: true,
            matrix_auto_update: true,
            matrix: Mat4::IDENTITY,
            matrix_world: Mat4::IDENTITY,
            cast_shadow: false,
            receive_shadow: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self::new(name, NodeKind::Mesh { geometry, material })
    }

    pub fn ambient_light(color: Color, intensity: f32) -> Self {
        Self::new("ambient_light", NodeKind::AmbientLight { color, intensity })
    }

    pub fn directional_light(color: Color, intensity: f32) -> Self {
        Self::new("directional_light", NodeKind::DirectionalLight { color, intensity })
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Freeze the local matrix; `transform` is ignored from then on.
    #[cfg(test)]
    pub fn with_manual_matrix(mut self, matrix: Mat4) -> Self {
        self.matrix_auto_update = false;
        self.matrix = matrix;
        self
    }
}

/// Detached node subtree that can be stamped into a scene any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTemplate {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,
    pub cast_shadow: bool,
    pub children: Vec<NodeTemplate>,
}

impl NodeTemplate {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::default(),
            visible: true,
            cast_shadow: false,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self::new(name, NodeKind::Mesh { geometry, material })
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.transform.rotation = rotation;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn with_cast_shadow(mut self, cast: bool) -> Self {
        self.cast_shadow = cast;
        self
    }

    pub fn with_child(mut self, child: NodeTemplate) -> Self {
        self.children.push(child);
        self
    }

    /// Nodes in this subtree, root included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeTemplate::node_count).sum::<usize>()
    }

    fn to_node(&self) -> Node {
        let mut node = Node::new(self.name.clone(), self.kind.clone()).with_transform(self.transform);
        node.visible = self.visible;
        node.cast_shadow = self.cast_shadow;
        node
    }
}

/// Node forest keyed by `NodeId`. Roots draw in insertion order.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `node` as a new root.
    pub fn add(&mut self, mut node: Node) -> NodeId {
        node.parent = None;
        node.children.clear();
        let id = self.nodes.insert(node);
        self.roots.push(id);
        id
    }

    /// Add `node` under `parent`. `None` if the parent doesn't exist.
    pub fn add_child(&mut self, parent: NodeId, mut node: Node) -> Option<NodeId> {
        if !self.nodes.contains_key(parent) {
            return None;
        }
        node.parent = Some(parent);
        node.children.clear();
        let id = self.nodes.insert(node);
        self.nodes[parent].children.push(id);
        Some(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    #[cfg(test)]
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter()
    }

    #[cfg(test)]
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|(_, n)| n.name == name).map(|(id, _)| id)
    }

    /// Visible only if the node and all of its ancestors are.
    pub fn world_visible(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            match self.nodes.get(c) {
                Some(n) if n.visible => cur = n.parent,
                _ => return false,
            }
        }
        true
    }

    /// Recompute world matrices for the whole forest.
    pub fn update_matrix_world(&mut self) {
        let roots = self.roots.clone();
        for root in roots {
            self.update_subtree(root, Mat4::IDENTITY);
        }
    }

    /// Recompute world matrices for `id` and its descendants only.
    pub fn update_node_matrix_world(&mut self, id: NodeId) {
        let parent_world = self
            .parent_of(id)
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.matrix_world)
            .unwrap_or(Mat4::IDENTITY);
        self.update_subtree(id, parent_world);
    }

    fn update_subtree(&mut self, id: NodeId, parent_world: Mat4) {
        let mut stack = vec![(id, parent_world)];
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(id) else {
                continue;
            };
            if node.matrix_auto_update {
                node.matrix = node.transform.to_mat4();
            }
            node.matrix_world = parent_world * node.matrix;
            let world = node.matrix_world;
            stack.extend(node.children.iter().map(|c| (*c, world)));
        }
    }

    /// Deep-clone `template` into the scene as a new root placed at `position`.
    /// Every created node gets a fresh guid.
    pub fn instantiate(&mut self, template: &NodeTemplate, position: Vec3) -> NodeId {
        let mut root = template.to_node();
        root.transform.position = position;
        let id = self.add(root);
        self.instantiate_children(id, template);
        id
    }

    /// Deep-clone `template` under `parent`, keeping the template's own transform.
    pub fn add_template(&mut self, parent: NodeId, template: &NodeTemplate) -> Option<NodeId> {
        let id = self.add_child(parent, template.to_node())?;
        self.instantiate_children(id, template);
        Some(id)
    }

    fn instantiate_children(&mut self, parent: NodeId, template: &NodeTemplate) {
        for child in &template.children {
            // Parent was just inserted, so this cannot fail.
            let _ = self.add_template(parent, child);
        }
    }
}
