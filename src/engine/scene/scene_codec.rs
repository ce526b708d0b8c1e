//! JSON dump of the scene graph, for inspecting what a run actually built.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{EngineError, EngineResult};
use crate::engine::scene::{NodeId, Scene};

/// Intermediate representation of a node and its subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDataNode {
    /// Node kind tag (e.g. "mesh", "group").
    pub type_name: String,
    pub name: String,
    pub guid: Uuid,
    pub visible: bool,
    /// World-space position, from the last world-matrix update.
    pub position: [f32; 3],

    /// Kind-specific data (geometry, material, light parameters).
    pub data: HashMap<String, serde_json::Value>,

    pub children: Vec<SceneDataNode>,
}

pub struct SceneCodec;

impl SceneCodec {
    /// Encode every root in draw order.
    pub fn encode_scene(scene: &Scene) -> EngineResult<Vec<SceneDataNode>> {
        scene
            .roots()
            .iter()
            .map(|id| Self::encode_subtree(scene, *id))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| EngineError::scene("scene tree references a missing node"))
    }

    /// `None` if `id` or any descendant is missing.
    pub fn encode_subtree(scene: &Scene, id: NodeId) -> Option<SceneDataNode> {
        let node = scene.node(id)?;

        let mut data = HashMap::new();
        if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(&node.kind) {
            data.extend(map.into_iter().filter(|(k, _)| k != "type"));
        }
        if node.cast_shadow {
            data.insert("cast_shadow".to_string(), serde_json::Value::Bool(true));
        }
        if node.receive_shadow {
            data.insert("receive_shadow".to_string(), serde_json::Value::Bool(true));
        }

        let mut children = Vec::with_capacity(node.children().len());
        for child in node.children() {
            children.push(Self::encode_subtree(scene, *child)?);
        }

        Some(SceneDataNode {
            type_name: node.kind.type_name().to_string(),
            name: node.name.clone(),
            guid: node.guid,
            visible: node.visible,
            position: node.matrix_world.w_axis.truncate().to_array(),
            data,
            children,
        })
    }

    pub fn to_json(scene: &Scene) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(&Self::encode_scene(scene)?)?)
    }

    pub fn write(scene: &Scene, path: &Path) -> EngineResult<()> {
        std::fs::write(path, Self::to_json(scene)?)?;
        Ok(())
    }
}
