#[cfg(test)]
mod tests {
    use glam::{Mat4, Vec3};

    use crate::engine::graphics::primitives::{Color, Geometry, Material};
    use crate::engine::scene::scene_codec::SceneCodec;
    use crate::engine::EngineError;
    use crate::engine::scene::{Node, NodeId, NodeKind, NodeTemplate, Scene};

    fn flower() -> NodeTemplate {
        NodeTemplate::group("flower")
            .with_cast_shadow(true)
            .with_child(
                NodeTemplate::mesh("stem", Geometry::cube(0.1), Material::basic(Color::WHITE))
                    .with_position(Vec3::new(0.0, 0.5, 0.0))
                    .with_child(NodeTemplate::group("head").with_position(Vec3::new(0.0, 0.5, 0.0))),
            )
    }

    #[test]
    fn add_child_sets_parent_and_child_list() {
        let mut s = Scene::new();
        let p = s.add(Node::group("p"));
        let c = s.add_child(p, Node::group("c")).unwrap();

        assert_eq!(s.parent_of(c), Some(p));
        assert_eq!(s.children_of(p), &[c]);
        assert_eq!(s.roots(), &[p]);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn add_child_to_missing_parent_is_rejected() {
        let mut s = Scene::new();
        let p = s.add(Node::group("p"));

        assert!(s.add_child(NodeId::default(), Node::group("c")).is_none());
        assert_eq!(s.len(), 1);
        assert!(s.children_of(p).is_empty());
    }

    #[test]
    fn world_matrices_compose_down_the_tree() {
        let mut s = Scene::new();
        let p = s.add(Node::group("p").with_position(Vec3::new(1.0, 0.0, 0.0)));
        let c = s.add_child(p, Node::group("c").with_position(Vec3::new(0.0, 2.0, 0.0))).unwrap();

        s.update_matrix_world();

        let world = s.node(c).unwrap().matrix_world;
        assert_eq!(world.w_axis.truncate(), Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn manual_nodes_keep_their_local_matrix() {
        let mut s = Scene::new();
        let m = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let id = s.add(Node::group("manual").with_manual_matrix(m).with_position(Vec3::ONE));

        s.update_matrix_world();

        let node = s.node(id).unwrap();
        assert_eq!(node.matrix, m);
        assert_eq!(node.matrix_world, m);
    }

    #[test]
    fn node_update_leaves_siblings_alone() {
        let mut s = Scene::new();
        let a = s.add(Node::group("a"));
        let b = s.add(Node::group("b"));
        s.node_mut(a).unwrap().transform.position = Vec3::X;
        s.node_mut(b).unwrap().transform.position = Vec3::Y;

        s.update_node_matrix_world(a);

        assert_eq!(s.node(a).unwrap().matrix_world.w_axis.truncate(), Vec3::X);
        assert_eq!(s.node(b).unwrap().matrix_world, Mat4::IDENTITY);
    }

    #[test]
    fn visibility_is_inherited() {
        let mut s = Scene::new();
        let p = s.add(Node::group("p"));
        let c = s.add_child(p, Node::group("c")).unwrap();
        assert!(s.world_visible(c));

        s.node_mut(p).unwrap().visible = false;
        assert!(!s.world_visible(c));
        assert!(s.node(c).unwrap().visible);
    }

    #[test]
    fn instantiate_clones_the_whole_template() {
        let mut s = Scene::new();
        let t = flower();
        let at = Vec3::new(0.3, -1.2, 0.4);

        let a = s.instantiate(&t, at);
        let b = s.instantiate(&t, at);

        assert_eq!(s.len(), 2 * t.node_count());
        assert_eq!(s.roots(), &[a, b]);
        assert_ne!(s.node(a).unwrap().guid, s.node(b).unwrap().guid);

        let root = s.node(a).unwrap();
        assert_eq!(root.transform.position, at);
        assert!(root.cast_shadow);

        let stem = s.children_of(a)[0];
        assert_eq!(s.node(stem).unwrap().name, "stem");
        assert_eq!(s.node(stem).unwrap().transform.position, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(s.children_of(stem).len(), 1);
    }

    #[test]
    fn find_by_name_returns_first_match() {
        let mut s = Scene::new();
        let id = s.add(Node::mesh(
            "shadowMesh",
            Geometry::Plane {
                width: 2.0,
                depth: 2.0,
            },
            Material::basic(Color::WHITE),
        ));
        assert_eq!(s.find_by_name("shadowMesh"), Some(id));
        assert_eq!(s.find_by_name("nope"), None);
    }

    #[test]
    fn codec_dumps_hierarchy_and_kind_data() {
        let mut s = Scene::new();
        s.add(Node::ambient_light(Color::WHITE, 1.0));
        s.instantiate(&flower(), Vec3::new(1.0, 0.0, 0.0));
        s.update_matrix_world();

        let dump = SceneCodec::encode_scene(&s).unwrap();
        assert_eq!(dump.len(), 2);
        assert_eq!(dump[0].type_name, "ambient_light");
        assert_eq!(dump[0].data["intensity"], serde_json::json!(1.0));
        assert!(!dump[0].data.contains_key("type"));

        assert_eq!(dump[1].name, "flower");
        assert_eq!(dump[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(dump[1].children[0].children[0].position, [1.0, 1.0, 0.0]);

        let json = SceneCodec::to_json(&s).unwrap();
        assert!(json.contains("\"stem\""));
    }

    #[test]
    fn codec_reports_dangling_roots_as_scene_errors() {
        let mut s = Scene::new();
        s.add(Node::group("ok"));
        s.roots.push(NodeId::default());

        assert!(SceneCodec::encode_subtree(&s, NodeId::default()).is_none());
        assert!(matches!(SceneCodec::encode_scene(&s), Err(EngineError::Scene(_))));
    }

    #[test]
    fn kind_type_names_are_stable() {
        assert_eq!(NodeKind::Group.type_name(), "group");
        assert_eq!(
            NodeKind::DirectionalLight {
                color: Color::WHITE,
                intensity: 0.3
            }
            .type_name(),
            "directional_light"
        );
    }
}
