//! Asset Loading Tests
//!
//! Tests for:
//! - Scene path resolution (extensions, ambiguity, misses)
//! - External scene mounting and cyclic dependency detection
//! - External animation data (`.ant`) loading
//! - Content replacement rules
//! - Description round trip through the tree

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec2;

use lime::animation::{Animation, Animator, AnimatorTrack, Value, ValueType};
use lime::assets::{
    AnimationDataDescription, AnimationDataSource, AnimationDescription, AnimatorDescription, KeyDescription,
    MemoryBundle, NodeDescription, SceneLoader,
};
use lime::errors::LimeError;
use lime::scene::properties::SIZE;
use lime::scene::{AssetBundlePathComponent, NodeComponent};
use lime::{KeyFunction, MarkerList, NodeHandle, NodeKind, Scene};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn float_key(frame: i32, value: f32) -> KeyDescription {
    KeyDescription {
        frame,
        value: Value::Float(value),
        function: KeyFunction::Linear,
    }
}

fn loader_with(files: &[(&str, &NodeDescription)]) -> (Arc<MemoryBundle>, SceneLoader) {
    let bundle = Arc::new(MemoryBundle::new());
    for (path, description) in files {
        bundle.insert_json(*path, *description).unwrap();
    }
    let loader = SceneLoader::new(bundle.clone());
    (bundle, loader)
}

fn child_ids(scene: &Scene, parent: NodeHandle) -> Vec<String> {
    scene
        .children(parent)
        .filter_map(|c| scene.get_node(c).and_then(|n| n.id()).map(str::to_string))
        .collect()
}

// ============================================================================
// Path resolution
// ============================================================================

#[test]
fn load_resolves_extension() {
    let main = NodeDescription::new(NodeKind::Frame).with_id("Main");
    let (_, loader) = loader_with(&[("Scenes/Main.tan", &main)]);
    let mut scene = Scene::new();

    let root = loader.load(&mut scene, "Scenes/Main").unwrap();

    let node = scene.get_node(root).unwrap();
    assert_eq!(node.id(), Some("Main"));
    let path = node.components().get::<AssetBundlePathComponent>().unwrap();
    assert_eq!(path.path, "Scenes/Main.tan");
}

#[test]
fn load_accepts_full_path() {
    let main = NodeDescription::new(NodeKind::Frame);
    let (_, loader) = loader_with(&[("Main.scene", &main)]);
    let mut scene = Scene::new();
    assert!(loader.load(&mut scene, "Main.scene").is_ok());
}

#[test]
fn load_reports_missing_scene() {
    let (_, loader) = loader_with(&[]);
    let mut scene = Scene::new();
    let err = loader.load(&mut scene, "Nowhere").unwrap_err();
    assert!(matches!(err, LimeError::SceneNotFound { ref path, ref candidates } if path == "Nowhere" && candidates.contains("Nowhere.t3d")));
}

#[test]
fn load_reports_ambiguous_scene() {
    let main = NodeDescription::new(NodeKind::Frame);
    let (_, loader) = loader_with(&[("Main.scene", &main), ("Main.t3d", &main)]);
    let mut scene = Scene::new();
    let err = loader.load(&mut scene, "Main").unwrap_err();
    assert!(matches!(err, LimeError::AmbiguousScenePath { .. }));
    assert_eq!(scene.node_count(), 0);
}

#[test]
fn load_reports_malformed_json() {
    let bundle = Arc::new(MemoryBundle::new());
    bundle.insert("Broken.scene", b"{ not json".to_vec());
    let loader = SceneLoader::new(bundle);
    let mut scene = Scene::new();
    assert!(matches!(loader.load(&mut scene, "Broken"), Err(LimeError::Json(_))));
}

// ============================================================================
// External scenes
// ============================================================================

#[test]
fn external_scene_replaces_host_children() -> anyhow::Result<()> {
    init_logger();
    let hero = NodeDescription::new(NodeKind::Frame)
        .with_child(NodeDescription::new(NodeKind::Image).with_id("Head"))
        .with_child(NodeDescription::new(NodeKind::Image).with_id("Body"));
    let main = NodeDescription::new(NodeKind::Frame).with_child(
        NodeDescription::new(NodeKind::Frame)
            .with_id("Slot")
            .with_contents_path("Characters/Hero")
            .with_child(NodeDescription::new(NodeKind::Image).with_id("Placeholder")),
    );
    let (_, loader) = loader_with(&[("Main.scene", &main), ("Characters/Hero.scene", &hero)]);
    let mut scene = Scene::new();

    let root = loader.load(&mut scene, "Main")?;

    let slot = scene.find_node(root, "Slot")?;
    assert_eq!(child_ids(&scene, slot), vec!["Head", "Body"]);
    let mounted = scene.get_node(slot).unwrap().components().get::<AssetBundlePathComponent>().unwrap();
    assert_eq!(mounted.path, "Characters/Hero.scene");
    // Content root is disposed after the transfer.
    assert_eq!(scene.node_count(), 4);
    Ok(())
}

#[test]
fn unresolved_external_scene_keeps_host() {
    let main = NodeDescription::new(NodeKind::Frame).with_child(
        NodeDescription::new(NodeKind::Frame)
            .with_id("Slot")
            .with_contents_path("Missing")
            .with_child(NodeDescription::new(NodeKind::Image).with_id("Placeholder")),
    );
    let (_, loader) = loader_with(&[("Main.scene", &main)]);
    let mut scene = Scene::new();

    let root = loader.load(&mut scene, "Main").unwrap();

    let slot = scene.find_node(root, "Slot").unwrap();
    assert_eq!(child_ids(&scene, slot), vec!["Placeholder"]);
}

#[test]
fn cyclic_scenes_are_rejected_without_leaks() {
    let a = NodeDescription::new(NodeKind::Frame)
        .with_child(NodeDescription::new(NodeKind::Frame).with_contents_path("B"));
    let b = NodeDescription::new(NodeKind::Frame)
        .with_child(NodeDescription::new(NodeKind::Frame).with_contents_path("A"));
    let (_, loader) = loader_with(&[("A.scene", &a), ("B.scene", &b)]);
    let mut scene = Scene::new();

    let err = loader.load(&mut scene, "A").unwrap_err();
    assert!(matches!(err, LimeError::CyclicDependency { ref path } if path == "A.scene"));
    assert_eq!(scene.node_count(), 0);

    // The loading set is cleared on the error path.
    assert!(matches!(loader.load(&mut scene, "B"), Err(LimeError::CyclicDependency { ref path }) if path == "B.scene"));
}

#[test]
fn same_scene_may_be_mounted_twice() {
    let leaf = NodeDescription::new(NodeKind::Frame).with_child(NodeDescription::new(NodeKind::Image).with_id("Leaf"));
    let main = NodeDescription::new(NodeKind::Frame)
        .with_child(NodeDescription::new(NodeKind::Frame).with_id("Left").with_contents_path("Leaf"))
        .with_child(NodeDescription::new(NodeKind::Frame).with_id("Right").with_contents_path("Leaf"));
    let (_, loader) = loader_with(&[("Main.scene", &main), ("Leaf.scene", &leaf)]);
    let mut scene = Scene::new();

    let root = loader.load(&mut scene, "Main").unwrap();

    assert!(scene.find_node(root, "Left/Leaf").is_ok());
    assert!(scene.find_node(root, "Right/Leaf").is_ok());
}

#[test]
fn on_built_runs_for_top_level_scene_only() {
    let leaf = NodeDescription::new(NodeKind::Frame);
    let main = NodeDescription::new(NodeKind::Frame)
        .with_child(NodeDescription::new(NodeKind::Frame).with_contents_path("Leaf"));
    let bundle = Arc::new(MemoryBundle::new());
    bundle.insert_json("Main.scene", &main).unwrap();
    bundle.insert_json("Leaf.scene", &leaf).unwrap();
    let built = Arc::new(AtomicUsize::new(0));
    let b = built.clone();
    let loader = SceneLoader::new(bundle).with_on_built(move |_, _| {
        b.fetch_add(1, Ordering::SeqCst);
    });
    let mut scene = Scene::new();

    loader.load(&mut scene, "Main").unwrap();

    assert_eq!(built.load(Ordering::SeqCst), 1);
}

// ============================================================================
// External animation data
// ============================================================================

#[test]
fn external_animation_loads_on_first_run() -> anyhow::Result<()> {
    init_logger();
    let mut main = NodeDescription::new(NodeKind::Frame)
        .with_child(NodeDescription::new(NodeKind::Image).with_id("Body"));
    main.animations.push(AnimationDescription {
        id: Some("walk".to_string()),
        is_legacy: false,
        contents_path: Some("Anims/Walk".to_string()),
        markers: MarkerList::new(),
        engine: lime::EngineKind::Default,
    });
    let walk_data = AnimationDataDescription {
        animators: vec![AnimatorDescription {
            property: "Body/X".to_string(),
            animation_id: None,
            value_type: ValueType::Float,
            keys: vec![float_key(0, 0.0), float_key(30, 30.0)],
        }],
    };
    let (bundle, loader) = loader_with(&[("Main.scene", &main)]);
    bundle.insert_json("Anims/Walk.ant", &walk_data)?;
    let loader = Arc::new(loader);
    let mut scene = Scene::new();
    scene.set_animation_data_source(Some(loader.clone() as Arc<dyn AnimationDataSource>));

    let root = loader.load(&mut scene, "Main")?;
    let body = scene.find_node(root, "Body")?;
    assert!(scene.get_node(body).unwrap().animators().is_empty());

    scene.run_animation(root, None, Some("walk"))?;
    scene.update(root, 0.5);

    let animator = scene.get_node(body).unwrap().animators().try_find("X", Some("walk")).unwrap();
    assert_eq!(animator.animation_id.as_deref(), Some("walk"));
    let x = scene.property(body, "X").and_then(Value::as_float).unwrap();
    assert!((x - 15.0).abs() < 1e-3, "Expected 15.0, got {x}");

    // Loaded animators are dropped before saving and reloaded on demand.
    scene.remove_animators_for_external_animations(root);
    assert!(scene.get_node(body).unwrap().animators().is_empty());
    let walk = scene.try_find_animation(root, Some("walk")).unwrap();
    scene.set_animation_frame(walk, 10);
    let x = scene.property(body, "X").and_then(Value::as_float).unwrap();
    assert!((x - 10.0).abs() < 1e-3);
    Ok(())
}

#[test]
fn unknown_animator_type_fails_instantiation() {
    let mut main = NodeDescription::new(NodeKind::Frame)
        .with_child(NodeDescription::new(NodeKind::Image).with_id("Body"));
    main.children[0].animators.push(AnimatorDescription {
        property: "Mesh".to_string(),
        animation_id: None,
        value_type: ValueType::Other("MeshData".to_string()),
        keys: Vec::new(),
    });
    let (_, loader) = loader_with(&[("Main.scene", &main)]);
    let mut scene = Scene::new();

    let err = loader.load(&mut scene, "Main").unwrap_err();
    assert!(matches!(err, LimeError::UnregisteredAnimatorType { .. }));
    assert_eq!(scene.node_count(), 0);
}

// ============================================================================
// Content replacement
// ============================================================================

#[derive(Clone)]
struct LockSize;

impl NodeComponent for LockSize {
    fn clone_component(&self) -> Box<dyn NodeComponent> {
        Box::new(self.clone())
    }

    fn locked_properties(&self) -> &[&'static str] {
        &[SIZE]
    }
}

#[test]
fn replace_content_transfers_children_animations_and_locked_properties() {
    let mut scene = Scene::new();
    let host = scene
        .build_node(NodeKind::Frame)
        .with_property(SIZE, Value::Vector2(Vec2::ONE))
        .with_property("Opacity", Value::Float(0.5))
        .build()
        .unwrap();
    scene.build_node(NodeKind::Image).with_id("Old").with_parent(host).build().unwrap();
    let content = scene
        .build_node(NodeKind::Frame)
        .with_property(SIZE, Value::Vector2(Vec2::new(10.0, 10.0)))
        .with_property("Opacity", Value::Float(1.0))
        .with_animation(Animation::new("walk"))
        .build()
        .unwrap();
    scene.get_node_mut(content).unwrap().components_mut().add(LockSize);
    scene.build_node(NodeKind::Image).with_id("X").with_parent(content).build().unwrap();
    scene.build_node(NodeKind::Image).with_id("Y").with_parent(content).build().unwrap();

    scene.replace_content(host, content).unwrap();

    assert!(!scene.contains(content));
    assert_eq!(child_ids(&scene, host), vec!["X", "Y"]);
    assert_eq!(scene.property(host, SIZE), Some(&Value::Vector2(Vec2::new(10.0, 10.0))));
    assert_eq!(scene.property(host, "Opacity"), Some(&Value::Float(0.5)));
    let walk = scene.try_find_animation(host, Some("walk")).unwrap();
    assert_eq!(scene.animation(walk).unwrap().owner(), Some(host));
    assert!(scene.get_node(host).unwrap().components().contains::<LockSize>());
}

#[test]
fn replace_content_keeps_host_animators() {
    let mut scene = Scene::new();
    let host_track = Animator::new("X", AnimatorTrack::new_float())
        .with_animation_id("main")
        .key(0, Value::Float(1.0), KeyFunction::Linear)
        .unwrap();
    let host = scene.build_node(NodeKind::Frame).with_animator(host_track).build().unwrap();
    let content_main = Animator::new("X", AnimatorTrack::new_float())
        .with_animation_id("main")
        .key(0, Value::Float(9.0), KeyFunction::Linear)
        .unwrap();
    let content_walk = Animator::new("Y", AnimatorTrack::new_float())
        .with_animation_id("walk")
        .key(0, Value::Float(2.0), KeyFunction::Linear)
        .unwrap();
    let content = scene
        .build_node(NodeKind::Frame)
        .with_animator(content_main)
        .with_animator(content_walk)
        .with_animation(Animation::new("walk"))
        .build()
        .unwrap();

    scene.replace_content(host, content).unwrap();

    let animators = scene.get_node(host).unwrap().animators();
    assert_eq!(animators.len(), 2);
    let x = animators.try_find("X", Some("main")).unwrap();
    assert_eq!(x.clone().sample(0.0), Some(Value::Float(1.0)));
    assert!(animators.try_find("Y", Some("walk")).is_some());

    scene.run_animation(host, None, Some("walk")).unwrap();
    assert_eq!(scene.property(host, "Y"), Some(&Value::Float(2.0)));
}

#[test]
fn replace_content_of_button_with_frame_passes_bundle_path_only() {
    let mut scene = Scene::new();
    let host = scene.create_node(NodeKind::Button);
    scene.get_node_mut(host).unwrap().components_mut().add(AssetBundlePathComponent::new("Old.tan"));
    let skin = scene.create_node(NodeKind::Frame);
    {
        let components = scene.get_node_mut(skin).unwrap().components_mut();
        components.add(AssetBundlePathComponent::new("Skins/Button.tan"));
        components.add(LockSize);
    }
    scene.build_node(NodeKind::Image).with_id("Normal").with_parent(skin).build().unwrap();
    scene.build_node(NodeKind::Image).with_id("Pressed").with_parent(skin).build().unwrap();

    scene.replace_content(host, skin).unwrap();

    assert!(!scene.contains(skin));
    assert_eq!(child_ids(&scene, host), vec!["Normal", "Pressed"]);
    let components = scene.get_node(host).unwrap().components();
    assert!(!components.contains::<LockSize>());
    assert_eq!(components.get::<AssetBundlePathComponent>().unwrap().path, "Skins/Button.tan");
}

#[test]
fn replace_content_rejects_unrelated_kinds() {
    let mut scene = Scene::new();
    let host = scene.create_node(NodeKind::Button);
    let old = scene.build_node(NodeKind::Image).with_id("Old").with_parent(host).build().unwrap();
    let content = scene.create_node(NodeKind::Image);

    let err = scene.replace_content(host, content).unwrap_err();

    assert!(matches!(err, LimeError::ContentTypeMismatch { .. }));
    assert!(scene.contains(content));
    assert_eq!(scene.first_child(host), Some(old));
}

#[test]
fn replace_content_unwraps_viewport_for_3d_host() {
    let mut scene = Scene::new();
    let host = scene.create_node(NodeKind::Node3D);
    let viewport = scene.create_node(NodeKind::Viewport3D);
    scene.get_node_mut(viewport).unwrap().components_mut().add(AssetBundlePathComponent::new("Model.t3d"));
    let model = scene.build_node(NodeKind::Node3D).with_id("Model").with_parent(viewport).build().unwrap();
    scene.build_node(NodeKind::Camera3D).with_id("Camera").with_parent(viewport).build().unwrap();

    scene.replace_content(host, viewport).unwrap();

    assert_eq!(child_ids(&scene, host), vec!["Model"]);
    assert_eq!(scene.parent(model), Some(host));
    let path = scene.get_node(host).unwrap().components().get::<AssetBundlePathComponent>().unwrap();
    assert_eq!(path.path, "Model.t3d");
}

// ============================================================================
// Descriptions
// ============================================================================

#[test]
fn describe_subtree_reinstantiates_equal() {
    let mut scene = Scene::new();
    let root = scene
        .build_node(NodeKind::Frame)
        .with_id("Root")
        .with_property(SIZE, Value::Vector2(Vec2::new(4.0, 2.0)))
        .with_animation(Animation::new("walk"))
        .build()
        .unwrap();
    scene.build_node(NodeKind::Image).with_id("Child").with_parent(root).build().unwrap();

    let description = scene.describe_subtree(root).unwrap();
    let json = description.to_json_vec().unwrap();
    let parsed = NodeDescription::from_json_slice(&json).unwrap();
    assert_eq!(parsed, description);

    let copy = scene.instantiate(&parsed).unwrap();
    assert_eq!(scene.describe_subtree(copy).unwrap(), description);
    assert!(scene.try_find_animation(copy, Some("walk")).is_some());
}

#[test]
fn described_markers_are_ordered_by_frame() {
    let json = br#"{
        "kind": "Frame",
        "id": "Root",
        "animations": [{
            "id": "walk",
            "markers": [
                { "id": "end", "frame": 30 },
                { "id": "start", "frame": 10 },
                { "id": "middle", "frame": 20 }
            ]
        }]
    }"#;
    let description = NodeDescription::from_json_slice(json).unwrap();
    let mut scene = Scene::new();
    let root = scene.instantiate(&description).unwrap();
    let walk = scene.try_find_animation(root, Some("walk")).unwrap();

    let frames: Vec<i32> = scene.animation(walk).unwrap().markers.iter().map(|m| m.frame).collect();
    assert_eq!(frames, vec![10, 20, 30]);

    scene.run_animation(root, None, Some("walk")).unwrap();
    scene.rewind_to_next_marker(walk);
    assert_eq!(scene.animation(walk).unwrap().frame(), 10);

    let described = scene.describe_subtree(root).unwrap();
    let ids: Vec<&str> = described.animations[0].markers.iter().filter_map(|m| m.id.as_deref()).collect();
    assert_eq!(ids, vec!["start", "middle", "end"]);
}
