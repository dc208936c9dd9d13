//! Scene Tree Tests
//!
//! Tests for:
//! - Child insertion order and attach validation
//! - Dirty flag propagation
//! - Traversal and id path lookup
//! - Update stage order, max delta splitting and animation speed
//! - Clone and dispose
//! - Render chain ordering

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec2;
use parking_lot::Mutex;

use lime::animation::{Animation, Animator, AnimatorTrack, KeyFunction, Value};
use lime::errors::LimeError;
use lime::scene::properties::{POSITION, VISIBLE};
use lime::scene::{DescendantCursor, Presenter, RenderList, RenderObject, TaskStatus};
use lime::settings::EngineSettings;
use lime::{DirtyFlags, EditorFlags, NodeHandle, NodeKind, Scene};

fn named(scene: &mut Scene, kind: NodeKind, id: &str) -> NodeHandle {
    scene.build_node(kind).with_id(id).build().unwrap()
}

fn child_ids(scene: &Scene, parent: NodeHandle) -> Vec<String> {
    scene
        .children(parent)
        .filter_map(|c| scene.get_node(c).and_then(|n| n.id()).map(str::to_string))
        .collect()
}

fn clean_all(scene: &mut Scene, root: NodeHandle) {
    for node in scene.subtree(root) {
        scene.clean_dirty_flags(node, DirtyFlags::ALL);
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn add_inserts_first_and_push_inserts_last() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let a = named(&mut scene, NodeKind::Image, "A");
    let b = named(&mut scene, NodeKind::Image, "B");
    let c = named(&mut scene, NodeKind::Image, "C");
    let d = named(&mut scene, NodeKind::Image, "D");

    scene.push_node(root, a).unwrap();
    scene.add_node(root, b).unwrap();
    scene.push_node(root, c).unwrap();
    scene.insert_node_at(root, 2, d).unwrap();

    assert_eq!(child_ids(&scene, root), vec!["B", "A", "D", "C"]);
    assert_eq!(scene.child_count(root), 4);
    assert_eq!(scene.nth_child(root, 2), Some(d));
    assert_eq!(scene.parent(d), Some(root));
}

#[test]
fn attach_rejects_parented_and_cyclic() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let child = scene.build_node(NodeKind::Frame).with_parent(root).build().unwrap();
    let grandchild = scene.build_node(NodeKind::Frame).with_parent(child).build().unwrap();
    let other = scene.create_node(NodeKind::Frame);

    assert!(matches!(scene.add_node(other, child), Err(LimeError::AlreadyParented { .. })));

    scene.unlink(child);
    assert!(matches!(scene.add_node(grandchild, child), Err(LimeError::CyclicHierarchy { .. })));
    assert!(matches!(scene.add_node(child, child), Err(LimeError::CyclicHierarchy { .. })));
    assert!(scene.add_node(other, child).is_ok());
    assert_eq!(scene.root_of(grandchild), other);
}

#[test]
fn unlink_keeps_sibling_links_consistent() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let ids = ["A", "B", "C"];
    let handles: Vec<NodeHandle> = ids
        .iter()
        .map(|id| scene.build_node(NodeKind::Image).with_id(id).build().unwrap())
        .collect();
    for &h in &handles {
        scene.push_node(root, h).unwrap();
    }

    assert!(scene.remove_node(root, handles[1]));
    assert_eq!(child_ids(&scene, root), vec!["A", "C"]);
    assert_eq!(scene.parent(handles[1]), None);
    assert!(!scene.remove_node(root, handles[1]));

    scene.unlink(handles[2]);
    assert_eq!(child_ids(&scene, root), vec!["A"]);
    assert_eq!(scene.get_node(root).unwrap().last_child(), Some(handles[0]));
}

#[test]
fn stale_handles_are_reported() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let gone = scene.create_node(NodeKind::Frame);
    scene.dispose(gone);
    assert!(matches!(scene.add_node(root, gone), Err(LimeError::StaleHandle)));
    assert!(matches!(
        scene.set_property(gone, POSITION, Value::Vector2(Vec2::ONE)),
        Err(LimeError::StaleHandle)
    ));
}

// ============================================================================
// Dirty flags
// ============================================================================

#[test]
fn property_change_dirties_subtree_only() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let child = scene.build_node(NodeKind::Frame).with_parent(root).build().unwrap();
    let grandchild = scene.build_node(NodeKind::Image).with_parent(child).build().unwrap();
    clean_all(&mut scene, root);

    scene.set_property(child, POSITION, Value::Vector2(Vec2::new(5.0, 5.0))).unwrap();

    assert!(!scene.get_node(root).unwrap().is_dirty(DirtyFlags::TRANSFORM));
    assert!(scene.get_node(child).unwrap().is_dirty(DirtyFlags::GLOBAL_TRANSFORM));
    assert!(scene.get_node(grandchild).unwrap().is_dirty(DirtyFlags::LOCAL_TRANSFORM));
    assert!(!scene.get_node(grandchild).unwrap().is_dirty(DirtyFlags::COLOR));
}

#[test]
fn unchanged_value_does_not_dirty() {
    let mut scene = Scene::new();
    let node = scene
        .build_node(NodeKind::Image)
        .with_property(VISIBLE, Value::Bool(true))
        .build()
        .unwrap();
    clean_all(&mut scene, node);

    scene.set_property(node, VISIBLE, Value::Bool(true)).unwrap();
    assert!(scene.get_node(node).unwrap().dirty_mask().is_empty());

    scene.set_property(node, VISIBLE, Value::Bool(false)).unwrap();
    assert!(scene.get_node(node).unwrap().is_dirty(DirtyFlags::VISIBLE));
}

#[test]
fn property_kind_cannot_change() {
    let mut scene = Scene::new();
    let node = scene
        .build_node(NodeKind::Image)
        .with_property("Opacity", Value::Float(1.0))
        .build()
        .unwrap();
    let err = scene.set_property(node, "Opacity", Value::Bool(true)).unwrap_err();
    assert!(matches!(err, LimeError::PropertyTypeMismatch { .. }));
    assert_eq!(scene.property(node, "Opacity"), Some(&Value::Float(1.0)));
}

#[test]
fn attach_marks_child_fully_dirty() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let child = scene.create_node(NodeKind::Image);
    clean_all(&mut scene, child);

    scene.push_node(root, child).unwrap();

    assert_eq!(scene.get_node(child).unwrap().dirty_mask(), DirtyFlags::ALL);
}

#[test]
fn editor_flags_invalidate_visibility() {
    let mut scene = Scene::new();
    let node = scene.create_node(NodeKind::Image);
    clean_all(&mut scene, node);

    scene.set_editor_flags(node, EditorFlags::HIDDEN, true);

    let n = scene.get_node(node).unwrap();
    assert!(n.editor_flags().contains(EditorFlags::HIDDEN));
    assert!(n.is_dirty(DirtyFlags::VISIBLE));
    assert!(!n.is_visible());
}

// ============================================================================
// Traversal & lookup
// ============================================================================

/// ```text
/// Root
/// ├── A
/// │   ├── A1
/// │   └── Shared
/// └── B
///     └── Shared
/// ```
fn sample_tree() -> (Scene, NodeHandle) {
    let mut scene = Scene::new();
    let root = named(&mut scene, NodeKind::Frame, "Root");
    let a = scene.build_node(NodeKind::Frame).with_id("A").with_parent(root).build().unwrap();
    let b = scene.build_node(NodeKind::Frame).with_id("B").with_parent(root).build().unwrap();
    scene.build_node(NodeKind::Image).with_id("A1").with_parent(a).build().unwrap();
    scene.build_node(NodeKind::Image).with_id("Shared").with_parent(a).build().unwrap();
    scene.build_node(NodeKind::Image).with_id("Shared").with_parent(b).build().unwrap();
    (scene, root)
}

#[test]
fn descendants_are_pre_order() {
    let (scene, root) = sample_tree();
    let ids: Vec<&str> = scene
        .descendants(root)
        .filter_map(|h| scene.get_node(h).and_then(|n| n.id()))
        .collect();
    assert_eq!(ids, vec!["A", "A1", "Shared", "B", "Shared"]);
    assert_eq!(scene.subtree(root).len(), 6);
}

#[test]
fn cursor_visits_nodes_inserted_ahead() {
    let (mut scene, root) = sample_tree();
    let mut cursor = DescendantCursor::new(root);
    let mut visited = Vec::new();
    while let Some(handle) = cursor.move_next(&scene) {
        let id = scene.get_node(handle).and_then(|n| n.id()).unwrap_or_default().to_string();
        match id.as_str() {
            "A" => {
                let first = named(&mut scene, NodeKind::Image, "A0");
                scene.add_node(handle, first).unwrap();
            }
            "A1" => {
                let a = scene.parent(handle).unwrap();
                let last = named(&mut scene, NodeKind::Image, "A2");
                scene.push_node(a, last).unwrap();
            }
            "B" => {
                let tail = named(&mut scene, NodeKind::Frame, "C");
                scene.push_node(root, tail).unwrap();
            }
            _ => {}
        }
        visited.push(id);
    }
    assert_eq!(visited, vec!["A", "A0", "A1", "Shared", "A2", "B", "Shared", "C"]);
}

#[test]
fn ancestors_walk_to_root() {
    let (scene, root) = sample_tree();
    let a1 = scene.find_node(root, "A/A1").unwrap();
    let ids: Vec<&str> = scene
        .ancestors(a1)
        .filter_map(|h| scene.get_node(h).and_then(|n| n.id()))
        .collect();
    assert_eq!(ids, vec!["A", "Root"]);
    assert!(scene.is_descendant_of(a1, root));
    assert!(!scene.is_descendant_of(root, a1));
    assert!(scene.same_or_descendant_of(a1, a1));
}

#[test]
fn find_node_follows_id_paths() {
    let (scene, root) = sample_tree();
    let b = scene.find_node(root, "B").unwrap();
    let under_b = scene.find_node(root, "B/Shared").unwrap();
    assert_eq!(scene.parent(under_b), Some(b));

    // Breadth-first per segment, first match wins.
    let first = scene.find_node(root, "Shared").unwrap();
    assert_eq!(scene.get_node(scene.parent(first).unwrap()).unwrap().id(), Some("A"));

    let err = scene.find_node(root, "B/A1").unwrap_err();
    assert!(matches!(err, LimeError::NodeNotFound { ref path, .. } if path == "B/A1"));
}

#[test]
fn find_node_by_tag() {
    let (mut scene, root) = sample_tree();
    let a1 = scene.find_node(root, "A/A1").unwrap();
    scene.get_node_mut(a1).unwrap().tag = Some("hero".to_string());
    assert_eq!(scene.try_find_node_by_tag(root, "hero"), Some(a1));
    assert_eq!(scene.try_find_node_by_tag(root, "villain"), None);
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn update_runs_stages_in_order() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let child = scene.build_node(NodeKind::Frame).with_parent(root).build().unwrap();
    let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));

    let l = log.clone();
    scene.on_updating(root, move |_, _, _| l.lock().push("updating"));
    let l = log.clone();
    scene.add_task(root, move |_: &mut Scene, _: NodeHandle, _: f32| {
        l.lock().push("task");
        TaskStatus::Running
    });
    let l = log.clone();
    scene.on_updating(child, move |_, _, _| l.lock().push("child"));
    let l = log.clone();
    scene.add_late_task(root, move |_: &mut Scene, _: NodeHandle, _: f32| {
        l.lock().push("late");
        TaskStatus::Running
    });
    let l = log.clone();
    scene.on_updated(root, move |_, _, _| l.lock().push("updated"));

    scene.update(root, 0.016);

    assert_eq!(*log.lock(), vec!["updating", "task", "child", "late", "updated"]);
}

#[test]
fn completed_tasks_are_removed() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Node);
    let steps = Arc::new(AtomicUsize::new(0));
    let s = steps.clone();
    scene.add_task(root, move |_: &mut Scene, _: NodeHandle, _: f32| {
        if s.fetch_add(1, Ordering::SeqCst) == 1 {
            TaskStatus::Completed
        } else {
            TaskStatus::Running
        }
    });

    for _ in 0..5 {
        scene.update(root, 0.016);
    }

    assert_eq!(steps.load(Ordering::SeqCst), 2);
}

#[test]
fn large_delta_is_split_by_max_delta() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Node);
    let deltas = Arc::new(Mutex::new(Vec::new()));
    let d = deltas.clone();
    scene.on_updating(root, move |_, _, delta| d.lock().push(delta));

    scene.update(root, 0.25);

    let deltas = deltas.lock();
    assert_eq!(deltas.len(), 3);
    assert!((deltas[0] - 0.1).abs() < 1e-6);
    assert!((deltas[2] - 0.05).abs() < 1e-4);
    let total: f32 = deltas.iter().sum();
    assert!((total - 0.25).abs() < 1e-5);
}

#[test]
fn zero_max_delta_disables_splitting() {
    let settings = EngineSettings {
        max_delta: 0.0,
        ..EngineSettings::default()
    };
    let mut scene = Scene::with_settings(settings);
    let root = scene.create_node(NodeKind::Node);
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    scene.on_updating(root, move |_, _, _| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    scene.update(root, 1.0);

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn animation_speed_scales_child_delta() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let child = scene.build_node(NodeKind::Frame).with_parent(root).build().unwrap();
    scene.get_node_mut(child).unwrap().animation_speed = 0.5;
    let seen = Arc::new(Mutex::new(0.0_f32));
    let s = seen.clone();
    scene.on_updating(child, move |_, _, delta| *s.lock() += delta);

    scene.update(root, 0.08);

    assert!((*seen.lock() - 0.04).abs() < 1e-6);
}

#[test]
fn handler_may_dispose_during_update() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let first = scene.build_node(NodeKind::Frame).with_parent(root).build().unwrap();
    let second = scene.build_node(NodeKind::Frame).with_parent(root).build().unwrap();
    scene.on_updating(first, move |scene, node, _| scene.schedule_unlink_and_dispose(node));
    let reached = Arc::new(AtomicUsize::new(0));
    let r = reached.clone();
    scene.on_updating(second, move |_, _, _| {
        r.fetch_add(1, Ordering::SeqCst);
    });

    scene.update(root, 0.016);

    assert!(!scene.contains(first));
    assert!(scene.contains(second));
    assert_eq!(reached.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Clone & dispose
// ============================================================================

#[test]
fn clone_copies_subtree_and_shares_keys() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let animator = Animator::new("X", AnimatorTrack::new_float())
        .key(0, Value::Float(0.0), KeyFunction::Linear)
        .unwrap();
    let child = scene
        .build_node(NodeKind::Image)
        .with_id("Body")
        .with_animator(animator)
        .with_parent(root)
        .build()
        .unwrap();
    let walk = scene.add_animation(root, Animation::new("walk")).unwrap();
    scene.on_updating(root, |_, _, _| {});

    let copy = scene.clone_node(root).unwrap();

    assert_eq!(scene.parent(copy), None);
    let copied_child = scene.find_node(copy, "Body").unwrap();
    assert_ne!(copied_child, child);
    let original = scene.get_node(child).unwrap().animators().iter().next().unwrap();
    let copied = scene.get_node(copied_child).unwrap().animators().iter().next().unwrap();
    assert!(copied.shares_keys_with(original));

    let copied_walk = scene.try_find_animation(copy, Some("walk")).unwrap();
    assert_ne!(copied_walk.serial, walk.serial);
    assert_eq!(scene.animation(copied_walk).unwrap().owner(), Some(copy));

    scene.unlink(copied_child);
    assert_eq!(scene.child_count(copy), 0);
    assert_eq!(scene.child_count(root), 1);
    assert_eq!(scene.parent(child), Some(root));
}

#[test]
fn dispose_releases_subtree_and_stops_animations() {
    let mut scene = Scene::new();
    let root = scene.create_node(NodeKind::Frame);
    let child = scene.build_node(NodeKind::Frame).with_parent(root).build().unwrap();
    let grandchild = scene.build_node(NodeKind::Image).with_parent(child).build().unwrap();
    let anim = scene.add_animation(grandchild, Animation::new("spin")).unwrap();
    scene.set_animation_running(anim, true);
    let stopped = Arc::new(AtomicUsize::new(0));
    let s = stopped.clone();
    scene.animation_mut(anim).unwrap().on_stopped(move || {
        s.fetch_add(1, Ordering::SeqCst);
    });

    scene.dispose(child);

    assert!(!scene.contains(child));
    assert!(!scene.contains(grandchild));
    assert_eq!(scene.child_count(root), 0);
    assert_eq!(scene.node_count(), 1);
    assert_eq!(stopped.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Render chain
// ============================================================================

struct Label(&'static str);

impl Presenter for Label {
    fn render_object(&self, _scene: &Scene, _node: NodeHandle) -> Option<RenderObject> {
        Some(Box::new(self.0))
    }
}

fn labelled(scene: &mut Scene, parent: Option<NodeHandle>, label: &'static str) -> NodeHandle {
    let node = scene.create_node(NodeKind::Image);
    scene.get_node_mut(node).unwrap().set_presenter(Some(Arc::new(Label(label))));
    if let Some(parent) = parent {
        scene.push_node(parent, node).unwrap();
    }
    node
}

fn draw_labels(scene: &Scene, root: NodeHandle) -> Vec<&'static str> {
    let mut list = RenderList::new();
    scene.add_to_render_chain(root, &mut list);
    list.draw_order()
        .into_iter()
        .filter_map(|e| e.presenter.render_object(scene, e.node))
        .filter_map(|o| o.downcast::<&'static str>().ok().map(|b| *b))
        .collect()
}

#[test]
fn render_chain_draws_parent_under_children() {
    let mut scene = Scene::new();
    let root = labelled(&mut scene, None, "R");
    labelled(&mut scene, Some(root), "A");
    labelled(&mut scene, Some(root), "B");

    assert_eq!(draw_labels(&scene, root), vec!["R", "A", "B"]);
}

#[test]
fn render_chain_skips_hidden_subtrees() {
    let mut scene = Scene::new();
    let root = labelled(&mut scene, None, "R");
    let a = labelled(&mut scene, Some(root), "A");
    labelled(&mut scene, Some(a), "A1");
    labelled(&mut scene, Some(root), "B");
    scene.set_property(a, VISIBLE, Value::Bool(false)).unwrap();

    assert_eq!(draw_labels(&scene, root), vec!["R", "B"]);
}

#[test]
fn render_chain_orders_layers_above() {
    let mut scene = Scene::new();
    let root = labelled(&mut scene, None, "R");
    let a = labelled(&mut scene, Some(root), "A");
    labelled(&mut scene, Some(a), "A1");
    labelled(&mut scene, Some(root), "B");
    scene.get_node_mut(a).unwrap().layer = 5;

    assert_eq!(draw_labels(&scene, root), vec!["R", "B", "A", "A1"]);
}
