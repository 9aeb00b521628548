use std::rc::Rc;

use scene_ngin::{
    Node, SceneError,
    cgmath::{Matrix4, SquareMatrix, Vector3},
};

use crate::common::test_utils::{init_logger, mesh, translation};

mod common;

#[test]
fn should_create_node_with_defaults() {
    let node = Node::new("root");

    assert_eq!(node.name(), "root");
    assert_eq!(node.retain_count(), 1);
    assert_eq!(node.local_transform(), Matrix4::identity());
    assert!(node.mesh().is_none());
    assert_eq!(node.child_count(), 0);
    assert!(node.is_visible());
    assert_eq!(node.max_distance(), None);
    assert!(!node.first_visible_only());
}

#[test]
fn should_keep_node_alive_after_retain_release() {
    let node = Node::new("node");
    let weak = node.downgrade();

    let extra = node.retain();
    assert_eq!(node.retain_count(), 2);
    extra.release();

    assert_eq!(node.retain_count(), 1);
    assert!(weak.is_alive());
}

#[test]
fn should_free_node_when_last_owner_releases() {
    let node = Node::new("node");
    let weak = node.downgrade();
    let second = node.retain();
    let third = node.retain();

    node.release();
    second.release();
    assert!(weak.is_alive());
    assert_eq!(weak.upgrade().map(|n| n.retain_count()), Some(2));

    third.release();
    assert!(!weak.is_alive());
    assert!(weak.upgrade().is_none());
}

#[test]
fn should_release_mesh_and_children_on_free() {
    init_logger();
    let shared = mesh("shared");
    let root = Node::new("root");
    root.set_mesh(Some(Rc::clone(&shared)));
    let child = Node::new("child");
    child.set_mesh(Some(Rc::clone(&shared)));
    root.add_child(&child).unwrap();
    assert_eq!(Rc::strong_count(&shared), 3);
    assert_eq!(child.retain_count(), 2);

    let weak_root = root.downgrade();
    let weak_child = child.downgrade();
    child.release();
    assert!(weak_child.is_alive());

    root.release();
    assert!(!weak_root.is_alive());
    assert!(!weak_child.is_alive());
    assert_eq!(Rc::strong_count(&shared), 1);
}

#[test]
fn should_only_free_shared_child_after_all_parents() {
    let child = Node::new("child");
    let weak_child = child.downgrade();
    let left = Node::new("left");
    let right = Node::new("right");
    left.add_child(&child).unwrap();
    right.add_child(&child).unwrap();
    child.release();

    left.release();
    assert!(weak_child.is_alive());
    right.release();
    assert!(!weak_child.is_alive());
}

#[test]
fn should_retain_new_mesh_and_release_old_one() {
    let first = mesh("first");
    let second = mesh("second");
    let node = Node::new("node");

    node.set_mesh(Some(Rc::clone(&first)));
    assert_eq!(Rc::strong_count(&first), 2);

    node.set_mesh(Some(Rc::clone(&second)));
    assert_eq!(Rc::strong_count(&first), 1);
    assert_eq!(Rc::strong_count(&second), 2);

    node.set_mesh(None);
    assert_eq!(Rc::strong_count(&second), 1);
    assert!(node.mesh().is_none());
}

#[test]
fn should_ignore_setting_the_current_mesh() {
    let current = mesh("current");
    let node = Node::new("node");
    node.set_mesh(Some(Rc::clone(&current)));

    node.set_mesh(Some(Rc::clone(&current)));
    assert_eq!(Rc::strong_count(&current), 2);
    assert!(Rc::ptr_eq(&node.mesh().unwrap(), &current));
}

#[test]
fn should_share_child_mutations_between_parents() {
    let child = Node::new("child");
    let left = Node::new("left");
    let right = Node::new("right");
    left.add_child(&child).unwrap();
    right.add_child(&child).unwrap();
    assert_eq!(child.retain_count(), 3);

    left.child(0).unwrap().set_visible(false);

    let through_right = right.child(0).unwrap();
    assert!(Node::ptr_eq(&through_right, &child));
    assert!(!through_right.is_visible());
}

#[test]
fn should_keep_children_in_insertion_order() {
    let root = Node::new("root");
    for name in ["a", "b", "c"] {
        root.add_child(&Node::new(name)).unwrap();
    }

    let names: Vec<String> = root.children().iter().map(Node::name).collect();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn should_reject_cycles() {
    init_logger();
    let a = Node::new("a");
    let b = Node::new("b");
    let c = Node::new("c");
    a.add_child(&b).unwrap();
    b.add_child(&c).unwrap();

    let err = c.add_child(&a).unwrap_err();
    assert_eq!(
        err,
        SceneError::CycleDetected {
            parent: "c".to_string(),
            child: "a".to_string(),
        }
    );
    assert_eq!(err.code(), -2);
    assert_eq!(c.child_count(), 0);
    assert_eq!(a.retain_count(), 1);

    let err = a.add_child(&a).unwrap_err();
    assert!(matches!(err, SceneError::CycleDetected { .. }));
    assert_eq!(a.child_count(), 1);
}

#[test]
fn should_allow_diamond_shaped_graphs() {
    let root = Node::new("root");
    let left = Node::new("left");
    let right = Node::new("right");
    let leaf = Node::new("leaf");
    root.add_child(&left).unwrap();
    root.add_child(&right).unwrap();
    left.add_child(&leaf).unwrap();

    assert!(right.add_child(&leaf).is_ok());
    assert!(root.has_descendant(&leaf));
    assert!(!leaf.has_descendant(&root));
}

#[test]
fn should_add_one_child_per_mesh() {
    let offset = translation(0.0, 2.0, 0.0);
    let wing = Rc::new(scene_ngin::Mesh::quad("wing", 1.0).with_default_transform(offset));
    let body = mesh("body");
    let root = Node::new("tie-bomber");

    root.add_children(&[Rc::clone(&wing), Rc::clone(&body)]);

    assert_eq!(root.child_count(), 2);
    let first = root.child(0).unwrap();
    assert_eq!(first.name(), "wing");
    assert_eq!(first.local_transform(), offset);
    assert!(Rc::ptr_eq(&first.mesh().unwrap(), &wing));
    // our handle plus the child list
    assert_eq!(first.retain_count(), 2);

    let second = root.child(1).unwrap();
    assert_eq!(second.name(), "body");
    assert_eq!(second.local_transform(), Matrix4::identity());

    let weak_first = first.downgrade();
    drop((first, second));
    root.release();
    assert!(!weak_first.is_alive());
    assert_eq!(Rc::strong_count(&wing), 1);
    assert_eq!(Rc::strong_count(&body), 1);
}

#[test]
fn should_ignore_empty_mesh_list() {
    init_logger();
    let root = Node::new("root");
    root.add_children(&[]);
    assert_eq!(root.child_count(), 0);
}

#[test]
fn should_post_multiply_translations() {
    let node = Node::new("node");
    node.translate(Vector3::new(1.0, 0.0, 0.0));
    node.translate(Vector3::new(0.0, 2.0, 0.0));

    assert_eq!(node.local_transform(), translation(1.0, 2.0, 0.0));
}

#[test]
fn should_rename_node_for_every_owner() {
    let node = Node::new("before");
    let other = node.retain();

    other.set_name("after");

    assert_eq!(node.name(), "after");
}
