//! Reference counted scene graph nodes.
//!
//! A [`Node`] is a handle to shared node storage. Cloning (or calling
//! [`Node::retain`]) adds an owner, dropping (or calling [`Node::release`])
//! removes one. When the last owner goes away the node first releases its mesh,
//! then every child, then its own storage. There is no other way to destroy a
//! node.
//!
//! The same node may be the child of several parents, so mutating a shared
//! child through one parent is visible through every other parent. Edges that
//! would make the graph cyclic are rejected by [`Node::add_child`].

use std::{
    cell::{Ref, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use cgmath::{Matrix4, SquareMatrix, Vector3};

use crate::{data_structures::mesh::Mesh, error::SceneError};

pub(crate) struct NodeData {
    pub(crate) name: String,
    pub(crate) local_transform: Matrix4<f32>,
    pub(crate) mesh: Option<Rc<Mesh>>,
    pub(crate) children: Vec<Node>,
    pub(crate) visible: bool,
    pub(crate) max_distance: Option<f32>,
    pub(crate) first_visible_only: bool,
}

impl NodeData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            local_transform: Matrix4::identity(),
            mesh: None,
            children: Vec::new(),
            visible: true,
            max_distance: None,
            first_visible_only: false,
        }
    }

    /// Copies everything except the children.
    fn copy_of(name: &str, source: &NodeData) -> Self {
        Self {
            name: name.to_string(),
            local_transform: source.local_transform,
            mesh: source.mesh.clone(),
            children: Vec::with_capacity(source.children.len()),
            visible: source.visible,
            max_distance: source.max_distance,
            first_visible_only: source.first_visible_only,
        }
    }
}

impl Drop for NodeData {
    fn drop(&mut self) {
        log::trace!("freeing node '{}'", self.name);
        // mesh goes first, then the children in collection order
        self.mesh = None;
        for child in self.children.drain(..) {
            child.release();
        }
    }
}

/// Owning handle to a scene graph node.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

/// Non-owning handle to a node. Does not keep the node alive.
#[derive(Clone)]
pub struct WeakNode(Weak<RefCell<NodeData>>);

impl WeakNode {
    /// Returns an owning handle if the node has not been freed yet.
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }

    /// Whether any owner still holds the node.
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl Node {
    /// Creates a positioning node: identity transform, no mesh, no children,
    /// visible, one owner.
    pub fn new(name: &str) -> Self {
        Self(Rc::new(RefCell::new(NodeData::new(name))))
    }

    /// Copies this node, sharing the mesh and the *same* child nodes.
    ///
    /// No child node is allocated; each existing child just gains an owner.
    pub fn clone_sharing_children(&self, name: &str) -> Self {
        let source = self.0.borrow();
        let mut data = NodeData::copy_of(name, &source);
        data.children.extend(source.children.iter().map(Node::retain));
        Self(Rc::new(RefCell::new(data)))
    }

    /// Copies this node and, recursively, all of its descendants.
    ///
    /// Every node in the new subtree is a fresh allocation. Meshes are never
    /// duplicated: the copies point at the same `Rc<Mesh>` as the originals.
    pub fn clone_deep(&self, name: &str) -> Self {
        let source = self.0.borrow();
        let mut data = NodeData::copy_of(name, &source);
        data.children.extend(
            source
                .children
                .iter()
                .map(|child| child.clone_deep(&child.name())),
        );
        Self(Rc::new(RefCell::new(data)))
    }

    /// Adds an owner and returns its handle.
    pub fn retain(&self) -> Self {
        self.clone()
    }

    /// Gives up this handle. Frees the node if it was the last owner.
    pub fn release(self) {
        drop(self);
    }

    /// Number of owners currently holding this node.
    pub fn retain_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Creates a non-owning handle that can observe when the node is freed.
    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    /// Identity comparison.
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn data(&self) -> Ref<'_, NodeData> {
        self.0.borrow()
    }

    /// Informational name, used in logs and errors.
    pub fn name(&self) -> String {
        self.0.borrow().name.clone()
    }

    /// Renames the node. Every owner sees the new name.
    pub fn set_name(&self, name: &str) {
        self.0.borrow_mut().name = name.to_string();
    }

    /// Transform relative to the parent.
    pub fn local_transform(&self) -> Matrix4<f32> {
        self.0.borrow().local_transform
    }

    /// Replaces the transform relative to the parent.
    pub fn set_local_transform(&self, transform: Matrix4<f32>) {
        self.0.borrow_mut().local_transform = transform;
    }

    /// Post-multiplies a translation onto the local transform.
    pub fn translate(&self, offset: Vector3<f32>) {
        let mut data = self.0.borrow_mut();
        data.local_transform = data.local_transform * Matrix4::from_translation(offset);
    }

    /// Returns a new reference to the node's mesh, if any.
    pub fn mesh(&self) -> Option<Rc<Mesh>> {
        self.0.borrow().mesh.clone()
    }

    /// Replaces the mesh reference.
    ///
    /// Setting the mesh the node already holds does nothing. Otherwise the
    /// previous mesh loses this node as an owner and the new one gains it.
    pub fn set_mesh(&self, mesh: Option<Rc<Mesh>>) {
        let mut data = self.0.borrow_mut();
        let unchanged = match (&data.mesh, &mesh) {
            (Some(current), Some(new)) => Rc::ptr_eq(current, new),
            (None, None) => true,
            _ => false,
        };
        if !unchanged {
            data.mesh = mesh;
        }
    }

    /// Nodes start out visible.
    pub fn is_visible(&self) -> bool {
        self.0.borrow().visible
    }

    /// An invisible node hides its entire subtree.
    pub fn set_visible(&self, visible: bool) {
        self.0.borrow_mut().visible = visible;
    }

    /// See [`Node::set_max_distance`].
    pub fn max_distance(&self) -> Option<f32> {
        self.0.borrow().max_distance
    }

    /// Furthest distance from the viewpoint at which this node still qualifies
    /// as a level-of-detail candidate. `None` means unbounded.
    pub fn set_max_distance(&self, max_distance: Option<f32>) {
        self.0.borrow_mut().max_distance = max_distance;
    }

    /// See [`Node::set_first_visible_only`].
    pub fn first_visible_only(&self) -> bool {
        self.0.borrow().first_visible_only
    }

    /// When set, traversal only descends into the first child that passes its
    /// visibility and distance test.
    pub fn set_first_visible_only(&self, first_visible_only: bool) {
        self.0.borrow_mut().first_visible_only = first_visible_only;
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    /// Returns a new owning handle to the child at `idx`.
    pub fn child(&self, idx: usize) -> Option<Node> {
        self.0.borrow().children.get(idx).map(Node::retain)
    }

    /// Owning handles to all children, in order.
    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.iter().map(Node::retain).collect()
    }

    /// Appends `child`, adding the parent as one of its owners.
    ///
    /// The edge is refused (and logged) when `child` is this node or one of its
    /// ancestors through any path, since traversal of a cyclic graph would
    /// never terminate.
    pub fn add_child(&self, child: &Node) -> Result<(), SceneError> {
        if Node::ptr_eq(self, child) || child.has_descendant(self) {
            return Err(SceneError::CycleDetected {
                parent: self.name(),
                child: child.name(),
            }
            .logged());
        }
        self.0.borrow_mut().children.push(child.retain());
        Ok(())
    }

    /// Creates one child per mesh, named after it and positioned at the mesh's
    /// default transform.
    pub fn add_children(&self, meshes: &[Rc<Mesh>]) {
        if meshes.is_empty() {
            log::warn!("no meshes to add to node '{}'", self.name());
            return;
        }
        let mut data = self.0.borrow_mut();
        for mesh in meshes {
            let child = Node::new(mesh.name());
            child.set_local_transform(mesh.default_transform());
            child.set_mesh(Some(Rc::clone(mesh)));
            // a fresh node can never close a cycle, the list takes our handle
            data.children.push(child);
        }
    }

    /// Whether `target` is reachable through this node's children.
    pub fn has_descendant(&self, target: &Node) -> bool {
        self.0
            .borrow()
            .children
            .iter()
            .any(|child| Node::ptr_eq(child, target) || child.has_descendant(target))
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Node")
            .field("name", &data.name)
            .field("visible", &data.visible)
            .field("mesh", &data.mesh.as_ref().map(|mesh| mesh.name().to_string()))
            .field("children", &data.children)
            .field("retain_count", &Rc::strong_count(&self.0))
            .finish()
    }
}
