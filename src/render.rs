//! Render list construction.
//!
//! Walks a node tree depth-first, pre-order, accumulating world transforms and
//! sorting every mesh it meets into one of two lists:
//!
//! - `opaque` holds meshes without a material or with a fully opaque one
//! - `alpha` holds meshes whose material needs blending
//!
//! Both lists keep traversal order. Transparent items are not depth sorted, so
//! overlapping transparent geometry may blend in the wrong order.
//!
//! Level of detail is expressed in the tree itself: a node marked
//! `first_visible_only` descends into exactly one child, the first one that is
//! visible and within its `max_distance` of the viewpoint.

use std::rc::Rc;

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3};

use crate::{
    data_structures::{
        mesh::Mesh,
        node::{Node, NodeData},
    },
    error::SceneError,
};

/// A mesh and the world transform it is drawn with, valid for one frame.
#[derive(Clone, Debug)]
pub struct DrawItem {
    pub mesh: Rc<Mesh>,
    pub world: Matrix4<f32>,
    /// Reserved for depth sorting, always `0.0`.
    pub sort_key: f32,
}

/// Output of one traversal.
#[derive(Debug, Default)]
pub struct RenderList {
    pub opaque: Vec<DrawItem>,
    pub alpha: Vec<DrawItem>,
}

impl RenderList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.alpha.is_empty()
    }

    pub fn len(&self) -> usize {
        self.opaque.len() + self.alpha.len()
    }

    /// Empties both lists but keeps their allocations for the next frame.
    pub fn clear(&mut self) {
        self.opaque.clear();
        self.alpha.clear();
    }

    fn push(&mut self, item: DrawItem) {
        if item.mesh.is_opaque() {
            self.opaque.push(item);
        } else {
            self.alpha.push(item);
        }
    }
}

/// Traversal settings: where the viewer is and how deep the tree may go.
///
/// `add_child` already keeps the graph acyclic, so depth is unbounded unless a
/// limit is set with [`RenderListBuilder::with_max_depth`].
#[derive(Clone, Debug)]
pub struct RenderListBuilder {
    viewpoint: Point3<f32>,
    max_depth: Option<usize>,
}

impl RenderListBuilder {
    pub fn new(viewpoint: Point3<f32>) -> Self {
        Self {
            viewpoint,
            max_depth: None,
        }
    }

    /// Fails traversal with `DepthExceeded` once a node sits `max_depth`
    /// levels below the root. `None` removes the limit.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(&self, root: &Node, parent_world: &Matrix4<f32>) -> Result<RenderList, SceneError> {
        let mut list = RenderList::new();
        self.build_into(root, parent_world, &mut list)?;
        Ok(list)
    }

    /// Appends to `out` without clearing it first.
    ///
    /// On error `out` keeps whatever was collected before the limit was hit.
    pub fn build_into(
        &self,
        root: &Node,
        parent_world: &Matrix4<f32>,
        out: &mut RenderList,
    ) -> Result<(), SceneError> {
        self.visit(&root.data(), parent_world, 0, out)
            .map_err(SceneError::logged)?;
        log::debug!(
            "built render list: {} opaque, {} alpha",
            out.opaque.len(),
            out.alpha.len()
        );
        Ok(())
    }

    fn visit(
        &self,
        node: &NodeData,
        parent_world: &Matrix4<f32>,
        depth: usize,
        out: &mut RenderList,
    ) -> Result<(), SceneError> {
        if !node.visible {
            return Ok(());
        }
        if let Some(limit) = self.max_depth
            && depth >= limit
        {
            return Err(SceneError::DepthExceeded {
                limit,
                node: node.name.clone(),
            });
        }

        let world = parent_world * node.local_transform;

        if let Some(mesh) = &node.mesh {
            out.push(DrawItem {
                mesh: Rc::clone(mesh),
                world,
                sort_key: 0.0,
            });
        }

        if node.first_visible_only {
            let selected = node
                .children
                .iter()
                .map(Node::data)
                .find(|child| self.is_lod_candidate(child, &world));
            if let Some(child) = selected {
                self.visit(&child, &world, depth + 1, out)?;
            }
        } else {
            for child in &node.children {
                self.visit(&child.data(), &world, depth + 1, out)?;
            }
        }
        Ok(())
    }

    /// A child qualifies when it is visible and its world origin lies within
    /// its `max_distance` of the viewpoint.
    fn is_lod_candidate(&self, child: &NodeData, parent_world: &Matrix4<f32>) -> bool {
        if !child.visible {
            return false;
        }
        match child.max_distance {
            None => true,
            Some(max_distance) => {
                let origin = Point3::from_vec((parent_world * child.local_transform).w.truncate());
                (origin - self.viewpoint).magnitude() <= max_distance
            }
        }
    }
}

/// Traverses `node` without a depth limit, appending to `out`.
pub fn build_render_list(
    node: &Node,
    parent_world: &Matrix4<f32>,
    viewpoint: Point3<f32>,
    out: &mut RenderList,
) -> Result<(), SceneError> {
    RenderListBuilder::new(viewpoint).build_into(node, parent_world, out)
}
