//! scene-ngin
//!
//! A retained-mode scene graph on top of wgpu. Applications build a tree of
//! reference counted [`Node`]s that position shared [`Mesh`]es, and once per
//! frame turn it into an opaque and an alpha draw list which are then drawn in
//! that order.
//!
//! High-level modules
//! - `data_structures`: nodes, meshes, materials and depth textures
//! - `render`: traversal that builds the opaque/alpha render lists, incl. LOD
//! - `dispatch`: draws render lists through the [`RenderBackend`] trait
//! - `context`: camera, sun, default material and configuration for a frame
//! - `gpu`: the wgpu backend
//! - `pipelines`: the opaque and transparent render pipelines
//! - `error`: scene graph errors
//!
//! Everything here is single threaded: nodes and meshes are `Rc` based and
//! cannot leave the thread that owns the frame loop.

pub mod context;
pub mod data_structures;
pub mod dispatch;
pub mod error;
pub mod gpu;
pub mod pipelines;
pub mod render;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use context::{RenderConfig, RenderContext};
pub use data_structures::{
    material::{LightSource, Material},
    mesh::{Mesh, MeshVertex},
    node::{Node, WeakNode},
};
pub use dispatch::{DispatchStats, PassState, RenderBackend, ShaderMatrices, dispatch, render};
pub use error::SceneError;
pub use render::{DrawItem, RenderList, RenderListBuilder, build_render_list};
