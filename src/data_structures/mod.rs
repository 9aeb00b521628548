//! Scene data: nodes, shared meshes, materials and render targets.
//!
//! - `node` is the reference counted scene graph node
//! - `mesh` holds shared geometry and its GPU buffers
//! - `material` contains surface parameters and the light source
//! - `texture` wraps depth attachments

pub mod material;
pub mod mesh;
pub mod node;
pub mod texture;
