//! Per-application render state.
//!
//! [`RenderContext`] gathers everything a frame needs besides the scene itself:
//! camera matrices, the viewpoint used for level-of-detail decisions, the sun
//! and the material used for meshes that carry none. The application owns it
//! and passes it into [`render`](crate::dispatch::render) every frame.

use std::rc::Rc;

use cgmath::{Deg, Matrix4, Point3, SquareMatrix, Vector3};

use crate::data_structures::material::{LightSource, Material};

/// Maps OpenGL clip space (z in -1..1) to wgpu clip space (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Traversal fails with `DepthExceeded` below this many levels. `None`
    /// (the default) traverses trees of any depth.
    pub max_traversal_depth: Option<usize>,
    pub clear_colour: wgpu::Color,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_traversal_depth: None,
            clear_colour: wgpu::Color::BLACK,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderContext {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    /// World space camera position, also the level-of-detail viewpoint.
    pub eye: Point3<f32>,
    pub sun: LightSource,
    pub default_material: Rc<Material>,
    pub config: RenderConfig,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl RenderContext {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            eye: Point3::new(0.0, 0.0, 0.0),
            sun: LightSource::default(),
            default_material: Rc::new(Material::default()),
            config,
        }
    }

    /// Positions the camera at `eye` looking at `target`.
    pub fn look_at(&mut self, eye: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) {
        self.eye = eye;
        self.view = Matrix4::look_at_rh(eye, target, up);
    }

    pub fn set_perspective(&mut self, fovy: Deg<f32>, aspect: f32, znear: f32, zfar: f32) {
        self.projection = OPENGL_TO_WGPU_MATRIX * cgmath::perspective(fovy, aspect, znear, zfar);
    }
}
