//! Render list consumption.
//!
//! The dispatcher turns a [`RenderList`] into backend calls: all opaque items
//! first with blending disabled, then all alpha items with standard alpha
//! blending. Depth testing and clockwise back-face culling stay enabled for
//! both passes. What a backend does with those calls is up to it; the wgpu
//! implementation lives in [`crate::gpu`].

use std::rc::Rc;

use cgmath::{Matrix, Matrix3, Matrix4, SquareMatrix};

use crate::{
    context::RenderContext,
    data_structures::{
        material::{LightSource, Material},
        mesh::Mesh,
        node::Node,
    },
    error::SceneError,
    render::{DrawItem, RenderList, RenderListBuilder},
};

/// Fixed-function state for one group of draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassState {
    pub blend: Option<wgpu::BlendState>,
    pub depth_test: bool,
    pub front_face: wgpu::FrontFace,
    pub cull_mode: Option<wgpu::Face>,
}

impl PassState {
    pub const OPAQUE: PassState = PassState {
        blend: None,
        depth_test: true,
        front_face: wgpu::FrontFace::Cw,
        cull_mode: Some(wgpu::Face::Back),
    };

    /// source-alpha / one-minus-source-alpha
    pub const ALPHA: PassState = PassState {
        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
        depth_test: true,
        front_face: wgpu::FrontFace::Cw,
        cull_mode: Some(wgpu::Face::Back),
    };
}

/// Transformation matrices handed to a material when it is selected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShaderMatrices {
    pub projection: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub model: Matrix4<f32>,
}

impl Default for ShaderMatrices {
    fn default() -> Self {
        Self {
            projection: Matrix4::identity(),
            view: Matrix4::identity(),
            model: Matrix4::identity(),
        }
    }
}

impl ShaderMatrices {
    pub fn model_view(&self) -> Matrix4<f32> {
        self.view * self.model
    }

    pub fn model_view_projection(&self) -> Matrix4<f32> {
        self.projection * self.view * self.model
    }

    /// Inverse transpose of the model-view rotation part. Falls back to the
    /// plain rotation part for singular matrices.
    pub fn normal_matrix(&self) -> Matrix3<f32> {
        let mv = self.model_view();
        let upper = Matrix3::from_cols(mv.x.truncate(), mv.y.truncate(), mv.z.truncate());
        upper.invert().map_or(upper, |inverse| inverse.transpose())
    }
}

/// Receiver of draw commands.
pub trait RenderBackend {
    fn set_pass_state(&mut self, state: &PassState);

    /// Makes `material` current for the following draws.
    fn select_material(&mut self, material: &Material, matrices: &ShaderMatrices, light: &LightSource);

    fn draw_mesh(&mut self, mesh: &Rc<Mesh>);
}

/// How many items each pass drew.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub opaque: usize,
    pub alpha: usize,
}

/// Draws `list` through `backend`.
///
/// `matrices.projection` and `matrices.view` are used as given; the model
/// matrix is replaced by each item's world transform. Meshes without a
/// material are drawn with `default_material`.
pub fn dispatch<B: RenderBackend + ?Sized>(
    backend: &mut B,
    list: &RenderList,
    matrices: &ShaderMatrices,
    default_material: &Material,
    light: &LightSource,
) -> DispatchStats {
    let mut matrices = *matrices;

    backend.set_pass_state(&PassState::OPAQUE);
    for item in &list.opaque {
        draw_item(backend, item, &mut matrices, default_material, light);
    }

    backend.set_pass_state(&PassState::ALPHA);
    for item in &list.alpha {
        draw_item(backend, item, &mut matrices, default_material, light);
    }

    DispatchStats {
        opaque: list.opaque.len(),
        alpha: list.alpha.len(),
    }
}

fn draw_item<B: RenderBackend + ?Sized>(
    backend: &mut B,
    item: &DrawItem,
    matrices: &mut ShaderMatrices,
    default_material: &Material,
    light: &LightSource,
) {
    matrices.model = item.world;
    let material = item
        .mesh
        .material()
        .map_or(default_material, |material| &**material);
    backend.select_material(material, matrices, light);
    backend.draw_mesh(&item.mesh);
}

/// Builds the render list for `root` as seen from `ctx` and dispatches it.
pub fn render<B: RenderBackend + ?Sized>(
    root: &Node,
    ctx: &RenderContext,
    backend: &mut B,
) -> Result<DispatchStats, SceneError> {
    let list = RenderListBuilder::new(ctx.eye)
        .with_max_depth(ctx.config.max_traversal_depth)
        .build(root, &Matrix4::identity())?;
    let matrices = ShaderMatrices {
        projection: ctx.projection,
        view: ctx.view,
        model: Matrix4::identity(),
    };
    let sun = ctx.sun.in_view_space(&ctx.view);
    Ok(dispatch(backend, &list, &matrices, &ctx.default_material, &sun))
}
