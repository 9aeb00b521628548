//! Render pipelines for scene geometry.
//!
//! Both pipelines share one shader and one per-draw uniform layout. They only
//! differ in the fixed-function state of their [`PassState`]:
//!
//! - `basic` draws opaque items with blending disabled
//! - `transparent` draws alpha items with source-alpha blending

use std::num::NonZeroU64;

use crate::{
    data_structures::{
        mesh::{MeshVertex, Vertex},
        texture::Texture,
    },
    dispatch::PassState,
};

pub mod basic;
pub mod transparent;

/// GPU layout of everything a single draw needs. Mirrors `DrawUniform` in
/// `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DrawUniform {
    pub mvp: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    // mat3x3 columns are padded to 16 bytes
    pub normal: [[f32; 4]; 3],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    pub light_position: [f32; 4],
    pub light_ambient: [f32; 4],
    pub light_diffuse: [f32; 4],
}

impl DrawUniform {
    pub const SIZE: u64 = std::mem::size_of::<DrawUniform>() as u64;
}

/// Which of the two scene pipelines a draw goes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineKind {
    Opaque,
    Alpha,
}

impl From<&PassState> for PipelineKind {
    fn from(state: &PassState) -> Self {
        if state.blend.is_some() {
            PipelineKind::Alpha
        } else {
            PipelineKind::Opaque
        }
    }
}

#[derive(Debug)]
pub struct ScenePipelines {
    pub opaque: wgpu::RenderPipeline,
    pub alpha: wgpu::RenderPipeline,
    pub uniform_layout: wgpu::BindGroupLayout,
}

impl ScenePipelines {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let uniform_layout = draw_uniform_layout(device);
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[Some(&uniform_layout)],
            immediate_size: 0,
        });
        Self {
            opaque: basic::mk_basic_pipeline(device, &layout, color_format),
            alpha: transparent::mk_transparent_pipeline(device, &layout, color_format),
            uniform_layout,
        }
    }

    pub fn get(&self, kind: PipelineKind) -> &wgpu::RenderPipeline {
        match kind {
            PipelineKind::Opaque => &self.opaque,
            PipelineKind::Alpha => &self.alpha,
        }
    }
}

pub fn draw_uniform_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: NonZeroU64::new(DrawUniform::SIZE),
            },
            count: None,
        }],
        label: Some("draw_uniform_layout"),
    })
}

pub(crate) fn scene_shader() -> wgpu::ShaderModuleDescriptor<'static> {
    wgpu::ShaderModuleDescriptor {
        label: Some("Scene Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("scene.wgsl").into()),
    }
}

/// Builds a scene pipeline whose fixed-function state follows `state`.
pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    state: &PassState,
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);
    let vertex_layouts = [MeshVertex::desc()];

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Scene Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: state.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: state.front_face,
            cull_mode: state.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        // the render pass always carries a depth attachment, so the format has
        // to be declared even when testing is off
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: Some(state.depth_test),
            depth_compare: Some(if state.depth_test {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            }),
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
