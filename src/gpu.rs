//! wgpu implementation of [`RenderBackend`].
//!
//! Dispatch happens in two steps. A [`GpuFrame`] records pass switches,
//! selected materials and mesh draws while the dispatcher walks the render
//! lists. [`GpuRenderer::submit`] then writes every draw's uniforms into one
//! buffer (one aligned slot per draw, bound with a dynamic offset) and encodes
//! a single render pass.

use std::{iter, rc::Rc};

use anyhow::Context as _;

use crate::{
    context::{RenderConfig, RenderContext},
    data_structures::{
        material::{LightSource, Material},
        mesh::{GpuMesh, Mesh},
        node::Node,
        texture::Texture,
    },
    dispatch::{self, DispatchStats, PassState, RenderBackend, ShaderMatrices},
    pipelines::{DrawUniform, PipelineKind, ScenePipelines},
};

struct RecordedDraw {
    pipeline: PipelineKind,
    uniform: DrawUniform,
    buffers: Rc<GpuMesh>,
}

/// Draw commands for one frame.
pub struct GpuFrame<'a> {
    device: &'a wgpu::Device,
    pipeline: PipelineKind,
    uniform: Option<DrawUniform>,
    draws: Vec<RecordedDraw>,
}

impl<'a> GpuFrame<'a> {
    pub fn new(device: &'a wgpu::Device) -> Self {
        Self {
            device,
            pipeline: PipelineKind::Opaque,
            uniform: None,
            draws: Vec::new(),
        }
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }
}

fn vec4(rgb: [f32; 3], w: f32) -> [f32; 4] {
    [rgb[0], rgb[1], rgb[2], w]
}

fn draw_uniform(material: &Material, matrices: &ShaderMatrices, light: &LightSource) -> DrawUniform {
    let normal = matrices.normal_matrix();
    let position = light.adjusted_position;
    DrawUniform {
        mvp: matrices.model_view_projection().into(),
        model_view: matrices.model_view().into(),
        normal: [
            normal.x.extend(0.0).into(),
            normal.y.extend(0.0).into(),
            normal.z.extend(0.0).into(),
        ],
        diffuse: vec4(material.diffuse, material.alpha),
        specular: vec4(material.specular, material.shininess),
        light_position: [position.x, position.y, position.z, 1.0],
        light_ambient: vec4(light.ambient, 1.0),
        light_diffuse: vec4(light.diffuse, 1.0),
    }
}

impl RenderBackend for GpuFrame<'_> {
    fn set_pass_state(&mut self, state: &PassState) {
        let pipeline = PipelineKind::from(state);
        let expected = match pipeline {
            PipelineKind::Opaque => PassState::OPAQUE,
            PipelineKind::Alpha => PassState::ALPHA,
        };
        if *state != expected {
            log::warn!(
                "pass state {:?} has no dedicated pipeline, falling back to {:?}",
                state,
                pipeline
            );
        }
        self.pipeline = pipeline;
    }

    fn select_material(&mut self, material: &Material, matrices: &ShaderMatrices, light: &LightSource) {
        self.uniform = Some(draw_uniform(material, matrices, light));
    }

    fn draw_mesh(&mut self, mesh: &Rc<Mesh>) {
        let Some(uniform) = self.uniform else {
            log::warn!("mesh '{}' drawn without a selected material, skipping", mesh.name());
            return;
        };
        self.draws.push(RecordedDraw {
            pipeline: self.pipeline,
            uniform,
            buffers: mesh.upload(self.device),
        });
    }
}

/// Owns the scene pipelines, the per-draw uniform buffer and the depth target.
#[derive(Debug)]
pub struct GpuRenderer {
    pipelines: ScenePipelines,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniform_stride: u64,
    uniform_capacity: u64,
    depth_texture: Texture,
    pub clear_colour: wgpu::Color,
}

impl GpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        size: [u32; 2],
        config: &RenderConfig,
    ) -> Self {
        let pipelines = ScenePipelines::new(device, color_format);
        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let uniform_stride = DrawUniform::SIZE.div_ceil(alignment) * alignment;
        let uniform_capacity = 64;
        let (uniform_buffer, uniform_bind_group) =
            Self::mk_uniform_buffer(device, &pipelines.uniform_layout, uniform_stride * uniform_capacity);
        let depth_texture = Texture::create_depth_texture(device, size, "depth_texture");

        Self {
            pipelines,
            uniform_buffer,
            uniform_bind_group,
            uniform_stride,
            uniform_capacity,
            depth_texture,
            clear_colour: config.clear_colour,
        }
    }

    fn mk_uniform_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        size: u64,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Draw Uniform Buffer"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(DrawUniform::SIZE),
                }),
            }],
            label: Some("draw_uniform_bind_group"),
        });
        (buffer, bind_group)
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, draws: u64) {
        if draws <= self.uniform_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        log::debug!("growing draw uniform buffer from {} to {} slots", self.uniform_capacity, capacity);
        let (buffer, bind_group) = Self::mk_uniform_buffer(
            device,
            &self.pipelines.uniform_layout,
            self.uniform_stride * capacity,
        );
        self.uniform_buffer = buffer;
        self.uniform_bind_group = bind_group;
        self.uniform_capacity = capacity;
    }

    /// Recreates the depth texture when the target size changed. Zero sized
    /// targets are ignored.
    pub fn resize(&mut self, device: &wgpu::Device, size: [u32; 2]) {
        if size[0] > 0 && size[1] > 0 && size != self.depth_texture.size() {
            self.depth_texture = Texture::create_depth_texture(device, size, "depth_texture");
        }
    }

    /// Encodes and submits everything recorded in `frame` into `target`.
    ///
    /// `target` must match the renderer's color format and depth texture size.
    pub fn submit(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        frame: GpuFrame<'_>,
    ) -> anyhow::Result<()> {
        let draws = frame.draws;
        self.ensure_capacity(device, draws.len() as u64);

        if !draws.is_empty() {
            let stride = self.uniform_stride as usize;
            let mut bytes = vec![0u8; stride * draws.len()];
            for (slot, draw) in bytes.chunks_exact_mut(stride).zip(&draws) {
                slot[..DrawUniform::SIZE as usize].copy_from_slice(bytemuck::bytes_of(&draw.uniform));
            }
            queue.write_buffer(&self.uniform_buffer, 0, &bytes);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Scene Render Encoder"),
        });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                multiview_mask: None,
            });

            let mut current = None;
            for (idx, draw) in draws.iter().enumerate() {
                let gpu = &draw.buffers;
                if current != Some(draw.pipeline) {
                    render_pass.set_pipeline(self.pipelines.get(draw.pipeline));
                    current = Some(draw.pipeline);
                }
                let offset = u32::try_from(idx as u64 * self.uniform_stride)
                    .context("draw uniform offset does not fit into u32")?;
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[offset]);
                render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..gpu.num_elements, 0, 0..1);
            }
        }

        queue.submit(iter::once(encoder.finish()));
        Ok(())
    }

    /// Builds, dispatches and submits `root` in one go.
    pub fn render_scene(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        root: &Node,
        ctx: &RenderContext,
    ) -> anyhow::Result<DispatchStats> {
        self.clear_colour = ctx.config.clear_colour;
        let mut frame = GpuFrame::new(device);
        let stats = dispatch::render(root, ctx, &mut frame)?;
        if frame.draw_count() == 0 {
            log::warn!("scene '{}' produced nothing to draw", root.name());
        }
        self.submit(device, queue, target, frame)?;
        Ok(stats)
    }
}
