use crate::{dispatch::PassState, pipelines::{mk_render_pipeline, scene_shader}};

/// Pipeline for opaque items: blending off, depth test on, clockwise front
/// faces with back-face culling.
pub fn mk_basic_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    mk_render_pipeline(device, layout, color_format, &PassState::OPAQUE, scene_shader())
}
