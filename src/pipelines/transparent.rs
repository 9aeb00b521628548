use crate::{dispatch::PassState, pipelines::{mk_render_pipeline, scene_shader}};

/**
 * Pipeline for items whose material alpha is below one.
 *
 * Uses `BlendState::ALPHA_BLENDING` and keeps depth testing enabled. Items are
 * drawn in traversal order, there is no back-to-front sorting.
 *
 * TODO: sort alpha items by view-space depth once `DrawItem::sort_key` is filled in.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    mk_render_pipeline(device, layout, color_format, &PassState::ALPHA, scene_shader())
}
