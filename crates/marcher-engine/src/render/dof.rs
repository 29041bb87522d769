use bytemuck::{Pod, Zeroable};

use crate::camera::Camera;
use crate::coords::Viewport;

use super::framebuffer::HdrFramebuffer;
use super::fullscreen;
use super::RenderCtx;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DofParams {
    extent: [f32; 2],
    focus_distance: f32,
    lens_radius: f32,
    focal_px: f32,
    max_radius_px: f32,
    projection_m22: f32,
    projection_m23: f32,
}

impl DofParams {
    fn new(camera: &Camera, viewport_height: f32, extent: Viewport) -> Self {
        let dof = camera.depth_of_field;
        let terms = camera.projection_terms();
        Self {
            extent: [extent.width as f32, extent.height as f32],
            focus_distance: dof.focus_distance,
            lens_radius: dof.lens_radius,
            focal_px: viewport_height / (2.0 * camera.tan_half_field_of_view_y().max(1e-6)),
            max_radius_px: dof.max_radius_px(viewport_height),
            projection_m22: terms.m22,
            projection_m23: terms.m23,
        }
    }
}

/// Gather-based depth of field from the HDR color and depth targets.
///
/// Reads `color` + `depth` and writes `filtered`. With depth of field
/// disabled the color target is copied through unchanged.
pub struct DepthOfFieldPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_ubo: wgpu::Buffer,
}

impl DepthOfFieldPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("marcher dof bgl"),
            entries: &[
                fullscreen::uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                fullscreen::texture_entry(
                    1,
                    wgpu::TextureViewDimension::D2,
                    wgpu::TextureSampleType::Float { filterable: false },
                ),
                fullscreen::texture_entry(
                    2,
                    wgpu::TextureViewDimension::D2,
                    wgpu::TextureSampleType::Depth,
                ),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("marcher dof pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let shader = fullscreen::shader_module(
            device,
            "marcher dof shader",
            include_str!("shaders/dof.wgsl"),
        );
        let pipeline = fullscreen::pipeline(
            device,
            "marcher dof pipeline",
            &pipeline_layout,
            &shader,
            HdrFramebuffer::COLOR_FORMAT,
            None,
        );

        let params_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("marcher dof params ubo"),
            size: std::mem::size_of::<DofParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            bind_group_layout,
            params_ubo,
        }
    }

    /// Blurs `framebuffer`'s color by per-pixel circle of confusion into its
    /// filtered target.
    pub fn apply(
        &self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        framebuffer: &HdrFramebuffer,
        camera: &Camera,
    ) {
        if !camera.depth_of_field.enabled {
            let extent = framebuffer.extent();
            encoder.copy_texture_to_texture(
                framebuffer.color_texture().as_image_copy(),
                framebuffer.filtered_texture().as_image_copy(),
                wgpu::Extent3d {
                    width: extent.width,
                    height: extent.height,
                    depth_or_array_layers: 1,
                },
            );
            return;
        }

        let params = DofParams::new(camera, framebuffer.viewport().height(), framebuffer.extent());
        ctx.queue.write_buffer(&self.params_ubo, 0, bytemuck::bytes_of(&params));

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("marcher dof bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(framebuffer.color_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(framebuffer.depth_view()),
                },
            ],
        });

        let mut rpass =
            fullscreen::begin_overwrite_pass(encoder, "marcher dof pass", framebuffer.filtered_view());
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Point3, Rad};

    use super::*;

    #[test]
    fn params_match_cpu_circle_of_confusion() {
        let mut camera = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        camera.set_field_of_view_angle(Deg(40.0));
        let params = DofParams::new(&camera, 500.0, Viewport::new(780, 500));

        let dof = camera.depth_of_field;
        assert_eq!(params.max_radius_px, dof.max_radius_px(500.0));

        // Same thin-lens formula the shader evaluates.
        let z = -3.0_f32;
        let d = -z;
        let s = params.focus_distance;
        let shader_r = (params.lens_radius * (d - s).abs() / (d * s) * params.focal_px)
            .min(params.max_radius_px);
        let cpu_r = dof.circle_of_confusion_px(z, camera.tan_half_field_of_view_y(), 500.0);
        assert!((shader_r - cpu_r).abs() < 1e-4);
    }

    #[test]
    fn params_block_is_32_bytes() {
        assert_eq!(std::mem::size_of::<DofParams>(), 32);
    }
}
