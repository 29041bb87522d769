use crate::coords::{ColorRgba, Viewport};

use super::framebuffer::HdrFramebuffer;

/// Renderer-facing context (device/queue + surface format + surface size).
pub struct RenderCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub surface_size: Viewport, // physical px
}

impl<'a> RenderCtx<'a> {
    #[inline]
    pub fn new(
        device: &'a wgpu::Device,
        queue: &'a wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        surface_size: Viewport,
    ) -> Self {
        Self {
            device,
            queue,
            surface_format,
            surface_size,
        }
    }
}

/// Everything a frame draws into: the frame's encoder, the window surface and
/// the HDR framebuffer.
pub struct FrameTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub surface_view: &'a wgpu::TextureView,
    pub framebuffer: &'a HdrFramebuffer,
}

impl<'a> FrameTarget<'a> {
    #[inline]
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        surface_view: &'a wgpu::TextureView,
        framebuffer: &'a HdrFramebuffer,
    ) -> Self {
        Self {
            encoder,
            surface_view,
            framebuffer,
        }
    }

    /// Clears the HDR color target to `color` and depth to the far plane.
    pub fn clear(&mut self, color: ColorRgba) {
        let _pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("marcher clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.framebuffer.color_view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color.into()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.framebuffer.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}
