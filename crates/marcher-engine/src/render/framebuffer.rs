use crate::coords::{Rect, Viewport};
use crate::settings::HdrFramebufferSettings;

/// Off-screen HDR targets the trace and post passes render into.
///
/// The allocation is the window plus a guard band on every side.
/// [`HdrFramebuffer::viewport`] is the visible interior, and the film pass
/// crops to it.
pub struct HdrFramebuffer {
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    /// Depth-of-field output; same size and format as `color`.
    filtered: wgpu::Texture,
    filtered_view: wgpu::TextureView,
    depth_view: wgpu::TextureView,

    extent: Viewport,
    viewport: Rect,
    settings: HdrFramebufferSettings,
}

impl HdrFramebuffer {
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, window: Viewport, settings: HdrFramebufferSettings) -> Self {
        let extent = settings.framebuffer_extent(clamp_window(window));
        let viewport = settings.viewport_in(extent);

        let (color, color_view) = color_target(device, extent, "marcher hdr color");
        let (filtered, filtered_view) = color_target(device, extent, "marcher hdr filtered");
        let depth_view = depth_target(device, extent);

        log::debug!(
            "hdr framebuffer {}x{} (viewport {:?})",
            extent.width,
            extent.height,
            viewport
        );

        Self {
            color,
            color_view,
            filtered,
            filtered_view,
            depth_view,
            extent,
            viewport,
            settings,
        }
    }

    /// Re-creates the targets when the window size or guard band changed.
    /// Returns `true` if a re-allocation happened.
    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        window: Viewport,
        settings: HdrFramebufferSettings,
    ) -> bool {
        let extent = settings.framebuffer_extent(clamp_window(window));
        if extent == self.extent && settings == self.settings {
            return false;
        }
        *self = Self::new(device, window, settings);
        true
    }

    /// Allocated size including guard band.
    pub fn extent(&self) -> Viewport {
        self.extent
    }

    /// Visible rectangle inside the allocation.
    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    pub fn settings(&self) -> &HdrFramebufferSettings {
        &self.settings
    }

    pub fn color_texture(&self) -> &wgpu::Texture {
        &self.color
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        &self.color_view
    }

    pub fn filtered_texture(&self) -> &wgpu::Texture {
        &self.filtered
    }

    pub fn filtered_view(&self) -> &wgpu::TextureView {
        &self.filtered_view
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }
}

fn clamp_window(window: Viewport) -> Viewport {
    Viewport::new(window.width.max(1), window.height.max(1))
}

fn extent3d(extent: Viewport) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: extent.width,
        height: extent.height,
        depth_or_array_layers: 1,
    }
}

fn color_target(
    device: &wgpu::Device,
    extent: Viewport,
    label: &str,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent3d(extent),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HdrFramebuffer::COLOR_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Only the view is kept; it holds the texture alive.
fn depth_target(device: &wgpu::Device, extent: Viewport) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("marcher hdr depth"),
        size: extent3d(extent),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HdrFramebuffer::DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
