/// One acquired swapchain image plus the encoder recording into it.
///
/// Must be handed back to `Gpu::submit` promptly; holding the surface texture
/// blocks acquisition of the next frame. The surface texture doubles as the
/// screenshot copy source.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
