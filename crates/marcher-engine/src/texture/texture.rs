use std::path::Path;

use anyhow::{Context, Result};

use super::mip::{build_mip_chain, upload_mip_chain};

/// How stored texel values are interpreted when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureEncoding {
    /// Color data; sampling decodes to linear.
    #[default]
    Srgb,
    /// Raw data (normals, masks, noise).
    Linear,
}

impl TextureEncoding {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            TextureEncoding::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureEncoding::Linear => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// Immutable 2D texture with a full mip chain.
#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    width: u32,
    height: u32,
    encoding: TextureEncoding,
}

impl Texture {
    /// Decodes an image file and uploads it together with its mips.
    pub fn from_file(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        encoding: TextureEncoding,
    ) -> Result<Self> {
        let img = image::open(path)
            .with_context(|| format!("failed to decode texture {}", path.display()))?;
        let label = path.display().to_string();
        Ok(Self::from_rgba(device, queue, img.to_rgba8(), &label, encoding))
    }

    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: image::RgbaImage,
        label: &str,
        encoding: TextureEncoding,
    ) -> Self {
        let (width, height) = rgba.dimensions();
        let chain = build_mip_chain(rgba);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: chain.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: encoding.format(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        upload_mip_chain(queue, &texture, 0, &chain);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        log::debug!(
            "texture `{label}` {width}x{height}, {} mips, {:?}",
            chain.len(),
            encoding
        );

        Self {
            texture,
            view,
            width,
            height,
            encoding,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn encoding(&self) -> TextureEncoding {
        self.encoding
    }
}
