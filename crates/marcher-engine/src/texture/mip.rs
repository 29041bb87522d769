use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Number of mip levels in a full chain down to 1×1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}

/// Builds the full mip chain on the CPU. Level 0 is the input itself.
pub(crate) fn build_mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let levels = mip_level_count(base.width(), base.height());
    let mut chain = Vec::with_capacity(levels as usize);
    chain.push(base);

    for _ in 1..levels {
        let Some(prev) = chain.last() else { break };
        let w = (prev.width() / 2).max(1);
        let h = (prev.height() / 2).max(1);
        let next = imageops::resize(prev, w, h, FilterType::Triangle);
        chain.push(next);
    }
    chain
}

/// Uploads a mip chain into one array layer of `texture`.
pub(crate) fn upload_mip_chain(
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    layer: u32,
    chain: &[RgbaImage],
) {
    for (level, img) in chain.iter().enumerate() {
        let size = wgpu::Extent3d {
            width: img.width(),
            height: img.height(),
            depth_or_array_layers: 1,
        };
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: level as u32,
                origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            },
            img.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(img.width() * 4),
                rows_per_image: Some(img.height()),
            },
            size,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_counts() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 1), 2);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(780, 500), 10);
        assert_eq!(mip_level_count(0, 0), 1);
    }

    #[test]
    fn chain_halves_to_one_pixel() {
        let chain = build_mip_chain(RgbaImage::new(8, 2));
        let dims: Vec<_> = chain.iter().map(|i| i.dimensions()).collect();
        assert_eq!(dims, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn chain_averages_solid_color() {
        let base = RgbaImage::from_pixel(4, 4, image::Rgba([200, 100, 50, 255]));
        let chain = build_mip_chain(base);
        let last = chain.last().unwrap();
        assert_eq!(last.get_pixel(0, 0).0, [200, 100, 50, 255]);
    }
}
