use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, bail, Context, Result};

/// Readback recorded into a frame's encoder, waiting for submission.
pub struct PendingCapture {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
    format: wgpu::TextureFormat,
}

/// Writes presented frames to PNG files in a directory.
///
/// Files are named `<caption-slug>_<unix-seconds>_<NNN>.png`, where `NNN`
/// counts captures made by this writer.
pub struct ScreenshotWriter {
    directory: PathBuf,
    slug: String,
    counter: u32,
}

impl ScreenshotWriter {
    pub fn new(directory: impl Into<PathBuf>, caption: &str) -> Self {
        Self {
            directory: directory.into(),
            slug: caption_slug(caption),
            counter: 0,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path for the next capture, advancing the counter.
    pub fn next_path(&mut self, unix_seconds: u64) -> PathBuf {
        let name = format!("{}_{unix_seconds}_{:03}.png", self.slug, self.counter);
        self.counter += 1;
        self.directory.join(name)
    }

    /// Records a copy of `texture` into a mappable buffer. The texture must
    /// have `COPY_SRC` usage.
    pub fn record_copy(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        texture: &wgpu::Texture,
    ) -> PendingCapture {
        let width = texture.width();
        let height = texture.height();
        let padded_bytes_per_row = padded_bytes_per_row(width);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("marcher screenshot readback"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            texture.size(),
        );

        PendingCapture {
            buffer,
            width,
            height,
            padded_bytes_per_row,
            format: texture.format(),
        }
    }

    /// Waits for the submitted copy, converts it to RGBA and writes the PNG.
    pub fn finish(&mut self, device: &wgpu::Device, capture: PendingCapture) -> Result<PathBuf> {
        let PendingCapture {
            buffer,
            width,
            height,
            padded_bytes_per_row,
            format,
        } = capture;

        let slice = buffer.slice(..);
        let (tx, rx) = futures_intrusive::channel::shared::oneshot_channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            // The receiver only goes away if `finish` already returned.
            let _ = tx.send(result);
        });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .context("waiting for screenshot readback")?;
        pollster::block_on(rx.receive())
            .ok_or_else(|| anyhow!("screenshot readback channel closed"))?
            .context("mapping screenshot buffer")?;

        let mut rgba = {
            let data = slice.get_mapped_range();
            unpad_rows(&data, width, height, padded_bytes_per_row)
        };
        buffer.unmap();
        to_rgba8(&mut rgba, format)?;

        std::fs::create_dir_all(&self.directory).with_context(|| {
            format!("creating screenshot directory {}", self.directory.display())
        })?;

        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let path = self.next_path(seconds);

        let img = image::RgbaImage::from_raw(width, height, rgba)
            .ok_or_else(|| anyhow!("screenshot buffer does not match {width}x{height}"))?;
        img.save(&path)
            .with_context(|| format!("writing screenshot {}", path.display()))?;

        log::info!("saved screenshot {}", path.display());
        Ok(path)
    }
}

/// Lowercase ASCII alphanumerics, everything else collapsed to single `-`.
pub(crate) fn caption_slug(caption: &str) -> String {
    let mut slug = String::with_capacity(caption.len());
    for c in caption.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("screenshot");
    }
    slug
}

fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unpadded.div_ceil(align) * align
}

/// Strips the per-row alignment padding of a texture-to-buffer copy.
pub(crate) fn unpad_rows(data: &[u8], width: u32, height: u32, padded_bytes_per_row: u32) -> Vec<u8> {
    let row = width as usize * 4;
    let mut out = Vec::with_capacity(row * height as usize);
    for chunk in data
        .chunks(padded_bytes_per_row as usize)
        .take(height as usize)
    {
        out.extend_from_slice(&chunk[..row.min(chunk.len())]);
    }
    out
}

/// Converts 8-bit surface texels to RGBA in place.
pub(crate) fn to_rgba8(data: &mut [u8], format: wgpu::TextureFormat) -> Result<()> {
    use wgpu::TextureFormat as F;
    match format {
        F::Rgba8Unorm | F::Rgba8UnormSrgb => Ok(()),
        F::Bgra8Unorm | F::Bgra8UnormSrgb => {
            for px in data.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
            Ok(())
        }
        other => bail!("screenshots of {other:?} surfaces are not supported"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_from_caption() {
        assert_eq!(caption_slug("Simple GPU Ray Tracer"), "simple-gpu-ray-tracer");
        assert_eq!(caption_slug("  --Venice!! v2 "), "venice-v2");
        assert_eq!(caption_slug("***"), "screenshot");
    }

    #[test]
    fn file_names_count_up() {
        let mut writer = ScreenshotWriter::new("../journal/", "Simple GPU Ray Tracer");
        let a = writer.next_path(1_700_000_000);
        let b = writer.next_path(1_700_000_000);
        assert_eq!(
            a,
            PathBuf::from("../journal/simple-gpu-ray-tracer_1700000000_000.png")
        );
        assert_eq!(
            b.file_name().and_then(|f| f.to_str()),
            Some("simple-gpu-ray-tracer_1700000000_001.png")
        );
        assert_eq!(b.parent(), Some(writer.directory()));
    }

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
        assert_eq!(padded_bytes_per_row(780), 3328);
    }

    #[test]
    fn unpadding_drops_row_tails() {
        // 2x2 image, rows padded to 12 bytes.
        let data = [
            1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0, //
            9, 10, 11, 12, 13, 14, 15, 16, 0, 0, 0, 0,
        ];
        let out = unpad_rows(&data, 2, 2, 12);
        assert_eq!(out, (1..=16).collect::<Vec<u8>>());
    }

    #[test]
    fn bgra_is_swizzled() {
        let mut px = vec![10, 20, 30, 255, 1, 2, 3, 4];
        to_rgba8(&mut px, wgpu::TextureFormat::Bgra8UnormSrgb).unwrap();
        assert_eq!(px, vec![30, 20, 10, 255, 3, 2, 1, 4]);

        let mut rgba = vec![10, 20, 30, 255];
        to_rgba8(&mut rgba, wgpu::TextureFormat::Rgba8Unorm).unwrap();
        assert_eq!(rgba, vec![10, 20, 30, 255]);

        assert!(to_rgba8(&mut rgba, wgpu::TextureFormat::Rgba16Float).is_err());
    }
}
