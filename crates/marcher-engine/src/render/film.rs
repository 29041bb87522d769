use bytemuck::{Pod, Zeroable};

use crate::camera::FilmSettings;
use crate::coords::Rect;
use crate::texture::sampler;

use super::fullscreen;
use super::RenderCtx;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct FilmParams {
    crop: [f32; 4],
    sensitivity: f32,
    gamma: f32,
    bloom_strength: f32,
    bloom_radius_px: f32,
    vignette: f32,
    tone_curve: u32,
    _pad: [u32; 2],
}

impl FilmParams {
    fn new(film: &FilmSettings, crop: Rect, target_format: wgpu::TextureFormat) -> Self {
        Self {
            crop: crop.to_array(),
            sensitivity: film.sensitivity,
            gamma: output_gamma(film, target_format),
            bloom_strength: film.bloom_strength.max(0.0),
            bloom_radius_px: film.bloom_radius_fraction * crop.width(),
            vignette: film.vignette.clamp(0.0, 1.0),
            tone_curve: film.tone_curve.as_u32(),
            _pad: [0; 2],
        }
    }
}

/// sRGB targets encode on store, so the shader must not apply gamma again.
fn output_gamma(film: &FilmSettings, target_format: wgpu::TextureFormat) -> f32 {
    if target_format.is_srgb() || film.gamma <= 0.0 {
        1.0
    } else {
        film.gamma
    }
}

/// Final exposure and tone-map stage, writing to the window surface.
#[derive(Default)]
pub struct FilmPass {
    pipeline_format: Option<wgpu::TextureFormat>,
    pipeline: Option<wgpu::RenderPipeline>,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    params_ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
}

impl FilmPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exposes the `crop` region of `source` and renders it over all of `target`.
    ///
    /// `crop` is in source pixels; passing the framebuffer viewport drops the
    /// color guard band.
    pub fn expose_and_render(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        source: &wgpu::TextureView,
        target: &wgpu::TextureView,
        film: &FilmSettings,
        crop: Rect,
    ) {
        self.ensure_pipeline(ctx);
        self.ensure_bindings(ctx);

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };
        let Some(ubo) = self.params_ubo.as_ref() else { return };
        let Some(sampler) = self.sampler.as_ref() else { return };

        let params = FilmParams::new(film, crop, ctx.surface_format);
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&params));

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("marcher film bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(source),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let mut rpass = fullscreen::begin_overwrite_pass(encoder, "marcher film pass", target);
        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format) && self.pipeline.is_some() {
            return;
        }

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("marcher film bgl"),
                    entries: &[
                        fullscreen::uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                        fullscreen::float_texture_entry(1),
                        fullscreen::sampler_entry(2),
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("marcher film pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let shader = fullscreen::shader_module(
            ctx.device,
            "marcher film shader",
            include_str!("shaders/film.wgsl"),
        );
        let pipeline = fullscreen::pipeline(
            ctx.device,
            "marcher film pipeline",
            &pipeline_layout,
            &shader,
            ctx.surface_format,
            None,
        );

        self.pipeline_format = Some(ctx.surface_format);
        self.pipeline = Some(pipeline);
        self.bind_group_layout = Some(bind_group_layout);
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.params_ubo.is_some() && self.sampler.is_some() {
            return;
        }

        self.params_ubo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("marcher film params ubo"),
            size: std::mem::size_of::<FilmParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.sampler = Some(sampler::post_process(ctx.device));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::ToneCurve;

    #[test]
    fn gamma_only_for_linear_targets() {
        let film = FilmSettings::default();
        assert_eq!(output_gamma(&film, wgpu::TextureFormat::Bgra8UnormSrgb), 1.0);
        assert_eq!(output_gamma(&film, wgpu::TextureFormat::Rgba8UnormSrgb), 1.0);
        assert_eq!(output_gamma(&film, wgpu::TextureFormat::Bgra8Unorm), 2.2);
    }

    #[test]
    fn params_scale_bloom_by_crop_width() {
        let film = FilmSettings {
            bloom_radius_fraction: 0.01,
            vignette: 3.0,
            tone_curve: ToneCurve::Reinhard,
            ..FilmSettings::default()
        };
        let crop = Rect::new(16.0, 16.0, 800.0, 600.0);
        let params = FilmParams::new(&film, crop, wgpu::TextureFormat::Bgra8Unorm);

        assert_eq!(params.crop, [16.0, 16.0, 800.0, 600.0]);
        assert!((params.bloom_radius_px - 8.0).abs() < 1e-5);
        assert_eq!(params.vignette, 1.0);
        assert_eq!(params.tone_curve, 1);
        assert_eq!(std::mem::size_of::<FilmParams>(), 48);
    }
}
