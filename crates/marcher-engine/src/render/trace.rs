use std::fmt;
use std::str::FromStr;

use crate::texture::{sampler, CubeMap, Texture};

use super::args::TraceArgs;
use super::framebuffer::HdrFramebuffer;
use super::fullscreen;
use super::RenderCtx;

const COMMON_WGSL: &str = include_str!("shaders/trace_common.wgsl");

/// Which trace shader the pass launches.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum TraceScene {
    /// Environment and a single mirror sphere.
    Minimal,
    /// Closed-form ray/primitive intersection.
    Analytic,
    /// Sphere tracing of a signed distance field.
    #[default]
    RayMarch,
    /// Heightfield water between facades.
    Venice,
}

impl TraceScene {
    pub const ALL: [TraceScene; 4] = [
        TraceScene::Minimal,
        TraceScene::Analytic,
        TraceScene::RayMarch,
        TraceScene::Venice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TraceScene::Minimal => "minimal",
            TraceScene::Analytic => "analytic",
            TraceScene::RayMarch => "raymarch",
            TraceScene::Venice => "venice",
        }
    }

    /// The scene after this one in [`TraceScene::ALL`], wrapping around.
    pub fn next(self) -> TraceScene {
        let index = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    fn body(self) -> &'static str {
        match self {
            TraceScene::Minimal => include_str!("shaders/trace_minimal.wgsl"),
            TraceScene::Analytic => include_str!("shaders/trace_analytic.wgsl"),
            TraceScene::RayMarch => include_str!("shaders/trace_raymarch.wgsl"),
            TraceScene::Venice => include_str!("shaders/trace_venice.wgsl"),
        }
    }

    /// Complete fragment source: shared prelude followed by the scene.
    pub fn shader_source(self) -> String {
        format!("{COMMON_WGSL}\n{}", self.body())
    }
}

impl fmt::Display for TraceScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TraceScene {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', '_'], "");
        TraceScene::ALL
            .into_iter()
            .find(|scene| scene.name() == wanted)
            .ok_or_else(|| format!("unknown trace scene `{s}`"))
    }
}

/// Textures bound to the trace shader for the lifetime of the bind group.
pub struct TraceBindings<'a> {
    pub environment: &'a CubeMap,
    pub channels: [&'a Texture; 4],
}

/// Full-screen launch of a trace shader into the HDR framebuffer.
///
/// Writes radiance to the color target and `frag_depth` to the depth target.
pub struct TracePass {
    scene: TraceScene,
    pipeline_scene: Option<TraceScene>,
    pipeline: Option<wgpu::RenderPipeline>,
    pipeline_layout: wgpu::PipelineLayout,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    args_ubo: wgpu::Buffer,
    environment_sampler: wgpu::Sampler,
    channel_sampler: wgpu::Sampler,
}

impl TracePass {
    pub fn new(device: &wgpu::Device, scene: TraceScene) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("marcher trace bgl"),
            entries: &[
                fullscreen::uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                fullscreen::texture_entry(
                    1,
                    wgpu::TextureViewDimension::Cube,
                    wgpu::TextureSampleType::Float { filterable: true },
                ),
                fullscreen::sampler_entry(2),
                fullscreen::float_texture_entry(3),
                fullscreen::float_texture_entry(4),
                fullscreen::float_texture_entry(5),
                fullscreen::float_texture_entry(6),
                fullscreen::sampler_entry(7),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("marcher trace pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let args_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("marcher trace args ubo"),
            size: std::mem::size_of::<TraceArgs>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            scene,
            pipeline_scene: None,
            pipeline: None,
            pipeline_layout,
            bind_group_layout,
            bind_group: None,
            args_ubo,
            environment_sampler: sampler::cube_map(device),
            channel_sampler: sampler::defaults(device),
        }
    }

    pub fn scene(&self) -> TraceScene {
        self.scene
    }

    /// Switches shaders; the pipeline is rebuilt on the next launch.
    pub fn set_scene(&mut self, scene: TraceScene) {
        self.scene = scene;
    }

    /// Binds the environment map and channel textures. Must be called before
    /// the first [`TracePass::launch`].
    pub fn bind_textures(&mut self, device: &wgpu::Device, textures: &TraceBindings<'_>) {
        let [c0, c1, c2, c3] = textures.channels;
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("marcher trace bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.args_ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&textures.environment.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.environment_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&c0.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&c1.view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::TextureView(&c2.view),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: wgpu::BindingResource::TextureView(&c3.view),
                },
                wgpu::BindGroupEntry {
                    binding: 7,
                    resource: wgpu::BindingResource::Sampler(&self.channel_sampler),
                },
            ],
        }));
    }

    /// Uploads `args` and draws the full-screen trace into `framebuffer`.
    ///
    /// Color and depth are loaded, not cleared.
    pub fn launch(
        &mut self,
        ctx: &RenderCtx<'_>,
        encoder: &mut wgpu::CommandEncoder,
        framebuffer: &HdrFramebuffer,
        args: &TraceArgs,
    ) {
        self.ensure_pipeline(ctx);

        let Some(bind_group) = self.bind_group.as_ref() else {
            log::warn!("trace pass launched before textures were bound; skipped");
            return;
        };
        let Some(pipeline) = self.pipeline.as_ref() else { return };

        ctx.queue.write_buffer(&self.args_ubo, 0, bytemuck::bytes_of(args));

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("marcher trace pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: framebuffer.color_view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: framebuffer.depth_view(),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.draw(0..3, 0..1);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_scene == Some(self.scene) && self.pipeline.is_some() {
            return;
        }

        let label = format!("marcher trace {} shader", self.scene);
        let shader = fullscreen::shader_module(ctx.device, &label, &self.scene.shader_source());

        let pipeline = fullscreen::pipeline(
            ctx.device,
            "marcher trace pipeline",
            &self.pipeline_layout,
            &shader,
            HdrFramebuffer::COLOR_FORMAT,
            Some(wgpu::DepthStencilState {
                format: HdrFramebuffer::DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
        );

        log::info!("trace pipeline built for scene `{}`", self.scene);
        self.pipeline_scene = Some(self.scene);
        self.pipeline = Some(pipeline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scene_is_ray_march() {
        assert_eq!(TraceScene::default(), TraceScene::RayMarch);
    }

    #[test]
    fn scene_names_parse_back() {
        for scene in TraceScene::ALL {
            assert_eq!(scene.name().parse::<TraceScene>(), Ok(scene));
        }
        assert_eq!("Ray-March".parse::<TraceScene>(), Ok(TraceScene::RayMarch));
        assert!("cornell".parse::<TraceScene>().is_err());
    }

    #[test]
    fn next_cycles_through_every_scene() {
        let mut scene = TraceScene::Minimal;
        let mut seen = Vec::new();
        for _ in 0..TraceScene::ALL.len() {
            seen.push(scene);
            scene = scene.next();
        }
        assert_eq!(seen, TraceScene::ALL);
        assert_eq!(scene, TraceScene::Minimal);
        assert_eq!(TraceScene::Venice.next(), TraceScene::Minimal);
    }

    #[test]
    fn every_scene_shares_the_prelude_and_defines_an_entry_point() {
        for scene in TraceScene::ALL {
            let src = scene.shader_source();
            assert!(src.starts_with(COMMON_WGSL), "{scene}");
            assert!(src.contains("fn fs_main"), "{scene}");
            assert!(src.contains("@builtin(frag_depth)"), "{scene}");
        }
    }
}
