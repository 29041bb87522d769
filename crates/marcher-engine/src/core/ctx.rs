use std::path::PathBuf;

use anyhow::Result;
use winit::window::Window;

use crate::camera::{Camera, CameraController};
use crate::coords::Viewport;
use crate::device::Gpu;
use crate::input::{InputFrame, InputState};
use crate::render::{FrameTarget, HdrFramebuffer, RenderCtx, ScreenshotWriter};
use crate::settings::AppSettings;
use crate::texture::{find_data_file, CubeMap, Texture, TextureEncoding};
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

use super::app::AppControl;

/// One-time setup context passed to `core::App::on_init`.
pub struct InitCtx<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub settings: &'a AppSettings,
    pub camera: &'a mut Camera,
    pub controller: &'a mut CameraController,
}

impl InitCtx<'_> {
    /// Resolves `name` against the configured data directories.
    pub fn find_data_file(&self, name: &str) -> Result<PathBuf> {
        find_data_file(name, &self.settings.data_directories)
    }

    pub fn load_texture(&self, name: &str, encoding: TextureEncoding) -> Result<Texture> {
        let path = self.find_data_file(name)?;
        Texture::from_file(self.device, self.queue, &path, encoding)
    }

    /// Loads a six-face cube map from a `*` pattern such as `sky/sky_*.jpg`.
    pub fn load_cube_map(&self, pattern: &str, encoding: TextureEncoding) -> Result<CubeMap> {
        CubeMap::from_pattern(
            self.device,
            self.queue,
            pattern,
            &self.settings.data_directories,
            encoding,
        )
    }
}

/// Per-frame context passed to `core::App::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: &'a Window,
    pub gpu: &'a mut Gpu<'w>,
    pub framebuffer: &'a mut HdrFramebuffer,
    pub screenshots: &'a mut ScreenshotWriter,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
    pub camera: &'a mut Camera,
    pub settings: &'a AppSettings,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Acquires the surface frame and calls `draw` with a ready [`RenderCtx`]
    /// and [`FrameTarget`]. Then submits and presents, and writes a screenshot
    /// if one was requested.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut FrameTarget<'_>),
    {
        let size = Viewport::from(self.gpu.size());
        self.framebuffer
            .ensure(self.gpu.device(), size, self.settings.hdr_framebuffer);

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                if action.is_fatal() {
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            size,
        );

        // FrameTarget borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut target = FrameTarget::new(&mut frame.encoder, &frame.view, &*self.framebuffer);
            draw(&rctx, &mut target);
        }

        let capture = if self.runtime.take_screenshot_request() {
            if self.gpu.supports_capture() {
                Some(self.screenshots.record_copy(
                    self.gpu.device(),
                    &mut frame.encoder,
                    &frame.surface_texture.texture,
                ))
            } else {
                log::warn!("surface does not support COPY_SRC; screenshot skipped");
                None
            }
        } else {
            None
        };

        self.window.pre_present_notify();
        self.gpu.submit(frame);

        if let Some(capture) = capture {
            if let Err(e) = self.screenshots.finish(self.gpu.device(), capture) {
                log::error!("screenshot failed: {e:#}");
            }
        }

        AppControl::Continue
    }
}
