use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::camera::{Camera, CameraController};
use crate::coords::Viewport;
use crate::core::{App as CoreApp, AppControl, FrameCtx, InitCtx};
use crate::device::Gpu;
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputFrame, InputState, Key};
use crate::render::{HdrFramebuffer, ScreenshotWriter};
use crate::settings::AppSettings;
use crate::time::{FrameClock, FramePacer, FrameTime};

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    exit: bool,
    screenshot: bool,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.exit = true;
    }

    /// Captures the next presented frame to the screenshot directory.
    pub fn request_screenshot(&mut self) {
        self.screenshot = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit
    }

    pub(crate) fn take_screenshot_request(&mut self) -> bool {
        std::mem::take(&mut self.screenshot)
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window, initializes `app` and drives frames until exit.
    ///
    /// Errors from window/GPU creation or from `App::on_init` are returned here.
    pub fn run<A>(settings: AppSettings, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(settings, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

/// Engine-owned per-window state that does not borrow the window.
struct FrameState {
    input_state: InputState,
    input_frame: InputFrame,
    clock: FrameClock,
    pacer: FramePacer,
    camera: Camera,
    controller: CameraController,
    framebuffer: Option<HdrFramebuffer>,
    screenshots: ScreenshotWriter,
    runtime: RuntimeCtx,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    settings: AppSettings,
    app: A,

    entry: Option<WindowEntry>,
    frame: FrameState,

    initialized: bool,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(settings: AppSettings, app: A) -> Self {
        let frame = FrameState {
            input_state: InputState::default(),
            input_frame: InputFrame::default(),
            clock: FrameClock::default(),
            pacer: FramePacer::new(settings.frame_duration),
            camera: Camera::default(),
            controller: CameraController::default(),
            framebuffer: None,
            screenshots: ScreenshotWriter::new(
                settings.screenshot_directory.clone(),
                &settings.window.caption,
            ),
            runtime: RuntimeCtx::default(),
        };

        Self {
            settings,
            app,
            entry: None,
            frame,
            initialized: false,
            exit_requested: false,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let ws = &self.settings.window;
        let attrs = Window::default_attributes()
            .with_title(ws.caption.clone())
            .with_inner_size(PhysicalSize::new(ws.width.max(1), ws.height.max(1)))
            .with_resizable(ws.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.settings.gpu.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed")?;

        log::info!(
            "window `{}` {}x{}",
            self.settings.window.caption,
            self.settings.window.width,
            self.settings.window.height
        );
        self.entry = Some(entry);
        Ok(())
    }

    /// Runs `App::on_init` exactly once and allocates the HDR framebuffer.
    fn initialize(&mut self) -> Result<()> {
        let (app, frame, settings) = (&mut self.app, &mut self.frame, &self.settings);
        let entry = self
            .entry
            .as_ref()
            .ok_or_else(|| anyhow!("initialize called without a window"))?;

        entry.with_gpu(|gpu| -> Result<()> {
            let mut ctx = InitCtx {
                device: gpu.device(),
                queue: gpu.queue(),
                surface_format: gpu.surface_format(),
                settings,
                camera: &mut frame.camera,
                controller: &mut frame.controller,
            };
            app.on_init(&mut ctx).context("application initialization failed")?;

            frame.framebuffer = Some(HdrFramebuffer::new(
                gpu.device(),
                Viewport::from(gpu.size()),
                settings.hdr_framebuffer,
            ));
            Ok(())
        })?;

        self.initialized = true;
        self.frame.clock.reset();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        self.frame.pacer.frame_started(now);

        let (app, frame, settings) = (&mut self.app, &mut self.frame, &self.settings);
        let Some(entry) = self.entry.as_mut() else { return };

        let ft: FrameTime = frame.clock.tick();
        frame.controller.update(
            &mut frame.camera,
            &frame.input_state,
            &frame.input_frame,
            ft.dt,
        );
        if frame.input_frame.key_pressed(Key::F4) {
            log::info!(
                "screenshot requested, writing to {}",
                frame.screenshots.directory().display()
            );
            frame.runtime.request_screenshot();
        }

        let mut app_control = AppControl::Continue;
        entry.with_mut(|fields| {
            let Some(framebuffer) = frame.framebuffer.as_mut() else { return };
            let mut ctx = FrameCtx {
                window: fields.window,
                gpu: fields.gpu,
                framebuffer,
                screenshots: &mut frame.screenshots,
                input: &frame.input_state,
                input_frame: &frame.input_frame,
                time: ft,
                camera: &mut frame.camera,
                settings,
                runtime: &mut frame.runtime,
            };
            app_control = app.on_frame(&mut ctx);
        });

        // Clear per-frame deltas after the frame is consumed.
        frame.input_frame.clear();

        if app_control == AppControl::Exit || frame.runtime.exit_requested() {
            self.exit_requested = true;
            event_loop.exit();
        }
    }

    fn schedule(&self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_ref() else { return };

        let (flow, redraw) = pacing(&self.frame.pacer, Instant::now());
        event_loop.set_control_flow(flow);
        if redraw {
            entry.with_window(|w| w.request_redraw());
        }
    }
}

/// Event-loop control flow for the pacer's state at `now`, and whether a
/// redraw should be requested.
///
/// A due frame sleeps until its redraw request wakes the loop. Hidden or
/// minimized windows may never deliver `RedrawRequested`, and the loop must
/// stay idle while they don't.
fn pacing(pacer: &FramePacer, now: Instant) -> (ControlFlow, bool) {
    if pacer.is_due(now) {
        return (ControlFlow::Wait, true);
    }
    match pacer.next_deadline() {
        Some(deadline) => (ControlFlow::WaitUntil(deadline), false),
        None => (ControlFlow::Wait, false),
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
            return;
        }

        // Textures are loaded before the first redraw is requested.
        if !self.initialized {
            if let Err(e) = self.initialize() {
                self.fail(event_loop, e);
                return;
            }
        }

        self.schedule(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }
        self.schedule(event_loop);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if let Some(ev) = translate_window_event(&event) {
            self.frame
                .input_state
                .apply_event(&mut self.frame.input_frame, ev);
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.exit_requested = true;
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
                self.entry = None;
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.entry.as_mut() {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_gpu_mut(|gpu| gpu.resize(new_size));
                }
            }

            WindowEvent::RedrawRequested if self.initialized => self.redraw(event_loop),

            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const FRAME: Duration = Duration::from_micros(16_667);

    #[test]
    fn due_frame_waits_on_its_redraw_request() {
        let pacer = FramePacer::new(FRAME);
        let (flow, redraw) = pacing(&pacer, Instant::now());
        assert_eq!(flow, ControlFlow::Wait);
        assert!(redraw);
    }

    #[test]
    fn undelivered_redraws_never_poll() {
        // RedrawRequested is withheld while minimized, so frame_started does not
        // run and the frame stays due on every loop iteration.
        let mut pacer = FramePacer::new(FRAME);
        let t0 = Instant::now();
        pacer.frame_started(t0);

        for i in 1..100u32 {
            let (flow, redraw) = pacing(&pacer, t0 + FRAME * i);
            assert_ne!(flow, ControlFlow::Poll);
            assert!(redraw);
        }
    }

    #[test]
    fn sleeps_until_the_next_deadline() {
        let mut pacer = FramePacer::new(FRAME);
        let t0 = Instant::now();
        pacer.frame_started(t0);

        let (flow, redraw) = pacing(&pacer, t0 + Duration::from_millis(1));
        assert_eq!(flow, ControlFlow::WaitUntil(t0 + FRAME));
        assert!(!redraw);
    }
}
