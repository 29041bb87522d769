//! Application settings passed to the runtime before the window opens.
//!
//! Every field has a working default, so callers only override what they need:
//!
//! ```rust,ignore
//! let mut settings = AppSettings::default();
//! settings.window.caption = "Simple GPU Ray Tracer".into();
//! settings.window.width = 780;
//! settings.window.height = 500;
//! settings.screenshot_directory = "../journal/".into();
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::coords::{Rect, Viewport};
use crate::device::GpuInit;

/// Environment variable holding an extra data directory, searched first.
pub const DATA_DIR_ENV: &str = "MARCHER_DATA";

/// Window creation parameters.
#[derive(Debug, Clone)]
pub struct WindowSettings {
    pub caption: String,
    /// Initial client width in physical pixels.
    pub width: u32,
    /// Initial client height in physical pixels.
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            caption: "marcher".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
        }
    }
}

/// Guard-band thickness in pixels, per axis.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GuardBand {
    pub x: u16,
    pub y: u16,
}

impl GuardBand {
    pub const ZERO: GuardBand = GuardBand { x: 0, y: 0 };

    #[inline]
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn uniform(t: u16) -> Self {
        Self { x: t, y: t }
    }

    #[inline]
    pub fn max(self, other: GuardBand) -> GuardBand {
        GuardBand::new(self.x.max(other.x), self.y.max(other.y))
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// HDR framebuffer configuration.
///
/// The color and depth guard bands may differ; the framebuffer is allocated for
/// the larger of the two and the film pass crops the color guard band.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct HdrFramebufferSettings {
    pub depth_guard_band_thickness: GuardBand,
    pub color_guard_band_thickness: GuardBand,
}

impl HdrFramebufferSettings {
    /// Border actually allocated around the visible viewport.
    pub fn allocation_guard_band(&self) -> GuardBand {
        self.depth_guard_band_thickness
            .max(self.color_guard_band_thickness)
    }

    /// Framebuffer size for a window of `window` pixels.
    pub fn framebuffer_extent(&self, window: Viewport) -> Viewport {
        let gb = self.allocation_guard_band();
        Viewport::new(
            window.width + 2 * gb.x as u32,
            window.height + 2 * gb.y as u32,
        )
    }

    /// Visible viewport rectangle inside a framebuffer of `extent` pixels.
    pub fn viewport_in(&self, extent: Viewport) -> Rect {
        let gb = self.allocation_guard_band();
        extent.rect().inset(gb.x as f32, gb.y as f32)
    }
}

/// Top-level settings consumed by [`crate::window::Runtime::run`].
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub window: WindowSettings,
    pub hdr_framebuffer: HdrFramebufferSettings,

    /// Directory screenshots are written to. Created on first capture.
    pub screenshot_directory: PathBuf,

    /// Target duration of one frame. `Duration::ZERO` renders as fast as possible.
    pub frame_duration: Duration,

    /// Roots searched (in order) when resolving relative data file names.
    pub data_directories: Vec<PathBuf>,

    pub gpu: GpuInit,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            hdr_framebuffer: HdrFramebufferSettings::default(),
            screenshot_directory: PathBuf::from("screenshots"),
            frame_duration: Duration::from_secs_f64(1.0 / 60.0),
            data_directories: default_data_directories(std::env::var_os(DATA_DIR_ENV)),
            gpu: GpuInit::default(),
        }
    }
}

fn default_data_directories(from_env: Option<std::ffi::OsString>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = from_env.filter(|d| !d.is_empty()) {
        dirs.push(PathBuf::from(dir));
    }
    dirs.push(PathBuf::from("data-files"));
    dirs.push(PathBuf::from("."));
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_frame_duration_is_sixty_hz() {
        let s = AppSettings::default();
        assert!((s.frame_duration.as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn zero_guard_band_keeps_window_extent() {
        let fb = HdrFramebufferSettings::default();
        let extent = fb.framebuffer_extent(Viewport::new(780, 500));
        assert_eq!(extent, Viewport::new(780, 500));
        assert_eq!(fb.viewport_in(extent), Rect::new(0.0, 0.0, 780.0, 500.0));
    }

    #[test]
    fn allocation_uses_larger_guard_band_per_axis() {
        let fb = HdrFramebufferSettings {
            depth_guard_band_thickness: GuardBand::new(16, 4),
            color_guard_band_thickness: GuardBand::new(8, 12),
        };
        assert_eq!(fb.allocation_guard_band(), GuardBand::new(16, 12));

        let extent = fb.framebuffer_extent(Viewport::new(100, 50));
        assert_eq!(extent, Viewport::new(132, 74));
        assert_eq!(fb.viewport_in(extent), Rect::new(16.0, 12.0, 100.0, 50.0));
    }

    #[test]
    fn env_data_dir_is_searched_first() {
        let dirs = default_data_directories(Some("/opt/assets".into()));
        assert_eq!(dirs[0], PathBuf::from("/opt/assets"));
        assert_eq!(dirs.len(), 3);
    }

    #[test]
    fn empty_env_data_dir_is_ignored() {
        let dirs = default_data_directories(Some("".into()));
        assert_eq!(dirs, vec![PathBuf::from("data-files"), PathBuf::from(".")]);
    }
}
