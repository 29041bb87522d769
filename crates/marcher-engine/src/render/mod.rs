//! GPU rendering subsystem.
//!
//! Per frame: the trace pass writes radiance and depth into the
//! [`HdrFramebuffer`], [`DepthOfFieldPass`] blurs it into the filtered target,
//! and [`FilmPass`] tone-maps the visible crop onto the window surface.
//!
//! Convention:
//! - All rectangles are in physical framebuffer pixels (top-left origin, +Y down).
//! - Pass shaders share one full-screen triangle vertex stage.

mod args;
mod ctx;
mod dof;
mod film;
mod framebuffer;
mod fullscreen;
mod screenshot;
mod trace;

pub use args::TraceArgs;
pub use ctx::{FrameTarget, RenderCtx};
pub use dof::DepthOfFieldPass;
pub use film::FilmPass;
pub use framebuffer::HdrFramebuffer;
pub use screenshot::{PendingCapture, ScreenshotWriter};
pub use trace::{TraceBindings, TracePass, TraceScene};
