//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! - `FrameClock`: call `tick()` once per presented frame to obtain `FrameTime`
//! - `FramePacer`: fixed frame-duration scheduling for the event loop

mod frame_clock;
mod frame_pacer;

pub use frame_clock::{FrameClock, FrameTime};
pub use frame_pacer::FramePacer;
