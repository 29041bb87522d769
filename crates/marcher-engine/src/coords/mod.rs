//! Coordinate and geometry types shared across the engine.
//!
//! Canonical CPU space:
//! - Physical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! The trace shader converts pixel coordinates to camera rays using the
//! viewport rectangle uploaded with the trace arguments.

mod color;
mod rect;
mod vec2;
mod viewport;

pub use color::ColorRgba;
pub use rect::Rect;
pub use vec2::Vec2;
pub use viewport::Viewport;
