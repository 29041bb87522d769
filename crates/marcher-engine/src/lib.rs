//! Marcher engine crate.
//!
//! Window, GPU and frame runtime for full-screen ray-marching demos: an HDR
//! framebuffer with guard band, a trace pass, depth of field and a filmic
//! output stage.

pub mod camera;
pub mod coords;
pub mod core;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod settings;
pub mod texture;
pub mod time;
pub mod window;

pub use cgmath;
