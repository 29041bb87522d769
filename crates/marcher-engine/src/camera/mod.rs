//! Debug camera, its first-person controller, and the lens/film parameters the
//! post-processing passes read.
//!
//! Conventions (right-handed, matching the trace shaders):
//! - the camera looks down its local -Z axis, +Y is up
//! - camera-space depth is negative in front of the camera
//! - projected depth uses wgpu's `[0, 1]` range

#[allow(clippy::module_inception)]
mod camera;
mod controller;
mod film;

pub use camera::{reconstruct_camera_z, Camera, ProjectionTerms};
pub use controller::CameraController;
pub use film::{DepthOfFieldSettings, FilmSettings, ToneCurve};
