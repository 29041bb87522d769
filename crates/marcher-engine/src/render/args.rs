use bytemuck::{Pod, Zeroable};
use cgmath::Matrix4;

use crate::camera::Camera;
use crate::coords::{Rect, Viewport};
use crate::texture::CubeMap;
use crate::time::FrameTime;

/// Per-frame uniform block of the trace shaders.
///
/// Layout mirrors `struct TraceArgs` in `shaders/trace_common.wgsl`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct TraceArgs {
    pub camera_to_world: [[f32; 4]; 4],
    /// Visible viewport `(x, y, w, h)` in framebuffer pixels.
    pub domain: [f32; 4],
    /// Framebuffer size in pixels, guard band included.
    pub extent: [f32; 2],
    pub tan_half_field_of_view_y: f32,
    pub projection_m22: f32,
    pub projection_m23: f32,
    pub environment_mip_constant: f32,
    /// Seconds since start.
    pub time: f32,
    pub frame: u32,
}

impl TraceArgs {
    /// Collects the camera, viewport, environment and clock state for one frame.
    pub fn from_camera(
        camera: &Camera,
        viewport: Rect,
        extent: Viewport,
        environment: Option<&CubeMap>,
        time: &FrameTime,
    ) -> Self {
        let frame: Matrix4<f32> = camera.frame();
        let terms = camera.projection_terms();
        Self {
            camera_to_world: frame.into(),
            domain: viewport.to_array(),
            extent: [extent.width as f32, extent.height as f32],
            tan_half_field_of_view_y: camera.tan_half_field_of_view_y(),
            projection_m22: terms.m22,
            projection_m23: terms.m23,
            environment_mip_constant: environment.map_or(0.0, CubeMap::mip_constant),
            time: time.elapsed,
            // Shaders only use this for noise seeds.
            frame: time.frame_index as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use cgmath::{Deg, Point3, Rad};

    use super::*;

    fn frame_time(elapsed: f32, frame_index: u64) -> FrameTime {
        FrameTime {
            dt: 1.0 / 60.0,
            elapsed,
            now: Instant::now(),
            frame_index,
        }
    }

    #[test]
    fn uniform_block_is_std140_sized() {
        assert_eq!(std::mem::size_of::<TraceArgs>(), 112);
        assert_eq!(std::mem::size_of::<TraceArgs>() % 16, 0);
    }

    #[test]
    fn captures_camera_state() {
        let mut camera = Camera::new(Point3::new(1.0, 2.0, 3.0), Rad(0.0), Rad(0.0));
        camera.set_field_of_view_angle(Deg(40.0));
        let viewport = Rect::new(8.0, 8.0, 780.0, 500.0);

        let args = TraceArgs::from_camera(
            &camera,
            viewport,
            Viewport::new(796, 516),
            None,
            &frame_time(2.5, 7),
        );

        assert_eq!(args.camera_to_world[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(args.domain, [8.0, 8.0, 780.0, 500.0]);
        assert_eq!(args.extent, [796.0, 516.0]);
        assert!((args.tan_half_field_of_view_y - 20.0_f32.to_radians().tan()).abs() < 1e-5);

        let terms = camera.projection_terms();
        assert_eq!(args.projection_m22, terms.m22);
        assert_eq!(args.projection_m23, terms.m23);
        assert_eq!(args.environment_mip_constant, 0.0);
        assert_eq!(args.time, 2.5);
        assert_eq!(args.frame, 7);
    }
}
