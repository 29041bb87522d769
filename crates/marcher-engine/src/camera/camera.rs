use cgmath::{Angle, Deg, InnerSpace, Matrix3, Matrix4, Point3, Rad, Vector3};

use crate::coords::Rect;

use super::film::{DepthOfFieldSettings, FilmSettings};

/// The two projection-matrix entries the trace shader needs to write depth.
///
/// For a camera-space point at `z < 0`, projected depth is
/// `(m22 * z + m23) / -z`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectionTerms {
    pub m22: f32,
    pub m23: f32,
}

impl ProjectionTerms {
    /// Projected `[0, 1]` depth for camera-space `z` (negative in front of the camera).
    #[inline]
    pub fn depth(self, z: f32) -> f32 {
        (self.m22 * z + self.m23) / -z
    }
}

/// Inverts [`ProjectionTerms::depth`]: recovers camera-space `z` from a depth-buffer value.
#[inline]
pub fn reconstruct_camera_z(depth: f32, m22: f32, m23: f32) -> f32 {
    -m23 / (depth + m22)
}

/// Perspective camera with yaw/pitch orientation.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Point3<f32>,
    /// Rotation about world +Y. Zero looks down world -Z.
    pub yaw: Rad<f32>,
    /// Rotation about the camera's local +X, clamped to just under ±90°.
    pub pitch: Rad<f32>,

    field_of_view_y: Rad<f32>,

    /// Distance to the near plane (positive).
    pub near: f32,
    /// Distance to the far plane (positive, may be infinite).
    pub far: f32,

    pub film: FilmSettings,
    pub depth_of_field: DepthOfFieldSettings,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 1.0, 5.0),
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            field_of_view_y: Deg(60.0).into(),
            near: 0.1,
            far: 200.0,
            film: FilmSettings::default(),
            depth_of_field: DepthOfFieldSettings::default(),
        }
    }
}

impl Camera {
    pub const MAX_PITCH: Rad<f32> = Rad(std::f32::consts::FRAC_PI_2 - 0.001);

    pub fn new(position: Point3<f32>, yaw: Rad<f32>, pitch: Rad<f32>) -> Self {
        let mut camera = Self {
            position,
            yaw,
            ..Self::default()
        };
        camera.set_pitch(pitch);
        camera
    }

    pub fn set_pitch(&mut self, pitch: Rad<f32>) {
        self.pitch = Rad(pitch.0.clamp(-Self::MAX_PITCH.0, Self::MAX_PITCH.0));
    }

    /// Sets the vertical field of view. Values are clamped to `(0°, 179°]`.
    pub fn set_field_of_view_angle<A: Into<Rad<f32>>>(&mut self, angle: A) {
        let max: Rad<f32> = Deg(179.0).into();
        let a = angle.into();
        self.field_of_view_y = Rad(a.0.clamp(1e-3, max.0));
    }

    pub fn field_of_view_angle(&self) -> Rad<f32> {
        self.field_of_view_y
    }

    #[inline]
    pub fn tan_half_field_of_view_y(&self) -> f32 {
        (self.field_of_view_y / 2.0).tan()
    }

    /// Camera orientation as a rotation matrix (columns are the camera's X, Y, Z axes).
    pub fn rotation(&self) -> Matrix3<f32> {
        Matrix3::from_angle_y(self.yaw) * Matrix3::from_angle_x(self.pitch)
    }

    /// Camera-to-world rigid transform.
    pub fn frame(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position.to_homogeneous().truncate())
            * Matrix4::from(self.rotation())
    }

    /// Unit-length view direction in world space (the camera's -Z axis).
    pub fn look_vector(&self) -> Vector3<f32> {
        (-self.rotation().z).normalize()
    }

    pub fn right_vector(&self) -> Vector3<f32> {
        self.rotation().x.normalize()
    }

    /// Orients the camera towards `target`.
    pub fn look_at(&mut self, target: Point3<f32>) {
        let dir = target - self.position;
        if dir.magnitude2() <= f32::EPSILON {
            return;
        }
        let dir = dir.normalize();
        // yaw = 0 looks down -Z; positive yaw turns towards -X.
        self.yaw = Rad((-dir.x).atan2(-dir.z));
        self.set_pitch(Rad(dir.y.clamp(-1.0, 1.0).asin()));
    }

    /// Perspective projection for `viewport`, mapping depth to wgpu's `[0, 1]` range.
    ///
    /// The vertical field of view spans the viewport height. `viewport` is the
    /// visible rectangle, so guard-band pixels project outside the unit cube.
    pub fn project_unit_matrix(&self, viewport: Rect) -> Matrix4<f32> {
        let f = 1.0 / self.tan_half_field_of_view_y();
        let aspect = viewport.aspect();
        let ProjectionTerms { m22, m23 } = self.projection_terms();

        #[rustfmt::skip]
        let m = Matrix4::new(
            f / aspect, 0.0, 0.0,  0.0,
            0.0,        f,   0.0,  0.0,
            0.0,        0.0, m22, -1.0,
            0.0,        0.0, m23,  0.0,
        );
        m
    }

    /// Row 2 / columns 2 and 3 of [`Self::project_unit_matrix`].
    pub fn projection_terms(&self) -> ProjectionTerms {
        let n = self.near;
        let f = self.far;
        if f.is_infinite() {
            ProjectionTerms { m22: -1.0, m23: -n }
        } else {
            ProjectionTerms {
                m22: f / (n - f),
                m23: n * f / (n - f),
            }
        }
    }
}
