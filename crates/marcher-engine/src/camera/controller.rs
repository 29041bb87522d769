use cgmath::{InnerSpace, Rad, Vector3, Zero};

use crate::input::{InputFrame, InputState, Key, MouseButton};

use super::Camera;

/// First-person fly controller for the debug camera.
///
/// - `W`/`S` move along the view direction, `A`/`D` strafe
/// - `E`/`Q` move along world up/down
/// - right mouse drag or arrow keys rotate
/// - `Shift` multiplies movement speed; the wheel scales base speed
#[derive(Debug, Clone)]
pub struct CameraController {
    /// Base movement speed in world units per second.
    pub speed: f32,
    /// Radians of rotation per pixel of pointer motion.
    pub sensitivity: f32,
    /// Radians per second when turning with the arrow keys.
    pub turn_rate: f32,
    pub boost: f32,
    pub enabled: bool,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(3.0, 0.004)
    }
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sensitivity,
            turn_rate: 1.5,
            boost: 4.0,
            enabled: true,
        }
    }

    /// Applies one frame of input to `camera`. Returns `true` when the camera moved.
    pub fn update(
        &mut self,
        camera: &mut Camera,
        input: &InputState,
        frame: &InputFrame,
        dt: f32,
    ) -> bool {
        if !self.enabled {
            return false;
        }

        if frame.wheel_lines != 0.0 {
            self.speed = (self.speed * 1.1f32.powf(frame.wheel_lines)).clamp(0.05, 500.0);
        }

        let axis = |pos: Key, neg: Key| -> f32 {
            (input.key_down(pos) as i32 - input.key_down(neg) as i32) as f32
        };

        let mut yaw_delta = axis(Key::ArrowLeft, Key::ArrowRight) * self.turn_rate * dt;
        let mut pitch_delta = axis(Key::ArrowUp, Key::ArrowDown) * self.turn_rate * dt;

        if input.button_down(MouseButton::Right) {
            let (dx, dy) = frame.pointer_delta;
            yaw_delta -= dx * self.sensitivity;
            pitch_delta -= dy * self.sensitivity;
        }

        let forward = axis(Key::W, Key::S);
        let strafe = axis(Key::D, Key::A);
        let lift = axis(Key::E, Key::Q);

        let mut moved = false;

        if yaw_delta != 0.0 || pitch_delta != 0.0 {
            camera.yaw += Rad(yaw_delta);
            let pitch = camera.pitch + Rad(pitch_delta);
            camera.set_pitch(pitch);
            moved = true;
        }

        let mut velocity = camera.look_vector() * forward
            + camera.right_vector() * strafe
            + Vector3::unit_y() * lift;

        if !velocity.is_zero() {
            velocity = velocity.normalize();
            let speed = if input.key_down(Key::Shift) {
                self.speed * self.boost
            } else {
                self.speed
            };
            camera.position += velocity * speed * dt;
            moved = true;
        }

        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{InputEvent, KeyState, MouseButtonState};
    use cgmath::Point3;

    fn press(state: &mut InputState, frame: &mut InputFrame, key: Key) {
        state.apply_event(frame, InputEvent::Key { key, state: KeyState::Pressed, repeat: false });
    }

    #[test]
    fn forward_moves_along_look_vector() {
        let mut cam = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        let mut ctl = CameraController::new(2.0, 0.01);
        let (mut state, mut frame) = (InputState::default(), InputFrame::default());
        press(&mut state, &mut frame, Key::W);

        assert!(ctl.update(&mut cam, &state, &frame, 0.5));
        assert!((cam.position.z + 1.0).abs() < 1e-5);
        assert!(cam.position.x.abs() < 1e-5);
    }

    #[test]
    fn shift_boosts_speed() {
        let mut cam = Camera::new(Point3::new(0.0, 0.0, 0.0), Rad(0.0), Rad(0.0));
        let mut ctl = CameraController::new(1.0, 0.01);
        let (mut state, mut frame) = (InputState::default(), InputFrame::default());
        press(&mut state, &mut frame, Key::E);
        press(&mut state, &mut frame, Key::Shift);

        ctl.update(&mut cam, &state, &frame, 1.0);
        assert!((cam.position.y - ctl.boost).abs() < 1e-5);
    }

    #[test]
    fn mouse_look_requires_right_button() {
        let mut cam = Camera::default();
        let mut ctl = CameraController::default();
        let (mut state, mut frame) = (InputState::default(), InputFrame::default());
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 0.0, y: 0.0 });
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 50.0, y: 0.0 });

        assert!(!ctl.update(&mut cam, &state, &frame, 0.016));

        state.apply_event(
            &mut frame,
            InputEvent::PointerButton { button: MouseButton::Right, state: MouseButtonState::Pressed },
        );
        let yaw_before = cam.yaw;
        assert!(ctl.update(&mut cam, &state, &frame, 0.016));
        // Dragging right turns right, i.e. negative yaw.
        assert!(cam.yaw.0 < yaw_before.0);
    }

    #[test]
    fn disabled_controller_ignores_input() {
        let mut cam = Camera::default();
        let start = cam.position;
        let mut ctl = CameraController { enabled: false, ..Default::default() };
        let (mut state, mut frame) = (InputState::default(), InputFrame::default());
        press(&mut state, &mut frame, Key::W);
        assert!(!ctl.update(&mut cam, &state, &frame, 1.0));
        assert_eq!(cam.position, start);
    }

    #[test]
    fn wheel_scales_speed() {
        let mut cam = Camera::default();
        let mut ctl = CameraController::new(1.0, 0.01);
        let state = InputState::default();
        let frame = InputFrame { wheel_lines: 2.0, ..Default::default() };
        ctl.update(&mut cam, &state, &frame, 0.016);
        assert!((ctl.speed - 1.21).abs() < 1e-4);
    }
}
