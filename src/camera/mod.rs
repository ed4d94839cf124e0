//! Camera types and the camera boundary chains render against.
//!
//! Billboard chains only need to know where the viewer is. Whatever owns
//! the camera (usually the particle system) exposes it through
//! [`CameraSource`].

/// Core camera struct and GPU uniform types.
pub mod core;

use glam::{Mat4, Vec3};

use self::core::Camera;

/// Supplies the active camera at render time.
pub trait CameraSource {
    /// Camera-to-world transform.
    fn camera_transform(&self) -> Mat4;

    /// Camera position in world space.
    fn eye_position(&self) -> Vec3 {
        self.camera_transform().w_axis.truncate()
    }
}

impl CameraSource for Mat4 {
    fn camera_transform(&self) -> Mat4 {
        *self
    }
}

impl CameraSource for Camera {
    fn camera_transform(&self) -> Mat4 {
        self.build_view().inverse()
    }

    fn eye_position(&self) -> Vec3 {
        self.eye
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eye_is_transform_translation() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(m.eye_position(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn camera_transform_places_eye() {
        let cam = Camera {
            eye: Vec3::new(0.0, 2.0, 8.0),
            ..Camera::default()
        };
        let from_matrix = cam.camera_transform().w_axis.truncate();
        assert!((from_matrix - cam.eye).length() < 1e-4);
    }
}
