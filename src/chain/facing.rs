use glam::Vec3;

use super::element::Element;
use crate::error::ChainError;

/// How each cross-section is turned relative to the chain tangent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Facing {
    /// Ribbon always faces the viewer. Good for smoke trails and beams,
    /// where it fakes a cylinder.
    #[default]
    CameraFacing,
    /// Ribbon faces `orientation * normal` of each element. With an
    /// identity orientation the segment faces `normal`. Suited to wide
    /// trails behind thin objects, e.g. a sword swing.
    Oriented {
        /// Unit-length reference direction.
        normal: Vec3,
    },
}

impl Facing {
    /// Oriented facing with `normal` normalised; zero vectors are rejected.
    pub fn oriented(normal: Vec3) -> Result<Self, ChainError> {
        let normal = normal.try_normalize().ok_or_else(|| {
            ChainError::InvalidConfiguration(format!(
                "facing normal must be non-zero, got {normal}"
            ))
        })?;
        Ok(Self::Oriented { normal })
    }

    /// Vector crossed with the chain tangent to get the ribbon's width axis.
    #[must_use]
    pub fn reference(&self, element: &Element, eye: Vec3) -> Vec3 {
        match self {
            Self::CameraFacing => eye - element.position,
            Self::Oriented { normal } => element.orientation * *normal,
        }
    }

    /// Whether vertex positions depend on the camera.
    #[must_use]
    pub fn uses_camera(&self) -> bool {
        matches!(self, Self::CameraFacing)
    }
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;

    #[test]
    fn camera_facing_points_at_eye() {
        let e = Element {
            position: Vec3::new(1.0, 0.0, 0.0),
            ..Element::default()
        };
        let r = Facing::CameraFacing.reference(&e, Vec3::new(1.0, 0.0, 5.0));
        assert_eq!(r, Vec3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn oriented_rotates_normal() {
        let facing = Facing::oriented(Vec3::new(3.0, 0.0, 0.0)).unwrap();
        let e = Element {
            orientation: Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            ..Element::default()
        };
        let r = facing.reference(&e, Vec3::ZERO);
        assert!((r - Vec3::Y).length() < 1e-5, "got {r}");
    }

    #[test]
    fn zero_normal_is_rejected() {
        assert!(matches!(
            Facing::oriented(Vec3::ZERO),
            Err(ChainError::InvalidConfiguration(_))
        ));
    }
}
