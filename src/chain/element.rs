use glam::{Quat, Vec3, Vec4};

/// One cross-section sample of a billboard chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    /// Centre of the cross-section.
    pub position: Vec3,
    /// Full width across the ribbon.
    pub width: f32,
    /// U or V texture coordinate, depending on the chain's
    /// [`TexCoordDirection`](super::TexCoordDirection).
    pub tex_coord: f32,
    /// RGBA vertex colour.
    pub color: Vec4,
    /// Only used when the chain is not camera facing.
    pub orientation: Quat,
}

impl Element {
    /// Element with every field given.
    #[must_use]
    pub fn new(
        position: Vec3,
        width: f32,
        tex_coord: f32,
        color: Vec4,
        orientation: Quat,
    ) -> Self {
        Self {
            position,
            width,
            tex_coord,
            color,
            orientation,
        }
    }
}

impl Default for Element {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            width: 0.0,
            tex_coord: 0.0,
            color: Vec4::ONE,
            orientation: Quat::IDENTITY,
        }
    }
}
