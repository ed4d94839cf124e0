use glam::Vec3;

use super::storage::ChainView;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Box enclosing every live element, padded by half its width.
    ///
    /// Returns `None` when no chain has elements.
    pub fn from_chains<'a>(chains: impl IntoIterator<Item = ChainView<'a>>) -> Option<Self> {
        let mut bounds: Option<Self> = None;
        for chain in chains {
            for e in chain.iter() {
                let pad = Vec3::splat(e.width * 0.5);
                let lo = e.position - pad;
                let hi = e.position + pad;
                bounds = Some(match bounds {
                    None => Self { min: lo, max: hi },
                    Some(b) => Self {
                        min: b.min.min(lo),
                        max: b.max.max(hi),
                    },
                });
            }
        }
        bounds
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the sphere through the corners, around [`Self::center`].
    #[must_use]
    pub fn radius(&self) -> f32 {
        (self.max - self.min).length() * 0.5
    }

    /// Whether `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}
