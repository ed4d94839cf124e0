//! Quad-strip synthesis from chain elements.
//!
//! Each live element becomes two vertices straddling its centre line; each
//! consecutive pair of elements becomes two triangles. Chains are walked
//! oldest to newest and packed densely one after another, so vertex
//! offsets depend only on per-chain element counts. That keeps index
//! generation independent of element contents: in-place updates rewrite
//! vertices only.

use glam::{Vec3, Vec4};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ChainVertex;
use crate::chain::{element::Element, facing::Facing, storage::ChainView};

/// Which texture axis an element's `tex_coord` drives.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TexCoordDirection {
    /// Element value is `u`; `v` spans the ribbon width.
    #[default]
    U,
    /// Element value is `v`; `u` spans the ribbon width.
    V,
}

/// Everything vertex generation needs besides the elements themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripParams {
    /// Width-axis strategy.
    pub facing: Facing,
    /// Emit texture coordinates.
    pub use_tex_coords: bool,
    /// Emit element colours (otherwise opaque white).
    pub use_vertex_colours: bool,
    /// Axis the element `tex_coord` maps to.
    pub tex_coord_direction: TexCoordDirection,
    /// Across-width coordinate of the first and second vertex.
    pub other_range: [f32; 2],
}

impl Default for StripParams {
    fn default() -> Self {
        Self {
            facing: Facing::CameraFacing,
            use_tex_coords: true,
            use_vertex_colours: true,
            tex_coord_direction: TexCoordDirection::U,
            other_range: [0.0, 1.0],
        }
    }
}

/// Number of vertices produced for chains of the given lengths.
pub fn vertex_count(lens: impl IntoIterator<Item = usize>) -> usize {
    lens.into_iter().map(|n| n * 2).sum()
}

/// Number of indices produced for chains of the given lengths.
pub fn index_count(lens: impl IntoIterator<Item = usize>) -> usize {
    lens.into_iter().map(|n| n.saturating_sub(1) * 6).sum()
}

/// Rebuild `out` with two vertices per live element of every chain.
///
/// `eye` is the camera position in the chain's space; it is ignored for
/// oriented facing. A single-element chain has no tangent, so both of its
/// vertices sit on the element position.
pub fn build_vertices<'a>(
    chains: impl IntoIterator<Item = ChainView<'a>>,
    params: &StripParams,
    eye: Vec3,
    out: &mut Vec<ChainVertex>,
) {
    out.clear();
    for chain in chains {
        let n = chain.len();
        for i in 0..n {
            let Some(elem) = chain.oldest(i) else { break };
            let prev = i.checked_sub(1).and_then(|p| chain.oldest(p));
            let next = chain.oldest(i + 1);
            let tangent = match (prev, next) {
                (None, Some(next)) => next.position - elem.position,
                (Some(prev), None) => elem.position - prev.position,
                (Some(prev), Some(next)) => next.position - prev.position,
                (None, None) => Vec3::ZERO,
            };
            let reference = params.facing.reference(elem, eye);
            let perp = tangent.cross(reference).normalize_or_zero() * (elem.width * 0.5);
            out.push(make_vertex(elem, elem.position - perp, params.other_range[0], params));
            out.push(make_vertex(elem, elem.position + perp, params.other_range[1], params));
        }
    }
}

fn make_vertex(elem: &Element, position: Vec3, across: f32, params: &StripParams) -> ChainVertex {
    let uv = match (params.use_tex_coords, params.tex_coord_direction) {
        (false, _) => [0.0, 0.0],
        (true, TexCoordDirection::U) => [elem.tex_coord, across],
        (true, TexCoordDirection::V) => [across, elem.tex_coord],
    };
    let color = if params.use_vertex_colours {
        elem.color
    } else {
        Vec4::ONE
    };
    ChainVertex {
        position: position.to_array(),
        uv,
        color: color.to_array(),
    }
}

/// Rebuild `out` with the triangle list for chains of the given lengths.
///
/// Vertices are assumed packed as [`build_vertices`] writes them. No
/// triangle spans two chains.
pub fn build_indices(lens: impl IntoIterator<Item = usize>, out: &mut Vec<u32>) {
    out.clear();
    let mut base = 0u32;
    for n in lens {
        let n = n as u32;
        for i in 1..n {
            let a = base + (i - 1) * 2;
            let b = base + i * 2;
            out.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
        base += n * 2;
    }
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;
    use crate::chain::storage::ChainStorage;

    fn elem(x: f32, tex: f32) -> Element {
        Element {
            position: Vec3::new(x, 0.0, 0.0),
            width: 2.0,
            tex_coord: tex,
            color: Vec4::new(1.0, 0.0, 0.0, 0.5),
            orientation: Quat::IDENTITY,
        }
    }

    fn filled(lens: &[usize], max: usize) -> ChainStorage {
        let mut s = ChainStorage::new(max, lens.len()).unwrap();
        for (c, &n) in lens.iter().enumerate() {
            for i in 0..n {
                s.add(c, elem(i as f32, i as f32)).unwrap();
            }
        }
        s
    }

    #[test]
    fn counts_follow_chain_lengths() {
        let s = filled(&[3, 0, 1, 5], 5);
        let mut verts = Vec::new();
        let mut indices = Vec::new();
        build_vertices(s.views(), &StripParams::default(), Vec3::Z * 10.0, &mut verts);
        build_indices(s.views().map(|v| v.len()), &mut indices);

        assert_eq!(verts.len(), 2 * (3 + 1 + 5));
        assert_eq!(indices.len(), 6 * (2 + 4));
        assert_eq!(verts.len(), vertex_count([3, 0, 1, 5]));
        assert_eq!(indices.len(), index_count([3, 0, 1, 5]));
    }

    #[test]
    fn indices_never_cross_chains() {
        let mut indices = Vec::new();
        build_indices([2, 2], &mut indices);
        assert_eq!(indices, vec![0, 1, 2, 1, 3, 2, 4, 5, 6, 5, 7, 6]);
    }

    #[test]
    fn camera_facing_spreads_across_view() {
        // Chain along +X, eye on +Z: width axis is Y.
        let s = filled(&[2], 4);
        let mut verts = Vec::new();
        build_vertices(s.views(), &StripParams::default(), Vec3::new(0.5, 0.0, 10.0), &mut verts);

        let oldest_lo = Vec3::from(verts[0].position);
        let oldest_hi = Vec3::from(verts[1].position);
        assert!((oldest_lo - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5, "{oldest_lo}");
        assert!((oldest_hi - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-5, "{oldest_hi}");
    }

    #[test]
    fn oriented_facing_ignores_eye() {
        let s = filled(&[3], 4);
        let params = StripParams {
            facing: Facing::oriented(Vec3::Y).unwrap(),
            ..StripParams::default()
        };
        let mut a = Vec::new();
        let mut b = Vec::new();
        build_vertices(s.views(), &params, Vec3::Z, &mut a);
        build_vertices(s.views(), &params, Vec3::new(-4.0, 7.0, 1.0), &mut b);
        assert_eq!(a, b);
        // tangent +X crossed with +Y gives +Z
        assert!((a[1].position[2] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn uvs_follow_direction_and_range() {
        let s = filled(&[2], 4);
        let mut verts = Vec::new();
        let params = StripParams {
            tex_coord_direction: TexCoordDirection::V,
            other_range: [0.25, 0.75],
            ..StripParams::default()
        };
        build_vertices(s.views(), &params, Vec3::Z, &mut verts);
        // oldest element was added first with tex 0, newest with tex 1
        assert_eq!(verts[0].uv, [0.25, 0.0]);
        assert_eq!(verts[1].uv, [0.75, 0.0]);
        assert_eq!(verts[3].uv, [0.75, 1.0]);

        let params = StripParams::default();
        build_vertices(s.views(), &params, Vec3::Z, &mut verts);
        assert_eq!(verts[2].uv, [1.0, 0.0]);
    }

    #[test]
    fn disabled_channels_use_fallbacks() {
        let s = filled(&[2], 4);
        let mut verts = Vec::new();
        let params = StripParams {
            use_tex_coords: false,
            use_vertex_colours: false,
            ..StripParams::default()
        };
        build_vertices(s.views(), &params, Vec3::Z, &mut verts);
        assert!(verts.iter().all(|v| v.uv == [0.0, 0.0]));
        assert!(verts.iter().all(|v| v.color == [1.0; 4]));

        build_vertices(s.views(), &StripParams::default(), Vec3::Z, &mut verts);
        assert_eq!(verts[0].color, [1.0, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn single_element_collapses_to_its_position() {
        let s = filled(&[1], 4);
        let mut verts = Vec::new();
        build_vertices(s.views(), &StripParams::default(), Vec3::Z, &mut verts);
        assert_eq!(verts.len(), 2);
        assert_eq!(verts[0].position, [0.0, 0.0, 0.0]);
        assert_eq!(verts[1].position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn wrapped_chain_is_emitted_oldest_first() {
        let mut s = ChainStorage::new(3, 1).unwrap();
        for x in 0..5 {
            s.add(0, elem(x as f32, 0.0)).unwrap();
        }
        let mut verts = Vec::new();
        build_vertices(s.views(), &StripParams::default(), Vec3::Z * 5.0, &mut verts);
        let centres: Vec<f32> = verts
            .chunks(2)
            .map(|pair| (pair[0].position[0] + pair[1].position[0]) * 0.5)
            .collect();
        assert_eq!(centres, vec![2.0, 3.0, 4.0]);
    }
}
