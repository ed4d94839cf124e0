use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::strip::TexCoordDirection;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
/// Capacity and vertex-generation options of a billboard chain.
pub struct GeometryOptions {
    /// Maximum live elements per chain.
    pub max_elements: usize,
    /// Number of independent chains sharing the buffers.
    pub number_of_chains: usize,
    /// Emit texture coordinates.
    pub use_texture_coords: bool,
    /// Emit per-element vertex colours.
    pub use_vertex_colours: bool,
    /// Device buffers are rewritten most frames.
    pub dynamic: bool,
    /// Axis driven by each element's texture coordinate.
    pub texture_coord_direction: TexCoordDirection,
    /// Across-width texture coordinate range.
    pub other_texture_coord_range: [f32; 2],
    /// Always face the camera; otherwise use `normal` and element
    /// orientations.
    pub face_camera: bool,
    /// Reference normal for non camera-facing chains.
    pub normal: [f32; 3],
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            max_elements: 20,
            number_of_chains: 1,
            use_texture_coords: true,
            use_vertex_colours: true,
            dynamic: true,
            texture_coord_direction: TexCoordDirection::U,
            other_texture_coord_range: [0.0, 1.0],
            face_camera: true,
            normal: [1.0, 0.0, 0.0],
        }
    }
}
