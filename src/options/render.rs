use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::renderer::{BlendMode, CullMode, RenderState, Winding};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
/// Draw-state options of a billboard chain.
pub struct RenderOptions {
    /// Texture path; empty renders untextured.
    pub texture: String,
    /// Test against the depth buffer.
    pub depth_test: bool,
    /// Write depth.
    pub depth_write: bool,
    /// Colour blending.
    pub blend: BlendMode,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Front-face winding.
    pub winding: Winding,
}

impl Default for RenderOptions {
    fn default() -> Self {
        let state = RenderState::default();
        Self {
            texture: String::new(),
            depth_test: state.depth_test,
            depth_write: state.depth_write,
            blend: BlendMode::Alpha,
            cull_mode: state.cull_mode,
            winding: state.winding,
        }
    }
}

impl RenderOptions {
    /// Renderer state these options describe.
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        RenderState {
            depth_test: self.depth_test,
            depth_write: self.depth_write,
            cull_mode: self.cull_mode,
            winding: self.winding,
        }
    }
}
