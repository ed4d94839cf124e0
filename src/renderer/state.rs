use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Which triangle faces are discarded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CullMode {
    /// Draw both faces.
    None,
    /// Discard front faces.
    Front,
    /// Discard back faces.
    #[default]
    Back,
}

/// Vertex order that counts as front facing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Winding {
    /// Counter-clockwise.
    #[default]
    CounterClockwise,
    /// Clockwise.
    Clockwise,
}

/// Renderer state a chain overrides for its own draw and restores after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RenderState {
    /// Test fragments against the depth buffer.
    pub depth_test: bool,
    /// Write fragment depth.
    pub depth_write: bool,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Front-face winding.
    pub winding: Winding,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_test: true,
            depth_write: false,
            cull_mode: CullMode::Back,
            winding: Winding::CounterClockwise,
        }
    }
}

/// Colour blending applied to the ribbon.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Straight alpha: `src * a + dst * (1 - a)`.
    #[default]
    Alpha,
    /// Premultiplied alpha: `src + dst * (1 - a)`.
    Premultiplied,
    /// Additive glow: `src * a + dst`.
    Additive,
    /// No blending.
    Opaque,
}

impl BlendMode {
    /// Equivalent wgpu blend state (`None` for opaque).
    #[must_use]
    pub fn to_wgpu(self) -> Option<wgpu::BlendState> {
        match self {
            Self::Alpha => Some(wgpu::BlendState::ALPHA_BLENDING),
            Self::Premultiplied => Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
            Self::Additive => Some(wgpu::BlendState {
                color: wgpu::BlendComponent {
                    src_factor: wgpu::BlendFactor::SrcAlpha,
                    dst_factor: wgpu::BlendFactor::One,
                    operation: wgpu::BlendOperation::Add,
                },
                alpha: wgpu::BlendComponent::OVER,
            }),
            Self::Opaque => None,
        }
    }
}

impl CullMode {
    /// Equivalent wgpu face (`None` for no culling).
    #[must_use]
    pub fn to_wgpu(self) -> Option<wgpu::Face> {
        match self {
            Self::None => None,
            Self::Front => Some(wgpu::Face::Front),
            Self::Back => Some(wgpu::Face::Back),
        }
    }
}

impl Winding {
    /// Equivalent wgpu front face.
    #[must_use]
    pub fn to_wgpu(self) -> wgpu::FrontFace {
        match self {
            Self::CounterClockwise => wgpu::FrontFace::Ccw,
            Self::Clockwise => wgpu::FrontFace::Cw,
        }
    }
}
