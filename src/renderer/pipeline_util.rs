use super::{BlendMode, RenderState};

/// Depth format every ribbon pipeline renders against.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Single colour target with the given blend mode.
pub(crate) fn fragment_targets(
    format: wgpu::TextureFormat,
    blend: BlendMode,
) -> [Option<wgpu::ColorTargetState>; 1] {
    [Some(wgpu::ColorTargetState {
        format,
        blend: blend.to_wgpu(),
        write_mask: wgpu::ColorWrites::ALL,
    })]
}

/// Depth-stencil state for a chain's render state.
///
/// Depth testing off maps to `Always`, so the depth attachment stays
/// compatible across every pipeline in the pass.
pub(crate) fn depth_stencil_state(state: &RenderState) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: state.depth_write,
        depth_compare: if state.depth_test {
            wgpu::CompareFunction::Less
        } else {
            wgpu::CompareFunction::Always
        },
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Triangle-list primitive state for a chain's render state.
pub(crate) fn primitive_state(state: &RenderState) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: state.winding.to_wgpu(),
        cull_mode: state.cull_mode.to_wgpu(),
        ..Default::default()
    }
}
