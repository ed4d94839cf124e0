//! Ribbon geometry: vertex format and quad-strip synthesis.

pub mod strip;

// ==================== VERTEX FORMAT ====================

/// 36-byte ribbon vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ChainVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Texture coordinate (zero when texture coordinates are disabled).
    pub uv: [f32; 2],
    /// RGBA colour (opaque white when vertex colours are disabled).
    pub color: [f32; 4],
}

/// wgpu layout matching [`ChainVertex`].
#[must_use]
pub fn chain_vertex_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: size_of::<ChainVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: 0,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: 12,
                shader_location: 1,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x4,
                offset: 20,
                shader_location: 2,
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_stride_matches_struct() {
        assert_eq!(size_of::<ChainVertex>(), 36);
        let layout = chain_vertex_buffer_layout();
        assert_eq!(layout.array_stride, 36);
        assert_eq!(layout.attributes.len(), 3);
    }
}
