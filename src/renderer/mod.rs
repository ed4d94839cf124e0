//! Boundary between billboard chains and whatever draws them.
//!
//! A chain never talks to a GPU API directly. It creates, fills and
//! destroys buffers through a [`RenderBackend`], reads and overrides the
//! backend's [`RenderState`], and hands over one [`DrawCommand`] per frame.
//! [`headless::HeadlessBackend`] keeps everything in memory;
//! [`crate::gpu::backend::WgpuBackend`] drives wgpu.

pub mod headless;
pub(crate) mod pipeline_util;
/// Depth, culling and blending state shared with the backend.
pub mod state;

use glam::Mat4;
pub use pipeline_util::DEPTH_FORMAT;
pub use state::{BlendMode, CullMode, RenderState, Winding};

use crate::error::ChainError;

/// Handle to a backend-owned device buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u64);

/// Handle to a backend-owned texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

/// What a buffer is bound as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Per-vertex attributes.
    Vertex,
    /// `u32` triangle-list indices.
    Index,
}

/// Update-frequency hint for a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written rarely.
    Static,
    /// Rewritten most frames.
    Dynamic,
}

impl BufferUsage {
    /// `Dynamic` when `dynamic` is set, `Static` otherwise.
    #[must_use]
    pub fn from_dynamic(dynamic: bool) -> Self {
        if dynamic {
            Self::Dynamic
        } else {
            Self::Static
        }
    }
}

/// Parameters for [`RenderBackend::create_buffer`].
#[derive(Debug, Clone, Copy)]
pub struct BufferDesc<'a> {
    /// Debug label.
    pub label: &'a str,
    /// Binding kind.
    pub kind: BufferKind,
    /// Update-frequency hint.
    pub usage: BufferUsage,
    /// Size in bytes.
    pub size: u64,
}

/// One indexed draw of a chain's buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// Vertex buffer holding [`crate::geometry::ChainVertex`] data.
    pub vertex_buffer: BufferId,
    /// `u32` index buffer.
    pub index_buffer: BufferId,
    /// Number of indices to draw from the start of `index_buffer`.
    pub index_count: u32,
    /// Object-to-world transform.
    pub transform: Mat4,
    /// Optional texture; untextured draws rely on vertex colour.
    pub texture: Option<TextureId>,
    /// Colour blending.
    pub blend: BlendMode,
}

/// Renderer, device-buffer and texture services a chain depends on.
///
/// Draws use whatever [`RenderState`] is current when [`Self::submit`] is
/// called.
pub trait RenderBackend {
    /// Allocate a device buffer of `desc.size` bytes.
    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferId, ChainError>;

    /// Overwrite the start of buffer `id` with `data`.
    fn write_buffer(&mut self, id: BufferId, data: &[u8]) -> Result<(), ChainError>;

    /// Release buffer `id`. Unknown ids are ignored.
    fn destroy_buffer(&mut self, id: BufferId);

    /// Load the texture at `path` (filesystem or asset path).
    fn load_texture(&mut self, path: &str) -> Result<TextureId, ChainError>;

    /// Release texture `id`. Unknown ids are ignored.
    fn release_texture(&mut self, id: TextureId);

    /// Current renderer state.
    fn render_state(&self) -> RenderState;

    /// Replace the current renderer state.
    fn set_render_state(&mut self, state: RenderState);

    /// Schedule `command` with the current renderer state.
    fn submit(&mut self, command: DrawCommand) -> Result<(), ChainError>;
}
