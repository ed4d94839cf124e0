//! In-memory [`RenderBackend`] that records everything it is asked to do.
//!
//! Useful for tests and for consumers that want the generated geometry on
//! the CPU without a GPU device.

use rustc_hash::FxHashMap;

use super::{
    BufferDesc, BufferId, BufferKind, BufferUsage, DrawCommand, RenderBackend, RenderState,
    TextureId,
};
use crate::error::ChainError;

/// A buffer held by [`HeadlessBackend`].
#[derive(Debug, Clone)]
pub struct HeadlessBuffer {
    /// Binding kind requested at creation.
    pub kind: BufferKind,
    /// Usage hint requested at creation.
    pub usage: BufferUsage,
    /// Bytes, sized at creation.
    pub data: Vec<u8>,
    /// Number of writes since creation.
    pub writes: usize,
}

/// A draw accepted by [`RenderBackend::submit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedDraw {
    /// The submitted command.
    pub command: DrawCommand,
    /// Renderer state current at submission.
    pub state: RenderState,
}

/// Recording backend.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_id: u64,
    state: RenderState,
    buffers: FxHashMap<BufferId, HeadlessBuffer>,
    textures: FxHashMap<TextureId, String>,
    draws: Vec<RecordedDraw>,
    destroyed: usize,
}

impl HeadlessBackend {
    /// Backend with the given initial renderer state.
    #[must_use]
    pub fn with_state(state: RenderState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    /// Buffer `id`, if alive.
    #[must_use]
    pub fn buffer(&self, id: BufferId) -> Option<&HeadlessBuffer> {
        self.buffers.get(&id)
    }

    /// Number of live buffers.
    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Number of buffers destroyed so far.
    #[must_use]
    pub fn destroyed_buffers(&self) -> usize {
        self.destroyed
    }

    /// Path a live texture was loaded from.
    #[must_use]
    pub fn texture_path(&self, id: TextureId) -> Option<&str> {
        self.textures.get(&id).map(String::as_str)
    }

    /// Number of live textures.
    #[must_use]
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Draws submitted so far.
    #[must_use]
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    /// Take the recorded draws, leaving the list empty.
    pub fn take_draws(&mut self) -> Vec<RecordedDraw> {
        std::mem::take(&mut self.draws)
    }

    /// Interpret the first `count` elements of buffer `id` as `T`.
    #[must_use]
    pub fn read<T: bytemuck::Pod>(&self, id: BufferId, count: usize) -> Option<Vec<T>> {
        let buffer = self.buffers.get(&id)?;
        let bytes = buffer.data.get(..count * size_of::<T>())?;
        Some(
            bytes
                .chunks_exact(size_of::<T>())
                .map(bytemuck::pod_read_unaligned)
                .collect(),
        )
    }

    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderBackend for HeadlessBackend {
    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferId, ChainError> {
        let id = BufferId(self.alloc_id());
        let _ = self.buffers.insert(
            id,
            HeadlessBuffer {
                kind: desc.kind,
                usage: desc.usage,
                data: vec![0; desc.size as usize],
                writes: 0,
            },
        );
        log::trace!("headless: created {:?} buffer {id:?} ({} bytes)", desc.kind, desc.size);
        Ok(id)
    }

    fn write_buffer(&mut self, id: BufferId, data: &[u8]) -> Result<(), ChainError> {
        let buffer = self
            .buffers
            .get_mut(&id)
            .ok_or_else(|| ChainError::Backend(format!("unknown buffer {id:?}")))?;
        let size = buffer.data.len();
        let dst = buffer.data.get_mut(..data.len()).ok_or_else(|| {
            ChainError::Backend(format!(
                "write of {} bytes exceeds buffer {id:?} ({size} bytes)",
                data.len()
            ))
        })?;
        dst.copy_from_slice(data);
        buffer.writes += 1;
        Ok(())
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        if self.buffers.remove(&id).is_some() {
            self.destroyed += 1;
        }
    }

    fn load_texture(&mut self, path: &str) -> Result<TextureId, ChainError> {
        if path.is_empty() {
            return Err(ChainError::Texture("empty texture path".to_owned()));
        }
        let id = TextureId(self.alloc_id());
        let _ = self.textures.insert(id, path.to_owned());
        Ok(id)
    }

    fn release_texture(&mut self, id: TextureId) {
        let _ = self.textures.remove(&id);
    }

    fn render_state(&self) -> RenderState {
        self.state
    }

    fn set_render_state(&mut self, state: RenderState) {
        self.state = state;
    }

    fn submit(&mut self, command: DrawCommand) -> Result<(), ChainError> {
        for id in [command.vertex_buffer, command.index_buffer] {
            if !self.buffers.contains_key(&id) {
                return Err(ChainError::Backend(format!("draw references unknown buffer {id:?}")));
            }
        }
        self.draws.push(RecordedDraw {
            command,
            state: self.state,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Mat4;

    use super::*;
    use crate::renderer::BlendMode;

    fn desc(size: u64) -> BufferDesc<'static> {
        BufferDesc {
            label: "test",
            kind: BufferKind::Vertex,
            usage: BufferUsage::Dynamic,
            size,
        }
    }

    #[test]
    fn writes_past_the_end_are_rejected() {
        let mut backend = HeadlessBackend::default();
        let id = backend.create_buffer(&desc(8)).unwrap();
        backend.write_buffer(id, &[1, 2, 3, 4]).unwrap();
        assert!(backend.write_buffer(id, &[0; 9]).is_err());
        assert_eq!(backend.buffer(id).unwrap().writes, 1);
        assert_eq!(backend.read::<u8>(id, 4).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn destroy_is_counted_once() {
        let mut backend = HeadlessBackend::default();
        let id = backend.create_buffer(&desc(4)).unwrap();
        backend.destroy_buffer(id);
        backend.destroy_buffer(id);
        assert_eq!(backend.destroyed_buffers(), 1);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn submit_records_current_state() {
        let mut backend = HeadlessBackend::default();
        let vb = backend.create_buffer(&desc(4)).unwrap();
        let ib = backend.create_buffer(&desc(4)).unwrap();
        let state = RenderState {
            depth_write: true,
            ..RenderState::default()
        };
        backend.set_render_state(state);
        backend
            .submit(DrawCommand {
                vertex_buffer: vb,
                index_buffer: ib,
                index_count: 0,
                transform: Mat4::IDENTITY,
                texture: None,
                blend: BlendMode::Additive,
            })
            .unwrap();
        assert_eq!(backend.draws()[0].state, state);
        assert_eq!(backend.take_draws().len(), 1);
        assert!(backend.draws().is_empty());
    }
}
