/// How stale the derived vertex/index buffers are.
///
/// Levels are ordered: each one implies all work of the levels below it.
/// Raising the state keeps the maximum of the current and requested level,
/// so many mutations per frame cost a single regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum BufferState {
    /// Device buffers match the chain contents.
    #[default]
    Clean,
    /// Element data changed in place; vertices must be rewritten.
    ContentDirty,
    /// Element counts changed; vertices and indices must be rewritten.
    TopologyDirty,
    /// Capacity changed; device buffers must be recreated.
    Reallocate,
}

impl BufferState {
    /// Raise to at least `level`.
    pub fn raise(&mut self, level: Self) {
        *self = (*self).max(level);
    }

    /// Whether the vertex buffer needs rewriting.
    #[must_use]
    pub fn vertices_stale(self) -> bool {
        self >= Self::ContentDirty
    }

    /// Whether the index buffer needs rewriting.
    #[must_use]
    pub fn indices_stale(self) -> bool {
        self >= Self::TopologyDirty
    }

    /// Whether device buffers must be recreated.
    #[must_use]
    pub fn needs_reallocation(self) -> bool {
        self == Self::Reallocate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_never_lowers() {
        let mut state = BufferState::TopologyDirty;
        state.raise(BufferState::ContentDirty);
        assert_eq!(state, BufferState::TopologyDirty);
        state.raise(BufferState::Reallocate);
        assert!(state.needs_reallocation());
    }

    #[test]
    fn content_dirty_leaves_indices_alone() {
        let state = BufferState::ContentDirty;
        assert!(state.vertices_stale());
        assert!(!state.indices_stale());
        assert!(!BufferState::Clean.vertices_stale());
    }
}
