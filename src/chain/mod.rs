//! Billboard chain: a set of ribbons sharing one element store and one
//! pair of device buffers.
//!
//! Mutations only touch CPU-side state and raise the [`BufferState`]; the
//! vertex/index arrays are rebuilt and uploaded lazily by
//! [`BillboardChain::render`], so any number of updates per frame costs one
//! regeneration.

/// Axis-aligned bounds over live elements.
pub mod bounds;
/// The per-sample element type.
pub mod element;
/// Which way ribbons turn their width.
pub mod facing;
mod render;
/// Buffer staleness levels.
pub mod state;
pub mod storage;

use std::cell::Cell;

pub use bounds::Aabb;
pub use element::Element;
pub use facing::Facing;
use glam::Vec3;
pub use state::BufferState;
pub use storage::{ChainSegment, ChainStorage, ChainView};

pub use crate::geometry::strip::TexCoordDirection;
use crate::{
    error::ChainError,
    geometry::{strip::StripParams, ChainVertex},
    options::ChainOptions,
    renderer::{BlendMode, BufferId, CullMode, RenderState, TextureId},
};

/// Device buffers owned by one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeviceBuffers {
    vertex: BufferId,
    index: BufferId,
}

/// Ribbon renderer for one or more independent chains.
pub struct BillboardChain {
    name: String,
    storage: ChainStorage,
    params: StripParams,
    dynamic: bool,
    render_state: RenderState,
    blend: BlendMode,

    texture_path: String,
    texture: Option<TextureId>,
    texture_pending: bool,

    state: BufferState,
    bounds: Cell<Option<Aabb>>,
    bounds_dirty: Cell<bool>,
    last_eye: Option<Vec3>,

    vertices: Vec<ChainVertex>,
    indices: Vec<u32>,
    buffers: Option<DeviceBuffers>,
    index_count: u32,
}

impl BillboardChain {
    /// Chain set with default options and the given capacity.
    pub fn new(
        name: &str,
        max_elements: usize,
        number_of_chains: usize,
    ) -> Result<Self, ChainError> {
        let mut options = ChainOptions::default();
        options.geometry.max_elements = max_elements;
        options.geometry.number_of_chains = number_of_chains;
        Self::from_options(name, &options)
    }

    /// Chain set configured from `options`.
    ///
    /// A texture path in the options is loaded on the first render.
    pub fn from_options(name: &str, options: &ChainOptions) -> Result<Self, ChainError> {
        options.validate()?;
        let g = &options.geometry;
        let facing = if g.face_camera {
            Facing::CameraFacing
        } else {
            Facing::oriented(Vec3::from_array(g.normal))?
        };
        let storage = ChainStorage::new(g.max_elements, g.number_of_chains)?;
        log::debug!(
            "chain '{name}': {} chains x {} elements",
            g.number_of_chains,
            g.max_elements
        );
        Ok(Self {
            name: name.to_owned(),
            storage,
            params: StripParams {
                facing,
                use_tex_coords: g.use_texture_coords,
                use_vertex_colours: g.use_vertex_colours,
                tex_coord_direction: g.texture_coord_direction,
                other_range: g.other_texture_coord_range,
            },
            dynamic: g.dynamic,
            render_state: options.render.render_state(),
            blend: options.render.blend,
            texture_path: options.render.texture.clone(),
            texture: None,
            texture_pending: !options.render.texture.is_empty(),
            state: BufferState::Reallocate,
            bounds: Cell::new(None),
            bounds_dirty: Cell::new(true),
            last_eye: None,
            vertices: Vec::new(),
            indices: Vec::new(),
            buffers: None,
            index_count: 0,
        })
    }

    /// Debug name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ── Capacity ──

    /// Change the per-chain capacity. Clears every chain.
    pub fn set_max_chain_elements(&mut self, max_elements: usize) -> Result<(), ChainError> {
        self.reallocate(max_elements, self.storage.chain_count())
    }

    /// Per-chain capacity.
    #[must_use]
    pub fn max_chain_elements(&self) -> usize {
        self.storage.max_elements()
    }

    /// Change the number of chains. Clears every chain.
    pub fn set_number_of_chains(&mut self, number_of_chains: usize) -> Result<(), ChainError> {
        self.reallocate(self.storage.max_elements(), number_of_chains)
    }

    /// Number of chains.
    #[must_use]
    pub fn number_of_chains(&self) -> usize {
        self.storage.chain_count()
    }

    fn reallocate(&mut self, max_elements: usize, chains: usize) -> Result<(), ChainError> {
        self.storage = ChainStorage::new(max_elements, chains)?;
        log::debug!(
            "chain '{}': reallocated to {chains} chains x {max_elements} elements",
            self.name
        );
        self.state.raise(BufferState::Reallocate);
        self.bounds_dirty.set(true);
        Ok(())
    }

    // ── Vertex channels ──

    /// Include texture coordinates in the generated vertices.
    ///
    /// Vertices carry no normals, so at least one of texture coordinates
    /// and vertex colours must stay enabled; disabling the last one fails
    /// and keeps the current setting.
    pub fn set_use_texture_coords(&mut self, use_tex_coords: bool) -> Result<(), ChainError> {
        if !use_tex_coords && !self.params.use_vertex_colours {
            return Err(self.colourless_error());
        }
        self.params.use_tex_coords = use_tex_coords;
        self.state.raise(BufferState::ContentDirty);
        Ok(())
    }

    /// Whether texture coordinates are generated.
    #[must_use]
    pub fn use_texture_coords(&self) -> bool {
        self.params.use_tex_coords
    }

    /// Include element colours in the generated vertices.
    ///
    /// See [`Self::set_use_texture_coords`] for the shared constraint.
    pub fn set_use_vertex_colours(&mut self, use_colours: bool) -> Result<(), ChainError> {
        if !use_colours && !self.params.use_tex_coords {
            return Err(self.colourless_error());
        }
        self.params.use_vertex_colours = use_colours;
        self.state.raise(BufferState::ContentDirty);
        Ok(())
    }

    /// Whether element colours are used.
    #[must_use]
    pub fn use_vertex_colours(&self) -> bool {
        self.params.use_vertex_colours
    }

    fn colourless_error(&self) -> ChainError {
        log::warn!(
            "chain '{}': refusing to disable both texture coordinates and vertex colours",
            self.name
        );
        ChainError::InvalidConfiguration(
            "texture coordinates and vertex colours cannot both be disabled".to_owned(),
        )
    }

    /// Axis driven by element texture coordinates.
    pub fn set_texture_coord_direction(&mut self, dir: TexCoordDirection) {
        self.params.tex_coord_direction = dir;
        self.state.raise(BufferState::ContentDirty);
    }

    /// Axis driven by element texture coordinates.
    #[must_use]
    pub fn texture_coord_direction(&self) -> TexCoordDirection {
        self.params.tex_coord_direction
    }

    /// Across-width texture coordinate range (default `0..1`).
    pub fn set_other_texture_coord_range(&mut self, start: f32, end: f32) {
        self.params.other_range = [start, end];
        self.state.raise(BufferState::ContentDirty);
    }

    /// Across-width texture coordinate range.
    #[must_use]
    pub fn other_texture_coord_range(&self) -> [f32; 2] {
        self.params.other_range
    }

    /// Mark device buffers as rewritten often (or not). Recreates them.
    pub fn set_dynamic(&mut self, dynamic: bool) {
        if self.dynamic != dynamic {
            self.dynamic = dynamic;
            self.state.raise(BufferState::Reallocate);
        }
    }

    /// Whether device buffers are created for frequent updates.
    #[must_use]
    pub fn dynamic(&self) -> bool {
        self.dynamic
    }

    // ── Facing ──

    /// Choose camera-facing or per-element oriented ribbons.
    pub fn set_facing(&mut self, facing: Facing) {
        self.params.facing = facing;
        self.last_eye = None;
        self.state.raise(BufferState::ContentDirty);
    }

    /// Camera facing, or oriented around `normal` when `face_camera` is
    /// false. `normal` must be non-zero in the latter case.
    pub fn set_face_camera(&mut self, face_camera: bool, normal: Vec3) -> Result<(), ChainError> {
        let facing = if face_camera {
            Facing::CameraFacing
        } else {
            Facing::oriented(normal)?
        };
        self.set_facing(facing);
        Ok(())
    }

    /// Current facing strategy.
    #[must_use]
    pub fn facing(&self) -> Facing {
        self.params.facing
    }

    // ── Draw state ──

    /// Depth testing for the chain's draw.
    pub fn set_depth_test(&mut self, depth_test: bool) {
        self.render_state.depth_test = depth_test;
    }

    /// Depth writes for the chain's draw.
    pub fn set_depth_write(&mut self, depth_write: bool) {
        self.render_state.depth_write = depth_write;
    }

    /// Face culling for the chain's draw.
    pub fn set_cull_mode(&mut self, cull_mode: CullMode) {
        self.render_state.cull_mode = cull_mode;
    }

    /// Colour blending for the chain's draw.
    pub fn set_blend_mode(&mut self, blend: BlendMode) {
        self.blend = blend;
    }

    /// Colour blending for the chain's draw.
    #[must_use]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    /// Renderer state applied while the chain draws.
    #[must_use]
    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    // ── Elements ──

    /// Add an element at the head of `chain`, dropping the tail when full.
    pub fn add_chain_element(&mut self, chain: usize, element: Element) -> Result<(), ChainError> {
        self.storage.add(chain, element)?;
        self.topology_changed();
        Ok(())
    }

    /// Remove the tail (oldest) element of `chain`.
    ///
    /// Fails with [`ChainError::EmptyChain`] when there is nothing to
    /// remove; no state changes in that case.
    pub fn remove_chain_element(&mut self, chain: usize) -> Result<(), ChainError> {
        self.storage.remove(chain)?;
        self.topology_changed();
        Ok(())
    }

    /// Overwrite element `index` of `chain`, counted from the head.
    ///
    /// Only vertices are regenerated afterwards; indices stay untouched.
    pub fn update_chain_element(
        &mut self,
        chain: usize,
        index: usize,
        element: Element,
    ) -> Result<(), ChainError> {
        self.storage.update(chain, index, element)?;
        self.state.raise(BufferState::ContentDirty);
        self.bounds_dirty.set(true);
        Ok(())
    }

    /// Element `index` of `chain`, counted from the head.
    pub fn chain_element(&self, chain: usize, index: usize) -> Result<&Element, ChainError> {
        self.storage.get(chain, index)
    }

    /// Number of live elements in `chain`.
    pub fn num_chain_elements(&self, chain: usize) -> Result<usize, ChainError> {
        self.storage.len(chain)
    }

    /// Remove every element of `chain`, keeping the chain itself.
    pub fn clear_chain(&mut self, chain: usize) -> Result<(), ChainError> {
        self.storage.clear(chain)?;
        self.topology_changed();
        Ok(())
    }

    /// Remove every element of every chain.
    pub fn clear_all_chains(&mut self) {
        self.storage.clear_all();
        self.topology_changed();
    }

    /// Read-only view of `chain`.
    pub fn chain(&self, chain: usize) -> Result<ChainView<'_>, ChainError> {
        self.storage.view(chain)
    }

    fn topology_changed(&mut self) {
        self.state.raise(BufferState::TopologyDirty);
        self.bounds_dirty.set(true);
    }

    // ── Derived data ──

    /// Box around every live element, `None` when all chains are empty.
    pub fn bounds(&self) -> Option<Aabb> {
        if self.bounds_dirty.get() {
            self.bounds.set(Aabb::from_chains(self.storage.views()));
            self.bounds_dirty.set(false);
        }
        self.bounds.get()
    }

    /// Staleness of the device buffers.
    #[must_use]
    pub fn buffer_state(&self) -> BufferState {
        self.state
    }

    /// Vertices produced by the last regeneration.
    #[must_use]
    pub fn vertices(&self) -> &[ChainVertex] {
        &self.vertices
    }

    /// Indices produced by the last regeneration.
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Index count of the last regeneration.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec4};

    use super::*;

    fn at(x: f32) -> Element {
        Element::new(Vec3::new(x, 0.0, 0.0), 1.0, x, Vec4::ONE, Quat::IDENTITY)
    }

    #[test]
    fn fourth_element_evicts_first() {
        let mut chain = BillboardChain::new("trail", 3, 1).unwrap();
        for x in [1.0, 2.0, 3.0, 4.0] {
            chain.add_chain_element(0, at(x)).unwrap();
        }
        assert_eq!(chain.num_chain_elements(0).unwrap(), 3);
        let held: Vec<f32> = (0..3)
            .map(|i| chain.chain_element(0, i).unwrap().position.x)
            .collect();
        assert_eq!(held, vec![4.0, 3.0, 2.0]);
    }

    #[test]
    fn cannot_disable_every_colour_source() {
        let mut chain = BillboardChain::new("trail", 4, 1).unwrap();
        chain.set_use_texture_coords(false).unwrap();
        assert!(matches!(
            chain.set_use_vertex_colours(false),
            Err(ChainError::InvalidConfiguration(_))
        ));
        assert!(chain.use_vertex_colours());

        chain.set_use_texture_coords(true).unwrap();
        chain.set_use_vertex_colours(false).unwrap();
        assert!(chain.set_use_texture_coords(false).is_err());
        assert!(chain.use_texture_coords());
    }

    #[test]
    fn update_only_dirties_content() {
        let mut chain = BillboardChain::new("trail", 4, 1).unwrap();
        chain.add_chain_element(0, at(0.0)).unwrap();
        chain.state = BufferState::Clean;
        chain.update_chain_element(0, 0, at(5.0)).unwrap();
        assert_eq!(chain.buffer_state(), BufferState::ContentDirty);
        chain.remove_chain_element(0).unwrap();
        assert_eq!(chain.buffer_state(), BufferState::TopologyDirty);
    }

    #[test]
    fn failed_mutation_leaves_state_alone() {
        let mut chain = BillboardChain::new("trail", 4, 2).unwrap();
        chain.state = BufferState::Clean;
        assert!(chain.add_chain_element(2, at(0.0)).is_err());
        assert!(matches!(
            chain.remove_chain_element(1),
            Err(ChainError::EmptyChain(1))
        ));
        assert!(chain.update_chain_element(0, 0, at(0.0)).is_err());
        assert_eq!(chain.buffer_state(), BufferState::Clean);
    }

    #[test]
    fn clearing_chain_zero_keeps_chain_one() {
        let mut chain = BillboardChain::new("trail", 5, 2).unwrap();
        for x in [1.0, 2.0, 3.0] {
            chain.add_chain_element(0, at(x)).unwrap();
            chain.add_chain_element(1, at(-x)).unwrap();
        }
        chain.clear_chain(0).unwrap();
        assert_eq!(chain.num_chain_elements(0).unwrap(), 0);
        assert_eq!(chain.num_chain_elements(1).unwrap(), 3);
        assert_eq!(chain.chain_element(1, 0).unwrap().position.x, -3.0);

        chain.clear_all_chains();
        assert!((0..2).all(|c| chain.num_chain_elements(c).unwrap() == 0));
    }

    #[test]
    fn reconfiguring_capacity_resets_chains() {
        let mut chain = BillboardChain::new("trail", 5, 1).unwrap();
        chain.add_chain_element(0, at(1.0)).unwrap();
        chain.set_number_of_chains(3).unwrap();
        assert_eq!(chain.number_of_chains(), 3);
        assert_eq!(chain.num_chain_elements(0).unwrap(), 0);
        chain.set_max_chain_elements(8).unwrap();
        assert_eq!(chain.max_chain_elements(), 8);
        assert!(chain.buffer_state().needs_reallocation());
        assert!(chain.set_max_chain_elements(0).is_err());
        assert_eq!(chain.max_chain_elements(), 8);
    }

    #[test]
    fn bounds_track_mutations() {
        let mut chain = BillboardChain::new("trail", 5, 1).unwrap();
        assert!(chain.bounds().is_none());
        chain.add_chain_element(0, at(2.0)).unwrap();
        assert_eq!(chain.bounds().unwrap().max.x, 2.5);
        chain.update_chain_element(0, 0, at(-4.0)).unwrap();
        assert_eq!(chain.bounds().unwrap().min.x, -4.5);
    }

    #[test]
    fn options_configure_facing_and_channels() {
        let mut options = ChainOptions::default();
        options.geometry.face_camera = false;
        options.geometry.normal = [0.0, 0.0, 2.0];
        options.geometry.use_vertex_colours = false;
        let chain = BillboardChain::from_options("blade", &options).unwrap();
        assert_eq!(chain.facing(), Facing::Oriented { normal: Vec3::Z });
        assert!(!chain.use_vertex_colours());

        options.geometry.use_texture_coords = false;
        assert!(BillboardChain::from_options("blade", &options).is_err());
    }
}
