//! Device buffer upkeep and draw submission.

use glam::{Mat4, Vec3};

use super::{BillboardChain, BufferState, DeviceBuffers};
use crate::{
    camera::CameraSource,
    error::ChainError,
    geometry::{strip, ChainVertex},
    renderer::{BufferDesc, BufferKind, BufferUsage, DrawCommand, RenderBackend, TextureId},
};

impl BillboardChain {
    /// Bring device buffers up to date and submit the chain's draw.
    ///
    /// Returns `Ok(false)` when nothing was drawn because every chain is
    /// empty or only holds single elements. The backend's render state is
    /// overridden for the draw and restored afterwards, even if submission
    /// fails.
    pub fn render<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        transform: Mat4,
        camera: &dyn CameraSource,
    ) -> Result<bool, ChainError> {
        if self.texture_pending {
            self.load_pending_texture(backend);
        }

        let eye = local_eye(transform, camera.eye_position());
        if self.params.facing.uses_camera() && self.last_eye != Some(eye) {
            self.state.raise(BufferState::ContentDirty);
        }
        self.last_eye = Some(eye);

        self.update_buffers(backend, eye)?;

        let Some(buffers) = self.buffers else {
            return Ok(false);
        };
        if self.vertices.is_empty() || self.index_count == 0 {
            return Ok(false);
        }

        let saved = backend.render_state();
        backend.set_render_state(self.render_state);
        let submitted = backend.submit(DrawCommand {
            vertex_buffer: buffers.vertex,
            index_buffer: buffers.index,
            index_count: self.index_count,
            transform,
            texture: self.texture,
            blend: self.blend,
        });
        backend.set_render_state(saved);
        submitted.map(|()| true)
    }

    /// Load `path` through `backend` and use it for subsequent draws.
    ///
    /// The previous texture is released first. An empty path leaves the
    /// chain untextured.
    pub fn set_texture<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        path: &str,
    ) -> Result<(), ChainError> {
        if let Some(old) = self.texture.take() {
            backend.release_texture(old);
        }
        self.texture_path = path.to_owned();
        self.texture_pending = false;
        if !path.is_empty() {
            self.texture = Some(backend.load_texture(path)?);
            log::debug!("chain '{}': texture '{path}'", self.name);
        }
        Ok(())
    }

    /// Texture path last set, empty when untextured.
    #[must_use]
    pub fn texture_path(&self) -> &str {
        &self.texture_path
    }

    /// Handle of the loaded texture.
    #[must_use]
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Destroy the chain's device buffers and texture.
    ///
    /// Elements are kept; the next [`Self::render`] recreates everything.
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        self.release_buffers(backend);
        if let Some(texture) = self.texture.take() {
            backend.release_texture(texture);
            self.texture_pending = true;
        }
        self.state.raise(BufferState::Reallocate);
    }

    fn load_pending_texture<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        let path = self.texture_path.clone();
        if let Err(e) = self.set_texture(backend, &path) {
            log::warn!(
                "chain '{}': texture '{path}' failed to load, drawing untextured: {e}",
                self.name
            );
        }
    }

    fn release_buffers<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        if let Some(buffers) = self.buffers.take() {
            backend.destroy_buffer(buffers.vertex);
            backend.destroy_buffer(buffers.index);
        }
        self.index_count = 0;
    }

    fn update_buffers<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        eye: Vec3,
    ) -> Result<(), ChainError> {
        if self.state.needs_reallocation() || self.buffers.is_none() {
            self.allocate_buffers(backend)?;
        }
        let Some(buffers) = self.buffers else {
            return Ok(());
        };

        if self.state.vertices_stale() {
            strip::build_vertices(self.storage.views(), &self.params, eye, &mut self.vertices);
            if !self.vertices.is_empty() {
                backend.write_buffer(buffers.vertex, bytemuck::cast_slice(&self.vertices))?;
            }
            log::trace!("chain '{}': {} vertices", self.name, self.vertices.len());
        }
        if self.state.indices_stale() {
            strip::build_indices(self.storage.views().map(|c| c.len()), &mut self.indices);
            if !self.indices.is_empty() {
                backend.write_buffer(buffers.index, bytemuck::cast_slice(&self.indices))?;
            }
            self.index_count = self.indices.len() as u32;
            log::trace!("chain '{}': {} indices", self.name, self.index_count);
        }
        self.state = BufferState::Clean;
        Ok(())
    }

    fn allocate_buffers<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<(), ChainError> {
        self.release_buffers(backend);

        let max = self.storage.max_elements();
        let chains = self.storage.chain_count();
        let max_vertices = strip::vertex_count(std::iter::repeat_n(max, chains));
        let max_indices = strip::index_count(std::iter::repeat_n(max, chains));
        self.vertices = Vec::with_capacity(max_vertices);
        self.indices = Vec::with_capacity(max_indices);

        let usage = BufferUsage::from_dynamic(self.dynamic);
        let vertex_label = format!("{} vertices", self.name);
        let vertex = backend.create_buffer(&BufferDesc {
            label: &vertex_label,
            kind: BufferKind::Vertex,
            usage,
            size: (max_vertices * size_of::<ChainVertex>()) as u64,
        })?;
        let index_label = format!("{} indices", self.name);
        let index = match backend.create_buffer(&BufferDesc {
            label: &index_label,
            kind: BufferKind::Index,
            usage,
            size: (max_indices * size_of::<u32>()) as u64,
        }) {
            Ok(id) => id,
            Err(e) => {
                backend.destroy_buffer(vertex);
                return Err(e);
            }
        };

        self.buffers = Some(DeviceBuffers { vertex, index });
        // Fresh buffers hold nothing, so everything is rewritten.
        self.state = BufferState::TopologyDirty;
        log::debug!(
            "chain '{}': allocated {usage:?} buffers for {max_vertices} vertices, \
             {max_indices} indices",
            self.name
        );
        Ok(())
    }
}

/// Camera position in the chain's object space.
///
/// A singular transform (zero or non-finite determinant) leaves the eye in
/// world space.
fn local_eye(transform: Mat4, eye: Vec3) -> Vec3 {
    let det = transform.determinant();
    if det != 0.0 && det.is_finite() {
        transform.inverse().transform_point3(eye)
    } else {
        eye
    }
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec4};

    use super::*;
    use crate::{
        chain::Element,
        renderer::{headless::HeadlessBackend, BlendMode, CullMode, RenderState, Winding},
    };

    fn camera() -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0))
    }

    fn at(x: f32) -> Element {
        Element::new(Vec3::new(x, 0.0, 0.0), 1.0, x, Vec4::ONE, Quat::IDENTITY)
    }

    fn trail(elements: usize) -> BillboardChain {
        let mut chain = BillboardChain::new("trail", 8, 1).unwrap();
        for i in 0..elements {
            chain.add_chain_element(0, at(i as f32)).unwrap();
        }
        chain
    }

    #[test]
    fn nothing_is_drawn_without_triangles() {
        let mut backend = HeadlessBackend::default();
        let mut chain = trail(0);
        assert!(!chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap());
        chain.add_chain_element(0, at(0.0)).unwrap();
        assert!(!chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap());
        assert_eq!(chain.vertices().len(), 2);
        assert!(backend.draws().is_empty());
    }

    #[test]
    fn draw_carries_chain_state_and_restores_backend_state() {
        let outer = RenderState {
            depth_test: false,
            depth_write: true,
            cull_mode: CullMode::Front,
            winding: Winding::Clockwise,
        };
        let mut backend = HeadlessBackend::with_state(outer);
        let mut chain = trail(3);
        chain.set_cull_mode(CullMode::None);
        chain.set_blend_mode(BlendMode::Additive);

        assert!(chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap());
        let draw = backend.draws()[0];
        assert_eq!(draw.state.cull_mode, CullMode::None);
        assert!(draw.state.depth_test);
        assert!(!draw.state.depth_write);
        assert_eq!(draw.command.index_count, 12);
        assert_eq!(draw.command.blend, BlendMode::Additive);
        assert_eq!(backend.render_state(), outer);
    }

    #[test]
    fn uploaded_buffers_match_generated_arrays() {
        let mut backend = HeadlessBackend::default();
        let mut chain = trail(4);
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        let cmd = backend.draws()[0].command;
        let indices = backend.read::<u32>(cmd.index_buffer, 18).unwrap();
        assert_eq!(indices, chain.indices());
        let vertices = backend.read::<ChainVertex>(cmd.vertex_buffer, 8).unwrap();
        assert_eq!(vertices, chain.vertices());
        assert_eq!(chain.buffer_state(), BufferState::Clean);
    }

    #[test]
    fn in_place_update_leaves_index_buffer_alone() {
        let mut backend = HeadlessBackend::default();
        let mut chain = trail(3);
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        let cmd = backend.draws()[0].command;
        let index_writes = backend.buffer(cmd.index_buffer).unwrap().writes;
        let vertex_writes = backend.buffer(cmd.vertex_buffer).unwrap().writes;

        chain.update_chain_element(0, 0, at(9.0)).unwrap();
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        assert_eq!(backend.buffer(cmd.index_buffer).unwrap().writes, index_writes);
        assert_eq!(backend.buffer(cmd.vertex_buffer).unwrap().writes, vertex_writes + 1);

        chain.add_chain_element(0, at(10.0)).unwrap();
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        assert_eq!(backend.buffer(cmd.index_buffer).unwrap().writes, index_writes + 1);
    }

    #[test]
    fn static_camera_skips_regeneration() {
        let mut backend = HeadlessBackend::default();
        let mut chain = trail(3);
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        let vb = backend.draws()[0].command.vertex_buffer;
        let writes = backend.buffer(vb).unwrap().writes;

        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        assert_eq!(backend.buffer(vb).unwrap().writes, writes);

        let moved = Mat4::from_translation(Vec3::new(0.0, 5.0, 10.0));
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &moved).unwrap();
        assert_eq!(backend.buffer(vb).unwrap().writes, writes + 1);
    }

    #[test]
    fn reallocation_destroys_previous_buffers() {
        let mut backend = HeadlessBackend::default();
        let mut chain = trail(3);
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        assert_eq!(backend.live_buffers(), 2);

        chain.set_max_chain_elements(16).unwrap();
        chain.add_chain_element(0, at(0.0)).unwrap();
        chain.add_chain_element(0, at(1.0)).unwrap();
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        assert_eq!(backend.live_buffers(), 2);
        assert_eq!(backend.destroyed_buffers(), 2);
        let vb = backend.draws()[1].command.vertex_buffer;
        assert_eq!(
            backend.buffer(vb).unwrap().data.len(),
            16 * 2 * size_of::<ChainVertex>()
        );

        chain.set_dynamic(false);
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        let vb = backend.draws()[2].command.vertex_buffer;
        assert_eq!(backend.buffer(vb).unwrap().usage, BufferUsage::Static);
    }

    #[test]
    fn release_frees_everything_and_render_recovers() {
        let mut backend = HeadlessBackend::default();
        let mut chain = trail(2);
        chain.set_texture(&mut backend, "streak.png").unwrap();
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        assert!(backend.draws()[0].command.texture.is_some());

        chain.release(&mut backend);
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.live_textures(), 0);

        assert!(chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap());
        assert_eq!(backend.live_buffers(), 2);
        let texture = backend.draws()[1].command.texture.unwrap();
        assert_eq!(backend.texture_path(texture), Some("streak.png"));
    }

    #[test]
    fn empty_texture_path_draws_untextured() {
        let mut backend = HeadlessBackend::default();
        let mut chain = trail(2);
        chain.set_texture(&mut backend, "a.png").unwrap();
        chain.set_texture(&mut backend, "").unwrap();
        assert_eq!(backend.live_textures(), 0);
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        assert_eq!(backend.draws()[0].command.texture, None);
    }

    #[test]
    fn eye_is_taken_into_object_space() {
        let eye = local_eye(Mat4::from_translation(Vec3::Z * 10.0), Vec3::Z * 10.0);
        assert!(eye.length() < 1e-5);
        assert_eq!(local_eye(Mat4::ZERO, Vec3::ONE), Vec3::ONE);
    }

    #[test]
    fn small_scale_transform_still_faces_the_camera() {
        let transform = Mat4::from_scale_rotation_translation(
            Vec3::splat(0.004),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            Vec3::new(100.0, 0.0, 0.0),
        );
        let local = Vec3::new(1.0, 0.0, 500.0);
        let world_eye = transform.transform_point3(local);
        assert!((local_eye(transform, world_eye) - local).length() < 0.05);

        let mut backend = HeadlessBackend::default();
        let mut chain = trail(3);
        assert!(chain
            .render(&mut backend, transform, &Mat4::from_translation(world_eye))
            .unwrap());

        // Middle element: its width axis must be perpendicular to both the
        // strip tangent (x) and the object-space view direction (z).
        let verts = chain.vertices();
        let axis = Vec3::from(verts[3].position) - Vec3::from(verts[2].position);
        assert!((axis.length() - 1.0).abs() < 1e-3);
        assert!(axis.normalize().dot(Vec3::Y).abs() > 0.999);
    }

    #[test]
    fn two_chains_draw_in_one_call() {
        let mut backend = HeadlessBackend::default();
        let mut chain = BillboardChain::new("pair", 4, 2).unwrap();
        for x in [0.0, 1.0, 2.0] {
            chain.add_chain_element(0, at(x)).unwrap();
            chain.add_chain_element(1, at(x)).unwrap();
        }
        let _ = chain.render(&mut backend, Mat4::IDENTITY, &camera()).unwrap();
        assert_eq!(backend.draws().len(), 1);
        assert_eq!(backend.draws()[0].command.index_count, 24);
        assert!(chain.indices()[12..].iter().all(|&i| i >= 6));
    }
}
