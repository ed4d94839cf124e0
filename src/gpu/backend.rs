//! wgpu implementation of the chain renderer boundary.
//!
//! Chains call [`RenderBackend`] methods while updating; draws are queued
//! and replayed into a caller-owned render pass by [`WgpuBackend::encode`].
//! The pass must have one colour attachment in the backend's format and a
//! depth attachment in [`DEPTH_FORMAT`](crate::renderer::DEPTH_FORMAT).

use std::{num::NonZeroU64, path::Path};

use glam::Mat4;
use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::{
    dynamic_buffer::{DynamicBuffer, TypedBuffer},
    pipeline_helpers::{
        create_chain_pipeline, filtering_sampler, repeat_sampler, texture_2d,
        vertex_uniform_buffer,
    },
    shader_composer::{ShaderComposer, BILLBOARD_CHAIN_SHADER},
    texture::ChainTexture,
};
use crate::{
    camera::core::{Camera, CameraUniform},
    error::ChainError,
    geometry::chain_vertex_buffer_layout,
    renderer::{
        BlendMode, BufferDesc, BufferId, BufferKind, DrawCommand, RenderBackend, RenderState,
        TextureId,
    },
};

/// Dynamic-offset stride of the per-draw transform array.
const TRANSFORM_STRIDE: u64 = 256;

/// One per-draw transform, padded to [`TRANSFORM_STRIDE`].
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct TransformSlot {
    model: [[f32; 4]; 4],
    _pad: [[f32; 4]; 12],
}

impl TransformSlot {
    fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            _pad: [[0.0; 4]; 12],
        }
    }
}

struct QueuedDraw {
    command: DrawCommand,
    state: RenderState,
}

type PipelineKey = (RenderState, BlendMode);

/// Renderer backend drawing chains with wgpu.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,

    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: FxHashMap<PipelineKey, wgpu::RenderPipeline>,

    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    transform_layout: wgpu::BindGroupLayout,
    transforms: TypedBuffer<TransformSlot>,
    transform_bind_group: wgpu::BindGroup,

    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: wgpu::BindGroup,
    textures: FxHashMap<TextureId, (ChainTexture, wgpu::BindGroup)>,

    buffers: FxHashMap<BufferId, DynamicBuffer>,
    next_id: u64,
    state: RenderState,
    draws: Vec<QueuedDraw>,
}

impl WgpuBackend {
    /// Backend rendering into `format` colour targets.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ChainError> {
        let mut composer = ShaderComposer::new()?;
        let shader = composer.compose(
            device,
            "Billboard Chain Shader",
            BILLBOARD_CHAIN_SHADER,
            "raster/billboard_chain.wgsl",
        )?;

        let camera_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Chain Camera Layout"),
            entries: &[vertex_uniform_buffer(0, false)],
        });
        let transform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Chain Transform Layout"),
            entries: &[vertex_uniform_buffer(0, true)],
        });
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Chain Texture Layout"),
            entries: &[texture_2d(0), filtering_sampler(1)],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Billboard Chain Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &transform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Chain Camera Buffer"),
            contents: bytemuck::bytes_of(&CameraUniform::new()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Chain Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let transforms =
            TypedBuffer::with_capacity(device, "Chain Transforms", 16, wgpu::BufferUsages::UNIFORM);
        let transform_bind_group =
            create_transform_bind_group(device, &transform_layout, transforms.buffer());

        let sampler = repeat_sampler(device, "Chain Sampler");
        let white = ChainTexture::white(device, queue);
        let white = create_texture_bind_group(device, &texture_layout, &sampler, &white);

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            format,
            shader,
            pipeline_layout,
            pipelines: FxHashMap::default(),
            camera_buffer,
            camera_bind_group,
            transform_layout,
            transforms,
            transform_bind_group,
            texture_layout,
            sampler,
            white,
            textures: FxHashMap::default(),
            buffers: FxHashMap::default(),
            next_id: 0,
            state: RenderState::default(),
            draws: Vec::new(),
        })
    }

    /// Upload the view-projection and eye position of `camera`.
    pub fn update_camera(&self, camera: &Camera) {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Number of draws waiting for [`Self::encode`].
    #[must_use]
    pub fn queued_draws(&self) -> usize {
        self.draws.len()
    }

    /// Record every queued draw into `pass` and clear the queue.
    pub fn encode(&mut self, pass: &mut wgpu::RenderPass<'_>) {
        if self.draws.is_empty() {
            return;
        }

        let slots: Vec<TransformSlot> = self
            .draws
            .iter()
            .map(|d| TransformSlot::new(d.command.transform))
            .collect();
        if self.transforms.write(&self.device, &self.queue, &slots) {
            self.transform_bind_group = create_transform_bind_group(
                &self.device,
                &self.transform_layout,
                self.transforms.buffer(),
            );
        }

        let keys: Vec<PipelineKey> = self
            .draws
            .iter()
            .map(|d| (d.state, d.command.blend))
            .collect();
        for key in keys {
            self.ensure_pipeline(key);
        }

        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        for (i, draw) in self.draws.iter().enumerate() {
            let cmd = &draw.command;
            let (Some(vertices), Some(indices)) = (
                self.buffers.get(&cmd.vertex_buffer),
                self.buffers.get(&cmd.index_buffer),
            ) else {
                log::warn!("skipping draw whose buffers were destroyed before encoding");
                continue;
            };
            let Some(pipeline) = self.pipelines.get(&(draw.state, cmd.blend)) else {
                continue;
            };
            let texture = cmd
                .texture
                .and_then(|id| self.textures.get(&id))
                .map_or(&self.white, |(_, bind_group)| bind_group);

            pass.set_pipeline(pipeline);
            pass.set_bind_group(
                1,
                &self.transform_bind_group,
                &[(i as u64 * TRANSFORM_STRIDE) as u32],
            );
            pass.set_bind_group(2, texture, &[]);
            pass.set_vertex_buffer(0, vertices.buffer().slice(..));
            pass.set_index_buffer(indices.buffer().slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..cmd.index_count, 0, 0..1);
        }
        self.draws.clear();
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let (state, blend) = key;
        let pipeline = create_chain_pipeline(
            &self.device,
            &self.shader,
            &self.pipeline_layout,
            chain_vertex_buffer_layout(),
            self.format,
            &state,
            blend,
        );
        log::debug!("created chain pipeline for {state:?} / {blend:?}");
        let _ = self.pipelines.insert(key, pipeline);
    }

    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl RenderBackend for WgpuBackend {
    fn create_buffer(&mut self, desc: &BufferDesc<'_>) -> Result<BufferId, ChainError> {
        let usage = match desc.kind {
            BufferKind::Vertex => wgpu::BufferUsages::VERTEX,
            BufferKind::Index => wgpu::BufferUsages::INDEX,
        };
        let id = BufferId(self.alloc_id());
        let buffer = DynamicBuffer::new(&self.device, desc.label, desc.size as usize, usage);
        log::trace!(
            "created {:?} buffer '{}' ({} bytes, {:?})",
            desc.kind,
            desc.label,
            buffer.capacity(),
            desc.usage
        );
        let _ = self.buffers.insert(id, buffer);
        Ok(id)
    }

    fn write_buffer(&mut self, id: BufferId, data: &[u8]) -> Result<(), ChainError> {
        let buffer = self
            .buffers
            .get_mut(&id)
            .ok_or_else(|| ChainError::Backend(format!("unknown buffer {id:?}")))?;
        let _ = buffer.write_bytes(&self.device, &self.queue, data);
        Ok(())
    }

    fn destroy_buffer(&mut self, id: BufferId) {
        let _ = self.buffers.remove(&id);
    }

    fn load_texture(&mut self, path: &str) -> Result<TextureId, ChainError> {
        let texture = ChainTexture::from_png_file(&self.device, &self.queue, Path::new(path))?;
        let bind_group =
            create_texture_bind_group(&self.device, &self.texture_layout, &self.sampler, &texture);
        let id = TextureId(self.alloc_id());
        let _ = self.textures.insert(id, (texture, bind_group));
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
                return Err(ChainError::Backend(format!(
                    "draw references unknown buffer {id:?}"
                )));
            }
        }
        self.draws.push(QueuedDraw {
            command,
            state: self.state,
        });
        Ok(())
    }
}

fn create_transform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Chain Transform Bind Group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: NonZeroU64::new(size_of::<[[f32; 4]; 4]>() as u64),
            }),
        }],
    })
}

fn create_texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    texture: &ChainTexture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Chain Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    })
}
