//! GPU resource management for drawing chains with wgpu.
//!
//! Provides the wgpu [`RenderBackend`](crate::renderer::RenderBackend),
//! growable buffers, shader composition, PNG textures and window surface
//! setup.

/// wgpu implementation of the renderer boundary.
pub mod backend;
/// Growable GPU buffers with automatic reallocation.
pub mod dynamic_buffer;
/// Bind group layout entries, samplers and the ribbon pipeline.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// PNG ribbon textures.
pub mod texture;
