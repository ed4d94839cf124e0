//! Billboard chains: ribbon trails built from ring buffers of elements.
//!
//! A [`chain::BillboardChain`] owns any number of independent chains that
//! share one preallocated element store. Each chain is a fixed-capacity
//! ring buffer: adding to a full chain drops its oldest element. At render
//! time the live elements are expanded into a camera-facing (or
//! orientation-facing) quad strip and drawn in a single call.
//!
//! # Key entry points
//!
//! - [`chain::BillboardChain`] - element management and render submission
//! - [`geometry::strip`] - vertex/index synthesis from chain elements
//! - [`renderer::RenderBackend`] - the renderer boundary chains draw through
//! - [`gpu::backend::WgpuBackend`] - wgpu implementation of that boundary
//! - [`options::ChainOptions`] - TOML-serialisable chain configuration
//!
//! # Architecture
//!
//! Mutations only raise a [`chain::BufferState`]. The next render
//! regenerates whatever is stale (vertices only for in-place updates,
//! indices too when element counts changed, fresh device buffers when
//! capacity changed), then submits one draw with the chain's depth and
//! cull state, restoring the renderer's previous state afterwards.

pub mod camera;
pub mod chain;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod options;
pub mod renderer;

pub use chain::{BillboardChain, Element};
pub use error::ChainError;
