//! Interactive viewer: two ribbons chasing each other around the origin.
//!
//! Usage: `ribbon-chain-viewer [preset.toml]`

use std::{path::Path, sync::Arc, time::Instant};

use glam::{Mat4, Quat, Vec3, Vec4};
use ribbon_chain::{
    camera::core::Camera,
    chain::{BillboardChain, Element},
    gpu::{backend::WgpuBackend, render_context::RenderContext},
    options::ChainOptions,
    renderer::{BlendMode, CullMode},
};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

/// Elements emitted per second on every chain.
const EMIT_RATE: f32 = 60.0;

struct Gpu {
    context: RenderContext,
    backend: WgpuBackend,
}

struct ViewerApp {
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    chain: BillboardChain,
    camera: Camera,
    start: Instant,
    emitted: u32,
}

impl ViewerApp {
    fn new(chain: BillboardChain) -> Self {
        Self {
            window: None,
            gpu: None,
            chain,
            camera: Camera {
                eye: Vec3::new(0.0, 4.0, 12.0),
                ..Camera::default()
            },
            start: Instant::now(),
            emitted: 0,
        }
    }

    /// Emit new heads up to the current time, then fade every element by age.
    fn advance(&mut self) {
        let t = self.start.elapsed().as_secs_f32();
        let due = (t * EMIT_RATE) as u32;
        let chains = self.chain.number_of_chains();
        while self.emitted < due {
            let at = self.emitted as f32 / EMIT_RATE;
            for c in 0..chains {
                let element = Element::new(
                    trail_point(c, at),
                    0.4,
                    self.emitted as f32 * 0.05,
                    trail_color(c),
                    Quat::IDENTITY,
                );
                if let Err(e) = self.chain.add_chain_element(c, element) {
                    log::warn!("emit on chain {c}: {e}");
                }
            }
            self.emitted += 1;
        }

        for c in 0..chains {
            let len = self.chain.num_chain_elements(c).unwrap_or(0);
            for i in 0..len {
                let Ok(element) = self.chain.chain_element(c, i) else {
                    continue;
                };
                let mut faded = *element;
                faded.color.w = 1.0 - i as f32 / len as f32;
                faded.width = 0.4 * faded.color.w + 0.05;
                if let Err(e) = self.chain.update_chain_element(c, i, faded) {
                    log::warn!("fade on chain {c}: {e}");
                }
            }
        }

        let orbit = t * 0.2;
        self.camera.eye = Vec3::new(orbit.sin() * 12.0, 4.0, orbit.cos() * 12.0);
    }

    fn redraw(&mut self) {
        self.advance();
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let frame = match gpu.context.get_next_frame() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (w, h) = (gpu.context.config.width, gpu.context.config.height);
                gpu.context.resize(w, h);
                return;
            }
            Err(e) => {
                log::warn!("skipping frame: {e}");
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        // Only queue draws once there is a frame to encode them into.
        self.camera.aspect = gpu.context.aspect();
        gpu.backend.update_camera(&self.camera);
        if let Err(e) = self
            .chain
            .render(&mut gpu.backend, Mat4::IDENTITY, &self.camera)
        {
            log::error!("chain render failed: {e}");
        }

        let mut encoder = gpu.context.create_encoder();
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Chain Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.04,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: gpu.context.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            gpu.backend.encode(&mut pass);
        }
        gpu.context.submit(encoder);
        frame.present();
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title("Ribbon Chain")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        let context = match pollster::block_on(RenderContext::new(
            window.clone(),
            (size.width, size.height),
        )) {
            Ok(context) => context,
            Err(e) => {
                log::error!("failed to initialise GPU: {e}");
                event_loop.exit();
                return;
            }
        };
        let backend = match WgpuBackend::new(&context.device, &context.queue, context.format()) {
            Ok(backend) => backend,
            Err(e) => {
                log::error!("failed to create chain backend: {e}");
                event_loop.exit();
                return;
            }
        };

        window.request_redraw();
        self.gpu = Some(Gpu { context, backend });
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(gpu) = self.gpu.as_mut() {
                    self.chain.release(&mut gpu.backend);
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.context.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Position of chain `chain` at time `t`: offset Lissajous curves.
fn trail_point(chain: usize, t: f32) -> Vec3 {
    let phase = chain as f32 * std::f32::consts::PI;
    Vec3::new(
        (t * 1.3 + phase).sin() * 4.0,
        (t * 2.1 + phase).sin() * 1.5,
        (t * 0.9 + phase).cos() * 4.0,
    )
}

fn trail_color(chain: usize) -> Vec4 {
    if chain % 2 == 0 {
        Vec4::new(1.0, 0.55, 0.15, 1.0)
    } else {
        Vec4::new(0.2, 0.6, 1.0, 1.0)
    }
}

fn default_options() -> ChainOptions {
    let mut options = ChainOptions::default();
    options.geometry.max_elements = 120;
    options.geometry.number_of_chains = 2;
    options.render.blend = BlendMode::Additive;
    options.render.cull_mode = CullMode::None;
    options
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match std::env::args().nth(1) {
        Some(path) => match ChainOptions::load(Path::new(&path)) {
            Ok(options) => options,
            Err(e) => {
                log::error!("failed to load preset {path}: {e}");
                return;
            }
        },
        None => default_options(),
    };
    let chain = match BillboardChain::from_options("viewer", &options) {
        Ok(chain) => chain,
        Err(e) => {
            log::error!("invalid chain options: {e}");
            return;
        }
    };

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(e) => {
            log::error!("failed to create event loop: {e}");
            return;
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = ViewerApp::new(chain);
    if let Err(e) = event_loop.run_app(&mut app) {
        log::error!("event loop error: {e}");
    }
}
