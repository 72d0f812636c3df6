//! GPU State management - WebGPU device, queue and one surface per canvas

use super::shapes::Vertex;
use std::cell::RefCell;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Max vertices per target per frame
const VERTEX_CAPACITY: usize = 8192;

/// Errors that can occur during GPU initialization
#[derive(Debug, Error)]
pub enum GpuStateError {
    #[error("No window found")]
    NoWindow,
    #[error("No document found")]
    NoDocument,
    #[error("No canvas with id '{0}' found")]
    NoCanvas(String),
    #[error("Surface creation failed: {0}")]
    SurfaceCreationFailed(String),
    #[error("Failed to find a suitable GPU adapter")]
    NoAdapter,
    #[error("Device creation failed: {0}")]
    DeviceCreationFailed(String),
}

impl From<GpuStateError> for JsValue {
    fn from(err: GpuStateError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasRole {
    /// Paddle game field
    Game,
    /// Skeleton drawn over the camera feed
    Overlay,
}

/// One canvas with its own surface, pipeline and vertex buffer
pub(crate) struct RenderTarget {
    role: CanvasRole,
    surface: wgpu::Surface<'static>,
    render_pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    size: (u32, u32),
}

/// Holds all WebGPU state for rendering
pub(crate) struct GpuState {
    device: wgpu::Device,
    queue: wgpu::Queue,
    targets: Vec<RenderTarget>,
}

// Thread-local storage for GPU state (WASM is single-threaded)
thread_local! {
    pub(crate) static GPU_STATE: RefCell<Option<GpuState>> = const { RefCell::new(None) };
}

/// Vertices that fit the buffer, cut at a triangle boundary
pub(crate) fn clamp_to_capacity(vertices: &[Vertex]) -> &[Vertex] {
    if vertices.len() <= VERTEX_CAPACITY {
        return vertices;
    }
    log::debug!("Truncating {} vertices to {}", vertices.len(), VERTEX_CAPACITY);
    &vertices[..VERTEX_CAPACITY - VERTEX_CAPACITY % 3]
}

fn find_canvas(
    document: &web_sys::Document,
    id: &str,
) -> Result<web_sys::HtmlCanvasElement, GpuStateError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| GpuStateError::NoCanvas(id.to_string()))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| GpuStateError::NoCanvas(id.to_string()))
}

#[cfg(target_arch = "wasm32")]
fn create_canvas_surface(
    instance: &wgpu::Instance,
    canvas: web_sys::HtmlCanvasElement,
) -> Result<wgpu::Surface<'static>, GpuStateError> {
    instance
        .create_surface(wgpu::SurfaceTarget::Canvas(canvas))
        .map_err(|e| GpuStateError::SurfaceCreationFailed(format!("{:?}", e)))
}

#[cfg(not(target_arch = "wasm32"))]
fn create_canvas_surface(
    _instance: &wgpu::Instance,
    _canvas: web_sys::HtmlCanvasElement,
) -> Result<wgpu::Surface<'static>, GpuStateError> {
    Err(GpuStateError::SurfaceCreationFailed(
        "canvas surfaces are only available on wasm32".to_string(),
    ))
}

/// Initialize WebGPU for the game canvas and, if given, the overlay canvas.
/// Canvases keep the pixel size the page gave them.
pub async fn initialize_gpu(
    game_canvas_id: &str,
    overlay_canvas_id: Option<&str>,
) -> Result<(), GpuStateError> {
    let window = web_sys::window().ok_or(GpuStateError::NoWindow)?;
    let document = window.document().ok_or(GpuStateError::NoDocument)?;

    let mut canvases = vec![(CanvasRole::Game, find_canvas(&document, game_canvas_id)?)];
    if let Some(id) = overlay_canvas_id {
        canvases.push((CanvasRole::Overlay, find_canvas(&document, id)?));
    }

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::BROWSER_WEBGPU,
        ..Default::default()
    });

    let mut surfaces = Vec::with_capacity(canvases.len());
    for (role, canvas) in canvases {
        let size = (canvas.width().max(1), canvas.height().max(1));
        surfaces.push((role, create_canvas_surface(&instance, canvas)?, size));
    }

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surfaces.first().map(|(_, surface, _)| surface),
            force_fallback_adapter: false,
        })
        .await
        .ok_or(GpuStateError::NoAdapter)?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Chisel Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
            },
            None,
        )
        .await
        .map_err(|e| GpuStateError::DeviceCreationFailed(format!("{:?}", e)))?;

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Flat Color Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("../shader.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Pipeline Layout"),
        bind_group_layouts: &[],
        push_constant_ranges: &[],
    });

    let mut targets = Vec::with_capacity(surfaces.len());
    for (role, surface, size) in surfaces {
        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&fallback_format) = surface_caps.formats.first() else {
            return Err(GpuStateError::SurfaceCreationFailed(format!(
                "{:?} canvas reports no formats",
                role
            )));
        };
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(fallback_format);

        // Overlay must stay see-through over the video
        let alpha_mode = if role == CanvasRole::Overlay
            && surface_caps
                .alpha_modes
                .contains(&wgpu::CompositeAlphaMode::PreMultiplied)
        {
            wgpu::CompositeAlphaMode::PreMultiplied
        } else {
            surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto)
        };

        surface.configure(
            &device,
            &wgpu::SurfaceConfiguration {
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                format: surface_format,
                width: size.0,
                height: size.1,
                present_mode: wgpu::PresentMode::AutoVsync,
                alpha_mode,
                view_formats: vec![],
                desired_maximum_frame_latency: 2,
            },
        );

        let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Shape Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Vertex Buffer"),
            size: (VERTEX_CAPACITY * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        log::info!("{:?} canvas ready ({}x{}, {:?})", role, size.0, size.1, surface_format);
        targets.push(RenderTarget {
            role,
            surface,
            render_pipeline,
            vertex_buffer,
            size,
        });
    }

    GPU_STATE.with(|state| {
        *state.borrow_mut() = Some(GpuState {
            device,
            queue,
            targets,
        });
    });

    Ok(())
}

impl GpuState {
    fn target(&self, role: CanvasRole) -> Option<&RenderTarget> {
        self.targets.iter().find(|t| t.role == role)
    }

    pub fn target_size(&self, role: CanvasRole) -> Option<(u32, u32)> {
        self.target(role).map(|t| t.size)
    }

    /// Clear the target and draw one triangle list. Missing targets and
    /// lost frames are skipped silently.
    pub fn draw(&self, role: CanvasRole, vertices: &[Vertex], clear: wgpu::Color) {
        let Some(target) = self.target(role) else {
            return;
        };
        let vertices = clamp_to_capacity(vertices);

        let output = match target.surface.get_current_texture() {
            Ok(t) => t,
            Err(e) => {
                log::debug!("Skipping {:?} frame: {:?}", role, e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if !vertices.is_empty() {
            self.queue
                .write_buffer(&target.vertex_buffer, 0, bytemuck::cast_slice(vertices));
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shape Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if !vertices.is_empty() {
                pass.set_pipeline(&target.render_pipeline);
                pass.set_vertex_buffer(0, target.vertex_buffer.slice(..));
                pass.draw(0..vertices.len() as u32, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

/// Whether `initialize_gpu` has completed
pub fn is_initialized() -> bool {
    GPU_STATE.with(|state| state.try_borrow().map(|s| s.is_some()).unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_cut_on_triangle_boundary() {
        let vertex = Vertex {
            position: [0.0, 0.0],
            color: [1.0; 4],
        };
        let small = vec![vertex; 30];
        assert_eq!(clamp_to_capacity(&small).len(), 30);

        let large = vec![vertex; VERTEX_CAPACITY + 10];
        let cut = clamp_to_capacity(&large).len();
        assert!(cut <= VERTEX_CAPACITY);
        assert_eq!(cut % 3, 0);
    }
}
