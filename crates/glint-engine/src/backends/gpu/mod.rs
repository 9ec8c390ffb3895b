//! wgpu backend.
//!
//! One implementation serves every hardware renderer kind by pinning the
//! wgpu instance to a single API. Window surfaces render into an offscreen
//! RGBA8 backbuffer that `present` blits to the swapchain, so window and
//! image targets share one code path and both support readback.
//!
//! Programs are WGSL. See [`reflect`] for the binding conventions.

mod device;
mod pipeline;
mod present;
mod reflect;
mod texture;

use std::collections::HashMap;

use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Fullscreen;

use crate::error::BackendError;
use crate::image::Sampling;
use crate::matrix::Mat4;
use crate::renderer::{
    Backend, DrawCall, Features, InitFlags, PixelRect, ProgramHandle, RendererId, ShaderHandle,
    SurfaceHandle, SurfaceViewport, TextureDesc, TextureHandle, WindowBinding, WindowRequest,
    WindowSurface,
};
use crate::shader::{ShaderKind, ShaderLanguage};

pub use device::WgpuConfig;

use device::{GpuDevice, Swapchain, read_texture_region};
use pipeline::{Layouts, PipelineCache, PipelineKey, Stages};
use present::Presenter;
use reflect::{Reflection, UniformBlock};
use texture::{GpuTexture, TEXTURE_FORMAT, color_bytes};

/// The wgpu API a renderer kind runs on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum WgpuApi {
    Vulkan,
    Metal,
    Dx12,
    Gl,
    Gles,
}

impl WgpuApi {
    pub fn backends(self) -> wgpu::Backends {
        match self {
            WgpuApi::Vulkan => wgpu::Backends::VULKAN,
            WgpuApi::Metal => wgpu::Backends::METAL,
            WgpuApi::Dx12 => wgpu::Backends::DX12,
            // wgpu's GL backend drives desktop GL and GLES alike.
            WgpuApi::Gl | WgpuApi::Gles => wgpu::Backends::GL,
        }
    }
}

struct WindowTarget {
    window_id: u64,
    backbuffer: GpuTexture,
    swapchain: Option<Swapchain>,
    /// Rebuilt lazily after the backbuffer changes.
    present_bind_group: Option<wgpu::BindGroup>,
    fullscreen: bool,
}

enum Surface {
    Window(WindowTarget),
    Texture(TextureHandle),
}

struct Shader {
    kind: ShaderKind,
    module: wgpu::ShaderModule,
    reflection: Reflection,
}

struct Linked {
    vertex: (wgpu::ShaderModule, String),
    fragment: (wgpu::ShaderModule, String),
    attributes: Vec<(String, u32)>,
    uniforms: Option<UniformBlock>,
}

#[derive(Default)]
struct Program {
    attached: Vec<ShaderHandle>,
    linked: Option<Linked>,
}

/// Device objects that exist between `init` and `quit`.
struct Live {
    gpu: GpuDevice,
    layouts: Layouts,
    pipelines: PipelineCache,
    default_module: wgpu::ShaderModule,
    presenter: Presenter,
    /// Bound when a draw has no texture.
    white: GpuTexture,
    present_mode: wgpu::PresentMode,
}

impl Live {
    fn new(gpu: GpuDevice, present_mode: wgpu::PresentMode) -> Self {
        let device = &gpu.device;
        let layouts = Layouts::new(device);
        let default_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("glint default shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/default.wgsl").into()),
        });
        let presenter = Presenter::new(device);
        let white = GpuTexture::new(device, 1, 1, 1, Sampling::default());
        // Cannot fail: the region is inside the texture and the data is long enough.
        let _ = white.write(&gpu.queue, 0, PixelRect::new(0, 0, 1, 1), &[255; 4]);
        Self {
            gpu,
            layouts,
            pipelines: PipelineCache::default(),
            default_module,
            presenter,
            white,
            present_mode,
        }
    }
}

pub struct WgpuBackend {
    id: RendererId,
    api: WgpuApi,
    config: WgpuConfig,
    live: Option<Live>,
    textures: HashMap<TextureHandle, GpuTexture>,
    surfaces: HashMap<SurfaceHandle, Surface>,
    shaders: HashMap<ShaderHandle, Shader>,
    programs: HashMap<ProgramHandle, Program>,
    next_handle: u64,
}

impl WgpuBackend {
    pub const FEATURES: Features = Features::NON_POWER_OF_TWO
        .union(Features::RENDER_TARGETS)
        .union(Features::ALL_BLEND_PRESETS)
        .union(Features::WRAP_REPEAT_MIRRORED)
        .union(Features::MIPMAPS)
        .union(Features::BASIC_SHADERS)
        .union(Features::READBACK)
        .union(Features::MULTIPLE_WINDOWS);

    pub fn new(id: RendererId, api: WgpuApi, config: WgpuConfig) -> Self {
        Self {
            id,
            api,
            config,
            live: None,
            textures: HashMap::new(),
            surfaces: HashMap::new(),
            shaders: HashMap::new(),
            programs: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn api(&self) -> WgpuApi {
        self.api
    }

    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn live(&self) -> Result<&Live, BackendError> {
        self.live
            .as_ref()
            .ok_or_else(|| BackendError::Device("backend is not initialized".into()))
    }

    fn present_mode(&self, flags: InitFlags) -> wgpu::PresentMode {
        if flags.contains(InitFlags::DISABLE_VSYNC) {
            wgpu::PresentMode::AutoNoVsync
        } else if flags.contains(InitFlags::ENABLE_VSYNC) {
            wgpu::PresentMode::AutoVsync
        } else {
            self.config.present_mode
        }
    }

    fn request_size(request: &WindowRequest) -> Result<(u32, u32), BackendError> {
        let (width, height) = match &request.window {
            Some(binding) => {
                let size = binding.window.inner_size();
                (size.width, size.height)
            }
            None => (request.width, request.height),
        };
        if width == 0 || height == 0 {
            return Err(BackendError::Window(format!(
                "cannot create a {width}x{height} window surface"
            )));
        }
        Ok((width, height))
    }

    /// Registers a window surface around an optional swapchain.
    fn add_window_target(
        &mut self,
        request: &WindowRequest,
        (width, height): (u32, u32),
        wgpu_surface: Option<wgpu::Surface<'static>>,
    ) -> Result<WindowSurface, BackendError> {
        let live = self.live()?;
        let backbuffer = GpuTexture::new(&live.gpu.device, width, height, 1, Sampling::default());
        let swapchain = match (&request.window, wgpu_surface) {
            (Some(binding), Some(surface)) => Some(Swapchain::new(
                &live.gpu,
                binding.window.clone(),
                surface,
                &self.config,
                live.present_mode,
            )?),
            _ => None,
        };
        let window_id = request
            .window
            .as_ref()
            .map_or_else(super::headless_window_id, WindowBinding::id);
        let surface = SurfaceHandle(self.handle());
        self.surfaces.insert(
            surface,
            Surface::Window(WindowTarget {
                window_id,
                backbuffer,
                swapchain,
                present_bind_group: None,
                fullscreen: false,
            }),
        );
        log::debug!("wgpu: window surface {surface:?} ({width}x{height}, window {window_id})");
        Ok(WindowSurface {
            surface,
            window_id,
            width,
            height,
        })
    }

    fn window_mut(&mut self, surface: SurfaceHandle) -> Result<&mut WindowTarget, BackendError> {
        match self.surfaces.get_mut(&surface) {
            Some(Surface::Window(w)) => Ok(w),
            Some(Surface::Texture(_)) => Err(BackendError::Window("not a window surface".into())),
            None => Err(BackendError::NotFound),
        }
    }

    /// The texture a surface renders into.
    fn target(&self, surface: SurfaceHandle) -> Result<&GpuTexture, BackendError> {
        match self.surfaces.get(&surface) {
            Some(Surface::Window(w)) => Ok(&w.backbuffer),
            Some(Surface::Texture(handle)) => self.textures.get(handle).ok_or(BackendError::NotFound),
            None => Err(BackendError::NotFound),
        }
    }

    fn texture(&self, texture: TextureHandle) -> Result<&GpuTexture, BackendError> {
        self.textures.get(&texture).ok_or(BackendError::NotFound)
    }
}

// ── draw helpers ──────────────────────────────────────────────────────────

/// Viewport clipped to the target plus the matrix remapping NDC from the
/// full viewport into the clipped one. wgpu rejects viewports that leave
/// the render target.
fn fit_viewport(vp: SurfaceViewport, width: u32, height: u32) -> Option<(SurfaceViewport, Mat4)> {
    if vp.w <= 0.0 || vp.h <= 0.0 {
        return None;
    }
    let x0 = vp.x.max(0.0);
    let y0 = vp.y.max(0.0);
    let x1 = (vp.x + vp.w).min(width as f32);
    let y1 = (vp.y + vp.h).min(height as f32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let c = SurfaceViewport {
        x: x0,
        y: y0,
        w: x1 - x0,
        h: y1 - y0,
    };
    let sx = vp.w / c.w;
    let sy = vp.h / c.h;
    let tx = (vp.w + 2.0 * (vp.x - c.x)) / c.w - 1.0;
    let ty = (vp.h + 2.0 * (vp.y - c.y)) / c.h - 1.0;
    let remap = Mat4::from_rows([
        [sx, 0.0, 0.0, tx],
        [0.0, sy, 0.0, ty],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
    Some((c, remap))
}

/// Converts GL clip space (y up from surface row 0, z in -1..1) to wgpu's
/// (y down from row 0, z in 0..1).
const GL_TO_WGPU: Mat4 = Mat4([
    1.0, 0.0, 0.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 0.5, 0.0, //
    0.0, 0.0, 0.5, 1.0,
]);

fn scissor_rect(scissor: Option<PixelRect>, target: &GpuTexture) -> PixelRect {
    target.clamp(scissor.unwrap_or(PixelRect::new(0, 0, target.width, target.height)))
}

/// Raw uniform words for a program's user block.
fn uniform_words(block: &UniformBlock, values: &[(u32, Vec<u32>)], mvp: Option<(u32, &Mat4)>) -> Vec<u32> {
    let mut words = vec![0u32; block.words()];
    let mut put = |loc: u32, data: &[u32]| {
        let start = loc as usize;
        if start < words.len() {
            let n = data.len().min(words.len() - start);
            words[start..start + n].copy_from_slice(&data[..n]);
        }
    };
    for (loc, data) in values {
        put(*loc, data);
    }
    if let Some((loc, m)) = mvp {
        let bits: Vec<u32> = m.as_array().iter().map(|v| v.to_bits()).collect();
        put(loc, &bits);
    }
    words
}

impl Backend for WgpuBackend {
    fn name(&self) -> &'static str {
        "wgpu"
    }

    fn features(&self) -> Features {
        if self.live.is_some() {
            Self::FEATURES
        } else {
            Features::empty()
        }
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    fn init(&mut self, request: &WindowRequest) -> Result<WindowSurface, BackendError> {
        let size = Self::request_size(request)?;
        let window = request.window.as_ref().map(|b| b.window.clone());
        let (gpu, surface) = pollster::block_on(GpuDevice::new(self.api, &self.config, window))
            .map_err(|e| BackendError::Device(format!("{e:#}")))?;
        log::info!("wgpu: renderer {:?} initialized on {:?}", self.id, self.api);
        let present_mode = self.present_mode(request.flags);
        self.live = Some(Live::new(gpu, present_mode));
        self.add_window_target(request, size, surface)
    }

    fn quit(&mut self) {
        self.surfaces.clear();
        self.textures.clear();
        self.programs.clear();
        self.shaders.clear();
        self.live = None;
    }

    fn add_window(&mut self, request: &WindowRequest) -> Result<WindowSurface, BackendError> {
        let size = Self::request_size(request)?;
        let surface = match &request.window {
            Some(binding) => Some(
                self.live()?
                    .gpu
                    .instance
                    .create_surface(binding.window.clone())
                    .map_err(|e| BackendError::Surface(e.to_string()))?,
            ),
            None => None,
        };
        self.add_window_target(request, size, surface)
    }

    fn set_window_resolution(&mut self, surface: SurfaceHandle, width: u32, height: u32) -> Result<(), BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::Window(format!("invalid resolution {width}x{height}")));
        }
        let Self { live, surfaces, .. } = self;
        let live = live
            .as_ref()
            .ok_or_else(|| BackendError::Device("backend is not initialized".into()))?;
        let window = match surfaces.get_mut(&surface) {
            Some(Surface::Window(w)) => w,
            Some(Surface::Texture(_)) => return Err(BackendError::Window("not a window surface".into())),
            None => return Err(BackendError::NotFound),
        };
        if let Some(swapchain) = &mut window.swapchain {
            let _ = swapchain.window.request_inner_size(PhysicalSize::new(width, height));
            swapchain.resize(&live.gpu.device, PhysicalSize::new(width, height));
        }
        if (window.backbuffer.width, window.backbuffer.height) != (width, height) {
            window.backbuffer = GpuTexture::new(&live.gpu.device, width, height, 1, Sampling::default());
            window.present_bind_group = None;
        }
        Ok(())
    }

    fn set_fullscreen(&mut self, surface: SurfaceHandle, enable: bool, _use_desktop_resolution: bool) -> Result<bool, BackendError> {
        let window = self.window_mut(surface)?;
        if let Some(swapchain) = &window.swapchain {
            swapchain
                .window
                .set_fullscreen(enable.then_some(Fullscreen::Borderless(None)));
        }
        window.fullscreen = enable;
        Ok(window.fullscreen)
    }

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle, BackendError> {
        let live = self.live()?;
        let max = live.gpu.max_texture_size();
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(BackendError::Device(format!(
                "cannot create a {}x{} texture (max {max})",
                desc.width, desc.height
            )));
        }
        let texture = GpuTexture::new(&live.gpu.device, desc.width, desc.height, 1, desc.sampling);
        let handle = TextureHandle(self.handle());
        self.textures.insert(handle, texture);
        Ok(handle)
    }

    fn update_texture(&mut self, texture: TextureHandle, region: PixelRect, rgba: &[u8]) -> Result<(), BackendError> {
        let live = self.live()?;
        self.texture(texture)?.write(&live.gpu.queue, 0, region, rgba)
    }

    fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>, BackendError> {
        let live = self.live()?;
        let t = self.texture(texture)?;
        read_texture_region(&live.gpu, &t.texture, (0, 0), (t.width, t.height))
    }

    fn set_texture_sampling(&mut self, texture: TextureHandle, sampling: Sampling) -> Result<(), BackendError> {
        let Self { live, textures, .. } = self;
        let live = live
            .as_ref()
            .ok_or_else(|| BackendError::Device("backend is not initialized".into()))?;
        let t = textures.get_mut(&texture).ok_or(BackendError::NotFound)?;
        t.set_sampling(&live.gpu.device, sampling);
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: TextureHandle) -> Result<(), BackendError> {
        let base = self.read_texture(texture)?;
        let live = self.live()?;
        let old = self.texture(texture)?;
        let chain = super::mip_chain(&base, old.width, old.height);
        let levels = 1 + chain.len() as u32;
        let mipped = GpuTexture::new(&live.gpu.device, old.width, old.height, levels, old.sampling);
        let full = PixelRect::new(0, 0, old.width, old.height);
        mipped.write(&live.gpu.queue, 0, full, &base)?;
        for (level, (pixels, w, h)) in chain.iter().enumerate() {
            mipped.write(&live.gpu.queue, level as u32 + 1, PixelRect::new(0, 0, *w, *h), pixels)?;
        }
        log::trace!("wgpu: {texture:?} now has {levels} mip levels");
        self.textures.insert(texture, mipped);
        Ok(())
    }

    fn free_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
    }

    // ── surfaces ──────────────────────────────────────────────────────────

    fn create_surface(&mut self, texture: TextureHandle) -> Result<SurfaceHandle, BackendError> {
        self.texture(texture)?;
        let surface = SurfaceHandle(self.handle());
        self.surfaces.insert(surface, Surface::Texture(texture));
        Ok(surface)
    }

    fn free_surface(&mut self, surface: SurfaceHandle) {
        self.surfaces.remove(&surface);
    }

    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)> {
        self.target(surface).ok().map(|t| (t.width, t.height))
    }

    // ── drawing ───────────────────────────────────────────────────────────

    fn clear(&mut self, surface: SurfaceHandle, color: [f32; 4], scissor: Option<PixelRect>) -> Result<(), BackendError> {
        let live = self.live()?;
        let target = self.target(surface)?;
        if let Some(rect) = scissor {
            return target.fill(&live.gpu.queue, target.clamp(rect), color_bytes(color));
        }
        let [r, g, b, a] = color.map(f64::from);
        let mut encoder = live
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("glint clear encoder"),
            });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("glint clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.target_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        live.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError> {
        if call.vertices.is_empty() {
            return Ok(());
        }
        let Self {
            live,
            textures,
            surfaces,
            programs,
            ..
        } = self;
        let live = live
            .as_mut()
            .ok_or_else(|| BackendError::Device("backend is not initialized".into()))?;

        let (target, target_handle) = match surfaces.get(&call.surface) {
            Some(Surface::Window(w)) => (&w.backbuffer, None),
            Some(Surface::Texture(h)) => (textures.get(h).ok_or(BackendError::NotFound)?, Some(*h)),
            None => return Err(BackendError::NotFound),
        };

        let Some((viewport, remap)) = fit_viewport(call.viewport, target.width, target.height) else {
            return Ok(());
        };
        let scissor = scissor_rect(call.scissor, target);
        if scissor.w == 0 || scissor.h == 0 {
            return Ok(());
        }
        let mvp = GL_TO_WGPU * remap * call.mvp;

        let device = &live.gpu.device;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("glint draw encoder"),
        });

        // A pass cannot sample its own attachment; draw from a copy.
        let snapshot;
        let source = match call.texture {
            Some(h) if Some(h) == target_handle => {
                snapshot = textures
                    .get(&h)
                    .ok_or(BackendError::NotFound)?
                    .snapshot(device, &mut encoder);
                &snapshot
            }
            Some(h) => textures.get(&h).ok_or(BackendError::NotFound)?,
            None => &live.white,
        };

        let linked = match call.program {
            Some(p) => Some(
                programs
                    .get(&p)
                    .and_then(|p| p.linked.as_ref())
                    .ok_or_else(|| BackendError::Shader("program is not linked".into()))?,
            ),
            None => None,
        };
        let stages = match linked {
            Some(l) => Stages {
                vertex: (&l.vertex.0, l.vertex.1.as_str()),
                fragment: (&l.fragment.0, l.fragment.1.as_str()),
                user_uniforms: l.uniforms.is_some(),
            },
            None => Stages {
                vertex: (&live.default_module, "vs_main"),
                fragment: (&live.default_module, "fs_main"),
                user_uniforms: false,
            },
        };

        // Generic attributes ride in their own buffers.
        let block = call.block;
        let taken = [block.position_loc, block.texcoord_loc, block.color_loc];
        let mut streams = Vec::new();
        let mut extra = Vec::new();
        for attr in call.attributes {
            if taken.contains(&Some(attr.location)) {
                continue;
            }
            let format = pipeline::attribute_format(attr.ty, attr.num_elems, attr.normalize)
                .ok_or(BackendError::Unsupported("vertex attribute format"))?;
            let (data, stride) = pipeline::padded_stream(&attr.data, attr.stride());
            extra.push((attr.location, format, stride));
            streams.push(data);
        }

        let key = PipelineKey {
            program: call.program,
            format: TEXTURE_FORMAT,
            blend: call.blend,
            block,
            extra,
        };
        if live.pipelines.get(&key).is_none() {
            let built = live
                .gpu
                .validated(|device| pipeline::build_pipeline(device, &live.layouts, &stages, &key))
                .map_err(BackendError::Shader)?;
            live.pipelines.insert(key.clone(), built);
            log::trace!("wgpu: built pipeline #{}", live.pipelines.len());
        }
        let Some(render_pipeline) = live.pipelines.get(&key) else {
            return Err(BackendError::Device("pipeline cache miss".into()));
        };

        let mvp_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glint mvp"),
            contents: bytemuck::bytes_of(&mvp),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let frame_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("glint frame bind group"),
            layout: &live.layouts.frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: mvp_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&source.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&source.sampler),
                },
            ],
        });
        let user_group = linked.and_then(|l| l.uniforms.as_ref()).map(|ub| {
            let words = uniform_words(ub, call.uniforms, block.modelviewprojection_loc.map(|loc| (loc, &mvp)));
            let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("glint user uniforms"),
                contents: bytemuck::cast_slice(&words),
                usage: wgpu::BufferUsages::UNIFORM,
            });
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("glint user bind group"),
                layout: &live.layouts.user,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                }],
            })
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("glint vertices"),
            contents: bytemuck::cast_slice(call.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = (!call.indices.is_empty()).then(|| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("glint indices"),
                contents: bytemuck::cast_slice(call.indices),
                usage: wgpu::BufferUsages::INDEX,
            })
        });
        let stream_buffers: Vec<wgpu::Buffer> = streams
            .iter()
            .map(|data| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("glint attribute stream"),
                    contents: data,
                    usage: wgpu::BufferUsages::VERTEX,
                })
            })
            .collect();

        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("glint draw pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            rpass.set_viewport(viewport.x, viewport.y, viewport.w, viewport.h, 0.0, 1.0);
            rpass.set_scissor_rect(scissor.x, scissor.y, scissor.w, scissor.h);
            rpass.set_pipeline(render_pipeline);
            rpass.set_bind_group(0, &frame_group, &[]);
            if let Some(group) = &user_group {
                rpass.set_bind_group(1, group, &[]);
            }
            rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
            for (slot, buffer) in stream_buffers.iter().enumerate() {
                rpass.set_vertex_buffer(slot as u32 + 1, buffer.slice(..));
            }
            match &index_buffer {
                Some(ib) => {
                    rpass.set_index_buffer(ib.slice(..), wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(0..call.indices.len() as u32, 0, 0..1);
                }
                None => rpass.draw(0..call.vertices.len() as u32, 0..1),
            }
        }

        live.gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn read_pixel(&mut self, surface: SurfaceHandle, x: u32, row: u32) -> Result<[u8; 4], BackendError> {
        let live = self.live()?;
        let target = self.target(surface)?;
        if x >= target.width || row >= target.height {
            return Err(BackendError::Surface(format!(
                "pixel ({x}, {row}) is outside the surface"
            )));
        }
        let px = read_texture_region(&live.gpu, &target.texture, (x, row), (1, 1))?;
        let mut out = [0; 4];
        out.copy_from_slice(&px[..4]);
        Ok(out)
    }

    fn read_surface(&mut self, surface: SurfaceHandle) -> Result<Vec<u8>, BackendError> {
        let live = self.live()?;
        let target = self.target(surface)?;
        read_texture_region(&live.gpu, &target.texture, (0, 0), (target.width, target.height))
    }

    fn present(&mut self, surface: SurfaceHandle) -> Result<(), BackendError> {
        let Self { live, surfaces, .. } = self;
        let live = live
            .as_mut()
            .ok_or_else(|| BackendError::Device("backend is not initialized".into()))?;
        let window = match surfaces.get_mut(&surface) {
            Some(Surface::Window(w)) => w,
            Some(Surface::Texture(_)) => return Err(BackendError::Window("not a window surface".into())),
            None => return Err(BackendError::NotFound),
        };
        let Some(swapchain) = window.swapchain.as_mut() else {
            // Headless: nothing to show.
            return Ok(());
        };
        let device = &live.gpu.device;
        let Some(frame) = swapchain.acquire(device)? else {
            log::trace!("wgpu: skipped a frame for window {}", window.window_id);
            return Ok(());
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = window
            .present_bind_group
            .get_or_insert_with(|| live.presenter.bind_group(device, &window.backbuffer));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("glint present encoder"),
        });
        live.presenter
            .draw(device, &mut encoder, &view, swapchain.config.format, bind_group);
        live.gpu.queue.submit(std::iter::once(encoder.finish()));
        swapchain.window.pre_present_notify();
        frame.present();
        Ok(())
    }

    // ── shaders ───────────────────────────────────────────────────────────

    fn shader_language(&self) -> (ShaderLanguage, u32) {
        (ShaderLanguage::Wgsl, 100)
    }

    fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Result<ShaderHandle, BackendError> {
        let reflection = reflect::reflect(source).map_err(BackendError::Shader)?;
        if reflection.entry(kind).is_none() {
            let stage = match kind {
                ShaderKind::Vertex => "@vertex",
                ShaderKind::Fragment => "@fragment",
            };
            return Err(BackendError::Shader(format!("no {stage} entry point")));
        }
        let module = self
            .live()?
            .gpu
            .validated(|device| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("glint user shader"),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                })
            })
            .map_err(BackendError::Shader)?;
        let handle = ShaderHandle(self.handle());
        self.shaders.insert(
            handle,
            Shader {
                kind,
                module,
                reflection,
            },
        );
        Ok(handle)
    }

    fn free_shader(&mut self, shader: ShaderHandle) {
        self.shaders.remove(&shader);
    }

    fn create_program(&mut self) -> Result<ProgramHandle, BackendError> {
        self.live()?;
        let handle = ProgramHandle(self.handle());
        self.programs.insert(handle, Program::default());
        Ok(handle)
    }

    fn attach_shader(&mut self, program: ProgramHandle, shader: ShaderHandle) -> Result<(), BackendError> {
        if !self.shaders.contains_key(&shader) {
            return Err(BackendError::NotFound);
        }
        let p = self.programs.get_mut(&program).ok_or(BackendError::NotFound)?;
        if !p.attached.contains(&shader) {
            p.attached.push(shader);
        }
        Ok(())
    }

    fn detach_shader(&mut self, program: ProgramHandle, shader: ShaderHandle) -> Result<(), BackendError> {
        let p = self.programs.get_mut(&program).ok_or(BackendError::NotFound)?;
        p.attached.retain(|s| *s != shader);
        Ok(())
    }

    fn link_program(&mut self, program: ProgramHandle) -> Result<(), BackendError> {
        let p = self.programs.get(&program).ok_or(BackendError::NotFound)?;
        let mut vertex = None;
        let mut fragment = None;
        for handle in &p.attached {
            let Some(shader) = self.shaders.get(handle) else { continue };
            let slot = match shader.kind {
                ShaderKind::Vertex => &mut vertex,
                ShaderKind::Fragment => &mut fragment,
            };
            if slot.is_some() {
                return Err(BackendError::Shader(format!(
                    "more than one {:?} shader attached",
                    shader.kind
                )));
            }
            *slot = Some(shader);
        }
        let vertex = vertex.ok_or_else(|| BackendError::Shader("no vertex shader attached".into()))?;
        let fragment =
            fragment.ok_or_else(|| BackendError::Shader("no fragment shader attached".into()))?;

        let uniforms = match (&vertex.reflection.uniforms, &fragment.reflection.uniforms) {
            (Some(a), Some(b)) if a.size != b.size || a.fields != b.fields => {
                return Err(BackendError::Shader(
                    "vertex and fragment stages disagree on the group 1 uniform block".into(),
                ));
            }
            (Some(a), _) => Some(a.clone()),
            (None, b) => b.clone(),
        };
        let linked = Linked {
            vertex: (
                vertex.module.clone(),
                vertex.reflection.vertex_entry.clone().unwrap_or_default(),
            ),
            fragment: (
                fragment.module.clone(),
                fragment.reflection.fragment_entry.clone().unwrap_or_default(),
            ),
            attributes: vertex.reflection.attributes.clone(),
            uniforms,
        };
        if let Some(p) = self.programs.get_mut(&program) {
            p.linked = Some(linked);
        }
        if let Some(live) = self.live.as_mut() {
            live.pipelines.evict_program(program);
        }
        Ok(())
    }

    fn free_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        if let Some(live) = self.live.as_mut() {
            live.pipelines.evict_program(program);
        }
    }

    fn attribute_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let linked = self.programs.get(&program)?.linked.as_ref()?;
        linked
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, loc)| *loc)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let linked = self.programs.get(&program)?.linked.as_ref()?;
        linked.uniforms.as_ref()?.location(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn backend() -> WgpuBackend {
        WgpuBackend::new(crate::renderer::VULKAN, WgpuApi::Vulkan, WgpuConfig::default())
    }

    #[test]
    fn no_features_before_init() {
        let b = backend();
        assert_eq!(b.features(), Features::empty());
        assert!(WgpuBackend::FEATURES.contains(Features::BASIC_SHADERS | Features::READBACK));
    }

    #[test]
    fn uninitialized_calls_fail_cleanly() {
        let mut b = backend();
        let desc = TextureDesc {
            width: 4,
            height: 4,
            sampling: Sampling::default(),
        };
        assert!(matches!(b.create_texture(&desc), Err(BackendError::Device(_))));
        assert!(matches!(b.read_surface(SurfaceHandle(1)), Err(BackendError::Device(_))));
    }

    #[test]
    fn gl_kinds_share_the_gl_backend() {
        assert_eq!(WgpuApi::Gles.backends(), wgpu::Backends::GL);
        assert_eq!(WgpuApi::Gl.backends(), wgpu::Backends::GL);
        assert_eq!(WgpuApi::Metal.backends(), wgpu::Backends::METAL);
    }

    #[test]
    fn inside_viewport_needs_no_remap() {
        let vp = SurfaceViewport {
            x: 2.0,
            y: 3.0,
            w: 10.0,
            h: 5.0,
        };
        let (fitted, remap) = fit_viewport(vp, 20, 20).unwrap();
        assert_eq!(fitted, vp);
        assert_eq!(remap, Mat4::IDENTITY);
    }

    #[test]
    fn overhanging_viewport_is_clipped_and_remapped() {
        // Viewport twice as wide as the surface, starting at 0.
        let vp = SurfaceViewport {
            x: 0.0,
            y: 0.0,
            w: 20.0,
            h: 10.0,
        };
        let (fitted, remap) = fit_viewport(vp, 10, 10).unwrap();
        assert_relative_eq!(fitted.w, 10.0);
        // NDC 0 was surface x = 10, which is the right edge of the fitted viewport.
        let p = remap.transform_point([0.0, 0.0, 0.0]);
        assert_relative_eq!(p[0], 1.0);
        let p = remap.transform_point([-1.0, 0.0, 0.0]);
        assert_relative_eq!(p[0], -1.0);
    }

    #[test]
    fn viewport_outside_the_surface_is_skipped() {
        let vp = SurfaceViewport {
            x: 30.0,
            y: 0.0,
            w: 5.0,
            h: 5.0,
        };
        assert!(fit_viewport(vp, 10, 10).is_none());
    }

    #[test]
    fn gl_clip_space_maps_to_wgpu() {
        let p = GL_TO_WGPU.transform_point([0.5, -1.0, -1.0]);
        assert_relative_eq!(p[0], 0.5);
        assert_relative_eq!(p[1], 1.0);
        assert_relative_eq!(p[2], 0.0);
        let p = GL_TO_WGPU.transform_point([0.0, 0.0, 1.0]);
        assert_relative_eq!(p[2], 1.0);
    }

    #[test]
    fn uniform_words_are_placed_by_location() {
        let block = UniformBlock {
            var_name: "u".into(),
            size: 32,
            fields: vec![("a".into(), 0), ("b".into(), 16)],
        };
        let words = uniform_words(&block, &[(4, vec![7, 8]), (7, vec![1, 2, 3])], None);
        assert_eq!(words.len(), 8);
        assert_eq!(&words[4..8], &[7, 8, 0, 1]);
    }
}
