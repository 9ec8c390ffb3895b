use std::sync::Arc;
use std::sync::mpsc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::error::BackendError;

use super::WgpuApi;

/// Initialization parameters for the wgpu backend.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or backend requirement exists.
#[derive(Debug, Clone)]
pub struct WgpuConfig {
    /// Prefer an sRGB swapchain format when available.
    ///
    /// Off by default: pixel values are written as given, like a GL
    /// framebuffer without `GL_FRAMEBUFFER_SRGB`.
    pub prefer_srgb: bool,

    /// Present mode used unless vsync flags say otherwise.
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    pub power_preference: wgpu::PowerPreference,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for WgpuConfig {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            power_preference: wgpu::PowerPreference::HighPerformance,
            required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Instance, adapter, device and queue.
pub(crate) struct GpuDevice {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuDevice {
    /// Creates the device, plus the surface for `window` when given so the
    /// adapter is picked to be compatible with it.
    pub async fn new(
        api: WgpuApi,
        config: &WgpuConfig,
        window: Option<Arc<Window>>,
    ) -> Result<(Self, Option<wgpu::Surface<'static>>)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: api.backends(),
            ..Default::default()
        });

        let surface = match window {
            Some(window) => Some(
                instance
                    .create_surface(window)
                    .context("failed to create wgpu surface")?,
            ),
            None => None,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: surface.as_ref(),
                force_fallback_adapter: false,
            })
            .await
            .with_context(|| format!("no {api:?} adapter available"))?;

        let info = adapter.get_info();
        log::info!("wgpu: using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("glint device"),
                required_features: wgpu::Features::empty(),
                required_limits: config.required_limits.clone().using_resolution(adapter.limits()),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        Ok((
            Self {
                instance,
                adapter,
                device,
                queue,
            },
            surface,
        ))
    }

    /// Runs `f` inside a validation error scope.
    pub fn validated<T>(&self, f: impl FnOnce(&wgpu::Device) -> T) -> Result<T, String> {
        let scope = self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let out = f(&self.device);
        match pollster::block_on(scope.pop()) {
            Some(err) => Err(err.to_string()),
            None => Ok(out),
        }
    }

    pub fn max_texture_size(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }
}

// ── swapchain ─────────────────────────────────────────────────────────────

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    let preferred = if prefer_srgb {
        [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]
    } else {
        [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Rgba8Unorm,
        ]
    };
    for f in preferred {
        if caps.formats.contains(&f) {
            return Some(f);
        }
    }

    Some(caps.formats[0])
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// A window's swapchain.
pub(crate) struct Swapchain {
    pub window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub config: wgpu::SurfaceConfiguration,
}

impl Swapchain {
    pub fn new(
        gpu: &GpuDevice,
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
        config: &WgpuConfig,
        present_mode: wgpu::PresentMode,
    ) -> Result<Self, BackendError> {
        let size = window.inner_size();
        let caps = surface.get_capabilities(&gpu.adapter);
        let format = choose_surface_format(&caps, config.prefer_srgb)
            .ok_or_else(|| BackendError::Surface("no supported surface formats".into()))?;
        let auto = matches!(
            present_mode,
            wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync
        );
        let present_mode = if auto || caps.present_modes.contains(&present_mode) {
            present_mode
        } else {
            wgpu::PresentMode::Fifo
        };
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: choose_alpha_mode(&caps, config.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: config.desired_maximum_frame_latency,
        };
        surface.configure(&gpu.device, &surface_config);
        log::debug!(
            "wgpu: swapchain {}x{} {:?} {:?}",
            surface_config.width,
            surface_config.height,
            format,
            present_mode
        );
        Ok(Self {
            window,
            surface,
            config: surface_config,
        })
    }

    /// Reconfigures after a resize.
    ///
    /// wgpu does not support configuring a surface with a 0x0 size; in that
    /// case configuration is deferred.
    pub fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(device, &self.config);
    }

    /// Acquires the next frame; `Ok(None)` means skip this one.
    pub fn acquire(&mut self, device: &wgpu::Device) -> Result<Option<wgpu::SurfaceTexture>, BackendError> {
        match self.surface.get_current_texture() {
            Ok(frame) => Ok(Some(frame)),
            Err(err) => match map_surface_error(err) {
                SurfaceErrorAction::Reconfigure => {
                    let size = self.window.inner_size();
                    self.resize(device, size);
                    Ok(None)
                }
                SurfaceErrorAction::SkipFrame => Ok(None),
                SurfaceErrorAction::Fatal => {
                    Err(BackendError::Surface("out of memory acquiring a frame".into()))
                }
            },
        }
    }
}

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum SurfaceErrorAction {
    /// Reconfigure; rendering may resume next frame.
    Reconfigure,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM).
    Fatal,
}

pub(crate) fn map_surface_error(err: wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigure,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

// ── readback ──────────────────────────────────────────────────────────────

/// Bytes per row of a copy, padded to wgpu's copy alignment.
pub(crate) fn padded_bytes_per_row(width: u32) -> u32 {
    (width * 4).next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
}

/// Drops the per-row padding of a mapped copy.
pub(crate) fn unpad_rows(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let row = (width * 4) as usize;
    let padded = padded_bytes_per_row(width) as usize;
    let mut out = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        out.extend_from_slice(&data[y * padded..y * padded + row]);
    }
    out
}

/// Copies `size` texels at `origin` of mip 0 back to the CPU.
pub(crate) fn read_texture_region(
    gpu: &GpuDevice,
    texture: &wgpu::Texture,
    origin: (u32, u32),
    size: (u32, u32),
) -> Result<Vec<u8>, BackendError> {
    let (width, height) = size;
    let bytes_per_row = padded_bytes_per_row(width);
    let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("glint readback"),
        size: u64::from(bytes_per_row) * u64::from(height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("glint readback encoder"),
        });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: origin.0,
                y: origin.1,
                z: 0,
            },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |res| {
        let _ = tx.send(res);
    });
    gpu.device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|e| BackendError::Device(format!("poll failed: {e}")))?;
    rx.recv()
        .map_err(|_| BackendError::Device("readback was never mapped".into()))?
        .map_err(|e| BackendError::Device(format!("readback map failed: {e}")))?;

    let pixels = unpad_rows(&slice.get_mapped_range(), width, height);
    staging.unmap();
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_pad_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(65), 512);
    }

    #[test]
    fn unpadding_keeps_leading_texels() {
        let mut data = vec![0u8; 512];
        data[..4].copy_from_slice(&[1, 2, 3, 4]);
        data[256..260].copy_from_slice(&[5, 6, 7, 8]);
        assert_eq!(unpad_rows(&data, 1, 2), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn surface_errors_map_to_actions() {
        assert_eq!(map_surface_error(wgpu::SurfaceError::Lost), SurfaceErrorAction::Reconfigure);
        assert_eq!(map_surface_error(wgpu::SurfaceError::Timeout), SurfaceErrorAction::SkipFrame);
        assert_eq!(map_surface_error(wgpu::SurfaceError::OutOfMemory), SurfaceErrorAction::Fatal);
    }
}
