//! CPU reference backend.
//!
//! Everything lives in RGBA8 canvases in memory: window surfaces are
//! offscreen canvases (their contents never reach an OS window), textures
//! keep an optional mip chain. No shader support.

mod canvas;
mod raster;

use std::collections::HashMap;

use winit::dpi::PhysicalSize;
use winit::window::Fullscreen;

use crate::error::BackendError;
use crate::image::Sampling;
use crate::renderer::{
    Backend, DrawCall, Features, PixelRect, SurfaceHandle, TextureDesc, TextureHandle,
    WindowBinding, WindowRequest, WindowSurface,
};

pub use canvas::{Canvas, Texture};

struct WindowCanvas {
    window_id: u64,
    canvas: Canvas,
    binding: Option<WindowBinding>,
    fullscreen: bool,
    presented: u64,
}

enum Surface {
    Window(WindowCanvas),
    Texture(TextureHandle),
}

#[derive(Default)]
pub struct SoftwareBackend {
    textures: HashMap<TextureHandle, Texture>,
    surfaces: HashMap<SurfaceHandle, Surface>,
    next_handle: u64,
}

impl SoftwareBackend {
    pub const FEATURES: Features = Features::NON_POWER_OF_TWO
        .union(Features::RENDER_TARGETS)
        .union(Features::ALL_BLEND_PRESETS)
        .union(Features::WRAP_REPEAT_MIRRORED)
        .union(Features::MIPMAPS)
        .union(Features::READBACK)
        .union(Features::MULTIPLE_WINDOWS);

    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// Number of times a window surface has been presented.
    pub fn presented_frames(&self, surface: SurfaceHandle) -> Option<u64> {
        match self.surfaces.get(&surface)? {
            Surface::Window(w) => Some(w.presented),
            Surface::Texture(_) => None,
        }
    }

    fn create_window(&mut self, request: &WindowRequest) -> Result<WindowSurface, BackendError> {
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
        let window_id = request
            .window
            .as_ref()
            .map_or_else(super::headless_window_id, WindowBinding::id);
        let surface = SurfaceHandle(self.handle());
        self.surfaces.insert(
            surface,
            Surface::Window(WindowCanvas {
                window_id,
                canvas: Canvas::new(width, height),
                binding: request.window.clone(),
                fullscreen: false,
                presented: 0,
            }),
        );
        log::debug!("software: window surface {surface:?} ({width}x{height}, window {window_id})");
        Ok(WindowSurface {
            surface,
            window_id,
            width,
            height,
        })
    }

    fn window_mut(&mut self, surface: SurfaceHandle) -> Result<&mut WindowCanvas, BackendError> {
        match self.surfaces.get_mut(&surface) {
            Some(Surface::Window(w)) => Ok(w),
            Some(Surface::Texture(_)) => Err(BackendError::Window("not a window surface".into())),
            None => Err(BackendError::NotFound),
        }
    }

    fn texture_mut(&mut self, texture: TextureHandle) -> Result<&mut Texture, BackendError> {
        self.textures.get_mut(&texture).ok_or(BackendError::NotFound)
    }

    /// Runs `f` on the canvas behind `surface` with the texture table
    /// available for sampling. A texture surface is taken out of the table
    /// for the duration, so `f` never sees it there.
    fn with_canvas<R>(
        &mut self,
        surface: SurfaceHandle,
        f: impl FnOnce(&mut Canvas, &HashMap<TextureHandle, Texture>) -> R,
    ) -> Result<R, BackendError> {
        match self.surfaces.get_mut(&surface) {
            Some(Surface::Window(w)) => Ok(f(&mut w.canvas, &self.textures)),
            Some(Surface::Texture(handle)) => {
                let handle = *handle;
                let mut texture = self.textures.remove(&handle).ok_or(BackendError::NotFound)?;
                let out = f(texture.base_mut(), &self.textures);
                self.textures.insert(handle, texture);
                Ok(out)
            }
            None => Err(BackendError::NotFound),
        }
    }

    fn canvas(&self, surface: SurfaceHandle) -> Result<&Canvas, BackendError> {
        match self.surfaces.get(&surface) {
            Some(Surface::Window(w)) => Ok(&w.canvas),
            Some(Surface::Texture(handle)) => self
                .textures
                .get(handle)
                .map(Texture::base)
                .ok_or(BackendError::NotFound),
            None => Err(BackendError::NotFound),
        }
    }
}

impl Backend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn features(&self) -> Features {
        Self::FEATURES
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    fn init(&mut self, request: &WindowRequest) -> Result<WindowSurface, BackendError> {
        if request.window.is_some() {
            log::info!("software: rendering offscreen; the window itself is not updated");
        }
        self.create_window(request)
    }

    fn quit(&mut self) {
        self.surfaces.clear();
        self.textures.clear();
    }

    fn add_window(&mut self, request: &WindowRequest) -> Result<WindowSurface, BackendError> {
        self.create_window(request)
    }

    fn set_window_resolution(&mut self, surface: SurfaceHandle, width: u32, height: u32) -> Result<(), BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::Window(format!("invalid resolution {width}x{height}")));
        }
        let window = self.window_mut(surface)?;
        if let Some(binding) = &window.binding {
            let _ = binding.window.request_inner_size(PhysicalSize::new(width, height));
        }
        if (window.canvas.width, window.canvas.height) != (width, height) {
            window.canvas = Canvas::new(width, height);
        }
        Ok(())
    }

    fn set_fullscreen(&mut self, surface: SurfaceHandle, enable: bool, _use_desktop_resolution: bool) -> Result<bool, BackendError> {
        let window = self.window_mut(surface)?;
        if let Some(binding) = &window.binding {
            binding
                .window
                .set_fullscreen(enable.then_some(Fullscreen::Borderless(None)));
        }
        window.fullscreen = enable;
        Ok(window.fullscreen)
    }

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle, BackendError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::Device(format!(
                "cannot create a {}x{} texture",
                desc.width, desc.height
            )));
        }
        let handle = TextureHandle(self.handle());
        self.textures
            .insert(handle, Texture::new(desc.width, desc.height, desc.sampling));
        Ok(handle)
    }

    fn update_texture(&mut self, texture: TextureHandle, region: PixelRect, rgba: &[u8]) -> Result<(), BackendError> {
        self.texture_mut(texture)?.base_mut().write_region(region, rgba)
    }

    fn read_texture(&mut self, texture: TextureHandle) -> Result<Vec<u8>, BackendError> {
        Ok(self.texture_mut(texture)?.base().pixels.clone())
    }

    fn set_texture_sampling(&mut self, texture: TextureHandle, sampling: Sampling) -> Result<(), BackendError> {
        self.texture_mut(texture)?.sampling = sampling;
        Ok(())
    }

    fn generate_mipmaps(&mut self, texture: TextureHandle) -> Result<(), BackendError> {
        let t = self.texture_mut(texture)?;
        let base = t.base();
        let chain = super::mip_chain(&base.pixels, base.width, base.height);
        t.levels.truncate(1);
        t.levels.extend(chain.into_iter().map(|(pixels, width, height)| Canvas {
            width,
            height,
            pixels,
        }));
        Ok(())
    }

    fn free_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
    }

    // ── surfaces ──────────────────────────────────────────────────────────

    fn create_surface(&mut self, texture: TextureHandle) -> Result<SurfaceHandle, BackendError> {
        if !self.textures.contains_key(&texture) {
            return Err(BackendError::NotFound);
        }
        let surface = SurfaceHandle(self.handle());
        self.surfaces.insert(surface, Surface::Texture(texture));
        Ok(surface)
    }

    fn free_surface(&mut self, surface: SurfaceHandle) {
        self.surfaces.remove(&surface);
    }

    fn surface_size(&self, surface: SurfaceHandle) -> Option<(u32, u32)> {
        self.canvas(surface).ok().map(|c| (c.width, c.height))
    }

    // ── drawing ───────────────────────────────────────────────────────────

    fn clear(&mut self, surface: SurfaceHandle, color: [f32; 4], scissor: Option<PixelRect>) -> Result<(), BackendError> {
        let px = raster::to_u8(color);
        self.with_canvas(surface, |canvas, _| canvas.fill(scissor, px))
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), BackendError> {
        // Sampling the surface being drawn needs a snapshot.
        let snapshot = match (self.surfaces.get(&call.surface), call.texture) {
            (Some(Surface::Texture(dst)), Some(src)) if *dst == src => self.textures.get(&src).cloned(),
            _ => None,
        };
        self.with_canvas(call.surface, |canvas, textures| {
            let texture = match call.texture {
                Some(handle) => match snapshot.as_ref().or_else(|| textures.get(&handle)) {
                    Some(t) => Some(t),
                    None => return Err(BackendError::NotFound),
                },
                None => None,
            };
            raster::draw(canvas, call, texture);
            Ok(())
        })?
    }

    fn read_pixel(&mut self, surface: SurfaceHandle, x: u32, row: u32) -> Result<[u8; 4], BackendError> {
        self.canvas(surface)?
            .get(x, row)
            .ok_or_else(|| BackendError::Surface(format!("pixel ({x}, {row}) is outside the surface")))
    }

    fn read_surface(&mut self, surface: SurfaceHandle) -> Result<Vec<u8>, BackendError> {
        Ok(self.canvas(surface)?.pixels.clone())
    }

    fn present(&mut self, surface: SurfaceHandle) -> Result<(), BackendError> {
        let window = self.window_mut(surface)?;
        window.presented += 1;
        log::trace!(
            "software: present {surface:?} to window {} (frame {})",
            window.window_id,
            window.presented
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::InitFlags;

    fn headless(w: u32, h: u32) -> WindowRequest {
        WindowRequest {
            width: w,
            height: h,
            flags: InitFlags::empty(),
            window: None,
        }
    }

    #[test]
    fn headless_windows_get_distinct_ids() {
        let mut b = SoftwareBackend::new();
        let a = b.init(&headless(4, 4)).unwrap();
        let c = b.add_window(&headless(2, 2)).unwrap();
        assert_ne!(a.window_id, c.window_id);
        assert_eq!(b.surface_size(c.surface), Some((2, 2)));
    }

    #[test]
    fn zero_sized_window_is_rejected() {
        let mut b = SoftwareBackend::new();
        assert!(matches!(b.init(&headless(0, 4)), Err(BackendError::Window(_))));
    }

    #[test]
    fn scissored_clear() {
        let mut b = SoftwareBackend::new();
        let s = b.init(&headless(4, 4)).unwrap().surface;
        b.clear(s, [1.0, 0.0, 0.0, 1.0], None).unwrap();
        b.clear(s, [0.0, 0.0, 1.0, 1.0], Some(PixelRect::new(0, 0, 1, 1))).unwrap();
        assert_eq!(b.read_pixel(s, 0, 0).unwrap(), [0, 0, 255, 255]);
        assert_eq!(b.read_pixel(s, 1, 0).unwrap(), [255, 0, 0, 255]);
        assert!(b.read_pixel(s, 4, 0).is_err());
    }

    #[test]
    fn texture_surfaces_write_through() {
        let mut b = SoftwareBackend::new();
        let t = b
            .create_texture(&TextureDesc {
                width: 2,
                height: 2,
                sampling: Sampling::default(),
            })
            .unwrap();
        let s = b.create_surface(t).unwrap();
        b.clear(s, [0.0, 1.0, 0.0, 1.0], None).unwrap();
        assert_eq!(&b.read_texture(t).unwrap()[..4], &[0, 255, 0, 255]);
    }

    #[test]
    fn mipmaps_reach_one_texel() {
        let mut b = SoftwareBackend::new();
        let t = b
            .create_texture(&TextureDesc {
                width: 4,
                height: 2,
                sampling: Sampling::default(),
            })
            .unwrap();
        b.generate_mipmaps(t).unwrap();
        let levels = &b.textures[&t].levels;
        assert_eq!(levels.len(), 3);
        assert_eq!((levels[2].width, levels[2].height), (1, 1));
    }

    #[test]
    fn present_counts_frames() {
        let mut b = SoftwareBackend::new();
        let s = b.init(&headless(1, 1)).unwrap().surface;
        b.present(s).unwrap();
        b.present(s).unwrap();
        assert_eq!(b.presented_frames(s), Some(2));
    }
}
