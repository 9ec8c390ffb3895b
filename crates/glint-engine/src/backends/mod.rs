//! Built-in backends.
//!
//! - [`software`]: CPU rasterizer, always available, headless.
//! - [`gpu`]: one wgpu backend serving the Vulkan, Metal, Direct3D 12,
//!   OpenGL and OpenGL ES renderer kinds through the matching wgpu API.
//!
//! Direct3D 11 is registered as a stub whose factory always fails, so it
//! shows up in the registry and falls through during `init`.

pub mod gpu;
pub mod software;

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::BackendError;
use crate::renderer::registry::CreateFn;
use crate::renderer::{
    Backend, DIRECT3D11, DIRECT3D12, GLES, METAL, OPENGL, RendererId, RendererKind, SOFTWARE,
    VULKAN,
};
use crate::session::Session;

use self::gpu::{WgpuApi, WgpuBackend, WgpuConfig};
use self::software::SoftwareBackend;

/// Headless window ids start far above anything winit hands out.
static NEXT_HEADLESS_WINDOW: AtomicU64 = AtomicU64::new(1 << 48);

/// Fresh id for a window surface with no OS window behind it.
pub(crate) fn headless_window_id() -> u64 {
    NEXT_HEADLESS_WINDOW.fetch_add(1, Ordering::Relaxed)
}

fn software_factory() -> CreateFn {
    Box::new(|_: RendererId| -> Result<Box<dyn Backend>, BackendError> {
        Ok(Box::new(SoftwareBackend::new()))
    })
}

fn wgpu_factory(api: WgpuApi) -> CreateFn {
    Box::new(move |id: RendererId| -> Result<Box<dyn Backend>, BackendError> {
        Ok(Box::new(WgpuBackend::new(id, api, WgpuConfig::default())))
    })
}

fn direct3d11_stub() -> CreateFn {
    Box::new(|_: RendererId| -> Result<Box<dyn Backend>, BackendError> {
        Err(BackendError::Unsupported("Direct3D 11 renderer"))
    })
}

/// Registers every backend this crate ships.
pub fn register_builtin(session: &mut Session) {
    session.register_renderer(SOFTWARE, software_factory(), None);
    for (id, api) in [
        (VULKAN, WgpuApi::Vulkan),
        (METAL, WgpuApi::Metal),
        (DIRECT3D12, WgpuApi::Dx12),
        (OPENGL, WgpuApi::Gl),
        (GLES, WgpuApi::Gles),
    ] {
        session.register_renderer(id, wgpu_factory(api), None);
    }
    session.register_renderer(DIRECT3D11, direct3d11_stub(), None);
}

/// wgpu API that serves `kind`, if any.
pub fn wgpu_api_for(kind: RendererKind) -> Option<WgpuApi> {
    match kind {
        RendererKind::Vulkan => Some(WgpuApi::Vulkan),
        RendererKind::Metal => Some(WgpuApi::Metal),
        RendererKind::Direct3D12 => Some(WgpuApi::Dx12),
        RendererKind::OpenGl => Some(WgpuApi::Gl),
        RendererKind::Gles => Some(WgpuApi::Gles),
        _ => None,
    }
}

// ── mip chains ────────────────────────────────────────────────────────────

/// Halves an RGBA8 level with a 2×2 box filter. Odd edges repeat the last
/// texel.
pub(crate) fn downsample(rgba: &[u8], w: u32, h: u32) -> (Vec<u8>, u32, u32) {
    let nw = (w / 2).max(1);
    let nh = (h / 2).max(1);
    let texel = |x: u32, y: u32, c: usize| -> u32 {
        let x = x.min(w.saturating_sub(1));
        let y = y.min(h.saturating_sub(1));
        u32::from(rgba[((y * w + x) * 4) as usize + c])
    };
    let mut out = Vec::with_capacity((nw * nh * 4) as usize);
    for y in 0..nh {
        for x in 0..nw {
            for c in 0..4 {
                let sum = texel(2 * x, 2 * y, c)
                    + texel(2 * x + 1, 2 * y, c)
                    + texel(2 * x, 2 * y + 1, c)
                    + texel(2 * x + 1, 2 * y + 1, c);
                out.push(((sum + 2) / 4) as u8);
            }
        }
    }
    (out, nw, nh)
}

/// Every level below `base`, down to 1×1.
pub(crate) fn mip_chain(base: &[u8], w: u32, h: u32) -> Vec<(Vec<u8>, u32, u32)> {
    let mut levels = Vec::new();
    let (mut w, mut h) = (w, h);
    let mut current = base.to_vec();
    while w > 1 || h > 1 {
        let (next, nw, nh) = downsample(&current, w, h);
        levels.push((next.clone(), nw, nh));
        current = next;
        w = nw;
        h = nh;
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsample_averages_quads() {
        let px = [
            0, 0, 0, 255, 100, 100, 100, 255, //
            200, 200, 200, 255, 100, 100, 100, 255,
        ];
        let (out, w, h) = downsample(&px, 2, 2);
        assert_eq!((w, h), (1, 1));
        assert_eq!(out, vec![100, 100, 100, 255]);
    }

    #[test]
    fn mip_chain_ends_at_one_texel() {
        let base = vec![255u8; 8 * 2 * 4];
        let levels = mip_chain(&base, 8, 2);
        let sizes: Vec<_> = levels.iter().map(|(_, w, h)| (*w, *h)).collect();
        assert_eq!(sizes, vec![(4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn headless_ids_are_unique() {
        assert_ne!(headless_window_id(), headless_window_id());
    }

    #[test]
    fn d3d11_has_no_wgpu_api() {
        assert_eq!(wgpu_api_for(RendererKind::Direct3D11), None);
        assert_eq!(wgpu_api_for(RendererKind::Gles), Some(WgpuApi::Gles));
    }
}
