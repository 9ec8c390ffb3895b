use crate::error::BackendError;
use crate::image::Sampling;
use crate::renderer::PixelRect;

use super::pipeline::sampler_descriptor;

/// Every texture and backbuffer is stored as plain RGBA8.
pub(crate) const TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A texture with its views and sampler.
pub(crate) struct GpuTexture {
    pub texture: wgpu::Texture,
    /// All mip levels, for sampling.
    pub view: wgpu::TextureView,
    /// Level 0 only, for rendering.
    pub target_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub sampling: Sampling,
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
}

pub(crate) fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

impl GpuTexture {
    pub fn new(device: &wgpu::Device, width: u32, height: u32, mip_levels: u32, sampling: Sampling) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("glint texture"),
            size: extent(width, height),
            mip_level_count: mip_levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let target_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("glint render target view"),
            base_mip_level: 0,
            mip_level_count: Some(1),
            ..Default::default()
        });
        let sampler = device.create_sampler(&sampler_descriptor(sampling));
        Self {
            texture,
            view,
            target_view,
            sampler,
            sampling,
            width,
            height,
            mip_levels,
        }
    }

    pub fn set_sampling(&mut self, device: &wgpu::Device, sampling: Sampling) {
        if self.sampling != sampling {
            self.sampler = device.create_sampler(&sampler_descriptor(sampling));
            self.sampling = sampling;
        }
    }

    /// Writes tightly packed rows into `region` of `mip`.
    pub fn write(&self, queue: &wgpu::Queue, mip: u32, region: PixelRect, rgba: &[u8]) -> Result<(), BackendError> {
        if mip >= self.mip_levels {
            return Err(BackendError::Surface(format!("mip level {mip} does not exist")));
        }
        let (w, h) = self.mip_size(mip);
        if region.x + region.w > w || region.y + region.h > h {
            return Err(BackendError::Surface(format!(
                "update region {region:?} exceeds {w}x{h}"
            )));
        }
        if region.w == 0 || region.h == 0 {
            return Ok(());
        }
        let row = region.w * 4;
        let len = row as usize * region.h as usize;
        if rgba.len() < len {
            return Err(BackendError::Surface("update data is too short".into()));
        }
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: mip,
                origin: wgpu::Origin3d {
                    x: region.x,
                    y: region.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &rgba[..len],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(row),
                rows_per_image: Some(region.h),
            },
            extent(region.w, region.h),
        );
        Ok(())
    }

    /// Fills `region` of level 0 with one color.
    pub fn fill(&self, queue: &wgpu::Queue, region: PixelRect, px: [u8; 4]) -> Result<(), BackendError> {
        let data = px.repeat(region.w as usize * region.h as usize);
        self.write(queue, 0, region, &data)
    }

    pub fn mip_size(&self, mip: u32) -> (u32, u32) {
        ((self.width >> mip).max(1), (self.height >> mip).max(1))
    }

    /// `rect` clamped to level 0.
    pub fn clamp(&self, rect: PixelRect) -> PixelRect {
        let x0 = rect.x.min(self.width);
        let y0 = rect.y.min(self.height);
        let x1 = rect.x.saturating_add(rect.w).min(self.width);
        let y1 = rect.y.saturating_add(rect.h).min(self.height);
        PixelRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// A same-sized copy of level 0.
    pub fn snapshot(&self, device: &wgpu::Device, encoder: &mut wgpu::CommandEncoder) -> GpuTexture {
        let copy = GpuTexture::new(device, self.width, self.height, 1, self.sampling);
        encoder.copy_texture_to_texture(
            self.texture.as_image_copy(),
            copy.texture.as_image_copy(),
            extent(self.width, self.height),
        );
        copy
    }
}

pub(crate) fn color_bytes(c: [f32; 4]) -> [u8; 4] {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_bytes_round_and_clamp() {
        assert_eq!(color_bytes([1.0, 0.5, -1.0, 2.0]), [255, 128, 0, 255]);
    }
}
