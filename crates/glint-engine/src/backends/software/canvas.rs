use crate::error::BackendError;
use crate::image::{FilterMode, Sampling, WrapMode};
use crate::renderer::PixelRect;

/// Tightly packed RGBA8 pixels, row 0 first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if !self.contains(x, y) {
            return None;
        }
        let i = self.index(x, y);
        let mut px = [0; 4];
        px.copy_from_slice(&self.pixels[i..i + 4]);
        Some(px)
    }

    #[inline]
    pub fn put(&mut self, x: u32, y: u32, px: [u8; 4]) {
        if self.contains(x, y) {
            let i = self.index(x, y);
            self.pixels[i..i + 4].copy_from_slice(&px);
        }
    }

    /// `rect` clamped to the canvas.
    pub fn clamp_rect(&self, rect: PixelRect) -> PixelRect {
        let x0 = rect.x.min(self.width);
        let y0 = rect.y.min(self.height);
        let x1 = rect.x.saturating_add(rect.w).min(self.width);
        let y1 = rect.y.saturating_add(rect.h).min(self.height);
        PixelRect::new(x0, y0, x1 - x0, y1 - y0)
    }

    pub fn fill(&mut self, rect: Option<PixelRect>, px: [u8; 4]) {
        let full = PixelRect::new(0, 0, self.width, self.height);
        let r = self.clamp_rect(rect.unwrap_or(full));
        for y in r.y..r.y + r.h {
            for x in r.x..r.x + r.w {
                self.put(x, y, px);
            }
        }
    }

    /// Copies tightly packed rows into `region`.
    pub fn write_region(&mut self, region: PixelRect, rgba: &[u8]) -> Result<(), BackendError> {
        if region.x + region.w > self.width || region.y + region.h > self.height {
            return Err(BackendError::Surface(format!(
                "update region {region:?} exceeds {}x{}",
                self.width, self.height
            )));
        }
        let row = region.w as usize * 4;
        if row == 0 || region.h == 0 {
            return Ok(());
        }
        if rgba.len() < row * region.h as usize {
            return Err(BackendError::Surface("update data is too short".into()));
        }
        for (dy, src) in rgba.chunks_exact(row).take(region.h as usize).enumerate() {
            let i = self.index(region.x, region.y + dy as u32);
            self.pixels[i..i + row].copy_from_slice(src);
        }
        Ok(())
    }

    #[inline]
    fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let i = self.index(x, y);
        let p = &self.pixels[i..i + 4];
        [
            f32::from(p[0]) / 255.0,
            f32::from(p[1]) / 255.0,
            f32::from(p[2]) / 255.0,
            f32::from(p[3]) / 255.0,
        ]
    }
}

/// A texture: the base level plus any generated mip levels.
#[derive(Debug, Clone)]
pub struct Texture {
    pub levels: Vec<Canvas>,
    pub sampling: Sampling,
}

impl Texture {
    pub fn new(width: u32, height: u32, sampling: Sampling) -> Self {
        Self {
            levels: vec![Canvas::new(width, height)],
            sampling,
        }
    }

    #[inline]
    pub fn base(&self) -> &Canvas {
        &self.levels[0]
    }

    /// The base level for writing; generated mips go stale and are dropped.
    pub fn base_mut(&mut self) -> &mut Canvas {
        self.levels.truncate(1);
        &mut self.levels[0]
    }

    #[inline]
    pub fn uses_mipmaps(&self) -> bool {
        self.sampling.filter == FilterMode::LinearMipmap && self.levels.len() > 1
    }

    /// Samples at normalized (s, t); `lod` picks the mip level when
    /// mipmapped sampling is active.
    pub fn sample(&self, s: f32, t: f32, lod: f32) -> [f32; 4] {
        let Sampling {
            filter,
            wrap_x,
            wrap_y,
        } = self.sampling;
        match filter {
            FilterMode::Nearest => sample_nearest(self.base(), s, t, wrap_x, wrap_y),
            FilterMode::Linear => sample_linear(self.base(), s, t, wrap_x, wrap_y),
            FilterMode::LinearMipmap => {
                let max = (self.levels.len() - 1) as f32;
                let lod = lod.clamp(0.0, max);
                let l0 = lod.floor() as usize;
                let l1 = (l0 + 1).min(self.levels.len() - 1);
                let a = sample_linear(&self.levels[l0], s, t, wrap_x, wrap_y);
                if l1 == l0 {
                    return a;
                }
                let b = sample_linear(&self.levels[l1], s, t, wrap_x, wrap_y);
                lerp4(a, b, lod - l0 as f32)
            }
        }
    }
}

fn wrap(c: i64, size: u32, mode: WrapMode) -> u32 {
    let n = i64::from(size.max(1));
    let w = match mode {
        WrapMode::None => c.clamp(0, n - 1),
        WrapMode::Repeat => c.rem_euclid(n),
        WrapMode::Mirrored => {
            let m = c.rem_euclid(2 * n);
            if m < n { m } else { 2 * n - 1 - m }
        }
    };
    w as u32
}

fn sample_nearest(c: &Canvas, s: f32, t: f32, wx: WrapMode, wy: WrapMode) -> [f32; 4] {
    let x = wrap((s * c.width as f32).floor() as i64, c.width, wx);
    let y = wrap((t * c.height as f32).floor() as i64, c.height, wy);
    c.texel(x, y)
}

fn sample_linear(c: &Canvas, s: f32, t: f32, wx: WrapMode, wy: WrapMode) -> [f32; 4] {
    let u = s * c.width as f32 - 0.5;
    let v = t * c.height as f32 - 0.5;
    let (x0, y0) = (u.floor(), v.floor());
    let (fx, fy) = (u - x0, v - y0);
    let (x0, y0) = (x0 as i64, y0 as i64);
    let xa = wrap(x0, c.width, wx);
    let xb = wrap(x0 + 1, c.width, wx);
    let ya = wrap(y0, c.height, wy);
    let yb = wrap(y0 + 1, c.height, wy);
    let top = lerp4(c.texel(xa, ya), c.texel(xb, ya), fx);
    let bottom = lerp4(c.texel(xa, yb), c.texel(xb, yb), fx);
    lerp4(top, bottom, fy)
}

#[inline]
fn lerp4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn checker() -> Texture {
        let mut t = Texture::new(2, 1, Sampling::default());
        t.base_mut().put(0, 0, [0, 0, 0, 255]);
        t.base_mut().put(1, 0, [255, 255, 255, 255]);
        t
    }

    #[test]
    fn wrap_modes() {
        assert_eq!(wrap(-1, 4, WrapMode::None), 0);
        assert_eq!(wrap(5, 4, WrapMode::None), 3);
        assert_eq!(wrap(-1, 4, WrapMode::Repeat), 3);
        assert_eq!(wrap(4, 4, WrapMode::Mirrored), 3);
        assert_eq!(wrap(-1, 4, WrapMode::Mirrored), 0);
    }

    #[test]
    fn nearest_picks_the_covering_texel() {
        let mut t = checker();
        t.sampling.filter = FilterMode::Nearest;
        assert_eq!(t.sample(0.3, 0.5, 0.0)[0], 0.0);
        assert_eq!(t.sample(0.7, 0.5, 0.0)[0], 1.0);
    }

    #[test]
    fn linear_blends_between_texel_centers() {
        let t = checker();
        assert_relative_eq!(t.sample(0.5, 0.5, 0.0)[0], 0.5);
        assert_relative_eq!(t.sample(0.25, 0.5, 0.0)[0], 0.0);
    }

    #[test]
    fn writing_the_base_drops_mips() {
        let mut t = checker();
        t.levels.push(Canvas::new(1, 1));
        t.base_mut().put(0, 0, [1, 2, 3, 4]);
        assert_eq!(t.levels.len(), 1);
    }

    #[test]
    fn fill_is_clamped() {
        let mut c = Canvas::new(2, 2);
        c.fill(Some(PixelRect::new(1, 1, 5, 5)), [9; 4]);
        assert_eq!(c.get(1, 1), Some([9; 4]));
        assert_eq!(c.get(0, 0), Some([0; 4]));
    }
}
