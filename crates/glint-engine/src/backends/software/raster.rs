//! Triangle rasterization and fixed-function blending.
//!
//! Pixels are sampled at their centers. A pixel exactly on an edge shared
//! by two triangles belongs to only one of them, so adjacent quads never
//! blend twice along the seam.

use crate::batch::Vertex;
use crate::paint::{BlendEq, BlendFunc, BlendMode};
use crate::renderer::{DrawCall, PixelRect};

use super::canvas::{Canvas, Texture};

/// A vertex after projection, with attributes premultiplied by `1/w` for
/// perspective-correct interpolation.
#[derive(Debug, Copy, Clone)]
struct Projected {
    x: f32,
    y: f32,
    inv_w: f32,
    st: [f32; 2],
    color: [f32; 4],
}

fn project(call: &DrawCall<'_>, v: &Vertex) -> Option<Projected> {
    let clip = call.mvp.transform_point(v.position);
    if clip[3] <= f32::EPSILON {
        return None;
    }
    let inv_w = 1.0 / clip[3];
    let (nx, ny) = (clip[0] * inv_w, clip[1] * inv_w);
    let vp = call.viewport;
    Some(Projected {
        x: vp.x + (nx + 1.0) * 0.5 * vp.w,
        y: vp.y + (ny + 1.0) * 0.5 * vp.h,
        inv_w,
        st: [v.texcoord[0] * inv_w, v.texcoord[1] * inv_w],
        color: v.color.map(|c| c * inv_w),
    })
}

#[inline]
fn edge(a: &Projected, b: &Projected, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Whether samples exactly on edge `a → b` are inside.
#[inline]
fn owns_edge(a: &Projected, b: &Projected) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    dy > 0.0 || (dy == 0.0 && dx < 0.0)
}

#[inline]
fn inside(w: f32, owner: bool) -> bool {
    w > 0.0 || (w == 0.0 && owner)
}

/// Pixel bounds a draw may touch: surface ∩ viewport ∩ scissor.
fn draw_bounds(canvas: &Canvas, call: &DrawCall<'_>) -> PixelRect {
    let vp = call.viewport;
    let x0 = vp.x.max(0.0).floor() as u32;
    let y0 = vp.y.max(0.0).floor() as u32;
    let x1 = (vp.x + vp.w).max(0.0).ceil() as u32;
    let y1 = (vp.y + vp.h).max(0.0).ceil() as u32;
    let mut r = canvas.clamp_rect(PixelRect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0)));
    if let Some(s) = call.scissor {
        let s = canvas.clamp_rect(s);
        let nx0 = r.x.max(s.x);
        let ny0 = r.y.max(s.y);
        let nx1 = (r.x + r.w).min(s.x + s.w);
        let ny1 = (r.y + r.h).min(s.y + s.h);
        r = PixelRect::new(nx0, ny0, nx1.saturating_sub(nx0), ny1.saturating_sub(ny0));
    }
    r
}

/// Rasterizes every triangle of `call` into `canvas`.
pub(super) fn draw(canvas: &mut Canvas, call: &DrawCall<'_>, texture: Option<&Texture>) {
    let bounds = draw_bounds(canvas, call);
    if bounds.w == 0 || bounds.h == 0 {
        return;
    }
    let projected: Vec<Option<Projected>> = call.vertices.iter().map(|v| project(call, v)).collect();
    let sequential: Vec<u32>;
    let indices = if call.indices.is_empty() {
        sequential = (0..call.vertices.len() as u32).collect();
        &sequential[..]
    } else {
        call.indices
    };

    for tri in indices.chunks_exact(3) {
        let fetch = |i: u32| projected.get(i as usize).copied().flatten();
        let (Some(a), Some(b), Some(c)) = (fetch(tri[0]), fetch(tri[1]), fetch(tri[2])) else {
            continue;
        };
        raster_triangle(canvas, call, texture, bounds, a, b, c);
    }
}

/// Mip level for a triangle: log2 of texels per pixel along one axis.
fn triangle_lod(texture: &Texture, a: &Projected, b: &Projected, c: &Projected, screen_area: f32) -> f32 {
    let uv = |p: &Projected| [p.st[0] / p.inv_w, p.st[1] / p.inv_w];
    let (ta, tb, tc) = (uv(a), uv(b), uv(c));
    let base = texture.base();
    let tex_area = ((tb[0] - ta[0]) * (tc[1] - ta[1]) - (tb[1] - ta[1]) * (tc[0] - ta[0])).abs()
        * base.width as f32
        * base.height as f32;
    if screen_area <= f32::EPSILON || tex_area <= f32::EPSILON {
        return 0.0;
    }
    0.5 * (tex_area / screen_area).log2()
}

#[allow(clippy::too_many_arguments)]
fn raster_triangle(
    canvas: &mut Canvas,
    call: &DrawCall<'_>,
    texture: Option<&Texture>,
    bounds: PixelRect,
    a: Projected,
    mut b: Projected,
    mut c: Projected,
) {
    let mut area = edge(&a, &b, c.x, c.y);
    if area.abs() <= f32::EPSILON {
        return;
    }
    if area < 0.0 {
        std::mem::swap(&mut b, &mut c);
        area = -area;
    }

    let min_x = a.x.min(b.x).min(c.x).floor().max(bounds.x as f32) as u32;
    let min_y = a.y.min(b.y).min(c.y).floor().max(bounds.y as f32) as u32;
    let max_x = (a.x.max(b.x).max(c.x).ceil() as i64).min(i64::from(bounds.x + bounds.w)) as u32;
    let max_y = (a.y.max(b.y).max(c.y).ceil() as i64).min(i64::from(bounds.y + bounds.h)) as u32;
    if min_x >= max_x || min_y >= max_y {
        return;
    }

    let own_bc = owns_edge(&b, &c);
    let own_ca = owns_edge(&c, &a);
    let own_ab = owns_edge(&a, &b);
    let lod = match texture {
        Some(t) if t.uses_mipmaps() => triangle_lod(t, &a, &b, &c, area),
        _ => 0.0,
    };

    for py in min_y..max_y {
        let sy = py as f32 + 0.5;
        for px in min_x..max_x {
            let sx = px as f32 + 0.5;
            let w0 = edge(&b, &c, sx, sy);
            let w1 = edge(&c, &a, sx, sy);
            let w2 = edge(&a, &b, sx, sy);
            if !(inside(w0, own_bc) && inside(w1, own_ca) && inside(w2, own_ab)) {
                continue;
            }
            let (l0, l1, l2) = (w0 / area, w1 / area, w2 / area);
            let inv_w = l0 * a.inv_w + l1 * b.inv_w + l2 * c.inv_w;
            if inv_w <= 0.0 {
                continue;
            }
            let interp = |fa: f32, fb: f32, fc: f32| (l0 * fa + l1 * fb + l2 * fc) / inv_w;

            let mut src = [
                interp(a.color[0], b.color[0], c.color[0]),
                interp(a.color[1], b.color[1], c.color[1]),
                interp(a.color[2], b.color[2], c.color[2]),
                interp(a.color[3], b.color[3], c.color[3]),
            ];
            if let Some(t) = texture {
                let s = interp(a.st[0], b.st[0], c.st[0]);
                let tt = interp(a.st[1], b.st[1], c.st[1]);
                let texel = t.sample(s, tt, lod);
                for (v, k) in src.iter_mut().zip(texel) {
                    *v *= k;
                }
            }

            let out = match call.blend {
                Some(mode) => {
                    let dst = canvas.get(px, py).map_or([0.0; 4], to_f32);
                    blend(src, dst, &mode)
                }
                None => src,
            };
            canvas.put(px, py, to_u8(out));
        }
    }
}

// ── blending ──────────────────────────────────────────────────────────────

#[inline]
fn to_f32(p: [u8; 4]) -> [f32; 4] {
    p.map(|c| f32::from(c) / 255.0)
}

#[inline]
pub(super) fn to_u8(c: [f32; 4]) -> [u8; 4] {
    c.map(|v| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8)
}

fn factor(f: BlendFunc, src: &[f32; 4], dst: &[f32; 4], ch: usize) -> f32 {
    match f {
        BlendFunc::Zero => 0.0,
        BlendFunc::One => 1.0,
        BlendFunc::SrcColor => src[ch],
        BlendFunc::DstColor => dst[ch],
        BlendFunc::OneMinusSrc => 1.0 - src[ch],
        BlendFunc::OneMinusDst => 1.0 - dst[ch],
        BlendFunc::SrcAlpha => src[3],
        BlendFunc::DstAlpha => dst[3],
        BlendFunc::OneMinusSrcAlpha => 1.0 - src[3],
        BlendFunc::OneMinusDstAlpha => 1.0 - dst[3],
    }
}

#[inline]
fn combine(eq: BlendEq, s: f32, d: f32) -> f32 {
    match eq {
        BlendEq::Add => s + d,
        BlendEq::Subtract => s - d,
        BlendEq::ReverseSubtract => d - s,
    }
}

pub(super) fn blend(src: [f32; 4], dst: [f32; 4], mode: &BlendMode) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (ch, o) in out.iter_mut().enumerate() {
        let (sf, df, eq) = if ch < 3 {
            (mode.source_color, mode.dest_color, mode.color_equation)
        } else {
            (mode.source_alpha, mode.dest_alpha, mode.alpha_equation)
        };
        let s = src[ch] * factor(sf, &src, &dst, ch);
        let d = dst[ch] * factor(df, &src, &dst, ch);
        *o = combine(eq, s, d).clamp(0.0, 1.0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Mat4;
    use crate::paint::BlendPreset;
    use crate::renderer::{SurfaceHandle, SurfaceViewport};
    use crate::shader::ShaderBlock;
    use approx::assert_relative_eq;

    fn call<'a>(vertices: &'a [Vertex], indices: &'a [u32], w: f32, h: f32) -> DrawCall<'a> {
        // Pixel space straight to NDC.
        let mvp = Mat4::orthographic(0.0, w, 0.0, h, -1.0, 1.0);
        DrawCall {
            surface: SurfaceHandle(1),
            texture: None,
            viewport: SurfaceViewport { x: 0.0, y: 0.0, w, h },
            scissor: None,
            blend: None,
            mvp,
            program: None,
            block: ShaderBlock::builtin(),
            vertices,
            indices,
            attributes: &[],
            uniforms: &[],
        }
    }

    fn quad(x0: f32, y0: f32, x1: f32, y1: f32, color: [f32; 4]) -> [Vertex; 4] {
        [
            Vertex::new(x0, y0, 0.0, 0.0, color),
            Vertex::new(x1, y0, 1.0, 0.0, color),
            Vertex::new(x1, y1, 1.0, 1.0, color),
            Vertex::new(x0, y1, 0.0, 1.0, color),
        ]
    }

    fn coverage(c: &Canvas) -> usize {
        c.pixels.chunks_exact(4).filter(|p| p[3] != 0).count()
    }

    #[test]
    fn quad_covers_exactly_its_pixels() {
        let mut canvas = Canvas::new(8, 8);
        let v = quad(2.0, 2.0, 6.0, 5.0, [1.0; 4]);
        draw(&mut canvas, &call(&v, &[0, 1, 2, 0, 2, 3], 8.0, 8.0), None);
        assert_eq!(coverage(&canvas), 4 * 3);
        assert_eq!(canvas.get(2, 2), Some([255; 4]));
        assert_eq!(canvas.get(6, 2), Some([0; 4]));
    }

    #[test]
    fn shared_diagonal_is_not_blended_twice() {
        let mut canvas = Canvas::new(4, 4);
        let v = quad(0.0, 0.0, 4.0, 4.0, [0.0, 0.0, 0.0, 0.5]);
        let mut c = call(&v, &[0, 1, 2, 0, 2, 3], 4.0, 4.0);
        c.blend = Some(BlendMode::from_preset(BlendPreset::Add));
        draw(&mut canvas, &c, None);
        // One pass of additive alpha: 0.5 × 0.5 = 0.25.
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(canvas.get(x, y).map(|p| p[3]), Some(64));
            }
        }
    }

    #[test]
    fn winding_does_not_matter() {
        let mut canvas = Canvas::new(4, 4);
        let v = quad(0.0, 0.0, 4.0, 4.0, [1.0; 4]);
        draw(&mut canvas, &call(&v, &[0, 2, 1, 0, 3, 2], 4.0, 4.0), None);
        assert_eq!(coverage(&canvas), 16);
    }

    #[test]
    fn scissor_limits_coverage() {
        let mut canvas = Canvas::new(8, 8);
        let v = quad(0.0, 0.0, 8.0, 8.0, [1.0; 4]);
        let mut c = call(&v, &[0, 1, 2, 0, 2, 3], 8.0, 8.0);
        c.scissor = Some(PixelRect::new(1, 1, 2, 3));
        draw(&mut canvas, &c, None);
        assert_eq!(coverage(&canvas), 6);
    }

    #[test]
    fn texture_modulates_vertex_color() {
        let mut tex = Texture::new(1, 1, Default::default());
        tex.base_mut().put(0, 0, [0, 0, 255, 255]);
        let mut canvas = Canvas::new(2, 2);
        let v = quad(0.0, 0.0, 2.0, 2.0, [1.0; 4]);
        draw(&mut canvas, &call(&v, &[0, 1, 2, 0, 2, 3], 2.0, 2.0), Some(&tex));
        assert_eq!(canvas.get(1, 1), Some([0, 0, 255, 255]));
    }

    #[test]
    fn normal_blend_over_opaque() {
        let out = blend(
            [1.0, 0.0, 0.0, 0.5],
            [0.0, 0.0, 1.0, 1.0],
            &BlendMode::from_preset(BlendPreset::Normal),
        );
        assert_relative_eq!(out[0], 0.5);
        assert_relative_eq!(out[2], 0.5);
        assert_relative_eq!(out[3], 0.75);
    }

    #[test]
    fn subtract_clamps_at_zero() {
        let out = blend(
            [0.2; 4],
            [0.5; 4],
            &BlendMode::from_preset(BlendPreset::Subtract),
        );
        assert_eq!(out, [0.0; 4]);
    }
}
