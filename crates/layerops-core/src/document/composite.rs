//! Layer compositing.
//!
//! Blending follows the separable/non-separable split of the W3C
//! compositing model: the blend result is mixed with the source by the
//! backdrop alpha, then composited source-over.

use image::GrayImage;

use super::{Content, Layer, LayerId, LayerMask, LayerMode};
use crate::buffer::{luminance, PixelBuffer, Rgba, TRANSPARENT};

impl Content {
    /// Render every visible layer onto an image-sized canvas.
    pub(super) fn projection(&self) -> PixelBuffer {
        let mut canvas = PixelBuffer::transparent(self.width, self.height);
        self.render_children(None, &mut canvas, (0, 0));
        canvas
    }

    /// Render a group's children into a buffer covering the group bounds.
    /// Returns the buffer and its offset in image coordinates.
    pub(super) fn render_group(&self, id: LayerId) -> Option<(PixelBuffer, (i32, i32))> {
        let (x, y, w, h) = self.bounds(id)?;
        let mut canvas = PixelBuffer::transparent(w, h);
        self.render_children(Some(id), &mut canvas, (x, y));
        Some((canvas, (x, y)))
    }

    /// `origin` is the image position of the canvas' top-left corner.
    fn render_children(&self, parent: Option<LayerId>, canvas: &mut PixelBuffer, origin: (i32, i32)) {
        // Bottom sibling first
        for id in self.children(parent).into_iter().rev() {
            let Some(layer) = self.layer(id) else {
                continue;
            };
            if layer.visible {
                self.render_layer(layer, canvas, origin);
            }
        }
    }

    fn render_layer(&self, layer: &Layer, canvas: &mut PixelBuffer, origin: (i32, i32)) {
        if layer.is_group() {
            if let Some((buffer, (x, y))) = self.render_group(layer.id) {
                let offset = (x - origin.0, y - origin.1);
                composite(canvas, &buffer, offset, layer.opacity, layer.mode, None);
            }
            return;
        }

        let offset = (layer.offset.0 - origin.0, layer.offset.1 - origin.1);
        let shown;
        let (source, mask) = match &layer.mask {
            Some(mask) if mask.show => {
                shown = mask_as_pixels(mask);
                (&shown, None)
            }
            Some(mask) if mask.apply => (&layer.buffer, Some(&mask.buffer)),
            _ => (&layer.buffer, None),
        };
        composite(canvas, source, offset, layer.opacity, layer.mode, mask);
    }
}

fn mask_as_pixels(mask: &LayerMask) -> PixelBuffer {
    let mut out = PixelBuffer::transparent(mask.width(), mask.height());
    for (x, y, p) in mask.buffer.enumerate_pixels() {
        let v = p.0[0];
        out.set_pixel(x, y, [v, v, v, 255]);
    }
    out
}

/// Composite `src` placed at `offset` onto `dst`.
///
/// `mask`, when given, has the size of `src` and scales its alpha.
pub(super) fn composite(
    dst: &mut PixelBuffer,
    src: &PixelBuffer,
    offset: (i32, i32),
    opacity: f64,
    mode: LayerMode,
    mask: Option<&GrayImage>,
) {
    let opacity = opacity.clamp(0.0, 1.0) as f32;
    if opacity == 0.0 {
        return;
    }

    let (ox, oy) = (offset.0 as i64, offset.1 as i64);
    let x0 = ox.max(0);
    let y0 = oy.max(0);
    let x1 = (ox + src.width as i64).min(dst.width as i64);
    let y1 = (oy + src.height as i64).min(dst.height as i64);

    for dy in y0..y1 {
        for dx in x0..x1 {
            let (sx, sy) = ((dx - ox) as u32, (dy - oy) as u32);
            let s = src.pixel(sx, sy);

            let mut alpha = s[3] as f32 / 255.0 * opacity;
            if let Some(mask) = mask {
                alpha *= mask.get_pixel(sx, sy).0[0] as f32 / 255.0;
            }
            if mode == LayerMode::Dissolve {
                alpha = if alpha > dissolve_noise(dx, dy) { 1.0 } else { 0.0 };
            }
            if alpha <= 0.0 {
                continue;
            }

            let (dx, dy) = (dx as u32, dy as u32);
            let d = dst.pixel(dx, dy);
            dst.set_pixel(dx, dy, blend_pixel(mode, s, alpha, d));
        }
    }
}

/// Composite `src` onto a grayscale buffer using its luminance.
pub(super) fn composite_gray(dst: &mut GrayImage, src: &PixelBuffer, offset: (i32, i32), opacity: f64) {
    let opacity = opacity.clamp(0.0, 1.0) as f32;
    let (ox, oy) = (offset.0 as i64, offset.1 as i64);
    let (w, h) = dst.dimensions();
    let x0 = ox.max(0);
    let y0 = oy.max(0);
    let x1 = (ox + src.width as i64).min(w as i64);
    let y1 = (oy + src.height as i64).min(h as i64);

    for dy in y0..y1 {
        for dx in x0..x1 {
            let s = src.pixel((dx - ox) as u32, (dy - oy) as u32);
            let a = s[3] as f32 / 255.0 * opacity;
            let value = luminance::luminance_u8(s) as f32;
            let p = dst.get_pixel_mut(dx as u32, dy as u32);
            p.0[0] = to_u8((p.0[0] as f32 * (1.0 - a) + value * a) / 255.0);
        }
    }
}

fn blend_pixel(mode: LayerMode, src: Rgba, src_alpha: f32, dst: Rgba) -> Rgba {
    let da = dst[3] as f32 / 255.0;
    let out_a = src_alpha + da * (1.0 - src_alpha);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }

    let cs = unit_rgb(src);
    let cb = unit_rgb(dst);
    let blended = blend(mode, cs, cb);

    let mut out = [0u8; 4];
    for i in 0..3 {
        let mixed = (1.0 - da) * cs[i] + da * blended[i];
        let co = src_alpha * mixed + da * cb[i] * (1.0 - src_alpha);
        out[i] = to_u8(co / out_a);
    }
    out[3] = to_u8(out_a);
    out
}

fn unit_rgb(p: Rgba) -> [f32; 3] {
    [p[0] as f32 / 255.0, p[1] as f32 / 255.0, p[2] as f32 / 255.0]
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Blend source color `s` onto backdrop color `d`.
fn blend(mode: LayerMode, s: [f32; 3], d: [f32; 3]) -> [f32; 3] {
    match mode {
        LayerMode::Hue => {
            let (sh, ss, _) = rgb_to_hsv(s);
            let (_, ds, dv) = rgb_to_hsv(d);
            if ss == 0.0 {
                d
            } else {
                hsv_to_rgb(sh, ds, dv)
            }
        }
        LayerMode::Saturation => {
            let (_, ss, _) = rgb_to_hsv(s);
            let (dh, _, dv) = rgb_to_hsv(d);
            hsv_to_rgb(dh, ss, dv)
        }
        LayerMode::Value => {
            let (_, _, sv) = rgb_to_hsv(s);
            let (dh, ds, _) = rgb_to_hsv(d);
            hsv_to_rgb(dh, ds, sv)
        }
        LayerMode::Color | LayerMode::LchColor => {
            let (sh, ss, _) = rgb_to_hsl(s);
            let (_, _, dl) = rgb_to_hsl(d);
            hsl_to_rgb(sh, ss, dl)
        }
        LayerMode::LchHue => {
            let (sh, ss, _) = rgb_to_hsl(s);
            let (_, ds, dl) = rgb_to_hsl(d);
            if ss == 0.0 {
                d
            } else {
                hsl_to_rgb(sh, ds, dl)
            }
        }
        LayerMode::LchChroma => {
            let (_, ss, _) = rgb_to_hsl(s);
            let (dh, _, dl) = rgb_to_hsl(d);
            hsl_to_rgb(dh, ss, dl)
        }
        LayerMode::LchLightness => {
            let (_, _, sl) = rgb_to_hsl(s);
            let (dh, ds, _) = rgb_to_hsl(d);
            hsl_to_rgb(dh, ds, sl)
        }
        _ => std::array::from_fn(|i| blend_channel(mode, s[i], d[i])),
    }
}

fn blend_channel(mode: LayerMode, s: f32, d: f32) -> f32 {
    let v = match mode {
        LayerMode::Multiply => s * d,
        LayerMode::Divide => {
            if s <= 0.0 {
                1.0
            } else {
                d / s
            }
        }
        LayerMode::Screen => 1.0 - (1.0 - s) * (1.0 - d),
        LayerMode::Overlay => hard_light(d, s),
        LayerMode::Dodge => {
            if s >= 1.0 {
                1.0
            } else {
                d / (1.0 - s)
            }
        }
        LayerMode::Burn => {
            if s <= 0.0 {
                0.0
            } else {
                1.0 - (1.0 - d) / s
            }
        }
        LayerMode::HardLight => hard_light(s, d),
        LayerMode::SoftLight => (1.0 - 2.0 * s) * d * d + 2.0 * s * d,
        LayerMode::GrainExtract => d - s + 0.5,
        LayerMode::GrainMerge => d + s - 0.5,
        LayerMode::Difference => (d - s).abs(),
        LayerMode::Addition => d + s,
        LayerMode::Subtract => d - s,
        LayerMode::DarkenOnly => d.min(s),
        LayerMode::LightenOnly => d.max(s),
        _ => s,
    };
    v.clamp(0.0, 1.0)
}

fn hard_light(s: f32, d: f32) -> f32 {
    if s <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

/// Position-stable pseudo random threshold in `0.0..1.0`.
fn dissolve_noise(x: i64, y: i64) -> f32 {
    let mut h = (x as u32).wrapping_mul(0x9E37_79B1) ^ (y as u32).wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    (h & 0xFFFF) as f32 / 65536.0
}

fn rgb_to_hsv([r, g, b]: [f32; 3]) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let s = if max > 0.0 { delta / max } else { 0.0 };
    (hue(r, g, b, max, delta), s, max)
}

fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let c = v * s;
    let m = v - c;
    hue_to_rgb(h, c, m)
}

fn rgb_to_hsl([r, g, b]: [f32; 3]) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;
    let l = (max + min) / 2.0;
    let s = if delta == 0.0 {
        0.0
    } else {
        delta / (1.0 - (2.0 * l - 1.0).abs())
    };
    (hue(r, g, b, max, delta), s.clamp(0.0, 1.0), l)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let m = l - c / 2.0;
    hue_to_rgb(h, c, m)
}

/// Hue in degrees `0.0..360.0`.
fn hue(r: f32, g: f32, b: f32, max: f32, delta: f32) -> f32 {
    if delta == 0.0 {
        return 0.0;
    }
    let h = if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    h.rem_euclid(360.0)
}

fn hue_to_rgb(h: f32, c: f32, m: f32) -> [f32; 3] {
    let hp = h.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r + m, g + m, b + m]
}
