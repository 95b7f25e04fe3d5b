//! Stretches the internal framebuffer onto the window surface.

use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Source neighbors and 8.8 fixed-point weights along one axis.
#[derive(Clone, Debug, Default, PartialEq)]
struct AxisLut {
    lo: Vec<usize>,
    hi: Vec<usize>,
    weight: Vec<u16>,
}

impl AxisLut {
    fn build(dst: usize, src: usize) -> Self {
        let mut lut = Self {
            lo: Vec::with_capacity(dst),
            hi: Vec::with_capacity(dst),
            weight: Vec::with_capacity(dst),
        };
        if src == 0 {
            return lut;
        }
        let step = src as f32 / dst.max(1) as f32;
        let last = src - 1;
        for i in 0..dst {
            let f = i as f32 * step;
            let lo = (f.floor() as usize).min(last);
            lut.lo.push(lo);
            lut.hi.push((lo + 1).min(last));
            lut.weight.push(((f - lo as f32) * 256.0).round().clamp(0.0, 256.0) as u16);
        }
        lut
    }
}

/// Bilinear upscaler from a fixed internal resolution to the window size.
/// Rebuilt on resize; `blit` is the per-frame path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Upscaler {
    src_w: usize,
    src_h: usize,
    dst_w: usize,
    dst_h: usize,
    x: AxisLut,
    y: AxisLut,
}

impl Upscaler {
    pub fn new(src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Self {
        Self {
            src_w,
            src_h,
            dst_w,
            dst_h,
            x: AxisLut::build(dst_w, src_w),
            y: AxisLut::build(dst_h, src_h),
        }
    }

    pub fn source_size(&self) -> (usize, usize) {
        (self.src_w, self.src_h)
    }

    pub fn target_size(&self) -> (usize, usize) {
        (self.dst_w, self.dst_h)
    }

    /// Rows are processed in parallel.
    pub fn blit(&self, src: &[u32], dst: &mut [u32]) {
        if self.src_w == 0 || self.dst_w == 0 || src.len() < self.src_w * self.src_h {
            return;
        }
        let sw = self.src_w;
        dst.par_chunks_mut(self.dst_w)
            .take(self.dst_h)
            .enumerate()
            .for_each(|(y, dst_row)| {
                let row0 = self.y.lo[y] * sw;
                let row1 = self.y.hi[y] * sw;
                let wy = self.y.weight[y] as u32;
                for (x, px) in dst_row.iter_mut().enumerate() {
                    let (x0, x1) = (self.x.lo[x], self.x.hi[x]);
                    let wx = self.x.weight[x] as u32;
                    let top = lerp_color_u32(src[row0 + x0], src[row0 + x1], wx);
                    let bot = lerp_color_u32(src[row1 + x0], src[row1 + x1], wx);
                    *px = lerp_color_u32(top, bot, wy);
                }
            });
    }
}

/// Internal framebuffer size for a window: fixed height, width from the
/// aspect ratio, even and at least 160.
pub fn internal_size(window_w: usize, window_h: usize, target_h: usize) -> (usize, usize) {
    let aspect = if window_h > 0 {
        window_w as f32 / window_h as f32
    } else {
        1.0
    };
    let mut w = ((target_h as f32 * aspect).round() as usize).max(160);
    if w % 2 != 0 {
        w += 1;
    }
    (w, target_h)
}

#[inline]
fn lerp_color_u32(a: u32, b: u32, w256: u32) -> u32 {
    let inv = 256 - w256;
    // R and B share one multiply (00RR00BB), G goes alone.
    let rb = (((a & 0x00FF00FF) * inv + (b & 0x00FF00FF) * w256) >> 8) & 0x00FF00FF;
    let g = (((a & 0x0000FF00) * inv + (b & 0x0000FF00) * w256) >> 8) & 0x0000FF00;
    rb | g
}
