use crate::draw::{DrawSink, TexRect, TextureRef};
use crate::textures::TextureBank;

/// Sky above the horizon, ground below. Everything else is drawn on top.
pub fn clear_background(buf: &mut [u32], width: usize, height: usize, horizon: f32, sky: u32, ground: u32) {
    let mid = (horizon.round().max(0.0) as usize).min(height);
    buf[..mid * width].fill(sky);
    buf[mid * width..width * height].fill(ground);
}

/// CPU pixel sink: rasterizes draw intents into a packed-RGB buffer.
pub struct SoftwareSink<'a, B: TextureBank + ?Sized> {
    buf: &'a mut [u32],
    width: usize,
    height: usize,
    bank: &'a B,
}

impl<'a, B: TextureBank + ?Sized> SoftwareSink<'a, B> {
    pub fn new(buf: &'a mut [u32], width: usize, height: usize, bank: &'a B) -> Self {
        debug_assert!(buf.len() >= width * height);
        Self {
            buf,
            width,
            height,
            bank,
        }
    }

    #[inline]
    fn put(&mut self, x: usize, y: usize, color: u32) {
        if x < self.width && y < self.height {
            self.buf[y * self.width + x] = color;
        }
    }
}

impl<B: TextureBank + ?Sized> DrawSink for SoftwareSink<'_, B> {
    fn draw_textured_span(&mut self, column: usize, y_start: usize, y_end: usize, texture: TextureRef, rect: TexRect) {
        if column >= self.width || y_start >= self.height {
            return;
        }
        let y_end = y_end.min(self.height - 1);
        if y_end < y_start {
            return;
        }
        let rows = (y_end + 1 - y_start) as f32;
        let dv = (rect.v_bottom - rect.v_top) / rows;
        let mut idx = y_start * self.width + column;
        for i in 0..=(y_end - y_start) {
            let v = rect.v_top + (i as f32 + 0.5) * dv;
            if let Some(c) = self.bank.sample(texture, rect.u, v) {
                self.buf[idx] = c;
            }
            idx += self.width;
        }
    }

    fn draw_color_span(&mut self, x_start: usize, x_end: usize, y: usize, color: u32) {
        if y >= self.height || x_start >= self.width || x_end < x_start {
            return;
        }
        let row = y * self.width;
        let x_end = x_end.min(self.width - 1);
        self.buf[row + x_start..=row + x_end].fill(color);
    }

    fn draw_textured_row(
        &mut self,
        x_start: usize,
        x_end: usize,
        y: usize,
        texture: TextureRef,
        world_start: [f32; 2],
        world_end: [f32; 2],
    ) {
        if y >= self.height || x_start >= self.width {
            return;
        }
        let steps = x_end.saturating_sub(x_start).max(1) as f32;
        let du = (world_end[0] - world_start[0]) / steps;
        let dv = (world_end[1] - world_start[1]) / steps;
        for (i, x) in (x_start..=x_end.min(self.width - 1)).enumerate() {
            let u = world_start[0] + du * i as f32;
            let v = world_start[1] + dv * i as f32;
            if let Some(c) = self.bank.sample(texture, u, v) {
                self.put(x, y, c);
            }
        }
    }

    fn draw_column_fill(&mut self, column: usize, y_start: usize, y_end: usize, color: u32) {
        if column >= self.width {
            return;
        }
        for y in y_start..=y_end.min(self.height.saturating_sub(1)) {
            self.buf[y * self.width + column] = color;
        }
    }

    fn draw_quad(&mut self, x: i32, y: i32, w: i32, h: i32, texture: TextureRef) {
        if w <= 0 || h <= 0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + w).min(self.width as i32);
        let y1 = (y + h).min(self.height as i32);
        for sy in y0..y1 {
            let v = (sy - y) as f32 / h as f32;
            for sx in x0..x1 {
                let u = (sx - x) as f32 / w as f32;
                if let Some(c) = self.bank.sample(texture, u, v) {
                    self.put(sx as usize, sy as usize, c);
                }
            }
        }
    }
}
