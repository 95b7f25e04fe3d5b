//! Draw intents the rendering core emits, and the sink trait that consumes
//! them. The core never touches a pixel buffer itself.

#[inline]
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    // BGRA8 in little-endian memory
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16)
    // Alpha at 0
}

/// Which texture a span samples from. Resolving it is the texture bank's job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureRef {
    Wall { material: u16, dark: bool },
    Door { material: u16, dark: bool },
    Top(u16),
    Sprite(u16),
}

/// Normalized texture coordinates for one vertical strip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TexRect {
    pub u: f32,
    pub v_top: f32,
    pub v_bottom: f32,
}

/// One drawing operation, in painter's order.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawIntent {
    /// Vertical wall or door strip, rows inclusive.
    TexturedSpan {
        column: usize,
        y_start: usize,
        y_end: usize,
        texture: TextureRef,
        rect: TexRect,
    },
    /// Horizontal flat-color run, columns inclusive.
    ColorSpan {
        x_start: usize,
        x_end: usize,
        y: usize,
        color: u32,
    },
    /// Horizontal run of a textured top surface. Texture coordinates are the
    /// world positions (in tiles) under the first and last pixel; sampling is
    /// linear between them.
    TexturedRow {
        x_start: usize,
        x_end: usize,
        y: usize,
        texture: TextureRef,
        world_start: [f32; 2],
        world_end: [f32; 2],
    },
    /// Vertical flat-color run, rows inclusive.
    ColumnFill {
        column: usize,
        y_start: usize,
        y_end: usize,
        color: u32,
    },
    /// Billboard. Position and size may extend past the screen.
    Quad {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        texture: TextureRef,
    },
}

/// Anything that can turn draw intents into pixels.
pub trait DrawSink {
    fn draw_textured_span(
        &mut self,
        column: usize,
        y_start: usize,
        y_end: usize,
        texture: TextureRef,
        rect: TexRect,
    );

    fn draw_color_span(&mut self, x_start: usize, x_end: usize, y: usize, color: u32);

    fn draw_textured_row(
        &mut self,
        x_start: usize,
        x_end: usize,
        y: usize,
        texture: TextureRef,
        world_start: [f32; 2],
        world_end: [f32; 2],
    );

    fn draw_column_fill(&mut self, column: usize, y_start: usize, y_end: usize, color: u32);

    fn draw_quad(&mut self, x: i32, y: i32, w: i32, h: i32, texture: TextureRef);
}

impl DrawIntent {
    pub fn apply<S: DrawSink + ?Sized>(&self, sink: &mut S) {
        match *self {
            DrawIntent::TexturedSpan {
                column,
                y_start,
                y_end,
                texture,
                rect,
            } => sink.draw_textured_span(column, y_start, y_end, texture, rect),
            DrawIntent::ColorSpan {
                x_start,
                x_end,
                y,
                color,
            } => sink.draw_color_span(x_start, x_end, y, color),
            DrawIntent::TexturedRow {
                x_start,
                x_end,
                y,
                texture,
                world_start,
                world_end,
            } => sink.draw_textured_row(x_start, x_end, y, texture, world_start, world_end),
            DrawIntent::ColumnFill {
                column,
                y_start,
                y_end,
                color,
            } => sink.draw_column_fill(column, y_start, y_end, color),
            DrawIntent::Quad {
                x,
                y,
                w,
                h,
                texture,
            } => sink.draw_quad(x, y, w, h, texture),
        }
    }
}

/// Replays a whole frame into a sink.
pub fn submit<S: DrawSink + ?Sized>(intents: &[DrawIntent], sink: &mut S) {
    for intent in intents {
        intent.apply(sink);
    }
}
