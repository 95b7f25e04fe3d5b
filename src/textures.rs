//! Texture lookup seen from the software sink.
//!
//! Decoding image files is somebody else's job; the core only ever hands a
//! [`TextureRef`] to a bank. [`ProceduralTextures`] is the built-in bank the
//! demo uses when nothing else is plugged in.

use crate::draw::{TextureRef, pack_rgb};

pub trait TextureBank {
    /// Texel at normalized (u, v), wrapped into [0, 1). `None` is a fully
    /// transparent texel.
    fn sample(&self, texture: TextureRef, u: f32, v: f32) -> Option<u32>;
}

/// Pattern-generated textures: bricks for walls, barred panels for doors,
/// tiles for tops and a round marker for sprites.
pub struct ProceduralTextures {
    wall_tints: Vec<[u8; 3]>,
    sprite_tints: Vec<[u8; 3]>,
}

impl Default for ProceduralTextures {
    fn default() -> Self {
        Self {
            wall_tints: vec![
                [150, 150, 150],
                [170, 90, 70],
                [90, 120, 170],
                [120, 160, 90],
                [180, 160, 110],
            ],
            sprite_tints: vec![[230, 200, 60], [200, 80, 200], [80, 210, 210]],
        }
    }
}

fn tint(colors: &[[u8; 3]], id: u16) -> [u8; 3] {
    colors[id as usize % colors.len()]
}

fn scale(c: [u8; 3], f: f32) -> u32 {
    let ch = |v: u8| (v as f32 * f).clamp(0.0, 255.0) as u8;
    pack_rgb(ch(c[0]), ch(c[1]), ch(c[2]))
}

impl TextureBank for ProceduralTextures {
    fn sample(&self, texture: TextureRef, u: f32, v: f32) -> Option<u32> {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);
        match texture {
            TextureRef::Wall { material, dark } => {
                let base = tint(&self.wall_tints, material);
                let row = (v * 8.0) as u32;
                let shifted = if row % 2 == 0 { u } else { (u + 0.5).rem_euclid(1.0) };
                let mortar = (v * 8.0).fract() < 0.12 || (shifted * 4.0).fract() < 0.06;
                let f = if mortar { 0.45 } else { 1.0 };
                Some(scale(base, if dark { f * 0.7 } else { f }))
            }
            TextureRef::Door { material, dark } => {
                let base = tint(&self.wall_tints, material.wrapping_add(1));
                let frame = u < 0.08 || u > 0.92 || v < 0.06 || v > 0.94;
                let bar = (u * 6.0).fract() < 0.25;
                let window = v > 0.15 && v < 0.5;
                if !frame && window && !bar {
                    return None;
                }
                Some(scale(base, if dark { 0.6 } else { 0.85 }))
            }
            TextureRef::Top(id) => {
                let base = tint(&self.wall_tints, id);
                let edge = u < 0.04 || v < 0.04;
                let checker = ((u * 2.0) as u32 + (v * 2.0) as u32) % 2 == 0;
                let f = match (edge, checker) {
                    (true, _) => 0.5,
                    (false, true) => 1.1,
                    (false, false) => 0.95,
                };
                Some(scale(base, f))
            }
            TextureRef::Sprite(kind) => {
                let (dx, dy) = (u - 0.5, v - 0.55);
                let r2 = dx * dx + dy * dy;
                if r2 > 0.16 {
                    return None;
                }
                let f = 1.2 - r2 * 3.0;
                Some(scale(tint(&self.sprite_tints, kind), f))
            }
        }
    }
}
