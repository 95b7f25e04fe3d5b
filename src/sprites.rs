//! Billboard sprites.
//!
//! Sprites are sorted far to near and tested against the depth buffer at the
//! column under their center only. Ground-level sprites stand on the ramp
//! under them.

use std::cmp::Ordering;

use crate::camera::{Camera, normalize_angle};
use crate::compositor::DepthBuffer;
use crate::draw::{DrawIntent, TextureRef};
use crate::world::{GridWorld, Sprite};

/// A sprite placed on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpriteQuad {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub center_column: usize,
    pub distance: f32,
    pub texture: TextureRef,
}

/// Projects one sprite without any occlusion test. `None` when it is behind
/// or beside the view, sits on the camera, or is too small to see.
pub fn project_sprite(sprite: &Sprite, world: &GridWorld, camera: &Camera, cull_margin: f32) -> Option<SpriteQuad> {
    let dx = sprite.x - camera.pose.x;
    let dy = sprite.y - camera.pose.y;
    let straight = (dx * dx + dy * dy).sqrt();
    if straight <= f32::EPSILON {
        return None;
    }

    let angle_diff = normalize_angle(dy.atan2(dx) - camera.pose.angle);
    if angle_diff.abs() > 0.5 * camera.fov + cull_margin {
        return None;
    }
    let distance = straight * angle_diff.cos();
    if distance <= f32::EPSILON {
        return None;
    }

    let scale = camera.view_dist / distance;
    let size = sprite.size * scale;
    if size < 1.0 {
        return None;
    }
    let center_x = camera.project_x(angle_diff);
    let mut base = sprite.level as f32 * world.tile_size();
    if sprite.level == 0 {
        base += world.height_at(sprite.x, sprite.y);
    }
    let bottom = camera.project_y(base, distance);

    let last_column = camera.width.saturating_sub(1) as f32;
    Some(SpriteQuad {
        x: (center_x - 0.5 * size).round() as i32,
        y: (bottom - size).round() as i32,
        w: size.round() as i32,
        h: size.round() as i32,
        center_column: center_x.clamp(0.0, last_column) as usize,
        distance,
        texture: TextureRef::Sprite(sprite.kind),
    })
}

/// Draws every visible sprite, farthest first. A sprite is drawn only when
/// it is nearer than the depth buffer at its center column.
pub fn draw_sprites(
    world: &GridWorld,
    camera: &Camera,
    cull_margin: f32,
    depth: &DepthBuffer,
    out: &mut Vec<DrawIntent>,
) -> usize {
    let mut quads: Vec<SpriteQuad> = world
        .sprites()
        .iter()
        .filter(|s| !s.despawn)
        .filter_map(|s| project_sprite(s, world, camera, cull_margin))
        .filter(|q| q.distance < depth.get(q.center_column))
        .collect();
    quads.sort_by(|a, b| b.distance.partial_cmp(&a.distance).unwrap_or(Ordering::Equal));

    for q in &quads {
        out.push(DrawIntent::Quad {
            x: q.x,
            y: q.y,
            w: q.w,
            h: q.h,
            texture: q.texture,
        });
    }
    quads.len()
}
