use crate::camera::Camera;
use crate::draw::{DrawIntent, TexRect, TextureRef};
use crate::raycaster::{Face, RayHit};
use crate::world::Material;

/// A hit projected into one screen column.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallSpan {
    pub column: usize,
    /// Unclipped screen rows of the level's top and bottom edges.
    pub top: f32,
    pub bottom: f32,
    /// Visible rows, inclusive.
    pub y_start: usize,
    pub y_end: usize,
    pub distance: f32,
    pub texture: TextureRef,
    pub tex_u: f32,
}

impl WallSpan {
    /// Screen height before clipping.
    #[inline]
    pub fn projected_height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Texture rows matching the visible part of the span.
    pub fn tex_rect(&self) -> TexRect {
        let h = self.projected_height();
        let v = |row: f32| ((row - self.top) / h).clamp(0.0, 1.0);
        TexRect {
            u: self.tex_u,
            v_top: v(self.y_start as f32),
            v_bottom: v(self.y_end as f32 + 1.0),
        }
    }

    /// Same wall, restricted to `y_start..=y_end` (intersected with what is
    /// already visible).
    pub fn clipped(&self, y_start: usize, y_end: usize) -> Option<WallSpan> {
        let y_start = y_start.max(self.y_start);
        let y_end = y_end.min(self.y_end);
        (y_start <= y_end).then_some(WallSpan {
            y_start,
            y_end,
            ..*self
        })
    }

    /// Walls only occlude sprites when their visible part reaches the
    /// horizon row or below.
    #[inline]
    pub fn reaches_horizon(&self, camera: &Camera) -> bool {
        self.y_end as f32 >= camera.horizon().floor()
    }

    pub fn to_intent(&self) -> DrawIntent {
        DrawIntent::TexturedSpan {
            column: self.column,
            y_start: self.y_start,
            y_end: self.y_end,
            texture: self.texture,
            rect: self.tex_rect(),
        }
    }
}

/// Rows whose centers fall in `[top, bottom)`, clipped to the screen.
pub fn visible_rows(top: f32, bottom: f32, screen_h: usize) -> Option<(usize, usize)> {
    if screen_h == 0 || !(bottom > top) {
        return None;
    }
    let first = (top - 0.5).ceil().max(0.0);
    let last = ((bottom - 0.5).ceil() - 1.0).min(screen_h as f32 - 1.0);
    (first <= last).then(|| (first as usize, last as usize))
}

/// Projects a hit to a vertical span. `None` when it lands entirely off
/// screen or the distance is not positive and finite.
pub fn project_wall(hit: &RayHit, camera: &Camera, tile: f32, column: usize) -> Option<WallSpan> {
    let distance = hit.correct_distance;
    if !distance.is_finite() || distance <= 0.0 {
        return None;
    }
    let top = camera.project_y((hit.level + 1) as f32 * tile, distance);
    let bottom = camera.project_y(hit.level as f32 * tile, distance);
    let (y_start, y_end) = visible_rows(top, bottom, camera.height)?;

    let dark = hit.face == Face::Horizontal;
    let material = hit.material();
    let texture = match material {
        Material::DoorVertical(m) | Material::DoorHorizontal(m) => TextureRef::Door { material: m, dark },
        _ => TextureRef::Wall {
            material: material.texture_id(),
            dark,
        },
    };

    Some(WallSpan {
        column,
        top,
        bottom,
        y_start,
        y_end,
        distance,
        texture,
        tex_u: hit.tex_u,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PlayerPose;

    const T: f32 = 64.0;

    fn hit_at(distance: f32, level: usize) -> RayHit {
        RayHit {
            hit: [0.0, 0.0],
            ray_angle: 0.0,
            correct_distance: distance,
            straight_distance: distance,
            wall_x: 1,
            wall_y: 1,
            level,
            code: 7,
            tex_u: 0.25,
            face: Face::Horizontal,
            back_face: false,
            transparent: false,
            open: false,
        }
    }

    fn camera() -> Camera {
        Camera::new(PlayerPose::new(0.0, 0.0, 0.0), T / 2.0, 320, 200, 90.0)
    }

    #[test]
    fn height_is_view_over_distance_times_tile() {
        let cam = camera();
        let span = project_wall(&hit_at(320.0, 0), &cam, T, 10).unwrap();
        // view_dist is 160 at 90 degrees over 320 columns.
        assert!((span.projected_height() - 32.0).abs() < 1e-4);
        assert!((span.top - 84.0).abs() < 1e-3);
        assert!((span.bottom - 116.0).abs() < 1e-3);
        assert_eq!((span.y_start, span.y_end), (84, 115));
        assert_eq!(span.texture, TextureRef::Wall { material: 7, dark: true });
        assert!(span.reaches_horizon(&cam));
    }

    #[test]
    fn close_wall_is_clipped_with_matching_texture_rows() {
        let cam = camera();
        // 400 px tall, centered on row 100: visible rows cover v 0.25..0.75.
        let span = project_wall(&hit_at(25.6, 0), &cam, T, 0).unwrap();
        assert_eq!((span.y_start, span.y_end), (0, 199));
        let rect = span.tex_rect();
        assert!((rect.v_top - 0.25).abs() < 1e-4);
        assert!((rect.v_bottom - 0.75).abs() < 1e-4);
        assert_eq!(rect.u, 0.25);
    }

    #[test]
    fn upper_level_stays_above_horizon() {
        let cam = camera();
        let span = project_wall(&hit_at(320.0, 1), &cam, T, 0).unwrap();
        assert!((span.bottom - 84.0).abs() < 1e-3);
        assert!(!span.reaches_horizon(&cam));
    }

    #[test]
    fn clipping_narrows_rect() {
        let cam = camera();
        let span = project_wall(&hit_at(320.0, 0), &cam, T, 0).unwrap();
        let lower = span.clipped(100, 500).unwrap();
        assert_eq!((lower.y_start, lower.y_end), (100, 115));
        assert!((lower.tex_rect().v_top - 0.5).abs() < 1e-4);
        assert!(span.clipped(0, 50).is_none());
    }

    #[test]
    fn offscreen_wall_is_dropped() {
        let mut cam = camera();
        cam.pose.pitch = 400.0;
        assert!(project_wall(&hit_at(320.0, 0), &cam, T, 0).is_none());
        assert!(project_wall(&hit_at(f32::INFINITY, 0), &camera(), T, 0).is_none());
    }

    #[test]
    fn zero_distance_hit_is_skipped() {
        let cam = camera();
        assert!(project_wall(&hit_at(0.0, 0), &cam, T, 0).is_none());
        assert!(project_wall(&hit_at(-3.0, 0), &cam, T, 0).is_none());
    }

    #[test]
    fn very_near_walls_keep_growing() {
        let cam = camera();
        let near = project_wall(&hit_at(0.02, 0), &cam, T, 0).unwrap();
        let less_near = project_wall(&hit_at(0.09, 0), &cam, T, 0).unwrap();
        assert!(near.projected_height() > less_near.projected_height());
        assert_eq!((near.y_start, near.y_end), (0, 199));
    }
}
