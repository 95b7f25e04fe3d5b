//! Horizontal surfaces: wall tops scanned row by row, ramps marched column
//! by column.
//!
//! A flat top at constant height maps every screen row to a single
//! perpendicular distance, so tops are scanned like a floor. The per-column
//! straight distance is that row distance divided by the cosine of the
//! column's angle off the heading; skipping that correction bends the edges
//! of a flat top upward.
//!
//! Ramps have no constant height, so each column's ray is marched outward
//! instead. The lowest row still free (`ybuffer`) starts at the ground row
//! of the first sample, never at the bottom of the screen.

use crate::camera::Camera;
use crate::compositor::{DepthBuffer, Occluder};
use crate::draw::{DrawIntent, TextureRef};
use crate::projector::visible_rows;
use crate::world::{GridWorld, Material, SlopeDir, SurfaceStyle};

/// What one top-surface pixel shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopFill {
    Color(u32),
    Texture(u16),
}

/// Marching settings for ramps.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SlopeMarch {
    /// Straight-line step along the ray, world units.
    pub step: f32,
    /// Give up past this straight-line distance.
    pub max_distance: f32,
    /// Base ramp color before per-orientation shading.
    pub color: u32,
}

// Per-column ray data, computed once per scan.
struct ColumnRays {
    dir: Vec<[f32; 2]>,
    cos_rel: Vec<f32>,
}

impl ColumnRays {
    fn new(camera: &Camera) -> Self {
        let mut dir = Vec::with_capacity(camera.width);
        let mut cos_rel = Vec::with_capacity(camera.width);
        for c in 0..camera.width {
            let a = camera.ray_angle(c);
            dir.push([a.cos(), a.sin()]);
            cos_rel.push(camera.column_offset_angle(c).cos());
        }
        Self { dir, cos_rel }
    }
}

pub struct SurfaceScanner<'a> {
    world: &'a GridWorld,
    camera: &'a Camera,
    palette: &'a [u32],
    rays: ColumnRays,
}

impl<'a> SurfaceScanner<'a> {
    pub fn new(world: &'a GridWorld, camera: &'a Camera, palette: &'a [u32]) -> Self {
        Self {
            world,
            camera,
            palette,
            rays: ColumnRays::new(camera),
        }
    }

    /// Perpendicular distance at which a row meets the top of `level`.
    /// `None` above the horizon or when the eye is not above the top.
    pub fn row_distance(&self, level: usize, row: usize) -> Option<f32> {
        let top = (level + 1) as f32 * self.world.tile_size();
        let rise = self.camera.eye_z() - top;
        let below = row as f32 + 0.5 - self.camera.horizon();
        (rise > 0.0 && below > 0.0).then(|| rise * self.camera.view_dist / below)
    }

    /// World point (world units) where `column` meets the plane at the
    /// given perpendicular distance.
    fn ground_point(&self, column: usize, perp: f32) -> [f32; 2] {
        let straight = perp / self.rays.cos_rel[column];
        let d = self.rays.dir[column];
        [
            self.camera.pose.x + d[0] * straight,
            self.camera.pose.y + d[1] * straight,
        ]
    }

    /// Occupancy test for one pixel of the top of `level`. Returns the fill
    /// and the world point under the pixel center.
    pub fn top_pixel(&self, depth: &DepthBuffer, level: usize, row: usize, column: usize) -> Option<(TopFill, [f32; 2])> {
        if column >= self.camera.width {
            return None;
        }
        let perp = self.row_distance(level, row)?;
        let p = self.ground_point(column, perp);
        let (cx, cy) = self.world.cell_of(p[0], p[1]);
        let Material::Wall(material) = self.world.material_at(cx, cy, level) else {
            return None;
        };
        if self.world.cell_at(cx, cy, level + 1) != 0 {
            return None;
        }
        if depth.is_covered(column, row, perp) {
            return None;
        }
        let fill = match self.world.surface_at(cx, cy, level) {
            // Code 0 takes the wall's own material.
            SurfaceStyle::Texture(0) => TopFill::Texture(material),
            SurfaceStyle::Texture(id) => TopFill::Texture(id),
            SurfaceStyle::Palette(i) => TopFill::Color(*self.palette.get(i)?),
        };
        Some((fill, p))
    }

    /// Scans one row of one level's tops and emits one intent per run of
    /// adjacent pixels sharing a fill. Returns how many were emitted.
    pub fn scan_row(&self, depth: &DepthBuffer, level: usize, row: usize, out: &mut Vec<DrawIntent>) -> usize {
        let tile = self.world.tile_size();
        let mut emitted = 0;
        let mut run: Option<Run> = None;

        for column in 0..self.camera.width {
            let pixel = self.top_pixel(depth, level, row, column);
            if let (Some(r), Some((fill, p))) = (run.as_mut(), pixel) {
                if r.fill == fill {
                    r.x_end = column;
                    r.world_end = p;
                    continue;
                }
            }
            if let Some(done) = run.take() {
                out.push(done.into_intent(row, tile));
                emitted += 1;
            }
            run = pixel.map(|(fill, p)| Run {
                fill,
                x_start: column,
                x_end: column,
                world_start: p,
                world_end: p,
            });
        }
        if let Some(done) = run {
            out.push(done.into_intent(row, tile));
            emitted += 1;
        }
        emitted
    }

    /// Every visible wall top, lowest level first.
    pub fn draw_flat_tops(&self, depth: &DepthBuffer, out: &mut Vec<DrawIntent>) -> usize {
        let first_row = self.camera.horizon().floor().max(0.0) as usize;
        let mut spans = 0;
        for level in 0..self.world.levels() {
            let top = (level + 1) as f32 * self.world.tile_size();
            if self.camera.eye_z() <= top {
                break;
            }
            for row in first_row..self.camera.height {
                spans += self.scan_row(depth, level, row, out);
            }
        }
        spans
    }

    /// Column-marching pass for ramp cells. Drawn runs are recorded as
    /// occluders so later flat tops do not paint over nearer ramps.
    pub fn draw_slopes(&self, march: &SlopeMarch, depth: &mut DepthBuffer, out: &mut Vec<DrawIntent>) -> usize {
        if !(march.step > 0.0) {
            return 0;
        }
        let mut fills = 0;
        for column in 0..self.camera.width {
            fills += self.march_column(column, march, depth, out);
        }
        fills
    }

    fn march_column(&self, column: usize, march: &SlopeMarch, depth: &mut DepthBuffer, out: &mut Vec<DrawIntent>) -> usize {
        let cos_rel = self.rays.cos_rel[column];
        let d = self.rays.dir[column];
        let (px, py) = (self.camera.pose.x, self.camera.pose.y);
        let mut ybuffer: Option<f32> = None;
        let mut fills = 0;

        let mut s = march.step;
        while s <= march.max_distance {
            let perp = s * cos_rel;
            let p = [px + d[0] * s, py + d[1] * s];
            let (cx, cy) = self.world.cell_of(p[0], p[1]);
            if !self.world.in_bounds(cx, cy) {
                break;
            }
            s += march.step;

            let ground = self.camera.project_y(0.0, perp);
            let limit = *ybuffer.get_or_insert(ground);
            let dir = self.world.slope_at(cx, cy);
            if dir == SlopeDir::None {
                continue;
            }
            let h = self.world.height_at(p[0], p[1]);
            if h <= 0.0 {
                continue;
            }
            let top = self.camera.project_y(h, perp);
            let end = limit.min(ground);
            if let Some((y0, y1)) = visible_rows(top, end, self.camera.height) {
                let color = match self.world.surface_at(cx, cy, 0) {
                    SurfaceStyle::Palette(i) => self.palette.get(i).copied(),
                    SurfaceStyle::Texture(_) => Some(shade(march.color, slope_shade(dir))),
                };
                if let Some(color) = color {
                    for (a, b) in depth.uncovered_runs(column, y0, y1, perp) {
                        out.push(DrawIntent::ColumnFill {
                            column,
                            y_start: a,
                            y_end: b,
                            color,
                        });
                        depth.add_occluder(
                            column,
                            Occluder {
                                y_start: a,
                                y_end: b,
                                distance: perp,
                            },
                        );
                        fills += 1;
                    }
                }
            }
            ybuffer = Some(limit.min(top));
        }
        fills
    }
}

struct Run {
    fill: TopFill,
    x_start: usize,
    x_end: usize,
    world_start: [f32; 2],
    world_end: [f32; 2],
}

impl Run {
    fn into_intent(self, y: usize, tile: f32) -> DrawIntent {
        match self.fill {
            TopFill::Color(color) => DrawIntent::ColorSpan {
                x_start: self.x_start,
                x_end: self.x_end,
                y,
                color,
            },
            TopFill::Texture(id) => DrawIntent::TexturedRow {
                x_start: self.x_start,
                x_end: self.x_end,
                y,
                texture: TextureRef::Top(id),
                world_start: [self.world_start[0] / tile, self.world_start[1] / tile],
                world_end: [self.world_end[0] / tile, self.world_end[1] / tile],
            },
        }
    }
}

fn slope_shade(dir: SlopeDir) -> f32 {
    match dir {
        SlopeDir::None => 1.0,
        SlopeDir::RisePosX => 1.0,
        SlopeDir::RiseNegX => 0.7,
        SlopeDir::RisePosY => 0.85,
        SlopeDir::RiseNegY => 0.6,
    }
}

fn shade(color: u32, f: f32) -> u32 {
    let ch = |shift: u32| ((((color >> shift) & 0xFF) as f32 * f).clamp(0.0, 255.0) as u32) << shift;
    ch(16) | ch(8) | ch(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PlayerPose;
    use crate::draw::pack_rgb;

    const T: f32 = 64.0;

    fn plateau() -> GridWorld {
        // Cells with x >= 5 are solid: a flat top across the whole view.
        let rows: Vec<Vec<i32>> = (0..40)
            .map(|_| (0..40).map(|x| if x >= 5 { 1 } else { 0 }).collect())
            .collect();
        GridWorld::from_levels(T, &[rows]).unwrap()
    }

    fn high_camera() -> Camera {
        let mut cam = Camera::new(PlayerPose::new(2.0 * T, 20.5 * T, 0.0), T / 2.0, 160, 120, 60.0);
        cam.pose.z = T; // eye at 96
        cam
    }

    #[test]
    fn row_distance_matches_formula() {
        let world = plateau();
        let cam = high_camera();
        let palette = [pack_rgb(1, 2, 3)];
        let scanner = SurfaceScanner::new(&world, &cam, &palette);
        // Row 69's center sits 9.5 rows below the horizon at 60.
        let d = scanner.row_distance(0, 69).unwrap();
        assert!((d - 32.0 * cam.view_dist / 9.5).abs() < 1e-3);
        assert!(scanner.row_distance(0, 10).is_none());
    }

    #[test]
    fn no_tops_when_eye_is_below_them() {
        let world = plateau();
        let cam = Camera::new(PlayerPose::new(2.0 * T, 20.5 * T, 0.0), T / 2.0, 160, 120, 60.0);
        let scanner = SurfaceScanner::new(&world, &cam, &[]);
        let depth = DepthBuffer::new(160);
        let mut out = Vec::new();
        assert_eq!(scanner.draw_flat_tops(&depth, &mut out), 0);
    }

    #[test]
    fn flat_top_has_a_straight_near_edge() {
        let world = plateau();
        let cam = high_camera();
        let scanner = SurfaceScanner::new(&world, &cam, &[]);
        let depth = DepthBuffer::new(cam.width);
        // Lowest surface row in each column.
        let mut lowest = vec![None; cam.width];
        for row in 0..cam.height {
            for (column, slot) in lowest.iter_mut().enumerate() {
                if scanner.top_pixel(&depth, 0, row, column).is_some() {
                    *slot = Some(row);
                }
            }
        }
        let rows: Vec<usize> = lowest.into_iter().map(|r| r.unwrap()).collect();
        let min = *rows.iter().min().unwrap();
        let max = *rows.iter().max().unwrap();
        assert!(max - min <= 1, "edge rows range {min}..{max}");
    }

    #[test]
    fn palette_tops_batch_into_single_row_spans() {
        let mut world = plateau();
        let rows: Vec<Vec<i32>> = (0..40).map(|_| vec![-1; 40]).collect();
        world.set_surface_layer(0, &rows).unwrap();
        let cam = high_camera();
        let palette = [pack_rgb(200, 10, 10)];
        let scanner = SurfaceScanner::new(&world, &cam, &palette);
        let depth = DepthBuffer::new(cam.width);
        let mut out = Vec::new();
        assert_eq!(scanner.scan_row(&depth, 0, 62, &mut out), 1);
        assert_eq!(
            out[0],
            DrawIntent::ColorSpan {
                x_start: 0,
                x_end: 159,
                y: 62,
                color: palette[0]
            }
        );
    }

    #[test]
    fn missing_palette_entry_renders_nothing() {
        let mut world = plateau();
        let rows: Vec<Vec<i32>> = (0..40).map(|_| vec![-7; 40]).collect();
        world.set_surface_layer(0, &rows).unwrap();
        let cam = high_camera();
        let scanner = SurfaceScanner::new(&world, &cam, &[]);
        let depth = DepthBuffer::new(cam.width);
        let mut out = Vec::new();
        assert_eq!(scanner.scan_row(&depth, 0, 62, &mut out), 0);
    }

    #[test]
    fn nearer_occluder_hides_top_pixels() {
        let world = plateau();
        let cam = high_camera();
        let scanner = SurfaceScanner::new(&world, &cam, &[]);
        let mut depth = DepthBuffer::new(cam.width);
        depth.add_occluder(
            10,
            Occluder {
                y_start: 0,
                y_end: 119,
                distance: 1.0,
            },
        );
        assert!(scanner.top_pixel(&depth, 0, 62, 9).is_some());
        assert!(scanner.top_pixel(&depth, 0, 62, 10).is_none());
    }

    #[test]
    fn default_top_follows_the_wall_material() {
        let mut world = plateau();
        for y in 0..40 {
            world.set_cell(6, y, 0, 3);
        }
        let mut surface = vec![vec![0; 40]; 40];
        surface[20][7] = 9;
        world.set_surface_layer(0, &surface).unwrap();
        let cam = high_camera();
        let scanner = SurfaceScanner::new(&world, &cam, &[]);
        let depth = DepthBuffer::new(cam.width);
        let fill_at = |cell_x: f32| {
            // Row whose center lands inside the given cell straight ahead.
            (0..cam.height)
                .filter_map(|row| scanner.top_pixel(&depth, 0, row, 80))
                .find(|(_, p)| (p[0] / T).floor() == cell_x && (p[1] / T).floor() == 20.0)
                .map(|(fill, _)| fill)
        };
        assert_eq!(fill_at(5.0), Some(TopFill::Texture(1)));
        assert_eq!(fill_at(6.0), Some(TopFill::Texture(3)));
        assert_eq!(fill_at(7.0), Some(TopFill::Texture(9)));
    }

    fn ramp_world() -> GridWorld {
        let mut world = GridWorld::new(12, 12, 1, T).unwrap();
        for x in 4..8 {
            world.set_slope(x, 5, SlopeDir::RisePosX);
        }
        world
    }

    fn march() -> SlopeMarch {
        SlopeMarch {
            step: T / 8.0,
            max_distance: 12.0 * T,
            color: pack_rgb(120, 120, 120),
        }
    }

    #[test]
    fn ramp_fills_stay_above_the_ground_row() {
        let world = ramp_world();
        let cam = Camera::new(PlayerPose::new(2.0 * T, 5.5 * T, 0.0), T / 2.0, 160, 120, 60.0);
        let scanner = SurfaceScanner::new(&world, &cam, &[]);
        let mut depth = DepthBuffer::new(cam.width);
        let mut out = Vec::new();
        assert!(scanner.draw_slopes(&march(), &mut depth, &mut out) > 0);
        // Ramp starts two tiles ahead; nothing may reach below that ground row.
        let ground = cam.project_y(0.0, 2.0 * T);
        for intent in &out {
            match intent {
                DrawIntent::ColumnFill { y_end, .. } => assert!((*y_end as f32) < ground),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn ramp_fills_in_a_column_never_overlap() {
        let world = ramp_world();
        let cam = Camera::new(PlayerPose::new(2.0 * T, 5.5 * T, 0.0), T / 2.0, 160, 120, 60.0);
        let scanner = SurfaceScanner::new(&world, &cam, &[]);
        let mut depth = DepthBuffer::new(cam.width);
        let mut out = Vec::new();
        scanner.draw_slopes(&march(), &mut depth, &mut out);
        let mut covered = vec![vec![false; cam.height]; cam.width];
        for intent in &out {
            if let DrawIntent::ColumnFill { column, y_start, y_end, .. } = *intent {
                for y in y_start..=y_end {
                    assert!(!covered[column][y], "row {y} of column {column} drawn twice");
                    covered[column][y] = true;
                }
            }
        }
        // The ramp rises to a full tile above the eye: something is drawn
        // above the horizon in the center column.
        assert!(covered[80][..60].iter().any(|&c| c));
    }
}
