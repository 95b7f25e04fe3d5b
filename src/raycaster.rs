use crate::camera::Camera;
use crate::world::{GridWorld, Material};

/// Which kind of grid line a ray crossed to enter a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    /// Crossed a line of constant x.
    Vertical,
    /// Crossed a line of constant y. Drawn with the dark texture variant.
    Horizontal,
}

/// A cell entered by a [`GridRay`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellVisit {
    pub x: i32,
    pub y: i32,
    /// Straight-line distance from the origin to the entry point, in tiles.
    pub distance: f32,
    pub side: Face,
}

/// Grid-DDA walk: yields every cell the ray enters, nearest first, and stops
/// once it leaves the map.
pub struct GridRay {
    map_x: i32,
    map_y: i32,
    step_x: i32,
    step_y: i32,
    side_x: f32,
    side_y: f32,
    delta_x: f32,
    delta_y: f32,
    width: i32,
    height: i32,
    budget: usize,
}

impl GridRay {
    /// `origin` is in tile units; `dir` must be a unit vector.
    pub fn new(origin: [f32; 2], dir: [f32; 2], width: usize, height: usize) -> Self {
        let map_x = origin[0].floor() as i32;
        let map_y = origin[1].floor() as i32;

        // Axis-parallel rays never cross lines on the other axis.
        let delta_x = if dir[0] == 0.0 { f32::INFINITY } else { (1.0 / dir[0]).abs() };
        let delta_y = if dir[1] == 0.0 { f32::INFINITY } else { (1.0 / dir[1]).abs() };

        let (step_x, side_x) = axis_start(origin[0], map_x, dir[0], delta_x);
        let (step_y, side_y) = axis_start(origin[1], map_y, dir[1], delta_y);

        Self {
            map_x,
            map_y,
            step_x,
            step_y,
            side_x,
            side_y,
            delta_x,
            delta_y,
            width: width as i32,
            height: height as i32,
            budget: width + height + 2,
        }
    }

    #[inline]
    pub fn cell(&self) -> (i32, i32) {
        (self.map_x, self.map_y)
    }
}

fn axis_start(origin: f32, cell: i32, dir: f32, delta: f32) -> (i32, f32) {
    if delta.is_infinite() {
        return (0, f32::INFINITY);
    }
    if dir < 0.0 {
        (-1, (origin - cell as f32) * delta)
    } else {
        (1, (cell as f32 + 1.0 - origin) * delta)
    }
}

impl Iterator for GridRay {
    type Item = CellVisit;

    fn next(&mut self) -> Option<CellVisit> {
        if self.budget == 0 {
            return None;
        }
        let (distance, side) = if self.side_x < self.side_y {
            let d = self.side_x;
            self.side_x += self.delta_x;
            self.map_x += self.step_x;
            (d, Face::Vertical)
        } else if self.side_y < self.side_x {
            let d = self.side_y;
            self.side_y += self.delta_y;
            self.map_y += self.step_y;
            (d, Face::Horizontal)
        } else if self.side_x.is_finite() {
            // Exact corner: step both axes at once and report the diagonal
            // cell, as seen across its vertical edge.
            let d = self.side_x;
            self.side_x += self.delta_x;
            self.side_y += self.delta_y;
            self.map_x += self.step_x;
            self.map_y += self.step_y;
            (d, Face::Vertical)
        } else {
            self.budget = 0;
            return None;
        };

        if self.map_x < 0 || self.map_y < 0 || self.map_x >= self.width || self.map_y >= self.height {
            self.budget = 0;
            return None;
        }
        self.budget -= 1;
        Some(CellVisit {
            x: self.map_x,
            y: self.map_y,
            distance,
            side,
        })
    }
}

/// One wall or door crossing along a column's ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub hit: [f32; 2],
    pub ray_angle: f32,
    /// Distance along the view direction; what projection uses.
    pub correct_distance: f32,
    pub straight_distance: f32,
    pub wall_x: i32,
    pub wall_y: i32,
    pub level: usize,
    pub code: i32,
    pub tex_u: f32,
    pub face: Face,
    pub back_face: bool,
    /// Doors are drawn in the deferred pass.
    pub transparent: bool,
    pub open: bool,
}

impl RayHit {
    #[inline]
    pub fn material(&self) -> Material {
        Material::from_code(self.code)
    }
}

/// Casts the ray for one screen column and collects every hit on every
/// level. Order is traversal order, not draw order.
pub fn cast_column(world: &GridWorld, camera: &Camera, column: usize) -> Vec<RayHit> {
    let t = world.tile_size();
    let levels = world.levels();
    let eye = camera.eye_z();
    let ray_angle = camera.ray_angle(column);
    let cos_rel = camera.column_offset_angle(column).cos();
    let dir = [ray_angle.cos(), ray_angle.sin()];
    let origin = [camera.pose.x / t, camera.pose.y / t];

    // With one level and the eye below the wall tops, the first wall hides
    // everything behind it.
    let sees_over = eye > t || levels > 1;

    let ray = GridRay::new(origin, dir, world.width(), world.height());
    let mut prev_cell = ray.cell();
    let mut inside_wall = vec![false; levels];
    let mut hits = Vec::new();

    for visit in ray {
        let straight = visit.distance * t;
        let hit = [
            (origin[0] + dir[0] * visit.distance) * t,
            (origin[1] + dir[1] * visit.distance) * t,
        ];
        let along = match visit.side {
            Face::Vertical => (hit[1] / t).rem_euclid(1.0),
            Face::Horizontal => (hit[0] / t).rem_euclid(1.0),
        };
        let mirrored = match visit.side {
            Face::Vertical => dir[0] > 0.0,
            Face::Horizontal => dir[1] < 0.0,
        };
        let make = |wall_x: i32, wall_y: i32, level: usize, code: i32, back_face: bool| {
            let material = Material::from_code(code);
            let tex_u = if mirrored != back_face { 1.0 - along } else { along };
            RayHit {
                hit,
                ray_angle,
                correct_distance: straight * cos_rel,
                straight_distance: straight,
                wall_x,
                wall_y,
                level,
                code,
                tex_u,
                face: visit.side,
                back_face,
                transparent: material.is_door(),
                open: material.is_door() && world.door_open(wall_x, wall_y),
            }
        };

        for level in 0..levels {
            let code = world.cell_at(visit.x, visit.y, level);
            let material = Material::from_code(code);
            let is_wall = matches!(material, Material::Wall(_));

            match material {
                Material::DoorVertical(_) if visit.side == Face::Vertical => {
                    hits.push(make(visit.x, visit.y, level, code, false));
                }
                Material::DoorHorizontal(_) if visit.side == Face::Horizontal => {
                    hits.push(make(visit.x, visit.y, level, code, false));
                }
                _ => {}
            }

            if is_wall && !inside_wall[level] {
                hits.push(make(visit.x, visit.y, level, code, false));
                if level == 0 && !sees_over {
                    return hits;
                }
            } else if !is_wall && inside_wall[level] {
                let below = eye < level as f32 * t;
                let above = eye > (level + 1) as f32 * t;
                if below || above {
                    let (px, py) = prev_cell;
                    let prev_code = world.cell_at(px, py, level);
                    hits.push(make(px, py, level, prev_code, true));
                }
            }
            inside_wall[level] = is_wall;
        }
        prev_cell = (visit.x, visit.y);
    }
    hits
}
