use std::collections::HashMap;

use crate::error::WorldError;
use crate::shape::WallShape;

/// First code of the vertical-axis door range.
pub const DOOR_VERTICAL_MIN: i32 = 1000;
/// Last code of the vertical-axis door range; anything above is a horizontal door.
pub const DOOR_VERTICAL_MAX: i32 = 1500;

/// What an occupancy code means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Material {
    Empty,
    Wall(u16),
    /// Blocks rays crossing vertical (x) grid lines.
    DoorVertical(u16),
    /// Blocks rays crossing horizontal (y) grid lines.
    DoorHorizontal(u16),
}

impl Material {
    pub fn from_code(code: i32) -> Self {
        match code {
            c if c <= 0 => Material::Empty,
            c if c < DOOR_VERTICAL_MIN => Material::Wall(c as u16),
            c if c <= DOOR_VERTICAL_MAX => Material::DoorVertical((c - DOOR_VERTICAL_MIN) as u16),
            c => Material::DoorHorizontal((c - DOOR_VERTICAL_MAX).min(u16::MAX as i32) as u16),
        }
    }

    #[inline]
    pub fn is_door(self) -> bool {
        matches!(self, Material::DoorVertical(_) | Material::DoorHorizontal(_))
    }

    /// Texture id inside the material's family.
    pub fn texture_id(self) -> u16 {
        match self {
            Material::Empty => 0,
            Material::Wall(m) | Material::DoorVertical(m) | Material::DoorHorizontal(m) => m,
        }
    }
}

/// Rise direction of a ramp cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SlopeDir {
    #[default]
    None,
    RisePosX,
    RiseNegX,
    RisePosY,
    RiseNegY,
}

impl SlopeDir {
    /// Map-file glyph: `.` flat, `>` rises toward +X, `<` toward -X,
    /// `v` toward +Y, `^` toward -Y.
    pub fn from_char(c: char) -> Result<Self, WorldError> {
        match c {
            '.' | ' ' => Ok(SlopeDir::None),
            '>' => Ok(SlopeDir::RisePosX),
            '<' => Ok(SlopeDir::RiseNegX),
            'v' => Ok(SlopeDir::RisePosY),
            '^' => Ok(SlopeDir::RiseNegY),
            other => Err(WorldError::UnknownSlope(other)),
        }
    }
}

/// How the top of a wall is filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceStyle {
    /// Textured top; `0` uses the wall's own material.
    Texture(u16),
    /// Flat fill with a palette entry.
    Palette(usize),
}

impl SurfaceStyle {
    pub fn from_code(code: i32) -> Self {
        if code < 0 {
            SurfaceStyle::Palette((-code - 1) as usize)
        } else {
            SurfaceStyle::Texture(code.min(u16::MAX as i32) as u16)
        }
    }
}

/// Billboard object placed in the world.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub x: f32,
    pub y: f32,
    /// World height of the billboard.
    pub size: f32,
    pub level: usize,
    pub kind: u16,
    pub despawn: bool,
}

/// Multi-level tile grid plus the state the renderer reads from it.
pub struct GridWorld {
    width: usize,
    height: usize,
    tile: f32,
    // cells[level][y * width + x]
    cells: Vec<Vec<i32>>,
    surface: Vec<Vec<i32>>,
    slopes: Vec<SlopeDir>,
    doors: HashMap<usize, bool>,
    // Footprints that replace the full-cell box of a ground wall.
    shapes: HashMap<usize, WallShape>,
    sprites: Vec<Sprite>,
}

impl GridWorld {
    /// Empty world with `levels` layers of `width` x `height` cells.
    pub fn new(width: usize, height: usize, levels: usize, tile: f32) -> Result<Self, WorldError> {
        if width == 0 || height == 0 || levels == 0 {
            return Err(WorldError::EmptyGrid);
        }
        if !(tile > 0.0) {
            return Err(WorldError::TileSize(tile));
        }
        Ok(Self {
            width,
            height,
            tile,
            cells: vec![vec![0; width * height]; levels],
            surface: vec![vec![0; width * height]; levels],
            slopes: vec![SlopeDir::None; width * height],
            doors: HashMap::new(),
            shapes: HashMap::new(),
            sprites: Vec::new(),
        })
    }

    /// Builds a world from `levels[level][row][col]` codes.
    pub fn from_levels(tile: f32, levels: &[Vec<Vec<i32>>]) -> Result<Self, WorldError> {
        let height = levels.first().map_or(0, |l| l.len());
        let width = levels
            .first()
            .and_then(|l| l.first())
            .map_or(0, |r| r.len());
        let mut world = Self::new(width, height, levels.len(), tile)?;

        for (li, level) in levels.iter().enumerate() {
            if level.len() != height {
                return Err(WorldError::LayerShape {
                    layer: "level",
                    found_w: level.first().map_or(0, |r| r.len()),
                    found_h: level.len(),
                    expected_w: width,
                    expected_h: height,
                });
            }
            for (y, row) in level.iter().enumerate() {
                if row.len() != width {
                    return Err(WorldError::Ragged {
                        level: li,
                        row: y,
                        found: row.len(),
                        expected: width,
                    });
                }
                world.cells[li][y * width..(y + 1) * width].copy_from_slice(row);
            }
        }
        world.reset_doors();
        Ok(world)
    }

    /// Replaces the surface-style layer of one level.
    pub fn set_surface_layer(&mut self, level: usize, rows: &[Vec<i32>]) -> Result<(), WorldError> {
        self.check_layer_shape("surface", rows)?;
        if let Some(layer) = self.surface.get_mut(level) {
            for (y, row) in rows.iter().enumerate() {
                layer[y * self.width..(y + 1) * self.width].copy_from_slice(row);
            }
        }
        Ok(())
    }

    pub fn set_slope_layer(&mut self, rows: &[Vec<SlopeDir>]) -> Result<(), WorldError> {
        self.check_layer_shape("slope", rows)?;
        for (y, row) in rows.iter().enumerate() {
            self.slopes[y * self.width..(y + 1) * self.width].copy_from_slice(row);
        }
        Ok(())
    }

    fn check_layer_shape<T>(&self, layer: &'static str, rows: &[Vec<T>]) -> Result<(), WorldError> {
        let bad_row = rows.iter().any(|r| r.len() != self.width);
        if rows.len() != self.height || bad_row {
            return Err(WorldError::LayerShape {
                layer,
                found_w: rows.first().map_or(0, |r| r.len()),
                found_h: rows.len(),
                expected_w: self.width,
                expected_h: self.height,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn levels(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.tile
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y).then(|| y as usize * self.width + x as usize)
    }

    /// Occupancy code, `0` for anything off the map.
    #[inline]
    pub fn cell_at(&self, x: i32, y: i32, level: usize) -> i32 {
        match (self.index(x, y), self.cells.get(level)) {
            (Some(i), Some(layer)) => layer[i],
            _ => 0,
        }
    }

    pub fn set_cell(&mut self, x: i32, y: i32, level: usize, code: i32) {
        if let (Some(i), Some(layer)) = (self.index(x, y), self.cells.get_mut(level)) {
            layer[i] = code;
            if Material::from_code(code).is_door() {
                self.doors.entry(i).or_insert(false);
            }
        }
    }

    #[inline]
    pub fn material_at(&self, x: i32, y: i32, level: usize) -> Material {
        Material::from_code(self.cell_at(x, y, level))
    }

    pub fn surface_at(&self, x: i32, y: i32, level: usize) -> SurfaceStyle {
        let code = match (self.index(x, y), self.surface.get(level)) {
            (Some(i), Some(layer)) => layer[i],
            _ => 0,
        };
        SurfaceStyle::from_code(code)
    }

    pub fn slope_at(&self, x: i32, y: i32) -> SlopeDir {
        self.index(x, y).map_or(SlopeDir::None, |i| self.slopes[i])
    }

    pub fn set_slope(&mut self, x: i32, y: i32, dir: SlopeDir) {
        if let Some(i) = self.index(x, y) {
            self.slopes[i] = dir;
        }
    }

    /// Cell containing a world position.
    #[inline]
    pub fn cell_of(&self, wx: f32, wy: f32) -> (i32, i32) {
        (
            (wx / self.tile).floor() as i32,
            (wy / self.tile).floor() as i32,
        )
    }

    /// Ground height at a world position: a linear ramp inside slope cells,
    /// `0` elsewhere. A point on a shared cell edge takes the higher of the
    /// two cells, so a ramp reaches full height on its own high edge.
    pub fn height_at(&self, wx: f32, wy: f32) -> f32 {
        let (cx, cy) = self.cell_of(wx, wy);
        let mut h = self.ramp_height(cx, cy, wx, wy);
        let on_x_edge = (wx / self.tile).fract() == 0.0;
        let on_y_edge = (wy / self.tile).fract() == 0.0;
        if on_x_edge {
            h = h.max(self.ramp_height(cx - 1, cy, wx, wy));
        }
        if on_y_edge {
            h = h.max(self.ramp_height(cx, cy - 1, wx, wy));
        }
        h
    }

    fn ramp_height(&self, cx: i32, cy: i32, wx: f32, wy: f32) -> f32 {
        let fx = (wx / self.tile - cx as f32).clamp(0.0, 1.0);
        let fy = (wy / self.tile - cy as f32).clamp(0.0, 1.0);
        let t = match self.slope_at(cx, cy) {
            SlopeDir::None => return 0.0,
            SlopeDir::RisePosX => fx,
            SlopeDir::RiseNegX => 1.0 - fx,
            SlopeDir::RisePosY => fy,
            SlopeDir::RiseNegY => 1.0 - fy,
        };
        t * self.tile
    }

    pub fn door_open(&self, x: i32, y: i32) -> bool {
        self.index(x, y)
            .and_then(|i| self.doors.get(&i).copied())
            .unwrap_or(false)
    }

    /// Flips a door and returns its new state, or `None` if no level of the
    /// cell holds a door.
    pub fn toggle_door(&mut self, x: i32, y: i32) -> Option<bool> {
        let i = self.index(x, y)?;
        let state = self.doors.get_mut(&i)?;
        *state = !*state;
        tracing::debug!(x, y, open = *state, "door toggled");
        Some(*state)
    }

    pub fn set_door(&mut self, x: i32, y: i32, open: bool) {
        if let Some(i) = self.index(x, y) {
            if let Some(state) = self.doors.get_mut(&i) {
                *state = open;
            }
        }
    }

    fn reset_doors(&mut self) {
        self.doors.clear();
        for layer in &self.cells {
            for (i, &code) in layer.iter().enumerate() {
                if Material::from_code(code).is_door() {
                    self.doors.insert(i, false);
                }
            }
        }
    }

    /// Ground-level walkability. Off-map is never passable.
    pub fn is_passable(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        match self.material_at(x, y, 0) {
            Material::Empty => true,
            Material::Wall(_) => false,
            Material::DoorVertical(_) | Material::DoorHorizontal(_) => self.door_open(x, y),
        }
    }

    /// Collision footprint of a ground-level cell. Walls and closed doors
    /// fill the whole cell unless a wall has its own shape.
    pub fn shape_at(&self, x: i32, y: i32) -> Option<WallShape> {
        let t = self.tile;
        let (x0, y0) = (x as f32 * t, y as f32 * t);
        let full = WallShape::rectangle([x0, y0], [x0 + t, y0 + t]);
        match self.material_at(x, y, 0) {
            Material::Empty => None,
            Material::Wall(_) => Some(
                self.index(x, y)
                    .and_then(|i| self.shapes.get(&i).cloned())
                    .unwrap_or(full),
            ),
            _ if self.door_open(x, y) => None,
            Material::DoorVertical(_) | Material::DoorHorizontal(_) => Some(full),
        }
    }

    /// Gives a ground wall cell a custom footprint in world units. Only
    /// collision reads it; the cell still renders as a full block.
    pub fn set_shape(&mut self, x: i32, y: i32, shape: WallShape) {
        if let Some(i) = self.index(x, y) {
            self.shapes.insert(i, shape);
        }
    }

    /// True when a body of `radius` centered at (wx, wy) would overlap a
    /// solid footprint. Off-map counts as solid.
    pub fn blocks_movement(&self, wx: f32, wy: f32, radius: f32) -> bool {
        const SAMPLES: usize = 8;
        let solid = |px: f32, py: f32| {
            let (cx, cy) = self.cell_of(px, py);
            if !self.in_bounds(cx, cy) {
                return true;
            }
            self.shape_at(cx, cy)
                .is_some_and(|shape| shape.contains([px, py]))
        };
        if solid(wx, wy) {
            return true;
        }
        (0..SAMPLES).any(|k| {
            let a = k as f32 * std::f32::consts::TAU / SAMPLES as f32;
            solid(wx + radius * a.cos(), wy + radius * a.sin())
        })
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn sprites_mut(&mut self) -> &mut Vec<Sprite> {
        &mut self.sprites
    }

    pub fn add_sprite(&mut self, sprite: Sprite) {
        self.sprites.push(sprite);
    }

    /// Drops sprites flagged for despawn. Returns how many were removed.
    pub fn cleanup_sprites(&mut self) -> usize {
        let before = self.sprites.len();
        self.sprites.retain(|s| !s.despawn);
        before - self.sprites.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeKind;

    const T: f32 = 64.0;

    fn world_with_door() -> GridWorld {
        let level = vec![
            vec![1, 1, 1, 1],
            vec![1, 0, 1001, 1],
            vec![1, 1, 1, 1],
        ];
        GridWorld::from_levels(T, &[level]).unwrap()
    }

    #[test]
    fn off_map_reads_empty() {
        let w = world_with_door();
        assert_eq!(w.cell_at(-1, 0, 0), 0);
        assert_eq!(w.cell_at(4, 0, 0), 0);
        assert_eq!(w.cell_at(0, 0, 3), 0);
        assert_eq!(w.cell_at(0, 0, 0), 1);
        assert!(!w.is_passable(-1, 1));
    }

    #[test]
    fn material_ranges() {
        assert_eq!(Material::from_code(0), Material::Empty);
        assert_eq!(Material::from_code(999), Material::Wall(999));
        assert_eq!(Material::from_code(1000), Material::DoorVertical(0));
        assert_eq!(Material::from_code(1500), Material::DoorVertical(500));
        assert_eq!(Material::from_code(1501), Material::DoorHorizontal(1));
    }

    #[test]
    fn open_door_keeps_code() {
        let mut w = world_with_door();
        assert!(!w.is_passable(2, 1));
        assert_eq!(w.toggle_door(2, 1), Some(true));
        assert!(w.is_passable(2, 1));
        assert_eq!(w.cell_at(2, 1, 0), 1001);
        assert_eq!(w.toggle_door(1, 1), None);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let level = vec![vec![1, 1], vec![1]];
        let err = GridWorld::from_levels(T, &[level]).err();
        assert!(matches!(err, Some(WorldError::Ragged { row: 1, .. })));
    }

    #[test]
    fn slope_height_is_linear() {
        let mut w = GridWorld::new(3, 3, 1, T).unwrap();
        w.set_slope(1, 1, SlopeDir::RiseNegY);
        assert_eq!(w.height_at(T * 1.5, T * 1.0), T);
        assert_eq!(w.height_at(T * 1.5, T * 1.75), T * 0.25);
        assert_eq!(w.height_at(T * 0.5, T * 0.5), 0.0);
        assert!(!w.blocks_movement(T * 1.5, T * 1.5, 4.0));
    }

    #[test]
    fn ramp_reaches_full_height_on_its_high_edge() {
        let mut w = GridWorld::new(4, 3, 1, T).unwrap();
        w.set_slope(1, 1, SlopeDir::RisePosX);
        let y = 1.5 * T;
        assert_eq!(w.height_at(1.0 * T, y), 0.0);
        assert_eq!(w.height_at(1.5 * T, y), T / 2.0);
        assert_eq!(w.height_at(2.0 * T, y), T);
        assert_eq!(w.height_at(2.5 * T, y), 0.0);
    }

    #[test]
    fn closed_door_fills_its_cell() {
        let mut w = world_with_door();
        let door_center = [2.5 * T, 1.5 * T];
        assert!(w.blocks_movement(door_center[0], door_center[1], 0.0));
        assert!(w.blocks_movement(2.05 * T, 1.5 * T, 0.0));
        assert!(w.blocks_movement(2.95 * T, 1.2 * T, 0.0));
        // A body touching the door from the open cell is stopped.
        assert!(w.blocks_movement(1.9 * T, 1.5 * T, 0.2 * T));
        w.toggle_door(2, 1);
        assert!(!w.blocks_movement(door_center[0], door_center[1], 0.0));
        assert!(!w.blocks_movement(2.05 * T, 1.5 * T, 0.0));
    }

    #[test]
    fn wall_shape_override_narrows_collision() {
        let mut w = GridWorld::from_levels(T, &[vec![vec![0, 1, 0]]]).unwrap();
        assert!(w.blocks_movement(1.9 * T, 0.9 * T, 0.0));
        // Lower-left half of the cell only.
        w.set_shape(1, 0, WallShape::triangle([T, 0.0], [T, T], [2.0 * T, T]));
        assert_eq!(w.shape_at(1, 0).map(|s| s.kind), Some(ShapeKind::Triangle));
        assert!(w.blocks_movement(1.1 * T, 0.9 * T, 0.0));
        assert!(!w.blocks_movement(1.9 * T, 0.1 * T, 0.0));
        // Rendering still sees a wall.
        assert_eq!(w.cell_at(1, 0, 0), 1);
    }

    #[test]
    fn cleanup_removes_despawned() {
        let mut w = world_with_door();
        for despawn in [false, true, false] {
            w.add_sprite(Sprite {
                x: 96.0,
                y: 96.0,
                size: 32.0,
                level: 0,
                kind: 0,
                despawn,
            });
        }
        assert_eq!(w.cleanup_sprites(), 1);
        assert_eq!(w.sprites().len(), 2);
    }
}
