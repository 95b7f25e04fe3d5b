//! TOML configuration and map files.
//!
//! ```toml
//! # render.toml
//! internal_height = 360
//! fov_deg = 90.0
//! palette = [[200, 60, 60], [60, 160, 60]]
//!
//! [controls]
//! move_speed = 3.0
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::draw::pack_rgb;
use crate::error::{ConfigError, WorldError};
use crate::shape::{ShapeKind, WallShape};
use crate::surface::SlopeMarch;
use crate::world::{GridWorld, SlopeDir, Sprite};

/// Renderer settings. Every field has a default, so an empty file is valid.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Internal framebuffer height; width follows the window aspect.
    pub internal_height: usize,
    /// Horizontal field of view in degrees.
    pub fov_deg: f32,
    /// Resting eye height as a fraction of the tile size.
    pub eye_height: f32,
    /// Extra angle, in degrees, past the view edge before sprites are culled.
    pub sprite_cull_margin_deg: f32,
    /// Ramp march step as a fraction of the tile size.
    pub slope_step: f32,
    /// Ramp march range in tiles.
    pub slope_range: f32,
    pub slope_color: [u8; 3],
    pub sky_color: [u8; 3],
    pub ground_color: [u8; 3],
    /// Flat colors for negative surface codes; `-1` is entry 0.
    pub palette: Vec<[u8; 3]>,
    pub controls: ControlConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            internal_height: 360,
            fov_deg: 90.0,
            eye_height: 0.5,
            sprite_cull_margin_deg: 6.0,
            slope_step: 0.125,
            slope_range: 24.0,
            slope_color: [150, 130, 100],
            sky_color: [30, 30, 70],
            ground_color: [40, 40, 40],
            palette: vec![[170, 60, 50], [60, 140, 70], [70, 90, 170], [190, 170, 80]],
            controls: ControlConfig::default(),
        }
    }
}

/// Movement tuning for the input side; the renderer never reads it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Tiles per second.
    pub move_speed: f32,
    /// Radians per second.
    pub turn_speed: f32,
    /// Screen rows per second.
    pub pitch_speed: f32,
    /// Initial upward speed of a jump, tiles per second.
    pub jump_speed: f32,
    /// Tiles per second squared.
    pub gravity: f32,
    /// Collision radius in tiles.
    pub radius: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            turn_speed: std::f32::consts::PI,
            pitch_speed: 240.0,
            jump_speed: 4.0,
            gravity: 9.0,
            radius: 0.2,
        }
    }
}

impl RenderConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(10.0..=170.0).contains(&self.fov_deg) {
            return Err(ConfigError::Invalid(format!(
                "fov_deg must be within 10..=170, got {}",
                self.fov_deg
            )));
        }
        if self.internal_height < 60 {
            return Err(ConfigError::Invalid(format!(
                "internal_height must be at least 60, got {}",
                self.internal_height
            )));
        }
        if !(self.slope_step > 0.0) || !(self.slope_range > 0.0) {
            return Err(ConfigError::Invalid(
                "slope_step and slope_range must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn palette_rgb(&self) -> Vec<u32> {
        self.palette.iter().map(|&[r, g, b]| pack_rgb(r, g, b)).collect()
    }

    pub fn slope_march(&self, tile: f32) -> SlopeMarch {
        let [r, g, b] = self.slope_color;
        SlopeMarch {
            step: self.slope_step * tile,
            max_distance: self.slope_range * tile,
            color: pack_rgb(r, g, b),
        }
    }

    #[inline]
    pub fn sprite_cull_margin(&self) -> f32 {
        self.sprite_cull_margin_deg.to_radians()
    }
}

/// A sprite entry in a map file, in tile coordinates.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SpriteDef {
    pub x: f32,
    pub y: f32,
    pub kind: u16,
    #[serde(default)]
    pub level: usize,
    /// Billboard height as a fraction of the tile size.
    #[serde(default = "default_sprite_size")]
    pub size: f32,
}

fn default_sprite_size() -> f32 {
    0.6
}

/// A custom collision footprint for one ground wall cell. Points are
/// fractions of the cell, `[0, 0]` being its top-left corner.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ShapeDef {
    pub x: i32,
    pub y: i32,
    pub kind: ShapeKind,
    pub points: Vec<[f32; 2]>,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct Spawn {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub angle_deg: f32,
}

fn default_tile_size() -> f32 {
    64.0
}

/// On-disk map: `levels[level][row][col]` codes plus optional layers.
///
/// `slopes` holds one string per row, one glyph per cell (see
/// [`SlopeDir::from_char`]).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MapFile {
    #[serde(default = "default_tile_size")]
    pub tile_size: f32,
    pub levels: Vec<Vec<Vec<i32>>>,
    #[serde(default)]
    pub surface: Vec<Vec<Vec<i32>>>,
    #[serde(default)]
    pub slopes: Vec<String>,
    #[serde(default)]
    pub sprites: Vec<SpriteDef>,
    #[serde(default)]
    pub shapes: Vec<ShapeDef>,
    pub spawn: Option<Spawn>,
}

impl MapFile {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Builds the world. Sprites on a level the map does not have are
    /// dropped with a warning.
    pub fn build(&self) -> Result<GridWorld, WorldError> {
        let mut world = GridWorld::from_levels(self.tile_size, &self.levels)?;

        for (level, rows) in self.surface.iter().enumerate() {
            if level >= world.levels() {
                tracing::warn!(level, "surface layer for a missing level ignored");
                continue;
            }
            world.set_surface_layer(level, rows)?;
        }

        if !self.slopes.is_empty() {
            let rows = self
                .slopes
                .iter()
                .map(|row| row.chars().map(SlopeDir::from_char).collect::<Result<Vec<_>, _>>())
                .collect::<Result<Vec<_>, _>>()?;
            world.set_slope_layer(&rows)?;
        }

        let t = self.tile_size;
        for def in &self.shapes {
            let points: Vec<[f32; 2]> = def
                .points
                .iter()
                .map(|&[u, v]| [(def.x as f32 + u) * t, (def.y as f32 + v) * t])
                .collect();
            let shape = WallShape::from_points(def.kind, &points).ok_or(WorldError::ShapePoints {
                x: def.x,
                y: def.y,
                kind: def.kind,
                expected: def.kind.point_count(),
                found: def.points.len(),
            })?;
            world.set_shape(def.x, def.y, shape);
        }

        for def in &self.sprites {
            if def.level >= world.levels() {
                tracing::warn!(kind = def.kind, level = def.level, "sprite on a missing level dropped");
                continue;
            }
            world.add_sprite(Sprite {
                x: def.x * t,
                y: def.y * t,
                size: def.size * t,
                level: def.level,
                kind: def.kind,
                despawn: false,
            });
        }

        tracing::debug!(
            width = world.width(),
            height = world.height(),
            levels = world.levels(),
            sprites = world.sprites().len(),
            "map loaded"
        );
        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_all_defaults() {
        let cfg = RenderConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, RenderConfig::default());
    }

    #[test]
    fn partial_config_overrides_fields() {
        let cfg = RenderConfig::from_toml_str("fov_deg = 70.0\n[controls]\nmove_speed = 5.0\n").unwrap();
        assert_eq!(cfg.fov_deg, 70.0);
        assert_eq!(cfg.controls.move_speed, 5.0);
        assert_eq!(cfg.controls.radius, ControlConfig::default().radius);
    }

    #[test]
    fn out_of_range_fov_is_rejected() {
        let err = RenderConfig::from_toml_str("fov_deg = 200.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn bad_toml_is_reported() {
        let err = RenderConfig::from_toml_str("fov_deg = [").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = RenderConfig::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    const MAP: &str = r#"
tile_size = 32.0
levels = [
  [[1, 1, 1, 1], [1, 0, 0, 1], [1, 1, 1, 1]],
  [[0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 2]],
]
surface = [
  [[-1, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]],
]
slopes = ["....", ".>..", "...."]
sprites = [
  { x = 1.5, y = 1.5, kind = 2 },
  { x = 2.5, y = 1.5, kind = 3, level = 5 },
]
spawn = { x = 1.5, y = 1.5, angle_deg = 90.0 }
"#;

    #[test]
    fn map_builds_world() {
        let map = MapFile::from_toml_str(MAP).unwrap();
        let world = map.build().unwrap();
        assert_eq!((world.width(), world.height(), world.levels()), (4, 3, 2));
        assert_eq!(world.tile_size(), 32.0);
        assert_eq!(world.cell_at(3, 2, 1), 2);
        assert_eq!(world.slope_at(1, 1), SlopeDir::RisePosX);
        assert_eq!(
            world.surface_at(0, 0, 0),
            crate::world::SurfaceStyle::Palette(0)
        );
        // Second sprite sits on a level that does not exist.
        assert_eq!(world.sprites().len(), 1);
        assert_eq!(world.sprites()[0].x, 48.0);
        assert_eq!(map.spawn.unwrap().angle_deg, 90.0);
    }

    #[test]
    fn shapes_are_scaled_into_their_cell() {
        let map = MapFile::from_toml_str(
            r#"
tile_size = 32.0
levels = [[[0, 0, 0], [0, 1, 0], [0, 0, 0]]]
shapes = [{ x = 1, y = 1, kind = "quad", points = [[0.0, 0.4], [1.0, 0.4], [1.0, 0.6], [0.0, 0.6]] }]
"#,
        )
        .unwrap();
        let world = map.build().unwrap();
        let shape = world.shape_at(1, 1).unwrap();
        assert_eq!(shape.kind, ShapeKind::Quad);
        assert_eq!(shape.points[0][0], 32.0);
        assert!((shape.points[0][1] - 44.8).abs() < 1e-4);
        assert!(world.blocks_movement(48.0, 48.0, 0.0));
        assert!(!world.blocks_movement(48.0, 36.0, 0.0));
    }

    #[test]
    fn shape_with_wrong_point_count_fails() {
        let map = MapFile::from_toml_str(
            "levels = [[[1]]]\nshapes = [{ x = 0, y = 0, kind = \"triangle\", points = [[0.0, 0.0]] }]",
        )
        .unwrap();
        assert_eq!(
            map.build().err(),
            Some(WorldError::ShapePoints {
                x: 0,
                y: 0,
                kind: ShapeKind::Triangle,
                expected: 3,
                found: 1,
            })
        );
    }

    #[test]
    fn unknown_slope_glyph_fails() {
        let map = MapFile::from_toml_str("levels = [[[0, 0]]]\nslopes = [\".?\"]").unwrap();
        assert_eq!(map.build().err(), Some(WorldError::UnknownSlope('?')));
    }

    #[test]
    fn mismatched_slope_layer_fails() {
        let map = MapFile::from_toml_str("levels = [[[0, 0]]]\nslopes = [\"...\"]").unwrap();
        assert!(matches!(map.build(), Err(WorldError::LayerShape { layer: "slope", .. })));
    }
}
