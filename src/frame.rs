use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::camera::Camera;
use crate::compositor::{ColumnPlan, DepthBuffer};
use crate::config::RenderConfig;
use crate::draw::DrawIntent;
use crate::raycaster::cast_column;
use crate::sprites::draw_sprites;
use crate::surface::{SlopeMarch, SurfaceScanner};
use crate::world::GridWorld;

/// Per-frame constants derived once from the config.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameSettings {
    pub palette: Vec<u32>,
    pub slope_march: SlopeMarch,
    pub sprite_cull_margin: f32,
}

impl FrameSettings {
    pub fn from_config(config: &RenderConfig, tile: f32) -> Self {
        Self {
            palette: config.palette_rgb(),
            slope_march: config.slope_march(tile),
            sprite_cull_margin: config.sprite_cull_margin(),
        }
    }
}

/// Renders one frame into a list of draw intents, in the order a sink must
/// apply them: opaque walls far to near, sprites, clipped doors, ramps, then
/// wall tops.
///
/// Ray traversal is pure per column and runs on the rayon pool. Everything
/// touching `depth` runs afterwards on the calling thread.
pub fn render_frame(
    world: &GridWorld,
    camera: &Camera,
    depth: &mut DepthBuffer,
    settings: &FrameSettings,
) -> Vec<DrawIntent> {
    let tile = world.tile_size();
    depth.reset(camera.width);

    let plans: Vec<ColumnPlan> = (0..camera.width)
        .into_par_iter()
        .map(|column| ColumnPlan::new(column, cast_column(world, camera, column)))
        .collect();

    let mut out = Vec::new();
    for plan in &plans {
        plan.draw_opaque(camera, tile, depth, &mut out);
    }
    let walls = out.len();

    let sprites = draw_sprites(world, camera, settings.sprite_cull_margin, depth, &mut out);

    let before_doors = out.len();
    for plan in &plans {
        plan.draw_doors(camera, tile, depth, &mut out);
    }
    let doors = out.len() - before_doors;

    let scanner = SurfaceScanner::new(world, camera, &settings.palette);
    let slope_fills = scanner.draw_slopes(&settings.slope_march, depth, &mut out);
    let top_spans = scanner.draw_flat_tops(depth, &mut out);

    tracing::trace!(
        walls,
        sprites,
        doors,
        slope_fills,
        top_spans,
        intents = out.len(),
        "frame composed"
    );
    out
}
