//! Per-column draw ordering: far-to-near opaque walls, then (after sprites)
//! doors clipped against the nearer walls already on screen.

use std::cmp::Ordering;

use crate::camera::Camera;
use crate::draw::DrawIntent;
use crate::projector::project_wall;
use crate::raycaster::RayHit;

/// Rows of one column covered by an opaque span.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Occluder {
    pub y_start: usize,
    pub y_end: usize,
    pub distance: f32,
}

/// Per-column nearest distance plus the opaque spans drawn this frame.
#[derive(Debug, Default)]
pub struct DepthBuffer {
    depth: Vec<f32>,
    occluders: Vec<Vec<Occluder>>,
}

impl DepthBuffer {
    pub fn new(width: usize) -> Self {
        let mut buf = Self::default();
        buf.reset(width);
        buf
    }

    /// Start of frame: every column infinitely far, nothing drawn.
    pub fn reset(&mut self, width: usize) {
        self.depth.clear();
        self.depth.resize(width, f32::INFINITY);
        self.occluders.resize_with(width, Vec::new);
        for list in &mut self.occluders {
            list.clear();
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.depth.len()
    }

    /// Nearest occluding distance; infinite off screen.
    #[inline]
    pub fn get(&self, column: usize) -> f32 {
        self.depth.get(column).copied().unwrap_or(f32::INFINITY)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.depth
    }

    #[inline]
    pub fn write_min(&mut self, column: usize, distance: f32) {
        if let Some(d) = self.depth.get_mut(column) {
            *d = d.min(distance);
        }
    }

    pub fn add_occluder(&mut self, column: usize, occluder: Occluder) {
        if let Some(list) = self.occluders.get_mut(column) {
            list.push(occluder);
        }
    }

    pub fn occluders(&self, column: usize) -> &[Occluder] {
        self.occluders.get(column).map_or(&[], |v| v.as_slice())
    }

    /// True when a span nearer than `distance` already covers the row.
    pub fn is_covered(&self, column: usize, y: usize, distance: f32) -> bool {
        self.occluders(column)
            .iter()
            .any(|o| o.distance < distance && o.y_start <= y && y <= o.y_end)
    }

    /// Parts of `y_start..=y_end` not covered by anything nearer than
    /// `distance`, top to bottom.
    pub fn uncovered_runs(&self, column: usize, y_start: usize, y_end: usize, distance: f32) -> Vec<(usize, usize)> {
        let mut runs = vec![(y_start, y_end)];
        for occ in self.occluders(column).iter().filter(|o| o.distance < distance) {
            runs = runs
                .into_iter()
                .flat_map(|(a, b)| subtract(a, b, occ.y_start, occ.y_end))
                .collect();
            if runs.is_empty() {
                break;
            }
        }
        runs.sort_unstable();
        runs
    }
}

// [a, b] minus [c, d], inclusive bounds.
fn subtract(a: usize, b: usize, c: usize, d: usize) -> Vec<(usize, usize)> {
    if d < a || c > b {
        return vec![(a, b)];
    }
    let mut out = Vec::with_capacity(2);
    if c > a {
        out.push((a, c - 1));
    }
    if d < b {
        out.push((d + 1, b));
    }
    out
}

/// Farthest first; on equal distance the higher level first. Stable.
pub fn sort_far_to_near(hits: &mut [RayHit]) {
    hits.sort_by(|a, b| {
        b.correct_distance
            .partial_cmp(&a.correct_distance)
            .unwrap_or(Ordering::Equal)
            .then(b.level.cmp(&a.level))
    });
}

/// One column's hits, ordered and split for the two draw passes.
#[derive(Clone, Debug, Default)]
pub struct ColumnPlan {
    pub column: usize,
    pub opaque: Vec<RayHit>,
    pub doors: Vec<RayHit>,
}

impl ColumnPlan {
    pub fn new(column: usize, mut hits: Vec<RayHit>) -> Self {
        sort_far_to_near(&mut hits);
        let (doors, opaque) = hits.into_iter().partition(|h| h.transparent);
        Self { column, opaque, doors }
    }

    /// Painter's pass over the opaque hits. Records every drawn span as an
    /// occluder and lowers the column depth for spans reaching the horizon.
    pub fn draw_opaque(&self, camera: &Camera, tile: f32, depth: &mut DepthBuffer, out: &mut Vec<DrawIntent>) {
        for hit in &self.opaque {
            let Some(span) = project_wall(hit, camera, tile, self.column) else {
                continue;
            };
            out.push(span.to_intent());
            depth.add_occluder(
                self.column,
                Occluder {
                    y_start: span.y_start,
                    y_end: span.y_end,
                    distance: span.distance,
                },
            );
            if span.reaches_horizon(camera) {
                depth.write_min(self.column, span.distance);
            }
        }
    }

    /// Deferred pass for closed doors, far to near. Each door is cut down to
    /// the rows no nearer opaque span already covers.
    pub fn draw_doors(&self, camera: &Camera, tile: f32, depth: &mut DepthBuffer, out: &mut Vec<DrawIntent>) {
        for hit in self.doors.iter().filter(|h| !h.open) {
            let Some(span) = project_wall(hit, camera, tile, self.column) else {
                continue;
            };
            let runs = depth.uncovered_runs(self.column, span.y_start, span.y_end, span.distance);
            let mut drawn = false;
            for (a, b) in runs {
                if let Some(piece) = span.clipped(a, b) {
                    out.push(piece.to_intent());
                    depth.add_occluder(
                        self.column,
                        Occluder {
                            y_start: piece.y_start,
                            y_end: piece.y_end,
                            distance: piece.distance,
                        },
                    );
                    drawn |= piece.reaches_horizon(camera);
                }
            }
            if drawn {
                depth.write_min(self.column, span.distance);
            }
        }
    }
}
