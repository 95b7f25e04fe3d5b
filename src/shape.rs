use serde::Deserialize;

/// Which kind of footprint a [`WallShape`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned box given by two opposite corners.
    Rectangle,
    /// Three corners, any winding.
    Triangle,
    /// Four corners of a convex quad, in order around the edge.
    Quad,
}

impl ShapeKind {
    /// Number of points the kind is built from.
    pub fn point_count(self) -> usize {
        match self {
            ShapeKind::Rectangle => 2,
            ShapeKind::Triangle => 3,
            ShapeKind::Quad => 4,
        }
    }
}

/// Top-down footprint of something solid, in world units.
#[derive(Clone, Debug, PartialEq)]
pub struct WallShape {
    pub kind: ShapeKind,
    pub points: Vec<[f32; 2]>,
}

impl WallShape {
    pub fn rectangle(min: [f32; 2], max: [f32; 2]) -> Self {
        Self {
            kind: ShapeKind::Rectangle,
            points: vec![min, max],
        }
    }

    pub fn triangle(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> Self {
        Self {
            kind: ShapeKind::Triangle,
            points: vec![a, b, c],
        }
    }

    pub fn quad(a: [f32; 2], b: [f32; 2], c: [f32; 2], d: [f32; 2]) -> Self {
        Self {
            kind: ShapeKind::Quad,
            points: vec![a, b, c, d],
        }
    }

    /// Builds a shape from a loose point list. `None` when the count does
    /// not match the kind.
    pub fn from_points(kind: ShapeKind, points: &[[f32; 2]]) -> Option<Self> {
        match (kind, points) {
            (ShapeKind::Rectangle, &[a, b]) => Some(Self::rectangle(a, b)),
            (ShapeKind::Triangle, &[a, b, c]) => Some(Self::triangle(a, b, c)),
            (ShapeKind::Quad, &[a, b, c, d]) => Some(Self::quad(a, b, c, d)),
            _ => None,
        }
    }

    /// Point-in-shape test. Points on the boundary count as inside.
    /// A shape with the wrong number of points contains nothing.
    pub fn contains(&self, p: [f32; 2]) -> bool {
        match self.kind {
            ShapeKind::Rectangle => {
                let [a, b] = match self.points.as_slice() {
                    [a, b] => [*a, *b],
                    _ => return false,
                };
                let (x0, x1) = (a[0].min(b[0]), a[0].max(b[0]));
                let (y0, y1) = (a[1].min(b[1]), a[1].max(b[1]));
                p[0] >= x0 && p[0] <= x1 && p[1] >= y0 && p[1] <= y1
            }
            ShapeKind::Triangle if self.points.len() == 3 => convex_contains(&self.points, p),
            ShapeKind::Quad if self.points.len() == 4 => convex_contains(&self.points, p),
            _ => false,
        }
    }
}

// All edge cross products share a sign (or are zero) for an inside point.
fn convex_contains(points: &[[f32; 2]], p: [f32; 2]) -> bool {
    let mut pos = false;
    let mut neg = false;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
        if cross > 0.0 {
            pos = true;
        } else if cross < 0.0 {
            neg = true;
        }
        if pos && neg {
            return false;
        }
    }
    true
}
