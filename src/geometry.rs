//! Planar geometry for zone evaluation.
//!
//! Everything here is stateless. A detection is reduced to a single
//! representative point (the truncated bounding-box centroid) and that point is
//! tested against each zone polygon. Polygon boundaries are inclusive.

use serde::{Deserialize, Serialize};

use crate::zones::Zone;

/// Minimum vertex count for a polygon to enclose an area.
pub const MIN_POLYGON_POINTS: usize = 3;

/// Integer pixel coordinate. Serialized as `[x, y]`; fractional input is
/// truncated like any other float coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[i32; 2]")]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::from((x, y))
    }
}

impl From<Point> for [i32; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

// Float coordinates truncate toward zero (saturating at the i32 range).
impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
        }
    }
}

/// Axis-aligned bounding box in pixel coordinates (`x1 <= x2`, `y1 <= y2`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Build a box from two corners, normalizing the corner order.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Intersection over union with another box. Zero when either box is empty.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let iy = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }
}

/// The single point tested against zones for a detection.
///
/// Centroid of the box with each coordinate truncated, not rounded:
/// `(0, 0, 10, 11)` maps to `(5, 5)`.
pub fn representative_point(bbox: &BoundingBox) -> Point {
    let cx = (f64::from(bbox.x1) + f64::from(bbox.x2)) / 2.0;
    let cy = (f64::from(bbox.y1) + f64::from(bbox.y2)) / 2.0;
    Point::from((cx, cy))
}

/// Inclusive point-in-polygon test.
///
/// Points on an edge or vertex count as inside. The interior is decided by
/// even-odd ray casting along +x. Polygons with fewer than
/// [`MIN_POLYGON_POINTS`] vertices enclose nothing and always return `false`.
pub fn contains(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < MIN_POLYGON_POINTS {
        return false;
    }

    let mut inside = false;
    let mut prev = polygon[polygon.len() - 1];
    for &curr in polygon {
        if on_segment(point, prev, curr) {
            return true;
        }
        if (curr.y > point.y) != (prev.y > point.y) {
            let dy = f64::from(curr.y) - f64::from(prev.y);
            let t = (f64::from(point.y) - f64::from(prev.y)) / dy;
            let cross_x = f64::from(prev.x) + t * (f64::from(curr.x) - f64::from(prev.x));
            if f64::from(point.x) < cross_x {
                inside = !inside;
            }
        }
        prev = curr;
    }
    inside
}

/// Ids of every evaluable zone containing `point`, in registry order.
///
/// Zones with fewer than [`MIN_POLYGON_POINTS`] vertices are skipped.
pub fn zones_containing(point: Point, zones: &[Zone]) -> Vec<u32> {
    zones
        .iter()
        .filter(|zone| zone.is_evaluable())
        .filter(|zone| contains(point, &zone.points))
        .map(|zone| zone.id)
        .collect()
}

fn on_segment(p: Point, a: Point, b: Point) -> bool {
    // i64 keeps the cross product exact for any i32 input.
    let (px, py) = (i64::from(p.x), i64::from(p.y));
    let (ax, ay) = (i64::from(a.x), i64::from(a.y));
    let (bx, by) = (i64::from(b.x), i64::from(b.y));

    let cross = (bx - ax) * (py - ay) - (by - ay) * (px - ax);
    if cross != 0 {
        return false;
    }
    px >= ax.min(bx) && px <= ax.max(bx) && py >= ay.min(by) && py <= ay.max(by)
}
