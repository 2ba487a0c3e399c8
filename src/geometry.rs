//! Points, sizes, quadrilaterals and the polygon measures the detector filters on.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2f {
    pub x: f32,
    pub y: f32,
}

impl Point2f {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scale(self, sx: f32, sy: f32) -> Self {
        Self::new(self.x * sx, self.y * sy)
    }
}

/// Raster dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Floating point size, used for on-screen view dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeF {
    pub width: f32,
    pub height: f32,
}

impl SizeF {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl From<Size> for SizeF {
    fn from(s: Size) -> Self {
        Self::new(s.width as f32, s.height as f32)
    }
}

/// A document outline with each corner in its role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub top_left: Point2f,
    pub top_right: Point2f,
    pub bottom_left: Point2f,
    pub bottom_right: Point2f,
}

impl Shape {
    pub fn new(
        top_left: Point2f,
        top_right: Point2f,
        bottom_left: Point2f,
        bottom_right: Point2f,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    /// The four corners of a `width` x `height` image.
    pub fn whole_image(width: f32, height: f32) -> Self {
        Self::new(
            Point2f::new(0.0, 0.0),
            Point2f::new(width, 0.0),
            Point2f::new(0.0, height),
            Point2f::new(width, height),
        )
    }

    /// `[tl, tr, bl, br]`
    pub fn to_points(&self) -> [Point2f; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self::new(
            self.top_left.scale(sx, sy),
            self.top_right.scale(sx, sy),
            self.bottom_left.scale(sx, sy),
            self.bottom_right.scale(sx, sy),
        )
    }

    /// True when re-ordering the corners gives back the same roles.
    pub fn is_valid(&self) -> bool {
        use crate::orderer::{CentroidOrderer, CoordsOrderer};
        CentroidOrderer.order(&self.to_points()).as_ref() == Some(self)
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[({}, {}), ({}, {}), ({}, {}), ({}, {})]",
            self.top_left.x,
            self.top_left.y,
            self.top_right.x,
            self.top_right.y,
            self.bottom_left.x,
            self.bottom_left.y,
            self.bottom_right.x,
            self.bottom_right.y
        )
    }
}

pub fn distance(a: Point2f, b: Point2f) -> f32 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Cosine of the angle at `vertex` between the rays towards `p1` and `p2`.
pub fn angle_cosine(p1: Point2f, p2: Point2f, vertex: Point2f) -> f64 {
    let dx1 = (p1.x - vertex.x) as f64;
    let dy1 = (p1.y - vertex.y) as f64;
    let dx2 = (p2.x - vertex.x) as f64;
    let dy2 = (p2.y - vertex.y) as f64;
    (dx1 * dx2 + dy1 * dy2) / ((dx1 * dx1 + dy1 * dy1) * (dx2 * dx2 + dy2 * dy2) + 1e-10).sqrt()
}

/// Largest `|cos|` over every vertex of a closed polygon.
pub fn max_abs_cosine(polygon: &[Point2f]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let prev = polygon[(i + n - 1) % n];
            let next = polygon[(i + 1) % n];
            angle_cosine(prev, next, polygon[i]).abs()
        })
        .fold(0.0, f64::max)
}

pub fn arc_length(points: &[Point2f], closed: bool) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut length: f64 = points
        .windows(2)
        .map(|w| distance(w[0], w[1]) as f64)
        .sum();
    if closed {
        length += distance(points[points.len() - 1], points[0]) as f64;
    }
    length
}

/// Absolute shoelace area.
pub fn contour_area(points: &[Point2f]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64
        })
        .sum();
    twice.abs() * 0.5
}

fn cross(o: Point2f, a: Point2f, b: Point2f) -> f64 {
    (a.x - o.x) as f64 * (b.y - o.y) as f64 - (a.y - o.y) as f64 * (b.x - o.x) as f64
}

/// Every turn goes the same way. Collinear runs are tolerated, a fully
/// collinear polygon is not convex.
pub fn is_contour_convex(points: &[Point2f]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0i8;
    for i in 0..n {
        let c = cross(points[i], points[(i + 1) % n], points[(i + 2) % n]);
        let s = if c > 0.0 {
            1
        } else if c < 0.0 {
            -1
        } else {
            continue;
        };
        if sign == 0 {
            sign = s;
        } else if sign != s {
            return false;
        }
    }
    sign != 0
}

fn point_to_line_distance(point: Point2f, start: Point2f, end: Point2f) -> f64 {
    let a = (end.y - start.y) as f64;
    let b = (start.x - end.x) as f64;
    let c = end.x as f64 * start.y as f64 - start.x as f64 * end.y as f64;
    let denominator = (a * a + b * b).sqrt();
    if denominator == 0.0 {
        return distance(point, start) as f64;
    }
    (a * point.x as f64 + b * point.y as f64 + c).abs() / denominator
}

fn farthest_from(points: &[Point2f], origin: Point2f) -> usize {
    let mut best = 0;
    let mut best_dist = -1.0f32;
    for (i, p) in points.iter().enumerate() {
        let d = distance(*p, origin);
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

/// Iterative Douglas-Peucker over `points[start..=end]`, marking kept indices.
fn douglas_peucker(points: &[Point2f], start: usize, end: usize, epsilon: f64, keep: &mut [bool]) {
    let mut stack = vec![(start, end)];
    while let Some((start, end)) = stack.pop() {
        if end - start <= 1 {
            continue;
        }
        let mut max_dist = 0.0;
        let mut max_index = start;
        for i in (start + 1)..end {
            let dist = point_to_line_distance(points[i], points[start], points[end]);
            if dist > max_dist {
                max_dist = dist;
                max_index = i;
            }
        }
        if max_dist > epsilon {
            keep[max_index] = true;
            stack.push((start, max_index));
            stack.push((max_index, end));
        }
    }
}

/// Polygon approximation within `epsilon` of the input curve.
///
/// Closed curves are split at a pair of mutually distant points first, so the
/// tracer's starting pixel never survives as a spurious vertex.
pub fn approx_poly_dp(points: &[Point2f], epsilon: f64, closed: bool) -> Vec<Point2f> {
    if points.len() < 3 {
        return points.to_vec();
    }

    if !closed {
        let last = points.len() - 1;
        let mut keep = vec![false; points.len()];
        keep[0] = true;
        keep[last] = true;
        douglas_peucker(points, 0, last, epsilon, &mut keep);
        return points
            .iter()
            .zip(keep)
            .filter_map(|(p, k)| k.then_some(*p))
            .collect();
    }

    let n = points.len();
    let a = farthest_from(points, points[0]);
    let b = farthest_from(points, points[a]);
    if a == b {
        return vec![points[a]];
    }

    // Walk the ring starting at `a`, repeating it at the end to close.
    let ring: Vec<Point2f> = (0..=n).map(|i| points[(a + i) % n]).collect();
    let split = (b + n - a) % n;
    let mut keep = vec![false; ring.len()];
    keep[0] = true;
    keep[split] = true;
    douglas_peucker(&ring, 0, split, epsilon, &mut keep);
    douglas_peucker(&ring, split, n, epsilon, &mut keep);

    ring[..n]
        .iter()
        .zip(&keep[..n])
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}
