use crate::geometry::{Point2f, Shape};

/// Assigns unordered corner points to their roles.
pub trait CoordsOrderer: Send + Sync {
    /// `None` unless exactly one point lands in each role.
    fn order(&self, points: &[Point2f]) -> Option<Shape>;
}

/// Classifies points by quadrant around their centroid.
///
/// Comparisons are strict, so a point lying on either centroid axis belongs
/// to no quadrant and the ordering fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct CentroidOrderer;

#[derive(Default)]
struct Roles {
    top_left: Option<Point2f>,
    top_right: Option<Point2f>,
    bottom_left: Option<Point2f>,
    bottom_right: Option<Point2f>,
}

impl Roles {
    fn assign(slot: &mut Option<Point2f>, p: Point2f) -> bool {
        if slot.is_some() {
            return false;
        }
        *slot = Some(p);
        true
    }

    fn into_shape(self) -> Option<Shape> {
        Some(Shape::new(
            self.top_left?,
            self.top_right?,
            self.bottom_left?,
            self.bottom_right?,
        ))
    }
}

impl CoordsOrderer for CentroidOrderer {
    fn order(&self, points: &[Point2f]) -> Option<Shape> {
        if points.len() != 4 {
            return None;
        }
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                if points[i] == points[j] {
                    return None;
                }
            }
        }

        let cx = points.iter().map(|p| p.x).sum::<f32>() / 4.0;
        let cy = points.iter().map(|p| p.y).sum::<f32>() / 4.0;

        let mut roles = Roles::default();
        for &p in points {
            let slot = if p.x < cx && p.y < cy {
                &mut roles.top_left
            } else if p.x > cx && p.y < cy {
                &mut roles.top_right
            } else if p.x < cx && p.y > cy {
                &mut roles.bottom_left
            } else if p.x > cx && p.y > cy {
                &mut roles.bottom_right
            } else {
                return None;
            };
            if !Roles::assign(slot, p) {
                return None;
            }
        }
        roles.into_shape()
    }
}
