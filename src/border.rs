//! Editable crop outline: four corner handles plus a middle handle per edge,
//! all kept inside the document bounds.

use crate::geometry::{distance, Point2f, Shape};
use crate::orderer::{CentroidOrderer, CoordsOrderer};
use crate::transform::CropCoords;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub fn corners(self) -> (Corner, Corner) {
        match self {
            Edge::Top => (Corner::TopLeft, Corner::TopRight),
            Edge::Right => (Corner::TopRight, Corner::BottomRight),
            Edge::Bottom => (Corner::BottomLeft, Corner::BottomRight),
            Edge::Left => (Corner::TopLeft, Corner::BottomLeft),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Corner(Corner),
    Middle(Edge),
}

const CORNERS: [Corner; 4] = [
    Corner::TopLeft,
    Corner::TopRight,
    Corner::BottomLeft,
    Corner::BottomRight,
];
const EDGES: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];

pub struct CropBorder {
    handles: [Point2f; 4],
    doc_width: f32,
    doc_height: f32,
    orderer: Box<dyn CoordsOrderer>,
}

impl CropBorder {
    /// Handles start at `shape`'s corners, clamped into `doc_width` x `doc_height`.
    pub fn new(shape: &Shape, doc_width: f32, doc_height: f32) -> Self {
        let mut border = Self {
            handles: shape.to_points(),
            doc_width: doc_width.max(0.0),
            doc_height: doc_height.max(0.0),
            orderer: Box::new(CentroidOrderer),
        };
        for p in border.handles.iter_mut() {
            *p = Point2f::new(
                p.x.clamp(0.0, border.doc_width),
                p.y.clamp(0.0, border.doc_height),
            );
        }
        border
    }

    pub fn with_orderer(mut self, orderer: Box<dyn CoordsOrderer>) -> Self {
        self.orderer = orderer;
        self
    }

    fn index(corner: Corner) -> usize {
        match corner {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomLeft => 2,
            Corner::BottomRight => 3,
        }
    }

    fn clamp_x(&self, x: f32) -> f32 {
        x.clamp(0.0, self.doc_width)
    }

    fn clamp_y(&self, y: f32) -> f32 {
        y.clamp(0.0, self.doc_height)
    }

    pub fn corner(&self, corner: Corner) -> Point2f {
        self.handles[Self::index(corner)]
    }

    pub fn middle_handle(&self, edge: Edge) -> Point2f {
        let (a, b) = edge.corners();
        let (a, b) = (self.corner(a), self.corner(b));
        Point2f::new((a.x + b.x) * 0.5, (a.y + b.y) * 0.5)
    }

    pub fn move_corner(&mut self, corner: Corner, dx: f32, dy: f32) {
        let p = self.corner(corner);
        let moved = Point2f::new(self.clamp_x(p.x + dx), self.clamp_y(p.y + dy));
        self.handles[Self::index(corner)] = moved;
    }

    /// Drags both corners of `edge` across it: an edge wider than tall moves
    /// vertically, otherwise horizontally.
    pub fn move_edge(&mut self, edge: Edge, dx: f32, dy: f32) {
        let (first, second) = edge.corners();
        let (a, b) = (self.corner(first), self.corner(second));
        let vertical = (a.x - b.x).abs() > (a.y - b.y).abs();

        let (a, b) = if vertical {
            (
                Point2f::new(a.x, self.clamp_y(a.y + dy)),
                Point2f::new(b.x, self.clamp_y(b.y + dy)),
            )
        } else {
            (
                Point2f::new(self.clamp_x(a.x + dx), a.y),
                Point2f::new(self.clamp_x(b.x + dx), b.y),
            )
        };
        self.handles[Self::index(first)] = a;
        self.handles[Self::index(second)] = b;
    }

    pub fn move_handle(&mut self, handle: Handle, dx: f32, dy: f32) {
        match handle {
            Handle::Corner(c) => self.move_corner(c, dx, dy),
            Handle::Middle(e) => self.move_edge(e, dx, dy),
        }
    }

    /// The handle within `radius` of `point`, corners first.
    pub fn handle_at(&self, point: Point2f, radius: f32) -> Option<Handle> {
        CORNERS
            .iter()
            .map(|&c| (Handle::Corner(c), self.corner(c)))
            .chain(EDGES.iter().map(|&e| (Handle::Middle(e), self.middle_handle(e))))
            .find(|(_, p)| distance(*p, point) <= radius)
            .map(|(h, _)| h)
    }

    /// Handles re-ordered into roles, or `None` if they no longer form one.
    pub fn crop_coords(&self) -> Option<CropCoords> {
        self.orderer.order(&self.handles)
    }

    pub fn has_valid_border(&self) -> bool {
        self.crop_coords().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn border() -> CropBorder {
        let shape = Shape::new(
            Point2f::new(20.0, 20.0),
            Point2f::new(180.0, 20.0),
            Point2f::new(20.0, 280.0),
            Point2f::new(180.0, 280.0),
        );
        CropBorder::new(&shape, 200.0, 300.0)
    }

    #[test]
    fn test_corner_clamped_to_bounds() {
        let mut b = border();
        b.move_corner(Corner::TopLeft, -100.0, -5.0);
        assert_eq!(b.corner(Corner::TopLeft), Point2f::new(0.0, 15.0));
        b.move_corner(Corner::BottomRight, 50.0, 50.0);
        assert_eq!(b.corner(Corner::BottomRight), Point2f::new(200.0, 300.0));
    }

    #[test]
    fn test_middle_handle_moves_edge() {
        let mut b = border();
        assert_eq!(b.middle_handle(Edge::Top), Point2f::new(100.0, 20.0));
        b.move_edge(Edge::Top, 30.0, 10.0);
        assert_eq!(b.corner(Corner::TopLeft), Point2f::new(20.0, 30.0));
        assert_eq!(b.corner(Corner::TopRight), Point2f::new(180.0, 30.0));

        b.move_edge(Edge::Left, 500.0, 0.0);
        assert_eq!(b.corner(Corner::TopLeft).x, 200.0);
        assert_eq!(b.corner(Corner::BottomLeft).x, 200.0);
    }

    #[test]
    fn test_move_handle_dispatches() {
        let mut b = border();
        b.move_handle(Handle::Corner(Corner::BottomRight), -30.0, -40.0);
        assert_eq!(b.corner(Corner::BottomRight), Point2f::new(150.0, 240.0));

        b.move_handle(Handle::Middle(Edge::Left), 15.0, 99.0);
        assert_eq!(b.corner(Corner::TopLeft), Point2f::new(35.0, 20.0));
        assert_eq!(b.corner(Corner::BottomLeft), Point2f::new(35.0, 280.0));

        let grabbed = b.handle_at(b.middle_handle(Edge::Bottom), 2.0).unwrap();
        b.move_handle(grabbed, 0.0, 100.0);
        assert_eq!(b.corner(Corner::BottomLeft).y, 300.0);
        assert_eq!(b.corner(Corner::BottomRight).y, 300.0);
    }

    #[test]
    fn test_crossed_handles_invalidate_border() {
        let mut b = border();
        assert!(b.has_valid_border());
        b.move_corner(Corner::TopLeft, 160.0, 0.0);
        assert!(!b.has_valid_border());
        assert!(b.crop_coords().is_none());
    }

    #[test]
    fn test_crop_coords_reorders() {
        let shape = Shape::new(
            Point2f::new(180.0, 280.0),
            Point2f::new(20.0, 280.0),
            Point2f::new(180.0, 20.0),
            Point2f::new(20.0, 20.0),
        );
        let coords = CropBorder::new(&shape, 200.0, 300.0).crop_coords().unwrap();
        assert_eq!(coords.top_left, Point2f::new(20.0, 20.0));
        assert_eq!(coords.bottom_right, Point2f::new(180.0, 280.0));
    }

    #[test]
    fn test_handle_hit_testing() {
        let b = border();
        assert_eq!(
            b.handle_at(Point2f::new(22.0, 18.0), 5.0),
            Some(Handle::Corner(Corner::TopLeft))
        );
        assert_eq!(
            b.handle_at(Point2f::new(180.0, 150.0), 5.0),
            Some(Handle::Middle(Edge::Right))
        );
        assert_eq!(b.handle_at(Point2f::new(100.0, 150.0), 5.0), None);
    }
}
