// Contour extraction for binary matrices, backed by imageproc's
// Suzuki-Abe border follower.

use imageproc::contours::BorderType;

use crate::error::{Result, ScanError};
use crate::geometry::{self, Point2f};
use crate::image_impl::Mat;

#[derive(Debug, Clone)]
pub struct Contour {
    pub points: Vec<Point2f>,
    pub is_hole: bool,
}

impl Contour {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn area(&self) -> f64 {
        geometry::contour_area(&self.points)
    }

    pub fn perimeter(&self) -> f64 {
        geometry::arc_length(&self.points, true)
    }
}

/// Every border (outer and hole) in a binary single-channel matrix, in the
/// tracer's order. Non-zero pixels are foreground.
pub fn find_contours(binary: &Mat) -> Result<Vec<Contour>> {
    if binary.empty() {
        return Err(ScanError::empty_image("find_contours"));
    }
    if binary.channels() != 1 {
        return Err(ScanError::InvalidArgument(format!(
            "find_contours: expected 1 channel, got {}",
            binary.channels()
        )));
    }
    let gray = image::GrayImage::from_raw(binary.cols() as u32, binary.rows() as u32, binary.to_vec())
        .ok_or_else(|| ScanError::InvalidImage("binary buffer size mismatch".to_string()))?;

    let contours = imageproc::contours::find_contours::<i32>(&gray)
        .into_iter()
        .map(|c| Contour {
            points: c
                .points
                .into_iter()
                .map(|p| Point2f::new(p.x as f32, p.y as f32))
                .collect(),
            is_hole: c.border_type == BorderType::Hole,
        })
        .collect();
    Ok(contours)
}
