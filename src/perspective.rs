use tracing::{debug, instrument};

use crate::error::{Result, ScanError};
use crate::geometry::{distance, Point2f, Shape, Size};
use crate::image_impl::{self, Mat};

/// Warps a quadrilateral region onto an upright rectangle.
pub trait PerspectiveTransformer: Send + Sync {
    fn transform_perspective(&self, src: &Mat, shape: &Shape) -> Result<Mat>;
}

/// Output size is the mean length of each pair of opposite edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct AverageEdgeTransformer;

fn round_half_up(v: f32) -> i64 {
    (v as f64 + 0.5).floor() as i64
}

/// `(width, height)` of the rectified output for `shape`.
pub fn output_size(shape: &Shape) -> Result<Size> {
    let top = distance(shape.top_left, shape.top_right);
    let bottom = distance(shape.bottom_left, shape.bottom_right);
    let left = distance(shape.top_left, shape.bottom_left);
    let right = distance(shape.top_right, shape.bottom_right);

    let width = round_half_up((top + bottom) / 2.0);
    let height = round_half_up((left + right) / 2.0);
    if width < 1 || height < 1 {
        return Err(ScanError::DegenerateShape(format!(
            "rectified size {width}x{height} for {shape}"
        )));
    }
    Ok(Size::new(width as u32, height as u32))
}

impl PerspectiveTransformer for AverageEdgeTransformer {
    #[instrument(level = "debug", skip(self, src), fields(rows = src.rows(), cols = src.cols()))]
    fn transform_perspective(&self, src: &Mat, shape: &Shape) -> Result<Mat> {
        if !shape.is_valid() {
            return Err(ScanError::DegenerateShape(format!(
                "corners {shape} do not form an ordered quadrilateral"
            )));
        }
        let size = output_size(shape)?;
        let (w, h) = (size.width as f32, size.height as f32);

        let src_pts = shape.to_points();
        let dst_pts = [
            Point2f::new(0.0, 0.0),
            Point2f::new(w, 0.0),
            Point2f::new(0.0, h),
            Point2f::new(w, h),
        ];
        let matrix = image_impl::get_perspective_transform(&src_pts, &dst_pts)?;
        debug!(width = size.width, height = size.height, "warping");
        image_impl::warp_perspective(src, &matrix, size)
    }
}
