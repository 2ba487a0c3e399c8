//! # docscan - Document Edge Detection & Rectification
//!
//! docscan finds the outline of a paper document in a photograph and warps
//! it onto an upright rectangle, as if the page had been scanned flat.
//!
//! ## Features
//!
//! - **Pure Rust**: no OpenCV, built on `image`, `imageproc` and `nalgebra`
//! - **Robust detection**: every colour plane is searched with Canny edges and
//!   a ladder of binary thresholds; the image bounds are the fallback
//! - **Editable crops**: handle-based border model for touch UIs
//! - **Post-processing**: grayscale, binary and adaptive-threshold effects
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docscan::{DocScanner, Effect};
//!
//! let scanner = DocScanner::default();
//! let photo = docscan::imread("receipt.jpg")?;
//!
//! let shape = scanner.detect(&photo)?;
//! let page = scanner.scan(&photo, &shape)?;
//! let page = scanner.apply_effect(&page, Effect::Adaptive)?;
//! docscan::imwrite("receipt_scan.png", &page)?;
//! # Ok::<(), docscan::ScanError>(())
//! ```

pub mod border;
pub mod contours;
pub mod det;
pub mod effects;
mod error;
pub mod geometry;
pub mod image_impl;
pub mod orderer;
pub mod perspective;
pub mod pipeline;
pub mod transform;
mod types;

// FFI module for C bindings
#[cfg(feature = "ffi")]
pub mod ffi;

pub use crate::border::{Corner, CropBorder, Edge, Handle};
pub use crate::det::{DocShapeDetector, ShapeDetector};
pub use crate::effects::{Effect, EffectApplier};
pub use crate::error::{Result, ScanError};
pub use crate::geometry::{Point2f, Shape, Size, SizeF};
pub use crate::image_impl::{imread, imwrite, to_bitmap, to_matrix, Mat};
pub use crate::orderer::{CentroidOrderer, CoordsOrderer};
pub use crate::perspective::{AverageEdgeTransformer, PerspectiveTransformer};
pub use crate::pipeline::{Destination, ImageRequest, Source, Target, TargetAdapter};
pub use crate::transform::{
    AdaptiveThresholdTransformation, CropCoords, CropTransformation, GrayscaleTransformation,
    ResizeTransformation, RotateTransformation, SimpleThresholdTransformation, Transformation,
};
pub use crate::types::{Denoise, DetectorConfig, EffectConfig, GlobalConfig, OutputConfig};

use tracing::instrument;

/// Detection, rectification and post-processing behind one handle.
pub struct DocScanner {
    detector: Box<dyn ShapeDetector>,
    transformer: Box<dyn PerspectiveTransformer>,
    effects: EffectApplier,
    output: OutputConfig,
}

impl Default for DocScanner {
    fn default() -> Self {
        Self::new(GlobalConfig::default())
    }
}

impl DocScanner {
    pub fn new(config: GlobalConfig) -> Self {
        Self {
            detector: Box::new(DocShapeDetector::new(config.detector)),
            transformer: Box::new(AverageEdgeTransformer),
            effects: EffectApplier::new(config.effects),
            output: config.output,
        }
    }

    pub fn with_detector(mut self, detector: Box<dyn ShapeDetector>) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_transformer(mut self, transformer: Box<dyn PerspectiveTransformer>) -> Self {
        self.transformer = transformer;
        self
    }

    /// Document corners in `image` pixel coordinates.
    #[instrument(level = "info", skip_all, fields(rows = image.rows(), cols = image.cols()))]
    pub fn detect(&self, image: &Mat) -> Result<Shape> {
        if image.empty() {
            return Err(ScanError::InvalidImage(
                "cannot detect a document in an empty image".to_string(),
            ));
        }
        Ok(self.detector.detect_shape(image))
    }

    /// Rectifies `shape` out of `image`, then fits the configured output bounds.
    #[instrument(level = "info", skip_all, fields(%shape))]
    pub fn scan(&self, image: &Mat, shape: &Shape) -> Result<Mat> {
        let page = self.transformer.transform_perspective(image, shape)?;
        match (self.output.max_width, self.output.max_height) {
            (Some(w), Some(h)) => self.resize_to_bounds(page, w, h),
            _ => Ok(page),
        }
    }

    /// Rectifies corners picked on a preview of `view_size`.
    pub fn crop(&self, image: &Mat, coords: CropCoords, view_size: SizeF) -> Result<Mat> {
        let shape = CropTransformation::new(coords, view_size).source_coords(image.size())?;
        self.scan(image, &shape)
    }

    pub fn apply_effect(&self, image: &Mat, effect: Effect) -> Result<Mat> {
        self.effects.apply(image, effect)
    }

    pub fn resize_to_bounds(&self, image: Mat, max_width: u32, max_height: u32) -> Result<Mat> {
        ResizeTransformation::new(max_width, max_height).transform(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn photo() -> Mat {
        Mat::new(Array3::from_shape_fn((400, 300, 3), |(y, x, _)| {
            if (50..250).contains(&x) && (60..340).contains(&y) {
                30
            } else {
                220
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_detect_rejects_empty() {
        let scanner = DocScanner::default();
        let empty = Mat::zeros(0, 0, 3).unwrap();
        assert!(matches!(scanner.detect(&empty), Err(ScanError::InvalidImage(_))));
    }

    #[test]
    fn test_detect_then_scan() {
        let scanner = DocScanner::default();
        let img = photo();
        let shape = scanner.detect(&img).unwrap();
        assert!(shape.is_valid());
        let page = scanner.scan(&img, &shape).unwrap();
        assert!((page.cols() as i32 - 200).abs() <= 8);
        assert!((page.rows() as i32 - 280).abs() <= 8);
    }

    #[test]
    fn test_scan_respects_output_bounds() {
        let config = GlobalConfig {
            output: OutputConfig {
                max_width: Some(100),
                max_height: Some(100),
            },
            ..GlobalConfig::default()
        };
        let scanner = DocScanner::new(config);
        let shape = Shape::whole_image(300.0, 400.0);
        let page = scanner.scan(&photo(), &shape).unwrap();
        assert_eq!(page.size(), Size::new(75, 100));
    }

    #[test]
    fn test_crop_from_preview() {
        let scanner = DocScanner::default();
        let coords = Shape::whole_image(150.0, 200.0);
        let page = scanner.crop(&photo(), coords, SizeF::new(150.0, 200.0)).unwrap();
        assert_eq!(page.size(), Size::new(300, 400));
    }

    struct FixedDetector(Shape);

    impl ShapeDetector for FixedDetector {
        fn detect_shape(&self, _src: &Mat) -> Shape {
            self.0
        }
    }

    #[test]
    fn test_custom_detector() {
        let fixed = Shape::whole_image(10.0, 10.0);
        let scanner = DocScanner::default().with_detector(Box::new(FixedDetector(fixed)));
        assert_eq!(scanner.detect(&photo()).unwrap(), fixed);
    }
}
