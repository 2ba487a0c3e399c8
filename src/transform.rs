//! Image-to-image steps that can be chained behind a load request.

use tracing::{debug, instrument};

use crate::effects::EffectApplier;
use crate::error::{Result, ScanError};
use crate::geometry::{Shape, Size, SizeF};
use crate::image_impl::{self, Mat, RotateCode, INTER_LINEAR};
use crate::perspective::{AverageEdgeTransformer, PerspectiveTransformer};
use crate::types::EffectConfig;

/// Corner handle positions in on-screen view coordinates.
pub type CropCoords = Shape;

pub trait Transformation: Send + Sync {
    /// Stable identifier derived from the parameters, usable as a cache key.
    fn key(&self) -> String;

    fn transform(&self, source: Mat) -> Result<Mat>;
}

/// Runs `steps` in order, each consuming the previous output.
pub fn apply_all(steps: &[Box<dyn Transformation>], source: Mat) -> Result<Mat> {
    steps.iter().try_fold(source, |img, step| step.transform(img))
}

/// Rectifies the region the user outlined on a scaled-down preview.
pub struct CropTransformation {
    pub coords: CropCoords,
    pub view_size: SizeF,
    transformer: Box<dyn PerspectiveTransformer>,
}

impl CropTransformation {
    pub fn new(coords: CropCoords, view_size: SizeF) -> Self {
        Self::with_transformer(coords, view_size, Box::new(AverageEdgeTransformer))
    }

    pub fn with_transformer(
        coords: CropCoords,
        view_size: SizeF,
        transformer: Box<dyn PerspectiveTransformer>,
    ) -> Self {
        Self {
            coords,
            view_size,
            transformer,
        }
    }

    /// `coords` mapped from view space into the pixel space of `source_size`.
    pub fn source_coords(&self, source_size: Size) -> Result<Shape> {
        if self.view_size.width <= 0.0 || self.view_size.height <= 0.0 {
            return Err(ScanError::InvalidArgument(format!(
                "view size {}x{} must be positive",
                self.view_size.width, self.view_size.height
            )));
        }
        let sx = source_size.width as f32 / self.view_size.width;
        let sy = source_size.height as f32 / self.view_size.height;
        Ok(self.coords.scale(sx, sy))
    }
}

impl Transformation for CropTransformation {
    fn key(&self) -> String {
        format!(
            "Crop. Coords: {}. View Size: {}x{}.",
            self.coords, self.view_size.width, self.view_size.height
        )
    }

    #[instrument(level = "debug", skip_all, fields(key = %self.key()))]
    fn transform(&self, source: Mat) -> Result<Mat> {
        let shape = self.source_coords(source.size())?;
        debug!(%shape, "crop in source pixels");
        self.transformer.transform_perspective(&source, &shape)
    }
}

/// Scales to fit inside `max_width` x `max_height`, keeping the aspect ratio.
#[derive(Debug, Clone, Copy)]
pub struct ResizeTransformation {
    pub max_width: u32,
    pub max_height: u32,
}

impl ResizeTransformation {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    pub fn target_size(&self, source: Size) -> Result<Size> {
        if source.is_empty() || self.max_width == 0 || self.max_height == 0 {
            return Err(ScanError::InvalidArgument(format!(
                "cannot fit {}x{} into {}x{}",
                source.width, source.height, self.max_width, self.max_height
            )));
        }
        let aspect = source.width as f64 / source.height as f64;
        let max_h = self.max_height as f64;
        let adjusted_w = (aspect * max_h).round();
        let (w, h) = if adjusted_w <= self.max_width as f64 {
            (adjusted_w, max_h)
        } else {
            let w = self.max_width as f64;
            (w, (w / adjusted_w * max_h).round())
        };
        Ok(Size::new((w as u32).max(1), (h as u32).max(1)))
    }
}

impl Transformation for ResizeTransformation {
    fn key(&self) -> String {
        format!(
            "Resize. Max Width: {}. Max Height: {}.",
            self.max_width, self.max_height
        )
    }

    fn transform(&self, source: Mat) -> Result<Mat> {
        let target = self.target_size(source.size())?;
        if target == source.size() {
            return Ok(source);
        }
        image_impl::resize(&source, target, INTER_LINEAR)
    }
}

/// Clockwise rotation by a multiple of 90 degrees.
#[derive(Debug, Clone, Copy)]
pub struct RotateTransformation {
    degrees: i32,
}

impl RotateTransformation {
    pub fn new(degrees: i32) -> Result<Self> {
        let degrees = degrees.rem_euclid(360);
        if degrees % 90 != 0 {
            return Err(ScanError::InvalidArgument(format!(
                "rotation {degrees} is not a multiple of 90"
            )));
        }
        Ok(Self { degrees })
    }

    pub fn degrees(&self) -> i32 {
        self.degrees
    }
}

impl Transformation for RotateTransformation {
    fn key(&self) -> String {
        format!("Rotate. Degrees: {}.", self.degrees)
    }

    fn transform(&self, source: Mat) -> Result<Mat> {
        let code = match self.degrees {
            90 => RotateCode::Clockwise90,
            180 => RotateCode::Rotate180,
            270 => RotateCode::CounterClockwise90,
            _ => return Ok(source),
        };
        image_impl::rotate(&source, code)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GrayscaleTransformation {
    applier: EffectApplier,
}

impl GrayscaleTransformation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transformation for GrayscaleTransformation {
    fn key(&self) -> String {
        "Grayscale".to_string()
    }

    fn transform(&self, source: Mat) -> Result<Mat> {
        self.applier.grayscale(&source)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimpleThresholdTransformation {
    applier: EffectApplier,
}

impl SimpleThresholdTransformation {
    pub fn new(cfg: EffectConfig) -> Self {
        Self {
            applier: EffectApplier::new(cfg),
        }
    }
}

impl Transformation for SimpleThresholdTransformation {
    fn key(&self) -> String {
        format!(
            "SimpleThreshold. Threshold: {}. Max: {}.",
            self.applier.cfg.simple_threshold, self.applier.cfg.max_value
        )
    }

    fn transform(&self, source: Mat) -> Result<Mat> {
        self.applier.simple_threshold(&source)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdaptiveThresholdTransformation {
    applier: EffectApplier,
}

impl AdaptiveThresholdTransformation {
    pub fn new(cfg: EffectConfig) -> Self {
        Self {
            applier: EffectApplier::new(cfg),
        }
    }
}

impl Transformation for AdaptiveThresholdTransformation {
    fn key(&self) -> String {
        format!(
            "AdaptiveThreshold. Block: {}. C: {}.",
            self.applier.cfg.adaptive_block_size, self.applier.cfg.adaptive_c
        )
    }

    fn transform(&self, source: Mat) -> Result<Mat> {
        self.applier.adaptive_threshold(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2f;

    fn p(x: f32, y: f32) -> Point2f {
        Point2f::new(x, y)
    }

    #[test]
    fn test_crop_rescales_view_coords() {
        let coords = Shape::new(p(30.0, 40.0), p(270.0, 40.0), p(30.0, 360.0), p(270.0, 360.0));
        let crop = CropTransformation::new(coords, SizeF::new(300.0, 400.0));
        let shape = crop.source_coords(Size::new(1500, 2000)).unwrap();
        assert_eq!(shape.top_left, p(150.0, 200.0));
        assert_eq!(shape.top_right, p(1350.0, 200.0));
        assert_eq!(shape.bottom_left, p(150.0, 1800.0));
        assert_eq!(shape.bottom_right, p(1350.0, 1800.0));
    }

    #[test]
    fn test_crop_output_size() {
        let coords = Shape::new(p(30.0, 40.0), p(270.0, 40.0), p(30.0, 360.0), p(270.0, 360.0));
        let crop = CropTransformation::new(coords, SizeF::new(300.0, 400.0));
        let out = crop.transform(Mat::zeros(200, 150, 3).unwrap()).unwrap();
        // 240x320 view region scaled by 0.5
        assert_eq!(out.size(), Size::new(120, 160));
    }

    #[test]
    fn test_crop_rejects_invalid_coords() {
        let q = p(10.0, 10.0);
        let crop = CropTransformation::new(Shape::new(q, q, q, q), SizeF::new(100.0, 100.0));
        let err = crop.transform(Mat::zeros(100, 100, 3).unwrap());
        assert!(matches!(err, Err(ScanError::DegenerateShape(_))));
    }

    #[test]
    fn test_crop_key_mentions_parameters() {
        let coords = Shape::whole_image(10.0, 20.0);
        let crop = CropTransformation::new(coords, SizeF::new(10.0, 20.0));
        assert!(crop.key().starts_with("Crop. Coords: "));
        assert!(crop.key().ends_with("View Size: 10x20."));
    }

    #[test]
    fn test_resize_fit_policy() {
        let fit = ResizeTransformation::new(1080, 1920);
        assert_eq!(fit.target_size(Size::new(1000, 2000)).unwrap(), Size::new(960, 1920));
        assert_eq!(fit.target_size(Size::new(2000, 1000)).unwrap(), Size::new(1080, 540));
        assert!(fit.target_size(Size::new(0, 10)).is_err());
    }

    #[test]
    fn test_resize_transform() {
        let out = ResizeTransformation::new(50, 50)
            .transform(Mat::zeros(200, 100, 1).unwrap())
            .unwrap();
        assert_eq!(out.size(), Size::new(25, 50));
    }

    #[test]
    fn test_rotation_normalised() {
        assert_eq!(RotateTransformation::new(-90).unwrap().degrees(), 270);
        assert_eq!(RotateTransformation::new(450).unwrap().degrees(), 90);
        assert!(RotateTransformation::new(45).is_err());
        let out = RotateTransformation::new(90)
            .unwrap()
            .transform(Mat::zeros(10, 30, 3).unwrap())
            .unwrap();
        assert_eq!(out.size(), Size::new(10, 30));
    }

    #[test]
    fn test_chain_applies_in_order() {
        let steps: Vec<Box<dyn Transformation>> = vec![
            Box::new(RotateTransformation::new(90).unwrap()),
            Box::new(GrayscaleTransformation::new()),
            Box::new(ResizeTransformation::new(20, 20)),
        ];
        let out = apply_all(&steps, Mat::zeros(10, 40, 3).unwrap()).unwrap();
        assert_eq!(out.channels(), 1);
        assert_eq!(out.size(), Size::new(5, 20));
    }
}
