use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::contours::find_contours;
use crate::error::Result;
use crate::geometry::{self, Point2f, Shape, Size};
use crate::image_impl::{self, Mat, ThresholdType, INTER_LINEAR};
use crate::orderer::{CentroidOrderer, CoordsOrderer};
use crate::types::{Denoise, DetectorConfig};

/// Locates the document outline in an image.
pub trait ShapeDetector: Send + Sync {
    /// Always yields a shape; the full image bounds when nothing is found.
    fn detect_shape(&self, src: &Mat) -> Shape;
}

#[derive(Debug, Clone)]
struct Candidate {
    points: Vec<Point2f>,
    area: f64,
}

/// Contour-based quadrilateral search over every colour plane and a ladder
/// of binarisations (Canny first, then evenly spaced cuts).
pub struct DocShapeDetector {
    pub cfg: DetectorConfig,
    orderer: Box<dyn CoordsOrderer>,
}

impl DocShapeDetector {
    pub fn new(cfg: DetectorConfig) -> Self {
        Self::with_orderer(cfg, Box::new(CentroidOrderer))
    }

    pub fn with_orderer(cfg: DetectorConfig, orderer: Box<dyn CoordsOrderer>) -> Self {
        Self { cfg, orderer }
    }

    /// Best quadrilateral in source pixel coordinates, unordered.
    fn find_candidate(&self, src: &Mat) -> Result<Option<Vec<Point2f>>> {
        let (cols, rows) = (src.cols(), src.rows());
        let scale_ratio = self.cfg.target_max_dim as f64 / cols.max(rows) as f64;
        let work_size = Size::new(
            ((cols as f64 * scale_ratio).round() as u32).max(1),
            ((rows as f64 * scale_ratio).round() as u32).max(1),
        );
        debug!(scale_ratio, width = work_size.width, height = work_size.height, "working copy");

        let work = image_impl::resize(src, work_size, INTER_LINEAR)?;
        let denoised = match self.cfg.denoise {
            Denoise::Median => image_impl::median_blur(&work, self.cfg.median_ksize)?,
            Denoise::Gaussian => image_impl::gaussian_blur(&work, self.cfg.gaussian_ksize, 0.0)?,
        };
        drop(work);

        let planes = if self.cfg.per_channel {
            let colour = if denoised.channels() >= 3 { 3 } else { 1 };
            (0..colour)
                .map(|c| image_impl::extract_channel(&denoised, c))
                .collect::<Result<Vec<_>>>()?
        } else {
            vec![image_impl::cvt_gray(&denoised)?]
        };
        drop(denoised);

        let passes: Vec<(usize, u32)> = (0..planes.len())
            .flat_map(|p| (0..self.cfg.threshold_levels).map(move |l| (p, l)))
            .collect();
        let image_area = work_size.width as f64 * work_size.height as f64;

        #[cfg(feature = "parallel")]
        let results: Vec<Result<Vec<Candidate>>> = passes
            .par_iter()
            .map(|&(p, l)| self.run_pass(&planes[p], l, image_area))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let results: Vec<Result<Vec<Candidate>>> = passes
            .iter()
            .map(|&(p, l)| self.run_pass(&planes[p], l, image_area))
            .collect();

        // Largest area wins, earliest pass and contour on ties.
        let mut best: Option<Candidate> = None;
        for result in results {
            for candidate in result? {
                if best.as_ref().map_or(true, |b| candidate.area > b.area) {
                    best = Some(candidate);
                }
            }
        }

        let Some(best) = best else {
            return Ok(None);
        };
        debug!(area = best.area, fraction = best.area / image_area, "selected quadrilateral");

        let sx = cols as f32 / work_size.width as f32;
        let sy = rows as f32 / work_size.height as f32;
        Ok(Some(best.points.iter().map(|p| p.scale(sx, sy)).collect()))
    }

    fn binarize(&self, plane: &Mat, level: u32) -> Result<Mat> {
        if level == 0 {
            let edges = image_impl::canny(plane, self.cfg.canny_low, self.cfg.canny_high)?;
            image_impl::dilate(&edges, self.cfg.dilate_kernel)
        } else {
            let cut = level * 255 / self.cfg.threshold_levels;
            image_impl::threshold(plane, cut as f64, 255, ThresholdType::Binary)
        }
    }

    fn run_pass(&self, plane: &Mat, level: u32, image_area: f64) -> Result<Vec<Candidate>> {
        let binary = self.binarize(plane, level)?;
        let mut contours = find_contours(&binary)?;
        drop(binary);

        if let Some(k) = self.cfg.top_k {
            contours.sort_by(|a, b| b.area().total_cmp(&a.area()));
            contours.truncate(k);
        }
        let total = contours.len();

        let mut found = Vec::new();
        for contour in &contours {
            let epsilon = contour.perimeter() * self.cfg.approx_epsilon_ratio;
            let approx = geometry::approx_poly_dp(&contour.points, epsilon, true);
            if let Some(area) = self.accept(&approx, image_area) {
                found.push(Candidate { points: approx, area });
                if self.cfg.top_k.is_some() {
                    break;
                }
            }
        }
        debug!(level, contours = total, candidates = found.len(), "pass done");
        Ok(found)
    }

    /// Area of `approx` when it is a plausible document outline.
    fn accept(&self, approx: &[Point2f], image_area: f64) -> Option<f64> {
        if approx.len() != 4 {
            return None;
        }
        let area = geometry::contour_area(approx);
        let fraction = area / image_area;
        if fraction < self.cfg.area_lower || fraction > self.cfg.area_upper {
            return None;
        }
        if !geometry::is_contour_convex(approx) {
            return None;
        }
        if geometry::max_abs_cosine(approx) > self.cfg.max_cosine {
            return None;
        }
        Some(area)
    }
}

impl Default for DocShapeDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl ShapeDetector for DocShapeDetector {
    #[instrument(level = "debug", skip_all, fields(rows = src.rows(), cols = src.cols()))]
    fn detect_shape(&self, src: &Mat) -> Shape {
        let start = Instant::now();
        let whole = Shape::whole_image(src.cols() as f32, src.rows() as f32);

        let shape = match self.find_candidate(src) {
            Ok(Some(points)) => match self.orderer.order(&points) {
                Some(shape) => shape,
                None => {
                    warn!("candidate corners could not be ordered, using image bounds");
                    whole
                }
            },
            Ok(None) => {
                warn!("no document outline found, using image bounds");
                whole
            }
            Err(e) => {
                warn!(error = %e, "detection failed, using image bounds");
                whole
            }
        };

        info!(%shape, elapsed_ms = start.elapsed().as_millis() as u64, "shape detected");
        shape
    }
}
