//! Image matrix layer: an owned `(rows, cols, channels)` byte array plus the
//! handful of OpenCV-style operations the scanner is built on.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, LumaA, Rgb, Rgba};
use nalgebra::{DMatrix, Matrix3};
use ndarray::{Array3, Axis};

use crate::error::{Result, ScanError};
use crate::geometry::{Point2f, Size};

pub const INTER_NEAREST: i32 = 0;
pub const INTER_LINEAR: i32 = 1;
pub const INTER_CUBIC: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    Binary,
    BinaryInv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveMethod {
    Mean,
    Gaussian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateCode {
    Clockwise90,
    Rotate180,
    CounterClockwise90,
}

/// Owned 8-bit image with 1 to 4 interleaved channels (luma, luma-alpha, RGB, RGBA).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mat {
    data: Array3<u8>,
}

impl Mat {
    pub fn new(data: Array3<u8>) -> Result<Self> {
        let channels = data.dim().2;
        if !(1..=4).contains(&channels) {
            return Err(ScanError::InvalidImage(format!(
                "unsupported channel count {channels}"
            )));
        }
        Ok(Self { data })
    }

    pub fn zeros(rows: usize, cols: usize, channels: usize) -> Result<Self> {
        Self::new(Array3::zeros((rows, cols, channels)))
    }

    /// Wraps a row-major interleaved buffer.
    pub fn from_raw(width: u32, height: u32, channels: usize, buf: Vec<u8>) -> Result<Self> {
        let data = Array3::from_shape_vec((height as usize, width as usize, channels), buf)
            .map_err(|e| ScanError::InvalidImage(e.to_string()))?;
        Self::new(data)
    }

    pub fn from_gray(img: &GrayImage) -> Result<Self> {
        let (w, h) = img.dimensions();
        Self::from_raw(w, h, 1, img.as_raw().clone())
    }

    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    pub fn channels(&self) -> usize {
        self.data.dim().2
    }

    pub fn size(&self) -> Size {
        Size::new(self.cols() as u32, self.rows() as u32)
    }

    pub fn empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    pub fn at(&self, row: usize, col: usize, channel: usize) -> u8 {
        self.data[[row, col, channel]]
    }

    pub fn as_array(&self) -> &Array3<u8> {
        &self.data
    }

    /// Row-major interleaved bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.data.iter().copied().collect()
    }

    pub fn to_bitmap(&self) -> Result<DynamicImage> {
        to_bitmap(self)
    }

    fn ensure_not_empty(&self, op: &str) -> Result<()> {
        if self.empty() {
            return Err(ScanError::empty_image(op));
        }
        Ok(())
    }

    fn to_gray_image(&self) -> Result<GrayImage> {
        let (w, h) = (self.cols() as u32, self.rows() as u32);
        let plane = if self.channels() == 1 {
            self.to_vec()
        } else {
            cvt_gray(self)?.to_vec()
        };
        GrayImage::from_raw(w, h, plane)
            .ok_or_else(|| ScanError::InvalidImage("gray buffer size mismatch".to_string()))
    }
}

/// Decodes a file into a matrix.
pub fn imread<P: AsRef<std::path::Path>>(path: P) -> Result<Mat> {
    let img = image::open(path)?;
    to_matrix(&img)
}

pub fn imwrite<P: AsRef<std::path::Path>>(path: P, img: &Mat) -> Result<()> {
    to_bitmap(img)?.save(path)?;
    Ok(())
}

/// Copies a decoded image into a matrix. 8-bit formats round-trip exactly,
/// anything wider is narrowed to RGBA8 first.
pub fn to_matrix(img: &DynamicImage) -> Result<Mat> {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return Err(ScanError::empty_image("to_matrix"));
    }
    match img {
        DynamicImage::ImageLuma8(buf) => Mat::from_raw(w, h, 1, buf.as_raw().clone()),
        DynamicImage::ImageLumaA8(buf) => Mat::from_raw(w, h, 2, buf.as_raw().clone()),
        DynamicImage::ImageRgb8(buf) => Mat::from_raw(w, h, 3, buf.as_raw().clone()),
        DynamicImage::ImageRgba8(buf) => Mat::from_raw(w, h, 4, buf.as_raw().clone()),
        other => Mat::from_raw(w, h, 4, other.to_rgba8().into_raw()),
    }
}

pub fn to_bitmap(mat: &Mat) -> Result<DynamicImage> {
    mat.ensure_not_empty("to_bitmap")?;
    let (w, h) = (mat.cols() as u32, mat.rows() as u32);
    let raw = mat.to_vec();
    let mismatch = || ScanError::InvalidImage("bitmap buffer size mismatch".to_string());
    let img = match mat.channels() {
        1 => DynamicImage::ImageLuma8(
            ImageBuffer::<Luma<u8>, _>::from_raw(w, h, raw).ok_or_else(mismatch)?,
        ),
        2 => DynamicImage::ImageLumaA8(
            ImageBuffer::<LumaA<u8>, _>::from_raw(w, h, raw).ok_or_else(mismatch)?,
        ),
        3 => DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, raw).ok_or_else(mismatch)?,
        ),
        4 => DynamicImage::ImageRgba8(
            ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, raw).ok_or_else(mismatch)?,
        ),
        c => {
            return Err(ScanError::InvalidImage(format!(
                "unsupported channel count {c}"
            )))
        }
    };
    Ok(img)
}

/// Single-channel luma, alpha ignored.
pub fn cvt_gray(src: &Mat) -> Result<Mat> {
    src.ensure_not_empty("cvt_gray")?;
    match src.channels() {
        1 => Ok(src.clone()),
        2 => extract_channel(src, 0),
        _ => {
            let gray = Array3::from_shape_fn((src.rows(), src.cols(), 1), |(y, x, _)| {
                let r = src.data[[y, x, 0]] as u32;
                let g = src.data[[y, x, 1]] as u32;
                let b = src.data[[y, x, 2]] as u32;
                ((r * 299 + g * 587 + b * 114 + 500) / 1000) as u8
            });
            Mat::new(gray)
        }
    }
}

pub fn extract_channel(src: &Mat, channel: usize) -> Result<Mat> {
    src.ensure_not_empty("extract_channel")?;
    if channel >= src.channels() {
        return Err(ScanError::InvalidArgument(format!(
            "channel {channel} out of range for {}-channel image",
            src.channels()
        )));
    }
    let plane = src
        .data
        .index_axis(Axis(2), channel)
        .to_owned()
        .insert_axis(Axis(2));
    Mat::new(plane)
}

fn check_odd_ksize(ksize: u32, min: u32, op: &str) -> Result<()> {
    if ksize < min || ksize % 2 == 0 {
        return Err(ScanError::InvalidArgument(format!(
            "{op}: kernel size {ksize} must be odd and >= {min}"
        )));
    }
    Ok(())
}

fn gaussian_kernel(ksize: usize, sigma: f64) -> Vec<f32> {
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((ksize as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let half = (ksize / 2) as f64;
    let weights: Vec<f64> = (0..ksize)
        .map(|i| {
            let d = i as f64 - half;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights.iter().map(|w| (w / total) as f32).collect()
}

/// Separable convolution per channel plane. Borders are replicated by
/// `imageproc`; accumulation stays in `f32` and is rounded once.
fn separable_filter(src: &Mat, kernel: &[f32]) -> Result<Mat> {
    let (rows, cols, channels) = src.data.dim();
    let mut out = Array3::<u8>::zeros((rows, cols, channels));
    for c in 0..channels {
        let plane: Vec<f32> = src
            .data
            .index_axis(Axis(2), c)
            .iter()
            .map(|&v| f32::from(v))
            .collect();
        let plane = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(cols as u32, rows as u32, plane)
            .ok_or_else(|| ScanError::InvalidImage("plane size mismatch".to_string()))?;
        let filtered = imageproc::filter::separable_filter_equal(&plane, kernel);
        for (x, y, px) in filtered.enumerate_pixels() {
            out[[y as usize, x as usize, c]] = px[0].round().clamp(0.0, 255.0) as u8;
        }
    }
    Mat::new(out)
}

pub fn gaussian_blur(src: &Mat, ksize: u32, sigma: f64) -> Result<Mat> {
    src.ensure_not_empty("gaussian_blur")?;
    check_odd_ksize(ksize, 1, "gaussian_blur")?;
    if ksize == 1 {
        return Ok(src.clone());
    }
    separable_filter(src, &gaussian_kernel(ksize as usize, sigma))
}

pub fn median_blur(src: &Mat, ksize: u32) -> Result<Mat> {
    src.ensure_not_empty("median_blur")?;
    check_odd_ksize(ksize, 1, "median_blur")?;
    if ksize == 1 {
        return Ok(src.clone());
    }
    let radius = ksize / 2;
    let (w, h) = (src.cols() as u32, src.rows() as u32);
    let mut out = Array3::<u8>::zeros(src.data.dim());
    for c in 0..src.channels() {
        let plane = extract_channel(src, c)?.to_vec();
        let gray = GrayImage::from_raw(w, h, plane)
            .ok_or_else(|| ScanError::InvalidImage("plane size mismatch".to_string()))?;
        let filtered = imageproc::filter::median_filter(&gray, radius, radius);
        for (x, y, px) in filtered.enumerate_pixels() {
            out[[y as usize, x as usize, c]] = px[0];
        }
    }
    Mat::new(out)
}

/// Binary edge map (0/255). Colour input is converted to luma first.
pub fn canny(src: &Mat, low: f32, high: f32) -> Result<Mat> {
    src.ensure_not_empty("canny")?;
    if low > high {
        return Err(ScanError::InvalidArgument(format!(
            "canny: low threshold {low} above high threshold {high}"
        )));
    }
    let gray = src.to_gray_image()?;
    let edges = imageproc::edges::canny(&gray, low, high);
    Mat::from_gray(&edges)
}

/// Max filter with a square all-ones kernel, out-of-image pixels ignored.
pub fn dilate(src: &Mat, kernel_size: u32) -> Result<Mat> {
    src.ensure_not_empty("dilate")?;
    if kernel_size <= 1 {
        return Ok(src.clone());
    }
    let (rows, cols, channels) = src.data.dim();
    let before = (kernel_size as usize - 1) / 2;
    let after = kernel_size as usize / 2;

    let horizontal = Array3::from_shape_fn((rows, cols, channels), |(y, x, c)| {
        let lo = x.saturating_sub(before);
        let hi = (x + after).min(cols - 1);
        (lo..=hi).map(|sx| src.data[[y, sx, c]]).max().unwrap_or(0)
    });
    let out = Array3::from_shape_fn((rows, cols, channels), |(y, x, c)| {
        let lo = y.saturating_sub(before);
        let hi = (y + after).min(rows - 1);
        (lo..=hi).map(|sy| horizontal[[sy, x, c]]).max().unwrap_or(0)
    });
    Mat::new(out)
}

pub fn threshold(src: &Mat, thresh: f64, max_value: u8, kind: ThresholdType) -> Result<Mat> {
    src.ensure_not_empty("threshold")?;
    let out = src.data.mapv(|v| {
        let above = v as f64 > thresh;
        match (kind, above) {
            (ThresholdType::Binary, true) | (ThresholdType::BinaryInv, false) => max_value,
            _ => 0,
        }
    });
    Mat::new(out)
}

/// Local threshold against the neighbourhood mean (box or Gaussian weighted) minus `c`.
/// Single-channel input; colour input is converted to luma first.
pub fn adaptive_threshold(
    src: &Mat,
    max_value: u8,
    method: AdaptiveMethod,
    kind: ThresholdType,
    block_size: u32,
    c: f64,
) -> Result<Mat> {
    src.ensure_not_empty("adaptive_threshold")?;
    check_odd_ksize(block_size, 3, "adaptive_threshold")?;
    let gray = cvt_gray(src)?;
    let (rows, cols, _) = gray.data.dim();

    let local: Array3<f32> = match method {
        AdaptiveMethod::Gaussian => gaussian_blur(&gray, block_size, 0.0)?.data.mapv(f32::from),
        AdaptiveMethod::Mean => box_mean(&gray, block_size as usize),
    };

    let out = Array3::from_shape_fn((rows, cols, 1), |(y, x, _)| {
        let above = gray.data[[y, x, 0]] as f64 > local[[y, x, 0]].round() as f64 - c;
        match (kind, above) {
            (ThresholdType::Binary, true) | (ThresholdType::BinaryInv, false) => max_value,
            _ => 0,
        }
    });
    Mat::new(out)
}

/// Box mean with replicated borders, via a padded integral image.
fn box_mean(gray: &Mat, block: usize) -> Array3<f32> {
    let (rows, cols, _) = gray.data.dim();
    let half = block / 2;
    let (prow, pcol) = (rows + 2 * half, cols + 2 * half);
    let mut integral = vec![0u64; (prow + 1) * (pcol + 1)];
    for y in 0..prow {
        let sy = y.saturating_sub(half).min(rows - 1);
        let mut row_sum = 0u64;
        for x in 0..pcol {
            let sx = x.saturating_sub(half).min(cols - 1);
            row_sum += gray.data[[sy, sx, 0]] as u64;
            integral[(y + 1) * (pcol + 1) + x + 1] = integral[y * (pcol + 1) + x + 1] + row_sum;
        }
    }
    let area = (block * block) as f32;
    Array3::from_shape_fn((rows, cols, 1), |(y, x, _)| {
        let (y1, x1, y2, x2) = (y, x, y + block, x + block);
        let sum = integral[y2 * (pcol + 1) + x2] + integral[y1 * (pcol + 1) + x1]
            - integral[y1 * (pcol + 1) + x2]
            - integral[y2 * (pcol + 1) + x1];
        sum as f32 / area
    })
}

pub fn resize(src: &Mat, dsize: Size, interpolation: i32) -> Result<Mat> {
    src.ensure_not_empty("resize")?;
    if dsize.is_empty() {
        return Err(ScanError::InvalidArgument(format!(
            "resize: target {}x{} is empty",
            dsize.width, dsize.height
        )));
    }
    let filter = match interpolation {
        INTER_NEAREST => image::imageops::FilterType::Nearest,
        INTER_CUBIC => image::imageops::FilterType::CatmullRom,
        _ => image::imageops::FilterType::Triangle,
    };
    let resized = to_bitmap(src)?.resize_exact(dsize.width, dsize.height, filter);
    to_matrix(&resized)
}

pub fn rotate(src: &Mat, code: RotateCode) -> Result<Mat> {
    src.ensure_not_empty("rotate")?;
    let img = to_bitmap(src)?;
    let rotated = match code {
        RotateCode::Clockwise90 => img.rotate90(),
        RotateCode::Rotate180 => img.rotate180(),
        RotateCode::CounterClockwise90 => img.rotate270(),
    };
    to_matrix(&rotated)
}

/// Homography mapping each `src[i]` onto `dst[i]`.
pub fn get_perspective_transform(src: &[Point2f; 4], dst: &[Point2f; 4]) -> Result<Matrix3<f64>> {
    // Solve for 8 parameters with h22 = 1
    let mut a = DMatrix::<f64>::zeros(8, 8);
    let mut b = DMatrix::<f64>::zeros(8, 1);

    for i in 0..4 {
        let (x, y) = (src[i].x as f64, src[i].y as f64);
        let (u, v) = (dst[i].x as f64, dst[i].y as f64);

        a[(i, 0)] = x;
        a[(i, 1)] = y;
        a[(i, 2)] = 1.0;
        a[(i, 6)] = -u * x;
        a[(i, 7)] = -u * y;
        b[(i, 0)] = u;

        a[(i + 4, 3)] = x;
        a[(i + 4, 4)] = y;
        a[(i + 4, 5)] = 1.0;
        a[(i + 4, 6)] = -v * x;
        a[(i + 4, 7)] = -v * y;
        b[(i + 4, 0)] = v;
    }

    if let Some(h) = a.clone().lu().solve(&b) {
        let residual = (&a * &h - &b).norm();
        if residual < 1e-6 * (1.0 + b.norm()) {
            return Ok(Matrix3::new(
                h[(0, 0)], h[(1, 0)], h[(2, 0)],
                h[(3, 0)], h[(4, 0)], h[(5, 0)],
                h[(6, 0)], h[(7, 0)], 1.0,
            ));
        }
    }

    // Null space of the full 9-parameter system
    let mut a9 = DMatrix::<f64>::zeros(8, 9);
    for i in 0..4 {
        let (x, y) = (src[i].x as f64, src[i].y as f64);
        let (u, v) = (dst[i].x as f64, dst[i].y as f64);

        a9[(i, 0)] = x;
        a9[(i, 1)] = y;
        a9[(i, 2)] = 1.0;
        a9[(i, 6)] = -u * x;
        a9[(i, 7)] = -u * y;
        a9[(i, 8)] = -u;

        a9[(i + 4, 3)] = x;
        a9[(i + 4, 4)] = y;
        a9[(i + 4, 5)] = 1.0;
        a9[(i + 4, 6)] = -v * x;
        a9[(i + 4, 7)] = -v * y;
        a9[(i + 4, 8)] = -v;
    }

    let ata = a9.transpose() * &a9;
    let svd = ata.svd(true, false);
    let u = svd
        .u
        .ok_or_else(|| ScanError::DegenerateShape("homography SVD failed".to_string()))?;
    let (min_idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, &s)| if s < best.1 { (i, s) } else { best });
    let h = u.column(min_idx);

    Ok(Matrix3::new(
        h[0], h[1], h[2],
        h[3], h[4], h[5],
        h[6], h[7], h[8],
    ))
}

/// Inverse-mapped bilinear warp; samples outside the source clamp to the edge.
pub fn warp_perspective(src: &Mat, matrix: &Matrix3<f64>, dsize: Size) -> Result<Mat> {
    src.ensure_not_empty("warp_perspective")?;
    if dsize.is_empty() {
        return Err(ScanError::DegenerateShape(format!(
            "warp target {}x{} is empty",
            dsize.width, dsize.height
        )));
    }
    let m_inv = matrix
        .try_inverse()
        .ok_or_else(|| ScanError::DegenerateShape("matrix is not invertible".to_string()))?;

    let (m00, m01, m02) = (m_inv[(0, 0)], m_inv[(0, 1)], m_inv[(0, 2)]);
    let (m10, m11, m12) = (m_inv[(1, 0)], m_inv[(1, 1)], m_inv[(1, 2)]);
    let (m20, m21, m22) = (m_inv[(2, 0)], m_inv[(2, 1)], m_inv[(2, 2)]);
    let max_x = (src.cols() - 1) as f64;
    let max_y = (src.rows() - 1) as f64;
    let channels = src.channels();

    let mut out = Array3::<u8>::zeros((dsize.height as usize, dsize.width as usize, channels));
    for y in 0..dsize.height as usize {
        let y_f = y as f64;
        let m01y = m01 * y_f;
        let m11y = m11 * y_f;
        let m21y = m21 * y_f;

        for x in 0..dsize.width as usize {
            let x_f = x as f64;
            let w = m20 * x_f + m21y + m22;
            if w.abs() < f64::EPSILON {
                continue;
            }
            let sx = ((m00 * x_f + m01y + m02) / w).clamp(0.0, max_x);
            let sy = ((m10 * x_f + m11y + m12) / w).clamp(0.0, max_y);

            let x0 = sx.floor() as usize;
            let y0 = sy.floor() as usize;
            let x1 = (x0 + 1).min(max_x as usize);
            let y1 = (y0 + 1).min(max_y as usize);
            let fx = sx - x0 as f64;
            let fy = sy - y0 as f64;

            for c in 0..channels {
                let v = (1.0 - fx) * (1.0 - fy) * src.data[[y0, x0, c]] as f64
                    + fx * (1.0 - fy) * src.data[[y0, x1, c]] as f64
                    + (1.0 - fx) * fy * src.data[[y1, x0, c]] as f64
                    + fx * fy * src.data[[y1, x1, c]] as f64;
                out[[y, x, c]] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    Mat::new(out)
}
