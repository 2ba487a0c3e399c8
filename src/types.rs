use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Noise reduction applied to the working image before edge/threshold passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Denoise {
    Median,
    Gaussian,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Longest side of the working copy the search runs on.
    pub target_max_dim: u32,
    pub median_ksize: u32,
    pub gaussian_ksize: u32,
    pub denoise: Denoise,
    /// Level 0 is the Canny pass, levels above it are binary cuts.
    pub threshold_levels: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Square dilation after Canny; 0 or 1 disables it.
    pub dilate_kernel: u32,
    pub approx_epsilon_ratio: f64,
    pub area_lower: f64,
    pub area_upper: f64,
    pub max_cosine: f64,
    pub per_channel: bool,
    /// Only polygon-fit the K largest contours and take the first quadrilateral.
    pub top_k: Option<usize>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            target_max_dim: 600,
            median_ksize: 9,
            gaussian_ksize: 5,
            denoise: Denoise::Median,
            threshold_levels: 2,
            canny_low: 10.0,
            canny_high: 20.0,
            dilate_kernel: 3,
            approx_epsilon_ratio: 0.02,
            area_lower: 0.2,
            area_upper: 0.98,
            max_cosine: 0.3,
            per_channel: true,
            top_k: None,
        }
    }
}

impl DetectorConfig {
    /// Grayscale, Gaussian blur, one Canny pass over the five largest contours.
    pub fn single_pass() -> Self {
        Self {
            denoise: Denoise::Gaussian,
            threshold_levels: 1,
            canny_low: 75.0,
            canny_high: 200.0,
            dilate_kernel: 0,
            area_lower: 0.0,
            area_upper: 1.0,
            max_cosine: 1.0,
            per_channel: false,
            top_k: Some(5),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    pub simple_threshold: f64,
    pub max_value: u8,
    pub adaptive_block_size: u32,
    pub adaptive_c: f64,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            simple_threshold: 127.0,
            max_value: 255,
            adaptive_block_size: 55,
            adaptive_c: 15.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

/// Everything a `DocScanner` is built from; what `--config` files contain.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    pub detector: DetectorConfig,
    pub effects: EffectConfig,
    pub output: OutputConfig,
}

impl GlobalConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
