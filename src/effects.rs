use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::image_impl::{self, AdaptiveMethod, Mat, ThresholdType};
use crate::types::EffectConfig;

/// Cosmetic post-processing for a rectified page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    #[default]
    None,
    Grayscale,
    /// Global binary threshold.
    Binary,
    /// Gaussian adaptive threshold.
    Adaptive,
}

#[derive(Debug, Clone, Default)]
pub struct EffectApplier {
    pub cfg: EffectConfig,
}

impl EffectApplier {
    pub fn new(cfg: EffectConfig) -> Self {
        Self { cfg }
    }

    pub fn apply(&self, src: &Mat, effect: Effect) -> Result<Mat> {
        debug!(?effect, "applying effect");
        match effect {
            Effect::None => Ok(src.clone()),
            Effect::Grayscale => self.grayscale(src),
            Effect::Binary => self.simple_threshold(src),
            Effect::Adaptive => self.adaptive_threshold(src),
        }
    }

    pub fn grayscale(&self, src: &Mat) -> Result<Mat> {
        image_impl::cvt_gray(src)
    }

    pub fn simple_threshold(&self, src: &Mat) -> Result<Mat> {
        let gray = image_impl::cvt_gray(src)?;
        image_impl::threshold(
            &gray,
            self.cfg.simple_threshold,
            self.cfg.max_value,
            ThresholdType::Binary,
        )
    }

    pub fn adaptive_threshold(&self, src: &Mat) -> Result<Mat> {
        let gray = image_impl::cvt_gray(src)?;
        image_impl::adaptive_threshold(
            &gray,
            self.cfg.max_value,
            AdaptiveMethod::Gaussian,
            ThresholdType::Binary,
            self.cfg.adaptive_block_size,
            self.cfg.adaptive_c,
        )
    }
}
