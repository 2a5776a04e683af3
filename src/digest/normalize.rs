//! Affine and logarithmic label transforms.

use super::config::NormalizationMode;
use ndarray::ArrayD;

/// Relation between stored labels and physical values.
///
/// `mean` and `std` only matter in [`NormalizationMode::Linear`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalization {
    pub mode: NormalizationMode,
    pub mean: f64,
    pub std: f64,
}

impl Default for Normalization {
    fn default() -> Self {
        Self::new(NormalizationMode::None)
    }
}

impl Normalization {
    /// Identity statistics (`mean = 0`, `std = 1`) for `mode`.
    pub fn new(mode: NormalizationMode) -> Self {
        Self {
            mode,
            mean: 0.0,
            std: 1.0,
        }
    }

    #[inline]
    pub fn normalize_linear(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    #[inline]
    pub fn denormalize_linear(&self, value: f64) -> f64 {
        value * self.std + self.mean
    }

    /// `sign(v) · log10(1 + |v|)`.
    #[inline]
    pub fn normalize_log(value: f64) -> f64 {
        if value > 0.0 {
            (1.0 + value).log10()
        } else if value < 0.0 {
            -(1.0 - value).log10()
        } else {
            value
        }
    }

    /// Inverse of [`normalize_log`](Self::normalize_log): `10^v − 1` for
    /// positive `v`, `−10^(−v) + 1` for negative `v`, zero unchanged.
    #[inline]
    pub fn denormalize_log(value: f64) -> f64 {
        if value > 0.0 {
            10f64.powf(value) - 1.0
        } else if value < 0.0 {
            -(10f64.powf(-value)) + 1.0
        } else {
            value
        }
    }

    /// Physical value to stored value under the configured mode.
    pub fn normalize_value(&self, value: f64) -> f64 {
        match self.mode {
            NormalizationMode::None => value,
            NormalizationMode::Linear => self.normalize_linear(value),
            NormalizationMode::Log => Self::normalize_log(value),
        }
    }

    /// Stored value to physical value under the configured mode.
    pub fn denormalize_value(&self, value: f64) -> f64 {
        match self.mode {
            NormalizationMode::None => value,
            NormalizationMode::Linear => self.denormalize_linear(value),
            NormalizationMode::Log => Self::denormalize_log(value),
        }
    }

    pub fn normalize(&self, values: &ArrayD<f64>) -> ArrayD<f64> {
        values.mapv(|v| self.normalize_value(v))
    }

    pub fn denormalize(&self, values: &ArrayD<f64>) -> ArrayD<f64> {
        values.mapv(|v| self.denormalize_value(v))
    }

    /// Mean and population standard deviation over every entry of
    /// `values`. A zero or undefined spread falls back to `1.0`.
    pub fn fit(values: &ArrayD<f64>) -> (f64, f64) {
        let mean = values.mean().unwrap_or(0.0);
        let std = values.std(0.0);
        let std = if std > 0.0 { std } else { 1.0 };
        (mean, std)
    }
}
