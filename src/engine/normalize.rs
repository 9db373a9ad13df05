//! Metric Normaliser (C2): per-metric descriptors and the two bounded-score
//! policies (spec.md §4.2).

/// Precomputed statistics for one raw metric across the active driver set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDescriptor {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub range: f64,
}

impl MetricDescriptor {
    /// Build a descriptor from raw values. Empty input returns the neutral
    /// descriptor `{mean=0.5, std=0.5}` (spec.md §4.2 edge case).
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return MetricDescriptor {
                min: 0.0,
                max: 0.0,
                mean: 0.5,
                std: 0.5,
                range: 0.0,
            };
        }
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let variance =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        MetricDescriptor {
            min,
            max,
            mean,
            std: variance.sqrt(),
            range: max - min,
        }
    }
}

/// Which normalisation policy to apply. Both are specified (spec.md §4.2,
/// §9); `Linear` is this crate's chosen deployment/test target (see
/// `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizationPolicy {
    #[default]
    Linear,
    ZScoreSigmoid,
}

impl NormalizationPolicy {
    /// Map one raw value to a bounded `[0, 1]` score. `lower_is_better`
    /// inverts the scale for metrics such as `qualyGapMs` or `gridPosition`.
    pub fn normalize(self, value: f64, descriptor: &MetricDescriptor, lower_is_better: bool) -> f64 {
        let score = match self {
            NormalizationPolicy::Linear => {
                if descriptor.range == 0.0 {
                    0.5
                } else {
                    ((value - descriptor.min) / descriptor.range).clamp(0.0, 1.0)
                }
            }
            NormalizationPolicy::ZScoreSigmoid => {
                if descriptor.std == 0.0 {
                    0.5
                } else {
                    let z = (value - descriptor.mean) / descriptor.std;
                    1.0 / (1.0 + (-z).exp())
                }
            }
        };
        if lower_is_better {
            1.0 - score
        } else {
            score
        }
    }
}
