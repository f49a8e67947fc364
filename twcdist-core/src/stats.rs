// Imports
use crate::data::{Float, ScoreMap};

pub const DEFAULT_STD_DEVS: Float = 2.0;

/// Arithmetic mean, `NaN` for an empty slice
pub fn mean(values: &[Float]) -> Float {
    values.iter().sum::<Float>() / values.len() as Float
}

/// Population standard deviation (no degrees-of-freedom correction), `NaN` for an empty slice
pub fn std_dev(values: &[Float]) -> Float {
    let mean = mean(values);
    (values.iter().map(|v| (v - mean).powi(2)).sum::<Float>() / values.len() as Float).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: Float,
    pub std: Float,
}

impl Summary {
    pub fn from_values(values: &[Float]) -> Self {
        Self { mean: mean(values), std: std_dev(values) }
    }

    /// `(mean - std, mean + std)`
    pub fn band(&self) -> (Float, Float) {
        (self.mean - self.std, self.mean + self.std)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnomalyReport {
    pub lower_limit: Float,
    pub upper_limit: Float,
    pub anomalies: ScoreMap,
}

/// Flags every score lying strictly outside of `mean ± std_devs * std`
pub fn find_anomalies(
    data: &ScoreMap,
    std_devs: Float,
) -> AnomalyReport {
    let summary = Summary::from_values(&data.to_values());
    let cut_off = summary.std * std_devs;
    let lower_limit = summary.mean - cut_off;
    let upper_limit = summary.mean + cut_off;

    let anomalies = data.iter().filter(|(_, score)| *score > upper_limit || *score < lower_limit).collect();

    AnomalyReport { lower_limit, upper_limit, anomalies }
}

pub fn remove_anomalies(
    data: &ScoreMap,
    anomalies: &ScoreMap,
) -> ScoreMap {
    data.iter().filter(|(residue, _)| !anomalies.contains_key(residue)).collect()
}

/// Inserts every residue of `additions` missing from `data`, with `value` as its score
pub fn add_missing_with(
    data: &mut ScoreMap,
    value: Float,
    additions: &ScoreMap,
) {
    for residue in additions.keys() {
        if !data.contains_key(residue) {
            data.insert(residue, value);
        }
    }
}

pub fn reflect(data: &ScoreMap) -> ScoreMap {
    data.iter().map(|(residue, score)| (residue, -score)).collect()
}
