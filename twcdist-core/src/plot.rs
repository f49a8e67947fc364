// Imports
use std::{
    ops::Range,
    path::{Path, PathBuf},
};

use plotters::prelude::*;
use thiserror::Error;

use crate::{
    clustering::ThresholdEstimate,
    data::Float,
    io::{format_float, round_to},
    stats::Summary,
};

#[derive(Debug, Clone, Copy)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    pub nb_bins: usize,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self { width: 640, height: 480, nb_bins: 50 }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to draw the plot, {0}")]
    Drawing(String),
}

impl Error {
    fn drawing(err: impl std::fmt::Display) -> Self {
        Self::Drawing(err.to_string())
    }
}

/// `scores.png` → `scores_groups.png`, other paths get the suffix appended
pub fn groups_path<Q: AsRef<Path>>(filepath: Q) -> PathBuf {
    let filepath = filepath.as_ref().to_string_lossy();
    match filepath.strip_suffix(".png") {
        Some(stem) => PathBuf::from(format!("{stem}_groups.png")),
        None => PathBuf::from(format!("{filepath}_groups.png")),
    }
}

/// Equal-width bins spanning `[min, max]`, the last bin is closed on both ends
///
/// Returns the bin edges (`nb_bins + 1` of them) and the counts, a zero-width range is widened to `±0.5`.
pub fn histogram_bins(
    values: &[Float],
    nb_bins: usize,
) -> (Vec<Float>, Vec<u32>) {
    let nb_bins = nb_bins.max(1);
    if values.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let (mut min, mut max) = min_max(values);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }

    let width = (max - min) / nb_bins as Float;
    let edges = (0..=nb_bins).map(|idx| min + idx as Float * width).collect::<Vec<Float>>();
    let mut counts = vec![0_u32; nb_bins];
    for value in values {
        let idx = (((value - min) / width).floor() as usize).min(nb_bins - 1);
        counts[idx] += 1;
    }
    (edges, counts)
}

fn min_max(values: &[Float]) -> (Float, Float) {
    values.iter().fold((Float::INFINITY, Float::NEG_INFINITY), |(min, max), v| (min.min(*v), max.max(*v)))
}

/// Horizontal range covering the data and both threshold bands, with a small margin
fn x_range(
    values: &[Float],
    estimate: &ThresholdEstimate,
) -> Range<Float> {
    let (signature_lo, signature_hi) = estimate.signature.band();
    let (conserved_lo, conserved_hi) = estimate.conserved.band();
    let (min, max) = min_max(values);
    let min = [min, signature_lo, conserved_lo].into_iter().fold(Float::INFINITY, Float::min);
    let max = [max, signature_hi, conserved_hi].into_iter().fold(Float::NEG_INFINITY, Float::max);

    let margin = if max > min { (max - min) * 0.05 } else { 0.5 };
    (min - margin)..(max + margin)
}

fn threshold_styles() -> [(RGBColor, fn(&ThresholdEstimate) -> Summary); 2] {
    [
        (RED, |estimate: &ThresholdEstimate| estimate.signature),
        (GREEN, |estimate: &ThresholdEstimate| estimate.conserved),
    ]
}

fn draw_empty(
    root: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
    width: u32,
    height: u32,
) -> Result<(), Error> {
    root.draw(&Text::new(
        "No scores to display",
        ((width / 2) as i32 - 80, (height / 2) as i32),
        ("sans-serif", 20).into_font().color(&BLACK),
    ))
    .map_err(Error::drawing)?;
    root.present().map_err(Error::drawing)
}

/// Histogram of every score, the signature (red) and conserved (green) thresholds are drawn as vertical lines
/// surrounded by a translucent band spanning one standard deviation
pub fn plot_histogram<Q: AsRef<Path>>(
    filepath: Q,
    values: &[Float],
    estimate: &ThresholdEstimate,
    options: &PlotOptions,
) -> Result<(), Error> {
    let root = BitMapBackend::new(filepath.as_ref(), (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(Error::drawing)?;
    if values.is_empty() {
        return draw_empty(&root, options.width, options.height);
    }

    let (edges, counts) = histogram_bins(values, options.nb_bins);
    let y_max = counts.iter().copied().max().unwrap_or(0) + 1;

    // two-line title, the first line sits above the chart caption
    let area = root
        .titled(
            &format!(
                "Signature threshold at {} determined with {} kmeans.",
                format_float(round_to(estimate.signature.mean, 2)),
                estimate.nb_clusters
            ),
            ("sans-serif", 14),
        )
        .map_err(Error::drawing)?;
    let mut chart = ChartBuilder::on(&area)
        .caption(
            format!("Conserved threshold at {}", format_float(round_to(estimate.conserved.mean, 2))),
            ("sans-serif", 14),
        )
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(x_range(values, estimate), 0..y_max)
        .map_err(Error::drawing)?;

    chart.configure_mesh().disable_mesh().x_desc("TWC").y_desc("Count").draw().map_err(Error::drawing)?;

    for (color, select) in threshold_styles() {
        let (lo, hi) = select(estimate).band();
        chart
            .draw_series(std::iter::once(Rectangle::new([(lo, 0), (hi, y_max)], color.mix(0.3).filled())))
            .map_err(Error::drawing)?;
    }

    chart
        .draw_series(
            edges
                .windows(2)
                .zip(counts.iter())
                .map(|(edge, count)| Rectangle::new([(edge[0], 0), (edge[1], *count)], BLUE.mix(0.7).filled())),
        )
        .map_err(Error::drawing)?;

    for (color, select) in threshold_styles() {
        let x = select(estimate).mean;
        chart
            .draw_series(LineSeries::new([(x, 0), (x, y_max)], color.stroke_width(2)))
            .map_err(Error::drawing)?;
    }

    root.present().map_err(Error::drawing)
}

/// Scatter plot of each score (x) against its index (y), colored by cluster label, annotated like the histogram
pub fn plot_groups<Q: AsRef<Path>>(
    filepath: Q,
    values: &[Float],
    labels: &[usize],
    estimate: &ThresholdEstimate,
    options: &PlotOptions,
) -> Result<(), Error> {
    let root = BitMapBackend::new(filepath.as_ref(), (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(Error::drawing)?;
    if values.is_empty() {
        return draw_empty(&root, options.width, options.height);
    }

    let y_max = values.len() as Float;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("TWC signature threshold {}", format_float(round_to(estimate.signature.mean, 2))),
            ("sans-serif", 16),
        )
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(x_range(values, estimate), 0.0..y_max)
        .map_err(Error::drawing)?;

    chart.configure_mesh().disable_mesh().x_desc("TWC").y_desc("Index").draw().map_err(Error::drawing)?;

    for (color, select) in threshold_styles() {
        let (lo, hi) = select(estimate).band();
        chart
            .draw_series(std::iter::once(Rectangle::new([(lo, 0.0), (hi, y_max)], color.mix(0.3).filled())))
            .map_err(Error::drawing)?;
    }

    chart
        .draw_series(values.iter().zip(labels.iter()).enumerate().map(|(idx, (value, label))| {
            Circle::new((*value, idx as Float), 3, Palette99::pick(*label).filled())
        }))
        .map_err(Error::drawing)?;

    for (color, select) in threshold_styles() {
        let x = select(estimate).mean;
        chart
            .draw_series(LineSeries::new([(x, 0.0), (x, y_max)], color.stroke_width(2)))
            .map_err(Error::drawing)?;
    }

    root.present().map_err(Error::drawing)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assert_float_eq;

    #[test]
    fn groups_path_test() {
        assert_eq!(groups_path("out/twc.png"), PathBuf::from("out/twc_groups.png"));
        assert_eq!(groups_path("twc.svg"), PathBuf::from("twc.svg_groups.png"));
    }

    #[test]
    fn histogram_bins_test() {
        let (edges, counts) = histogram_bins(&[0.0, 0.1, 0.5, 0.9, 1.0], 2);
        assert_eq!(edges.len(), 3);
        assert_float_eq!(edges[1], 0.5);
        // the maximum falls in the last bin
        assert_eq!(counts, vec![2, 3]);
        assert_eq!(counts.iter().sum::<u32>(), 5);
    }

    #[test]
    fn histogram_bins_constant_test() {
        let (edges, counts) = histogram_bins(&[3.0, 3.0, 3.0], 4);
        assert_float_eq!(edges[0], 2.5);
        assert_float_eq!(edges[4], 3.5);
        assert_eq!(counts.iter().sum::<u32>(), 3);
        assert!(histogram_bins(&[], 4).1.is_empty());
    }

    fn estimate() -> ThresholdEstimate {
        ThresholdEstimate {
            nb_clusters: 2,
            signature: Summary { mean: 0.25, std: 0.05 },
            conserved: Summary { mean: 9.75, std: 0.1 },
            low_thresholds: vec![0.2, 0.3],
            high_thresholds: vec![9.65, 9.85],
            labels: vec![0, 0, 1, 1],
        }
    }

    #[test]
    fn plot_empty_test() {
        let dir = tempfile::tempdir().unwrap();
        let histogram = dir.path().join("empty.png");
        let options = PlotOptions { width: 200, height: 150, nb_bins: 10 };

        plot_histogram(&histogram, &[], &estimate(), &options).unwrap();
        plot_groups(groups_path(&histogram), &[], &[], &estimate(), &options).unwrap();

        assert!(histogram.is_file());
        assert!(dir.path().join("empty_groups.png").is_file());
    }

    #[test]
    fn plot_scores_test() {
        let dir = tempfile::tempdir().unwrap();
        let histogram = dir.path().join("twc.png");
        let values = [0.1, 0.3, 9.6, 9.9];

        plot_histogram(&histogram, &values, &estimate(), &PlotOptions::default()).unwrap();
        plot_groups(groups_path(&histogram), &values, &estimate().labels, &estimate(), &PlotOptions::default())
            .unwrap();

        assert!(std::fs::metadata(&histogram).unwrap().len() > 0);
        assert!(std::fs::metadata(dir.path().join("twc_groups.png")).unwrap().len() > 0);
    }

    #[test]
    fn x_range_covers_bands_test() {
        let estimate = ThresholdEstimate {
            nb_clusters: 2,
            signature: Summary { mean: -1.0, std: 2.0 },
            conserved: Summary { mean: 4.0, std: 0.5 },
            low_thresholds: Vec::new(),
            high_thresholds: Vec::new(),
            labels: Vec::new(),
        };
        let range = x_range(&[0.0, 1.0, 2.0], &estimate);
        assert!(range.start < -3.0);
        assert!(range.end > 4.5);
    }
}
