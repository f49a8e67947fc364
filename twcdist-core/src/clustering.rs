// Imports
use indicatif::{MultiProgress, ParallelProgressIterator, ProgressIterator};
use itertools::Itertools;
use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use thiserror::Error;

use crate::{data::Float, stats::Summary};

pub const DEFAULT_NB_TRIALS: usize = 100;
pub const DEFAULT_NB_RESTARTS: usize = 20;
pub const DEFAULT_THRESHOLD: Float = 1e-5;
pub const DEFAULT_NB_ITERS_MAX: usize = 300;

/// Parameters of a single (multi-restart) one-dimensional k-means run
#[derive(Debug, Clone, Copy)]
pub struct ClusteringParameters {
    k: usize,
    nb_restarts: usize,
    threshold: Float,
    nb_iters_max: usize,
}

impl ClusteringParameters {
    pub fn new(
        k: usize,
        nb_restarts: usize,
        threshold: Float,
        nb_iters_max: usize,
    ) -> Self {
        Self { k, nb_restarts, threshold, nb_iters_max }
    }

    pub fn with_k(k: usize) -> Self {
        Self::new(k, DEFAULT_NB_RESTARTS, DEFAULT_THRESHOLD, DEFAULT_NB_ITERS_MAX)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn unshell(self) -> (usize, usize, Float, usize) {
        (self.k, self.nb_restarts, self.threshold, self.nb_iters_max)
    }
}

/// Parameters of the repeated-trial threshold estimation
#[derive(Debug, Clone, Copy)]
pub struct EstimationParameters {
    pub clustering: ClusteringParameters,
    pub nb_trials: usize,
    /// Base seed, trial `i` is seeded with `seed + i`; drawn from the OS when unset
    pub seed: Option<u64>,
    pub multithreading_flag: bool,
}

impl EstimationParameters {
    pub fn new(
        clustering: ClusteringParameters,
        nb_trials: usize,
        seed: Option<u64>,
        multithreading_flag: bool,
    ) -> Self {
        Self { clustering, nb_trials, seed, multithreading_flag }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansOutput {
    /// May hold fewer than `k` centroids, clusters that end up empty are dropped
    pub centroids: Vec<Float>,
    /// Mean absolute distance between each value and its nearest centroid
    pub distortion: Float,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialOutcome {
    /// Largest value of the cluster holding the global minimum
    pub low_threshold: Float,
    /// Smallest value of the cluster holding the global maximum
    pub high_threshold: Float,
    pub labels: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdEstimate {
    pub nb_clusters: usize,
    /// Signature threshold, aggregated low thresholds
    pub signature: Summary,
    /// Conserved threshold, aggregated high thresholds
    pub conserved: Summary,
    pub low_thresholds: Vec<Float>,
    pub high_thresholds: Vec<Float>,
    /// Labels of one additional reference trial
    pub labels: Vec<usize>,
}

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Cannot cluster an empty set of scores")]
    EmptyInput,
    #[error("The number of clusters must be at least 1")]
    ZeroClusters,
    #[error("Cannot form {k} clusters out of only {distinct} distinct score values")]
    TooManyClusters { k: usize, distinct: usize },
    #[error("The number of trials must be at least 1")]
    ZeroTrials,
    #[error("Encountered a non-finite score at index {0}")]
    NonFinite(usize),
}

fn validate(
    data: &[Float],
    k: usize,
) -> Result<(), Error> {
    if data.is_empty() {
        return Err(Error::EmptyInput);
    }
    if let Some(idx) = data.iter().position(|v| !v.is_finite()) {
        return Err(Error::NonFinite(idx));
    }
    if k == 0 {
        return Err(Error::ZeroClusters);
    }
    let distinct = data.iter().copied().sorted_by(Float::total_cmp).dedup().count();
    if k > distinct {
        return Err(Error::TooManyClusters { k, distinct });
    }
    Ok(())
}

/// Nearest-centroid labels and the matching distances, ties go to the lowest index
fn quantize(
    data: &[Float],
    centroids: &[Float],
) -> (Vec<usize>, Vec<Float>) {
    data.iter()
        .map(|value| {
            centroids
                .iter()
                .map(|centroid| (value - centroid).abs())
                .enumerate()
                .fold((0, Float::INFINITY), |(best_idx, best_dist), (idx, dist)| {
                    if dist < best_dist { (idx, dist) } else { (best_idx, best_dist) }
                })
        })
        .unzip()
}

/// Assigns every value to its nearest centroid
pub fn assign(
    data: &[Float],
    centroids: &[Float],
) -> Vec<usize> {
    quantize(data, centroids).0
}

/// Lloyd iterations from an initial guess, stops once the distortion improves by no more than `threshold`
fn lloyd(
    data: &[Float],
    mut centroids: Vec<Float>,
    threshold: Float,
    nb_iters_max: usize,
) -> KMeansOutput {
    let mut previous_distortion: Option<Float> = None;
    let mut distortion = Float::INFINITY;

    for _ in 0..nb_iters_max.max(1) {
        let (labels, distances) = quantize(data, &centroids);
        distortion = crate::stats::mean(&distances);

        let mut sums: Vec<Float> = vec![0.0; centroids.len()];
        let mut counts: Vec<usize> = vec![0; centroids.len()];
        for (value, label) in data.iter().zip_eq(labels.iter()) {
            sums[*label] += value;
            counts[*label] += 1;
        }
        centroids = sums
            .into_iter()
            .zip_eq(counts)
            .filter(|(_, count)| *count > 0)
            .map(|(sum, count)| sum / count as Float)
            .collect_vec();

        let improvement = previous_distortion.map_or(Float::INFINITY, |prev| (prev - distortion).abs());
        previous_distortion = Some(distortion);
        if improvement <= threshold {
            break;
        }
    }

    KMeansOutput { centroids, distortion }
}

/// One-dimensional k-means, initialized from `k` distinct observations drawn at random, restarted
/// `nb_restarts` times while keeping the codebook with the lowest distortion
pub fn kmeans(
    data: &[Float],
    params: &ClusteringParameters,
    rng: &mut impl Rng,
) -> Result<KMeansOutput, Error> {
    let (k, nb_restarts, threshold, nb_iters_max) = params.unshell();
    validate(data, k)?;

    (0..nb_restarts.max(1))
        .map(|_| {
            let guess = data.choose_multiple(&mut *rng, k).copied().collect_vec();
            lloyd(data, guess, threshold, nb_iters_max)
        })
        .min_by(|a, b| a.distortion.total_cmp(&b.distortion))
        .ok_or(Error::EmptyInput)
}

/// Clusters the data once and extracts the boundaries of its lowest and highest clusters
pub fn run_trial(
    data: &[Float],
    params: &ClusteringParameters,
    rng: &mut impl Rng,
) -> Result<TrialOutcome, Error> {
    let output = kmeans(data, params, rng)?;
    let labels = assign(data, &output.centroids);

    let (Some(min_idx), Some(max_idx)) =
        (data.iter().position_min_by(|a, b| a.total_cmp(b)), data.iter().position_max_by(|a, b| a.total_cmp(b)))
    else {
        return Err(Error::EmptyInput);
    };
    let (low_label, high_label) = (labels[min_idx], labels[max_idx]);

    let low_threshold = data
        .iter()
        .zip_eq(labels.iter())
        .filter(|&(_, label)| *label == low_label)
        .map(|(value, _)| *value)
        .fold(Float::NEG_INFINITY, Float::max);
    let high_threshold = data
        .iter()
        .zip_eq(labels.iter())
        .filter(|&(_, label)| *label == high_label)
        .map(|(value, _)| *value)
        .fold(Float::INFINITY, Float::min);

    Ok(TrialOutcome { low_threshold, high_threshold, labels })
}

/// Mean and spread of the per-trial thresholds
pub fn aggregate(thresholds: &[Float]) -> Summary {
    Summary::from_values(thresholds)
}

fn trial_rng(
    base_seed: u64,
    trial_idx: usize,
) -> StdRng {
    StdRng::seed_from_u64(base_seed.wrapping_add(trial_idx as u64))
}

/// Repeats `run_trial` `nb_trials` times, each trial with its own seeded RNG, and averages the thresholds
///
/// A single k-means run lands on a different boundary depending on its initialization, the averaged
/// thresholds together with their standard deviation are what gets reported.
pub fn estimate_thresholds(
    data: &[Float],
    params: &EstimationParameters,
    multi: Option<&MultiProgress>,
) -> Result<ThresholdEstimate, Error> {
    let EstimationParameters { clustering, nb_trials, seed, multithreading_flag } = *params;
    validate(data, clustering.k())?;
    if nb_trials == 0 {
        return Err(Error::ZeroTrials);
    }

    let base_seed: u64 = match seed {
        Some(seed) => seed,
        None => StdRng::from_os_rng().random(),
    };

    let pb = crate::utils::simple_progressbar(nb_trials, "k-means trials", multi);
    let outcomes: Vec<TrialOutcome> = if multithreading_flag {
        (0..nb_trials)
            .into_par_iter()
            .progress_with(pb.clone())
            .map(|idx| run_trial(data, &clustering, &mut trial_rng(base_seed, idx)))
            .collect::<Result<Vec<TrialOutcome>, Error>>()?
    } else {
        (0..nb_trials)
            .progress_with(pb.clone())
            .map(|idx| run_trial(data, &clustering, &mut trial_rng(base_seed, idx)))
            .collect::<Result<Vec<TrialOutcome>, Error>>()?
    };
    pb.finish();

    let reference = run_trial(data, &clustering, &mut trial_rng(base_seed, nb_trials))?;

    let (low_thresholds, high_thresholds): (Vec<Float>, Vec<Float>) =
        outcomes.iter().map(|outcome| (outcome.low_threshold, outcome.high_threshold)).unzip();

    Ok(ThresholdEstimate {
        nb_clusters: clustering.k(),
        signature: aggregate(&low_thresholds),
        conserved: aggregate(&high_thresholds),
        low_thresholds,
        high_thresholds,
        labels: reference.labels,
    })
}
