pub use crate::clustering::{
    ClusteringParameters, EstimationParameters, KMeansOutput, ThresholdEstimate, TrialOutcome, assign,
    estimate_thresholds, kmeans, run_trial,
};
pub use crate::color::{Colormap, data_to_colors, diverging_gradient};
pub use crate::data::{Datum, Float, ScoreMap};
pub use crate::io::{CompressionMethod, read_scores, read_scores_from_file, write_report, write_report_to_file};
pub use crate::plot::{PlotOptions, groups_path, plot_groups, plot_histogram};
pub use crate::simdata::Generator;
pub use crate::stats::{AnomalyReport, Summary, find_anomalies, mean, std_dev};
