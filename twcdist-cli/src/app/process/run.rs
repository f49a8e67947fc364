use twcdist_core::{
    clustering::{ClusteringParameters, EstimationParameters, ThresholdEstimate},
    data::ScoreMap,
    io::{format_float, round_to},
    plot::PlotOptions,
    stats::{AnomalyReport, Summary},
    utils::greenify,
};

use super::*;

/// Everything a single run needs, independent from how the arguments were gathered
#[derive(Debug, Clone)]
pub struct PipelineParameters {
    pub input: PathBuf,
    pub output_png: PathBuf,
    pub output_csv: PathBuf,
    pub std_devs: f64,
    pub estimation: EstimationParameters,
    pub plot_options: PlotOptions,
}

impl PipelineParameters {
    fn from_matches(
        mat: &mut ArgMatches,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let input: PathBuf = mat.remove_one("input").context("Missing input filepath")?;
        let output_png: PathBuf = mat.remove_one("output-png").context("Missing output `.png` filepath")?;
        let output_csv: PathBuf = mat.remove_one("output-csv").context("Missing output `.csv` filepath")?;

        if !input.is_file() {
            bail!("Invalid filepath: '{}'", input.display())
        }

        let nb_clusters: usize = mat.remove_one("nb-clusters").unwrap_or(config.nb_clusters_default);
        if nb_clusters == 0 {
            bail!("The number of clusters must be at least 1")
        }
        let nb_trials: usize = mat.remove_one("trials").unwrap_or(config.nb_trials);
        if nb_trials == 0 {
            bail!("The number of trials must be at least 1")
        }
        let std_devs: f64 = mat.remove_one("std-devs").unwrap_or(config.std_devs);
        if !std_devs.is_finite() || std_devs < 0.0 {
            bail!("The number of standard deviations must be a non-negative number, got {std_devs}")
        }
        let seed: Option<u64> = mat.remove_one("seed").or(config.seed);
        let multithreading_flag = config.multithreading_flag && !mat.get_flag("no-multithreading");

        let clustering = ClusteringParameters::new(
            nb_clusters,
            config.kmeans_nb_restarts,
            config.kmeans_threshold,
            config.kmeans_nb_iters_max,
        );

        Ok(Self {
            input,
            output_png,
            output_csv,
            std_devs,
            estimation: EstimationParameters::new(clustering, nb_trials, seed, multithreading_flag),
            plot_options: PlotOptions {
                width: config.plot_width,
                height: config.plot_height,
                nb_bins: config.histogram_nb_bins,
            },
        })
    }
}

pub struct Analysis {
    pub scores: ScoreMap,
    pub report: AnomalyReport,
    pub estimate: ThresholdEstimate,
}

/// Loads the scores, flags the anomalies and estimates the thresholds
pub fn analyze(
    input: &Path,
    std_devs: f64,
    estimation: &EstimationParameters,
    multi: Option<&MultiProgress>,
) -> anyhow::Result<Analysis> {
    let spinner = twcdist_core::utils::simple_spinner(
        Some(format!("Loading scores from '{}'", input.display())),
        Some(100),
        multi,
    );
    let scores = twcdist_core::io::read_scores_from_file(input)
        .with_context(|| format!("Failed to load scores from '{}'", input.display()))?;
    spinner.finish_with_message(format!("Loaded {} scores from '{}'", scores.len(), input.display()));

    let report = twcdist_core::stats::find_anomalies(&scores, std_devs);

    let estimate = twcdist_core::clustering::estimate_thresholds(&scores.to_values(), estimation, multi)
        .context("Failed to estimate thresholds")?;

    Ok(Analysis { scores, report, estimate })
}

/// The whole load → statistics → clustering → plotting → report sequence
pub fn run_pipeline(
    params: &PipelineParameters,
    multi: Option<&MultiProgress>,
) -> anyhow::Result<Analysis> {
    let analysis = analyze(&params.input, params.std_devs, &params.estimation, multi)?;
    let values = analysis.scores.to_values();

    let groups_filepath = twcdist_core::plot::groups_path(&params.output_png);
    twcdist_core::plot::plot_groups(
        &groups_filepath,
        &values,
        &analysis.estimate.labels,
        &analysis.estimate,
        &params.plot_options,
    )
    .with_context(|| format!("Failed to render the cluster scatter plot to '{}'", groups_filepath.display()))?;

    twcdist_core::plot::plot_histogram(&params.output_png, &values, &analysis.estimate, &params.plot_options)
        .with_context(|| format!("Failed to render the histogram to '{}'", params.output_png.display()))?;

    twcdist_core::io::write_report_to_file(
        &params.output_csv,
        &analysis.estimate.signature,
        &analysis.report.anomalies,
    )
    .with_context(|| format!("Failed to write the report to '{}'", params.output_csv.display()))?;

    Ok(analysis)
}

/// `Min thr: 0.3, STD: 0.0\tMax thr: 9.6, STD: 0.0`, each value rounded to three decimals
fn threshold_line(
    signature: &Summary,
    conserved: &Summary,
) -> String {
    let rounded = |value: f64| format_float(round_to(value, 3));
    format!(
        "Min thr: {}, STD: {}\tMax thr: {}, STD: {}",
        rounded(signature.mean),
        rounded(signature.std),
        rounded(conserved.mean),
        rounded(conserved.std)
    )
}

pub fn process_run(
    mut mat: ArgMatches,
    config: &Config,
) -> anyhow::Result<()> {
    let params = PipelineParameters::from_matches(&mut mat, config)?;
    let multi = MultiProgress::new();

    let analysis = run_pipeline(&params, Some(&multi))?;

    let ThresholdEstimate { signature, conserved, .. } = analysis.estimate;
    println!("{}", threshold_line(&signature, &conserved));
    eprintln!(
        "{} {} anomalies beyond {} standard deviations (outside [{:.3}, {:.3}]), written to '{}'",
        greenify("✔"),
        style(analysis.report.anomalies.len()).bold(),
        params.std_devs,
        analysis.report.lower_limit,
        analysis.report.upper_limit,
        params.output_csv.display()
    );

    Ok(())
}

#[cfg(test)]
mod test {
    use indoc::indoc;

    use super::*;

    const INPUT: &str = indoc! {"
        resNum,TWC
        1,0.1
        2,-0.2
        3,0.0
        4,NA
        5,0.3
        6,-0.1
        7,0.2
        8,-0.3
        9,0.15
        10,-0.05
        11,0.05
        12,10.1
        13,9.8
        14,10.0
        15,NA
        16,9.9
        17,10.3
        18,9.7
        19,10.2
        20,9.6
        21,10.05
        22,9.95
    "};

    fn write_input(dir: &Path) -> PathBuf {
        let filepath = dir.join("twc.csv");
        std::fs::write(&filepath, INPUT).unwrap();
        filepath
    }

    fn estimation(k: usize) -> EstimationParameters {
        EstimationParameters::new(ClusteringParameters::with_k(k), 100, Some(2024), true)
    }

    #[test]
    fn analyze_two_groups_test() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());

        let analysis = analyze(&input, 1.0, &estimation(2), None).unwrap();

        assert_eq!(analysis.scores.len(), 20);
        assert!(!analysis.scores.contains_key("4"));
        // the largest score of the near-0 group
        assert!((analysis.estimate.signature.mean - 0.3).abs() < 1e-9);
        assert!(analysis.estimate.signature.std < 1e-9);
        assert!((analysis.estimate.conserved.mean - 9.6).abs() < 1e-9);

        let report = &analysis.report;
        assert!(report.anomalies.contains_key("8") && report.anomalies.contains_key("17"));
        assert!(!report.anomalies.contains_key("5") && !report.anomalies.contains_key("20"));
        for (residue, score) in analysis.scores.iter() {
            let outside = score < report.lower_limit || score > report.upper_limit;
            assert_eq!(report.anomalies.contains_key(residue), outside);
        }
    }

    #[test]
    fn analyze_report_order_test() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());

        let analysis = analyze(&input, 0.5, &estimation(2), None).unwrap();

        // both groups lie about one standard deviation away from the combined mean
        assert_eq!(analysis.report.anomalies.keys().collect::<Vec<_>>(), analysis.scores.keys().collect::<Vec<_>>());

        let output = twcdist_core::io::write_report(Vec::new(), &analysis.estimate.signature, &analysis.report.anomalies)
            .unwrap();
        let output = String::from_utf8(output).unwrap();
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "TWC signature threshold and STD 0.3,0.0");
        assert_eq!(lines.iter().filter(|line| **line == "Residue,TWC").count(), 1);
        assert_eq!(lines[1], "Residue,TWC");
        assert_eq!(lines[2], "1,0.1");
        assert_eq!(lines.len(), 2 + 20);
    }

    #[test]
    fn run_pipeline_test() {
        let dir = tempfile::tempdir().unwrap();
        let params = PipelineParameters {
            input: write_input(dir.path()),
            output_png: dir.path().join("out.png"),
            output_csv: dir.path().join("out.csv"),
            std_devs: 1.0,
            estimation: estimation(2),
            plot_options: PlotOptions::default(),
        };

        let analysis = run_pipeline(&params, None).unwrap();

        assert!(dir.path().join("out.png").is_file());
        assert!(dir.path().join("out_groups.png").is_file());
        assert_eq!(analysis.estimate.labels.len(), 20);

        let expected = indoc! {"
            TWC signature threshold and STD 0.3,0.0
            Residue,TWC
            2,-0.2
            3,0.0
            6,-0.1
            8,-0.3
            10,-0.05
            12,10.1
            14,10.0
            17,10.3
            19,10.2
            21,10.05
        "};
        assert_eq!(std::fs::read_to_string(dir.path().join("out.csv")).unwrap(), expected);
    }

    #[test]
    fn threshold_line_test() {
        let signature = Summary { mean: 0.30000000000000004, std: 0.0625 };
        let conserved = Summary { mean: 9.6, std: 1.0005 };
        assert_eq!(threshold_line(&signature, &conserved), "Min thr: 0.3, STD: 0.062\tMax thr: 9.6, STD: 1.0");
    }

    #[test]
    fn analyze_too_many_clusters_test() {
        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("twc.csv");
        std::fs::write(&filepath, "resNum,TWC\n1,0.5\n2,0.5\n3,1.0\n").unwrap();

        let err = analyze(&filepath, 1.0, &estimation(3), None).err().unwrap();
        assert_eq!(err.to_string(), "Failed to estimate thresholds");
    }

    #[test]
    fn analyze_parse_error_test() {
        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join("twc.csv");
        std::fs::write(&filepath, "resNum,TWC\n1,0.5\n2,x\n").unwrap();

        let err = analyze(&filepath, 1.0, &estimation(1), None).err().unwrap();
        assert!(err.to_string().starts_with("Failed to load scores from"));
    }

    #[test]
    fn from_matches_test() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let config = Config::default();

        let mut mat = crate::app::cli::build_cli()
            .try_get_matches_from([
                "twcdist",
                input.to_str().unwrap(),
                "out.png",
                "out.csv",
                "7",
                "--seed",
                "3",
                "--no-multithreading",
            ])
            .unwrap();
        let params = PipelineParameters::from_matches(&mut mat, &config).unwrap();

        assert_eq!(params.estimation.clustering.k(), 7);
        assert_eq!(params.estimation.nb_trials, config.nb_trials);
        assert_eq!(params.estimation.seed, Some(3));
        assert!(!params.estimation.multithreading_flag);
        assert_eq!(params.std_devs, config.std_devs);

        let mut mat =
            crate::app::cli::build_cli().try_get_matches_from(["twcdist", input.to_str().unwrap(), "a.png"]);
        assert!(mat.is_err());

        mat = crate::app::cli::build_cli().try_get_matches_from(["twcdist", "missing.csv", "a.png", "a.csv"]);
        assert!(PipelineParameters::from_matches(&mut mat.unwrap(), &config).is_err());
    }
}
