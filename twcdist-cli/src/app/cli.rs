// Imports
use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, builder::Styles, value_parser as vparser};

#[rustfmt::skip]
pub fn build_cli() -> Command {
    Command::new("twcdist")
        .about("Estimate the signature and conserved thresholds of a TwinCons score distribution")
        .color(clap::ColorChoice::Auto)
        .styles(Styles::styled())
        .arg(
            Arg::new("input")
                .help("The `.csv` file of `residue,score` rows to use as input")
                .long_help("The `.csv` file of `residue,score` rows to use as input, `resNum` header rows and `NA` scores are skipped, `.gz` and `.zst` files are decompressed")
                .index(1)
                .required_unless_present_any(["version", "generate-shell-completions"])
                .value_parser(vparser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("output-png")
                .help("The path of the histogram `.png`")
                .long_help("The path of the histogram `.png`, the cluster scatter plot is written next to it with a `_groups.png` suffix")
                .index(2)
                .required_unless_present_any(["version", "generate-shell-completions"])
                .value_parser(vparser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("output-csv")
                .help("The path of the `.csv` report listing the anomalous residues")
                .index(3)
                .required_unless_present_any(["version", "generate-shell-completions"])
                .value_parser(vparser!(PathBuf))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("nb-clusters")
                .help("The number of k-means clusters")
                .long_help("The number of k-means clusters, defaults to the config `nb_clusters_default`")
                .index(4)
                .required(false)
                .value_parser(vparser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("std-devs")
                .help("The number of standard deviations from the mean beyond which a score is an anomaly")
                .required(false)
                .long("std-devs")
                .value_parser(vparser!(f64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("trials")
                .help("The number of independent k-means trials the thresholds are averaged over")
                .required(false)
                .short('t')
                .long("trials")
                .visible_alias("nb-trials")
                .value_parser(vparser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("seed")
                .help("Seed the k-means trials for reproducible thresholds")
                .required(false)
                .short('s')
                .long("seed")
                .value_parser(vparser!(u64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("no-multithreading")
                .help("Run the k-means trials on a single thread")
                .required(false)
                .long("no-multithreading")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .required(false)
                .short('v')
                .long("version")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("color")
                .required(false)
                .long("color")
                .value_parser(["always", "auto", "never"])
                .default_value("auto")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("generate-shell-completions")
                .help("Generate completions for your desired shell, outputs to stdout")
                .required(false)
                .long("generate-shell-completions")
                .value_name("SHELL")
                .value_parser(vparser!(clap_complete::Shell))
                .action(ArgAction::Set),
        )
}
