use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use twcdist_core::{
    clustering::{DEFAULT_NB_ITERS_MAX, DEFAULT_NB_RESTARTS, DEFAULT_NB_TRIALS, DEFAULT_THRESHOLD},
    utils::warn_prefix,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(from = "ConfigPrecursor")]
pub struct Config {
    pub nb_trials: usize,
    pub std_devs: f64,
    pub nb_clusters_default: usize,
    pub kmeans_nb_restarts: usize,
    pub kmeans_threshold: f64,
    pub kmeans_nb_iters_max: usize,
    pub histogram_nb_bins: usize,
    pub plot_width: u32,
    pub plot_height: u32,
    pub multithreading_flag: bool,
    pub seed: Option<u64>,
}

impl Config {
    pub const FILENAME: &str = "config.json";

    pub fn load(filepath: &std::path::Path) -> Self {
        match Self::from_file(filepath) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{} failed to load configuration from file, '{err}'", warn_prefix());
                let config = ConfigPrecursor::default();
                let Ok(downcast_error) = err.downcast::<std::io::Error>() else {
                    return config.into();
                };
                if downcast_error.kind() == std::io::ErrorKind::NotFound {
                    match config.to_file(filepath) {
                        Ok(()) => eprintln!(
                            "{} created default configuration file, at '{}'",
                            warn_prefix(),
                            filepath.display()
                        ),
                        Err(error) => eprintln!(
                            "{} failed to create default configuration file, at '{}', caused by '{}'",
                            warn_prefix(),
                            filepath.display(),
                            error
                        ),
                    }
                }
                config.into()
            }
        }
    }

    fn from_file(filepath: &std::path::Path) -> anyhow::Result<Self> {
        let mut buffer: Vec<u8> = Vec::new();
        std::fs::OpenOptions::new()
            .create(false)
            .read(true)
            .open(filepath)?
            .read_to_end(&mut buffer)?;
        Self::from_slice(&buffer)
    }

    fn from_slice(buffer: &[u8]) -> anyhow::Result<Self> {
        Ok(ijson::from_value(&serde_json::from_slice(buffer)?)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigPrecursor::default().into()
    }
}

impl From<ConfigPrecursor> for Config {
    fn from(value: ConfigPrecursor) -> Self {
        let default = ConfigPrecursor::default();

        macro_rules! at_least_one {
            ($field:ident) => {
                if value.$field == 0 {
                    eprintln!(
                        "{} `{}` must be at least 1, falling back to {}",
                        warn_prefix(),
                        stringify!($field),
                        default.$field
                    );
                    default.$field
                } else {
                    value.$field
                }
            };
        }

        let std_devs = if value.std_devs.is_finite() && value.std_devs >= 0.0 {
            value.std_devs
        } else {
            eprintln!(
                "{} `std_devs` must be a non-negative number, got {}, falling back to {}",
                warn_prefix(),
                value.std_devs,
                default.std_devs
            );
            default.std_devs
        };

        Self {
            nb_trials: at_least_one!(nb_trials),
            std_devs,
            nb_clusters_default: at_least_one!(nb_clusters_default),
            kmeans_nb_restarts: at_least_one!(kmeans_nb_restarts),
            kmeans_threshold: value.kmeans_threshold.max(0.0),
            kmeans_nb_iters_max: at_least_one!(kmeans_nb_iters_max),
            histogram_nb_bins: at_least_one!(histogram_nb_bins),
            plot_width: at_least_one!(plot_width),
            plot_height: at_least_one!(plot_height),
            multithreading_flag: value.multithreading_flag,
            seed: value.seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename = "config")]
pub struct ConfigPrecursor {
    pub nb_trials: usize,
    pub std_devs: f64,
    pub nb_clusters_default: usize,
    pub kmeans_nb_restarts: usize,
    pub kmeans_threshold: f64,
    pub kmeans_nb_iters_max: usize,
    pub histogram_nb_bins: usize,
    pub plot_width: u32,
    pub plot_height: u32,
    pub multithreading_flag: bool,
    pub seed: Option<u64>,
}

impl Default for ConfigPrecursor {
    fn default() -> Self {
        Self {
            nb_trials: DEFAULT_NB_TRIALS,
            std_devs: 1.0,
            nb_clusters_default: 5,
            kmeans_nb_restarts: DEFAULT_NB_RESTARTS,
            kmeans_threshold: DEFAULT_THRESHOLD,
            kmeans_nb_iters_max: DEFAULT_NB_ITERS_MAX,
            histogram_nb_bins: 50,
            plot_width: 640,
            plot_height: 480,
            multithreading_flag: true,
            seed: None,
        }
    }
}

impl ConfigPrecursor {
    fn to_file(
        &self,
        filepath: &std::path::Path,
    ) -> anyhow::Result<()> {
        let mut file = std::fs::OpenOptions::new().write(true).create_new(true).open(filepath)?;

        file.write_all(&serde_json::to_vec_pretty(&ijson::to_value(self)?)?)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use indoc::indoc;

    use super::*;

    #[test]
    fn partial_config_test() {
        let input = indoc! {r#"
            {
                "nb_trials": 250,
                "seed": 17
            }
        "#};

        let config = Config::from_slice(input.as_bytes()).unwrap();

        assert_eq!(config.nb_trials, 250);
        assert_eq!(config.seed, Some(17));
        assert_eq!(config.nb_clusters_default, 5);
        assert!(config.multithreading_flag);
    }

    #[test]
    fn invalid_values_fall_back_test() {
        let input = r#"{"nb_trials": 0, "std_devs": -2.0, "histogram_nb_bins": 0}"#;

        let config = Config::from_slice(input.as_bytes()).unwrap();

        assert_eq!(config.nb_trials, DEFAULT_NB_TRIALS);
        assert_eq!(config.std_devs, 1.0);
        assert_eq!(config.histogram_nb_bins, 50);
    }

    #[test]
    fn load_creates_default_file_test() {
        let dir = tempfile::tempdir().unwrap();
        let filepath = dir.path().join(Config::FILENAME);

        let config = Config::load(&filepath);
        assert_eq!(config.nb_trials, DEFAULT_NB_TRIALS);
        assert!(filepath.is_file());

        let reloaded = Config::from_file(&filepath).unwrap();
        assert_eq!(reloaded.kmeans_nb_restarts, config.kmeans_nb_restarts);
        assert_eq!(reloaded.seed, None);
    }
}
