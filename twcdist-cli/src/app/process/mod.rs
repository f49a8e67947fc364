// Modules
mod misc;
mod run;

// Re-exports
pub(in crate::app) use misc::generate_shell_completions;
pub(in crate::app) use run::process_run as run;

// Imports
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::ArgMatches;
use console::style;
use indicatif::MultiProgress;

use crate::app::config::Config;
