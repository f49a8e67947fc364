// Modules
pub mod cli;
pub mod config;
mod process;

// Imports
use anyhow::Context;
use config::Config;
use directories::ProjectDirs;

pub struct App {
    config: Config,
}

impl App {
    #[cfg(not(debug_assertions))]
    const NAME: &'static str = "twcdist";
    #[cfg(debug_assertions)]
    const NAME: &'static str = "twcdist-dev";

    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    pub fn load() -> anyhow::Result<Self> {
        let dirs = ProjectDirs::from("", "", Self::NAME)
            .ok_or_else(|| anyhow::anyhow!("Failed to get project directories"))?;

        let conf_dir = dirs.config_dir();
        if !conf_dir.exists() {
            std::fs::create_dir_all(conf_dir).with_context(|| {
                format!("Failed to create the config directory at `{}`", conf_dir.display())
            })?;
        }

        let config = Config::load(&conf_dir.join(Config::FILENAME));

        Ok(Self { config })
    }

    pub fn run(self) -> anyhow::Result<()> {
        let mut mat = cli::build_cli().get_matches();

        if mat.get_flag("version") {
            println!("twcdist {}", Self::VERSION);
            return Ok(());
        }

        match mat.remove_one::<String>("color").as_deref() {
            Some("always") => {
                console::set_colors_enabled(true);
                console::set_colors_enabled_stderr(true);
            }
            Some("never") => {
                console::set_colors_enabled(false);
                console::set_colors_enabled_stderr(false);
            }
            _ => (),
        }

        if let Some(shell) = mat.remove_one::<clap_complete::Shell>("generate-shell-completions") {
            return process::generate_shell_completions(shell);
        }

        process::run(mat, &self.config)
    }
}
