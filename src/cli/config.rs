//! Config subcommand implementation.
//!
//! Handles `netsweep config`, which prints the effective settings, and
//! `netsweep config --init`, which writes a settings file with defaults.

use crate::config::{AppSettings, Paths};
use crate::error::{CliError, CliResult, ConfigError};
use crate::output;
use clap::Parser;
use std::path::Path;

/// Show or initialise settings.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Write a settings file containing the defaults
    #[arg(long)]
    pub init: bool,

    /// Overwrite an existing settings file when used with --init
    #[arg(long, requires = "init")]
    pub force: bool,
}

impl ConfigCommand {
    /// Execute the config command.
    pub fn execute(
        &self,
        settings: &AppSettings,
        config_path: Option<&Path>,
        quiet: bool,
    ) -> CliResult<()> {
        let path = match config_path {
            Some(path) => path.to_path_buf(),
            None => Paths::new()?.settings_file(),
        };

        if self.init {
            self.init_file(&path, quiet)
        } else {
            self.show(settings, &path, quiet)
        }
    }

    fn init_file(&self, path: &Path, quiet: bool) -> CliResult<()> {
        if path.exists() && !self.force {
            return Err(CliError::Other(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        AppSettings::default().save_to(path)?;
        if !quiet {
            output::print_success(&format!("Wrote default settings to {}", path.display()));
        }
        Ok(())
    }

    fn show(&self, settings: &AppSettings, path: &Path, quiet: bool) -> CliResult<()> {
        if !quiet {
            let origin = if path.exists() {
                path.display().to_string()
            } else {
                format!("{} (not present, using defaults)", path.display())
            };
            output::print_info(&format!("Settings file: {}", origin));
        }

        let json = serde_json::to_string_pretty(settings).map_err(ConfigError::from)?;
        println!("{}", json);
        Ok(())
    }
}
