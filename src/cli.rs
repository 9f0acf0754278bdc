//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::FilterPreset;
use clap::Parser;
use std::path::PathBuf;

/// WikiReporter - per-assignee GitLab issue reports on Confluence
///
/// Collects the issues of every configured project, groups them by
/// assignee and publishes the result to a single wiki page, creating
/// today's page or updating it in place.
///
/// Examples:
///   wikireporter
///   wikireporter --config team.toml --preset recently-updated --days 1
///   wikireporter --dry-run --output preview.txt
///   wikireporter --init-config
#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .wikireporter.toml in the current directory
    #[arg(short, long, value_name = "FILE", env = "WIKIREPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Which issues to collect (overrides report.preset)
    #[arg(long, value_name = "PRESET")]
    pub preset: Option<FilterPreset>,

    /// Update window in days (overrides report.days)
    #[arg(long, value_name = "DAYS")]
    pub days: Option<u32>,

    /// Update this page id in place instead of searching by title
    #[arg(long, value_name = "ID")]
    pub page_id: Option<String>,

    /// Fetch and render, but do not publish
    #[arg(long)]
    pub dry_run: bool,

    /// Where --dry-run writes the rendered body (stdout if omitted)
    #[arg(short, long, value_name = "FILE", requires = "dry_run")]
    pub output: Option<PathBuf>,

    /// Tracker password (overrides tracker.password)
    #[arg(long, env = "WIKIREPORTER_TRACKER_PASSWORD", hide_env_values = true)]
    pub tracker_password: Option<String>,

    /// Wiki password (overrides wiki.password)
    #[arg(long, env = "WIKIREPORTER_WIKI_PASSWORD", hide_env_values = true)]
    pub wiki_password: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .wikireporter.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("config", &self.config)
            .field("preset", &self.preset)
            .field("days", &self.days)
            .field("page_id", &self.page_id)
            .field("dry_run", &self.dry_run)
            .field("output", &self.output)
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .field("init_config", &self.init_config)
            .finish_non_exhaustive()
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.days == Some(0) {
            return Err("Days must be at least 1".to_string());
        }

        if let Some(ref page_id) = self.page_id {
            if page_id.trim().is_empty() {
                return Err("Page id must not be empty".to_string());
            }
        }

        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                return Err(format!(
                    "Config file does not exist: {}",
                    config_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
