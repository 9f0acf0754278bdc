//! Configuration file handling.
//!
//! This module handles loading, validating and merging configuration
//! from `.wikireporter.toml` files.

use crate::models::{FilterPreset, OrderBy, SortOrder};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = ".wikireporter.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Issue tracker connection.
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Wiki connection and target page.
    #[serde(default)]
    pub wiki: WikiConfig,

    /// Report content settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Transport settings shared by both services.
    #[serde(default)]
    pub http: HttpConfig,

    /// Project id (numeric or `group/project` path) to display name.
    #[serde(default)]
    pub projects: BTreeMap<String, String>,
}

/// Tracker (GitLab) settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Base URL, e.g. `https://gitlab.example.com`.
    #[serde(default = "default_tracker_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tracker_endpoint(),
            user: String::new(),
            password: String::new(),
        }
    }
}

fn default_tracker_endpoint() -> String {
    "https://gitlab.example.com".to_string()
}

/// Wiki (Confluence) settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    /// Base URL, e.g. `https://wiki.example.com`.
    #[serde(default = "default_wiki_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    /// Space key the report lives in.
    #[serde(default)]
    pub space: String,

    /// Page id new report pages are created under.
    #[serde(default)]
    pub parent_page: String,

    /// Fixed page to update in place. When set, no search or create happens.
    #[serde(default)]
    pub page_id: Option<String>,

    /// chrono format string for the page title.
    #[serde(default = "default_title_format")]
    pub title_format: String,

    /// Text prepended to the formatted date.
    #[serde(default)]
    pub title_prefix: String,
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_wiki_endpoint(),
            user: String::new(),
            password: String::new(),
            space: String::new(),
            parent_page: String::new(),
            page_id: None,
            title_format: default_title_format(),
            title_prefix: String::new(),
        }
    }
}

fn default_wiki_endpoint() -> String {
    "https://wiki.example.com".to_string()
}

fn default_title_format() -> String {
    "%Y-%m-%d".to_string()
}

/// Report content settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Which issues to collect.
    #[serde(default)]
    pub preset: FilterPreset,

    /// Length of the update window in days.
    #[serde(default = "default_days")]
    pub days: u32,

    /// Issues requested per tracker page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Digits issue identifiers are zero-padded to.
    #[serde(default = "default_id_width")]
    pub id_width: usize,

    #[serde(default)]
    pub order_by: OrderBy,

    #[serde(default)]
    pub sort: SortOrder,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            preset: FilterPreset::default(),
            days: default_days(),
            page_size: default_page_size(),
            id_width: default_id_width(),
            order_by: OrderBy::default(),
            sort: SortOrder::default(),
        }
    }
}

fn default_days() -> u32 {
    7
}

fn default_page_size() -> u32 {
    100
}

fn default_id_width() -> usize {
    crate::tracker::fetcher::DEFAULT_ID_WIDTH
}

/// HTTP transport settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds. Unset means the client default.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

// Credentials stay out of debug output.
impl std::fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for WikiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiConfig")
            .field("endpoint", &self.endpoint)
            .field("user", &self.user)
            .field("space", &self.space)
            .field("parent_page", &self.parent_page)
            .field("page_id", &self.page_id)
            .field("title_format", &self.title_format)
            .field("title_prefix", &self.title_prefix)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.wikireporter.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(preset) = args.preset {
            self.report.preset = preset;
        }
        if let Some(days) = args.days {
            self.report.days = days;
        }
        if let Some(ref page_id) = args.page_id {
            self.wiki.page_id = Some(page_id.clone());
        }
        if let Some(ref password) = args.tracker_password {
            self.tracker.password = password.clone();
        }
        if let Some(ref password) = args.wiki_password {
            self.wiki.password = password.clone();
        }
    }

    /// Check the configuration before any request is made.
    pub fn validate(&self) -> Result<()> {
        check_endpoint("tracker", &self.tracker.endpoint)?;
        check_endpoint("wiki", &self.wiki.endpoint)?;

        if self.projects.is_empty() {
            bail!("No projects configured; add at least one entry under [projects]");
        }
        if let Some(id) = self.projects.keys().find(|id| id.trim().is_empty()) {
            bail!("Project id must not be empty (got {:?})", id);
        }
        if self.wiki.space.trim().is_empty() {
            bail!("wiki.space must be set");
        }
        if self.wiki.page_id.is_none() && self.wiki.parent_page.trim().is_empty() {
            bail!("wiki.parent_page must be set unless wiki.page_id is given");
        }
        if self.wiki.title_format.trim().is_empty() {
            bail!("wiki.title_format must not be empty");
        }
        if !(1..=100).contains(&self.report.page_size) {
            bail!("report.page_size must be between 1 and 100");
        }
        if !(1..=20).contains(&self.report.id_width) {
            bail!("report.id_width must be between 1 and 20");
        }
        if self.report.days == 0 {
            bail!("report.days must be at least 1");
        }

        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let mut config = Config::default();
        config.wiki.space = "TEAM".to_string();
        config.wiki.parent_page = "123456".to_string();
        config
            .projects
            .insert("42".to_string(), "Backend".to_string());
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

fn check_endpoint(name: &str, endpoint: &str) -> Result<()> {
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        bail!("{} endpoint must start with 'http://' or 'https://'", name);
    }
    Ok(())
}
