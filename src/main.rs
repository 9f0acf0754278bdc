//! WikiReporter - GitLab issue reports published to Confluence
//!
//! Collects the issues of every configured project, groups them by
//! assignee, renders a report and publishes it to one wiki page,
//! creating the page for the current period or updating it in place.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (config, fetch, ambiguous page, publish)

mod analysis;
mod cli;
mod config;
mod error;
mod http;
mod models;
mod pipeline;
mod report;
mod tracker;
mod wiki;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use models::{IssueFilter, PageSlot};
use pipeline::{page_title, Pipeline, RunPlan};
use report::ReportMeta;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use tracker::{GitLabClient, IssueFetcher};
use wiki::{ConfluenceClient, PagePublisher};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("WikiReporter v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_report(args).await {
        error!("Report failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        if let Some(status) = api_status(&e) {
            if status == 401 || status == 403 {
                eprintln!("   Check the tracker and wiki credentials.");
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .wikireporter.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!("   Fill in endpoints, credentials, space and projects.");
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` wins
/// over the command-line flags when set.
fn init_logging(args: &Args) {
    let level = args.log_level();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one report: fetch, aggregate, render, then publish or preview.
async fn run_report(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    let now = Utc::now();
    let filter = IssueFilter {
        order_by: config.report.order_by,
        sort: config.report.sort,
        per_page: config.report.page_size,
        ..config.report.preset.filter(now, config.report.days)
    };
    let meta = ReportMeta {
        preset: config.report.preset,
        generated_at: now,
        updated_after: filter.updated_after,
    };

    let slot = match config.wiki.page_id {
        Some(ref page_id) => PageSlot::Fixed(page_id.clone()),
        None => PageSlot::Titled(
            page_title(&Local::now(), &config.wiki.title_prefix, &config.wiki.title_format)
                .map_err(|_| {
                    anyhow::anyhow!(
                        "Invalid wiki.title_format: {:?}",
                        config.wiki.title_format
                    )
                })?,
        ),
    };

    let plan = RunPlan {
        projects: config
            .projects
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect(),
        filter,
        slot,
        meta,
    };

    let http = http::build_client(config.http.timeout_seconds)
        .context("Failed to create HTTP client")?;
    let tracker = GitLabClient::new(
        http.clone(),
        &config.tracker.endpoint,
        &config.tracker.user,
        &config.tracker.password,
    );
    let wiki = ConfluenceClient::new(
        http,
        &config.wiki.endpoint,
        &config.wiki.user,
        &config.wiki.password,
    );

    let mut pipeline = Pipeline::new(
        IssueFetcher::new(tracker, config.report.id_width),
        PagePublisher::new(wiki, &config.wiki.space, &config.wiki.parent_page),
    );
    if !args.quiet {
        pipeline = pipeline.with_progress();
    }

    println!(
        "📥 Collecting {} issues from {} project(s)",
        config.report.preset,
        plan.projects.len()
    );

    // Handle --dry-run: render a preview and stop before publishing
    if args.dry_run {
        return handle_dry_run(&pipeline, &plan, args.output.as_deref()).await;
    }

    let summary = pipeline.run(&plan).await?;

    println!("\n📊 Report Summary:");
    println!("   Projects: {}", summary.projects);
    println!("   Issues: {}", summary.issues);
    println!("\n✅ Published: {}", summary.outcome);

    Ok(())
}

/// Handle --dry-run: fetch and render, print or save, publish nothing.
async fn handle_dry_run<S, W>(
    pipeline: &Pipeline<S, W>,
    plan: &RunPlan,
    output: Option<&Path>,
) -> Result<()>
where
    S: tracker::IssueSource,
    W: wiki::WikiApi,
{
    let projects = pipeline.collect(&plan.projects, &plan.filter).await?;

    match output {
        Some(path) => {
            let body = report::render_storage(&projects, &plan.meta);
            std::fs::write(path, &body)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("\n📝 Storage-format body saved to: {}", path.display());
        }
        None => {
            println!();
            print!("{}", report::render_text(&projects, &plan.meta));
        }
    }

    match plan.slot {
        PageSlot::Titled(ref title) => {
            println!("\n✅ Dry run complete. Would publish page \"{}\".", title)
        }
        PageSlot::Fixed(ref id) => {
            println!("\n✅ Dry run complete. Would update page {}.", id)
        }
    }
    Ok(())
}

/// Status code of the first API error in the chain, if any.
fn api_status(err: &anyhow::Error) -> Option<u16> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<error::ApiError>())
        .and_then(|api| api.status())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default()? {
        Some(config) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
