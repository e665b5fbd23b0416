//! sitediag - structured site diagnostics
//!
//! ## Commands
//!
//! - `list`: Show the registered diagnostic modules
//! - `run <name>`: Run one module against a page
//! - `run-all`: Run every registered module in registration order

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sitediag_cli::{
    build_registry, render_list, render_report, render_run, HttpProber, OutputFormat,
    PageSnapshot, RegistryKind, SitediagConfig, SnapshotContext,
};
use sitediag_core::{Runner, METRICS};
use tracing::{info, warn, Level};

#[derive(Parser)]
#[command(name = "sitediag")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run diagnostic modules against a web page", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// JSON config file (runner and module settings)
    #[arg(short, long, global = true, env = "SITEDIAG_CONFIG")]
    config: Option<PathBuf>,

    /// Report output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Built-in module set
    #[arg(long, global = true, value_enum, default_value_t = RegistryKind::Full)]
    registry: RegistryKind,

    #[command(subcommand)]
    command: Commands,
}

/// Where the page under audit comes from.
#[derive(clap::Args)]
struct PageArgs {
    /// Captured page snapshot (JSON)
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Page URL; overrides the snapshot's URL
    #[arg(short, long)]
    url: Option<String>,

    /// Answer no HEAD probes; probe-driven checks degrade or fail
    #[arg(long)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered modules
    List,

    /// Run a single module
    Run {
        /// Module name, e.g. `jsCss`
        name: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Run every registered module
    RunAll {
        #[command(flatten)]
        page: PageArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    sitediag_core::init_tracing(cli.json, level);

    let config = SitediagConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    let registry =
        build_registry(cli.registry, &config.checks).context("Failed to build module registry")?;
    let runner = Runner::with_config(registry, config.runner.clone());

    let result = match cli.command {
        Commands::List => cmd_list(&runner, cli.format),
        Commands::Run { name, page } => cmd_run(&runner, &config, &name, &page, cli.format).await,
        Commands::RunAll { page } => cmd_run_all(&runner, &config, &page, cli.format).await,
    };

    METRICS.flush();
    result
}

fn cmd_list(runner: &Runner, format: OutputFormat) -> Result<()> {
    print!("{}", render_list(runner.registry(), format)?);
    Ok(())
}

async fn cmd_run(
    runner: &Runner,
    config: &SitediagConfig,
    name: &str,
    page: &PageArgs,
    format: OutputFormat,
) -> Result<()> {
    // Reject unknown names before touching the page.
    runner.registry().get(name)?;

    let ctx = page_context(config, page)?;
    let report = runner.run(name, &ctx).await?;
    print!("{}", render_report(&report, format)?);
    Ok(())
}

async fn cmd_run_all(
    runner: &Runner,
    config: &SitediagConfig,
    page: &PageArgs,
    format: OutputFormat,
) -> Result<()> {
    let ctx = page_context(config, page)?;
    let result = runner.run_all(&ctx).await;
    info!(
        run_id = %result.run_id,
        findings = result.summary.total,
        "run finished"
    );
    print!("{}", render_run(&result, format)?);
    Ok(())
}

fn load_snapshot(path: Option<&Path>, url: Option<&str>) -> Result<PageSnapshot> {
    let mut snapshot = match (path, url) {
        (Some(path), _) => PageSnapshot::load(path)?,
        (None, Some(url)) => PageSnapshot::for_url(url),
        (None, None) => bail!("either --snapshot or --url is required"),
    };
    if let Some(url) = url {
        snapshot.url = url.to_string();
    }
    Ok(snapshot)
}

/// Build the page context and cancel it on Ctrl-C.
fn page_context(config: &SitediagConfig, page: &PageArgs) -> Result<SnapshotContext> {
    let snapshot = load_snapshot(page.snapshot.as_deref(), page.url.as_deref())?;
    let prober = if page.offline {
        None
    } else {
        Some(
            HttpProber::new(config.checks.probe_timeout())
                .context("Failed to create HTTP client")?,
        )
    };
    let ctx = SnapshotContext::new(snapshot, prober)?;

    let token = ctx.cancellation_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling in-flight modules");
            token.cancel();
        }
    });

    Ok(ctx)
}
