//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use newsdigest_core::{
    ProgressReporter, RunOptions, RunSummary, create_capability, render_from_store, run_digest,
};
use newsdigest_shared::{
    AppConfig, LlmProvider, SourceSet, init_config, load_config, load_config_from,
};
use tower_http::services::ServeDir;
use tracing::info;

/// Content type for the generated feeds.
const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// newsdigest: English newsletters in, translated daily digest out.
#[derive(Parser)]
#[command(
    name = "newsdigest",
    version,
    about = "Aggregate newsletters and blogs into a translated daily digest, as RSS and HTML.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.newsdigest/newsdigest.toml).
    #[arg(long, global = true, env = "NEWSDIGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch, enrich and publish today's digest.
    Run {
        /// Source set: mvp, all, or config (defaults to config, falling back to mvp).
        #[arg(long)]
        sources: Option<SourceSet>,

        /// Fetch only: no AI calls, nothing persisted.
        #[arg(long)]
        dry_run: bool,

        /// Look back this many days instead of the configured window.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        days: Option<u32>,

        /// AI provider: kimi, openai, openrouter or anthropic.
        #[arg(long)]
        provider: Option<LlmProvider>,
    },

    /// Re-render feeds and page from stored articles.
    Render {
        /// Processing date, YYYY-MM-DD (defaults to today, UTC).
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Serve the output directory over HTTP.
    Serve {
        /// Bind address (defaults to `[server].host`).
        #[arg(long)]
        host: Option<String>,

        /// Port (defaults to `[server].port`).
        #[arg(long)]
        port: Option<u16>,

        /// Directory to serve (defaults to `[defaults].output_dir`).
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. `RUST_LOG` takes precedence.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "newsdigest=info",
        1 => "newsdigest=debug",
        _ => "newsdigest=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Run {
            sources,
            dry_run,
            days,
            provider,
        } => cmd_run(config_path, sources, dry_run, days, provider).await,
        Command::Render { date } => cmd_render(config_path, date).await,
        Command::Serve { host, port, dir } => cmd_serve(config_path, host, port, dir).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn load(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(
    config_path: Option<&Path>,
    sources: Option<SourceSet>,
    dry_run: bool,
    days: Option<u32>,
    provider: Option<LlmProvider>,
) -> Result<()> {
    let mut config = load(config_path)?;
    if let Some(provider) = provider {
        config.llm = config.llm.with_provider(provider);
    }

    // Missing API key is fatal before any network traffic.
    let capability = if dry_run {
        None
    } else {
        Some(create_capability(&config.llm)?)
    };

    let options = RunOptions {
        sources: config.resolve_sources(sources),
        dry_run,
        days,
    };

    info!(
        sources = options.sources.len(),
        dry_run,
        window_days = ?days,
        "starting digest run"
    );

    let reporter = CliProgress::new();
    let summary = run_digest(&config, &options, capability.as_deref(), &reporter).await?;
    print_summary(&summary, dry_run);
    Ok(())
}

async fn cmd_render(config_path: Option<&Path>, date: Option<NaiveDate>) -> Result<()> {
    let config = load(config_path)?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());

    let written = render_from_store(&config, date).await?;

    println!();
    println!("  Rendered {date}");
    for path in &written {
        println!("  {}", path.display());
    }
    println!();
    Ok(())
}

async fn cmd_serve(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    dir: Option<PathBuf>,
) -> Result<()> {
    let config = load(config_path)?;
    let host = host.unwrap_or(config.server.host);
    let port = port.unwrap_or(config.server.port);
    let dir = dir.unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));

    if !dir.is_dir() {
        return Err(eyre!(
            "output directory '{}' does not exist. Run `newsdigest run` first.",
            dir.display()
        ));
    }

    let app = router(&dir);
    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| eyre!("cannot bind {host}:{port}: {e}"))?;

    info!(%host, port, dir = %dir.display(), "serving outputs");
    println!("Serving {} on http://{host}:{port}/", dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_summary(summary: &RunSummary, dry_run: bool) {
    println!();
    if dry_run {
        println!("  Dry run finished (nothing persisted).");
    } else if summary.outputs.is_empty() {
        println!("  No new articles, outputs left unchanged.");
    } else {
        println!("  Digest published!");
    }
    println!("  Sources:  {}", summary.sources);
    if !summary.failed_sources.is_empty() {
        println!("  Failed:   {}", summary.failed_sources.join(", "));
    }
    println!("  Fetched:  {}", summary.fetched);
    if !dry_run {
        println!(
            "  Enriched: {} (skipped {}, failed {})",
            summary.enriched, summary.skipped, summary.failed
        );
        println!(
            "  Tokens:   {} in / {} out over {} calls",
            summary.usage.total_input_tokens,
            summary.usage.total_output_tokens,
            summary.usage.total_calls
        );
    }
    for path in &summary.outputs {
        println!("  Wrote:    {}", path.display());
    }
    println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// Static server
// ---------------------------------------------------------------------------

fn router(dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(middleware::from_fn(rss_content_type))
}

/// Serve `.xml` files as RSS so feed readers recognise them.
async fn rss_content_type(req: Request<axum::body::Body>, next: Next) -> Response {
    let is_xml = req.uri().path().ends_with(".xml");
    let mut response = next.run(req).await;
    if is_xml && response.status().is_success() {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(RSS_CONTENT_TYPE));
    }
    response
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn article(&self, current: usize, total: usize, title: &str) {
        self.spinner
            .set_message(format!("Enriching [{current}/{total}] {title}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "newsdigest",
            "-v",
            "run",
            "--sources",
            "all",
            "--dry-run",
            "--days",
            "3",
            "--provider",
            "anthropic",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Command::Run {
                sources,
                dry_run,
                days,
                provider,
            } => {
                assert_eq!(sources, Some(SourceSet::All));
                assert!(dry_run);
                assert_eq!(days, Some(3));
                assert_eq!(provider, Some(LlmProvider::Anthropic));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn zero_days_rejected() {
        assert!(Cli::try_parse_from(["newsdigest", "run", "--days", "0"]).is_err());
    }

    #[test]
    fn render_date_parses() {
        let cli = Cli::try_parse_from(["newsdigest", "render", "--date", "2025-03-01"]).unwrap();
        match cli.command {
            Command::Render { date } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 1));
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn unknown_source_set_rejected() {
        assert!(Cli::try_parse_from(["newsdigest", "run", "--sources", "everything"]).is_err());
    }
}
