//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncReadExt;
use tracing::info;

use numberscope_core::report::format_summary;
use numberscope_core::{EnrichmentOutcome, EnrichmentPipeline, ProgressReporter, SilentProgress};
use numberscope_numbers::PhoneNumberCatalog;
use numberscope_providers::ProviderRegistry;
use numberscope_shared::{
    AppConfig, OrchestrationPolicy, PipelineSettings, init_config, load_config, load_config_from,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// numberscope: who is behind that phone number?
#[derive(Parser)]
#[command(
    name = "numberscope",
    version,
    about = "Extract phone numbers from text and enrich them with carrier, location and risk data.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.numberscope/numberscope.toml.
    #[arg(long, global = true, env = "NUMBERSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Options shared by the enrichment commands.
#[derive(clap::Args)]
pub(crate) struct EnrichArgs {
    /// Text to scan. Read from stdin when omitted.
    pub text: Vec<String>,

    /// Region assumed for numbers without a country code (e.g. GB).
    #[arg(short, long)]
    pub region: Option<String>,

    /// Maximum numbers processed from the text.
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max: Option<u64>,

    /// Provider policy: concurrent-merge or sequential-fallback.
    #[arg(short, long)]
    pub policy: Option<OrchestrationPolicy>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich every phone number found in the text and print a full report.
    Lookup {
        #[command(flatten)]
        args: EnrichArgs,

        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a compact one-line summary per number.
    Batch {
        #[command(flatten)]
        args: EnrichArgs,
    },

    /// List configured providers in the order they are consulted.
    Providers,

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

/// Initialize tracing based on CLI flags. Logs go to stderr so stdout stays
/// clean for reports and JSON.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "numberscope=warn",
        1 => "numberscope=info",
        _ => "numberscope=debug",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
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
        Command::Lookup { args, json } => cmd_lookup(config_path, args, json).await,
        Command::Batch { args } => cmd_batch(config_path, args).await,
        Command::Providers => cmd_providers(config_path),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn read_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Assemble a pipeline from config, with command-line overrides applied.
fn build_pipeline(config: &AppConfig, args: &EnrichArgs) -> Result<EnrichmentPipeline> {
    let mut settings = PipelineSettings::from(config);
    if let Some(max) = args.max {
        settings.max_candidates_per_request = max as usize;
    }
    if let Some(policy) = args.policy {
        settings.policy = policy;
    }

    let registry = ProviderRegistry::from_config(&config.providers, settings.per_provider_timeout);

    let pipeline = EnrichmentPipeline::builder()
        .catalog(Arc::new(PhoneNumberCatalog::new()))
        .registry(registry)
        .settings(settings)
        .build()?;
    Ok(pipeline)
}

/// Joined positional text, or all of stdin when none was given.
async fn input_text(args: &EnrichArgs) -> Result<String> {
    if !args.text.is_empty() {
        return Ok(args.text.join(" "));
    }

    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .map_err(|e| eyre!("failed to read stdin: {e}"))?;
    Ok(text)
}

async fn cmd_lookup(config_path: Option<&Path>, args: EnrichArgs, json: bool) -> Result<()> {
    let config = read_config(config_path)?;
    let text = input_text(&args).await?;
    let pipeline = build_pipeline(&config, &args)?;

    let outcome = if json {
        pipeline
            .enrich_with_progress(&text, args.region.as_deref(), &SilentProgress)
            .await
    } else {
        let reporter = CliProgress::new();
        let outcome = pipeline
            .enrich_with_progress(&text, args.region.as_deref(), &reporter)
            .await;
        reporter.finish();
        outcome
    };
    let outcome = outcome?;
    pipeline.shutdown();

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if outcome.is_empty() {
        println!("No phone number found.");
        return Ok(());
    }

    let total = outcome.entries.len();
    for (i, entry) in outcome.entries.iter().enumerate() {
        if total > 1 {
            println!("== Number {} of {total} ==", i + 1);
        }
        println!("{}", entry.report);
    }
    print_omitted(&outcome);
    Ok(())
}

async fn cmd_batch(config_path: Option<&Path>, args: EnrichArgs) -> Result<()> {
    let config = read_config(config_path)?;
    let text = input_text(&args).await?;
    let pipeline = build_pipeline(&config, &args)?;

    let outcome = pipeline.enrich(&text, args.region.as_deref()).await?;
    pipeline.shutdown();

    if outcome.is_empty() {
        println!("No phone number found.");
        return Ok(());
    }

    print!("{}", format_summary(&outcome.entries));
    print_omitted(&outcome);
    Ok(())
}

fn print_omitted(outcome: &EnrichmentOutcome) {
    match outcome.omitted {
        0 => {}
        1 => println!("1 additional number omitted."),
        n => println!("{n} additional numbers omitted."),
    }
}

fn cmd_providers(config_path: Option<&Path>) -> Result<()> {
    let config = read_config(config_path)?;

    if config.providers.is_empty() {
        println!("No providers configured; lookups use basic metadata only.");
        return Ok(());
    }

    let mut providers: Vec<_> = config.providers.iter().collect();
    providers.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));

    for provider in providers {
        let status = match &provider.credential_env {
            Some(var) if std::env::var(var).map(|v| v.trim().is_empty()).unwrap_or(true) => {
                format!("missing ${var}, skipped")
            }
            Some(var) => format!("key from ${var}"),
            None => "no key required".to_string(),
        };
        println!(
            "  {:>3}  {:<16} {}  ({status})",
            provider.priority, provider.name, provider.base_url
        );
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    info!(path = %path.display(), "config initialized");
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = read_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner on stderr.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        spinner.set_message("Scanning text");
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn candidates_found(&self, total: usize, omitted: usize) {
        if omitted > 0 {
            self.spinner
                .set_message(format!("Found {total} numbers, keeping {}", total - omitted));
        } else {
            self.spinner.set_message(format!("Found {total} numbers"));
        }
    }

    fn number_started(&self, e164: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Looking up [{current}/{total}] {e164}"));
    }

    fn done(&self, _outcome: &EnrichmentOutcome) {
        self.finish();
    }
}
