//! # memqueue CLI
//!
//! Command-line harness for the memqueue library.
//!
//! This module provides CLI commands for:
//! - Running a concurrent producer/consumer demonstration against one queue
//! - Running the built-in manual checks of scheduler and registry behavior
//! - Showing the resolved configuration

pub mod checks;
pub mod demo;

use clap::{Parser, Subcommand};
use memqueue::{QueueError, QueueRegistry, RegistryConfig, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use checks::{run_checks, CheckOutcome, CheckReport};
pub use demo::{run_demo, DemoConfig, DemoReport};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

// ============================================================================
// CLI Structure
// ============================================================================

/// memqueue - in-process queues with visibility timeouts
#[derive(Parser)]
#[command(name = "memqueue")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Exercise in-process named queues with visibility timeouts")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "MEMQUEUE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level, used when RUST_LOG is not set
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run producers and consumers concurrently against one queue
    Demo {
        /// Queue name
        #[arg(short, long)]
        queue: Option<String>,

        /// Number of producer tasks
        #[arg(short, long)]
        producers: Option<usize>,

        /// Number of consumer tasks
        #[arg(short = 'n', long)]
        consumers: Option<usize>,

        /// Payloads enqueued by each producer
        #[arg(long)]
        per_producer: Option<usize>,

        /// Visibility timeout producers use when reading back, in milliseconds
        #[arg(long)]
        producer_timeout_ms: Option<u64>,

        /// How long producers hold their entities before deleting, in milliseconds
        #[arg(long)]
        hold_ms: Option<u64>,

        /// How long consumers wait before their first read, in milliseconds
        #[arg(long)]
        consumer_delay_ms: Option<u64>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Run the manual checks of scheduler and registry behavior
    Check {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the resolved configuration
    Config {
        /// Print the configuration
        #[arg(short, long)]
        show: bool,

        /// Output format for configuration
        #[arg(short = 'f', long, default_value = "toml")]
        format: ConfigFormat,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

/// Configuration format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// TOML format
    Toml,
}

// ============================================================================
// CLI Error Types
// ============================================================================

/// CLI-specific errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    #[error("Invalid argument: {arg} - {message}")]
    InvalidArgument { arg: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Queue(_) => 2,
            Self::CommandFailed { .. } => 3,
            Self::InvalidArgument { .. } => 4,
            Self::Io(_) => 5,
        }
    }
}

/// Configuration-related errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to render configuration: {message}")]
    Render { message: String },
}

// ============================================================================
// Configuration Types
// ============================================================================

/// CLI configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    /// Default logging configuration
    pub logging: LoggingConfig,

    /// Settings shared by every queue the harness creates
    pub registry: RegistryConfig,

    /// Producer/consumer demonstration parameters
    pub demo: DemoConfig,
}

impl CliConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.registry.validate()?;
        self.demo.validate()?;
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum LogFormat {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "json")]
    Json,
}

// ============================================================================
// Main Entry Point
// ============================================================================

/// Main CLI entry point
pub async fn run_cli() -> Result<(), CliError> {
    let cli = Cli::parse();

    let config = load_configuration(cli.config.as_deref())?;

    initialize_logging(&cli, &config.logging);

    execute_command(cli.command, config).await
}

/// Dispatch a parsed command against a loaded configuration
pub async fn execute_command(command: Commands, mut config: CliConfig) -> Result<(), CliError> {
    match command {
        Commands::Demo {
            queue,
            producers,
            consumers,
            per_producer,
            producer_timeout_ms,
            hold_ms,
            consumer_delay_ms,
            format,
        } => {
            let demo = &mut config.demo;
            if let Some(queue) = queue {
                demo.queue = queue;
            }
            if let Some(producers) = producers {
                demo.producers = producers;
            }
            if let Some(consumers) = consumers {
                demo.consumers = consumers;
            }
            if let Some(per_producer) = per_producer {
                demo.per_producer = per_producer;
            }
            if let Some(timeout) = producer_timeout_ms {
                demo.producer_timeout_ms = timeout;
            }
            if let Some(hold) = hold_ms {
                demo.hold_ms = hold;
            }
            if let Some(delay) = consumer_delay_ms {
                demo.consumer_delay_ms = delay;
            }
            config
                .demo
                .validate()
                .map_err(|e| CliError::InvalidArgument {
                    arg: "demo".to_string(),
                    message: e.to_string(),
                })?;

            execute_demo_command(&config, format).await
        }
        Commands::Check { format } => execute_check_command(format),
        Commands::Config { show, format } => execute_config_command(&config, show, format),
    }
}

// ============================================================================
// Logging and Configuration
// ============================================================================

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `--log-level`, which wins over the configured level.
/// Installing twice is a no-op.
pub fn initialize_logging(cli: &Cli, logging: &LoggingConfig) {
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| logging.level.clone());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let json = cli.json_logs || logging.format == LogFormat::Json;
    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        debug!(error = %e, "Tracing subscriber already installed");
    }
}

/// Load configuration from an optional file and `MEMQUEUE__` environment
/// variables, over built-in defaults.
///
/// Environment variables use `__` as the section separator, e.g.
/// `MEMQUEUE__DEMO__PRODUCERS=4` sets `demo.producers`.
pub fn load_configuration(config_path: Option<&Path>) -> Result<CliConfig, ConfigError> {
    let mut builder = config::Config::builder();

    if let Some(path) = config_path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let config: CliConfig = builder
        .add_source(
            config::Environment::with_prefix("MEMQUEUE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    config.validate()?;
    Ok(config)
}

// ============================================================================
// Command Implementations
// ============================================================================

/// Execute demo command
async fn execute_demo_command(config: &CliConfig, format: OutputFormat) -> Result<(), CliError> {
    info!(
        queue = %config.demo.queue,
        producers = config.demo.producers,
        consumers = config.demo.consumers,
        per_producer = config.demo.per_producer,
        "Starting producer/consumer demo"
    );

    let registry = Arc::new(QueueRegistry::new(config.registry.clone())?);
    let report = run_demo(registry, &config.demo).await?;

    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    if report.all_queued() {
        Ok(())
    } else {
        Err(CliError::CommandFailed {
            message: format!(
                "only {} of {} produced entities were queued at once",
                report.max_entries,
                report.expected_entries()
            ),
        })
    }
}

/// Execute check command
fn execute_check_command(format: OutputFormat) -> Result<(), CliError> {
    info!("Running manual checks");

    let report = run_checks();
    match format {
        OutputFormat::Text => print!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    let failed = report.failed();
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::CommandFailed {
            message: format!("{failed} of {} checks failed", report.outcomes.len()),
        })
    }
}

/// Execute config command
fn execute_config_command(
    config: &CliConfig,
    show: bool,
    format: ConfigFormat,
) -> Result<(), CliError> {
    info!(show = show, format = ?format, "Processing config command");

    if show {
        println!("{}", render_config(config, format)?);
    } else {
        println!("Configuration is valid");
    }
    Ok(())
}

/// Render configuration in the requested format
pub fn render_config(config: &CliConfig, format: ConfigFormat) -> Result<String, ConfigError> {
    match format {
        ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| ConfigError::Render {
            message: e.to_string(),
        }),
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| ConfigError::Render {
                message: e.to_string(),
            })
        }
    }
}

fn render_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(|e| CliError::CommandFailed {
        message: format!("failed to render JSON: {e}"),
    })
}
