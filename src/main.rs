//! Decision MCP server.
//!
//! Usage:
//!   decision-mcp-server serve       Serve MCP over stdio
//!   decision-mcp-server discover    Print the tools that would be exposed

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use decision_mcp_server::config::{self, ConfigOverrides, ServerConfig};
use decision_mcp_server::diagnostics::{SyncReporter, TracingReporter};
use decision_mcp_server::error::SyncError;
use decision_mcp_server::mcp::{self, McpServer};
use decision_mcp_server::poll::PollScheduler;
use decision_mcp_server::registry::{ToolRegistry, ToolSetEngine, ToolSynchronizer};
use decision_mcp_server::runtime::{DecisionRuntime, HttpDecisionRuntime};
use decision_mcp_server::tools::SnapshotBuilder;

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "decision-mcp-server")]
#[command(version)]
#[command(about = "MCP server exposing deployed decision services as tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (defaults to ~/.decision-mcp/config.toml).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level (debug, info, warn, error).
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Decision runtime base URL.
    #[arg(long, global = true, env = "DECISION_RUNTIME_URL")]
    url: Option<String>,

    /// API key, sent together with the username.
    #[arg(long, global = true, env = "DECISION_APIKEY", hide_env_values = true)]
    apikey: Option<String>,

    /// Username for API key or basic authentication.
    #[arg(long, global = true, env = "DECISION_USERNAME")]
    username: Option<String>,

    /// Password for basic authentication.
    #[arg(long, global = true, env = "DECISION_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Comma-separated deployment spaces.
    #[arg(long, global = true, env = "DEPLOYMENT_SPACES", value_delimiter = ',')]
    deployment_spaces: Option<Vec<String>>,

    /// Comma-separated decision service ids; skips enumeration when set.
    #[arg(long, global = true, env = "DECISION_SERVICE_IDS", value_delimiter = ',')]
    decision_service_ids: Option<Vec<String>>,

    /// Poll interval in milliseconds.
    #[arg(long, global = true, env = "POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve MCP over stdio and keep the tool list in sync.
    Serve,

    /// Run one discovery pass and print the resulting tools.
    Discover,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            url: self.url.clone(),
            deployment_spaces: self.deployment_spaces.clone(),
            decision_service_ids: self.decision_service_ids.clone(),
            poll_interval_ms: self.poll_interval_ms,
            apikey: self.apikey.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            log_level: self.log_level.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .as_deref()
        .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
        .unwrap_or_else(config::default_config_path);
    let cfg = config::load_config(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let cfg = cli.overrides().apply(cfg);

    // stdout carries the MCP stream, so logs go to stderr.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cfg.validate() {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(2);
    }

    match cli.command {
        Commands::Serve => {
            cmd_serve(cfg).await?;
            // The blocking stdin reader would otherwise hold runtime shutdown
            // until the client sends another line.
            std::process::exit(0)
        }
        Commands::Discover => cmd_discover(cfg).await,
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_serve(cfg: ServerConfig) -> Result<()> {
    let (runtime, reporter) = connect(&cfg)?;
    let builder = SnapshotBuilder::from_config(&cfg, runtime.clone(), reporter.clone());

    // A naming conflict in the first snapshot means the server cannot start.
    let initial = match builder.build().await {
        Ok(tools) => tools,
        Err(e @ SyncError::NamingConflict { .. }) => {
            return Err(e).context("Initial tool discovery failed");
        }
        Err(e) => return Err(e.into()),
    };

    let registry = ToolRegistry::new();
    let engine = ToolSetEngine::new(registry.clone(), runtime, reporter.clone());
    let sync = Arc::new(ToolSynchronizer::new(builder, engine));
    sync.apply(initial)
        .await
        .context("Failed to register initial tools")?;
    info!("Serving {} tools", registry.len().await);

    let mut scheduler = PollScheduler::new(sync, cfg.poll_interval(), reporter);
    scheduler.start();

    let server = Arc::new(McpServer::new(registry));
    let cancel = CancellationToken::new();
    let serve_cancel = cancel.clone();
    let mut serve_handle =
        tokio::spawn(async move { mcp::serve_stdio(server, serve_cancel).await });

    let served = tokio::select! {
        result = &mut serve_handle => Some(result),
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            eprintln!("\n{} Shutting down...", "<<<".red().bold());
            None
        }
    };

    // Stop polling before the transport goes away.
    scheduler.stop().await;
    cancel.cancel();

    let result = match served {
        Some(result) => result,
        None => serve_handle.await,
    };
    if let Err(e) = result.context("MCP transport task failed")? {
        error!("MCP transport error: {:#}", e);
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}

async fn cmd_discover(cfg: ServerConfig) -> Result<()> {
    let (runtime, reporter) = connect(&cfg)?;
    let tools = SnapshotBuilder::from_config(&cfg, runtime, reporter)
        .build()
        .await
        .context("Tool discovery failed")?;

    println!();
    println!("{}", "=== Decision Tools ===".bold());
    println!();
    if tools.is_empty() {
        println!("  {}", "(no tools discovered)".dimmed());
    }
    for tool in &tools {
        println!("  {}", tool.name.green().bold());
        println!(
            "    Origin:  {} / {} / {}",
            tool.origin.deployment_space, tool.origin.service_id, tool.origin.operation_id
        );
        if let Some(description) = &tool.description {
            println!("    About:   {}", description);
        }
        let mut inputs: Vec<&String> = tool.input_schema.properties.keys().collect();
        inputs.sort();
        println!(
            "    Inputs:  {}",
            inputs
                .iter()
                .map(|name| {
                    if tool.input_schema.required.contains(*name) {
                        format!("{}*", name)
                    } else {
                        name.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(", ")
        );
        println!("    Schema:  {}", tool.fingerprint[..12].dimmed());
        println!();
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn connect(cfg: &ServerConfig) -> Result<(Arc<dyn DecisionRuntime>, Arc<dyn SyncReporter>)> {
    let credentials = cfg.credentials()?;
    info!("Decision runtime: {}", cfg.url);
    let runtime: Arc<dyn DecisionRuntime> =
        Arc::new(HttpDecisionRuntime::new(&cfg.url, credentials)?);
    Ok((runtime, Arc::new(TracingReporter)))
}
