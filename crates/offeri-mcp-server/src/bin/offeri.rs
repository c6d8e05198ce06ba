use anyhow::{Context, Result};
use atty::Stream;
use clap::{Parser, Subcommand};
use colored::Colorize;
use offeri_catalog::StorageHandle;
use offeri_core::{ConfigManager, OfferiConfig};
use offeri_mcp_server::{build_server, spawn_token_janitor};
use offeri_workflow::{DebugLogger, TokenStore};
use rmcp::ServiceExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(
    name = "offeri",
    version,
    author,
    about = "OfferI consultation workflow MCP server",
    long_about = "Runs the token-gated study-abroad consultation workflow as MCP tools over stdio or streamable HTTP."
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    verbose: bool,

    #[arg(long, global = true, help = "Configuration file path")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start MCP server with specified transport")]
    Start {
        #[command(subcommand)]
        transport: TransportType,
    },

    #[command(about = "Show what the program catalog holds")]
    CatalogStats,

    #[command(about = "Write a default configuration file")]
    InitConfig {
        #[arg(help = "Where to write the file", default_value = ".offeri.toml")]
        path: PathBuf,

        #[arg(short, long, help = "Overwrite an existing file")]
        force: bool,
    },
}

#[derive(Subcommand)]
enum TransportType {
    #[command(about = "Start with STDIO transport (default)")]
    Stdio,

    #[cfg(feature = "server-http")]
    #[command(about = "Start with HTTP streaming transport")]
    Http {
        #[arg(long, help = "Host to bind to (overrides config)")]
        host: Option<String>,

        #[arg(short, long, help = "Port to bind to (overrides config)")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Enabled with OFFERI_DEBUG=1
    DebugLogger::init();

    let cli = Cli::parse();

    if let Commands::InitConfig { path, force } = &cli.command {
        return handle_init_config(path, *force);
    }

    let config_mgr = ConfigManager::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let config = config_mgr.config().clone();

    match cli.command {
        Commands::Start { transport } => handle_start(transport, &config, cli.verbose).await,
        Commands::CatalogStats => handle_catalog_stats(&config),
        Commands::InitConfig { .. } => Ok(()),
    }
}

fn env_filter(config: &OfferiConfig, verbose: bool) -> EnvFilter {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Stdout carries the MCP protocol on stdio, so logs go to a file instead.
fn init_file_logging(config: &OfferiConfig, verbose: bool) -> Result<WorkerGuard> {
    let log_dir = &config.logging.log_dir;
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, "mcp-server.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter(config, verbose))
        .with_ansi(false)
        .with_target(false)
        .with_line_number(true)
        .try_init()
        .ok();

    Ok(guard)
}

#[cfg(feature = "server-http")]
fn init_stderr_logging(config: &OfferiConfig, verbose: bool) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(config, verbose))
        .with_target(false)
        .try_init()
        .ok();
}

fn start_janitor(config: &OfferiConfig, tokens: Arc<dyn TokenStore>) {
    if config.tokens.ttl_seconds.is_some() {
        let every = Duration::from_secs(config.tokens.purge_interval_seconds.max(1));
        spawn_token_janitor(tokens, every);
        info!("Token janitor running every {}s", every.as_secs());
    }
}

async fn handle_start(transport: TransportType, config: &OfferiConfig, verbose: bool) -> Result<()> {
    match transport {
        TransportType::Stdio => {
            let _guard = init_file_logging(config, verbose)?;

            if atty::is(Stream::Stderr) {
                eprintln!("{}", "Starting OfferI MCP server (stdio)...".green().bold());
            }

            let (server, tokens) = build_server(config).context("Failed to build MCP server")?;
            start_janitor(config, tokens);

            let service = server.serve(rmcp::transport::stdio()).await.map_err(|e| {
                if atty::is(Stream::Stderr) {
                    eprintln!("{} {}", "Failed to start MCP server:".red(), e);
                }
                anyhow::anyhow!("MCP server startup failed: {}", e)
            })?;
            info!("OfferI MCP server ready on stdio");

            service
                .waiting()
                .await
                .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;
            DebugLogger::flush();
        }

        #[cfg(feature = "server-http")]
        TransportType::Http { host, port } => {
            use offeri_mcp_server::{start_http_server, HttpServerConfig};

            init_stderr_logging(config, verbose);

            let http_config = HttpServerConfig::from(&config.server).with_overrides(host, port);
            eprintln!(
                "{}",
                format!(
                    "Starting OfferI MCP server on http://{}",
                    http_config.bind_address()
                )
                .green()
                .bold()
            );

            let (server, tokens) = build_server(config).context("Failed to build MCP server")?;
            start_janitor(config, tokens);

            start_http_server(server, http_config)
                .await
                .context("HTTP server failed")?;
        }
    }

    Ok(())
}

fn handle_catalog_stats(config: &OfferiConfig) -> Result<()> {
    let storage = StorageHandle::open(&config.catalog.database_path).with_context(|| {
        format!(
            "Failed to open program catalog at {}",
            config.catalog.database_path.display()
        )
    })?;
    let stats = storage.with(|s| s.stats())?;

    println!("{}", "OfferI Program Catalog".blue().bold());
    println!("  Database: {}", config.catalog.database_path.display());
    println!("  Programs: {}", stats.total_programs);
    println!("  With duration: {}", stats.with_duration);
    println!("  With degree type: {}", stats.with_degree_type);
    println!();

    println!("{}", "Top countries".cyan());
    for country in &stats.top_countries {
        println!("  {:<30} {:>6}", country.country, country.program_count);
    }
    println!();

    println!("{}", "Top universities".cyan());
    for university in &stats.top_universities {
        println!(
            "  {:<50} {:<20} {:>5}",
            university.university, university.country, university.programs
        );
    }
    println!();

    println!("{}", "Degree types".cyan());
    for degree in &stats.degree_types {
        println!("  {:<30} {:>6}", degree.degree_type, degree.count);
    }

    Ok(())
}

fn handle_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    ConfigManager::create_default_config(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} {}", "Wrote default configuration to".green(), path.display());
    Ok(())
}
