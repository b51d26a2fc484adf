//! todosync CLI
//!
//! # Commands
//!
//! - `serve` - Run the todo server on the first free candidate port
//! - `probe` - Report which candidate endpoint a client would use
//! - `version` - Show version information

mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use todosync_protocol::{EndpointConfig, DEFAULT_FALLBACK_PORTS, DEFAULT_PORT};
use tracing_subscriber::EnvFilter;

/// Multi-list todo server and tools.
#[derive(Parser)]
#[command(name = "todosync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Candidate service addresses.
#[derive(Args)]
struct EndpointArgs {
    /// Host to bind or contact
    #[arg(long, env = "TODOSYNC_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Default port
    #[arg(short, long, env = "TODOSYNC_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Fallback ports, tried in order (comma separated)
    #[arg(
        long,
        env = "TODOSYNC_FALLBACK_PORTS",
        value_delimiter = ',',
        default_values_t = DEFAULT_FALLBACK_PORTS
    )]
    fallback_ports: Vec<u16>,
}

impl EndpointArgs {
    fn endpoint(&self) -> EndpointConfig {
        EndpointConfig::new(self.host.clone(), self.port)
            .with_fallback_ports(self.fallback_ports.iter().copied())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the todo server
    Serve {
        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Secret used to sign credentials
        #[arg(long, env = "TODOSYNC_SECRET", hide_env_values = true)]
        secret: Option<String>,

        /// Snapshot file for users and lists
        #[arg(long, env = "TODOSYNC_DATA_FILE")]
        data_file: Option<PathBuf>,
    },

    /// Report which candidate endpoint answers
    Probe {
        #[command(flatten)]
        endpoint: EndpointArgs,

        /// Probe timeout in milliseconds
        #[arg(long, default_value = "1000")]
        timeout_ms: u64,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Serve {
            endpoint,
            secret,
            data_file,
        } => {
            commands::serve::run(endpoint.endpoint(), secret, data_file).await?;
        }
        Commands::Probe {
            endpoint,
            timeout_ms,
        } => {
            commands::probe::run(endpoint.endpoint(), timeout_ms).await?;
        }
        Commands::Version => {
            println!("todosync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
