mod commands;
mod output;
mod util;

use beholder_core::error::codes;
use beholder_core::{HttpBackend, ResolutionController};
use clap::{Parser, Subcommand};

use util::{ConnectionOverrides, EXIT_CONNECTION, backend_config_or_exit, exit_error};

#[derive(Parser)]
#[command(
    name = "beholder",
    version,
    about = "Beholder: find a subscriber, pick the right account, and diagnose its connection"
)]
struct Cli {
    /// Diagnostics API base URL
    #[arg(long, global = true, env = "BEHOLDER_API_URL")]
    api_url: Option<String>,

    /// API key sent as x-api-key
    #[arg(long, global = true, env = "BEHOLDER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Request timeout in seconds [default: 15]
    #[arg(long, global = true, env = "BEHOLDER_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log progress to stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a subscriber and diagnose it, asking which one when several match
    Lookup(commands::lookup::LookupArgs),
    /// List candidate accounts for a query without diagnosing
    Search(commands::search::SearchArgs),
    /// Diagnose a known PPPoE username directly
    Diagnose(commands::diagnose::DiagnoseArgs),
    /// Show effective connection settings (API key masked)
    Config,
}

impl Cli {
    fn overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    util::init_tracing(cli.verbose);

    let overrides = cli.overrides();
    let code = match cli.command {
        Commands::Config => commands::config::run(&overrides),
        Commands::Lookup(args) => commands::lookup::run(&connect(&overrides), args).await,
        Commands::Search(args) => commands::search::run(connect(&overrides).backend(), args).await,
        Commands::Diagnose(args) => commands::diagnose::run(&connect(&overrides), args).await,
    };

    std::process::exit(code);
}

fn connect(overrides: &ConnectionOverrides) -> ResolutionController<HttpBackend> {
    let config = backend_config_or_exit(overrides);
    tracing::debug!(api_url = %config.base_url(), timeout = ?config.timeout(), "backend configured");
    match ResolutionController::connect(config) {
        Ok(controller) => controller,
        Err(e) => exit_error(
            codes::CONNECTION_ERROR,
            &format!("Failed to initialise HTTP client: {e}"),
            None,
            EXIT_CONNECTION,
        ),
    }
}
