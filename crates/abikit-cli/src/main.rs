//! # abikit-cli
//!
//! Command-line interface for Ethereum ABI encoding and decoding.
//!
//! ## Usage
//!
//! ```bash
//! # Selectors and topics
//! abikit selector "transfer(address,uint256)"
//! abikit selector "event Transfer(address indexed from, address indexed to, uint256 value)"
//!
//! # Encoding and decoding
//! abikit encode "transfer(address,uint256)" 0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d 1000
//! abikit encode --packed "(uint8,string)" 1 hello
//! abikit decode "(uint256,string)" 0x... --allow-junk-data
//!
//! # Contract calls
//! abikit call --to 0x... "balanceOf(address) returns (uint256)" 0x...
//! ```

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod error;
mod output;

pub use config::Config;
pub use error::CliError;
pub use output::Output;

/// Ethereum ABI toolkit
#[derive(Parser, Debug)]
#[command(name = "abikit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// RPC endpoint URL
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Compute a function/error selector or an event topic
    Selector(commands::selector::SelectorArgs),
    /// ABI-encode values
    Encode(commands::encode::EncodeArgs),
    /// Decode ABI-encoded data
    Decode(commands::decode::DecodeArgs),
    /// Call a contract function through eth_call
    Call(commands::call::CallArgs),
    /// Show or edit configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
        /// Set RPC URL
        #[arg(long)]
        set_rpc: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load config
    let mut config = Config::load();

    // Override RPC URL if provided
    if let Some(rpc_url) = cli.rpc_url {
        config.rpc_url = rpc_url;
    }

    let result = match cli.command {
        Commands::Selector(args) => args.execute(cli.json),
        Commands::Encode(args) => args.execute(cli.json),
        Commands::Decode(args) => args.execute(&config, cli.json),
        Commands::Call(args) => args.execute(&config, cli.json).await,
        Commands::Config { show, set_rpc } => handle_config(&mut config, show, set_rpc, cli.json),
    };

    if let Err(e) = result {
        if cli.json {
            println!(
                "{}",
                serde_json::json!({
                    "error": e.to_string(),
                    "success": false
                })
            );
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn handle_config(
    config: &mut Config,
    show: bool,
    set_rpc: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    if let Some(rpc) = set_rpc {
        config.rpc_url = rpc;
        config.save()?;
        Output::new(json)
            .field("status", "saved")
            .message("Configuration saved")
            .print();
    } else if show {
        let block = config.block.to_string();
        let from = config.from.map(|a| a.to_checksum()).unwrap_or_default();
        Output::new(json)
            .field("rpc_url", &config.rpc_url)
            .field("from", &from)
            .field("block", &block)
            .field_bool("allow_junk_data", config.decode.allow_junk_data)
            .message(&format!(
                "RPC URL: {}\nFrom: {}\nBlock: {}\nAllow junk data: {}",
                config.rpc_url,
                if from.is_empty() { "(node default)" } else { &from },
                block,
                config.decode.allow_junk_data
            ))
            .print();
    } else {
        Output::new(json)
            .message("Use --show to display config, or --set-rpc to modify")
            .print();
    }

    Ok(())
}
