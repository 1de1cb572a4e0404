//! Pass server binary
//!
//! Speaks the plugin protocol on stdin/stdout, so everything human-facing
//! goes to stderr.

use clap::{Parser, Subcommand};
use log::info;
use pin_protocol::StreamTransport;
use pin_server::{builtin_registry, PassServer, ServerConfig};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pin-server")]
#[command(about = "Out-of-process pass server for the plugin pass engine")]
#[command(version)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one session on stdin/stdout
    Serve,

    /// List registered passes and where they are bound
    ListPasses,
}

fn main() {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Serve => serve(cli.config.as_deref()),
        Commands::ListPasses => list_passes(cli.config.as_deref()),
    };
    if let Err(e) = result {
        eprintln!("pin-server: {}", e);
        std::process::exit(1);
    }
}

fn load_server(config_path: Option<&Path>) -> Result<PassServer, Box<dyn std::error::Error>> {
    let config = match config_path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let registry = builtin_registry(&config)?.freeze();
    Ok(PassServer::new(registry))
}

fn serve(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let server = load_server(config_path)?;
    let transport = StreamTransport::new(io::stdin(), io::stdout())?;
    let end = server.serve(transport)?;
    info!("session ended: {:?}", end);
    Ok(())
}

fn list_passes(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let server = load_server(config_path)?;
    for record in server.registry().records() {
        println!(
            "{:<20} {:<16} priority {}",
            record.name, record.inject_point, record.key.priority
        );
    }
    Ok(())
}
