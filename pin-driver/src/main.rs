//! Plugin pass engine driver
//!
//! Loads a native module snapshot, walks the host pipeline against a pass
//! server and writes the optimized module back out.

use clap::{Parser, Subcommand};
use pin_common::InjectPoint;
use pin_driver::{
    connect_child,
    connect_in_process,
    run_pipeline,
    ErrorPolicy,
    HostConfig,
    HostSession,
};
use pin_native::Module;
use pin_protocol::Transport;
use pin_server::ServerConfig;
use pin_translate::to_dialect;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pinc")]
#[command(about = "Run out-of-process optimization passes over a native IR module")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the pipeline with a pass server attached
    Run {
        /// Native module snapshot (JSON)
        input: PathBuf,

        /// Pass server executable; the built-in passes run in-process if omitted
        #[arg(long)]
        server: Option<PathBuf>,

        /// Server configuration file (JSON)
        #[arg(long)]
        server_config: Option<PathBuf>,

        /// Injection points to reach, comma separated (default: all)
        #[arg(long, value_delimiter = ',')]
        points: Vec<InjectPoint>,

        /// Write the resulting module here
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the resulting module to stdout
        #[arg(long)]
        print_ir: bool,

        /// Stop at the first plugin failure instead of warning
        #[arg(long)]
        fatal_errors: bool,

        /// Per-invoke budget in milliseconds
        #[arg(long)]
        budget_ms: Option<u64>,
    },

    /// Print the dialect form of a native module
    Translate {
        input: PathBuf,
    },
}

struct RunOptions {
    output: Option<PathBuf>,
    print_ir: bool,
    points: Vec<InjectPoint>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            input,
            server,
            server_config,
            points,
            output,
            print_ir,
            fatal_errors,
            budget_ms,
        } => {
            let options = RunOptions { output, print_ir, points };
            run(
                &input,
                server.as_deref(),
                server_config.as_deref(),
                fatal_errors,
                budget_ms,
                &options,
            )
        }
        Commands::Translate { input } => translate(&input),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("pinc: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether compilation finished without errors
fn run(
    input: &Path,
    server: Option<&Path>,
    server_config_path: Option<&Path>,
    fatal_errors: bool,
    budget_ms: Option<u64>,
    options: &RunOptions,
) -> Result<bool, Box<dyn std::error::Error>> {
    let module = Module::load(input)?;
    let server_config = match server_config_path {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let config = HostConfig {
        budget: Duration::from_millis(budget_ms.unwrap_or(server_config.invoke_budget_ms)),
        policy: if fatal_errors { ErrorPolicy::Fatal } else { ErrorPolicy::Warn },
        ..HostConfig::default()
    };

    match server {
        Some(path) => {
            // Any early return drops `server`, which kills the child
            let (session, server) = connect_child(path, server_config_path, module, config)?;
            let ok = drive(session, options)?;
            server.wait()?;
            Ok(ok)
        }
        None => {
            let (session, handle) = connect_in_process(module, config, &server_config)?;
            let ok = drive(session, options)?;
            match handle.join() {
                Ok(Ok(end)) => log::debug!("server session ended: {:?}", end),
                Ok(Err(e)) => log::warn!("server session failed: {}", e),
                Err(_) => log::warn!("server thread panicked"),
            }
            Ok(ok)
        }
    }
}

fn drive<T: Transport>(
    mut session: HostSession<T>,
    options: &RunOptions,
) -> Result<bool, Box<dyn std::error::Error>> {
    let outcome = run_pipeline(&mut session, &options.points);
    let (module, reporter) = session.finish();

    reporter.print_diagnostics();
    let report = outcome?;
    eprintln!(
        "{} point(s) reached, {} applied; {}",
        report.reached.len(),
        report.applied(),
        reporter.summary(),
    );

    if options.print_ir {
        println!("{}", module);
    }
    if let Some(path) = &options.output {
        fs::write(path, module.to_json()?)?;
        eprintln!("module written to: {}", path.display());
    }
    Ok(!reporter.has_errors())
}

fn translate(input: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let module = Module::load(input)?;
    let dialect = to_dialect(&module)?;
    print!("{}", dialect);
    Ok(true)
}
