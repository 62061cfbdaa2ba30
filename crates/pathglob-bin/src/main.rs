use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::{filter::LevelFilter, util::SubscriberInitExt, EnvFilter};

mod commands;

/// Test paths against glob patterns and inspect how patterns are compiled
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase logging verbosity, can be repeated
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Print the paths that match one or more patterns
    Match(commands::match_paths::Opt),

    /// Print the expression a pattern compiles to
    Regex(commands::regex::Opt),

    /// Split a pattern into its base directory and glob portion
    Scan(commands::scan::Opt),
}

/// Entry point of the `pathglob` cli.
fn main() -> miette::Result<ExitCode> {
    // Parse the command line arguments
    let cli = Cli::parse();

    // Setup default logging level
    let default_filter = match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_filter.into())
        .from_env()
        .into_diagnostic()?;

    // Setup the tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .finish()
        .try_init()
        .into_diagnostic()?;

    // Dispatch the selected command
    match cli.command {
        Commands::Match(opt) => commands::match_paths::match_paths(opt),
        Commands::Regex(opt) => commands::regex::regex(opt).map(|()| ExitCode::SUCCESS),
        Commands::Scan(opt) => commands::scan::scan(opt).map(|()| ExitCode::SUCCESS),
    }
}
