/// Main entry point for the Businessmap MCP probe
///
/// This file sets up logging, parses command line arguments, and runs the
/// scripted JSON-RPC exchange against the server.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use tracing::{error, info};

use businessmap_mcp_probe::config::DEFAULT_SERVER_PROGRAM;
use businessmap_mcp_probe::{CardRef, ConsoleReporter, HarnessConfig, Probe, ProbeError, RunReport, Script};

/// Command line arguments for the Businessmap MCP probe
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Card ID or full card URL to read
    card: String,

    /// Comment to add to the card; the card is read again afterwards
    comment: Option<String>,

    /// MCP server executable to launch
    #[arg(long, env = "BUSINESSMAP_MCP_SERVER", default_value = DEFAULT_SERVER_PROGRAM)]
    server: PathBuf,

    /// Argument passed to the server (repeatable)
    #[arg(long = "server-arg", allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// How long to wait for each response, in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// How long to wait for trailing output after the last request, in milliseconds
    #[arg(long, default_value_t = 1000)]
    settle_ms: u64,

    /// Exit with an error if any request went unanswered
    #[arg(long)]
    strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn harness_config(&self) -> HarnessConfig {
        HarnessConfig {
            server_program: self.server.clone(),
            server_args: self.server_args.clone(),
            response_timeout: Duration::from_millis(self.timeout_ms),
            settle_delay: Duration::from_millis(self.settle_ms),
            ..HarnessConfig::default()
        }
    }
}

async fn run(args: &Args) -> Result<RunReport, ProbeError> {
    let card = CardRef::parse(&args.card)?;
    let script = Script::new(card, args.comment.clone());
    let probe = Probe::new(args.harness_config())?;

    let mut reporter = ConsoleReporter::stdout();
    probe.run(&script, &mut reporter).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Usage errors exit with 1, not clap's default of 2
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    // Set up logging based on command line flags
    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("businessmap_mcp_probe={}", log_level))
        .with_writer(std::io::stderr) // Transcript owns stdout
        .init();

    info!("Starting Businessmap MCP probe");

    match run(&args).await {
        Ok(report) if args.strict && !report.all_answered() => {
            error!("{} request(s) went unanswered", report.unanswered.len());
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            println!("Error running test: {}", e);
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
