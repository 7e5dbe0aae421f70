// pflow - headless account-pipeline reconciliation and flow export

mod exit_codes;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{EXIT_CONFIG_INVALID, EXIT_ERROR, EXIT_INPUT, EXIT_OUTPUT, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "pflow")]
#[command(about = "Reconcile account and outreach CSVs into a pipeline flow graph")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("PFLOW_COMMIT"), ")"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile, build the flow graph and write every configured output
    #[command(after_help = "\
Examples:
  pflow run pipeline.toml
  pflow run pipeline.toml --json > report.json
  pflow run pipeline.toml --fail-on-anomaly")]
    Run {
        /// Path to the pipeline .toml config
        config: PathBuf,

        /// Print the JSON report to stdout instead of a human summary
        #[arg(long)]
        json: bool,

        /// Exit with code 6 when any flow had to be clamped
        #[arg(long)]
        fail_on_anomaly: bool,
    },

    /// Write the reconciled table as CSV
    #[command(after_help = "\
Examples:
  pflow reconcile pipeline.toml
  pflow reconcile pipeline.toml --output reconciled.csv")]
    Reconcile {
        /// Path to the pipeline .toml config
        config: PathBuf,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Write the flow graph as JSON
    #[command(after_help = "\
Examples:
  pflow flow pipeline.toml
  pflow flow pipeline.toml --trace --output sankey.json")]
    Flow {
        /// Path to the pipeline .toml config
        config: PathBuf,

        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Emit the parallel-array Sankey trace instead of typed nodes/links
        #[arg(long)]
        trace: bool,
    },

    /// Print headline figures for each dataset
    Stats {
        /// Path to the pipeline .toml config
        config: PathBuf,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate a pipeline config without loading any data
    Validate {
        /// Path to the pipeline .toml config
        config: PathBuf,
    },
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => Err(CliError::args("no command given").with_hint("run `pflow --help` for usage")),
        Some(Commands::Run { config, json, fail_on_anomaly }) => {
            pipeline::cmd_run(config, json, fail_on_anomaly)
        }
        Some(Commands::Reconcile { config, output }) => pipeline::cmd_reconcile(config, output),
        Some(Commands::Flow { config, output, trace }) => pipeline::cmd_flow(config, output, trace),
        Some(Commands::Stats { config, json }) => pipeline::cmd_stats(config, json),
        Some(Commands::Validate { config }) => pipeline::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG_INVALID, msg)
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT, msg)
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
