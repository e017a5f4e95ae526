mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::reconcile::{ExtractArgs, ReconcileArgs};
use commands::report::{HealthArgs, ReportArgs};

/// Reconcile reported cost of revenue against balance sheet movements
#[derive(Parser)]
#[command(
    name = "cogs-recon",
    version,
    about = "Reconcile reported cost of revenue against balance sheet movements",
    long_about = "Fetches current and prior balance sheets and the current P&L for a \
                  company, derives CWIP transfers, implied purchases and COGS with exact \
                  decimal arithmetic, and prints the report with its audit trail. \
                  Running without a subcommand is the same as `report`.",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    report: ReportArgs,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch statements from the API and run the full pipeline
    Report(ReportArgs),
    /// Reconcile pre-fetched statements or explicit figures
    Reconcile(ReconcileArgs),
    /// Locate one line item in a statement document
    Extract(ExtractArgs),
    /// Probe the API health endpoint
    Health(HealthArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    dotenv::dotenv().ok();
    logging::init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Report(cli.report));

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match command {
        Commands::Report(args) => commands::report::run_report(args),
        Commands::Reconcile(args) => commands::reconcile::run_reconcile(args),
        Commands::Extract(args) => commands::reconcile::run_extract(args),
        Commands::Health(args) => commands::report::run_health(args),
        Commands::Version => {
            println!("cogs-recon {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
