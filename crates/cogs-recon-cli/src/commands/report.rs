use clap::Args;
use serde_json::{json, Value};

use cogs_recon_core::client::AcApiClient;
use cogs_recon_core::config::ClientConfig;
use cogs_recon_core::pipeline::StatementPipeline;

/// Arguments for a live pipeline run
#[derive(Args)]
pub struct ReportArgs {
    /// Company identifier (ticker)
    #[arg(long, default_value = "AAPL")]
    pub company: String,

    /// Fiscal year to report on; the prior year supplies opening balances
    #[arg(long, default_value_t = 2023)]
    pub year: i32,

    /// API base URL (falls back to AC_BASE_URL, then http://localhost:3000)
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key sent as x-api-key (falls back to AC_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
}

/// Arguments for the health probe
#[derive(Args)]
pub struct HealthArgs {
    /// API base URL (falls back to AC_BASE_URL, then http://localhost:3000)
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key sent as x-api-key (falls back to AC_API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env(args.base_url.as_deref(), args.api_key.as_deref())?;
    let client = AcApiClient::new(config)?;
    let final_report = StatementPipeline::new(&client).report(&args.company, args.year)?;
    Ok(serde_json::to_value(final_report)?)
}

pub fn run_health(args: HealthArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env(args.base_url.as_deref(), args.api_key.as_deref())?;
    let base_url = config.base_url.clone();
    let client = AcApiClient::new(config)?;
    let response = client.health();
    Ok(json!({
        "base_url": base_url,
        "healthy": !response.is_error(),
        "response": response.to_value(),
    }))
}
