use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use cogs_recon_core::extract::{candidate_names, find_value};
use cogs_recon_core::numeric::to_decimal;
use cogs_recon_core::reconcile::{reconcile_financial_state, reconcile_statements};
use cogs_recon_core::state::{FinancialState, RawStatements};

use crate::input;

/// Arguments for reconciling data already in hand
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ReconcileArgs {
    /// Path to a JSON or YAML file holding balance_sheet_current,
    /// balance_sheet_prior and pnl documents (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Company label for the audit trail
    #[arg(long, default_value = "AAPL")]
    pub company: String,

    /// Fiscal year label for the audit trail
    #[arg(long, default_value_t = 2023)]
    pub year: i32,

    /// Inventory at the start of the year
    #[arg(long)]
    pub opening_inventory: Option<Decimal>,

    /// Inventory at the end of the year
    #[arg(long)]
    pub closing_inventory: Option<Decimal>,

    /// Capital work in progress at the start of the year
    #[arg(long)]
    pub cwip_opening: Option<Decimal>,

    /// Capital work in progress at the end of the year
    #[arg(long)]
    pub cwip_closing: Option<Decimal>,

    /// Reported cost of revenue
    #[arg(long, alias = "cor")]
    pub cost_of_revenue: Option<Decimal>,
}

/// Arguments for a single line-item lookup
#[derive(Args)]
pub struct ExtractArgs {
    /// Path to a JSON or YAML statement document (or pipe JSON on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Line item to look for, e.g. inventory or costOfRevenue
    #[arg(long)]
    pub key: String,
}

pub fn run_reconcile(args: ReconcileArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        let statements: RawStatements = input::file::read_document(path)?;
        let result = reconcile_statements(&args.company, args.year, &statements)?;
        return Ok(serde_json::to_value(result)?);
    }

    if has_figure_flags(&args) {
        let state = FinancialState {
            opening_inventory: args.opening_inventory.unwrap_or_default(),
            closing_inventory: args.closing_inventory.unwrap_or_default(),
            cwip_opening: args.cwip_opening.unwrap_or_default(),
            cwip_closing: args.cwip_closing.unwrap_or_default(),
            cost_of_revenue: args.cost_of_revenue.unwrap_or_default(),
        };
        return Ok(serde_json::to_value(reconcile_financial_state(&state)?)?);
    }

    if let Some(data) = input::stdin::read_stdin()? {
        let statements: RawStatements = serde_json::from_value(data)?;
        let result = reconcile_statements(&args.company, args.year, &statements)?;
        return Ok(serde_json::to_value(result)?);
    }

    Err("--input <file>, stdin, or at least one figure flag required for reconcile".into())
}

pub fn run_extract(args: ExtractArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let document: Value = if let Some(ref path) = args.input {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file> or stdin required for extract".into());
    };

    Ok(describe_match(&document, &args.key))
}

/// The matched (normalized) value and its decimal coercion. A value that
/// does not coerce is still reported, with the failure under `decimal_error`.
fn describe_match(document: &Value, key: &str) -> Value {
    let found = find_value(document, key);

    let mut out = json!({
        "key": key,
        "candidates": candidate_names(key),
        "found": found.is_some(),
        "value": found,
    });
    match to_decimal(key, found.as_ref()) {
        Ok(decimal) => out["decimal"] = json!(decimal.to_string()),
        Err(e) => out["decimal_error"] = json!(e.to_string()),
    }
    out
}

fn has_figure_flags(args: &ReconcileArgs) -> bool {
    [
        args.opening_inventory,
        args.closing_inventory,
        args.cwip_opening,
        args.cwip_closing,
        args.cost_of_revenue,
    ]
    .iter()
    .any(Option::is_some)
}
