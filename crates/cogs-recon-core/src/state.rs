use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::extract::find_value;
use crate::numeric::to_decimal;
use crate::source::{ApiResponse, FinancialDataSource};
use crate::types::Money;
use crate::ReconResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The five figures the reconciliation works from. All exact decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialState {
    /// Inventory at the start of the fiscal year (prior year's closing balance)
    pub opening_inventory: Money,
    /// Inventory at the end of the fiscal year
    pub closing_inventory: Money,
    /// Capital work in progress at the start of the year
    pub cwip_opening: Money,
    /// Capital work in progress at the end of the year
    pub cwip_closing: Money,
    /// Reported cost of revenue for the year
    pub cost_of_revenue: Money,
}

/// Figures as extracted, before decimal coercion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFigures {
    pub opening_inventory: Option<Value>,
    pub closing_inventory: Option<Value>,
    pub cwip_opening: Option<Value>,
    pub cwip_closing: Option<Value>,
    pub cost_of_revenue: Option<Value>,
}

/// Pre-fetched statement documents. Missing documents read as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatements {
    #[serde(default, alias = "bs_current")]
    pub balance_sheet_current: Option<Value>,
    #[serde(default, alias = "bs_prior", alias = "bs_prev")]
    pub balance_sheet_prior: Option<Value>,
    #[serde(default, alias = "pnl_current")]
    pub pnl: Option<Value>,
}

/// A built state plus its audit line and the fields that defaulted to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialStateBuild {
    pub state: FinancialState,
    pub audit_trail: String,
    pub missing: Vec<String>,
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

impl FinancialState {
    /// Coerce each raw figure to a decimal. Absent figures become zero; a
    /// present figure that does not parse fails the whole construction.
    pub fn from_raw(raw: &RawFigures) -> ReconResult<Self> {
        Ok(Self {
            opening_inventory: to_decimal("opening_inventory", raw.opening_inventory.as_ref())?,
            closing_inventory: to_decimal("closing_inventory", raw.closing_inventory.as_ref())?,
            cwip_opening: to_decimal("cwip_opening", raw.cwip_opening.as_ref())?,
            cwip_closing: to_decimal("cwip_closing", raw.cwip_closing.as_ref())?,
            cost_of_revenue: to_decimal("cost_of_revenue", raw.cost_of_revenue.as_ref())?,
        })
    }
}

impl RawFigures {
    /// Pull inventory and CWIP from both balance sheets and cost of revenue
    /// from the P&L.
    pub fn extract(bs_current: &Value, bs_prior: &Value, pnl: &Value) -> Self {
        Self {
            opening_inventory: find_value(bs_prior, "inventory"),
            closing_inventory: find_value(bs_current, "inventory"),
            cwip_opening: find_value(bs_prior, "capitalWorkInProgress"),
            cwip_closing: find_value(bs_current, "capitalWorkInProgress"),
            cost_of_revenue: find_value(pnl, "costOfRevenue"),
        }
    }

    /// Names of figures that were not found.
    pub fn missing(&self) -> Vec<String> {
        [
            ("opening_inventory", &self.opening_inventory),
            ("closing_inventory", &self.closing_inventory),
            ("cwip_opening", &self.cwip_opening),
            ("cwip_closing", &self.cwip_closing),
            ("cost_of_revenue", &self.cost_of_revenue),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name.to_string())
        .collect()
    }
}

/// Build the financial state from documents already in hand.
pub fn build_from_statements(
    company: &str,
    year: i32,
    bs_current: &Value,
    bs_prior: &Value,
    pnl: &Value,
) -> ReconResult<FinancialStateBuild> {
    let raw = RawFigures::extract(bs_current, bs_prior, pnl);
    debug!(company, year, figures = ?raw, "extracted line items");

    let missing = raw.missing();
    if !missing.is_empty() {
        warn!(company, year, ?missing, "line items not found, defaulting to zero");
    }

    let state = FinancialState::from_raw(&raw)?;

    let audit_trail = format!(
        "Fetched balancesheet for {company} {year} and {prior}. \
         Opening inventory={}, Closing inventory={}, CWIP opening={}, CWIP closing={}. \
         Fetched P&L costOfRevenue={}.",
        state.opening_inventory,
        state.closing_inventory,
        state.cwip_opening,
        state.cwip_closing,
        state.cost_of_revenue,
        prior = year - 1,
    );

    Ok(FinancialStateBuild {
        state,
        audit_trail,
        missing,
    })
}

/// Build the financial state, fetching from `source` any statement the
/// caller did not supply: balance sheets for `year` and `year - 1`, P&L for
/// `year`. Error responses are searched as empty documents.
pub fn build_financial_state(
    source: &dyn FinancialDataSource,
    company: &str,
    year: i32,
    bs_current: Option<&ApiResponse>,
    bs_prior: Option<&ApiResponse>,
    pnl: Option<&ApiResponse>,
) -> ReconResult<FinancialStateBuild> {
    let fetched_current;
    let bs_current = match bs_current {
        Some(resp) => resp,
        None => {
            fetched_current = source.get_balance_sheet(company, Some(year));
            &fetched_current
        }
    };

    let fetched_prior;
    let bs_prior = match bs_prior {
        Some(resp) => resp,
        None => {
            fetched_prior = source.get_balance_sheet(company, Some(year - 1));
            &fetched_prior
        }
    };

    let fetched_pnl;
    let pnl = match pnl {
        Some(resp) => resp,
        None => {
            fetched_pnl = source.get_pnl(company, Some(year));
            &fetched_pnl
        }
    };

    build_from_statements(
        company,
        year,
        bs_current.payload(),
        bs_prior.payload(),
        pnl.payload(),
    )
}
