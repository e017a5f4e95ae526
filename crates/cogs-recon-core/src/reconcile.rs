use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::numeric::format_currency;
use crate::source::FinancialDataSource;
use crate::state::{build_financial_state, build_from_statements, FinancialState, RawStatements};
use crate::types::{with_metadata, Audited, ComputationOutput, Money};
use crate::{ReconError, ReconResult};

const METHODOLOGY: &str = "Implied purchases COGS reconciliation (inventory + CWIP roll-forward)";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Reported quantities, each rounded half-up to two places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CogsReport {
    pub cogs: String,
    #[serde(rename = "reported_costOfRevenue")]
    pub reported_cost_of_revenue: String,
    pub implied_purchases: String,
    pub cwip_transfers: String,
    pub reconciliation: String,
}

impl CogsReport {
    pub fn zero() -> Self {
        let zero = format_currency(Money::ZERO);
        Self {
            cogs: zero.clone(),
            reported_cost_of_revenue: zero.clone(),
            implied_purchases: zero.clone(),
            cwip_transfers: zero.clone(),
            reconciliation: zero,
        }
    }
}

/// Unrounded results of every reconciliation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CogsFigures {
    pub cwip_transfers: Money,
    pub implied_purchases: Money,
    pub cogs: Money,
    pub cost_of_revenue: Money,
    pub reconciliation: Money,
}

impl CogsFigures {
    pub fn to_report(&self) -> CogsReport {
        CogsReport {
            cogs: format_currency(self.cogs),
            reported_cost_of_revenue: format_currency(self.cost_of_revenue),
            implied_purchases: format_currency(self.implied_purchases),
            cwip_transfers: format_currency(self.cwip_transfers),
            reconciliation: format_currency(self.reconciliation),
        }
    }
}

/// All reconciliation steps, with one audit line per step in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CogsCalculation {
    pub figures: CogsFigures,
    pub report: CogsReport,
    pub audit_trail: Vec<String>,
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Net CWIP drawn down over the year: opening minus closing. Positive means
/// completed capital work moved into inventory or production.
pub fn compute_cwip_transfers(fin: &FinancialState) -> ReconResult<Audited<Money>> {
    let transfers = checked_sub("cwip_transfers", fin.cwip_opening, fin.cwip_closing)?;
    Ok(Audited::new(
        transfers,
        format!(
            "CWIP transfers = cwip_opening ({}) - cwip_closing ({}) = {}",
            fin.cwip_opening, fin.cwip_closing, transfers
        ),
    ))
}

/// Purchases implied by the reported cost of revenue:
/// `cost_of_revenue - opening - cwip_transfers + closing`.
pub fn compute_implied_purchases(fin: &FinancialState) -> ReconResult<Audited<Money>> {
    const STEP: &str = "implied_purchases";
    let cwip_transfers = checked_sub(STEP, fin.cwip_opening, fin.cwip_closing)?;
    let purchases = checked_sub(STEP, fin.cost_of_revenue, fin.opening_inventory)?;
    let purchases = checked_sub(STEP, purchases, cwip_transfers)?;
    let purchases = checked_add(STEP, purchases, fin.closing_inventory)?;
    Ok(Audited::new(
        purchases,
        format!(
            "Implied purchases = costOfRevenue ({}) - opening_inventory ({}) - cwip_transfers ({}) + closing_inventory ({}) = {}",
            fin.cost_of_revenue, fin.opening_inventory, cwip_transfers, fin.closing_inventory, purchases
        ),
    ))
}

/// `opening + purchases + cwip_transfers - closing`
pub fn compute_cogs_from_formula(
    opening: Money,
    purchases: Money,
    cwip_transfers: Money,
    closing: Money,
) -> ReconResult<Audited<Money>> {
    const STEP: &str = "cogs";
    let cogs = checked_add(STEP, opening, purchases)?;
    let cogs = checked_add(STEP, cogs, cwip_transfers)?;
    let cogs = checked_sub(STEP, cogs, closing)?;
    Ok(Audited::new(
        cogs,
        format!(
            "COGS = opening_inventory ({opening}) + purchases ({purchases}) + cwip_transfers ({cwip_transfers}) - closing_inventory ({closing}) = {cogs}"
        ),
    ))
}

/// Derived COGS minus reported cost of revenue. Zero unless something
/// upstream rounded the inputs differently.
pub fn compute_reconciliation(cogs: Money, cost_of_revenue: Money) -> ReconResult<Audited<Money>> {
    let difference = checked_sub("reconciliation", cogs, cost_of_revenue)?;
    Ok(Audited::new(
        difference,
        format!("Reconciliation (calculated COGS - reported costOfRevenue) = {difference}"),
    ))
}

/// Run every step against one financial state.
///
/// Fails with [`ReconError::ArithmeticOverflow`] when an intermediate
/// result leaves the decimal range (figures near 7.9e28).
pub fn calculate_cogs(fin: &FinancialState) -> ReconResult<CogsCalculation> {
    let transfers = compute_cwip_transfers(fin)?;
    let purchases = compute_implied_purchases(fin)?;
    let cogs = compute_cogs_from_formula(
        fin.opening_inventory,
        purchases.value,
        transfers.value,
        fin.closing_inventory,
    )?;
    let reconciliation = compute_reconciliation(cogs.value, fin.cost_of_revenue)?;

    let figures = CogsFigures {
        cwip_transfers: transfers.value,
        implied_purchases: purchases.value,
        cogs: cogs.value,
        cost_of_revenue: fin.cost_of_revenue,
        reconciliation: reconciliation.value,
    };

    Ok(CogsCalculation {
        figures,
        report: figures.to_report(),
        audit_trail: vec![
            transfers.audit_trail,
            purchases.audit_trail,
            cogs.audit_trail,
            reconciliation.audit_trail,
        ],
    })
}

fn checked_add(context: &str, lhs: Money, rhs: Money) -> ReconResult<Money> {
    lhs.checked_add(rhs).ok_or_else(|| ReconError::ArithmeticOverflow {
        context: format!("{context}: {lhs} + {rhs}"),
    })
}

fn checked_sub(context: &str, lhs: Money, rhs: Money) -> ReconResult<Money> {
    lhs.checked_sub(rhs).ok_or_else(|| ReconError::ArithmeticOverflow {
        context: format!("{context}: {lhs} - {rhs}"),
    })
}

// ---------------------------------------------------------------------------
// Public API: one-shot reconciliation
// ---------------------------------------------------------------------------

/// Reconcile pre-fetched statements. Company and year only label the audit
/// trail.
pub fn reconcile_statements(
    company: &str,
    year: i32,
    statements: &RawStatements,
) -> ReconResult<ComputationOutput<CogsReport>> {
    let start = Instant::now();
    let empty = Value::Null;

    let built = build_from_statements(
        company,
        year,
        statements.balance_sheet_current.as_ref().unwrap_or(&empty),
        statements.balance_sheet_prior.as_ref().unwrap_or(&empty),
        statements.pnl.as_ref().unwrap_or(&empty),
    )?;

    let warnings = missing_warnings(&built.missing);
    envelope(&built.state, built.audit_trail, warnings, start)
}

/// Reconcile figures the caller already holds as decimals.
pub fn reconcile_financial_state(
    state: &FinancialState,
) -> ReconResult<ComputationOutput<CogsReport>> {
    let start = Instant::now();
    let state_audit = format!(
        "Supplied figures. Opening inventory={}, Closing inventory={}, CWIP opening={}, CWIP closing={}, costOfRevenue={}.",
        state.opening_inventory,
        state.closing_inventory,
        state.cwip_opening,
        state.cwip_closing,
        state.cost_of_revenue,
    );
    envelope(state, state_audit, Vec::new(), start)
}

/// Fetch, build and reconcile in one call.
pub fn calculate_cogs_for_company(
    source: &dyn FinancialDataSource,
    company: &str,
    year: i32,
) -> ReconResult<ComputationOutput<CogsReport>> {
    let start = Instant::now();

    let bs_current = source.get_balance_sheet(company, Some(year));
    let bs_prior = source.get_balance_sheet(company, Some(year - 1));
    let pnl = source.get_pnl(company, Some(year));

    let mut warnings: Vec<String> = [
        ("balancesheet(current)", &bs_current),
        ("balancesheet(prior)", &bs_prior),
        ("pnl", &pnl),
    ]
    .iter()
    .filter_map(|(label, resp)| resp.error().map(|e| format!("{label} error: {}", e.message)))
    .collect();

    let built = build_financial_state(
        source,
        company,
        year,
        Some(&bs_current),
        Some(&bs_prior),
        Some(&pnl),
    )?;
    warnings.extend(missing_warnings(&built.missing));

    envelope(&built.state, built.audit_trail, warnings, start)
}

fn envelope(
    state: &FinancialState,
    state_audit: String,
    warnings: Vec<String>,
    start: Instant,
) -> ReconResult<ComputationOutput<CogsReport>> {
    let calculation = calculate_cogs(state)?;
    info!(
        cogs = %calculation.figures.cogs,
        reconciliation = %calculation.figures.reconciliation,
        "COGS reconciled"
    );

    let mut lines = Vec::with_capacity(calculation.audit_trail.len() + 1);
    lines.push(state_audit);
    lines.extend(calculation.audit_trail);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        METHODOLOGY,
        state,
        warnings,
        lines.join(" | "),
        elapsed,
        calculation.report,
    ))
}

fn missing_warnings(missing: &[String]) -> Vec<String> {
    missing
        .iter()
        .map(|field| format!("{field} not found in source data; defaulted to 0"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sample_state() -> FinancialState {
        FinancialState {
            opening_inventory: dec!(100),
            closing_inventory: dec!(120),
            cwip_opening: dec!(15),
            cwip_closing: dec!(10),
            cost_of_revenue: dec!(80),
        }
    }

    #[test]
    fn test_cwip_transfers() {
        let res = compute_cwip_transfers(&sample_state()).unwrap();
        assert_eq!(res.value, dec!(5));
        assert_eq!(
            res.audit_trail,
            "CWIP transfers = cwip_opening (15) - cwip_closing (10) = 5"
        );
    }

    #[test]
    fn test_implied_purchases() {
        // 80 - 100 - 5 + 120 = 95
        let res = compute_implied_purchases(&sample_state()).unwrap();
        assert_eq!(res.value, dec!(95));
    }

    #[test]
    fn test_cogs_formula() {
        let res = compute_cogs_from_formula(dec!(100), dec!(95), dec!(5), dec!(120)).unwrap();
        assert_eq!(res.value, dec!(80));
        assert!(res.audit_trail.ends_with("= 80"));
    }

    #[test]
    fn test_basic_report() {
        let calc = calculate_cogs(&sample_state()).unwrap();
        assert_eq!(
            calc.report,
            CogsReport {
                cogs: "80.00".into(),
                reported_cost_of_revenue: "80.00".into(),
                implied_purchases: "95.00".into(),
                cwip_transfers: "5.00".into(),
                reconciliation: "0.00".into(),
            }
        );
        assert_eq!(calc.audit_trail.len(), 4);
    }

    #[test]
    fn test_reconciliation_exactly_zero() {
        let states = [
            sample_state(),
            FinancialState {
                opening_inventory: dec!(1000),
                closing_inventory: dec!(-1200),
                cwip_opening: dec!(350),
                cwip_closing: dec!(300),
                cost_of_revenue: dec!(150),
            },
            FinancialState {
                opening_inventory: dec!(100.12),
                closing_inventory: dec!(120.67),
                cwip_opening: dec!(15.876),
                cwip_closing: dec!(10.123),
                cost_of_revenue: dec!(80.555),
            },
            FinancialState {
                opening_inventory: dec!(0.0000001),
                closing_inventory: dec!(98765432109.87654321),
                cwip_opening: dec!(-3.3333333333),
                cwip_closing: dec!(7),
                cost_of_revenue: dec!(1.005),
            },
        ];
        for state in states {
            assert!(calculate_cogs(&state).unwrap().figures.reconciliation.is_zero());
        }
    }

    #[test]
    fn test_overflow_is_an_error() {
        let state = FinancialState {
            opening_inventory: Money::ZERO,
            closing_inventory: Money::MAX,
            cwip_opening: Money::ZERO,
            cwip_closing: Money::ZERO,
            cost_of_revenue: Money::MAX,
        };
        let err = calculate_cogs(&state).unwrap_err();
        assert!(matches!(err, ReconError::ArithmeticOverflow { .. }));
        assert!(err.to_string().contains("implied_purchases"));

        assert!(reconcile_financial_state(&state).is_err());
    }

    #[test]
    fn test_reconcile_statements_overflow() {
        let huge = "79,228,162,514,264,337,593,543,950,335";
        let statements = RawStatements {
            balance_sheet_current: Some(json!({"inventory": huge})),
            balance_sheet_prior: Some(json!({"inventory": 0})),
            pnl: Some(json!({"costOfRevenue": huge})),
        };
        let err = reconcile_statements("AAPL", 2023, &statements).unwrap_err();
        assert!(matches!(err, ReconError::ArithmeticOverflow { .. }));
    }

    #[test]
    fn test_rounding_half_up() {
        let state = FinancialState {
            opening_inventory: dec!(100.12),
            closing_inventory: dec!(120.67),
            cwip_opening: dec!(15.876),
            cwip_closing: dec!(10.123),
            cost_of_revenue: dec!(80.555),
        };
        let report = calculate_cogs(&state).unwrap().report;
        assert_eq!(report.cogs, "80.56");
        assert_eq!(report.reported_cost_of_revenue, "80.56");
        // 80.555 - 100.12 - 5.753 + 120.67 = 95.352
        assert_eq!(report.implied_purchases, "95.35");
        assert_eq!(report.cwip_transfers, "5.75");
    }

    #[test]
    fn test_report_field_names() {
        let value = serde_json::to_value(CogsReport::zero()).unwrap();
        assert_eq!(value["reported_costOfRevenue"], json!("0.00"));
        assert_eq!(value["reconciliation"], json!("0.00"));
    }

    #[test]
    fn test_reconcile_statements_envelope() {
        let statements = RawStatements {
            balance_sheet_current: Some(json!({"inventory": 120, "capitalWorkInProgress": 10})),
            balance_sheet_prior: Some(json!({"inventory": 100, "capitalWorkInProgress": 15})),
            pnl: None,
        };
        let out = reconcile_statements("AAPL", 2023, &statements).unwrap();
        assert_eq!(out.result.reported_cost_of_revenue, "0.00");
        assert_eq!(out.result.cogs, "0.00");
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].starts_with("cost_of_revenue"));
        assert_eq!(out.audit_trail.split(" | ").count(), 5);
        assert_eq!(out.assumptions["opening_inventory"], json!("100"));
    }
}
