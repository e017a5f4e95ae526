//! Three-stage run: fetch → calculate → audit.
//!
//! Each stage consumes the previous [`PipelineState`] and returns the next
//! one, only ever adding to it. Transport failures are written to the log
//! and the run continues on empty data; an unparseable figure aborts it.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ReconError;
use crate::reconcile::{calculate_cogs, CogsReport};
use crate::source::{ApiResponse, FinancialDataSource};
use crate::state::{build_financial_state, FinancialState};
use crate::ReconResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Start,
    Fetched,
    Calculated,
    Reported,
}

/// What a finished run hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub company: String,
    pub year: i32,
    pub report: CogsReport,
    pub logs: Vec<String>,
}

/// Everything one run knows. Owned by exactly one run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineState {
    pub company: String,
    pub year: i32,
    pub stage: PipelineStage,
    pub raw_balance_sheet_current: Option<ApiResponse>,
    pub raw_balance_sheet_prior: Option<ApiResponse>,
    pub raw_pnl: Option<ApiResponse>,
    pub financial_data: Option<FinancialState>,
    pub logs: Vec<String>,
    pub report: Option<CogsReport>,
    pub final_report: Option<FinalReport>,
}

impl PipelineState {
    pub fn new(company: &str, year: i32) -> Self {
        Self {
            company: company.to_string(),
            year,
            stage: PipelineStage::Start,
            raw_balance_sheet_current: None,
            raw_balance_sheet_prior: None,
            raw_pnl: None,
            financial_data: None,
            logs: Vec::new(),
            report: None,
            final_report: None,
        }
    }
}

/// Runs the stages against one data source.
pub struct StatementPipeline<'a> {
    source: &'a dyn FinancialDataSource,
}

impl<'a> StatementPipeline<'a> {
    pub fn new(source: &'a dyn FinancialDataSource) -> Self {
        Self { source }
    }

    /// Pull current and prior balance sheets and the current P&L.
    pub fn fetch(&self, mut state: PipelineState) -> PipelineState {
        let company = state.company.clone();
        let year = state.year;
        info!(company = %company, year, "fetching statements");

        let bs_current = self.source.get_balance_sheet(&company, Some(year));
        log_fetch_error(&mut state.logs, "balancesheet(current)", &bs_current);

        let bs_prior = self.source.get_balance_sheet(&company, Some(year - 1));
        log_fetch_error(&mut state.logs, "balancesheet(prior)", &bs_prior);

        let pnl = self.source.get_pnl(&company, Some(year));
        log_fetch_error(&mut state.logs, "pnl", &pnl);

        state.raw_balance_sheet_current = Some(bs_current);
        state.raw_balance_sheet_prior = Some(bs_prior);
        state.raw_pnl = Some(pnl);
        state.stage = PipelineStage::Fetched;
        state
    }

    /// Build the financial state (fetching anything the fetch stage did not
    /// provide), reconcile it and store the formatted report.
    pub fn calculate(&self, mut state: PipelineState) -> ReconResult<PipelineState> {
        info!(company = %state.company, year = state.year, "calculating");

        let built = build_financial_state(
            self.source,
            &state.company,
            state.year,
            state.raw_balance_sheet_current.as_ref(),
            state.raw_balance_sheet_prior.as_ref(),
            state.raw_pnl.as_ref(),
        )?;

        let calculation = calculate_cogs(&built.state)?;

        state.logs.push(built.audit_trail);
        state.logs.extend(calculation.audit_trail);
        state.financial_data = Some(built.state);
        state.report = Some(calculation.report);
        state.stage = PipelineStage::Calculated;
        Ok(state)
    }

    /// Assemble the final report from a calculated state.
    pub fn audit(&self, mut state: PipelineState) -> ReconResult<PipelineState> {
        let report = state.report.clone().ok_or_else(|| ReconError::InvalidInput {
            field: "stage".into(),
            reason: format!("cannot audit a run in stage {:?}; calculate first", state.stage),
        })?;

        state.final_report = Some(FinalReport {
            company: state.company.clone(),
            year: state.year,
            report,
            logs: state.logs.clone(),
        });
        state.stage = PipelineStage::Reported;
        info!(company = %state.company, year = state.year, "report assembled");
        Ok(state)
    }

    /// Run all three stages for one company and year.
    pub fn run(&self, company: &str, year: i32) -> ReconResult<PipelineState> {
        if company.trim().is_empty() {
            return Err(ReconError::InvalidInput {
                field: "company".into(),
                reason: "Company identifier must not be empty".into(),
            });
        }

        let state = PipelineState::new(company, year);
        let state = self.fetch(state);
        let state = self.calculate(state)?;
        self.audit(state)
    }

    /// [`run`](Self::run), returning only the final report.
    pub fn report(&self, company: &str, year: i32) -> ReconResult<FinalReport> {
        let state = self.run(company, year)?;
        state.final_report.ok_or_else(|| ReconError::InvalidInput {
            field: "stage".into(),
            reason: "pipeline finished without a final report".into(),
        })
    }
}

fn log_fetch_error(logs: &mut Vec<String>, label: &str, response: &ApiResponse) {
    if let Some(err) = response.error() {
        warn!(label, status = ?err.status_code, message = %err.message, "fetch failed");
        logs.push(format!("{label} error: {}", err.message));
    }
}
