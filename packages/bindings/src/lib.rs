use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;
use serde_json::Value;

use cogs_recon_core::state::{FinancialState, RawStatements};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Pre-fetched statements plus the labels used in the audit trail.
#[derive(Deserialize)]
struct ReconcileRequest {
    #[serde(default = "default_company")]
    company: String,
    #[serde(default = "default_year")]
    year: i32,
    #[serde(flatten)]
    statements: RawStatements,
}

fn default_company() -> String {
    "AAPL".to_string()
}

fn default_year() -> i32 {
    2023
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

#[napi]
pub fn reconcile_statements(input_json: String) -> NapiResult<String> {
    let request: ReconcileRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = cogs_recon_core::reconcile::reconcile_statements(
        &request.company,
        request.year,
        &request.statements,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_cogs(input_json: String) -> NapiResult<String> {
    let state: FinancialState = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        cogs_recon_core::reconcile::reconcile_financial_state(&state).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

#[napi]
pub fn find_value(document_json: String, key: String) -> NapiResult<String> {
    let document: Value = serde_json::from_str(&document_json).map_err(to_napi_error)?;
    let found = cogs_recon_core::extract::find_value(&document, &key);
    serde_json::to_string(&found).map_err(to_napi_error)
}

#[napi]
pub fn normalize_numeric(value_json: String) -> NapiResult<String> {
    let value: Value = serde_json::from_str(&value_json).map_err(to_napi_error)?;
    let normalized = cogs_recon_core::numeric::normalize_numeric(&value);
    serde_json::to_string(&normalized).map_err(to_napi_error)
}
