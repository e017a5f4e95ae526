//! Blocking HTTP client for the company statements API.
//!
//! Every request resolves to an [`ApiResponse`]; network failures, non-2xx
//! statuses and undecodable bodies come back as [`ApiResponse::Error`]
//! rather than as a Rust error, so the pipeline can log them and carry on.

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ReconError;
use crate::source::{ApiResponse, FinancialDataSource, TransportError};
use crate::ReconResult;

const API_KEY_HEADER: &str = "x-api-key";
const YEAR_PARAM: &str = "calendarYear";

/// HTTP client for the statements API.
#[derive(Debug, Clone)]
pub struct AcApiClient {
    config: ClientConfig,
    client: Client,
}

impl AcApiClient {
    pub fn new(config: ClientConfig) -> ReconResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ReconError::Configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn balance_sheet_url(&self, company: &str) -> String {
        format!("{}/server/company/balancesheet/{}", self.config.base_url, company)
    }

    pub fn pnl_url(&self, company: &str) -> String {
        format!("{}/server/company/pnl/{}", self.config.base_url, company)
    }

    /// Probe the service's `/health` endpoint.
    pub fn health(&self) -> ApiResponse {
        self.get(&format!("{}/health", self.config.base_url), None)
    }

    fn get(&self, url: &str, year: Option<i32>) -> ApiResponse {
        let mut request = self.client.get(url);
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        if let Some(year) = year {
            request = request.query(&[(YEAR_PARAM, year)]);
        }

        debug!(url, ?year, "GET");

        let response = request.send().and_then(|r| r.error_for_status());
        let body = response.and_then(|r| r.json::<Value>());

        match body {
            Ok(body) => ApiResponse::from_body(body),
            Err(e) => {
                let status = e.status().map(|s| s.as_u16());
                warn!(url, ?status, error = %e, "statement request failed");
                ApiResponse::Error(TransportError::new(e.to_string(), status))
            }
        }
    }
}

impl FinancialDataSource for AcApiClient {
    fn get_balance_sheet(&self, company: &str, year: Option<i32>) -> ApiResponse {
        self.get(&self.balance_sheet_url(company), year)
    }

    fn get_pnl(&self, company: &str, year: Option<i32>) -> ApiResponse {
        self.get(&self.pnl_url(company), year)
    }
}
