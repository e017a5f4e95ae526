use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A failed fetch. Never raised across the client boundary; carried inside
/// [`ApiResponse::Error`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportError {
    pub message: String,
    pub status_code: Option<u16>,
}

impl TransportError {
    pub fn new(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status_code,
        }
    }
}

/// Outcome of one statement request.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Data(Value),
    Error(TransportError),
}

impl ApiResponse {
    /// Classify a decoded response body. An object carrying a truthy
    /// `"error"` field is an error response even on a 2xx status; `null`,
    /// `false`, `0`, `""` and empty arrays or objects are not truthy.
    pub fn from_body(body: Value) -> Self {
        let flagged = body.get("error").map(is_truthy).unwrap_or(false);

        if !flagged {
            return ApiResponse::Data(body);
        }

        let message = match body.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(other) if !other.is_null() => other.to_string(),
            _ => "unspecified API error".to_string(),
        };
        let status_code = body
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok());
        ApiResponse::Error(TransportError::new(message, status_code))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ApiResponse::Error(_))
    }

    pub fn error(&self) -> Option<&TransportError> {
        match self {
            ApiResponse::Error(e) => Some(e),
            ApiResponse::Data(_) => None,
        }
    }

    /// The document to search. Error responses read as an empty document.
    pub fn payload(&self) -> &Value {
        static EMPTY: Value = Value::Null;
        match self {
            ApiResponse::Data(body) => body,
            ApiResponse::Error(_) => &EMPTY,
        }
    }

    /// Wire form: the body itself, or
    /// `{"error": true, "message": ..., "status_code": ...}`.
    pub fn to_value(&self) -> Value {
        match self {
            ApiResponse::Data(body) => body.clone(),
            ApiResponse::Error(e) => json!({
                "error": true,
                "message": e.message,
                "status_code": e.status_code,
            }),
        }
    }
}

fn is_truthy(flag: &Value) -> bool {
    match flag {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

impl From<Value> for ApiResponse {
    fn from(body: Value) -> Self {
        ApiResponse::from_body(body)
    }
}

impl Serialize for ApiResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Anything that can serve balance sheets and P&L statements.
///
/// Implementations hold read-only configuration only, so one instance can
/// back several independent pipeline runs.
pub trait FinancialDataSource: Send + Sync {
    fn get_balance_sheet(&self, company: &str, year: Option<i32>) -> ApiResponse;

    fn get_pnl(&self, company: &str, year: Option<i32>) -> ApiResponse;
}
