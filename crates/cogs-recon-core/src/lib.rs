pub mod config;
pub mod error;
pub mod extract;
pub mod numeric;
pub mod pipeline;
pub mod reconcile;
pub mod source;
pub mod state;
pub mod types;

#[cfg(feature = "http")]
pub mod client;

pub use error::ReconError;
pub use types::*;

/// Standard result type for all reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;
