pub mod reconcile;
pub mod report;
