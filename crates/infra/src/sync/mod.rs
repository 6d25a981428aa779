//! Reconciliation pass driver.

pub mod worker;

pub use worker::ReconcileWorker;
