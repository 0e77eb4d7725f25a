//! Payroll back-office core.
//!
//! Two coupled workflows live here: the absence-request approval chain with its
//! time-driven escalation sweep, and the pre-payroll ("prenomina") metric
//! calculator that turns approved incidences into per-period work and pay
//! figures.

pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod workflows;
