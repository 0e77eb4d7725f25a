//! Pre-payroll ("prenomina") metric calculation.
//!
//! Approved incidences for an employee and period are classified into work and money
//! buckets, defaults are filled from the period calendar, and the resulting metric is
//! stored once per (employee, period) until payroll approves it.

pub mod calculator;
pub mod classifier;
pub mod domain;
pub mod rates;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use calculator::{MetricCalculator, MetricComputation};
pub use classifier::{accumulate, classify, MetricBucket};
pub use domain::{
    CalculationMethod, EffectType, Incidence, IncidenceCategory, IncidenceId, IncidenceStatus,
    MetricOverflow, MetricStatus, MonetaryMetrics, PayrollPeriod, PeriodId, PeriodStatus,
    PrenominaMetric, WorkMetrics,
};
pub use rates::{round_money, PayrollRates, MONEY_CEILING};
pub use repository::{IncidenceRepository, MetricRepository, PeriodRepository};
pub use router::prenomina_router;
pub use service::{
    BulkCalculationReport, BulkItem, BulkOutcome, EmployeeSelector, MetricPage, PrenominaError,
    PrenominaResponse, PrenominaService, MAX_PAGE_SIZE,
};
