use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::calculator::MetricCalculator;
use super::domain::{
    MetricOverflow, MetricStatus, PayrollPeriod, PeriodId, PeriodStatus, PrenominaMetric,
};
use super::rates::PayrollRates;
use super::repository::{IncidenceRepository, MetricRepository, PeriodRepository};
use crate::store::RepositoryError;
use crate::workflows::employees::{EmployeeId, EmployeeRepository};

pub const MAX_PAGE_SIZE: usize = 100;

/// Result of calculating one employee's metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrenominaResponse {
    pub metric: PrenominaMetric,
    pub employee_name: String,
    pub integrated_daily_salary: Decimal,
    pub incidences_counted: usize,
    pub incidences_ignored: usize,
    /// `false` when an existing metric was recalculated.
    pub created: bool,
}

/// Which employees a bulk run covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeSelector {
    AllActive,
    Explicit(Vec<EmployeeId>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BulkOutcome {
    Success {
        gross_income: Decimal,
        net_income: Decimal,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkItem {
    pub employee_id: EmployeeId,
    #[serde(flatten)]
    pub outcome: BulkOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkCalculationReport {
    pub period_id: PeriodId,
    pub results: Vec<BulkItem>,
    /// Explicitly requested ids with no employee record.
    pub skipped: Vec<EmployeeId>,
    pub succeeded: usize,
    pub failed: usize,
    pub total_gross: Decimal,
    pub total_net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricPage {
    pub period_id: PeriodId,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub items: Vec<PrenominaMetric>,
}

/// Service composing the calculator with the employee, period, incidence and metric stores.
pub struct PrenominaService<E, P, I, M> {
    employees: Arc<E>,
    periods: Arc<P>,
    incidences: Arc<I>,
    metrics: Arc<M>,
    calculator: MetricCalculator,
}

impl<E, P, I, M> PrenominaService<E, P, I, M>
where
    E: EmployeeRepository + 'static,
    P: PeriodRepository + 'static,
    I: IncidenceRepository + 'static,
    M: MetricRepository + 'static,
{
    pub fn new(
        employees: Arc<E>,
        periods: Arc<P>,
        incidences: Arc<I>,
        metrics: Arc<M>,
        rates: PayrollRates,
    ) -> Self {
        Self {
            employees,
            periods,
            incidences,
            metrics,
            calculator: MetricCalculator::new(rates),
        }
    }

    pub fn calculator(&self) -> &MetricCalculator {
        &self.calculator
    }

    /// Calculate (or recalculate) the metric for one employee in one period.
    ///
    /// Figures are rebuilt from scratch on every call, so repeating a call with the
    /// same incidences and `now` yields the same metric.
    pub fn calculate(
        &self,
        employee_id: &EmployeeId,
        period_id: &PeriodId,
        recalculate_integrated_salary: bool,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<PrenominaResponse, PrenominaError> {
        let mut employee = self
            .employees
            .fetch(employee_id)?
            .ok_or_else(|| PrenominaError::EmployeeNotFound(employee_id.clone()))?;
        let period = self.calculable_period(period_id)?;

        let existing = self.metrics.fetch(employee_id, period_id)?;
        if existing.as_ref().is_some_and(PrenominaMetric::is_approved) {
            return Err(PrenominaError::MetricAlreadyApproved {
                employee_id: employee_id.clone(),
                period_id: period_id.clone(),
            });
        }

        let integrated = if recalculate_integrated_salary {
            Some(
                self.calculator
                    .rates()
                    .integrated_daily_salary(employee.daily_salary)?,
            )
        } else {
            None
        };

        let incidences = self.incidences.for_employee(employee_id, period_id)?;
        let computation = self.calculator.compute(&employee, &period, &incidences)?;

        let expected_revision = existing.as_ref().map(|metric| metric.revision);
        let metric = PrenominaMetric {
            employee_id: employee.id.clone(),
            period_id: period.id.clone(),
            period_code: period.code.clone(),
            work: computation.work,
            pay: computation.pay,
            calculation_status: MetricStatus::Calculated,
            calculated_at: now,
            calculated_by: actor.to_string(),
            approved_by: None,
            approved_at: None,
            revision: expected_revision.unwrap_or_default(),
        };
        let saved = self.metrics.save(metric, expected_revision)?;

        // The employee record only changes once the metric is stored.
        if let Some(integrated) = integrated {
            self.employees
                .update_integrated_salary(&employee.id, integrated)?;
            employee.integrated_daily_salary = integrated;
        }

        debug!(
            employee_id = %saved.employee_id,
            period_id = %saved.period_id,
            gross = %saved.pay.gross_income,
            net = %saved.pay.net_income,
            counted = computation.counted,
            "prenomina calculated"
        );

        Ok(PrenominaResponse {
            metric: saved,
            employee_name: employee.name,
            integrated_daily_salary: employee.integrated_daily_salary,
            incidences_counted: computation.counted,
            incidences_ignored: computation.ignored,
            created: expected_revision.is_none(),
        })
    }

    /// Calculate a period for many employees. Per-employee failures are recorded in the
    /// report; only an unknown or closed period, or failing to list employees, fails
    /// the whole call.
    pub fn bulk_calculate(
        &self,
        period_id: &PeriodId,
        selector: &EmployeeSelector,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<BulkCalculationReport, PrenominaError> {
        self.calculable_period(period_id)?;

        let mut skipped = Vec::new();
        let targets: Vec<EmployeeId> = match selector {
            EmployeeSelector::AllActive => self
                .employees
                .active()?
                .into_iter()
                .map(|employee| employee.id)
                .collect(),
            EmployeeSelector::Explicit(ids) => {
                let mut found = Vec::with_capacity(ids.len());
                for id in ids {
                    if self.employees.fetch(id)?.is_some() {
                        found.push(id.clone());
                    } else {
                        skipped.push(id.clone());
                    }
                }
                found
            }
        };

        let mut report = BulkCalculationReport {
            period_id: period_id.clone(),
            results: Vec::with_capacity(targets.len()),
            skipped,
            succeeded: 0,
            failed: 0,
            total_gross: Decimal::ZERO,
            total_net: Decimal::ZERO,
        };

        for employee_id in targets {
            let outcome = match self.calculate(&employee_id, period_id, false, actor, now) {
                Ok(response) => {
                    let pay = &response.metric.pay;
                    report.succeeded += 1;
                    // Per-metric figures stay under MONEY_CEILING.
                    report.total_gross = report.total_gross.saturating_add(pay.gross_income);
                    report.total_net = report.total_net.saturating_add(pay.net_income);
                    BulkOutcome::Success {
                        gross_income: pay.gross_income,
                        net_income: pay.net_income,
                    }
                }
                Err(error) => {
                    warn!(%employee_id, %period_id, %error, "bulk prenomina item failed");
                    report.failed += 1;
                    BulkOutcome::Failed {
                        error: error.to_string(),
                    }
                }
            };
            report.results.push(BulkItem {
                employee_id,
                outcome,
            });
        }

        info!(
            %period_id,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped.len(),
            total_net = %report.total_net,
            "bulk prenomina finished"
        );
        Ok(report)
    }

    /// Freeze a calculated metric so later recalculations are refused.
    pub fn approve(
        &self,
        employee_id: &EmployeeId,
        period_id: &PeriodId,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<PrenominaMetric, PrenominaError> {
        let mut metric = self.metrics(employee_id, period_id)?;
        if metric.is_approved() {
            return Err(PrenominaError::MetricAlreadyApproved {
                employee_id: employee_id.clone(),
                period_id: period_id.clone(),
            });
        }

        let revision = metric.revision;
        metric.calculation_status = MetricStatus::Approved;
        metric.approved_by = Some(actor.to_string());
        metric.approved_at = Some(now);
        let saved = self.metrics.save(metric, Some(revision))?;
        info!(%employee_id, %period_id, actor, "prenomina approved");
        Ok(saved)
    }

    pub fn metrics(
        &self,
        employee_id: &EmployeeId,
        period_id: &PeriodId,
    ) -> Result<PrenominaMetric, PrenominaError> {
        self.metrics
            .fetch(employee_id, period_id)?
            .ok_or_else(|| PrenominaError::MetricNotFound {
                employee_id: employee_id.clone(),
                period_id: period_id.clone(),
            })
    }

    /// One page of a period's metrics, 1-based, ordered by employee id.
    pub fn list(
        &self,
        period_id: &PeriodId,
        page: usize,
        page_size: usize,
    ) -> Result<MetricPage, PrenominaError> {
        if page == 0 {
            return Err(PrenominaError::InvalidPage("page starts at 1".to_string()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(PrenominaError::InvalidPage(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let offset = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| PrenominaError::InvalidPage(format!("page {page} is out of range")))?;

        if self.periods.fetch(period_id)?.is_none() {
            return Err(PrenominaError::PeriodNotFound(period_id.clone()));
        }
        let (items, total) = self.metrics.list_for_period(period_id, offset, page_size)?;
        Ok(MetricPage {
            period_id: period_id.clone(),
            page,
            page_size,
            total,
            items,
        })
    }

    fn calculable_period(&self, period_id: &PeriodId) -> Result<PayrollPeriod, PrenominaError> {
        let period = self
            .periods
            .fetch(period_id)?
            .ok_or_else(|| PrenominaError::PeriodNotFound(period_id.clone()))?;
        if !period.status.accepts_calculation() {
            return Err(PrenominaError::PeriodNotCalculable {
                period_id: period.id,
                status: period.status,
            });
        }
        Ok(period)
    }
}

/// Error raised by the prenomina workflow.
#[derive(Debug, thiserror::Error)]
pub enum PrenominaError {
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("payroll period {0} not found")]
    PeriodNotFound(PeriodId),
    #[error("no prenomina metric for employee {employee_id} in period {period_id}")]
    MetricNotFound {
        employee_id: EmployeeId,
        period_id: PeriodId,
    },
    #[error("payroll period {period_id} is {status} and cannot be calculated")]
    PeriodNotCalculable {
        period_id: PeriodId,
        status: PeriodStatus,
    },
    #[error("prenomina for employee {employee_id} in period {period_id} is already approved")]
    MetricAlreadyApproved {
        employee_id: EmployeeId,
        period_id: PeriodId,
    },
    #[error("invalid page request: {0}")]
    InvalidPage(String),
    #[error("prenomina figures out of range: {0}")]
    Arithmetic(#[from] MetricOverflow),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
