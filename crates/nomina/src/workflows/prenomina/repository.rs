use super::domain::{Incidence, PayrollPeriod, PeriodId, PrenominaMetric};
use crate::store::RepositoryError;
use crate::workflows::employees::EmployeeId;

pub trait PeriodRepository: Send + Sync {
    fn fetch(&self, id: &PeriodId) -> Result<Option<PayrollPeriod>, RepositoryError>;
}

pub trait IncidenceRepository: Send + Sync {
    /// Every incidence recorded for the pair, regardless of status.
    fn for_employee(
        &self,
        employee_id: &EmployeeId,
        period_id: &PeriodId,
    ) -> Result<Vec<Incidence>, RepositoryError>;
}

/// Storage for computed metrics, one row per (employee, period).
pub trait MetricRepository: Send + Sync {
    fn fetch(
        &self,
        employee_id: &EmployeeId,
        period_id: &PeriodId,
    ) -> Result<Option<PrenominaMetric>, RepositoryError>;
    /// `expected_revision` of `None` inserts and fails with [`RepositoryError::Conflict`]
    /// if the pair already has a row. `Some(revision)` replaces the row only while its
    /// revision is unchanged. The returned metric carries the bumped revision.
    fn save(
        &self,
        metric: PrenominaMetric,
        expected_revision: Option<u64>,
    ) -> Result<PrenominaMetric, RepositoryError>;
    /// One page of a period's metrics ordered by employee id, plus the period total.
    fn list_for_period(
        &self,
        period_id: &PeriodId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<PrenominaMetric>, usize), RepositoryError>;
}
