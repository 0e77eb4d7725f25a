use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;

use super::RepositoryError;
use crate::workflows::approvals::{
    AbsenceRequest, AbsenceRequestId, AbsenceRequestRepository, EscalationLogEntry,
    EscalationLogRepository,
};
use crate::workflows::employees::{Employee, EmployeeId, EmployeeRepository};
use crate::workflows::prenomina::{
    Incidence, IncidenceRepository, MetricRepository, PayrollPeriod, PeriodId, PeriodRepository,
    PrenominaMetric,
};

/// Process-local store backing every repository trait.
///
/// Clones share the same state. All reads and writes go through one mutex, so a
/// version check and the write it guards happen under the same lock.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    state: Arc<Mutex<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    employees: BTreeMap<EmployeeId, Employee>,
    periods: BTreeMap<PeriodId, PayrollPeriod>,
    incidences: Vec<Incidence>,
    metrics: BTreeMap<(PeriodId, EmployeeId), PrenominaMetric>,
    requests: BTreeMap<AbsenceRequestId, AbsenceRequest>,
    escalations: Vec<EscalationLogEntry>,
    next_log_sequence: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }

    pub fn insert_employee(&self, employee: Employee) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.employees.contains_key(&employee.id) {
            return Err(RepositoryError::Conflict);
        }
        state.employees.insert(employee.id.clone(), employee);
        Ok(())
    }

    pub fn insert_period(&self, period: PayrollPeriod) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.periods.contains_key(&period.id) {
            return Err(RepositoryError::Conflict);
        }
        state.periods.insert(period.id.clone(), period);
        Ok(())
    }

    pub fn insert_incidence(&self, incidence: Incidence) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        if state.incidences.iter().any(|item| item.id == incidence.id) {
            return Err(RepositoryError::Conflict);
        }
        state.incidences.push(incidence);
        Ok(())
    }

    /// Loads a batch of incidences, returning how many were stored. A duplicate id,
    /// against the store or within the batch, rejects the whole batch.
    pub fn extend_incidences(
        &self,
        incidences: impl IntoIterator<Item = Incidence>,
    ) -> Result<usize, RepositoryError> {
        let batch: Vec<Incidence> = incidences.into_iter().collect();
        let mut state = self.lock()?;
        for (index, incidence) in batch.iter().enumerate() {
            let stored = state.incidences.iter().any(|item| item.id == incidence.id);
            let repeated = batch[..index].iter().any(|item| item.id == incidence.id);
            if stored || repeated {
                return Err(RepositoryError::Conflict);
            }
        }
        let count = batch.len();
        state.incidences.extend(batch);
        Ok(count)
    }
}

impl EmployeeRepository for InMemoryStore {
    fn fetch(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        Ok(self.lock()?.employees.get(id).cloned())
    }

    fn active(&self) -> Result<Vec<Employee>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .employees
            .values()
            .filter(|employee| employee.active)
            .cloned()
            .collect())
    }

    fn update_integrated_salary(
        &self,
        id: &EmployeeId,
        integrated_daily_salary: Decimal,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        let employee = state
            .employees
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        employee.integrated_daily_salary = integrated_daily_salary;
        Ok(())
    }
}

impl PeriodRepository for InMemoryStore {
    fn fetch(&self, id: &PeriodId) -> Result<Option<PayrollPeriod>, RepositoryError> {
        Ok(self.lock()?.periods.get(id).cloned())
    }
}

impl IncidenceRepository for InMemoryStore {
    fn for_employee(
        &self,
        employee_id: &EmployeeId,
        period_id: &PeriodId,
    ) -> Result<Vec<Incidence>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .incidences
            .iter()
            .filter(|item| &item.employee_id == employee_id && &item.period_id == period_id)
            .cloned()
            .collect())
    }
}

impl MetricRepository for InMemoryStore {
    fn fetch(
        &self,
        employee_id: &EmployeeId,
        period_id: &PeriodId,
    ) -> Result<Option<PrenominaMetric>, RepositoryError> {
        let key = (period_id.clone(), employee_id.clone());
        Ok(self.lock()?.metrics.get(&key).cloned())
    }

    fn save(
        &self,
        mut metric: PrenominaMetric,
        expected_revision: Option<u64>,
    ) -> Result<PrenominaMetric, RepositoryError> {
        let mut state = self.lock()?;
        let key = (metric.period_id.clone(), metric.employee_id.clone());
        let current = state.metrics.get(&key).map(|stored| stored.revision);

        metric.revision = match (current, expected_revision) {
            (None, None) => 1,
            (Some(_), None) => return Err(RepositoryError::Conflict),
            (None, Some(_)) => return Err(RepositoryError::NotFound),
            (Some(found), Some(expected)) if found != expected => {
                return Err(RepositoryError::VersionConflict { expected, found })
            }
            (Some(found), Some(_)) => found + 1,
        };

        state.metrics.insert(key, metric.clone());
        Ok(metric)
    }

    fn list_for_period(
        &self,
        period_id: &PeriodId,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<PrenominaMetric>, usize), RepositoryError> {
        let state = self.lock()?;
        let matching: Vec<&PrenominaMetric> = state
            .metrics
            .iter()
            .filter(|((period, _), _)| period == period_id)
            .map(|(_, metric)| metric)
            .collect();
        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }
}

impl StoreState {
    fn swap_request(
        &mut self,
        mut request: AbsenceRequest,
        expected_version: u64,
    ) -> Result<AbsenceRequest, RepositoryError> {
        let found = self
            .requests
            .get(&request.id)
            .map(|stored| stored.version)
            .ok_or(RepositoryError::NotFound)?;
        if found != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found,
            });
        }
        request.version = found + 1;
        self.requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }
}

impl AbsenceRequestRepository for InMemoryStore {
    fn insert(&self, mut request: AbsenceRequest) -> Result<AbsenceRequest, RepositoryError> {
        let mut state = self.lock()?;
        if state.requests.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        request.version = 1;
        state.requests.insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn fetch(&self, id: &AbsenceRequestId) -> Result<Option<AbsenceRequest>, RepositoryError> {
        Ok(self.lock()?.requests.get(id).cloned())
    }

    fn pending(&self) -> Result<Vec<AbsenceRequest>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .requests
            .values()
            .filter(|request| request.is_pending())
            .cloned()
            .collect())
    }

    fn update_if_version(
        &self,
        request: AbsenceRequest,
        expected_version: u64,
    ) -> Result<AbsenceRequest, RepositoryError> {
        self.lock()?.swap_request(request, expected_version)
    }

    fn record_escalation(
        &self,
        request: AbsenceRequest,
        expected_version: u64,
        mut entry: EscalationLogEntry,
    ) -> Result<EscalationLogEntry, RepositoryError> {
        let mut state = self.lock()?;
        state.swap_request(request, expected_version)?;
        state.next_log_sequence += 1;
        entry.sequence = state.next_log_sequence;
        state.escalations.push(entry.clone());
        Ok(entry)
    }
}

impl EscalationLogRepository for InMemoryStore {
    fn history(
        &self,
        request_id: &AbsenceRequestId,
    ) -> Result<Vec<EscalationLogEntry>, RepositoryError> {
        let state = self.lock()?;
        let mut entries: Vec<EscalationLogEntry> = state
            .escalations
            .iter()
            .filter(|entry| &entry.request_id == request_id)
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.escalated_at, entry.sequence));
        Ok(entries)
    }
}
