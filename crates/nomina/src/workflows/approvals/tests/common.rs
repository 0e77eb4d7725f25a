use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::Value;

use crate::store::{InMemoryStore, RepositoryError};
use crate::workflows::approvals::{
    AbsenceRequest, AbsenceRequestId, AbsenceRequestRepository, AbsenceSubmission, AbsenceType,
    ApprovalService, ApprovalStage, EscalationLogEntry, EscalationLogRepository,
    EscalationPolicy, RequestStatus,
};
use crate::workflows::employees::{Employee, EmployeeClass, EmployeeId};

pub(super) const WHITE: &str = "emp-white";
pub(super) const BLUE: &str = "emp-blue";
pub(super) const GRAY: &str = "emp-gray";

pub(super) type MemoryService = ApprovalService<InMemoryStore, InMemoryStore, InMemoryStore>;

/// Monday 2025-03-03 09:00 UTC shifted by `hours`.
pub(super) fn at(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap() + Duration::hours(hours)
}

pub(super) fn employee(id: &str, class: EmployeeClass) -> Employee {
    Employee {
        id: EmployeeId::new(id),
        name: format!("Employee {id}"),
        class,
        daily_salary: dec!(600.00),
        integrated_daily_salary: dec!(600.00),
        active: true,
    }
}

pub(super) fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .insert_employee(employee(WHITE, EmployeeClass::WhiteCollar))
        .unwrap();
    store
        .insert_employee(employee(BLUE, EmployeeClass::BlueCollar))
        .unwrap();
    store
        .insert_employee(employee(GRAY, EmployeeClass::GrayCollar))
        .unwrap();
    store
}

pub(super) fn build_service(policy: EscalationPolicy) -> (MemoryService, InMemoryStore) {
    let store = seeded_store();
    let shared = Arc::new(store.clone());
    let service = ApprovalService::new(shared.clone(), shared.clone(), shared, policy);
    (service, store)
}

pub(super) fn submission(employee_id: &str) -> AbsenceSubmission {
    AbsenceSubmission {
        employee_id: EmployeeId::new(employee_id),
        request_type: AbsenceType::Vacation,
        start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        reason: "family trip".to_string(),
    }
}

/// Stores a pending request directly, bypassing intake.
pub(super) fn pending_request(
    store: &InMemoryStore,
    id: &str,
    employee_id: &str,
    stage: ApprovalStage,
    last_action_at: DateTime<Utc>,
) -> AbsenceRequest {
    store
        .insert(AbsenceRequest {
            id: AbsenceRequestId(id.to_string()),
            employee_id: EmployeeId::new(employee_id),
            request_type: AbsenceType::Personal,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap(),
            total_days: 1,
            reason: String::new(),
            status: RequestStatus::Pending,
            current_approval_stage: stage,
            escalation_count: 0,
            is_escalated: false,
            last_action_at,
            created_at: last_action_at,
            version: 0,
        })
        .unwrap()
}

/// Request store where someone else always writes first, so every
/// escalation write loses the version race.
#[derive(Default, Clone)]
pub(super) struct RacingStore {
    pub(super) inner: InMemoryStore,
}

impl AbsenceRequestRepository for RacingStore {
    fn insert(&self, request: AbsenceRequest) -> Result<AbsenceRequest, RepositoryError> {
        self.inner.insert(request)
    }

    fn fetch(&self, id: &AbsenceRequestId) -> Result<Option<AbsenceRequest>, RepositoryError> {
        AbsenceRequestRepository::fetch(&self.inner, id)
    }

    fn pending(&self) -> Result<Vec<AbsenceRequest>, RepositoryError> {
        self.inner.pending()
    }

    fn update_if_version(
        &self,
        request: AbsenceRequest,
        expected_version: u64,
    ) -> Result<AbsenceRequest, RepositoryError> {
        self.inner.update_if_version(request, expected_version)
    }

    fn record_escalation(
        &self,
        request: AbsenceRequest,
        expected_version: u64,
        entry: EscalationLogEntry,
    ) -> Result<EscalationLogEntry, RepositoryError> {
        let mut current = AbsenceRequestRepository::fetch(&self.inner, &request.id)?
            .ok_or(RepositoryError::NotFound)?;
        current.last_action_at = entry.escalated_at;
        let version = current.version;
        self.inner.update_if_version(current, version)?;
        self.inner
            .record_escalation(request, expected_version, entry)
    }
}

impl EscalationLogRepository for RacingStore {
    fn history(
        &self,
        request_id: &AbsenceRequestId,
    ) -> Result<Vec<EscalationLogEntry>, RepositoryError> {
        self.inner.history(request_id)
    }
}

pub(super) struct UnavailableStore;

impl AbsenceRequestRepository for UnavailableStore {
    fn insert(&self, _request: AbsenceRequest) -> Result<AbsenceRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &AbsenceRequestId) -> Result<Option<AbsenceRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn pending(&self) -> Result<Vec<AbsenceRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_if_version(
        &self,
        _request: AbsenceRequest,
        _expected_version: u64,
    ) -> Result<AbsenceRequest, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn record_escalation(
        &self,
        _request: AbsenceRequest,
        _expected_version: u64,
        _entry: EscalationLogEntry,
    ) -> Result<EscalationLogEntry, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl EscalationLogRepository for UnavailableStore {
    fn history(
        &self,
        _request_id: &AbsenceRequestId,
    ) -> Result<Vec<EscalationLogEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
