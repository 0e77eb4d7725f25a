use serde::Serialize;

use super::domain::{AbsenceRequest, AbsenceRequestId, EscalationLogEntry};
use crate::store::RepositoryError;

/// Storage for absence requests.
///
/// Both the human approval path and the escalation sweep write through
/// [`AbsenceRequestRepository::update_if_version`], so a writer holding a stale copy
/// loses with [`RepositoryError::VersionConflict`] instead of overwriting.
pub trait AbsenceRequestRepository: Send + Sync {
    fn insert(&self, request: AbsenceRequest) -> Result<AbsenceRequest, RepositoryError>;
    fn fetch(&self, id: &AbsenceRequestId) -> Result<Option<AbsenceRequest>, RepositoryError>;
    fn pending(&self) -> Result<Vec<AbsenceRequest>, RepositoryError>;
    /// Stores `request` only if the stored version still equals `expected_version`.
    /// Returns the stored record with its bumped version.
    fn update_if_version(
        &self,
        request: AbsenceRequest,
        expected_version: u64,
    ) -> Result<AbsenceRequest, RepositoryError>;
    /// Same contract as `update_if_version`, and appends `entry` to the escalation log in
    /// the same unit of work. Nothing is written when the version check fails.
    fn record_escalation(
        &self,
        request: AbsenceRequest,
        expected_version: u64,
        entry: EscalationLogEntry,
    ) -> Result<EscalationLogEntry, RepositoryError>;
}

/// Read side of the append-only escalation audit trail.
pub trait EscalationLogRepository: Send + Sync {
    /// Entries for one request, oldest first.
    fn history(
        &self,
        request_id: &AbsenceRequestId,
    ) -> Result<Vec<EscalationLogEntry>, RepositoryError>;
}

/// Sanitized representation of a request's approval position.
#[derive(Debug, Clone, Serialize)]
pub struct AbsenceRequestView {
    pub request_id: AbsenceRequestId,
    pub status: &'static str,
    pub stage: &'static str,
    pub total_days: u32,
    pub escalation_count: u32,
    pub is_escalated: bool,
}

impl AbsenceRequest {
    pub fn view(&self) -> AbsenceRequestView {
        AbsenceRequestView {
            request_id: self.id.clone(),
            status: self.status.label(),
            stage: self.current_approval_stage.label(),
            total_days: self.total_days,
            escalation_count: self.escalation_count,
            is_escalated: self.is_escalated,
        }
    }
}
