use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::domain::{
    AbsenceRequest, AbsenceRequestId, AbsenceSubmission, ApprovalStage, ApproverRole,
    RequestStatus,
};
use super::escalation::{EscalationEngine, EscalationPolicy};
use super::repository::{AbsenceRequestRepository, EscalationLogRepository};
use super::transitions::RoutingError;
use crate::store::RepositoryError;
use crate::workflows::employees::{EmployeeClass, EmployeeId, EmployeeRepository};

/// Human side of the approval chain: intake plus approve/reject by the desk that owns
/// the current stage. Shares its storage and routing with the escalation engine.
pub struct ApprovalService<R, L, E> {
    requests: Arc<R>,
    employees: Arc<E>,
    engine: Arc<EscalationEngine<R, L, E>>,
}

static REQUEST_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> AbsenceRequestId {
    let id = REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    AbsenceRequestId(format!("abs-{id:06}"))
}

impl<R, L, E> ApprovalService<R, L, E>
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    pub fn new(requests: Arc<R>, log: Arc<L>, employees: Arc<E>, policy: EscalationPolicy) -> Self {
        let engine = Arc::new(EscalationEngine::new(
            requests.clone(),
            log,
            employees.clone(),
            policy,
        ));
        Self {
            requests,
            employees,
            engine,
        }
    }

    pub fn engine(&self) -> &EscalationEngine<R, L, E> {
        &self.engine
    }

    /// Shared handle for the background sweep.
    pub fn engine_handle(&self) -> Arc<EscalationEngine<R, L, E>> {
        self.engine.clone()
    }

    /// File a new request at the supervisor desk.
    pub fn submit(
        &self,
        submission: AbsenceSubmission,
        now: DateTime<Utc>,
    ) -> Result<AbsenceRequest, ApprovalError> {
        if submission.end_date < submission.start_date {
            return Err(ApprovalError::InvalidSubmission(format!(
                "end date {} precedes start date {}",
                submission.end_date, submission.start_date
            )));
        }
        let span = (submission.end_date - submission.start_date).num_days() + 1;
        let total_days = u32::try_from(span).map_err(|_| {
            ApprovalError::InvalidSubmission(format!("absence of {span} days is out of range"))
        })?;

        if self.employees.fetch(&submission.employee_id)?.is_none() {
            return Err(ApprovalError::EmployeeNotFound(submission.employee_id));
        }

        let request = AbsenceRequest {
            id: next_request_id(),
            employee_id: submission.employee_id,
            request_type: submission.request_type,
            start_date: submission.start_date,
            end_date: submission.end_date,
            total_days,
            reason: submission.reason,
            status: RequestStatus::Pending,
            current_approval_stage: ApprovalStage::Supervisor,
            escalation_count: 0,
            is_escalated: false,
            last_action_at: now,
            created_at: now,
            version: 0,
        };

        let stored = self.requests.insert(request)?;
        info!(request_id = %stored.id, employee_id = %stored.employee_id, "absence request submitted");
        Ok(stored)
    }

    pub fn get(&self, request_id: &AbsenceRequestId) -> Result<AbsenceRequest, ApprovalError> {
        self.requests
            .fetch(request_id)?
            .ok_or_else(|| ApprovalError::RequestNotFound(request_id.clone()))
    }

    /// Sign off the current stage. Reaching `Completed` approves the request.
    pub fn approve(
        &self,
        request_id: &AbsenceRequestId,
        role: ApproverRole,
        now: DateTime<Utc>,
    ) -> Result<AbsenceRequest, ApprovalError> {
        let (request, class) = self.authorize(request_id, role)?;
        let next = self
            .engine
            .determine_next_stage(request.current_approval_stage, class)?;

        let mut updated = request.clone();
        updated.current_approval_stage = next;
        updated.last_action_at = now;
        if next == ApprovalStage::Completed {
            updated.status = RequestStatus::Approved;
        }

        let stored = self.requests.update_if_version(updated, request.version)?;
        info!(
            request_id = %stored.id,
            %role,
            stage = %stored.current_approval_stage,
            "absence request approved at stage"
        );
        Ok(stored)
    }

    pub fn reject(
        &self,
        request_id: &AbsenceRequestId,
        role: ApproverRole,
        now: DateTime<Utc>,
    ) -> Result<AbsenceRequest, ApprovalError> {
        let (request, _) = self.authorize(request_id, role)?;

        let mut updated = request.clone();
        updated.status = RequestStatus::Rejected;
        updated.current_approval_stage = ApprovalStage::Rejected;
        updated.last_action_at = now;

        let stored = self.requests.update_if_version(updated, request.version)?;
        info!(request_id = %stored.id, %role, "absence request rejected");
        Ok(stored)
    }

    fn authorize(
        &self,
        request_id: &AbsenceRequestId,
        role: ApproverRole,
    ) -> Result<(AbsenceRequest, EmployeeClass), ApprovalError> {
        let request = self.get(request_id)?;
        if !request.is_pending() {
            return Err(ApprovalError::NotPending {
                id: request.id,
                status: request.status,
            });
        }

        let employee = self
            .employees
            .fetch(&request.employee_id)?
            .ok_or_else(|| ApprovalError::EmployeeNotFound(request.employee_id.clone()))?;
        let stage = request.current_approval_stage;
        let required = self.engine.required_approver_role(stage, employee.class)?;
        if required != role {
            return Err(ApprovalError::ApproverMismatch {
                stage,
                required,
                provided: role,
            });
        }
        Ok((request, employee.class))
    }
}

/// Error raised by the approval workflow.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error("invalid absence request: {0}")]
    InvalidSubmission(String),
    #[error("absence request {0} not found")]
    RequestNotFound(AbsenceRequestId),
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("absence request {id} is {status}, only pending requests can move")]
    NotPending {
        id: AbsenceRequestId,
        status: RequestStatus,
    },
    #[error("stage {stage} must be actioned by {required}, not {provided}")]
    ApproverMismatch {
        stage: ApprovalStage,
        required: ApproverRole,
        provided: ApproverRole,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
