use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::domain::{
    AbsenceRequest, AbsenceRequestId, ApprovalStage, ApproverRole, EscalationLogEntry,
    EscalationTrigger, RequestStatus,
};
use super::repository::{AbsenceRequestRepository, EscalationLogRepository};
use super::service::ApprovalError;
use super::transitions::{RoutingError, TransitionTable};
use crate::store::RepositoryError;
use crate::workflows::employees::{EmployeeClass, EmployeeRepository};

/// Tunables for the escalation sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    /// Minimum idle time since the last action before a request escalates.
    pub threshold: Duration,
    pub table: TransitionTable,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            threshold: Duration::hours(24),
            table: TransitionTable::standard(),
        }
    }
}

/// Outcome of one sweep over the pending requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub scanned: usize,
    /// Pending requests still inside the threshold.
    pub fresh: usize,
    pub escalated: Vec<EscalatedRequest>,
    pub skipped: Vec<SkippedRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscalatedRequest {
    pub request_id: AbsenceRequestId,
    pub from_stage: ApprovalStage,
    pub to_stage: ApprovalStage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRequest {
    pub request_id: AbsenceRequestId,
    pub stage: ApprovalStage,
    pub reason: String,
}

/// Moves stale pending requests one stage forward and keeps the audit trail.
pub struct EscalationEngine<R, L, E> {
    requests: Arc<R>,
    log: Arc<L>,
    employees: Arc<E>,
    policy: EscalationPolicy,
}

impl<R, L, E> EscalationEngine<R, L, E>
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    pub fn new(requests: Arc<R>, log: Arc<L>, employees: Arc<E>, policy: EscalationPolicy) -> Self {
        Self {
            requests,
            log,
            employees,
            policy,
        }
    }

    pub fn policy(&self) -> &EscalationPolicy {
        &self.policy
    }

    pub fn determine_next_stage(
        &self,
        stage: ApprovalStage,
        class: EmployeeClass,
    ) -> Result<ApprovalStage, RoutingError> {
        self.policy.table.next_stage(stage, class)
    }

    pub fn required_approver_role(
        &self,
        stage: ApprovalStage,
        class: EmployeeClass,
    ) -> Result<ApproverRole, RoutingError> {
        self.policy.table.required_approver(stage, class)
    }

    /// Runs one sweep at `now`.
    ///
    /// Individual requests that cannot move are reported as skipped. Only a storage
    /// fault aborts the pass.
    pub fn process_pending_escalations(
        &self,
        now: DateTime<Utc>,
    ) -> Result<SweepReport, RepositoryError> {
        let pending = self.requests.pending()?;
        let mut report = SweepReport::default();
        debug!(pending = pending.len(), %now, "escalation sweep started");

        for request in pending {
            report.scanned += 1;
            if now.signed_duration_since(request.last_action_at) < self.policy.threshold {
                report.fresh += 1;
                continue;
            }

            let stage = request.current_approval_stage;
            match self.escalate(&request, EscalationTrigger::Automatic, now) {
                Ok(entry) => {
                    info!(
                        request_id = %entry.request_id,
                        from = %entry.from_stage,
                        to = %entry.to_stage,
                        "absence request escalated"
                    );
                    report.escalated.push(EscalatedRequest {
                        request_id: entry.request_id,
                        from_stage: entry.from_stage,
                        to_stage: entry.to_stage,
                    });
                }
                Err(ApprovalError::Repository(RepositoryError::VersionConflict { .. })) => {
                    debug!(request_id = %request.id, "request changed during sweep");
                    report.skipped.push(SkippedRequest {
                        request_id: request.id,
                        stage,
                        reason: "request changed since it was read".to_string(),
                    });
                }
                Err(ApprovalError::Repository(err)) => return Err(err),
                Err(err) => {
                    warn!(request_id = %request.id, %stage, error = %err, "escalation skipped");
                    report.skipped.push(SkippedRequest {
                        request_id: request.id,
                        stage,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            scanned = report.scanned,
            escalated = report.escalated.len(),
            skipped = report.skipped.len(),
            "escalation sweep finished"
        );
        Ok(report)
    }

    /// Escalates a single request on demand, ignoring the idle threshold.
    pub fn escalate_request(
        &self,
        request_id: &AbsenceRequestId,
        now: DateTime<Utc>,
    ) -> Result<EscalationLogEntry, ApprovalError> {
        let request = self
            .requests
            .fetch(request_id)?
            .ok_or_else(|| ApprovalError::RequestNotFound(request_id.clone()))?;
        let entry = self.escalate(&request, EscalationTrigger::Manual, now)?;
        info!(
            request_id = %entry.request_id,
            from = %entry.from_stage,
            to = %entry.to_stage,
            "absence request escalated manually"
        );
        Ok(entry)
    }

    /// Audit trail for one request, oldest first. Empty when it never escalated.
    pub fn escalation_history(
        &self,
        request_id: &AbsenceRequestId,
    ) -> Result<Vec<EscalationLogEntry>, ApprovalError> {
        if self.requests.fetch(request_id)?.is_none() {
            return Err(ApprovalError::RequestNotFound(request_id.clone()));
        }
        Ok(self.log.history(request_id)?)
    }

    fn escalate(
        &self,
        request: &AbsenceRequest,
        trigger: EscalationTrigger,
        now: DateTime<Utc>,
    ) -> Result<EscalationLogEntry, ApprovalError> {
        match request.status {
            RequestStatus::Pending => {}
            RequestStatus::Rejected => return Err(RoutingError::RejectedRequest.into()),
            status => {
                return Err(ApprovalError::NotPending {
                    id: request.id.clone(),
                    status,
                })
            }
        }

        let from = request.current_approval_stage;
        // Payroll signs off in person; the sweep never completes a request.
        if from == ApprovalStage::Payroll {
            return Err(RoutingError::TerminalStage(from).into());
        }

        let employee = self
            .employees
            .fetch(&request.employee_id)?
            .ok_or_else(|| ApprovalError::EmployeeNotFound(request.employee_id.clone()))?;
        let to = self.determine_next_stage(from, employee.class)?;

        let mut updated = request.clone();
        updated.current_approval_stage = to;
        updated.last_action_at = now;
        updated.escalation_count = updated.escalation_count.saturating_add(1);
        updated.is_escalated = true;

        let entry = EscalationLogEntry {
            sequence: 0,
            request_id: request.id.clone(),
            from_stage: from,
            to_stage: to,
            trigger,
            previous_action_at: request.last_action_at,
            escalated_at: now,
        };
        Ok(self
            .requests
            .record_escalation(updated, request.version, entry)?)
    }
}
