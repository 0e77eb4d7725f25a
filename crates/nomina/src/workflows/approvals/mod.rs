//! Absence-request approval chain and its escalation engine.
//!
//! Requests walk supervisor, manager, HR, general manager (white collar only by
//! default) and payroll. A desk that sits on a request past the policy threshold
//! loses it to the next desk on the following sweep, with an audit row per move.

pub mod domain;
pub mod escalation;
pub mod repository;
pub mod router;
pub mod service;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use domain::{
    AbsenceRequest, AbsenceRequestId, AbsenceSubmission, AbsenceType, ApprovalStage,
    ApproverRole, EscalationLogEntry, EscalationTrigger, RequestStatus,
};
pub use escalation::{
    EscalatedRequest, EscalationEngine, EscalationPolicy, SkippedRequest, SweepReport,
};
pub use repository::{AbsenceRequestRepository, AbsenceRequestView, EscalationLogRepository};
pub use router::approvals_router;
pub use service::{ApprovalError, ApprovalService};
pub use transitions::{RoutingError, TransitionTable};
