use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use super::domain::{AbsenceRequestId, AbsenceSubmission, ApproverRole};
use super::repository::{AbsenceRequestRepository, EscalationLogRepository};
use super::service::{ApprovalError, ApprovalService};
use super::transitions::RoutingError;
use crate::store::RepositoryError;
use crate::workflows::employees::EmployeeRepository;

/// Router builder exposing the approval chain and the escalation engine over HTTP.
pub fn approvals_router<R, L, E>(service: Arc<ApprovalService<R, L, E>>) -> Router
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    Router::new()
        .route("/api/v1/absence-requests", post(submit_handler::<R, L, E>))
        .route(
            "/api/v1/absence-requests/:request_id",
            get(status_handler::<R, L, E>),
        )
        .route(
            "/api/v1/absence-requests/:request_id/approve",
            post(approve_handler::<R, L, E>),
        )
        .route(
            "/api/v1/absence-requests/:request_id/reject",
            post(reject_handler::<R, L, E>),
        )
        .route(
            "/api/v1/absence-requests/:request_id/escalate",
            post(escalate_handler::<R, L, E>),
        )
        .route(
            "/api/v1/absence-requests/:request_id/escalations",
            get(history_handler::<R, L, E>),
        )
        .route("/api/v1/escalations/sweep", post(sweep_handler::<R, L, E>))
        .route(
            "/api/v1/approval-routing/next-stage",
            get(next_stage_handler::<R, L, E>),
        )
        .route(
            "/api/v1/approval-routing/approver",
            get(approver_handler::<R, L, E>),
        )
        .with_state(service)
}

impl ApprovalError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RequestNotFound(_)
            | Self::EmployeeNotFound(_)
            | Self::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::InvalidSubmission(_) | Self::Routing(RoutingError::InvalidToken(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::ApproverMismatch { .. } => StatusCode::FORBIDDEN,
            Self::Routing(_)
            | Self::NotPending { .. }
            | Self::Repository(RepositoryError::Conflict)
            | Self::Repository(RepositoryError::VersionConflict { .. }) => StatusCode::CONFLICT,
            Self::Repository(RepositoryError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn error_response(error: ApprovalError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (error.status_code(), axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActionPayload {
    pub(crate) role: ApproverRole,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SweepParams {
    /// Evaluate staleness as of this instant instead of the wall clock.
    pub(crate) at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoutingParams {
    pub(crate) stage: String,
    pub(crate) employee_class: String,
}

pub(crate) async fn submit_handler<R, L, E>(
    State(service): State<Arc<ApprovalService<R, L, E>>>,
    axum::Json(submission): axum::Json<AbsenceSubmission>,
) -> Response
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    match service.submit(submission, Utc::now()) {
        Ok(request) => (StatusCode::CREATED, axum::Json(request.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, L, E>(
    State(service): State<Arc<ApprovalService<R, L, E>>>,
    Path(request_id): Path<String>,
) -> Response
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    match service.get(&AbsenceRequestId(request_id)) {
        Ok(request) => (StatusCode::OK, axum::Json(request.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<R, L, E>(
    State(service): State<Arc<ApprovalService<R, L, E>>>,
    Path(request_id): Path<String>,
    axum::Json(action): axum::Json<ActionPayload>,
) -> Response
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    match service.approve(&AbsenceRequestId(request_id), action.role, Utc::now()) {
        Ok(request) => (StatusCode::OK, axum::Json(request.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reject_handler<R, L, E>(
    State(service): State<Arc<ApprovalService<R, L, E>>>,
    Path(request_id): Path<String>,
    axum::Json(action): axum::Json<ActionPayload>,
) -> Response
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    match service.reject(&AbsenceRequestId(request_id), action.role, Utc::now()) {
        Ok(request) => (StatusCode::OK, axum::Json(request.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn escalate_handler<R, L, E>(
    State(service): State<Arc<ApprovalService<R, L, E>>>,
    Path(request_id): Path<String>,
) -> Response
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    let id = AbsenceRequestId(request_id);
    match service.engine().escalate_request(&id, Utc::now()) {
        Ok(entry) => (StatusCode::OK, axum::Json(entry)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<R, L, E>(
    State(service): State<Arc<ApprovalService<R, L, E>>>,
    Path(request_id): Path<String>,
) -> Response
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    let id = AbsenceRequestId(request_id);
    match service.engine().escalation_history(&id) {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn sweep_handler<R, L, E>(
    State(service): State<Arc<ApprovalService<R, L, E>>>,
    Query(params): Query<SweepParams>,
) -> Response
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    let now = params.at.unwrap_or_else(Utc::now);
    match service.engine().process_pending_escalations(now) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn next_stage_handler<R, L, E>(
    State(service): State<Arc<ApprovalService<R, L, E>>>,
    Query(params): Query<RoutingParams>,
) -> Response
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    let table = service.engine().policy().table;
    match table.next_stage_for(&params.stage, &params.employee_class) {
        Ok(stage) => {
            let payload = json!({ "next_stage": stage.label() });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn approver_handler<R, L, E>(
    State(service): State<Arc<ApprovalService<R, L, E>>>,
    Query(params): Query<RoutingParams>,
) -> Response
where
    R: AbsenceRequestRepository + 'static,
    L: EscalationLogRepository + 'static,
    E: EmployeeRepository + 'static,
{
    let table = service.engine().policy().table;
    match table.required_approver_for(&params.stage, &params.employee_class) {
        Ok(role) => {
            let payload = json!({ "approver_role": role.label() });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error.into()),
    }
}
