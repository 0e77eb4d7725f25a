use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::PeriodId;
use super::repository::{IncidenceRepository, MetricRepository, PeriodRepository};
use super::service::{EmployeeSelector, PrenominaError, PrenominaService};
use crate::store::RepositoryError;
use crate::workflows::employees::{EmployeeId, EmployeeRepository};

/// Router builder exposing the metric calculator over HTTP.
pub fn prenomina_router<E, P, I, M>(service: Arc<PrenominaService<E, P, I, M>>) -> Router
where
    E: EmployeeRepository + 'static,
    P: PeriodRepository + 'static,
    I: IncidenceRepository + 'static,
    M: MetricRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/prenomina/calculate",
            post(calculate_handler::<E, P, I, M>),
        )
        .route("/api/v1/prenomina/bulk", post(bulk_handler::<E, P, I, M>))
        .route(
            "/api/v1/prenomina/periods/:period_id/metrics",
            get(list_handler::<E, P, I, M>),
        )
        .route(
            "/api/v1/prenomina/periods/:period_id/employees/:employee_id",
            get(metric_handler::<E, P, I, M>),
        )
        .route(
            "/api/v1/prenomina/periods/:period_id/employees/:employee_id/approve",
            post(approve_handler::<E, P, I, M>),
        )
        .with_state(service)
}

impl PrenominaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EmployeeNotFound(_)
            | Self::PeriodNotFound(_)
            | Self::MetricNotFound { .. }
            | Self::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::PeriodNotCalculable { .. }
            | Self::MetricAlreadyApproved { .. }
            | Self::Repository(RepositoryError::Conflict)
            | Self::Repository(RepositoryError::VersionConflict { .. }) => StatusCode::CONFLICT,
            Self::InvalidPage(_) | Self::Arithmetic(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Repository(RepositoryError::Unavailable(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn error_response(error: PrenominaError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (error.status_code(), axum::Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct CalculatePayload {
    pub(crate) employee_id: EmployeeId,
    pub(crate) period_id: PeriodId,
    #[serde(default)]
    pub(crate) recalculate_integrated_salary: bool,
    pub(crate) actor_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkPayload {
    pub(crate) period_id: PeriodId,
    /// Omitted means every active employee.
    #[serde(default)]
    pub(crate) employee_ids: Option<Vec<EmployeeId>>,
    pub(crate) actor_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApprovePayload {
    pub(crate) actor_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageParams {
    #[serde(default = "default_page")]
    pub(crate) page: usize,
    #[serde(default = "default_page_size")]
    pub(crate) page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

pub(crate) async fn calculate_handler<E, P, I, M>(
    State(service): State<Arc<PrenominaService<E, P, I, M>>>,
    axum::Json(payload): axum::Json<CalculatePayload>,
) -> Response
where
    E: EmployeeRepository + 'static,
    P: PeriodRepository + 'static,
    I: IncidenceRepository + 'static,
    M: MetricRepository + 'static,
{
    match service.calculate(
        &payload.employee_id,
        &payload.period_id,
        payload.recalculate_integrated_salary,
        &payload.actor_id,
        Utc::now(),
    ) {
        Ok(response) => {
            let status = if response.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, axum::Json(response)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn bulk_handler<E, P, I, M>(
    State(service): State<Arc<PrenominaService<E, P, I, M>>>,
    axum::Json(payload): axum::Json<BulkPayload>,
) -> Response
where
    E: EmployeeRepository + 'static,
    P: PeriodRepository + 'static,
    I: IncidenceRepository + 'static,
    M: MetricRepository + 'static,
{
    let selector = match payload.employee_ids {
        Some(ids) => EmployeeSelector::Explicit(ids),
        None => EmployeeSelector::AllActive,
    };
    match service.bulk_calculate(&payload.period_id, &selector, &payload.actor_id, Utc::now()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<E, P, I, M>(
    State(service): State<Arc<PrenominaService<E, P, I, M>>>,
    Path(period_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Response
where
    E: EmployeeRepository + 'static,
    P: PeriodRepository + 'static,
    I: IncidenceRepository + 'static,
    M: MetricRepository + 'static,
{
    match service.list(&PeriodId(period_id), params.page, params.page_size) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn metric_handler<E, P, I, M>(
    State(service): State<Arc<PrenominaService<E, P, I, M>>>,
    Path((period_id, employee_id)): Path<(String, String)>,
) -> Response
where
    E: EmployeeRepository + 'static,
    P: PeriodRepository + 'static,
    I: IncidenceRepository + 'static,
    M: MetricRepository + 'static,
{
    match service.metrics(&EmployeeId(employee_id), &PeriodId(period_id)) {
        Ok(metric) => (StatusCode::OK, axum::Json(metric)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_handler<E, P, I, M>(
    State(service): State<Arc<PrenominaService<E, P, I, M>>>,
    Path((period_id, employee_id)): Path<(String, String)>,
    axum::Json(payload): axum::Json<ApprovePayload>,
) -> Response
where
    E: EmployeeRepository + 'static,
    P: PeriodRepository + 'static,
    I: IncidenceRepository + 'static,
    M: MetricRepository + 'static,
{
    match service.approve(
        &EmployeeId(employee_id),
        &PeriodId(period_id),
        &payload.actor_id,
        Utc::now(),
    ) {
        Ok(metric) => (StatusCode::OK, axum::Json(metric)).into_response(),
        Err(error) => error_response(error),
    }
}
