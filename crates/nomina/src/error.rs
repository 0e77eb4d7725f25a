use crate::config::ConfigError;
use crate::store::RepositoryError;
use crate::telemetry::TelemetryError;
use crate::workflows::approvals::ApprovalError;
use crate::workflows::imports::IncidenceImportError;
use crate::workflows::prenomina::PrenominaError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Import(IncidenceImportError),
    Approval(ApprovalError),
    Prenomina(PrenominaError),
    Repository(RepositoryError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Approval(err) => write!(f, "approval error: {}", err),
            AppError::Prenomina(err) => write!(f, "prenomina error: {}", err),
            AppError::Repository(err) => write!(f, "storage error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Approval(err) => Some(err),
            AppError::Prenomina(err) => Some(err),
            AppError::Repository(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Import(_) => StatusCode::BAD_REQUEST,
            AppError::Approval(err) => err.status_code(),
            AppError::Prenomina(err) => err.status_code(),
            AppError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Repository(RepositoryError::Conflict)
            | AppError::Repository(RepositoryError::VersionConflict { .. }) => {
                StatusCode::CONFLICT
            }
            AppError::Repository(RepositoryError::Unavailable(_))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<IncidenceImportError> for AppError {
    fn from(value: IncidenceImportError) -> Self {
        Self::Import(value)
    }
}

impl From<ApprovalError> for AppError {
    fn from(value: ApprovalError) -> Self {
        Self::Approval(value)
    }
}

impl From<PrenominaError> for AppError {
    fn from(value: PrenominaError) -> Self {
        Self::Prenomina(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Repository(value)
    }
}
