use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::deals::report::CsvExportError;
use crate::workflows::deals::{DealServiceError, ProviderError};
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
    /// Request body the HTTP routes could not decode.
    InvalidRequest(String),
    HttpClient(reqwest::Error),
    Deals(DealServiceError),
    Render(CsvExportError),
    Task(tokio::task::JoinError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::InvalidRequest(reason) => write!(f, "invalid request: {}", reason),
            AppError::HttpClient(err) => write!(f, "http client error: {}", err),
            AppError::Deals(err) => write!(f, "{}", err),
            AppError::Render(err) => write!(f, "render error: {}", err),
            AppError::Task(err) => write!(f, "background task failed: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::InvalidRequest(_) => None,
            AppError::Io(err) => Some(err),
            AppError::HttpClient(err) => Some(err),
            AppError::Deals(err) => Some(err),
            AppError::Render(err) => Some(err),
            AppError::Task(err) => Some(err),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_)
            | AppError::Deals(DealServiceError::InvalidZip(_))
            | AppError::Deals(DealServiceError::InvalidAddress) => StatusCode::BAD_REQUEST,
            AppError::Deals(DealServiceError::Provider(ProviderError::Network {
                timed_out: true,
                ..
            })) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Deals(DealServiceError::Provider(_)) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::HttpClient(_)
            | AppError::Render(_)
            | AppError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable tag carried in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::InvalidRequest(_) => "invalid_request",
            AppError::Deals(DealServiceError::InvalidZip(_)) => "invalid_zip",
            AppError::Deals(DealServiceError::InvalidAddress) => "invalid_address",
            AppError::Deals(DealServiceError::Provider(provider)) => provider.kind(),
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::HttpClient(_)
            | AppError::Render(_)
            | AppError::Task(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string(), "kind": self.kind() }));
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

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::HttpClient(value)
    }
}

impl From<DealServiceError> for AppError {
    fn from(value: DealServiceError) -> Self {
        Self::Deals(value)
    }
}

impl From<CsvExportError> for AppError {
    fn from(value: CsvExportError) -> Self {
        Self::Render(value)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Task(value)
    }
}
