use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use tracing::{error, warn};

use super::domain::{DealReport, DistressCategory};
use super::narrative::NarrativeGenerator;
use super::provider::PropertyProvider;
use super::report::{render_error_page, render_form_page, render_report_page};
use super::service::{DealFinderService, DealOptions};
use crate::error::AppError;

/// Submission from the HTML form.
#[derive(Debug, Deserialize)]
pub struct DealForm {
    pub zip_code: String,
    #[serde(default)]
    pub include_trend: Option<String>,
}

/// JSON request for the API route.
#[derive(Debug, Deserialize)]
pub struct DealRequest {
    pub zip_code: String,
    #[serde(default)]
    pub category: DistressCategory,
    #[serde(default)]
    pub include_trend: bool,
    #[serde(default = "default_true")]
    pub include_summary: bool,
}

fn default_true() -> bool {
    true
}

/// Router builder exposing the web form and the JSON endpoint.
pub fn deals_router<P, N>(service: Arc<DealFinderService<P, N>>) -> Router
where
    P: PropertyProvider + 'static,
    N: NarrativeGenerator + 'static,
{
    Router::new()
        .route("/", get(form_handler).post(form_submit_handler::<P, N>))
        .route("/api/v1/deals", post(deals_api_handler::<P, N>))
        .with_state(service)
}

pub(crate) async fn form_handler() -> Html<String> {
    Html(render_form_page())
}

pub(crate) async fn form_submit_handler<P, N>(
    State(service): State<Arc<DealFinderService<P, N>>>,
    form: Result<Form<DealForm>, FormRejection>,
) -> Response
where
    P: PropertyProvider + 'static,
    N: NarrativeGenerator + 'static,
{
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!(error = %rejection, "rejected form submission");
            return error_page("", AppError::InvalidRequest(rejection.body_text()));
        }
    };

    let options = DealOptions {
        include_trend: form
            .include_trend
            .as_deref()
            .is_some_and(|value| !value.is_empty() && value != "false"),
        ..DealOptions::default()
    };
    let zip_input = form.zip_code.clone();

    match run_blocking(service, form.zip_code, options).await {
        Ok(report) => Html(render_report_page(&report)).into_response(),
        Err(err) => error_page(&zip_input, err),
    }
}

pub(crate) async fn deals_api_handler<P, N>(
    State(service): State<Arc<DealFinderService<P, N>>>,
    request: Result<Json<DealRequest>, JsonRejection>,
) -> Result<Json<DealReport>, AppError>
where
    P: PropertyProvider + 'static,
    N: NarrativeGenerator + 'static,
{
    let Json(request) = request.map_err(|rejection| {
        warn!(error = %rejection, "rejected deals request");
        AppError::InvalidRequest(rejection.body_text())
    })?;

    let options = DealOptions {
        category: request.category,
        include_trend: request.include_trend,
        include_summary: request.include_summary,
    };

    let report = run_blocking(service, request.zip_code, options).await?;
    Ok(Json(report))
}

/// The form page again, with the failure shown inline under its status.
fn error_page(zip_input: &str, err: AppError) -> Response {
    (err.status(), Html(render_error_page(zip_input, &err.to_string()))).into_response()
}

/// The pipeline uses blocking HTTP clients, so it runs off the async workers.
async fn run_blocking<P, N>(
    service: Arc<DealFinderService<P, N>>,
    zip_code: String,
    options: DealOptions,
) -> Result<DealReport, AppError>
where
    P: PropertyProvider + 'static,
    N: NarrativeGenerator + 'static,
{
    let joined =
        tokio::task::spawn_blocking(move || service.find_deals_raw(&zip_code, options)).await;

    match joined {
        Ok(Ok(report)) => Ok(report),
        Ok(Err(err)) => {
            warn!(error = %err, "deal lookup failed");
            Err(AppError::Deals(err))
        }
        Err(join_err) => {
            error!(error = %join_err, "deal lookup task aborted");
            Err(AppError::Task(join_err))
        }
    }
}
