use crate::cli::ServeArgs;
use crate::infra::{build_deal_service, AppState};
use crate::routes::with_deal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use property_finder::config::AppConfig;
use property_finder::error::AppError;
use property_finder::telemetry::{self, LogSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let AppConfig {
        environment,
        mut server,
        telemetry: telemetry_config,
        attom,
        narrative,
        http,
    } = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        server.host = host;
    }
    if let Some(port) = args.port.take() {
        server.port = port;
    }

    telemetry::init(&telemetry_config, LogSink::Stdout)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let deal_service = tokio::task::spawn_blocking(move || {
        build_deal_service(attom, narrative, http)
    })
    .await??;

    let app = with_deal_routes(Arc::new(deal_service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?environment, %addr, timeout_secs = http.timeout.as_secs(), "property finder ready");

    axum::serve(listener, app).await?;
    Ok(())
}
