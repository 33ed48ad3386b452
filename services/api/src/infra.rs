use metrics_exporter_prometheus::PrometheusHandle;
use property_finder::config::{AttomConfig, HttpConfig, NarrativeConfig};
use property_finder::error::AppError;
use property_finder::workflows::deals::{AnthropicClient, AttomClient, DealFinderService};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type LiveDealService = DealFinderService<AttomClient, AnthropicClient>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Wire the ATTOM and Anthropic clients into the deal service.
///
/// Builds blocking HTTP clients, so call it from a blocking context.
pub(crate) fn build_deal_service(
    attom: AttomConfig,
    narrative: NarrativeConfig,
    http: HttpConfig,
) -> Result<LiveDealService, AppError> {
    let provider = AttomClient::new(attom, http)?;
    let narrator = AnthropicClient::new(narrative, http)?;
    Ok(DealFinderService::new(Arc::new(provider), Arc::new(narrator)))
}
