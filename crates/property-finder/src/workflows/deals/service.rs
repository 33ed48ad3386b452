use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::info;

use super::domain::{
    DealReport, DistressCategory, InvalidZipCode, Narrative, PropertyQuery, ZipCode,
};
use super::narrative::{summary_prompt, NarrativeGenerator};
use super::provider::{PropertyProvider, ProviderError};
use super::scoring;
use super::trend;

/// Per-run switches for the deal pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DealOptions {
    pub category: DistressCategory,
    pub include_trend: bool,
    pub include_summary: bool,
}

impl Default for DealOptions {
    fn default() -> Self {
        Self {
            category: DistressCategory::Propensity,
            include_trend: false,
            include_summary: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DealServiceError {
    #[error(transparent)]
    InvalidZip(#[from] InvalidZipCode),
    #[error("address lookups need both a street line and a city/state line")]
    InvalidAddress,
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Service composing the data provider, the selector, the trend predictor and
/// the narrative generator.
pub struct DealFinderService<P, N> {
    provider: Arc<P>,
    narrator: Arc<N>,
}

impl<P, N> DealFinderService<P, N>
where
    P: PropertyProvider + 'static,
    N: NarrativeGenerator + 'static,
{
    pub fn new(provider: Arc<P>, narrator: Arc<N>) -> Self {
        Self { provider, narrator }
    }

    /// Parse a user-entered ZIP code and run the pipeline for it.
    pub fn find_deals_raw(
        &self,
        raw_zip: &str,
        options: DealOptions,
    ) -> Result<DealReport, DealServiceError> {
        let zip = ZipCode::parse(raw_zip)?;
        self.find_deals(&zip, options)
    }

    /// Top picks (and optionally the sales trend) for one ZIP code.
    pub fn find_deals(
        &self,
        zip: &ZipCode,
        options: DealOptions,
    ) -> Result<DealReport, DealServiceError> {
        let query = PropertyQuery::PostalCode(zip.clone());
        let mut report = self.run(&query, options)?;

        if options.include_trend {
            report.trend = Some(trend::predict(
                zip,
                self.provider.as_ref(),
                self.narrator.as_ref(),
            ));
        }

        Ok(report)
    }

    /// Same pipeline for a single street address; never includes a trend.
    pub fn lookup_address(
        &self,
        address1: &str,
        address2: &str,
        options: DealOptions,
    ) -> Result<DealReport, DealServiceError> {
        let (address1, address2) = (address1.trim(), address2.trim());
        if address1.is_empty() || address2.is_empty() {
            return Err(DealServiceError::InvalidAddress);
        }

        let query = PropertyQuery::Address {
            address1: address1.to_string(),
            address2: address2.to_string(),
        };
        self.run(&query, options)
    }

    fn run(
        &self,
        query: &PropertyQuery,
        options: DealOptions,
    ) -> Result<DealReport, DealServiceError> {
        let started = Instant::now();
        let records = self.provider.fetch(query)?;
        let candidates_considered = records.len();
        info!(%query, candidates = candidates_considered, "property data fetched");

        let picks = scoring::select(records, options.category, self.narrator.as_ref());

        let summary = if options.include_summary && !picks.is_empty() {
            let prompt = summary_prompt(&query.to_string(), &picks);
            Some(match self.narrator.explain(&prompt) {
                Ok(text) => Narrative::Generated(text),
                Err(err) => Narrative::Unavailable(err.to_string()),
            })
        } else {
            None
        };

        info!(
            %query,
            picks = picks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "deal selection complete"
        );

        Ok(DealReport {
            query: query.to_string(),
            category: options.category,
            generated_at: Utc::now(),
            candidates_considered,
            picks,
            trend: None,
            summary,
        })
    }
}
