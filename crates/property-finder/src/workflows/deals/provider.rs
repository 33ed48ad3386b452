use super::domain::{PropertyQuery, RawProperty, SalesTrend, ZipCode};

/// Source of property records and sales-trend data.
///
/// An empty `Vec` means the provider answered and had no matches; every
/// failure is reported through [`ProviderError`].
pub trait PropertyProvider: Send + Sync {
    fn fetch(&self, query: &PropertyQuery) -> Result<Vec<RawProperty>, ProviderError>;
    fn sales_trend(&self, zip: &ZipCode) -> Result<SalesTrend, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("property data request failed: {message}")]
    Network { message: String, timed_out: bool },
    #[error("property data API error: {status} - {message}")]
    Upstream { status: u16, message: String },
    #[error("unexpected property data response: {0}")]
    DataShape(String),
}

impl ProviderError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Network { .. } => "network",
            ProviderError::Upstream { .. } => "upstream",
            ProviderError::DataShape(_) => "data_shape",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }
}
