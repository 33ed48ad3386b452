//! ZIP-code deal finder: fetch property records, rank them, estimate the
//! local sales trend and attach generated commentary.

pub mod anthropic;
pub mod attom;
pub mod domain;
pub mod narrative;
pub mod provider;
pub mod report;
pub mod router;
pub mod scoring;
pub mod service;
pub mod trend;

pub use anthropic::AnthropicClient;
pub use attom::AttomClient;
pub use domain::{
    DealReport, DistressCategory, InvalidZipCode, Narrative, PropertyQuery, PropertyRecord,
    RawProperty, SalesTrend, TrendClassification, TrendResult, ZipCode,
};
pub use narrative::{GenerationError, NarrativeGenerator};
pub use provider::{PropertyProvider, ProviderError};
pub use router::deals_router;
pub use service::{DealFinderService, DealOptions, DealServiceError};
