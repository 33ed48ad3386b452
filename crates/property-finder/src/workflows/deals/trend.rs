use tracing::{info, warn};

use super::domain::{Narrative, SalesTrend, TrendClassification, TrendResult, ZipCode};
use super::narrative::{trend_prompt, NarrativeGenerator};
use super::provider::PropertyProvider;

pub const FALLBACK_TREND: f64 = 0.5;
pub const FALLBACK_AVERAGE_PRICE: f64 = 450_000.0;
const TREND_WEIGHT: f64 = 0.7;
const PRICE_WEIGHT: f64 = 0.0001;

/// Linear trend score.
///
/// The price term dominates for any realistic average price, so the sign test
/// in [`classify`] almost always reports `Appreciate`.
pub fn trend_score(trend: f64, average_price: f64) -> f64 {
    trend * TREND_WEIGHT + average_price * PRICE_WEIGHT
}

pub fn classify(score: f64) -> TrendClassification {
    if score > 0.0 {
        TrendClassification::Appreciate
    } else {
        TrendClassification::Depreciate
    }
}

/// Sales trend figures for a ZIP, falling back to fixed placeholder figures
/// when the provider has nothing usable.
pub fn predict<P, N>(zip: &ZipCode, provider: &P, narrator: &N) -> TrendResult
where
    P: PropertyProvider + ?Sized,
    N: NarrativeGenerator + ?Sized,
{
    let (trend, fallback_cause) = match provider.sales_trend(zip) {
        Ok(trend) if trend.trend_percent.is_finite() && trend.average_sale_price.is_finite() => {
            (trend, None)
        }
        Ok(_) => (fallback_trend(), Some("provider returned non-finite figures".to_string())),
        Err(err) => {
            warn!(%zip, error = %err, "sales trend unavailable, using fallback figures");
            (fallback_trend(), Some(err.to_string()))
        }
    };

    let score = trend_score(trend.trend_percent, trend.average_sale_price);
    let classification = classify(score);
    let fallback_used = fallback_cause.is_some();

    let prompt = trend_prompt(
        zip.as_str(),
        trend.trend_percent,
        trend.average_sale_price,
        classification,
        fallback_used,
    );
    let reasoning = match narrator.explain(&prompt) {
        Ok(text) => Narrative::Generated(text),
        Err(err) => {
            warn!(%zip, error = %err, "trend narrative unavailable");
            Narrative::Unavailable(err.to_string())
        }
    };

    info!(%zip, score, ?classification, fallback_used, "trend predicted");

    TrendResult {
        zip_code: zip.clone(),
        trend_percent: trend.trend_percent,
        average_sale_price: trend.average_sale_price,
        score,
        classification,
        fallback_used,
        fallback_cause,
        reasoning,
    }
}

fn fallback_trend() -> SalesTrend {
    SalesTrend {
        trend_percent: FALLBACK_TREND,
        average_sale_price: FALLBACK_AVERAGE_PRICE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::deals::domain::{PropertyQuery, RawProperty};
    use crate::workflows::deals::narrative::GenerationError;
    use crate::workflows::deals::provider::ProviderError;

    struct TrendOnly(Result<SalesTrend, ProviderError>);

    impl PropertyProvider for TrendOnly {
        fn fetch(&self, _query: &PropertyQuery) -> Result<Vec<RawProperty>, ProviderError> {
            Ok(Vec::new())
        }

        fn sales_trend(&self, _zip: &ZipCode) -> Result<SalesTrend, ProviderError> {
            self.0.clone()
        }
    }

    struct Fixed(Result<String, GenerationError>);

    impl NarrativeGenerator for Fixed {
        fn explain(&self, _prompt: &str) -> Result<String, GenerationError> {
            self.0.clone()
        }
    }

    fn zip() -> ZipCode {
        ZipCode::parse("78701").expect("valid zip")
    }

    #[test]
    fn fallback_figures_score_as_appreciating() {
        let score = trend_score(0.5, 450_000.0);
        assert!((score - 45.35).abs() < 1e-9);
        assert_eq!(classify(score), TrendClassification::Appreciate);
    }

    #[test]
    fn non_positive_score_is_depreciate() {
        assert_eq!(classify(0.0), TrendClassification::Depreciate);
        assert_eq!(classify(trend_score(-10.0, 0.0)), TrendClassification::Depreciate);
    }

    #[test]
    fn provider_figures_are_used_when_available() {
        let provider = TrendOnly(Ok(SalesTrend {
            trend_percent: -3.0,
            average_sale_price: 10_000.0,
        }));
        let result = predict(&zip(), &provider, &Fixed(Ok("cooling market".to_string())));
        assert!(!result.fallback_used);
        assert_eq!(result.trend_percent, -3.0);
        assert!((result.score - (-2.1 + 1.0)).abs() < 1e-9);
        assert_eq!(result.classification, TrendClassification::Depreciate);
        assert_eq!(result.fallback_cause, None);
        assert_eq!(result.reasoning, Narrative::Generated("cooling market".to_string()));
        assert_eq!(result.annotated_reasoning(), "cooling market");
    }

    #[test]
    fn malformed_trend_data_uses_annotated_fallback() {
        let provider = TrendOnly(Err(ProviderError::DataShape("no salestrends".to_string())));
        let result = predict(&zip(), &provider, &Fixed(Ok("steady growth".to_string())));
        assert!(result.fallback_used);
        assert_eq!(result.trend_percent, 0.5);
        assert_eq!(result.average_sale_price, 450_000.0);
        assert_eq!(result.classification, TrendClassification::Appreciate);
        assert_eq!(
            result.fallback_cause.as_deref(),
            Some("unexpected property data response: no salestrends")
        );
        assert_eq!(result.reasoning, Narrative::Generated("steady growth".to_string()));
        assert_eq!(
            result.annotated_reasoning(),
            "[fallback used: unexpected property data response: no salestrends] steady growth"
        );
    }

    #[test]
    fn narrative_failure_keeps_fallback_annotation() {
        let provider = TrendOnly(Err(ProviderError::Upstream {
            status: 500,
            message: "boom".to_string(),
        }));
        let result = predict(&zip(), &provider, &Fixed(Err(GenerationError::Empty)));
        assert_eq!(
            result.reasoning,
            Narrative::Unavailable("narrative response was empty".to_string())
        );
        let shown = result.annotated_reasoning();
        assert!(shown.starts_with("[fallback used: "));
        assert!(shown.ends_with("[analysis unavailable: narrative response was empty]"));

        let json = serde_json::to_value(&result).expect("serialize trend");
        assert_eq!(json["reasoning"]["status"], "unavailable");
        assert_eq!(json["fallback_cause"], "property data API error: 500 - boom");
    }
}
