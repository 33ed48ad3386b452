use tracing::warn;

use super::domain::{DistressCategory, Narrative, PropertyRecord, RawProperty};
use super::narrative::{property_prompt, NarrativeGenerator};

pub const TOP_PICKS: usize = 3;
const DISTRESS_WEIGHT: f64 = 0.6;
const EQUITY_WEIGHT: f64 = 0.4;
const DISTRESS_STEP: f64 = 2.0;
const EQUITY_BASE: f64 = 20.0;
const EQUITY_STEP: f64 = 2.5;

/// Distress score by position in the provider's result list. Not clamped.
pub fn distress_score(category: DistressCategory, index: usize) -> f64 {
    category.base_score() - DISTRESS_STEP * index as f64
}

/// Placeholder equity estimate by position; providers with real equity data
/// should supply it instead.
pub fn equity_percent(index: usize) -> f64 {
    EQUITY_BASE + EQUITY_STEP * index as f64
}

pub fn ranking_key(distress_score: f64, equity_percent: f64) -> f64 {
    distress_score * DISTRESS_WEIGHT + equity_percent * EQUITY_WEIGHT
}

/// Score every record and keep the best [`TOP_PICKS`], highest key first.
/// Ties keep their input order.
pub fn rank(records: Vec<RawProperty>, category: DistressCategory) -> Vec<PropertyRecord> {
    let mut scored: Vec<PropertyRecord> = records
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let distress_score = distress_score(category, index);
            let equity_percent = equity_percent(index);
            PropertyRecord {
                address: raw.address,
                city: raw.city,
                assessed_value: raw.assessed_value,
                last_sale_amount: raw.last_sale_amount,
                distress_score,
                equity_percent,
                ranking_key: ranking_key(distress_score, equity_percent),
                reasoning: None,
            }
        })
        .collect();

    // `sort_by` is stable, which the tie rule relies on.
    scored.sort_by(|a, b| b.ranking_key.total_cmp(&a.ranking_key));
    scored.truncate(TOP_PICKS);
    scored
}

/// Rank the records and attach generated commentary to each pick.
///
/// A generator failure is recorded on that pick as
/// [`Narrative::Unavailable`] and the remaining picks are still narrated.
pub fn select<N>(
    records: Vec<RawProperty>,
    category: DistressCategory,
    narrator: &N,
) -> Vec<PropertyRecord>
where
    N: NarrativeGenerator + ?Sized,
{
    rank(records, category)
        .into_iter()
        .map(|mut record| {
            let prompt = property_prompt(&record, category);
            let narrative = match narrator.explain(&prompt) {
                Ok(text) => Narrative::Generated(text),
                Err(err) => {
                    warn!(address = %record.address, error = %err, "property narrative unavailable");
                    Narrative::Unavailable(err.to_string())
                }
            };
            record.reasoning = Some(narrative);
            record
        })
        .collect()
}
