use std::fmt::Write as _;

use super::domain::{DistressCategory, PropertyRecord, TrendClassification};

/// Hosted text-completion capability. Each call is independent; no
/// conversation state is kept between prompts.
pub trait NarrativeGenerator: Send + Sync {
    fn explain(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("narrative request failed: {0}")]
    Network(String),
    #[error("narrative API error: {status} - {message}")]
    Upstream { status: u16, message: String },
    #[error("unexpected narrative response: {0}")]
    DataShape(String),
    #[error("narrative response was empty")]
    Empty,
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Network(err.to_string())
    }
}

pub(crate) fn property_prompt(record: &PropertyRecord, category: DistressCategory) -> String {
    let mut prompt = String::new();
    writeln!(
        prompt,
        "You're a real estate investor reviewing a property flagged by a {} screen.",
        category.label().to_ascii_lowercase()
    )
    .expect("write intro");
    writeln!(prompt, "Address: {}", record.address).expect("write address");
    if let Some(city) = &record.city {
        writeln!(prompt, "City: {city}").expect("write city");
    }
    let assessed = record
        .assessed_value
        .map(|value| format!("${value:.0}"))
        .unwrap_or_else(|| "unknown".to_string());
    writeln!(prompt, "Assessed value: {assessed}").expect("write assessed value");
    writeln!(prompt, "Last sale amount: ${:.0}", record.last_sale_amount).expect("write sale");
    writeln!(prompt, "Distress score: {:.0}/100", record.distress_score).expect("write score");
    writeln!(prompt, "Estimated equity: {:.1}%", record.equity_percent).expect("write equity");
    prompt.push_str(
        "In two or three sentences, explain why this property might be worth investigating \
         further and what risk an investor should check first.",
    );
    prompt
}

pub(crate) fn trend_prompt(
    zip: &str,
    trend_percent: f64,
    average_sale_price: f64,
    classification: TrendClassification,
    fallback_used: bool,
) -> String {
    let mut prompt = String::new();
    writeln!(prompt, "You're a real estate analyst looking at ZIP code {zip}.").expect("intro");
    writeln!(prompt, "Sales price trend: {trend_percent:.2}%").expect("trend");
    writeln!(prompt, "Average sale price: ${average_sale_price:.0}").expect("average");
    writeln!(
        prompt,
        "A simple linear model classifies the area as likely to {}.",
        classification.label().to_ascii_lowercase()
    )
    .expect("classification");
    if fallback_used {
        prompt.push_str("These figures are placeholder estimates, not observed sales data.\n");
    }
    prompt.push_str("Briefly explain what this means for an investor buying in the area.");
    prompt
}

/// Overall comparison of the selected picks.
pub(crate) fn summary_prompt(query: &str, picks: &[PropertyRecord]) -> String {
    let mut prompt = String::new();
    writeln!(
        prompt,
        "You're a real estate investor analyzing properties in {query}."
    )
    .expect("intro");
    prompt.push_str("Here are the top candidates with their basic information:\n");
    for (index, pick) in picks.iter().enumerate() {
        let assessed = pick
            .assessed_value
            .map(|value| format!("${value:.0}"))
            .unwrap_or_else(|| "N/A".to_string());
        writeln!(
            prompt,
            "{}. {}{} | assessed {} | distress score {:.0} | equity {:.1}%",
            index + 1,
            pick.address,
            pick.city
                .as_deref()
                .map(|city| format!(", {city}"))
                .unwrap_or_default(),
            assessed,
            pick.distress_score,
            pick.equity_percent
        )
        .expect("candidate line");
    }
    prompt.push_str(
        "Rank these as the top deals based on location value and potential, current \
         assessed value, and comparative market analysis. Give a brief analysis of each \
         and why it might be worth investigating further.",
    );
    prompt
}
