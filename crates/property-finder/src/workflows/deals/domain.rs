use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Five-digit US postal code used as the geographic query key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZipCode(String);

impl ZipCode {
    pub fn parse(raw: &str) -> Result<Self, InvalidZipCode> {
        let trimmed = raw.trim();
        // ZIP+4 input is reduced to its five-digit prefix.
        let five = match trimmed.split_once('-') {
            Some((head, tail)) if tail.len() == 4 && tail.chars().all(|c| c.is_ascii_digit()) => {
                head
            }
            Some(_) => return Err(InvalidZipCode(raw.to_string())),
            None => trimmed,
        };

        if five.len() == 5 && five.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(five.to_string()))
        } else {
            Err(InvalidZipCode(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ZipCode {
    type Err = InvalidZipCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ZipCode {
    type Error = InvalidZipCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ZipCode> for String {
    fn from(value: ZipCode) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid 5-digit ZIP code")]
pub struct InvalidZipCode(pub String);

/// What the data provider is asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyQuery {
    PostalCode(ZipCode),
    /// Street line plus a "city, state" line.
    Address { address1: String, address2: String },
}

impl fmt::Display for PropertyQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyQuery::PostalCode(zip) => write!(f, "ZIP {zip}"),
            PropertyQuery::Address { address1, address2 } => {
                write!(f, "{address1}, {address2}")
            }
        }
    }
}

/// Property as returned by the data provider, before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProperty {
    pub address: String,
    pub city: Option<String>,
    pub assessed_value: Option<f64>,
    /// Zero when the provider has no sale on record.
    pub last_sale_amount: f64,
    pub last_sale_date: Option<NaiveDate>,
}

/// Heuristic family the distress score is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistressCategory {
    #[default]
    Propensity,
    PreForeclosure,
}

impl DistressCategory {
    pub fn base_score(self) -> f64 {
        match self {
            DistressCategory::Propensity => 90.0,
            DistressCategory::PreForeclosure => 85.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DistressCategory::Propensity => "Propensity to default",
            DistressCategory::PreForeclosure => "Pre-foreclosure",
        }
    }
}

impl FromStr for DistressCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "propensity" => Ok(Self::Propensity),
            "pre-foreclosure" | "preforeclosure" => Ok(Self::PreForeclosure),
            other => Err(format!(
                "unknown category '{other}' (expected 'propensity' or 'pre-foreclosure')"
            )),
        }
    }
}

/// Commentary attached to a property or trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum Narrative {
    Generated(String),
    /// The generator failed; carries the error message.
    Unavailable(String),
}

impl Narrative {
    pub fn text(&self) -> Option<&str> {
        match self {
            Narrative::Generated(text) => Some(text),
            Narrative::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Narrative::Generated(_))
    }
}

impl fmt::Display for Narrative {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Narrative::Generated(text) => f.write_str(text),
            Narrative::Unavailable(reason) => write!(f, "[analysis unavailable: {reason}]"),
        }
    }
}

/// Scored property ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub address: String,
    pub city: Option<String>,
    pub assessed_value: Option<f64>,
    pub last_sale_amount: f64,
    pub distress_score: f64,
    pub equity_percent: f64,
    pub ranking_key: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Narrative>,
}

/// Trend figures supplied by the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalesTrend {
    pub trend_percent: f64,
    pub average_sale_price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClassification {
    Appreciate,
    Depreciate,
}

impl TrendClassification {
    pub fn label(self) -> &'static str {
        match self {
            TrendClassification::Appreciate => "Appreciate",
            TrendClassification::Depreciate => "Depreciate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub zip_code: ZipCode,
    pub trend_percent: f64,
    pub average_sale_price: f64,
    pub score: f64,
    pub classification: TrendClassification,
    pub fallback_used: bool,
    /// Why the fixed fallback figures replaced the provider's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_cause: Option<String>,
    pub reasoning: Narrative,
}

impl TrendResult {
    /// Commentary as shown in reports, with the fallback annotation in front.
    pub fn annotated_reasoning(&self) -> String {
        match &self.fallback_cause {
            Some(cause) => format!("[fallback used: {cause}] {}", self.reasoning),
            None => self.reasoning.to_string(),
        }
    }
}

/// Everything produced for one ZIP or address lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealReport {
    /// ZIP code or address that was searched.
    pub query: String,
    pub category: DistressCategory,
    pub generated_at: DateTime<Utc>,
    pub candidates_considered: usize,
    pub picks: Vec<PropertyRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Narrative>,
}

impl DealReport {
    /// True when the provider answered successfully but had nothing to rank.
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_code_accepts_plain_and_plus_four() {
        assert_eq!(ZipCode::parse("90210").expect("plain").as_str(), "90210");
        assert_eq!(ZipCode::parse(" 30301 ").expect("trimmed").as_str(), "30301");
        assert_eq!(
            ZipCode::parse("10001-1234").expect("zip+4").as_str(),
            "10001"
        );
    }

    #[test]
    fn zip_code_rejects_malformed_input() {
        for raw in ["", "1234", "123456", "abcde", "12345-12", "12345-abcd", "quit"] {
            assert!(ZipCode::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn category_parses_loose_spellings() {
        assert_eq!(
            "Pre_Foreclosure".parse::<DistressCategory>(),
            Ok(DistressCategory::PreForeclosure)
        );
        assert_eq!(
            "propensity".parse::<DistressCategory>(),
            Ok(DistressCategory::Propensity)
        );
        assert!("auction".parse::<DistressCategory>().is_err());
    }

    #[test]
    fn unavailable_narrative_renders_placeholder() {
        let narrative = Narrative::Unavailable("model overloaded".to_string());
        assert_eq!(
            narrative.to_string(),
            "[analysis unavailable: model overloaded]"
        );
        assert!(narrative.text().is_none());
    }
}
