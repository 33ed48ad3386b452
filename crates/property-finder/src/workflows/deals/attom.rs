//! ATTOM property API adapter.
//!
//! Responses are decoded into typed structs with `serde`; anything that does
//! not match the expected shape becomes [`ProviderError::DataShape`].

use std::time::Instant;

use chrono::{Datelike, NaiveDate, Utc};
use reqwest::blocking::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::domain::{PropertyQuery, RawProperty, SalesTrend, ZipCode};
use super::provider::{PropertyProvider, ProviderError};
use crate::config::{AttomConfig, HttpConfig};

const BASIC_PROFILE_ENDPOINT: &str = "property/basicprofile";
const SALES_HISTORY_ENDPOINT: &str = "saleshistory/detail";
const SALES_TREND_ENDPOINT: &str = "salestrend/snapshot";
const NO_RESULTS_MSG: &str = "SuccessWithoutResult";
const TREND_LOOKBACK_YEARS: i32 = 5;

pub struct AttomClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
    page_size: u32,
}

impl std::fmt::Debug for AttomClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttomClient")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl AttomClient {
    pub fn new(config: AttomConfig, http: HttpConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(http.timeout).build()?;
        let mut base_url = config.base_url;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http: client,
            api_key: config.api_key,
            base_url,
            page_size: config.page_size,
        })
    }

    fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<(u16, String), ProviderError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let started = Instant::now();
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("apikey", self.api_key.expose_secret())
            .query(params)
            .send()
            .map_err(|err| {
                warn!(%url, error = %err, "attom request failed");
                ProviderError::from(err)
            })?;

        let status = response.status().as_u16();
        let body = response.text()?;
        debug!(
            %url,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "attom response received"
        );
        Ok((status, body))
    }
}

impl PropertyProvider for AttomClient {
    fn fetch(&self, query: &PropertyQuery) -> Result<Vec<RawProperty>, ProviderError> {
        let (endpoint, params) = match query {
            PropertyQuery::PostalCode(zip) => (
                BASIC_PROFILE_ENDPOINT,
                vec![
                    ("postalcode", zip.to_string()),
                    ("pagesize", self.page_size.to_string()),
                ],
            ),
            PropertyQuery::Address { address1, address2 } => (
                SALES_HISTORY_ENDPOINT,
                vec![
                    ("address1", address1.clone()),
                    ("address2", address2.clone()),
                ],
            ),
        };

        let (status, body) = self.get(endpoint, &params)?;
        parse_property_response(status, &body)
    }

    fn sales_trend(&self, zip: &ZipCode) -> Result<SalesTrend, ProviderError> {
        let end_year = Utc::now().year() - 1;
        let params = [
            ("geoid", format!("ZI{zip}")),
            ("interval", "yearly".to_string()),
            ("startyear", (end_year - TREND_LOOKBACK_YEARS + 1).to_string()),
            ("endyear", end_year.to_string()),
        ];

        let (status, body) = self.get(SALES_TREND_ENDPOINT, &params)?;
        parse_sales_trend_response(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct StatusBlock {
    #[serde(default)]
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default, alias = "Status")]
    status: Option<StatusBlock>,
}

#[derive(Debug, Deserialize)]
struct PropertyEnvelope {
    property: Option<Vec<PropertyItem>>,
}

#[derive(Debug, Default, Deserialize)]
struct PropertyItem {
    #[serde(default)]
    address: AddressBlock,
    #[serde(default)]
    assessment: Option<AssessmentBlock>,
    #[serde(default)]
    sale: Option<SaleEvent>,
    #[serde(default, alias = "salehistory", alias = "saleshistory")]
    #[serde(rename = "saleHistory")]
    sale_history: Option<Vec<SaleEvent>>,
}

#[derive(Debug, Default, Deserialize)]
struct AddressBlock {
    line1: Option<String>,
    line2: Option<String>,
    locality: Option<String>,
    #[serde(rename = "oneLine")]
    one_line: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssessmentBlock {
    assessed: Option<AssessedBlock>,
}

#[derive(Debug, Deserialize)]
struct AssessedBlock {
    assdttlvalue: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SaleEvent {
    amount: Option<SaleAmount>,
}

#[derive(Debug, Deserialize)]
struct SaleAmount {
    saleamt: Option<f64>,
    salerecdate: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrendEnvelope {
    #[serde(alias = "salesTrends")]
    salestrends: Option<Vec<TrendPeriod>>,
}

#[derive(Debug, Deserialize)]
struct TrendPeriod {
    daterange: Option<DateRange>,
    #[serde(rename = "SalesTrend", alias = "salesTrend", alias = "salestrend")]
    sales_trend: Option<TrendFigures>,
}

#[derive(Debug, Deserialize)]
struct DateRange {
    start: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrendFigures {
    avgsaleprice: Option<f64>,
}

/// Extract the vendor message from an error body, if any.
fn upstream_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.status)
        .and_then(|status| status.msg)
        .filter(|msg| !msg.trim().is_empty())
}

/// Shared non-200 handling.
///
/// Every non-200 status becomes [`ProviderError::Upstream`] except one: ATTOM
/// answers an empty search with a non-200 status whose `status.msg` is
/// `SuccessWithoutResult`. That case returns `Ok(false)` so callers can report
/// zero properties instead of a failure.
fn check_status(status: u16, body: &str) -> Result<bool, ProviderError> {
    if status == 200 {
        return Ok(true);
    }

    let message = upstream_message(body);
    if message.as_deref() == Some(NO_RESULTS_MSG) {
        return Ok(false);
    }

    Err(ProviderError::Upstream {
        status,
        message: message.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

pub fn parse_property_response(status: u16, body: &str) -> Result<Vec<RawProperty>, ProviderError> {
    if !check_status(status, body)? {
        return Ok(Vec::new());
    }

    let envelope: PropertyEnvelope = serde_json::from_str(body)
        .map_err(|err| ProviderError::DataShape(format!("invalid property JSON: {err}")))?;
    let items = envelope
        .property
        .ok_or_else(|| ProviderError::DataShape("response has no `property` array".to_string()))?;

    Ok(items.into_iter().map(into_raw_property).collect())
}

fn into_raw_property(item: PropertyItem) -> RawProperty {
    let PropertyItem {
        address,
        assessment,
        sale,
        sale_history,
    } = item;

    let street = address
        .line1
        .or(address.one_line)
        .unwrap_or_else(|| "N/A".to_string());
    let city = address.locality.or(address.line2);
    let assessed_value = assessment
        .and_then(|block| block.assessed)
        .and_then(|assessed| assessed.assdttlvalue);

    let latest_sale = sale_history
        .unwrap_or_default()
        .into_iter()
        .chain(sale)
        .filter_map(|event| event.amount)
        .map(|amount| {
            let date = amount.salerecdate.as_deref().and_then(parse_sale_date);
            (amount.saleamt.unwrap_or(0.0), date)
        })
        .max_by_key(|(_, date)| *date);

    let (last_sale_amount, last_sale_date) = latest_sale.unwrap_or((0.0, None));

    RawProperty {
        address: street,
        city,
        assessed_value,
        last_sale_amount,
        last_sale_date,
    }
}

fn parse_sale_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Decode a yearly sales-trend snapshot.
///
/// The average price is the latest period's average; the trend is the percent
/// change of that average between the earliest and latest periods.
pub fn parse_sales_trend_response(status: u16, body: &str) -> Result<SalesTrend, ProviderError> {
    if !check_status(status, body)? {
        return Err(ProviderError::DataShape(
            "no sales trend published for this ZIP".to_string(),
        ));
    }

    let envelope: TrendEnvelope = serde_json::from_str(body)
        .map_err(|err| ProviderError::DataShape(format!("invalid sales trend JSON: {err}")))?;

    let mut periods: Vec<(String, f64)> = envelope
        .salestrends
        .unwrap_or_default()
        .into_iter()
        .filter_map(|period| {
            let start = period.daterange.and_then(|range| range.start)?;
            let price = period.sales_trend.and_then(|figures| figures.avgsaleprice)?;
            (price.is_finite() && price > 0.0).then_some((start, price))
        })
        .collect();
    periods.sort_by(|a, b| a.0.cmp(&b.0));

    match (periods.first(), periods.last()) {
        (Some((first_start, first)), Some((last_start, last))) if first_start != last_start => {
            Ok(SalesTrend {
                trend_percent: (last - first) / first * 100.0,
                average_sale_price: *last,
            })
        }
        _ => Err(ProviderError::DataShape(
            "sales trend needs at least two priced periods".to_string(),
        )),
    }
}
