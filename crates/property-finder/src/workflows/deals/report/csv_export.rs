use serde::Serialize;

use super::super::domain::DealReport;

#[derive(Debug, Serialize)]
struct PickRow<'a> {
    rank: usize,
    address: &'a str,
    city: Option<&'a str>,
    assessed_value: Option<f64>,
    last_sale_amount: f64,
    distress_score: f64,
    equity_percent: f64,
    ranking_key: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum CsvExportError {
    #[error("failed to write CSV row: {0}")]
    Write(#[from] csv::Error),
    #[error("failed to flush CSV output: {0}")]
    Flush(String),
}

/// One row per pick, with a header row even when there are no picks.
pub fn render_csv(report: &DealReport) -> Result<String, CsvExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record([
        "rank",
        "address",
        "city",
        "assessed_value",
        "last_sale_amount",
        "distress_score",
        "equity_percent",
        "ranking_key",
    ])?;

    for (index, pick) in report.picks.iter().enumerate() {
        writer.serialize(PickRow {
            rank: index + 1,
            address: &pick.address,
            city: pick.city.as_deref(),
            assessed_value: pick.assessed_value,
            last_sale_amount: pick.last_sale_amount,
            distress_score: pick.distress_score,
            equity_percent: pick.equity_percent,
            ranking_key: pick.ranking_key,
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| CsvExportError::Flush(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| CsvExportError::Flush(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::deals::domain::{DistressCategory, PropertyRecord};
    use chrono::Utc;

    #[test]
    fn writes_header_and_one_row_per_pick() {
        let report = DealReport {
            query: "ZIP 33101".to_string(),
            category: DistressCategory::Propensity,
            generated_at: Utc::now(),
            candidates_considered: 1,
            picks: vec![PropertyRecord {
                address: "1 Bay Rd, Unit 2".to_string(),
                city: None,
                assessed_value: Some(250_000.0),
                last_sale_amount: 199_000.0,
                distress_score: 90.0,
                equity_percent: 20.0,
                ranking_key: 62.0,
                reasoning: None,
            }],
            trend: None,
            summary: None,
        };

        let csv = render_csv(&report).expect("csv renders");
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("rank,address,city,assessed_value,last_sale_amount,distress_score,equity_percent,ranking_key")
        );
        assert_eq!(
            lines.next(),
            Some("1,\"1 Bay Rd, Unit 2\",,250000.0,199000.0,90.0,20.0,62.0")
        );
        assert_eq!(lines.next(), None);
    }
}
