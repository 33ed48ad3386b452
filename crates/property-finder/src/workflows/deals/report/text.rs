use std::fmt::Write as _;

use super::super::domain::{DealReport, PropertyRecord, TrendResult};

/// Plain-text rendering used by the console surfaces and the HTML download link.
pub fn render_text(report: &DealReport) -> String {
    let mut out = String::new();
    writeln!(out, "Distressed Property Finder: {}", report.query).expect("write title");
    writeln!(
        out,
        "Category: {} | Generated: {}",
        report.category.label(),
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    )
    .expect("write header");
    out.push('\n');

    if report.is_empty() {
        writeln!(out, "No properties found in {}.", report.query).expect("write empty");
    } else {
        writeln!(
            out,
            "Top Picks ({} of {} candidates):",
            report.picks.len(),
            report.candidates_considered
        )
        .expect("write picks heading");
        for (index, pick) in report.picks.iter().enumerate() {
            out.push('\n');
            write_pick(&mut out, index + 1, pick);
        }
    }

    if let Some(trend) = &report.trend {
        out.push('\n');
        write_trend(&mut out, trend);
    }

    if let Some(summary) = &report.summary {
        out.push('\n');
        writeln!(out, "Overall Analysis:").expect("write summary heading");
        writeln!(out, "{summary}").expect("write summary");
    }

    out
}

fn write_pick(out: &mut String, rank: usize, pick: &PropertyRecord) {
    let location = match &pick.city {
        Some(city) => format!("{}, {}", pick.address, city),
        None => pick.address.clone(),
    };
    writeln!(out, "{rank}. {location}").expect("write pick title");
    writeln!(
        out,
        "   Assessed value: {} | Last sale: {}",
        format_money(pick.assessed_value),
        format_money(Some(pick.last_sale_amount).filter(|amount| *amount > 0.0))
    )
    .expect("write pick values");
    writeln!(
        out,
        "   Distress score: {:.0} | Equity: {:.1}% | Ranking key: {:.1}",
        pick.distress_score, pick.equity_percent, pick.ranking_key
    )
    .expect("write pick scores");
    if let Some(reasoning) = &pick.reasoning {
        writeln!(out, "   Why: {reasoning}").expect("write pick reasoning");
    }
}

fn write_trend(out: &mut String, trend: &TrendResult) {
    writeln!(out, "Sales Trend for {}:", trend.zip_code).expect("write trend heading");
    writeln!(
        out,
        "   Trend: {:.2}% | Average sale price: {} | Score: {:.2} | Outlook: {}",
        trend.trend_percent,
        format_money(Some(trend.average_sale_price)),
        trend.score,
        trend.classification.label()
    )
    .expect("write trend figures");
    writeln!(out, "   {}", trend.annotated_reasoning()).expect("write trend reasoning");
}

/// Whole-dollar amount with thousands separators, or `N/A`.
pub(crate) fn format_money(amount: Option<f64>) -> String {
    let Some(amount) = amount else {
        return "N/A".to_string();
    };
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::deals::domain::{
        DistressCategory, Narrative, TrendClassification, ZipCode,
    };
    use chrono::{TimeZone, Utc};

    fn report(picks: Vec<PropertyRecord>) -> DealReport {
        DealReport {
            query: "ZIP 78701".to_string(),
            category: DistressCategory::Propensity,
            generated_at: Utc.with_ymd_and_hms(2026, 3, 2, 15, 4, 0).unwrap(),
            candidates_considered: picks.len(),
            picks,
            trend: None,
            summary: None,
        }
    }

    fn pick(reasoning: Narrative) -> PropertyRecord {
        PropertyRecord {
            address: "12 Elm St".to_string(),
            city: Some("AUSTIN".to_string()),
            assessed_value: Some(312_000.0),
            last_sale_amount: 0.0,
            distress_score: 90.0,
            equity_percent: 20.0,
            ranking_key: 62.0,
            reasoning: Some(reasoning),
        }
    }

    #[test]
    fn formats_money_with_grouping() {
        assert_eq!(format_money(Some(450_000.0)), "$450,000");
        assert_eq!(format_money(Some(999.4)), "$999");
        assert_eq!(format_money(Some(1_234_567.0)), "$1,234,567");
        assert_eq!(format_money(None), "N/A");
    }

    #[test]
    fn empty_report_says_no_properties_found() {
        let text = render_text(&report(Vec::new()));
        assert!(text.contains("No properties found in ZIP 78701."));
        assert!(text.contains("Generated: 2026-03-02 15:04 UTC"));
    }

    #[test]
    fn picks_show_scores_and_placeholder_for_failed_narrative() {
        let text = render_text(&report(vec![pick(Narrative::Unavailable(
            "timeout".to_string(),
        ))]));
        assert!(text.contains("1. 12 Elm St, AUSTIN"));
        assert!(text.contains("Assessed value: $312,000 | Last sale: N/A"));
        assert!(text.contains("Distress score: 90 | Equity: 20.0% | Ranking key: 62.0"));
        assert!(text.contains("Why: [analysis unavailable: timeout]"));
    }

    #[test]
    fn trend_block_is_rendered() {
        let mut report = report(Vec::new());
        report.trend = Some(TrendResult {
            zip_code: ZipCode::parse("78701").expect("zip"),
            trend_percent: 0.5,
            average_sale_price: 450_000.0,
            score: 45.35,
            classification: TrendClassification::Appreciate,
            fallback_used: true,
            fallback_cause: Some("no data".to_string()),
            reasoning: Narrative::Generated("steady".to_string()),
        });
        let text = render_text(&report);
        assert!(text.contains("Sales Trend for 78701:"));
        assert!(text.contains("Outlook: Appreciate"));
        assert!(text.contains("[fallback used: no data] steady"));
    }
}
