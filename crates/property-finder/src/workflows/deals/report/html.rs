use std::fmt::Write as _;

use super::super::domain::{DealReport, Narrative};
use super::text::{format_money, render_text};

const PAGE_STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem}\
.pick{border:1px solid #ccc;border-radius:6px;padding:0.75rem 1rem;margin:0.75rem 0}\
.error{color:#a40000}.muted{color:#666}";

const DOWNLOAD_SCRIPT: &str = "document.getElementById('download').addEventListener('click',function(e){\
e.preventDefault();var t=document.getElementById('report-text').textContent;\
var a=document.createElement('a');a.href=URL.createObjectURL(new Blob([t],{type:'text/plain'}));\
a.download=this.dataset.filename;a.click();URL.revokeObjectURL(a.href);});";

/// Landing page with only the ZIP form.
pub fn render_form_page() -> String {
    page(&form_html(""), None)
}

/// Form page with an inline error message.
pub fn render_error_page(zip_input: &str, message: &str) -> String {
    let body = format!(
        "{}<p class=\"error\">{}</p>",
        form_html(zip_input),
        escape_html(message)
    );
    page(&body, None)
}

/// Full report page, including a client-side "download as text" link.
pub fn render_report_page(report: &DealReport) -> String {
    let mut body = form_html("");
    writeln!(body, "<h2>{}</h2>", escape_html(&report.query)).expect("write heading");
    writeln!(
        body,
        "<p class=\"muted\">{} &middot; generated {}</p>",
        report.category.label(),
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    )
    .expect("write subheading");

    if report.is_empty() {
        writeln!(
            body,
            "<p>No properties found in {}.</p>",
            escape_html(&report.query)
        )
        .expect("write empty notice");
    }

    for (index, pick) in report.picks.iter().enumerate() {
        body.push_str("<div class=\"pick\">");
        writeln!(
            body,
            "<h3>{}. {}{}</h3>",
            index + 1,
            escape_html(&pick.address),
            pick.city
                .as_deref()
                .map(|city| format!(", {}", escape_html(city)))
                .unwrap_or_default()
        )
        .expect("write pick heading");
        writeln!(
            body,
            "<p>Assessed value: {} &middot; Distress score: {:.0} &middot; Equity: {:.1}% &middot; Ranking key: {:.1}</p>",
            format_money(pick.assessed_value),
            pick.distress_score,
            pick.equity_percent,
            pick.ranking_key
        )
        .expect("write pick figures");
        if let Some(reasoning) = &pick.reasoning {
            body.push_str(&narrative_html(reasoning));
        }
        body.push_str("</div>");
    }

    if let Some(trend) = &report.trend {
        writeln!(
            body,
            "<h3>Sales trend</h3><p>Trend {:.2}% &middot; average sale {} &middot; outlook <strong>{}</strong></p><p>{}</p>",
            trend.trend_percent,
            format_money(Some(trend.average_sale_price)),
            trend.classification.label(),
            escape_html(&trend.annotated_reasoning())
        )
        .expect("write trend");
    }

    if let Some(summary) = &report.summary {
        body.push_str("<h3>Overall analysis</h3>");
        body.push_str(&narrative_html(summary));
    }

    page(&body, Some(&render_text(report)))
}

fn narrative_html(narrative: &Narrative) -> String {
    match narrative {
        Narrative::Generated(text) => text
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .map(|line| format!("<p>{}</p>", escape_html(line.trim())))
            .collect(),
        Narrative::Unavailable(_) => {
            format!("<p class=\"error\">{}</p>", escape_html(&narrative.to_string()))
        }
    }
}

fn form_html(zip_input: &str) -> String {
    format!(
        "<h1>Distressed Property Finder</h1>\
<form method=\"post\" action=\"/\">\
<label for=\"zip_code\">ZIP code</label> \
<input id=\"zip_code\" name=\"zip_code\" value=\"{}\" inputmode=\"numeric\" required> \
<label><input type=\"checkbox\" name=\"include_trend\" value=\"true\"> include sales trend</label> \
<button type=\"submit\">Find deals</button></form>",
        escape_html(zip_input)
    )
}

fn page(body: &str, report_text: Option<&str>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<title>Distressed Property Finder</title>");
    writeln!(html, "<style>{PAGE_STYLE}</style></head><body>").expect("write head");
    html.push_str(body);

    if let Some(text) = report_text {
        writeln!(
            html,
            "<p><a id=\"download\" href=\"#\" data-filename=\"property-report.txt\">Download as text</a></p>\
<pre id=\"report-text\" hidden>{}</pre><script>{DOWNLOAD_SCRIPT}</script>",
            escape_html(text)
        )
        .expect("write download link");
    }

    html.push_str("</body></html>");
    html
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::deals::domain::{DistressCategory, PropertyRecord};
    use chrono::Utc;

    fn report_with(address: &str, reasoning: Narrative) -> DealReport {
        DealReport {
            query: "ZIP 60601".to_string(),
            category: DistressCategory::PreForeclosure,
            generated_at: Utc::now(),
            candidates_considered: 1,
            picks: vec![PropertyRecord {
                address: address.to_string(),
                city: None,
                assessed_value: None,
                last_sale_amount: 0.0,
                distress_score: 85.0,
                equity_percent: 20.0,
                ranking_key: 59.0,
                reasoning: Some(reasoning),
            }],
            trend: None,
            summary: None,
        }
    }

    #[test]
    fn escapes_interpolated_values() {
        let html = render_report_page(&report_with(
            "<script>alert(1)</script>",
            Narrative::Generated("Tom & Jerry's \"duplex\"".to_string()),
        ));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("Tom &amp; Jerry&#39;s &quot;duplex&quot;"));
    }

    #[test]
    fn report_page_embeds_download_link_and_text() {
        let html = render_report_page(&report_with(
            "5 Lake Dr",
            Narrative::Unavailable("overloaded".to_string()),
        ));
        assert!(html.contains("id=\"download\""));
        assert!(html.contains("<pre id=\"report-text\" hidden>"));
        assert!(html.contains("Distressed Property Finder: ZIP 60601"));
        assert!(html.contains("class=\"error\">[analysis unavailable: overloaded]"));
    }

    #[test]
    fn error_page_keeps_the_submitted_value() {
        let html = render_error_page("9021\"", "'9021\"' is not a valid 5-digit ZIP code");
        assert!(html.contains("value=\"9021&quot;\""));
        assert!(html.contains("class=\"error\""));
        assert!(!html.contains("id=\"download\""));
    }
}
