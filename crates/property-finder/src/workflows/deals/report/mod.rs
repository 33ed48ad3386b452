//! Presentation of a [`DealReport`](super::domain::DealReport) as text, HTML or CSV.

mod csv_export;
mod html;
mod text;

pub use csv_export::{render_csv, CsvExportError};
pub use html::{render_error_page, render_form_page, render_report_page};
pub use text::render_text;
