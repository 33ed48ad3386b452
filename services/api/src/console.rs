use crate::infra::build_deal_service;
use clap::{ArgGroup, Args, ValueEnum};
use property_finder::config::AppConfig;
use property_finder::error::AppError;
use property_finder::telemetry::{self, LogSink};
use property_finder::workflows::deals::report::{render_csv, render_report_page, render_text};
use property_finder::workflows::deals::{
    DealFinderService, DealOptions, DistressCategory, NarrativeGenerator, PropertyProvider,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ConsoleArgs {
    /// Distress heuristic used to score candidates
    #[arg(long, default_value = "propensity")]
    pub(crate) category: DistressCategory,
    /// Also estimate the ZIP code's sales trend
    #[arg(long)]
    pub(crate) with_trend: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReportFormat {
    Text,
    Html,
    Csv,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["zip", "address"])))]
pub(crate) struct ReportArgs {
    /// ZIP code to search
    #[arg(long)]
    pub(crate) zip: Option<String>,
    /// Street line of a single address to look up instead of a ZIP code
    #[arg(long, requires = "city_state")]
    pub(crate) address: Option<String>,
    /// "City, ST" line accompanying --address
    #[arg(long)]
    pub(crate) city_state: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub(crate) format: ReportFormat,
    /// Write the report to a file instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Skip the overall comparison of the top picks
    #[arg(long)]
    pub(crate) no_summary: bool,
    #[command(flatten)]
    pub(crate) console: ConsoleArgs,
}

impl ConsoleArgs {
    fn options(&self, include_summary: bool) -> DealOptions {
        DealOptions {
            category: self.category,
            include_trend: self.with_trend,
            include_summary,
        }
    }
}

pub(crate) async fn run_repl(args: ConsoleArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Stderr)?;
    let options = args.options(true);

    tokio::task::spawn_blocking(move || {
        let service = build_deal_service(config.attom, config.narrative, config.http)?;
        let stdin = io::stdin();
        repl_loop(&service, options, stdin.lock(), io::stdout())?;
        Ok::<(), AppError>(())
    })
    .await?
}

pub(crate) async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, LogSink::Stderr)?;

    tokio::task::spawn_blocking(move || {
        let service = build_deal_service(config.attom, config.narrative, config.http)?;
        let rendered = produce_report(&service, &args)?;

        match &args.output {
            Some(path) => {
                std::fs::write(path, rendered)?;
                info!(path = %path.display(), "report written");
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(rendered.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok::<(), AppError>(())
    })
    .await?
}

/// Read ZIP codes until `quit`/`exit` or end of input, printing a report or
/// the error for each one.
pub(crate) fn repl_loop<P, N, R, W>(
    service: &DealFinderService<P, N>,
    options: DealOptions,
    mut input: R,
    mut output: W,
) -> io::Result<()>
where
    P: PropertyProvider + 'static,
    N: NarrativeGenerator + 'static,
    R: BufRead,
    W: Write,
{
    writeln!(output, "Welcome to the Distressed Property Finder!")?;
    let mut line = String::new();

    loop {
        write!(output, "Enter a ZIP code (or 'quit' to exit): ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        let entry = line.trim();
        if entry.is_empty() {
            continue;
        }
        if entry.eq_ignore_ascii_case("quit") || entry.eq_ignore_ascii_case("exit") {
            break;
        }

        match service.find_deals_raw(entry, options) {
            Ok(report) => writeln!(output, "\n{}", render_text(&report))?,
            Err(err) => writeln!(output, "\nError: {err}\n")?,
        }
    }

    writeln!(output, "Goodbye!")?;
    Ok(())
}

pub(crate) fn produce_report<P, N>(
    service: &DealFinderService<P, N>,
    args: &ReportArgs,
) -> Result<String, AppError>
where
    P: PropertyProvider + 'static,
    N: NarrativeGenerator + 'static,
{
    let options = args.console.options(!args.no_summary);
    let report = match (&args.zip, &args.address) {
        (Some(zip), _) => service.find_deals_raw(zip, options)?,
        (None, Some(address)) => service.lookup_address(
            address,
            args.city_state.as_deref().unwrap_or_default(),
            options,
        )?,
        (None, None) => {
            return Err(AppError::Deals(
                property_finder::workflows::deals::DealServiceError::InvalidAddress,
            ))
        }
    };

    let rendered = match args.format {
        ReportFormat::Text => render_text(&report),
        ReportFormat::Html => render_report_page(&report),
        ReportFormat::Csv => render_csv(&report)?,
    };
    Ok(rendered)
}
