use crate::console::{self, ConsoleArgs, ReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use property_finder::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Distressed Property Finder",
    about = "Rank distressed-property deals in a ZIP code and explain the top picks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the web form and JSON API (default command)
    Serve(ServeArgs),
    /// Prompt for ZIP codes interactively until 'quit'
    Repl(ConsoleArgs),
    /// Produce a single report for a ZIP code or street address
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Repl(args) => console::run_repl(args).await,
        Command::Report(args) => console::run_report(args).await,
    }
}
