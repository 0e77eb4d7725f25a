use crate::demo::{run_demo, run_sweep, DemoArgs, SweepArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use nomina::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "nomina",
    about = "Run the payroll back office: absence approvals, escalations and prenomina",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service and the escalation scheduler (default command)
    Serve(ServeArgs),
    /// Run a single escalation sweep over the seeded demo requests
    Sweep(SweepArgs),
    /// Run an end-to-end demo: bulk prenomina, approvals and one sweep
    Demo(DemoArgs),
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
        Command::Sweep(args) => run_sweep(args),
        Command::Demo(args) => run_demo(args),
    }
}
