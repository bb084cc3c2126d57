use crate::demo::{run_demo, run_reimbursement_lookup, DemoArgs, ReimbursementArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use hackreg::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Hackathon Registration",
    about = "Run the hackathon registration service or exercise its workflow from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a batch of applicants through review, invitation and check-in
    Demo(DemoArgs),
    /// Look up the travel reimbursement granted for a country
    Reimbursement(ReimbursementArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Reimbursement(args) => run_reimbursement_lookup(args),
    }
}
