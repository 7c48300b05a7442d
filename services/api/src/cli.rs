use crate::demo::{run_board, run_demo, BoardArgs, DemoArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use talent_pipeline::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Talent Pipeline",
    about = "Run and inspect the applicant pipeline from the command line",
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
    /// Print the stage board for a JSON seed file
    Board(BoardArgs),
    /// Walk sample candidates through the pipeline and print the resulting board
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
    /// Seed the store from this JSON file instead of PIPELINE_SEED_PATH
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Board(args) => run_board(args),
        Command::Demo(args) => run_demo(args),
    }
}
