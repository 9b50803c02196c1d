use crate::commands::{
    run_evaluate, run_mappings_deactivate, run_mappings_list, run_mappings_unmapped,
    run_mappings_upsert, DeactivateArgs, EvaluateArgs, MappingStoreArgs, UnmappedArgs,
    UpsertArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use inspection_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Inspection Readiness",
    about = "Evaluate inspection exports for settlement readiness and manage trade mappings",
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
    /// Evaluate an inspection CSV export and print settlement readiness per property
    Evaluate(EvaluateArgs),
    /// Inspect or edit the trade mapping registry
    Mappings {
        #[command(subcommand)]
        command: MappingsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum MappingsCommand {
    /// List every mapping, active and inactive
    List(MappingStoreArgs),
    /// Map a raw trade label to a canonical trade
    Upsert(UpsertArgs),
    /// Deactivate a mapping without deleting it
    Deactivate(DeactivateArgs),
    /// Show trade labels in an export that no active mapping resolves
    Unmapped(UnmappedArgs),
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
        Command::Evaluate(args) => run_evaluate(args),
        Command::Mappings { command } => match command {
            MappingsCommand::List(args) => run_mappings_list(args),
            MappingsCommand::Upsert(args) => run_mappings_upsert(args),
            MappingsCommand::Deactivate(args) => run_mappings_deactivate(args),
            MappingsCommand::Unmapped(args) => run_mappings_unmapped(args),
        },
    }
}
