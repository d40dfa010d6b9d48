use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::cmd::{self, schema::SchemaArgs, snapshot::SnapshotArgs, validate::ValidateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "greentic-form",
    about = "Evaluate declarative form schemas: visibility, validation and output values",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Log pipeline passes and options bookkeeping to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print fields, value and validity after applying events
    Snapshot(SnapshotArgs),
    /// Report validation errors as if the form were submitted
    Validate(ValidateArgs),
    /// Print the JSON Schema of the field-definition format
    Schema(SchemaArgs),
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Snapshot(args) => cmd::snapshot::run(args),
        Commands::Validate(args) => cmd::validate::run(args),
        Commands::Schema(args) => cmd::schema::run(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}
