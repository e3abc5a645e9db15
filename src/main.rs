mod campaign;
mod cli;
mod commands;
mod driver;
mod error;
mod folds;
mod model;
mod schema;
mod util;
mod validate;

use anyhow::Result;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::Commands;
use crate::schema::SCHEMA;

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::parse(&SCHEMA);

    match cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
