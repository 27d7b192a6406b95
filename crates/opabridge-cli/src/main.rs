//! Opabridge CLI: the `opabridge` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version { json } => commands::version::run(cli.opa_path, json),

        Commands::Parse { file, json } => commands::parse::run(cli.opa_path, file, json),

        Commands::DataRoot { dir } => commands::data_root::run(cli.opa_path, dir),

        Commands::FormatRef { segments } => commands::format_ref::run(segments),
    }
}
