mod cli;
mod commands;
mod output;
mod prompter;

use anyhow::Result;
use clap::Parser;
use permapatch::Direction;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("permapatch={}", level).parse()?),
        )
        .init();

    match &cli.command {
        Command::Check { image, json } => commands::check::run(&cli, image, *json),
        Command::Install(args) => commands::patch::run(&cli, args, Direction::Install),
        Command::Remove(args) => commands::patch::run(&cli, args, Direction::Remove),
        Command::Set {
            image,
            permadeath,
            no_saving,
            force,
        } => commands::patch::run_set(&cli, image, *permadeath, *no_saving, *force),
        Command::Toggle { image, force } => commands::toggle::run(&cli, image, *force),
        Command::Scan { image, json } => commands::scan::run(&cli, image, *json),
    }
}
