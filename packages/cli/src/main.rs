mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    check, init, migrate, publish_check, CheckArgs, InitArgs, MigrateArgs, PublishCheckArgs,
};
use tracing_subscriber::EnvFilter;

/// Pagecraft CLI - batch tooling for page-builder documents
#[derive(Parser, Debug)]
#[command(name = "pagecraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new Pagecraft project
    Init(InitArgs),

    /// Run documents through the load pipeline and report problems
    Check(CheckArgs),

    /// Upgrade documents to the current format version
    Migrate(MigrateArgs),

    /// Report what blocks documents from being published
    PublishCheck(PublishCheckArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Check(args) => check(args, &cwd),
        Command::Migrate(args) => migrate(args, &cwd),
        Command::PublishCheck(args) => publish_check(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
