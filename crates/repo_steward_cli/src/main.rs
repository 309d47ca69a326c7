use clap::{Parser, Subcommand};
use colored::Colorize;
use repo_steward_cli::commands::apply_cmd::{
    apply_desired_state, exit_code, handle_apply_command, render_report, ApplyArgs,
};
use repo_steward_cli::commands::validate_cmd::{handle_validate_command, ValidateArgs};
use repo_steward_cli::errors::EXIT_SUCCESS;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Repo Steward CLI: Converge GitHub repositories to a declared state
#[derive(Parser)]
#[command(name = "repo-steward")]
#[command(about = "Converge GitHub repositories to a declared state", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a repository with a desired-state document
    Apply(ApplyArgs),

    /// Check a desired-state document without contacting GitHub
    Validate(ValidateArgs),

    /// Show the CLI version
    Version,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().pretty().with_writer(std::io::stderr))
        .with(EnvFilter::from_env("REPO_STEWARD_LOG"))
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Apply(args) => match handle_apply_command(args, apply_desired_state).await {
            Ok(report) => {
                println!("{}", render_report(&report));
                std::process::exit(exit_code(&report));
            }
            Err(e) => {
                error!("Error: {e}");
                eprintln!("{} {e}", "Error:".red().bold());
                std::process::exit(e.exit_code());
            }
        },
        Commands::Validate(args) => match handle_validate_command(args) {
            Ok(report) => {
                println!("{} {}", "Valid:".green().bold(), report.target);
                for line in &report.plan {
                    println!("  {}", line);
                }
                std::process::exit(EXIT_SUCCESS);
            }
            Err(e) => {
                eprintln!("{} {e}", "Error:".red().bold());
                std::process::exit(e.exit_code());
            }
        },
        Commands::Version => {
            println!(
                "repo-steward version {}",
                option_env!("REPO_STEWARD_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
            );
            std::process::exit(EXIT_SUCCESS);
        }
    }
}
