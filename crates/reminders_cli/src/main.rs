//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `reminders_core` linkage with deterministic output.
//! - Expose the content transforms for quick manual checks.

use clap::{Parser, Subcommand};
use reminders_core::{html_to_enml, EnmlDocument};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about = "Reminders note core smoke checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Print the canonical ENML of an HTML or rich-text file
    Canonicalize {
        /// Input markup file
        path: PathBuf,
    },
    /// Print the plaintext projection of an ENML file
    Plaintext {
        /// Input ENML file
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        None => {
            println!("reminders_core ping={}", reminders_core::ping());
            println!("reminders_core version={}", reminders_core::core_version());
            ExitCode::SUCCESS
        }
        Some(Commands::Canonicalize { path }) => run(&path, |html| html_to_enml(&html)),
        Some(Commands::Plaintext { path }) => {
            run(&path, |enml| EnmlDocument::from_enml(enml).to_plaintext())
        }
    }
}

fn run(path: &Path, transform: impl FnOnce(String) -> String) -> ExitCode {
    match std::fs::read_to_string(path) {
        Ok(input) => {
            println!("{}", transform(input));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to read `{}`: {err}", path.display());
            ExitCode::FAILURE
        }
    }
}
