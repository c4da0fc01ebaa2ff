//! CLI command definitions for taskr
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Single-user task list web server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (default: ./taskr.yaml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web server (default if no subcommand given)
    Serve,

    /// Create the database and optionally insert example tasks
    InitDb(InitDbArgs),
}

/// Arguments for `init-db`.
#[derive(Args, Debug, Default)]
pub struct InitDbArgs {
    /// Insert the two example tasks when the table is empty
    #[arg(long)]
    pub seed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::parse_from(["taskr"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.log, "2");
    }

    #[test]
    fn init_db_with_seed() {
        let cli = Cli::parse_from(["taskr", "--database", "x.db", "init-db", "--seed"]);
        assert_eq!(cli.database, Some(PathBuf::from("x.db")));
        match cli.command {
            Some(Command::InitDb(args)) => assert!(args.seed),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["taskr", "serve", "--port", "8080", "-v"]);
        assert!(matches!(cli.command, Some(Command::Serve)));
        assert_eq!(cli.port, Some(8080));
        assert!(cli.verbose);
    }
}
