//! Command-line interface.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "site-portal", about = "Site portal configuration service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Seed defaults and serve the API (default).
    Serve,
    /// Delete every portal option and exit.
    Uninstall,
}

impl Cli {
    /// Subcommand to run; no subcommand means `serve`.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
