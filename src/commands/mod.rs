// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

pub mod agents;
pub mod check;
pub mod show;
pub mod status;

pub use agents::AgentsArgs;
pub use check::CheckParamArgs;
pub use show::ShowArgs;
pub use status::StatusArgs;

use clap::{Parser, Subcommand};

use crate::Cluster;

#[derive(Debug)]
pub struct EmptyError {}

use std::fmt;
impl fmt::Display for EmptyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error")
    }
}

impl<T: std::error::Error> From<T> for EmptyError {
    fn from(_error: T) -> Self {
        EmptyError {}
    }
}

/// Commands use a custom Result type which does not contain any error metadata. This is because
/// the binary's main() function is not supposed to interpret the Result of a command in any way,
/// except to set the exit status.
pub type Result = std::result::Result<(), EmptyError>;

pub fn err() -> Result {
    Result::Err(EmptyError {})
}

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Default for Cli {
    fn default() -> Self {
        Cli {
            config: Some(crate::default_config_path()),
            verbose: false,
            command: None,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the nodes, resources and constraints of the configuration.
    Show(ShowArgs),
    /// Print where resources run and how often they failed.
    Status(StatusArgs),
    /// List the resource agents in the catalog, or describe one.
    Agents(AgentsArgs),
    /// Check a value against the type of an agent parameter.
    CheckParam(CheckParamArgs),
}

pub fn main(cli: &Cli) -> Result {
    let cluster = Cluster::new(cli)?;
    match &cli.command {
        Some(Commands::Show(args)) => show::show(&cluster, args),
        Some(Commands::Status(args)) => status::status(&cluster, args),
        Some(Commands::Agents(args)) => agents::agents(&cluster, args),
        Some(Commands::CheckParam(args)) => check::check_param(&cluster, args),
        None => show::show(&cluster, &ShowArgs::default()),
    }
}
