//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Project Graph - Load project descriptors and their references
#[derive(Parser, Debug)]
#[command(name = "project-graph")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load projects and their transitive references
    Load(commands::load::LoadArgs),

    /// Generate a property-assignment descriptor from package manifests
    GenProps(commands::gen_props::GenPropsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.clone()),
        )
        .init();

        match self.command {
            Commands::Load(args) => commands::load::execute(args),
            Commands::GenProps(args) => commands::gen_props::execute(args),
        }
    }
}
