// src/cli.rs
//! CLI definitions for the flowport migration tool
//!
//! This module contains all command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "flowport")]
#[command(version)]
#[command(about = "Migrates webMethods integration packages to Boomi components", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a source package without generating anything
    Analyze {
        /// Path to the extracted package directory
        package: String,

        /// Print the analysis as JSON instead of a summary table
        #[arg(long)]
        json: bool,
    },

    /// Convert a source package into target component XML
    Convert {
        /// Path to the extracted package directory
        package: String,

        /// Directory to write components and the migration report into
        #[arg(short, long, default_value = "out")]
        output: String,

        /// Path to the configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Convert a package and upload the components to the platform
    Publish {
        /// Path to the extracted package directory
        package: String,

        /// Path to the configuration file with platform credentials
        #[arg(short, long, default_value = "flowport.toml")]
        config: String,

        /// Also write the components and report locally
        #[arg(short, long)]
        output: Option<String>,
    },
}
