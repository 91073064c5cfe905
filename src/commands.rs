//! Command-line surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Self-evolving code generation CLI driven by an external LLM backend.
#[derive(Parser, Debug)]
#[command(name = "evogen", version)]
#[command(about = "Self-evolving code generation CLI driven by an external LLM backend")]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate new functionality from a description using the LLM backend
    Evolve {
        /// Description of the functionality to generate
        description: String,

        /// Simulate execution of the generated code immediately
        #[arg(short, long)]
        execute: bool,

        /// Save the generated code permanently
        #[arg(short, long)]
        save: bool,
    },

    /// Show current tool status and configuration
    Status,

    /// Show command generation history
    History,

    /// Send a prompt straight to the LLM backend
    Query {
        /// Prompt text
        prompt: String,
    },

    /// Show version information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run performance benchmarks
    Benchmark,

    /// Demonstrate native CLI advantages
    Demo,

    /// Execute a system command (honors safe mode)
    Exec {
        /// Command line to run
        command: String,
    },

    /// Ask the backend for self-improvement suggestions
    Improve,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value and persist it
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}
