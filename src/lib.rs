#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::uninlined_format_args
)]

pub mod bench;
pub mod commands;
pub mod config;
pub mod evolve;
pub mod history;
pub mod invoker;
pub mod llm;
pub mod util;

pub use commands::{Cli, Command, ConfigCommands};
pub use config::Settings;
pub use evolve::Evolver;
pub use llm::{ModelClient, ModelReply};
