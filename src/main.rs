//! evogen entry point: parse the CLI, wire up configuration, dispatch.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use evogen::bench;
use evogen::commands::{Cli, Command, ConfigCommands};
use evogen::config::Settings;
use evogen::evolve::Evolver;
use evogen::history;
use evogen::invoker::Invoker;
use evogen::llm::{ModelClient, ModelReply};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // One settings value for the whole process, passed by reference into
    // each component. Missing config file seeds and persists the defaults.
    let mut settings = Settings::new();
    if !settings.load(None) {
        settings.seed_defaults();
    }
    if let Some(path) = cli.config.as_deref() {
        if !settings.load(Some(path)) {
            tracing::warn!("could not load config from {}", path.display());
        }
    }
    if cli.verbose {
        settings.set("verbose", "true");
    }

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Evolve {
            description,
            execute,
            save,
        } => {
            if !Evolver::new(&settings).evolve(&description, execute, save).await {
                eprintln!("Evolution failed");
            }
        }
        Command::Status => history::print_status(&settings).await,
        Command::History => history::print_history(&settings),
        Command::Query { prompt } => {
            if !run_query(&settings, &prompt).await {
                eprintln!("LLM query failed");
            }
        }
        Command::Version => print_version(&settings),
        Command::Config { command } => match command {
            ConfigCommands::Show => settings.print_all(),
            ConfigCommands::Set { key, value } => {
                settings.set(&key, &value);
                if settings.save(None) {
                    println!("Set {key} = {value}");
                } else {
                    eprintln!("Failed to save configuration");
                }
            }
        },
        Command::Benchmark => bench::run_benchmark(),
        Command::Demo => bench::run_demo(),
        Command::Exec { command } => {
            if !exec_system_command(&settings, &command).await {
                eprintln!("Command execution failed");
            }
        }
        Command::Improve => {
            if !run_improve(&settings).await {
                eprintln!("Self-improvement query failed");
            }
        }
    }

    // Pipeline-level failures are reported above but do not change the exit
    // code; only argument parse errors exit nonzero.
    Ok(())
}

async fn run_query(settings: &Settings, prompt: &str) -> bool {
    println!("Querying LLM: {prompt}");

    let client = ModelClient::new(settings);
    print_model_reply(client.query(prompt, "").await)
}

async fn run_improve(settings: &Settings) -> bool {
    let current_features = "\
Current CLI tool features:
- LLM integration for code generation
- Command evolution with layered validation
- Configuration management
- Performance benchmarking
- Command history tracking";

    let client = ModelClient::new(settings);
    print_model_reply(client.suggest_improvements(current_features).await)
}

fn print_model_reply(reply: ModelReply) -> bool {
    match reply {
        ModelReply::Text(text) if !text.is_empty() => {
            println!("Response:\n{}", "-".repeat(20));
            println!("{text}");
            true
        }
        ModelReply::Text(_) => {
            println!("No response from LLM");
            false
        }
        reply => {
            let reason = reply
                .failure_reason()
                .unwrap_or_else(|| "unknown failure".to_string());
            println!("{reason}");
            false
        }
    }
}

/// `evogen exec`: run a raw command line, unless safe mode is on, in which
/// case only announce what would have run.
async fn exec_system_command(settings: &Settings, command: &str) -> bool {
    if settings.get_bool("execution.safe_mode", true) {
        println!("Safe mode enabled. Would execute: {command}");
        return true;
    }

    println!("Executing: {command}");
    let timeout_secs =
        u64::try_from(settings.get_int("execution.max_time", 60).max(1)).unwrap_or(60);
    match Invoker::new(timeout_secs).run_line(command).await {
        Ok(success) => success,
        Err(err) => {
            eprintln!("{err}");
            false
        }
    }
}

fn print_version(settings: &Settings) {
    println!(
        "evogen v{}",
        settings.get_string("version", env!("CARGO_PKG_VERSION"))
    );
    println!("Self-evolving code generation CLI");
    println!("Built with clap and Tokio");
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "evogen=debug" } else { "evogen=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
