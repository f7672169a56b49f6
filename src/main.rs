mod cli;
mod controller;
mod error;
mod export;
mod fmt;
mod form;
mod models;
mod reports;
mod settings;
mod state;
mod store;
mod tui;
mod validation;

use std::path::Path;
use std::sync::Mutex;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ExpensesCommands, RecordsCommands};
use settings::{load_settings, resolve_data_dir};

/// Send logs to `<data_dir>/caetano.log`. Skipped when the directory does not
/// exist yet or the file cannot be opened.
fn init_logging(data_dir: &Path, level: &str) {
    if !data_dir.is_dir() {
        return;
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("caetano.log"))
    else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let settings = load_settings();
    let data_dir = resolve_data_dir(cli.data_dir.as_deref());

    if !matches!(cli.command, Some(Commands::Completions { .. })) {
        init_logging(&data_dir, &settings.log_level);
    }

    let result = match cli.command {
        None => std::fs::create_dir_all(&data_dir)
            .map_err(error::CaetanoError::from)
            .and_then(|_| cli::dashboard::run(&data_dir, &settings.farm_name)),
        Some(Commands::Init) => cli::init::run(&data_dir),
        Some(Commands::Records { command }) => match command {
            RecordsCommands::List { year, month } => cli::records::list(&data_dir, year, month),
            RecordsCommands::Finalize { number } => cli::records::finalize(&data_dir, number),
            RecordsCommands::Delete { number } => cli::records::delete(&data_dir, number),
        },
        Some(Commands::Expenses { command }) => match command {
            ExpensesCommands::List { year, month } => cli::expenses::list(&data_dir, year, month),
            ExpensesCommands::Add {
                description,
                amount,
                category,
                date,
            } => cli::expenses::add(&data_dir, &description, &amount, &category, date.as_deref()),
            ExpensesCommands::Delete { number } => cli::expenses::delete(&data_dir, number),
        },
        Some(Commands::Export { format, output }) => cli::export::run(&data_dir, &format, output),
        Some(Commands::Charts { year, month }) => cli::charts::run(&data_dir, year, month),
        Some(Commands::Status) => cli::status::run(&data_dir),
        Some(Commands::Load { path }) => cli::load::run(&path),
        Some(Commands::Backup { output }) => cli::backup::run(&data_dir, output),
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "caetano", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
