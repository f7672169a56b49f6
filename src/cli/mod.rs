pub mod backup;
pub mod charts;
pub mod charts_manager;
pub mod dashboard;
pub mod editor_manager;
pub mod expenses;
pub mod export;
pub mod export_manager;
pub mod finance_manager;
pub mod init;
pub mod load;
pub mod records;
pub mod register_manager;
pub mod status;

use clap::{Parser, Subcommand};

use crate::error::{CaetanoError, Result};
use crate::models::Month;

/// Month from a command-line value: a number (`3`) or a name (`Março`).
pub(crate) fn parse_month_arg(value: &str) -> Result<Month> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(Month::from_number)
        .or_else(|| Month::from_name(value))
        .ok_or_else(|| CaetanoError::Other(format!("Mês inválido: {value}")))
}

#[derive(Parser)]
#[command(
    name = "caetano",
    version,
    about = "Registro de operações de pulverização e gastos da fazenda."
)]
pub struct Cli {
    /// Data directory for this run (overrides the configured one)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the data directory and empty stores, and remember it.
    Init,
    /// List, finalize or delete operation records.
    Records {
        #[command(subcommand)]
        command: RecordsCommands,
    },
    /// List, add or delete expenses.
    Expenses {
        #[command(subcommand)]
        command: ExpensesCommands,
    },
    /// Export every operation record to Excel (or CSV).
    Export {
        /// Output format: xlsx or csv
        #[arg(long, default_value = "xlsx")]
        format: String,
        /// Output path, or `-` for stdout (default: <data_dir>/exports/)
        #[arg(long)]
        output: Option<String>,
    },
    /// Monthly expense and hectare summaries.
    Charts {
        /// Year (default: newest year with data)
        #[arg(long)]
        year: Option<i32>,
        /// Month number or name (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Show the data directory and store statistics.
    Status,
    /// Switch to an existing data directory.
    Load {
        /// Path to a directory containing registros.json or gastos.json
        path: String,
    },
    /// Copy both stores into a timestamped backup.
    Backup {
        /// Output directory (default: <data_dir>/backups)
        #[arg(long)]
        output: Option<String>,
    },
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum RecordsCommands {
    /// List operation records.
    List {
        #[arg(long)]
        year: Option<i32>,
        /// Month number or name
        #[arg(long)]
        month: Option<String>,
    },
    /// Mark an open aerial operation as finished.
    Finalize {
        /// Record number (shown in `caetano records list`)
        number: usize,
    },
    /// Delete an operation record.
    Delete {
        /// Record number (shown in `caetano records list`)
        number: usize,
    },
}

#[derive(Subcommand)]
pub enum ExpensesCommands {
    /// List expenses.
    List {
        #[arg(long)]
        year: Option<i32>,
        /// Month number or name
        #[arg(long)]
        month: Option<String>,
    },
    /// Register an expense.
    Add {
        #[arg(long)]
        description: String,
        /// Amount, `.` or `,` as decimal separator
        #[arg(long)]
        amount: String,
        /// Produtos, Combustível, Manutenção or Outros
        #[arg(long)]
        category: String,
        /// Date: YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete an expense.
    Delete {
        /// Expense number (shown in `caetano expenses list`)
        number: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_month_arg() {
        assert_eq!(parse_month_arg("3").unwrap(), Month::Marco);
        assert_eq!(parse_month_arg("março").unwrap(), Month::Marco);
        assert_eq!(parse_month_arg("Dezembro").unwrap(), Month::Dezembro);
        assert!(parse_month_arg("13").is_err());
        assert!(parse_month_arg("Smarch").is_err());
    }
}
