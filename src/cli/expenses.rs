use std::path::Path;

use chrono::NaiveDate;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::parse_month_arg;
use crate::cli::records::report;
use crate::controller::{apply, Action};
use crate::error::{CaetanoError, Result};
use crate::fmt::{money, parse_decimal};
use crate::models::{Expense, ExpenseCategory};
use crate::state::AppState;
use crate::store::Stores;

pub fn list(data_dir: &Path, year: Option<i32>, month: Option<String>) -> Result<()> {
    let month = month.as_deref().map(parse_month_arg).transpose()?;
    let expenses = Stores::in_dir(data_dir).expenses.load();

    let mut table = Table::new();
    table.set_header(vec!["#", "Data", "Descrição", "Categoria", "Valor"]);
    let mut total = 0.0;
    let mut shown = 0;
    for (i, e) in expenses.iter().enumerate() {
        if year.is_some_and(|y| e.year() != y) || month.is_some_and(|m| e.month() != m) {
            continue;
        }
        shown += 1;
        total += e.valor;
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(e.data.format("%Y-%m-%d")),
            Cell::new(&e.descricao),
            Cell::new(e.categoria.label()),
            Cell::new(money(e.valor)).set_alignment(CellAlignment::Right),
        ]);
    }

    if shown == 0 {
        println!("Nenhum gasto registrado.");
        return Ok(());
    }
    table.add_row(vec![
        Cell::new(""),
        Cell::new(""),
        Cell::new("Total"),
        Cell::new(""),
        Cell::new(money(total)).set_alignment(CellAlignment::Right),
    ]);
    println!("Gastos\n{table}");
    Ok(())
}

pub fn add(
    data_dir: &Path,
    description: &str,
    amount: &str,
    category: &str,
    date: Option<&str>,
) -> Result<()> {
    let valor = parse_decimal(amount)
        .filter(|v| *v >= 0.0)
        .ok_or_else(|| CaetanoError::Other(format!("Valor inválido: {amount}")))?;
    let categoria = ExpenseCategory::from_label(category)
        .ok_or_else(|| CaetanoError::Other(format!("Categoria inválida: {category}")))?;
    let data = match date {
        Some(d) => NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
            .map_err(|_| CaetanoError::Other(format!("Data inválida (use AAAA-MM-DD): {d}")))?,
        None => chrono::Local::now().date_naive(),
    };
    let expense = Expense {
        descricao: description.trim().to_string(),
        valor,
        categoria,
        data,
    };
    let stores = Stores::in_dir(data_dir);
    report(apply(AppState::default(), Action::SubmitExpense(expense), &stores).notice)
}

pub fn delete(data_dir: &Path, number: usize) -> Result<()> {
    let stores = Stores::in_dir(data_dir);
    let expenses = stores.expenses.load();
    let index = number
        .checked_sub(1)
        .filter(|i| *i < expenses.len())
        .ok_or_else(|| CaetanoError::NotFound(format!("gasto #{number}")))?;
    let action = Action::DeleteExpense {
        index,
        expense: expenses[index].clone(),
    };
    report(apply(AppState::default(), action, &stores).notice)
}
