use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::parse_month_arg;
use crate::controller::{apply, Action, Notice};
use crate::error::{CaetanoError, Result};
use crate::fmt::decimal;
use crate::models::{Operation, OperationRecord};
use crate::state::AppState;
use crate::store::Stores;

fn products_summary(record: &OperationRecord) -> String {
    match &record.operation {
        Operation::Aerial(op) => op
            .produtos
            .iter()
            .map(|p| match p.dose_por_hectare {
                Some(d) => format!("{} ({}/ha)", p.nome, decimal(d)),
                None => p.nome.clone(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        Operation::Ground(op) => op
            .produtos
            .iter()
            .map(|p| format!("{} ({})", p.nome_produto, decimal(p.dose)))
            .collect::<Vec<_>>()
            .join(", "),
        Operation::Unspecified(_) => String::new(),
    }
}

pub fn list(data_dir: &Path, year: Option<i32>, month: Option<String>) -> Result<()> {
    let month = month.as_deref().map(parse_month_arg).transpose()?;
    let records = Stores::in_dir(data_dir).records.load();

    let mut table = Table::new();
    table.set_header(vec![
        "#", "Mês", "Ano", "Operação", "Fazenda", "Talhão", "Hectares", "Produtos", "Status",
    ]);
    let mut shown = 0;
    for (i, record) in records.iter().enumerate() {
        if year.is_some_and(|y| record.ano != y) || month.is_some_and(|m| record.mes != m) {
            continue;
        }
        shown += 1;
        let op_type = if record.type_label().is_empty() {
            "(sem tipo)".to_string()
        } else {
            record.type_label().to_string()
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(record.mes.name()),
            Cell::new(record.ano),
            Cell::new(op_type),
            Cell::new(record.farm()),
            Cell::new(record.plot()),
            Cell::new(record.hectares().map(decimal).unwrap_or_default()),
            Cell::new(textwrap::fill(&products_summary(record), 40)),
            Cell::new(record.status().map(|s| s.label()).unwrap_or("")),
        ]);
    }

    if shown == 0 {
        println!("Nenhum registro encontrado.");
        return Ok(());
    }
    println!("Registros de operações\n{table}");
    Ok(())
}

/// Run a controller action against the record at 1-based `number`.
fn act_on(data_dir: &Path, number: usize, make: fn(usize, OperationRecord) -> Action) -> Result<()> {
    let stores = Stores::in_dir(data_dir);
    let records = stores.records.load();
    let index = number
        .checked_sub(1)
        .filter(|i| *i < records.len())
        .ok_or_else(|| CaetanoError::NotFound(format!("registro #{number}")))?;
    let action = make(index, records[index].clone());
    report(apply(AppState::default(), action, &stores).notice)
}

pub(crate) fn report(notice: Option<Notice>) -> Result<()> {
    match notice {
        Some(Notice::Success(msg)) => println!("{}", msg.green()),
        Some(Notice::Info(msg)) => println!("{}", msg.yellow()),
        Some(Notice::Error(msg)) => return Err(CaetanoError::Other(msg)),
        None => {}
    }
    Ok(())
}

pub fn finalize(data_dir: &Path, number: usize) -> Result<()> {
    act_on(data_dir, number, |index, record| Action::FinalizeRecord { index, record })
}

pub fn delete(data_dir: &Path, number: usize) -> Result<()> {
    act_on(data_dir, number, |index, record| Action::DeleteRecord { index, record })
}
