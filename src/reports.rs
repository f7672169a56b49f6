use std::collections::BTreeMap;

use crate::fmt::{decimal, hectares, money};
use crate::models::{Expense, Month, Operation, OperationRecord, MONTHS};

pub const NO_EXPORT_RECORDS: &str = "Nenhum registro para exportação";
pub const NO_EXPENSES_IN_PERIOD: &str = "Nenhum gasto registrado para o mês e ano selecionados.";
pub const NO_RECORDS_IN_PERIOD: &str = "Nenhum registro de operação para o mês e ano selecionados.";

const NOT_AVAILABLE: &str = "N/A";

// ---------------------------------------------------------------------------
// Period grouping
// ---------------------------------------------------------------------------

/// Distinct record years, newest first.
pub fn record_years(records: &[OperationRecord]) -> Vec<i32> {
    let mut years: Vec<i32> = records.iter().map(|r| r.ano).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// Distinct expense years, newest first.
pub fn expense_years(expenses: &[Expense]) -> Vec<i32> {
    let mut years: Vec<i32> = expenses.iter().map(Expense::year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// Months of `year` that have at least one expense, in calendar order.
pub fn expense_months(expenses: &[Expense], year: i32) -> Vec<Month> {
    MONTHS
        .iter()
        .copied()
        .filter(|m| expenses.iter().any(|e| e.year() == year && e.month() == *m))
        .collect()
}

/// Year choices for the charts: union of both stores, newest first. Falls
/// back to `current_year` when both are empty.
pub fn chart_years(records: &[OperationRecord], expenses: &[Expense], current_year: i32) -> Vec<i32> {
    let mut years = record_years(records);
    years.extend(expense_years(expenses));
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    if years.is_empty() {
        years.push(current_year);
    }
    years
}

/// Records of one period, paired with their position in the full list.
pub fn records_in_period(
    records: &[OperationRecord],
    year: i32,
    month: Month,
) -> Vec<(usize, &OperationRecord)> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.ano == year && r.mes == month)
        .collect()
}

/// Expenses of one period, paired with their position in the full list.
pub fn expenses_in_period(expenses: &[Expense], year: i32, month: Month) -> Vec<(usize, &Expense)> {
    expenses
        .iter()
        .enumerate()
        .filter(|(_, e)| e.year() == year && e.month() == month)
        .collect()
}

/// All twelve months of `year` with the records filed under each.
pub fn records_by_month(
    records: &[OperationRecord],
    year: i32,
) -> Vec<(Month, Vec<(usize, &OperationRecord)>)> {
    MONTHS
        .iter()
        .map(|m| (*m, records_in_period(records, year, *m)))
        .collect()
}

// ---------------------------------------------------------------------------
// Pie summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieChart {
    pub title: String,
    pub slices: Vec<PieSlice>,
    /// Grand total as overlaid on the chart (`R$ 120.00`, `30.00 ha`).
    pub total_label: String,
    pub total: f64,
}

/// A chart, or the message shown instead when the period is empty.
#[derive(Debug, Clone, PartialEq)]
pub enum PieSummary {
    Chart(PieChart),
    Empty(&'static str),
}

fn slices_from(totals: BTreeMap<String, f64>) -> (Vec<PieSlice>, f64) {
    let total = totals.values().sum();
    let slices = totals
        .into_iter()
        .map(|(label, value)| PieSlice { label, value })
        .collect();
    (slices, total)
}

/// Expenses of the period summed by category.
pub fn expense_pie(expenses: &[Expense], year: i32, month: Month) -> PieSummary {
    let filtered = expenses_in_period(expenses, year, month);
    if filtered.is_empty() {
        return PieSummary::Empty(NO_EXPENSES_IN_PERIOD);
    }
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (_, e) in filtered {
        *totals.entry(e.categoria.label().to_string()).or_default() += e.valor;
    }
    let (slices, total) = slices_from(totals);
    PieSummary::Chart(PieChart {
        title: format!("Gastos Mensais em {month}/{year}"),
        slices,
        total_label: money(total),
        total,
    })
}

/// Hectares of the period summed by operation type. Untyped placeholder
/// records carry no hectares and are left out.
pub fn hectare_pie(records: &[OperationRecord], year: i32, month: Month) -> PieSummary {
    let filtered: Vec<&OperationRecord> = records_in_period(records, year, month)
        .into_iter()
        .map(|(_, r)| r)
        .filter(|r| r.operation_type().is_some())
        .collect();
    if filtered.is_empty() {
        return PieSummary::Empty(NO_RECORDS_IN_PERIOD);
    }
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for r in filtered {
        *totals.entry(r.type_label().to_string()).or_default() += r.hectares().unwrap_or(0.0);
    }
    let (slices, total) = slices_from(totals);
    PieSummary::Chart(PieChart {
        title: format!("Hectares Realizados em {month}/{year}"),
        slices,
        total_label: hectares(total),
        total,
    })
}

// ---------------------------------------------------------------------------
// Export table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Number(f64),
    /// Column not present for this row's variant.
    Empty,
}

impl Cell {
    fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    fn opt_number(v: Option<f64>) -> Self {
        v.map(Cell::Number).unwrap_or_else(|| Cell::text(NOT_AVAILABLE))
    }

    /// Text form used by CSV output and the terminal preview.
    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Integer(n) => n.to_string(),
            Cell::Number(n) => decimal(*n),
            Cell::Empty => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ExportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn ground_row(record: &OperationRecord) -> Option<Vec<(&'static str, Cell)>> {
    let Operation::Ground(op) = &record.operation else {
        return None;
    };
    // One product per row; extra products are dropped
    let first = op.produtos.first();
    Some(vec![
        ("Mês", Cell::text(record.mes.name())),
        ("Ano", Cell::Integer(record.ano.into())),
        ("Tipo de Operação", Cell::text(record.type_label())),
        ("Fazenda", Cell::text(&op.nome_fazenda)),
        ("Talhão", Cell::text(&op.talhao_aplicado)),
        ("Hectares", Cell::opt_number(op.hectares_totais)),
        ("Cultura", Cell::text(&op.cultura)),
        ("Trator", Cell::text(&op.trator)),
        ("Implemento", Cell::text(&op.implemento)),
        (
            "Produto",
            Cell::text(first.map(|p| p.nome_produto.as_str()).unwrap_or(NOT_AVAILABLE)),
        ),
        ("Dose", Cell::opt_number(first.map(|p| p.dose))),
        ("Observação", Cell::text(&op.observacao)),
        ("Responsável", Cell::text(&op.responsavel)),
        ("Status", Cell::text(op.status.label())),
    ])
}

fn aerial_row(record: &OperationRecord) -> Option<Vec<(&'static str, Cell)>> {
    let Operation::Aerial(op) = &record.operation else {
        return None;
    };
    let products: String = op
        .produtos
        .iter()
        .map(|p| {
            let dose = p.dose_por_hectare.map(decimal).unwrap_or_else(|| NOT_AVAILABLE.into());
            let total = p
                .dose_total
                .map(|t| format!("{t:.2}"))
                .unwrap_or_else(|| NOT_AVAILABLE.into());
            format!("{}: {dose} (Dose total: {total}); ", p.nome)
        })
        .collect();
    Some(vec![
        ("Mês", Cell::text(record.mes.name())),
        ("Ano", Cell::Integer(record.ano.into())),
        ("Tipo de Operação", Cell::text(record.type_label())),
        ("Fazenda", Cell::text(&op.nome_fazenda)),
        ("Talhão", Cell::text(&op.talhao_aplicado)),
        ("Hectares", Cell::opt_number(op.hectares_totais)),
        ("Cultura", Cell::text(&op.cultura)),
        ("Velocidade", Cell::Number(op.velocidade)),
        ("Altura", Cell::Number(op.altura)),
        ("Produtos", Cell::Text(products)),
        ("Aeronave", Cell::text(&op.aeronave)),
        ("Responsável", Cell::text(&op.responsavel)),
        ("Status", Cell::text(op.status.label())),
    ])
}

/// Flatten records into one table. Columns are the union of every row's
/// columns in first-seen order; a row missing a column gets an empty cell.
pub fn operations_table(records: &[OperationRecord]) -> ExportTable {
    let flat: Vec<Vec<(&'static str, Cell)>> = records
        .iter()
        .filter_map(|r| ground_row(r).or_else(|| aerial_row(r)))
        .collect();

    let mut columns: Vec<String> = Vec::new();
    for row in &flat {
        for (name, _) in row {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }

    let rows = flat
        .into_iter()
        .map(|row| {
            let mut by_name: BTreeMap<&str, Cell> = row.into_iter().collect();
            columns
                .iter()
                .map(|c| by_name.remove(c.as_str()).unwrap_or(Cell::Empty))
                .collect()
        })
        .collect();

    ExportTable { columns, rows }
}
