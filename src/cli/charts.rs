use std::path::Path;

use chrono::Datelike;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::parse_month_arg;
use crate::error::Result;
use crate::models::Month;
use crate::reports::{chart_years, expense_pie, hectare_pie, PieSummary};
use crate::store::Stores;

fn print_summary(summary: &PieSummary, format_value: fn(f64) -> String) {
    match summary {
        PieSummary::Empty(msg) => println!("{}", msg.yellow()),
        PieSummary::Chart(chart) => {
            let mut table = Table::new();
            table.set_header(vec!["", "Total", "%"]);
            for slice in &chart.slices {
                let pct = if chart.total > 0.0 {
                    slice.value / chart.total * 100.0
                } else {
                    0.0
                };
                table.add_row(vec![
                    Cell::new(&slice.label),
                    Cell::new(format_value(slice.value)).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{pct:.1}%")).set_alignment(CellAlignment::Right),
                ]);
            }
            table.add_row(vec![
                Cell::new("Total".bold()),
                Cell::new(&chart.total_label).set_alignment(CellAlignment::Right),
                Cell::new(""),
            ]);
            println!("{}\n{table}", chart.title.bold());
        }
    }
}

pub fn run(data_dir: &Path, year: Option<i32>, month: Option<String>) -> Result<()> {
    let stores = Stores::in_dir(data_dir);
    let records = stores.records.load();
    let expenses = stores.expenses.load();
    let now = chrono::Local::now();

    let year = match year {
        Some(y) => y,
        None => chart_years(&records, &expenses, now.year())
            .first()
            .copied()
            .unwrap_or(now.year()),
    };
    let month = match month {
        Some(m) => parse_month_arg(&m)?,
        None => Month::of_date(now.date_naive()),
    };

    print_summary(&expense_pie(&expenses, year, month), crate::fmt::money);
    println!();
    print_summary(&hectare_pie(&records, year, month), crate::fmt::hectares);
    Ok(())
}
