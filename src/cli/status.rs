use std::path::Path;

use crate::error::Result;
use crate::fmt::{format_bytes, money};
use crate::models::Status;
use crate::settings::load_settings;
use crate::store::Stores;

pub fn run(data_dir: &Path) -> Result<()> {
    let settings = load_settings();
    let stores = Stores::in_dir(data_dir);

    println!("Farm:       {}", settings.farm_name);
    println!("Data dir:   {}", data_dir.display());

    for (label, path) in [
        ("Records:", stores.records.path()),
        ("Expenses:", stores.expenses.path()),
    ] {
        if path.exists() {
            let size = std::fs::metadata(path)?.len();
            println!("{label:<11} {} ({})", path.display(), format_bytes(size));
        } else {
            println!("{label:<11} {} (missing)", path.display());
        }
    }

    let records = stores.records.load();
    let expenses = stores.expenses.load();
    let aerial_open = records.iter().filter(|r| r.can_finalize()).count();
    let finished = records
        .iter()
        .filter(|r| r.status() == Some(Status::Finished))
        .count();
    let total_spent: f64 = expenses.iter().map(|e| e.valor).sum();

    println!();
    println!("Operations:        {}", records.len());
    println!("Open aerial:       {aerial_open}");
    println!("Finished:          {finished}");
    println!("Expenses:          {}", expenses.len());
    println!("Total spent:       {}", money(total_spent));

    if !stores.records.path().exists() && !stores.expenses.path().exists() {
        println!();
        println!("No stores found. Run `caetano init` to set up.");
    }
    Ok(())
}
