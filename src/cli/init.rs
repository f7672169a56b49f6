use std::path::Path;

use crate::error::Result;
use crate::settings::{load_settings, save_settings};
use crate::store::Stores;

/// Create the data directory with empty stores (existing stores are left
/// alone) and make it the configured one.
pub fn run(data_dir: &Path) -> Result<()> {
    let data_dir = std::path::absolute(data_dir)?;
    let data_dir = data_dir.as_path();
    std::fs::create_dir_all(data_dir)?;
    std::fs::create_dir_all(data_dir.join("exports"))?;

    let stores = Stores::in_dir(data_dir);
    if !stores.records.path().exists() {
        stores.records.save(&[])?;
    }
    if !stores.expenses.path().exists() {
        stores.expenses.save(&[])?;
    }

    let mut settings = load_settings();
    settings.data_dir = data_dir.to_string_lossy().to_string();
    save_settings(&settings)?;

    println!("Data directory: {}", data_dir.display());
    println!("Records:        {}", stores.records.path().display());
    println!("Expenses:       {}", stores.expenses.path().display());
    Ok(())
}
