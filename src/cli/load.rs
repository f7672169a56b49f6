use std::path::PathBuf;

use crate::error::{CaetanoError, Result};
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store::{EXPENSES_FILE, RECORDS_FILE};

pub fn run(path: &str) -> Result<()> {
    let resolved = PathBuf::from(shellexpand_path(path));

    if !resolved.join(RECORDS_FILE).exists() && !resolved.join(EXPENSES_FILE).exists() {
        return Err(CaetanoError::Settings(format!(
            "No {RECORDS_FILE} or {EXPENSES_FILE} found in {}\nRun `caetano init --data-dir {}` to create them.",
            resolved.display(),
            resolved.display()
        )));
    }

    let mut settings = load_settings();
    settings.data_dir = resolved.to_string_lossy().to_string();
    save_settings(&settings)?;

    println!("Switched to {}", resolved.display());
    Ok(())
}
