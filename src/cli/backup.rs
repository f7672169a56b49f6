use std::path::{Path, PathBuf};

use crate::error::{CaetanoError, Result};
use crate::fmt::format_bytes;
use crate::store::{EXPENSES_FILE, RECORDS_FILE};

/// Copy whichever stores exist into `<output>/caetano-YYYYMMDD-HHMMSS/`.
pub fn run(data_dir: &Path, output: Option<String>) -> Result<()> {
    let sources: Vec<PathBuf> = [RECORDS_FILE, EXPENSES_FILE]
        .iter()
        .map(|name| data_dir.join(name))
        .filter(|p| p.exists())
        .collect();
    if sources.is_empty() {
        return Err(CaetanoError::NotFound(format!(
            "no stores in {}",
            data_dir.display()
        )));
    }

    let base = output
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join("backups"));
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let dest_dir = base.join(format!("caetano-{stamp}"));
    std::fs::create_dir_all(&dest_dir)?;

    let mut total = 0;
    for src in &sources {
        if let Some(name) = src.file_name() {
            total += std::fs::copy(src, dest_dir.join(name))?;
        }
    }
    tracing::info!(dest = %dest_dir.display(), files = sources.len(), "backup written");

    println!("Backup saved to {}", dest_dir.display());
    println!("Size: {}", format_bytes(total));
    Ok(())
}
