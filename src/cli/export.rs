use std::path::Path;

use crate::error::{CaetanoError, Result};
use crate::export::{export_records, Destination, ExportFormat, ExportOutcome};
use crate::store::Stores;

pub fn run(data_dir: &Path, format: &str, output: Option<String>) -> Result<()> {
    let format = ExportFormat::parse(format)
        .ok_or_else(|| CaetanoError::Other(format!("Formato desconhecido: {format} (use xlsx ou csv)")))?;
    let dest = Destination::resolve(output.as_deref(), data_dir, format);
    let records = Stores::in_dir(data_dir).records.load();

    match export_records(&records, format, data_dir, &dest)? {
        ExportOutcome::Empty(msg) => eprintln!("{msg}"),
        ExportOutcome::Written { target, rows } => {
            // Keep stdout clean when the file itself goes there
            if dest != Destination::Stdout {
                println!("Wrote {rows} operations to {target}");
            }
        }
    }
    Ok(())
}
