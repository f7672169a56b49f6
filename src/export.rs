use std::io::Write;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook};

use crate::error::{CaetanoError, Result};
use crate::models::OperationRecord;
use crate::reports::{operations_table, Cell, ExportTable, NO_EXPORT_RECORDS};

pub const STAGING_XLSX: &str = "operacoes_exportadas.xlsx";
pub const DEFAULT_CSV: &str = "operacoes_exportadas.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => STAGING_XLSX,
            ExportFormat::Csv => DEFAULT_CSV,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    File(PathBuf),
    Stdout,
}

impl Destination {
    /// `-` means stdout; no value means `<data_dir>/exports/<file name>`.
    pub fn resolve(output: Option<&str>, data_dir: &Path, format: ExportFormat) -> Self {
        match output {
            Some("-") => Destination::Stdout,
            Some(path) => Destination::File(PathBuf::from(path)),
            None => Destination::File(data_dir.join("exports").join(format.file_name())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Nothing to export; carries the message to show.
    Empty(&'static str),
    Written { target: String, rows: usize },
}

/// A file that only lives while the export is delivered.
pub struct StagedExport {
    path: PathBuf,
}

impl StagedExport {
    pub fn new(dir: &Path, file_name: &str) -> Self {
        Self {
            path: dir.join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }
}

impl Drop for StagedExport {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "could not remove staging file: {e}");
            }
        }
    }
}

pub fn write_xlsx(table: &ExportTable, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let header = Format::new().set_bold();

    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header)?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        let r = (i + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                Cell::Integer(n) => {
                    worksheet.write_number(r, c, *n as f64)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                Cell::Empty => {}
            }
        }
    }
    worksheet.autofit();
    workbook.save(path)?;
    Ok(())
}

pub fn csv_bytes(table: &ExportTable) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(Cell::display))?;
    }
    wtr.into_inner()
        .map_err(|e| CaetanoError::Other(format!("CSV error: {e}")))
}

/// Render the table in `format`. Excel goes through a staging file in
/// `staging_dir` that is removed before returning, even on failure.
pub fn render(table: &ExportTable, format: ExportFormat, staging_dir: &Path) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => csv_bytes(table),
        ExportFormat::Xlsx => {
            std::fs::create_dir_all(staging_dir)?;
            let staged = StagedExport::new(staging_dir, STAGING_XLSX);
            write_xlsx(table, staged.path())?;
            staged.read()
        }
    }
}

pub fn deliver(bytes: &[u8], dest: &Destination) -> Result<String> {
    match dest {
        Destination::Stdout => {
            let mut out = std::io::stdout().lock();
            out.write_all(bytes)?;
            out.flush()?;
            Ok("stdout".to_string())
        }
        Destination::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, bytes)?;
            Ok(path.display().to_string())
        }
    }
}

/// Flatten, render and deliver the records.
pub fn export_records(
    records: &[OperationRecord],
    format: ExportFormat,
    staging_dir: &Path,
    dest: &Destination,
) -> Result<ExportOutcome> {
    let table = operations_table(records);
    if table.is_empty() {
        return Ok(ExportOutcome::Empty(NO_EXPORT_RECORDS));
    }
    let bytes = render(&table, format, staging_dir)?;
    let target = deliver(&bytes, dest)?;
    tracing::info!(rows = table.rows.len(), %target, ?format, "operations exported");
    Ok(ExportOutcome::Written {
        target,
        rows: table.rows.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AerialOperation, AerialProduct, GroundOperation, Month, Operation};
    use calamine::{open_workbook, Data, Reader, Xlsx};

    fn records() -> Vec<OperationRecord> {
        vec![
            OperationRecord {
                mes: Month::Abril,
                ano: 2024,
                operation: Operation::Ground(GroundOperation {
                    nome_fazenda: "Boa Vista".into(),
                    hectares_totais: Some(30.0),
                    ..GroundOperation::default()
                }),
            },
            OperationRecord {
                mes: Month::Marco,
                ano: 2024,
                operation: Operation::Aerial(AerialOperation {
                    nome_fazenda: "Santa Rita".into(),
                    hectares_totais: Some(10.0),
                    produtos: vec![AerialProduct {
                        nome: "X".into(),
                        dose_por_hectare: Some(2.0),
                        dose_total: Some(20.0),
                    }],
                    ..AerialOperation::default()
                }),
            },
        ]
    }

    #[test]
    fn test_empty_store_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = Destination::File(dir.path().join("out.xlsx"));
        let outcome = export_records(&[], ExportFormat::Xlsx, dir.path(), &dest).unwrap();
        assert_eq!(outcome, ExportOutcome::Empty("Nenhum registro para exportação"));
        assert!(!dir.path().join("out.xlsx").exists());
    }

    #[test]
    fn test_xlsx_export_readable_and_staging_removed() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports").join(STAGING_XLSX);
        let dest = Destination::File(out.clone());
        let outcome = export_records(&records(), ExportFormat::Xlsx, dir.path(), &dest).unwrap();
        assert!(matches!(outcome, ExportOutcome::Written { rows: 2, .. }));
        assert!(!dir.path().join(STAGING_XLSX).exists());

        let mut workbook: Xlsx<_> = open_workbook(&out).unwrap();
        let range = workbook.worksheet_range("Sheet1").unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("Mês".into())));
        assert_eq!(range.get_value((1, 3)), Some(&Data::String("Boa Vista".into())));
        assert_eq!(range.get_value((1, 1)), Some(&Data::Float(2024.0)));
        assert_eq!(range.get_value((2, 0)), Some(&Data::String("Março".into())));
    }

    #[test]
    fn test_staging_removed_when_delivery_fails() {
        let dir = tempfile::tempdir().unwrap();
        // Parent is a file, so the destination directory cannot be created
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let dest = Destination::File(blocker.join("out.xlsx"));
        assert!(export_records(&records(), ExportFormat::Xlsx, dir.path(), &dest).is_err());
        assert!(!dir.path().join(STAGING_XLSX).exists());
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ops.csv");
        export_records(&records(), ExportFormat::Csv, dir.path(), &Destination::File(out.clone()))
            .unwrap();
        let content = std::fs::read_to_string(&out).unwrap();
        let mut lines = content.lines();
        assert!(lines.next().unwrap().starts_with("Mês,Ano,Tipo de Operação,Fazenda"));
        assert!(lines.next().unwrap().starts_with("Abril,2024,Operação Terrestre,Boa Vista,,30.0"));
        assert!(content.contains("X: 2.0 (Dose total: 20.00); "));
    }

    #[test]
    fn test_destination_resolution() {
        let data = Path::new("/data");
        assert_eq!(
            Destination::resolve(None, data, ExportFormat::Xlsx),
            Destination::File(PathBuf::from("/data/exports/operacoes_exportadas.xlsx"))
        );
        assert_eq!(Destination::resolve(Some("-"), data, ExportFormat::Csv), Destination::Stdout);
        assert_eq!(ExportFormat::parse("XLSX"), Some(ExportFormat::Xlsx));
        assert_eq!(ExportFormat::parse("pdf"), None);
    }
}
