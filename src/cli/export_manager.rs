use std::path::{Path, PathBuf};

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Paragraph, Row, Table},
    Frame,
};

use crate::cli::dashboard::PageEvent;
use crate::controller::Notice;
use crate::export::{export_records, Destination, ExportFormat, ExportOutcome};
use crate::models::OperationRecord;
use crate::reports::{operations_table, ExportTable, NO_EXPORT_RECORDS};
use crate::store::Stores;
use crate::tui::{title_lines, BORDER_STYLE, WARN_STYLE};

/// "Exportar Excel": preview of the flattened table, and export to the
/// exports directory.
pub struct ExportPage {
    data_dir: PathBuf,
    records: Vec<OperationRecord>,
    table: ExportTable,
    scroll: usize,
}

impl ExportPage {
    pub fn new(stores: &Stores, data_dir: &Path) -> Self {
        let mut page = Self {
            data_dir: data_dir.to_path_buf(),
            records: Vec::new(),
            table: ExportTable::default(),
            scroll: 0,
        };
        page.reload(stores);
        page
    }

    pub fn reload(&mut self, stores: &Stores) {
        self.records = stores.records.load();
        self.table = operations_table(&self.records);
        self.scroll = self.scroll.min(self.table.rows.len().saturating_sub(1));
    }

    pub fn hints(&self) -> &'static str {
        " x=exportar Excel  c=exportar CSV  ↑↓=rolar"
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let [title_area, table_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(area);
        frame.render_widget(Paragraph::new(title_lines("Exportar Excel")), title_area);

        if self.table.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::styled(format!("   {NO_EXPORT_RECORDS}"), WARN_STYLE)),
                table_area,
            );
            return;
        }

        let header = Row::new(self.table.columns.clone())
            .style(Style::default().add_modifier(Modifier::BOLD))
            .bottom_margin(0);
        let rows: Vec<Row> = self
            .table
            .rows
            .iter()
            .skip(self.scroll)
            .map(|row| Row::new(row.iter().map(|c| c.display()).collect::<Vec<_>>()))
            .collect();
        let widths: Vec<Constraint> = self
            .table
            .columns
            .iter()
            .map(|c| Constraint::Min(c.chars().count().max(6) as u16))
            .collect();
        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2);

        let [body, footer] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(table_area);
        frame.render_widget(table, body);
        frame.render_widget(
            Paragraph::new(Line::styled(
                format!(
                    "   {} operações · {} colunas",
                    self.table.rows.len(),
                    self.table.columns.len()
                ),
                BORDER_STYLE,
            )),
            footer,
        );
    }

    fn export(&self, format: ExportFormat) -> Notice {
        let dest = Destination::resolve(None, &self.data_dir, format);
        match export_records(&self.records, format, &self.data_dir, &dest) {
            Ok(ExportOutcome::Empty(msg)) => Notice::Info(msg.to_string()),
            Ok(ExportOutcome::Written { target, rows }) => {
                Notice::Success(format!("{rows} operações exportadas para {target}"))
            }
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                Notice::Error(format!("Erro ao exportar: {e}"))
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> PageEvent {
        match code {
            KeyCode::Char('x') => return PageEvent::Notify(self.export(ExportFormat::Xlsx)),
            KeyCode::Char('c') => return PageEvent::Notify(self.export(ExportFormat::Csv)),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down => {
                if self.scroll + 1 < self.table.rows.len() {
                    self.scroll += 1;
                }
            }
            _ => {}
        }
        PageEvent::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::STAGING_XLSX;
    use crate::models::{GroundOperation, Month, Operation};

    #[test]
    fn test_export_empty_store_is_info() {
        let dir = tempfile::tempdir().unwrap();
        let stores = Stores::in_dir(dir.path());
        let mut page = ExportPage::new(&stores, dir.path());
        let PageEvent::Notify(notice) = page.handle_key(KeyCode::Char('x')) else {
            panic!("expected notice");
        };
        assert_eq!(notice, Notice::Info(NO_EXPORT_RECORDS.to_string()));
    }

    #[test]
    fn test_export_writes_into_exports_dir() {
        let dir = tempfile::tempdir().unwrap();
        let stores = Stores::in_dir(dir.path());
        stores
            .records
            .save(&[OperationRecord {
                mes: Month::Maio,
                ano: 2024,
                operation: Operation::Ground(GroundOperation::default()),
            }])
            .unwrap();
        let mut page = ExportPage::new(&stores, dir.path());
        assert_eq!(page.table.rows.len(), 1);

        let PageEvent::Notify(notice) = page.handle_key(KeyCode::Char('x')) else {
            panic!("expected notice");
        };
        assert!(matches!(notice, Notice::Success(_)));
        assert!(dir.path().join("exports").join(STAGING_XLSX).exists());
    }
}
