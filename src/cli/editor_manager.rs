use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::cli::dashboard::PageEvent;
use crate::controller::{Action, Notice};
use crate::fmt::decimal;
use crate::models::{Operation, OperationRecord};
use crate::reports::{record_years, records_by_month};
use crate::store::Stores;
use crate::tui::{scroll_for, title_lines, wrap_text, FOOTER_STYLE, SELECTED_STYLE, WARN_STYLE};

const NOT_AVAILABLE: &str = "N/A";

enum Mode {
    Browse,
    ConfirmDelete,
}

/// "Editor operacional": records of one year, month by month, with edit,
/// finalize and delete.
pub struct EditorPage {
    records: Vec<OperationRecord>,
    years: Vec<i32>,
    year_idx: usize,
    /// Position in the full list of each record shown for the selected year.
    visible: Vec<usize>,
    selection: usize,
    mode: Mode,
}

impl EditorPage {
    pub fn new(stores: &Stores) -> Self {
        let mut page = Self {
            records: Vec::new(),
            years: Vec::new(),
            year_idx: 0,
            visible: Vec::new(),
            selection: 0,
            mode: Mode::Browse,
        };
        page.reload(stores);
        page
    }

    /// Re-read the store, keeping the selected year and cursor when possible.
    pub fn reload(&mut self, stores: &Stores) {
        let current_year = self.selected_year();
        self.records = stores.records.load();
        self.years = record_years(&self.records);
        self.year_idx = current_year
            .and_then(|y| self.years.iter().position(|v| *v == y))
            .unwrap_or(0);
        self.mode = Mode::Browse;
        self.rebuild_visible();
    }

    fn selected_year(&self) -> Option<i32> {
        self.years.get(self.year_idx).copied()
    }

    fn rebuild_visible(&mut self) {
        self.visible = match self.selected_year() {
            Some(year) => records_by_month(&self.records, year)
                .into_iter()
                .flat_map(|(_, entries)| entries.into_iter().map(|(i, _)| i))
                .collect(),
            None => Vec::new(),
        };
        self.selection = self.selection.min(self.visible.len().saturating_sub(1));
    }

    fn selected(&self) -> Option<(usize, &OperationRecord)> {
        let index = *self.visible.get(self.selection)?;
        self.records.get(index).map(|r| (index, r))
    }

    pub fn hints(&self) -> &'static str {
        match self.mode {
            Mode::ConfirmDelete => " y=confirmar  n=cancelar",
            Mode::Browse => " ←→=ano  ↑↓=registro  e=editar  f=finalizar  d=excluir",
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let mut lines = title_lines("Editor Operacional");

        let Some(year) = self.selected_year() else {
            lines.push(Line::from("   Nenhum registro encontrado."));
            frame.render_widget(Paragraph::new(lines), area);
            return;
        };

        // Year picker
        let mut picker = vec![Span::raw("   Ano: ")];
        for (i, y) in self.years.iter().enumerate() {
            let style = if i == self.year_idx {
                SELECTED_STYLE
            } else {
                FOOTER_STYLE
            };
            picker.push(Span::styled(format!(" {y} "), style));
            picker.push(Span::raw(" "));
        }
        lines.push(Line::from(picker));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" Registros de {year}"),
            Style::default().add_modifier(Modifier::BOLD),
        )));

        let width = area.width.saturating_sub(8) as usize;
        let mut focus_line = 0;
        let mut cursor = 0;
        for (month, entries) in records_by_month(&self.records, year) {
            lines.push(Line::from(""));
            if entries.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("   Nenhum registro para {month}/{year}."),
                    FOOTER_STYLE,
                )));
                continue;
            }
            lines.push(Line::from(Span::styled(
                format!("   Mês: {month}"),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            for (_, record) in entries {
                let is_selected = cursor == self.selection;
                if is_selected {
                    focus_line = lines.len();
                }
                let marker = if is_selected { " > " } else { "   " };
                let style = if is_selected {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                for (n, text) in detail_lines(record, width).into_iter().enumerate() {
                    let prefix = if n == 0 { marker } else { "   " };
                    lines.push(Line::from(Span::styled(format!("{prefix}  {text}"), style)));
                }
                if is_selected {
                    if let Mode::ConfirmDelete = self.mode {
                        lines.push(Line::from(Span::styled(
                            "     Excluir este registro? (y/n)",
                            WARN_STYLE,
                        )));
                    }
                }
                cursor += 1;
            }
        }

        let scroll = scroll_for(focus_line + 6, area.height);
        frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
    }

    pub fn handle_key(&mut self, code: KeyCode) -> PageEvent {
        match self.mode {
            Mode::ConfirmDelete => self.handle_confirm_key(code),
            Mode::Browse => self.handle_browse_key(code),
        }
    }

    fn handle_browse_key(&mut self, code: KeyCode) -> PageEvent {
        match code {
            KeyCode::Left => {
                self.year_idx = self.year_idx.saturating_sub(1);
                self.selection = 0;
                self.rebuild_visible();
            }
            KeyCode::Right => {
                if !self.years.is_empty() {
                    self.year_idx = (self.year_idx + 1).min(self.years.len() - 1);
                    self.selection = 0;
                    self.rebuild_visible();
                }
            }
            KeyCode::Up => self.selection = self.selection.saturating_sub(1),
            KeyCode::Down => {
                if !self.visible.is_empty() {
                    self.selection = (self.selection + 1).min(self.visible.len() - 1);
                }
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some((index, record)) = self.selected() {
                    return PageEvent::Dispatch(Action::StartEdit {
                        index,
                        record: record.clone(),
                    });
                }
            }
            KeyCode::Char('f') => {
                if let Some((index, record)) = self.selected() {
                    if record.can_finalize() {
                        return PageEvent::Dispatch(Action::FinalizeRecord {
                            index,
                            record: record.clone(),
                        });
                    }
                    return PageEvent::Notify(Notice::Info(
                        "Somente operações aéreas em aberto podem ser finalizadas.".into(),
                    ));
                }
            }
            KeyCode::Char('d') => {
                if self.selected().is_some() {
                    self.mode = Mode::ConfirmDelete;
                }
            }
            _ => {}
        }
        PageEvent::Continue
    }

    fn handle_confirm_key(&mut self, code: KeyCode) -> PageEvent {
        match code {
            KeyCode::Char('y') => {
                self.mode = Mode::Browse;
                if let Some((index, record)) = self.selected() {
                    return PageEvent::Dispatch(Action::DeleteRecord {
                        index,
                        record: record.clone(),
                    });
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => self.mode = Mode::Browse,
            _ => {}
        }
        PageEvent::Continue
    }
}

fn or_na(s: &str) -> &str {
    if s.is_empty() {
        NOT_AVAILABLE
    } else {
        s
    }
}

/// Summary lines for one record, as shown in the editor list.
fn detail_lines(record: &OperationRecord, width: usize) -> Vec<String> {
    let hectares = record
        .hectares()
        .map(decimal)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let mut lines = Vec::new();
    match &record.operation {
        Operation::Ground(op) => {
            lines.push(format!("Tipo de Operação: {}", record.type_label()));
            lines.push(format!(
                "Fazenda: {}, Talhão: {}",
                or_na(&op.nome_fazenda),
                or_na(&op.talhao_aplicado)
            ));
            lines.push(format!("Hectares: {hectares}, Cultura: {}", or_na(&op.cultura)));
            lines.push(format!(
                "Trator: {}, Implemento: {}",
                or_na(&op.trator),
                or_na(&op.implemento)
            ));
            lines.push("Produtos:".to_string());
            for p in &op.produtos {
                lines.push(format!("  - {}: Dose: {}", or_na(&p.nome_produto), decimal(p.dose)));
            }
            if !op.observacao.is_empty() {
                let (wrapped, _) = wrap_text(&format!("Observação: {}", op.observacao), width.max(20));
                lines.extend(wrapped.lines().map(str::to_string));
            }
            lines.push(format!("Responsável: {}", or_na(&op.responsavel)));
        }
        Operation::Aerial(op) => {
            lines.push(format!("Tipo de Operação: {}", record.type_label()));
            lines.push(format!(
                "Fazenda: {}, Talhão: {}, Status: {}",
                or_na(&op.nome_fazenda),
                or_na(&op.talhao_aplicado),
                op.status.label()
            ));
            lines.push(format!("Hectares: {hectares}, Cultura: {}", or_na(&op.cultura)));
            lines.push(format!(
                "Velocidade: {}, Altura: {}",
                decimal(op.velocidade),
                decimal(op.altura)
            ));
            lines.push("Produtos:".to_string());
            for p in &op.produtos {
                let dose = p.dose_por_hectare.map(decimal).unwrap_or_else(|| NOT_AVAILABLE.into());
                let total = p
                    .dose_total
                    .map(|t| format!("{t:.2}"))
                    .unwrap_or_else(|| NOT_AVAILABLE.into());
                lines.push(format!("  - {}: {dose} (Dose total: {total})", or_na(&p.nome)));
            }
            lines.push(format!("Aeronave: {}", or_na(&op.aeronave)));
            lines.push(format!("Responsável: {}", or_na(&op.responsavel)));
        }
        Operation::Unspecified(_) => {
            lines.push("Tipo de Operação: (sem tipo)".to_string());
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AerialOperation, GroundOperation, Month, Status};

    fn setup(records: &[OperationRecord]) -> (tempfile::TempDir, Stores) {
        let dir = tempfile::tempdir().unwrap();
        let stores = Stores::in_dir(dir.path());
        stores.records.save(records).unwrap();
        (dir, stores)
    }

    fn aerial(mes: Month, ano: i32) -> OperationRecord {
        OperationRecord {
            mes,
            ano,
            operation: Operation::Aerial(AerialOperation {
                hectares_totais: Some(4.0),
                ..AerialOperation::default()
            }),
        }
    }

    fn ground(mes: Month, ano: i32) -> OperationRecord {
        OperationRecord {
            mes,
            ano,
            operation: Operation::Ground(GroundOperation::default()),
        }
    }

    #[test]
    fn test_newest_year_first_and_month_order() {
        let (_dir, stores) = setup(&[
            aerial(Month::Junho, 2023),
            ground(Month::Maio, 2024),
            aerial(Month::Janeiro, 2024),
        ]);
        let page = EditorPage::new(&stores);
        assert_eq!(page.years, vec![2024, 2023]);
        // January first, then May
        assert_eq!(page.visible, vec![2, 1]);
    }

    #[test]
    fn test_actions_carry_full_list_position() {
        let (_dir, stores) = setup(&[aerial(Month::Junho, 2023), aerial(Month::Maio, 2024)]);
        let mut page = EditorPage::new(&stores);
        let PageEvent::Dispatch(Action::StartEdit { index, .. }) = page.handle_key(KeyCode::Char('e'))
        else {
            panic!("expected edit");
        };
        assert_eq!(index, 1);

        page.handle_key(KeyCode::Right);
        let PageEvent::Dispatch(Action::FinalizeRecord { index, .. }) = page.handle_key(KeyCode::Char('f'))
        else {
            panic!("expected finalize");
        };
        assert_eq!(index, 0);
    }

    #[test]
    fn test_finalize_ground_is_refused_locally() {
        let (_dir, stores) = setup(&[ground(Month::Maio, 2024)]);
        let mut page = EditorPage::new(&stores);
        assert!(matches!(
            page.handle_key(KeyCode::Char('f')),
            PageEvent::Notify(Notice::Info(_))
        ));
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let (_dir, stores) = setup(&[ground(Month::Maio, 2024)]);
        let mut page = EditorPage::new(&stores);
        assert!(matches!(page.handle_key(KeyCode::Char('d')), PageEvent::Continue));
        assert!(matches!(page.handle_key(KeyCode::Char('n')), PageEvent::Continue));
        page.handle_key(KeyCode::Char('d'));
        assert!(matches!(
            page.handle_key(KeyCode::Char('y')),
            PageEvent::Dispatch(Action::DeleteRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_detail_lines() {
        let mut record = aerial(Month::Maio, 2024);
        if let Operation::Aerial(op) = &mut record.operation {
            op.status = Status::Finished;
            op.nome_fazenda = "Santa Rita".into();
        }
        let lines = detail_lines(&record, 80);
        assert_eq!(lines[0], "Tipo de Operação: Operação Aérea");
        assert_eq!(lines[1], "Fazenda: Santa Rita, Talhão: N/A, Status: Finalizado");
        assert_eq!(lines[2], "Hectares: 4.0, Cultura: N/A");
    }
}
