use chrono::NaiveDate;
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::cli::dashboard::PageEvent;
use crate::controller::Action;
use crate::fmt::money;
use crate::form::{ExpenseForm, Form, FormEvent};
use crate::models::{Expense, Month};
use crate::reports::{expense_months, expense_years, expenses_in_period};
use crate::state::{AppState, FinanceTab};
use crate::store::Stores;
use crate::tui::{
    form_lines, scroll_for, title_lines, ERROR_STYLE, FOOTER_STYLE, SELECTED_STYLE, WARN_STYLE,
};
use crate::validation::FieldErrors;

enum EditMode {
    Browse,
    Editing { index: usize, original: Expense, form: ExpenseForm },
    ConfirmDelete,
}

/// "Financeiro": register an expense, or browse one month of expenses to
/// edit or delete them.
pub struct FinancePage {
    today: NaiveDate,
    new_form: ExpenseForm,
    new_errors: FieldErrors,
    expenses: Vec<Expense>,
    years: Vec<i32>,
    year_idx: usize,
    months: Vec<Month>,
    month_idx: usize,
    selection: usize,
    mode: EditMode,
    edit_errors: FieldErrors,
}

impl FinancePage {
    pub fn new(stores: &Stores, today: NaiveDate) -> Self {
        let mut page = Self {
            today,
            new_form: ExpenseForm::new(None, today),
            new_errors: FieldErrors::new(),
            expenses: Vec::new(),
            years: Vec::new(),
            year_idx: 0,
            months: Vec::new(),
            month_idx: 0,
            selection: 0,
            mode: EditMode::Browse,
            edit_errors: FieldErrors::new(),
        };
        page.reload(stores);
        page
    }

    /// Re-read expenses, keeping the picked year and month when they still
    /// have entries.
    pub fn reload(&mut self, stores: &Stores) {
        let year = self.selected_year();
        let month = self.selected_month();
        self.expenses = stores.expenses.load();
        self.years = expense_years(&self.expenses);
        self.year_idx = year
            .and_then(|y| self.years.iter().position(|v| *v == y))
            .unwrap_or(0);
        self.refresh_months(month);
        self.mode = EditMode::Browse;
        self.edit_errors.clear();
    }

    fn refresh_months(&mut self, keep: Option<Month>) {
        self.months = match self.selected_year() {
            Some(y) => expense_months(&self.expenses, y),
            None => Vec::new(),
        };
        self.month_idx = keep
            .and_then(|m| self.months.iter().position(|v| *v == m))
            .unwrap_or(0);
        let visible = self.visible().len();
        self.selection = self.selection.min(visible.saturating_sub(1));
    }

    fn selected_year(&self) -> Option<i32> {
        self.years.get(self.year_idx).copied()
    }

    fn selected_month(&self) -> Option<Month> {
        self.months.get(self.month_idx).copied()
    }

    /// Expenses of the picked month, with their position in the full list.
    fn visible(&self) -> Vec<(usize, &Expense)> {
        match (self.selected_year(), self.selected_month()) {
            (Some(y), Some(m)) => expenses_in_period(&self.expenses, y, m),
            _ => Vec::new(),
        }
    }

    fn selected(&self) -> Option<(usize, Expense)> {
        self.visible()
            .get(self.selection)
            .map(|(i, e)| (*i, (*e).clone()))
    }

    pub fn hints(&self, state: &AppState) -> &'static str {
        match state.finance_tab {
            FinanceTab::RegisterExpense => {
                " F6/F7=aba  Tab/↑↓=campo  ←→=categoria  Enter=registrar gasto  Esc=limpar"
            }
            FinanceTab::EditExpenses => match self.mode {
                EditMode::Browse => {
                    " F6/F7=aba  ←→=ano  [ ]=mês  ↑↓=gasto  e=editar  d=excluir"
                }
                EditMode::Editing { .. } => " Tab/↑↓=campo  Enter=salvar alterações  Esc=voltar",
                EditMode::ConfirmDelete => " y=confirmar  n=cancelar",
            },
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let mut lines = title_lines("Financeiro");
        let mut tabs = vec![Span::raw("   ")];
        for (key, tab) in [("F6", FinanceTab::RegisterExpense), ("F7", FinanceTab::EditExpenses)] {
            let style = if tab == state.finance_tab {
                SELECTED_STYLE
            } else {
                FOOTER_STYLE
            };
            tabs.push(Span::styled(format!(" {key} {} ", tab.label()), style));
            tabs.push(Span::raw("  "));
        }
        lines.push(Line::from(tabs));
        lines.push(Line::from(""));

        let focus = match state.finance_tab {
            FinanceTab::RegisterExpense => {
                lines.push(subheading("Registrar Novo Gasto"));
                let header = lines.len();
                let (form, focus) = form_lines(&self.new_form, &self.new_errors);
                lines.extend(form);
                push_errors(&mut lines, &self.new_errors);
                header + focus
            }
            FinanceTab::EditExpenses => {
                lines.push(subheading("Editar Registro de Gastos"));
                self.edit_lines(&mut lines)
            }
        };

        let scroll = scroll_for(focus, area.height);
        frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
    }

    /// Browse/edit view; returns the line to keep in sight.
    fn edit_lines(&self, lines: &mut Vec<Line<'static>>) -> usize {
        let (Some(year), Some(month)) = (self.selected_year(), self.selected_month()) else {
            lines.push(Line::from("   Nenhum gasto registrado."));
            return 0;
        };

        lines.push(picker_line("Ano", &self.years, self.year_idx));
        lines.push(picker_line("Mês", &self.months, self.month_idx));
        lines.push(Line::from(""));

        let mut focus = lines.len();
        for (n, (index, expense)) in self.visible().into_iter().enumerate() {
            let selected = n == self.selection;
            let marker = if selected { " > " } else { "   " };
            let style = if selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            if selected {
                focus = lines.len();
            }
            lines.push(Line::from(Span::styled(
                format!(
                    "{marker}Gasto {}: {}  {}  ({})  {}",
                    n + 1,
                    expense.descricao,
                    money(expense.valor),
                    expense.categoria.label(),
                    expense.data.format("%Y-%m-%d"),
                ),
                style,
            )));
            if !selected {
                continue;
            }
            match &self.mode {
                EditMode::Editing { index: editing, form, .. } if *editing == index => {
                    let (rows, form_focus) = form_lines(form, &self.edit_errors);
                    focus = lines.len() + form_focus;
                    lines.extend(rows);
                    push_errors(lines, &self.edit_errors);
                }
                EditMode::ConfirmDelete => {
                    lines.push(Line::from(Span::styled(
                        "     Excluir este gasto? (y/n)",
                        WARN_STYLE,
                    )));
                }
                _ => {}
            }
        }
        if self.visible().is_empty() {
            lines.push(Line::from(format!("   Nenhum gasto para {month}/{year}.")));
        }
        focus
    }

    pub fn handle_key(&mut self, code: KeyCode, state: &AppState) -> PageEvent {
        match code {
            KeyCode::F(6) => return PageEvent::Dispatch(Action::SelectFinanceTab(FinanceTab::RegisterExpense)),
            KeyCode::F(7) => return PageEvent::Dispatch(Action::SelectFinanceTab(FinanceTab::EditExpenses)),
            _ => {}
        }
        match state.finance_tab {
            FinanceTab::RegisterExpense => self.handle_register_key(code),
            FinanceTab::EditExpenses => self.handle_edit_key(code),
        }
    }

    fn handle_register_key(&mut self, code: KeyCode) -> PageEvent {
        match self.new_form.handle_key(code) {
            FormEvent::Continue => PageEvent::Continue,
            FormEvent::Cancel => {
                self.reset_new_form();
                PageEvent::Continue
            }
            FormEvent::Submit => match self.new_form.assemble() {
                Ok(expense) => {
                    self.reset_new_form();
                    PageEvent::Dispatch(Action::SubmitExpense(expense))
                }
                Err(errors) => {
                    self.new_errors = errors;
                    PageEvent::Continue
                }
            },
        }
    }

    fn reset_new_form(&mut self) {
        self.new_form = ExpenseForm::new(None, self.today);
        self.new_errors.clear();
    }

    fn handle_edit_key(&mut self, code: KeyCode) -> PageEvent {
        match std::mem::replace(&mut self.mode, EditMode::Browse) {
            EditMode::Browse => self.handle_browse_key(code),
            EditMode::ConfirmDelete => {
                if code == KeyCode::Char('y') {
                    if let Some((index, expense)) = self.selected() {
                        return PageEvent::Dispatch(Action::DeleteExpense { index, expense });
                    }
                } else if !matches!(code, KeyCode::Char('n') | KeyCode::Esc) {
                    self.mode = EditMode::ConfirmDelete;
                }
                PageEvent::Continue
            }
            EditMode::Editing {
                index,
                original,
                mut form,
            } => match form.handle_key(code) {
                FormEvent::Cancel => {
                    self.edit_errors.clear();
                    PageEvent::Continue
                }
                FormEvent::Continue => {
                    self.mode = EditMode::Editing { index, original, form };
                    PageEvent::Continue
                }
                FormEvent::Submit => match form.assemble() {
                    Ok(updated) => {
                        self.edit_errors.clear();
                        PageEvent::Dispatch(Action::UpdateExpense {
                            index,
                            original,
                            updated,
                        })
                    }
                    Err(errors) => {
                        self.edit_errors = errors;
                        self.mode = EditMode::Editing { index, original, form };
                        PageEvent::Continue
                    }
                },
            },
        }
    }

    fn handle_browse_key(&mut self, code: KeyCode) -> PageEvent {
        let month = self.selected_month();
        match code {
            KeyCode::Left => {
                self.year_idx = self.year_idx.saturating_sub(1);
                self.selection = 0;
                self.refresh_months(month);
            }
            KeyCode::Right => {
                if !self.years.is_empty() {
                    self.year_idx = (self.year_idx + 1).min(self.years.len() - 1);
                    self.selection = 0;
                    self.refresh_months(month);
                }
            }
            KeyCode::Char('[') => {
                self.month_idx = self.month_idx.saturating_sub(1);
                self.selection = 0;
            }
            KeyCode::Char(']') => {
                if !self.months.is_empty() {
                    self.month_idx = (self.month_idx + 1).min(self.months.len() - 1);
                    self.selection = 0;
                }
            }
            KeyCode::Up => self.selection = self.selection.saturating_sub(1),
            KeyCode::Down => {
                let count = self.visible().len();
                if count > 0 {
                    self.selection = (self.selection + 1).min(count - 1);
                }
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some((index, original)) = self.selected() {
                    let form = ExpenseForm::new(Some(&original), self.today);
                    self.edit_errors.clear();
                    self.mode = EditMode::Editing { index, original, form };
                }
            }
            KeyCode::Char('d') => {
                if self.selected().is_some() {
                    self.mode = EditMode::ConfirmDelete;
                }
            }
            _ => {}
        }
        PageEvent::Continue
    }
}

fn subheading(text: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {text}"),
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

fn picker_line<T: std::fmt::Display>(label: &str, options: &[T], selected: usize) -> Line<'static> {
    let mut spans = vec![Span::raw(format!("   {label}: "))];
    for (i, option) in options.iter().enumerate() {
        let style = if i == selected {
            SELECTED_STYLE
        } else {
            FOOTER_STYLE
        };
        spans.push(Span::styled(format!(" {option} "), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn push_errors(lines: &mut Vec<Line<'static>>, errors: &FieldErrors) {
    if errors.is_empty() {
        return;
    }
    lines.push(Line::from(""));
    for msg in errors.values() {
        lines.push(Line::from(Span::styled(format!("   {msg}"), ERROR_STYLE)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseCategory;

    fn expense(descricao: &str, valor: f64, date: &str) -> Expense {
        Expense {
            descricao: descricao.into(),
            valor,
            categoria: ExpenseCategory::Combustivel,
            data: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn setup(expenses: &[Expense]) -> (tempfile::TempDir, Stores) {
        let dir = tempfile::tempdir().unwrap();
        let stores = Stores::in_dir(dir.path());
        stores.expenses.save(expenses).unwrap();
        (dir, stores)
    }

    fn edit_state() -> AppState {
        AppState {
            finance_tab: FinanceTab::EditExpenses,
            ..AppState::default()
        }
    }

    #[test]
    fn test_tab_keys_dispatch() {
        let (_dir, stores) = setup(&[]);
        let mut page = FinancePage::new(&stores, today());
        assert!(matches!(
            page.handle_key(KeyCode::F(7), &AppState::default()),
            PageEvent::Dispatch(Action::SelectFinanceTab(FinanceTab::EditExpenses))
        ));
    }

    #[test]
    fn test_register_submits_and_resets() {
        let (_dir, stores) = setup(&[]);
        let mut page = FinancePage::new(&stores, today());
        let state = AppState::default();
        for c in "Diesel".chars() {
            page.handle_key(KeyCode::Char(c), &state);
        }
        page.handle_key(KeyCode::Tab, &state);
        for c in "350,5".chars() {
            page.handle_key(KeyCode::Char(c), &state);
        }
        let PageEvent::Dispatch(Action::SubmitExpense(e)) = page.handle_key(KeyCode::Enter, &state) else {
            panic!("expected submit");
        };
        assert_eq!(e.descricao, "Diesel");
        assert_eq!(e.valor, 350.5);
        assert_eq!(e.categoria, ExpenseCategory::Produtos);
        assert_eq!(e.data, today());
        assert_eq!(page.new_form.state().value(crate::form::DESCRICAO), "");
    }

    #[test]
    fn test_pickers_start_at_newest_year_and_first_month() {
        let (_dir, stores) = setup(&[
            expense("a", 1.0, "2023-02-01"),
            expense("b", 2.0, "2024-05-10"),
            expense("c", 3.0, "2024-03-01"),
        ]);
        let page = FinancePage::new(&stores, today());
        assert_eq!(page.years, vec![2024, 2023]);
        assert_eq!(page.months, vec![Month::Marco, Month::Maio]);
        assert_eq!(page.selected().map(|(i, _)| i), Some(2));
    }

    #[test]
    fn test_edit_dispatches_update_with_original() {
        let (_dir, stores) = setup(&[expense("Diesel", 100.0, "2024-05-10")]);
        let mut page = FinancePage::new(&stores, today());
        let state = edit_state();
        page.handle_key(KeyCode::Char('e'), &state);
        for c in " S10".chars() {
            page.handle_key(KeyCode::Char(c), &state);
        }
        let PageEvent::Dispatch(Action::UpdateExpense { index, original, updated }) =
            page.handle_key(KeyCode::Enter, &state)
        else {
            panic!("expected update");
        };
        assert_eq!(index, 0);
        assert_eq!(original.descricao, "Diesel");
        assert_eq!(updated.descricao, "Diesel S10");
        assert_eq!(updated.valor, 100.0);
    }

    #[test]
    fn test_delete_confirmation() {
        let (_dir, stores) = setup(&[expense("Diesel", 100.0, "2024-05-10")]);
        let mut page = FinancePage::new(&stores, today());
        let state = edit_state();
        page.handle_key(KeyCode::Char('d'), &state);
        assert!(matches!(page.handle_key(KeyCode::Char('n'), &state), PageEvent::Continue));
        page.handle_key(KeyCode::Char('d'), &state);
        assert!(matches!(
            page.handle_key(KeyCode::Char('y'), &state),
            PageEvent::Dispatch(Action::DeleteExpense { index: 0, .. })
        ));
    }
}
