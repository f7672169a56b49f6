use chrono::Datelike;
use crossterm::event::KeyCode;
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::cli::dashboard::PageEvent;
use crate::controller::Action;
use crate::form::{Form, FormEvent, RecordForm};
use crate::state::{AppState, EditingRef};
use crate::tui::{form_lines, scroll_for, title_lines, ERROR_STYLE};
use crate::validation::FieldErrors;

/// "Registro de operações": create a record, or edit the one picked in the
/// editor.
pub struct RegisterPage {
    form: RecordForm,
    /// Editing target the form was seeded from.
    built_for: Option<EditingRef>,
    /// Parse errors found while assembling (bad numbers, out-of-range year).
    parse_errors: FieldErrors,
}

impl RegisterPage {
    pub fn new(state: &AppState) -> Self {
        Self {
            form: build_form(state),
            built_for: state.editing.clone(),
            parse_errors: FieldErrors::new(),
        }
    }

    /// Reseed the form when the editing target changed; otherwise keep what
    /// was typed.
    pub fn reload(&mut self, state: &AppState) {
        if state.editing != self.built_for {
            *self = Self::new(state);
        }
    }

    pub fn hints(&self, state: &AppState) -> &'static str {
        if state.is_editing() {
            " Tab/↑↓=campo  ←→=opção  Enter=salvar edição  Esc=cancelar edição"
        } else {
            " Tab/↑↓=campo  ←→=opção  Enter=criar registro  Esc=limpar"
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let subtitle = if state.is_editing() {
            "Editando Registro"
        } else {
            "Novo Registro"
        };
        let mut lines = title_lines(&format!("Registro de operações · {subtitle}"));

        let mut errors = state.errors.clone();
        errors.extend(self.parse_errors.clone());
        let (form, focus) = form_lines(&self.form, &errors);
        let header = lines.len();
        lines.extend(form);

        if !errors.is_empty() {
            lines.push(Line::from(""));
            for msg in errors.values() {
                lines.push(Line::from(Span::styled(format!("   {msg}"), ERROR_STYLE)));
            }
        }

        let scroll = scroll_for(header + focus, area.height);
        frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), area);
    }

    pub fn handle_key(&mut self, code: KeyCode, state: &AppState) -> PageEvent {
        let before = self.form.operation_type();
        match self.form.handle_key(code) {
            FormEvent::Continue => {
                let after = self.form.operation_type();
                if after != before {
                    return PageEvent::Dispatch(Action::RememberOperationType(after));
                }
                PageEvent::Continue
            }
            FormEvent::Submit => match self.form.assemble() {
                Ok(record) => {
                    self.parse_errors.clear();
                    PageEvent::Dispatch(Action::SubmitRecord(record))
                }
                Err(errors) => {
                    self.parse_errors = errors;
                    PageEvent::Continue
                }
            },
            FormEvent::Cancel => {
                if state.is_editing() {
                    PageEvent::Dispatch(Action::CancelEdit)
                } else {
                    *self = Self::new(state);
                    PageEvent::Continue
                }
            }
        }
    }
}

fn build_form(state: &AppState) -> RecordForm {
    RecordForm::new(
        state.editing.as_ref().map(|e| &e.record),
        state.last_operation_type,
        false,
        chrono::Local::now().year(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Month, Operation, OperationRecord, OperationType, Placeholder};

    #[test]
    fn test_type_change_is_remembered() {
        let state = AppState::default();
        let mut page = RegisterPage::new(&state);
        page.handle_key(KeyCode::Tab, &state);
        page.handle_key(KeyCode::Tab, &state);
        let event = page.handle_key(KeyCode::Right, &state);
        assert!(matches!(
            event,
            PageEvent::Dispatch(Action::RememberOperationType(Some(OperationType::Aerial)))
        ));
    }

    #[test]
    fn test_enter_submits_assembled_record() {
        let state = AppState::default();
        let mut page = RegisterPage::new(&state);
        let PageEvent::Dispatch(Action::SubmitRecord(record)) = page.handle_key(KeyCode::Enter, &state)
        else {
            panic!("expected submit");
        };
        assert_eq!(record.operation, Operation::Unspecified(Placeholder::default()));
    }

    #[test]
    fn test_reload_reseeds_only_when_target_changes() {
        let mut state = AppState::default();
        let mut page = RegisterPage::new(&state);
        page.form.set_value(crate::form::ANO, "2031");
        page.reload(&state);
        assert_eq!(page.form.value(crate::form::ANO), "2031");

        state.editing = Some(EditingRef {
            index: 0,
            record: OperationRecord {
                mes: Month::Agosto,
                ano: 2022,
                operation: Operation::Unspecified(Placeholder::default()),
            },
        });
        page.reload(&state);
        assert_eq!(page.form.value(crate::form::ANO), "2022");
        assert_eq!(page.form.value(crate::form::MES), "Agosto");
    }

    #[test]
    fn test_escape_while_editing_cancels() {
        let mut state = AppState::default();
        state.editing = Some(EditingRef {
            index: 0,
            record: OperationRecord {
                mes: Month::Agosto,
                ano: 2022,
                operation: Operation::Unspecified(Placeholder::default()),
            },
        });
        let mut page = RegisterPage::new(&state);
        assert!(matches!(
            page.handle_key(KeyCode::Esc, &state),
            PageEvent::Dispatch(Action::CancelEdit)
        ));
    }
}
