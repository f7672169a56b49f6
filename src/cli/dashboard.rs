use std::path::{Path, PathBuf};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use rand::seq::SliceRandom;
use ratatui::{
    layout::{Constraint, Layout},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::cli::charts_manager::ChartsPage;
use crate::cli::editor_manager::EditorPage;
use crate::cli::export_manager::ExportPage;
use crate::cli::finance_manager::FinancePage;
use crate::cli::register_manager::RegisterPage;
use crate::controller::{apply, Action, Notice};
use crate::error::{CaetanoError, Result};
use crate::state::{AppState, Page, PAGES};
use crate::store::Stores;
use crate::tui::{
    install_panic_hook, notice_line, separator, BORDER_STYLE, FARM_STYLE, FOOTER_STYLE,
    HEADER_STYLE, SELECTED_STYLE,
};

const GREETINGS: &[&str] = &[
    "Bom dia! Vamos ver como estão as aplicações.",
    "O talhão não se pulveriza sozinho.",
    "Tempo bom pra voar. Vamos registrar?",
    "Tudo anotado, tudo no lugar. Quase tudo.",
    "De volta à lida.",
    "Mais um dia, mais uma calda.",
    "Vamos conferir os gastos do mês?",
    "Caderno de campo aberto.",
];

/// Width of the page menu on the left.
const SIDEBAR_WIDTH: u16 = 28;

/// Keypresses a notice stays on screen.
const NOTICE_TTL: u8 = 3;

/// What a page wants after handling a key.
pub enum PageEvent {
    Continue,
    /// Run an action through the controller, then refresh the page.
    Dispatch(Action),
    /// Show a message without touching session state.
    Notify(Notice),
}

enum PageView {
    Register(RegisterPage),
    Editor(EditorPage),
    Export(ExportPage),
    Finance(FinancePage),
    Charts(ChartsPage),
}

struct Dashboard {
    state: AppState,
    stores: Stores,
    data_dir: PathBuf,
    view: PageView,
    greeting: String,
    farm_name: String,
    notice: Option<Notice>,
    notice_ttl: u8,
}

impl Dashboard {
    fn new(data_dir: &Path, farm_name: &str) -> Self {
        let mut rng = rand::thread_rng();
        let greeting = GREETINGS
            .choose(&mut rng)
            .unwrap_or(&"Olá.")
            .to_string();
        let stores = Stores::in_dir(data_dir);
        let state = AppState::default();
        let view = build_view(&state, &stores, data_dir);
        Self {
            state,
            stores,
            data_dir: data_dir.to_path_buf(),
            view,
            greeting,
            farm_name: farm_name.to_string(),
            notice: None,
            notice_ttl: 0,
        }
    }

    fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
        self.notice_ttl = NOTICE_TTL;
    }

    fn tick_notice(&mut self) {
        if self.notice_ttl > 0 {
            self.notice_ttl -= 1;
            if self.notice_ttl == 0 {
                self.notice = None;
            }
        }
    }

    fn dispatch(&mut self, action: Action) {
        let previous = self.state.page;
        let outcome = apply(std::mem::take(&mut self.state), action, &self.stores);
        self.state = outcome.state;
        if let Some(notice) = outcome.notice {
            if notice.is_error() {
                tracing::warn!(message = notice.message(), "action failed");
            }
            self.set_notice(notice);
        }
        if self.state.page != previous {
            self.view = build_view(&self.state, &self.stores, &self.data_dir);
        } else {
            self.reload_view();
        }
    }

    fn reload_view(&mut self) {
        match &mut self.view {
            PageView::Register(page) => page.reload(&self.state),
            PageView::Editor(page) => page.reload(&self.stores),
            PageView::Export(page) => page.reload(&self.stores),
            PageView::Finance(page) => page.reload(&self.stores),
            PageView::Charts(page) => page.reload(&self.stores),
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        self.tick_notice();

        if let KeyCode::F(n @ 1..=5) = code {
            let page = PAGES[usize::from(n) - 1];
            if page != self.state.page {
                self.dispatch(Action::SelectPage(page));
            }
            return;
        }

        let event = match &mut self.view {
            PageView::Register(page) => page.handle_key(code, &self.state),
            PageView::Editor(page) => page.handle_key(code),
            PageView::Export(page) => page.handle_key(code),
            PageView::Finance(page) => page.handle_key(code, &self.state),
            PageView::Charts(page) => page.handle_key(code),
        };
        match event {
            PageEvent::Continue => {}
            PageEvent::Dispatch(action) => self.dispatch(action),
            PageEvent::Notify(notice) => self.set_notice(notice),
        }
    }

    fn hints(&self) -> &'static str {
        match &self.view {
            PageView::Register(page) => page.hints(&self.state),
            PageView::Editor(page) => page.hints(),
            PageView::Export(page) => page.hints(),
            PageView::Finance(page) => page.hints(&self.state),
            PageView::Charts(page) => page.hints(),
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep1, body_area, sep2, footer_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        // Header
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!(" {} ", self.farm_name), FARM_STYLE),
                Span::styled(format!(" {}", self.greeting), HEADER_STYLE),
            ])),
            header_area,
        );
        frame.render_widget(separator(area.width), sep1);
        frame.render_widget(separator(area.width), sep2);

        let [menu_area, divider_area, content_area] = Layout::horizontal([
            Constraint::Length(SIDEBAR_WIDTH),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(body_area);

        // Page menu
        let mut menu = vec![Line::from("")];
        for (i, page) in PAGES.iter().enumerate() {
            let style = if i == self.state.page.index() {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            menu.push(Line::from(vec![
                Span::styled(format!(" F{} ", i + 1), FOOTER_STYLE),
                Span::styled(format!(" {:<22}", page.label()), style),
            ]));
        }
        if self.state.is_editing() {
            menu.push(Line::from(""));
            menu.push(Line::from(Span::styled(" Editando registro", FOOTER_STYLE)));
        }
        frame.render_widget(Paragraph::new(menu), menu_area);

        let divider: Vec<Line> = (0..divider_area.height).map(|_| Line::from("│")).collect();
        frame.render_widget(Paragraph::new(divider).style(BORDER_STYLE), divider_area);

        match &self.view {
            PageView::Register(page) => page.draw(frame, content_area, &self.state),
            PageView::Editor(page) => page.draw(frame, content_area),
            PageView::Export(page) => page.draw(frame, content_area),
            PageView::Finance(page) => page.draw(frame, content_area, &self.state),
            PageView::Charts(page) => page.draw(frame, content_area),
        }

        // Footer: the current notice, or key hints
        let footer = match &self.notice {
            Some(notice) => notice_line(notice),
            None => Line::from(Span::styled(
                format!("{}  F1-F5=página  Ctrl+C=sair", self.hints()),
                FOOTER_STYLE,
            )),
        };
        frame.render_widget(Paragraph::new(footer), footer_area);
    }
}

fn build_view(state: &AppState, stores: &Stores, data_dir: &Path) -> PageView {
    let today = chrono::Local::now().date_naive();
    match state.page {
        Page::Register => PageView::Register(RegisterPage::new(state)),
        Page::Editor => PageView::Editor(EditorPage::new(stores)),
        Page::Export => PageView::Export(ExportPage::new(stores, data_dir)),
        Page::Finance => PageView::Finance(FinancePage::new(stores, today)),
        Page::Charts => PageView::Charts(ChartsPage::new(stores, today)),
    }
}

pub fn run(data_dir: &Path, farm_name: &str) -> Result<()> {
    let mut dashboard = Dashboard::new(data_dir, farm_name);
    tracing::info!(data_dir = %data_dir.display(), "dashboard started");

    install_panic_hook();
    let mut terminal = ratatui::init();

    let exit: std::result::Result<(), CaetanoError> = loop {
        if let Err(e) = terminal.draw(|frame| dashboard.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }
                dashboard.handle_key(key.code);
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    exit
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExpenseCategory, Month, Operation, OperationRecord, Placeholder};

    fn dashboard() -> (tempfile::TempDir, Dashboard) {
        let dir = tempfile::tempdir().unwrap();
        let dashboard = Dashboard::new(dir.path(), "FAZENDA TESTE");
        (dir, dashboard)
    }

    #[test]
    fn test_starts_on_register() {
        let (_dir, dash) = dashboard();
        assert_eq!(dash.state.page, Page::Register);
        assert!(matches!(dash.view, PageView::Register(_)));
    }

    #[test]
    fn test_function_keys_switch_pages() {
        let (_dir, mut dash) = dashboard();
        dash.handle_key(KeyCode::F(4));
        assert_eq!(dash.state.page, Page::Finance);
        assert!(matches!(dash.view, PageView::Finance(_)));
        dash.handle_key(KeyCode::F(2));
        assert!(matches!(dash.view, PageView::Editor(_)));
    }

    #[test]
    fn test_submit_placeholder_moves_to_editor() {
        let (dir, mut dash) = dashboard();
        dash.handle_key(KeyCode::Enter);
        assert_eq!(dash.state.page, Page::Editor);
        assert!(matches!(dash.notice, Some(Notice::Success(_))));
        let records = Stores::in_dir(dir.path()).records.load();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, Operation::Unspecified(Placeholder::default()));
    }

    #[test]
    fn test_edit_from_editor_opens_register() {
        let (dir, mut dash) = dashboard();
        Stores::in_dir(dir.path())
            .records
            .save(&[OperationRecord {
                mes: Month::Junho,
                ano: 2023,
                operation: Operation::Unspecified(Placeholder::default()),
            }])
            .unwrap();
        dash.handle_key(KeyCode::F(2));
        dash.handle_key(KeyCode::Char('e'));
        assert_eq!(dash.state.page, Page::Register);
        assert_eq!(dash.state.editing.as_ref().map(|e| e.index), Some(0));
    }

    #[test]
    fn test_expense_registration_flow() {
        let (dir, mut dash) = dashboard();
        dash.handle_key(KeyCode::F(4));
        for c in "Diesel".chars() {
            dash.handle_key(KeyCode::Char(c));
        }
        dash.handle_key(KeyCode::Tab);
        for c in "120".chars() {
            dash.handle_key(KeyCode::Char(c));
        }
        dash.handle_key(KeyCode::Enter);
        assert_eq!(
            dash.notice,
            Some(Notice::Success("Gasto registrado com sucesso!".into()))
        );
        let expenses = Stores::in_dir(dir.path()).expenses.load();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].categoria, ExpenseCategory::Produtos);
    }

    #[test]
    fn test_notice_expires_after_keypresses() {
        let (_dir, mut dash) = dashboard();
        dash.set_notice(Notice::Info("oi".into()));
        for _ in 0..NOTICE_TTL {
            assert!(dash.notice.is_some());
            dash.handle_key(KeyCode::Null);
        }
        assert!(dash.notice.is_none());
    }
}
