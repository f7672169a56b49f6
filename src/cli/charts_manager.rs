use chrono::{Datelike, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::cli::dashboard::PageEvent;
use crate::models::{Expense, Month, OperationRecord, MONTHS};
use crate::reports::{chart_years, expense_pie, hectare_pie};
use crate::store::Stores;
use crate::tui::{draw_pie, title_lines, FOOTER_STYLE, GREENS, ORANGES, SELECTED_STYLE};

/// "Gráficos": expense and hectare breakdowns for one month.
pub struct ChartsPage {
    records: Vec<OperationRecord>,
    expenses: Vec<Expense>,
    current_year: i32,
    years: Vec<i32>,
    year_idx: usize,
    month: Month,
}

impl ChartsPage {
    pub fn new(stores: &Stores, today: NaiveDate) -> Self {
        let mut page = Self {
            records: Vec::new(),
            expenses: Vec::new(),
            current_year: today.year(),
            years: Vec::new(),
            year_idx: 0,
            month: Month::of_date(today),
        };
        page.reload(stores);
        page
    }

    pub fn reload(&mut self, stores: &Stores) {
        let year = self.years.get(self.year_idx).copied();
        self.records = stores.records.load();
        self.expenses = stores.expenses.load();
        self.years = chart_years(&self.records, &self.expenses, self.current_year);
        self.year_idx = year
            .and_then(|y| self.years.iter().position(|v| *v == y))
            .unwrap_or(0);
    }

    fn year(&self) -> i32 {
        self.years
            .get(self.year_idx)
            .copied()
            .unwrap_or(self.current_year)
    }

    pub fn hints(&self) -> &'static str {
        " ←→=ano  ↑↓=mês"
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let [head, body] =
            Layout::vertical([Constraint::Length(6), Constraint::Fill(1)]).areas(area);

        let mut lines = title_lines("Gráficos");
        let mut years = vec![Span::raw("   Ano: ")];
        for (i, y) in self.years.iter().enumerate() {
            let style = if i == self.year_idx {
                SELECTED_STYLE
            } else {
                FOOTER_STYLE
            };
            years.push(Span::styled(format!(" {y} "), style));
            years.push(Span::raw(" "));
        }
        lines.push(Line::from(years));
        lines.push(Line::from(vec![
            Span::raw("   Mês: "),
            Span::styled(format!(" {} ", self.month), SELECTED_STYLE),
        ]));
        frame.render_widget(Paragraph::new(lines), head);

        let year = self.year();
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body);
        draw_pie(frame, left, &expense_pie(&self.expenses, year, self.month), ORANGES);
        draw_pie(frame, right, &hectare_pie(&self.records, year, self.month), GREENS);
    }

    pub fn handle_key(&mut self, code: KeyCode) -> PageEvent {
        match code {
            KeyCode::Left => self.year_idx = self.year_idx.saturating_sub(1),
            KeyCode::Right => {
                self.year_idx = (self.year_idx + 1).min(self.years.len().saturating_sub(1));
            }
            KeyCode::Up => self.month = step_month(self.month, -1),
            KeyCode::Down => self.month = step_month(self.month, 1),
            _ => {}
        }
        PageEvent::Continue
    }
}

fn step_month(month: Month, delta: i32) -> Month {
    let len = MONTHS.len() as i32;
    let idx = (month.number() as i32 - 1 + delta).rem_euclid(len);
    MONTHS[idx as usize]
}
