use std::f64::consts::TAU;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Line as CanvasLine};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::controller::Notice;
use crate::form::{FieldKind, Form};
use crate::reports::{PieChart, PieSummary};
use crate::validation::{product_dose_key, FieldErrors};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const BORDER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const TITLE_STYLE: Style = Style::new().add_modifier(Modifier::BOLD);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const FARM_STYLE: Style = Style::new()
    .fg(Color::Rgb(76, 175, 80))
    .add_modifier(Modifier::BOLD);

pub const SUCCESS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const INFO_STYLE: Style = Style::new().fg(Color::Cyan);
pub const ERROR_STYLE: Style = Style::new().fg(Color::Red);
pub const WARN_STYLE: Style = Style::new().fg(Color::Yellow);

/// Slice colours for the expense chart.
pub const ORANGES: &[Color] = &[
    Color::Rgb(253, 141, 60),
    Color::Rgb(230, 85, 13),
    Color::Rgb(253, 190, 133),
    Color::Rgb(166, 54, 3),
];

/// Slice colours for the hectare chart.
pub const GREENS: &[Color] = &[
    Color::Rgb(49, 163, 84),
    Color::Rgb(161, 217, 155),
    Color::Rgb(0, 109, 44),
    Color::Rgb(116, 196, 118),
];

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

pub fn separator(width: u16) -> Paragraph<'static> {
    Paragraph::new("━".repeat(width as usize)).style(BORDER_STYLE)
}

pub fn notice_style(notice: &Notice) -> Style {
    match notice {
        Notice::Success(_) => SUCCESS_STYLE,
        Notice::Info(_) => INFO_STYLE,
        Notice::Error(_) => ERROR_STYLE,
    }
}

pub fn notice_line(notice: &Notice) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {}", notice.message()),
        notice_style(notice),
    ))
}

pub fn title_lines(title: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(format!(" {title}"), TITLE_STYLE)),
        Line::from(""),
    ]
}

/// Install a panic hook that restores the terminal before printing.
pub fn install_panic_hook() {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Forms
// ---------------------------------------------------------------------------

/// Validation messages are keyed per product (`produto_{i}_dose`) while the
/// form keys per row (`produto_dose_{i}`); accept both.
fn field_error<'a>(errors: &'a FieldErrors, key: &str) -> Option<&'a String> {
    errors.get(key).or_else(|| {
        key.strip_prefix("produto_dose_")
            .and_then(|i| i.parse::<usize>().ok())
            .and_then(|i| errors.get(&product_dose_key(i)))
    })
}

/// Render a form as lines: one per field, headings before product rows and
/// any error message beneath the offending field. Returns the lines and the
/// index of the focused line so callers can scroll to it.
pub fn form_lines(form: &dyn Form, errors: &FieldErrors) -> (Vec<Line<'static>>, usize) {
    let mut lines = Vec::new();
    let mut focus_line = 0;
    let focused_key = form.focused_key();
    let locked = form.state().is_locked();

    for field in form.layout() {
        if let Some(heading) = &field.heading {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("   {heading}"),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
            )));
        }

        let is_focused = focused_key.as_deref() == Some(field.key.as_str());
        if is_focused {
            focus_line = lines.len();
        }
        let label_style = if is_focused {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let value_style = match (&field.kind, is_focused) {
            (FieldKind::Computed, _) => Style::default().fg(Color::DarkGray),
            (_, true) if locked => Style::default().fg(Color::DarkGray),
            (_, true) => Style::default().fg(Color::Cyan),
            _ => Style::default(),
        };
        let value = form.display_value(&field);
        let shown = match &field.kind {
            FieldKind::Select { .. } => {
                let (l, r) = if is_focused { ("< ", " >") } else { ("  ", "  ") };
                let v = if value.is_empty() { "(nenhuma)" } else { value.as_str() };
                format!("{l}{v}{r}")
            }
            _ if is_focused && !locked => format!("{value}_"),
            _ => value,
        };
        lines.push(Line::from(vec![
            Span::styled(format!("   {:<28} ", field.label), label_style),
            Span::styled(shown, value_style),
        ]));

        if let Some(msg) = field_error(errors, &field.key) {
            lines.push(Line::from(Span::styled(
                format!("   {:<28} {msg}", ""),
                ERROR_STYLE,
            )));
        }
    }
    (lines, focus_line)
}

/// Scroll offset that keeps `focus_line` visible in a view of `height` rows.
pub fn scroll_for(focus_line: usize, height: u16) -> u16 {
    let height = height.max(1) as usize;
    focus_line.saturating_sub(height.saturating_sub(2)) as u16
}

// ---------------------------------------------------------------------------
// Pie charts
// ---------------------------------------------------------------------------

/// Draw a pie summary: the chart with its legend, or the empty-period
/// message.
pub fn draw_pie(frame: &mut Frame, area: Rect, summary: &PieSummary, palette: &[Color]) {
    match summary {
        PieSummary::Empty(msg) => {
            let mut lines = vec![Line::from("")];
            lines.push(Line::from(Span::styled(format!(" {msg}"), INFO_STYLE)));
            frame.render_widget(Paragraph::new(lines), area);
        }
        PieSummary::Chart(chart) => draw_pie_chart(frame, area, chart, palette),
    }
}

fn draw_pie_chart(frame: &mut Frame, area: Rect, chart: &PieChart, palette: &[Color]) {
    let [title_area, body] =
        Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(area);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(format!(" {}", chart.title), TITLE_STYLE))),
        title_area,
    );

    let legend_height = chart.slices.len() as u16 + 1;
    let [pie_area, legend_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(legend_height)]).areas(body);

    // Terminal cells are roughly twice as tall as wide
    let aspect = if pie_area.height == 0 {
        1.0
    } else {
        pie_area.width as f64 / (pie_area.height as f64 * 2.0)
    };
    let cell_width = 2.0 * aspect / pie_area.width.max(1) as f64;
    let total = chart.total;
    let slices: Vec<(f64, f64, Color)> = {
        let mut start = 0.0;
        chart
            .slices
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let sweep = if total > 0.0 { s.value / total * TAU } else { 0.0 };
                let slice = (start, start + sweep, palette[i % palette.len()]);
                start += sweep;
                slice
            })
            .collect()
    };
    let total_label = chart.total_label.clone();

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([-aspect, aspect])
        .y_bounds([-1.0, 1.0])
        .paint(move |ctx| {
            let radius = 0.95;
            let steps = 360;
            for step in 0..steps {
                let angle = step as f64 / steps as f64 * TAU;
                let Some(&(_, _, color)) = slices.iter().find(|(a, b, _)| angle >= *a && angle < *b)
                else {
                    continue;
                };
                // Start at 12 o'clock, clockwise
                let theta = std::f64::consts::FRAC_PI_2 - angle;
                ctx.draw(&CanvasLine {
                    x1: 0.0,
                    y1: 0.0,
                    x2: radius * theta.cos(),
                    y2: radius * theta.sin(),
                    color,
                });
            }
            ctx.layer();
            let x = -(total_label.chars().count() as f64) * cell_width / 2.0;
            ctx.print(
                x,
                0.0,
                Line::from(Span::styled(
                    total_label.clone(),
                    Style::default().fg(Color::White).bg(Color::Black).add_modifier(Modifier::BOLD),
                )),
            );
        });
    frame.render_widget(canvas, pie_area);

    let mut legend = vec![Line::from("")];
    for (i, slice) in chart.slices.iter().enumerate() {
        let pct = if total > 0.0 { slice.value / total * 100.0 } else { 0.0 };
        legend.push(Line::from(vec![
            Span::styled("   ■ ", Style::default().fg(palette[i % palette.len()])),
            Span::raw(format!("{:<22} {:>12.2}  {pct:>5.1}%", slice.label, slice.value)),
        ]));
    }
    frame.render_widget(Paragraph::new(legend), legend_area);
}
