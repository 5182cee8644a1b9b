//! UI rendering using ratatui

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::app::{App, Button, FIELD_COUNT, Focus, ModalKind};
use crate::form::{RecordBackend, label};
use crate::record::COLUMNS;

const ACCENT: Color = Color::Cyan;
const SECONDARY: Color = Color::DarkGray;
const HIGHLIGHT: Color = Color::Yellow;
const WARNING: Color = Color::Red;

const LABEL_WIDTH: usize = 12;

pub fn render<B: RecordBackend>(frame: &mut Frame, app: &App<B>) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(FIELD_COUNT as u16 + 2),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(area);

    render_fields(frame, app, chunks[0]);
    render_buttons(frame, app, chunks[1]);
    render_log(frame, app, chunks[2]);
    render_status_bar(frame, chunks[3]);

    if app.modal.is_some() {
        render_modal(frame, app);
    }
}

fn input_line<'a>(caption: String, value: &'a str, focused: bool) -> Line<'a> {
    let caption = Span::styled(
        format!("{caption:<width$}", width = LABEL_WIDTH),
        Style::default().fg(if focused { ACCENT } else { SECONDARY }),
    );
    let value_style = if focused {
        Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let mut spans = vec![caption, Span::styled(value, value_style)];
    if focused {
        spans.push(Span::styled("▏", Style::default().fg(HIGHLIGHT)));
    }
    Line::from(spans)
}

fn render_fields<B: RecordBackend>(frame: &mut Frame, app: &App<B>, area: Rect) {
    let lines: Vec<Line> = COLUMNS
        .iter()
        .zip(app.form.fields())
        .enumerate()
        .map(|(i, (column, value))| input_line(label(column), value, app.focus == Focus::Field(i)))
        .collect();
    let block = Block::default()
        .title(format!(" {} ", app.title))
        .title_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SECONDARY));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn button_span(button: Button, focused: bool) -> Span<'static> {
    let text = format!("[ {} {} ]", button.shortcut(), button.label());
    if focused {
        Span::styled(text, Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD))
    } else {
        Span::styled(text, Style::default().fg(ACCENT))
    }
}

fn render_buttons<B: RecordBackend>(frame: &mut Frame, app: &App<B>, area: Rect) {
    let mut spans = Vec::new();
    for button in [Button::Add, Button::Delete, Button::Find, Button::Update] {
        spans.push(button_span(button, app.focus == Focus::Button(button)));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled("  Wiersze: ", Style::default().fg(SECONDARY)));
    let count_focused = app.focus == Focus::RowCount;
    spans.push(Span::styled(
        app.form.row_count(),
        if count_focused {
            Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        },
    ));
    if count_focused {
        spans.push(Span::styled("▏", Style::default().fg(HIGHLIGHT)));
    }
    spans.push(Span::raw(" "));
    spans.push(button_span(Button::LastRows, app.focus == Focus::Button(Button::LastRows)));

    let block = Block::default().borders(Borders::ALL).border_style(Style::default().fg(SECONDARY));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_log<B: RecordBackend>(frame: &mut Frame, app: &App<B>, area: Rect) {
    let log = app.form.log();
    let height = usize::from(area.height.saturating_sub(2));
    let lines: Vec<Line> = log.window(height).into_iter().map(Line::from).collect();
    let title = if log.scroll_back() > 0 {
        format!(" Wyniki (-{}) ", log.scroll_back())
    } else {
        " Wyniki ".to_string()
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(SECONDARY));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar(frame: &mut Frame, area: Rect) {
    let help = "Tab/Shift-Tab: pole  Enter: naciśnij  F2-F6: akcje  PgUp/PgDn: przewiń  Ctrl-L: wyczyść  Esc: wyjście";
    frame.render_widget(Paragraph::new(Span::styled(help, Style::default().fg(SECONDARY))), area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_modal<B: RecordBackend>(frame: &mut Frame, app: &App<B>) {
    let Some(modal) = &app.modal else {
        return;
    };
    let (color, hint) = match modal.kind {
        ModalKind::Warning => (WARNING, "Naciśnij dowolny klawisz"),
        ModalKind::Confirm => (HIGHLIGHT, "[T]ak / [N]ie"),
    };
    let popup = centered_rect(frame.area(), 50, 7);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(format!(" {} ", modal.title))
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));
    let text = vec![
        Line::from(modal.message.as_str()),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(SECONDARY))),
    ];
    frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: false }), popup);
}
