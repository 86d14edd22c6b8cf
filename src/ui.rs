use crate::app::{App, State};
use crate::notify::{Notification, Severity};
use crate::projection::COLUMN_TITLES;
use crate::theme::theme;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};
use throbber_widgets_tui::Throbber;

const INPUT_PROMPT: &str = "❯ ";
const INPUT_PLACEHOLDER: &str = "What is your question?";
const SEARCHING_CAPTION: &str = " Searching...";

/// Main UI rendering. Reads the app, never changes it.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Views get the frame minus a 2 column / 1 row margin, matching the
    // sizes App::on_resize gives the widgets
    let content = area.inner(Margin {
        horizontal: 2,
        vertical: 1,
    });
    let status = (area.height >= 2).then(|| Rect {
        x: content.x,
        y: area.bottom() - 1,
        width: content.width,
        height: 1,
    });

    // A fatal error replaces everything else
    if let Some(error) = app.error() {
        render_error(frame, error, content);
        if let Some(status) = status {
            render_status_bar(frame, app, status);
        }
        return;
    }

    match app.state() {
        State::AwaitingInput => render_input(frame, app, content),
        State::SearchPending => render_pending(frame, app, content),
        State::ShowingResultList => render_table(frame, app, content),
        State::ShowingResultDetail | State::ShowingComments | State::ShowingHelp => {
            render_document(frame, app, content)
        }
    }

    if let Some(status) = status {
        render_status_bar(frame, app, status);
    }

    if let Some(notification) = app.notification() {
        render_toast(frame, notification, content);
    }
}

fn render_error(frame: &mut Frame, error: &str, area: Rect) {
    let t = theme();
    let paragraph = Paragraph::new(Line::styled(error.to_string(), Style::default().fg(t.error_fg)))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let t = theme();
    let prompt = Span::styled(INPUT_PROMPT, Style::default().fg(t.accent));
    let prompt_width = INPUT_PROMPT.chars().count();

    let line = if app.input.value().is_empty() {
        Line::from(vec![
            prompt,
            Span::styled(
                " ",
                Style::default().fg(t.header_fg).bg(t.accent),
            ),
            Span::styled(INPUT_PLACEHOLDER, Style::default().fg(t.placeholder_fg)),
        ])
    } else {
        let chars: Vec<char> = app.input.value().chars().collect();
        let cursor = app.input.cursor().min(chars.len());

        // Keep the cursor on screen when the question is wider than the box
        let available = (area.width as usize).saturating_sub(prompt_width + 1).max(1);
        let start = (cursor + 1).saturating_sub(available);

        // Split query: before cursor, char at cursor (or space if at end), after cursor
        let before: String = chars[start..cursor].iter().collect();
        let cursor_char = chars.get(cursor).copied().unwrap_or(' ');
        let after: String = if cursor < chars.len() {
            chars[cursor + 1..].iter().collect()
        } else {
            String::new()
        };

        Line::from(vec![
            prompt,
            Span::raw(before),
            Span::styled(
                cursor_char.to_string(),
                Style::default().fg(t.header_fg).bg(t.accent),
            ),
            Span::raw(after),
        ])
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_pending(frame: &mut Frame, app: &App, area: Rect) {
    let t = theme();
    let spinner = Throbber::default()
        .style(Style::default().fg(t.accent))
        .throbber_style(Style::default().fg(t.accent));
    let line = Line::from(vec![
        spinner.to_symbol_span(&app.spinner),
        Span::raw(SEARCHING_CAPTION),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let t = theme();

    let header = Row::new(COLUMN_TITLES.iter().map(|title| Cell::from(*title)))
        .style(Style::default().fg(t.header_fg).bg(t.header_bg));
    let rows = app
        .table
        .rows()
        .iter()
        .map(|row| Row::new(row.iter().map(|value| Cell::from(value.as_str()))));
    let widths = app.table.column_widths().map(Constraint::Length);

    let table = Table::new(rows, widths)
        .header(header)
        .row_highlight_style(Style::default().fg(t.accent).add_modifier(Modifier::BOLD));

    // Work on a copy so drawing leaves the app untouched
    let mut state = app.table.state().clone();
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_document(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .viewport
        .content()
        .lines
        .iter()
        .skip(app.viewport.offset())
        .take(area.height as usize)
        .cloned()
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let t = theme();
    let keycap = Style::default().bg(t.keycap_bg);
    let label = Style::default();
    let dim = Style::default().fg(t.dim_fg);

    let mut hints: Vec<(&str, &str)> = Vec::new();
    let mut right = String::new();

    if app.error().is_some() {
        hints.push(("Backspace", "dismiss"));
    } else {
        match app.state() {
            State::AwaitingInput => {
                hints.push(("Enter", "search"));
                hints.push(("F1", "help"));
            }
            State::SearchPending => {}
            State::ShowingResultList => {
                hints.extend([("↑↓", "navigate"), ("Enter", "open")]);
                // Only on wide terminals; the essentials come first
                if area.width > 70 {
                    hints.push(("o", "browser"));
                }
                hints.push(("Backspace", "back"));
                right = format!("{} results", app.table.rows().len());
            }
            State::ShowingResultDetail => {
                hints.push(("↑↓", "scroll"));
                if area.width > 70 {
                    hints.extend([("c", "comments"), ("o", "browser")]);
                }
                hints.push(("Backspace", "back"));
                right = format!("{}%", app.viewport.scroll_percent());
            }
            State::ShowingComments | State::ShowingHelp => {
                hints.extend([("↑↓", "scroll"), ("Backspace", "back")]);
                right = format!("{}%", app.viewport.scroll_percent());
            }
        }
    }
    hints.push(("Esc", "quit"));

    let mut spans = Vec::new();
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", dim));
        }
        spans.push(Span::styled(format!(" {} ", key), keycap));
        spans.push(Span::styled(format!(" {}", action), label));
    }
    if !app.mouse_enabled() {
        right = if right.is_empty() {
            "mouse off".to_string()
        } else {
            format!("mouse off · {}", right)
        };
    }

    let right = Span::styled(right, dim);
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(right.width() as u16)])
        .split(area);

    frame.render_widget(Paragraph::new(Line::from(spans)), layout[0]);
    frame.render_widget(Paragraph::new(right), layout[1]);
}

/// Toast in the bottom right corner of `area`
fn render_toast(frame: &mut Frame, notification: &Notification, area: Rect) {
    let t = theme();
    if area.width < 5 || area.height < 3 {
        return;
    }

    let width = (notification.message.chars().count() as u16 + 4).min(area.width);
    let rect = Rect {
        x: area.right() - width,
        y: area.bottom() - 3,
        width,
        height: 3,
    };
    let bg = match notification.severity {
        Severity::Info => t.info_bg,
        Severity::Warning => t.warning_bg,
        Severity::Error => t.error_bg,
    };

    let toast = Paragraph::new(notification.message.as_str())
        .alignment(Alignment::Center)
        .style(Style::default().fg(t.toast_fg).bg(bg))
        .block(Block::bordered().border_type(BorderType::Rounded));

    frame.render_widget(Clear, rect);
    frame.render_widget(toast, rect);
}
