//! Markdown to styled terminal text.

use ratatui::text::{Line, Span, Text};

/// Render markdown source into styled text that owns its content.
pub fn render(source: &str) -> Text<'static> {
    into_owned(tui_markdown::from_str(source))
}

fn into_owned(text: Text<'_>) -> Text<'static> {
    let lines: Vec<Line<'static>> = text
        .lines
        .into_iter()
        .map(|line| {
            let spans: Vec<Span<'static>> = line
                .spans
                .into_iter()
                .map(|span| Span::styled(span.content.into_owned(), span.style))
                .collect();
            let mut owned = Line::from(spans).style(line.style);
            owned.alignment = line.alignment;
            owned
        })
        .collect();

    let mut owned = Text::from(lines).style(text.style);
    owned.alignment = text.alignment;
    owned
}
