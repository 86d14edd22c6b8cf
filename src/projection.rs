//! Pure transformations from search results to what the views display:
//! table rows for the results list and pre-wrapped documents for the
//! viewport.

use crate::markdown;
use crate::search::{Answer, Comment, ResultItem, SearchResult};
use crate::theme::theme;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};

/// One results table row: id, title, score, views
pub type Row = [String; 4];

pub const COLUMN_TITLES: [&str; 4] = ["ID", "Title", "Score", "Views"];

/// Percent of the table width given to each column
const COLUMN_PERCENT: [u32; 4] = [10, 70, 10, 20];

/// Column widths for a table `table_width` cells wide, rounded down
pub fn column_widths(table_width: u16) -> [u16; 4] {
    let width = u32::from(table_width);
    COLUMN_PERCENT.map(|percent| (width * percent / 100) as u16)
}

pub fn table_rows(result: &SearchResult) -> Vec<Row> {
    result
        .items
        .iter()
        .map(|item| {
            [
                item.id.to_string(),
                item.title.clone(),
                item.score.to_string(),
                item.view_count.to_string(),
            ]
        })
        .collect()
}

/// Question heading and body, a rule, then every answer in its own box
pub fn build_document(item: &ResultItem, width: u16) -> Text<'static> {
    let t = theme();
    let width = usize::from(width).max(1);
    let dim = Style::default().fg(t.dim_fg);
    let mut lines = Vec::new();

    let question = markdown::render(&format!("# {}\n\n{}", item.title, item.body));
    lines.extend(wrap_text(question, width));
    lines.push(Line::default());
    lines.extend(wrap_line(metadata_line(item, dim), width));
    lines.push(Line::styled("-".repeat(width), Style::default().fg(t.rule_fg)));
    lines.push(Line::default());

    lines.extend(wrap_text(markdown::render("# Answers:"), width));
    if item.answers.is_empty() {
        lines.push(Line::default());
        lines.push(Line::styled("No answers yet.", dim));
    }
    for answer in &item.answers {
        lines.push(Line::default());
        let mut body = vec![answer_header(answer)];
        body.push(Line::default());
        body.extend(markdown::render(&answer.body).lines);
        lines.extend(bordered(body, width, Style::default().fg(t.accent)));
    }

    Text::from(lines)
}

/// Comments on the question, then on each answer
pub fn build_comments(item: &ResultItem, width: u16) -> Text<'static> {
    let width = usize::from(width).max(1);
    let mut lines = Vec::new();

    lines.extend(wrap_text(markdown::render("# Comments"), width));
    lines.push(Line::default());
    lines.extend(wrap_text(markdown::render("## On the question"), width));
    push_comments(&mut lines, &item.comments, width);

    for (i, answer) in item.answers.iter().enumerate() {
        lines.push(Line::default());
        let heading = format!("## On answer {} (score {})", i + 1, answer.score);
        lines.extend(wrap_text(markdown::render(&heading), width));
        push_comments(&mut lines, &answer.comments, width);
    }

    Text::from(lines)
}

fn push_comments(lines: &mut Vec<Line<'static>>, comments: &[Comment], width: usize) {
    let t = theme();
    if comments.is_empty() {
        lines.push(Line::styled("No comments.", Style::default().fg(t.dim_fg)));
        return;
    }
    for comment in comments {
        lines.push(Line::from(vec![
            Span::styled(
                comment.owner.clone(),
                Style::default().fg(t.accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  ▲ {}", comment.score), Style::default().fg(t.dim_fg)),
        ]));
        lines.extend(wrap_text(markdown::render(&comment.body), width));
        lines.push(Line::default());
    }
}

const HELP_KEYS: [(&str, &str); 11] = [
    ("Enter", "search, or open the selected question"),
    ("Backspace", "go back"),
    ("↑/↓  k/j", "move the selection or scroll"),
    ("PgUp/PgDn", "page up / down"),
    ("Home/End", "jump to the top / bottom"),
    ("c", "show comments (question view)"),
    ("o", "open the question in a browser"),
    ("Ctrl+S", "toggle mouse scroll/clicks"),
    ("F1", "show this help"),
    ("Esc", "quit"),
    ("Ctrl+C", "quit"),
];

/// Key reference shown in the help view
pub fn help_document() -> Text<'static> {
    let t = theme();
    let key_width = HELP_KEYS.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let mut lines = vec![
        Line::styled("Keys", Style::default().fg(t.accent).add_modifier(Modifier::BOLD)),
        Line::default(),
    ];
    for (key, action) in HELP_KEYS {
        let pad = key_width - key.chars().count();
        lines.push(Line::from(vec![
            Span::styled(format!(" {}{} ", key, " ".repeat(pad)), Style::default().bg(t.keycap_bg)),
            Span::raw(format!("  {}", action)),
        ]));
    }
    Text::from(lines)
}

fn metadata_line(item: &ResultItem, style: Style) -> Line<'static> {
    let mut text = format!("Score {} · {} views", item.score, item.view_count);
    if !item.tags.is_empty() {
        text.push_str(" · ");
        text.push_str(&item.tags.join(", "));
    }
    Line::styled(text, style)
}

fn answer_header(answer: &Answer) -> Line<'static> {
    let t = theme();
    let mut spans = vec![Span::styled(
        format!("▲ {}", answer.score),
        Style::default().fg(t.dim_fg),
    )];
    if answer.is_accepted {
        spans.push(Span::styled(
            "  ✔ accepted",
            Style::default().fg(t.accepted_fg).add_modifier(Modifier::BOLD),
        ));
    }
    Line::from(spans)
}

/// Wrap content in a rounded box exactly `width` cells wide
fn bordered(lines: Vec<Line<'static>>, width: usize, border: Style) -> Vec<Line<'static>> {
    let width = width.max(4);
    let inner = width - 4;
    let horizontal = "─".repeat(width - 2);

    let mut out = Vec::with_capacity(lines.len() + 2);
    out.push(Line::styled(format!("╭{}╮", horizontal), border));
    for line in lines.into_iter().flat_map(|l| wrap_line(l, inner)) {
        let pad = inner.saturating_sub(line.width());
        let line_style = line.style;
        let mut spans = vec![Span::styled("│ ", border)];
        spans.extend(
            line.spans
                .into_iter()
                .map(|s| Span::styled(s.content, line_style.patch(s.style))),
        );
        spans.push(Span::raw(" ".repeat(pad)));
        spans.push(Span::styled(" │", border));
        out.push(Line::from(spans));
    }
    out.push(Line::styled(format!("╰{}╯", horizontal), border));
    out
}

fn wrap_text(text: Text<'static>, max_width: usize) -> Vec<Line<'static>> {
    text.lines
        .into_iter()
        .flat_map(|line| wrap_line(line, max_width))
        .collect()
}

/// A run of non-whitespace characters, split into differently styled pieces
type Word = Vec<(String, Style)>;

fn push_styled(word: &mut Word, c: char, style: Style) {
    match word.last_mut() {
        Some((text, s)) if *s == style => text.push(c),
        _ => word.push((c.to_string(), style)),
    }
}

fn split_words(line: &Line<'_>) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = Word::new();
    for span in &line.spans {
        for c in span.content.chars() {
            if c.is_whitespace() {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            } else {
                push_styled(&mut current, c, span.style);
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn word_width(word: &Word) -> usize {
    word.iter().map(|(text, _)| text.chars().count()).sum()
}

fn word_spans(word: Word) -> impl Iterator<Item = Span<'static>> {
    word.into_iter().map(|(text, style)| Span::styled(text, style))
}

/// Force-break a word longer than the line into line-sized pieces
fn break_word(word: Word, max_width: usize) -> Vec<Word> {
    let chars: Vec<(char, Style)> = word
        .into_iter()
        .flat_map(|(text, style)| text.chars().map(|c| (c, style)).collect::<Vec<_>>())
        .collect();
    chars
        .chunks(max_width)
        .map(|chunk| {
            let mut piece = Word::new();
            for &(c, style) in chunk {
                push_styled(&mut piece, c, style);
            }
            piece
        })
        .collect()
}

/// Word-wrap a styled line to fit within max_width characters.
///
/// Lines that already fit are returned untouched so code blocks keep their
/// indentation; wrapped lines have their whitespace collapsed.
pub fn wrap_line(line: Line<'static>, max_width: usize) -> Vec<Line<'static>> {
    if max_width == 0 || line.width() <= max_width {
        return vec![line];
    }

    let style = line.style;
    let mut result = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0;

    for word in split_words(&line) {
        let width = word_width(&word);

        if current_width > 0 && current_width + 1 + width <= max_width {
            // Word fits on current line
            current.push(Span::raw(" "));
            current.extend(word_spans(word));
            current_width += 1 + width;
            continue;
        }

        if current_width > 0 {
            result.push(Line::from(std::mem::take(&mut current)).style(style));
            current_width = 0;
        }

        if width > max_width {
            let mut pieces = break_word(word, max_width);
            let tail = pieces.pop();
            for piece in pieces {
                result.push(Line::from(word_spans(piece).collect::<Vec<_>>()).style(style));
            }
            if let Some(tail) = tail {
                current_width = word_width(&tail);
                current.extend(word_spans(tail));
            }
        } else {
            current_width = width;
            current.extend(word_spans(word));
        }
    }

    if !current.is_empty() {
        result.push(Line::from(current).style(style));
    }
    if result.is_empty() {
        result.push(Line::default().style(style));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines.iter().map(line_text).collect()
    }

    fn item(id: u64, title: &str) -> ResultItem {
        ResultItem {
            id,
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_column_widths_are_floored_fractions() {
        assert_eq!(column_widths(100), [10, 70, 10, 20]);
        assert_eq!(column_widths(76), [7, 53, 7, 15]);
        assert_eq!(column_widths(9), [0, 6, 0, 1]);
        assert_eq!(column_widths(0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_table_rows_column_order() {
        let mut first = item(42, "How to borrow");
        first.score = -3;
        first.view_count = 1234;
        let result = SearchResult::new(vec![first, item(7, "Second")]);

        let rows = table_rows(&result);
        assert_eq!(
            rows[0],
            ["42".to_string(), "How to borrow".into(), "-3".into(), "1234".into()]
        );
        assert_eq!(rows[1][0], "7");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_document_has_title_rule_and_answers_in_order() {
        let mut question = item(1, "Lifetimes explained");
        question.body = "Why does this not compile?".to_string();
        question.answers = vec![
            Answer {
                id: 10,
                body: "first answer".to_string(),
                ..Default::default()
            },
            Answer {
                id: 11,
                body: "second answer".to_string(),
                ..Default::default()
            },
        ];

        let doc = build_document(&question, 40);
        let lines = texts(&doc.lines);
        let find = |needle: &str| {
            lines
                .iter()
                .position(|l| l.contains(needle))
                .unwrap_or_else(|| panic!("{:?} not found in {:#?}", needle, lines))
        };

        let title = find("Lifetimes explained");
        let body = find("Why does this not compile?");
        let rule = find(&"-".repeat(40));
        let answers = find("Answers:");
        let first = find("first answer");
        let second = find("second answer");
        assert!(title < body && body < rule && rule < answers);
        assert!(answers < first && first < second);
    }

    #[test]
    fn test_answer_boxes_match_viewport_width() {
        let mut question = item(1, "Q");
        question.answers = vec![Answer {
            body: "a fairly long answer body that will certainly need to wrap inside the box".into(),
            is_accepted: true,
            ..Default::default()
        }];

        let doc = build_document(&question, 30);
        let boxed: Vec<&Line> = doc
            .lines
            .iter()
            .skip_while(|l| !line_text(l).starts_with('╭'))
            .collect();
        assert!(boxed.len() > 3, "expected a bordered block");
        for line in boxed {
            assert_eq!(line.width(), 30, "box line {:?}", line_text(line));
        }
    }

    #[test]
    fn test_placeholder_item_builds_a_document() {
        let doc = build_document(&ResultItem::default(), 20);
        let lines = texts(&doc.lines);
        assert!(lines.iter().any(|l| l.contains("No answers yet.")));
    }

    #[test]
    fn test_comments_document_lists_question_and_answer_comments() {
        let mut question = item(1, "Q");
        question.comments = vec![Comment {
            owner: "ferris".into(),
            score: 2,
            body: "good question".into(),
        }];
        question.answers = vec![Answer::default()];

        let lines = texts(&build_comments(&question, 40).lines);
        assert!(lines.iter().any(|l| l.contains("ferris")));
        assert!(lines.iter().any(|l| l.contains("good question")));
        assert!(lines.iter().any(|l| l.contains("On answer 1")));
        assert!(lines.iter().any(|l| l.contains("No comments.")));
    }

    #[test]
    fn test_help_lists_quit_key() {
        let lines = texts(&help_document().lines);
        assert!(lines.iter().any(|l| l.contains("Esc") && l.contains("quit")));
    }

    #[test]
    fn test_wrap_line_short_line_untouched() {
        let lines = wrap_line(Line::from("    indented code"), 80);
        assert_eq!(texts(&lines), vec!["    indented code"]);
    }

    #[test]
    fn test_wrap_line_wraps_long_line() {
        let lines = wrap_line(Line::from("Hello world this is a test"), 12);
        assert_eq!(texts(&lines), vec!["Hello world", "this is a", "test"]);
    }

    #[test]
    fn test_wrap_line_long_word() {
        let lines = wrap_line(Line::from("supercalifragilisticexpialidocious"), 10);
        assert_eq!(
            texts(&lines),
            vec!["supercalif", "ragilistic", "expialidoc", "ious"]
        );
    }

    #[test]
    fn test_wrap_line_keeps_span_styles() {
        let red = Style::default().fg(Color::Red);
        let line = Line::from(vec![
            Span::raw("plain words then "),
            Span::styled("styled", red),
            Span::raw(" tail"),
        ]);
        let lines = wrap_line(line, 12);
        let styled = lines
            .iter()
            .flat_map(|l| l.spans.iter())
            .find(|s| s.content == "styled")
            .expect("styled span survives wrapping");
        assert_eq!(styled.style, red);
    }
}
