//! State for the three focusable sub-widgets: question input, results table
//! and document viewport. These hold data only; drawing lives in `ui`.

use crate::projection::{self, Row};
use ratatui::text::Text;
use ratatui::widgets::TableState;

/// Longest question accepted by the input box
pub const INPUT_CHAR_LIMIT: usize = 200;

/// Single-line text input with a cursor
#[derive(Debug, Clone)]
pub struct InputState {
    value: String,
    /// Cursor position (char index)
    cursor: usize,
    width: u16,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            value: String::new(),
            cursor: 0,
            width: 30,
        }
    }
}

impl InputState {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn set_width(&mut self, width: u16) {
        self.width = width;
    }

    /// Replace the content and move the cursor to the end
    pub fn set_value(&mut self, value: &str) {
        self.value = value.chars().take(INPUT_CHAR_LIMIT).collect();
        self.cursor = self.value.chars().count();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Insert at cursor position
    pub fn insert(&mut self, c: char) {
        if c == '\n' || c == '\r' || self.value.chars().count() >= INPUT_CHAR_LIMIT {
            return;
        }
        let byte_pos = self.cursor_byte_pos();
        self.value.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = self.cursor_byte_pos();
            self.value.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let byte_pos = self.cursor_byte_pos();
            self.value.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        if self.cursor < self.value.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }

    /// Convert cursor (char index) to byte position
    fn cursor_byte_pos(&self) -> usize {
        self.value
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }
}

/// Rows, selection and column layout of the results table
#[derive(Debug, Clone)]
pub struct ResultsTable {
    rows: Vec<Row>,
    state: TableState,
    width: u16,
    height: u16,
    column_widths: [u16; 4],
}

impl Default for ResultsTable {
    fn default() -> Self {
        let mut table = Self {
            rows: Vec::new(),
            state: TableState::default(),
            width: 0,
            height: 0,
            column_widths: [0; 4],
        };
        table.set_size(30, 10);
        table
    }
}

impl ResultsTable {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn column_widths(&self) -> [u16; 4] {
        self.column_widths
    }

    /// Resize the table; column widths follow the table width
    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.column_widths = projection::column_widths(width);
    }

    /// Replace all rows and select the first one
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.rows = rows;
        self.state = TableState::default();
        if !self.rows.is_empty() {
            self.state.select(Some(0));
        }
    }

    pub fn selected_row(&self) -> Option<&Row> {
        self.state.selected().and_then(|i| self.rows.get(i))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_row().map(|row| row[0].as_str())
    }

    pub fn select(&mut self, index: usize) {
        if !self.rows.is_empty() {
            self.state.select(Some(index.min(self.rows.len() - 1)));
        }
    }

    pub fn up(&mut self, n: usize) {
        let current = self.state.selected().unwrap_or(0);
        self.select(current.saturating_sub(n));
    }

    pub fn down(&mut self, n: usize) {
        let current = self.state.selected().unwrap_or(0);
        self.select(current.saturating_add(n));
    }

    pub fn first(&mut self) {
        self.select(0);
    }

    pub fn last(&mut self) {
        self.select(self.rows.len().saturating_sub(1));
    }

    /// Rows visible at once (minus the header)
    pub fn page_size(&self) -> usize {
        usize::from(self.height.saturating_sub(1)).max(1)
    }
}

/// Scrollable pre-rendered document
#[derive(Debug, Clone)]
pub struct Viewport {
    content: Text<'static>,
    offset: usize,
    width: u16,
    height: u16,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            content: Text::default(),
            offset: 0,
            width: 30,
            height: 3,
        }
    }
}

impl Viewport {
    pub fn content(&self) -> &Text<'static> {
        &self.content
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn line_count(&self) -> usize {
        self.content.lines.len()
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Replace the content, keeping the offset if it is still valid
    pub fn set_content(&mut self, content: Text<'static>) {
        self.content = content;
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn max_offset(&self) -> usize {
        self.line_count().saturating_sub(usize::from(self.height))
    }

    pub fn scroll_to(&mut self, offset: usize) {
        self.offset = offset.min(self.max_offset());
    }

    pub fn goto_top(&mut self) {
        self.offset = 0;
    }

    pub fn goto_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_to(self.offset.saturating_add(lines));
    }

    pub fn page_up(&mut self) {
        self.scroll_up(usize::from(self.height.max(1)));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(usize::from(self.height.max(1)));
    }

    /// How far through the document the view is, 0-100
    pub fn scroll_percent(&self) -> u16 {
        let max = self.max_offset();
        if max == 0 {
            100
        } else {
            (self.offset * 100 / max) as u16
        }
    }
}
