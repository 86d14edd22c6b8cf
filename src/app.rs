use crate::dispatcher::SearchDispatcher;
use crate::event::{AppEvent, EventSink};
use crate::notify::{Notification, NotificationId, NotificationTimer, Severity, DEFAULT_NOTIFICATION_DELAY};
use crate::projection;
use crate::search::{ResultItem, SearchBackend, SearchError, SearchParams, SearchRequest, SearchResult};
use crate::widgets::{InputState, ResultsTable, Viewport};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};
use std::io;
use std::time::Duration;
use throbber_widgets_tui::ThrobberState;
use tracing::{debug, info, warn};

/// Lines scrolled per mouse wheel notch
const MOUSE_SCROLL_LINES: usize = 3;

/// Where the app is in the ask → browse flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    AwaitingInput,
    SearchPending,
    ShowingResultList,
    ShowingResultDetail,
    ShowingComments,
    ShowingHelp,
}

/// Which sub-widget receives unhandled input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Table,
    Document,
    Nothing,
}

impl State {
    /// Focus follows directly from the state
    pub fn focus(self) -> Focus {
        match self {
            State::AwaitingInput => Focus::Input,
            State::SearchPending => Focus::Nothing,
            State::ShowingResultList => Focus::Table,
            State::ShowingResultDetail | State::ShowingComments | State::ShowingHelp => {
                Focus::Document
            }
        }
    }

    /// States whose view is the document viewport
    pub fn shows_document(self) -> bool {
        self.focus() == Focus::Document
    }
}

/// A state to return to, with the scroll position it was left at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HistoryEntry {
    state: State,
    scroll: usize,
}

/// Opens a link outside the terminal
pub type LinkOpener = fn(&str) -> io::Result<()>;

/// Startup options for [`App`]
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub params: SearchParams,
    pub notification_delay: Duration,
    pub mouse: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            params: SearchParams::default(),
            notification_delay: DEFAULT_NOTIFICATION_DELAY,
            mouse: true,
        }
    }
}

pub struct App {
    /// Current state; only changed through the transition methods
    state: State,
    /// States to return to on Back, most recent last
    history: Vec<HistoryEntry>,
    /// Question input box
    pub input: InputState,
    /// Results table
    pub table: ResultsTable,
    /// Document viewport for question detail, comments and help
    pub viewport: Viewport,
    /// Spinner shown while a search is pending
    pub spinner: ThrobberState,
    mouse_enabled: bool,
    /// Most recent search result
    result: SearchResult,
    /// Question shown in the detail view
    detail: Option<ResultItem>,
    /// Fatal error; replaces every view while set
    error: Option<String>,
    notification: Option<Notification>,
    params: SearchParams,
    dispatcher: SearchDispatcher,
    timer: NotificationTimer,
    opener: LinkOpener,
    /// Should quit
    pub should_quit: bool,
}

impl App {
    /// Must be called within a tokio runtime; searches and notification
    /// timers run as tasks on it.
    pub fn new<B: SearchBackend>(backend: B, sink: EventSink, settings: AppSettings) -> Self {
        Self {
            state: State::AwaitingInput,
            history: Vec::new(),
            input: InputState::default(),
            table: ResultsTable::default(),
            viewport: Viewport::default(),
            spinner: ThrobberState::default(),
            mouse_enabled: settings.mouse,
            result: SearchResult::default(),
            detail: None,
            error: None,
            notification: None,
            params: settings.params,
            dispatcher: SearchDispatcher::new(backend, sink.clone()),
            timer: NotificationTimer::new(sink, settings.notification_delay),
            opener: crate::browser::open,
            should_quit: false,
        }
    }

    /// Replace how links are opened
    pub fn with_opener(mut self, opener: LinkOpener) -> Self {
        self.opener = opener;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn focus(&self) -> Focus {
        self.state.focus()
    }

    pub fn mouse_enabled(&self) -> bool {
        self.mouse_enabled
    }

    pub fn result(&self) -> &SearchResult {
        &self.result
    }

    pub fn detail(&self) -> Option<&ResultItem> {
        self.detail.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    /// Whether Back would go anywhere from here
    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    /// Process one event from the pipeline
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Terminal(event) => self.handle_terminal_event(event),
            AppEvent::Tick => {
                if self.state == State::SearchPending {
                    self.spinner.calc_next();
                }
            }
            AppEvent::SearchCompleted(result) => self.on_search_completed(result),
            AppEvent::SearchFailed(err) => self.on_search_failed(err),
            AppEvent::NotificationExpired(id) => self.on_notification_expired(id),
        }
    }

    pub fn handle_terminal_event(&mut self, event: Event) {
        match event {
            // On Windows, crossterm sends both Press and Release events.
            // Only handle Press to avoid double input.
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => self.on_resize(width, height),
            Event::Paste(text) => {
                if self.error.is_none() && self.focus() == Focus::Input {
                    text.chars().for_each(|c| self.input.insert(c));
                }
            }
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.should_quit = true;
                return;
            }
            KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('s') if ctrl => {
                self.toggle_mouse();
                return;
            }
            _ => {}
        }

        // A latched error swallows everything except dismissal
        if self.error.is_some() {
            if key.code == KeyCode::Backspace {
                self.dismiss_error();
            }
            return;
        }

        match key.code {
            KeyCode::F(1) => self.show_help(),
            KeyCode::Enter => match self.state {
                State::AwaitingInput => self.submit(),
                State::ShowingResultList => self.open_selected(),
                _ => {}
            },
            KeyCode::Backspace if self.state != State::AwaitingInput => self.go_back(),
            KeyCode::Char('c') if self.state == State::ShowingResultDetail && !ctrl => {
                self.show_comments()
            }
            KeyCode::Char('o')
                if !ctrl
                    && matches!(
                        self.state,
                        State::ShowingResultList | State::ShowingResultDetail
                    ) =>
            {
                self.open_link()
            }
            _ => self.forward_key(key),
        }
    }

    /// Default handling by whichever widget has focus
    fn forward_key(&mut self, key: KeyEvent) {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match self.focus() {
            Focus::Input => match key.code {
                KeyCode::Char(c) if plain => self.input.insert(c),
                KeyCode::Backspace => self.input.backspace(),
                KeyCode::Delete => self.input.delete(),
                KeyCode::Left => self.input.left(),
                KeyCode::Right => self.input.right(),
                KeyCode::Home => self.input.home(),
                KeyCode::End => self.input.end(),
                _ => {}
            },
            Focus::Table => {
                let page = self.table.page_size();
                match key.code {
                    KeyCode::Up | KeyCode::Char('k') => self.table.up(1),
                    KeyCode::Down | KeyCode::Char('j') => self.table.down(1),
                    KeyCode::PageUp => self.table.up(page),
                    KeyCode::PageDown => self.table.down(page),
                    KeyCode::Home | KeyCode::Char('g') => self.table.first(),
                    KeyCode::End | KeyCode::Char('G') => self.table.last(),
                    _ => {}
                }
            }
            Focus::Document => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.viewport.scroll_up(1),
                KeyCode::Down | KeyCode::Char('j') => self.viewport.scroll_down(1),
                KeyCode::PageUp => self.viewport.page_up(),
                KeyCode::PageDown | KeyCode::Char(' ') => self.viewport.page_down(),
                KeyCode::Home | KeyCode::Char('g') => self.viewport.goto_top(),
                KeyCode::End | KeyCode::Char('G') => self.viewport.goto_bottom(),
                _ => {}
            },
            Focus::Nothing => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !self.mouse_enabled || self.error.is_some() {
            return;
        }
        match (mouse.kind, self.focus()) {
            (MouseEventKind::ScrollUp, Focus::Table) => self.table.up(1),
            (MouseEventKind::ScrollDown, Focus::Table) => self.table.down(1),
            (MouseEventKind::ScrollUp, Focus::Document) => self.viewport.scroll_up(MOUSE_SCROLL_LINES),
            (MouseEventKind::ScrollDown, Focus::Document) => {
                self.viewport.scroll_down(MOUSE_SCROLL_LINES)
            }
            _ => {}
        }
    }

    /// Recompute widget sizes for a `width` x `height` terminal
    pub fn on_resize(&mut self, width: u16, height: u16) {
        let inner_width = width.saturating_sub(4);
        let inner_height = height.saturating_sub(2);
        self.input.set_width(inner_width);
        self.table.set_size(inner_width, inner_height);
        self.viewport.set_size(inner_width, inner_height);

        // Documents are wrapped to the viewport width, so rebuild the one on screen
        if self.state.shows_document() {
            let offset = self.viewport.offset();
            self.refresh_document();
            self.viewport.scroll_to(offset);
        }
        debug!(width, height, "Resized");
    }

    /// Submit the typed question
    pub fn submit(&mut self) {
        if self.state != State::AwaitingInput {
            debug!(state = ?self.state, "Ignoring submit outside of input state");
            return;
        }
        if self.input.is_empty() {
            return;
        }

        let request = SearchRequest {
            query: self.input.value().trim().to_string(),
            params: self.params.clone(),
        };
        if !self.dispatcher.submit(request) {
            return;
        }

        self.input.clear();
        self.spinner = ThrobberState::default();
        self.transition(State::SearchPending);
    }

    fn on_search_completed(&mut self, result: SearchResult) {
        if self.state != State::SearchPending {
            debug!(state = ?self.state, "Discarding late search result");
            return;
        }

        if result.is_empty() {
            self.input.clear();
            self.history.clear();
            self.transition(State::AwaitingInput);
            self.notify("No results found", Severity::Warning);
            return;
        }

        info!(items = result.items.len(), "Showing results");
        self.table.set_rows(projection::table_rows(&result));
        self.result = result;
        self.detail = None;
        self.history = vec![HistoryEntry {
            state: State::AwaitingInput,
            scroll: 0,
        }];
        self.transition(State::ShowingResultList);
    }

    fn on_search_failed(&mut self, err: SearchError) {
        if self.state != State::SearchPending {
            debug!(state = ?self.state, error = %err, "Discarding late search failure");
            return;
        }
        warn!(error = %err, "Search failed");
        self.error = Some(err.to_string());
        self.history.clear();
        self.transition(State::AwaitingInput);
    }

    /// Clear a latched error and start over at the input box
    pub fn dismiss_error(&mut self) {
        if self.error.take().is_some() {
            self.history.clear();
            self.transition(State::AwaitingInput);
        }
    }

    /// Show the question under the table selection
    pub fn open_selected(&mut self) {
        if self.state != State::ShowingResultList {
            return;
        }
        let Some(id) = self.table.selected_id() else {
            return;
        };

        let item = match self.result.find_by_display_id(id) {
            Some(item) => item.clone(),
            None => {
                warn!(id, "Selected row not in current result, showing placeholder");
                ResultItem::default()
            }
        };

        self.viewport
            .set_content(projection::build_document(&item, self.viewport.width()));
        self.viewport.goto_top();
        self.detail = Some(item);
        self.enter(State::ShowingResultDetail);
    }

    pub fn show_comments(&mut self) {
        if self.state != State::ShowingResultDetail {
            return;
        }
        let item = self.detail.clone().unwrap_or_default();
        self.viewport
            .set_content(projection::build_comments(&item, self.viewport.width()));
        self.enter(State::ShowingComments);
        self.viewport.goto_top();
    }

    pub fn show_help(&mut self) {
        if matches!(self.state, State::SearchPending | State::ShowingHelp) {
            return;
        }
        self.enter(State::ShowingHelp);
        self.viewport.set_content(projection::help_document());
        self.viewport.goto_top();
    }

    /// Return to the previous state, one level at a time
    pub fn go_back(&mut self) {
        let Some(entry) = self.history.pop() else {
            return;
        };
        self.transition(entry.state);
        if entry.state.shows_document() {
            self.refresh_document();
            self.viewport.scroll_to(entry.scroll);
        }
    }

    pub fn toggle_mouse(&mut self) {
        self.mouse_enabled = !self.mouse_enabled;
        let message = if self.mouse_enabled {
            "Enabled mouse scroll/clicks"
        } else {
            "Disabled mouse scroll/clicks"
        };
        self.notify(message, Severity::Info);
    }

    /// Show a toast, replacing any current one
    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        self.notification = Some(self.timer.submit(message, severity));
    }

    fn on_notification_expired(&mut self, id: NotificationId) {
        if self.notification.as_ref().is_some_and(|n| n.id == id) {
            self.notification = None;
        }
    }

    fn open_link(&mut self) {
        let link = match self.state {
            State::ShowingResultDetail => self.detail.as_ref().and_then(|item| item.link.clone()),
            _ => self
                .table
                .selected_id()
                .and_then(|id| self.result.find_by_display_id(id))
                .and_then(|item| item.link.clone()),
        };
        let Some(link) = link else {
            self.notify("No link for this question", Severity::Warning);
            return;
        };

        match (self.opener)(&link) {
            Ok(()) => self.notify(format!("Opened {}", link), Severity::Info),
            Err(err) => {
                warn!(error = %err, %link, "Failed to open link");
                self.notify(format!("Could not open browser: {}", err), Severity::Error);
            }
        }
    }

    /// Rebuild the viewport content for the current document state
    fn refresh_document(&mut self) {
        let width = self.viewport.width();
        let content = match self.state {
            State::ShowingResultDetail => {
                projection::build_document(&self.detail.clone().unwrap_or_default(), width)
            }
            State::ShowingComments => {
                projection::build_comments(&self.detail.clone().unwrap_or_default(), width)
            }
            State::ShowingHelp => projection::help_document(),
            _ => return,
        };
        self.viewport.set_content(content);
    }

    /// Move forward to `next`, remembering where we came from
    fn enter(&mut self, next: State) {
        self.history.push(HistoryEntry {
            state: self.state,
            scroll: self.viewport.offset(),
        });
        self.transition(next);
    }

    fn transition(&mut self, next: State) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Transition");
        }
        self.state = next;
    }
}
