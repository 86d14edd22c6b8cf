pub mod app;
pub mod browser;
pub mod config;
pub mod dispatcher;
pub mod event;
pub mod logging;
pub mod markdown;
pub mod notify;
pub mod projection;
pub mod search;
pub mod theme;
pub mod tui;
pub mod ui;
pub mod widgets;

pub use app::{App, AppSettings, Focus, State};
pub use event::{AppEvent, EventSink};
pub use notify::{Notification, NotificationId, Severity};
pub use search::{
    Answer, Comment, ResultItem, SearchBackend, SearchError, SearchParams, SearchRequest,
    SearchResult,
};
