//! The single inbound event pipeline.
//!
//! Terminal input, the spinner tick, search outcomes and notification
//! expiries all arrive on one channel and are consumed by the main loop one
//! at a time, so every mutation of [`App`](crate::app::App) is serialized.

use crate::notify::NotificationId;
use crate::search::{SearchError, SearchResult};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard, mouse, paste and resize events from the terminal
    Terminal(crossterm::event::Event),
    /// Periodic tick driving the spinner
    Tick,
    /// The dispatched search finished (possibly with no items)
    SearchCompleted(SearchResult),
    /// The search backend itself failed
    SearchFailed(SearchError),
    /// A notification's display time ran out
    NotificationExpired(NotificationId),
}

/// Cloneable handle for pushing events into the loop
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: UnboundedSender<AppEvent>,
}

impl EventSink {
    /// Send an event. Returns false once the loop has shut down.
    pub fn send(&self, event: AppEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(err) => {
                debug!(event = ?err.0, "Event loop gone, dropping event");
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create the event pipeline
pub fn channel() -> (EventSink, UnboundedReceiver<AppEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, rx)
}

/// Forward terminal events into the pipeline from a dedicated thread.
///
/// crossterm's `read` blocks, so it gets an OS thread rather than a task.
pub fn spawn_input_reader(sink: EventSink) -> thread::JoinHandle<()> {
    thread::spawn(move || loop {
        // Poll with a timeout so the thread notices when the loop is gone
        match crossterm::event::poll(Duration::from_millis(250)) {
            Ok(true) => match crossterm::event::read() {
                Ok(event) => {
                    if !sink.send(AppEvent::Terminal(event)) {
                        return;
                    }
                }
                Err(err) => {
                    warn!(error = %err, "Failed to read terminal event");
                    return;
                }
            },
            Ok(false) => {
                if sink.is_closed() {
                    return;
                }
            }
            Err(err) => {
                warn!(error = %err, "Failed to poll terminal events");
                return;
            }
        }
    })
}

/// Send [`AppEvent::Tick`] every `period` until the loop shuts down
pub fn spawn_ticker(sink: EventSink, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            if !sink.send(AppEvent::Tick) {
                break;
            }
        }
    })
}
