use anyhow::{Context, Result};
use clap::Parser;
use stackask::{
    app::{App, AppSettings},
    config::Config,
    event::{self, AppEvent},
    logging,
    search::StackExchangeClient,
    tui, ui,
};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

mod cli;

/// Spinner frame period
const TICK_PERIOD: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Args::parse();

    let config = args.apply(Config::load(args.config.as_deref()).context("Failed to load config")?);

    // The UI owns the terminal, so a broken log file only costs us the logs
    if let Err(err) = logging::init(&config.log_file) {
        eprintln!("warning: logging disabled: {}", err);
    }
    info!(params = ?config.params, filter = ?config.filter, "Configuration loaded and resolved");

    let client = StackExchangeClient::new(config.filter.clone(), config.page_size, config.api_key.clone())
        .context("Failed to create HTTP client")?;

    let (sink, events) = event::channel();
    let mut app = App::new(
        client,
        sink.clone(),
        AppSettings {
            params: config.params.clone(),
            notification_delay: config.notification_delay,
            mouse: config.mouse,
        },
    );

    tui::install_panic_hook();
    let mut terminal = match tui::init(config.mouse) {
        Ok(terminal) => terminal,
        Err(err) => {
            let _ = tui::restore();
            return Err(err).context("Failed to initialize terminal");
        }
    };

    event::spawn_input_reader(sink.clone());
    event::spawn_ticker(sink, TICK_PERIOD);

    let result = run(&mut terminal, &mut app, events, args.initial_query()).await;

    tui::restore()?;

    if let Err(ref err) = result {
        error!(error = %err, "Exiting after error");
    }
    result
}

async fn run(
    terminal: &mut tui::Tui,
    app: &mut App,
    mut events: UnboundedReceiver<AppEvent>,
    initial_query: Option<String>,
) -> Result<()> {
    let size = terminal.size()?;
    app.on_resize(size.width, size.height);

    if let Some(query) = initial_query {
        app.input.set_value(&query);
        app.submit();
    }

    let mut mouse_captured = app.mouse_enabled();
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        let Some(event) = events.recv().await else {
            break;
        };
        app.handle_event(event);

        // Drain whatever queued up meanwhile so mouse floods don't lag the UI
        while let Ok(event) = events.try_recv() {
            app.handle_event(event);
        }

        if app.mouse_enabled() != mouse_captured {
            mouse_captured = app.mouse_enabled();
            tui::set_mouse_capture(mouse_captured)?;
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
