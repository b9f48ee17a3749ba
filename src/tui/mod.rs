pub mod action;
pub mod state;
pub mod view;

use crate::cache::SnapshotCache;
use crate::config::Config;
use crate::logging::init_logging;
use crate::model::Event;
use crate::store;
use crate::sync::{EventSurface, EventSync, IntentOutcome};
use crate::tui::action::{Action, AppEvent};
use crate::tui::state::AppState;
use crate::tui::view::draw;
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as TermEvent, KeyCode, KeyEvent,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{io, time::Duration};
use tokio::sync::mpsc;

/// Forwards every list change to the UI loop.
struct ChannelSurface {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventSurface for ChannelSurface {
    fn events_changed(&self, events: &[Event]) {
        let _ = self.tx.send(AppEvent::EventsLoaded(events.to_vec()));
    }
}

fn report(tx: &mpsc::UnboundedSender<AppEvent>, sync: &mut EventSync, done: &str) {
    let notices = sync.take_notices();
    if notices.is_empty() {
        let _ = tx.send(AppEvent::Status(done.to_string()));
    }
    for notice in notices {
        let _ = tx.send(AppEvent::Error(notice.to_string()));
    }
}

pub async fn run() -> Result<()> {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        error!("event=panic module=tui info={info}");
        default_hook(info);
    }));

    let config = Config::load().context("loading configuration")?;
    if let Some(log_dir) = Config::log_dir() {
        init_logging(&config.log_level, &log_dir).context("starting logging")?;
    }
    let store_config = config.store_config()?;
    info!(
        "event=tui_start module=tui status=ok backend={:?}",
        config.backend
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new(config.sort_by);
    let (action_tx, mut action_rx) = mpsc::channel::<Action>(10);
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let cache = config.resolved_cache_dir().map(SnapshotCache::new);

    // Single owner of the event list
    tokio::spawn(async move {
        let store = match store::connect(&store_config) {
            Ok(s) => s,
            Err(e) => {
                let _ = event_tx.send(AppEvent::Error(e.to_string()));
                return;
            }
        };
        let mut sync = EventSync::new(store).with_surface(ChannelSurface {
            tx: event_tx.clone(),
        });
        if let Some(cache) = cache {
            sync = sync.with_cache(cache);
        }

        sync.hydrate();
        let _ = event_tx.send(AppEvent::Status("Fetching events...".to_string()));
        sync.load().await;
        report(&event_tx, &mut sync, "Ready.");

        while let Some(action) = action_rx.recv().await {
            match action {
                Action::Quit => break,
                Action::Reload => {
                    let _ = event_tx.send(AppEvent::Status("Reloading...".to_string()));
                    sync.load().await;
                    report(&event_tx, &mut sync, "Reloaded.");
                }
                Action::Apply(intent) => {
                    let _ = event_tx.send(AppEvent::Status("Saving...".to_string()));
                    match sync.apply(intent).await {
                        IntentOutcome::Applied => report(&event_tx, &mut sync, "Saved."),
                        IntentOutcome::Rejected(reason) => {
                            let _ = event_tx.send(AppEvent::Status(format!("Skipped: {reason}")));
                        }
                        IntentOutcome::Failed(_) => report(&event_tx, &mut sync, ""),
                    }
                }
            }
        }
    });

    // UI Loop
    loop {
        terminal.draw(|f| draw(f, &mut app_state))?;

        while let Ok(event) = event_rx.try_recv() {
            match event {
                AppEvent::EventsLoaded(events) => {
                    app_state.set_events(events);
                    app_state.loading = false;
                }
                AppEvent::Error(msg) => {
                    app_state.message = format!("Error: {}", msg);
                    app_state.loading = false;
                }
                AppEvent::Status(msg) => {
                    app_state.message = msg;
                }
            }
        }

        if crossterm::event::poll(Duration::from_millis(50))? {
            match event::read()? {
                TermEvent::Mouse(mouse_event) => match mouse_event.kind {
                    MouseEventKind::ScrollDown => app_state.next(),
                    MouseEventKind::ScrollUp => app_state.previous(),
                    _ => {}
                },
                TermEvent::Key(key) => {
                    if !handle_key(key, &mut app_state, &action_tx).await {
                        let _ = action_tx.send(Action::Quit).await;
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    info!("event=tui_stop module=tui status=ok");

    Ok(())
}

/// Returns `false` when the user asked to quit.
async fn handle_key(key: KeyEvent, app_state: &mut AppState, action_tx: &mpsc::Sender<Action>) -> bool {
    if app_state.controller.is_form_open() {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => {
                if let Some(intent) = app_state.controller.submit() {
                    let _ = action_tx.send(Action::Apply(intent)).await;
                }
            }
            KeyCode::Char('d') if ctrl => {
                if let Some(intent) = app_state.controller.delete() {
                    let _ = action_tx.send(Action::Apply(intent)).await;
                }
            }
            KeyCode::F(2) => {
                if let Some(intent) = app_state.controller.delete() {
                    let _ = action_tx.send(Action::Apply(intent)).await;
                }
            }
            KeyCode::Esc => app_state.controller.cancel(),
            KeyCode::Tab => app_state.controller.form_mut().cycle_priority(),
            KeyCode::Char(c) => app_state.controller.form_mut().enter_char(c),
            KeyCode::Backspace => app_state.controller.form_mut().delete_char(),
            KeyCode::Left => app_state.controller.form_mut().move_cursor_left(),
            KeyCode::Right => app_state.controller.form_mut().move_cursor_right(),
            _ => {}
        }
        return true;
    }

    match key.code {
        KeyCode::Char('q') => return false,
        KeyCode::Char('a') => {
            app_state.compose_on_cursor();
        }
        KeyCode::Enter | KeyCode::Char('e') => {
            app_state.edit_selected();
        }
        KeyCode::Down | KeyCode::Char('j') => app_state.next(),
        KeyCode::Up | KeyCode::Char('k') => app_state.previous(),
        KeyCode::Char('l') | KeyCode::Right => app_state.shift_day(1),
        KeyCode::Char('h') | KeyCode::Left => app_state.shift_day(-1),
        KeyCode::Char('L') => app_state.shift_day(7),
        KeyCode::Char('H') => app_state.shift_day(-7),
        KeyCode::Char('>') => app_state.extend_range(1),
        KeyCode::Char('<') => app_state.extend_range(-1),
        KeyCode::Char('t') => app_state.toggle_timed(),
        KeyCode::Char('+') => app_state.shift_time(30),
        KeyCode::Char('-') => app_state.shift_time(-30),
        KeyCode::Char('s') => {
            app_state.toggle_sort();
            app_state.message = format!("Sorted by {}", app_state.sort_by.label());
        }
        KeyCode::Char('r') => {
            let _ = action_tx.send(Action::Reload).await;
        }
        _ => {}
    }
    true
}
