use std::io;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use log::{debug, error, info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use cmdshelf::store::{CommandStore, StoreError};
use cmdshelf::tui::app::{App, AppEvent};
use cmdshelf::tui::log_state::LogBuffer;

/// Quiet period after the last change before the store is reloaded
const RELOAD_DEBOUNCE: Duration = Duration::from_secs(1);

/// Watch the store file and send `StoreChanged` once it has been quiet for
/// `RELOAD_DEBOUNCE`.
///
/// The parent directory is watched so that editors replacing the file are
/// noticed too.
fn start_store_watcher(
    store_path: &Path,
    event_tx: mpsc::Sender<AppEvent>,
) -> Option<(Box<dyn notify::Watcher>, tokio::task::JoinHandle<()>)> {
    use notify::{EventKind, RecursiveMode, Watcher};

    let dir = match store_path.parent()? {
        p if p.as_os_str().is_empty() => Path::new(".").to_path_buf(),
        p => p.to_path_buf(),
    };
    let file_name = store_path.file_name()?.to_os_string();
    let (raw_tx, mut raw_rx) = mpsc::channel::<()>(64);

    let watcher = notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
        if let Ok(event) = res
            && matches!(
                event.kind,
                EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
            )
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(file_name.as_os_str()))
        {
            let _ = raw_tx.try_send(());
        }
    });
    let mut watcher = match watcher {
        Ok(watcher) => watcher,
        Err(e) => {
            warn!("Store file watcher not started: {e}");
            return None;
        }
    };
    if let Err(e) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
        warn!("Store file watcher not started: {e}");
        return None;
    }
    info!("Store file watcher started for {}", store_path.display());

    let debounce = tokio::spawn(async move {
        while raw_rx.recv().await.is_some() {
            // Swallow the burst of events a single save produces
            while let Ok(Some(())) = tokio::time::timeout(RELOAD_DEBOUNCE, raw_rx.recv()).await {}
            if event_tx.send(AppEvent::StoreChanged).await.is_err() {
                break;
            }
        }
    });
    Some((Box::new(watcher), debounce))
}

/// Launch the interactive TUI.
///
/// # Errors
///
/// Returns an error if terminal setup fails.
pub async fn run(
    store: CommandStore,
    load_error: Option<StoreError>,
    log_buffer: LogBuffer,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Install panic hook that restores the terminal before printing the panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let store_path = store.path().to_path_buf();
    let mut app = App::new(store, log_buffer);
    if let Some(e) = load_error {
        app.set_error(format!("{e}. Starting with an empty list."));
    }

    // Connect the logger to the app's event channel for redraw notifications
    cmdshelf::logger::connect_event_sender(app.event_tx.clone());

    let watcher = start_store_watcher(&store_path, app.event_tx.clone());

    // Main event loop
    let result = run_event_loop(&mut terminal, &mut app).await;

    // Shutdown: stop the running command, drop the watcher
    app.shutdown();
    if let Some((watcher, debounce)) = watcher {
        drop(watcher);
        debounce.abort();
    }

    // Cleanup terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        error!("Application error: {e}");
        eprintln!("Error: {e}");
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut event_stream = EventStream::new();
    let mut needs_render = true;

    // Frame rate limiter: ~60 FPS max
    let mut render_tick = tokio::time::interval(Duration::from_millis(16));
    render_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut output_dirty = false;

    loop {
        if needs_render {
            terminal.draw(|frame| app.render(frame))?;
            needs_render = false;
        }

        if app.should_quit {
            break;
        }

        tokio::select! {
            // Coalesce bursts of output into one frame
            _ = render_tick.tick() => {
                if output_dirty {
                    output_dirty = false;
                    needs_render = true;
                }
            }
            // Crossterm events
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        needs_render = true;
                        app.handle_key(key);
                    }
                    Some(Ok(Event::Resize(_w, _h))) => {
                        needs_render = true;
                    }
                    Some(Err(e)) => {
                        error!("Event error: {e}");
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
            // Runner events (output, start, finish)
            Some(run_event) = app.run_rx.recv() => {
                app.handle_run_event(run_event);
                output_dirty = true;
            }
            // App events (log, store watcher)
            maybe_app_event = app.event_rx.recv() => {
                needs_render = true;
                if let Some(app_event) = maybe_app_event {
                    app.handle_app_event(app_event);
                }
            }
            // Handle Ctrl+C even if crossterm misses it
            _ = tokio::signal::ctrl_c() => {
                debug!("Received Ctrl+C signal");
                break;
            }
        }
    }

    Ok(())
}
