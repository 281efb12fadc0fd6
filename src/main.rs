// src/main.rs

use color_eyre::eyre::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

mod app;
mod config;
mod core;
mod logging;
mod ui;

use crate::app::{App, AppState};
use crate::config::ReconConfig;
use crate::core::models::ReconReport;
use crate::core::recon::Recon;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;

    let config = ReconConfig::load()?;
    info!(
        results_dir = %config.results_dir.display(),
        timeout = ?config.command_timeout(),
        max_concurrency = ?config.concurrency_limit(),
        script_scan = config.script_scan,
        "Configuration loaded."
    );
    let recon = Arc::new(
        Recon::with_process_runner(
            config.tools.clone(),
            config.results_dir.clone(),
            config.command_timeout(),
            config.concurrency_limit(),
        )
        .with_script_scan(config.script_scan),
    );

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let result = run(&mut terminal, recon).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    result
}

async fn run(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, recon: Arc<Recon>) -> Result<()> {
    let mut app = App::new();
    let (tx, mut rx) = mpsc::channel::<ReconReport>(1);

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(&mut app, &tx, &recon)?;
        }

        if let Ok(report) = rx.try_recv() {
            app.finish_scan(report);
        }
        app.on_tick();
    }
    Ok(())
}

fn handle_events(app: &mut App, tx: &mpsc::Sender<ReconReport>, recon: &Arc<Recon>) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if app.show_disclaimer {
            match key.code {
                KeyCode::Enter => app.show_disclaimer = false,
                KeyCode::Esc => app.quit(),
                _ => {}
            }
            return Ok(());
        }
        match app.state {
            AppState::Idle => handle_idle_input(app, key.code, tx, recon),
            AppState::Finished => handle_finished_input(app, key.code),
            AppState::Scanning => handle_scanning_input(app, key.code),
        }
    }
    Ok(())
}

/// Typing a target. Letters are input here, so quitting is on Esc.
fn handle_idle_input(app: &mut App, key_code: KeyCode, tx: &mpsc::Sender<ReconReport>, recon: &Arc<Recon>) {
    match key_code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char(c) => app.input.push(c),
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Enter => {
            let Some(target) = app.validated_target() else { return };
            let cancel = CancellationToken::new();
            app.start_scan(cancel.clone());

            let tx = tx.clone();
            let recon = Arc::clone(recon);
            tokio::spawn(async move {
                let report = recon.full_scan(&target, &cancel).await;
                let _ = tx.send(report).await;
            });
        }
        _ => {}
    }
}

fn handle_scanning_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => app.quit(),
        // Stops the running tools; the partial report still arrives.
        KeyCode::Char('c') | KeyCode::Char('C') => {
            if let Some(cancel) = &app.cancel {
                cancel.cancel();
            }
        }
        KeyCode::Char('l') | KeyCode::Char('L') => app.toggle_logs(),
        _ => {}
    }
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('n') | KeyCode::Char('N') => app.reset(),
        KeyCode::Char('e') | KeyCode::Char('E') => app.export_report(),
        KeyCode::Char('l') | KeyCode::Char('L') => app.toggle_logs(),
        KeyCode::Tab => app.toggle_view(),
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        KeyCode::Left => app.scroll_logs_left(),
        KeyCode::Right => app.scroll_logs_right(),
        _ => {}
    }
}
