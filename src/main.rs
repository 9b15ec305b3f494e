use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{fs::File, io, sync::Mutex};
use todo_client::{config::Config, ui::run_app, TodoApp, TodoClient};
use tokio::sync::mpsc::unbounded_channel;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let base_url = config.base_url()?;
    init_logging(&config)?;
    tracing::info!("using todo service at {}", base_url);

    let client = TodoClient::new(&base_url)?;
    let (tx, mut outcomes) = unbounded_channel();
    let mut app = TodoApp::new(client, tx);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut outcomes).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!("ui loop failed: {}", err);
        eprintln!("{:?}", err);
    }
    Ok(())
}

/// stdout belongs to the terminal UI, so logs go to a file.
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let path = config.log_path();
    let file = File::create(&path).with_context(|| format!("cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
