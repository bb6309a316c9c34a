//! scoutdesk - a terminal front end for scout group administration.
//!
//! Keyboard-driven views over the group's scouts, leaders, parent
//! committee, patrols, weekly programs and outdoor activities, backed by
//! a hosted REST backend with a local JSON cache.

mod actions;
mod app;
mod data;
mod form;
mod ui;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scoutdesk_core::config::{ENV_API_KEY, ENV_PASSWORD, ENV_USERNAME};
use scoutdesk_core::export::{render_form, write_export, DocumentRenderer, ExportFormat};
use scoutdesk_core::models::{Dirigente, FamiliarScout, Patrulla, Scout};
use scoutdesk_core::template::{dngi02_source, dngi03_source, FormKind};
use scoutdesk_core::{ApiClient, Config, CredentialStore, Session};

use app::{App, AppState};
use data::Data;
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_PREFIX: &str = "scoutdesk.log";

const USAGE: &str = "usage: scoutdesk [--login | --check-templates | --export dngi02|dngi03 <id> pdf|docx [dir]]";

/// Initialize the tracing subscriber.
///
/// Logs go to a daily file under the cache directory so they never draw
/// over the terminal UI. Falls back to stderr when there is no cache dir.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // RUST_LOG controls the level (e.g. RUST_LOG=scoutdesk=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match config.cache_dir() {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir.join("logs"), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = Config::load().unwrap_or_default();
    config.apply_env();
    let _log_guard = init_tracing(&config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => {}
        Some("--login") => return login_command(config).await,
        Some("--check-templates") => return check_templates(),
        Some("--export") => return export_command(&config, &args[1..]).await,
        Some("-h") | Some("--help") => {
            println!("{}", USAGE);
            return Ok(());
        }
        Some(other) => bail!("unknown argument {:?}\n{}", other, USAGE),
    }

    info!("scoutdesk starting");

    // Create the app before touching the terminal so setup errors print normally
    let mut app = App::new().await?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Cached data shows behind the login overlay
    app.load_from_cache();

    if !app.is_authenticated() {
        app.start_login();
    } else if app.is_cache_stale() {
        app.refresh_all_background();
    }

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("scoutdesk shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so background results get picked up
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

// ============================================================================
// CLI commands
// ============================================================================

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// API key from the environment or keychain, prompting (and storing) if missing.
fn api_key_or_prompt() -> Result<String> {
    if let Some(key) = std::env::var(ENV_API_KEY).ok().filter(|k| !k.trim().is_empty()) {
        return Ok(key);
    }
    if let Ok(key) = CredentialStore::get_api_key() {
        return Ok(key);
    }
    let key = rpassword::prompt_password("Backend API key: ")?;
    if key.trim().is_empty() {
        bail!("An API key is required");
    }
    if let Err(e) = CredentialStore::store_api_key(key.trim()) {
        warn!(error = %e, "Failed to store API key");
    }
    Ok(key.trim().to_string())
}

/// Sign in from the terminal and persist the session.
async fn login_command(mut config: Config) -> Result<()> {
    let api_key = api_key_or_prompt()?;
    let api = ApiClient::new(config.backend_url()?, &api_key)?;

    let default_user = std::env::var(ENV_USERNAME)
        .ok()
        .or_else(|| config.last_username.clone())
        .unwrap_or_default();
    let email = if default_user.is_empty() {
        prompt("Email: ")?
    } else {
        let entered = prompt(&format!("Email [{}]: ", default_user))?;
        if entered.is_empty() {
            default_user
        } else {
            entered
        }
    };
    let password = match std::env::var(ENV_PASSWORD) {
        Ok(p) if !p.is_empty() => p,
        _ => rpassword::prompt_password("Password: ")?,
    };

    let session_data = api
        .authenticate(&email, &password)
        .await
        .context("Login failed")?;

    if let Err(e) = CredentialStore::store(&email, &password) {
        warn!(error = %e, "Failed to store credentials");
    }

    let mut session = Session::new(config.cache_dir()?);
    session.update(session_data);
    session.save()?;

    config.last_username = Some(email.clone());
    config.save()?;

    println!("Logged in as {}", email);
    Ok(())
}

/// Validate the built-in form layouts.
fn check_templates() -> Result<()> {
    let mut failed = false;
    for kind in [FormKind::Dngi02, FormKind::Dngi03] {
        let layout = kind.layout();
        let problems = layout.problems();
        if problems.is_empty() {
            println!("{}: ok ({} rows)", layout.code, layout.rows.len());
        } else {
            failed = true;
            println!("{}: {} problem(s)", layout.code, problems.len());
            for problem in problems {
                println!("  {}", problem);
            }
        }
    }
    if failed {
        bail!("template validation failed");
    }
    Ok(())
}

/// Render one DNGI form without starting the TUI.
async fn export_command(config: &Config, args: &[String]) -> Result<()> {
    let (Some(kind), Some(id), Some(format)) = (args.first(), args.get(1), args.get(2)) else {
        bail!("{}", USAGE);
    };
    let kind = FormKind::parse(kind).with_context(|| format!("unknown form {:?}", kind))?;
    let id: i64 = id.parse().with_context(|| format!("invalid id {:?}", id))?;
    let format = ExportFormat::parse(format)
        .filter(|f| !matches!(f, ExportFormat::Xlsx))
        .with_context(|| format!("unsupported format {:?}, use pdf or docx", format))?;
    let dir = args
        .get(3)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.export_dir());

    let mut session = Session::new(config.cache_dir()?);
    session.load()?;
    let token = session
        .token()
        .context("No saved session. Run `scoutdesk --login` first.")?
        .to_string();
    let api = ApiClient::new(config.backend_url()?, &api_key_or_prompt()?)?.with_token(token);

    let today = chrono::Local::now().date_naive();
    let (source, apellidos, nombres) = match kind {
        FormKind::Dngi02 => {
            let data = Data {
                scouts: api.list_where::<Scout>("id", id).await?,
                patrullas: api.list::<Patrulla>().await?,
                familiares: api.list_where::<FamiliarScout>("scout_id", id).await?,
                ..Default::default()
            };
            let scout = data.scout(id).with_context(|| format!("scout {} not found", id))?;
            let source = dngi02_source(
                scout,
                data.patrulla(scout.patrulla_id),
                data.apoderado_of(id),
                today,
            )?;
            (source, scout.apellidos.clone(), scout.nombres.clone())
        }
        FormKind::Dngi03 => {
            let dirigente = api
                .list_where::<Dirigente>("id", id)
                .await?
                .into_iter()
                .next()
                .with_context(|| format!("leader {} not found", id))?;
            let source = dngi03_source(&dirigente, today)?;
            (source, dirigente.apellidos, dirigente.nombres)
        }
    };

    let bytes = render_form(kind, &source, config.group_name(), format)?;
    let file_name = kind.file_name(&apellidos, &nombres, format.renderer().extension());
    let path = write_export(&dir, &file_name, &bytes)?;
    println!("{}", path.display());
    Ok(())
}
