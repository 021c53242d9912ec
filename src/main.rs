mod cli;
mod config;
mod db;
mod error;
mod models;
mod ui;

use std::io;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::cli::{Cli, Command};
use crate::db::ClientStore;
use crate::ui::{
    client_wizard::{
        handle_input as handle_client_wizard_input, render_client_wizard, ClientWizardAction,
        ClientWizardState,
    },
    clients::{handle_input as handle_clients_input, render_clients, ClientAction, ClientsState},
};

// Represents the current screen in the app
enum AppScreen {
    Clients,
    ClientWizard,
}

// Main application state
struct AppState<S> {
    store: S,
    screen: AppScreen,
    clients_state: Option<ClientsState>,
    client_wizard_state: Option<ClientWizardState>,
}

impl<S: ClientStore> AppState<S> {
    fn new(store: S) -> Self {
        Self {
            store,
            screen: AppScreen::Clients,
            clients_state: None,
            client_wizard_state: None,
        }
    }
}

/// Logs go to stderr so `list` and `show` output can be piped
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("client_registry={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::init()?;
    init_tracing(&config.log_level);

    let store = db::init(&config).await?;

    match cli.command {
        None | Some(Command::Tui) => run_tui(store).await,
        Some(command) => {
            cli::check_backend(store.is_persistent(), &command)?;
            let mut stdout = io::stdout().lock();
            cli::run(&store, command, &mut stdout).await
        }
    }
}

async fn run_tui<S: ClientStore>(store: S) -> Result<()> {
    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app_state = AppState::new(store);

    let result = match load_clients_screen(&mut app_state, None).await {
        Ok(()) => run_app(&mut terminal, &mut app_state).await,
        Err(err) => Err(err),
    };

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!("terminal UI stopped: {err:#}");
    }

    result
}

async fn run_app<B: Backend, S: ClientStore>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState<S>,
) -> Result<()> {
    loop {
        terminal.draw(|f| match app_state.screen {
            AppScreen::Clients => {
                if let Some(state) = &mut app_state.clients_state {
                    render_clients(f, state);
                }
            }
            AppScreen::ClientWizard => {
                if let Some(state) = &mut app_state.client_wizard_state {
                    render_client_wizard(f, state);
                }
            }
        })?;

        let should_quit = match app_state.screen {
            AppScreen::Clients => handle_clients_screen(app_state).await?,
            AppScreen::ClientWizard => handle_client_wizard_screen(app_state).await?,
        };

        if should_quit {
            break;
        }
    }

    Ok(())
}

async fn load_clients_screen<S: ClientStore>(
    app_state: &mut AppState<S>,
    select: Option<i32>,
) -> Result<()> {
    let clients = app_state.store.list_clients().await?;

    // Search and sort survive a reload
    let query = app_state
        .clients_state
        .as_ref()
        .map(|state| state.query().clone())
        .unwrap_or_default();
    let state = ClientsState::with_query(clients, query);
    app_state.clients_state = Some(match select {
        Some(id) => state.with_selection(id),
        None => state,
    });
    app_state.client_wizard_state = None;
    app_state.screen = AppScreen::Clients;

    Ok(())
}

async fn handle_clients_screen<S: ClientStore>(app_state: &mut AppState<S>) -> Result<bool> {
    let Some(state) = &mut app_state.clients_state else {
        return Ok(false);
    };

    match handle_clients_input(state)? {
        Some(ClientAction::Quit) => return Ok(true),
        Some(ClientAction::NewClient) => {
            app_state.client_wizard_state = Some(ClientWizardState::new());
            app_state.screen = AppScreen::ClientWizard;
        }
        Some(ClientAction::EditClient(id)) => {
            let client = app_state.store.get_client(id).await?;
            app_state.client_wizard_state = Some(ClientWizardState::from_existing(&client));
            app_state.screen = AppScreen::ClientWizard;
        }
        Some(ClientAction::DeleteClient(id)) => {
            app_state.store.delete_client(id).await?;
            info!(id, "deleted client");
            load_clients_screen(app_state, None).await?;
        }
        None => {}
    }

    Ok(false)
}

async fn handle_client_wizard_screen<S: ClientStore>(app_state: &mut AppState<S>) -> Result<bool> {
    let Some(state) = &mut app_state.client_wizard_state else {
        return Ok(false);
    };

    match handle_client_wizard_input(state)? {
        Some(ClientWizardAction::Cancel) => {
            let selected = state.client_id();
            load_clients_screen(app_state, selected).await?;
        }
        Some(ClientWizardAction::Save { id: None, client }) => {
            let created = app_state.store.create_client(&client).await?;
            info!(id = created.id(), "added client {}", created);
            load_clients_screen(app_state, Some(created.id())).await?;
        }
        Some(ClientWizardAction::Save { id: Some(id), client }) => {
            let updated = app_state.store.update_client(id, &client).await?;
            info!(id, "updated client {}", updated);
            load_clients_screen(app_state, Some(id)).await?;
        }
        None => {}
    }

    Ok(false)
}
