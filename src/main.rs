//! Pokedash - terminal dashboard for a Pokemon sprite collection

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventKind,
    HandlerResponse, Keybindings, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use pokedash::action::Action;
use pokedash::api::ApiClient;
use pokedash::config::{Config, Overrides};
use pokedash::effect::Effect;
use pokedash::logging::{default_log_dir, init_logging};
use pokedash::modal::ModalKind;
use pokedash::reducer::reducer;
use pokedash::state::{AppState, TICK_MS};
use pokedash::ui::{DashComponentId, DashContext, DashboardUi};

#[derive(Parser, Debug)]
#[command(name = "pokedash")]
#[command(about = "Terminal dashboard for a Pokemon sprite collection")]
struct Args {
    /// Settings file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dashboard server, e.g. http://127.0.0.1:5000
    #[arg(long)]
    base_url: Option<String>,

    /// How long failed modals stay open, in milliseconds
    #[arg(long)]
    error_dismiss_ms: Option<u64>,

    /// Reload stats and catalog every N seconds (0 disables)
    #[arg(long)]
    refresh_interval: Option<u64>,

    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let Args {
        config,
        base_url,
        error_dismiss_ms,
        refresh_interval,
        log_dir,
        debug: debug_args,
    } = Args::parse();

    let config = Config::load(config.as_deref())
        .map_err(io::Error::other)?
        .apply(Overrides {
            base_url,
            error_dismiss_ms,
            refresh_interval_secs: refresh_interval,
            log_dir,
        });

    let log_dir = config.log_dir.clone().unwrap_or_else(default_log_dir);
    let _log_guard = init_logging(&log_dir);
    info!(base_url = %config.base_url, log_dir = %log_dir.display(), "starting pokedash");

    let client = ApiClient::new(&config.base_url, config.request_timeout()).map_err(io::Error::other)?;

    let debug = DebugSession::new(debug_args);

    // Export JSON schemas if requested
    debug.save_state_schema::<AppState>().map_err(debug_error)?;
    debug.save_actions_schema::<Action>().map_err(debug_error)?;

    let initial = AppState::new(config.base_url.clone(), config.error_dismiss_ms);
    let state = debug
        .load_state_or_else_async(move || async move { Ok::<AppState, io::Error>(initial) })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    // ===== Terminal setup =====
    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(
        &mut terminal,
        &debug,
        store,
        replay_actions,
        client,
        config.refresh_interval(),
    )
    .await;

    // ===== Cleanup =====
    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    info!("pokedash exited");
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
    client: ApiClient,
    refresh_interval: Option<Duration>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(DashboardUi::new()));
    let mut bus: EventBus<AppState, Action, DashComponentId, DashContext> = EventBus::new();
    let keybindings: Keybindings<DashContext> = Keybindings::new();

    let ui_generations = Rc::clone(&ui);
    bus.register(DashComponentId::Generations, move |event, state| {
        ui_generations
            .borrow_mut()
            .handle_generations_event(&event.kind, state)
    });

    let ui_tabs = Rc::clone(&ui);
    bus.register(DashComponentId::Tabs, move |event, state| {
        ui_tabs.borrow_mut().handle_tabs_event(&event.kind, state)
    });

    let ui_gallery = Rc::clone(&ui);
    bus.register(DashComponentId::Gallery, move |event, state| {
        ui_gallery
            .borrow_mut()
            .handle_gallery_event(&event.kind, state)
    });

    let ui_details = Rc::clone(&ui);
    bus.register(DashComponentId::Details, move |event, state| {
        ui_details
            .borrow_mut()
            .handle_details_event(&event.kind, state)
    });

    let ui_missing = Rc::clone(&ui);
    bus.register(DashComponentId::Missing, move |event, state| {
        ui_missing
            .borrow_mut()
            .handle_missing_event(&event.kind, state)
    });

    bus.register_global(|event, state| match event.kind {
        EventKind::Resize(width, height) => {
            HandlerResponse::action(Action::UiTerminalResize(width, height)).with_render()
        }
        EventKind::Key(key) => match key.code {
            KeyCode::Char('q') => HandlerResponse::action(Action::Quit),
            _ if state.active_modal().is_some() => HandlerResponse::ignored(),
            KeyCode::Tab => HandlerResponse::action(Action::FocusNext),
            KeyCode::BackTab => HandlerResponse::action(Action::FocusPrev),
            KeyCode::Char('r') | KeyCode::F(5) => HandlerResponse::action(Action::Refresh),
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime
                    .subscriptions()
                    .interval("tick", Duration::from_millis(TICK_MS), || Action::Tick);
                if let Some(every) = refresh_interval {
                    runtime
                        .subscriptions()
                        .interval("refresh", every, || Action::Refresh);
                }
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(effect, ctx, &client),
        )
        .await
}

/// Run effects as keyed tasks. Re-spawning a key replaces the task still running under it.
fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, client: &ApiClient) {
    match effect {
        Effect::LoadStats => {
            let client = client.clone();
            ctx.tasks().spawn(TaskKey::new("stats"), async move {
                match client.fetch_stats().await {
                    Ok(stats) => Action::StatsDidLoad(stats),
                    Err(e) => Action::StatsDidError(e.to_string()),
                }
            });
        }
        Effect::LoadCatalog => {
            let client = client.clone();
            ctx.tasks().spawn(TaskKey::new("catalog"), async move {
                match client.fetch_catalog().await {
                    Ok(document) => Action::CatalogDidLoad(document),
                    Err(e) => Action::CatalogDidError(e.to_string()),
                }
            });
        }
        Effect::LoadDetails {
            request,
            name,
            generation,
        } => {
            let client = client.clone();
            let key = TaskKey::new(ModalKind::Details.fetch_task_key());
            ctx.tasks().spawn(key, async move {
                match client.fetch_details(&name, generation).await {
                    Ok(details) => Action::DetailsDidLoad { request, details },
                    Err(e) => Action::DetailsDidError {
                        request,
                        error: e.to_string(),
                    },
                }
            });
        }
        Effect::LoadMissing {
            request,
            generation,
        } => {
            let client = client.clone();
            let key = TaskKey::new(ModalKind::Missing.fetch_task_key());
            ctx.tasks().spawn(key, async move {
                match client.fetch_missing(generation).await {
                    Ok(report) => Action::MissingDidLoad { request, report },
                    Err(e) => Action::MissingDidError {
                        request,
                        error: e.to_string(),
                    },
                }
            });
        }
        Effect::ScheduleDismiss {
            modal,
            request,
            after_ms,
        } => {
            ctx.tasks().debounce(
                modal.dismiss_task_key(),
                Duration::from_millis(after_ms),
                async move { Action::ModalDismissExpired { modal, request } },
            );
        }
        Effect::CancelDismiss { modal } => {
            ctx.tasks().cancel(&TaskKey::new(modal.dismiss_task_key()));
        }
        Effect::RequestAcquisition {
            kind,
            name,
            generation,
        } => {
            let client = client.clone();
            ctx.tasks().spawn(TaskKey::new("acquisition"), async move {
                match client.request_acquisition(kind, &name, generation).await {
                    Ok(()) => Action::AcquisitionDidRespond(format!(
                        "Requested {} for {name}",
                        kind.label()
                    )),
                    Err(e) => Action::AcquisitionDidRespond(e.to_string()),
                }
            });
        }
    }
}
