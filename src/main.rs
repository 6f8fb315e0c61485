mod app;
mod cli;
mod config;
mod content;
mod dispatch;
mod input;
mod k8s;
mod layout;
mod model;
mod pane;
mod portforward;
mod ui;
mod viewport;

use anyhow::{Context, Result};
use app::{AppEvent, AppState, Effect};
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use crossterm::event::{Event, EventStream, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use dispatch::{DispatchError, Dispatcher, compact_error};
use futures::StreamExt;
use k8s::{KubeGateway, ResourceManager};
use portforward::PortForwardRegistry;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    let settings = Settings::load(&args)?;
    init_tracing(&args.log_filter, settings.log_file.as_deref())?;
    if let Some(source) = &settings.source {
        info!(path = %source.display(), "loaded config");
    }

    let (backend, context, status) = connect_backend(&settings).await;
    let state = AppState::new(settings.view, settings.namespace.clone(), context, status);

    run(state, backend, &settings).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder.with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }

    Ok(())
}

/// Builds the cluster backend. Failure is not fatal: the dashboard still
/// starts and every load reports the missing backend.
async fn connect_backend(
    settings: &Settings,
) -> (Option<Arc<dyn ResourceManager>>, String, String) {
    let connected = timeout(settings.request_timeout, KubeGateway::connect(&settings.kube))
        .await
        .unwrap_or_else(|_| {
            Err(anyhow::anyhow!(
                "timed out after {:?} connecting to Kubernetes",
                settings.request_timeout
            ))
        });

    match connected {
        Ok(gateway) => {
            let context = gateway.context().to_string();
            info!(%context, "connected to cluster");
            let status = format!("✓ Connected to context {context}");
            let backend: Arc<dyn ResourceManager> = Arc::new(gateway);
            (Some(backend), context, status)
        }
        Err(error) => {
            let message = compact_error(&error);
            warn!(error = %message, "kubernetes client unavailable");
            let context = settings.kube.context.clone().unwrap_or_default();
            (None, context, format!("⚠ K8s init failed: {message}"))
        }
    }
}

async fn run(
    state: AppState,
    backend: Option<Arc<dyn ResourceManager>>,
    settings: &Settings,
) -> Result<()> {
    let mut terminal = init_terminal()?;
    let run_result = run_loop(&mut terminal, state, backend, settings).await;
    let restore_result = restore_terminal(&mut terminal);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<TuiTerminal> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut TuiTerminal) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    mut state: AppState,
    backend: Option<Arc<dyn ResourceManager>>,
    settings: &Settings,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let dispatcher = Dispatcher::new(backend, tx.clone(), settings.request_timeout);
    let mut registry = PortForwardRegistry::new(tx.clone());

    let size = terminal.size().context("failed to read terminal size")?;
    state = app::update(
        state,
        AppEvent::Resize {
            width: size.width,
            height: size.height,
        },
    )
    .0;

    let mut reader = EventStream::new();
    // The first tick fires immediately and issues the startup loads.
    let mut ticker = interval(settings.refresh_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        terminal
            .draw(|frame| ui::render(frame, &state))
            .context("failed to render terminal frame")?;

        if !state.running() {
            break;
        }

        let event = tokio::select! {
            maybe_event = reader.next() => match maybe_event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Some(Ok(Event::Resize(width, height))) => AppEvent::Resize { width, height },
                Some(Ok(_)) => continue,
                Some(Err(error)) => {
                    warn!(%error, "terminal event error");
                    continue;
                }
                None => {
                    warn!("terminal event stream closed");
                    break;
                }
            },
            _ = ticker.tick() => AppEvent::Tick,
            Some(event) = rx.recv() => event,
        };

        if let AppEvent::PortForwardExited { key, .. } = &event {
            registry.reap(key);
        }

        let (next, effects) = app::update(state, event);
        state = next;
        run_effects(effects, &dispatcher, &mut registry, &tx).await;
    }

    if !registry.is_empty() {
        info!(count = registry.len(), "stopping port-forwards on exit");
        registry.stop_all().await;
    }
    Ok(())
}

async fn run_effects(
    effects: Vec<Effect>,
    dispatcher: &Dispatcher,
    registry: &mut PortForwardRegistry,
    events: &UnboundedSender<AppEvent>,
) {
    for effect in effects {
        match effect {
            Effect::Load(request) => dispatcher.load(request),
            Effect::Mutate(mutation) => dispatcher.mutate(mutation),
            Effect::StartPortForward {
                key,
                namespace,
                remote_port,
            } => {
                let event = if !dispatcher.is_initialized() {
                    AppEvent::PortForwardFailed {
                        key,
                        error: DispatchError::NotInitialized.to_string(),
                    }
                } else {
                    match registry.start(key.clone(), &namespace, remote_port) {
                        Ok(pid) => {
                            debug!(%key, pid, "spawned kubectl port-forward");
                            AppEvent::PortForwardStarted { key, remote_port }
                        }
                        Err(error) => AppEvent::PortForwardFailed {
                            key,
                            error: compact_error(&error),
                        },
                    }
                };
                let _ = events.send(event);
            }
            Effect::StopPortForward(key) => {
                registry.stop_one(&key).await;
            }
            Effect::StopAllPortForwards => {
                let count = registry.stop_all().await;
                let _ = events.send(AppEvent::PortForwardsStopped { count });
            }
            Effect::Quit => {
                registry.stop_all().await;
            }
        }
    }
}
