//! `kiln develop` command implementation.
//!
//! Orchestrates the develop lifecycle:
//! - Config loading and persisted state restore
//! - Page registration from the pages directory
//! - HTTP server with SSE live updates
//! - File watching feeding the scan compiler
//! - The develop coordinator driving rounds and page-data flushes
//! - State persistence on Ctrl+C

use crate::cli::DevelopArgs;
use crate::config::KilnConfig;
use crate::dev::{
    sync_pages, CliReporter, DevServer, DevServerState, FileChange, FileWatcher, PageDataWriter,
    ScanCompiler, SharedState,
};
use crate::error::{CliError, Result, ResultExt};
use crate::ui;
use kiln_core::{DevelopCoordinator, MemoryStore, Program, StateStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::debug;

/// Execute the develop command.
///
/// # Process Flow
///
/// 1. Resolve the project root and load configuration
/// 2. Restore persisted state and register pages
/// 3. Bind the server and start watching
/// 4. Run the first round through the develop coordinator
/// 5. Serve until Ctrl+C, then persist state
///
/// # Errors
///
/// Returns errors for invalid configuration, unreadable state, a port that
/// can't be bound, a watcher that can't start, or a server that stops.
pub async fn execute(args: DevelopArgs) -> Result<()> {
    let root = resolve_root(args.cwd.as_deref())?;
    let config = KilnConfig::load(&args, &root)?;
    config.validate()?;

    let src_dir = config.resolve(&root, &config.src_dir);
    let pages_dir = config.resolve(&root, &config.pages_dir);
    let out_dir = config.resolve(&root, &config.out_dir);
    let state_file = config.state_file(&root);

    if !src_dir.is_dir() {
        return Err(CliError::FileNotFound(src_dir))
            .with_hint("Set srcDir in kiln.config.json to the directory holding your sources");
    }

    ui::info(&format!("Working directory: {}", root.display()));

    let store = Arc::new(MemoryStore::load(&state_file)?);
    sync_pages(store.as_ref(), &root, &pages_dir, &out_dir);
    let page_count: usize = store.snapshot().components.values().map(|p| p.len()).sum();
    ui::info(&format!("Found {} pages", page_count));

    let compiler = Arc::new(ScanCompiler::new(root.clone(), src_dir)?);

    let server_state: SharedState = Arc::new(DevServerState::new(out_dir.clone(), store.clone()));
    let server = DevServer::bind(&config.host, config.port, server_state.clone()).await?;
    let mut server_task = tokio::spawn(server.serve());

    let (watcher, changes) = FileWatcher::new(root.clone(), config.effective_watch_ignore())?;
    ui::info(&format!("Watching for changes in: {}", watcher.root().display()));
    let watch_task = tokio::spawn(watch_loop(
        changes,
        WatchContext {
            compiler: compiler.clone(),
            store: store.clone(),
            root: root.clone(),
            pages_dir,
            out_dir: out_dir.clone(),
        },
    ));

    let site_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "your site".to_string());

    let coordinator = DevelopCoordinator::new()
        .program(Program {
            directory: root.clone(),
            host: config.host.clone(),
            port: config.port,
            https: config.https,
            open: config.open,
        })
        .server(server_state)
        .store(store.clone())
        .compiler(compiler)
        .writer(Arc::new(PageDataWriter::new(out_dir)))
        .reporter(Arc::new(CliReporter::new(site_name)))
        .debounce(Duration::from_millis(config.debounce_ms));

    let outcome = tokio::select! {
        started = coordinator.start() => match started {
            Ok(handles) => {
                ui::info("Press Ctrl+C to stop");
                let outcome = tokio::select! {
                    _ = signal::ctrl_c() => Ok(()),
                    exit = &mut server_task => Err(server_exit(exit)),
                };
                debug!(rounds = handles.session.rounds_completed(), "develop session ending");
                outcome
            }
            Err(e) => Err(e.into()),
        },
        _ = signal::ctrl_c() => Ok(()),
        exit = &mut server_task => Err(server_exit(exit)),
    };

    ui::info("Shutting down develop server...");
    drop(watcher);
    watch_task.abort();
    server_task.abort();

    store
        .persist(&state_file)
        .context("Failed to save develop state")?;

    outcome?;
    ui::success("Develop server stopped");
    Ok(())
}

/// Project root from `--cwd`, relative to the current directory.
fn resolve_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir()?;
    let root = match cwd {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => path_clean::clean(current.join(dir)),
        None => current,
    };

    if !root.is_dir() {
        return Err(CliError::FileNotFound(root));
    }
    Ok(root)
}

fn server_exit(exit: std::result::Result<Result<()>, JoinError>) -> CliError {
    match exit {
        Ok(Err(e)) => e,
        Ok(Ok(())) => CliError::Server("Server stopped unexpectedly".to_string()),
        Err(e) => CliError::Server(format!("Server task failed: {}", e)),
    }
}

struct WatchContext {
    compiler: Arc<ScanCompiler>,
    store: Arc<MemoryStore>,
    root: PathBuf,
    pages_dir: PathBuf,
    out_dir: PathBuf,
}

/// Forward file changes: page files added or removed update the store first,
/// then the compiler hears about every change.
async fn watch_loop(mut changes: mpsc::Receiver<FileChange>, ctx: WatchContext) {
    while let Some(change) = changes.recv().await {
        let path = change.path();

        if change.is_structural() && path.starts_with(&ctx.pages_dir) {
            let sync = sync_pages(ctx.store.as_ref(), &ctx.root, &ctx.pages_dir, &ctx.out_dir);
            if sync.created > 0 {
                ui::info(&format!("Added {} page(s)", sync.created));
            }
            if sync.deleted > 0 {
                ui::info(&format!("Removed {} page(s)", sync.deleted));
            }
        }

        ctx.compiler.notify_change(path);
    }
}
