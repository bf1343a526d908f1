//! Binary entry point that glues the SQLite-backed library store to the TUI.
use anyhow::Context;
use digital_library::logging::init_logging;
use digital_library::{run_app, App, Config, LibraryStore};
use tracing::info;

/// Load configuration, bring up logging and the store, then hand control to
/// the Ratatui event loop.
fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    let data_dir = config
        .ensure_data_dir()
        .context("failed to prepare the data directory")?;
    init_logging(&config.log_path(&data_dir), &config.log_level)?;

    let db_path = config.db_path(&data_dir);
    info!(path = %db_path.display(), "opening library store");
    let store = LibraryStore::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;

    let mut app = App::new(store);
    let result = run_app(&mut app);
    info!("session ended");
    result
}
