use std::path::PathBuf;

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");

/// Directory holding the board's local state (database, log files).
///
/// Respects the `KANBAN_ASSET_DIR` environment variable. Debug builds default to
/// `dev_assets/` at the workspace root so development data stays out of the
/// user's data directory.
pub fn asset_dir() -> PathBuf {
    if let Ok(path) = std::env::var("KANBAN_ASSET_DIR") {
        return PathBuf::from(path);
    }

    if cfg!(debug_assertions) {
        PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("dev", "kanban", "kanban-board")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| {
                tracing::warn!("No home directory available, using current directory for assets");
                PathBuf::from(".")
            })
    }
    // ✔ macOS → ~/Library/Application Support/dev.kanban.kanban-board
    // ✔ Linux → ~/.local/share/kanban-board   (respects XDG_DATA_HOME)
    // ✔ Windows → %APPDATA%\kanban\kanban-board
}

/// Create the asset directory if it does not exist yet.
pub fn ensure_asset_dir() -> std::io::Result<PathBuf> {
    let dir = asset_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(dir)
}

/// SQLite file inside the asset directory used when `DATABASE_URL` is not set.
pub const DATABASE_FILE_NAME: &str = "kanban.sqlite";

/// Subdirectory of the asset directory holding rotating log files.
pub const LOG_DIR_NAME: &str = "logs";
