use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "sketchdesk";

/// Data dir from settings, else the platform data dir, else `./.sketchdesk`.
pub fn resolve_app_data_dir(configured: Option<&Path>) -> std::io::Result<PathBuf> {
    let app_data_dir = match configured {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(format!(".{}", APP_DIR_NAME))),
    };
    ensure_dir(&app_data_dir)?;
    Ok(app_data_dir)
}

/// Where downloads land: settings, else the user's download dir, else the data dir.
pub fn resolve_download_dir(
    configured: Option<&Path>,
    app_data_dir: &Path,
) -> std::io::Result<PathBuf> {
    let download_dir = match configured {
        Some(dir) => dir.to_path_buf(),
        None => dirs::download_dir().unwrap_or_else(|| app_data_dir.join("downloads")),
    };
    ensure_dir(&download_dir)?;
    Ok(download_dir)
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
