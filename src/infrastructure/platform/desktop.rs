use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::{NamedTempFile, TempDir};
use tracing::{info, warn};

use crate::application::use_cases::result_actions::{Platform, PrintDocument, SharePayload};
use crate::domain::error::{AppError, Result};
use crate::domain::image_model::ImageBlob;
use crate::interfaces::http::{add_log, LogEntry};

/// Result actions for a desktop machine serving the page on loopback.
///
/// Downloads go to the download dir, the clipboard is the OS clipboard and
/// printing opens a standalone document in the default browser. There is no
/// system share sheet, so sharing always takes the clipboard route.
pub struct DesktopPlatform {
    download_dir: PathBuf,
    page_url: String,
    logs: Arc<Mutex<Vec<LogEntry>>>,
    // Print documents live here until the platform is dropped.
    print_dir: Option<TempDir>,
}

impl DesktopPlatform {
    pub fn new(download_dir: PathBuf, page_url: String, logs: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        let print_dir = match tempfile::Builder::new().prefix("sketchdesk-print-").tempdir() {
            Ok(dir) => Some(dir),
            Err(err) => {
                warn!(error = %err, "No temp dir for print documents, printing is disabled");
                None
            }
        };
        Self {
            download_dir,
            page_url,
            logs,
            print_dir,
        }
    }

    pub fn print_dir(&self) -> Option<&Path> {
        self.print_dir.as_ref().map(TempDir::path)
    }

    /// Keeps only the final path component so a name cannot escape the dir.
    fn target_path(&self, filename: &str) -> PathBuf {
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "sketch.png".to_string());
        self.download_dir.join(name)
    }
}

#[async_trait]
impl Platform for DesktopPlatform {
    fn save_file(&self, filename: &str, blob: &ImageBlob) -> Result<PathBuf> {
        if !self.download_dir.exists() {
            fs::create_dir_all(&self.download_dir)?;
        }
        let path = self.target_path(filename);
        fs::write(&path, &blob.bytes)?;
        add_log(
            &self.logs,
            "INFO",
            "Download",
            &format!("Saved {}", path.display()),
        );
        Ok(path)
    }

    fn supports_native_share(&self) -> bool {
        false
    }

    async fn native_share(&self, _payload: SharePayload) -> Result<()> {
        Err(AppError::Internal(
            "Native share is not available on this platform".to_string(),
        ))
    }

    fn supports_clipboard(&self) -> bool {
        true
    }

    async fn write_clipboard(&self, text: &str) -> Result<()> {
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            let mut clipboard = arboard::Clipboard::new()
                .map_err(|e| AppError::Internal(format!("Clipboard unavailable: {}", e)))?;
            clipboard
                .set_text(text)
                .map_err(|e| AppError::Internal(format!("Clipboard write failed: {}", e)))
        })
        .await
        .map_err(|e| AppError::Internal(format!("Clipboard task failed: {}", e)))?
    }

    fn notify(&self, message: &str) {
        info!(notice = %message, "User notice");
        add_log(&self.logs, "INFO", "Notice", message);
    }

    fn page_url(&self) -> String {
        self.page_url.clone()
    }

    fn open_print_document(&self) -> Option<Box<dyn PrintDocument>> {
        let dir = self.print_dir()?;
        match tempfile::Builder::new()
            .prefix("sketch-print-")
            .suffix(".html")
            .tempfile_in(dir)
        {
            Ok(file) => Some(Box::new(BrowserPrintDocument {
                file: Some(file),
                path: None,
            })),
            Err(err) => {
                warn!(error = %err, "Could not create print document");
                None
            }
        }
    }
}

/// An HTML file that prints itself once the browser has loaded it.
struct BrowserPrintDocument {
    file: Option<NamedTempFile>,
    path: Option<PathBuf>,
}

impl PrintDocument for BrowserPrintDocument {
    fn write(&mut self, html: &str) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| AppError::Internal("Print document already closed".to_string()))?;
        file.write_all(html.as_bytes())?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            // The browser reads the file after we return, so it has to outlive the handle.
            let (_, path) = file
                .keep()
                .map_err(|e| AppError::IoError(format!("Failed to keep print document: {}", e)))?;
            self.path = Some(path);
        }
        Ok(())
    }

    fn print(&mut self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| AppError::Internal("Print document not closed".to_string()))?;
        open::that(path)
            .map_err(|e| AppError::IoError(format!("Failed to open print document: {}", e)))
    }
}
