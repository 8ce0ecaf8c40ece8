use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine as _;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::image_model::ImageBlob;
use crate::domain::sketch::SketchResult;
use crate::infrastructure::object_urls::ObjectUrlRegistry;

pub const SHARE_TITLE: &str = "Police Sketch";
pub const CLIPBOARD_NOTICE: &str = "Share link copied to clipboard!";
pub const PRINT_HEADER: &str = "POLICE SKETCH - CONFIDENTIAL";

#[derive(Debug, Clone)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub file_name: String,
    pub file: ImageBlob,
}

/// An opened print document. Written once, closed, then printed.
pub trait PrintDocument: Send {
    fn write(&mut self, html: &str) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn print(&mut self) -> Result<()>;
}

/// Side effects the result view needs from whatever surface hosts it.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Saves the image for the user and returns where it went.
    fn save_file(&self, filename: &str, blob: &ImageBlob) -> Result<PathBuf>;

    fn supports_native_share(&self) -> bool;
    async fn native_share(&self, payload: SharePayload) -> Result<()>;

    fn supports_clipboard(&self) -> bool;
    async fn write_clipboard(&self, text: &str) -> Result<()>;

    /// Synchronous, user-visible message.
    fn notify(&self, message: &str);

    /// Address of the page the user is looking at.
    fn page_url(&self) -> String;

    /// `None` when the surface refuses to open a new document.
    fn open_print_document(&self) -> Option<Box<dyn PrintDocument>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareOutcome {
    Shared,
    CopiedToClipboard,
    Unavailable,
}

pub struct ResultActions {
    platform: Arc<dyn Platform>,
    images: Arc<ObjectUrlRegistry>,
}

impl ResultActions {
    pub fn new(platform: Arc<dyn Platform>, images: Arc<ObjectUrlRegistry>) -> Self {
        Self { platform, images }
    }

    pub fn default_filename() -> String {
        format!("sketch-{}.png", chrono::Utc::now().timestamp_millis())
    }

    /// Fire and forget. Failures are logged, never returned.
    pub fn download(&self, image_url: &str, filename: Option<&str>) {
        let filename = filename
            .map(str::to_string)
            .unwrap_or_else(Self::default_filename);
        let Some(blob) = self.images.resolve(image_url) else {
            warn!(image_url, "Image is no longer available for download");
            return;
        };
        match self.platform.save_file(&filename, &blob) {
            Ok(path) => info!(path = %path.display(), "Sketch downloaded"),
            Err(err) => warn!(error = %err, filename = %filename, "Download failed"),
        }
    }

    /// Native share first; any failure or missing support falls back to the clipboard.
    pub async fn share(&self, sketch: &SketchResult) -> ShareOutcome {
        if self.platform.supports_native_share() {
            match self.native_share(sketch).await {
                Ok(()) => return ShareOutcome::Shared,
                Err(err) => warn!(error = %err, "Error sharing"),
            }
        }
        self.fallback_share(sketch).await
    }

    async fn native_share(&self, sketch: &SketchResult) -> Result<()> {
        let file = self
            .images
            .resolve(&sketch.image_url)
            .ok_or_else(|| AppError::NotFound(format!("image for {}", sketch.id)))?;
        let payload = SharePayload {
            title: SHARE_TITLE.to_string(),
            text: format!("Generated sketch: {}", sketch.prompt),
            file_name: sketch.share_filename(),
            file: ImageBlob {
                bytes: file.bytes,
                content_type: "image/png".to_string(),
            },
        };
        self.platform.native_share(payload).await
    }

    async fn fallback_share(&self, sketch: &SketchResult) -> ShareOutcome {
        if !self.platform.supports_clipboard() {
            return ShareOutcome::Unavailable;
        }
        let text = format!(
            "Check out this police sketch: {}\n{}",
            sketch.prompt,
            self.platform.page_url()
        );
        match self.platform.write_clipboard(&text).await {
            Ok(()) => {
                self.platform.notify(CLIPBOARD_NOTICE);
                ShareOutcome::CopiedToClipboard
            }
            Err(err) => {
                warn!(error = %err, "Clipboard write failed");
                ShareOutcome::Unavailable
            }
        }
    }

    /// Opens a print-only document and prints it. Returns false if the
    /// document could not be opened or shown; neither case is an error.
    pub fn print(&self, sketch: &SketchResult) -> bool {
        let Some(mut document) = self.platform.open_print_document() else {
            return false;
        };
        let image_src = match self.images.resolve(&sketch.image_url) {
            Some(blob) => data_url(&blob),
            None => sketch.image_url.clone(),
        };
        let generated_at = chrono::DateTime::from_timestamp_millis(sketch.timestamp)
            .unwrap_or_else(chrono::Utc::now)
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let html = render_print_document(&image_src, &generated_at);

        let printed = document
            .write(&html)
            .and_then(|_| document.close())
            .and_then(|_| document.print());
        match printed {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "Print failed");
                false
            }
        }
    }
}

pub fn data_url(blob: &ImageBlob) -> String {
    format!(
        "data:{};base64,{}",
        blob.content_type,
        base64::engine::general_purpose::STANDARD.encode(&blob.bytes)
    )
}

pub fn render_print_document(image_src: &str, generated_at: &str) -> String {
    format!(
        r#"<html>
  <head>
    <title>Police Sketch Print</title>
    <style>
      body {{ margin: 0; padding: 20px; display: flex; justify-content: center; align-items: center; min-height: 100vh; font-family: Arial, sans-serif; }}
      .print-container {{ text-align: center; }}
      img {{ max-width: 100%; height: auto; border: 2px solid #333; }}
      .header {{ margin-bottom: 20px; font-size: 18px; font-weight: bold; color: #333; }}
      .footer {{ margin-top: 20px; font-size: 12px; color: #666; }}
    </style>
  </head>
  <body onload="window.print()">
    <div class="print-container">
      <div class="header">{header}</div>
      <img src="{src}" alt="Police Sketch" />
      <div class="footer">Generated: {generated_at}</div>
    </div>
  </body>
</html>
"#,
        header = PRINT_HEADER,
        src = image_src.replace('"', "&quot;"),
        generated_at = generated_at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorded {
        saved: Vec<(String, Vec<u8>)>,
        shared: Vec<SharePayload>,
        clipboard: Vec<String>,
        notices: Vec<String>,
        printed: Vec<String>,
    }

    #[derive(Default)]
    struct FakePlatform {
        native_share: bool,
        native_share_fails: bool,
        clipboard: bool,
        blocks_documents: bool,
        print_fails: bool,
        recorded: Arc<Mutex<Recorded>>,
    }

    struct FakeDocument {
        html: String,
        fails: bool,
        recorded: Arc<Mutex<Recorded>>,
    }

    impl PrintDocument for FakeDocument {
        fn write(&mut self, html: &str) -> Result<()> {
            self.html.push_str(html);
            Ok(())
        }
        fn close(&mut self) -> Result<()> {
            Ok(())
        }
        fn print(&mut self) -> Result<()> {
            if self.fails {
                return Err(AppError::IoError("no browser".into()));
            }
            self.recorded.lock().unwrap().printed.push(self.html.clone());
            Ok(())
        }
    }

    #[async_trait]
    impl Platform for FakePlatform {
        fn save_file(&self, filename: &str, blob: &ImageBlob) -> Result<PathBuf> {
            self.recorded
                .lock()
                .unwrap()
                .saved
                .push((filename.to_string(), blob.bytes.clone()));
            Ok(PathBuf::from(filename))
        }
        fn supports_native_share(&self) -> bool {
            self.native_share
        }
        async fn native_share(&self, payload: SharePayload) -> Result<()> {
            if self.native_share_fails {
                return Err(AppError::Internal("share sheet dismissed".into()));
            }
            self.recorded.lock().unwrap().shared.push(payload);
            Ok(())
        }
        fn supports_clipboard(&self) -> bool {
            self.clipboard
        }
        async fn write_clipboard(&self, text: &str) -> Result<()> {
            self.recorded.lock().unwrap().clipboard.push(text.to_string());
            Ok(())
        }
        fn notify(&self, message: &str) {
            self.recorded.lock().unwrap().notices.push(message.to_string());
        }
        fn page_url(&self) -> String {
            "http://127.0.0.1:3001/".to_string()
        }
        fn open_print_document(&self) -> Option<Box<dyn PrintDocument>> {
            if self.blocks_documents {
                return None;
            }
            Some(Box::new(FakeDocument {
                html: String::new(),
                fails: self.print_fails,
                recorded: self.recorded.clone(),
            }))
        }
    }

    fn setup(platform: FakePlatform) -> (ResultActions, SketchResult, Arc<Mutex<Recorded>>) {
        let recorded = platform.recorded.clone();
        let images = Arc::new(ObjectUrlRegistry::new());
        let url = images.create(ImageBlob::png(vec![4, 5, 6]));
        let sketch = SketchResult::new(url, "male, 30s, scar".to_string());
        (ResultActions::new(Arc::new(platform), images), sketch, recorded)
    }

    #[test]
    fn test_download_saves_resolved_bytes() {
        let (actions, sketch, recorded) = setup(FakePlatform::default());
        actions.download(&sketch.image_url, Some(&sketch.download_filename()));
        let recorded = recorded.lock().unwrap();
        assert_eq!(recorded.saved.len(), 1);
        assert_eq!(recorded.saved[0].0, sketch.download_filename());
        assert_eq!(recorded.saved[0].1, vec![4, 5, 6]);
    }

    #[test]
    fn test_download_default_filename() {
        let (actions, sketch, recorded) = setup(FakePlatform::default());
        actions.download(&sketch.image_url, None);
        let name = recorded.lock().unwrap().saved[0].0.clone();
        assert!(name.starts_with("sketch-") && name.ends_with(".png"));
    }

    #[test]
    fn test_download_of_stale_reference_is_silent() {
        let (actions, _, recorded) = setup(FakePlatform::default());
        actions.download("blob:sketchdesk/gone", None);
        assert!(recorded.lock().unwrap().saved.is_empty());
    }

    #[tokio::test]
    async fn test_native_share_sends_file_and_caption() {
        let (actions, sketch, recorded) = setup(FakePlatform {
            native_share: true,
            clipboard: true,
            ..Default::default()
        });
        assert_eq!(actions.share(&sketch).await, ShareOutcome::Shared);
        let recorded = recorded.lock().unwrap();
        let payload = &recorded.shared[0];
        assert_eq!(payload.title, "Police Sketch");
        assert_eq!(payload.text, "Generated sketch: male, 30s, scar");
        assert_eq!(payload.file_name, format!("sketch-{}.png", sketch.id));
        assert_eq!(payload.file.bytes, vec![4, 5, 6]);
        assert!(recorded.clipboard.is_empty());
    }

    #[tokio::test]
    async fn test_share_falls_back_when_native_is_unsupported() {
        let (actions, sketch, recorded) = setup(FakePlatform {
            clipboard: true,
            ..Default::default()
        });
        assert_eq!(actions.share(&sketch).await, ShareOutcome::CopiedToClipboard);
        let recorded = recorded.lock().unwrap();
        assert_eq!(
            recorded.clipboard,
            vec!["Check out this police sketch: male, 30s, scar\nhttp://127.0.0.1:3001/".to_string()]
        );
        assert_eq!(recorded.notices, vec![CLIPBOARD_NOTICE.to_string()]);
    }

    #[tokio::test]
    async fn test_share_falls_back_when_native_fails() {
        let (actions, sketch, recorded) = setup(FakePlatform {
            native_share: true,
            native_share_fails: true,
            clipboard: true,
            ..Default::default()
        });
        assert_eq!(actions.share(&sketch).await, ShareOutcome::CopiedToClipboard);
        assert_eq!(recorded.lock().unwrap().clipboard.len(), 1);
    }

    #[tokio::test]
    async fn test_share_without_any_capability() {
        let (actions, sketch, recorded) = setup(FakePlatform::default());
        assert_eq!(actions.share(&sketch).await, ShareOutcome::Unavailable);
        assert!(recorded.lock().unwrap().notices.is_empty());
    }

    #[test]
    fn test_print_writes_header_image_and_footer() {
        let (actions, sketch, recorded) = setup(FakePlatform::default());
        assert!(actions.print(&sketch));
        let recorded = recorded.lock().unwrap();
        let html = &recorded.printed[0];
        assert!(html.contains(PRINT_HEADER));
        assert!(html.contains("data:image/png;base64,BAUG"));
        assert!(html.contains("Generated: "));
    }

    #[test]
    fn test_print_reports_false_when_document_cannot_be_shown() {
        let (actions, sketch, recorded) = setup(FakePlatform {
            print_fails: true,
            ..Default::default()
        });
        assert!(!actions.print(&sketch));
        assert!(recorded.lock().unwrap().printed.is_empty());
    }

    #[test]
    fn test_print_is_a_no_op_when_blocked() {
        let (actions, sketch, recorded) = setup(FakePlatform {
            blocks_documents: true,
            ..Default::default()
        });
        assert!(!actions.print(&sketch));
        assert!(recorded.lock().unwrap().printed.is_empty());
    }
}
