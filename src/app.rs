use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap;
use crate::infrastructure::config::Settings;
use crate::interfaces::http::start_server;

pub fn run() {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();
            error!(error = %err, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.as_str()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let result = actix_web::rt::System::new().block_on(async move {
        let open_browser = settings.server.open_browser;
        let page_url = settings.server.page_url();

        let state = bootstrap::setup(settings).map_err(|err| err.to_string())?;
        let server = start_server(state).map_err(|err| err.to_string())?;
        info!("SketchDesk listening on {}", page_url);

        if open_browser {
            if let Err(err) = open::that(&page_url) {
                warn!(error = %err, "Could not open browser, visit {} manually", page_url);
            }
        }

        server.await.map_err(|err| err.to_string())
    });

    if let Err(err) = result {
        error!(error = %err, "SketchDesk stopped");
        std::process::exit(1);
    }
}
