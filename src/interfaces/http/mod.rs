use crate::application::use_cases::preferences::Theme;
use crate::domain::error::AppError;
use crate::infrastructure::config::ServerSettings;
use crate::infrastructure::object_urls::ObjectUrlRegistry;
use crate::interfaces::state::AppState;
use actix_cors::Cors;
use actix_web::{
    delete, dev::Server, get, post, put, web, App, HttpResponse, HttpServer, Responder,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::{Arc, Mutex};

const INDEX_HTML: &str = include_str!("index.html");
const MAX_LOG_ENTRIES: usize = 100;

pub const EXAMPLE_PROMPTS: [&str; 4] = [
    "Male, 35-40 years old, brown hair, beard, scar on left cheek",
    "Female, 25-30 years old, blonde hair, blue eyes, round face",
    "Male, 20-25 years old, black hair, thin build, distinctive nose",
    "Female, 45-50 years old, gray hair, glasses, serious expression",
];

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub app_state: Arc<AppState>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

#[derive(Deserialize)]
pub struct CredentialRequest {
    pub value: String,
}

#[derive(Serialize)]
pub struct CredentialResponse {
    pub value: String,
    pub valid: bool,
    pub connected: bool,
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Deserialize, Serialize)]
pub struct ThemeBody {
    pub theme: Theme,
}

fn error_response(err: &AppError) -> HttpResponse {
    let body = json!({ "error": err.to_string() });
    match err {
        AppError::ValidationError(_) => HttpResponse::BadRequest().json(body),
        AppError::NotFound(_) => HttpResponse::NotFound().json(body),
        AppError::ApiError { .. } | AppError::TransportError(_) => {
            HttpResponse::BadGateway().json(body)
        }
        _ => HttpResponse::InternalServerError().json(body),
    }
}

fn credential_response(state: &AppState) -> CredentialResponse {
    CredentialResponse {
        value: state.credentials.draft(),
        valid: state.credentials.is_valid(),
        connected: !state.credentials.current().is_empty(),
    }
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

#[get("/status")]
async fn status(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(data.app_state.status())
}

#[get("/credential")]
async fn get_credential(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(credential_response(&data.app_state))
}

#[put("/credential")]
async fn put_credential(
    data: web::Data<HttpState>,
    req: web::Json<CredentialRequest>,
) -> impl Responder {
    match data.app_state.credentials.set_credential(&req.value) {
        Ok(valid) => {
            if valid {
                add_log(&data.logs, "INFO", "Credential", "Token saved and ready");
            }
            HttpResponse::Ok().json(credential_response(&data.app_state))
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "Credential",
                &format!("Failed to save token: {}", e),
            );
            error_response(&e)
        }
    }
}

#[delete("/credential")]
async fn delete_credential(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.credentials.clear() {
        Ok(()) => {
            add_log(&data.logs, "INFO", "Credential", "Token cleared");
            HttpResponse::Ok().json(credential_response(&data.app_state))
        }
        Err(e) => error_response(&e),
    }
}

#[post("/sketches")]
async fn generate(data: web::Data<HttpState>, req: web::Json<GenerateRequest>) -> impl Responder {
    add_log(
        &data.logs,
        "INFO",
        "Generator",
        &format!("Generating sketch ({} chars)", req.prompt.trim().chars().count()),
    );

    match data.app_state.generate_use_case.execute(&req.prompt).await {
        Ok(sketch) => {
            add_log(
                &data.logs,
                "INFO",
                "Generator",
                &format!("Sketch ready: {}", sketch.id),
            );
            HttpResponse::Ok().json(sketch)
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "Generator",
                &format!("Generation failed: {}", e),
            );
            error_response(&e)
        }
    }
}

#[get("/history")]
async fn get_history(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(data.app_state.history.load_all())
}

#[delete("/history")]
async fn clear_history(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.history.clear() {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => error_response(&e),
    }
}

#[get("/images/{id}")]
async fn get_image(data: web::Data<HttpState>, id: web::Path<String>) -> impl Responder {
    let url = ObjectUrlRegistry::url_for(&id);
    match data.app_state.images.resolve(&url) {
        Some(blob) => HttpResponse::Ok()
            .content_type(blob.content_type)
            .body(blob.bytes),
        None => error_response(&AppError::NotFound(
            "This image is no longer available in this session".to_string(),
        )),
    }
}

fn find_sketch(
    state: &AppState,
    id: &str,
) -> std::result::Result<crate::domain::sketch::SketchResult, HttpResponse> {
    state
        .history
        .find(id)
        .ok_or_else(|| error_response(&AppError::NotFound(format!("sketch {}", id))))
}

#[post("/sketches/{id}/download")]
async fn download(
    data: web::Data<HttpState>,
    id: web::Path<String>,
    req: Option<web::Json<DownloadRequest>>,
) -> impl Responder {
    let sketch = match find_sketch(&data.app_state, &id) {
        Ok(sketch) => sketch,
        Err(resp) => return resp,
    };
    let filename = req
        .and_then(|r| r.into_inner().filename)
        .unwrap_or_else(|| sketch.download_filename());
    data.app_state
        .result_actions
        .download(&sketch.image_url, Some(&filename));
    HttpResponse::Accepted().json(json!({ "filename": filename }))
}

#[post("/sketches/{id}/share")]
async fn share(data: web::Data<HttpState>, id: web::Path<String>) -> impl Responder {
    let sketch = match find_sketch(&data.app_state, &id) {
        Ok(sketch) => sketch,
        Err(resp) => return resp,
    };
    let outcome = data.app_state.result_actions.share(&sketch).await;
    add_log(
        &data.logs,
        "INFO",
        "Share",
        &format!("Share {}: {:?}", sketch.id, outcome),
    );
    HttpResponse::Ok().json(json!({ "outcome": outcome }))
}

#[post("/sketches/{id}/print")]
async fn print(data: web::Data<HttpState>, id: web::Path<String>) -> impl Responder {
    let sketch = match find_sketch(&data.app_state, &id) {
        Ok(sketch) => sketch,
        Err(resp) => return resp,
    };
    let opened = data.app_state.result_actions.print(&sketch);
    HttpResponse::Ok().json(json!({ "opened": opened }))
}

#[get("/preferences/theme")]
async fn get_theme(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(ThemeBody {
        theme: data.app_state.preferences.theme(),
    })
}

#[put("/preferences/theme")]
async fn put_theme(data: web::Data<HttpState>, req: web::Json<ThemeBody>) -> impl Responder {
    match data.app_state.preferences.set_theme(req.theme) {
        Ok(()) => HttpResponse::Ok().json(ThemeBody { theme: req.theme }),
        Err(e) => error_response(&e),
    }
}

#[post("/data/wipe")]
async fn wipe(data: web::Data<HttpState>) -> impl Responder {
    match data.app_state.data_wipe_use_case.execute() {
        Ok(()) => {
            add_log(&data.logs, "WARN", "Config", "All stored data cleared");
            HttpResponse::NoContent().finish()
        }
        Err(e) => {
            add_log(
                &data.logs,
                "ERROR",
                "Config",
                &format!("Failed to clear data: {}", e),
            );
            error_response(&e)
        }
    }
}

#[get("/examples")]
async fn examples() -> impl Responder {
    HttpResponse::Ok().json(EXAMPLE_PROMPTS)
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data
        .logs
        .lock()
        .map(|logs| logs.clone())
        .unwrap_or_default();
    HttpResponse::Ok().json(logs)
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry);
    if logs.len() > MAX_LOG_ENTRIES {
        logs.remove(0);
    }
}

/// Routes shared by the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index).service(
        web::scope("/api")
            .service(status)
            .service(get_credential)
            .service(put_credential)
            .service(delete_credential)
            .service(generate)
            .service(get_history)
            .service(clear_history)
            .service(get_image)
            .service(download)
            .service(share)
            .service(print)
            .service(get_theme)
            .service(put_theme)
            .service(wipe)
            .service(examples)
            .service(get_logs),
    );
}

/// Exact origins the page can be served from: the configured one plus its loopback twin.
pub fn allowed_origins(server: &ServerSettings) -> Vec<String> {
    let mut origins = vec![format!("http://{}:{}", server.host, server.port)];
    let twin = match server.host.as_str() {
        "127.0.0.1" => Some("localhost"),
        "localhost" => Some("127.0.0.1"),
        _ => None,
    };
    if let Some(twin) = twin {
        origins.push(format!("http://{}:{}", twin, server.port));
    }
    origins
}

fn cors(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allow_any_method()
        .allow_any_header()
}

pub fn start_server(app_state: Arc<AppState>) -> std::io::Result<Server> {
    let logs = app_state.logs.clone();
    let host = app_state.settings.server.host.clone();
    let port = app_state.settings.server.port;
    let state = web::Data::new(HttpState { app_state, logs });

    let origins = allowed_origins(&state.app_state.settings.server);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors(&origins))
            .app_data(state.clone())
            .configure(configure)
    })
    // One worker: requests interleave only at await points.
    .workers(1)
    .bind((host.as_str(), port))?
    .run();

    Ok(server)
}
