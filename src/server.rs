use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::handlers::AnalysisHandler;
use crate::models::UserPreferences;

/// Uploads above this size are rejected outright.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub struct AppState {
    pub handler: AnalysisHandler,
    pub upload_dir: PathBuf,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/upload", post(upload_handler))
        .route("/analyze_menu", post(analyze_menu_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root_handler() -> &'static str {
    "FoodHack analysis backend - POST an image to /upload or /analyze_menu"
}

async fn upload_handler(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    match handle_upload(&state, multipart).await {
        Ok(response) => response,
        Err(e) => {
            log::error!("❌ /upload failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn analyze_menu_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Response {
    match handle_analyze_menu(&state, multipart).await {
        Ok(response) => response,
        Err(e) => {
            log::error!("❌ /analyze_menu failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

async fn handle_upload(state: &AppState, multipart: Multipart) -> anyhow::Result<Response> {
    let form = read_form(multipart).await?;

    let Some(image) = form.image else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "No image provided"));
    };
    log::info!("📸 /upload received {} ({} bytes)", image.file_name, image.bytes.len());

    let saved_path = save_upload(&state.upload_dir, &image).await?;
    let result = state
        .handler
        .analyze_upload(&saved_path, &image.file_name)
        .await?;

    Ok((StatusCode::OK, Json(result)).into_response())
}

async fn handle_analyze_menu(state: &AppState, multipart: Multipart) -> anyhow::Result<Response> {
    let form = read_form(multipart).await?;

    let Some(image) = form.image else {
        return Ok(error_response(StatusCode::BAD_REQUEST, "No image provided"));
    };
    log::info!(
        "📸 /analyze_menu received {} ({} bytes)",
        image.file_name,
        image.bytes.len()
    );

    let preferences = form
        .preferences
        .map(|raw| UserPreferences::from_json_or_default(&raw))
        .unwrap_or_default();

    let saved_path = save_upload(&state.upload_dir, &image).await?;
    let result = state
        .handler
        .analyze_menu(&saved_path, &image.file_name, &preferences)
        .await?;

    Ok((StatusCode::OK, Json(result)).into_response())
}

struct UploadedImage {
    file_name: String,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct UploadForm {
    image: Option<UploadedImage>,
    preferences: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> anyhow::Result<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                let file_name = sanitize_filename(field.file_name().unwrap_or("image.jpg"));
                let bytes = field.bytes().await?.to_vec();
                form.image = Some(UploadedImage { file_name, bytes });
            }
            "preferences" => {
                form.preferences = Some(field.text().await?);
            }
            other => {
                log::debug!("Ignoring unknown form field '{}'", other);
            }
        }
    }

    Ok(form)
}

async fn save_upload(upload_dir: &Path, image: &UploadedImage) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(upload_dir).await?;
    let path = upload_dir.join(&image.file_name);
    tokio::fs::write(&path, &image.bytes).await?;
    Ok(path)
}

/// Keep only the final path component of a client-supplied file name.
fn sanitize_filename(raw: &str) -> String {
    Path::new(raw)
        .file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("image.jpg")
        .to_string()
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}
