use std::path::Path;

use axum::extract::Multipart;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    audit::record,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const UPLOAD_FIELD: &str = "file";
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedFile {
    pub url: String,
    pub content_type: String,
    pub size: usize,
}

pub async fn upload_image(
    state: &AppState,
    user: &AuthUser,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UploadedFile>> {
    ensure_admin(&state.pool, user).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest("only image uploads are allowed".into()));
        }
        let extension = file_extension(field.file_name(), &content_type);

        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(format!("failed to read upload: {err}")))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("uploaded file is empty".into()));
        }

        let file_name = format!("{}.{}", Uuid::new_v4().simple(), extension);
        tokio::fs::create_dir_all(&state.upload_dir)
            .await
            .map_err(anyhow::Error::from)?;
        tokio::fs::write(state.upload_dir.join(&file_name), &bytes)
            .await
            .map_err(anyhow::Error::from)?;

        let url = format!("{UPLOAD_URL_PREFIX}/{file_name}");
        tracing::info!(%url, size = bytes.len(), "image uploaded");
        record(
            &state.pool,
            user.user_id,
            "upload",
            "uploads",
            serde_json::json!({ "url": url }),
        )
        .await;

        return Ok(ApiResponse::success(
            "Uploaded",
            UploadedFile {
                url,
                content_type,
                size: bytes.len(),
            },
            Some(Meta::empty()),
        ));
    }

    Err(AppError::BadRequest(format!(
        "missing `{UPLOAD_FIELD}` field"
    )))
}

/// Keeps the client's extension when it is a plain alphanumeric one, else
/// derives it from the image subtype.
fn file_extension(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match from_name {
        Some(ext) => ext.to_ascii_lowercase(),
        None => match content_type.trim_start_matches("image/") {
            "jpeg" => "jpg".to_string(),
            "svg+xml" => "svg".to_string(),
            other if !other.is_empty() && other.chars().all(|c| c.is_ascii_alphanumeric()) => {
                other.to_string()
            }
            _ => "bin".to_string(),
        },
    }
}
