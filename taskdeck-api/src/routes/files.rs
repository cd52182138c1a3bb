/// Avatar and resume attachment endpoints
///
/// # Endpoints
///
/// - `POST /users/me/avatar` - Upload an avatar image (multipart, field `file`)
/// - `GET /users/me/avatar` - Fetch own avatar as PNG
/// - `DELETE /users/me/avatar` - Remove own avatar
/// - `POST /users/me/resume` - Upload a resume document (multipart, field `file`)
/// - `GET /users/me/resume` - Fetch own resume
/// - `DELETE /users/me/resume` - Remove own resume
///
/// Avatars are decoded, resized to 800x600, re-encoded as PNG, and stored
/// in the user row. Resumes are written under the configured upload
/// directory with a generated name; the user row holds only the path.
/// Uploads are capped at 1 MB and checked against a per-kind content-type
/// whitelist before any bytes are processed.

use crate::{
    app::{AppState, AuthSession},
    error::{ApiError, ApiResult, StatusBody},
};
use axum::{
    extract::{Multipart, State},
    http::header,
    Extension, Json,
};
use image::{imageops::FilterType, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use taskdeck_shared::models::user::User;
use uuid::Uuid;

/// Maximum accepted upload size in bytes
pub const MAX_UPLOAD_BYTES: usize = 1_000_000;

/// Avatar dimensions after normalization
const AVATAR_WIDTH: u32 = 800;
const AVATAR_HEIGHT: u32 = 600;

/// Accepted avatar content types
const AVATAR_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg"];

/// Accepted resume content types
const RESUME_TYPES: &[&str] = &["application/pdf", "application/msword", "text/plain"];

/// A validated upload pulled out of a multipart body
struct Upload {
    bytes: Vec<u8>,
}

/// Checks an upload's content type and size against a whitelist
///
/// Order matters: an unacceptable type is reported before an
/// unacceptable size.
fn validate_upload(
    content_type: Option<&str>,
    len: usize,
    allowed: &[&str],
    type_msg: &str,
) -> Result<(), ApiError> {
    let content_type = content_type.unwrap_or("");
    if !allowed.contains(&content_type) {
        return Err(ApiError::UnsupportedMedia(type_msg.to_string()));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(ApiError::UnsupportedMedia("File too large".to_string()));
    }
    Ok(())
}

/// Reads the `file` field from a multipart body and validates it
async fn read_upload(
    mut multipart: Multipart,
    allowed: &[&str],
    type_msg: &str,
) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ApiError::Validation("Malformed multipart body".to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);

        let bytes = field
            .bytes()
            .await
            .map_err(|_| ApiError::UnsupportedMedia("File too large".to_string()))?;

        validate_upload(content_type.as_deref(), bytes.len(), allowed, type_msg)?;

        return Ok(Upload {
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::Validation("File field is required".to_string()))
}

/// Normalizes an uploaded image to an 800x600 PNG
///
/// Undecodable input is treated the same as a disallowed content type.
fn normalize_avatar(bytes: &[u8]) -> Result<Vec<u8>, ApiError> {
    let img = image::load_from_memory(bytes).map_err(|_| {
        ApiError::UnsupportedMedia("File must be png, jpg, jpeg format".to_string())
    })?;

    let resized = img.resize_to_fill(AVATAR_WIDTH, AVATAR_HEIGHT, FilterType::Triangle);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ApiError::Internal(format!("Avatar encoding failed: {}", e)))?;

    Ok(out.into_inner())
}

/// Upload an avatar image
///
/// # Errors
///
/// - `400`: missing `file` field or malformed body
/// - `415`: wrong content type, undecodable image, or file over 1 MB
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    multipart: Multipart,
) -> ApiResult<Json<StatusBody>> {
    let upload = read_upload(
        multipart,
        AVATAR_TYPES,
        "File must be png, jpg, jpeg format",
    )
    .await?;

    let png = normalize_avatar(&upload.bytes)?;

    User::set_avatar(&state.db, session.user.id, Some(&png)).await?;

    state
        .mailer
        .send_account_updated(&session.user.email, &session.user.name);

    Ok(Json(StatusBody::ok("Avatar uploaded")))
}

/// Fetch own avatar
///
/// Stored avatars are always PNG after normalization.
///
/// # Errors
///
/// - `404`: no avatar stored
pub async fn get_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<impl axum::response::IntoResponse> {
    // The guard loaded the user before the handler ran; re-fetch so a
    // just-uploaded avatar on another session is visible immediately.
    let user = User::find_by_id(&state.db, session.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Data not found".to_string()))?;

    let avatar = user
        .avatar
        .ok_or_else(|| ApiError::NotFound("User avatar not found".to_string()))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], avatar))
}

/// Remove own avatar
pub async fn delete_avatar(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<StatusBody>> {
    User::set_avatar(&state.db, session.user.id, None).await?;

    state
        .mailer
        .send_account_updated(&session.user.email, &session.user.name);

    Ok(Json(StatusBody::ok("Avatar deleted")))
}

/// Upload a resume document
///
/// The file lands under the configured upload directory with a generated
/// name; a previous resume file is removed once the new one is stored.
///
/// # Errors
///
/// - `400`: missing `file` field or malformed body
/// - `415`: wrong content type or file over 1 MB
pub async fn upload_resume(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    multipart: Multipart,
) -> ApiResult<Json<StatusBody>> {
    let upload = read_upload(
        multipart,
        RESUME_TYPES,
        "File must be pdf, doc, txt format",
    )
    .await?;

    let dir = PathBuf::from(&state.config.uploads.dir);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| ApiError::Internal(format!("Upload directory unavailable: {}", e)))?;

    let path = dir.join(Uuid::new_v4().to_string());
    tokio::fs::write(&path, &upload.bytes)
        .await
        .map_err(|e| ApiError::Internal(format!("Resume write failed: {}", e)))?;

    let stored = path.to_string_lossy().to_string();
    User::set_resume_path(&state.db, session.user.id, Some(&stored)).await?;

    // The replaced file is orphaned once the row points elsewhere
    if let Some(ref old) = session.user.resume_path {
        remove_stored_file(old).await;
    }

    state
        .mailer
        .send_account_updated(&session.user.email, &session.user.name);

    Ok(Json(StatusBody::ok("Resume uploaded")))
}

/// Fetch own resume
///
/// # Errors
///
/// - `404`: no resume stored, or the stored file is unreadable
pub async fn get_resume(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let user = User::find_by_id(&state.db, session.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Data not found".to_string()))?;

    let path = user
        .resume_path
        .ok_or_else(|| ApiError::NotFound("User resume not found".to_string()))?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        tracing::warn!(%path, error = %e, "Stored resume file unreadable");
        ApiError::NotFound("User resume not found".to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}

/// Remove own resume
///
/// The database reference is cleared even if deleting the stored file
/// fails; the leftover file is logged for cleanup.
pub async fn delete_resume(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> ApiResult<Json<StatusBody>> {
    if let Some(ref path) = session.user.resume_path {
        remove_stored_file(path).await;
    }

    User::set_resume_path(&state.db, session.user.id, None).await?;

    state
        .mailer
        .send_account_updated(&session.user.email, &session.user.name);

    Ok(Json(StatusBody::ok("Resume deleted")))
}

/// Best-effort removal of a stored upload
async fn remove_stored_file(path: impl AsRef<Path>) {
    let path = path.as_ref();
    if let Err(err) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %err, "Failed to remove stored file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload_accepts_whitelisted_types() {
        assert!(validate_upload(Some("image/png"), 1024, AVATAR_TYPES, "bad type").is_ok());
        assert!(validate_upload(Some("image/jpeg"), 1024, AVATAR_TYPES, "bad type").is_ok());
        assert!(validate_upload(Some("application/pdf"), 1024, RESUME_TYPES, "bad type").is_ok());
        assert!(validate_upload(Some("text/plain"), 1024, RESUME_TYPES, "bad type").is_ok());
    }

    #[test]
    fn test_validate_upload_rejects_wrong_type() {
        let err = validate_upload(Some("image/gif"), 1024, AVATAR_TYPES, "bad type").unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMedia(msg) if msg == "bad type"));

        let err = validate_upload(None, 1024, AVATAR_TYPES, "bad type").unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMedia(_)));

        // A resume type is not an avatar type and vice versa
        assert!(validate_upload(Some("application/pdf"), 1024, AVATAR_TYPES, "bad type").is_err());
        assert!(validate_upload(Some("image/png"), 1024, RESUME_TYPES, "bad type").is_err());
    }

    #[test]
    fn test_validate_upload_rejects_oversize() {
        let err = validate_upload(
            Some("image/png"),
            MAX_UPLOAD_BYTES + 1,
            AVATAR_TYPES,
            "bad type",
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMedia(msg) if msg == "File too large"));

        // Exactly at the cap is fine
        assert!(validate_upload(Some("image/png"), MAX_UPLOAD_BYTES, AVATAR_TYPES, "bad type").is_ok());
    }

    #[test]
    fn test_validate_upload_checks_type_before_size() {
        let err = validate_upload(
            Some("image/gif"),
            MAX_UPLOAD_BYTES + 1,
            AVATAR_TYPES,
            "bad type",
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMedia(msg) if msg == "bad type"));
    }

    #[test]
    fn test_normalize_avatar_rejects_non_image_bytes() {
        let err = normalize_avatar(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMedia(_)));
    }

    #[test]
    fn test_normalize_avatar_resizes_to_png() {
        // Encode a small image, run it through normalization, and check
        // the output decodes as an 800x600 PNG.
        let src = image::DynamicImage::new_rgb8(64, 48);
        let mut buf = Cursor::new(Vec::new());
        src.write_to(&mut buf, ImageFormat::Jpeg).unwrap();

        let png = normalize_avatar(buf.get_ref()).unwrap();

        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!(decoded.width(), AVATAR_WIDTH);
        assert_eq!(decoded.height(), AVATAR_HEIGHT);
    }
}
