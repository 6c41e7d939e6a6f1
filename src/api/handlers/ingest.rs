use crate::AppState;
use crate::api::error::{AppError, ErrorResponse};
use crate::services::ingest_service::IngestRequest;
use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use tracing::info;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

const MISSING_VIDEO_URL: &str = "Missing 'video_url' in request body";
const MISSING_PLAYLIST: &str = "Missing 'playlist' in request body";

// Any non-empty value is accepted, whitespace included; yt-dlp and the
// station manager reject what they cannot use.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_playlist"))]
pub struct AddVideoRequest {
    /// Page or media URL understood by yt-dlp
    #[validate(
        required(message = "Missing 'video_url' in request body"),
        length(min = 1, message = "Missing 'video_url' in request body")
    )]
    #[schema(example = "https://www.youtube.com/watch?v=dQw4w9WgXcQ")]
    pub video_url: Option<String>,

    /// Target playlist id; numbers are accepted and used as their decimal text
    #[serde(default, alias = "playlist_id", deserialize_with = "string_or_number")]
    #[schema(example = "6")]
    pub playlist: Option<String>,

    /// Set from the backend variant before validation
    #[serde(skip)]
    playlist_required: bool,
}

fn validate_playlist(req: &AddVideoRequest) -> Result<(), ValidationError> {
    let present = req.playlist.as_deref().is_some_and(|p| !p.is_empty());
    if req.playlist_required && !present {
        return Err(ValidationError::new("required").with_message(Cow::Borrowed(MISSING_PLAYLIST)));
    }
    Ok(())
}

/// The first failing field in request order, `video_url` before `playlist`.
fn first_violation(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    ["video_url", "__all__"]
        .into_iter()
        .filter_map(|field| fields.get(field))
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

impl AddVideoRequest {
    pub fn into_ingest_request(mut self, require_playlist: bool) -> Result<IngestRequest, AppError> {
        self.playlist_required = require_playlist;
        self.validate()
            .map_err(|e| AppError::Validation(first_violation(&e)))?;

        let video_url = self
            .video_url
            .ok_or_else(|| AppError::Validation(MISSING_VIDEO_URL.to_string()))?;

        Ok(IngestRequest {
            video_url,
            playlist: self.playlist.filter(|p| !p.is_empty()),
        })
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddVideoResponse {
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/addvideo",
    request_body = AddVideoRequest,
    params(
        ("x-api-key" = String, Header, description = "Shared secret")
    ),
    responses(
        (status = 200, description = "Audio uploaded", body = AddVideoResponse),
        (status = 400, description = "Missing field or malformed JSON", body = ErrorResponse),
        (status = 401, description = "Invalid or missing API key", body = ErrorResponse),
        (status = 500, description = "Download, transcode or upload failed", body = ErrorResponse)
    ),
    tag = "ingest"
)]
pub async fn add_video(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AddVideoResponse>, AppError> {
    // Content-Type is not required; the body is always read as JSON.
    let payload: AddVideoRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))?;
    let request = payload.into_ingest_request(state.config.requires_playlist())?;

    info!(
        "📥 Received video URL: {}, Playlist: {}",
        request.video_url,
        request.playlist.as_deref().unwrap_or("-")
    );

    let outcome = state.ingest.ingest(&request).await.map_err(|e| {
        AppError::Downstream(format!(
            "Error downloading, uploading, or adding to playlist: {:#}",
            e
        ))
    })?;

    Ok(Json(AddVideoResponse {
        message: format!(
            "File '{}' processed and uploaded successfully.",
            outcome.file_name
        ),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> AddVideoRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_playlist_accepts_alias_and_numbers() {
        assert_eq!(parse(r#"{"playlist": "late"}"#).playlist.as_deref(), Some("late"));
        assert_eq!(parse(r#"{"playlist_id": 6}"#).playlist.as_deref(), Some("6"));
        assert_eq!(parse(r#"{"playlist": null}"#).playlist, None);
        assert_eq!(parse(r#"{}"#).playlist, None);
        assert!(serde_json::from_str::<AddVideoRequest>(r#"{"playlist": true}"#).is_err());
    }

    #[test]
    fn test_validation_order_and_messages() {
        let err = parse(r#"{"playlist": "6"}"#).into_ingest_request(true).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'video_url' in request body");

        let err = parse(r#"{"video_url": "https://x"}"#)
            .into_ingest_request(true)
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing 'playlist' in request body");

        let request = parse(r#"{"video_url": "https://x"}"#)
            .into_ingest_request(false)
            .unwrap();
        assert_eq!(request.playlist, None);

        let err = parse(r#"{"video_url": ""}"#).into_ingest_request(true).unwrap_err();
        assert_eq!(err.to_string(), "Missing 'video_url' in request body");

        let err = parse(r#"{"video_url": "https://x", "playlist": ""}"#)
            .into_ingest_request(true)
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing 'playlist' in request body");
    }

    #[test]
    fn test_blank_values_count_as_present() {
        let request = parse(r#"{"video_url": "https://x", "playlist": " "}"#)
            .into_ingest_request(true)
            .unwrap();
        assert_eq!(request.video_url, "https://x");
        assert_eq!(request.playlist.as_deref(), Some(" "));
    }
}
