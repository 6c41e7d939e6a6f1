use crate::AppState;
use crate::api::error::{AppError, ErrorResponse};
use crate::services::upload::StationLibrary;
use axum::{Json, extract::State};
use serde_json::{Map, Value};
use std::sync::Arc;

fn station(state: &AppState) -> Result<&Arc<dyn StationLibrary>, AppError> {
    state
        .station
        .as_ref()
        .ok_or_else(|| AppError::Downstream("No station manager configured".to_string()))
}

/// Station files exactly as AzuraCast lists them.
#[utoipa::path(
    get,
    path = "/test",
    responses(
        (status = 200, description = "Station file listing passed through unchanged"),
        (status = 500, description = "Backend failed or returned a non-list", body = ErrorResponse)
    ),
    tag = "station"
)]
pub async fn list_station_files(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let files = station(&state)?.list_files().await?;

    if !files.is_array() {
        return Err(AppError::UpstreamShape(
            "Unexpected response format from AzuraCast API".to_string(),
        ));
    }

    Ok(Json(files))
}

/// Playlists reshaped into a `name -> id` object.
#[utoipa::path(
    get,
    path = "/playlists",
    responses(
        (status = 200, description = "Playlist ids keyed by playlist name"),
        (status = 500, description = "Backend failed, returned a non-list, or has no playlists", body = ErrorResponse)
    ),
    tag = "station"
)]
pub async fn list_playlists(
    State(state): State<AppState>,
) -> Result<Json<Map<String, Value>>, AppError> {
    let data = station(&state)?.list_playlists().await?;
    Ok(Json(playlist_mapping(&data)?))
}

/// Ids keep their JSON type; a later entry with the same name wins.
pub fn playlist_mapping(data: &Value) -> Result<Map<String, Value>, AppError> {
    let entries = data.as_array().ok_or_else(|| {
        AppError::UpstreamShape("Unexpected response format from AzuraCast API".to_string())
    })?;

    let mut mapping = Map::new();
    for entry in entries {
        let name = entry.get("name").and_then(Value::as_str);
        let id = entry.get("id").filter(|id| !id.is_null());
        match (name, id) {
            (Some(name), Some(id)) => {
                mapping.insert(name.to_string(), id.clone());
            }
            _ => {
                return Err(AppError::UpstreamShape(
                    "Playlist entry without 'name' or 'id' in AzuraCast response".to_string(),
                ));
            }
        }
    }

    if mapping.is_empty() {
        return Err(AppError::UpstreamShape(
            "No playlists found in AzuraCast".to_string(),
        ));
    }

    Ok(mapping)
}
