pub mod api;
pub mod config;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::ingest_service::IngestService;
use crate::services::upload::StationLibrary;
use axum::{
    Router,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::ingest::add_video,
        api::handlers::station::list_station_files,
        api::handlers::station::list_playlists,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::ingest::AddVideoRequest,
            api::handlers::ingest::AddVideoResponse,
            api::error::ErrorResponse,
        )
    ),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "ingest", description = "Download, transcode and upload"),
        (name = "station", description = "AzuraCast passthrough (station-manager backend only)")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ingest: Arc<IngestService>,
    /// Present only for the station-manager backend
    pub station: Option<Arc<dyn StationLibrary>>,
}

pub fn create_app(state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::handlers::health::health_check))
        .route("/healthz", get(api::handlers::health::health_check))
        .route(
            "/addvideo",
            post(api::handlers::ingest::add_video).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::api_key_middleware,
            )),
        );

    if state.station.is_some() {
        router = router
            .route("/test", get(api::handlers::station::list_station_files))
            .route("/playlists", get(api::handlers::station::list_playlists));
    }

    router
        .layer(from_fn(api::middleware::request_log::request_log_middleware))
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config.allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
