//! API route handlers.

use axum::{
    extract::{Path, Query, State},
    http::header,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::{error_envelope, ApiError};
use crate::pagination::{paginate, Page};
use crate::params::{optional_int, optional_str, page_params, path_id, required_int, RawQuery};
use crate::standings::{self, ConstructorStanding, DriverStanding};
use crate::storage::models::{Circuit, Driver, Event, Season, Session, SessionResult, Team};
use crate::storage::F1Repository;
use crate::types::HealthResponse;

/// Application state shared across handlers.
pub struct AppState {
    pub repo: Mutex<F1Repository>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(repo: F1Repository, config: AppConfig) -> Self {
        Self {
            repo: Mutex::new(repo),
            config,
        }
    }

    fn repo(&self) -> Result<MutexGuard<'_, F1Repository>, ApiError> {
        self.repo
            .lock()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to lock repository: {}", e)))
    }
}

type SharedState = State<Arc<AppState>>;

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut api = Router::new()
        .route("/seasons", get(list_seasons))
        .route("/seasons/:season_id", get(get_season))
        .route("/teams", get(list_teams))
        .route("/teams/:team_id", get(get_team))
        .route("/drivers", get(list_drivers))
        .route("/drivers/:driver_id", get(get_driver))
        .route("/circuits", get(list_circuits))
        .route("/circuits/:circuit_id", get(get_circuit))
        .route("/events", get(list_events))
        .route("/events/:event_id", get(get_event))
        .route("/events/:event_id/sessions", get(event_sessions))
        .route("/sessions/:session_id/results", get(session_results))
        .route("/standings/drivers", get(driver_standings))
        .route("/standings/constructors", get(constructor_standings));

    if state.config.app.is_development() {
        api = api.route("/_debug/boom", get(debug_boom));
    }

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .nest("/api/v1", api)
        .fallback(not_found)
        .layer(middleware::from_fn(error_envelope))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Metrics placeholder.
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        "# Metrics not implemented yet\n",
    )
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not Found")
}

async fn debug_boom() -> Result<Json<Value>, ApiError> {
    Err(ApiError::Internal(anyhow::anyhow!("Debug route failure")))
}

// ==================== Seasons ====================

pub async fn list_seasons(
    State(state): SharedState,
    Query(query): Query<RawQuery>,
) -> Result<Json<Page<Season>>, ApiError> {
    let page = page_params(&query)?;
    let (items, total) = state.repo()?.list_seasons(page)?;
    Ok(Json(paginate(items, total, page.limit, page.offset)))
}

pub async fn get_season(
    State(state): SharedState,
    Path(season_id): Path<String>,
) -> Result<Json<Season>, ApiError> {
    let id = path_id("season_id", &season_id)?;
    let season = state.repo()?.get_season(id)?;
    season
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Season not found"))
}

// ==================== Teams ====================

pub async fn list_teams(
    State(state): SharedState,
    Query(query): Query<RawQuery>,
) -> Result<Json<Page<Team>>, ApiError> {
    let page = page_params(&query)?;
    let (items, total) = state
        .repo()?
        .list_teams(optional_str(&query, "ref"), page)?;
    Ok(Json(paginate(items, total, page.limit, page.offset)))
}

pub async fn get_team(
    State(state): SharedState,
    Path(team_id): Path<String>,
) -> Result<Json<Team>, ApiError> {
    let id = path_id("team_id", &team_id)?;
    let team = state.repo()?.get_team(id)?;
    team
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Team not found"))
}

// ==================== Drivers ====================

pub async fn list_drivers(
    State(state): SharedState,
    Query(query): Query<RawQuery>,
) -> Result<Json<Page<Driver>>, ApiError> {
    let page = page_params(&query)?;
    let (items, total) = state.repo()?.list_drivers(
        optional_str(&query, "ref"),
        optional_str(&query, "code"),
        page,
    )?;
    Ok(Json(paginate(items, total, page.limit, page.offset)))
}

pub async fn get_driver(
    State(state): SharedState,
    Path(driver_id): Path<String>,
) -> Result<Json<Driver>, ApiError> {
    let id = path_id("driver_id", &driver_id)?;
    let driver = state.repo()?.get_driver(id)?;
    driver
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Driver not found"))
}

// ==================== Circuits ====================

pub async fn list_circuits(
    State(state): SharedState,
    Query(query): Query<RawQuery>,
) -> Result<Json<Page<Circuit>>, ApiError> {
    let page = page_params(&query)?;
    let (items, total) = state
        .repo()?
        .list_circuits(optional_str(&query, "ref"), page)?;
    Ok(Json(paginate(items, total, page.limit, page.offset)))
}

pub async fn get_circuit(
    State(state): SharedState,
    Path(circuit_id): Path<String>,
) -> Result<Json<Circuit>, ApiError> {
    let id = path_id("circuit_id", &circuit_id)?;
    let circuit = state.repo()?.get_circuit(id)?;
    circuit
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Circuit not found"))
}

// ==================== Events & sessions ====================

pub async fn list_events(
    State(state): SharedState,
    Query(query): Query<RawQuery>,
) -> Result<Json<Page<Event>>, ApiError> {
    let page = page_params(&query)?;
    let season_year = optional_int(&query, "season_year")?;
    let (items, total) = state.repo()?.list_events(season_year, page)?;
    Ok(Json(paginate(items, total, page.limit, page.offset)))
}

pub async fn get_event(
    State(state): SharedState,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    let id = path_id("event_id", &event_id)?;
    let event = state.repo()?.get_event(id)?;
    event
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Event not found"))
}

pub async fn event_sessions(
    State(state): SharedState,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let id = path_id("event_id", &event_id)?;
    let repo = state.repo()?;
    if repo.get_event(id)?.is_none() {
        return Err(ApiError::not_found("Event not found"));
    }
    Ok(Json(repo.sessions_for_event(id)?))
}

pub async fn session_results(
    State(state): SharedState,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<SessionResult>>, ApiError> {
    let id = path_id("session_id", &session_id)?;
    let repo = state.repo()?;
    if repo.get_session(id)?.is_none() {
        return Err(ApiError::not_found("Session not found"));
    }
    Ok(Json(repo.results_for_session(id)?))
}

// ==================== Standings ====================

/// Driver championship standings for a season.
pub async fn driver_standings(
    State(state): SharedState,
    Query(query): Query<RawQuery>,
) -> Result<Json<Vec<DriverStanding>>, ApiError> {
    let season_year = required_int(&query, "season_year")?;
    let page = page_params(&query)?;
    let repo = state.repo()?;
    let standings = standings::driver_standings(&repo, season_year, page)?;
    Ok(Json(standings))
}

/// Constructor championship standings for a season.
pub async fn constructor_standings(
    State(state): SharedState,
    Query(query): Query<RawQuery>,
) -> Result<Json<Vec<ConstructorStanding>>, ApiError> {
    let season_year = required_int(&query, "season_year")?;
    let page = page_params(&query)?;
    let repo = state.repo()?;
    let standings = standings::constructor_standings(&repo, season_year, page)?;
    Ok(Json(standings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::seed::seed_minimal_2024;

    fn seeded_app() -> Router {
        let repo = F1Repository::in_memory().unwrap();
        seed_minimal_2024(&repo).unwrap();
        build_router(Arc::new(AppState::new(repo, AppConfig::default())))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(seeded_app(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_metrics_stub() {
        let response = seeded_app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"# Metrics not implemented yet\n");
    }

    #[tokio::test]
    async fn test_driver_standings_2024() {
        let (status, body) = get(seeded_app(), "/api/v1/standings/drivers?season_year=2024").await;
        assert_eq!(status, StatusCode::OK);

        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["position"], 1);
        assert_eq!(items[0]["driver_code"], "VER");
        assert_eq!(items[0]["points"], 25.0);
        assert_eq!(items[0]["wins"], 1);
        assert_eq!(items[0]["team_name"], "Red Bull Racing");
        assert_eq!(items[1]["position"], 2);
        assert_eq!(items[1]["driver_code"], "PER");
        assert_eq!(items[1]["points"], 18.0);
        assert_eq!(items[1]["wins"], 0);
    }

    #[tokio::test]
    async fn test_constructor_standings_2024() {
        let (status, body) =
            get(seeded_app(), "/api/v1/standings/constructors?season_year=2024").await;
        assert_eq!(status, StatusCode::OK);

        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["position"], 1);
        assert_eq!(items[0]["team_ref"], "red_bull_racing");
        assert_eq!(items[0]["points"], 43.0);
        assert_eq!(items[0]["wins"], 1);
    }

    #[tokio::test]
    async fn test_standings_offset_positions() {
        let (status, body) = get(
            seeded_app(),
            "/api/v1/standings/drivers?season_year=2024&limit=1&offset=1",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["position"], 2);
        assert_eq!(items[0]["driver_code"], "PER");
    }

    #[tokio::test]
    async fn test_standings_unknown_season() {
        let (status, body) = get(seeded_app(), "/api/v1/standings/drivers?season_year=1999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Season 1999 not found");
        assert_eq!(body["path"], "/api/v1/standings/drivers");
    }

    #[tokio::test]
    async fn test_standings_requires_season_year() {
        let (status, body) = get(seeded_app(), "/api/v1/standings/drivers").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "ValidationError");
        assert_eq!(body["detail"][0]["loc"][1], "season_year");
    }

    #[tokio::test]
    async fn test_standings_limit_out_of_bounds() {
        let (status, _) = get(
            seeded_app(),
            "/api/v1/standings/constructors?season_year=2024&limit=0",
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_route_envelope() {
        let (status, body) = get(seeded_app(), "/api/v1/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        for key in ["status", "error", "detail", "path", "timestamp"] {
            assert!(body.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "HTTPException");
        assert_eq!(body["path"], "/api/v1/does-not-exist");
    }

    #[tokio::test]
    async fn test_wrong_method_envelope() {
        let response = seeded_app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/standings/drivers?season_year=2024")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(response.headers().contains_key(header::ALLOW));

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], 405);
        assert_eq!(body["error"], "HTTPException");
        assert_eq!(body["detail"], "Method Not Allowed");
        assert_eq!(body["path"], "/api/v1/standings/drivers");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_undecodable_path_id_envelope() {
        let (status, body) = get(seeded_app(), "/api/v1/teams/%FF").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["error"], "HTTPException");
        assert_eq!(body["detail"], "Bad Request");
        assert_eq!(body["path"], "/api/v1/teams/%FF");
    }

    #[tokio::test]
    async fn test_empty_integer_query_is_rejected() {
        let (status, body) =
            get(seeded_app(), "/api/v1/standings/drivers?season_year=2024&limit=").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["loc"][1], "limit");
        assert_eq!(body["detail"][0]["type"], "int_parsing");

        let (status, body) = get(seeded_app(), "/api/v1/events?season_year=").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["loc"][1], "season_year");
    }

    #[tokio::test]
    async fn test_debug_boom_returns_500() {
        let (status, body) = get(seeded_app(), "/api/v1/_debug/boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], 500);
        assert_eq!(body["error"], "InternalServerError");
        assert_eq!(body["path"], "/api/v1/_debug/boom");
    }

    #[tokio::test]
    async fn test_debug_route_hidden_outside_development() {
        let mut config = AppConfig::default();
        config.app.env = "production".to_string();
        let app = build_router(Arc::new(AppState::new(
            F1Repository::in_memory().unwrap(),
            config,
        )));

        let (status, _) = get(app, "/api/v1/_debug/boom").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_seasons_page() {
        let (status, body) = get(seeded_app(), "/api/v1/seasons?limit=10").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["page"], 1);
        assert_eq!(body["pages"], 1);
        assert_eq!(body["items"][0]["year"], 2024);
    }

    #[tokio::test]
    async fn test_drivers_filter_and_lookup() {
        let app = seeded_app();
        let (status, body) = get(app.clone(), "/api/v1/drivers?code=PER").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        let id = body["items"][0]["id"].as_i64().unwrap();
        assert_eq!(body["items"][0]["ref"], "sergio_perez");

        let (status, body) = get(app.clone(), &format!("/api/v1/drivers/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["date_of_birth"], "1990-01-26");

        let (status, body) = get(app, "/api/v1/drivers/9999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Driver not found");
    }

    #[tokio::test]
    async fn test_malformed_path_id() {
        let (status, body) = get(seeded_app(), "/api/v1/teams/abc").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["detail"][0]["loc"][0], "path");
    }

    #[tokio::test]
    async fn test_event_sessions_and_results() {
        let app = seeded_app();
        let (_, events) = get(app.clone(), "/api/v1/events?season_year=2024").await;
        let event_id = events["items"][0]["id"].as_i64().unwrap();

        let (status, sessions) =
            get(app.clone(), &format!("/api/v1/events/{}/sessions", event_id)).await;
        assert_eq!(status, StatusCode::OK);
        let sessions = sessions.as_array().unwrap();
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[2]["type"], "RACE");

        let race_id = sessions[2]["id"].as_i64().unwrap();
        let (status, results) =
            get(app.clone(), &format!("/api/v1/sessions/{}/results", race_id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(results[0]["position"], 1);
        assert_eq!(results[0]["points"], 25.0);

        let (status, _) = get(app, "/api/v1/events/9999/sessions").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_circuits_and_teams() {
        let app = seeded_app();
        let (status, body) = get(app.clone(), "/api/v1/circuits?ref=sakhir").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"][0]["city"], "Sakhir");

        let (status, body) = get(app, "/api/v1/teams?ref=missing").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);
        assert_eq!(body["pages"], 1);
    }
}
