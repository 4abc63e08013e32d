use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use calendar_events::{list_events, Categories, EventFilter, Exporter};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::export::file_stem;
use crate::store::EventStore;

pub const CALENDAR_PATH: &str = "/api/calendar";
pub const EVENTS_PATH: &str = "/api/events";
pub const CATEGORIES_PATH: &str = "/api/categories";

const SKIPPED_HEADER: &str = "x-skipped-events";

#[derive(Clone)]
pub struct AppState {
    store: Arc<EventStore>,
    exporter: Arc<Exporter>,
}

impl AppState {
    pub fn new(store: Arc<EventStore>, exporter: Arc<Exporter>) -> Self {
        Self { store, exporter }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(CALENDAR_PATH, get(handle_calendar))
        .route(EVENTS_PATH, get(handle_events))
        .route(CATEGORIES_PATH, get(handle_categories))
        .fallback(|| async { ApiError::new(StatusCode::NOT_FOUND, "Not found") })
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn new(status: StatusCode, message: &'static str) -> Self {
        Self { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

#[derive(Deserialize)]
struct CalendarQuery {
    category: Option<String>,
    q: Option<String>,
}

async fn handle_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Response, ApiError> {
    let loaded = state.store.events_or_fallback().await;
    let category = query
        .category
        .map(|category| category.trim().to_string())
        .filter(|category| !category.is_empty());

    let filter = EventFilter {
        category: category.clone(),
        query: query.q,
        chronological: false,
    };

    let export = state
        .exporter
        .export(&list_events(&loaded.events, &filter))
        .map_err(|err| {
            error!("Failed to generate calendar: {err}");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate calendar")
        })?;

    let filename = match &category {
        Some(category) => format!("calendar-{}.ics", file_stem(category)),
        None => "calendar.ics".to_string(),
    };

    info!(
        "Serving {filename} with {} events ({} skipped)",
        export.exported,
        export.skipped.len() + loaded.skipped.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/calendar; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
            (
                header::HeaderName::from_static(SKIPPED_HEADER),
                (export.skipped.len() + loaded.skipped.len()).to_string(),
            ),
        ],
        export.body,
    )
        .into_response())
}

#[derive(Deserialize)]
struct EventsQuery {
    category: Option<String>,
    q: Option<String>,
    sort: Option<String>,
}

async fn handle_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Result<Response, ApiError> {
    let filter = EventFilter {
        category: query.category,
        query: query.q,
        chronological: query
            .sort
            .is_some_and(|sort| sort.eq_ignore_ascii_case("chronological")),
    };

    let events = state.store.list_events(&filter).await.map_err(|err| {
        error!("Failed to fetch events: {err}");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch events")
    })?;

    Ok(Json(events).into_response())
}

async fn handle_categories(State(state): State<AppState>) -> Json<Categories> {
    Json(state.exporter.rules().categories.clone())
}
