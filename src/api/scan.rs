use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::state::{evict_stale_sessions, AppState, ScanSession};
use crate::error::{AppError, Result};
use crate::services::scan_dispatcher::{
    DispatcherState, PermissionStatus, ScanDispatcher, ScanEffect, ScanEvent,
};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub camera_permission: PermissionStatus,
}

#[derive(Debug, Serialize)]
pub struct ScanSessionResponse {
    pub session_id: Uuid,
    pub state: DispatcherState,
    pub scanner_running: bool,
    pub effects: Vec<ScanEffect>,
}

impl ScanSessionResponse {
    fn new(session_id: Uuid, dispatcher: &ScanDispatcher, effects: Vec<ScanEffect>) -> Self {
        Self {
            session_id,
            state: dispatcher.state().clone(),
            scanner_running: dispatcher.is_scanner_running(),
            effects,
        }
    }
}

/// Opens a code-reader session (the screen's view was created)
#[tracing::instrument(skip(state))]
async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ScanSessionResponse>)> {
    let session_id = Uuid::new_v4();
    let mut dispatcher = ScanDispatcher::default();
    let effects = dispatcher.handle(ScanEvent::ViewCreated {
        camera_permission: request.camera_permission,
    })?;

    let response = ScanSessionResponse::new(session_id, &dispatcher, effects);

    let now = Utc::now();
    let mut sessions = state.sessions.lock().await;
    evict_stale_sessions(&mut sessions, now, state.config.scan_session_ttl());
    sessions.insert(session_id, ScanSession::new(dispatcher, now));

    tracing::info!(session_id = %session_id, open = sessions.len(), "Scan session opened");

    Ok((StatusCode::CREATED, Json(response)))
}

/// Applies one event to a session
///
/// When the dispatcher opens the fetch step, the model is fetched here and the
/// fetch result is fed back, so the response carries the whole effect chain.
#[tracing::instrument(skip(state, event))]
async fn post_event(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(event): Json<ScanEvent>,
) -> Result<Json<ScanSessionResponse>> {
    let mut sessions = state.sessions.lock().await;
    let session = sessions
        .get_mut(&session_id)
        .ok_or(AppError::SessionNotFound)?;
    session.touch(Utc::now());
    let dispatcher = &mut session.dispatcher;

    let mut effects = dispatcher.handle(event)?;

    let fetch_requests: Vec<String> = effects
        .iter()
        .filter_map(ScanEffect::fetch_request)
        .map(str::to_string)
        .collect();

    for text in fetch_requests {
        let result = state.fetcher.fetch(&text);
        effects.extend(dispatcher.handle(ScanEvent::ModelFetched { result })?);
    }

    Ok(Json(ScanSessionResponse::new(session_id, dispatcher, effects)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ScanSessionResponse>> {
    let sessions = state.sessions.lock().await;
    let session = sessions.get(&session_id).ok_or(AppError::SessionNotFound)?;

    Ok(Json(ScanSessionResponse::new(
        session_id,
        &session.dispatcher,
        Vec::new(),
    )))
}

/// Closes a session, halting its scanner
#[tracing::instrument(skip(state))]
async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ScanSessionResponse>> {
    let ScanSession { mut dispatcher, .. } = state
        .sessions
        .lock()
        .await
        .remove(&session_id)
        .ok_or(AppError::SessionNotFound)?;

    let effects = dispatcher.handle(ScanEvent::Paused)?;

    tracing::info!(session_id = %session_id, "Scan session closed");

    Ok(Json(ScanSessionResponse::new(session_id, &dispatcher, effects)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/scan/sessions", post(create_session))
        .route(
            "/api/scan/sessions/:id",
            get(get_session).delete(close_session),
        )
        .route("/api/scan/sessions/:id/events", post(post_event))
}
