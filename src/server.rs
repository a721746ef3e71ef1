//! HTTP service exposing the shared game record store.
//!
//! Two browser-like clients synchronize one session by reading, writing,
//! and watching the record under `/games/{id}`. Change notification is a
//! revision-based long poll: `GET /games/{id}/watch?rev=N` resolves as
//! soon as the record's revision exceeds `N`, or after an idle timeout
//! with the unchanged revision so the client can re-arm.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post, put};
use serde::Deserialize;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, instrument, warn};

use crate::game::Mark;
use crate::remote::{
    CasOutcome, GameRecord, GameStore, JoinOutcome, MemoryStore, PlayerSlot, WatchResponse,
};

/// How long an idle watch request is parked before re-arming.
const WATCH_TIMEOUT: Duration = Duration::from_secs(25);

/// Query parameters for the watch endpoint.
#[derive(Debug, Deserialize)]
struct WatchQuery {
    /// Last revision the client has seen.
    #[serde(default)]
    rev: u64,
}

/// Builds the game store router over the given store.
pub fn router(store: MemoryStore) -> Router {
    Router::new()
        .route(
            "/games/{id}",
            post(create_game)
                .get(get_game)
                .put(put_game)
                .delete(delete_game),
        )
        .route("/games/{id}/turn/{mark}", put(update_if_turn))
        .route("/games/{id}/players", post(register_player))
        .route("/games/{id}/watch", get(watch_game))
        .with_state(store)
}

/// Serves the game store on the given listener until shutdown.
///
/// # Errors
///
/// Returns the underlying I/O error if the server fails.
#[instrument(skip(listener, store))]
pub async fn serve(listener: TcpListener, store: MemoryStore) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Game store server listening");
    }
    axum::serve(listener, router(store)).await
}

#[instrument(skip(store, record))]
async fn create_game(
    State(store): State<MemoryStore>,
    Path(id): Path<String>,
    Json(record): Json<GameRecord>,
) -> StatusCode {
    info!(%id, "Creating game record");
    match store.create(&id, record).await {
        Ok(()) => StatusCode::CREATED,
        Err(err) => {
            warn!(error = %err, "Create failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[instrument(skip(store))]
async fn get_game(
    State(store): State<MemoryStore>,
    Path(id): Path<String>,
) -> Result<Json<GameRecord>, StatusCode> {
    match store.get(&id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(err) => {
            warn!(error = %err, "Read failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[instrument(skip(store, record))]
async fn put_game(
    State(store): State<MemoryStore>,
    Path(id): Path<String>,
    Json(record): Json<GameRecord>,
) -> StatusCode {
    // The in-memory store only fails an update when the record is missing.
    match store.put(&id, record).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::NOT_FOUND,
    }
}

#[instrument(skip(store, record))]
async fn update_if_turn(
    State(store): State<MemoryStore>,
    Path((id, mark)): Path<(String, String)>,
    Json(record): Json<GameRecord>,
) -> StatusCode {
    let Some(mover) = Mark::from_code(&mark) else {
        return StatusCode::BAD_REQUEST;
    };
    match store.update_if_turn(&id, mover, record).await {
        Ok(CasOutcome::Applied) => StatusCode::NO_CONTENT,
        Ok(CasOutcome::TurnConflict) => StatusCode::CONFLICT,
        Ok(CasOutcome::Missing) => StatusCode::NOT_FOUND,
        Err(err) => {
            warn!(error = %err, "Conditional update failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[instrument(skip(store, slot))]
async fn register_player(
    State(store): State<MemoryStore>,
    Path(id): Path<String>,
    Json(slot): Json<PlayerSlot>,
) -> Result<Json<GameRecord>, StatusCode> {
    match store.register_if_vacant(&id, &slot.name).await {
        Ok(JoinOutcome::Joined(record)) => Ok(Json(record)),
        Ok(JoinOutcome::Full) => Err(StatusCode::CONFLICT),
        Ok(JoinOutcome::Missing) => Err(StatusCode::NOT_FOUND),
        Err(err) => {
            warn!(error = %err, "Registration failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

#[instrument(skip(store))]
async fn delete_game(State(store): State<MemoryStore>, Path(id): Path<String>) -> StatusCode {
    info!(%id, "Deleting game record");
    match store.delete(&id).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(err) => {
            warn!(error = %err, "Delete failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[instrument(skip(store))]
async fn watch_game(
    State(store): State<MemoryStore>,
    Path(id): Path<String>,
    Query(query): Query<WatchQuery>,
) -> Json<WatchResponse> {
    match tokio::time::timeout(WATCH_TIMEOUT, store.wait_for_change(&id, query.rev)).await {
        Ok((rev, record)) => {
            debug!(%id, rev, "Watch resolved");
            Json(WatchResponse { rev, record })
        }
        Err(_) => {
            // Idle timeout: report the unchanged revision so the client
            // re-arms without emitting a snapshot.
            debug!(%id, rev = query.rev, "Watch idle timeout");
            Json(WatchResponse {
                rev: query.rev,
                record: None,
            })
        }
    }
}
