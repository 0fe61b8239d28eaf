use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use mix_job::{ErrorKind, JobError, MixJobCoordinator};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: MixJobCoordinator,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tracks", get(get_tracks).post(post_tracks))
        .route("/api/samples", get(get_samples))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, coordinator: MixJobCoordinator) -> anyhow::Result<()> {
    let app = router(AppState { coordinator });

    tracing::info!(%addr, "AutoMix HTTP server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("AutoMix HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

fn error_response(err: &JobError) -> Response {
    let status = match err.kind() {
        ErrorKind::Input => StatusCode::BAD_REQUEST,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = json!({"ok": false, "error": err.to_string(), "kind": err.kind()});
    (status, Json(body)).into_response()
}

// ═══════════════════════════════════════════════════════════════
// POST /api/tracks
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub genre: Option<String>,
}

async fn post_tracks(State(st): State<AppState>, Json(req): Json<TriggerRequest>) -> Response {
    let genre = req.genre.unwrap_or_default();

    let ticket = match st.coordinator.trigger(&genre) {
        Ok(ticket) => ticket,
        Err(e) => {
            tracing::warn!(genre = %genre, error = %e, "Mix trigger rejected");
            return error_response(&e);
        }
    };

    tracing::info!(job_id = ticket.job_id(), genre = %genre.trim(), "Mix job triggered");

    match ticket.wait().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Mix job lost");
            error_response(&e)
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// GET /api/tracks?genre=
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub genre: Option<String>,
}

async fn get_tracks(State(st): State<AppState>, Query(q): Query<StatusQuery>) -> Response {
    let snapshot = st.coordinator.status(q.genre.as_deref());
    (StatusCode::OK, Json(snapshot)).into_response()
}

// ═══════════════════════════════════════════════════════════════
// GET /api/samples
// ═══════════════════════════════════════════════════════════════

async fn get_samples(State(st): State<AppState>) -> Response {
    match st.coordinator.list_samples() {
        Ok(samples) => (StatusCode::OK, Json(json!({"samples": samples}))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Sample listing failed");
            error_response(&e)
        }
    }
}

// ═══════════════════════════════════════════════════════════════
// GET /health
// ═══════════════════════════════════════════════════════════════

async fn health(State(st): State<AppState>) -> Response {
    let body = json!({"ok": true, "backend": st.coordinator.backend_name()});
    (StatusCode::OK, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mix_file::SampleLibrary;
    use mix_job::FallbackBackend;
    use std::path::Path;
    use std::sync::Arc;

    fn state(dir: &Path) -> AppState {
        AppState {
            coordinator: MixJobCoordinator::new(Arc::new(FallbackBackend), SampleLibrary::new(dir), None),
        }
    }

    fn write_samples(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"").unwrap();
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_tracks_returns_finished_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        write_samples(dir.path(), &["a.wav", "b.flac"]);
        let st = state(dir.path());

        let req = TriggerRequest {
            genre: Some("Rock".into()),
        };
        let response = post_tracks(State(st.clone()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let snapshot = st.coordinator.snapshot();
        assert_eq!(snapshot.tracks.len(), 2);
        assert!(snapshot.tracks.iter().all(|t| t.gain.is_some()));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_post_tracks_without_genre_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());

        let response = post_tracks(State(st.clone()), Json(TriggerRequest::default())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(!st.coordinator.is_processing());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_library_is_degraded_ok() {
        let dir = tempfile::tempdir().unwrap();
        let st = state(dir.path());

        let req = TriggerRequest {
            genre: Some("Pop".into()),
        };
        let response = post_tracks(State(st.clone()), Json(req)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            st.coordinator.snapshot().error.as_deref(),
            Some("No audio samples found")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_tracks_and_samples() {
        let dir = tempfile::tempdir().unwrap();
        write_samples(dir.path(), &["vocal.wav", "readme.md"]);
        let st = state(dir.path());

        let query = StatusQuery { genre: None };
        let response = get_tracks(State(st.clone()), Query(query)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!st.coordinator.is_processing());

        let response = get_samples(State(st.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(st.coordinator.list_samples().unwrap().len(), 1);

        let response = health(State(st)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_response(&JobError::MissingGenre).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_response(&JobError::Conflict { genre: "Pop".into() }).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_response(&JobError::Worker("gone".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
