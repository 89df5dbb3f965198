//! Running the assistant and reading back what it did.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use mailcal_core::{Assistant, BookedSlots, LogEntry, RunReport};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/run", post(run))
        .route("/api/logs", get(logs))
        .route("/api/status", get(status))
}

/// POST /api/run - Process unread mail once
async fn run(State(state): State<AppState>) -> Result<Json<RunReport>, AppError> {
    let report = run_detached(state.run_lock(), run_once(state)).await?;
    Ok(Json(report))
}

/// Run `work` on its own task while holding `lock`.
///
/// The task keeps the lock and runs to completion even when the caller is
/// dropped, e.g. because the browser went away mid-request.
async fn run_detached<F, T>(lock: Arc<Mutex<()>>, work: F) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let running = lock.lock_owned().await;
    tokio::spawn(async move {
        let _running = running;
        work.await
    })
    .await?
}

async fn run_once(state: AppState) -> anyhow::Result<RunReport> {
    let (_session, gmail, calendar) = mailcal_google::connect(state.session_path()).await?;
    let memory = BookedSlots::load(&state.config().memory_path)?;

    let mut assistant = Assistant::new(state.config().clone(), gmail, calendar, memory);
    let report = assistant.run().await?;

    info!(
        emails = report.emails,
        drafts = report.drafts,
        events = report.events,
        "run finished"
    );

    state.set_last_report(report.clone()).await;
    Ok(report)
}

/// GET /api/logs - Entries of the last run
async fn logs(State(state): State<AppState>) -> Json<Vec<LogEntry>> {
    let entries = state
        .last_report()
        .await
        .map(|r| r.entries)
        .unwrap_or_default();
    Json(entries)
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    pub account: Option<String>,
}

/// GET /api/status - Whether a Google account is connected
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let account = state.account();
    Json(StatusResponse {
        authenticated: account.is_some(),
        account,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{body_text, get, state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use mailcal_core::Outcome;
    use mailcal_google::session::{Session, SessionData};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    #[tokio::test]
    async fn logs_are_empty_before_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let app = router().with_state(state(dir.path()));

        let response = get(app, "/api/logs").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "[]");
    }

    #[tokio::test]
    async fn logs_show_last_report() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        state
            .set_last_report(RunReport {
                emails: 1,
                drafts: 1,
                events: 0,
                entries: vec![LogEntry {
                    time: "2025-03-19 09:00:00".into(),
                    to: "alice@example.com".into(),
                    subject: "Hello".into(),
                    body: "Hi,\n\nThanks".into(),
                    outcome: Outcome::Acknowledged,
                    slot: None,
                    draft_id: "r-1".into(),
                    event_id: None,
                }],
            })
            .await;

        let body = body_text(get(router().with_state(state), "/api/logs").await).await;
        let entries: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(entries[0]["to"], "alice@example.com");
        assert_eq!(entries[0]["outcome"], "acknowledged");
    }

    #[tokio::test]
    async fn status_reports_connected_account() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let body = body_text(get(router().with_state(state.clone()), "/api/status").await).await;
        assert_eq!(body, r#"{"authenticated":false,"account":null}"#);

        let data = SessionData::new("me@example.com", "a", "r", 3600);
        Session::new(state.session_path(), data).save().unwrap();

        let body = body_text(get(router().with_state(state), "/api/status").await).await;
        assert_eq!(body, r#"{"authenticated":true,"account":"me@example.com"}"#);
    }

    #[tokio::test]
    async fn run_without_session_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = router().with_state(state(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/run")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert!(body.contains("Not logged in"));
    }

    #[tokio::test]
    async fn run_finishes_after_caller_is_dropped() {
        let lock = Arc::new(Mutex::new(()));
        let done = Arc::new(AtomicBool::new(false));

        let flag = done.clone();
        let caller = tokio::spawn(run_detached(lock.clone(), async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<_, anyhow::Error>(())
        }));

        tokio::time::sleep(Duration::from_millis(10)).await;
        caller.abort();
        assert!(!done.load(Ordering::SeqCst));

        // Lock is released only once the work is done
        let _guard = lock.lock().await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn runs_do_not_overlap() {
        let lock = Arc::new(Mutex::new(()));
        let held = lock.clone().lock_owned().await;

        let second = tokio::spawn(run_detached(lock.clone(), async { Ok::<_, anyhow::Error>(42) }));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!second.is_finished());

        drop(held);
        assert_eq!(second.await.unwrap().unwrap(), 42);
    }
}
