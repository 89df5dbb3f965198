//! The single-page UI: run button, log panel, draft preview.

use axum::{Router, extract::State, response::Html, routing::get};
use mailcal_core::{LogEntry, RunReport};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// GET / - Render the page with the last run's results
async fn index(State(state): State<AppState>) -> Html<String> {
    let account = state.account();
    let report = state.last_report().await;
    Html(render_page(account.as_deref(), report.as_ref()))
}

const STYLE: &str = "\
body { font-family: system-ui, sans-serif; max-width: 56rem; margin: 2rem auto; padding: 0 1rem; }
header { display: flex; justify-content: space-between; align-items: center; }
button { font-size: 1rem; padding: .5rem 1.25rem; cursor: pointer; }
#log { background: #111; color: #ddd; padding: 1rem; min-height: 6rem; font-family: monospace; white-space: pre-wrap; }
#preview { border: 1px solid #ccc; padding: 1rem; white-space: pre-wrap; }
.error { color: #b00020; }
.info { color: #666; }";

const SCRIPT: &str = "\
async function runAssistant() {
  const button = document.getElementById('run');
  const status = document.getElementById('status');
  button.disabled = true;
  status.className = 'info';
  status.textContent = 'Running...';
  try {
    const res = await fetch('/api/run', { method: 'POST' });
    const body = await res.json();
    if (!res.ok) { throw new Error(body.error); }
    window.location.reload();
  } catch (e) {
    status.className = 'error';
    status.textContent = e.message;
    button.disabled = false;
  }
}";

fn render_page(account: Option<&str>, report: Option<&RunReport>) -> String {
    let account_html = match account {
        Some(email) => format!("<span>Connected as {}</span>", escape(email)),
        None => "<a href=\"/auth/google\">Connect Google</a>".to_string(),
    };

    let (log_html, preview_html) = match report.and_then(|r| r.last_draft().map(|d| (r, d))) {
        Some((report, last)) => (render_log(report), render_preview(last)),
        None => (
            String::new(),
            "<p class=\"info\">No drafts yet</p>".to_string(),
        ),
    };

    format!(
        "<!doctype html>
<html>
<head>
<meta charset=\"utf-8\">
<title>mailcal</title>
<style>{STYLE}</style>
</head>
<body>
<header><h1>mailcal</h1>{account_html}</header>
<p><button id=\"run\" onclick=\"runAssistant()\">Run assistant</button> <span id=\"status\"></span></p>
<h2>Log</h2>
<div id=\"log\">{log_html}</div>
<h2>Draft preview</h2>
<div id=\"preview\">{preview_html}</div>
<script>{SCRIPT}</script>
</body>
</html>"
    )
}

fn render_log(report: &RunReport) -> String {
    let mut lines = vec![format!(
        "{} emails, {} drafts, {} events",
        report.emails, report.drafts, report.events
    )];

    lines.extend(report.entries.iter().map(|e| {
        let slot = e.slot.as_deref().map(|s| format!(" [{s}]")).unwrap_or_default();
        format!(
            "{} {:?} {} \"{}\"{}",
            e.time, e.outcome, e.to, e.subject, slot
        )
    }));

    escape(&lines.join("\n"))
}

fn render_preview(entry: &LogEntry) -> String {
    format!(
        "<strong>To:</strong> {}\n<strong>Subject:</strong> {}\n\n{}",
        escape(&entry.to),
        escape(&entry.subject),
        escape(&entry.body)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{body_text, get, state};
    use axum::http::StatusCode;
    use mailcal_core::Outcome;

    fn entry(to: &str, subject: &str) -> LogEntry {
        LogEntry {
            time: "2025-03-19 09:00:00".into(),
            to: to.into(),
            subject: subject.into(),
            body: "Hi,\n\nBooked.".into(),
            outcome: Outcome::Confirmed,
            slot: Some("Thursday 20 March 2025, 15:00-15:30 (UTC)".into()),
            draft_id: "r-1".into(),
            event_id: Some("ev-1".into()),
        }
    }

    #[tokio::test]
    async fn fresh_page_offers_login_and_has_no_drafts() {
        let dir = tempfile::tempdir().unwrap();
        let response = get(router().with_state(state(dir.path())), "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Run assistant"));
        assert!(html.contains("href=\"/auth/google\""));
        assert!(html.contains("No drafts yet"));
    }

    #[test]
    fn preview_shows_last_draft_escaped() {
        let report = RunReport {
            emails: 2,
            drafts: 2,
            events: 1,
            entries: vec![
                entry("first@example.com", "First"),
                entry("bob@example.com", "Re: <lunch> & more"),
            ],
        };

        let html = render_page(Some("me@example.com"), Some(&report));
        assert!(html.contains("Connected as me@example.com"));
        assert!(html.contains("2 emails, 2 drafts, 1 events"));
        assert!(html.contains("<strong>To:</strong> bob@example.com"));
        assert!(html.contains("Re: &lt;lunch&gt; &amp; more"));
        assert!(!html.contains("No drafts yet"));
        assert!(!html.contains("Connect Google"));
    }

    #[test]
    fn empty_report_still_says_no_drafts() {
        let html = render_page(None, Some(&RunReport::default()));
        assert!(html.contains("No drafts yet"));
    }
}
