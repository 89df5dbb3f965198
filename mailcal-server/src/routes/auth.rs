//! Connecting a Google account from the browser

use axum::{
    Router,
    extract::{Query, State},
    response::Redirect,
    routing::get,
};
use mailcal_google::{AppConfig, oauth};
use serde::Deserialize;

use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/google", get(start))
        .route("/auth/google/callback", get(callback))
}

/// GET /auth/google - Send the browser to Google's consent screen
async fn start(State(state): State<AppState>) -> Result<Redirect, AppError> {
    let app_config = AppConfig::load()?;
    let request = oauth::authorization_url(&app_config, &state.redirect_uri())?;

    state.remember_oauth_state(request.state);
    Ok(Redirect::to(&request.url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// GET /auth/google/callback - Finish the login and go back to the UI
async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Redirect, AppError> {
    if let Some(error) = params.error {
        return Err(AppError::bad_request(format!("Google denied access: {error}")));
    }

    let oauth_state = params.state.unwrap_or_default();
    if !state.take_oauth_state(&oauth_state) {
        return Err(AppError::bad_request(
            "OAuth state mismatch. Start again from the home page.",
        ));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::bad_request("No code in callback"))?;

    let app_config = AppConfig::load()?;
    oauth::complete(
        &app_config,
        &code,
        &oauth_state,
        &state.redirect_uri(),
        state.session_path(),
    )
    .await?;

    Ok(Redirect::to("/"))
}
