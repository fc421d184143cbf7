use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use common::{AppState, auth::{AUTH_SESSION_KEY, is_admin, password_matches}};
use std::sync::Arc;
use askama::Template;
use serde::Deserialize;
use tower_sessions::Session;

/// The password input is never pre-filled, so a failed attempt clears it.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub password: String,
}

fn render_login(status: StatusCode, error: Option<String>) -> Response {
    let template = LoginTemplate { error };
    match template.render() {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Template Error").into_response(),
    }
}

pub async fn login_get(session: Session) -> Response {
    if is_admin(&session).await {
        return Redirect::to("/admin").into_response();
    }
    render_login(StatusCode::OK, None)
}

pub async fn login_post(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(payload): Form<LoginForm>,
) -> Response {
    if is_admin(&session).await {
        return Redirect::to("/admin").into_response();
    }

    if password_matches(&state.config.admin_password, &payload.password) {
        if let Err(e) = session.insert(AUTH_SESSION_KEY, true).await {
            tracing::error!("Failed to store admin session: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Session Error").into_response();
        }
        tracing::info!("Admin logged in");
        return Redirect::to("/admin").into_response();
    }

    tracing::warn!("Rejected admin login attempt");
    render_login(StatusCode::UNAUTHORIZED, Some("비밀번호가 일치하지 않습니다.".into()))
}

pub async fn logout(session: Session) -> Response {
    if let Err(e) = session.flush().await {
        tracing::error!("Failed to clear admin session: {}", e);
    }
    Redirect::to("/").into_response()
}
