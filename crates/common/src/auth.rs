//! Admin gate: one shared password, checked by plain string equality, with the
//! unlocked state kept in the in-memory session. Good enough for a low-stakes
//! internal tool and nothing more: no hashing, no expiry, no lockout.

use axum::{
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    extract::Request,
};
use tower_sessions::Session;

pub const AUTH_SESSION_KEY: &str = "authenticated";

pub const DEFAULT_ADMIN_PASSWORD: &str = "8999";

pub fn password_matches(config_password: &str, candidate: &str) -> bool {
    candidate == config_password
}

pub async fn is_admin(session: &Session) -> bool {
    session
        .get::<bool>(AUTH_SESSION_KEY)
        .await
        .unwrap_or(None)
        .unwrap_or(false)
}

pub async fn auth_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if is_admin(&session).await {
        next.run(request).await
    } else {
        Redirect::to("/login").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_exact_match() {
        assert!(password_matches("8999", "8999"));
        assert!(!password_matches("8999", "8999 "));
        assert!(!password_matches("8999", ""));
    }
}
