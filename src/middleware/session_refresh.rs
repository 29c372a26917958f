use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;

use crate::auth::session::{self, SESSION_COOKIE};
use crate::state::SharedState;

/// Re-issue a valid session cookie with a fresh expiry on every request, so
/// sessions only lapse after a full day of inactivity. Responses that set the
/// session cookie themselves (login, logout) are left alone.
pub async fn refresh_session(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Response {
    let now = state.clock.now();
    let renewed = CookieJar::from_headers(req.headers())
        .get(SESSION_COOKIE)
        .and_then(|cookie| session::decode_token(cookie.value(), &state.keys.session, now).ok())
        .map(|claims| claims.renewed(now));

    let mut response = next.run(req).await;

    let Some(claims) = renewed else {
        return response;
    };
    if sets_session_cookie(&response) {
        return response;
    }

    match session::encode_token(&claims, &state.keys.session) {
        Ok(token) => {
            let cookie = session::session_cookie(token, state.config.secure_cookies());
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => tracing::error!("Failed to build session cookie header: {e}"),
            }
        }
        Err(e) => tracing::error!("Failed to renew session for user {}: {e}", claims.sub),
    }

    response
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&prefix))
}
