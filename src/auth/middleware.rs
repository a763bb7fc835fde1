use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::jwt::{verify_token, TokenType};
use crate::config::{Config, AUTH_COOKIE};
use crate::error::AppError;
use crate::AppState;

pub const LOGIN_PATH: &str = "/accounts/login/";

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// Resolves the access token from the `Authorization: Bearer` header,
/// falling back to the auth cookie set by the login form.
fn authenticate(headers: &HeaderMap, config: &Config) -> Result<AuthUser, AppError> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    let token = match bearer {
        Some(token) => token,
        None => CookieJar::from_headers(headers)
            .get(AUTH_COOKIE)
            .map(|c| c.value().to_owned())
            .ok_or(AppError::Unauthorized)?,
    };

    let token_data = verify_token(&token, config)?;
    if token_data.claims.token_type != TokenType::Access {
        return Err(AppError::Unauthorized);
    }

    Ok(AuthUser {
        id: token_data.claims.sub,
        username: token_data.claims.username,
    })
}

/// JSON API guard: unauthenticated requests get a 401.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = authenticate(req.headers(), &state.config)?;
    req.extensions_mut().insert(auth_user);
    Ok(next.run(req).await)
}

/// HTML page guard: unauthenticated requests are sent to the login form.
pub async fn require_login(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match authenticate(req.headers(), &state.config) {
        Ok(auth_user) => {
            req.extensions_mut().insert(auth_user);
            next.run(req).await
        }
        Err(_) => {
            let next_path = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_owned())
                .unwrap_or_else(|| "/".into());
            Redirect::to(&login_redirect(&next_path)).into_response()
        }
    }
}

pub fn login_redirect(next_path: &str) -> String {
    match serde_urlencoded::to_string([("next", next_path)]) {
        Ok(query) => format!("{}?{}", LOGIN_PATH, query),
        Err(_) => LOGIN_PATH.to_string(),
    }
}

/// Only same-site absolute paths are accepted as post-login targets.
/// Browsers treat `\` like `/` and drop tabs and newlines, so either can
/// turn a path into a protocol-relative URL.
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(|c| c.is_control()) =>
        {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
