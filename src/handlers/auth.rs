use axum::{extract::State, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    jwt::{create_token_pair, hash_token, verify_token, TokenPair, TokenType},
    middleware::AuthUser,
    password::{hash_password, verify_password},
};
use crate::config::{Config, AUTH_COOKIE, REFRESH_COOKIE};
use crate::dto::{LoginRequest, RefreshRequest, RegisterRequest};
use crate::error::{AppError, AppResult};
use crate::models::user::{User, UserProfile};
use crate::services::settings::SettingsService;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserProfile,
}

async fn store_refresh_token(
    db: &PgPool,
    user_id: Uuid,
    raw_refresh_token: &str,
    ttl_secs: i64,
    parent_token_id: Option<Uuid>,
) -> AppResult<Uuid> {
    let token_hash = hash_token(raw_refresh_token);
    let expires_at = Utc::now() + Duration::seconds(ttl_secs);
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (id, user_id, token_hash, expires_at, parent_token_id)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&token_hash)
    .bind(expires_at)
    .bind(parent_token_id)
    .execute(db)
    .await?;

    Ok(id)
}

/// Create a token pair AND persist the refresh token hash in the DB.
pub async fn issue_token_pair(
    db: &PgPool,
    user_id: Uuid,
    username: &str,
    config: &Config,
    parent_token_id: Option<Uuid>,
) -> AppResult<TokenPair> {
    let tokens = create_token_pair(user_id, username, config)?;
    store_refresh_token(
        db,
        user_id,
        &tokens.refresh_token,
        config.jwt_refresh_ttl_secs,
        parent_token_id,
    )
    .await?;
    Ok(tokens)
}

/// Revoke all active refresh tokens for a user.
pub async fn revoke_all_user_tokens(db: &PgPool, user_id: Uuid) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = true, revoked_at = NOW()
        WHERE user_id = $1 AND revoked = false
        "#,
    )
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(())
}

pub fn with_auth_cookies(jar: CookieJar, tokens: &TokenPair, config: &Config) -> CookieJar {
    let cookie = |name: &'static str, value: String| {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(config.cookie_secure)
    };
    jar.add(cookie(AUTH_COOKIE, tokens.access_token.clone()))
        .add(cookie(REFRESH_COOKIE, tokens.refresh_token.clone()))
}

pub fn without_auth_cookies(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(AUTH_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"))
}

/// Creates the user and its settings row.
pub async fn create_account(
    state: &AppState,
    username: &str,
    password: &str,
    email: Option<&str>,
) -> AppResult<User> {
    if !state.config.registration_open {
        return Err(AppError::NotFound("Registration is closed".into()));
    }

    let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username = $1")
        .bind(username)
        .fetch_one(&state.db)
        .await?;

    if existing > 0 {
        return Err(AppError::Conflict("Username already taken".into()));
    }

    let pwd_hash = hash_password(password)?;
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(email)
    .bind(&pwd_hash)
    .fetch_one(&state.db)
    .await?;

    SettingsService::new(&state.db, user.id, state.config.default_view_mode)
        .user_settings()
        .await?;

    tracing::info!(user_id = %user.id, "Registered user");
    Ok(user)
}

/// Unknown user, inactive user and wrong password all look the same.
pub async fn check_credentials(db: &PgPool, username: &str, password: &str) -> AppResult<User> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE username = $1 AND is_active = true",
    )
    .bind(username.trim())
    .fetch_optional(db)
    .await?
    .ok_or(AppError::Unauthorized)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    Ok(user)
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    body.validate()?;

    let user = create_account(&state, body.username.trim(), &body.password, body.email.as_deref()).await?;
    let tokens = issue_token_pair(&state.db, user.id, &user.username, &state.config, None).await?;

    let jar = with_auth_cookies(jar, &tokens, &state.config);
    Ok((
        jar,
        Json(AuthResponse {
            tokens,
            user: user.into(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<AuthResponse>)> {
    body.validate()?;

    let user = check_credentials(&state.db, &body.username, &body.password).await?;
    let tokens = issue_token_pair(&state.db, user.id, &user.username, &state.config, None).await?;

    let jar = with_auth_cookies(jar, &tokens, &state.config);
    Ok((
        jar,
        Json(AuthResponse {
            tokens,
            user: user.into(),
        }),
    ))
}

pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> AppResult<(CookieJar, Json<TokenPair>)> {
    let raw_token = body
        .and_then(|Json(b)| b.refresh_token)
        .or_else(|| jar.get(REFRESH_COOKIE).map(|c| c.value().to_owned()))
        .ok_or(AppError::Unauthorized)?;

    let token_data = verify_token(&raw_token, &state.config)?;
    if token_data.claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized);
    }

    let token_hash = hash_token(&raw_token);
    let (stored_id, stored_user_id, revoked) = sqlx::query_as::<_, (Uuid, Uuid, bool)>(
        r#"
        SELECT id, user_id, revoked
        FROM refresh_tokens
        WHERE token_hash = $1
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::Unauthorized)?;

    // A revoked token coming back means it leaked: drop the whole family.
    if revoked {
        tracing::warn!(
            user_id = %stored_user_id,
            token_id = %stored_id,
            "Refresh token reuse detected, revoking all tokens for user"
        );
        revoke_all_user_tokens(&state.db, stored_user_id).await?;
        return Err(AppError::Unauthorized);
    }

    if stored_user_id != token_data.claims.sub {
        return Err(AppError::Unauthorized);
    }

    let is_active = sqlx::query_scalar::<_, bool>("SELECT is_active FROM users WHERE id = $1")
        .bind(stored_user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;
    if !is_active {
        tracing::warn!(user_id = %stored_user_id, "Refresh attempted for deactivated user");
        revoke_all_user_tokens(&state.db, stored_user_id).await?;
        return Err(AppError::Forbidden);
    }

    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = true, revoked_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(stored_id)
    .execute(&state.db)
    .await?;

    let tokens = issue_token_pair(
        &state.db,
        token_data.claims.sub,
        &token_data.claims.username,
        &state.config,
        Some(stored_id),
    )
    .await?;

    let jar = with_auth_cookies(jar, &tokens, &state.config);
    Ok((jar, Json(tokens)))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<serde_json::Value>)> {
    revoke_all_user_tokens(&state.db, auth_user.id).await?;
    Ok((
        without_auth_cookies(jar),
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    ))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> TokenPair {
        TokenPair {
            access_token: "access".into(),
            refresh_token: "refresh".into(),
            expires_in: 900,
        }
    }

    #[test]
    fn test_auth_cookies_are_http_only() {
        let jar = with_auth_cookies(CookieJar::new(), &tokens(), &Config::for_tests());
        let access = jar.get(AUTH_COOKIE).unwrap();
        assert_eq!(access.value(), "access");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_eq!(jar.get(REFRESH_COOKIE).unwrap().value(), "refresh");
    }

    #[test]
    fn test_without_auth_cookies_clears_both() {
        let jar = with_auth_cookies(CookieJar::new(), &tokens(), &Config::for_tests());
        let jar = without_auth_cookies(jar);
        assert!(jar.get(AUTH_COOKIE).is_none());
        assert!(jar.get(REFRESH_COOKIE).is_none());
    }

    #[test]
    fn test_auth_response_flattens_tokens() {
        let resp = AuthResponse {
            tokens: tokens(),
            user: UserProfile {
                id: Uuid::nil(),
                username: "anna".into(),
                email: None,
                created_at: Utc::now(),
            },
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["access_token"], "access");
        assert_eq!(json["user"]["username"], "anna");
    }
}
