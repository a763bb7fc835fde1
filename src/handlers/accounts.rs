use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::jwt::verify_token;
use crate::auth::middleware::{safe_next, LOGIN_PATH};
use crate::config::REFRESH_COOKIE;
use crate::dto::{CredentialsForm, NextQuery};
use crate::error::{AppError, AppResult};
use crate::handlers::auth::{
    check_credentials, create_account, issue_token_pair, revoke_all_user_tokens, with_auth_cookies,
    without_auth_cookies,
};
use crate::templates::{LoginTemplate, Nav, RegisterTemplate};
use crate::AppState;

const MIN_PASSWORD_LEN: usize = 8;

fn login_page(state: &AppState, error: &str, username: &str, next: Option<&str>) -> AppResult<Html<String>> {
    let page = LoginTemplate {
        nav: Nav::anonymous(),
        error: error.to_string(),
        username: username.to_string(),
        next: safe_next(next),
        registration_open: state.config.registration_open,
    };
    Ok(Html(page.render()?))
}

fn register_page(error: &str, username: &str, email: &str) -> AppResult<Html<String>> {
    let page = RegisterTemplate {
        nav: Nav::anonymous(),
        error: error.to_string(),
        username: username.to_string(),
        email: email.to_string(),
    };
    Ok(Html(page.render()?))
}

/// Form-level checks that the JSON side leaves to `validator`.
fn registration_error(form: &CredentialsForm) -> Option<&'static str> {
    let username = form.username.trim();
    if username.is_empty() || username.len() > 150 {
        return Some("Username must be between 1 and 150 characters");
    }
    if form.password.len() < MIN_PASSWORD_LEN {
        return Some("Password must be at least 8 characters");
    }
    None
}

pub async fn login_form(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
) -> AppResult<Html<String>> {
    login_page(&state, "", "", query.next.as_deref())
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> AppResult<Response> {
    let user = match check_credentials(&state.db, &form.username, &form.password).await {
        Ok(user) => user,
        Err(AppError::Unauthorized) => {
            tracing::info!(username = %form.username.trim(), "Rejected login form");
            let page = login_page(
                &state,
                "Please enter a correct username and password.",
                form.username.trim(),
                form.next.as_deref(),
            )?;
            return Ok(page.into_response());
        }
        Err(e) => return Err(e),
    };

    let tokens = issue_token_pair(&state.db, user.id, &user.username, &state.config, None).await?;
    let jar = with_auth_cookies(jar, &tokens, &state.config);

    tracing::info!(user_id = %user.id, "User logged in via form");
    Ok((jar, Redirect::to(&safe_next(form.next.as_deref()))).into_response())
}

pub async fn register_form(State(state): State<AppState>) -> AppResult<Html<String>> {
    if !state.config.registration_open {
        return Err(AppError::NotFound("Registration is closed".into()));
    }
    register_page("", "", "")
}

pub async fn register_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> AppResult<Response> {
    if !state.config.registration_open {
        return Err(AppError::NotFound("Registration is closed".into()));
    }

    if let Some(error) = registration_error(&form) {
        return Ok(register_page(error, form.username.trim(), &form.email)?.into_response());
    }

    let email = Some(form.email.trim()).filter(|e| !e.is_empty());
    let user = match create_account(&state, form.username.trim(), &form.password, email).await {
        Ok(user) => user,
        Err(AppError::Conflict(message)) => {
            return Ok(register_page(&message, form.username.trim(), &form.email)?.into_response());
        }
        Err(e) => return Err(e),
    };

    let tokens = issue_token_pair(&state.db, user.id, &user.username, &state.config, None).await?;
    let jar = with_auth_cookies(jar, &tokens, &state.config);
    Ok((jar, Redirect::to("/")).into_response())
}

/// Works without a valid access token; the refresh cookie identifies the
/// user whose tokens get revoked.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> AppResult<(CookieJar, Redirect)> {
    let user_id = jar
        .get(REFRESH_COOKIE)
        .and_then(|c| verify_token(c.value(), &state.config).ok())
        .map(|data| data.claims.sub);

    if let Some(user_id) = user_id {
        revoke_all_user_tokens(&state.db, user_id).await?;
        tracing::info!(user_id = %user_id, "User logged out");
    }

    Ok((without_auth_cookies(jar), Redirect::to(LOGIN_PATH)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials(username: &str, password: &str) -> CredentialsForm {
        CredentialsForm {
            username: username.into(),
            password: password.into(),
            email: String::new(),
            next: None,
        }
    }

    #[test]
    fn test_registration_error() {
        assert!(registration_error(&credentials("anna", "long-enough")).is_none());
        assert!(registration_error(&credentials("  ", "long-enough")).is_some());
        assert!(registration_error(&credentials("anna", "short")).is_some());
        assert!(registration_error(&credentials(&"a".repeat(151), "long-enough")).is_some());
    }

    #[test]
    fn test_register_page_keeps_input() {
        let html = register_page("Username already taken", "anna", "anna@example.org").unwrap();
        assert!(html.0.contains("Username already taken"));
        assert!(html.0.contains("value=\"anna@example.org\""));
    }
}
