use axum::{extract::State, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::middleware::AuthUser;
use crate::dto::{FormsDisplayed, MoodColorsRequest, MoodColorsResponse, SetLanguageRequest};
use crate::error::AppResult;
use crate::models::settings::UserSettings;
use crate::services::mood::{catalog, Catalog, MoodPalette};
use crate::services::settings::SettingsService;
use crate::AppState;

/// Mirrors the stored language for clients that read it before logging in.
pub const LANGUAGE_COOKIE: &str = "sk-language";

fn service<'a>(state: &'a AppState, auth_user: &AuthUser) -> SettingsService<'a> {
    SettingsService::new(&state.db, auth_user.id, state.config.default_view_mode)
}

pub async fn get_settings(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserSettings>> {
    Ok(Json(service(&state, &auth_user).user_settings().await?))
}

pub async fn set_language(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    jar: CookieJar,
    Json(body): Json<SetLanguageRequest>,
) -> AppResult<(CookieJar, Json<UserSettings>)> {
    let settings = service(&state, &auth_user).set_language(&body.language).await?;

    let cookie = Cookie::build((LANGUAGE_COOKIE, settings.language.clone()))
        .path("/")
        .same_site(SameSite::Lax);
    Ok((jar.add(cookie), Json(settings)))
}

pub async fn get_forms_displayed(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<FormsDisplayed>> {
    let settings = service(&state, &auth_user).user_settings().await?;
    Ok(Json(FormsDisplayed {
        view_day_form: settings.view_day_form,
        view_night_form: settings.view_night_form,
    }))
}

pub async fn set_forms_displayed(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<FormsDisplayed>,
) -> AppResult<Json<FormsDisplayed>> {
    let settings = service(&state, &auth_user)
        .set_forms_displayed(body.view_day_form, body.view_night_form)
        .await?;
    Ok(Json(FormsDisplayed {
        view_day_form: settings.view_day_form,
        view_night_form: settings.view_night_form,
    }))
}

pub async fn get_mood_colors(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<MoodColorsResponse>> {
    let palette = service(&state, &auth_user).palette().await?;
    Ok(Json(MoodColorsResponse {
        colors: palette.colors(),
    }))
}

pub async fn set_mood_colors(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<MoodColorsRequest>,
) -> AppResult<Json<MoodColorsResponse>> {
    let settings = service(&state, &auth_user)
        .set_mood_colors(&body.colors)
        .await?;
    Ok(Json(MoodColorsResponse {
        colors: MoodPalette::for_settings(&settings).colors(),
    }))
}

pub async fn translations(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Catalog>> {
    let settings = service(&state, &auth_user).user_settings().await?;
    Ok(Json(catalog(settings.language())))
}
