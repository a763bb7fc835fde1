use axum::{
    extract::{OriginalUri, Query, State},
    http::header,
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::dto::{
    CalendarResponse, EntryDayRequest, ExportResponse, LimitOffsetQuery, MoodTableQuery,
    MoodTableResponse, SaveNoteForm, SearchQuery, StandoutResponse, WeekResponse,
};
use crate::error::{AppError, AppResult};
use crate::models::entry::{parse_mood, Entry, EntryWithNote};
use crate::models::user::User;
use crate::services::dates::{format_date, is_supported_date, parse_date, today};
use crate::services::entries::{EntryService, SearchFilter};
use crate::services::mood::MoodPalette;
use crate::services::pagination::{LimitOffset, Paginated};
use crate::services::settings::SettingsService;
use crate::AppState;

/// Splits the `{mood}_{YYYY-MM-DD}` value posted by the entry buttons.
pub fn parse_entry_field(raw: &str) -> Option<(i32, NaiveDate)> {
    let (mood, day) = raw.trim().split_once('_')?;
    Some((parse_mood(mood)?, parse_date(day)?))
}

/// Trimmed, non-empty week value of a note form.
pub fn note_week(form: &SaveNoteForm) -> AppResult<&str> {
    form.week
        .as_deref()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| AppError::BadRequest("week is required".into()))
}

pub async fn save_entry_day(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<EntryDayRequest>,
) -> AppResult<Json<Entry>> {
    body.validate()?;
    if !is_supported_date(body.day) {
        return Err(AppError::BadRequest("day is out of range".into()));
    }

    let entry = EntryService::new(&state.db, auth_user.id)
        .save_entry(body.period, body.mood, body.day)
        .await?;
    Ok(Json(entry))
}

pub async fn save_note(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(form): Json<SaveNoteForm>,
) -> AppResult<Json<WeekResponse>> {
    let week = note_week(&form)?;
    let note = form.note.as_deref().unwrap_or("");

    let week = EntryService::new(&state.db, auth_user.id)
        .save_note(week, note)
        .await?;
    Ok(Json(week.into()))
}

pub async fn mood_table(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MoodTableQuery>,
) -> AppResult<Json<MoodTableResponse>> {
    let settings = SettingsService::new(&state.db, auth_user.id, state.config.default_view_mode)
        .user_settings()
        .await?;
    let palette = MoodPalette::for_settings(&settings);

    let mood_table = EntryService::new(&state.db, auth_user.id)
        .mood_table(query.start_dt.as_deref(), today(), settings.language())
        .await?;

    Ok(Json(MoodTableResponse {
        mood_table,
        moods: palette.mapping(),
        view_day_form: settings.view_day_form,
        view_night_form: settings.view_night_form,
    }))
}

pub async fn standout_data(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<StandoutResponse>> {
    let palette = SettingsService::new(&state.db, auth_user.id, state.config.default_view_mode)
        .palette()
        .await?;
    let data = EntryService::new(&state.db, auth_user.id)
        .standout_data(today())
        .await?;

    Ok(Json(StandoutResponse {
        data,
        moods: palette.mapping(),
    }))
}

pub async fn search(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<SearchQuery>,
    Query(paging): Query<LimitOffsetQuery>,
) -> AppResult<Json<Paginated<EntryWithNote>>> {
    let filter = SearchFilter::parse(&query.mood, &query.search_term, &query.start_date, &query.end_date);
    let paging = LimitOffset::new(
        paging.limit.as_deref(),
        paging.offset.as_deref(),
        state.config.api_page_size,
    );

    let service = EntryService::new(&state.db, auth_user.id);
    let count = service.search_count(&filter).await?;
    let results = service.search(&filter, paging.limit, paging.offset).await?;

    let base_query = serde_urlencoded::to_string(&query)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode query: {}", e)))?;

    Ok(Json(Paginated {
        count,
        next: paging.next_link(uri.path(), &base_query, count),
        previous: paging.previous_link(uri.path(), &base_query),
        results,
    }))
}

pub async fn calendar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<CalendarResponse>> {
    let palette = SettingsService::new(&state.db, auth_user.id, state.config.default_view_mode)
        .palette()
        .await?;
    let entries = EntryService::new(&state.db, auth_user.id).calendar().await?;

    Ok(Json(CalendarResponse {
        entries,
        mood_mapping: palette.mapping(),
        mood_colors: palette.colors(),
    }))
}

pub async fn export(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<impl IntoResponse> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth_user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))?;

    let settings = SettingsService::new(&state.db, auth_user.id, state.config.default_view_mode)
        .user_settings()
        .await?;
    let data = EntryService::new(&state.db, auth_user.id).export().await?;
    let exported_on = today();

    tracing::info!(
        user_id = %auth_user.id,
        entries = data.entries.len(),
        weeks = data.weeks.len(),
        "Exported user data"
    );

    let disposition = format!(
        "attachment; filename=\"moodcal-export-{}.json\"",
        format_date(exported_on)
    );
    Ok((
        [(header::CONTENT_DISPOSITION, disposition)],
        Json(ExportResponse {
            username: user.username,
            exported_on,
            settings,
            data,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entry_field() {
        assert_eq!(
            parse_entry_field("4_2021-11-07"),
            Some((4, NaiveDate::from_ymd_opt(2021, 11, 7).unwrap()))
        );
    }

    #[test]
    fn test_parse_entry_field_rejects_malformed() {
        assert_eq!(parse_entry_field("4"), None);
        assert_eq!(parse_entry_field("9_2021-11-07"), None);
        assert_eq!(parse_entry_field("4_2021-13-07"), None);
        assert_eq!(parse_entry_field("_2021-11-07"), None);
        assert_eq!(parse_entry_field(""), None);
    }

    #[test]
    fn test_note_week_requires_value() {
        let form = SaveNoteForm {
            week: Some("  ".into()),
            note: Some("hello".into()),
        };
        assert!(matches!(note_week(&form), Err(AppError::BadRequest(_))));

        let form = SaveNoteForm {
            week: Some(" 2021-11-08 ".into()),
            note: None,
        };
        assert_eq!(note_week(&form).unwrap(), "2021-11-08");
    }
}
