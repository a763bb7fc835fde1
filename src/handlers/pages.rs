use askama::Template;
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Extension, Form,
};
use chrono::NaiveDate;

use crate::auth::middleware::AuthUser;
use crate::dto::{GraphQuery, MoodTableQuery, PageQuery, SaveMoodForm, SaveNoteForm, SaveSettingsForm, SearchQuery};
use crate::error::{AppError, AppResult};
use crate::handlers::entries::{note_week, parse_entry_field};
use crate::handlers::graphs::build_graph;
use crate::models::entry::Period;
use crate::services::dates::{format_date, today};
use crate::services::entries::{EntryService, SearchFilter};
use crate::services::mood::MoodPalette;
use crate::services::pagination::{PageInfo, PageRequest};
use crate::services::settings::{checkbox, SettingsService};
use crate::templates::{
    calendar_months, legend, search_rows, CalendarTemplate, GraphTemplate, IndexTemplate, Nav,
    SearchTemplate, SettingsTemplate,
};
use crate::AppState;

fn settings_service<'a>(state: &'a AppState, auth_user: &AuthUser) -> SettingsService<'a> {
    SettingsService::new(&state.db, auth_user.id, state.config.default_view_mode)
}

fn week_redirect(day: NaiveDate) -> Redirect {
    Redirect::to(&format!("/?start_dt={}", format_date(day)))
}

/// Validates the mood form completely before anything is written.
pub fn parse_save_mood(form: &SaveMoodForm) -> AppResult<(Period, i32, NaiveDate)> {
    let period = form
        .period
        .as_deref()
        .and_then(Period::parse)
        .ok_or_else(|| AppError::BadRequest("Unknown period".into()))?;
    let (mood, day) = form
        .entry
        .as_deref()
        .and_then(parse_entry_field)
        .ok_or_else(|| AppError::BadRequest("Malformed entry".into()))?;
    Ok((period, mood, day))
}

pub async fn index(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<MoodTableQuery>,
) -> AppResult<Html<String>> {
    let settings = settings_service(&state, &auth_user).user_settings().await?;
    let palette = MoodPalette::for_settings(&settings);
    let today = today();

    let entries = EntryService::new(&state.db, auth_user.id);
    let table = entries
        .mood_table(query.start_dt.as_deref(), today, settings.language())
        .await?;
    let standout = entries.standout_data(today).await?;

    let page = IndexTemplate::new(
        Nav::user(&auth_user.username, &palette),
        &table,
        &standout,
        &settings,
        &palette,
        today,
    );
    Ok(Html(page.render()?))
}

pub async fn save_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Form(form): Form<SaveMoodForm>,
) -> AppResult<Redirect> {
    let (period, mood, day) = parse_save_mood(&form)?;

    EntryService::new(&state.db, auth_user.id)
        .save_entry(period, mood, day)
        .await?;
    Ok(week_redirect(day))
}

pub async fn save_note(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Form(form): Form<SaveNoteForm>,
) -> AppResult<Redirect> {
    let week = note_week(&form)?;
    let note = form.note.as_deref().unwrap_or("");

    let week = EntryService::new(&state.db, auth_user.id)
        .save_note(week, note)
        .await?;
    Ok(week_redirect(week.week_date))
}

pub async fn graph(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<GraphQuery>,
) -> AppResult<Html<String>> {
    let palette = settings_service(&state, &auth_user).palette().await?;
    let graph = build_graph(&state, auth_user.id, &query).await?;

    let page = GraphTemplate {
        nav: Nav::user(&auth_user.username, &palette),
        start_dt: format_date(graph.range.start),
        end_dt: format_date(graph.range.end),
        is_markers: graph.is_markers,
        scatter_json: graph.scatter.figure.to_string(),
        pie_day_json: graph.pie_chart_day.figure.to_string(),
        pie_night_json: graph.pie_chart_night.figure.to_string(),
        bar_json: graph.bar_chart.figure.to_string(),
        ranges: graph.graph_time_ranges,
    };
    Ok(Html(page.render()?))
}

pub async fn settings(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Html<String>> {
    let service = settings_service(&state, &auth_user);
    let settings = service.user_settings().await?;
    let palette = MoodPalette::for_settings(&settings);

    let page = SettingsTemplate::new(
        Nav::user(&auth_user.username, &palette),
        &settings,
        service.get_default_view_mode(),
        &palette,
    );
    Ok(Html(page.render()?))
}

pub async fn save_settings(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Form(form): Form<SaveSettingsForm>,
) -> AppResult<Redirect> {
    let service = settings_service(&state, &auth_user);
    match form.form_name.as_str() {
        "save_view_forms" => {
            service
                .set_forms_displayed(checkbox(&form.view_day_form), checkbox(&form.view_night_form))
                .await?;
        }
        "save_view_mode" => {
            service.set_view_mode(&form.default_view_mode).await?;
        }
        other => {
            return Err(AppError::BadRequest(format!("Unknown form: {}", other)));
        }
    }
    Ok(Redirect::to("/settings/"))
}

pub async fn search(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
    Query(paging): Query<PageQuery>,
) -> AppResult<Html<String>> {
    let palette = settings_service(&state, &auth_user).palette().await?;
    let filter = SearchFilter::parse(&query.mood, &query.search_term, &query.start_date, &query.end_date);

    let service = EntryService::new(&state.db, auth_user.id);
    let count = service.search_count(&filter).await?;
    let page = PageRequest::resolve(paging.page.as_deref(), state.config.per_page, count);
    let results = service.search(&filter, page.per_page, page.offset()).await?;

    let parameters = serde_urlencoded::to_string(&query)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode query: {}", e)))?;

    let template = SearchTemplate {
        nav: Nav::user(&auth_user.username, &palette),
        moods: legend(&palette),
        results: search_rows(&results, &palette),
        page: PageInfo::new(page, count),
        parameters,
        mood: query.mood,
        search_term: query.search_term,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    Ok(Html(template.render()?))
}

pub async fn calendar(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Html<String>> {
    let palette = settings_service(&state, &auth_user).palette().await?;
    let entries = EntryService::new(&state.db, auth_user.id).calendar().await?;

    let page = CalendarTemplate {
        nav: Nav::user(&auth_user.username, &palette),
        months: calendar_months(&entries, &palette),
        moods: legend(&palette),
    };
    Ok(Html(page.render()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(entry: Option<&str>, period: Option<&str>) -> SaveMoodForm {
        SaveMoodForm {
            entry: entry.map(String::from),
            period: period.map(String::from),
        }
    }

    #[test]
    fn test_parse_save_mood() {
        let (period, mood, day) = parse_save_mood(&form(Some("5_2021-11-08"), Some("mood_night"))).unwrap();
        assert_eq!(period, Period::Night);
        assert_eq!(mood, 5);
        assert_eq!(day, NaiveDate::from_ymd_opt(2021, 11, 8).unwrap());
    }

    #[test]
    fn test_parse_save_mood_rejects_bad_input() {
        let cases = [
            form(None, Some("mood_day")),
            form(Some("3_2021-11-08"), None),
            form(Some("3_2021-11-08"), Some("noon")),
            form(Some("0_2021-11-08"), Some("mood_day")),
            form(Some("3-2021-11-08"), Some("mood_day")),
        ];
        for case in &cases {
            assert!(matches!(parse_save_mood(case), Err(AppError::BadRequest(_))));
        }
    }

    #[test]
    fn test_week_redirect_target() {
        let day = NaiveDate::from_ymd_opt(2021, 11, 10).unwrap();
        let response = axum::response::IntoResponse::into_response(week_redirect(day));
        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(axum::http::header::LOCATION).unwrap(),
            "/?start_dt=2021-11-10"
        );
    }
}
