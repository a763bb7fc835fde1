use axum::{
    extract::{Query, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::{ChartResponse, GraphQuery, GraphResponse};
use crate::error::{AppError, AppResult};
use crate::models::entry::Period;
use crate::models::settings::ViewMode;
use crate::services::charts::{bar_chart, pie_chart, scatter_chart, BarChart, PieChart, ScatterChart};
use crate::services::dates::{graph_time_ranges, today, DateRange};
use crate::services::entries::EntryService;
use crate::services::settings::SettingsService;
use crate::AppState;

fn resolve_range(query: &GraphQuery) -> DateRange {
    DateRange::resolve(query.start_dt.as_deref(), query.end_dt.as_deref(), today())
}

/// Every figure for the graph page, over the requested range.
pub async fn build_graph(state: &AppState, user_id: Uuid, query: &GraphQuery) -> AppResult<GraphResponse> {
    let settings = SettingsService::new(&state.db, user_id, state.config.default_view_mode);
    let palette = settings.palette().await?;
    let is_markers = settings.is_markers(query.view_mode.as_deref()).await?;
    let view_mode = if is_markers { ViewMode::Markers } else { ViewMode::Lines };

    let range = resolve_range(query);
    tracing::debug!(user_id = %user_id, days = range.days(), is_markers, "Building graph");

    let entries = EntryService::new(&state.db, user_id);
    let points = entries.entries_between(range.start, range.end).await?;
    let day_counts = entries.mood_counts(Period::Day, range.start, range.end).await?;
    let night_counts = entries.mood_counts(Period::Night, range.start, range.end).await?;

    Ok(GraphResponse {
        range,
        is_markers,
        scatter: scatter_chart(&points, view_mode, &palette),
        pie_chart_day: pie_chart(Period::Day, &day_counts, &palette),
        pie_chart_night: pie_chart(Period::Night, &night_counts, &palette),
        bar_chart: bar_chart(&day_counts, &night_counts, &palette),
        graph_time_ranges: graph_time_ranges(today(), palette.language),
    })
}

pub async fn graph(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<GraphQuery>,
) -> AppResult<Json<GraphResponse>> {
    Ok(Json(build_graph(&state, auth_user.id, &query).await?))
}

pub async fn scatter_graph(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<GraphQuery>,
) -> AppResult<Json<ChartResponse<ScatterChart>>> {
    let settings = SettingsService::new(&state.db, auth_user.id, state.config.default_view_mode);
    let palette = settings.palette().await?;
    let view_mode = if settings.is_markers(query.view_mode.as_deref()).await? {
        ViewMode::Markers
    } else {
        ViewMode::Lines
    };

    let range = resolve_range(&query);
    let points = EntryService::new(&state.db, auth_user.id)
        .entries_between(range.start, range.end)
        .await?;

    Ok(Json(ChartResponse {
        range,
        chart: scatter_chart(&points, view_mode, &palette),
    }))
}

pub async fn pie_chart_graph(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<GraphQuery>,
) -> AppResult<Json<ChartResponse<PieChart>>> {
    let period = query
        .period
        .as_deref()
        .and_then(Period::parse)
        .ok_or_else(|| AppError::BadRequest("period must be one of day, night".into()))?;

    let palette = SettingsService::new(&state.db, auth_user.id, state.config.default_view_mode)
        .palette()
        .await?;
    let range = resolve_range(&query);
    let counts = EntryService::new(&state.db, auth_user.id)
        .mood_counts(period, range.start, range.end)
        .await?;

    Ok(Json(ChartResponse {
        range,
        chart: pie_chart(period, &counts, &palette),
    }))
}

pub async fn bar_chart_graph(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<GraphQuery>,
) -> AppResult<Json<ChartResponse<BarChart>>> {
    let palette = SettingsService::new(&state.db, auth_user.id, state.config.default_view_mode)
        .palette()
        .await?;
    let range = resolve_range(&query);
    let entries = EntryService::new(&state.db, auth_user.id);
    let day_counts = entries.mood_counts(Period::Day, range.start, range.end).await?;
    let night_counts = entries.mood_counts(Period::Night, range.start, range.end).await?;

    Ok(Json(ChartResponse {
        range,
        chart: bar_chart(&day_counts, &night_counts, &palette),
    }))
}
