//! Request/response types for the JSON API and the HTML forms.
//!
//! Conventions:
//! - `*Request` / `*Form` → deserialized from a JSON body or an urlencoded form
//! - `*Query` → query-string parameters, kept as raw strings where the
//!   handlers apply a fallback policy instead of rejecting the request
//! - `*Response` → serialized to client JSON

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::entry::Period;
use crate::models::settings::UserSettings;
use crate::models::week::Week;
use crate::services::charts::{BarChart, PieChart, ScatterChart};
use crate::services::dates::{DateRange, TimeRange};
use crate::services::entries::{MoodTable, StandoutData, WeekdayEntry};

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub username: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// The refresh token may come from the body or from the refresh cookie.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Login and registration form on the HTML side.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// ============================================================================
// Entries & notes
// ============================================================================

/// `POST /save-mood/`. `entry` is `{mood}_{YYYY-MM-DD}`.
#[derive(Debug, Deserialize)]
pub struct SaveMoodForm {
    pub entry: Option<String>,
    pub period: Option<String>,
}

/// `POST /api/entry-day/`
#[derive(Debug, Deserialize, Validate)]
pub struct EntryDayRequest {
    pub day: NaiveDate,
    pub period: Period,
    #[validate(range(min = 1, max = 5, message = "Mood must be between 1 and 5"))]
    pub mood: i32,
}

/// `POST /save-note/` and `POST /api/save-note/`
#[derive(Debug, Deserialize)]
pub struct SaveNoteForm {
    pub week: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WeekResponse {
    pub week_date: NaiveDate,
    pub note: String,
}

impl From<Week> for WeekResponse {
    fn from(w: Week) -> Self {
        Self {
            week_date: w.week_date,
            note: w.note,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MoodTableQuery {
    pub start_dt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MoodTableResponse {
    pub mood_table: MoodTable,
    pub moods: BTreeMap<i32, &'static str>,
    pub view_day_form: bool,
    pub view_night_form: bool,
}

#[derive(Debug, Serialize)]
pub struct StandoutResponse {
    #[serde(flatten)]
    pub data: StandoutData,
    pub moods: BTreeMap<i32, &'static str>,
}

// ============================================================================
// Search
// ============================================================================

/// Filters shared by the HTML and JSON search. Everything stays a string so
/// malformed values can be dropped instead of rejected.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitOffsetQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

// ============================================================================
// Calendar & export
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub entries: Vec<WeekdayEntry>,
    pub mood_mapping: BTreeMap<i32, &'static str>,
    pub mood_colors: BTreeMap<i32, String>,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub username: String,
    pub exported_on: NaiveDate,
    pub settings: UserSettings,
    #[serde(flatten)]
    pub data: crate::services::entries::Export,
}

// ============================================================================
// Graphs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct GraphQuery {
    pub start_dt: Option<String>,
    pub end_dt: Option<String>,
    pub view_mode: Option<String>,
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GraphResponse {
    pub range: DateRange,
    pub is_markers: bool,
    pub scatter: ScatterChart,
    pub pie_chart_day: PieChart,
    pub pie_chart_night: PieChart,
    pub bar_chart: BarChart,
    pub graph_time_ranges: Vec<TimeRange>,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse<T> {
    pub range: DateRange,
    pub chart: T,
}

// ============================================================================
// Settings
// ============================================================================

/// `POST /save-settings/`
#[derive(Debug, Deserialize)]
pub struct SaveSettingsForm {
    #[serde(default)]
    pub form_name: String,
    #[serde(default)]
    pub view_day_form: String,
    #[serde(default)]
    pub view_night_form: String,
    #[serde(default)]
    pub default_view_mode: String,
}

#[derive(Debug, Deserialize)]
pub struct SetLanguageRequest {
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FormsDisplayed {
    pub view_day_form: bool,
    pub view_night_form: bool,
}

#[derive(Debug, Deserialize)]
pub struct MoodColorsRequest {
    pub colors: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct MoodColorsResponse {
    pub colors: BTreeMap<i32, String>,
}
