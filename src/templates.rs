//! Askama page templates and the view rows they render. Rows carry display
//! strings only; all formatting happens here, not in the templates.

use askama::Template;
use chrono::{Datelike, NaiveDate};

use crate::models::entry::{DayMoods, EntryWithNote, Period, MOODS};
use crate::models::settings::{UserSettings, ViewMode};
use crate::services::dates::{format_date, TimeRange};
use crate::services::entries::{MoodTable, StandoutData, WeekdayEntry};
use crate::services::mood::MoodPalette;
use crate::services::pagination::PageInfo;

/// Navigation bar state shared by every page.
#[derive(Debug, Clone, Default)]
pub struct Nav {
    pub logged_in: bool,
    pub username: String,
    pub lang: &'static str,
}

impl Nav {
    pub fn user(username: &str, palette: &MoodPalette) -> Self {
        Self {
            logged_in: true,
            username: username.to_string(),
            lang: palette.language.code(),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            logged_in: false,
            username: String::new(),
            lang: "de-DE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MoodLegend {
    pub value: i32,
    pub label: String,
    pub color: String,
}

pub fn legend(palette: &MoodPalette) -> Vec<MoodLegend> {
    MOODS
        .iter()
        .map(|m| MoodLegend {
            value: *m,
            label: palette.label(*m).to_string(),
            color: palette.color(*m).to_string(),
        })
        .collect()
}

/// One mood button on the week view.
#[derive(Debug, Clone)]
pub struct MoodCell {
    pub entry: String,
    pub label: String,
    pub color: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct DayRow {
    pub date: String,
    pub display: String,
    pub is_today: bool,
    pub cells: Vec<MoodCell>,
}

#[derive(Debug, Clone)]
pub struct FormSection {
    pub period: &'static str,
    pub title: String,
    pub rows: Vec<DayRow>,
}

#[derive(Debug, Clone)]
pub struct StandoutRow {
    pub date: String,
    pub day_label: String,
    pub night_label: String,
}

fn weekday_display(day: NaiveDate) -> String {
    const NAMES: [&str; 7] = ["Mo", "Di", "Mi", "Do", "Fr", "Sa", "So"];
    format!(
        "{} {}",
        NAMES[day.weekday().num_days_from_monday() as usize],
        day.format("%d.%m.")
    )
}

fn mood_text(mood: Option<i32>, palette: &MoodPalette) -> String {
    mood.map(|m| palette.label(m).to_string()).unwrap_or_default()
}

fn mood_color(mood: Option<i32>, palette: &MoodPalette) -> String {
    mood.map(|m| palette.color(m).to_string()).unwrap_or_default()
}

fn average_text(avg: Option<f64>) -> String {
    avg.map(|a| format!("{:.2}", a)).unwrap_or_else(|| "-".into())
}

/// Night form first: in the morning the previous night is logged before
/// the day.
pub fn form_sections(
    days: &[WeekdayEntry],
    settings: &UserSettings,
    palette: &MoodPalette,
    today: NaiveDate,
) -> Vec<FormSection> {
    let mut periods = Vec::new();
    if settings.view_night_form {
        periods.push(Period::Night);
    }
    if settings.view_day_form {
        periods.push(Period::Day);
    }

    periods
        .into_iter()
        .map(|period| FormSection {
            period: period.column(),
            title: palette.period_label(period).to_string(),
            rows: days
                .iter()
                .map(|d| {
                    let date = format_date(d.day);
                    let current = d.mood(period);
                    DayRow {
                        display: weekday_display(d.day),
                        is_today: d.day == today,
                        cells: MOODS
                            .iter()
                            .map(|m| MoodCell {
                                entry: format!("{}_{}", m, date),
                                label: palette.label(*m).to_string(),
                                color: palette.color(*m).to_string(),
                                selected: current == Some(*m),
                            })
                            .collect(),
                        date,
                    }
                })
                .collect(),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub nav: Nav,
    pub week_label: String,
    pub week_date: String,
    pub prev_week: String,
    pub next_week: String,
    pub note: String,
    pub forms: Vec<FormSection>,
    pub current_day: String,
    pub current_night: String,
    pub moods: Vec<MoodLegend>,
    pub days_recorded: i64,
    pub average_day: String,
    pub average_night: String,
    pub standout_days: Vec<StandoutRow>,
}

impl IndexTemplate {
    pub fn new(
        nav: Nav,
        table: &MoodTable,
        standout: &StandoutData,
        settings: &UserSettings,
        palette: &MoodPalette,
        today: NaiveDate,
    ) -> Self {
        Self {
            nav,
            week_label: table.week_label.clone(),
            week_date: format_date(table.week.week_date),
            prev_week: table.prev_week.clone(),
            next_week: table.next_week.clone(),
            note: table.week.note.clone(),
            forms: form_sections(&table.days_of_week, settings, palette, today),
            current_day: mood_text(table.current_day, palette),
            current_night: mood_text(table.current_night, palette),
            moods: legend(palette),
            days_recorded: standout.days_recorded,
            average_day: average_text(standout.average_day),
            average_night: average_text(standout.average_night),
            standout_days: standout
                .standout_days
                .iter()
                .map(|d| StandoutRow {
                    date: format_date(d.day),
                    day_label: mood_text(d.mood_day, palette),
                    night_label: mood_text(d.mood_night, palette),
                })
                .collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "graph.html")]
pub struct GraphTemplate {
    pub nav: Nav,
    pub start_dt: String,
    pub end_dt: String,
    pub is_markers: bool,
    pub ranges: Vec<TimeRange>,
    pub scatter_json: String,
    pub pie_day_json: String,
    pub pie_night_json: String,
    pub bar_json: String,
}

#[derive(Template)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub nav: Nav,
    pub default_view_mode: &'static str,
    pub is_markers: bool,
    pub view_day_form: bool,
    pub view_night_form: bool,
    pub is_english: bool,
    pub moods: Vec<MoodLegend>,
}

impl SettingsTemplate {
    pub fn new(nav: Nav, settings: &UserSettings, default_view_mode: ViewMode, palette: &MoodPalette) -> Self {
        Self {
            nav,
            default_view_mode: default_view_mode.as_str(),
            is_markers: settings.view_mode() == ViewMode::Markers,
            view_day_form: settings.view_day_form,
            view_night_form: settings.view_night_form,
            is_english: settings.language().code() == "en-GB",
            moods: legend(palette),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchRow {
    pub date: String,
    pub day_label: String,
    pub day_color: String,
    pub night_label: String,
    pub night_color: String,
    pub week_date: String,
    pub note: String,
}

pub fn search_rows(results: &[EntryWithNote], palette: &MoodPalette) -> Vec<SearchRow> {
    results
        .iter()
        .map(|r| SearchRow {
            date: format_date(r.day),
            day_label: mood_text(r.mood_day, palette),
            day_color: mood_color(r.mood_day, palette),
            night_label: mood_text(r.mood_night, palette),
            night_color: mood_color(r.mood_night, palette),
            week_date: format_date(r.week_date),
            note: r.note.clone(),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub nav: Nav,
    pub mood: String,
    pub search_term: String,
    pub start_date: String,
    pub end_date: String,
    pub moods: Vec<MoodLegend>,
    pub results: Vec<SearchRow>,
    pub page: PageInfo,
    /// Query string without `page`, for the pagination links.
    pub parameters: String,
}

#[derive(Debug, Clone)]
pub struct CalendarDay {
    pub date: String,
    pub day_color: String,
    pub night_color: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct CalendarMonth {
    pub title: String,
    pub days: Vec<CalendarDay>,
}

/// Groups entries, which must be ordered by day, into months.
pub fn calendar_months(entries: &[WeekdayEntry], palette: &MoodPalette) -> Vec<CalendarMonth> {
    let mut months: Vec<CalendarMonth> = Vec::new();
    for e in entries {
        let title = e.day.format("%m/%Y").to_string();
        let day = CalendarDay {
            date: format_date(e.day),
            day_color: mood_color(e.mood_day, palette),
            night_color: mood_color(e.mood_night, palette),
            title: format!(
                "{}: {} / {}: {}",
                palette.period_label(Period::Day),
                mood_text(e.mood_day, palette),
                palette.period_label(Period::Night),
                mood_text(e.mood_night, palette),
            ),
        };
        match months.last_mut() {
            Some(month) if month.title == title => month.days.push(day),
            _ => months.push(CalendarMonth {
                title,
                days: vec![day],
            }),
        }
    }
    months
}

#[derive(Template)]
#[template(path = "calendar.html")]
pub struct CalendarTemplate {
    pub nav: Nav,
    pub months: Vec<CalendarMonth>,
    pub moods: Vec<MoodLegend>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub nav: Nav,
    pub error: String,
    pub username: String,
    pub next: String,
    pub registration_open: bool,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub nav: Nav,
    pub error: String,
    pub username: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::Language;
    use chrono::Utc;
    use uuid::Uuid;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 11, day).unwrap()
    }

    fn settings(day: bool, night: bool) -> UserSettings {
        UserSettings {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            view_mode: "lines".into(),
            view_day_form: day,
            view_night_form: night,
            language: "en-GB".into(),
            mood_color_1: None,
            mood_color_2: None,
            mood_color_3: None,
            mood_color_4: None,
            mood_color_5: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_form_sections_respect_displayed_forms() {
        let palette = MoodPalette::new(Language::English, [None; 5]);
        let days = vec![WeekdayEntry {
            day: d(8),
            mood_day: Some(2),
            mood_night: None,
        }];

        let both = form_sections(&days, &settings(true, true), &palette, d(8));
        assert_eq!(both.len(), 2);
        assert_eq!(both[0].period, "mood_night");
        assert_eq!(both[1].period, "mood_day");

        let day_row = &both[1].rows[0];
        assert!(day_row.is_today);
        assert_eq!(day_row.cells.len(), 5);
        assert_eq!(day_row.cells[1].entry, "2_2021-11-08");
        assert!(day_row.cells[1].selected);
        assert!(!day_row.cells[0].selected);

        assert_eq!(form_sections(&days, &settings(true, false), &palette, d(8)).len(), 1);
    }

    #[test]
    fn test_calendar_months_group_consecutive_days() {
        let palette = MoodPalette::default();
        let entries = vec![
            WeekdayEntry { day: d(29), mood_day: Some(1), mood_night: None },
            WeekdayEntry { day: d(30), mood_day: None, mood_night: Some(5) },
            WeekdayEntry {
                day: NaiveDate::from_ymd_opt(2021, 12, 1).unwrap(),
                mood_day: Some(3),
                mood_night: Some(3),
            },
        ];
        let months = calendar_months(&entries, &palette);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].title, "11/2021");
        assert_eq!(months[0].days.len(), 2);
        assert_eq!(months[0].days[1].day_color, "");
    }

    #[test]
    fn test_login_template_renders_error_escaped() {
        let page = LoginTemplate {
            nav: Nav::anonymous(),
            error: "<bad>".into(),
            username: "anna".into(),
            next: "/graph/".into(),
            registration_open: false,
        };
        let html = page.render().unwrap();
        assert!(html.contains("&lt;bad&gt;"));
        assert!(html.contains("name=\"next\""));
        assert!(html.contains("graph"));
        assert!(!html.contains("/accounts/register/"));
    }

    #[test]
    fn test_weekday_display() {
        assert_eq!(weekday_display(d(8)), "Mo 08.11.");
        assert_eq!(weekday_display(d(14)), "So 14.11.");
    }
}
