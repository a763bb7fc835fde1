//! Date parsing, week arithmetic and the date-range fallback policy shared by
//! the mood table, the charts and the search form.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::config::DATE_FORMAT;
use crate::models::settings::Language;
use crate::services::mood::{text, TextKey};

/// Days covered by the default chart range, ending today.
pub const DEFAULT_RANGE_DAYS: i64 = 7;

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Years accepted from user input. Keeps week arithmetic far away from the
/// edges of `NaiveDate`.
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

pub fn is_supported_date(date: NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .ok()
        .filter(|d| is_supported_date(*d))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// The Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// The seven days of the week starting at `monday`.
pub fn week_days(monday: NaiveDate) -> Vec<NaiveDate> {
    (0..7).map(|offset| monday + Duration::days(offset)).collect()
}

/// e.g. `KW 45/2021 · 08.11.2021 - 14.11.2021`
pub fn week_label(monday: NaiveDate, language: Language) -> String {
    let sunday = monday + Duration::days(6);
    let iso = monday.iso_week();
    format!(
        "{} {}/{} · {} - {}",
        text(TextKey::CalendarWeek, language),
        iso.week(),
        iso.year(),
        monday.format("%d.%m.%Y"),
        sunday.format("%d.%m.%Y"),
    )
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Each bound falls back on its own: a missing or malformed start means
    /// seven days ago, a missing or malformed end means today.
    pub fn resolve(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> Self {
        let start = start
            .and_then(parse_date)
            .unwrap_or(today - Duration::days(DEFAULT_RANGE_DAYS));
        let end = end.and_then(parse_date).unwrap_or(today);

        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// A preset range offered as a shortcut on the graph page.
#[derive(Debug, Clone, Serialize)]
pub struct TimeRange {
    pub key: &'static str,
    pub label: &'static str,
    pub start: String,
    pub end: String,
}

pub fn graph_time_ranges(today: NaiveDate, language: Language) -> Vec<TimeRange> {
    let back = |key: &'static str, label: TextKey, days: i64| TimeRange {
        key,
        label: text(label, language),
        start: format_date(today - Duration::days(days)),
        end: format_date(today),
    };

    let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);

    vec![
        back("week", TextKey::LastWeek, 7),
        back("month", TextKey::LastMonth, 30),
        back("quarter", TextKey::LastQuarter, 90),
        back("year", TextKey::LastYear, 365),
        TimeRange {
            key: "current_year",
            label: text(TextKey::CurrentYear, language),
            start: format_date(year_start),
            end: format_date(today),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_week_start_midweek() {
        // 2021-11-10 is a Wednesday
        assert_eq!(week_start(d(2021, 11, 10)), d(2021, 11, 8));
    }

    #[test]
    fn test_week_start_is_monday() {
        assert_eq!(week_start(d(2021, 11, 8)), d(2021, 11, 8));
    }

    #[test]
    fn test_week_start_sunday_and_year_boundary() {
        assert_eq!(week_start(d(2021, 11, 14)), d(2021, 11, 8));
        // 2022-01-01 is a Saturday
        assert_eq!(week_start(d(2022, 1, 1)), d(2021, 12, 27));
    }

    #[test]
    fn test_week_days_are_seven_ascending() {
        let days = week_days(d(2021, 11, 8));
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], d(2021, 11, 8));
        assert_eq!(days[6], d(2021, 11, 14));
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_parse_date_strict() {
        assert_eq!(parse_date(" 2021-11-07 "), Some(d(2021, 11, 7)));
        assert_eq!(parse_date("07.11.2021"), None);
        assert_eq!(parse_date("2021-02-30"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_range_defaults_on_garbage() {
        let today = d(2021, 11, 7);
        let range = DateRange::resolve(Some("nope"), None, today);
        assert_eq!(range.start, d(2021, 10, 31));
        assert_eq!(range.end, today);
        assert_eq!(range.days(), 8);
    }

    #[test]
    fn test_range_bounds_fall_back_independently() {
        let today = d(2021, 11, 7);
        let range = DateRange::resolve(Some("2021-01-01"), Some("bad"), today);
        assert_eq!(range.start, d(2021, 1, 1));
        assert_eq!(range.end, today);
    }

    #[test]
    fn test_range_swaps_reversed_bounds() {
        let range = DateRange::resolve(Some("2021-11-07"), Some("2021-11-01"), d(2022, 1, 1));
        assert_eq!(range.start, d(2021, 11, 1));
        assert_eq!(range.end, d(2021, 11, 7));
    }

    #[test]
    fn test_week_label_german() {
        assert_eq!(
            week_label(d(2021, 11, 8), Language::German),
            "KW 45/2021 · 08.11.2021 - 14.11.2021"
        );
    }

    #[test]
    fn test_week_label_uses_iso_year() {
        // 2021-01-01 belongs to week 53 of 2020
        assert_eq!(
            week_label(d(2020, 12, 28), Language::English),
            "CW 53/2020 · 28.12.2020 - 03.01.2021"
        );
    }

    #[test]
    fn test_parse_date_rejects_extreme_years() {
        assert_eq!(parse_date("+262142-12-31"), None);
        assert_eq!(parse_date("-0001-01-01"), None);
        assert_eq!(parse_date("10000-01-01"), None);

        let last = parse_date("9999-12-31").unwrap();
        let days = week_days(week_start(last));
        assert_eq!(days.len(), 7);
        assert!(days[6] >= last);
    }

    #[test]
    fn test_range_ignores_extreme_dates() {
        let today = d(2021, 11, 7);
        let range = DateRange::resolve(Some("+262142-12-31"), Some("+262142-12-31"), today);
        assert_eq!(range.start, d(2021, 10, 31));
        assert_eq!(range.end, today);
    }

    #[test]
    fn test_graph_time_ranges_end_today() {
        let today = d(2021, 11, 7);
        let ranges = graph_time_ranges(today, Language::English);
        assert_eq!(ranges.len(), 5);
        assert!(ranges.iter().all(|r| r.end == "2021-11-07"));
        assert_eq!(ranges[0].start, "2021-10-31");
        assert_eq!(ranges[4].start, "2021-01-01");
    }
}
