//! Mood names, colors and the small translation catalog for the two
//! supported languages.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::entry::{Period, MOODS};
use crate::models::settings::{Language, UserSettings};

pub const DEFAULT_COLORS: [&str; 5] = ["#d9534f", "#f0ad4e", "#ffd966", "#9acd32", "#5cb85c"];

const LABELS_EN: [&str; 5] = ["very bad", "bad", "medium", "good", "very good"];
const LABELS_DE: [&str; 5] = ["sehr schlecht", "schlecht", "mittel", "gut", "sehr gut"];

/// Slot in the fixed-size tables for a mood value, if it is in range.
fn slot(mood: i32) -> Option<usize> {
    MOODS.iter().position(|m| *m == mood)
}

pub fn mood_label(mood: i32, language: Language) -> &'static str {
    let labels = match language {
        Language::German => &LABELS_DE,
        Language::English => &LABELS_EN,
    };
    slot(mood).map(|i| labels[i]).unwrap_or("")
}

/// `#rrggbb`
pub fn is_valid_color(raw: &str) -> bool {
    raw.len() == 7
        && raw.starts_with('#')
        && raw[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    Day,
    Night,
    CalendarWeek,
    LastWeek,
    LastMonth,
    LastQuarter,
    LastYear,
    CurrentYear,
}

pub fn text(key: TextKey, language: Language) -> &'static str {
    use Language::*;
    use TextKey::*;
    match (key, language) {
        (Day, German) => "Tag",
        (Day, English) => "Day",
        (Night, German) => "Nacht",
        (Night, English) => "Night",
        (CalendarWeek, German) => "KW",
        (CalendarWeek, English) => "CW",
        (LastWeek, German) => "Letzte Woche",
        (LastWeek, English) => "Last week",
        (LastMonth, German) => "Letzter Monat",
        (LastMonth, English) => "Last month",
        (LastQuarter, German) => "Letzte 3 Monate",
        (LastQuarter, English) => "Last 3 months",
        (LastYear, German) => "Letztes Jahr",
        (LastYear, English) => "Last year",
        (CurrentYear, German) => "Dieses Jahr",
        (CurrentYear, English) => "This year",
    }
}

pub fn period_label(period: Period, language: Language) -> &'static str {
    match period {
        Period::Day => text(TextKey::Day, language),
        Period::Night => text(TextKey::Night, language),
    }
}

/// Labels and colors for one user's moods.
#[derive(Debug, Clone)]
pub struct MoodPalette {
    pub language: Language,
    colors: [String; 5],
}

impl MoodPalette {
    pub fn new(language: Language, overrides: [Option<&str>; 5]) -> Self {
        let colors = std::array::from_fn(|i| match overrides[i] {
            Some(c) if is_valid_color(c) => c.to_string(),
            _ => DEFAULT_COLORS[i].to_string(),
        });
        Self { language, colors }
    }

    pub fn for_settings(settings: &UserSettings) -> Self {
        Self::new(settings.language(), settings.color_overrides())
    }

    pub fn label(&self, mood: i32) -> &'static str {
        mood_label(mood, self.language)
    }

    pub fn color(&self, mood: i32) -> &str {
        slot(mood).map(|i| self.colors[i].as_str()).unwrap_or("#000000")
    }

    pub fn period_label(&self, period: Period) -> &'static str {
        period_label(period, self.language)
    }

    pub fn mapping(&self) -> BTreeMap<i32, &'static str> {
        MOODS.iter().map(|m| (*m, self.label(*m))).collect()
    }

    pub fn colors(&self) -> BTreeMap<i32, String> {
        MOODS.iter().map(|m| (*m, self.color(*m).to_string())).collect()
    }
}

impl Default for MoodPalette {
    fn default() -> Self {
        Self::new(Language::default(), [None; 5])
    }
}

/// Everything the client needs to label moods, periods and ranges.
#[derive(Debug, Serialize)]
pub struct Catalog {
    pub language: &'static str,
    pub moods: BTreeMap<i32, &'static str>,
    pub periods: BTreeMap<&'static str, &'static str>,
    pub ranges: BTreeMap<&'static str, &'static str>,
}

pub fn catalog(language: Language) -> Catalog {
    let palette = MoodPalette::new(language, [None; 5]);
    Catalog {
        language: language.code(),
        moods: palette.mapping(),
        periods: Period::ALL
            .iter()
            .map(|p| (p.as_str(), period_label(*p, language)))
            .collect(),
        ranges: [
            ("week", TextKey::LastWeek),
            ("month", TextKey::LastMonth),
            ("quarter", TextKey::LastQuarter),
            ("year", TextKey::LastYear),
            ("current_year", TextKey::CurrentYear),
        ]
        .into_iter()
        .map(|(k, t)| (k, text(t, language)))
        .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_per_language() {
        assert_eq!(mood_label(1, Language::English), "very bad");
        assert_eq!(mood_label(5, Language::German), "sehr gut");
        assert_eq!(mood_label(6, Language::German), "");
    }

    #[test]
    fn test_color_validation() {
        assert!(is_valid_color("#A0b1C2"));
        assert!(!is_valid_color("A0b1C2"));
        assert!(!is_valid_color("#12345"));
        assert!(!is_valid_color("#12345g"));
    }

    #[test]
    fn test_palette_applies_valid_overrides_only() {
        let palette = MoodPalette::new(
            Language::English,
            [Some("#000000"), Some("red"), None, None, None],
        );
        assert_eq!(palette.color(1), "#000000");
        assert_eq!(palette.color(2), DEFAULT_COLORS[1]);
        assert_eq!(palette.color(5), DEFAULT_COLORS[4]);
    }

    #[test]
    fn test_mapping_serializes_with_string_keys() {
        let json = serde_json::to_value(MoodPalette::default().mapping()).unwrap();
        assert_eq!(json["3"], "mittel");
    }

    #[test]
    fn test_catalog_has_all_sections() {
        let c = catalog(Language::English);
        assert_eq!(c.moods.len(), 5);
        assert_eq!(c.periods["night"], "Night");
        assert_eq!(c.ranges.len(), 5);
    }
}
