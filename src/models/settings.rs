use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSettings {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub view_mode: String,
    pub view_day_form: bool,
    pub view_night_form: bool,
    pub language: String,
    pub mood_color_1: Option<String>,
    pub mood_color_2: Option<String>,
    pub mood_color_3: Option<String>,
    pub mood_color_4: Option<String>,
    pub mood_color_5: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSettings {
    pub fn view_mode(&self) -> ViewMode {
        ViewMode::parse(&self.view_mode).unwrap_or_default()
    }

    pub fn language(&self) -> Language {
        Language::parse(&self.language).unwrap_or_default()
    }

    /// Color overrides indexed by `mood - 1`.
    pub fn color_overrides(&self) -> [Option<&str>; 5] {
        [
            self.mood_color_1.as_deref(),
            self.mood_color_2.as_deref(),
            self.mood_color_3.as_deref(),
            self.mood_color_4.as_deref(),
            self.mood_color_5.as_deref(),
        ]
    }
}

/// How the scatter chart draws its traces.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Lines,
    Markers,
}

impl ViewMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "lines" => Some(ViewMode::Lines),
            "markers" => Some(ViewMode::Markers),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Lines => "lines",
            ViewMode::Markers => "markers",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "de-DE")]
    German,
    #[serde(rename = "en-GB")]
    English,
}

impl Language {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "de-DE" | "de" => Some(Language::German),
            "en-GB" | "en" => Some(Language::English),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::German => "de-DE",
            Language::English => "en-GB",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_mode_parse() {
        assert_eq!(ViewMode::parse("markers"), Some(ViewMode::Markers));
        assert_eq!(ViewMode::parse(" lines "), Some(ViewMode::Lines));
        assert_eq!(ViewMode::parse("bars"), None);
    }

    #[test]
    fn test_language_round_trips_code() {
        for lang in [Language::German, Language::English] {
            assert_eq!(Language::parse(lang.code()), Some(lang));
        }
        assert_eq!(serde_json::to_value(Language::English).unwrap(), "en-GB");
    }
}
