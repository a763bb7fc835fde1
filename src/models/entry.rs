use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MIN_MOOD: i32 = 1;
pub const MAX_MOOD: i32 = 5;

/// All mood values, worst to best.
pub const MOODS: [i32; 5] = [1, 2, 3, 4, 5];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub week_id: Uuid,
    pub day: NaiveDate,
    pub mood_day: Option<i32>,
    pub mood_night: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Anything carrying the two mood slots of one day.
pub trait DayMoods {
    fn mood_day(&self) -> Option<i32>;
    fn mood_night(&self) -> Option<i32>;

    fn mood(&self, period: Period) -> Option<i32> {
        match period {
            Period::Day => self.mood_day(),
            Period::Night => self.mood_night(),
        }
    }
}

impl DayMoods for Entry {
    fn mood_day(&self) -> Option<i32> {
        self.mood_day
    }

    fn mood_night(&self) -> Option<i32> {
        self.mood_night
    }
}

/// Entry joined with the note of its week, as returned by search.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EntryWithNote {
    pub day: NaiveDate,
    pub mood_day: Option<i32>,
    pub mood_night: Option<i32>,
    pub week_date: NaiveDate,
    pub note: String,
}

/// The two mood slots of a calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[serde(alias = "mood_day")]
    Day,
    #[serde(alias = "mood_night")]
    Night,
}

impl Period {
    pub const ALL: [Period; 2] = [Period::Day, Period::Night];

    /// Accepts both the column names and the short names.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "mood_day" | "day" => Some(Period::Day),
            "mood_night" | "night" => Some(Period::Night),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Period::Day => "mood_day",
            Period::Night => "mood_night",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Night => "night",
        }
    }
}

pub fn is_valid_mood(mood: i32) -> bool {
    (MIN_MOOD..=MAX_MOOD).contains(&mood)
}

/// Parses a mood value from form input, rejecting anything outside 1..=5.
pub fn parse_mood(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|m| is_valid_mood(*m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_accepts_column_and_short_names() {
        assert_eq!(Period::parse("mood_day"), Some(Period::Day));
        assert_eq!(Period::parse("night"), Some(Period::Night));
        assert_eq!(Period::parse("evening"), None);
        assert_eq!(Period::parse(""), None);
    }

    #[test]
    fn test_parse_mood_bounds() {
        assert_eq!(parse_mood("1"), Some(1));
        assert_eq!(parse_mood(" 5 "), Some(5));
        assert_eq!(parse_mood("0"), None);
        assert_eq!(parse_mood("6"), None);
        assert_eq!(parse_mood("good"), None);
    }

    #[test]
    fn test_entry_mood_by_period() {
        let entry = Entry {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            week_id: Uuid::nil(),
            day: NaiveDate::from_ymd_opt(2021, 11, 8).unwrap(),
            mood_day: Some(2),
            mood_night: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(entry.mood(Period::Day), Some(2));
        assert_eq!(entry.mood(Period::Night), None);
    }

    #[test]
    fn test_period_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Period::Night).unwrap(), "night");
    }
}
