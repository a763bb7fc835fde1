use std::collections::BTreeMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::entry::is_valid_mood;
use crate::models::settings::{Language, UserSettings, ViewMode};
use crate::services::mood::{is_valid_color, MoodPalette};

/// Per-user display preferences. The settings row is created on first use.
pub struct SettingsService<'a> {
    db: &'a PgPool,
    user_id: Uuid,
    default_view_mode: ViewMode,
}

/// Interprets an HTML checkbox value.
pub fn checkbox(raw: &str) -> bool {
    matches!(raw.trim(), "on" | "true" | "1" | "yes")
}

impl<'a> SettingsService<'a> {
    pub fn new(db: &'a PgPool, user_id: Uuid, default_view_mode: ViewMode) -> Self {
        Self {
            db,
            user_id,
            default_view_mode,
        }
    }

    pub fn get_default_view_mode(&self) -> ViewMode {
        self.default_view_mode
    }

    pub async fn user_settings(&self) -> AppResult<UserSettings> {
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            INSERT INTO user_settings (id, user_id, view_mode)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
                SET user_id = user_settings.user_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(self.user_id)
        .bind(self.default_view_mode.as_str())
        .fetch_one(self.db)
        .await?;

        Ok(settings)
    }

    pub async fn palette(&self) -> AppResult<MoodPalette> {
        Ok(MoodPalette::for_settings(&self.user_settings().await?))
    }

    /// Whether the scatter chart should draw markers. A `view_mode` query
    /// parameter wins over the stored preference.
    pub async fn is_markers(&self, requested: Option<&str>) -> AppResult<bool> {
        if let Some(mode) = requested.and_then(ViewMode::parse) {
            return Ok(mode == ViewMode::Markers);
        }
        Ok(self.user_settings().await?.view_mode() == ViewMode::Markers)
    }

    pub async fn set_forms_displayed(&self, day: bool, night: bool) -> AppResult<UserSettings> {
        self.user_settings().await?;
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            UPDATE user_settings
            SET view_day_form = $2, view_night_form = $3, updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(self.user_id)
        .bind(day)
        .bind(night)
        .fetch_one(self.db)
        .await?;

        tracing::debug!(user_id = %self.user_id, day, night, "Updated displayed forms");
        Ok(settings)
    }

    /// Unknown modes are ignored and leave the stored one untouched.
    pub async fn set_view_mode(&self, raw: &str) -> AppResult<UserSettings> {
        let Some(mode) = ViewMode::parse(raw) else {
            tracing::debug!(user_id = %self.user_id, view_mode = raw, "Ignoring unknown view mode");
            return self.user_settings().await;
        };

        self.user_settings().await?;
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            UPDATE user_settings
            SET view_mode = $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(self.user_id)
        .bind(mode.as_str())
        .fetch_one(self.db)
        .await?;

        Ok(settings)
    }

    pub async fn set_language(&self, raw: &str) -> AppResult<UserSettings> {
        let language = Language::parse(raw)
            .ok_or_else(|| AppError::BadRequest(format!("Unsupported language: {}", raw)))?;

        self.user_settings().await?;
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            UPDATE user_settings
            SET language = $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(self.user_id)
        .bind(language.code())
        .fetch_one(self.db)
        .await?;

        Ok(settings)
    }

    /// Applies color overrides keyed by mood value. An empty string resets
    /// that mood to its default color; moods not in `colors` are untouched.
    pub async fn set_mood_colors(&self, colors: &BTreeMap<String, String>) -> AppResult<UserSettings> {
        let updates = validate_mood_colors(colors)?;
        let current = self.user_settings().await?;

        let mut merged: [Option<String>; 5] = current.color_overrides().map(|c| c.map(String::from));
        for (mood, color) in updates {
            merged[(mood - 1) as usize] = color;
        }

        let [c1, c2, c3, c4, c5] = merged;
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            UPDATE user_settings
            SET mood_color_1 = $2, mood_color_2 = $3, mood_color_3 = $4,
                mood_color_4 = $5, mood_color_5 = $6, updated_at = NOW()
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(self.user_id)
        .bind(c1)
        .bind(c2)
        .bind(c3)
        .bind(c4)
        .bind(c5)
        .fetch_one(self.db)
        .await?;

        Ok(settings)
    }
}

/// Checks keys and values before anything is written.
pub fn validate_mood_colors(
    colors: &BTreeMap<String, String>,
) -> AppResult<Vec<(i32, Option<String>)>> {
    colors
        .iter()
        .map(|(key, value)| {
            let mood = key
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|m| is_valid_mood(*m))
                .ok_or_else(|| AppError::Validation(format!("Unknown mood: {}", key)))?;
            let value = value.trim();
            if value.is_empty() {
                Ok((mood, None))
            } else if is_valid_color(value) {
                Ok((mood, Some(value.to_lowercase())))
            } else {
                Err(AppError::Validation(format!("Invalid color for mood {}: {}", mood, value)))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkbox_values() {
        assert!(checkbox("on"));
        assert!(checkbox("true"));
        assert!(!checkbox(""));
        assert!(!checkbox("off"));
    }

    #[test]
    fn test_validate_mood_colors_accepts_reset_and_hex() {
        let mut colors = BTreeMap::new();
        colors.insert("1".to_string(), "#FF0000".to_string());
        colors.insert("5".to_string(), "".to_string());
        let updates = validate_mood_colors(&colors).unwrap();
        assert_eq!(
            updates,
            vec![(1, Some("#ff0000".to_string())), (5, None)]
        );
    }

    #[test]
    fn test_validate_mood_colors_rejects_bad_key_and_value() {
        let mut bad_key = BTreeMap::new();
        bad_key.insert("6".to_string(), "#ffffff".to_string());
        assert!(matches!(
            validate_mood_colors(&bad_key),
            Err(AppError::Validation(_))
        ));

        let mut bad_value = BTreeMap::new();
        bad_value.insert("2".to_string(), "blue".to_string());
        assert!(validate_mood_colors(&bad_value).is_err());
    }
}
