//! Mood entries and week notes: the upsert paths behind the entry forms and
//! the read models for the week view, search, calendar and export.

use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::entry::{is_valid_mood, parse_mood, DayMoods, Entry, EntryWithNote, Period, MOODS};
use crate::models::settings::Language;
use crate::models::week::Week;
use crate::services::charts::MoodCount;
use crate::services::dates::{format_date, parse_date, week_days, week_label, week_start};

/// Window the standout summary looks back over, including today.
pub const STANDOUT_WINDOW_DAYS: i64 = 30;
pub const MAX_STANDOUT_DAYS: usize = 10;

/// One row of the week view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WeekdayEntry {
    pub day: NaiveDate,
    pub mood_day: Option<i32>,
    pub mood_night: Option<i32>,
}

impl From<&Entry> for WeekdayEntry {
    fn from(e: &Entry) -> Self {
        Self {
            day: e.day,
            mood_day: e.mood_day,
            mood_night: e.mood_night,
        }
    }
}

impl DayMoods for WeekdayEntry {
    fn mood_day(&self) -> Option<i32> {
        self.mood_day
    }

    fn mood_night(&self) -> Option<i32> {
        self.mood_night
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MoodTable {
    pub days_of_week: Vec<WeekdayEntry>,
    pub week: Week,
    pub next_week: String,
    pub prev_week: String,
    pub week_label: String,
    /// Today's day mood.
    pub current_day: Option<i32>,
    /// Last night's mood, recorded on yesterday's row.
    pub current_night: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StandoutData {
    pub since: NaiveDate,
    pub until: NaiveDate,
    pub days_recorded: i64,
    pub average_day: Option<f64>,
    pub average_night: Option<f64>,
    pub day_counts: BTreeMap<i32, i64>,
    pub night_counts: BTreeMap<i32, i64>,
    pub standout_days: Vec<WeekdayEntry>,
}

/// Search parameters after parsing. Unparsable inputs are dropped, not
/// defaulted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    pub mood: Option<i32>,
    pub term: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl SearchFilter {
    pub fn parse(mood: &str, search_term: &str, start: &str, end: &str) -> Self {
        let term = search_term.trim();
        Self {
            mood: parse_mood(mood),
            term: (!term.is_empty()).then(|| term.to_string()),
            start: parse_date(start),
            end: parse_date(end),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExportWeek {
    pub week_date: NaiveDate,
    pub note: String,
}

#[derive(Debug, Serialize)]
pub struct Export {
    pub weeks: Vec<ExportWeek>,
    pub entries: Vec<WeekdayEntry>,
}

pub struct EntryService<'a> {
    db: &'a PgPool,
    user_id: Uuid,
}

impl<'a> EntryService<'a> {
    pub fn new(db: &'a PgPool, user_id: Uuid) -> Self {
        Self { db, user_id }
    }

    /// Fetches the week starting at `monday`, creating it if needed.
    pub async fn week(&self, monday: NaiveDate) -> AppResult<Week> {
        let week = sqlx::query_as::<_, Week>(
            r#"
            INSERT INTO weeks (id, user_id, week_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, week_date) DO UPDATE
                SET user_id = weeks.user_id
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(self.user_id)
        .bind(week_start(monday))
        .fetch_one(self.db)
        .await?;

        Ok(week)
    }

    /// Records `mood` for one period of `day`, leaving the other period as
    /// it was. Repeating the call is a no-op.
    pub async fn save_entry(&self, period: Period, mood: i32, day: NaiveDate) -> AppResult<Entry> {
        if !is_valid_mood(mood) {
            return Err(AppError::BadRequest(format!("Invalid mood: {}", mood)));
        }

        let week = self.week(week_start(day)).await?;
        let column = period.column();

        let entry = sqlx::query_as::<_, Entry>(&format!(
            r#"
            INSERT INTO entries (id, user_id, week_id, day, {column})
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, day) DO UPDATE SET
                {column} = EXCLUDED.{column},
                week_id = EXCLUDED.week_id,
                updated_at = NOW()
            RETURNING *
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(self.user_id)
        .bind(week.id)
        .bind(day)
        .bind(mood)
        .fetch_one(self.db)
        .await?;

        tracing::debug!(
            user_id = %self.user_id,
            day = %day,
            period = period.as_str(),
            mood,
            "Saved mood entry"
        );
        Ok(entry)
    }

    /// `week` may be any day inside the week.
    pub async fn save_note(&self, week: &str, note: &str) -> AppResult<Week> {
        let day = parse_date(week)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid week: {}", week)))?;

        let week = sqlx::query_as::<_, Week>(
            r#"
            INSERT INTO weeks (id, user_id, week_date, note)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, week_date) DO UPDATE SET
                note = EXCLUDED.note,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(self.user_id)
        .bind(week_start(day))
        .bind(note.trim())
        .fetch_one(self.db)
        .await?;

        tracing::debug!(user_id = %self.user_id, week = %week.week_date, "Saved week note");
        Ok(week)
    }

    pub async fn entries_between(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<Entry>> {
        let entries = sqlx::query_as::<_, Entry>(
            r#"
            SELECT * FROM entries
            WHERE user_id = $1 AND day BETWEEN $2 AND $3
            ORDER BY day ASC
            "#,
        )
        .bind(self.user_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.db)
        .await?;

        Ok(entries)
    }

    /// Per-mood counts for one period in `[start, end]`, including a `None`
    /// group for days where the period is empty.
    pub async fn mood_counts(
        &self,
        period: Period,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<MoodCount>> {
        let column = period.column();
        let counts = sqlx::query_as::<_, MoodCount>(&format!(
            r#"
            SELECT {column} AS mood, COUNT(*) AS total
            FROM entries
            WHERE user_id = $1 AND day BETWEEN $2 AND $3
            GROUP BY {column}
            ORDER BY total ASC
            "#
        ))
        .bind(self.user_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.db)
        .await?;

        Ok(counts)
    }

    /// Week view for the week containing `start_dt`, or the current week
    /// when it is missing or malformed.
    pub async fn mood_table(
        &self,
        start_dt: Option<&str>,
        today: NaiveDate,
        language: Language,
    ) -> AppResult<MoodTable> {
        let anchor = start_dt.and_then(parse_date).unwrap_or(today);
        let week = self.week(week_start(anchor)).await?;

        let in_week = self
            .entries_between(week.week_date, week.week_date + Duration::days(6))
            .await?;
        let recent = self
            .entries_between(today - Duration::days(1), today)
            .await?;

        Ok(build_mood_table(week, &in_week, &recent, today, language))
    }

    pub async fn standout_data(&self, today: NaiveDate) -> AppResult<StandoutData> {
        let since = today - Duration::days(STANDOUT_WINDOW_DAYS - 1);
        let entries = self.entries_between(since, today).await?;
        Ok(build_standout_data(&entries, since, today))
    }

    pub async fn search_count(&self, filter: &SearchFilter) -> AppResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM entries e JOIN weeks w ON w.id = e.week_id WHERE e.user_id = ",
        );
        qb.push_bind(self.user_id);
        push_search_filters(&mut qb, filter);

        let (count,) = qb.build_query_as::<(i64,)>().fetch_one(self.db).await?;
        Ok(count)
    }

    /// Newest first.
    pub async fn search(
        &self,
        filter: &SearchFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<EntryWithNote>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT e.day, e.mood_day, e.mood_night, w.week_date, w.note \
             FROM entries e JOIN weeks w ON w.id = e.week_id WHERE e.user_id = ",
        );
        qb.push_bind(self.user_id);
        push_search_filters(&mut qb, filter);
        qb.push(" ORDER BY e.day DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb
            .build_query_as::<EntryWithNote>()
            .fetch_all(self.db)
            .await?;
        Ok(rows)
    }

    pub async fn calendar(&self) -> AppResult<Vec<WeekdayEntry>> {
        let entries = sqlx::query_as::<_, Entry>(
            "SELECT * FROM entries WHERE user_id = $1 ORDER BY day ASC",
        )
        .bind(self.user_id)
        .fetch_all(self.db)
        .await?;

        Ok(entries.iter().map(WeekdayEntry::from).collect())
    }

    pub async fn export(&self) -> AppResult<Export> {
        let weeks = sqlx::query_as::<_, Week>(
            "SELECT * FROM weeks WHERE user_id = $1 ORDER BY week_date ASC",
        )
        .bind(self.user_id)
        .fetch_all(self.db)
        .await?;

        Ok(Export {
            weeks: weeks
                .into_iter()
                .map(|w| ExportWeek {
                    week_date: w.week_date,
                    note: w.note,
                })
                .collect(),
            entries: self.calendar().await?,
        })
    }
}

fn push_search_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &SearchFilter) {
    if let Some(mood) = filter.mood {
        qb.push(" AND (e.mood_day = ")
            .push_bind(mood)
            .push(" OR e.mood_night = ")
            .push_bind(mood)
            .push(")");
    }
    if let Some(term) = &filter.term {
        qb.push(" AND w.note ILIKE ")
            .push_bind(format!("%{}%", escape_like(term)));
    }
    if let Some(start) = filter.start {
        qb.push(" AND e.day >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        qb.push(" AND e.day <= ").push_bind(end);
    }
}

/// Escapes LIKE wildcards so the term is matched literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub fn build_mood_table(
    week: Week,
    in_week: &[Entry],
    recent: &[Entry],
    today: NaiveDate,
    language: Language,
) -> MoodTable {
    let by_day: HashMap<NaiveDate, &Entry> = in_week.iter().map(|e| (e.day, e)).collect();

    let days_of_week = week_days(week.week_date)
        .into_iter()
        .map(|day| match by_day.get(&day) {
            Some(entry) => WeekdayEntry::from(*entry),
            None => WeekdayEntry {
                day,
                mood_day: None,
                mood_night: None,
            },
        })
        .collect();

    let yesterday = today - Duration::days(1);
    let current_day = recent
        .iter()
        .find(|e| e.day == today)
        .and_then(|e| e.mood_day);
    let current_night = recent
        .iter()
        .find(|e| e.day == yesterday)
        .and_then(|e| e.mood_night);

    MoodTable {
        days_of_week,
        next_week: format_date(week.week_date + Duration::days(7)),
        prev_week: format_date(week.week_date - Duration::days(7)),
        week_label: week_label(week.week_date, language),
        week,
        current_day,
        current_night,
    }
}

pub fn build_standout_data(entries: &[Entry], since: NaiveDate, until: NaiveDate) -> StandoutData {
    let mut day_counts: BTreeMap<i32, i64> = MOODS.iter().map(|m| (*m, 0)).collect();
    let mut night_counts = day_counts.clone();

    for entry in entries {
        if let Some(m) = entry.mood_day {
            *day_counts.entry(m).or_default() += 1;
        }
        if let Some(m) = entry.mood_night {
            *night_counts.entry(m).or_default() += 1;
        }
    }

    let is_extreme = |m: Option<i32>| matches!(m, Some(1) | Some(5));
    let mut standout_days: Vec<WeekdayEntry> = entries
        .iter()
        .filter(|e| is_extreme(e.mood_day) || is_extreme(e.mood_night))
        .map(WeekdayEntry::from)
        .collect();
    standout_days.sort_by(|a, b| b.day.cmp(&a.day));
    standout_days.truncate(MAX_STANDOUT_DAYS);

    StandoutData {
        since,
        until,
        days_recorded: entries
            .iter()
            .filter(|e| e.mood_day.is_some() || e.mood_night.is_some())
            .count() as i64,
        average_day: average(entries.iter().filter_map(|e| e.mood_day)),
        average_night: average(entries.iter().filter_map(|e| e.mood_night)),
        day_counts,
        night_counts,
        standout_days,
    }
}

/// Mean rounded to two decimals.
fn average(values: impl Iterator<Item = i32>) -> Option<f64> {
    let (sum, n) = values.fold((0i64, 0i64), |(s, n), v| (s + v as i64, n + 1));
    if n == 0 {
        return None;
    }
    Some(((sum as f64 / n as f64) * 100.0).round() / 100.0)
}
