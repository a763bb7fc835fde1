//! Shapes mood data into Plotly figures. The browser renders them with
//! plotly.js; nothing here draws.

use serde::Serialize;
use serde_json::{json, Value};

use crate::models::entry::{DayMoods, Entry, Period, MOODS};
use crate::models::settings::ViewMode;
use crate::services::dates::format_date;
use crate::services::mood::MoodPalette;

/// Grouped count of one mood value for one period. `mood` is `None` for
/// days where the period was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct MoodCount {
    pub mood: Option<i32>,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PieChart {
    pub period: Period,
    pub moods: Vec<i32>,
    pub labels: Vec<String>,
    pub values: Vec<i64>,
    pub colors: Vec<String>,
    pub figure: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterSeries {
    pub period: Period,
    pub name: String,
    pub x: Vec<String>,
    pub y: Vec<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterChart {
    pub view_mode: ViewMode,
    pub series: Vec<ScatterSeries>,
    pub figure: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarSeries {
    pub period: Period,
    pub name: String,
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BarChart {
    pub labels: Vec<String>,
    pub series: Vec<BarSeries>,
    pub figure: Value,
}

/// Pie slices ordered by count ascending, then mood. Unrecorded periods
/// and out-of-range values are skipped.
pub fn pie_chart(period: Period, counts: &[MoodCount], palette: &MoodPalette) -> PieChart {
    let mut slices: Vec<(i32, i64)> = counts
        .iter()
        .filter_map(|c| c.mood.filter(|m| MOODS.contains(m)).map(|m| (m, c.total)))
        .filter(|(_, total)| *total > 0)
        .collect();
    slices.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let moods: Vec<i32> = slices.iter().map(|(m, _)| *m).collect();
    let labels: Vec<String> = moods.iter().map(|m| palette.label(*m).to_string()).collect();
    let values: Vec<i64> = slices.iter().map(|(_, t)| *t).collect();
    let colors: Vec<String> = moods.iter().map(|m| palette.color(*m).to_string()).collect();

    let figure = json!({
        "data": [{
            "type": "pie",
            "labels": labels,
            "values": values,
            "textinfo": "label+percent",
            "insidetextorientation": "radial",
            "marker": {
                "colors": colors,
                "line": { "color": "#000000", "width": 2 },
            },
        }],
        "layout": {
            "title": { "text": palette.period_label(period) },
            "showlegend": false,
        },
    });

    PieChart {
        period,
        moods,
        labels,
        values,
        colors,
        figure,
    }
}

/// One trace per period over the given entries, which must be ordered by day.
pub fn scatter_chart(entries: &[Entry], view_mode: ViewMode, palette: &MoodPalette) -> ScatterChart {
    let series: Vec<ScatterSeries> = Period::ALL
        .iter()
        .map(|period| {
            let (x, y) = entries
                .iter()
                .filter_map(|e| e.mood(*period).map(|m| (format_date(e.day), m)))
                .unzip();
            ScatterSeries {
                period: *period,
                name: palette.period_label(*period).to_string(),
                x,
                y,
            }
        })
        .collect();

    let mode = match view_mode {
        ViewMode::Lines => "lines+markers",
        ViewMode::Markers => "markers",
    };

    let traces: Vec<Value> = series
        .iter()
        .map(|s| {
            let colors: Vec<&str> = s.y.iter().map(|m| palette.color(*m)).collect();
            json!({
                "type": "scatter",
                "mode": mode,
                "name": s.name,
                "x": s.x,
                "y": s.y,
                "marker": { "color": colors, "size": 10 },
            })
        })
        .collect();

    let figure = json!({
        "data": traces,
        "layout": {
            "xaxis": { "type": "date" },
            "yaxis": {
                "tickvals": MOODS,
                "ticktext": MOODS.iter().map(|m| palette.label(*m)).collect::<Vec<_>>(),
                "range": [0.5, 5.5],
            },
        },
    });

    ScatterChart {
        view_mode,
        series,
        figure,
    }
}

/// Grouped bars: every mood value on the x axis, one bar per period.
pub fn bar_chart(day: &[MoodCount], night: &[MoodCount], palette: &MoodPalette) -> BarChart {
    let totals = |counts: &[MoodCount]| -> Vec<i64> {
        MOODS
            .iter()
            .map(|m| {
                counts
                    .iter()
                    .filter(|c| c.mood == Some(*m))
                    .map(|c| c.total)
                    .sum()
            })
            .collect()
    };

    let labels: Vec<String> = MOODS.iter().map(|m| palette.label(*m).to_string()).collect();
    let series = vec![
        BarSeries {
            period: Period::Day,
            name: palette.period_label(Period::Day).to_string(),
            values: totals(day),
        },
        BarSeries {
            period: Period::Night,
            name: palette.period_label(Period::Night).to_string(),
            values: totals(night),
        },
    ];

    let traces: Vec<Value> = series
        .iter()
        .map(|s| {
            json!({
                "type": "bar",
                "name": s.name,
                "x": labels,
                "y": s.values,
            })
        })
        .collect();

    let figure = json!({
        "data": traces,
        "layout": { "barmode": "group" },
    });

    BarChart {
        labels,
        series,
        figure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::settings::Language;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn palette() -> MoodPalette {
        MoodPalette::new(Language::English, [None; 5])
    }

    fn count(mood: Option<i32>, total: i64) -> MoodCount {
        MoodCount { mood, total }
    }

    fn entry(day: u32, mood_day: Option<i32>, mood_night: Option<i32>) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            week_id: Uuid::nil(),
            day: NaiveDate::from_ymd_opt(2021, 11, day).unwrap(),
            mood_day,
            mood_night,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pie_skips_missing_and_orders_by_count() {
        let counts = [count(Some(4), 5), count(None, 9), count(Some(2), 1), count(Some(1), 5)];
        let pie = pie_chart(Period::Day, &counts, &palette());

        assert_eq!(pie.moods, vec![2, 1, 4]);
        assert_eq!(pie.values, vec![1, 5, 5]);
        assert_eq!(pie.labels, vec!["bad", "very bad", "good"]);
        assert_eq!(pie.colors[0], "#f0ad4e");
        assert_eq!(pie.figure["data"][0]["type"], "pie");
        assert_eq!(pie.figure["data"][0]["textinfo"], "label+percent");
    }

    #[test]
    fn test_pie_empty_range() {
        let pie = pie_chart(Period::Night, &[], &palette());
        assert!(pie.labels.is_empty());
        assert_eq!(pie.figure["layout"]["title"]["text"], "Night");
    }

    #[test]
    fn test_scatter_omits_missing_points() {
        let entries = [entry(1, Some(3), None), entry(2, None, Some(2)), entry(3, Some(5), Some(4))];
        let chart = scatter_chart(&entries, ViewMode::Lines, &palette());

        assert_eq!(chart.series[0].x, vec!["2021-11-01", "2021-11-03"]);
        assert_eq!(chart.series[0].y, vec![3, 5]);
        assert_eq!(chart.series[1].y, vec![2, 4]);
        assert_eq!(chart.figure["data"][0]["mode"], "lines+markers");
    }

    #[test]
    fn test_scatter_markers_mode() {
        let chart = scatter_chart(&[], ViewMode::Markers, &palette());
        assert_eq!(chart.figure["data"][1]["mode"], "markers");
        assert_eq!(chart.figure["layout"]["yaxis"]["ticktext"][4], "very good");
    }

    #[test]
    fn test_bar_includes_zero_counts() {
        let day = [count(Some(3), 2), count(None, 4)];
        let night = [count(Some(5), 1), count(Some(1), 6)];
        let chart = bar_chart(&day, &night, &palette());

        assert_eq!(chart.labels.len(), 5);
        assert_eq!(chart.series[0].values, vec![0, 0, 2, 0, 0]);
        assert_eq!(chart.series[1].values, vec![6, 0, 0, 0, 1]);
        assert_eq!(chart.figure["layout"]["barmode"], "group");
    }
}
