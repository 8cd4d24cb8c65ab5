// Diary / mood tracking models
// Path: users/{uid}/diary_entries/{entry_id}

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Mood on a 1 (very bad) to 5 (very good) scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Mood(u8);

impl Mood {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Mood {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Mood::new(value).ok_or_else(|| format!("mood must be between 1 and 5, got {}", value))
    }
}

impl From<Mood> for u8 {
    fn from(m: Mood) -> u8 {
        m.0
    }
}

/// A diary entry. `note` is plaintext here; the store encrypts it at rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    #[serde(default)]
    pub id: String,
    pub mood: Mood,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Calendar day in the user's timezone
    pub entry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Request body for POST /v1/diary
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDiaryEntryRequest {
    pub mood: Mood,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// IANA timezone used to compute `entry_date`, defaults to UTC
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Query for listing entries and summaries
#[derive(Debug, Clone, Deserialize)]
pub struct DiaryRangeQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub timezone: Option<String>,
}

fn default_limit() -> usize {
    100
}

/// Aggregate mood statistics over a set of entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodSummary {
    pub count: usize,
    pub average: Option<f64>,
    /// mood value -> number of entries
    pub histogram: BTreeMap<u8, usize>,
    /// Consecutive days with at least one entry, ending today or yesterday.
    /// Not limited to the summary range.
    pub streak_days: u32,
}

impl MoodSummary {
    /// Statistics over `entries`; the streak is computed separately since it
    /// is not bounded by the summary range.
    pub fn from_entries(entries: &[DiaryEntry], streak_days: u32) -> Self {
        let mut histogram: BTreeMap<u8, usize> =
            (Mood::MIN..=Mood::MAX).map(|m| (m, 0)).collect();
        let mut total: u32 = 0;

        for entry in entries {
            *histogram.entry(entry.mood.value()).or_insert(0) += 1;
            total += entry.mood.value() as u32;
        }

        let average = if entries.is_empty() {
            None
        } else {
            Some(total as f64 / entries.len() as f64)
        };

        Self {
            count: entries.len(),
            average,
            histogram,
            streak_days,
        }
    }
}

/// Consecutive days in `days` ending today, or yesterday when today has no
/// entry yet
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mood: u8, date: &str) -> DiaryEntry {
        DiaryEntry {
            id: String::new(),
            mood: Mood::new(mood).unwrap(),
            note: String::new(),
            tags: vec![],
            entry_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_mood_bounds() {
        assert!(Mood::new(0).is_none());
        assert!(Mood::new(6).is_none());
        assert_eq!(Mood::new(3).unwrap().value(), 3);
        assert!(serde_json::from_str::<Mood>("9").is_err());
        assert_eq!(serde_json::from_str::<Mood>("4").unwrap().value(), 4);
    }

    fn days(dates: &[&str]) -> BTreeSet<NaiveDate> {
        dates
            .iter()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap())
            .collect()
    }

    #[test]
    fn test_summary_average_and_histogram() {
        let entries = vec![
            entry(5, "2024-03-10"),
            entry(3, "2024-03-09"),
            entry(4, "2024-03-08"),
            entry(2, "2024-03-05"),
        ];
        let summary = MoodSummary::from_entries(&entries, 3);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.average, Some(3.5));
        assert_eq!(summary.histogram[&1], 0);
        assert_eq!(summary.histogram[&5], 1);
        assert_eq!(summary.streak_days, 3);
    }

    #[test]
    fn test_streak_ends_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let dates = days(&["2024-03-10", "2024-03-09", "2024-03-08", "2024-03-05"]);
        assert_eq!(current_streak(&dates, today), 3);
    }

    #[test]
    fn test_streak_counts_from_yesterday_when_today_missing() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(current_streak(&days(&["2024-03-09", "2024-03-08"]), today), 2);
        assert_eq!(current_streak(&days(&["2024-03-01"]), today), 0);
    }

    #[test]
    fn test_empty_summary() {
        let summary = MoodSummary::from_entries(&[], 0);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.average, None);
        assert_eq!(summary.streak_days, 0);
        assert_eq!(current_streak(&BTreeSet::new(), Utc::now().date_naive()), 0);
    }
}
