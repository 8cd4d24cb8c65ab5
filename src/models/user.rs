// User profile models
// Path: users/{uid}

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the recent-activity list
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Feature area an activity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Chat,
    Diary,
    Assessment,
    Game,
    Sound,
    Therapist,
}

impl ActivityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityCategory::Chat => "chat",
            ActivityCategory::Diary => "diary",
            ActivityCategory::Assessment => "assessment",
            ActivityCategory::Game => "game",
            ActivityCategory::Sound => "sound",
            ActivityCategory::Therapist => "therapist",
        }
    }
}

/// One entry of the recent-activity list shown on the home screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub category: ActivityCategory,
    pub title: String,
    pub at: DateTime<Utc>,
}

/// Achievement unlocked by reaching an activity count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub category: ActivityCategory,
    pub threshold: u32,
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement { id: "first_chat", category: ActivityCategory::Chat, threshold: 1 },
    Achievement { id: "chatterbox", category: ActivityCategory::Chat, threshold: 25 },
    Achievement { id: "first_entry", category: ActivityCategory::Diary, threshold: 1 },
    Achievement { id: "journal_habit", category: ActivityCategory::Diary, threshold: 7 },
    Achievement { id: "self_aware", category: ActivityCategory::Assessment, threshold: 1 },
    Achievement { id: "thorough", category: ActivityCategory::Assessment, threshold: 4 },
    Achievement { id: "player", category: ActivityCategory::Game, threshold: 1 },
    Achievement { id: "puzzle_master", category: ActivityCategory::Game, threshold: 30 },
    Achievement { id: "calm_listener", category: ActivityCategory::Sound, threshold: 5 },
    Achievement { id: "help_seeker", category: ActivityCategory::Therapist, threshold: 1 },
];

/// User profile stored on the user document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub activity_counts: BTreeMap<ActivityCategory, u32>,
    #[serde(default)]
    pub recent_activities: Vec<RecentActivity>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn new(uid: &str) -> Self {
        Self {
            id: uid.to_string(),
            name: None,
            avatar: None,
            language: None,
            achievements: vec![],
            activity_counts: BTreeMap::new(),
            recent_activities: vec![],
            created_at: Some(Utc::now()),
        }
    }

    /// Record an activity: bump its counter, move it to the front of the
    /// recent list (one entry per category, at most five) and unlock any
    /// achievements reached. Returns the ids of newly unlocked achievements.
    pub fn record_activity(&mut self, activity: RecentActivity) -> Vec<&'static str> {
        *self.activity_counts.entry(activity.category).or_insert(0) += 1;

        self.recent_activities
            .retain(|a| a.category != activity.category);
        self.recent_activities.insert(0, activity);
        self.recent_activities.truncate(RECENT_ACTIVITY_LIMIT);

        self.unlock_achievements()
    }

    fn unlock_achievements(&mut self) -> Vec<&'static str> {
        let mut unlocked = Vec::new();
        for achievement in ACHIEVEMENTS {
            let count = self
                .activity_counts
                .get(&achievement.category)
                .copied()
                .unwrap_or(0);
            if count >= achievement.threshold
                && !self.achievements.iter().any(|a| a == achievement.id)
            {
                self.achievements.push(achievement.id.to_string());
                unlocked.push(achievement.id);
            }
        }
        unlocked
    }
}

/// Request body for PATCH /v1/users/me
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Request body for PUT /v1/users/me/language
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateLanguageRequest {
    pub language: String,
}

/// Request body for POST /v1/users/me/activities
#[derive(Debug, Clone, Deserialize)]
pub struct RecordActivityRequest {
    pub category: ActivityCategory,
    pub title: String,
}

/// Response for POST /v1/users/me/activities
#[derive(Debug, Clone, Serialize)]
pub struct RecordActivityResponse {
    pub profile: UserProfile,
    pub unlocked: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn activity(category: ActivityCategory, minutes: i64) -> RecentActivity {
        RecentActivity {
            category,
            title: format!("{:?}", category),
            at: Utc::now() + Duration::minutes(minutes),
        }
    }

    #[test]
    fn test_recent_activity_keeps_five_newest_unique() {
        let mut profile = UserProfile::new("u1");
        let order = [
            ActivityCategory::Chat,
            ActivityCategory::Diary,
            ActivityCategory::Assessment,
            ActivityCategory::Game,
            ActivityCategory::Sound,
            ActivityCategory::Therapist,
        ];
        for (i, category) in order.iter().enumerate() {
            profile.record_activity(activity(*category, i as i64));
        }

        let categories: Vec<_> = profile.recent_activities.iter().map(|a| a.category).collect();
        assert_eq!(
            categories,
            vec![
                ActivityCategory::Therapist,
                ActivityCategory::Sound,
                ActivityCategory::Game,
                ActivityCategory::Assessment,
                ActivityCategory::Diary,
            ]
        );
    }

    #[test]
    fn test_repeat_category_moves_to_front_without_duplicate() {
        let mut profile = UserProfile::new("u1");
        profile.record_activity(activity(ActivityCategory::Chat, 0));
        profile.record_activity(activity(ActivityCategory::Diary, 1));
        profile.record_activity(activity(ActivityCategory::Chat, 2));

        assert_eq!(profile.recent_activities.len(), 2);
        assert_eq!(profile.recent_activities[0].category, ActivityCategory::Chat);
        assert_eq!(profile.recent_activities[1].category, ActivityCategory::Diary);
        assert_eq!(profile.activity_counts[&ActivityCategory::Chat], 2);
    }

    #[test]
    fn test_list_never_exceeds_limit() {
        let mut profile = UserProfile::new("u1");
        for i in 0..50 {
            let category = [
                ActivityCategory::Chat,
                ActivityCategory::Diary,
                ActivityCategory::Assessment,
                ActivityCategory::Game,
                ActivityCategory::Sound,
                ActivityCategory::Therapist,
            ][i % 6];
            profile.record_activity(activity(category, i as i64));
            assert!(profile.recent_activities.len() <= RECENT_ACTIVITY_LIMIT);
            let mut seen = std::collections::HashSet::new();
            assert!(profile.recent_activities.iter().all(|a| seen.insert(a.category)));
        }
    }

    #[test]
    fn test_achievements_unlock_once() {
        let mut profile = UserProfile::new("u1");
        let unlocked = profile.record_activity(activity(ActivityCategory::Chat, 0));
        assert_eq!(unlocked, vec!["first_chat"]);

        let unlocked = profile.record_activity(activity(ActivityCategory::Chat, 1));
        assert!(unlocked.is_empty());
        assert_eq!(profile.achievements, vec!["first_chat".to_string()]);
    }

    #[test]
    fn test_profile_deserializes_with_missing_fields() {
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "name": "Sam",
            "activity_counts": {"chat": 3}
        }))
        .unwrap();
        assert_eq!(profile.activity_counts[&ActivityCategory::Chat], 3);
        assert!(profile.recent_activities.is_empty());
    }
}
