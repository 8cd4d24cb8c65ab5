// Game progress models
// Path: users/{uid}/game_progress/{game}

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::puzzle::Cell;

/// Puzzle games with tracked progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    ConnectDots,
    SlidingPuzzle,
    MemoryMatch,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [
        GameKind::ConnectDots,
        GameKind::SlidingPuzzle,
        GameKind::MemoryMatch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GameKind::ConnectDots => "connect_dots",
            GameKind::SlidingPuzzle => "sliding_puzzle",
            GameKind::MemoryMatch => "memory_match",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("levels start at 1")]
    InvalidLevel,
    #[error("level {level} is locked (unlocked up to {unlocked})")]
    LevelLocked { level: u32, unlocked: u32 },
}

/// Per-game progress record.
///
/// `unlocked_level` never decreases and best metrics only ever improve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProgress {
    pub unlocked_level: u32,
    #[serde(default)]
    pub completed_levels: BTreeSet<u32>,
    /// level -> fewest moves
    #[serde(default)]
    pub best_moves: BTreeMap<u32, u32>,
    /// level -> fastest completion in milliseconds
    #[serde(default)]
    pub best_times: BTreeMap<u32, u64>,
}

impl Default for GameProgress {
    fn default() -> Self {
        Self {
            unlocked_level: 1,
            completed_levels: BTreeSet::new(),
            best_moves: BTreeMap::new(),
            best_times: BTreeMap::new(),
        }
    }
}

impl GameProgress {
    /// Mark `level` completed, unlocking the next one and keeping the better
    /// of the stored and submitted metrics.
    pub fn complete_level(
        &mut self,
        level: u32,
        moves: Option<u32>,
        time_ms: Option<u64>,
    ) -> Result<(), ProgressError> {
        if level == 0 {
            return Err(ProgressError::InvalidLevel);
        }
        if level > self.unlocked_level {
            return Err(ProgressError::LevelLocked {
                level,
                unlocked: self.unlocked_level,
            });
        }

        self.unlocked_level = self.unlocked_level.max(level + 1);
        self.completed_levels.insert(level);

        if let Some(moves) = moves {
            self.best_moves
                .entry(level)
                .and_modify(|best| *best = (*best).min(moves))
                .or_insert(moves);
        }
        if let Some(time_ms) = time_ms {
            self.best_times
                .entry(level)
                .and_modify(|best| *best = (*best).min(time_ms))
                .or_insert(time_ms);
        }

        Ok(())
    }

    pub fn is_unlocked(&self, level: u32) -> bool {
        level >= 1 && level <= self.unlocked_level
    }
}

/// Request body for POST /v1/games/:game/levels/:level/complete
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteLevelRequest {
    pub moves: Option<u32>,
    pub time_ms: Option<u64>,
}

/// Request body for POST /v1/games/connect_dots/levels/:level/validate
#[derive(Debug, Clone, Deserialize)]
pub struct ValidatePathRequest {
    /// Paths already on the board, by color
    #[serde(default)]
    pub committed: BTreeMap<String, Vec<Cell>>,
    pub color: String,
    pub path: Vec<Cell>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidatePathResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// True once every color pair is connected, counting the new path
    pub complete: bool,
}

/// Request body for POST /v1/games/connect_dots/levels/:level/route
#[derive(Debug, Clone, Deserialize)]
pub struct AutoRouteRequest {
    #[serde(default)]
    pub committed: BTreeMap<String, Vec<Cell>>,
    pub color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AutoRouteResponse {
    pub path: Option<Vec<Cell>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_progress_starts_at_level_one() {
        let p = GameProgress::default();
        assert_eq!(p.unlocked_level, 1);
        assert!(p.is_unlocked(1));
        assert!(!p.is_unlocked(2));
        assert!(!p.is_unlocked(0));
    }

    #[test]
    fn test_completion_unlocks_next_level() {
        let mut p = GameProgress::default();
        p.complete_level(1, Some(12), Some(30_000)).unwrap();
        assert_eq!(p.unlocked_level, 2);
        assert!(p.completed_levels.contains(&1));
    }

    #[test]
    fn test_unlocked_level_never_decreases() {
        let mut p = GameProgress::default();
        for level in 1..=5 {
            p.complete_level(level, None, None).unwrap();
        }
        assert_eq!(p.unlocked_level, 6);

        // Replaying early levels must not roll progress back
        let mut previous = p.unlocked_level;
        for level in [1, 3, 2, 5, 1, 4] {
            p.complete_level(level, None, None).unwrap();
            assert!(p.unlocked_level >= previous);
            previous = p.unlocked_level;
        }
        assert_eq!(p.unlocked_level, 6);
    }

    #[test]
    fn test_best_metrics_never_increase() {
        let mut p = GameProgress::default();
        let submissions = [(20, 40_000), (25, 35_000), (15, 50_000), (18, 30_000)];
        let mut best_moves = u32::MAX;
        let mut best_time = u64::MAX;

        for (moves, time) in submissions {
            p.complete_level(1, Some(moves), Some(time)).unwrap();
            let stored_moves = p.best_moves[&1];
            let stored_time = p.best_times[&1];
            assert!(stored_moves <= best_moves);
            assert!(stored_time <= best_time);
            best_moves = stored_moves;
            best_time = stored_time;
        }

        assert_eq!(p.best_moves[&1], 15);
        assert_eq!(p.best_times[&1], 30_000);
    }

    #[test]
    fn test_locked_and_zero_levels_rejected() {
        let mut p = GameProgress::default();
        assert_eq!(p.complete_level(0, None, None), Err(ProgressError::InvalidLevel));
        assert_eq!(
            p.complete_level(3, None, None),
            Err(ProgressError::LevelLocked { level: 3, unlocked: 1 })
        );
        assert_eq!(p, GameProgress::default());
    }

    #[test]
    fn test_game_kind_parse() {
        assert_eq!(GameKind::parse("connect_dots"), Some(GameKind::ConnectDots));
        assert_eq!(GameKind::parse("chess"), None);
    }
}
