// Dot-connection board: levels, committed paths and path validation

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::{path_segments, segments_cross, Cell};

/// A pair of same-colored dots to connect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DotPair {
    pub color: String,
    pub start: Cell,
    pub end: Cell,
}

/// A puzzle level: square grid plus the dot pairs on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub number: u32,
    pub size: u32,
    pub pairs: Vec<DotPair>,
}

impl Level {
    pub fn pair(&self, color: &str) -> Option<&DotPair> {
        self.pairs.iter().find(|p| p.color == color)
    }

    pub fn contains(&self, cell: &Cell) -> bool {
        cell.row < self.size && cell.col < self.size
    }

    /// Color of the dot sitting on `cell`, if any
    pub fn dot_at(&self, cell: &Cell) -> Option<&str> {
        self.pairs
            .iter()
            .find(|p| p.start == *cell || p.end == *cell)
            .map(|p| p.color.as_str())
    }
}

/// Why a drawn path was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no dot pair with color {0}")]
    UnknownColor(String),
    #[error("path needs at least two cells")]
    TooShort,
    #[error("cell ({}, {}) is outside the grid", .0.row, .0.col)]
    OutOfBounds(Cell),
    #[error("path must start and end on the two {0} dots")]
    WrongEndpoints(String),
    #[error("step into ({}, {}) is not adjacent", .0.row, .0.col)]
    NotAdjacent(Cell),
    #[error("cell ({}, {}) visited twice", .0.row, .0.col)]
    CellRevisited(Cell),
    #[error("path runs through a {0} dot")]
    ThroughForeignDot(String),
    #[error("path crosses the {0} path")]
    CrossesPath(String),
}

/// A level together with the paths committed so far
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub level: Level,
    #[serde(default)]
    pub paths: BTreeMap<String, Vec<Cell>>,
}

impl Board {
    pub fn new(level: Level) -> Self {
        Self {
            level,
            paths: BTreeMap::new(),
        }
    }

    /// Check a user-drawn path for `color` against the grid and every other
    /// color's committed path. The color's own previous path is ignored since
    /// committing replaces it.
    pub fn validate_path(&self, color: &str, path: &[Cell]) -> Result<(), PathError> {
        let pair = self
            .level
            .pair(color)
            .ok_or_else(|| PathError::UnknownColor(color.to_string()))?;

        if path.len() < 2 {
            return Err(PathError::TooShort);
        }

        if let Some(cell) = path.iter().find(|c| !self.level.contains(c)) {
            return Err(PathError::OutOfBounds(*cell));
        }

        let first = path[0];
        let last = path[path.len() - 1];
        let forward = first == pair.start && last == pair.end;
        let backward = first == pair.end && last == pair.start;
        if !forward && !backward {
            return Err(PathError::WrongEndpoints(color.to_string()));
        }

        let mut seen: HashSet<Cell> = HashSet::with_capacity(path.len());
        for (i, cell) in path.iter().enumerate() {
            if i > 0 && !path[i - 1].is_adjacent(cell) {
                return Err(PathError::NotAdjacent(*cell));
            }
            if !seen.insert(*cell) {
                return Err(PathError::CellRevisited(*cell));
            }
            if let Some(dot) = self.level.dot_at(cell) {
                if dot != color {
                    return Err(PathError::ThroughForeignDot(dot.to_string()));
                }
            }
        }

        // A shared cell always meets a perpendicular segment of the other
        // path, so overlaps surface here too
        let new_segments = path_segments(path);
        for (other, other_path) in self.paths.iter().filter(|(c, _)| c.as_str() != color) {
            let other_segments = path_segments(other_path);
            let crosses = new_segments
                .iter()
                .any(|s| other_segments.iter().any(|o| segments_cross(s, o)));
            if crosses {
                return Err(PathError::CrossesPath(other.clone()));
            }
        }

        Ok(())
    }

    /// Validate and store a path, replacing any earlier path of the same color
    pub fn commit(&mut self, color: &str, path: Vec<Cell>) -> Result<(), PathError> {
        self.validate_path(color, &path)?;
        self.paths.insert(color.to_string(), path);
        Ok(())
    }

    pub fn remove(&mut self, color: &str) -> Option<Vec<Cell>> {
        self.paths.remove(color)
    }

    /// Route between the two dots of `color` after a click (no drag).
    ///
    /// Tries the horizontal-then-vertical L first and falls back to
    /// vertical-then-horizontal. Returns the first route that validates.
    pub fn auto_route(&self, color: &str) -> Option<Vec<Cell>> {
        let pair = self.level.pair(color)?;

        let horizontal_first = l_route(pair.start, pair.end, true);
        if self.validate_path(color, &horizontal_first).is_ok() {
            return Some(horizontal_first);
        }

        let vertical_first = l_route(pair.start, pair.end, false);
        if self.validate_path(color, &vertical_first).is_ok() {
            return Some(vertical_first);
        }

        None
    }

    /// A level is complete once every color pair has a committed path
    pub fn is_complete(&self) -> bool {
        self.level
            .pairs
            .iter()
            .all(|p| self.paths.contains_key(&p.color))
    }
}

/// Build an L-shaped path of adjacent cells from `from` to `to`
fn l_route(from: Cell, to: Cell, horizontal_first: bool) -> Vec<Cell> {
    let mut path = vec![from];
    let mut current = from;

    if horizontal_first {
        walk_cols(&mut current, to.col, &mut path);
        walk_rows(&mut current, to.row, &mut path);
    } else {
        walk_rows(&mut current, to.row, &mut path);
        walk_cols(&mut current, to.col, &mut path);
    }

    path
}

fn walk_cols(current: &mut Cell, target: u32, path: &mut Vec<Cell>) {
    while current.col != target {
        if current.col < target {
            current.col += 1;
        } else {
            current.col -= 1;
        }
        path.push(*current);
    }
}

fn walk_rows(current: &mut Cell, target: u32, path: &mut Vec<Cell>) {
    while current.row != target {
        if current.row < target {
            current.row += 1;
        } else {
            current.row -= 1;
        }
        path.push(*current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(color: &str, start: (u32, u32), end: (u32, u32)) -> DotPair {
        DotPair {
            color: color.to_string(),
            start: Cell::new(start.0, start.1),
            end: Cell::new(end.0, end.1),
        }
    }

    fn cells(points: &[(u32, u32)]) -> Vec<Cell> {
        points.iter().map(|(r, c)| Cell::new(*r, *c)).collect()
    }

    fn board() -> Board {
        Board::new(Level {
            number: 1,
            size: 5,
            pairs: vec![
                pair("red", (0, 0), (2, 2)),
                pair("blue", (0, 4), (4, 4)),
                pair("green", (3, 0), (4, 2)),
            ],
        })
    }

    #[test]
    fn test_accepts_adjacent_path_either_direction() {
        let b = board();
        let path = cells(&[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)]);
        assert_eq!(b.validate_path("red", &path), Ok(()));

        let mut reversed = path.clone();
        reversed.reverse();
        assert_eq!(b.validate_path("red", &reversed), Ok(()));
    }

    #[test]
    fn test_rejects_diagonal_step() {
        let b = board();
        let path = cells(&[(0, 0), (1, 1), (2, 2)]);
        assert_eq!(
            b.validate_path("red", &path),
            Err(PathError::NotAdjacent(Cell::new(1, 1)))
        );
    }

    #[test]
    fn test_rejects_revisit() {
        let b = board();
        let path = cells(&[(0, 0), (1, 0), (1, 1), (0, 1), (1, 1), (1, 2), (2, 2)]);
        assert_eq!(
            b.validate_path("red", &path),
            Err(PathError::CellRevisited(Cell::new(1, 1)))
        );
    }

    #[test]
    fn test_rejects_wrong_endpoints_and_unknown_color() {
        let b = board();
        let path = cells(&[(0, 0), (0, 1)]);
        assert_eq!(
            b.validate_path("red", &path),
            Err(PathError::WrongEndpoints("red".to_string()))
        );
        assert_eq!(
            b.validate_path("purple", &path),
            Err(PathError::UnknownColor("purple".to_string()))
        );
    }

    #[test]
    fn test_rejects_path_through_other_dot() {
        let b = board();
        // Passes over green's dot at (0,2)
        let path = cells(&[(0, 0), (0, 1), (0, 2), (1, 2), (2, 2)]);
        let mut with_green_dot_in_way = b.clone();
        with_green_dot_in_way.level.pairs[2] = pair("green", (4, 0), (0, 2));
        assert_eq!(
            with_green_dot_in_way.validate_path("red", &path),
            Err(PathError::ThroughForeignDot("green".to_string()))
        );
    }

    #[test]
    fn test_rejects_crossing_committed_path() {
        let mut b = Board::new(Level {
            number: 1,
            size: 5,
            pairs: vec![pair("red", (2, 0), (2, 4)), pair("blue", (0, 2), (4, 2))],
        });
        b.commit("red", cells(&[(2, 0), (2, 1), (2, 2), (2, 3), (2, 4)]))
            .unwrap();

        let blue = cells(&[(0, 2), (1, 2), (2, 2), (3, 2), (4, 2)]);
        assert_eq!(
            b.validate_path("blue", &blue),
            Err(PathError::CrossesPath("red".to_string()))
        );
    }

    #[test]
    fn test_overlap_reports_as_crossing() {
        let mut b = Board::new(Level {
            number: 1,
            size: 4,
            pairs: vec![pair("red", (0, 0), (0, 3)), pair("blue", (1, 0), (1, 3))],
        });
        b.commit("red", cells(&[(0, 0), (0, 1), (0, 2), (0, 3)]))
            .unwrap();

        // Climbs onto red's row and runs along it for two cells
        let blue = cells(&[(1, 0), (1, 1), (0, 1), (0, 2), (1, 2), (1, 3)]);
        assert_eq!(
            b.validate_path("blue", &blue),
            Err(PathError::CrossesPath("red".to_string()))
        );
    }

    #[test]
    fn test_commit_replaces_own_path() {
        let mut b = board();
        b.commit("red", cells(&[(0, 0), (1, 0), (1, 1), (1, 2), (2, 2)]))
            .unwrap();
        // Redrawing red over its own old cells is fine
        b.commit("red", cells(&[(0, 0), (1, 0), (1, 1), (2, 1), (2, 2)]))
            .unwrap();
        assert_eq!(b.paths.len(), 1);
        assert_eq!(b.paths["red"][3], Cell::new(2, 1));
    }

    #[test]
    fn test_auto_route_prefers_horizontal_first() {
        let b = Board::new(Level {
            number: 1,
            size: 4,
            pairs: vec![pair("red", (0, 0), (2, 3))],
        });
        let route = b.auto_route("red").unwrap();
        assert_eq!(
            route,
            cells(&[(0, 0), (0, 1), (0, 2), (0, 3), (1, 3), (2, 3)])
        );
    }

    #[test]
    fn test_auto_route_falls_back_to_vertical_first() {
        let mut b = Board::new(Level {
            number: 1,
            size: 4,
            pairs: vec![pair("red", (0, 0), (2, 3)), pair("blue", (0, 2), (1, 2))],
        });
        // Blue sits across the top row, blocking the horizontal-first L
        b.commit("blue", cells(&[(0, 2), (1, 2)])).unwrap();

        let route = b.auto_route("red").unwrap();
        assert_eq!(
            route,
            cells(&[(0, 0), (1, 0), (2, 0), (2, 1), (2, 2), (2, 3)])
        );
    }

    #[test]
    fn test_auto_route_gives_up_when_both_blocked() {
        let mut b = Board::new(Level {
            number: 1,
            size: 3,
            pairs: vec![pair("red", (0, 0), (2, 2)), pair("blue", (0, 2), (2, 0))],
        });
        b.commit("blue", cells(&[(0, 2), (1, 2), (1, 1), (1, 0), (2, 0)]))
            .unwrap();
        assert_eq!(b.auto_route("red"), None);
    }

    #[test]
    fn test_completion_requires_every_pair() {
        let mut b = Board::new(Level {
            number: 1,
            size: 3,
            pairs: vec![pair("red", (0, 0), (0, 2)), pair("blue", (2, 0), (2, 2))],
        });
        assert!(!b.is_complete());
        b.commit("red", cells(&[(0, 0), (0, 1), (0, 2)])).unwrap();
        assert!(!b.is_complete());
        b.commit("blue", cells(&[(2, 0), (2, 1), (2, 2)])).unwrap();
        assert!(b.is_complete());
        b.remove("red");
        assert!(!b.is_complete());
    }
}
