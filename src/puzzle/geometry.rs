// Grid geometry for the dot-connection game
// Cells, straight segments and the crossing test used by the path validator

use serde::{Deserialize, Serialize};

/// A cell on the puzzle grid (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// True if `other` is one step up, down, left or right
    pub fn is_adjacent(&self, other: &Cell) -> bool {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col) == 1
    }
}

/// An axis-aligned segment between two cells (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub a: Cell,
    pub b: Cell,
}

impl Segment {
    pub fn new(a: Cell, b: Cell) -> Self {
        Self { a, b }
    }

    /// Vertical: constant column, spans more than one row
    pub fn is_vertical(&self) -> bool {
        self.a.col == self.b.col && self.a.row != self.b.row
    }

    /// Horizontal: constant row, spans more than one column
    pub fn is_horizontal(&self) -> bool {
        self.a.row == self.b.row && self.a.col != self.b.col
    }

    fn row_span(&self) -> (u32, u32) {
        (self.a.row.min(self.b.row), self.a.row.max(self.b.row))
    }

    fn col_span(&self) -> (u32, u32) {
        (self.a.col.min(self.b.col), self.a.col.max(self.b.col))
    }
}

/// Orthogonal crossing test.
///
/// A vertical segment crosses a horizontal one when the vertical's column lies
/// within the horizontal's column span and the horizontal's row lies within the
/// vertical's row span. Spans are inclusive, so a T-junction counts as a
/// crossing. Parallel segments never cross.
pub fn segments_cross(s1: &Segment, s2: &Segment) -> bool {
    let (vertical, horizontal) = if s1.is_vertical() && s2.is_horizontal() {
        (s1, s2)
    } else if s1.is_horizontal() && s2.is_vertical() {
        (s2, s1)
    } else {
        return false;
    };

    let (col_lo, col_hi) = horizontal.col_span();
    let (row_lo, row_hi) = vertical.row_span();
    let col = vertical.a.col;
    let row = horizontal.a.row;

    (col_lo..=col_hi).contains(&col) && (row_lo..=row_hi).contains(&row)
}

/// Compress a path of adjacent cells into maximal straight segments.
/// Paths with fewer than two cells produce no segments.
pub fn path_segments(path: &[Cell]) -> Vec<Segment> {
    let mut segments = Vec::new();
    if path.len() < 2 {
        return segments;
    }

    let mut start = path[0];
    let mut prev = path[0];
    let mut direction: Option<(i64, i64)> = None;

    for cell in &path[1..] {
        let step = (
            cell.row as i64 - prev.row as i64,
            cell.col as i64 - prev.col as i64,
        );
        match direction {
            Some(d) if d != step => {
                segments.push(Segment::new(start, prev));
                start = prev;
                direction = Some(step);
            }
            None => direction = Some(step),
            _ => {}
        }
        prev = *cell;
    }
    segments.push(Segment::new(start, prev));

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(r1: u32, c1: u32, r2: u32, c2: u32) -> Segment {
        Segment::new(Cell::new(r1, c1), Cell::new(r2, c2))
    }

    #[test]
    fn test_true_cross() {
        let v = seg(0, 2, 4, 2);
        let h = seg(2, 0, 2, 4);
        assert!(segments_cross(&v, &h));
        assert!(segments_cross(&h, &v));
    }

    #[test]
    fn test_t_junction_touch_counts() {
        // Horizontal ends exactly on the vertical's column
        let v = seg(0, 3, 4, 3);
        let h = seg(2, 0, 2, 3);
        assert!(segments_cross(&v, &h));
        assert!(segments_cross(&h, &v));
    }

    #[test]
    fn test_parallel_segments_never_cross() {
        assert!(!segments_cross(&seg(0, 0, 0, 4), &seg(1, 0, 1, 4)));
        assert!(!segments_cross(&seg(0, 0, 4, 0), &seg(0, 1, 4, 1)));
        // Collinear overlap is still parallel
        assert!(!segments_cross(&seg(0, 0, 0, 4), &seg(0, 2, 0, 6)));
    }

    #[test]
    fn test_disjoint_perpendicular() {
        let v = seg(0, 5, 2, 5);
        let h = seg(3, 0, 3, 4);
        assert!(!segments_cross(&v, &h));
        assert!(!segments_cross(&h, &v));
    }

    #[test]
    fn test_crossing_is_symmetric_over_table() {
        let cases = [
            seg(0, 0, 0, 3),
            seg(0, 1, 3, 1),
            seg(2, 0, 2, 2),
            seg(1, 3, 4, 3),
            seg(4, 0, 4, 4),
            seg(0, 4, 0, 4),
        ];
        for a in &cases {
            for b in &cases {
                assert_eq!(segments_cross(a, b), segments_cross(b, a), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_path_segments_compresses_runs() {
        let path = [
            Cell::new(0, 0),
            Cell::new(0, 1),
            Cell::new(0, 2),
            Cell::new(1, 2),
            Cell::new(2, 2),
            Cell::new(2, 1),
        ];
        let segments = path_segments(&path);
        assert_eq!(
            segments,
            vec![seg(0, 0, 0, 2), seg(0, 2, 2, 2), seg(2, 2, 2, 1)]
        );
    }

    #[test]
    fn test_adjacency() {
        let c = Cell::new(2, 2);
        assert!(c.is_adjacent(&Cell::new(1, 2)));
        assert!(c.is_adjacent(&Cell::new(2, 3)));
        assert!(!c.is_adjacent(&Cell::new(3, 3)));
        assert!(!c.is_adjacent(&c));
    }
}
