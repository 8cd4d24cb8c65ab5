// Built-in connect-dots level pack

use super::board::{DotPair, Level};
use super::geometry::Cell;

/// (size, [(color, (row, col), (row, col))])
type LevelDef = (u32, &'static [(&'static str, (u32, u32), (u32, u32))]);

const LEVELS: &[LevelDef] = &[
    (4, &[("red", (0, 0), (3, 0)), ("blue", (0, 3), (3, 3))]),
    (
        4,
        &[
            ("red", (0, 0), (0, 3)),
            ("blue", (1, 0), (3, 3)),
            ("green", (2, 1), (3, 0)),
        ],
    ),
    (
        5,
        &[
            ("red", (0, 0), (4, 0)),
            ("blue", (0, 4), (4, 4)),
            ("green", (1, 1), (3, 3)),
            ("yellow", (1, 2), (1, 3)),
        ],
    ),
    (
        5,
        &[
            ("red", (0, 0), (2, 2)),
            ("blue", (0, 4), (3, 1)),
            ("green", (4, 0), (4, 4)),
            ("yellow", (2, 0), (3, 0)),
        ],
    ),
    (
        6,
        &[
            ("red", (0, 0), (2, 3)),
            ("blue", (0, 5), (5, 5)),
            ("green", (1, 1), (4, 1)),
            ("yellow", (5, 0), (5, 4)),
            ("purple", (4, 2), (2, 4)),
        ],
    ),
    (
        6,
        &[
            ("red", (0, 0), (1, 3)),
            ("blue", (0, 5), (4, 5)),
            ("green", (1, 0), (4, 0)),
            ("yellow", (2, 1), (2, 4)),
            ("purple", (5, 0), (5, 5)),
            ("orange", (3, 1), (4, 4)),
        ],
    ),
];

/// Number of levels in the pack
pub fn level_count() -> u32 {
    LEVELS.len() as u32
}

/// Level by 1-based number
pub fn level(number: u32) -> Option<Level> {
    let index = number.checked_sub(1)? as usize;
    let (size, pairs) = LEVELS.get(index)?;

    Some(Level {
        number,
        size: *size,
        pairs: pairs
            .iter()
            .map(|(color, start, end)| DotPair {
                color: color.to_string(),
                start: Cell::new(start.0, start.1),
                end: Cell::new(end.0, end.1),
            })
            .collect(),
    })
}
