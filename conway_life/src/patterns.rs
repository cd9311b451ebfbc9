// patterns.rs - Well-known seed patterns, as (x, y) offsets from the top-left corner

use crate::grid::Grid;

pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

pub const BLOCK: Pattern = Pattern {
    name: "Block",
    cells: &[(0, 0), (1, 0), (0, 1), (1, 1)],
};

pub const BLINKER: Pattern = Pattern {
    name: "Blinker",
    cells: &[(0, 0), (1, 0), (2, 0)],
};

pub const GLIDER: Pattern = Pattern {
    name: "Glider",
    cells: &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
};

pub const PATTERNS: &[Pattern] = &[
    BLOCK,
    BLINKER,
    GLIDER,
    Pattern {
        name: "Toad",
        cells: &[(1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(0, 0), (1, 0), (0, 1), (1, 1), (2, 2), (3, 2), (2, 3), (3, 3)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Top section
            (2, 0), (3, 0), (4, 0), (8, 0), (9, 0), (10, 0),
            (0, 2), (5, 2), (7, 2), (12, 2),
            (0, 3), (5, 3), (7, 3), (12, 3),
            (0, 4), (5, 4), (7, 4), (12, 4),
            (2, 5), (3, 5), (4, 5), (8, 5), (9, 5), (10, 5),
            // Bottom section (mirrored)
            (2, 7), (3, 7), (4, 7), (8, 7), (9, 7), (10, 7),
            (0, 8), (5, 8), (7, 8), (12, 8),
            (0, 9), (5, 9), (7, 9), (12, 9),
            (0, 10), (5, 10), (7, 10), (12, 10),
            (2, 12), (3, 12), (4, 12), (8, 12), (9, 12), (10, 12),
        ],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)],
    },
    Pattern {
        name: "Gosper Glider Gun",
        cells: &[
            (0, 4), (1, 4), (0, 5), (1, 5),
            (10, 4), (10, 5), (10, 6), (11, 3), (11, 7), (12, 2), (12, 8),
            (13, 2), (13, 8), (14, 5), (15, 3), (15, 7), (16, 4), (16, 5),
            (16, 6), (17, 5), (20, 2), (20, 3), (20, 4), (21, 2), (21, 3),
            (21, 4), (22, 1), (22, 5), (24, 0), (24, 1), (24, 5), (24, 6),
            (34, 2), (34, 3), (35, 2), (35, 3),
        ],
    },
];

/// Case-insensitive lookup by name.
pub fn find(name: &str) -> Option<&'static Pattern> {
    PATTERNS.iter().find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

impl Pattern {
    /// Bounding box as (width, height).
    pub fn size(&self) -> (usize, usize) {
        self.cells
            .iter()
            .fold((0, 0), |(w, h), &(x, y)| (w.max(x + 1), h.max(y + 1)))
    }

    /// Clear `grid`, then stamp the pattern at `origin`.
    pub fn apply(&self, grid: &mut Grid, origin: (usize, usize)) -> usize {
        grid.fill(false);
        self.stamp(grid, origin)
    }

    /// Stamp the pattern at `origin` on top of what is there.
    ///
    /// Cells that fall outside the grid are skipped; returns how many landed.
    pub fn stamp(&self, grid: &mut Grid, (ox, oy): (usize, usize)) -> usize {
        let mut placed = 0;
        for &(x, y) in self.cells {
            let (x, y) = (ox + x, oy + y);
            if grid.contains(x, y) {
                grid[(x, y)] = true;
                placed += 1;
            }
        }
        placed
    }

    /// Stamp the pattern in the middle of `grid`.
    pub fn centre(&self, grid: &mut Grid) -> usize {
        let (w, h) = self.size();
        let origin = (grid.width().saturating_sub(w) / 2, grid.height().saturating_sub(h) / 2);
        self.apply(grid, origin)
    }
}
