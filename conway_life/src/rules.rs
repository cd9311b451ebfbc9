// rules.rs - Conway's B3/S23 transition over a whole grid

use crate::grid::Grid;
use crate::topology::Topology;

//    -1   0   1
// -1 [ ] [ ] [ ]
//  0 [ ] [X] [ ]
//  1 [ ] [ ] [ ]
#[rustfmt::skip]
pub const NEIGHBOUR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0),          (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

/// Living cells around `(x, y)` in `grid`.
pub fn live_neighbours(grid: &Grid, x: usize, y: usize, topology: Topology) -> u8 {
    let mut count = 0;
    for &(dx, dy) in &NEIGHBOUR_OFFSETS {
        let nx = topology.resolve(x, dx, grid.width());
        let ny = topology.resolve(y, dy, grid.height());
        if let (Some(nx), Some(ny)) = (nx, ny) {
            if grid[(nx, ny)] {
                count += 1;
            }
        }
    }
    count
}

pub fn next_state(alive: bool, neighbours: u8) -> bool {
    match (alive, neighbours) {
        (true, 2) | (true, 3) => true,   // Survival
        (false, 3)            => true,   // Birth
        _                     => false,  // Death or stays dead
    }
}

/// Next generation of row `y`, evaluated against `previous`.
pub fn evolve_row(previous: &Grid, y: usize, topology: Topology) -> Vec<bool> {
    (0..previous.width())
        .map(|x| next_state(previous[(x, y)], live_neighbours(previous, x, y, topology)))
        .collect()
}

/// Whole-grid transition; the result keeps the identity of `previous`.
pub fn evolve(previous: &Grid, topology: Topology) -> Grid {
    let mut next = previous.clone();
    for y in 0..previous.height() {
        next.row_mut(y).copy_from_slice(&evolve_row(previous, y, topology));
    }
    next
}
