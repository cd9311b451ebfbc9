// grid.rs - Grid types for Conway's Game of Life

use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LifeError;

/// Identity of a logical grid.
///
/// A fresh id is minted for every brand-new grid. Clones, steps and edits keep
/// the id, so a renderer can tell "same field, cells changed" from "new field".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridId(Uuid);

impl GridId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GridId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GridId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Rectangular field of cells, stored row-major.
///
/// Indexing is `(x, y)` with `x` in `0..width` and `y` in `0..height`.
/// Out-of-range access panics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawGrid<T>", bound(deserialize = "T: Deserialize<'de>"))]
pub struct Grid<T = bool> {
    id: GridId,
    width: usize,
    height: usize,
    cells: Vec<T>,
}

// Unchecked wire form, validated on the way in.
#[derive(Deserialize)]
struct RawGrid<T> {
    id: GridId,
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> TryFrom<RawGrid<T>> for Grid<T> {
    type Error = LifeError;

    fn try_from(raw: RawGrid<T>) -> Result<Self, Self::Error> {
        Grid::from_cells(raw.width, raw.height, raw.id, raw.cells)
    }
}

impl<T: Clone + Default> Grid<T> {
    /// New grid with every cell at `T::default()` and a fresh identity.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_id(width, height, GridId::new())
    }

    pub fn with_id(width: usize, height: usize, id: GridId) -> Self {
        Self {
            id,
            width,
            height,
            cells: vec![T::default(); width * height],
        }
    }

    pub fn fill(&mut self, value: T) {
        self.cells.fill(value);
    }
}

impl<T> Grid<T> {
    /// Rebuild a grid from row-major cells, as handed back by a serializer.
    pub fn from_cells(
        width: usize,
        height: usize,
        id: GridId,
        cells: Vec<T>,
    ) -> Result<Self, LifeError> {
        if width.checked_mul(height) != Some(cells.len()) {
            return Err(LifeError::InvalidGrid { width, height, cells: cells.len() });
        }
        Ok(Self { id, width, height, cells })
    }

    pub fn id(&self) -> GridId {
        self.id
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// True when the grid has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if self.contains(x, y) { self.cells.get(y * self.width + x) } else { None }
    }

    #[track_caller]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self[(x, y)] = value;
    }

    /// Row-major traversal, one slice per row. Can be called again to restart.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[T]> + '_ {
        // chunks() rejects a zero chunk size; a zero-width grid has no cells anyway
        self.cells.chunks(self.width.max(1))
    }

    /// Overwrite every cell with successive values from `f`, row by row.
    pub fn fill_with(&mut self, f: impl FnMut() -> T) {
        self.cells.fill_with(f);
    }

    #[track_caller]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row {y} outside {}x{} grid", self.width, self.height);
        let start = y * self.width;
        &mut self.cells[start..start + self.width]
    }

    /// Every cell with its `(x, y)` coordinate, row by row.
    pub fn cells(&self) -> impl Iterator<Item = ((usize, usize), &T)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i % width, i / width), cell))
    }

    #[track_caller]
    fn offset(&self, x: usize, y: usize) -> usize {
        assert!(
            self.contains(x, y),
            "cell ({x}, {y}) outside {}x{} grid",
            self.width,
            self.height
        );
        y * self.width + x
    }
}

impl Grid<bool> {
    /// Number of living cells.
    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }
}

impl<T> Index<(usize, usize)> for Grid<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, (x, y): (usize, usize)) -> &T {
        &self.cells[self.offset(x, y)]
    }
}

impl<T> IndexMut<(usize, usize)> for Grid<T> {
    #[track_caller]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut T {
        let offset = self.offset(x, y);
        &mut self.cells[offset]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_grid_is_dead() {
        let grid: Grid = Grid::new(7, 4);
        assert_eq!(grid.dimensions(), (7, 4));
        assert_eq!(grid.population(), 0);
        assert!(grid.cells().all(|(_, &alive)| !alive));
    }

    #[test]
    fn fresh_grids_get_distinct_ids() {
        let a: Grid = Grid::new(3, 3);
        let b: Grid = Grid::new(3, 3);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn clone_keeps_id_and_is_isolated() {
        let mut original: Grid = Grid::new(5, 5);
        original[(2, 3)] = true;

        let mut copy = original.clone();
        assert_eq!(copy.id(), original.id());
        assert_eq!(copy, original);

        copy[(2, 3)] = false;
        copy[(0, 0)] = true;
        assert!(original[(2, 3)]);
        assert!(!original[(0, 0)]);
    }

    #[test]
    fn set_and_get_use_x_then_y() {
        let mut grid: Grid<u8> = Grid::new(4, 2);
        grid.set(3, 1, 9);
        assert_eq!(grid.get(3, 1), Some(&9));
        assert_eq!(grid.get(1, 3), None);
        assert_eq!(grid.rows().nth(1).unwrap(), &[0, 0, 0, 9]);
    }

    #[test]
    #[should_panic(expected = "outside 4x2 grid")]
    fn index_out_of_range_panics() {
        let grid: Grid = Grid::new(4, 2);
        let _alive = grid[(4, 0)];
    }

    #[test]
    #[should_panic]
    fn set_out_of_range_panics() {
        let mut grid: Grid = Grid::new(2, 2);
        grid.set(0, 2, true);
    }

    #[test]
    fn rows_are_restartable() {
        let mut grid: Grid = Grid::new(3, 2);
        grid[(1, 0)] = true;

        let first: Vec<Vec<bool>> = grid.rows().map(<[bool]>::to_vec).collect();
        let second: Vec<Vec<bool>> = grid.rows().map(<[bool]>::to_vec).collect();
        assert_eq!(first, vec![vec![false, true, false], vec![false; 3]]);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_sized_grids() {
        let narrow: Grid = Grid::new(0, 5);
        let flat: Grid = Grid::new(5, 0);
        assert!(narrow.is_empty());
        assert!(flat.is_empty());
        assert_eq!(narrow.rows().count(), 0);
        assert_eq!(flat.rows().count(), 0);
        assert_eq!(narrow.cells().count(), 0);
    }

    #[test]
    fn from_cells_checks_length() {
        let id = GridId::new();
        assert!(Grid::from_cells(2, 2, id, vec![false; 4]).is_ok());
        assert!(matches!(
            Grid::from_cells(2, 2, id, vec![false; 3]),
            Err(LifeError::InvalidGrid { width: 2, height: 2, cells: 3 })
        ));
    }
}
