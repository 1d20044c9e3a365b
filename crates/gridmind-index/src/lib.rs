//! Coordinate arithmetic for a toroidal grid plus the agent location index.
//!
//! Movement and interaction wrap around the edges; sight lines clamp to them instead. The
//! [`LocationIndex`] records where each agent currently sits and is kept in lockstep with the
//! occupant grid by its owner.

use serde::{Deserialize, Serialize};
use slotmap::{Key, KeyData, SlotMap};
use thiserror::Error;

/// Errors emitted by coordinate and location lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Indicates dimensions that cannot describe a grid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// The key has no recorded location (never inserted, or already removed).
    #[error("no location recorded for {key:?}")]
    MissingLocation { key: KeyData },
}

/// Reduce `value` into `[0, modulus)`, wrapping negatives around.
#[must_use]
pub fn wrap(value: i64, modulus: usize) -> usize {
    let m = modulus as i64;
    (((value % m) + m) % m) as usize
}

/// A `(row, col)` grid coordinate. Offsets elsewhere are `(dx, dy)`: `dx` moves along a
/// row (columns), `dy` along a column (rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Height and width of a grid, with the arithmetic that depends on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub height: usize,
    pub width: usize,
}

impl Dimensions {
    pub fn new(height: usize, width: usize) -> Result<Self, IndexError> {
        if height == 0 || width == 0 {
            return Err(IndexError::InvalidConfig(
                "grid height and width must be positive",
            ));
        }
        Ok(Self { height, width })
    }

    /// Number of cells.
    #[must_use]
    pub const fn area(self) -> usize {
        self.height * self.width
    }

    #[must_use]
    pub const fn contains(self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Row-major offset of `cell`.
    #[must_use]
    pub const fn offset_of(self, cell: Cell) -> usize {
        cell.row * self.width + cell.col
    }

    /// Inverse of [`Dimensions::offset_of`].
    #[must_use]
    pub const fn cell_at(self, offset: usize) -> Cell {
        Cell::new(offset / self.width, offset % self.width)
    }

    /// `cell` shifted by `dx` columns and `dy` rows, wrapping around both axes.
    #[must_use]
    pub fn wrapped(self, cell: Cell, dx: i64, dy: i64) -> Cell {
        Cell::new(
            wrap(cell.row as i64 + dy, self.height),
            wrap(cell.col as i64 + dx, self.width),
        )
    }

    /// `cell` shifted by `dx` columns and `dy` rows, pinned to the grid edges.
    #[must_use]
    pub fn clamped(self, cell: Cell, dx: i64, dy: i64) -> Cell {
        let clamp = |value: i64, extent: usize| value.clamp(0, extent as i64 - 1) as usize;
        Cell::new(
            clamp(cell.row as i64 + dy, self.height),
            clamp(cell.col as i64 + dx, self.width),
        )
    }

    /// Chebyshev distance between two cells, measured around the torus.
    #[must_use]
    pub fn chebyshev_distance(self, a: Cell, b: Cell) -> usize {
        let axis = |x: usize, y: usize, extent: usize| {
            let direct = x.abs_diff(y);
            direct.min(extent - direct)
        };
        axis(a.row, b.row, self.height).max(axis(a.col, b.col, self.width))
    }
}

/// Common behaviour exposed by neighbourhood queries.
pub trait NeighborhoodIndex {
    /// Visit every distinct cell within Chebyshev `radius` of `center`, excluding `center`.
    fn neighbors_within(&self, center: Cell, radius: usize, visitor: &mut dyn FnMut(Cell));
}

impl NeighborhoodIndex for Dimensions {
    fn neighbors_within(&self, center: Cell, radius: usize, visitor: &mut dyn FnMut(Cell)) {
        let reach = radius as i64;
        // On grids narrower than the neighbourhood the wrapped offsets repeat.
        let rows = distinct_wrapped(center.row, reach, self.height);
        let cols = distinct_wrapped(center.col, reach, self.width);
        for &row in &rows {
            for &col in &cols {
                let cell = Cell::new(row, col);
                if cell != center {
                    visitor(cell);
                }
            }
        }
    }
}

fn distinct_wrapped(origin: usize, reach: i64, extent: usize) -> Vec<usize> {
    let mut values = Vec::with_capacity((2 * reach + 1) as usize);
    for delta in -reach..=reach {
        let value = wrap(origin as i64 + delta, extent);
        if !values.contains(&value) {
            values.push(value);
        }
    }
    values
}

/// Generational map from agent key to its current cell.
#[derive(Debug, Clone)]
pub struct LocationIndex<K: Key> {
    slots: SlotMap<K, Cell>,
}

impl<K: Key> Default for LocationIndex<K> {
    fn default() -> Self {
        Self {
            slots: SlotMap::with_key(),
        }
    }
}

impl<K: Key> LocationIndex<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new entry at `cell` and return its freshly minted key.
    pub fn insert(&mut self, cell: Cell) -> K {
        self.slots.insert(cell)
    }

    pub fn get(&self, key: K) -> Result<Cell, IndexError> {
        self.slots.get(key).copied().ok_or_else(|| missing(key))
    }

    pub fn set(&mut self, key: K, cell: Cell) -> Result<(), IndexError> {
        let slot = self.slots.get_mut(key).ok_or_else(|| missing(key))?;
        *slot = cell;
        Ok(())
    }

    pub fn remove(&mut self, key: K) -> Result<Cell, IndexError> {
        self.slots.remove(key).ok_or_else(|| missing(key))
    }

    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.slots.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, Cell)> + '_ {
        self.slots.iter().map(|(key, cell)| (key, *cell))
    }
}

fn missing<K: Key>(key: K) -> IndexError {
    IndexError::MissingLocation { key: key.data() }
}

#[cfg(test)]
mod tests {
    use super::*;

    slotmap::new_key_type! {
        struct TestKey;
    }

    fn dims(height: usize, width: usize) -> Dimensions {
        Dimensions::new(height, width).expect("dims")
    }

    #[test]
    fn wrap_handles_negatives_and_overflow() {
        assert_eq!(wrap(-1, 10), 9);
        assert_eq!(wrap(-11, 10), 9);
        assert_eq!(wrap(10, 10), 0);
        assert_eq!(wrap(23, 10), 3);
    }

    #[test]
    fn wrapped_offset_crosses_both_edges() {
        let d = dims(20, 30);
        assert_eq!(d.wrapped(Cell::new(0, 0), -1, -1), Cell::new(19, 29));
        assert_eq!(d.wrapped(Cell::new(19, 29), 1, 1), Cell::new(0, 0));
    }

    #[test]
    fn clamped_offset_stops_at_edges() {
        let d = dims(10, 10);
        assert_eq!(d.clamped(Cell::new(1, 8), 6, -6), Cell::new(0, 9));
        assert_eq!(d.clamped(Cell::new(5, 5), 2, -2), Cell::new(3, 7));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            Dimensions::new(0, 4),
            Err(IndexError::InvalidConfig(_))
        ));
    }

    #[test]
    fn neighbors_cover_the_wrapped_ring() {
        let d = dims(8, 8);
        let mut seen = Vec::new();
        d.neighbors_within(Cell::new(0, 0), 1, &mut |cell| seen.push(cell));
        assert_eq!(seen.len(), 8);
        assert!(seen.contains(&Cell::new(7, 7)));
        assert!(seen.contains(&Cell::new(1, 1)));
        assert!(!seen.contains(&Cell::new(0, 0)));
        assert!(seen.iter().all(|c| d.chebyshev_distance(*c, Cell::new(0, 0)) == 1));
    }

    #[test]
    fn neighbors_do_not_repeat_on_tiny_grids() {
        let d = dims(2, 1);
        let mut seen = Vec::new();
        d.neighbors_within(Cell::new(0, 0), 1, &mut |cell| seen.push(cell));
        assert_eq!(seen, vec![Cell::new(1, 0)]);
    }

    #[test]
    fn removed_keys_report_missing_location() {
        let mut index: LocationIndex<TestKey> = LocationIndex::new();
        let key = index.insert(Cell::new(2, 3));
        assert_eq!(index.get(key), Ok(Cell::new(2, 3)));
        index.set(key, Cell::new(4, 4)).expect("set");
        assert_eq!(index.remove(key), Ok(Cell::new(4, 4)));
        assert!(matches!(
            index.get(key),
            Err(IndexError::MissingLocation { .. })
        ));
        assert!(index.set(key, Cell::new(0, 0)).is_err());
        assert!(index.is_empty());
    }
}
