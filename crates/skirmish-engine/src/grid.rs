//! Integer coordinates and a rectangular grid.

use std::fmt;

use skirmish_codec::{CodecError, Decode, Encode, RxBuffer, TxBuffer};

/// A 2D integer vector, used for map positions and sizes.
///
/// The derived ordering is lexicographic (`x`, then `y`), which gives the
/// engine a total order on positions wherever determinism matters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IVec2 {
    pub x: i32,
    pub y: i32,
}

impl IVec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four orthogonal neighbors, in a fixed order.
    pub fn orthogonal_neighbors(self) -> [IVec2; 4] {
        [
            IVec2::new(self.x, self.y - 1),
            IVec2::new(self.x - 1, self.y),
            IVec2::new(self.x + 1, self.y),
            IVec2::new(self.x, self.y + 1),
        ]
    }

    /// Whether `other` is exactly one orthogonal step away.
    pub fn is_adjacent(self, other: IVec2) -> bool {
        (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }
}

impl fmt::Display for IVec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Encode for IVec2 {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.put_i32(self.x);
        tx.put_i32(self.y);
    }
}

impl Decode for IVec2 {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            x: rx.read_i32()?,
            y: rx.read_i32()?,
        })
    }
}

/// A dense rectangular grid of values, indexed by [`IVec2`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    size: IVec2,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Creates a grid of the given size with every cell set to `fill`.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is not positive.
    pub fn new(size: IVec2, fill: T) -> Self {
        assert!(size.x > 0 && size.y > 0, "grid dimensions must be positive");
        Self {
            size,
            cells: vec![fill; size.x as usize * size.y as usize],
        }
    }
}

impl<T> Grid<T> {
    pub fn size(&self) -> IVec2 {
        self.size
    }

    pub fn in_bounds(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.x < self.size.x && pos.y >= 0 && pos.y < self.size.y
    }

    fn index(&self, pos: IVec2) -> usize {
        pos.y as usize * self.size.x as usize + pos.x as usize
    }

    pub fn get(&self, pos: IVec2) -> Option<&T> {
        self.in_bounds(pos).then(|| &self.cells[self.index(pos)])
    }

    pub fn get_mut(&mut self, pos: IVec2) -> Option<&mut T> {
        self.in_bounds(pos)
            .then(|| self.index(pos))
            .map(|i| &mut self.cells[i])
    }

    /// Overwrites one cell.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of bounds; callers check bounds first.
    pub fn set(&mut self, pos: IVec2, value: T) {
        assert!(self.in_bounds(pos), "grid write out of bounds at {pos}");
        let i = self.index(pos);
        self.cells[i] = value;
    }

    /// All positions, row by row.
    pub fn positions(&self) -> impl Iterator<Item = IVec2> + '_ {
        let size = self.size;
        (0..size.y).flat_map(move |y| (0..size.x).map(move |x| IVec2::new(x, y)))
    }
}

// On the wire a grid is its width, its height, then the cells row by row.
impl<T: Encode> Encode for Grid<T> {
    fn encode(&self, tx: &mut TxBuffer) {
        tx.put_u32(self.size.x as u32);
        tx.put_u32(self.size.y as u32);
        for cell in &self.cells {
            cell.encode(tx);
        }
    }
}

impl<T: Decode> Decode for Grid<T> {
    fn decode(rx: &mut RxBuffer) -> Result<Self, CodecError> {
        let width = rx.read_u32()?;
        let height = rx.read_u32()?;
        if width == 0 || height == 0 || width > 1024 || height > 1024 {
            return Err(CodecError::invalid(format!(
                "implausible grid dimensions {width}x{height}"
            )));
        }
        let count = width as usize * height as usize;
        if count > rx.remaining() {
            // Every cell takes at least one byte, so this cannot decode.
            return Err(CodecError::Insufficient);
        }
        let mut cells = Vec::with_capacity(count);
        for _ in 0..count {
            cells.push(T::decode(rx)?);
        }
        Ok(Self {
            size: IVec2::new(width as i32, height as i32),
            cells,
        })
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ivec2_ordering_is_x_then_y() {
        let mut points = vec![
            IVec2::new(1, 0),
            IVec2::new(0, 5),
            IVec2::new(0, 1),
            IVec2::new(1, -1),
        ];
        points.sort();
        assert_eq!(
            points,
            vec![
                IVec2::new(0, 1),
                IVec2::new(0, 5),
                IVec2::new(1, -1),
                IVec2::new(1, 0),
            ]
        );
    }

    #[test]
    fn test_adjacency_is_orthogonal_only() {
        let p = IVec2::new(3, 3);
        assert!(p.is_adjacent(IVec2::new(3, 2)));
        assert!(p.is_adjacent(IVec2::new(2, 3)));
        assert!(!p.is_adjacent(IVec2::new(2, 2)), "diagonals are not adjacent");
        assert!(!p.is_adjacent(p), "a tile is not adjacent to itself");
        assert!(!p.is_adjacent(IVec2::new(3, 5)));
    }

    #[test]
    fn test_grid_get_out_of_bounds_is_none() {
        let grid = Grid::new(IVec2::new(2, 3), 7u32);
        assert_eq!(grid.get(IVec2::new(1, 2)), Some(&7));
        assert_eq!(grid.get(IVec2::new(2, 0)), None);
        assert_eq!(grid.get(IVec2::new(-1, 0)), None);
        assert_eq!(grid.get(IVec2::new(0, 3)), None);
    }

    #[test]
    fn test_grid_set_and_get() {
        let mut grid = Grid::new(IVec2::new(4, 4), 0i32);
        grid.set(IVec2::new(2, 1), 9);
        assert_eq!(grid.get(IVec2::new(2, 1)), Some(&9));
        assert_eq!(grid.get(IVec2::new(1, 2)), Some(&0));
    }

    #[test]
    fn test_grid_codec_round_trip() {
        let mut grid = Grid::new(IVec2::new(3, 2), 0u32);
        for (i, pos) in grid.positions().collect::<Vec<_>>().into_iter().enumerate() {
            grid.set(pos, i as u32);
        }

        let mut tx = TxBuffer::new();
        tx.write(&grid);
        let mut rx = RxBuffer::from_bytes(tx.as_bytes());
        let decoded: Grid<u32> = rx.read().expect("grid should decode");
        assert_eq!(decoded, grid);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_grid_decode_rejects_implausible_dimensions() {
        let mut tx = TxBuffer::new();
        tx.put_u32(u32::MAX);
        tx.put_u32(u32::MAX);
        let mut rx = RxBuffer::from_bytes(tx.as_bytes());
        assert!(rx.read::<Grid<u32>>().is_err());
    }
}
