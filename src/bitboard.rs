//! Fixed-size occupancy sets for square boards.
//!
//! An `N×N` board is packed into one unsigned integer `T`, one bit per cell,
//! row-major. The board model keeps one of these per stone color, so "is this
//! cell black" is a single shift-and-mask and a full recount is a popcount.

use core::fmt;
use core::ops::{BitOr, Not};
use num_traits::{PrimInt, Unsigned, Zero};

/// Errors returned by bitboard operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitBoardError {
    /// Row or column outside `[0, N)`.
    IndexOutOfBounds { row: usize, col: usize },
}

impl fmt::Display for BitBoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitBoardError::IndexOutOfBounds { row, col } => {
                write!(f, "cell ({}, {}) is off the board", row, col)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BitBoardError {}

/// A set of cells on an `N×N` board stored in the integer `T`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitBoard<T, const N: usize>
where
    T: PrimInt + Unsigned + Zero,
{
    bits: T,
}

impl<T, const N: usize> BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    const CELLS: usize = N * N;

    #[inline]
    fn mask() -> T {
        if Self::CELLS == core::mem::size_of::<T>() * 8 {
            !T::zero()
        } else {
            (T::one() << Self::CELLS) - T::one()
        }
    }

    #[inline]
    fn bit(row: usize, col: usize) -> T {
        T::one() << (row * N + col)
    }

    #[inline]
    fn check(row: usize, col: usize) -> Result<(), BitBoardError> {
        if row >= N || col >= N {
            Err(BitBoardError::IndexOutOfBounds { row, col })
        } else {
            Ok(())
        }
    }

    /// Empty set.
    #[inline]
    pub fn new() -> Self {
        BitBoard { bits: T::zero() }
    }

    /// Number of cells in the set.
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Whether (row, col) is in the set.
    #[inline]
    pub fn contains(&self, row: usize, col: usize) -> Result<bool, BitBoardError> {
        Self::check(row, col)?;
        Ok(!(self.bits & Self::bit(row, col)).is_zero())
    }

    /// Add (row, col) to the set.
    #[inline]
    pub fn insert(&mut self, row: usize, col: usize) -> Result<(), BitBoardError> {
        Self::check(row, col)?;
        self.bits = self.bits | Self::bit(row, col);
        Ok(())
    }

    /// Remove (row, col) from the set.
    #[inline]
    pub fn remove(&mut self, row: usize, col: usize) -> Result<(), BitBoardError> {
        Self::check(row, col)?;
        self.bits = self.bits & !Self::bit(row, col);
        Ok(())
    }

    /// Cells in the set in row-major order.
    pub fn cells(&self) -> Cells<T, N> {
        Cells {
            bits: self.bits,
            idx: 0,
        }
    }
}

impl<T, const N: usize> Default for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> fmt::Debug for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.cells()).finish()
    }
}

/// Iterator over the members of a [`BitBoard`].
#[derive(Clone, Copy)]
pub struct Cells<T, const N: usize> {
    bits: T,
    idx: usize,
}

impl<T, const N: usize> Iterator for Cells<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.idx < N * N {
            let idx = self.idx;
            self.idx += 1;
            if !((self.bits >> idx) & T::one()).is_zero() {
                return Some((idx / N, idx % N));
            }
        }
        None
    }
}

impl<T, const N: usize> BitOr for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        BitBoard {
            bits: self.bits | rhs.bits,
        }
    }
}

/// Complement within the board bounds.
impl<T, const N: usize> Not for BitBoard<T, N>
where
    T: PrimInt + Unsigned + Zero,
{
    type Output = Self;
    fn not(self) -> Self {
        BitBoard {
            bits: !self.bits & Self::mask(),
        }
    }
}
