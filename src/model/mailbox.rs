//! # The 'mailbox' representation of a chessboard.
//!
//! This is the simple and most obvious representation,
//! using a separate value in an array for each square, a so-called
//! 'board'-centric representation.
//!
//! This module in particular is a generalized version allowing any
//! values, not just `Option<ChessMan>` to fill the squares. It is
//! always indexed in grid order, see [`Square`].
use std::ops::{Index, IndexMut};

use crate::model::{ChessColor, ChessMan, Square};

#[derive(Debug, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct Mailbox<T>(pub [T; 64]);

impl<T: Copy> Mailbox<T> {
    /// A board with every square holding the same value.
    pub fn new(it: T) -> Self {
        Self([it; 64])
    }
}

impl<T> Mailbox<T> {
    /// Write to a square
    pub fn set(&mut self, sq: Square, it: T) {
        self.0[sq.ix()] = it
    }

    /// Iterate squares in grid order along with their contents.
    pub fn iter(&self) -> impl Iterator<Item = (Square, &T)> {
        self.0
            .iter()
            .enumerate()
            .map(|(ix, it)| (Square::from_u8(ix as u8), it))
    }
}

impl<T> Index<Square> for Mailbox<T> {
    type Output = T;

    #[inline]
    fn index(&self, sq: Square) -> &T {
        &self.0[sq.ix()]
    }
}

impl<T> IndexMut<Square> for Mailbox<T> {
    #[inline]
    fn index_mut(&mut self, sq: Square) -> &mut T {
        &mut self.0[sq.ix()]
    }
}

impl Mailbox<Option<ChessMan>> {
    /// Occupied squares of one color, in grid order.
    pub fn men_of(&self, col: ChessColor) -> impl Iterator<Item = (Square, ChessMan)> + '_ {
        self.iter().filter_map(move |(sq, cm)| match cm {
            Some(cm) if cm.col() == col => Some((sq, *cm)),
            _ => None,
        })
    }
}
