//! What each kind of piece sees from a square.
//!
//! Vision is colorless and ignores who owns the occupants: a ray
//! includes the first occupied square it meets and stops there. The
//! move generator filters friendly targets out, the attack test looks
//! for the right enemy on the seen squares.

use std::sync::LazyLock;

use strum::VariantArray;

use crate::model::{ChessMan, ChessPiece, CompassRose, Mailbox, Square};

/// Knight jumps as (file, rank) deltas, in generation order.
pub const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

static KNIGHT_STEPS: LazyLock<Mailbox<Vec<Square>>> =
    LazyLock::new(|| step_table(KNIGHT_JUMPS.iter().copied()));

static KING_STEPS: LazyLock<Mailbox<Vec<Square>>> =
    LazyLock::new(|| step_table(CompassRose::VARIANTS.iter().map(|d| d.delta())));

fn step_table(deltas: impl Iterator<Item = (i8, i8)> + Clone) -> Mailbox<Vec<Square>> {
    Mailbox(std::array::from_fn(|ix| {
        let sq = Square::from_u8(ix as u8);
        deltas
            .clone()
            .filter_map(|(df, dr)| sq.offset(df, dr))
            .collect()
    }))
}

/// Squares seen by one kind of piece.
pub trait PieceVision {
    const ID: ChessPiece;

    /// Append the seen squares to `buffer` in generation order.
    fn see(grid: &Mailbox<Option<ChessMan>>, from: Square, buffer: &mut Vec<Square>);
}

pub struct Knight;

impl PieceVision for Knight {
    const ID: ChessPiece = ChessPiece::KNIGHT;

    #[inline]
    fn see(_: &Mailbox<Option<ChessMan>>, from: Square, buffer: &mut Vec<Square>) {
        buffer.extend_from_slice(&KNIGHT_STEPS[from]);
    }
}

pub struct King;

impl PieceVision for King {
    const ID: ChessPiece = ChessPiece::KING;

    #[inline]
    fn see(_: &Mailbox<Option<ChessMan>>, from: Square, buffer: &mut Vec<Square>) {
        buffer.extend_from_slice(&KING_STEPS[from]);
    }
}

/// Ray walker over the orthogonals, the diagonals or both.
///
/// Rays are walked in [`CompassRose`] order, each near to far.
pub struct Slider<const ORTHO: bool, const DIAG: bool>;

pub type Rook = Slider<true, false>;
pub type Bishop = Slider<false, true>;
pub type Queen = Slider<true, true>;

impl<const ORTHO: bool, const DIAG: bool> Slider<ORTHO, DIAG> {
    #[inline]
    fn walks(dir: CompassRose) -> bool {
        if CompassRose::ORTHOGONAL.contains(&dir) {
            ORTHO
        } else {
            DIAG
        }
    }
}

impl<const ORTHO: bool, const DIAG: bool> PieceVision for Slider<ORTHO, DIAG> {
    const ID: ChessPiece = match (ORTHO, DIAG) {
        (true, false) => ChessPiece::ROOK,
        (false, true) => ChessPiece::BISHOP,
        _ => ChessPiece::QUEEN,
    };

    fn see(grid: &Mailbox<Option<ChessMan>>, from: Square, buffer: &mut Vec<Square>) {
        for dir in CompassRose::VARIANTS.iter().copied().filter(|d| Self::walks(*d)) {
            let (df, dr) = dir.delta();
            let mut at = from;
            while let Some(next) = at.offset(df, dr) {
                buffer.push(next);
                if grid[next].is_some() {
                    break;
                }
                at = next;
            }
        }
    }
}

#[cfg(test)]
fn seen<V: PieceVision>(grid: &Mailbox<Option<ChessMan>>, from: Square) -> Vec<Square> {
    let mut res = Vec::new();
    V::see(grid, from, &mut res);
    res
}

#[test]
fn knight_in_the_corner() {
    use Square::*;
    let grid = Mailbox::new(None);
    assert_eq!(seen::<Knight>(&grid, a1), vec![b3, c2]);
    assert_eq!(seen::<Knight>(&grid, e4).len(), 8);
}

#[test]
fn king_steps_in_compass_order() {
    use Square::*;
    let grid = Mailbox::new(None);
    assert_eq!(seen::<King>(&grid, e1), vec![e2, f2, f1, d1, d2]);
    assert_eq!(seen::<King>(&grid, h8), vec![h7, g7, g8]);
}

#[test]
fn rays_stop_at_first_occupant() {
    use Square::*;
    let mut grid = Mailbox::new(None);
    grid.set(d6, Some(ChessMan::BLACK_PAWN));
    grid.set(f4, Some(ChessMan::WHITE_PAWN));
    assert_eq!(
        seen::<Rook>(&grid, d4),
        vec![d5, d6, e4, f4, d3, d2, d1, c4, b4, a4]
    );
    assert_eq!(seen::<Bishop>(&grid, a1), vec![b2, c3, d4, e5, f6, g7, h8]);
    assert_eq!(seen::<Queen>(&grid, a1).len(), 21);
    assert_eq!(<Queen as PieceVision>::ID, ChessPiece::QUEEN);
}
