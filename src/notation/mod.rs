//! # Textual notation
//!
//! Coordinate notation for moves (`e2e4`, `c7c8q`) and the whole-string
//! Forsyth-Edwards parser in [`fen`]. Parsers are written with `chumsky`
//! and exposed through the [`Parsable`] trait.

pub mod fen;

use std::fmt::Display;

use chumsky::prelude::*;
use strum::VariantNames;

use crate::{
    model::{BoardFile, BoardRank, PawnPromotion, Square},
    movegen::CandidateMove,
};

/// Types with a `chumsky` parser over string input.
pub trait Parsable: Sized {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self>;

    /// Parse the entire string, or nothing.
    fn parse_str(s: &str) -> Option<Self> {
        Self::parser().then_ignore(end()).parse(s).into_output()
    }
}

impl Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(Square::VARIANTS[self.ix()])
    }
}

impl Parsable for BoardFile {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        one_of("abcdefgh").map(|c: char| Self::from_u8(c as u8 - b'a'))
    }
}

impl Parsable for BoardRank {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        one_of("12345678").map(|c: char| Self::from_u8(c as u8 - b'1'))
    }
}

impl Parsable for Square {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        BoardFile::parser()
            .then(BoardRank::parser())
            .map(|(f, r)| Self::from_coords(f, r))
    }
}

impl Parsable for PawnPromotion {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        use PawnPromotion::*;
        choice((
            just('q').to(QUEEN),
            just('r').to(ROOK),
            just('b').to(BISHOP),
            just('n').to(KNIGHT),
        ))
    }
}

/// A move as origin, destination and promotion choice, the way
/// engines write them over UCI.
///
/// Castling is the king's own two-square move, `e1g1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoordNotation {
    pub from: Square,
    pub to: Square,
    pub prom: Option<PawnPromotion>,
}

impl CoordNotation {
    pub fn new(from: Square, to: Square, prom: Option<PawnPromotion>) -> Self {
        Self { from, to, prom }
    }
}

impl From<CandidateMove> for CoordNotation {
    fn from(value: CandidateMove) -> Self {
        Self {
            from: value.from,
            to: value.to,
            prom: value.promotion.piece(),
        }
    }
}

impl Display for CoordNotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.prom {
            write!(f, "{}", p.suffix())?;
        }
        Ok(())
    }
}

impl Parsable for CoordNotation {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        Square::parser()
            .then(Square::parser())
            .then(PawnPromotion::parser().or_not())
            .map(|((from, to), prom)| Self::new(from, to, prom))
    }
}

#[test]
fn test_square_parser() {
    use strum::IntoEnumIterator;

    for sq in Square::iter() {
        let sqs = sq.to_string();
        assert_eq!(Square::parse_str(&sqs), Some(sq), "Unable to parse {sq}");
    }
    assert_eq!(Square::parse_str("i1"), None);
    assert_eq!(Square::parse_str("a9"), None);
}

#[test]
fn coordinate_notation_roundtrips() {
    for s in ["e2e4", "e1g1", "c7c8q", "a2a1n", "h7g8r"] {
        let mv = CoordNotation::parse_str(s).unwrap();
        assert_eq!(mv.to_string(), s);
    }
    assert_eq!(
        CoordNotation::parse_str("d7d8b"),
        Some(CoordNotation::new(
            Square::d7,
            Square::d8,
            Some(PawnPromotion::BISHOP)
        ))
    );
    assert_eq!(CoordNotation::parse_str("e2e4k"), None);
    assert_eq!(CoordNotation::parse_str("e2"), None);
}
