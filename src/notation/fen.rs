//! # Forsyth-Edwards Notation
//!
//! FEN is the standard way of representing a chess position
//! in standard chess. It consists of six fields separated by single spaces:
//!
//! - The chessboard
//! - The active player
//! - The castling rights
//! - The en-passant square (if applicable)
//! - The half-move clock
//! - The turn number
//!
//! The chessboard is written out as eight solidus-separated (`/`) ranks,
//! starting with the 8th rank, and then in descending order. Each rank has
//! occupied squares denoted by a letter, lower case for black and upper case
//! for white, and empty squares run-length encoded as digits `1` to `8`.
//!
//! Thus the FEN string of the standard starting position in chess is:
//! ```text
//! rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1
//! ```
//!
//! The parser here works on a whole string held in memory and backs
//! [`Position`]'s `FromStr`. Positions arriving over the transport go
//! through the streaming [`FenDecoder`](crate::decode::FenDecoder) instead;
//! both must agree on every valid string.

use std::str::FromStr;

use chumsky::prelude::*;

use crate::{
    model::*,
    notation::Parsable,
};

/// The string is not a FEN string this crate understands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a FEN string: {0:?}")]
pub struct FenSyntaxError(pub String);

impl Parsable for Position {
    fn parser<'s>() -> impl Parser<'s, &'s str, Self> {
        fen_board()
            .then_ignore(just(' '))
            .then(fen_color())
            .then_ignore(just(' '))
            .then(fen_castling())
            .then_ignore(just(' '))
            .then(fen_epc_file())
            .then_ignore(just(' '))
            .then(fen_counter())
            .then_ignore(just(' '))
            .then(fen_counter().filter(|turn| *turn > 0))
            .map(
                |(((((placement, to_move), rights), en_passant), halfmove_clock), fullmove)| {
                    Position {
                        placement,
                        to_move,
                        rights,
                        en_passant,
                        halfmove_clock,
                        fullmove,
                    }
                },
            )
    }
}

impl FromStr for Position {
    type Err = FenSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s).ok_or_else(|| FenSyntaxError(s.to_owned()))
    }
}

fn fen_board<'s>() -> impl Parser<'s, &'s str, Mailbox<Option<ChessMan>>> {
    fen_rank()
        .separated_by(just('/'))
        .exactly(8)
        .collect::<Vec<_>>()
        .map(|ranks| {
            let mut b = Mailbox::new(None);
            for (r, rank) in ranks.into_iter().enumerate() {
                for (f, cm) in rank.into_iter().enumerate() {
                    let sq = Square::from_coords(
                        BoardFile::from_u8(f as u8),
                        BoardRank::from_u8(7 - r as u8),
                    );
                    b.set(sq, cm);
                }
            }
            b
        })
}

fn fen_rank<'s>() -> impl Parser<'s, &'s str, Vec<Option<ChessMan>>> {
    choice((
        fen_chessman().map(|cm| vec![Some(cm)]),
        one_of("12345678").map(|c: char| vec![None; (c as u8 - b'0') as usize]),
    ))
    .repeated()
    .at_least(1)
    .collect::<Vec<_>>()
    .map(|runs| runs.concat())
    .filter(|rank: &Vec<Option<ChessMan>>| rank.len() == 8)
}

fn fen_color<'s>() -> impl Parser<'s, &'s str, ChessColor> {
    choice((
        just('w').to(ChessColor::WHITE),
        just('b').to(ChessColor::BLACK),
    ))
}

fn fen_castling<'s>() -> impl Parser<'s, &'s str, CastlingRights> {
    choice((
        just('-').to(CastlingRights::NONE),
        one_of("KQkq")
            .repeated()
            .at_least(1)
            .at_most(4)
            .collect::<String>()
            .try_map(|letters, _| {
                use CastlingDirection::*;
                use ChessColor::*;
                let mut rights = CastlingRights::NONE;
                for c in letters.chars() {
                    let (col, dir) = match c {
                        'K' => (WHITE, KINGSIDE),
                        'Q' => (WHITE, QUEENSIDE),
                        'k' => (BLACK, KINGSIDE),
                        _ => (BLACK, QUEENSIDE),
                    };
                    if rights.get(col, dir) {
                        return Err(EmptyErr::default());
                    }
                    rights.set(col, dir, true);
                }
                Ok(rights)
            }),
    ))
}

/// Only the file of the en-passant square is kept.
fn fen_epc_file<'s>() -> impl Parser<'s, &'s str, Option<BoardFile>> {
    choice((
        just('-').to(None),
        BoardFile::parser()
            .then_ignore(BoardRank::parser())
            .map(Some),
    ))
}

fn fen_counter<'s>() -> impl Parser<'s, &'s str, u32> {
    one_of("0123456789")
        .repeated()
        .at_least(1)
        .collect::<String>()
        .try_map(|digits, _| digits.parse::<u32>().map_err(|_| EmptyErr::default()))
}

pub fn fen_chessman<'s>() -> impl Parser<'s, &'s str, ChessMan> {
    use ChessMan::*;
    choice((
        just('k').to(BLACK_KING),
        just('q').to(BLACK_QUEEN),
        just('r').to(BLACK_ROOK),
        just('b').to(BLACK_BISHOP),
        just('n').to(BLACK_KNIGHT),
        just('p').to(BLACK_PAWN),
        just('P').to(WHITE_PAWN),
        just('N').to(WHITE_KNIGHT),
        just('B').to(WHITE_BISHOP),
        just('R').to(WHITE_ROOK),
        just('Q').to(WHITE_QUEEN),
        just('K').to(WHITE_KING),
    ))
}

#[test]
fn fen_board_parsing() {
    let b = fen_board().parse("8/8/8/8/8/8/8/8").into_output().unwrap();
    assert!(b.iter().all(|(_, cm)| cm.is_none()));
    assert!(fen_board().parse("8/8/8/8/8/8/8").into_output().is_none());
    assert!(fen_board().parse("8/8/8/8/8/8/8/44p").into_output().is_none());
}

#[test]
fn parses_startpos() {
    let pos: Position = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        .parse()
        .unwrap();
    assert_eq!(pos, Position::startpos());
}

#[test]
fn agrees_with_the_streaming_decoder() {
    use crate::decode::FenDecoder;

    for fen in [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "8/5k2/8/8/5q2/3B4/8/4K3 w - - 0 29",
        "8/8/8/2k5/2pP4/8/B7/4K3 b - d3 0 3",
        "r1n1b1q1/k1b1n1r1/p1p1p1p1/p1p1p1p1/P1P1P1P1/P1P1P1P1/R1N1B1Q1/K1B1N1R1 w KQkq - 0 1",
        "r3k2r/8/8/8/4R3/8/8/4K3 b qk - 17 123",
        "8/2P2P1k/8/8/8/8/8/4K3 w - - 0 29",
    ] {
        let parsed: Position = fen.parse().unwrap();
        let streamed = FenDecoder::decode(fen.as_bytes()).unwrap();
        assert_eq!(parsed, streamed, "{fen}");
        assert_eq!(parsed.to_string().parse::<Position>().unwrap(), parsed);
    }
}

#[test]
fn rejects_repeated_castling_rights() {
    assert!("4k3/8/8/8/8/8/8/4K3 w KQK - 0 1".parse::<Position>().is_err());
    assert!("4k3/8/8/8/8/8/8/4K3 w Kx - 0 1".parse::<Position>().is_err());
}

#[test]
fn rejects_turn_zero() {
    assert!("4k3/8/8/8/8/8/8/4K3 w - - 0 0".parse::<Position>().is_err());
    assert!("4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse::<Position>().is_ok());
}
