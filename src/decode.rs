//! # Streaming position decoder
//!
//! Positions arrive as the ASCII bytes of a FEN string on a framed
//! byte-serial transport, one burst per position, with no length prefix
//! and no terminator other than the end-of-burst marker on the last byte.
//!
//! The decoder therefore never sees the whole string. It consumes one
//! byte at a time, advances a field cursor ([`FenField`]) on the separator
//! bytes, and accumulates straight into a [`Position`]. The last field,
//! the full-move number, may have any number of digits; only the
//! end-of-burst marker tells the decoder it is complete.

use tracing::trace;

use crate::{
    error::DecodeError,
    model::{
        BoardFile, BoardRank, CastlingDirection, ChessColor, ChessMan, Position, Square,
    },
};

/// The field the decoder cursor is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FenField {
    Placement,
    SideToMove,
    Castling,
    EnPassant,
    HalfmoveDigits,
    FullmoveDigits,
    Done,
}

/// Progress through the castling token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CastlingToken {
    Empty,
    Dash,
    Letters,
}

/// Progress through the en-passant token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnPassantToken {
    Empty,
    Dash,
    File(BoardFile),
    Square(BoardFile),
}

/// Incremental FEN decoder.
///
/// Feed it bytes with [`FenDecoder::push`] and close the burst with
/// [`FenDecoder::finish`], or do both with [`FenDecoder::feed`]. Once
/// an error is reported the decoder refuses further input until
/// [`FenDecoder::reset`].
#[derive(Debug, Clone)]
pub struct FenDecoder {
    field: FenField,
    offset: usize,
    pos: Position,
    /// Rank index being filled, counting down from 7.
    rank: u8,
    /// Squares of the current rank accounted for so far.
    file: u8,
    side_seen: bool,
    castling: CastlingToken,
    en_passant: EnPassantToken,
    digits: usize,
    failed: bool,
}

impl Default for FenDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FenDecoder {
    pub fn new() -> Self {
        Self {
            field: FenField::Placement,
            offset: 0,
            pos: Position::empty(),
            rank: 7,
            file: 0,
            side_seen: false,
            castling: CastlingToken::Empty,
            en_passant: EnPassantToken::Empty,
            digits: 0,
            failed: false,
        }
    }

    /// Forget everything and wait for the first byte of a new burst.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The field the next byte will be read as.
    pub fn field(&self) -> FenField {
        self.field
    }

    /// Decode a complete burst held in memory.
    pub fn decode(bytes: &[u8]) -> Result<Position, DecodeError> {
        let mut dec = Self::new();
        for b in bytes.iter().copied() {
            dec.push(b)?;
        }
        dec.finish()
    }

    /// Consume one byte, finishing the position when it carries the
    /// end-of-burst marker.
    pub fn feed(&mut self, byte: u8, eop: bool) -> Result<Option<Position>, DecodeError> {
        self.push(byte)?;
        if eop { self.finish().map(Some) } else { Ok(None) }
    }

    /// Consume one byte of the position string.
    pub fn push(&mut self, byte: u8) -> Result<(), DecodeError> {
        if self.failed {
            return Err(DecodeError::Poisoned);
        }

        let res = self.step(byte);
        if res.is_err() {
            self.failed = true;
        }
        self.offset += 1;
        res
    }

    /// The end-of-burst marker arrived: hand over the position.
    ///
    /// Only valid once at least one digit of the full-move number has
    /// been seen, and the number is not zero.
    pub fn finish(&mut self) -> Result<Position, DecodeError> {
        if self.failed {
            return Err(DecodeError::Poisoned);
        }

        if self.field != FenField::FullmoveDigits || self.digits == 0 {
            self.failed = true;
            return Err(DecodeError::Truncated {
                offset: self.offset,
                field: self.field,
            });
        }

        if self.pos.fullmove == 0 {
            self.failed = true;
            return Err(DecodeError::ZeroFullmove {
                offset: self.offset,
            });
        }

        self.advance(FenField::Done);
        Ok(std::mem::replace(&mut self.pos, Position::empty()))
    }

    fn advance(&mut self, next: FenField) {
        trace!(offset = self.offset, from = ?self.field, to = ?next, "fen field");
        self.field = next;
        self.digits = 0;
    }

    fn step(&mut self, b: u8) -> Result<(), DecodeError> {
        let offset = self.offset;
        match self.field {
            FenField::Placement => self.placement(b),
            FenField::SideToMove => self.side_to_move(b),
            FenField::Castling => self.castling(b),
            FenField::EnPassant => self.en_passant(b),
            FenField::HalfmoveDigits => {
                if b == b' ' && self.digits > 0 {
                    self.advance(FenField::FullmoveDigits);
                    self.pos.fullmove = 0;
                    Ok(())
                } else {
                    let clock = self.pos.halfmove_clock;
                    self.pos.halfmove_clock = self.digit(clock, b)?;
                    Ok(())
                }
            }
            FenField::FullmoveDigits => {
                let turn = self.pos.fullmove;
                self.pos.fullmove = self.digit(turn, b)?;
                Ok(())
            }
            FenField::Done => Err(DecodeError::Trailing { offset }),
        }
    }

    /// Accumulate one decimal digit as `acc * 10 + digit`.
    fn digit(&mut self, acc: u32, b: u8) -> Result<u32, DecodeError> {
        let offset = self.offset;
        let field = self.field;
        if !b.is_ascii_digit() {
            return Err(DecodeError::Counter {
                offset,
                field,
                byte: b,
            });
        }
        self.digits += 1;
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add((b - b'0') as u32))
            .ok_or(DecodeError::CounterOverflow { offset, field })
    }

    fn placement(&mut self, b: u8) -> Result<(), DecodeError> {
        let offset = self.offset;
        let bad_rank = |squares: u8, rank: u8| DecodeError::RankLength {
            offset,
            rank: rank + 1,
            squares,
        };

        match b {
            b'1'..=b'8' => {
                let run = b - b'0';
                if self.file + run > 8 {
                    return Err(bad_rank(self.file + run, self.rank));
                }
                self.file += run;
            }
            b'/' => {
                if self.file != 8 {
                    return Err(bad_rank(self.file, self.rank));
                }
                if self.rank == 0 {
                    return Err(DecodeError::TooManyRanks { offset });
                }
                self.rank -= 1;
                self.file = 0;
            }
            b' ' => {
                if self.file != 8 {
                    return Err(bad_rank(self.file, self.rank));
                }
                if self.rank != 0 {
                    return Err(bad_rank(0, self.rank - 1));
                }
                self.advance(FenField::SideToMove);
            }
            _ => {
                let cm = ChessMan::from_fen_byte(b)
                    .ok_or(DecodeError::UnknownPiece { offset, byte: b })?;
                if self.file >= 8 {
                    return Err(bad_rank(self.file + 1, self.rank));
                }
                let sq = Square::from_coords(
                    BoardFile::from_u8(self.file),
                    BoardRank::from_u8(self.rank),
                );
                self.pos.placement.set(sq, Some(cm));
                self.file += 1;
            }
        }
        Ok(())
    }

    fn side_to_move(&mut self, b: u8) -> Result<(), DecodeError> {
        let offset = self.offset;
        match (self.side_seen, b) {
            (false, b'w') => self.pos.to_move = ChessColor::WHITE,
            (false, b'b') => self.pos.to_move = ChessColor::BLACK,
            (true, b' ') => {
                self.advance(FenField::Castling);
                return Ok(());
            }
            _ => return Err(DecodeError::SideToMove { offset, byte: b }),
        }
        self.side_seen = true;
        Ok(())
    }

    fn castling(&mut self, b: u8) -> Result<(), DecodeError> {
        use CastlingDirection::*;
        use ChessColor::*;

        let err = DecodeError::Castling {
            offset: self.offset,
            byte: b,
        };

        let (col, dir) = match (self.castling, b) {
            (CastlingToken::Empty, b'-') => {
                self.castling = CastlingToken::Dash;
                return Ok(());
            }
            (CastlingToken::Dash | CastlingToken::Letters, b' ') => {
                self.advance(FenField::EnPassant);
                return Ok(());
            }
            (CastlingToken::Empty | CastlingToken::Letters, b'K') => (WHITE, KINGSIDE),
            (CastlingToken::Empty | CastlingToken::Letters, b'Q') => (WHITE, QUEENSIDE),
            (CastlingToken::Empty | CastlingToken::Letters, b'k') => (BLACK, KINGSIDE),
            (CastlingToken::Empty | CastlingToken::Letters, b'q') => (BLACK, QUEENSIDE),
            _ => return Err(err),
        };

        if self.pos.rights.get(col, dir) {
            return Err(err);
        }
        self.pos.rights.set(col, dir, true);
        self.castling = CastlingToken::Letters;
        Ok(())
    }

    fn en_passant(&mut self, b: u8) -> Result<(), DecodeError> {
        let err = DecodeError::EnPassant {
            offset: self.offset,
        };

        self.en_passant = match (self.en_passant, b) {
            (EnPassantToken::Empty, b'-') => EnPassantToken::Dash,
            (EnPassantToken::Empty, _) => EnPassantToken::File(BoardFile::from_ascii(b).ok_or(err)?),
            (EnPassantToken::File(f), _) => {
                BoardRank::from_ascii(b).ok_or(err)?;
                EnPassantToken::Square(f)
            }
            (EnPassantToken::Dash, b' ') => {
                self.pos.en_passant = None;
                self.advance(FenField::HalfmoveDigits);
                self.pos.halfmove_clock = 0;
                return Ok(());
            }
            (EnPassantToken::Square(f), b' ') => {
                self.pos.en_passant = Some(f);
                self.advance(FenField::HalfmoveDigits);
                self.pos.halfmove_clock = 0;
                return Ok(());
            }
            _ => return Err(err),
        };
        Ok(())
    }
}

#[test]
fn decodes_check_position() {
    let pos = FenDecoder::decode(b"8/5k2/8/8/5q2/3B4/8/4K3 w - - 0 29").unwrap();
    assert_eq!(pos.to_move, ChessColor::WHITE);
    assert_eq!(pos.rights.mask(), 0);
    assert_eq!(pos.en_passant, None);
    assert_eq!(pos.halfmove_clock, 0);
    assert_eq!(pos.fullmove, 29);
    assert_eq!(pos.man_at(Square::f7), Some(ChessMan::BLACK_KING));
    assert_eq!(pos.man_at(Square::f4), Some(ChessMan::BLACK_QUEEN));
    assert_eq!(pos.man_at(Square::d3), Some(ChessMan::WHITE_BISHOP));
    assert_eq!(pos.man_at(Square::e1), Some(ChessMan::WHITE_KING));
    assert_eq!(pos.placement.iter().filter(|(_, cm)| cm.is_some()).count(), 4);
}

#[test]
fn decodes_startpos() {
    let pos =
        FenDecoder::decode(b"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").unwrap();
    assert_eq!(pos, Position::startpos());
    assert_eq!(pos.rights.mask(), 15);
}

#[test]
fn decodes_en_passant_file() {
    let pos = FenDecoder::decode(b"8/8/8/2k5/2pP4/8/B7/4K3 b - d3 0 3").unwrap();
    assert_eq!(pos.to_move, ChessColor::BLACK);
    assert_eq!(pos.en_passant, Some(BoardFile::d_));
    assert_eq!(pos.en_passant_square(), Some(Square::d3));
    assert_eq!(pos.fullmove, 3);
}

#[test]
fn trailing_counter_has_no_length_limit() {
    let pos = FenDecoder::decode(b"4k3/8/8/8/8/8/8/4K3 b - - 12 4000000").unwrap();
    assert_eq!(pos.halfmove_clock, 12);
    assert_eq!(pos.fullmove, 4_000_000);

    assert_eq!(
        FenDecoder::decode(b"4k3/8/8/8/8/8/8/4K3 b - - 0 99999999999"),
        Err(DecodeError::CounterOverflow {
            offset: 37,
            field: FenField::FullmoveDigits
        })
    );
}

#[test]
fn byte_at_a_time_with_end_of_burst() {
    let fen = b"8/8/8/8/8/8/8/k7 w - - 7 12";
    let mut dec = FenDecoder::new();
    let mut out = None;
    for (i, b) in fen.iter().copied().enumerate() {
        assert!(out.is_none());
        out = dec.feed(b, i == fen.len() - 1).unwrap();
    }
    let pos = out.unwrap();
    assert_eq!(pos.halfmove_clock, 7);
    assert_eq!(pos.fullmove, 12);
    assert_eq!(dec.field(), FenField::Done);
    assert_eq!(dec.push(b' '), Err(DecodeError::Trailing { offset: fen.len() }));
}

#[test]
fn rejects_malformed_placement() {
    assert!(matches!(
        FenDecoder::decode(b"rnbqkbnr/ppxppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        Err(DecodeError::UnknownPiece { offset: 11, byte: b'x' })
    ));
    assert!(matches!(
        FenDecoder::decode(b"rnbqkbnr/ppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        Err(DecodeError::RankLength { rank: 7, squares: 7, .. })
    ));
    assert!(matches!(
        FenDecoder::decode(b"rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        Err(DecodeError::UnknownPiece { byte: b'9', .. })
    ));
    assert!(matches!(
        FenDecoder::decode(b"rnbqkbnr/pppppppp/7p1/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        Err(DecodeError::RankLength { rank: 6, squares: 9, .. })
    ));
    assert!(matches!(
        FenDecoder::decode(b"8/8/8/8/8/8/8 w - - 0 1"),
        Err(DecodeError::RankLength { rank: 1, squares: 0, .. })
    ));
    assert!(matches!(
        FenDecoder::decode(b"8/8/8/8/8/8/8/8/8 w - - 0 1"),
        Err(DecodeError::TooManyRanks { .. })
    ));
}

#[test]
fn rejects_malformed_fields() {
    let base = "4k3/8/8/8/8/8/8/4K3";
    for (tail, field) in [
        (" x - - 0 1", "side"),
        (" w KK - 0 1", "castling"),
        (" w -K - 0 1", "castling"),
        (" w K- - 0 1", "castling"),
        (" w  - 0 1", "castling"),
        (" w - d 0 1", "en passant"),
        (" w - i3 0 1", "en passant"),
        (" w - - a 1", "counter"),
        (" w - - 0 1 ", "counter"),
        (" w - - 0 1x", "counter"),
    ] {
        let fen = format!("{base}{tail}");
        assert!(
            FenDecoder::decode(fen.as_bytes()).is_err(),
            "{field} field accepted in {fen:?}"
        );
    }
}

#[test]
fn truncated_burst_reports_the_open_field() {
    assert_eq!(
        FenDecoder::decode(b"4k3/8/8/8/8/8/8/4K3 w - - 0"),
        Err(DecodeError::Truncated {
            offset: 27,
            field: FenField::HalfmoveDigits
        })
    );
    assert_eq!(
        FenDecoder::decode(b"4k3/8/8/8/8/8/8/4K3 w - - 0 "),
        Err(DecodeError::Truncated {
            offset: 28,
            field: FenField::FullmoveDigits
        })
    );
}

#[test]
fn fullmove_number_starts_at_one() {
    assert_eq!(
        FenDecoder::decode(b"4k3/8/8/8/8/8/8/4K3 w - - 0 0"),
        Err(DecodeError::ZeroFullmove { offset: 29 })
    );
    assert_eq!(
        FenDecoder::decode(b"4k3/8/8/8/8/8/8/4K3 w - - 0 000"),
        Err(DecodeError::ZeroFullmove { offset: 31 })
    );
    assert_eq!(
        FenDecoder::decode(b"4k3/8/8/8/8/8/8/4K3 w - - 0 01")
            .unwrap()
            .fullmove,
        1
    );
}

#[test]
fn failed_decoder_stays_failed_until_reset() {
    let mut dec = FenDecoder::new();
    assert!(dec.push(b'?').is_err());
    assert_eq!(dec.push(b'8'), Err(DecodeError::Poisoned));
    assert_eq!(dec.finish(), Err(DecodeError::Poisoned));
    dec.reset();
    assert_eq!(dec.push(b'8'), Ok(()));
}
