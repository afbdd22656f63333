use std::fmt::{self, Display, Write};

use crate::model::{
    BoardFile, BoardRank, CastlingDirection, CastlingRights, ChessColor, ChessMan, Mailbox,
    Square,
};

/// A decoded chess position.
///
/// Created fresh by every decode and treated as immutable for the
/// duration of a move generation pass. Nothing in here is validated
/// beyond what decoding needs, in particular a position may hold any
/// number of kings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Piece placement, in grid order.
    pub placement: Mailbox<Option<ChessMan>>,
    pub to_move: ChessColor,
    pub rights: CastlingRights,
    /// File of the en-passant target square, if any. The rank follows from
    /// the side to move, see [`BoardRank::en_passant_target`].
    pub en_passant: Option<BoardFile>,
    /// Number of half-moves elapsed since last capture or pawn push.
    pub halfmove_clock: u32,
    /// Turn counter, starts at 1 and increments after black has moved.
    pub fullmove: u32,
}

impl Position {
    /// An empty board with white to move and nothing else set.
    pub fn empty() -> Self {
        Self {
            placement: Mailbox::new(None),
            to_move: ChessColor::WHITE,
            rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove: 1,
        }
    }

    /// The standard starting position.
    pub fn startpos() -> Self {
        use crate::model::ChessPiece::*;
        let mut res = Self::empty();
        let back = [ROOK, KNIGHT, BISHOP, QUEEN, KING, BISHOP, KNIGHT, ROOK];
        for (f, ech) in back.into_iter().enumerate() {
            let f = BoardFile::from_u8(f as u8);
            res.placement.set(
                Square::from_coords(f, BoardRank::_1),
                Some(ChessMan::new(ChessColor::WHITE, ech)),
            );
            res.placement.set(
                Square::from_coords(f, BoardRank::_2),
                Some(ChessMan::new(ChessColor::WHITE, PAWN)),
            );
            res.placement.set(
                Square::from_coords(f, BoardRank::_7),
                Some(ChessMan::new(ChessColor::BLACK, PAWN)),
            );
            res.placement.set(
                Square::from_coords(f, BoardRank::_8),
                Some(ChessMan::new(ChessColor::BLACK, ech)),
            );
        }
        res.rights = CastlingRights::ALL;
        res
    }

    #[inline]
    pub fn man_at(&self, sq: Square) -> Option<ChessMan> {
        self.placement[sq]
    }

    /// The en-passant target square, if any.
    pub fn en_passant_square(&self) -> Option<Square> {
        self.en_passant
            .map(|f| Square::from_coords(f, BoardRank::en_passant_target(self.to_move)))
    }
}

/// Writes the position back out in Forsyth-Edwards Notation.
impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in (0..8u8).rev() {
            let mut run = 0;
            for file in 0..8u8 {
                let sq = Square::from_coords(BoardFile::from_u8(file), BoardRank::from_u8(r));
                match self.placement[sq] {
                    Some(cm) => {
                        if run > 0 {
                            write!(f, "{run}")?;
                            run = 0;
                        }
                        f.write_char(cm.fen_char())?;
                    }
                    None => run += 1,
                }
            }
            if run > 0 {
                write!(f, "{run}")?;
            }
            if r > 0 {
                f.write_char('/')?;
            }
        }

        f.write_char(' ')?;
        f.write_char(match self.to_move {
            ChessColor::WHITE => 'w',
            ChessColor::BLACK => 'b',
        })?;

        f.write_char(' ')?;
        if self.rights == CastlingRights::NONE {
            f.write_char('-')?;
        } else {
            use CastlingDirection::*;
            use ChessColor::*;
            for (col, dir, c) in [
                (WHITE, KINGSIDE, 'K'),
                (WHITE, QUEENSIDE, 'Q'),
                (BLACK, KINGSIDE, 'k'),
                (BLACK, QUEENSIDE, 'q'),
            ] {
                if self.rights.get(col, dir) {
                    f.write_char(c)?;
                }
            }
        }

        f.write_char(' ')?;
        match self.en_passant_square() {
            Some(sq) => write!(f, "{sq}")?,
            None => f.write_char('-')?,
        }

        write!(f, " {} {}", self.halfmove_clock, self.fullmove)
    }
}

#[test]
fn startpos_writes_standard_fen() {
    assert_eq!(
        Position::startpos().to_string(),
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    );
}

#[test]
fn en_passant_rank_follows_side_to_move() {
    let mut pos = Position::empty();
    pos.en_passant = Some(BoardFile::d_);
    assert_eq!(pos.en_passant_square(), Some(Square::d6));
    pos.to_move = ChessColor::BLACK;
    assert_eq!(pos.en_passant_square(), Some(Square::d3));
}
