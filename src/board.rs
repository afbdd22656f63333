//! # The binary board
//!
//! The board encoder turns a [`Position`] into the fixed 64-byte
//! [`BinaryBoard`] plus the scalar [`BoardMeta`] that travels beside it.
//!
//! Cell codes: 0 is an empty square, a black man is its type rank
//! (king 1, queen 2, rook 3, bishop 4, knight 5, pawn 6) and a white
//! man is the type rank plus 8.
//!
//! ```text
//!  K Q R B N P
//!  1 2 3 4 5 6   black (lower case)
//!  9 A B C D E   white (upper case)
//! ```
//!
//! The cells are stored in wire order, rank 8 first, files a to h within
//! a rank, which is the reading order of the FEN placement. The move
//! generator wants grid order instead, see [`BinaryBoard::to_grid`].

use crate::{
    error::BoardCodeError,
    model::{BoardFile, CastlingRights, ChessColor, ChessMan, ChessPiece, Mailbox, Position, Square},
};

/// Code offset of white men.
pub const WHITE_BIT: u8 = 8;

/// The 64 cell codes of a chessboard in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct BinaryBoard(pub [u8; 64]);

impl BinaryBoard {
    /// Encode a placement given in grid order.
    pub fn encode(placement: &Mailbox<Option<ChessMan>>) -> Self {
        let mut res = [0u8; 64];
        for (sq, cm) in placement.iter() {
            res[sq.wire_ix()] = cell_code(*cm);
        }
        Self(res)
    }

    /// Cell code at a grid square.
    #[inline]
    pub fn at(&self, sq: Square) -> u8 {
        self.0[sq.wire_ix()]
    }

    /// Remap to grid order and decode every cell.
    pub fn to_grid(&self) -> Result<Mailbox<Option<ChessMan>>, BoardCodeError> {
        let mut res = Mailbox::new(None);
        for (ix, code) in self.0.iter().copied().enumerate() {
            let cm = cell_man(code).ok_or(BoardCodeError { ix, code })?;
            res.set(Square::from_wire(ix), cm);
        }
        Ok(res)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Cell code of a square's content.
#[inline]
pub fn cell_code(cm: Option<ChessMan>) -> u8 {
    match cm {
        None => 0,
        Some(cm) => match cm.col() {
            ChessColor::WHITE => cm.ech() as u8 | WHITE_BIT,
            ChessColor::BLACK => cm.ech() as u8,
        },
    }
}

/// Inverse of [`cell_code`]; `None` for the codes no chessman uses.
#[inline]
pub fn cell_man(code: u8) -> Option<Option<ChessMan>> {
    if code == 0 {
        return Some(None);
    }
    let col = if code & WHITE_BIT != 0 {
        ChessColor::WHITE
    } else {
        ChessColor::BLACK
    };
    if code & !(WHITE_BIT | 0x7) != 0 {
        return None;
    }
    let ech = ChessPiece::from_repr(code & 0x7)?;
    Some(Some(ChessMan::new(col, ech)))
}

/// Scalar metadata valid alongside the board burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoardMeta {
    pub halfmove_clock: u32,
    pub fullmove: u32,
    /// White to play.
    pub wtp: bool,
    /// Castling rights mask, see [`CastlingRights::mask`].
    pub castle: u8,
    /// 0 for no en-passant, 1 to 8 for files a to h.
    pub ep: u8,
}

impl BoardMeta {
    pub fn to_move(&self) -> ChessColor {
        if self.wtp {
            ChessColor::WHITE
        } else {
            ChessColor::BLACK
        }
    }

    pub fn rights(&self) -> CastlingRights {
        CastlingRights::from_mask(self.castle)
    }

    pub fn en_passant(&self) -> Option<BoardFile> {
        match self.ep {
            1..=8 => Some(BoardFile::from_u8(self.ep - 1)),
            _ => None,
        }
    }
}

/// The board encoder: placement to wire board, the rest to metadata.
pub fn encode(pos: &Position) -> (BinaryBoard, BoardMeta) {
    let meta = BoardMeta {
        halfmove_clock: pos.halfmove_clock,
        fullmove: pos.fullmove,
        wtp: pos.to_move.is_white(),
        castle: pos.rights.mask(),
        ep: pos.en_passant.map_or(0, |f| f as u8 + 1),
    };
    (BinaryBoard::encode(&pos.placement), meta)
}

/// Rebuild a position from a wire board and its metadata.
pub fn decode(board: &BinaryBoard, meta: &BoardMeta) -> Result<Position, BoardCodeError> {
    Ok(Position {
        placement: board.to_grid()?,
        to_move: meta.to_move(),
        rights: meta.rights(),
        en_passant: meta.en_passant(),
        halfmove_clock: meta.halfmove_clock,
        fullmove: meta.fullmove,
    })
}

#[cfg(test)]
fn wire(rows: [[u8; 8]; 8]) -> [u8; 64] {
    let mut res = [0; 64];
    for (r, row) in rows.iter().enumerate() {
        res[r * 8..r * 8 + 8].copy_from_slice(row);
    }
    res
}

#[test]
fn encodes_check_position() {
    let pos = crate::decode::FenDecoder::decode(b"8/5k2/8/8/5q2/3B4/8/4K3 w - - 0 29").unwrap();
    let (board, meta) = encode(&pos);
    assert_eq!(
        board.0,
        wire([
            [0, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 1, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 2, 0, 0],
            [0, 0, 0, 0xC, 0, 0, 0, 0],
            [0, 0, 0, 0, 0, 0, 0, 0],
            [0, 0, 0, 0, 9, 0, 0, 0],
        ])
    );
    assert_eq!(
        meta,
        BoardMeta {
            halfmove_clock: 0,
            fullmove: 29,
            wtp: true,
            castle: 0,
            ep: 0
        }
    );
}

#[test]
fn encodes_startpos() {
    let (board, meta) = encode(&Position::startpos());
    assert_eq!(
        board.0,
        wire([
            [3, 5, 4, 2, 1, 4, 5, 3],
            [6, 6, 6, 6, 6, 6, 6, 6],
            [0; 8],
            [0; 8],
            [0; 8],
            [0; 8],
            [0xE; 8],
            [0xB, 0xD, 0xC, 0xA, 0x9, 0xC, 0xD, 0xB],
        ])
    );
    assert_eq!(meta.castle, 15);
    assert_eq!(meta.fullmove, 1);
    assert!(meta.wtp);
}

#[test]
fn encodes_densest_position() {
    let pos = crate::decode::FenDecoder::decode(
        b"r1n1b1q1/k1b1n1r1/p1p1p1p1/p1p1p1p1/P1P1P1P1/P1P1P1P1/R1N1B1Q1/K1B1N1R1 w KQkq - 0 1",
    )
    .unwrap();
    let (board, _) = encode(&pos);
    assert_eq!(
        board.0,
        wire([
            [3, 0, 5, 0, 4, 0, 2, 0],
            [1, 0, 4, 0, 5, 0, 3, 0],
            [6, 0, 6, 0, 6, 0, 6, 0],
            [6, 0, 6, 0, 6, 0, 6, 0],
            [0xE, 0, 0xE, 0, 0xE, 0, 0xE, 0],
            [0xE, 0, 0xE, 0, 0xE, 0, 0xE, 0],
            [0xB, 0, 0xD, 0, 0xC, 0, 0xA, 0],
            [0x9, 0, 0xC, 0, 0xD, 0, 0xB, 0],
        ])
    );
}

#[test]
fn en_passant_code_is_file_plus_one() {
    let pos = crate::decode::FenDecoder::decode(b"8/8/8/2k5/2pP4/8/B7/4K3 b - d3 0 3").unwrap();
    let (_, meta) = encode(&pos);
    assert_eq!(meta.ep, 4);
    assert!(!meta.wtp);
    assert_eq!(meta.en_passant(), Some(BoardFile::d_));
}

#[test]
fn grid_remap_reads_back_exactly() {
    let pos = Position::startpos();
    let (board, meta) = encode(&pos);
    assert_eq!(board.at(Square::e1), 9);
    assert_eq!(board.at(Square::d8), 2);
    assert_eq!(decode(&board, &meta).unwrap(), pos);
}

#[test]
fn rejects_unused_cell_codes() {
    for code in [7u8, 8, 15, 16, 0xFF] {
        let mut board = BinaryBoard([0; 64]);
        board.0[10] = code;
        assert_eq!(board.to_grid(), Err(BoardCodeError { ix: 10, code }));
    }
}
