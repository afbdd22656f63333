//! # Arbitration and serialization
//!
//! The arbiter walks the side to move's piece list and drains each cell's
//! candidate moves in turn, packing them into 18-bit move records.
//!
//! ## Piece slots
//!
//! ```text
//!  9   8..6   5..3   2..0
//!  v   piece  rank   file
//! ```
//!
//! ## Move records
//!
//! ```text
//!  17..15  14..12  11..9   8..6      5..3   2..0
//!  piece   from f  from r  promotion to f   to r
//! ```
//!
//! A record travels as three bytes, most significant first, with the top
//! six bits zero.

use tracing::{debug, warn};

use crate::{
    error::CapacityError,
    model::{BoardFile, BoardRank, ChessColor, ChessMan, ChessPiece, Mailbox, Square},
    movegen::{CandidateMove, Promotion},
};

/// The budget of a bounded piece list.
pub const SLOT_BUDGET: usize = 16;

/// A 10-bit piece list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct PieceSlot(u16);

impl PieceSlot {
    pub const VOID: Self = Self(0);
    const VALID: u16 = 1 << 9;

    pub fn new(ech: ChessPiece, sq: Square) -> Self {
        Self(
            Self::VALID
                | (ech as u16) << 6
                | (sq.rank() as u16) << 3
                | sq.file() as u16,
        )
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 & Self::VALID != 0
    }

    pub fn ech(self) -> Option<ChessPiece> {
        ChessPiece::from_repr((self.0 >> 6 & 0x7) as u8)
    }

    pub fn square(self) -> Square {
        Square::from_coords(
            BoardFile::from_u8(self.0 as u8 & 0x7),
            BoardRank::from_u8((self.0 >> 3) as u8 & 0x7),
        )
    }

    #[inline]
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Accepts only the low 10 bits, and only a real piece in a valid slot.
    pub fn from_bits(bits: u16) -> Option<Self> {
        let res = Self(bits);
        match bits {
            0 => Some(Self::VOID),
            _ if bits >> 10 != 0 || !res.is_valid() => None,
            _ => res.ech().map(|_| res),
        }
    }
}

/// One color's men, in grid order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PieceList {
    slots: Vec<PieceSlot>,
}

impl PieceList {
    /// Collect `col`'s men, failing if there are more than `budget`.
    pub fn build(
        grid: &Mailbox<Option<ChessMan>>,
        col: ChessColor,
        budget: Option<usize>,
    ) -> Result<Self, CapacityError> {
        let slots: Vec<PieceSlot> = grid
            .men_of(col)
            .map(|(sq, cm)| PieceSlot::new(cm.ech(), sq))
            .collect();
        if let Some(budget) = budget
            && slots.len() > budget
        {
            warn!(?col, count = slots.len(), budget, "piece list overflow");
            return Err(CapacityError {
                color: col,
                count: slots.len(),
                budget,
            });
        }
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = PieceSlot> + '_ {
        self.slots.iter().copied()
    }

    /// The list as `N` fixed slots, void-padded.
    pub fn to_array<const N: usize>(&self) -> Option<[PieceSlot; N]> {
        if self.slots.len() > N {
            return None;
        }
        let mut res = [PieceSlot::VOID; N];
        res[..self.slots.len()].copy_from_slice(&self.slots);
        Some(res)
    }
}

/// An 18-bit move record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EncodedMove(u32);

impl EncodedMove {
    pub const WIDTH: usize = 3;

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn ech(self) -> Option<ChessPiece> {
        ChessPiece::from_repr((self.0 >> 15 & 0x7) as u8)
    }

    pub fn origin(self) -> Square {
        Self::square(self.0 >> 9)
    }

    pub fn dest(self) -> Square {
        Self::square(self.0)
    }

    pub fn promotion_code(self) -> u8 {
        (self.0 >> 6 & 0x7) as u8
    }

    /// File in bits 5..3 and rank in bits 2..0 of `bits`.
    fn square(bits: u32) -> Square {
        Square::from_coords(
            BoardFile::from_u8((bits >> 3) as u8),
            BoardRank::from_u8(bits as u8),
        )
    }

    fn place(sq: Square) -> u32 {
        (sq.file() as u32) << 3 | sq.rank() as u32
    }

    pub fn to_bytes(self) -> [u8; 3] {
        let [_, a, b, c] = self.0.to_be_bytes();
        [a, b, c]
    }

    /// Rejects records with high bits set, or naming no piece or promotion.
    pub fn from_bytes(bytes: [u8; 3]) -> Option<Self> {
        let [a, b, c] = bytes;
        let res = Self(u32::from_be_bytes([0, a, b, c]));
        if res.0 >> 18 != 0 {
            return None;
        }
        res.decode().map(|_| res)
    }

    /// Back to the candidate move.
    pub fn decode(self) -> Option<CandidateMove> {
        Some(CandidateMove {
            ech: self.ech()?,
            from: self.origin(),
            to: self.dest(),
            promotion: Promotion::from_code(self.promotion_code())?,
        })
    }
}

impl From<CandidateMove> for EncodedMove {
    fn from(mv: CandidateMove) -> Self {
        Self(
            (mv.ech as u32) << 15
                | Self::place(mv.from) << 9
                | (mv.promotion.code() as u32) << 6
                | Self::place(mv.to),
        )
    }
}

/// The moves of one generation pass, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveBurst {
    pub moves: Vec<EncodedMove>,
}

impl MoveBurst {
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn candidates(&self) -> impl Iterator<Item = CandidateMove> + '_ {
        self.moves.iter().filter_map(|mv| mv.decode())
    }
}

/// Serialize the cells' moves: piece list order, then each cell's own order.
///
/// Cells that no valid slot points at are ignored.
pub fn arbitrate(cells: &Mailbox<Vec<CandidateMove>>, pieces: &PieceList) -> MoveBurst {
    let moves: Vec<EncodedMove> = pieces
        .iter()
        .filter(|slot| slot.is_valid())
        .flat_map(|slot| cells[slot.square()].iter().copied().map(EncodedMove::from))
        .collect();
    debug!(moves = moves.len(), pieces = pieces.len(), "arbitrated");
    MoveBurst { moves }
}

#[test]
fn piece_slot_layout() {
    let slot = PieceSlot::new(ChessPiece::KNIGHT, Square::g1);
    assert_eq!(slot.bits(), 0b1_101_000_110);
    assert_eq!(slot.ech(), Some(ChessPiece::KNIGHT));
    assert_eq!(slot.square(), Square::g1);
    assert_eq!(PieceSlot::from_bits(slot.bits()), Some(slot));
    assert!(!PieceSlot::VOID.is_valid());
    assert_eq!(PieceSlot::from_bits(0b0_101_000_110), None);
    assert_eq!(PieceSlot::from_bits(0b1_111_000_000), None);
}

#[test]
fn move_record_layout() {
    let e2e4 = EncodedMove::from(CandidateMove::new(ChessPiece::PAWN, Square::e2, Square::e4));
    assert_eq!(e2e4.bits(), 0b110_100_001_000_100_011);
    assert_eq!(e2e4.to_bytes(), [0b11, 0b0100_0010, 0b0010_0011]);
    assert_eq!(EncodedMove::from_bytes(e2e4.to_bytes()), Some(e2e4));
    assert_eq!((e2e4.origin(), e2e4.dest()), (Square::e2, Square::e4));

    let mut c7c8 = CandidateMove::new(ChessPiece::PAWN, Square::c7, Square::c8);
    c7c8.promotion = Promotion::Piece(crate::model::PawnPromotion::KNIGHT);
    let enc = EncodedMove::from(c7c8);
    assert_eq!(enc.promotion_code(), 5);
    assert_eq!(enc.decode(), Some(c7c8));

    c7c8.promotion = Promotion::Deferred;
    assert_eq!(EncodedMove::from(c7c8).promotion_code(), 0b111);
}

#[test]
fn move_record_rejects_garbage() {
    assert_eq!(EncodedMove::from_bytes([0x04, 0, 0]), None);
    assert_eq!(EncodedMove::from_bytes([0, 0, 0]), None);
    assert_eq!(EncodedMove::from_bytes([0x03, 0x80, 0x40]), None);
}

#[test]
fn budget_overflow_is_reported() {
    let pos: crate::model::Position =
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1".parse().unwrap();
    let white = PieceList::build(&pos.placement, ChessColor::WHITE, Some(SLOT_BUDGET)).unwrap();
    assert_eq!(white.len(), 16);
    assert!(white.to_array::<SLOT_BUDGET>().is_some());
    assert_eq!(
        PieceList::build(&pos.placement, ChessColor::BLACK, Some(15)),
        Err(CapacityError {
            color: ChessColor::BLACK,
            count: 16,
            budget: 15
        })
    );
}

#[test]
fn arbitration_follows_piece_list_order() {
    use crate::{board, config::PromotionPolicy, movegen::MoveGen};

    let pos: crate::model::Position = "8/5k2/8/8/5q2/3B4/8/4K3 w - - 0 29".parse().unwrap();
    let (bin, meta) = board::encode(&pos);
    let grid = bin.to_grid().unwrap();
    let cells = MoveGen::new(&grid, &meta, PromotionPolicy::EachPiece).by_square();
    let pieces = PieceList::build(&grid, ChessColor::WHITE, Some(SLOT_BUDGET)).unwrap();
    let burst = arbitrate(&cells, &pieces);
    assert_eq!(burst.len(), 16);
    let pieces: Vec<_> = burst.candidates().map(|mv| mv.ech).collect();
    assert_eq!(pieces[..5], [ChessPiece::KING; 5]);
    assert_eq!(pieces[5..], [ChessPiece::BISHOP; 11]);
}
