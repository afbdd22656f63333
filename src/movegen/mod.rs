//! # Per-square move generation
//!
//! Every one of the 64 cells computes the pseudo-legal moves of its own
//! occupant, provided it belongs to the side to move, from nothing but the
//! grid and the board metadata. Cells share no state, so
//! [`MoveGen::by_square`] is a plain map over the board.
//!
//! Pseudo-legal means the mover's own king may be left in check. The one
//! exception is castling, which is never offered out of, through or into
//! an attacked square.

pub mod vision;

use strum::VariantArray;

use crate::{
    board::BoardMeta,
    config::PromotionPolicy,
    model::{
        BoardRank, CastlingDirection, CastlingRights, ChessColor, ChessMan, ChessPiece, Mailbox,
        PawnPromotion, Square, castling::CLASSIC_CASTLING,
    },
    movegen::vision::{Bishop, King, Knight, PieceVision, Queen, Rook},
};

/// Promotion carried by a candidate move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Promotion {
    /// Not a promotion.
    #[default]
    Plain,
    /// Promotion to the given piece.
    Piece(PawnPromotion),
    /// Promotion with the piece left for the consumer to pick.
    Deferred,
}

impl Promotion {
    /// Reserved-bit value of the move record.
    pub const DEFERRED_CODE: u8 = 0b111;

    #[inline]
    pub fn piece(self) -> Option<PawnPromotion> {
        match self {
            Self::Piece(p) => Some(p),
            _ => None,
        }
    }

    /// The 3-bit code: 0 for none, the piece type rank, or [`Self::DEFERRED_CODE`].
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Self::Plain => 0,
            Self::Piece(p) => p as u8,
            Self::Deferred => Self::DEFERRED_CODE,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Plain),
            Self::DEFERRED_CODE => Some(Self::Deferred),
            _ => PawnPromotion::from_repr(code).map(Self::Piece),
        }
    }

    #[inline]
    pub fn is_promotion(self) -> bool {
        self != Self::Plain
    }
}

/// A pseudo-legal move as produced by one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateMove {
    pub ech: ChessPiece,
    pub from: Square,
    pub to: Square,
    pub promotion: Promotion,
}

impl CandidateMove {
    #[inline]
    pub fn new(ech: ChessPiece, from: Square, to: Square) -> Self {
        Self {
            ech,
            from,
            to,
            promotion: Promotion::Plain,
        }
    }

    /// The king's two-square move.
    pub fn is_castling(&self) -> bool {
        self.ech == ChessPiece::KING && (self.from.file() as u8).abs_diff(self.to.file() as u8) == 2
    }
}

/// Everything a cell may look at during a generation pass.
#[derive(Debug, Clone, Copy)]
pub struct MoveGen<'a> {
    grid: &'a Mailbox<Option<ChessMan>>,
    player: ChessColor,
    rights: CastlingRights,
    en_passant: Option<Square>,
    promotions: PromotionPolicy,
}

impl<'a> MoveGen<'a> {
    pub fn new(
        grid: &'a Mailbox<Option<ChessMan>>,
        meta: &BoardMeta,
        promotions: PromotionPolicy,
    ) -> Self {
        let player = meta.to_move();
        Self {
            grid,
            player,
            rights: meta.rights(),
            en_passant: meta
                .en_passant()
                .map(|f| Square::from_coords(f, BoardRank::en_passant_target(player))),
            promotions,
        }
    }

    #[inline]
    pub fn player(&self) -> ChessColor {
        self.player
    }

    /// The moves of one cell, empty unless it holds a man of the side to move.
    pub fn square_moves(&self, from: Square) -> Vec<CandidateMove> {
        let mut res = Vec::new();
        self.square_moves_into(from, &mut res);
        res
    }

    pub fn square_moves_into(&self, from: Square, buffer: &mut Vec<CandidateMove>) {
        let Some(cm) = self.grid[from] else {
            return;
        };
        if cm.col() != self.player {
            return;
        }
        match cm.ech() {
            ChessPiece::PAWN => self.pawn_moves(from, buffer),
            ChessPiece::KNIGHT => self.piece_moves::<Knight>(from, buffer),
            ChessPiece::BISHOP => self.piece_moves::<Bishop>(from, buffer),
            ChessPiece::ROOK => self.piece_moves::<Rook>(from, buffer),
            ChessPiece::QUEEN => self.piece_moves::<Queen>(from, buffer),
            ChessPiece::KING => {
                self.piece_moves::<King>(from, buffer);
                self.castling_moves(from, buffer);
            }
        }
    }

    /// Run all 64 cells.
    pub fn by_square(&self) -> Mailbox<Vec<CandidateMove>> {
        Mailbox(std::array::from_fn(|ix| {
            self.square_moves(Square::from_u8(ix as u8))
        }))
    }

    /// All moves of the side to move, cell by cell in grid order.
    pub fn enumerate(&self, buffer: &mut Vec<CandidateMove>) {
        for ix in 0..64 {
            self.square_moves_into(Square::from_u8(ix), buffer);
        }
    }

    fn piece_moves<V: PieceVision>(&self, from: Square, buffer: &mut Vec<CandidateMove>) {
        let mut seen = Vec::with_capacity(27);
        V::see(self.grid, from, &mut seen);
        for to in seen {
            if self.grid[to].is_none_or(|cm| cm.col() != self.player) {
                buffer.push(CandidateMove::new(V::ID, from, to));
            }
        }
    }

    fn pawn_moves(&self, from: Square, buffer: &mut Vec<CandidateMove>) {
        let dr = self.player.sign();

        if let Some(one) = from.offset(0, dr)
            && self.grid[one].is_none()
        {
            self.promotions(CandidateMove::new(ChessPiece::PAWN, from, one), buffer);

            if from.rank() == BoardRank::pawn_start(self.player)
                && let Some(two) = one.offset(0, dr)
                && self.grid[two].is_none()
            {
                buffer.push(CandidateMove::new(ChessPiece::PAWN, from, two));
            }
        }

        for df in [-1, 1] {
            let Some(to) = from.offset(df, dr) else {
                continue;
            };
            match self.grid[to] {
                Some(cm) if cm.col() != self.player => {
                    self.promotions(CandidateMove::new(ChessPiece::PAWN, from, to), buffer)
                }
                None if Some(to) == self.en_passant => {
                    buffer.push(CandidateMove::new(ChessPiece::PAWN, from, to))
                }
                _ => {}
            }
        }
    }

    fn promotions(&self, mut mv: CandidateMove, buffer: &mut Vec<CandidateMove>) {
        if mv.to.rank() != BoardRank::promotion(self.player) {
            buffer.push(mv);
            return;
        }
        match self.promotions {
            PromotionPolicy::EachPiece => {
                for p in PawnPromotion::VARIANTS {
                    mv.promotion = Promotion::Piece(*p);
                    buffer.push(mv);
                }
            }
            PromotionPolicy::Deferred => {
                mv.promotion = Promotion::Deferred;
                buffer.push(mv);
            }
        }
    }

    fn castling_moves(&self, from: Square, buffer: &mut Vec<CandidateMove>) {
        let cc = &CLASSIC_CASTLING;
        let c = self.player.ix();
        if from != cc.king_start[c] {
            return;
        }
        let rook = Some(ChessMan::new(self.player, ChessPiece::ROOK));
        for dir in CastlingDirection::VARIANTS {
            let d = dir.ix();
            if !self.rights.get(self.player, *dir)
                || self.grid[cc.rook_start[c][d]] != rook
                || cc.space[c][d].iter().any(|sq| self.grid[*sq].is_some())
                || cc.safety[c][d]
                    .iter()
                    .any(|sq| self.is_attacked(*sq, self.player.opp()))
            {
                continue;
            }
            buffer.push(CandidateMove::new(ChessPiece::KING, from, cc.king_end[c][d]));
        }
    }

    /// Whether any man of color `by` attacks `sq`.
    pub fn is_attacked(&self, sq: Square, by: ChessColor) -> bool {
        let holds = |at: &Square, eches: &[ChessPiece]| {
            self.grid[*at].is_some_and(|cm| cm.col() == by && eches.contains(&cm.ech()))
        };
        let sees = |see: fn(&Mailbox<Option<ChessMan>>, Square, &mut Vec<Square>),
                    eches: &[ChessPiece]| {
            let mut seen = Vec::with_capacity(14);
            see(self.grid, sq, &mut seen);
            seen.iter().any(|at| holds(at, eches))
        };

        // A pawn of `by` attacks from one rank behind, seen from `by`'s side.
        let pawn_dr = -by.sign();
        if [-1, 1]
            .into_iter()
            .filter_map(|df| sq.offset(df, pawn_dr))
            .any(|at| holds(&at, &[ChessPiece::PAWN]))
        {
            return true;
        }

        sees(Knight::see, &[ChessPiece::KNIGHT])
            || sees(King::see, &[ChessPiece::KING])
            || sees(Rook::see, &[ChessPiece::ROOK, ChessPiece::QUEEN])
            || sees(Bishop::see, &[ChessPiece::BISHOP, ChessPiece::QUEEN])
    }
}

#[cfg(test)]
fn moves_of(fen: &str, promotions: PromotionPolicy) -> Vec<CandidateMove> {
    let pos = crate::decode::FenDecoder::decode(fen.as_bytes()).unwrap();
    let (board, meta) = crate::board::encode(&pos);
    let grid = board.to_grid().unwrap();
    let mut res = Vec::new();
    MoveGen::new(&grid, &meta, promotions).enumerate(&mut res);
    res
}

#[cfg(test)]
fn coords(moves: &[CandidateMove]) -> Vec<String> {
    moves
        .iter()
        .map(|mv| crate::notation::CoordNotation::from(*mv).to_string())
        .collect()
}

#[test]
fn opening_has_twenty_moves() {
    let moves = moves_of(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        PromotionPolicy::EachPiece,
    );
    assert_eq!(moves.len(), 20);
    assert_eq!(
        coords(&moves)[..6],
        ["b1c3", "b1a3", "g1h3", "g1f3", "a2a3", "a2a4"]
    );
}

#[test]
fn bishop_and_king_against_queen() {
    let moves = moves_of("8/5k2/8/8/5q2/3B4/8/4K3 w - - 0 29", PromotionPolicy::EachPiece);
    assert_eq!(
        coords(&moves),
        [
            "e1e2", "e1f2", "e1f1", "e1d1", "e1d2", "d3e4", "d3f5", "d3g6", "d3h7", "d3e2",
            "d3f1", "d3c2", "d3b1", "d3c4", "d3b5", "d3a6",
        ]
    );
}

#[test]
fn en_passant_capture() {
    let moves = moves_of("8/8/8/2k5/2pP4/8/B7/4K3 b - d3 0 3", PromotionPolicy::EachPiece);
    assert_eq!(moves.len(), 9);
    assert!(coords(&moves).contains(&"c4d3".to_owned()));
    assert!(coords(&moves).contains(&"c4c3".to_owned()));
}

#[test]
fn promotions_follow_the_policy() {
    let fen = "8/2P2P1k/8/8/8/8/8/4K3 w - - 0 29";
    let each = moves_of(fen, PromotionPolicy::EachPiece);
    assert_eq!(each.len(), 13);
    assert_eq!(
        coords(&each)[5..9],
        ["c7c8q", "c7c8r", "c7c8b", "c7c8n"]
    );

    let deferred = moves_of(fen, PromotionPolicy::Deferred);
    assert_eq!(deferred.len(), 7);
    assert!(
        deferred
            .iter()
            .filter(|mv| mv.ech == ChessPiece::PAWN)
            .all(|mv| mv.promotion == Promotion::Deferred)
    );
}

#[test]
fn castling_is_gated_by_attacks() {
    let free = moves_of("r3k2r/8/8/8/8/8/8/4K3 b kq - 0 1", PromotionPolicy::EachPiece);
    assert_eq!(free.len(), 26);
    assert_eq!(free.iter().filter(|mv| mv.is_castling()).count(), 2);

    let checked = moves_of("r3k2r/8/8/8/4R3/8/8/4K3 b kq - 0 1", PromotionPolicy::EachPiece);
    assert_eq!(checked.len(), 24);
    assert!(!checked.iter().any(|mv| mv.is_castling()));
    assert!(coords(&checked).contains(&"e8e7".to_owned()));

    let crossed = moves_of("r3k2r/8/8/8/5R2/8/8/4K3 b kq - 0 1", PromotionPolicy::EachPiece);
    assert_eq!(crossed.len(), 25);
    assert_eq!(
        coords(&crossed)
            .into_iter()
            .filter(|s| s == "e8c8" || s == "e8g8")
            .collect::<Vec<_>>(),
        ["e8c8"]
    );
}

#[test]
fn white_castles_from_e1() {
    let free = moves_of("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1", PromotionPolicy::EachPiece);
    assert_eq!(free.len(), 26);
    assert_eq!(coords(&free)[15..17], ["e1g1", "e1c1"]);

    let checked = moves_of("4k3/8/8/4r3/8/8/8/R3K2R w KQ - 0 1", PromotionPolicy::EachPiece);
    assert_eq!(checked.len(), 24);
    assert!(!checked.iter().any(|mv| mv.is_castling()));
    assert!(coords(&checked).contains(&"e1e2".to_owned()));

    let crossed = moves_of("4k3/8/8/5r2/8/8/8/R3K2R w KQ - 0 1", PromotionPolicy::EachPiece);
    assert_eq!(
        coords(&crossed)
            .into_iter()
            .filter(|s| s == "e1c1" || s == "e1g1")
            .collect::<Vec<_>>(),
        ["e1c1"]
    );

    let blocked = moves_of("4k3/8/8/8/8/8/8/RN2K2R w KQ - 0 1", PromotionPolicy::EachPiece);
    assert_eq!(blocked.iter().filter(|mv| mv.is_castling()).count(), 1);
}

#[test]
fn lone_king_of_the_other_side_yields_nothing() {
    assert!(moves_of("8/8/8/8/8/8/8/k7 w - - 0 1", PromotionPolicy::EachPiece).is_empty());
}

#[test]
fn by_square_agrees_with_enumerate() {
    let pos = crate::model::Position::startpos();
    let (board, meta) = crate::board::encode(&pos);
    let grid = board.to_grid().unwrap();
    let movegen = MoveGen::new(&grid, &meta, PromotionPolicy::EachPiece);
    let mut flat = Vec::new();
    movegen.enumerate(&mut flat);
    let cells = movegen.by_square();
    assert_eq!(cells.0.concat(), flat);
    assert!(cells[Square::e7].is_empty());
    assert_eq!(cells[Square::g1].len(), 2);
}

#[test]
fn attack_test_sees_pawns_from_the_right_side() {
    let pos = crate::decode::FenDecoder::decode(b"4k3/8/8/3p4/8/8/8/4K3 w - - 0 1").unwrap();
    let (board, meta) = crate::board::encode(&pos);
    let grid = board.to_grid().unwrap();
    let movegen = MoveGen::new(&grid, &meta, PromotionPolicy::EachPiece);
    assert!(movegen.is_attacked(Square::c4, ChessColor::BLACK));
    assert!(movegen.is_attacked(Square::e4, ChessColor::BLACK));
    assert!(!movegen.is_attacked(Square::c6, ChessColor::BLACK));
    assert!(!movegen.is_attacked(Square::d4, ChessColor::BLACK));
    assert!(movegen.is_attacked(Square::d2, ChessColor::WHITE));
}
