//! # Modeling the game of chess.
//!
//! This module contains enums modeling values in chess,
//! as well as the decoded [`Position`] and the simple array
//! representations in its sub-modules.

use strum::{EnumIs, EnumIter, FromRepr, VariantArray, VariantNames};

pub mod castling;
pub mod mailbox;
pub mod position;

pub use mailbox::Mailbox;
pub use position::Position;

/// Representation of the squares on a chessboard.
///
/// This enum uses the convention of numbering
/// squares starting with a1 = 0 and then counting
/// up over the files first, b1 = 1, c1 = 2, ... and then the
/// ranks, a2 = 8, a3 = 16, ... ending with h8 = 63.
///
/// This is the grid order the move generator addresses squares in.
/// It is *not* the order squares travel in over the wire: the binary
/// board is sent in reading order, a8 first and h1 last. See
/// [`Square::wire_ix`] and [`Square::from_wire`] for the remap.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
     VariantNames, EnumIter)]
#[repr(u8)]
#[rustfmt::skip]
pub enum Square {
    a1 = 0o00, b1 = 0o01, c1 = 0o02, d1 = 0o03, e1 = 0o04, f1 = 0o05, g1 = 0o06, h1 = 0o07,
    a2 = 0o10, b2 = 0o11, c2 = 0o12, d2 = 0o13, e2 = 0o14, f2 = 0o15, g2 = 0o16, h2 = 0o17,
    a3 = 0o20, b3 = 0o21, c3 = 0o22, d3 = 0o23, e3 = 0o24, f3 = 0o25, g3 = 0o26, h3 = 0o27,
    a4 = 0o30, b4 = 0o31, c4 = 0o32, d4 = 0o33, e4 = 0o34, f4 = 0o35, g4 = 0o36, h4 = 0o37,
    a5 = 0o40, b5 = 0o41, c5 = 0o42, d5 = 0o43, e5 = 0o44, f5 = 0o45, g5 = 0o46, h5 = 0o47,
    a6 = 0o50, b6 = 0o51, c6 = 0o52, d6 = 0o53, e6 = 0o54, f6 = 0o55, g6 = 0o56, h6 = 0o57,
    a7 = 0o60, b7 = 0o61, c7 = 0o62, d7 = 0o63, e7 = 0o64, f7 = 0o65, g7 = 0o66, h7 = 0o67,
    a8 = 0o70, b8 = 0o71, c8 = 0o72, d8 = 0o73, e8 = 0o74, f8 = 0o75, g8 = 0o76, h8 = 0o77,
}

impl Square {
    /// Use this Square as an array index.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize
    }

    /// Infallible conversion from a u8 by way of truncating the
    /// extraneous bits.
    #[inline]
    pub fn from_u8(ix: u8) -> Self {
        unsafe { std::mem::transmute::<u8, Self>(ix & 0x3Fu8) }
    }

    /// Split a square into file and rank
    #[inline]
    pub fn coords(self) -> (BoardFile, BoardRank) {
        (self.file(), self.rank())
    }

    /// Join a file and a rank into a square
    #[inline]
    pub fn from_coords(f: BoardFile, r: BoardRank) -> Self {
        Self::from_u8(f as u8 | (r as u8) << 3)
    }

    #[inline]
    pub fn file(self) -> BoardFile {
        BoardFile::from_u8(self as u8)
    }

    #[inline]
    pub fn rank(self) -> BoardRank {
        BoardRank::from_u8(self as u8 >> 3)
    }

    /// Step by a file and rank delta, or `None` when that walks off the board.
    #[inline]
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let f = (self as u8 & 0x7) as i8 + df;
        let r = (self as u8 >> 3) as i8 + dr;
        if (0..8).contains(&f) && (0..8).contains(&r) {
            Some(Self::from_u8((r as u8) << 3 | f as u8))
        } else {
            None
        }
    }

    /// Mirror chessboard north to south
    #[inline]
    pub fn mirror_ns(self) -> Self {
        Self::from_u8(self as u8 ^ 0x38u8)
    }

    /// Position of this square in the wire order of the binary board,
    /// which reads rank 8 to rank 1 and a to h within each rank.
    ///
    /// Flipping the rank bits is the entire remap.
    #[inline]
    pub fn wire_ix(self) -> usize {
        self.mirror_ns().ix()
    }

    /// Inverse of [`Square::wire_ix`].
    #[inline]
    pub fn from_wire(ix: usize) -> Self {
        Self::from_u8(ix as u8).mirror_ns()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum BoardRank {
    _1 = 0,
    _2 = 1,
    _3 = 2,
    _4 = 3,
    _5 = 4,
    _6 = 5,
    _7 = 6,
    _8 = 7,
}

impl BoardRank {
    pub const VARIANTS: &'static [&'static str] = &["1", "2", "3", "4", "5", "6", "7", "8"];

    /// Infallible conversion from a u8 by way of truncating the
    /// extraneous bits.
    #[inline]
    pub fn from_u8(ix: u8) -> Self {
        unsafe { std::mem::transmute::<u8, Self>(ix & 0x7) }
    }

    /// Parse an ascii rank digit `1` ... `8`.
    #[inline]
    pub fn from_ascii(b: u8) -> Option<Self> {
        matches!(b, b'1'..=b'8').then(|| Self::from_u8(b - b'1'))
    }

    /// The rank a color's pawns start on.
    #[inline]
    pub fn pawn_start(color: ChessColor) -> Self {
        match color {
            ChessColor::WHITE => Self::_2,
            ChessColor::BLACK => Self::_7,
        }
    }

    /// The rank a color's pawns promote on.
    #[inline]
    pub fn promotion(color: ChessColor) -> Self {
        match color {
            ChessColor::WHITE => Self::_8,
            ChessColor::BLACK => Self::_1,
        }
    }

    /// The rank the en-passant target square is on when `color` is to move.
    #[inline]
    pub fn en_passant_target(color: ChessColor) -> Self {
        match color {
            ChessColor::WHITE => Self::_6,
            ChessColor::BLACK => Self::_3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
#[repr(u8)]
pub enum BoardFile {
    a_ = 0,
    b_ = 1,
    c_ = 2,
    d_ = 3,
    e_ = 4,
    f_ = 5,
    g_ = 6,
    h_ = 7,
}

impl BoardFile {
    pub const VARIANTS: &'static [&'static str] = &["a", "b", "c", "d", "e", "f", "g", "h"];

    /// Infallible conversion from a u8 by way of truncating the
    /// extraneous bits.
    #[inline]
    pub fn from_u8(ix: u8) -> Self {
        unsafe { std::mem::transmute::<u8, Self>(ix & 0x7) }
    }

    /// Parse an ascii file letter `a` ... `h`.
    #[inline]
    pub fn from_ascii(b: u8) -> Option<Self> {
        matches!(b, b'a'..=b'h').then(|| Self::from_u8(b - b'a'))
    }
}

/// Representation of a chessman.
///
/// The discriminants allows niche optimization with a byte value of
/// 0 representing absence, and with the sign representing color.
/// The absolute value is the type rank of the piece as used on the
/// wire, see [`ChessPiece`].
///
/// The name chessman is of British-English origin, and though archaic
/// is used because it allows a distinction between pawns and pieces.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, VariantArray)]
#[repr(i8)]
pub enum ChessMan {
    /// ♟
    BLACK_PAWN = -6,
    /// ♞
    BLACK_KNIGHT = -5,
    /// ♝
    BLACK_BISHOP = -4,
    /// ♜
    BLACK_ROOK = -3,
    /// ♛
    BLACK_QUEEN = -2,
    /// ♚
    BLACK_KING = -1,
    /// ♔
    WHITE_KING = 1,
    /// ♕
    WHITE_QUEEN = 2,
    /// ♖
    WHITE_ROOK = 3,
    /// ♗
    WHITE_BISHOP = 4,
    /// ♘
    WHITE_KNIGHT = 5,
    /// ♙
    WHITE_PAWN = 6,
}

impl ChessMan {
    /// Combine a color and a piece type.
    #[inline]
    pub fn new(col: ChessColor, ech: ChessPiece) -> Self {
        unsafe { std::mem::transmute::<i8, Self>(ech as i8 * col.sign()) }
    }

    /// The associated colorless piece type of a chessman.
    #[inline]
    pub fn ech(self) -> ChessPiece {
        ChessPiece::from(self)
    }

    /// The color of the chessman in question.
    #[inline]
    pub fn col(self) -> ChessColor {
        ChessColor::from(self)
    }

    /// Decode a FEN placement letter, upper case for white.
    pub fn from_fen_byte(b: u8) -> Option<Self> {
        let ech = ChessPiece::from_letter(b.to_ascii_uppercase())?;
        let col = if b.is_ascii_uppercase() {
            ChessColor::WHITE
        } else {
            ChessColor::BLACK
        };
        Some(Self::new(col, ech))
    }

    /// The FEN placement letter, upper case for white.
    pub fn fen_char(self) -> char {
        let c = self.ech().letter();
        match self.col() {
            ChessColor::WHITE => c,
            ChessColor::BLACK => c.to_ascii_lowercase(),
        }
    }
}

/// Representation of color of a player or chessman.
///
/// The choice here to not to mirror the convention of black = `-1` and
/// white = `1` as used in the [`ChessMan`] enum is because this is used
/// extensively in indexing of arrays of the form `[<white value>, <black value>]`.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIs)]
#[repr(u8)]
pub enum ChessColor {
    WHITE = 0,
    BLACK = 1,
}

impl ChessColor {
    /// Opposing color.
    #[inline]
    pub fn opp(self) -> Self {
        match self {
            Self::WHITE => Self::BLACK,
            Self::BLACK => Self::WHITE,
        }
    }

    /// Sign value of associated chessman color.
    #[inline]
    pub fn sign(self) -> i8 {
        match self {
            Self::WHITE => 1,
            Self::BLACK => -1,
        }
    }

    /// Associated array index.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize
    }
}

/// Extracting the color of a chessman.
impl From<ChessMan> for ChessColor {
    fn from(value: ChessMan) -> Self {
        if (value as i8) < 0 {
            Self::BLACK
        } else {
            Self::WHITE
        }
    }
}

/// Representation of the piece types of chessmen.
///
/// The discriminant values of this enum are the type ranks used
/// by the binary board and the move records, and the absolute
/// values of the [`ChessMan`] enum.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, VariantArray, FromRepr)]
#[repr(u8)]
pub enum ChessPiece {
    KING = 1,
    QUEEN = 2,
    ROOK = 3,
    BISHOP = 4,
    KNIGHT = 5,
    PAWN = 6,
}

impl ChessPiece {
    /// Use as an array index: equal to one less than the discriminant value.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize - 1
    }

    /// Upper case FEN letter.
    pub fn letter(self) -> char {
        match self {
            Self::KING => 'K',
            Self::QUEEN => 'Q',
            Self::ROOK => 'R',
            Self::BISHOP => 'B',
            Self::KNIGHT => 'N',
            Self::PAWN => 'P',
        }
    }

    /// Inverse of [`ChessPiece::letter`], upper case only.
    pub fn from_letter(b: u8) -> Option<Self> {
        match b {
            b'K' => Some(Self::KING),
            b'Q' => Some(Self::QUEEN),
            b'R' => Some(Self::ROOK),
            b'B' => Some(Self::BISHOP),
            b'N' => Some(Self::KNIGHT),
            b'P' => Some(Self::PAWN),
            _ => None,
        }
    }
}

/// Extracting the piece type of a chessman.
impl From<ChessMan> for ChessPiece {
    #[inline]
    fn from(value: ChessMan) -> Self {
        unsafe { std::mem::transmute((value as i8).unsigned_abs()) }
    }
}

/// Subset inclusion.
impl From<PawnPromotion> for ChessPiece {
    #[inline]
    fn from(value: PawnPromotion) -> Self {
        unsafe { std::mem::transmute(value) }
    }
}

/// Representation of the chess promotion echelons, that is, not pawns or kings.
///
/// [`PawnPromotion::VARIANTS`] lists them in the order promotions are
/// enumerated by the move generator.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, VariantArray, FromRepr)]
#[repr(u8)]
pub enum PawnPromotion {
    QUEEN = 2,
    ROOK = 3,
    BISHOP = 4,
    KNIGHT = 5,
}

impl PawnPromotion {
    /// Lower case letter used as the suffix of coordinate notation.
    pub fn suffix(self) -> char {
        ChessPiece::from(self).letter().to_ascii_lowercase()
    }
}

/// Representation of the directions of castling.
///
/// The discriminants are array indexes into the second level of
/// `[[_; 2]; 2]` tables that are indexed first by [`ChessColor`].
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, VariantArray)]
#[repr(u8)]
pub enum CastlingDirection {
    /// Aka. the 'short' castling, toward the h-file.
    KINGSIDE = 0,
    /// Aka. the 'long' castling, toward the a-file.
    QUEENSIDE = 1,
}

impl CastlingDirection {
    /// Use as an array index.
    #[inline]
    pub fn ix(self) -> usize {
        self as usize
    }
}

/// Castling rights, indexed first by [`ChessColor`] then [`CastlingDirection`].
///
/// The rights only record that neither king nor rook has moved; whether the
/// castling move is currently executable is up to the move generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(pub [[bool; 2]; 2]);

impl CastlingRights {
    pub const NONE: Self = Self([[false; 2]; 2]);
    pub const ALL: Self = Self([[true; 2]; 2]);

    #[inline]
    pub fn get(self, col: ChessColor, dir: CastlingDirection) -> bool {
        self.0[col.ix()][dir.ix()]
    }

    #[inline]
    pub fn set(&mut self, col: ChessColor, dir: CastlingDirection, on: bool) {
        self.0[col.ix()][dir.ix()] = on
    }

    /// Pack into the 4-bit mask of the metadata interface.
    ///
    /// Bit 0 is white kingside, bit 1 white queenside, bit 2 black
    /// kingside and bit 3 black queenside, i.e. `KQkq` from the low bit up.
    pub fn mask(self) -> u8 {
        let mut res = 0;
        for col in [ChessColor::WHITE, ChessColor::BLACK] {
            for dir in CastlingDirection::VARIANTS {
                if self.get(col, *dir) {
                    res |= 1 << (col.ix() * 2 + dir.ix());
                }
            }
        }
        res
    }

    /// Inverse of [`CastlingRights::mask`], extraneous bits are ignored.
    pub fn from_mask(mask: u8) -> Self {
        let mut res = Self::NONE;
        for col in [ChessColor::WHITE, ChessColor::BLACK] {
            for dir in CastlingDirection::VARIANTS {
                res.set(col, *dir, mask & 1 << (col.ix() * 2 + dir.ix()) != 0);
            }
        }
        res
    }
}

/// The eight directions on the chessboard, as (file, rank) deltas.
///
/// The variant order is the order rays and king steps are generated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, VariantArray)]
#[repr(u8)]
pub enum CompassRose {
    NORTH,
    NORTHEAST,
    EAST,
    SOUTHEAST,
    SOUTH,
    SOUTHWEST,
    WEST,
    NORTHWEST,
}

impl CompassRose {
    pub const ORTHOGONAL: [Self; 4] = [Self::NORTH, Self::EAST, Self::SOUTH, Self::WEST];
    pub const DIAGONAL: [Self; 4] = [
        Self::NORTHEAST,
        Self::SOUTHEAST,
        Self::SOUTHWEST,
        Self::NORTHWEST,
    ];

    /// File and rank delta of one step in this direction.
    #[inline]
    pub fn delta(self) -> (i8, i8) {
        match self {
            Self::NORTH => (0, 1),
            Self::NORTHEAST => (1, 1),
            Self::EAST => (1, 0),
            Self::SOUTHEAST => (1, -1),
            Self::SOUTH => (0, -1),
            Self::SOUTHWEST => (-1, -1),
            Self::WEST => (-1, 0),
            Self::NORTHWEST => (-1, 1),
        }
    }
}

#[test]
fn chessman_roundtrips_color_and_piece() {
    for cm in ChessMan::VARIANTS {
        assert_eq!(ChessMan::new(cm.col(), cm.ech()), *cm);
        assert_eq!(
            ChessMan::from_fen_byte(cm.fen_char() as u8),
            Some(*cm),
            "{cm:?}"
        );
    }
    assert_eq!(ChessMan::from_fen_byte(b'x'), None);
}

#[test]
fn wire_remap_is_exact() {
    use strum::IntoEnumIterator;

    assert_eq!(Square::a8.wire_ix(), 0);
    assert_eq!(Square::h8.wire_ix(), 7);
    assert_eq!(Square::a1.wire_ix(), 56);
    assert_eq!(Square::e1.wire_ix(), 60);
    assert_eq!(Square::h1.wire_ix(), 63);
    for sq in Square::iter() {
        assert_eq!(Square::from_wire(sq.wire_ix()), sq);
        let (f, r) = sq.coords();
        assert_eq!(sq.wire_ix(), (7 - r as usize) * 8 + f as usize);
    }
}

#[test]
fn offsets_clip_at_the_edges() {
    assert_eq!(Square::a1.offset(-1, 0), None);
    assert_eq!(Square::h8.offset(0, 1), None);
    assert_eq!(Square::b1.offset(-1, 2), Some(Square::a3));
    assert_eq!(Square::g1.offset(1, 2), Some(Square::h3));
    assert_eq!(Square::h4.offset(1, 0), None);
}

#[test]
fn castling_mask_is_kqkq_from_the_low_bit() {
    assert_eq!(CastlingRights::ALL.mask(), 15);
    assert_eq!(CastlingRights::NONE.mask(), 0);
    let mut rights = CastlingRights::NONE;
    rights.set(ChessColor::BLACK, CastlingDirection::QUEENSIDE, true);
    assert_eq!(rights.mask(), 0b1000);
    for m in 0..16 {
        assert_eq!(CastlingRights::from_mask(m).mask(), m);
    }
}
