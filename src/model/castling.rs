use crate::model::Square;

/// Geometry of castling, indexed first by color, then by direction.
///
/// `space` are the squares strictly between king and rook, which
/// must be empty. `safety` are the squares the king stands on, crosses
/// and lands on, none of which may be attacked.
#[derive(Debug)]
pub struct Castling {
    pub king_start: [Square; 2],
    pub king_end: [[Square; 2]; 2],
    pub rook_start: [[Square; 2]; 2],
    pub space: [[&'static [Square]; 2]; 2],
    pub safety: [[&'static [Square]; 2]; 2],
}

pub const CLASSIC_CASTLING: Castling = {
    use Square::*;
    Castling {
        king_start: [e1, e8],
        king_end: [[g1, c1], [g8, c8]],
        rook_start: [[h1, a1], [h8, a8]],
        space: [[&[f1, g1], &[d1, c1, b1]], [&[f8, g8], &[d8, c8, b8]]],
        safety: [[&[e1, f1, g1], &[e1, d1, c1]], [&[e8, f8, g8], &[e8, d8, c8]]],
    }
};
