#![allow(dead_code)]

/// Shared helpers for the integration tests
use fenpipe::{
    PromotionPolicy,
    board,
    model::{BoardFile, BoardRank, CastlingDirection, CastlingRights, ChessColor, ChessMan, ChessPiece, Position, Square},
    movegen::MoveGen,
    notation::CoordNotation,
};
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// The positions the hardware was verified against, with their
/// pseudo-legal move counts.
pub const KNOWN_POSITIONS: &[(&str, usize)] = &[
    ("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 20),
    ("8/5k2/8/8/5q2/3B4/8/4K3 w - - 0 29", 16),
    ("8/8/8/2k5/2pP4/8/B7/4K3 b - d3 0 3", 9),
    (
        "r1n1b1q1/k1b1n1r1/p1p1p1p1/p1p1p1p1/P1P1P1P1/P1P1P1P1/R1N1B1Q1/K1B1N1R1 w KQkq - 0 1",
        21,
    ),
    ("8/2P2P1k/8/8/8/8/8/4K3 w - - 0 29", 13),
    ("r3k2r/8/8/8/4R3/8/8/4K3 b kq - 0 1", 24),
    ("r3k2r/8/8/8/8/8/8/4K3 b kq - 0 1", 26),
    ("r3k2r/8/8/8/5R2/8/8/4K3 b kq - 0 1", 25),
    ("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1", 26),
    ("4k3/8/8/4r3/8/8/8/R3K2R w KQ - 0 1", 24),
    ("4k3/8/8/5r2/8/8/8/R3K2R w KQ - 0 1", 25),
    ("4k3/8/8/8/8/8/8/R3K2R w Q - 0 1", 25),
    ("8/8/8/8/8/8/8/k7 w - - 0 1", 0),
];

pub fn position(fen: &str) -> Position {
    fen.parse().unwrap()
}

/// Moves of the generator under test, in emission order.
pub fn generated(pos: &Position, promotions: PromotionPolicy) -> Vec<String> {
    let (bin, meta) = board::encode(pos);
    let grid = bin.to_grid().unwrap();
    let mut moves = Vec::new();
    MoveGen::new(&grid, &meta, promotions).enumerate(&mut moves);
    moves
        .into_iter()
        .map(|mv| CoordNotation::from(mv).to_string())
        .collect()
}

fn xy(sq: Square) -> (i8, i8) {
    (sq.file() as i8, sq.rank() as i8)
}

fn at(x: i8, y: i8) -> Square {
    Square::from_coords(BoardFile::from_u8(x as u8), BoardRank::from_u8(y as u8))
}

fn forward(col: ChessColor) -> i8 {
    match col {
        ChessColor::WHITE => 1,
        ChessColor::BLACK => -1,
    }
}

/// Every square strictly between two squares on a line is empty.
fn clear_between(pos: &Position, from: Square, to: Square) -> bool {
    let ((fx, fy), (tx, ty)) = (xy(from), xy(to));
    let (sx, sy) = ((tx - fx).signum(), (ty - fy).signum());
    let (mut x, mut y) = (fx + sx, fy + sy);
    while (x, y) != (tx, ty) {
        if pos.man_at(at(x, y)).is_some() {
            return false;
        }
        x += sx;
        y += sy;
    }
    true
}

/// Whether a man standing on `from` hits `to`, pawns diagonally only.
fn hits(pos: &Position, cm: ChessMan, from: Square, to: Square) -> bool {
    let ((fx, fy), (tx, ty)) = (xy(from), xy(to));
    let (dx, dy) = (tx - fx, ty - fy);
    let (ax, ay) = (dx.abs(), dy.abs());
    if (ax, ay) == (0, 0) {
        return false;
    }
    let line = ax == 0 || ay == 0;
    let diag = ax == ay;
    match cm.ech() {
        ChessPiece::PAWN => ax == 1 && dy == forward(cm.col()),
        ChessPiece::KNIGHT => (ax, ay) == (1, 2) || (ax, ay) == (2, 1),
        ChessPiece::KING => ax.max(ay) == 1,
        ChessPiece::ROOK => line && clear_between(pos, from, to),
        ChessPiece::BISHOP => diag && clear_between(pos, from, to),
        ChessPiece::QUEEN => (line || diag) && clear_between(pos, from, to),
    }
}

pub fn attacked(pos: &Position, sq: Square, by: ChessColor) -> bool {
    all_squares().any(|from| {
        pos.man_at(from)
            .is_some_and(|cm| cm.col() == by && hits(pos, cm, from, sq))
    })
}

pub fn all_squares() -> impl Iterator<Item = Square> {
    (0..64u8).map(Square::from_u8)
}

/// Brute force: try every origin against every destination.
pub fn reference_moves(pos: &Position, promotions: PromotionPolicy) -> Vec<String> {
    let me = pos.to_move;
    let mut res = Vec::new();
    for from in all_squares() {
        let Some(cm) = pos.man_at(from) else { continue };
        if cm.col() != me {
            continue;
        }
        for to in all_squares() {
            let target = pos.man_at(to);
            if target.is_some_and(|t| t.col() == me) {
                continue;
            }
            let ok = if cm.ech() == ChessPiece::PAWN {
                let ((fx, fy), (tx, ty)) = (xy(from), xy(to));
                let dir = forward(me);
                let start = if me == ChessColor::WHITE { 1 } else { 6 };
                match (tx - fx, ty - fy) {
                    (0, dy) if dy == dir => target.is_none(),
                    (0, dy) if dy == 2 * dir => {
                        fy == start && target.is_none() && pos.man_at(at(fx, fy + dir)).is_none()
                    }
                    (-1 | 1, dy) if dy == dir => {
                        target.is_some() || pos.en_passant_square() == Some(to)
                    }
                    _ => false,
                }
            } else {
                hits(pos, cm, from, to)
            };
            if !ok {
                continue;
            }
            let uci = format!("{from}{to}");
            let last = if me == ChessColor::WHITE { 7 } else { 0 };
            if cm.ech() == ChessPiece::PAWN && xy(to).1 == last {
                match promotions {
                    PromotionPolicy::EachPiece => {
                        res.extend("qrbn".chars().map(|p| format!("{uci}{p}")))
                    }
                    PromotionPolicy::Deferred => res.push(uci),
                }
            } else {
                res.push(uci);
            }
        }
    }

    // Castling: rights, king and rook at home, empty between, no attacked step.
    let rank = if me == ChessColor::WHITE { 0 } else { 7 };
    let king = pos.man_at(at(4, rank));
    if king.is_some_and(|k| k.col() == me && k.ech() == ChessPiece::KING) {
        let rook = Some(ChessMan::new(me, ChessPiece::ROOK));
        for (dir, rook_x, between, steps, end_x) in [
            (CastlingDirection::KINGSIDE, 7, 5..7, [4, 5, 6], 6),
            (CastlingDirection::QUEENSIDE, 0, 1..4, [4, 3, 2], 2),
        ] {
            if pos.rights.get(me, dir)
                && pos.man_at(at(rook_x, rank)) == rook
                && between.clone().all(|x| pos.man_at(at(x, rank)).is_none())
                && steps.iter().all(|x| !attacked(pos, at(*x, rank), me.opp()))
            {
                res.push(format!("{}{}", at(4, rank), at(end_x, rank)));
            }
        }
    }
    res
}

pub fn sorted(mut moves: Vec<String>) -> Vec<String> {
    moves.sort();
    moves
}

/// A seeded random position: up to 24 men, no pawns on the back ranks.
pub fn random_position(rng: &mut SmallRng) -> Position {
    let mut pos = Position::empty();
    let men = rng.random_range(1..=24);
    for _ in 0..men {
        let sq = Square::from_u8(rng.random_range(0..64));
        let col = if rng.random_bool(0.5) {
            ChessColor::WHITE
        } else {
            ChessColor::BLACK
        };
        let ech = ChessPiece::from_repr(rng.random_range(1..=6)).unwrap();
        if ech == ChessPiece::PAWN && matches!(sq.rank(), BoardRank::_1 | BoardRank::_8) {
            continue;
        }
        pos.placement.set(sq, Some(ChessMan::new(col, ech)));
    }
    pos.to_move = if rng.random_bool(0.5) {
        ChessColor::WHITE
    } else {
        ChessColor::BLACK
    };
    pos.rights = CastlingRights::from_mask(rng.random_range(0..16));
    pos.en_passant = rng
        .random_bool(0.3)
        .then(|| BoardFile::from_u8(rng.random_range(0..8)));
    pos.halfmove_clock = rng.random_range(0..100);
    pos.fullmove = rng.random_range(1..300);
    pos
}

pub fn seeded(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}
