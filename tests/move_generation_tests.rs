/// Move generation checked against the brute-force reference
mod test_utils;

use fenpipe::{
    PromotionPolicy, Session,
    arbiter::{EncodedMove, SLOT_BUDGET},
    config::MoveGenConfig,
    movegen::Promotion,
    notation::CoordNotation,
};
use test_utils::*;

#[test]
fn known_positions_have_known_counts() {
    for (fen, count) in KNOWN_POSITIONS {
        let pos = position(fen);
        assert_eq!(
            generated(&pos, PromotionPolicy::EachPiece).len(),
            *count,
            "{fen}"
        );
    }
}

#[test]
fn known_positions_match_reference() {
    for policy in [PromotionPolicy::EachPiece, PromotionPolicy::Deferred] {
        for (fen, _) in KNOWN_POSITIONS {
            let pos = position(fen);
            assert_eq!(
                sorted(generated(&pos, policy)),
                sorted(reference_moves(&pos, policy)),
                "{fen} {policy:?}"
            );
        }
    }
}

#[test]
fn random_positions_match_reference() {
    let mut rng = seeded(0x5EED);
    for _ in 0..500 {
        let pos = random_position(&mut rng);
        assert_eq!(
            sorted(generated(&pos, PromotionPolicy::EachPiece)),
            sorted(reference_moves(&pos, PromotionPolicy::EachPiece)),
            "{pos}"
        );
    }
}

#[test]
fn emitted_moves_are_distinct() {
    let mut rng = seeded(7);
    for _ in 0..200 {
        let pos = random_position(&mut rng);
        let mut moves = generated(&pos, PromotionPolicy::EachPiece);
        let n = moves.len();
        moves.sort();
        moves.dedup();
        assert_eq!(moves.len(), n, "{pos}");
    }
}

#[test]
fn session_burst_matches_generator_order() {
    let mut rng = seeded(42);
    let mut session = Session::new(MoveGenConfig::default());
    for _ in 0..100 {
        let pos = random_position(&mut rng);
        session.load(pos.to_string().as_bytes()).unwrap();
        let burst = session.generate().unwrap();
        let emitted: Vec<String> = burst
            .candidates()
            .map(|mv| CoordNotation::from(mv).to_string())
            .collect();
        assert_eq!(emitted, generated(&pos, PromotionPolicy::EachPiece), "{pos}");
        assert_eq!(session.generate().unwrap(), burst);
    }
}

#[test]
fn emitted_records_name_the_mover() {
    let mut session = Session::default();
    let loaded = session
        .load(b"8/2P2P1k/8/8/8/8/8/4K3 w - - 0 29")
        .unwrap()
        .clone();
    for record in session.generate().unwrap().moves {
        let mv = record.decode().unwrap();
        let man = loaded.position.man_at(mv.from).unwrap();
        assert_eq!(man.ech(), mv.ech);
        assert_eq!(man.col(), loaded.meta.to_move());
        assert_eq!(EncodedMove::from_bytes(record.to_bytes()), Some(record));
    }
}

#[test]
fn deferred_promotions_use_the_reserved_code() {
    let mut session = Session::new(MoveGenConfig {
        promotions: PromotionPolicy::Deferred,
        ..Default::default()
    });
    session.load(b"8/2P2P1k/8/8/8/8/8/4K3 w - - 0 29").unwrap();
    let burst = session.generate().unwrap();
    assert_eq!(burst.len(), 7);
    let deferred: Vec<_> = burst
        .moves
        .iter()
        .filter(|mv| mv.promotion_code() == Promotion::DEFERRED_CODE)
        .collect();
    assert_eq!(deferred.len(), 2);
}

#[test]
fn densest_position_fits_the_budget() {
    let mut session = Session::new(MoveGenConfig {
        slot_budget: Some(SLOT_BUDGET),
        ..Default::default()
    });
    let loaded = session
        .load(b"r1n1b1q1/k1b1n1r1/p1p1p1p1/p1p1p1p1/P1P1P1P1/P1P1P1P1/R1N1B1Q1/K1B1N1R1 w KQkq - 0 1")
        .unwrap();
    assert_eq!(loaded.pieces[0].len(), 16);
    assert_eq!(loaded.pieces[1].len(), 16);
    assert_eq!(session.generate().unwrap().len(), 21);
}
