/// Decoding, encoding and reading back a board
mod test_utils;

use fenpipe::{
    board::{self, BinaryBoard},
    decode::FenDecoder,
};
use test_utils::*;

#[test]
fn text_and_board_round_trip() {
    let mut rng = seeded(0xB0A2D);
    for _ in 0..300 {
        let pos = random_position(&mut rng);
        let fen = pos.to_string();

        let decoded = FenDecoder::decode(fen.as_bytes()).unwrap();
        assert_eq!(decoded, pos, "{fen}");
        assert_eq!(fen.parse::<fenpipe::model::Position>().unwrap(), pos, "{fen}");

        let (bin, meta) = board::encode(&decoded);
        assert!(bin.as_bytes().iter().all(|code| *code <= 14), "{fen}");
        assert_eq!(board::decode(&bin, &meta).unwrap(), pos, "{fen}");
    }
}

#[test]
fn known_positions_carry_their_metadata() {
    let (_, meta) = board::encode(&position(KNOWN_POSITIONS[1].0));
    assert_eq!((meta.halfmove_clock, meta.fullmove), (0, 29));
    assert_eq!((meta.castle, meta.ep), (0, 0));
    assert!(meta.wtp);

    let (bin, meta) = board::encode(&position(KNOWN_POSITIONS[0].0));
    assert_eq!(meta.castle, 0b1111);
    assert_eq!(bin, BinaryBoard::encode(&position(KNOWN_POSITIONS[0].0).placement));
}
