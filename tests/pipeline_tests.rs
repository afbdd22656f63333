/// End-to-end tests of the framed service
mod test_utils;

use std::time::Duration;

use fenpipe::{
    PipelineConfig, PipelineError, Ports,
    arbiter::EncodedMove,
    board::{BinaryBoard, BoardMeta},
    error::FramingError,
    pipeline::strobe_channel,
    serve,
    stream::{Burst, BurstCodec, EOP, SOP},
};
use futures::{SinkExt, StreamExt};
use tokio::{
    io::{AsyncWriteExt, DuplexStream, duplex},
    sync::{mpsc, watch},
    task::JoinHandle,
    time::timeout,
};
use tokio_util::codec::{FramedRead, FramedWrite};

const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

struct Harness {
    positions: FramedWrite<DuplexStream, BurstCodec<u8>>,
    boards: FramedRead<DuplexStream, BurstCodec<u8>>,
    moves: FramedRead<DuplexStream, BurstCodec<EncodedMove>>,
    meta: watch::Receiver<Option<BoardMeta>>,
    start: mpsc::Sender<()>,
    service: JoinHandle<Result<(), PipelineError>>,
}

fn spawn(config: PipelineConfig) -> Harness {
    let (pos_tx, pos_rx) = duplex(256);
    let (board_tx, board_rx) = duplex(1024);
    let (move_tx, move_rx) = duplex(4096);
    let (meta_tx, meta_rx) = watch::channel(None);
    let (start_tx, start_rx) = strobe_channel(&config.transport);

    let service = tokio::spawn(async move {
        serve(
            Ports {
                positions: pos_rx,
                boards: board_tx,
                moves: move_tx,
                meta: meta_tx,
                start: start_rx,
            },
            &config,
        )
        .await
    });

    Harness {
        positions: FramedWrite::new(pos_tx, BurstCodec::new()),
        boards: FramedRead::new(board_rx, BurstCodec::new()),
        moves: FramedRead::new(move_rx, BurstCodec::new()),
        meta: meta_rx,
        start: start_tx,
        service,
    }
}

impl Harness {
    async fn send_fen(&mut self, fen: &str) {
        self.positions
            .send(Burst(fen.as_bytes().to_vec()))
            .await
            .unwrap();
    }

    async fn board(&mut self) -> BinaryBoard {
        let burst = self.boards.next().await.unwrap().unwrap();
        BinaryBoard(burst.0.try_into().unwrap())
    }

    async fn moves(&mut self) -> Vec<String> {
        self.start.send(()).await.unwrap();
        let burst = self.moves.next().await.unwrap().unwrap();
        burst
            .0
            .into_iter()
            .map(|mv| fenpipe::notation::CoordNotation::from(mv.decode().unwrap()).to_string())
            .collect()
    }
}

#[tokio::test]
async fn serves_board_and_moves() {
    let mut h = spawn(PipelineConfig::default());
    h.send_fen("8/5k2/8/8/5q2/3B4/8/4K3 w - - 0 29").await;

    let board = h.board().await;
    assert_eq!(board.at(fenpipe::model::Square::d3), 0xC);
    assert_eq!(board.at(fenpipe::model::Square::f4), 2);

    let meta = h.meta.borrow().expect("metadata published with the board");
    assert_eq!(meta.fullmove, 29);
    assert!(meta.wtp);

    let moves = h.moves().await;
    assert_eq!(moves.len(), 16);
    assert_eq!(moves[0], "e1e2");
    assert!(moves.contains(&"d3a6".to_owned()));

    drop(h.positions);
    h.service.await.unwrap().unwrap();
}

#[tokio::test]
async fn empty_move_burst_is_delivered() {
    let mut h = spawn(PipelineConfig::default());
    h.send_fen("8/8/8/8/8/8/8/k7 w - - 0 1").await;
    h.board().await;
    assert!(h.moves().await.is_empty());
}

#[tokio::test]
async fn rejected_positions_are_skipped() {
    let mut h = spawn(PipelineConfig::default());
    h.send_fen("8/8/8/8/8/8/8/k6 w - - 0 1").await;
    h.send_fen(STARTPOS).await;
    let board = h.board().await;
    assert_eq!(board.0[0], 3);
    assert_eq!(h.moves().await.len(), 20);
}

#[tokio::test]
async fn positions_are_served_in_turn() {
    let mut h = spawn(PipelineConfig::default());
    for (fen, count) in test_utils::KNOWN_POSITIONS {
        h.send_fen(fen).await;
        h.board().await;
        assert_eq!(h.moves().await.len(), *count, "{fen}");
    }
}

#[tokio::test]
async fn deferred_policy_reaches_the_wire() {
    let config =
        PipelineConfig::from_toml_str("[movegen]\npromotions = \"deferred\"").unwrap();
    let mut h = spawn(config);
    h.send_fen("8/2P2P1k/8/8/8/8/8/4K3 w - - 0 29").await;
    h.board().await;
    assert_eq!(h.moves().await.len(), 7);
}

#[tokio::test]
async fn closing_the_strobe_stops_the_service() {
    let mut h = spawn(PipelineConfig::default());
    h.send_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").await;
    h.board().await;
    drop(h.start);
    h.service.await.unwrap().unwrap();
    assert!(h.moves.next().await.is_none());
}

#[tokio::test]
async fn framing_errors_end_the_service() {
    let mut h = spawn(PipelineConfig::default());
    h.positions.get_mut().write_all(&[0, b'8']).await.unwrap();
    let res = h.service.await.unwrap();
    assert!(matches!(
        res,
        Err(PipelineError::Framing(FramingError::NoStart))
    ));
}

#[tokio::test]
async fn strobes_before_the_load_are_dropped() {
    let mut h = spawn(PipelineConfig::default());
    h.start.send(()).await.unwrap();
    h.start.send(()).await.unwrap();
    h.send_fen(STARTPOS).await;
    h.board().await;

    let early = timeout(Duration::from_millis(100), h.moves.next()).await;
    assert!(early.is_err(), "moves emitted without a strobe after the load");
    assert_eq!(h.moves().await.len(), 20);
}

#[tokio::test]
async fn bad_byte_is_rejected_before_end_of_burst() {
    let mut h = spawn(PipelineConfig::default());
    h.send_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").await;
    h.board().await;
    assert_eq!(h.moves().await.len(), 5);
    assert!(h.meta.borrow_and_update().is_some());

    h.positions.get_mut().write_all(&[SOP, b'x']).await.unwrap();
    timeout(Duration::from_secs(5), h.meta.changed())
        .await
        .expect("rejection published while the burst is still open")
        .unwrap();
    assert!(h.meta.borrow().is_none());

    h.positions
        .get_mut()
        .write_all(&[0, b'8', EOP, b'8'])
        .await
        .unwrap();
    h.send_fen(STARTPOS).await;
    assert_eq!(h.board().await.0[0], 3);
    assert!(h.meta.borrow().is_some_and(|meta| meta.castle == 0b1111));
    assert_eq!(h.moves().await.len(), 20);
}
