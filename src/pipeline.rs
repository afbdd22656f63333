//! # The pipeline
//!
//! A [`Session`] holds at most one loaded position. Loading runs the
//! decoder, the board encoder and the piece list builder; generating runs
//! the per-square move generator over every cell and the arbiter over the
//! results.
//!
//! [`serve`] drives a session from three framed byte interfaces and a
//! start strobe, the way the hardware pipeline is driven. Position bytes
//! reach the decoder beat by beat, so a bad byte is rejected as soon as
//! it arrives and no burst is ever held in full:
//!
//! ```text
//!  position-in --> load --> board-out
//!                    \----> meta (watch)
//!  start (mpsc) ---> generate --> move-out
//! ```

use futures::{SinkExt, StreamExt};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    sync::{mpsc, watch},
};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::{
    arbiter::{EncodedMove, MoveBurst, PieceList, arbitrate},
    board::{self, BinaryBoard, BoardMeta},
    config::{MoveGenConfig, PipelineConfig, TransportConfig},
    decode::FenDecoder,
    error::PipelineError,
    model::{ChessColor, ChessMan, Mailbox, Position},
    movegen::MoveGen,
    stream::{Beat, BeatCodec, Burst, BurstCodec},
};

/// Everything derived from one position burst.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub position: Position,
    pub board: BinaryBoard,
    pub meta: BoardMeta,
    /// The board in grid order.
    pub grid: Mailbox<Option<ChessMan>>,
    /// Piece lists indexed by [`ChessColor`].
    pub pieces: [PieceList; 2],
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    config: MoveGenConfig,
    decoder: FenDecoder,
    loaded: Option<Loaded>,
}

impl Session {
    pub fn new(config: MoveGenConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn loaded(&self) -> Option<&Loaded> {
        self.loaded.as_ref()
    }

    /// Start a new position burst, dropping whatever was loaded.
    pub fn begin(&mut self) {
        self.loaded = None;
        self.decoder.reset();
    }

    /// Feed one beat of a position burst, loading the position on the
    /// burst's last beat. A failed beat leaves nothing loaded, and the
    /// rest of its burst keeps failing until the next start-of-burst.
    pub fn feed(&mut self, beat: Beat<u8>) -> Result<Option<&Loaded>, PipelineError> {
        if beat.sop {
            self.begin();
        }
        let position = match beat.data {
            Some(b) => self.decoder.feed(b, beat.eop),
            None => self.decoder.finish().map(Some),
        };
        match position {
            Ok(Some(position)) => self.install(position).map(Some),
            Ok(None) => Ok(None),
            Err(e) => {
                self.loaded = None;
                Err(e.into())
            }
        }
    }

    /// Load a whole position burst. A failed load leaves nothing loaded.
    pub fn load(&mut self, burst: &[u8]) -> Result<&Loaded, PipelineError> {
        self.begin();
        for b in burst {
            self.decoder.push(*b)?;
        }
        let position = self.decoder.finish()?;
        self.install(position)
    }

    /// Load a board that is already encoded.
    pub fn load_board(
        &mut self,
        board: &BinaryBoard,
        meta: &BoardMeta,
    ) -> Result<&Loaded, PipelineError> {
        self.loaded = None;
        let position = board::decode(board, meta)?;
        self.install(position)
    }

    fn install(&mut self, position: Position) -> Result<&Loaded, PipelineError> {
        let (board, meta) = board::encode(&position);
        let grid = board.to_grid()?;
        let budget = self.config.slot_budget;
        let pieces = [
            PieceList::build(&grid, ChessColor::WHITE, budget)?,
            PieceList::build(&grid, ChessColor::BLACK, budget)?,
        ];
        debug!(
            fen = %position,
            white = pieces[0].len(),
            black = pieces[1].len(),
            "position loaded"
        );
        Ok(&*self.loaded.insert(Loaded {
            position,
            board,
            meta,
            grid,
            pieces,
        }))
    }

    /// One generation pass over the loaded position.
    pub fn generate(&self) -> Result<MoveBurst, PipelineError> {
        let loaded = self.loaded.as_ref().ok_or(PipelineError::NotLoaded)?;
        let movegen = MoveGen::new(&loaded.grid, &loaded.meta, self.config.promotions);
        let cells = movegen.by_square();
        let burst = arbitrate(&cells, &loaded.pieces[movegen.player().ix()]);
        debug!(side = ?movegen.player(), moves = burst.len(), "generated");
        Ok(burst)
    }
}

/// The interfaces [`serve`] runs on.
pub struct Ports<R, B, M> {
    pub positions: R,
    pub boards: B,
    pub moves: M,
    /// Metadata of the loaded position, `None` until the first load.
    pub meta: watch::Sender<Option<BoardMeta>>,
    pub start: mpsc::Receiver<()>,
}

/// The start strobe queue, sized from the config.
pub fn strobe_channel(config: &TransportConfig) -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(config.queue_depth.max(1))
}

/// Serve position bursts until position-in ends or the strobe closes.
///
/// Each accepted position is answered with its board burst, then one move
/// burst for the first start strobe after it. Strobes that arrived before
/// the position loaded are dropped. A rejected position clears the
/// metadata and the rest of its burst is skipped. Framing and transport
/// errors end the service.
pub async fn serve<R, B, M>(ports: Ports<R, B, M>, config: &PipelineConfig) -> Result<(), PipelineError>
where
    R: AsyncRead + Unpin,
    B: AsyncWrite + Unpin,
    M: AsyncWrite + Unpin,
{
    let Ports {
        positions,
        boards,
        moves,
        meta,
        mut start,
    } = ports;
    let mut positions = FramedRead::new(positions, BeatCodec::<u8>::new());
    let mut boards = FramedWrite::new(boards, BurstCodec::<u8>::new());
    let mut moves = FramedWrite::new(moves, BurstCodec::<EncodedMove>::new());
    let mut session = Session::new(config.movegen);

    info!(?config, "pipeline serving");
    let mut skipping = false;
    while let Some(beat) = positions.next().await {
        let beat = beat?;
        if beat.sop {
            skipping = false;
        } else if skipping {
            continue;
        }

        let board = match session.feed(beat) {
            Ok(None) => continue,
            Ok(Some(loaded)) => {
                meta.send_replace(Some(loaded.meta));
                loaded.board
            }
            Err(e) => {
                warn!(error = %e, "position rejected");
                meta.send_replace(None);
                skipping = !beat.eop;
                continue;
            }
        };

        while start.try_recv().is_ok() {
            debug!("stale start strobe dropped");
        }
        boards.send(Burst::from(board)).await?;

        if start.recv().await.is_none() {
            info!("start strobe closed");
            break;
        }
        moves.send(Burst::from(session.generate()?)).await?;
    }
    info!("pipeline stopped");
    Ok(())
}

#[test]
fn generate_needs_a_position() {
    let session = Session::default();
    assert!(matches!(session.generate(), Err(PipelineError::NotLoaded)));
}

#[test]
fn failed_load_unloads() {
    let mut session = Session::default();
    session.load(b"8/8/8/8/8/8/8/k7 w - - 0 1").unwrap();
    assert!(session.generate().unwrap().is_empty());
    assert!(matches!(
        session.load(b"8/8/8/8/8/8/8/k7 x - - 0 1"),
        Err(PipelineError::Decode(_))
    ));
    assert!(session.loaded().is_none());
    assert!(matches!(session.generate(), Err(PipelineError::NotLoaded)));
}

#[test]
fn generation_is_idempotent() {
    let mut session = Session::default();
    session
        .load(b"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
        .unwrap();
    let first = session.generate().unwrap();
    assert_eq!(first.len(), 20);
    assert_eq!(session.generate().unwrap(), first);
}

#[test]
fn budget_applies_at_load() {
    let mut session = Session::new(MoveGenConfig {
        slot_budget: Some(8),
        ..Default::default()
    });
    assert!(matches!(
        session.load(b"rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
        Err(PipelineError::Capacity(_))
    ));
    assert!(session.load(b"4k3/8/8/8/8/8/8/4K3 w - - 0 1").is_ok());
}

#[test]
fn bad_byte_fails_its_beat() {
    let mut session = Session::default();
    session.load(b"4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let first = Beat {
        sop: true,
        eop: false,
        data: Some(b'x'),
    };
    assert!(matches!(
        session.feed(first),
        Err(PipelineError::Decode(crate::error::DecodeError::UnknownPiece { offset: 0, .. }))
    ));
    assert!(session.loaded().is_none());

    let mut loaded = None;
    let fen = b"8/8/8/8/8/8/8/k7 b - - 0 1";
    for (ix, b) in fen.iter().copied().enumerate() {
        let beat = Beat {
            sop: ix == 0,
            eop: ix == fen.len() - 1,
            data: Some(b),
        };
        loaded = session.feed(beat).unwrap().map(|l| l.meta);
    }
    assert_eq!(loaded.map(|meta| meta.wtp), Some(false));
    assert_eq!(session.generate().unwrap().len(), 3);
}

#[test]
fn empty_position_burst_is_rejected() {
    let mut session = Session::default();
    let void = Beat {
        sop: true,
        eop: true,
        data: None,
    };
    assert!(matches!(session.feed(void), Err(PipelineError::Decode(_))));
}

#[test]
fn board_loads_like_text() {
    let fen = b"8/8/8/2k5/2pP4/8/B7/4K3 b - d3 0 3";
    let mut text = Session::default();
    let loaded = text.load(fen).unwrap().clone();
    let mut bin = Session::default();
    bin.load_board(&loaded.board, &loaded.meta).unwrap();
    assert_eq!(bin.generate().unwrap(), text.generate().unwrap());
}
