//! Error taxonomy of the pipeline.

use crate::decode::FenField;

/// Why a position burst was rejected.
///
/// `offset` is the zero-based index of the offending byte within the
/// burst, or the burst length when the burst ended too early.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unrecognized placement byte {byte:#04x} at offset {offset}")]
    UnknownPiece { offset: usize, byte: u8 },

    #[error("rank {rank} covers {squares} squares rather than 8 (offset {offset})")]
    RankLength {
        offset: usize,
        rank: u8,
        squares: u8,
    },

    #[error("placement has more than 8 ranks (offset {offset})")]
    TooManyRanks { offset: usize },

    #[error("expected w or b at offset {offset}, found {byte:#04x}")]
    SideToMove { offset: usize, byte: u8 },

    #[error("castling byte {byte:#04x} at offset {offset} is unknown or repeats a right")]
    Castling { offset: usize, byte: u8 },

    #[error("malformed en-passant square at offset {offset}")]
    EnPassant { offset: usize },

    #[error("expected a digit in the {field:?} field at offset {offset}, found {byte:#04x}")]
    Counter {
        offset: usize,
        field: FenField,
        byte: u8,
    },

    #[error("the {field:?} field at offset {offset} does not fit in 32 bits")]
    CounterOverflow { offset: usize, field: FenField },

    #[error("full-move number ending at offset {offset} is zero")]
    ZeroFullmove { offset: usize },

    #[error("burst ended at offset {offset} inside the {field:?} field")]
    Truncated { offset: usize, field: FenField },

    #[error("byte at offset {offset} follows a complete position")]
    Trailing { offset: usize },

    #[error("decoder already failed, reset it before feeding more bytes")]
    Poisoned,
}

/// A binary board cell holds a code that is not a chessman.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("wire cell {ix} holds code {code}, which is no chessman")]
pub struct BoardCodeError {
    pub ix: usize,
    pub code: u8,
}

/// A color holds more men than the piece list budget allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{color:?} holds {count} men, the piece list budget is {budget}")]
pub struct CapacityError {
    pub color: crate::model::ChessColor,
    pub count: usize,
    pub budget: usize,
}

/// Violations of the burst framing on a byte transport.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    #[error("beat without start-of-burst outside a burst")]
    NoStart,

    #[error("start-of-burst inside an open burst")]
    NestedStart,

    #[error("unknown beat header {0:#04x}")]
    Header(u8),

    #[error("void beat must be the sole beat of a burst")]
    StrayVoid,

    #[error("beat payload {0:02x?} is not a valid lane value")]
    Payload(Vec<u8>),

    #[error("transport closed inside a burst")]
    Truncated,

    #[error("transport I/O: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Board(#[from] BoardCodeError),

    #[error(transparent)]
    Capacity(#[from] CapacityError),

    #[error(transparent)]
    Framing(#[from] FramingError),

    #[error("generation started before a position was loaded")]
    NotLoaded,
}
