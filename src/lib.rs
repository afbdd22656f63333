//! # fenpipe
//!
//! A streaming chess pseudo-legal move generator.
//!
//! Positions come in as FEN text on a burst-framed byte stream. Each one
//! is decoded byte by byte, encoded into a 64-cell binary board, and on a
//! start strobe every cell generates the moves of its own occupant. The
//! arbiter serializes those into one burst of 18-bit move records.
//!
//! ```text
//!  FEN bytes -> decode -> board -> movegen (x64) -> arbiter -> move records
//! ```

/// Modeling the game of chess.
pub mod model;

/// Streaming FEN decoding.
pub mod decode;

/// Coordinate and FEN notation.
pub mod notation;

/// The binary board and its metadata.
pub mod board;

/// Per-square move generation.
pub mod movegen;

/// Piece lists, move records and serialization.
pub mod arbiter;

/// Burst framing.
pub mod stream;

/// The loading session and the async service loop.
pub mod pipeline;

/// Pipeline configuration.
pub mod config;

/// Error types.
pub mod error;

pub use crate::{
    config::{PipelineConfig, PromotionPolicy},
    error::PipelineError,
    pipeline::{Ports, Session, serve},
};
