//! # Burst framing over a byte transport
//!
//! Each of the three interfaces is a stream of beats, grouped into bursts
//! by start-of-burst and end-of-burst markers. On a byte transport a beat
//! is one header byte followed by a fixed-width lane payload:
//!
//! ```text
//!  header  bit 0  start-of-burst
//!          bit 1  end-of-burst
//!          bit 2  void, the payload carries no datum
//! ```
//!
//! A void beat may only appear as the one and only beat of an empty burst,
//! so an empty burst is a single `sop | eop | void` beat. Its payload is
//! zero-filled and ignored.

use std::marker::PhantomData;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::{
    arbiter::{EncodedMove, MoveBurst},
    board::BinaryBoard,
    error::FramingError,
};

pub const SOP: u8 = 0b001;
pub const EOP: u8 = 0b010;
pub const VOID: u8 = 0b100;

/// A fixed-width datum carried by one beat.
pub trait Lane: Sized + Copy {
    const WIDTH: usize;

    fn put(self, dst: &mut BytesMut);

    /// Read from exactly [`Lane::WIDTH`] bytes.
    fn take(src: &[u8]) -> Option<Self>;
}

impl Lane for u8 {
    const WIDTH: usize = 1;

    #[inline]
    fn put(self, dst: &mut BytesMut) {
        dst.put_u8(self)
    }

    #[inline]
    fn take(src: &[u8]) -> Option<Self> {
        src.first().copied()
    }
}

impl Lane for EncodedMove {
    const WIDTH: usize = EncodedMove::WIDTH;

    #[inline]
    fn put(self, dst: &mut BytesMut) {
        dst.put_slice(&self.to_bytes())
    }

    #[inline]
    fn take(src: &[u8]) -> Option<Self> {
        EncodedMove::from_bytes(src.try_into().ok()?)
    }
}

/// One transfer on an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beat<L> {
    pub sop: bool,
    pub eop: bool,
    pub data: Option<L>,
}

impl<L: Lane> Beat<L> {
    pub fn header(&self) -> u8 {
        let mut res = 0;
        if self.sop {
            res |= SOP;
        }
        if self.eop {
            res |= EOP;
        }
        if self.data.is_none() {
            res |= VOID;
        }
        res
    }

    pub fn put(&self, dst: &mut BytesMut) {
        dst.reserve(1 + L::WIDTH);
        dst.put_u8(self.header());
        match self.data {
            Some(d) => d.put(dst),
            None => dst.put_bytes(0, L::WIDTH),
        }
    }
}

/// The data of one whole burst.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Burst<L>(pub Vec<L>);

impl<L: Lane> Burst<L> {
    /// The beats carrying this burst, a single void beat if it is empty.
    pub fn beats(&self) -> impl Iterator<Item = Beat<L>> + '_ {
        let last = self.0.len().saturating_sub(1);
        let void = self.0.is_empty().then_some(Beat {
            sop: true,
            eop: true,
            data: None,
        });
        void.into_iter().chain(self.0.iter().enumerate().map(move |(ix, d)| Beat {
            sop: ix == 0,
            eop: ix == last,
            data: Some(*d),
        }))
    }
}

impl From<BinaryBoard> for Burst<u8> {
    fn from(board: BinaryBoard) -> Self {
        Self(board.0.to_vec())
    }
}

impl From<MoveBurst> for Burst<EncodedMove> {
    fn from(burst: MoveBurst) -> Self {
        Self(burst.moves)
    }
}

/// Frames single beats of lane `L`, checking the burst structure as they
/// pass. Nothing is held back beyond the beat being read.
#[derive(Debug)]
pub struct BeatCodec<L> {
    open: bool,
    lane: PhantomData<L>,
}

impl<L> Default for BeatCodec<L> {
    fn default() -> Self {
        Self {
            open: false,
            lane: PhantomData,
        }
    }
}

impl<L> BeatCodec<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a burst has started but not ended.
    pub fn in_burst(&self) -> bool {
        self.open
    }

    fn fail(&mut self, e: FramingError) -> Result<Option<Beat<L>>, FramingError> {
        self.open = false;
        Err(e)
    }
}

impl<L: Lane> Decoder for BeatCodec<L> {
    type Item = Beat<L>;
    type Error = FramingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Beat<L>>, FramingError> {
        if src.len() < 1 + L::WIDTH {
            return Ok(None);
        }
        let header = src.get_u8();
        let payload = src.split_to(L::WIDTH);

        if header & !(SOP | EOP | VOID) != 0 {
            return self.fail(FramingError::Header(header));
        }
        let (sop, eop, void) = (header & SOP != 0, header & EOP != 0, header & VOID != 0);

        match (self.open, sop) {
            (true, true) => return self.fail(FramingError::NestedStart),
            (false, false) => return self.fail(FramingError::NoStart),
            _ => {}
        }

        let data = if void {
            if !(sop && eop) {
                return self.fail(FramingError::StrayVoid);
            }
            None
        } else {
            match L::take(&payload) {
                Some(datum) => Some(datum),
                None => return self.fail(FramingError::Payload(payload.to_vec())),
            }
        };

        self.open = !eop;
        Ok(Some(Beat { sop, eop, data }))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Beat<L>>, FramingError> {
        match self.decode(src)? {
            Some(beat) => Ok(Some(beat)),
            None if src.is_empty() && !self.open => Ok(None),
            None => self.fail(FramingError::Truncated),
        }
    }
}

/// Frames whole bursts of lane `L` on a byte transport.
#[derive(Debug)]
pub struct BurstCodec<L> {
    beats: BeatCodec<L>,
    open: Option<Vec<L>>,
}

impl<L> Default for BurstCodec<L> {
    fn default() -> Self {
        Self {
            beats: BeatCodec::default(),
            open: None,
        }
    }
}

impl<L> BurstCodec<L> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a burst has started but not ended.
    pub fn in_burst(&self) -> bool {
        self.beats.in_burst()
    }
}

impl<L: Lane> Decoder for BurstCodec<L> {
    type Item = Burst<L>;
    type Error = FramingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Burst<L>>, FramingError> {
        loop {
            let beat = match self.beats.decode(src) {
                Ok(Some(beat)) => beat,
                Ok(None) => return Ok(None),
                Err(e) => {
                    self.open = None;
                    return Err(e);
                }
            };
            self.open.get_or_insert_with(Vec::new).extend(beat.data);
            if beat.eop {
                return Ok(self.open.take().map(Burst));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Burst<L>>, FramingError> {
        match self.decode(src)? {
            Some(burst) => Ok(Some(burst)),
            None if src.is_empty() && !self.in_burst() => Ok(None),
            None => {
                self.open = None;
                self.beats.open = false;
                Err(FramingError::Truncated)
            }
        }
    }
}

impl<L: Lane> Encoder<Burst<L>> for BurstCodec<L> {
    type Error = FramingError;

    fn encode(&mut self, item: Burst<L>, dst: &mut BytesMut) -> Result<(), FramingError> {
        dst.reserve((1 + L::WIDTH) * item.0.len().max(1));
        for beat in item.beats() {
            beat.put(dst);
        }
        Ok(())
    }
}

#[cfg(test)]
fn bytes_of(beats: &[(u8, &str)]) -> BytesMut {
    let mut res = BytesMut::new();
    for (header, payload) in beats {
        res.put_u8(*header);
        res.put_slice(payload.as_bytes());
    }
    res
}

#[test]
fn decodes_bursts_split_across_reads() {
    let mut codec = BurstCodec::<u8>::new();
    let all = bytes_of(&[
        (SOP, "8"),
        (0, " "),
        (EOP, "w"),
        (SOP | EOP, "x"),
    ]);
    let mut src = BytesMut::from(&all[..3]);
    assert_eq!(codec.decode(&mut src).unwrap(), None);
    assert!(codec.in_burst());
    src.extend_from_slice(&all[3..]);
    assert_eq!(codec.decode(&mut src).unwrap(), Some(Burst(b"8 w".to_vec())));
    assert_eq!(codec.decode(&mut src).unwrap(), Some(Burst(b"x".to_vec())));
    assert_eq!(codec.decode_eof(&mut src).unwrap(), None);
}

#[test]
fn beats_are_yielded_as_they_arrive() {
    let mut codec = BeatCodec::<u8>::new();
    let mut src = bytes_of(&[(SOP, "8")]);
    assert_eq!(
        codec.decode(&mut src).unwrap(),
        Some(Beat {
            sop: true,
            eop: false,
            data: Some(b'8')
        })
    );
    assert_eq!(codec.decode(&mut src).unwrap(), None);
    assert!(codec.in_burst());

    src.extend_from_slice(&bytes_of(&[(EOP, "/"), (SOP | EOP | VOID, "\0")]));
    let beats: Vec<_> = std::iter::from_fn(|| codec.decode(&mut src).unwrap()).collect();
    assert_eq!(beats.len(), 2);
    assert!(beats[0].eop && beats[0].data == Some(b'/'));
    assert!(beats[1].sop && beats[1].eop && beats[1].data.is_none());
    assert!(!codec.in_burst());
}

#[test]
fn empty_burst_is_one_void_beat() {
    let mut codec = BurstCodec::<EncodedMove>::new();
    let mut dst = BytesMut::new();
    codec.encode(Burst(Vec::new()), &mut dst).unwrap();
    assert_eq!(&dst[..], &[SOP | EOP | VOID, 0, 0, 0]);
    assert_eq!(codec.decode(&mut dst).unwrap(), Some(Burst(Vec::new())));
    assert!(dst.is_empty());
}

#[test]
fn move_bursts_mark_first_and_last() {
    use crate::{model::{ChessPiece, Square}, movegen::CandidateMove};

    let moves: Vec<EncodedMove> = [(Square::e2, Square::e4), (Square::g1, Square::f3)]
        .into_iter()
        .map(|(from, to)| CandidateMove::new(ChessPiece::PAWN, from, to).into())
        .collect();
    let mut codec = BurstCodec::<EncodedMove>::new();
    let mut dst = BytesMut::new();
    codec.encode(Burst(moves.clone()), &mut dst).unwrap();
    assert_eq!(dst.len(), 8);
    assert_eq!(dst[0], SOP);
    assert_eq!(dst[4], EOP);
    assert_eq!(codec.decode(&mut dst).unwrap(), Some(Burst(moves)));
}

#[test]
fn framing_violations() {
    let mut codec = BurstCodec::<u8>::new();
    let mut src = bytes_of(&[(0, "a")]);
    assert!(matches!(codec.decode(&mut src), Err(FramingError::NoStart)));

    let mut src = bytes_of(&[(SOP, "a"), (SOP, "b")]);
    assert!(matches!(codec.decode(&mut src), Err(FramingError::NestedStart)));
    assert!(!codec.in_burst());

    let mut src = bytes_of(&[(0x08 | SOP, "a")]);
    assert!(matches!(codec.decode(&mut src), Err(FramingError::Header(0x09))));

    let mut src = bytes_of(&[(SOP | VOID, "\0")]);
    assert!(matches!(codec.decode(&mut src), Err(FramingError::StrayVoid)));

    let mut src = bytes_of(&[(SOP, "a")]);
    assert!(matches!(codec.decode_eof(&mut src), Err(FramingError::Truncated)));

    let mut codec = BurstCodec::<EncodedMove>::new();
    let mut src = BytesMut::from(&[SOP | EOP, 0xFF, 0, 0][..]);
    assert!(matches!(codec.decode(&mut src), Err(FramingError::Payload(_))));
}
