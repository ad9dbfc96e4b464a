//! Decoder for the progressive (v2) tabular result protocol.
//!
//! Input is a sequence of already-decoded JSON frame objects; output is a
//! sequence of finished tables followed by the dataset completion status.
//!
//! ```text
//! element → classify → parse → coerce (cells) → Assembler → Sequencer → caller
//! ```

pub mod assembler;
pub mod classify;
pub mod coerce;
pub mod frame;
pub mod parse;
pub mod sequencer;
pub mod stream;
mod wire;

pub use assembler::Assembler;
pub use classify::{classify, frame_kind};
pub use coerce::{coerce, CoerceError};
pub use frame::{
    FragmentMode, Frame, RawRow, TableCompletion, TableFragment, TableHeader, TableProgress,
};
pub use sequencer::{decode_all, DataSet, Decoder, Sequencer};
pub use stream::{decode_stream, DecodeStream};
