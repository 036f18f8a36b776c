// Standard MIDI File support.
//
// - vlq.rs: variable-length quantity encode/decode
// - encode.rs: format-0 writer (`SmfSettings`, `build_track`, `encode`)
// - inspect.rs: read-back through `midly` and verification against the
//   source events

pub mod encode;
pub mod inspect;
pub mod vlq;

pub use encode::{SmfSettings, TimedEvent, TrackEvent, build_track, encode};
pub use inspect::{DecodedNote, SmfSummary, inspect, verify};
pub use vlq::{VLQ_MAX, read_vlq, write_vlq};
