// Helixtone: nucleotide sequences as music
//
// Converts a DNA sequence into a single-track Standard MIDI File. Each base
// becomes one note: its pitch comes from a per-base table, its length from a
// duration policy (by default a uniform pick from 1/2, 1 and 3/2 beats), and
// notes play back to back from beat zero. The encoded file is decoded again
// and checked against the schedule before it is written, and it is written
// atomically. A two-panel SVG chart and playback through an external player
// are optional extras.
//
// Architecture:
// - alphabet.rs: The five-symbol alphabet (A, T, C, G, N) and `Sequence`
// - normalize.rs: Raw text / FASTA-like files to sequences, random synthesis,
//   and the fallback when an input file cannot be read
// - beats.rs: Exact rational beat values and the beats-to-ticks rounding rule
// - table.rs: Total per-base lookup tables for pitch and color
// - events.rs: Duration policies and the note-event generator
// - smf/: Format-0 SMF encoding (hand-written writer + VLQ) and read-back
//   verification with midly
// - pipeline.rs: Generate, encode, verify, then atomic write
// - visualize.rs: SVG chart of bases and notes (plotters)
// - playback.rs: `Player` trait and the external-command player
// - config.rs: JSON configuration with defaults for every field
// - error.rs: Error types for each stage
//
// Given a seed, every random choice comes from `helixtone_prng::SeqRng`, so a
// run is reproducible.

pub mod alphabet;
pub mod beats;
pub mod config;
pub mod error;
pub mod events;
pub mod normalize;
pub mod pipeline;
pub mod playback;
pub mod smf;
pub mod table;
pub mod visualize;
