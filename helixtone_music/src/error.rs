// Error types, one enum per concern.
//
// `EncodeError` is the contract-violation family: an event or setting that
// the generator or config should never have produced reached the encoder.
// It is kept apart from I/O failures, which only appear in `PipelineError`
// (writing the output), `ConfigError` (reading a config file) and
// `PlaybackError`. Visualization and playback errors are reported by the CLI
// but never fail a run.

use crate::alphabet::Base;
use crate::beats::Beats;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("no entry for base {0}")]
    Missing(Base),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{table} table: {source}")]
    Table {
        table: &'static str,
        #[source]
        source: TableError,
    },
    #[error("pitch {pitch} for base {base} is outside 0..=127")]
    PitchOutOfRange { base: Base, pitch: u8 },
    #[error("no allowed durations configured")]
    NoDurations,
    #[error("allowed duration {0} is not positive")]
    NonPositiveDuration(Beats),
    #[error("MIDI settings: {0}")]
    Settings(#[source] EncodeError),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("event {index}: pitch {pitch} is outside 0..=127")]
    PitchOutOfRange { index: usize, pitch: u8 },
    #[error("event {index}: duration {duration} is not positive")]
    NonPositiveDuration { index: usize, duration: Beats },
    #[error("event {index}: onset {onset} is negative")]
    NegativeOnset { index: usize, onset: Beats },
    #[error("event {index}: starts before the previous note ends")]
    Overlap { index: usize },
    #[error("event {index}: duration {duration} is shorter than one tick")]
    BelowResolution { index: usize, duration: Beats },
    #[error("event {index}: tick position out of range")]
    TickOverflow { index: usize },
    #[error("event {index}: beat position is not representable")]
    BeatOverflow { index: usize },
    #[error("value {0} does not fit a variable-length quantity")]
    VlqOverflow(u32),
    #[error("{0}-byte chunk does not fit a 32-bit length")]
    ChunkTooLarge(usize),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("encoded file failed verification: {0}")]
    Verification(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum VisualizeError {
    #[error("failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("lost track of {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Exit { program: String, status: ExitStatus },
}
