// Sequence normalizer: raw text or a random draw in, `Sequence` out.
//
// Three ways to obtain a sequence:
// - `normalize` classifies every character of a string (sample sequences,
//   command-line input);
// - `parse_sequence_text` reads FASTA-like text: lines that start with the
//   header marker are dropped, the rest are trimmed and concatenated before
//   classification;
// - `synthesize` draws each position uniformly from {A,T,C,G}, so synthetic
//   sequences never contain `N`.
//
// `load_or_synthesize` ties the file path to the fallback policy: an input
// file that cannot be read is a recoverable condition. It is logged and
// replaced by a synthetic sequence of the configured fallback length, and the
// returned `SequenceOrigin` records that the substitution happened.

use crate::alphabet::{Base, Sequence};
use helixtone_prng::SeqRng;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a sequence came from. Reported by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOrigin {
    /// The built-in sample sequence.
    Sample,
    /// Read from this file.
    File(PathBuf),
    /// Drawn at random on request.
    Synthesized { length: usize },
    /// The named file was unavailable; a random sequence was drawn instead.
    Fallback { path: PathBuf, length: usize },
}

impl fmt::Display for SequenceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceOrigin::Sample => write!(f, "sample sequence"),
            SequenceOrigin::File(path) => write!(f, "file {}", path.display()),
            SequenceOrigin::Synthesized { length } => {
                write!(f, "random sequence of {length} bases")
            }
            SequenceOrigin::Fallback { path, length } => write!(
                f,
                "random sequence of {length} bases ({} unavailable)",
                path.display()
            ),
        }
    }
}

/// A normalized sequence plus its provenance.
#[derive(Debug, Clone)]
pub struct LoadedSequence {
    pub sequence: Sequence,
    pub origin: SequenceOrigin,
}

/// Classify every character of `raw`. Whitespace, digits, ambiguity codes
/// and punctuation all become `N`.
pub fn normalize(raw: &str) -> Sequence {
    raw.chars().map(Base::from_char).collect()
}

/// Normalize FASTA-like text. Lines beginning with `header_marker` are
/// discarded; the remaining lines are trimmed and joined.
pub fn parse_sequence_text(text: &str, header_marker: char) -> Sequence {
    let joined: String = text
        .lines()
        .filter(|line| !line.starts_with(header_marker))
        .map(str::trim)
        .collect();
    normalize(&joined)
}

/// Draw `length` bases uniformly from {A,T,C,G}.
pub fn synthesize(length: usize, rng: &mut SeqRng) -> Sequence {
    (0..length)
        .map(|_| Base::NUCLEOTIDES[rng.range_usize(0, Base::NUCLEOTIDES.len())])
        .collect()
}

/// Read and normalize a sequence file, or synthesize `fallback_length`
/// bases if the file cannot be read.
pub fn load_or_synthesize(
    path: &Path,
    header_marker: char,
    fallback_length: usize,
    rng: &mut SeqRng,
) -> LoadedSequence {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let sequence = parse_sequence_text(&text, header_marker);
            log::debug!("read {} bases from {}", sequence.len(), path.display());
            LoadedSequence {
                sequence,
                origin: SequenceOrigin::File(path.to_path_buf()),
            }
        }
        Err(e) => {
            log::warn!(
                "File {} not available ({e}). Generating random sequence of {fallback_length} bases.",
                path.display()
            );
            LoadedSequence {
                sequence: synthesize(fallback_length, rng),
                origin: SequenceOrigin::Fallback {
                    path: path.to_path_buf(),
                    length: fallback_length,
                },
            }
        }
    }
}
