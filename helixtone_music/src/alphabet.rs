// The canonical nucleotide alphabet and the normalized sequence type.
//
// `Base` has exactly five values: the four nucleotides plus `N`, the sentinel
// for anything that is not a nucleotide. `Sequence` is an ordered, possibly
// empty list of `Base`; because its only element type is `Base`, a sequence
// can never hold a symbol outside the alphabet. Construction goes through
// `normalize.rs`, which decides how raw text maps onto bases.
//
// See also: `table.rs` for per-base lookup tables, `events.rs` which turns a
// `Sequence` into note events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One symbol of the canonical alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Base {
    A,
    T,
    C,
    G,
    /// Unknown or invalid input character.
    N,
}

impl Base {
    pub const ALL: [Base; 5] = [Base::A, Base::T, Base::C, Base::G, Base::N];

    /// The four real nucleotides; synthesis draws only from these.
    pub const NUCLEOTIDES: [Base; 4] = [Base::A, Base::T, Base::C, Base::G];

    /// Classify one raw character, case-insensitively. Anything outside
    /// {A,T,C,G} becomes `N`.
    pub fn from_char(c: char) -> Base {
        match c.to_ascii_uppercase() {
            'A' => Base::A,
            'T' => Base::T,
            'C' => Base::C,
            'G' => Base::G,
            _ => Base::N,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Base::A => 'A',
            Base::T => 'T',
            Base::C => 'C',
            Base::G => 'G',
            Base::N => 'N',
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A normalized nucleotide sequence. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    bases: Vec<Base>,
}

impl Sequence {
    pub fn new(bases: Vec<Base>) -> Self {
        Self { bases }
    }

    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn bases(&self) -> &[Base] {
        &self.bases
    }

    pub fn iter(&self) -> impl Iterator<Item = Base> + '_ {
        self.bases.iter().copied()
    }
}

impl FromIterator<Base> for Sequence {
    fn from_iter<I: IntoIterator<Item = Base>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for base in &self.bases {
            write!(f, "{}", base.as_char())?;
        }
        Ok(())
    }
}
