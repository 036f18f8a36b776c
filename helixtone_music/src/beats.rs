// Exact beat arithmetic.
//
// Note durations and onsets are rational beat counts. Keeping them exact
// means an onset is always precisely the sum of the durations before it;
// float accumulation would drift on long sequences.
//
// `to_ticks` is the one place beats become MIDI ticks. The rule is
// `round_half_away_from_zero(beats * ticks_per_quarter)`, and the encoder
// only ever applies it to absolute positions, so the rounding error of any
// decoded onset is at most half a tick and never accumulates.
//
// All arithmetic is checked. Coprime denominators make the running sum's
// denominator grow as their product, so an unlucky duration set overflows
// `i64` after a few notes; that surfaces as `None`, never as a panic.
//
// In config files a `Beats` value is written as a string: an integer ("1"),
// a fraction ("3/2") or a decimal ("0.5").

use num_rational::Rational64;
use num_traits::{CheckedAdd, CheckedMul};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A rational number of quarter-note beats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Beats(Rational64);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid beat value {0:?}")]
pub struct ParseBeatsError(String);

impl Beats {
    pub const ZERO: Beats = Beats(Rational64::new_raw(0, 1));
    pub const ONE: Beats = Beats(Rational64::new_raw(1, 1));

    /// `numer / denom` beats. Panics if `denom` is zero.
    pub fn new(numer: i64, denom: i64) -> Self {
        Beats(Rational64::new(numer, denom))
    }

    pub fn whole(beats: i64) -> Self {
        Beats(Rational64::from_integer(beats))
    }

    /// The beat position of an absolute tick count.
    pub fn from_ticks(ticks: u32, ticks_per_quarter: u16) -> Self {
        Self::new(i64::from(ticks), i64::from(ticks_per_quarter))
    }

    pub fn is_positive(self) -> bool {
        self.0 > Rational64::from_integer(0)
    }

    pub fn is_negative(self) -> bool {
        self.0 < Rational64::from_integer(0)
    }

    /// `self + rhs`, or `None` if the exact sum is not representable.
    pub fn checked_add(self, rhs: Beats) -> Option<Beats> {
        self.0.checked_add(&rhs.0).map(Beats)
    }

    /// Convert to ticks at `ticks_per_quarter`, rounding half away from zero.
    /// `None` if the result is negative or does not fit in a `u32`.
    pub fn to_ticks(self, ticks_per_quarter: u16) -> Option<u32> {
        let scaled = self
            .0
            .checked_mul(&Rational64::from_integer(i64::from(ticks_per_quarter)))?;
        u32::try_from(scaled.round().to_integer()).ok()
    }

    pub fn as_f64(self) -> f64 {
        *self.0.numer() as f64 / *self.0.denom() as f64
    }
}

impl fmt::Display for Beats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_integer() {
            write!(f, "{}", self.0.numer())
        } else {
            write!(f, "{}/{}", self.0.numer(), self.0.denom())
        }
    }
}

impl FromStr for Beats {
    type Err = ParseBeatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseBeatsError(s.to_string());
        if let Some((int_part, frac_part)) = s.split_once('.') {
            if frac_part.is_empty()
                || frac_part.len() > 9
                || !frac_part.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(err());
            }
            let negative = int_part.starts_with('-');
            let whole: i64 = match int_part.trim_start_matches('-') {
                "" => 0,
                digits => digits.parse().map_err(|_| err())?,
            };
            let denom = 10i64.pow(frac_part.len() as u32);
            let frac: i64 = frac_part.parse().map_err(|_| err())?;
            let magnitude = whole
                .checked_mul(denom)
                .and_then(|w| w.checked_add(frac))
                .ok_or_else(err)?;
            let numer = if negative { -magnitude } else { magnitude };
            return Ok(Beats::new(numer, denom));
        }
        Rational64::from_str(s).map(Beats).map_err(|_| err())
    }
}

impl TryFrom<String> for Beats {
    type Error = ParseBeatsError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Beats> for String {
    fn from(b: Beats) -> String {
        b.to_string()
    }
}
