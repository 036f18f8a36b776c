// Event generator: `Sequence` in, monophonic `NoteEvent` list out.
//
// Each base becomes one note. The pitch comes from the `PitchTable`; the
// duration comes from a `DurationPolicy`; the onset is the exact running sum
// of the durations before it, so the schedule has no gaps and no overlaps.
// A running sum that no longer fits an exact `i64` ratio is reported as
// `EncodeError::BeatOverflow` for the first note it affects.
//
// The policy is the only source of variation. `RandomDurations` reproduces
// the uniform draw from the allowed set; `CyclingDurations` repeats a fixed
// pattern, which tests use to pin every duration. Either way every duration
// handed out is a member of the list the policy was built with, and that list
// is checked to be non-empty and strictly positive at construction.
//
// See also: `smf/encode.rs`, which consumes the event list.

use crate::alphabet::Sequence;
use crate::beats::Beats;
use crate::error::{ConfigError, EncodeError};
use crate::table::PitchTable;
use helixtone_prng::SeqRng;

/// One note: a MIDI key held for `duration` beats starting at `onset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub pitch: u8,
    pub duration: Beats,
    pub onset: Beats,
}

impl NoteEvent {
    /// The beat at which this note stops sounding, if representable.
    pub fn end(&self) -> Option<Beats> {
        self.onset.checked_add(self.duration)
    }
}

/// Supplies the duration of each successive note.
pub trait DurationPolicy {
    fn next_duration(&mut self) -> Beats;
}

/// Uniform independent draws from a fixed set of allowed durations.
#[derive(Debug, Clone)]
pub struct RandomDurations {
    choices: Vec<Beats>,
    rng: SeqRng,
}

impl RandomDurations {
    pub fn new(choices: Vec<Beats>, rng: SeqRng) -> Result<Self, ConfigError> {
        validate_durations(&choices)?;
        Ok(Self { choices, rng })
    }
}

impl DurationPolicy for RandomDurations {
    fn next_duration(&mut self) -> Beats {
        // `choices` is non-empty, checked in `new`.
        self.rng.choose(&self.choices).copied().unwrap_or(Beats::ONE)
    }
}

/// Repeats `pattern` in order, forever.
#[derive(Debug, Clone)]
pub struct CyclingDurations {
    pattern: Vec<Beats>,
    next: usize,
}

impl CyclingDurations {
    pub fn new(pattern: Vec<Beats>) -> Result<Self, ConfigError> {
        validate_durations(&pattern)?;
        Ok(Self { pattern, next: 0 })
    }

    /// Every note gets the same duration.
    pub fn fixed(duration: Beats) -> Result<Self, ConfigError> {
        Self::new(vec![duration])
    }
}

impl DurationPolicy for CyclingDurations {
    fn next_duration(&mut self) -> Beats {
        let d = self.pattern[self.next];
        self.next = (self.next + 1) % self.pattern.len();
        d
    }
}

pub(crate) fn validate_durations(durations: &[Beats]) -> Result<(), ConfigError> {
    if durations.is_empty() {
        return Err(ConfigError::NoDurations);
    }
    if let Some(&bad) = durations.iter().find(|d| !d.is_positive()) {
        return Err(ConfigError::NonPositiveDuration(bad));
    }
    Ok(())
}

/// Map every base to a note and lay the notes end to end from beat 0.
pub fn generate_events(
    sequence: &Sequence,
    pitches: &PitchTable,
    durations: &mut dyn DurationPolicy,
) -> Result<Vec<NoteEvent>, EncodeError> {
    let mut events = Vec::with_capacity(sequence.len());
    let mut onset = Beats::ZERO;
    for (index, base) in sequence.iter().enumerate() {
        let event = NoteEvent {
            pitch: pitches.pitch(base),
            duration: durations.next_duration(),
            onset,
        };
        onset = event.end().ok_or(EncodeError::BeatOverflow { index })?;
        events.push(event);
    }
    Ok(events)
}

/// Total length of a schedule in beats. `None` if the last note's end is
/// not representable.
pub fn total_beats(events: &[NoteEvent]) -> Option<Beats> {
    events.last().map_or(Some(Beats::ZERO), NoteEvent::end)
}
