// Standard MIDI File writer (format 0, one track).
//
// Encoding happens in two passes. `build_track` validates the note events
// and turns them into a list of `TimedEvent`s with tick deltas; `encode`
// serializes that list into the MThd/MTrk byte layout. Keeping the track as
// data between the passes lets tests inspect deltas without reparsing bytes.
//
// Track layout, in order:
//   track name meta (FF 03), tempo meta (FF 51), one note-on/note-off pair
//   per event, end of track (FF 2F).
//
// Timing: note-on delta = ticks(onset) - tick of the previous note-off,
// note-off delta = ticks(onset + duration) - ticks(onset). `Beats::to_ticks`
// is the only rounding step, always applied to absolute beat positions.
//
// Any event the generator could not have produced (pitch above 127,
// non-positive duration, overlap) is rejected with an `EncodeError` instead
// of being clamped.

use crate::beats::Beats;
use crate::error::EncodeError;
use crate::events::NoteEvent;
use crate::smf::vlq::write_vlq;
use serde::{Deserialize, Serialize};

/// Largest tempo value the 3-byte FF 51 payload can hold.
const MAX_TEMPO_MICROS: u32 = 0x00FF_FFFF;

/// Fixed parameters of the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmfSettings {
    /// Time division written to the header.
    pub ticks_per_quarter: u16,
    pub tempo_bpm: u32,
    /// MIDI channel (0-15) for every note.
    pub channel: u8,
    /// Note-on velocity for every note.
    pub velocity: u8,
    pub track_name: String,
}

impl Default for SmfSettings {
    fn default() -> Self {
        Self {
            ticks_per_quarter: 480,
            tempo_bpm: 120,
            channel: 0,
            velocity: 100,
            track_name: "DNA Music".to_string(),
        }
    }
}

impl SmfSettings {
    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.ticks_per_quarter == 0 || self.ticks_per_quarter >= 0x8000 {
            return Err(EncodeError::InvalidSettings(format!(
                "ticks per quarter {} outside 1..=32767",
                self.ticks_per_quarter
            )));
        }
        let micros = 60_000_000u32.checked_div(self.tempo_bpm).unwrap_or(0);
        if micros == 0 || micros > MAX_TEMPO_MICROS {
            return Err(EncodeError::InvalidSettings(format!(
                "tempo {} BPM cannot be written",
                self.tempo_bpm
            )));
        }
        if self.channel > 15 {
            return Err(EncodeError::InvalidSettings(format!(
                "channel {} outside 0..=15",
                self.channel
            )));
        }
        if self.velocity > 127 {
            return Err(EncodeError::InvalidSettings(format!(
                "velocity {} outside 0..=127",
                self.velocity
            )));
        }
        Ok(())
    }

    /// Microseconds per quarter note.
    pub fn tempo_micros(&self) -> u32 {
        60_000_000 / self.tempo_bpm.max(1)
    }
}

/// One event in the track, without timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackEvent {
    TrackName(String),
    Tempo { micros_per_quarter: u32 },
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    EndOfTrack,
}

/// A track event preceded by its delta time in ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedEvent {
    pub delta: u32,
    pub event: TrackEvent,
}

impl TimedEvent {
    fn at(delta: u32, event: TrackEvent) -> Self {
        Self { delta, event }
    }
}

/// Validate `events` and lay them out as a delta-timed track.
pub fn build_track(
    events: &[NoteEvent],
    settings: &SmfSettings,
) -> Result<Vec<TimedEvent>, EncodeError> {
    settings.validate()?;
    let tpq = settings.ticks_per_quarter;

    let mut track = Vec::with_capacity(events.len() * 2 + 3);
    track.push(TimedEvent::at(
        0,
        TrackEvent::TrackName(settings.track_name.clone()),
    ));
    track.push(TimedEvent::at(
        0,
        TrackEvent::Tempo {
            micros_per_quarter: settings.tempo_micros(),
        },
    ));

    let mut prev_end = Beats::ZERO;
    let mut cursor: u32 = 0;
    for (index, event) in events.iter().enumerate() {
        if event.pitch > 127 {
            return Err(EncodeError::PitchOutOfRange {
                index,
                pitch: event.pitch,
            });
        }
        if !event.duration.is_positive() {
            return Err(EncodeError::NonPositiveDuration {
                index,
                duration: event.duration,
            });
        }
        if event.onset.is_negative() {
            return Err(EncodeError::NegativeOnset {
                index,
                onset: event.onset,
            });
        }
        if event.onset < prev_end {
            return Err(EncodeError::Overlap { index });
        }

        let end = event.end().ok_or(EncodeError::BeatOverflow { index })?;
        let on = event
            .onset
            .to_ticks(tpq)
            .ok_or(EncodeError::TickOverflow { index })?;
        let off = end.to_ticks(tpq).ok_or(EncodeError::TickOverflow { index })?;
        if off <= on {
            return Err(EncodeError::BelowResolution {
                index,
                duration: event.duration,
            });
        }
        let gap = on
            .checked_sub(cursor)
            .ok_or(EncodeError::Overlap { index })?;

        track.push(TimedEvent::at(
            gap,
            TrackEvent::NoteOn {
                channel: settings.channel,
                key: event.pitch,
                velocity: settings.velocity,
            },
        ));
        track.push(TimedEvent::at(
            off - on,
            TrackEvent::NoteOff {
                channel: settings.channel,
                key: event.pitch,
                velocity: 0,
            },
        ));
        prev_end = end;
        cursor = off;
    }

    track.push(TimedEvent::at(0, TrackEvent::EndOfTrack));
    Ok(track)
}

/// Encode `events` as a complete format-0 SMF byte stream.
pub fn encode(events: &[NoteEvent], settings: &SmfSettings) -> Result<Vec<u8>, EncodeError> {
    let track = build_track(events, settings)?;

    let mut body = Vec::with_capacity(track.len() * 4 + settings.track_name.len());
    for event in &track {
        write_event(&mut body, event)?;
    }
    let body_len =
        u32::try_from(body.len()).map_err(|_| EncodeError::ChunkTooLarge(body.len()))?;

    let mut out = Vec::with_capacity(22 + body.len());
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes()); // format 0
    out.extend_from_slice(&1u16.to_be_bytes()); // one track
    out.extend_from_slice(&settings.ticks_per_quarter.to_be_bytes());
    out.extend_from_slice(b"MTrk");
    out.extend_from_slice(&body_len.to_be_bytes());
    out.extend_from_slice(&body);
    log::debug!(
        "encoded {} notes into {} bytes ({} ticks/quarter)",
        events.len(),
        out.len(),
        settings.ticks_per_quarter
    );
    Ok(out)
}

fn write_event(out: &mut Vec<u8>, timed: &TimedEvent) -> Result<(), EncodeError> {
    write_vlq(out, timed.delta)?;
    match &timed.event {
        TrackEvent::TrackName(name) => {
            let len =
                u32::try_from(name.len()).map_err(|_| EncodeError::ChunkTooLarge(name.len()))?;
            out.extend_from_slice(&[0xFF, 0x03]);
            write_vlq(out, len)?;
            out.extend_from_slice(name.as_bytes());
        }
        TrackEvent::Tempo { micros_per_quarter } => {
            let [_, hi, mid, lo] = micros_per_quarter.to_be_bytes();
            out.extend_from_slice(&[0xFF, 0x51, 0x03, hi, mid, lo]);
        }
        TrackEvent::NoteOn {
            channel,
            key,
            velocity,
        } => out.extend_from_slice(&[0x90 | channel, *key, *velocity]),
        TrackEvent::NoteOff {
            channel,
            key,
            velocity,
        } => out.extend_from_slice(&[0x80 | channel, *key, *velocity]),
        TrackEvent::EndOfTrack => out.extend_from_slice(&[0xFF, 0x2F, 0x00]),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, onset: Beats, duration: Beats) -> NoteEvent {
        NoteEvent {
            pitch,
            duration,
            onset,
        }
    }

    const HEADER: [u8; 14] = [
        b'M', b'T', b'h', b'd', 0, 0, 0, 6, 0, 0, 0, 1, 0x01, 0xE0,
    ];

    #[test]
    fn test_empty_file_bytes() {
        let bytes = encode(&[], &SmfSettings::default()).unwrap();
        let mut expected = HEADER.to_vec();
        expected.extend_from_slice(b"MTrk");
        expected.extend_from_slice(&[0, 0, 0, 24]);
        expected.extend_from_slice(&[0x00, 0xFF, 0x03, 9]);
        expected.extend_from_slice(b"DNA Music");
        expected.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20]);
        expected.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_single_quarter_note_bytes() {
        let bytes = encode(&[note(60, Beats::ZERO, Beats::ONE)], &SmfSettings::default()).unwrap();
        let tail = &bytes[bytes.len() - 13..];
        assert_eq!(
            tail,
            &[
                0x00, 0x90, 60, 100, // note on at tick 0
                0x83, 0x60, 0x80, 60, 0, // note off 480 ticks later
                0x00, 0xFF, 0x2F, 0x00,
            ]
        );
        let track_len = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]);
        assert_eq!(track_len as usize, bytes.len() - 22);
    }

    #[test]
    fn test_deltas_follow_the_schedule() {
        let events = [
            note(25, Beats::ZERO, Beats::new(1, 2)),
            note(15, Beats::new(1, 2), Beats::new(3, 2)),
            note(29, Beats::whole(2), Beats::ONE),
        ];
        let track = build_track(&events, &SmfSettings::default()).unwrap();
        let deltas: Vec<u32> = track.iter().map(|e| e.delta).collect();
        assert_eq!(deltas, vec![0, 0, 0, 240, 0, 720, 0, 480, 0]);
        assert_eq!(track.first().unwrap().event, TrackEvent::TrackName("DNA Music".into()));
        assert_eq!(track.last().unwrap().event, TrackEvent::EndOfTrack);
    }

    #[test]
    fn test_gaps_become_note_on_deltas() {
        let events = [
            note(60, Beats::ZERO, Beats::ONE),
            note(62, Beats::whole(3), Beats::ONE),
        ];
        let track = build_track(&events, &SmfSettings::default()).unwrap();
        assert_eq!(track[4].delta, 960);
        assert!(matches!(track[4].event, TrackEvent::NoteOn { key: 62, .. }));
    }

    #[test]
    fn test_tempo_is_derived_from_bpm() {
        let settings = SmfSettings {
            tempo_bpm: 90,
            ..SmfSettings::default()
        };
        let track = build_track(&[], &settings).unwrap();
        assert_eq!(
            track[1].event,
            TrackEvent::Tempo {
                micros_per_quarter: 666_666
            }
        );
    }

    #[test]
    fn test_channel_is_in_status_byte() {
        let settings = SmfSettings {
            channel: 9,
            ..SmfSettings::default()
        };
        let bytes = encode(&[note(36, Beats::ZERO, Beats::ONE)], &settings).unwrap();
        assert!(bytes.windows(3).any(|w| w == [0x99, 36, 100]));
        assert!(bytes.windows(3).any(|w| w == [0x89, 36, 0]));
    }

    #[test]
    fn test_pitch_above_127_fails() {
        let err = encode(&[note(200, Beats::ZERO, Beats::ONE)], &SmfSettings::default());
        assert_eq!(
            err,
            Err(EncodeError::PitchOutOfRange {
                index: 0,
                pitch: 200
            })
        );
    }

    #[test]
    fn test_non_positive_duration_fails() {
        let events = [
            note(60, Beats::ZERO, Beats::ONE),
            note(60, Beats::ONE, Beats::ZERO),
        ];
        assert!(matches!(
            encode(&events, &SmfSettings::default()),
            Err(EncodeError::NonPositiveDuration { index: 1, .. })
        ));
        assert!(matches!(
            encode(&[note(60, Beats::ZERO, Beats::new(-1, 2))], &SmfSettings::default()),
            Err(EncodeError::NonPositiveDuration { index: 0, .. })
        ));
    }

    #[test]
    fn test_overlapping_events_fail() {
        let events = [
            note(60, Beats::ZERO, Beats::ONE),
            note(62, Beats::new(1, 2), Beats::ONE),
        ];
        assert_eq!(
            encode(&events, &SmfSettings::default()),
            Err(EncodeError::Overlap { index: 1 })
        );
    }

    #[test]
    fn test_negative_onset_fails() {
        assert!(matches!(
            encode(&[note(60, Beats::new(-1, 1), Beats::ONE)], &SmfSettings::default()),
            Err(EncodeError::NegativeOnset { index: 0, .. })
        ));
    }

    #[test]
    fn test_sub_tick_duration_fails() {
        assert!(matches!(
            encode(&[note(60, Beats::ZERO, Beats::new(1, 10_000))], &SmfSettings::default()),
            Err(EncodeError::BelowResolution { index: 0, .. })
        ));
    }

    #[test]
    fn test_unrepresentable_end_fails() {
        // Over the common denominator 6 the onset's numerator is 2 * i64::MAX.
        let events = [note(60, Beats::new(i64::MAX, 3), Beats::new(1, 2))];
        assert_eq!(
            encode(&events, &SmfSettings::default()),
            Err(EncodeError::BeatOverflow { index: 0 })
        );
    }

    #[test]
    fn test_tempo_limits() {
        let fastest = SmfSettings {
            tempo_bpm: 60_000_000,
            ..SmfSettings::default()
        };
        fastest.validate().unwrap();
        assert_eq!(fastest.tempo_micros(), 1);

        let too_fast = SmfSettings {
            tempo_bpm: 60_000_001,
            ..SmfSettings::default()
        };
        assert!(matches!(
            too_fast.validate(),
            Err(EncodeError::InvalidSettings(_))
        ));
        let too_fast = SmfSettings {
            tempo_bpm: u32::MAX,
            ..SmfSettings::default()
        };
        assert!(matches!(
            encode(&[], &too_fast),
            Err(EncodeError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_invalid_settings_fail() {
        let bad = [
            SmfSettings {
                ticks_per_quarter: 0,
                ..SmfSettings::default()
            },
            SmfSettings {
                ticks_per_quarter: 0x8000,
                ..SmfSettings::default()
            },
            SmfSettings {
                tempo_bpm: 0,
                ..SmfSettings::default()
            },
            SmfSettings {
                tempo_bpm: 3,
                ..SmfSettings::default()
            },
            SmfSettings {
                channel: 16,
                ..SmfSettings::default()
            },
            SmfSettings {
                velocity: 128,
                ..SmfSettings::default()
            },
        ];
        for settings in bad {
            assert!(
                matches!(encode(&[], &settings), Err(EncodeError::InvalidSettings(_))),
                "{settings:?} should be rejected"
            );
        }
    }
}
