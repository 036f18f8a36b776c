// Independent read-back of an encoded file.
//
// `inspect` parses SMF bytes with `midly`, which shares no code with
// `encode.rs`, and summarizes what a player would see: header fields, the
// track name and tempo, and every note as an (on tick, off tick) pair.
// `verify` compares that summary against the events and settings the bytes
// were produced from. The pipeline runs both before writing anything to
// disk, so a file that does not decode to the intended schedule is never
// created.

use crate::error::EncodeError;
use crate::events::NoteEvent;
use crate::smf::encode::SmfSettings;
use midly::{Format, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::collections::BTreeMap;

/// A note recovered from the byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedNote {
    pub channel: u8,
    pub key: u8,
    pub velocity: u8,
    pub on_tick: u32,
    pub off_tick: u32,
}

/// What the first track of a file contains, as decoded by `midly`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmfSummary {
    pub format: u16,
    pub track_count: usize,
    pub ticks_per_quarter: u16,
    pub track_name: Option<String>,
    pub tempo_micros: Option<u32>,
    /// Notes in note-off order.
    pub notes: Vec<DecodedNote>,
    /// Note-ons never closed by a matching note-off.
    pub unterminated_notes: usize,
    pub end_of_track: bool,
    /// Every delta time in the first track, in file order.
    pub deltas: Vec<u32>,
}

pub fn inspect(bytes: &[u8]) -> Result<SmfSummary, EncodeError> {
    let smf = Smf::parse(bytes)
        .map_err(|e| EncodeError::Verification(format!("unreadable file: {e}")))?;

    let format = match smf.header.format {
        Format::SingleTrack => 0,
        Format::Parallel => 1,
        Format::Sequential => 2,
    };
    let ticks_per_quarter = match smf.header.timing {
        Timing::Metrical(tpq) => tpq.as_int(),
        Timing::Timecode(..) => {
            return Err(EncodeError::Verification(
                "timecode division instead of ticks per quarter".to_string(),
            ));
        }
    };

    let mut summary = SmfSummary {
        format,
        track_count: smf.tracks.len(),
        ticks_per_quarter,
        track_name: None,
        tempo_micros: None,
        notes: Vec::new(),
        unterminated_notes: 0,
        end_of_track: false,
        deltas: Vec::new(),
    };

    let Some(track) = smf.tracks.first() else {
        return Ok(summary);
    };

    // Sounding notes keyed by (channel, key).
    let mut sounding: BTreeMap<(u8, u8), (u32, u8)> = BTreeMap::new();
    let mut tick: u32 = 0;
    for event in track {
        let delta = event.delta.as_int();
        summary.deltas.push(delta);
        tick = tick.saturating_add(delta);
        match event.kind {
            TrackEventKind::Meta(MetaMessage::TrackName(name)) => {
                summary.track_name = Some(String::from_utf8_lossy(name).into_owned());
            }
            TrackEventKind::Meta(MetaMessage::Tempo(micros)) => {
                summary.tempo_micros = Some(micros.as_int());
            }
            TrackEventKind::Meta(MetaMessage::EndOfTrack) => {
                summary.end_of_track = true;
            }
            TrackEventKind::Midi { channel, message } => {
                let channel = channel.as_int();
                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        sounding.insert((channel, key.as_int()), (tick, vel.as_int()));
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let key = key.as_int();
                        if let Some((on_tick, velocity)) = sounding.remove(&(channel, key)) {
                            summary.notes.push(DecodedNote {
                                channel,
                                key,
                                velocity,
                                on_tick,
                                off_tick: tick,
                            });
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    summary.unterminated_notes = sounding.len();
    Ok(summary)
}

/// Check that `summary` describes exactly `events` encoded with `settings`.
pub fn verify(
    summary: &SmfSummary,
    events: &[NoteEvent],
    settings: &SmfSettings,
) -> Result<(), EncodeError> {
    let fail = |msg: String| Err(EncodeError::Verification(msg));

    if summary.format != 0 || summary.track_count != 1 {
        return fail(format!(
            "format {} with {} tracks, expected format 0 with 1 track",
            summary.format, summary.track_count
        ));
    }
    if summary.ticks_per_quarter != settings.ticks_per_quarter {
        return fail(format!(
            "division {} instead of {}",
            summary.ticks_per_quarter, settings.ticks_per_quarter
        ));
    }
    if summary.tempo_micros != Some(settings.tempo_micros()) {
        return fail(format!(
            "tempo {:?} instead of {}",
            summary.tempo_micros,
            settings.tempo_micros()
        ));
    }
    if summary.track_name.as_deref() != Some(settings.track_name.as_str()) {
        return fail(format!("track name {:?}", summary.track_name));
    }
    if !summary.end_of_track {
        return fail("missing end-of-track".to_string());
    }
    if summary.unterminated_notes > 0 {
        return fail(format!("{} notes never released", summary.unterminated_notes));
    }
    if summary.notes.len() != events.len() {
        return fail(format!(
            "{} notes decoded, {} expected",
            summary.notes.len(),
            events.len()
        ));
    }

    let tpq = settings.ticks_per_quarter;
    for (index, (decoded, event)) in summary.notes.iter().zip(events).enumerate() {
        let on = event.onset.to_ticks(tpq);
        let off = event.end().and_then(|end| end.to_ticks(tpq));
        if decoded.key != event.pitch
            || decoded.channel != settings.channel
            || decoded.velocity != settings.velocity
            || Some(decoded.on_tick) != on
            || Some(decoded.off_tick) != off
        {
            return fail(format!("note {index} decoded as {decoded:?}, expected {event:?}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beats::Beats;
    use crate::smf::encode::encode;

    fn schedule() -> Vec<NoteEvent> {
        let durations = [Beats::new(1, 2), Beats::ONE, Beats::new(3, 2), Beats::ONE];
        let mut onset = Beats::ZERO;
        durations
            .iter()
            .zip([25u8, 15, 29, 41])
            .map(|(&duration, pitch)| {
                let e = NoteEvent {
                    pitch,
                    duration,
                    onset,
                };
                onset = onset.checked_add(duration).unwrap();
                e
            })
            .collect()
    }

    #[test]
    fn test_encoded_schedule_reads_back() {
        let settings = SmfSettings::default();
        let events = schedule();
        let summary = inspect(&encode(&events, &settings).unwrap()).unwrap();

        assert_eq!(summary.format, 0);
        assert_eq!(summary.track_count, 1);
        assert_eq!(summary.ticks_per_quarter, 480);
        assert_eq!(summary.tempo_micros, Some(500_000));
        assert_eq!(summary.track_name.as_deref(), Some("DNA Music"));
        assert!(summary.end_of_track);
        let spans: Vec<(u8, u32, u32)> = summary
            .notes
            .iter()
            .map(|n| (n.key, n.on_tick, n.off_tick))
            .collect();
        assert_eq!(
            spans,
            vec![(25, 0, 240), (15, 240, 720), (29, 720, 1440), (41, 1440, 1920)]
        );
        verify(&summary, &events, &settings).unwrap();
    }

    #[test]
    fn test_verify_catches_mismatches() {
        let settings = SmfSettings::default();
        let events = schedule();
        let summary = inspect(&encode(&events, &settings).unwrap()).unwrap();

        let mut fewer = events.clone();
        fewer.pop();
        assert!(verify(&summary, &fewer, &settings).is_err());

        let mut other_pitch = events.clone();
        other_pitch[2].pitch = 30;
        assert!(verify(&summary, &other_pitch, &settings).is_err());

        let slower = SmfSettings {
            tempo_bpm: 60,
            ..settings.clone()
        };
        assert!(verify(&summary, &events, &slower).is_err());
    }

    #[test]
    fn test_garbage_is_a_verification_error() {
        assert!(matches!(
            inspect(b"not a midi file"),
            Err(EncodeError::Verification(_))
        ));
    }

    #[test]
    fn test_note_on_with_zero_velocity_ends_a_note() {
        let mut bytes = b"MThd\x00\x00\x00\x06\x00\x00\x00\x01\x00\x60MTrk".to_vec();
        let body = [
            0x00, 0x90, 60, 90, // on
            0x60, 0x90, 60, 0, // on with velocity 0 = off
            0x00, 0xFF, 0x2F, 0x00,
        ];
        bytes.extend_from_slice(&(body.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&body);
        let summary = inspect(&bytes).unwrap();
        assert_eq!(summary.ticks_per_quarter, 96);
        assert_eq!(
            summary.notes,
            vec![DecodedNote {
                channel: 0,
                key: 60,
                velocity: 90,
                on_tick: 0,
                off_tick: 96
            }]
        );
        assert_eq!(summary.unterminated_notes, 0);
    }
}
