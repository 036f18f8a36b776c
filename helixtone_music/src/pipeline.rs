// Sequence to verified MIDI bytes, and bytes to disk.
//
// `render` is pure: it generates the event schedule, encodes it, decodes the
// result with midly and checks it against the schedule. Only a `Rendering`
// that passed that check can be written. `write_atomic` stages the bytes in a
// temporary file next to the destination and renames it into place, so the
// destination either keeps its previous content or holds the complete new
// file.

use crate::alphabet::Sequence;
use crate::beats::Beats;
use crate::error::{EncodeError, PipelineError};
use crate::events::{DurationPolicy, NoteEvent, generate_events, total_beats};
use crate::smf::{SmfSettings, SmfSummary, encode, inspect, verify};
use crate::table::PitchTable;
use std::io::Write;
use std::path::Path;

/// A converted sequence, ready to be written.
#[derive(Debug, Clone)]
pub struct Rendering {
    pub sequence: Sequence,
    pub events: Vec<NoteEvent>,
    pub smf: Vec<u8>,
    pub summary: SmfSummary,
    /// End of the last note.
    pub total_beats: Beats,
}

impl Rendering {
    /// Playing time at the given tempo.
    pub fn duration_seconds(&self, tempo_bpm: u32) -> f64 {
        self.total_beats.as_f64() * 60.0 / f64::from(tempo_bpm.max(1))
    }
}

pub fn render(
    sequence: Sequence,
    pitches: &PitchTable,
    durations: &mut dyn DurationPolicy,
    settings: &SmfSettings,
) -> Result<Rendering, PipelineError> {
    let events = generate_events(&sequence, pitches, durations)?;
    let total_beats = total_beats(&events).ok_or(EncodeError::BeatOverflow {
        index: events.len().saturating_sub(1),
    })?;
    let smf = encode(&events, settings)?;
    let summary = inspect(&smf)?;
    verify(&summary, &events, settings)?;
    log::debug!("rendered {} notes into {} bytes", events.len(), smf.len());
    Ok(Rendering {
        sequence,
        events,
        smf,
        summary,
        total_beats,
    })
}

/// Replace `path` with `bytes` without ever exposing a partial file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let write_error = |source: std::io::Error| PipelineError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
    staged.write_all(bytes).map_err(write_error)?;
    staged.as_file().sync_all().map_err(write_error)?;
    staged.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConverterConfig;
    use crate::events::CyclingDurations;
    use crate::normalize::normalize;

    fn quarter_notes() -> CyclingDurations {
        CyclingDurations::fixed(Beats::ONE).unwrap()
    }

    #[test]
    fn test_render_produces_verified_bytes() {
        let rendering = render(
            normalize("ATCG"),
            &PitchTable::default(),
            &mut quarter_notes(),
            &SmfSettings::default(),
        )
        .unwrap();
        assert_eq!(rendering.events.len(), 4);
        assert_eq!(&rendering.smf[..4], b"MThd");
        assert_eq!(rendering.summary.notes.len(), 4);
        assert_eq!(rendering.total_beats, Beats::whole(4));
        assert!((rendering.duration_seconds(120) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_surfaces_encode_errors() {
        let bad_channel = SmfSettings {
            channel: 16,
            ..SmfSettings::default()
        };
        assert!(matches!(
            render(normalize("AT"), &PitchTable::default(), &mut quarter_notes(), &bad_channel),
            Err(PipelineError::Encode(EncodeError::InvalidSettings(_)))
        ));

        let coarse = SmfSettings {
            ticks_per_quarter: 1,
            ..SmfSettings::default()
        };
        let mut tiny = CyclingDurations::fixed(Beats::new(1, 4)).unwrap();
        assert!(matches!(
            render(normalize("AT"), &PitchTable::default(), &mut tiny, &coarse),
            Err(PipelineError::Encode(EncodeError::BelowResolution { index: 0, .. }))
        ));
    }

    #[test]
    fn test_render_rejects_unrepresentable_schedule() {
        // Pairwise coprime denominators: the onset of the fourth note has a
        // denominator near 10^24.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("helixtone.json");
        std::fs::write(
            &path,
            r#"{"durations": ["999983/1000003", "1000000/1000033", "1000000/1000037", "1000000/1000039"]}"#,
        )
        .unwrap();
        let config = ConverterConfig::load(&path).unwrap();
        let mut durations = CyclingDurations::new(config.durations.clone()).unwrap();

        let result = render(
            normalize("ATCGATCG"),
            &config.pitch_table().unwrap(),
            &mut durations,
            &config.midi,
        );
        assert!(matches!(
            result,
            Err(PipelineError::Encode(EncodeError::BeatOverflow { index: 3 }))
        ));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mid");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_write_atomic_reports_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.mid");
        assert!(matches!(
            write_atomic(&path, b"x"),
            Err(PipelineError::Write { .. })
        ));
        assert!(!path.exists());
    }
}
