// Data-driven converter configuration.
//
// Every tunable the pipeline reads lives in `ConverterConfig`: the per-base
// pitch and color tables, the allowed note durations, the MIDI file settings,
// sequence length limits, output paths and the external player command. The
// defaults reproduce the classic DNA-to-music mapping (A=25, T=15, C=29,
// G=41, N=33; durations of 1/2, 1 and 3/2 beats; 120 BPM).
//
// Config files are JSON. Every struct is `#[serde(default)]`, so a file only
// needs to name the fields it changes. `load` parses and then validates, so
// a config that reaches the pipeline always yields total tables, a usable
// duration set and encodable MIDI settings.
//
// See also: `main.rs`, which looks for `--config PATH` and then
// `helixtone.json` in the working directory.

use crate::alphabet::{Base, Sequence};
use crate::beats::Beats;
use crate::error::ConfigError;
use crate::events::validate_durations;
use crate::normalize::normalize;
use crate::playback::CommandPlayer;
use crate::smf::SmfSettings;
use crate::table::{BaseTable, ColorTable, PitchTable, Rgb};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::IntErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// External MIDI player invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub program: String,
    /// Arguments; `{file}` is replaced by the MIDI path. If no argument
    /// mentions `{file}`, the path is appended.
    pub args: Vec<String>,
    /// How often to check whether playback has finished.
    pub poll_interval_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            program: "timidity".to_string(),
            args: Vec::new(),
            poll_interval_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub pitches: BTreeMap<Base, u8>,
    pub colors: BTreeMap<Base, Rgb>,
    /// Allowed note lengths in beats; each note draws one uniformly.
    pub durations: Vec<Beats>,
    pub midi: SmfSettings,
    /// Lines of a sequence file starting with this are descriptions.
    pub header_marker: char,
    /// Menu option 1.
    pub sample_sequence: String,
    /// Length synthesized when an input file cannot be read.
    pub fallback_length: usize,
    /// Bounds applied to a requested random sequence length.
    pub min_length: usize,
    pub max_length: usize,
    pub output_path: PathBuf,
    pub plot_path: PathBuf,
    pub player: PlayerConfig,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            pitches: PitchTable::default().as_table().to_map(),
            colors: ColorTable::default().to_map(),
            durations: vec![Beats::new(1, 2), Beats::ONE, Beats::new(3, 2)],
            midi: SmfSettings::default(),
            header_marker: '>',
            sample_sequence: "ATCG".repeat(8),
            fallback_length: 100,
            min_length: 10,
            max_length: 500,
            output_path: PathBuf::from("dna_music.mid"),
            plot_path: PathBuf::from("dna_music_visualization.svg"),
            player: PlayerConfig::default(),
        }
    }
}

impl ConverterConfig {
    /// Read, parse and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pitch_table()?;
        self.color_table()?;
        validate_durations(&self.durations)?;
        self.midi.validate().map_err(ConfigError::Settings)?;
        if self.min_length > self.max_length {
            return Err(ConfigError::Invalid(format!(
                "min_length {} exceeds max_length {}",
                self.min_length, self.max_length
            )));
        }
        if self.player.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "player poll interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn pitch_table(&self) -> Result<PitchTable, ConfigError> {
        PitchTable::from_map(&self.pitches)
    }

    pub fn color_table(&self) -> Result<ColorTable, ConfigError> {
        BaseTable::from_map(&self.colors).map_err(|source| ConfigError::Table {
            table: "color",
            source,
        })
    }

    /// Clamp a requested random sequence length into `[min_length, max_length]`.
    pub fn clamp_length(&self, requested: usize) -> usize {
        requested.clamp(self.min_length, self.max_length)
    }

    /// Parse a typed random sequence length and clamp it. Negative and
    /// oversized integers clamp to the nearest bound; `None` means the input
    /// is not an integer at all.
    pub fn parse_length(&self, input: &str) -> Option<usize> {
        let requested = match input.trim().parse::<i128>() {
            Ok(n) => n,
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => i128::MAX,
                IntErrorKind::NegOverflow => i128::MIN,
                _ => return None,
            },
        };
        let low = i128::try_from(self.min_length).unwrap_or(i128::MAX);
        let high = i128::try_from(self.max_length).unwrap_or(i128::MAX);
        usize::try_from(requested.max(low).min(high)).ok()
    }

    /// `parse_length`, or the clamped fallback length for non-numeric input.
    pub fn requested_length(&self, input: &str) -> usize {
        self.parse_length(input)
            .unwrap_or_else(|| self.clamp_length(self.fallback_length))
    }

    pub fn sample(&self) -> Sequence {
        normalize(&self.sample_sequence)
    }

    pub fn player(&self) -> CommandPlayer {
        CommandPlayer::new(
            self.player.program.clone(),
            self.player.args.clone(),
            Duration::from_millis(self.player.poll_interval_ms),
        )
    }
}
