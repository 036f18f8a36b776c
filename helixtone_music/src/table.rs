// Per-base lookup tables.
//
// `BaseTable<T>` is a total mapping from the five-symbol alphabet to `T`.
// Totality is checked once, in `BaseTable::from_map`; after that `get` is
// infallible. This keeps the pitch and color assignments as data rather
// than as match arms spread through the generator and the visualizer.
//
// `PitchTable` wraps a `BaseTable<u8>` and additionally guarantees that every
// pitch is a valid MIDI key (0..=127).

use crate::alphabet::Base;
use crate::error::{ConfigError, TableError};
use std::collections::BTreeMap;

/// A value for every `Base`, indexed by the base's position in `Base::ALL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTable<T> {
    values: [T; 5],
}

impl<T: Clone> BaseTable<T> {
    /// Build a table from a map. Fails with the first base (in `Base::ALL`
    /// order) that has no entry.
    pub fn from_map(map: &BTreeMap<Base, T>) -> Result<Self, TableError> {
        let lookup = |base: Base| map.get(&base).cloned().ok_or(TableError::Missing(base));
        Ok(Self {
            values: [
                lookup(Base::A)?,
                lookup(Base::T)?,
                lookup(Base::C)?,
                lookup(Base::G)?,
                lookup(Base::N)?,
            ],
        })
    }

    pub fn to_map(&self) -> BTreeMap<Base, T> {
        self.iter().map(|(base, v)| (base, v.clone())).collect()
    }
}

impl<T> BaseTable<T> {
    pub fn get(&self, base: Base) -> &T {
        &self.values[index(base)]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Base, &T)> {
        Base::ALL.into_iter().zip(self.values.iter())
    }
}

fn index(base: Base) -> usize {
    match base {
        Base::A => 0,
        Base::T => 1,
        Base::C => 2,
        Base::G => 3,
        Base::N => 4,
    }
}

/// Base to MIDI key number. Every entry is within 0..=127.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitchTable(BaseTable<u8>);

impl PitchTable {
    pub fn from_map(map: &BTreeMap<Base, u8>) -> Result<Self, ConfigError> {
        let table = BaseTable::from_map(map).map_err(|source| ConfigError::Table {
            table: "pitch",
            source,
        })?;
        if let Some((base, &pitch)) = table.iter().find(|&(_, &p)| p > 127) {
            return Err(ConfigError::PitchOutOfRange { base, pitch });
        }
        Ok(PitchTable(table))
    }

    pub fn pitch(&self, base: Base) -> u8 {
        *self.0.get(base)
    }

    pub fn as_table(&self) -> &BaseTable<u8> {
        &self.0
    }
}

impl Default for PitchTable {
    fn default() -> Self {
        PitchTable(BaseTable {
            values: [25, 15, 29, 41, 33],
        })
    }
}

/// An sRGB color for drawing.
pub type Rgb = [u8; 3];

/// Base to bar color in the visualization.
pub type ColorTable = BaseTable<Rgb>;

impl Default for ColorTable {
    fn default() -> Self {
        BaseTable {
            values: [
                [255, 0, 0],     // A red
                [0, 0, 255],     // T blue
                [0, 128, 0],     // C green
                [255, 255, 0],   // G yellow
                [128, 128, 128], // N gray
            ],
        }
    }
}

/// Scientific pitch name for a MIDI key, with middle C (60) as "C4".
pub fn note_name(pitch: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = i32::from(pitch / 12) - 1;
    format!("{}{}", NAMES[usize::from(pitch % 12)], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_map() -> BTreeMap<Base, u8> {
        Base::ALL.into_iter().zip([60, 62, 64, 67, 65]).collect()
    }

    #[test]
    fn test_default_pitches() {
        let table = PitchTable::default();
        assert_eq!(table.pitch(Base::A), 25);
        assert_eq!(table.pitch(Base::T), 15);
        assert_eq!(table.pitch(Base::C), 29);
        assert_eq!(table.pitch(Base::G), 41);
        assert_eq!(table.pitch(Base::N), 33);
    }

    #[test]
    fn test_complete_map_builds() {
        let table = PitchTable::from_map(&full_map()).unwrap();
        assert_eq!(table.pitch(Base::G), 67);
        assert_eq!(table.pitch(Base::N), 65);
    }

    #[test]
    fn test_missing_base_is_rejected() {
        let mut map = full_map();
        map.remove(&Base::N);
        let err = BaseTable::from_map(&map).unwrap_err();
        assert_eq!(err, TableError::Missing(Base::N));
        assert!(matches!(
            PitchTable::from_map(&map),
            Err(ConfigError::Table { table: "pitch", .. })
        ));
    }

    #[test]
    fn test_out_of_range_pitch_is_rejected() {
        let mut map = full_map();
        map.insert(Base::C, 200);
        assert!(matches!(
            PitchTable::from_map(&map),
            Err(ConfigError::PitchOutOfRange {
                base: Base::C,
                pitch: 200
            })
        ));
    }

    #[test]
    fn test_iter_follows_alphabet_order() {
        let colors = ColorTable::default();
        let bases: Vec<Base> = colors.iter().map(|(b, _)| b).collect();
        assert_eq!(bases, Base::ALL.to_vec());
        assert_eq!(*colors.get(Base::N), [128, 128, 128]);
    }

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(60), "C4");
        assert_eq!(note_name(25), "C#0");
        assert_eq!(note_name(15), "D#0");
        assert_eq!(note_name(41), "F2");
        assert_eq!(note_name(0), "C-1");
        assert_eq!(note_name(127), "G9");
    }
}
