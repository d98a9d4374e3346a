// The fretboard model: tuning + capo + max fret -> a pitch grid.
//
// Enumerates the candidate (string, fret) positions for any pitch. With a
// capo every open pitch shifts up and fret numbers stay capo-relative, so
// the invariant throughout the mapper is:
//
//     open_pitch[string] + capo + fret == sounding pitch
//
// An optional single-string constraint collapses the candidate set to at
// most one position per pitch, which degenerates the DP into a linear walk
// (useful for transcribing legato/tapping runs).

use crate::config::{ConfigError, MapperConfig};
use crate::tuning::Tuning;
use serde::{Deserialize, Serialize};

/// A fretting position. String 0 is the highest-sounding string; fret 0 is
/// the open string (or the capo'd "open" when a capo is set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub string: u8,
    pub fret: u8,
}

impl Position {
    pub fn is_open(&self) -> bool {
        self.fret == 0
    }
}

/// A tuned fretboard.
#[derive(Debug, Clone)]
pub struct Fretboard {
    tuning: Tuning,
    capo: u8,
    max_fret: u8,
    /// 0-based string index all positions are forced onto, if set.
    single_string: Option<u8>,
}

impl Fretboard {
    pub fn new(tuning: Tuning, capo: u8, max_fret: u8, single_string: Option<u8>) -> Fretboard {
        Fretboard {
            tuning,
            capo,
            max_fret,
            single_string,
        }
    }

    /// Build the fretboard a configuration describes, validating the
    /// configuration against the resolved tuning on the way.
    pub fn from_config(config: &MapperConfig) -> Result<Fretboard, ConfigError> {
        let tuning = Tuning::resolve(&config.tuning)
            .ok_or_else(|| ConfigError(format!("unknown tuning '{}'", config.tuning)))?;
        let tuning = match config.num_strings {
            Some(n) => {
                if n as usize > tuning.num_strings() {
                    return Err(ConfigError(format!(
                        "num_strings ({n}) exceeds the {}-string tuning {}",
                        tuning.num_strings(),
                        tuning.name
                    )));
                }
                tuning.top_strings(n as usize)
            }
            None => tuning,
        };
        config.validate(tuning.num_strings())?;
        Ok(Fretboard::new(
            tuning,
            config.capo,
            config.max_fret,
            config.single_string_index(),
        ))
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn capo(&self) -> u8 {
        self.capo
    }

    pub fn num_strings(&self) -> usize {
        self.tuning.num_strings()
    }

    /// The sounding pitch of a position.
    pub fn pitch_at(&self, pos: Position) -> u8 {
        self.tuning.open_pitches[pos.string as usize] + self.capo + pos.fret
    }

    /// All positions that sound the given pitch, ordered by string index.
    /// Empty when the pitch is unplayable.
    pub fn positions_for(&self, pitch: u8) -> Vec<Position> {
        let mut positions = Vec::new();
        for (string, &open) in self.tuning.open_pitches.iter().enumerate() {
            let string = string as u8;
            if let Some(forced) = self.single_string {
                if string != forced {
                    continue;
                }
            }
            let sounding_open = open as i32 + self.capo as i32;
            let fret = pitch as i32 - sounding_open;
            if (0..=self.max_fret as i32).contains(&fret) {
                positions.push(Position {
                    string,
                    fret: fret as u8,
                });
            }
        }
        positions
    }

    /// The reachable pitch span as (lowest, highest).
    pub fn pitch_range(&self) -> (u8, u8) {
        let strings: Vec<u8> = match self.single_string {
            Some(s) => vec![self.tuning.open_pitches[s as usize]],
            None => self.tuning.open_pitches.clone(),
        };
        let low = strings.iter().copied().min().unwrap_or(0) + self.capo;
        let high = strings.iter().copied().max().unwrap_or(0) + self.capo + self.max_fret;
        (low, high)
    }
}
