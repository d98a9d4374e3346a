// Tunings and the preset catalogue.
//
// A tuning is an ordered list of open-string pitches, index 0 = the
// highest-sounding string. The catalogue carries the common guitar, bass
// and baritone presets; arbitrary tunings can be built from a note list
// (as found in a tab file's `Tuning:` header).
//
// The coverage analyzer backs the `--analyze` CLI surface: given the pitch
// span of a piece, it reports which presets can reach every note.

use crate::pitch::{note_name_to_pitch, pitch_name};
use serde::{Deserialize, Serialize};

/// An instrument tuning. Open pitches are ordered highest-sounding first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuning {
    pub name: String,
    pub open_pitches: Vec<u8>,
}

/// The preset catalogue: (name, open pitches highest-first).
const PRESETS: [(&str, &[u8]); 14] = [
    ("STANDARD", &[64, 59, 55, 50, 45, 40]),
    ("E_FLAT", &[63, 58, 54, 49, 44, 39]),
    ("DROP_D", &[64, 59, 55, 50, 45, 38]),
    ("DROP_C", &[62, 57, 53, 48, 43, 36]),
    ("OPEN_G", &[62, 59, 55, 50, 43, 38]),
    ("OPEN_C6", &[64, 60, 55, 48, 45, 36]),
    ("C_SHARP_STANDARD", &[61, 56, 52, 47, 42, 37]),
    ("BARITONE_A", &[57, 52, 48, 43, 38, 33]),
    ("BARITONE_B", &[59, 54, 50, 45, 40, 35]),
    ("BARITONE_C", &[60, 55, 51, 46, 41, 36]),
    ("SEVEN_STRING_STANDARD", &[64, 59, 55, 50, 45, 40, 35]),
    ("BASS_STANDARD", &[43, 38, 33, 28]),
    ("BASS_DROP_D", &[43, 38, 33, 26]),
    ("BASS_E_FLAT", &[42, 37, 32, 27]),
];

impl Tuning {
    /// Look up a preset by its catalogue name (case-insensitive).
    pub fn preset(name: &str) -> Option<Tuning> {
        let upper = name.to_ascii_uppercase();
        PRESETS
            .iter()
            .find(|(preset_name, _)| *preset_name == upper)
            .map(|(preset_name, pitches)| Tuning {
                name: (*preset_name).to_string(),
                open_pitches: pitches.to_vec(),
            })
    }

    /// Build a tuning from a space-separated note list, highest first,
    /// e.g. "E4 B3 G3 D3 A2 E2". Returns None on any unparseable note.
    pub fn from_note_list(list: &str) -> Option<Tuning> {
        let pitches: Option<Vec<u8>> =
            list.split_whitespace().map(note_name_to_pitch).collect();
        let pitches = pitches?;
        if pitches.is_empty() {
            return None;
        }
        Some(Tuning {
            name: "CUSTOM".to_string(),
            open_pitches: pitches,
        })
    }

    /// Resolve a preset name or a note list, in that order.
    pub fn resolve(spec: &str) -> Option<Tuning> {
        Tuning::preset(spec).or_else(|| Tuning::from_note_list(spec))
    }

    /// All catalogue presets, in catalogue order.
    pub fn all_presets() -> Vec<Tuning> {
        PRESETS
            .iter()
            .map(|(name, pitches)| Tuning {
                name: (*name).to_string(),
                open_pitches: pitches.to_vec(),
            })
            .collect()
    }

    pub fn num_strings(&self) -> usize {
        self.open_pitches.len()
    }

    /// Open-string note names, highest first (for `--show-tuning`).
    pub fn note_names(&self) -> Vec<String> {
        self.open_pitches.iter().map(|&p| pitch_name(p)).collect()
    }

    /// Restrict the tuning to its highest `n` strings.
    pub fn top_strings(&self, n: usize) -> Tuning {
        Tuning {
            name: self.name.clone(),
            open_pitches: self.open_pitches[..n.min(self.open_pitches.len())].to_vec(),
        }
    }
}

/// One catalogue entry's verdict for a piece's pitch span.
#[derive(Debug, Clone)]
pub struct TuningCoverage {
    pub tuning: Tuning,
    /// Lowest and highest reachable pitch with the given capo and max fret.
    pub low: u8,
    pub high: u8,
    pub covers: bool,
}

/// Check every preset against a piece's pitch span.
pub fn analyze_coverage(span_low: u8, span_high: u8, capo: u8, max_fret: u8) -> Vec<TuningCoverage> {
    Tuning::all_presets()
        .into_iter()
        .map(|tuning| {
            let low = tuning.open_pitches.iter().copied().min().unwrap_or(0) + capo;
            let high = tuning.open_pitches.iter().copied().max().unwrap_or(0) + capo + max_fret;
            TuningCoverage {
                covers: span_low >= low && span_high <= high,
                tuning,
                low,
                high,
            }
        })
        .collect()
}
