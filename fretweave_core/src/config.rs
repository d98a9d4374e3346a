// The mapper configuration: every tunable parameter in one immutable value.
//
// Built once at startup (from CLI flags or deserialized from JSON), then
// passed by reference through the normaliser, oracle, scorer, solver and
// articulation inferrer. Never mutated during a run; two concurrent runs
// on separate configs are trivially safe.
//
// `validate()` rejects contradictory settings before any frame is
// processed. Weight semantics live with their consumers: shape.rs for the
// frame-local weights, scorer.rs for the transition weights,
// articulation.rs for the legato/tapping thresholds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grid resolutions accepted for frame grouping, in beats.
pub const GRID_RESOLUTIONS: [f64; 6] = [0.0125, 0.0625, 0.125, 0.25, 0.5, 1.0];

/// Policy for events outside the fretboard's reachable span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchMode {
    /// Discard out-of-range events.
    #[default]
    Drop,
    /// Fold out-of-range events by octaves until they fit; drop if no
    /// octave fits.
    Normalize,
}

/// All tunable parameters for the fretboard mapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    // Fretboard geometry
    pub tuning: String,
    pub capo: u8,
    pub max_fret: u8,
    /// Force every note onto one string (1-based, 1 = highest string).
    pub single_string: Option<u8>,
    /// Restrict the staff to the highest N strings of the tuning.
    pub num_strings: Option<u8>,

    // Normalisation
    pub transpose: i32,
    pub constrain_pitch: bool,
    pub pitch_mode: PitchMode,
    pub mono_lowest_only: bool,
    pub dedupe: bool,
    pub pre_quantize: bool,
    pub quantization_resolution: f64,
    /// Ignore events quieter than this velocity.
    pub velocity_cutoff: u8,

    // Shape (frame-local) weights
    pub fret_span_penalty: f64,
    pub high_fret_penalty: f64,
    pub low_string_high_fret_multiplier: f64,
    pub unplayable_fret_span: u8,
    pub sweet_spot_bonus: f64,
    pub sweet_spot_low: u8,
    pub sweet_spot_high: u8,
    pub ignore_open: bool,
    pub barre_bonus: f64,
    pub barre_penalty: f64,
    pub prefer_open: bool,
    pub fretted_open_penalty: f64,

    // Transition weights
    pub movement_penalty: f64,
    pub string_switch_penalty: f64,
    pub let_ring_bonus: f64,
    pub count_fret_span_across_neighbors: bool,

    // Articulation inference
    pub no_articulations: bool,
    /// Max gap in beats between notes of a legato phrase.
    pub legato_time_threshold: f64,
    /// Min notes in a same-string run to consider tapping.
    pub tapping_run_threshold: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        MapperConfig {
            tuning: "STANDARD".to_string(),
            capo: 0,
            max_fret: 24,
            single_string: None,
            num_strings: None,

            transpose: 0,
            constrain_pitch: false,
            pitch_mode: PitchMode::Drop,
            mono_lowest_only: false,
            dedupe: false,
            pre_quantize: false,
            quantization_resolution: 0.125,
            velocity_cutoff: 0,

            fret_span_penalty: 100.0,
            high_fret_penalty: 5.0,
            low_string_high_fret_multiplier: 10.0,
            unplayable_fret_span: 4,
            sweet_spot_bonus: 0.5,
            sweet_spot_low: 0,
            sweet_spot_high: 12,
            ignore_open: true,
            barre_bonus: 0.0,
            barre_penalty: 0.0,
            prefer_open: false,
            fretted_open_penalty: 20.0,

            movement_penalty: 3.0,
            string_switch_penalty: 5.0,
            let_ring_bonus: 0.0,
            count_fret_span_across_neighbors: false,

            no_articulations: false,
            legato_time_threshold: 0.5,
            tapping_run_threshold: 2,
        }
    }
}

/// A contradiction within the configuration. Always fatal; surfaced before
/// any frames are processed.
#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

impl MapperConfig {
    /// Reject contradictory settings. `num_strings_available` is the string
    /// count of the resolved tuning (after any `num_strings` restriction).
    pub fn validate(&self, num_strings_available: usize) -> Result<(), ConfigError> {
        if self.sweet_spot_low > self.sweet_spot_high {
            return Err(ConfigError(format!(
                "sweet_spot_low ({}) exceeds sweet_spot_high ({})",
                self.sweet_spot_low, self.sweet_spot_high
            )));
        }
        if self.capo > self.max_fret {
            return Err(ConfigError(format!(
                "capo ({}) exceeds max_fret ({})",
                self.capo, self.max_fret
            )));
        }
        if let Some(s) = self.single_string {
            if s == 0 || s as usize > num_strings_available {
                return Err(ConfigError(format!(
                    "single_string ({s}) out of range 1..={num_strings_available}"
                )));
            }
        }
        if let Some(n) = self.num_strings {
            if n == 0 {
                return Err(ConfigError("num_strings must be at least 1".to_string()));
            }
        }
        if !GRID_RESOLUTIONS
            .iter()
            .any(|&r| (r - self.quantization_resolution).abs() < 1e-9)
        {
            return Err(ConfigError(format!(
                "quantization_resolution ({}) is not one of {:?}",
                self.quantization_resolution, GRID_RESOLUTIONS
            )));
        }
        Ok(())
    }

    /// The configured single string as a 0-based index.
    pub fn single_string_index(&self) -> Option<u8> {
        self.single_string.map(|s| s - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(MapperConfig::default().validate(6).is_ok());
    }

    #[test]
    fn test_sweet_spot_inversion_rejected() {
        let config = MapperConfig {
            sweet_spot_low: 9,
            sweet_spot_high: 3,
            ..Default::default()
        };
        assert!(config.validate(6).is_err());
    }

    #[test]
    fn test_single_string_out_of_range_rejected() {
        let config = MapperConfig {
            single_string: Some(7),
            ..Default::default()
        };
        assert!(config.validate(6).is_err());
        let config = MapperConfig {
            single_string: Some(4),
            ..Default::default()
        };
        assert!(config.validate(4).is_ok());
    }

    #[test]
    fn test_capo_beyond_neck_rejected() {
        let config = MapperConfig {
            capo: 30,
            ..Default::default()
        };
        assert!(config.validate(6).is_err());
    }

    #[test]
    fn test_odd_resolution_rejected() {
        let config = MapperConfig {
            quantization_resolution: 0.3,
            ..Default::default()
        };
        assert!(config.validate(6).is_err());
    }

    #[test]
    fn test_config_serializes() {
        let config = MapperConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let restored: MapperConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.fret_span_penalty, restored.fret_span_penalty);
        assert_eq!(config.quantization_resolution, restored.quantization_resolution);
        assert_eq!(config.pitch_mode, restored.pitch_mode);
    }
}
