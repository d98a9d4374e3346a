// The format-agnostic Song representation.
//
// Every reader produces a Song; every writer consumes one. Events carry
// beat time only — tempo and meter live on the Song so the MIDI writer can
// reconstruct wall-clock timing.

use fretweave_core::event::NoteEvent;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature {
            numerator: 4,
            denominator: 4,
        }
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

impl TimeSignature {
    /// Parse "N/D". None on anything else.
    pub fn parse(s: &str) -> Option<TimeSignature> {
        let (num, den) = s.trim().split_once('/')?;
        Some(TimeSignature {
            numerator: num.trim().parse().ok()?,
            denominator: den.trim().parse().ok()?,
        })
    }

    /// Measure length in beats (quarter notes).
    pub fn beats_per_measure(&self) -> f64 {
        self.numerator as f64 * 4.0 / self.denominator as f64
    }
}

/// One voice/instrument line of a song.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub events: Vec<NoteEvent>,
}

/// A complete piece, independent of any on-disk format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub tracks: Vec<Track>,
    pub tempo_bpm: f64,
    pub time_signature: TimeSignature,
    pub title: String,
}

impl Default for Song {
    fn default() -> Self {
        Song {
            tracks: Vec::new(),
            tempo_bpm: 120.0,
            time_signature: TimeSignature::default(),
            title: "Untitled".to_string(),
        }
    }
}

impl Song {
    /// All events across all tracks, ordered by start beat (then pitch, for
    /// determinism).
    pub fn merged_events(&self) -> Vec<NoteEvent> {
        let mut events: Vec<NoteEvent> = self
            .tracks
            .iter()
            .flat_map(|t| t.events.iter().copied())
            .collect();
        events.sort_by(|a, b| {
            a.start_beat
                .partial_cmp(&b.start_beat)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.pitch.cmp(&b.pitch))
        });
        events
    }

    /// Shift every event right by `beats`.
    pub fn shift_right(&mut self, beats: f64) {
        for track in &mut self.tracks {
            for event in &mut track.events {
                event.start_beat += beats;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, start: f64) -> NoteEvent {
        NoteEvent {
            pitch,
            start_beat: start,
            duration_beats: 0.5,
            velocity: 90,
        }
    }

    #[test]
    fn test_time_signature_parse() {
        let ts = TimeSignature::parse("3/4").unwrap();
        assert_eq!((ts.numerator, ts.denominator), (3, 4));
        assert_eq!(ts.beats_per_measure(), 3.0);
        assert!(TimeSignature::parse("waltz").is_none());
    }

    #[test]
    fn test_compound_meter_beats() {
        let ts = TimeSignature::parse("6/8").unwrap();
        assert_eq!(ts.beats_per_measure(), 3.0);
    }

    #[test]
    fn test_merged_events_ordered() {
        let song = Song {
            tracks: vec![
                Track {
                    events: vec![note(60, 1.0), note(64, 0.0)],
                },
                Track {
                    events: vec![note(55, 0.5)],
                },
            ],
            ..Default::default()
        };
        let merged = song.merged_events();
        let starts: Vec<f64> = merged.iter().map(|e| e.start_beat).collect();
        assert_eq!(starts, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_song_roundtrips_through_json() {
        let song = Song {
            tracks: vec![Track {
                events: vec![note(60, 0.0), note(64, 0.5)],
            }],
            tempo_bpm: 96.0,
            time_signature: TimeSignature::parse("3/4").unwrap(),
            title: "Air".to_string(),
        };
        let json = serde_json::to_string_pretty(&song).unwrap();
        let restored: Song = serde_json::from_str(&json).unwrap();
        assert_eq!(song, restored);
    }

    #[test]
    fn test_shift_right() {
        let mut song = Song {
            tracks: vec![Track {
                events: vec![note(60, 1.0)],
            }],
            ..Default::default()
        };
        song.shift_right(0.5);
        assert_eq!(song.tracks[0].events[0].start_beat, 1.5);
    }
}
