// Note events, frames and chosen frames: the mapper's data spine.
//
// Events flow in from a format reader, the normaliser groups them into
// frames (simultaneous sets on the quantisation grid), the DP annotates
// each frame with one position per event, and the result is either
// rendered to tab or re-emitted as events. Nothing is mutated after the
// DP terminates; articulation labels live in a side channel.

use crate::fretboard::Position;
use serde::{Deserialize, Serialize};

/// One timed pitch event. Immutable once emitted by a source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch number.
    pub pitch: u8,
    /// Start time in beats.
    pub start_beat: f64,
    /// Duration in beats.
    pub duration_beats: f64,
    /// MIDI velocity (0-127).
    pub velocity: u8,
}

impl NoteEvent {
    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.duration_beats
    }
}

/// A non-empty set of events whose starts coincide after quantisation.
///
/// Frames are totally ordered by `start_beat`; two frames never share a
/// start. `min_duration` is the duration of the shortest member, used for
/// articulation timing.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Quantised absolute start, in beats.
    pub start_beat: f64,
    pub events: Vec<NoteEvent>,
    pub min_duration: f64,
}

impl Frame {
    pub fn new(start_beat: f64, events: Vec<NoteEvent>) -> Frame {
        let min_duration = events
            .iter()
            .map(|e| e.duration_beats)
            .fold(f64::INFINITY, f64::min);
        Frame {
            start_beat,
            events,
            min_duration,
        }
    }

    pub fn is_monophonic(&self) -> bool {
        self.events.len() == 1
    }
}

/// One event's assigned position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChosenPosition {
    pub position: Position,
    pub event: NoteEvent,
}

/// Cached geometry of a chosen frame, used by the oracle, the transition
/// scorer and the DP tie-break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeSignature {
    /// Min and max fret among fretted (non-open) positions; None when every
    /// position is open.
    pub min_fretted_fret: Option<u8>,
    pub max_fretted_fret: Option<u8>,
    pub fretted_count: usize,
    /// All strings used, sorted ascending. Pairwise distinct by invariant.
    pub strings_used: Vec<u8>,
    /// Max fret over all positions, opens included.
    pub max_fret: u8,
}

impl ShapeSignature {
    pub fn of(positions: &[ChosenPosition]) -> ShapeSignature {
        let fretted: Vec<u8> = positions
            .iter()
            .map(|c| c.position.fret)
            .filter(|&f| f > 0)
            .collect();
        let mut strings_used: Vec<u8> = positions.iter().map(|c| c.position.string).collect();
        strings_used.sort_unstable();
        ShapeSignature {
            min_fretted_fret: fretted.iter().copied().min(),
            max_fretted_fret: fretted.iter().copied().max(),
            fretted_count: fretted.len(),
            strings_used,
            max_fret: positions.iter().map(|c| c.position.fret).max().unwrap_or(0),
        }
    }

    /// Fret span among fretted positions (0 when fewer than two).
    pub fn fretted_span(&self) -> u8 {
        match (self.min_fretted_fret, self.max_fretted_fret) {
            (Some(min), Some(max)) => max - min,
            _ => 0,
        }
    }
}

/// A frame with one chosen position per event.
///
/// Invariant: no two positions share a string, and every position sounds
/// its event's pitch on the owning fretboard.
#[derive(Debug, Clone, PartialEq)]
pub struct ChosenFrame {
    pub start_beat: f64,
    pub min_duration: f64,
    pub positions: Vec<ChosenPosition>,
    pub signature: ShapeSignature,
}

impl ChosenFrame {
    pub fn new(frame: &Frame, positions: Vec<ChosenPosition>) -> ChosenFrame {
        let signature = ShapeSignature::of(&positions);
        ChosenFrame {
            start_beat: frame.start_beat,
            min_duration: frame.min_duration,
            positions,
            signature,
        }
    }

    pub fn is_monophonic(&self) -> bool {
        self.positions.len() == 1
    }

    pub fn end_beat(&self) -> f64 {
        self.start_beat + self.min_duration
    }
}

/// One slot of the mapper's output: a played frame, or an explicit rest
/// where no feasible chord shape existed.
#[derive(Debug, Clone, PartialEq)]
pub enum MappedFrame {
    Chosen(ChosenFrame),
    Rest { start_beat: f64 },
}

impl MappedFrame {
    pub fn start_beat(&self) -> f64 {
        match self {
            MappedFrame::Chosen(frame) => frame.start_beat,
            MappedFrame::Rest { start_beat } => *start_beat,
        }
    }

    pub fn as_chosen(&self) -> Option<&ChosenFrame> {
        match self {
            MappedFrame::Chosen(frame) => Some(frame),
            MappedFrame::Rest { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(pitch: u8, start: f64, duration: f64) -> NoteEvent {
        NoteEvent {
            pitch,
            start_beat: start,
            duration_beats: duration,
            velocity: 90,
        }
    }

    fn chosen(string: u8, fret: u8) -> ChosenPosition {
        ChosenPosition {
            position: Position { string, fret },
            event: note(60, 0.0, 0.5),
        }
    }

    #[test]
    fn test_frame_min_duration() {
        let frame = Frame::new(1.0, vec![note(60, 1.0, 2.0), note(64, 1.0, 0.5)]);
        assert_eq!(frame.min_duration, 0.5);
        assert!(!frame.is_monophonic());
    }

    #[test]
    fn test_signature_ignores_opens_for_span() {
        let sig = ShapeSignature::of(&[chosen(5, 0), chosen(3, 2), chosen(2, 5)]);
        assert_eq!(sig.min_fretted_fret, Some(2));
        assert_eq!(sig.max_fretted_fret, Some(5));
        assert_eq!(sig.fretted_span(), 3);
        assert_eq!(sig.fretted_count, 2);
        assert_eq!(sig.strings_used, vec![2, 3, 5]);
        assert_eq!(sig.max_fret, 5);
    }

    #[test]
    fn test_signature_all_open() {
        let sig = ShapeSignature::of(&[chosen(5, 0), chosen(4, 0)]);
        assert_eq!(sig.min_fretted_fret, None);
        assert_eq!(sig.fretted_span(), 0);
        assert_eq!(sig.max_fret, 0);
    }
}
