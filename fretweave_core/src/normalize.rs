// The event normaliser: raw events in, ordered frames out.
//
// Runs the toggleable clean-up passes in a fixed order — velocity cutoff,
// transpose, range constraint, then per-frame monophonic reduction and
// deduplication — and always finishes with frame grouping on the
// quantisation grid. Events that survive no pass are dropped into the
// diagnostics, never silently.
//
// Frame grouping is the one mandatory step: events whose quantised starts
// fall in the same grid cell become one frame, and the frame's start is
// the cell's grid time. Event start times keep their raw values unless
// pre-quantisation is enabled.

use crate::config::{MapperConfig, PitchMode};
use crate::diagnostics::Diagnostics;
use crate::event::{Frame, NoteEvent};
use crate::fretboard::Fretboard;
use std::collections::BTreeMap;

/// Normalise a raw event stream into a strictly ordered frame sequence.
pub fn normalize(
    events: &[NoteEvent],
    config: &MapperConfig,
    board: &Fretboard,
    diag: &mut Diagnostics,
) -> Vec<Frame> {
    let mut kept: Vec<NoteEvent> = Vec::with_capacity(events.len());

    for &event in events {
        // Velocity cutoff.
        if event.velocity < config.velocity_cutoff {
            diag.note_dropped(event.pitch, event.start_beat, "below velocity cutoff");
            continue;
        }

        // Transpose.
        let transposed = event.pitch as i32 + config.transpose;
        if !(0..=127).contains(&transposed) {
            diag.note_dropped(event.pitch, event.start_beat, "transposed out of MIDI range");
            continue;
        }
        let mut event = NoteEvent {
            pitch: transposed as u8,
            ..event
        };

        // Range constraint against the fretboard.
        if config.constrain_pitch {
            match constrain(event.pitch, board, config.pitch_mode) {
                Some(pitch) => {
                    if pitch != event.pitch {
                        diag.note_folded(event.pitch, pitch, event.start_beat);
                    }
                    event.pitch = pitch;
                }
                None => {
                    diag.note_dropped(event.pitch, event.start_beat, "outside playable range");
                    continue;
                }
            }
        }

        kept.push(event);
    }

    group_into_frames(kept, config)
}

/// Apply the range policy to one pitch. None means the event is dropped.
fn constrain(pitch: u8, board: &Fretboard, mode: PitchMode) -> Option<u8> {
    let (low, high) = board.pitch_range();
    if (low..=high).contains(&pitch) {
        return Some(pitch);
    }
    match mode {
        PitchMode::Drop => None,
        PitchMode::Normalize => {
            let mut p = pitch as i32;
            while p > high as i32 {
                p -= 12;
            }
            while p < low as i32 {
                p += 12;
            }
            // A span narrower than an octave can overshoot; drop then.
            if (low as i32..=high as i32).contains(&p) {
                Some(p as u8)
            } else {
                None
            }
        }
    }
}

/// Group events into frames by quantised start cell, applying the per-frame
/// passes (monophonic reduction, dedupe, pre-quantisation).
fn group_into_frames(events: Vec<NoteEvent>, config: &MapperConfig) -> Vec<Frame> {
    let resolution = config.quantization_resolution;
    let mut cells: BTreeMap<i64, Vec<NoteEvent>> = BTreeMap::new();
    for event in events {
        let cell = (event.start_beat / resolution).round() as i64;
        cells.entry(cell).or_default().push(event);
    }

    let mut frames = Vec::with_capacity(cells.len());
    for (cell, mut members) in cells {
        let start_beat = cell as f64 * resolution;

        if config.mono_lowest_only {
            let lowest = members
                .iter()
                .map(|e| e.pitch)
                .min()
                .expect("grid cells are never empty");
            members.retain(|e| e.pitch == lowest);
            members.truncate(1);
        }

        if config.dedupe {
            let mut seen: Vec<u8> = Vec::new();
            members.retain(|e| {
                if seen.contains(&e.pitch) {
                    false
                } else {
                    seen.push(e.pitch);
                    true
                }
            });
        }

        if config.pre_quantize {
            for event in &mut members {
                event.start_beat = start_beat;
            }
        }

        // Deterministic order within the frame: by pitch, then velocity.
        members.sort_by(|a, b| (a.pitch, a.velocity).cmp(&(b.pitch, b.velocity)));

        frames.push(Frame::new(start_beat, members));
    }
    frames
}
