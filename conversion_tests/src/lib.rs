// Shared helpers for the end-to-end conversion tests.
//
// The tests exercise the same code paths as the CLI: normalize ->
// map_frames -> infer_articulations, plus the format readers and writers.
// The only test-specific code lives here: event builders and a one-call
// pipeline wrapper.

use fretweave_core::articulation::{Articulation, infer_articulations};
use fretweave_core::config::MapperConfig;
use fretweave_core::diagnostics::Diagnostics;
use fretweave_core::event::{MappedFrame, NoteEvent};
use fretweave_core::fretboard::Fretboard;
use fretweave_core::normalize::normalize;
use fretweave_core::solver::map_frames;

/// A note with the defaults the tests care about.
pub fn note(pitch: u8, start_beat: f64, duration_beats: f64) -> NoteEvent {
    NoteEvent {
        pitch,
        start_beat,
        duration_beats,
        velocity: 90,
    }
}

/// An evenly spaced monophonic line.
pub fn line(pitches: &[u8], spacing: f64, duration: f64) -> Vec<NoteEvent> {
    pitches
        .iter()
        .enumerate()
        .map(|(i, &p)| note(p, i as f64 * spacing, duration))
        .collect()
}

/// The result of one full mapper run.
pub struct MapRun {
    pub mapped: Vec<MappedFrame>,
    pub labels: Vec<Option<Articulation>>,
    pub diagnostics: Diagnostics,
}

/// Run the whole pipeline: normalise, solve, label.
pub fn run_mapper(events: &[NoteEvent], config: &MapperConfig) -> MapRun {
    let board = Fretboard::from_config(config).expect("test config is valid");
    let mut diagnostics = Diagnostics::new();
    let frames = normalize(events, config, &board, &mut diagnostics);
    let mapped = map_frames(&frames, &board, config, &mut diagnostics);
    let labels = infer_articulations(&mapped, config);
    MapRun {
        mapped,
        labels,
        diagnostics,
    }
}

/// The (string, fret) sequence of a monophonic mapping.
pub fn positions_of(run: &MapRun) -> Vec<(u8, u8)> {
    run.mapped
        .iter()
        .filter_map(|m| m.as_chosen())
        .flat_map(|c| {
            c.positions
                .iter()
                .map(|p| (p.position.string, p.position.fret))
        })
        .collect()
}
