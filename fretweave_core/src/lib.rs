// Fretweave Core — the fretboard mapper.
//
// Transcribes timed pitch events into fretted-string-instrument positions.
// Each incoming pitch has many valid (string, fret) positions; the mapper
// picks one per note so that chords stay physically playable and the hand
// moves as little as possible, by minimising a tunable penalty function
// across the whole piece (a forward DP over per-frame candidate sets).
//
// Architecture:
// - pitch.rs: MIDI pitch <-> note name helpers
// - tuning.rs: tuning presets, the catalogue, coverage analysis
// - fretboard.rs: tuning + capo + max fret -> candidate positions per pitch
// - event.rs: note events, frames, chosen frames and shape signatures
// - config.rs: the immutable MapperConfig (all penalty weights + toggles)
// - normalize.rs: transpose / range-constrain / dedupe / quantise -> frames
// - shape.rs: chord-shape oracle (feasibility gate + frame-local cost)
// - scorer.rs: transition cost between consecutive chosen frames
// - solver.rs: per-frame candidate enumeration + minimum-cost path DP
// - articulation.rs: post-hoc hammer-on/pull-off/slide/tap labelling
// - diagnostics.rs: per-run diagnostic sink (no global logger)
//
// The mapper is single-threaded, synchronous and deterministic: the same
// (events, config) input produces byte-identical output.

pub mod articulation;
pub mod config;
pub mod diagnostics;
pub mod event;
pub mod fretboard;
pub mod normalize;
pub mod pitch;
pub mod scorer;
pub mod shape;
pub mod solver;
pub mod tuning;
