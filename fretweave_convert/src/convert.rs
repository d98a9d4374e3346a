// Format detection and the read/map/write pipeline.
//
// Formats are a pair of tagged enums dispatched by file extension; each
// variant maps to one narrow reader or writer. Position-carrying sinks
// (tab, VexTab) run the mapper; melody-only sinks (MIDI, ABC) pass events
// straight through.

use crate::abc::{generate_abc, parse_abc};
use crate::error::ConvertError;
use crate::midi::{read_midi, write_midi};
use crate::song::Song;
use crate::tab_parse::parse_tab;
use crate::tab_render::render_tab;
use crate::vex::{generate_vex, parse_vex};
use fretweave_core::articulation::{Articulation, infer_articulations};
use fretweave_core::config::MapperConfig;
use fretweave_core::diagnostics::Diagnostics;
use fretweave_core::event::MappedFrame;
use fretweave_core::fretboard::Fretboard;
use fretweave_core::normalize::normalize;
use fretweave_core::solver::map_frames;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Midi,
    AsciiTab,
    Abc,
    VexTab,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Midi,
    AsciiTab,
    Abc,
    VexTab,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Option<InputKind> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mid" | "midi" => Some(InputKind::Midi),
            "tab" => Some(InputKind::AsciiTab),
            "abc" => Some(InputKind::Abc),
            "vex" => Some(InputKind::VexTab),
            "wav" | "mp3" | "ogg" | "flac" | "m4a" => Some(InputKind::Audio),
            _ => None,
        }
    }
}

impl OutputKind {
    pub fn from_path(path: &Path) -> Option<OutputKind> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mid" | "midi" => Some(OutputKind::Midi),
            "tab" => Some(OutputKind::AsciiTab),
            "abc" => Some(OutputKind::Abc),
            "vex" => Some(OutputKind::VexTab),
            _ => None,
        }
    }
}

/// Converter-level options, distinct from the mapper's own configuration.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Shift all events right by nudge quarter-beats before framing.
    pub nudge: i32,
    /// 1-based MIDI track selection; None processes all tracks.
    pub track: Option<usize>,
    /// Keep the default eighth-note duration instead of sustaining.
    pub staccato: bool,
    /// ASCII tab measure width in characters.
    pub max_line_width: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            nudge: 0,
            track: None,
            staccato: false,
            max_line_width: 40,
        }
    }
}

/// Run the full mapper pipeline over a song's merged events.
pub fn map_song(
    song: &Song,
    board: &Fretboard,
    config: &MapperConfig,
    diag: &mut Diagnostics,
) -> (Vec<MappedFrame>, Vec<Option<Articulation>>) {
    let events = song.merged_events();
    let frames = normalize(&events, config, board, diag);
    let mapped = map_frames(&frames, board, config, diag);
    let labels = infer_articulations(&mapped, config);
    (mapped, labels)
}

/// Read any supported input into a Song.
pub fn read_input(
    path: &Path,
    kind: InputKind,
    board: &Fretboard,
    config: &MapperConfig,
    options: &ConvertOptions,
) -> Result<Song, ConvertError> {
    match kind {
        InputKind::Midi => read_midi(path, options.track),
        InputKind::AsciiTab => {
            let text = std::fs::read_to_string(path)?;
            Ok(parse_tab(&text, config, options.staccato)?.song)
        }
        InputKind::Abc => {
            let text = std::fs::read_to_string(path)?;
            parse_abc(&text)
        }
        InputKind::VexTab => {
            let text = std::fs::read_to_string(path)?;
            parse_vex(&text, board.tuning())
        }
        InputKind::Audio => Err(ConvertError::UnsupportedFormat(
            "audio input requires an external pitch-detection pipeline".to_string(),
        )),
    }
}

/// Write a Song to any supported output, mapping when the format needs
/// fretboard positions.
pub fn write_output(
    path: &Path,
    kind: OutputKind,
    song: &Song,
    board: &Fretboard,
    config: &MapperConfig,
    options: &ConvertOptions,
    diag: &mut Diagnostics,
) -> Result<(), ConvertError> {
    match kind {
        OutputKind::Midi => write_midi(song, path),
        OutputKind::Abc => {
            std::fs::write(path, generate_abc(song))?;
            Ok(())
        }
        OutputKind::AsciiTab => {
            let (mapped, labels) = map_song(song, board, config, diag);
            let tab = render_tab(song, &mapped, &labels, board, config, options.max_line_width);
            std::fs::write(path, tab)?;
            Ok(())
        }
        OutputKind::VexTab => {
            let (mapped, _) = map_song(song, board, config, diag);
            std::fs::write(path, generate_vex(song, &mapped))?;
            Ok(())
        }
    }
}

/// The whole trip: read, title from the file stem, nudge, write.
pub fn convert(
    input: &Path,
    output: &Path,
    board: &Fretboard,
    config: &MapperConfig,
    options: &ConvertOptions,
    diag: &mut Diagnostics,
) -> Result<(), ConvertError> {
    let input_kind = InputKind::from_path(input).ok_or_else(|| {
        ConvertError::UnsupportedFormat(input.display().to_string())
    })?;
    let output_kind = OutputKind::from_path(output).ok_or_else(|| {
        ConvertError::UnsupportedFormat(output.display().to_string())
    })?;

    let mut song = read_input(input, input_kind, board, config, options)?;

    if let Some(stem) = input.file_stem().and_then(|s| s.to_str()) {
        song.title = stem.to_string();
    }
    if options.nudge > 0 {
        song.shift_right(options.nudge as f64 * 0.25);
    }

    write_output(output, output_kind, &song, board, config, options, diag)
}
