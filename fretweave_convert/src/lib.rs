// Fretweave Convert — format collaborators around the fretboard mapper.
//
// Readers turn MIDI, ABC, VexTab or ASCII tab files into a format-agnostic
// Song; writers re-emit a Song (running the mapper first when the target
// format needs fretboard positions). The CLI binary wires a MapperConfig
// from flags and dispatches on file extension.
//
// Architecture:
// - song.rs: the format-agnostic Song/Track representation
// - error.rs: the fatal error taxonomy for format I/O
// - midi.rs: Standard MIDI File reader/writer (midly)
// - tab_render.rs: events -> ASCII tab (logarithmic column layout)
// - tab_parse.rs: ASCII tab -> events (rhythm inferred from spacing)
// - abc.rs: ABC notation reader/writer
// - vex.rs: VexTab reader/writer
// - convert.rs: format detection and the read/map/write pipeline
// - main.rs: the CLI

pub mod abc;
pub mod convert;
pub mod error;
pub mod midi;
pub mod song;
pub mod tab_parse;
pub mod tab_render;
pub mod vex;
