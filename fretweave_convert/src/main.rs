// Fretweave — CLI entry point.
//
// Converts music files between MIDI, ASCII tab, ABC and VexTab, running
// the fretboard mapper whenever the target format needs positions.
//
// Usage:
//   fretweave input.mid output.tab [--tuning DROP_D] [--capo 2] ...
//
// Exit codes: 0 success, 1 user error (bad arguments, unreadable input,
// invalid configuration), 2 parse error in the input, 3 output I/O error.

use clap::{Parser, ValueEnum};
use fretweave_convert::convert::{ConvertOptions, InputKind, convert, read_input};
use fretweave_convert::error::ConvertError;
use fretweave_core::config::{MapperConfig, PitchMode};
use fretweave_core::diagnostics::{Diagnostics, Level};
use fretweave_core::fretboard::Fretboard;
use fretweave_core::tuning::{Tuning, analyze_coverage};
use std::path::PathBuf;
use std::process::exit;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PitchModeArg {
    /// Discard out-of-range notes.
    Drop,
    /// Fold out-of-range notes by octaves until they fit.
    Normalize,
}

impl From<PitchModeArg> for PitchMode {
    fn from(mode: PitchModeArg) -> PitchMode {
        match mode {
            PitchModeArg::Drop => PitchMode::Drop,
            PitchModeArg::Normalize => PitchMode::Normalize,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fretweave", version)]
#[command(about = "Convert music between MIDI, ASCII tab, ABC and VexTab, \
mapping notes onto a fretboard on the way")]
struct Cli {
    /// Path to the input file (.mid, .tab, .abc, .vex).
    input: Option<PathBuf>,

    /// Path to the output file (.mid, .tab, .abc, .vex).
    output: Option<PathBuf>,

    /// Shift all events right by N quarter-beats before framing.
    #[arg(long, default_value_t = 0)]
    nudge: i32,

    /// Select one track of a multi-track MIDI file (1-based).
    #[arg(long)]
    track: Option<usize>,

    /// Transpose by N semitones (positive = up).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    transpose: i32,

    /// Constrain notes to the playable range of the tuning.
    #[arg(long)]
    constrain_pitch: bool,

    /// What to do with out-of-range notes under --constrain-pitch.
    #[arg(long, value_enum, default_value_t = PitchModeArg::Drop)]
    pitch_mode: PitchModeArg,

    /// Transcribe without hammer-ons, pull-offs, slides or taps.
    #[arg(long)]
    no_articulations: bool,

    /// Give parsed tab notes a fixed eighth-note duration instead of
    /// sustaining them to the next note on the string.
    #[arg(long)]
    staccato: bool,

    /// ASCII tab measure width in characters.
    #[arg(long, default_value_t = 40)]
    max_line_width: usize,

    /// Force all notes onto one string (1 = highest).
    #[arg(long)]
    single_string: Option<u8>,

    /// Tuning preset name, or a space-separated note list.
    #[arg(long, default_value = "STANDARD")]
    tuning: String,

    /// Capo position; fret numbers stay capo-relative.
    #[arg(long, default_value_t = 0)]
    capo: u8,

    /// Restrict the staff to the highest N strings.
    #[arg(long)]
    num_strings: Option<u8>,

    /// Highest fret on the virtual neck.
    #[arg(long, default_value_t = 24)]
    max_fret: u8,

    /// Keep only the lowest note of every chord.
    #[arg(long)]
    mono_lowest_only: bool,

    /// Collapse duplicate pitches within a chord.
    #[arg(long)]
    dedupe: bool,

    /// Snap event starts to the quantisation grid before mapping.
    #[arg(long)]
    pre_quantize: bool,

    /// Grid resolution in beats for chord grouping and tab spacing.
    #[arg(long, default_value_t = 0.125)]
    quantization_resolution: f64,

    /// Ignore notes quieter than this MIDI velocity.
    #[arg(long, default_value_t = 0)]
    velocity_cutoff: u8,

    // Mapper weights.
    /// Penalty per fret of stretch within a chord.
    #[arg(long, default_value_t = 100.0)]
    fret_span_penalty: f64,

    /// Penalty per fret of hand movement between frames.
    #[arg(long, default_value_t = 3.0)]
    movement_penalty: f64,

    /// Penalty per freshly struck string.
    #[arg(long, default_value_t = 5.0)]
    string_switch_penalty: f64,

    /// Penalty per fret of the highest fretted note.
    #[arg(long, default_value_t = 5.0)]
    high_fret_penalty: f64,

    /// Extra per-fret penalty on the lower-sounding strings.
    #[arg(long, default_value_t = 10.0)]
    low_string_high_fret_multiplier: f64,

    /// Fret span no hand can cover.
    #[arg(long, default_value_t = 4)]
    unplayable_fret_span: u8,

    /// Bonus for shapes inside the sweet spot.
    #[arg(long, default_value_t = 0.5)]
    sweet_spot_bonus: f64,

    /// Lowest fret of the sweet spot.
    #[arg(long, default_value_t = 0)]
    sweet_spot_low: u8,

    /// Highest fret of the sweet spot.
    #[arg(long, default_value_t = 12)]
    sweet_spot_high: u8,

    /// Exclude open strings from fret spans and centroids.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, value_name = "BOOL")]
    ignore_open: bool,

    /// Net bonus for barre shapes (all fretted notes on one fret).
    #[arg(long, default_value_t = 0.0)]
    barre_bonus: f64,

    /// Net penalty for barre shapes.
    #[arg(long, default_value_t = 0.0)]
    barre_penalty: f64,

    /// Bonus when a previous note can keep ringing.
    #[arg(long, default_value_t = 0.0)]
    let_ring_bonus: f64,

    /// Prefer open strings over their fretted equivalents.
    #[arg(long)]
    prefer_open: bool,

    /// Penalty for fretting a note that had an open-string home.
    #[arg(long, default_value_t = 20.0)]
    fretted_open_penalty: f64,

    /// Also gate the fret span across consecutive frames.
    #[arg(long)]
    count_fret_span_across_neighbors: bool,

    /// Max gap in beats between notes of a legato phrase.
    #[arg(long, default_value_t = 0.5)]
    legato_time_threshold: f64,

    /// Min notes in a same-string run to consider tapping.
    #[arg(long, default_value_t = 2)]
    tapping_run_threshold: usize,

    /// Report which tunings cover the input's pitch span, then exit.
    #[arg(long)]
    analyze: bool,

    /// List the tuning catalogue and exit.
    #[arg(long)]
    list_tunings: bool,

    /// Show the open-string notes of one tuning and exit.
    #[arg(long, value_name = "TUNING_NAME")]
    show_tuning: Option<String>,

    /// Print per-note diagnostic detail.
    #[arg(long)]
    debug: bool,
}

impl Cli {
    fn mapper_config(&self) -> MapperConfig {
        MapperConfig {
            tuning: self.tuning.clone(),
            capo: self.capo,
            max_fret: self.max_fret,
            single_string: self.single_string,
            num_strings: self.num_strings,
            transpose: self.transpose,
            constrain_pitch: self.constrain_pitch,
            pitch_mode: self.pitch_mode.into(),
            mono_lowest_only: self.mono_lowest_only,
            dedupe: self.dedupe,
            pre_quantize: self.pre_quantize,
            quantization_resolution: self.quantization_resolution,
            velocity_cutoff: self.velocity_cutoff,
            fret_span_penalty: self.fret_span_penalty,
            high_fret_penalty: self.high_fret_penalty,
            low_string_high_fret_multiplier: self.low_string_high_fret_multiplier,
            unplayable_fret_span: self.unplayable_fret_span,
            sweet_spot_bonus: self.sweet_spot_bonus,
            sweet_spot_low: self.sweet_spot_low,
            sweet_spot_high: self.sweet_spot_high,
            ignore_open: self.ignore_open,
            barre_bonus: self.barre_bonus,
            barre_penalty: self.barre_penalty,
            prefer_open: self.prefer_open,
            fretted_open_penalty: self.fretted_open_penalty,
            movement_penalty: self.movement_penalty,
            string_switch_penalty: self.string_switch_penalty,
            let_ring_bonus: self.let_ring_bonus,
            count_fret_span_across_neighbors: self.count_fret_span_across_neighbors,
            no_articulations: self.no_articulations,
            legato_time_threshold: self.legato_time_threshold,
            tapping_run_threshold: self.tapping_run_threshold,
        }
    }

    fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            nudge: self.nudge,
            track: self.track,
            staccato: self.staccato,
            max_line_width: self.max_line_width,
        }
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version are not errors.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            exit(code);
        }
    };

    if cli.list_tunings {
        for tuning in Tuning::all_presets() {
            println!("{:<24} {}", tuning.name, tuning.note_names().join(" "));
        }
        return;
    }

    if let Some(name) = &cli.show_tuning {
        match Tuning::preset(name) {
            Some(tuning) => {
                println!("{}: {}", tuning.name, tuning.note_names().join(" "));
                return;
            }
            None => {
                eprintln!("Unknown tuning '{name}'. Try --list-tunings.");
                exit(1);
            }
        }
    }

    let config = cli.mapper_config();
    let options = cli.convert_options();

    let board = match Fretboard::from_config(&config) {
        Ok(board) => board,
        Err(e) => {
            eprintln!("{e}");
            exit(1);
        }
    };

    let Some(input) = &cli.input else {
        eprintln!("No input file given. Usage: fretweave <input> <output> [options]");
        exit(1);
    };

    if cli.analyze {
        analyze(input, &board, &config, &options);
        return;
    }

    let Some(output) = &cli.output else {
        eprintln!("No output file given. Usage: fretweave <input> <output> [options]");
        exit(1);
    };

    let mut diag = Diagnostics::new();
    println!(
        "Converting '{}' to '{}' (tuning {}, capo {})...",
        input.display(),
        output.display(),
        board.tuning().name,
        board.capo()
    );

    if let Err(e) = convert(input, output, &board, &config, &options, &mut diag) {
        eprintln!("{e}");
        exit(exit_code(&e));
    }

    if cli.debug {
        for message in diag.messages(Level::Debug) {
            println!("  {message}");
        }
    }
    if let Some(summary) = diag.summary() {
        println!("{summary}");
    }
    println!("Done.");
}

/// Map a conversion failure onto the documented exit codes. An unreadable
/// input (not-found / permission) is a user error; other I/O failures are
/// output faults.
fn exit_code(e: &ConvertError) -> i32 {
    match e {
        ConvertError::Parse { .. } | ConvertError::Midi(_) => 2,
        ConvertError::UnsupportedFormat(_) | ConvertError::InvalidTrack { .. } => 1,
        ConvertError::Io(io) => match io.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => 1,
            _ => 3,
        },
    }
}

/// The `--analyze` surface: read the input, report its pitch span and
/// which catalogue tunings cover it.
fn analyze(input: &PathBuf, board: &Fretboard, config: &MapperConfig, options: &ConvertOptions) {
    let kind = InputKind::from_path(input).unwrap_or(InputKind::Midi);
    let song = match read_input(input, kind, board, config, options) {
        Ok(song) => song,
        Err(e) => {
            eprintln!("{e}");
            exit(exit_code(&e));
        }
    };

    let events = song.merged_events();
    let Some(low) = events.iter().map(|e| e.pitch).min() else {
        println!("Input contains no notes.");
        return;
    };
    let high = events.iter().map(|e| e.pitch).max().unwrap_or(low);

    println!(
        "Pitch span: {} to {} ({} notes)",
        fretweave_core::pitch::pitch_name(low),
        fretweave_core::pitch::pitch_name(high),
        events.len()
    );
    println!();
    for coverage in analyze_coverage(low, high, config.capo, config.max_fret) {
        println!(
            "{:<24} {} to {}  {}",
            coverage.tuning.name,
            fretweave_core::pitch::pitch_name(coverage.low),
            fretweave_core::pitch::pitch_name(coverage.high),
            if coverage.covers { "covers" } else { "-" }
        );
    }
}
