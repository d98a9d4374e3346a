// ASCII tab parsing: text -> events, rhythm inferred from spacing.
//
// The column parser is strict: rows of a system must be equally long,
// cells may only hold digits, dashes, bar lines and articulation tokens,
// and bar lines must align across the system. Any violation rejects the
// whole input with one diagnostic naming the line and column.
//
// Rhythm reconstruction inverts the renderer's logarithmic column
// schedule when the header comment block marks the tab as ours. Foreign
// tabs fall back to a linear column -> beat mapping. Either way the
// format carries no real durations: a sustained eighth and two quarters
// can land on the same columns, so spacing is read as rhythm and the
// result is only as good as that assumption. Sustain mode papers over it
// by extending each note to the next one on its string.

use crate::error::ConvertError;
use crate::song::{Song, TimeSignature, Track};
use crate::tab_render::slot_for_column;
use fretweave_core::articulation::Articulation;
use fretweave_core::config::MapperConfig;
use fretweave_core::event::NoteEvent;
use fretweave_core::tuning::Tuning;

/// Velocity assigned to parsed notes (tab carries none).
const PARSED_VELOCITY: u8 = 90;

/// Default note duration in beats (an eighth note).
const DEFAULT_DURATION: f64 = 0.5;

/// A parsed tab: the song plus the articulation token attached to each
/// event of its single track (same order as the events).
#[derive(Debug)]
pub struct ParsedTab {
    pub song: Song,
    pub articulations: Vec<Option<Articulation>>,
}

struct RawNote {
    beat: f64,
    string: u8,
    pitch: u8,
    articulation: Option<Articulation>,
}

/// Parse an ASCII tab. `staccato` keeps the default eighth-note duration
/// instead of sustaining notes to their successor on the same string.
pub fn parse_tab(
    text: &str,
    config: &MapperConfig,
    staccato: bool,
) -> Result<ParsedTab, ConvertError> {
    let mut song = Song::default();
    let mut tuning = Tuning::preset("STANDARD").expect("catalogue has STANDARD");
    let mut has_header = false;

    // Header comment block.
    for (line_no, line) in text.lines().enumerate() {
        let Some(comment) = line.trim().strip_prefix("//") else {
            continue;
        };
        let comment = comment.trim();
        if let Some(value) = comment.strip_prefix("Title:") {
            song.title = value.trim().to_string();
            has_header = true;
        } else if let Some(value) = comment.strip_prefix("Tempo:") {
            let value = value.trim().trim_end_matches("BPM").trim();
            song.tempo_bpm = value.parse().map_err(|_| {
                ConvertError::parse(line_no + 1, 1, format!("unreadable tempo '{value}'"))
            })?;
            has_header = true;
        } else if let Some(value) = comment.strip_prefix("Time:") {
            song.time_signature = TimeSignature::parse(value).ok_or_else(|| {
                ConvertError::parse(line_no + 1, 1, format!("unreadable time signature '{}'", value.trim()))
            })?;
            has_header = true;
        } else if let Some(value) = comment.strip_prefix("Tuning:") {
            tuning = Tuning::resolve(value.trim()).ok_or_else(|| {
                ConvertError::parse(line_no + 1, 1, format!("unknown tuning '{}'", value.trim()))
            })?;
            has_header = true;
        }
    }

    // Tab rows: a string label immediately followed by '|'.
    let rows: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let bytes = line.as_bytes();
            bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b'|'
        })
        .map(|(line_no, line)| (line_no + 1, &line[2..]))
        .collect();

    let num_strings = tuning.num_strings();
    if !rows.is_empty() && rows.len() % num_strings != 0 {
        let (line_no, _) = rows[rows.len() - rows.len() % num_strings];
        return Err(ConvertError::parse(
            line_no,
            1,
            format!(
                "found {} tab rows, not a multiple of the {num_strings}-string tuning",
                rows.len()
            ),
        ));
    }

    let beats_per_measure = song.time_signature.beats_per_measure();
    let resolution = config.quantization_resolution;
    let slots = ((beats_per_measure / resolution).round() as usize).max(1);

    let mut raw: Vec<RawNote> = Vec::new();
    let mut measure_index = 0usize;

    for system in rows.chunks(num_strings) {
        let width = system[0].1.len();
        for &(line_no, content) in system {
            if content.len() != width {
                return Err(ConvertError::parse(
                    line_no,
                    content.len() + 3,
                    "rows of a tab system must be equally long",
                ));
            }
            for (i, c) in content.char_indices() {
                let valid = c.is_ascii_digit()
                    || c == '-'
                    || c == '|'
                    || Articulation::from_symbol(c).is_some();
                if !valid {
                    return Err(ConvertError::parse(
                        line_no,
                        i + 3,
                        format!("stray character '{c}' in tab row"),
                    ));
                }
            }
        }

        // Bar columns must align across the whole system.
        let grids: Vec<&[u8]> = system.iter().map(|(_, c)| c.as_bytes()).collect();
        let mut bars: Vec<usize> = Vec::new();
        for col in 0..width {
            let count = grids.iter().filter(|g| g[col] == b'|').count();
            if count == grids.len() {
                bars.push(col);
            } else if count > 0 {
                let (line_no, _) = system
                    .iter()
                    .find(|(_, c)| c.as_bytes()[col] == b'|')
                    .expect("some row has the bar");
                return Err(ConvertError::parse(
                    *line_no,
                    col + 3,
                    "bar line does not align across the system",
                ));
            }
        }

        // Measure segments between bar columns.
        let mut segment_start = 0usize;
        for &bar in bars.iter().chain(std::iter::once(&width)) {
            if bar <= segment_start {
                segment_start = bar + 1;
                continue;
            }
            let seg_width = bar - segment_start;
            let eff_width = seg_width.saturating_sub(2).max(1);
            let measure_base = measure_index as f64 * beats_per_measure;

            for (string, grid) in grids.iter().enumerate() {
                let mut col = segment_start;
                while col < bar {
                    if !grid[col].is_ascii_digit() {
                        col += 1;
                        continue;
                    }
                    let run_start = col;
                    while col < bar && grid[col].is_ascii_digit() {
                        col += 1;
                    }
                    let digits = std::str::from_utf8(&grid[run_start..col])
                        .expect("ascii digits are utf8");
                    let fret: u32 = digits.parse().unwrap_or(u32::MAX);
                    let pitch = (tuning.open_pitches[string] as u32 + config.capo as u32)
                        .saturating_add(fret);
                    if pitch > 127 {
                        return Err(ConvertError::parse(
                            system[string].0,
                            run_start + 3,
                            format!("fret number '{digits}' out of range"),
                        ));
                    }

                    let articulation = if run_start > segment_start {
                        Articulation::from_symbol(grid[run_start - 1] as char)
                    } else {
                        None
                    };

                    let note_col = run_start - segment_start;
                    let beat_in_measure = if has_header {
                        let slot = slot_for_column(note_col, slots, eff_width);
                        slot as f64 * resolution
                    } else {
                        note_col as f64 / seg_width as f64 * beats_per_measure
                    };

                    raw.push(RawNote {
                        beat: measure_base + beat_in_measure,
                        string: string as u8,
                        pitch: pitch as u8,
                        articulation,
                    });
                }
            }

            measure_index += 1;
            segment_start = bar + 1;
        }
    }

    raw.sort_by(|a, b| {
        a.beat
            .partial_cmp(&b.beat)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.string.cmp(&b.string))
    });

    // Durations: sustain to the next note on the same string, unless
    // staccato keeps the default.
    let mut durations = vec![DEFAULT_DURATION; raw.len()];
    if !staccato {
        for i in 0..raw.len() {
            if let Some(next) = raw[i + 1..]
                .iter()
                .find(|n| n.string == raw[i].string)
            {
                let gap = next.beat - raw[i].beat;
                if gap > 0.0 {
                    durations[i] = gap;
                }
            }
        }
    }

    let mut track = Track::default();
    let mut articulations = Vec::with_capacity(raw.len());
    for (note, duration) in raw.iter().zip(durations) {
        track.events.push(NoteEvent {
            pitch: note.pitch,
            start_beat: note.beat,
            duration_beats: duration,
            velocity: PARSED_VELOCITY,
        });
        articulations.push(note.articulation);
    }
    song.tracks.push(track);

    Ok(ParsedTab {
        song,
        articulations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_TAB: &str = "\
// Title: test
// Tempo: 140 BPM
// Time: 4/4
// Tuning: STANDARD

e|--------------------------------------|
B|--------------------------------------|
G|5--------------7----------------------|
D|--------------------------------------|
A|--------------------------------------|
E|--------------------------------------|
";

    #[test]
    fn test_parse_header() {
        let parsed = parse_tab(SIMPLE_TAB, &MapperConfig::default(), false).unwrap();
        assert_eq!(parsed.song.title, "test");
        assert_eq!(parsed.song.tempo_bpm, 140.0);
        assert_eq!(parsed.song.time_signature.to_string(), "4/4");
    }

    #[test]
    fn test_parse_notes_and_pitches() {
        let parsed = parse_tab(SIMPLE_TAB, &MapperConfig::default(), false).unwrap();
        let events = &parsed.song.tracks[0].events;
        assert_eq!(events.len(), 2);
        // G string frets 5 and 7: C4 and D4.
        assert_eq!(events[0].pitch, 60);
        assert_eq!(events[1].pitch, 62);
        assert_eq!(events[0].start_beat, 0.0);
        assert!(events[1].start_beat > 0.0);
    }

    #[test]
    fn test_sustain_vs_staccato() {
        let sustained = parse_tab(SIMPLE_TAB, &MapperConfig::default(), false).unwrap();
        let events = &sustained.song.tracks[0].events;
        assert_eq!(events[0].duration_beats, events[1].start_beat - events[0].start_beat);

        let staccato = parse_tab(SIMPLE_TAB, &MapperConfig::default(), true).unwrap();
        assert_eq!(staccato.song.tracks[0].events[0].duration_beats, DEFAULT_DURATION);
    }

    #[test]
    fn test_articulation_attaches_to_following_digit() {
        let tab = "\
// Tuning: STANDARD

e|--------------------------------------|
B|--------------------------------------|
G|5-------------h7----------------------|
D|--------------------------------------|
A|--------------------------------------|
E|--------------------------------------|
";
        let parsed = parse_tab(tab, &MapperConfig::default(), false).unwrap();
        assert_eq!(parsed.articulations[0], None);
        assert_eq!(parsed.articulations[1], Some(Articulation::HammerOn));
    }

    #[test]
    fn test_multi_digit_frets() {
        let tab = "\
// Tuning: STANDARD

e|12------------------------------------|
B|--------------------------------------|
G|--------------------------------------|
D|--------------------------------------|
A|--------------------------------------|
E|--------------------------------------|
";
        let parsed = parse_tab(tab, &MapperConfig::default(), false).unwrap();
        let events = &parsed.song.tracks[0].events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].pitch, 64 + 12);
    }

    #[test]
    fn test_unequal_rows_rejected() {
        let tab = "\
e|------|
B|------|
G|----|
D|------|
A|------|
E|------|
";
        let err = parse_tab(tab, &MapperConfig::default(), false).unwrap_err();
        match err {
            ConvertError::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_stray_character_rejected() {
        let tab = "\
e|------|
B|--*---|
G|------|
D|------|
A|------|
E|------|
";
        let err = parse_tab(tab, &MapperConfig::default(), false).unwrap_err();
        match err {
            ConvertError::Parse { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 5);
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_row_count_rejected() {
        let tab = "\
e|------|
B|------|
G|------|
";
        assert!(parse_tab(tab, &MapperConfig::default(), false).is_err());
    }

    #[test]
    fn test_misaligned_bar_rejected() {
        let tab = "\
e|---|--|
B|--|---|
G|---|--|
D|---|--|
A|---|--|
E|---|--|
";
        assert!(parse_tab(tab, &MapperConfig::default(), false).is_err());
    }

    #[test]
    fn test_bass_tuning_row_count() {
        let tab = "\
// Tuning: BASS_STANDARD

g|------|
D|--3---|
A|------|
E|------|
";
        let parsed = parse_tab(tab, &MapperConfig::default(), false).unwrap();
        assert_eq!(parsed.song.tracks[0].events[0].pitch, 38 + 3);
    }

    #[test]
    fn test_empty_tab_is_empty_song() {
        let parsed = parse_tab("// Title: nothing\n", &MapperConfig::default(), false).unwrap();
        assert!(parsed.song.tracks[0].events.is_empty());
    }
}
