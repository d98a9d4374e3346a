// VexTab input and output.
//
// VexTab is position-explicit (`fret/string`, strings 1-based from the
// highest), so the generator consumes mapped frames rather than bare
// events. Duration tokens (`:q`, `:8`, ...) set a running value that
// applies to every following note token; chords are dot-joined atoms in
// parentheses. The parser walks the same token stream back into events.

use crate::error::ConvertError;
use crate::song::{Song, Track};
use fretweave_core::event::{MappedFrame, NoteEvent};
use fretweave_core::tuning::Tuning;

/// Velocity assigned to parsed notes (VexTab has none).
const PARSED_VELOCITY: u8 = 90;

/// Duration tokens and their beat values, longest first.
const DURATIONS: [(&str, f64); 9] = [
    (":w", 4.0),
    (":hd", 3.0),
    (":h", 2.0),
    (":qd", 1.5),
    (":q", 1.0),
    (":8d", 0.75),
    (":8", 0.5),
    (":16", 0.25),
    (":32", 0.125),
];

/// Tabstaves per output line.
const MEASURES_PER_LINE: usize = 2;

// ── Generation ──

/// Render mapped frames as VexTab.
pub fn generate_vex(song: &Song, mapped: &[MappedFrame]) -> String {
    let mut out = vec![format!(
        "//Title: {}, options tempo={}",
        song.title, song.tempo_bpm as i64
    )];

    let beats_per_measure = song.time_signature.beats_per_measure();
    let mut current_line: Option<usize> = None;
    let mut notes_line = String::new();

    for frame in mapped {
        let Some(chosen) = frame.as_chosen() else {
            continue;
        };
        let line = (chosen.start_beat / beats_per_measure).floor() as usize / MEASURES_PER_LINE;
        if current_line != Some(line) {
            if !notes_line.is_empty() {
                out.push(format!("notes{notes_line}"));
                notes_line.clear();
            }
            out.push(format!(
                "tabstave notation=true time={}",
                song.time_signature
            ));
            current_line = Some(line);
        }

        let duration = duration_token(chosen.min_duration);
        let atoms: Vec<String> = chosen
            .positions
            .iter()
            .map(|c| format!("{}/{}", c.position.fret, c.position.string + 1))
            .collect();
        let note = if atoms.len() == 1 {
            atoms[0].clone()
        } else {
            format!("({})", atoms.join("."))
        };
        notes_line.push_str(&format!(" {duration} {note}"));
    }
    if !notes_line.is_empty() {
        out.push(format!("notes{notes_line}"));
    }

    out.join("\n")
}

/// Nearest duration token for a beat value.
fn duration_token(beats: f64) -> &'static str {
    if beats <= 0.0 {
        return ":q";
    }
    DURATIONS
        .iter()
        .min_by(|a, b| {
            (a.1 - beats)
                .abs()
                .partial_cmp(&(b.1 - beats).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(token, _)| *token)
        .unwrap_or(":q")
}

// ── Parsing ──

/// Parse a VexTab string against a tuning (for `fret/string` -> pitch).
pub fn parse_vex(text: &str, tuning: &Tuning) -> Result<Song, ConvertError> {
    let mut song = Song::default();
    let mut track = Track::default();

    if let Some(tempo) = scan_value(text, "tempo=") {
        if let Ok(bpm) = tempo.parse::<f64>() {
            song.tempo_bpm = bpm;
        }
    }
    if let Some(time) = scan_value(text, "time=") {
        if let Some(ts) = crate::song::TimeSignature::parse(&time) {
            song.time_signature = ts;
        }
    }

    let mut beat = 0.0;
    let mut duration = 1.0; // VexTab defaults to quarter notes.

    for (line_no, line) in text.lines().enumerate() {
        let Some(tokens) = line.trim().strip_prefix("notes ") else {
            continue;
        };
        for token in tokens.split_whitespace() {
            if let Some(&(_, beats)) = DURATIONS.iter().find(|(t, _)| *t == token) {
                duration = beats;
                continue;
            }
            if token.starts_with(':') {
                return Err(ConvertError::parse(
                    line_no + 1,
                    1,
                    format!("unknown duration token '{token}'"),
                ));
            }

            let atoms: Vec<&str> = token
                .trim_start_matches('(')
                .trim_end_matches(')')
                .split('.')
                .collect();
            let mut any = false;
            for atom in atoms {
                let Some((fret, string)) = parse_atom(atom) else {
                    continue;
                };
                if string == 0 || string as usize > tuning.num_strings() {
                    return Err(ConvertError::parse(
                        line_no + 1,
                        1,
                        format!("string {string} out of range in '{token}'"),
                    ));
                }
                let pitch = tuning.open_pitches[(string - 1) as usize] + fret;
                track.events.push(NoteEvent {
                    pitch,
                    start_beat: beat,
                    duration_beats: duration,
                    velocity: PARSED_VELOCITY,
                });
                any = true;
            }
            if any {
                beat += duration;
            }
        }
    }

    song.tracks.push(track);
    Ok(song)
}

/// Find `key` in the text and return the value characters following it.
fn scan_value(text: &str, key: &str) -> Option<String> {
    let start = text.find(key)? + key.len();
    let value: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '/' || *c == '.')
        .collect();
    if value.is_empty() { None } else { Some(value) }
}

/// Parse one "fret/string" atom.
fn parse_atom(atom: &str) -> Option<(u8, u8)> {
    let (fret, string) = atom.split_once('/')?;
    Some((fret.parse().ok()?, string.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fretweave_core::event::{ChosenFrame, ChosenPosition, Frame};
    use fretweave_core::fretboard::Position;

    fn standard() -> Tuning {
        Tuning::preset("STANDARD").unwrap()
    }

    fn mono(string: u8, fret: u8, beat: f64, duration: f64) -> MappedFrame {
        let event = NoteEvent {
            pitch: 60,
            start_beat: beat,
            duration_beats: duration,
            velocity: 90,
        };
        let chosen = ChosenPosition {
            position: Position { string, fret },
            event,
        };
        MappedFrame::Chosen(ChosenFrame::new(&Frame::new(beat, vec![event]), vec![chosen]))
    }

    #[test]
    fn test_generate_header_and_notes() {
        let song = Song {
            title: "Riff".to_string(),
            tempo_bpm: 140.0,
            ..Default::default()
        };
        let mapped = vec![mono(2, 5, 0.0, 1.0), mono(2, 7, 1.0, 0.5)];
        let vex = generate_vex(&song, &mapped);
        assert!(vex.starts_with("//Title: Riff, options tempo=140"));
        assert!(vex.contains("tabstave notation=true time=4/4"));
        assert!(vex.contains(":q 5/3"));
        assert!(vex.contains(":8 7/3"));
    }

    #[test]
    fn test_generate_chord_token() {
        let song = Song::default();
        let event = NoteEvent {
            pitch: 60,
            start_beat: 0.0,
            duration_beats: 1.0,
            velocity: 90,
        };
        let chord = ChosenFrame::new(
            &Frame::new(0.0, vec![event, event]),
            vec![
                ChosenPosition {
                    position: Position { string: 1, fret: 1 },
                    event,
                },
                ChosenPosition {
                    position: Position { string: 2, fret: 0 },
                    event,
                },
            ],
        );
        let vex = generate_vex(&song, &[MappedFrame::Chosen(chord)]);
        assert!(vex.contains("(1/2.0/3)"), "got: {vex}");
    }

    #[test]
    fn test_parse_notes_and_timing() {
        let vex = "//Title: x, options tempo=120\ntabstave notation=true time=4/4\nnotes :8 5/3 7/3 :q 9/3\n";
        let song = parse_vex(vex, &standard()).unwrap();
        let events = &song.tracks[0].events;
        assert_eq!(events.len(), 3);
        // G string: frets 5, 7, 9 -> C4, D4, E4.
        assert_eq!(events[0].pitch, 60);
        assert_eq!(events[1].pitch, 62);
        assert_eq!(events[2].pitch, 64);
        assert_eq!(events[0].start_beat, 0.0);
        assert_eq!(events[1].start_beat, 0.5);
        assert_eq!(events[2].start_beat, 1.0);
        assert_eq!(events[2].duration_beats, 1.0);
    }

    #[test]
    fn test_parse_chord_shares_start() {
        let vex = "tabstave notation=true time=4/4\nnotes :q (1/2.0/3) 3/1\n";
        let song = parse_vex(vex, &standard()).unwrap();
        let events = &song.tracks[0].events;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].start_beat, 0.0);
        assert_eq!(events[1].start_beat, 0.0);
        assert_eq!(events[2].start_beat, 1.0);
    }

    #[test]
    fn test_parse_rejects_bad_duration() {
        let vex = "notes :x 5/3\n";
        assert!(parse_vex(vex, &standard()).is_err());
    }

    #[test]
    fn test_parse_rejects_bad_string() {
        let vex = "notes :q 5/9\n";
        assert!(parse_vex(vex, &standard()).is_err());
    }

    #[test]
    fn test_roundtrip_through_vex() {
        let song = Song::default();
        let mapped = vec![mono(2, 5, 0.0, 0.5), mono(1, 3, 0.5, 0.5)];
        let vex = generate_vex(&song, &mapped);
        let restored = parse_vex(&vex, &standard()).unwrap();
        let pitches: Vec<u8> = restored.tracks[0].events.iter().map(|e| e.pitch).collect();
        assert_eq!(pitches, vec![60, 62]);
    }
}
