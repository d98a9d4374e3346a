// ABC notation input and output.
//
// The parser reads the header fields (X/T/M/L/Q/K), then scans the body
// for notes — optional accidental, letter, octave marks, duration
// multiplier — advancing a running beat clock; `z` rests advance it too.
// The generator walks events in time order, inserting `z` rests for gaps
// and quantising durations to standard note values.
//
// ABC carries melody only: no velocity (a default is assigned) and no
// positions (the mapper re-derives them when converting onward to tab).

use crate::error::ConvertError;
use crate::song::{Song, TimeSignature, Track};
use fretweave_core::event::NoteEvent;

/// Velocity assigned to parsed notes (ABC has none).
const PARSED_VELOCITY: u8 = 90;

/// Gaps shorter than this produce no rest in the output.
const MIN_REST_BEATS: f64 = 0.1;

/// Default note length written into the `L:` field.
const DEFAULT_NOTE_LENGTH: &str = "1/16";

/// Standard durations in beats used when quantising output.
const STANDARD_DURATIONS: [f64; 10] = [0.125, 0.25, 0.375, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0, 4.0];

// ── Parsing ──

/// Parse an ABC notation string.
pub fn parse_abc(text: &str) -> Result<Song, ConvertError> {
    let mut song = Song::default();
    let mut track = Track::default();

    // Default unit note length in beats; headers may override.
    let mut default_length = 0.5;
    let mut body_start: Option<usize> = None;

    let mut offset = 0;
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.len() >= 2 && trimmed.as_bytes()[1] == b':' {
            let value = trimmed[2..].trim();
            match trimmed.as_bytes()[0] {
                b'T' => song.title = value.to_string(),
                b'Q' => {
                    let tempo = value.rsplit('=').next().unwrap_or(value).trim();
                    if let Ok(bpm) = tempo.parse::<f64>() {
                        song.tempo_bpm = bpm;
                    }
                }
                b'M' => {
                    if let Some(ts) = TimeSignature::parse(value) {
                        song.time_signature = ts;
                        // Per the ABC spec, meters below 3/4 default to
                        // sixteenth-note units.
                        let fraction = ts.numerator as f64 / ts.denominator as f64;
                        default_length = if fraction < 0.75 { 0.25 } else { 0.5 };
                    }
                }
                b'L' => {
                    if let Some(fraction) = parse_duration_multiplier(value) {
                        default_length = fraction * 4.0;
                    }
                }
                b'K' => {
                    // Key field ends the header; the body follows.
                    body_start = Some(offset + line.len());
                }
                _ => {}
            }
        }
        offset += line.len() + 1;
    }

    let body = &text[body_start.unwrap_or(0).min(text.len())..];
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;
    let mut beat = 0.0;

    while i < chars.len() {
        let c = chars[i];

        // Rest: 'z' with optional duration multiplier.
        if c == 'z' {
            i += 1;
            let multiplier = scan_duration(&chars, &mut i);
            beat += multiplier * default_length;
            continue;
        }

        let accidental: i32 = match c {
            '^' => 1,
            '_' => -1,
            '=' => 0,
            _ => {
                if !c.is_ascii_alphabetic() || !"ABCDEFGabcdefg".contains(c) {
                    i += 1;
                    continue;
                }
                // No accidental prefix; fall through to the note letter.
                let (pitch, consumed) = scan_note(&chars, i, 0);
                if let Some(pitch) = pitch {
                    i += consumed;
                    let multiplier = scan_duration(&chars, &mut i);
                    let duration = multiplier * default_length;
                    track.events.push(NoteEvent {
                        pitch,
                        start_beat: beat,
                        duration_beats: duration,
                        velocity: PARSED_VELOCITY,
                    });
                    beat += duration;
                } else {
                    i += 1;
                }
                continue;
            }
        };

        // Accidental prefix consumed; a note letter must follow.
        if i + 1 < chars.len() && "ABCDEFGabcdefg".contains(chars[i + 1]) {
            let (pitch, consumed) = scan_note(&chars, i + 1, accidental);
            if let Some(pitch) = pitch {
                i += 1 + consumed;
                let multiplier = scan_duration(&chars, &mut i);
                let duration = multiplier * default_length;
                track.events.push(NoteEvent {
                    pitch,
                    start_beat: beat,
                    duration_beats: duration,
                    velocity: PARSED_VELOCITY,
                });
                beat += duration;
                continue;
            }
        }
        i += 1;
    }

    song.tracks.push(track);
    Ok(song)
}

/// Scan a note letter plus octave marks starting at `i`. Returns the MIDI
/// pitch and the number of characters consumed.
fn scan_note(chars: &[char], i: usize, accidental: i32) -> (Option<u8>, usize) {
    let letter = chars[i];
    let base = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return (None, 1),
    };
    // Lowercase letters sit one octave above uppercase.
    let octave_base: i32 = if letter.is_ascii_lowercase() { 72 } else { 60 };

    let mut consumed = 1;
    let mut octave_adjust = 0;
    while i + consumed < chars.len() {
        match chars[i + consumed] {
            '\'' => octave_adjust += 12,
            ',' => octave_adjust -= 12,
            _ => break,
        }
        consumed += 1;
    }

    let pitch = base + accidental + octave_base + octave_adjust;
    if (0..=127).contains(&pitch) {
        (Some(pitch as u8), consumed)
    } else {
        (None, consumed)
    }
}

/// Scan a duration multiplier (digits and slashes) at `*i`, advancing it.
fn scan_duration(chars: &[char], i: &mut usize) -> f64 {
    let start = *i;
    while *i < chars.len() && (chars[*i].is_ascii_digit() || chars[*i] == '/') {
        *i += 1;
    }
    let text: String = chars[start..*i].iter().collect();
    parse_duration_multiplier(&text).unwrap_or(1.0)
}

/// Parse an ABC duration string ("", "2", "/2", "3/2") into a multiplier.
fn parse_duration_multiplier(text: &str) -> Option<f64> {
    if text.is_empty() {
        return Some(1.0);
    }
    if let Some((num, den)) = text.split_once('/') {
        let num: f64 = if num.is_empty() { 1.0 } else { num.parse().ok()? };
        let den: f64 = if den.is_empty() { 2.0 } else { den.parse().ok()? };
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }
    text.parse().ok()
}

// ── Generation ──

/// Render a Song as ABC notation.
pub fn generate_abc(song: &Song) -> String {
    let default_length =
        parse_duration_multiplier(DEFAULT_NOTE_LENGTH).expect("literal is well-formed") * 4.0;

    let mut lines = vec![
        "X:1".to_string(),
        format!("T:{}", song.title),
        format!("M:{}", song.time_signature),
        format!("L:{DEFAULT_NOTE_LENGTH}"),
        format!("Q:1/4={}", song.tempo_bpm as i64),
        "K:C".to_string(),
    ];

    let mut body = String::new();
    let mut clock = 0.0;
    for event in song.merged_events() {
        // A gap between the running clock and this note becomes a rest.
        let gap = event.start_beat - clock;
        if gap > MIN_REST_BEATS {
            let rest = quantize_duration(gap);
            if rest > 0.0 {
                body.push_str(&format!("z{} ", duration_string(rest, default_length)));
            }
        }

        let duration = quantize_duration(event.duration_beats);
        if duration == 0.0 {
            clock = clock.max(event.end_beat());
            continue;
        }
        body.push_str(&format!(
            "{}{} ",
            pitch_string(event.pitch),
            duration_string(duration, default_length)
        ));
        clock = event.end_beat();
    }

    // Wrap the body at 70 columns.
    let mut current = String::new();
    for word in body.split_whitespace() {
        if current.len() + word.len() + 1 > 70 {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

/// Nearest standard musical duration.
fn quantize_duration(beats: f64) -> f64 {
    STANDARD_DURATIONS
        .iter()
        .copied()
        .min_by(|a, b| {
            (a - beats)
                .abs()
                .partial_cmp(&(b - beats).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(0.5)
}

/// MIDI pitch -> ABC note string.
fn pitch_string(pitch: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "^C", "D", "^D", "E", "F", "^F", "G", "^G", "A", "^A", "B",
    ];
    let octave = (pitch / 12) as i32 - 1;
    let name = NAMES[(pitch % 12) as usize];
    match octave {
        o if o < 4 => format!("{name}{}", ",".repeat((4 - o) as usize)),
        4 => name.to_string(),
        5 => name.to_lowercase(),
        o => format!("{}{}", name.to_lowercase(), "'".repeat((o - 5) as usize)),
    }
}

/// Duration in beats -> ABC multiplier string relative to the unit length.
fn duration_string(beats: f64, default_length: f64) -> String {
    let multiplier = beats / default_length;
    if (multiplier - 1.0).abs() < 1e-9 {
        return String::new();
    }
    // Smallest clean fraction among musical denominators.
    let mut best = (1u32, 1u32, f64::INFINITY);
    for den in [1u32, 2, 3, 4, 6, 8, 12, 16] {
        let num = (multiplier * den as f64).round().max(0.0) as u32;
        let err = (multiplier - num as f64 / den as f64).abs();
        if err < best.2 {
            best = (num, den, err);
        }
    }
    let (mut num, mut den, _) = best;
    let g = gcd(num.max(1), den);
    num /= g;
    den /= g;
    match (num, den) {
        (n, 1) => n.to_string(),
        (1, d) => format!("/{d}"),
        (n, d) => format!("{n}/{d}"),
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::song::Track;

    fn note(pitch: u8, start: f64, duration: f64) -> NoteEvent {
        NoteEvent {
            pitch,
            start_beat: start,
            duration_beats: duration,
            velocity: 90,
        }
    }

    #[test]
    fn test_parse_header_fields() {
        let abc = "X:1\nT:Air\nM:3/4\nL:1/8\nQ:1/4=90\nK:C\nC D E\n";
        let song = parse_abc(abc).unwrap();
        assert_eq!(song.title, "Air");
        assert_eq!(song.tempo_bpm, 90.0);
        assert_eq!(song.time_signature.to_string(), "3/4");
    }

    #[test]
    fn test_parse_notes_sequence() {
        let abc = "X:1\nL:1/8\nK:C\nC D E2\n";
        let song = parse_abc(abc).unwrap();
        let events = &song.tracks[0].events;
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].pitch, 60);
        assert_eq!(events[1].pitch, 62);
        assert_eq!(events[2].pitch, 64);
        assert_eq!(events[0].start_beat, 0.0);
        assert_eq!(events[1].start_beat, 0.5);
        assert_eq!(events[2].duration_beats, 1.0);
    }

    #[test]
    fn test_parse_accidentals_and_octaves() {
        let abc = "K:C\n^C c _B, e'\n";
        let song = parse_abc(abc).unwrap();
        let pitches: Vec<u8> = song.tracks[0].events.iter().map(|e| e.pitch).collect();
        assert_eq!(pitches, vec![61, 72, 58, 88]);
    }

    #[test]
    fn test_rests_advance_the_clock() {
        let abc = "L:1/8\nK:C\nC z2 D\n";
        let song = parse_abc(abc).unwrap();
        let events = &song.tracks[0].events;
        assert_eq!(events[1].start_beat, 1.5);
    }

    #[test]
    fn test_generate_headers() {
        let song = Song {
            title: "Test".to_string(),
            tempo_bpm: 100.0,
            ..Default::default()
        };
        let abc = generate_abc(&song);
        assert!(abc.contains("T:Test"));
        assert!(abc.contains("Q:1/4=100"));
        assert!(abc.contains("K:C"));
    }

    #[test]
    fn test_roundtrip_pitches_and_beats() {
        let song = Song {
            tracks: vec![Track {
                events: vec![note(60, 0.0, 0.5), note(64, 0.5, 0.5), note(67, 1.0, 1.0)],
            }],
            ..Default::default()
        };
        let restored = parse_abc(&generate_abc(&song)).unwrap();
        let events = &restored.tracks[0].events;
        let pitches: Vec<u8> = events.iter().map(|e| e.pitch).collect();
        assert_eq!(pitches, vec![60, 64, 67]);
        let starts: Vec<f64> = events.iter().map(|e| e.start_beat).collect();
        assert_eq!(starts, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_generator_emits_rest_for_gap() {
        let song = Song {
            tracks: vec![Track {
                events: vec![note(60, 0.0, 0.5), note(64, 2.0, 0.5)],
            }],
            ..Default::default()
        };
        let abc = generate_abc(&song);
        assert!(abc.contains('z'), "expected a rest in {abc}");
        let restored = parse_abc(&abc).unwrap();
        assert_eq!(restored.tracks[0].events[1].start_beat, 2.0);
    }

    #[test]
    fn test_duration_string_fractions() {
        assert_eq!(duration_string(0.25, 0.25), "");
        assert_eq!(duration_string(0.5, 0.25), "2");
        assert_eq!(duration_string(0.375, 0.25), "3/2");
        assert_eq!(duration_string(0.125, 0.25), "/2");
    }
}
