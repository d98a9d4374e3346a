// MIDI pitch <-> note name helpers.
//
// Pitches are plain MIDI semitone indices (60 = C4, 69 = A4). Note names
// are needed in two places: the `Tuning:` header of ASCII tab (which may
// carry a space-separated note list instead of a preset name) and the
// human-facing tuning catalogue surfaces.

/// Pitch class names, flats for the enharmonic spellings.
const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// Render a MIDI pitch as a note name, e.g. 54 -> "F#3".
pub fn pitch_name(pitch: u8) -> String {
    let octave = (pitch / 12) as i8 - 1;
    let class = PITCH_CLASS_NAMES[(pitch % 12) as usize];
    format!("{class}{octave}")
}

/// Parse a note name ("A4", "C#5", "Eb3") into a MIDI pitch.
///
/// Accepts upper- or lowercase letters and a single `#`/`b` accidental.
pub fn note_name_to_pitch(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest: String = chars.collect();
    let (accidental, octave_str) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest.as_str()),
    };

    let octave: i32 = octave_str.parse().ok()?;
    let pitch = base + accidental + (octave + 1) * 12;
    if (0..=127).contains(&pitch) {
        Some(pitch as u8)
    } else {
        None
    }
}
