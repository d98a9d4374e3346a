// Per-run diagnostic sink.
//
// The mapper never logs through process-wide state; the caller hands a
// `Diagnostics` value down and reads it back after the run. Per-event and
// per-frame problems (unmappable pitches, infeasible chords) are local:
// they are counted here and the run carries on. Only configuration and
// input-format errors abort, and those travel as `Result` errors instead.

/// Detail level for collected messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
}

/// Counters plus detail lines for one mapper run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub notes_dropped: usize,
    pub notes_folded: usize,
    pub frames_infeasible: usize,
    messages: Vec<(Level, String)>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn note_dropped(&mut self, pitch: u8, beat: f64, reason: &str) {
        self.notes_dropped += 1;
        self.messages.push((
            Level::Debug,
            format!("dropped note {pitch} at beat {beat}: {reason}"),
        ));
    }

    pub fn note_folded(&mut self, pitch: u8, folded_to: u8, beat: f64) {
        self.notes_folded += 1;
        self.messages.push((
            Level::Debug,
            format!("folded note {pitch} to {folded_to} at beat {beat}"),
        ));
    }

    pub fn frame_infeasible(&mut self, beat: f64, num_notes: usize) {
        self.frames_infeasible += 1;
        self.messages.push((
            Level::Info,
            format!("no playable shape for {num_notes} notes at beat {beat}; emitting rest"),
        ));
    }

    pub fn messages(&self, min_level: Level) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(move |(level, _)| min_level == Level::Debug || *level == min_level)
            .map(|(_, text)| text.as_str())
    }

    /// The final one-line run summary, e.g. "3 notes dropped, 1 chord
    /// unplayable". None when the run was clean.
    pub fn summary(&self) -> Option<String> {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        let mut parts = Vec::new();
        if self.notes_dropped > 0 {
            parts.push(format!(
                "{} note{} dropped",
                self.notes_dropped,
                plural(self.notes_dropped)
            ));
        }
        if self.notes_folded > 0 {
            parts.push(format!(
                "{} note{} octave-folded",
                self.notes_folded,
                plural(self.notes_folded)
            ));
        }
        if self.frames_infeasible > 0 {
            parts.push(format!(
                "{} chord{} unplayable",
                self.frames_infeasible,
                plural(self.frames_infeasible)
            ));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}
