// ASCII tab rendering: mapped frames -> text.
//
// One measure per system; the measure's content is `max_line_width`
// characters wide. Within a measure, a note's column comes from a
// logarithmic schedule over its quantisation-grid slot, so early-beat
// density is preserved and trailing sustain gets exponentially less room:
//
//     col(g) = round(W * ln(1 + g*a) / ln(1 + (G-1)*a))
//
// with G grid slots per measure and a = LOG_ALPHA. The schedule is
// invertible, which is what lets tab_parse.rs reconstruct beats from
// columns. Simultaneous notes share a column; a multi-digit fret shifts
// every later column right by (digits - 1); articulation tokens sit in the
// cell before their digit; everything else is '-'.

use crate::song::Song;
use fretweave_core::articulation::Articulation;
use fretweave_core::config::MapperConfig;
use fretweave_core::event::MappedFrame;
use fretweave_core::fretboard::Fretboard;
use fretweave_core::tuning::Tuning;

/// Curvature of the column schedule.
pub const LOG_ALPHA: f64 = 0.5;

/// Column for a grid slot under the logarithmic schedule.
pub fn column_for_slot(slot: usize, slots_per_measure: usize, width: usize) -> usize {
    if slots_per_measure <= 1 {
        return 0;
    }
    let g = slot.min(slots_per_measure - 1) as f64;
    let g_max = (slots_per_measure - 1) as f64;
    let frac = (1.0 + g * LOG_ALPHA).ln() / (1.0 + g_max * LOG_ALPHA).ln();
    (width as f64 * frac).round() as usize
}

/// Inverse of `column_for_slot`, rounded to the nearest slot.
pub fn slot_for_column(col: usize, slots_per_measure: usize, width: usize) -> usize {
    if slots_per_measure <= 1 || width == 0 {
        return 0;
    }
    let g_max = (slots_per_measure - 1) as f64;
    let base = 1.0 + g_max * LOG_ALPHA;
    let g = (base.powf(col as f64 / width as f64) - 1.0) / LOG_ALPHA;
    (g.round().max(0.0) as usize).min(slots_per_measure - 1)
}

/// Single-character row labels for a tuning, highest string lowercase
/// (e, B, G, D, A, E for standard guitar).
pub fn string_labels(tuning: &Tuning) -> Vec<char> {
    tuning
        .note_names()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let letter = name.chars().next().unwrap_or('?');
            if i == 0 {
                letter.to_ascii_lowercase()
            } else {
                letter.to_ascii_uppercase()
            }
        })
        .collect()
}

/// Render a mapped piece as ASCII tab. `labels[i]` is the articulation on
/// the transition into frame `i`.
pub fn render_tab(
    song: &Song,
    mapped: &[MappedFrame],
    labels: &[Option<Articulation>],
    board: &Fretboard,
    config: &MapperConfig,
    max_line_width: usize,
) -> String {
    let tuning = board.tuning();
    let num_strings = tuning.num_strings();
    let row_labels = string_labels(tuning);

    let tuning_header = if tuning.name == "CUSTOM" {
        tuning.note_names().join(" ")
    } else {
        tuning.name.clone()
    };
    let mut out = vec![
        format!("// Title: {}", song.title),
        format!("// Tempo: {} BPM", song.tempo_bpm),
        format!("// Time: {}", song.time_signature),
        format!("// Tuning: {tuning_header}"),
        String::new(),
    ];

    let beats_per_measure = song.time_signature.beats_per_measure();
    let resolution = config.quantization_resolution;
    let slots = ((beats_per_measure / resolution).round() as usize).max(1);
    let width = max_line_width.max(8);
    let eff_width = width - 2;

    // Bucket frames into measures with their grid slots.
    let num_measures = mapped
        .iter()
        .map(|m| (m.start_beat() / beats_per_measure).floor().max(0.0) as usize + 1)
        .max()
        .unwrap_or(0);
    let mut measures: Vec<Vec<(usize, usize)>> = vec![Vec::new(); num_measures];
    for (idx, frame) in mapped.iter().enumerate() {
        let measure = (frame.start_beat() / beats_per_measure).floor().max(0.0) as usize;
        let beat_in_measure = frame.start_beat() - measure as f64 * beats_per_measure;
        let slot = ((beat_in_measure / resolution).round() as usize).min(slots - 1);
        measures[measure].push((slot, idx));
    }

    for frames in &measures {
        let mut rows: Vec<Vec<char>> = vec![vec!['-'; width]; num_strings];
        let mut shift = 0usize;
        // Adjacent late slots can share a column under the schedule; keep
        // note columns strictly advancing so frames never overlap.
        let mut min_next_col = 0usize;

        for &(slot, idx) in frames {
            let Some(chosen) = mapped[idx].as_chosen() else {
                continue; // a rest occupies its slot as dashes
            };

            let mut col = (column_for_slot(slot, slots, eff_width) + shift).max(min_next_col);
            let max_digits = chosen
                .positions
                .iter()
                .map(|c| digit_count(c.position.fret))
                .max()
                .unwrap_or(1);
            if col + max_digits > width {
                col = width - max_digits;
            }

            if let Some(articulation) = labels.get(idx).copied().flatten() {
                if col > 0 && rows[chosen.positions[0].position.string as usize][col - 1] == '-' {
                    rows[chosen.positions[0].position.string as usize][col - 1] =
                        articulation.symbol();
                }
            }

            for chosen_pos in &chosen.positions {
                let text = chosen_pos.position.fret.to_string();
                let row = &mut rows[chosen_pos.position.string as usize];
                for (i, ch) in text.chars().enumerate() {
                    row[col + i] = ch;
                }
            }

            shift += max_digits - 1;
            min_next_col = col + max_digits;
        }

        for (string, row) in rows.iter().enumerate() {
            let content: String = row.iter().collect();
            out.push(format!("{}|{content}|", row_labels[string]));
        }
        out.push(String::new());
    }

    out.join("\n")
}

fn digit_count(fret: u8) -> usize {
    if fret >= 10 { 2 } else { 1 }
}
