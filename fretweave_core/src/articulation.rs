// Post-hoc articulation labelling.
//
// Runs after the DP over consecutive monophonic frames and labels each
// transition: hammer-on / pull-off for small same-string fret moves inside
// the legato time window, slides for larger moves, and taps for the
// unreachable jumps inside long stretched runs. Labels live in a side
// channel parallel to the mapped frames — positions are never altered, so
// disabling this pass cannot change any (string, fret) choice.

use crate::config::MapperConfig;
use crate::event::MappedFrame;

/// A transition label. `symbol` is the tab token placed before the fret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Articulation {
    HammerOn,
    PullOff,
    SlideUp,
    SlideDown,
    Tap,
}

impl Articulation {
    pub fn symbol(&self) -> char {
        match self {
            Articulation::HammerOn => 'h',
            Articulation::PullOff => 'p',
            Articulation::SlideUp => '/',
            Articulation::SlideDown => '\\',
            Articulation::Tap => 't',
        }
    }

    pub fn from_symbol(c: char) -> Option<Articulation> {
        match c {
            'h' => Some(Articulation::HammerOn),
            'p' => Some(Articulation::PullOff),
            '/' => Some(Articulation::SlideUp),
            '\\' => Some(Articulation::SlideDown),
            't' => Some(Articulation::Tap),
            _ => None,
        }
    }
}

/// Label the transitions of a mapped piece. Entry `i` of the result labels
/// the transition into frame `i`; entry 0 is always None.
pub fn infer_articulations(
    mapped: &[MappedFrame],
    config: &MapperConfig,
) -> Vec<Option<Articulation>> {
    let mut labels: Vec<Option<Articulation>> = vec![None; mapped.len()];
    if config.no_articulations {
        return labels;
    }

    // First pass: pairwise labels between consecutive monophonic frames.
    for i in 1..mapped.len() {
        let (Some(prev), Some(curr)) = (mapped[i - 1].as_chosen(), mapped[i].as_chosen()) else {
            continue;
        };
        if !prev.is_monophonic() || !curr.is_monophonic() {
            continue;
        }
        let prev_pos = prev.positions[0].position;
        let curr_pos = curr.positions[0].position;
        if prev_pos.string != curr_pos.string {
            continue;
        }
        let gap = curr.start_beat - prev.end_beat();
        if gap > config.legato_time_threshold {
            continue;
        }
        let jump = curr_pos.fret as i32 - prev_pos.fret as i32;
        labels[i] = match jump {
            0 => None,
            1 | 2 => Some(Articulation::HammerOn),
            -1 | -2 => Some(Articulation::PullOff),
            j if j > 2 => Some(Articulation::SlideUp),
            _ => Some(Articulation::SlideDown),
        };
    }

    // Second pass: inside a long same-string legato run whose overall
    // stretch exceeds the hand span, the jumps a finger cannot reach
    // (those labelled as slides, past the run's first transition) are
    // really taps.
    let mut i = 1;
    while i < mapped.len() {
        if labels[i].is_none() {
            i += 1;
            continue;
        }
        // The run covers frames run_start..=run_end, joined by labelled
        // transitions at run_start+1..=run_end.
        let run_start = i - 1;
        let mut run_end = i;
        while run_end + 1 < mapped.len() && labels[run_end + 1].is_some() {
            run_end += 1;
        }

        let notes = run_end - run_start + 1;
        let fret_at = |idx: usize| {
            mapped[idx]
                .as_chosen()
                .expect("labelled transitions join chosen frames")
                .positions[0]
                .position
                .fret
        };
        let stretch = fret_at(run_start).abs_diff(fret_at(run_end));

        if notes >= config.tapping_run_threshold && stretch > config.unplayable_fret_span {
            for label in labels[run_start + 2..=run_end].iter_mut() {
                if matches!(
                    label,
                    Some(Articulation::SlideUp) | Some(Articulation::SlideDown)
                ) {
                    *label = Some(Articulation::Tap);
                }
            }
        }

        i = run_end + 1;
    }

    labels
}
