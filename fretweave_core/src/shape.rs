// The chord-shape oracle: can one hand play this frame, and how gladly.
//
// Given a candidate chosen frame, either rejects it outright (two notes on
// one string, or a fret stretch wider than a hand) or prices it with a
// frame-local cost. The cost only looks at the frame itself; everything
// pairwise between frames lives in scorer.rs.

use crate::config::MapperConfig;
use crate::event::ChosenFrame;
use crate::fretboard::Fretboard;

/// Score a candidate frame. None means the shape is infeasible.
pub fn shape_cost(frame: &ChosenFrame, board: &Fretboard, config: &MapperConfig) -> Option<f64> {
    let sig = &frame.signature;

    // Two positions on one string can never sound together.
    if sig.strings_used.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }

    // The fret stretch the hand has to cover. Opens are excluded unless
    // the config counts them.
    let spanned: Vec<u8> = if config.ignore_open {
        frame
            .positions
            .iter()
            .map(|c| c.position.fret)
            .filter(|&f| f > 0)
            .collect()
    } else {
        frame.positions.iter().map(|c| c.position.fret).collect()
    };
    let span = match (spanned.iter().min(), spanned.iter().max()) {
        (Some(&min), Some(&max)) => max - min,
        _ => 0,
    };
    if span > config.unplayable_fret_span {
        return None;
    }

    let mut cost = config.fret_span_penalty * span as f64;

    // Playing high on the neck costs, and costs more on the low strings
    // (the lower-sounding half of the string set).
    let max_fretted = sig.max_fretted_fret.unwrap_or(0);
    cost += config.high_fret_penalty * max_fretted as f64;

    let low_string_start = (board.num_strings() / 2) as u8;
    for chosen in &frame.positions {
        if chosen.position.fret > 0 && chosen.position.string >= low_string_start {
            cost += config.low_string_high_fret_multiplier * chosen.position.fret as f64;
        }
    }

    // Barre detection: every fretted note on the same fret.
    if sig.fretted_count >= 2 && sig.min_fretted_fret == sig.max_fretted_fret {
        cost += config.barre_penalty - config.barre_bonus;
    }

    // Fretting a note that had an open-string alternative.
    if config.prefer_open {
        for chosen in &frame.positions {
            if chosen.position.fret > 0
                && board
                    .positions_for(chosen.event.pitch)
                    .iter()
                    .any(|p| p.fret == 0)
            {
                cost += config.fretted_open_penalty;
            }
        }
    }

    // Sweet-spot reward when the whole shape sits in the ideal range.
    let in_sweet_spot = spanned
        .iter()
        .all(|&f| f >= config.sweet_spot_low && f <= config.sweet_spot_high);
    if in_sweet_spot {
        cost -= config.sweet_spot_bonus;
    }

    Some(cost.max(0.0))
}
