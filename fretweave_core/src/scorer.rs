// Transition scoring between consecutive chosen frames.
//
// Prices the hand's journey from the previous frame to a candidate: how
// far the hand centroid travels, how many fresh strings get struck, and
// whether anything from the previous frame keeps ringing. The very first
// frame of a piece (and the first frame after a rest) pays no transition
// cost.

use crate::config::MapperConfig;
use crate::event::ChosenFrame;

/// Cost of moving from `prev` to `curr`. None when the optional neighbor
/// fret-span gate rejects the pair outright.
pub fn transition_cost(prev: &ChosenFrame, curr: &ChosenFrame, config: &MapperConfig) -> Option<f64> {
    // Optional gate: the two frames' fretted notes taken together must
    // still fit under one hand.
    if config.count_fret_span_across_neighbors {
        let frets: Vec<u8> = prev
            .positions
            .iter()
            .chain(curr.positions.iter())
            .map(|c| c.position.fret)
            .filter(|&f| f > 0)
            .collect();
        if let (Some(&min), Some(&max)) = (frets.iter().min(), frets.iter().max()) {
            if max - min > config.unplayable_fret_span {
                return None;
            }
        }
    }

    let movement = (centroid_fret(prev, config) - centroid_fret(curr, config)).abs();
    let mut cost = config.movement_penalty * movement;

    let fresh_strings = curr
        .signature
        .strings_used
        .iter()
        .filter(|s| !prev.signature.strings_used.contains(s))
        .count();
    cost += config.string_switch_penalty * fresh_strings as f64;

    // Let-ring: a string held in the previous frame and not re-struck now
    // can keep sounding.
    let rings = prev
        .signature
        .strings_used
        .iter()
        .any(|s| !curr.signature.strings_used.contains(s));
    if rings {
        cost -= config.let_ring_bonus;
    }

    Some(cost.max(0.0))
}

/// The hand's position for movement scoring: mean of the frame's fretted
/// frets. Opens are ignored when the config says so; a frame with nothing
/// to average sits at the nut.
fn centroid_fret(frame: &ChosenFrame, config: &MapperConfig) -> f64 {
    let frets: Vec<f64> = frame
        .positions
        .iter()
        .map(|c| c.position.fret as f64)
        .filter(|&f| !config.ignore_open || f > 0.0)
        .collect();
    if frets.is_empty() {
        0.0
    } else {
        frets.iter().sum::<f64>() / frets.len() as f64
    }
}
