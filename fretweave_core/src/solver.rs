// The frame DP solver: a minimum-cost path over candidate chord shapes.
//
// For each frame the solver enumerates every feasible assignment of its
// notes to strings (the Cartesian product of per-pitch positions, pruned
// for string collisions and gated by the shape oracle), then runs a
// forward DP:
//
//     best[i][c] = shape_cost(c)
//                + min over c' in candidates(i-1) of
//                      best[i-1][c'] + transition_cost(c', c)
//
// with back-pointers, and back-traces from the cheapest final candidate.
// Ties break deterministically by (lower max fret, lexicographically lower
// string set), so a given (events, config) always maps the same way.
//
// A frame with no feasible candidate becomes an explicit rest: the running
// minimum seeds the next frame's base cost and the frame after the rest
// pays no transition (like the first frame of the piece).
//
// Complexity is O(sum over i of |candidates(i-1)| * |candidates(i)|);
// candidate counts are bounded by hand geometry, so in practice this is
// sub-millisecond per frame. With a single-string constraint every
// candidate set has at most one element and the DP degenerates to a
// linear walk.

use crate::config::MapperConfig;
use crate::diagnostics::Diagnostics;
use crate::event::{ChosenFrame, ChosenPosition, Frame, MappedFrame};
use crate::fretboard::Fretboard;
use crate::scorer::transition_cost;
use crate::shape::shape_cost;
use std::cmp::Ordering;

/// One DP state: a candidate chosen frame, its cumulative cost, and the
/// index of its best predecessor in the previous layer.
struct Node {
    chosen: ChosenFrame,
    cost: f64,
    back: Option<usize>,
}

/// Map a normalised frame sequence onto the fretboard.
pub fn map_frames(
    frames: &[Frame],
    board: &Fretboard,
    config: &MapperConfig,
    diag: &mut Diagnostics,
) -> Vec<MappedFrame> {
    let mut mapped: Vec<Option<MappedFrame>> = (0..frames.len()).map(|_| None).collect();

    // Layers of the current DP segment (between rests), each tagged with
    // its frame index.
    let mut segment: Vec<(usize, Vec<Node>)> = Vec::new();
    let mut base_cost = 0.0;

    for (i, frame) in frames.iter().enumerate() {
        let candidates = enumerate_candidates(frame, board, config, diag);

        let nodes: Vec<Node> = match segment.last() {
            None => candidates
                .into_iter()
                .map(|(chosen, shape)| Node {
                    chosen,
                    cost: base_cost + shape,
                    back: None,
                })
                .collect(),
            Some((_, prev)) => candidates
                .into_iter()
                .filter_map(|(chosen, shape)| {
                    let mut best: Option<(f64, usize)> = None;
                    for (j, p) in prev.iter().enumerate() {
                        let Some(t) = transition_cost(&p.chosen, &chosen, config) else {
                            continue;
                        };
                        let total = p.cost + t;
                        let replace = match &best {
                            None => true,
                            Some((best_cost, best_j)) => {
                                match total.partial_cmp(best_cost).unwrap_or(Ordering::Equal) {
                                    Ordering::Less => true,
                                    Ordering::Greater => false,
                                    Ordering::Equal => {
                                        prefer(&p.chosen, &prev[*best_j].chosen)
                                    }
                                }
                            }
                        };
                        if replace {
                            best = Some((total, j));
                        }
                    }
                    best.map(|(cost, j)| Node {
                        chosen,
                        cost: cost + shape,
                        back: Some(j),
                    })
                })
                .collect(),
        };

        if nodes.is_empty() {
            // Unplayable chord (or every transition gated out): emit a
            // rest, keep the timeline, and restart the DP from the running
            // minimum.
            diag.frame_infeasible(frame.start_beat, frame.events.len());
            if let Some((_, last)) = segment.last() {
                base_cost = last
                    .iter()
                    .map(|n| n.cost)
                    .fold(f64::INFINITY, f64::min);
            }
            finalize_segment(&segment, &mut mapped);
            segment.clear();
            mapped[i] = Some(MappedFrame::Rest {
                start_beat: frame.start_beat,
            });
            continue;
        }

        segment.push((i, nodes));
    }
    finalize_segment(&segment, &mut mapped);

    mapped
        .into_iter()
        .map(|slot| slot.expect("every frame is either mapped or a rest"))
        .collect()
}

/// Back-trace one DP segment from its cheapest final node.
fn finalize_segment(segment: &[(usize, Vec<Node>)], mapped: &mut [Option<MappedFrame>]) {
    let Some((_, last)) = segment.last() else {
        return;
    };

    let mut best = 0;
    for (j, node) in last.iter().enumerate().skip(1) {
        match node.cost.partial_cmp(&last[best].cost).unwrap_or(Ordering::Equal) {
            Ordering::Less => best = j,
            Ordering::Greater => {}
            Ordering::Equal => {
                if prefer(&node.chosen, &last[best].chosen) {
                    best = j;
                }
            }
        }
    }

    let mut idx = Some(best);
    for (frame_idx, layer) in segment.iter().rev() {
        let node = &layer[idx.expect("back-pointer chain matches segment length")];
        mapped[*frame_idx] = Some(MappedFrame::Chosen(node.chosen.clone()));
        idx = node.back;
    }
}

/// Deterministic tie-break: lower max fret first, then the
/// lexicographically lower string set.
fn prefer(a: &ChosenFrame, b: &ChosenFrame) -> bool {
    (a.signature.max_fret, &a.signature.strings_used)
        < (b.signature.max_fret, &b.signature.strings_used)
}

/// Enumerate every feasible chosen frame for one frame, with its shape
/// cost. Pitches with no position on the board are dropped here (the
/// normaliser only removes them when range constraining is enabled).
fn enumerate_candidates(
    frame: &Frame,
    board: &Fretboard,
    config: &MapperConfig,
    diag: &mut Diagnostics,
) -> Vec<(ChosenFrame, f64)> {
    let mut playable = Vec::with_capacity(frame.events.len());
    for event in &frame.events {
        let positions = board.positions_for(event.pitch);
        if positions.is_empty() {
            diag.note_dropped(event.pitch, event.start_beat, "no position on fretboard");
        } else {
            playable.push((*event, positions));
        }
    }
    if playable.is_empty() || playable.len() > board.num_strings() {
        return Vec::new();
    }

    let mut out = Vec::new();
    let mut current: Vec<ChosenPosition> = Vec::with_capacity(playable.len());
    product(frame, &playable, 0, 0, &mut current, board, config, &mut out);
    out
}

/// Walk the Cartesian product of position choices, pruning string
/// collisions as we descend. `used` is a bitmask of occupied strings.
#[allow(clippy::too_many_arguments)]
fn product(
    frame: &Frame,
    playable: &[(crate::event::NoteEvent, Vec<crate::fretboard::Position>)],
    depth: usize,
    used: u32,
    current: &mut Vec<ChosenPosition>,
    board: &Fretboard,
    config: &MapperConfig,
    out: &mut Vec<(ChosenFrame, f64)>,
) {
    if depth == playable.len() {
        let chosen = ChosenFrame::new(frame, current.clone());
        if let Some(shape) = shape_cost(&chosen, board, config) {
            out.push((chosen, shape));
        }
        return;
    }
    let (event, positions) = &playable[depth];
    for &position in positions {
        let bit = 1u32 << position.string;
        if used & bit != 0 {
            continue;
        }
        current.push(ChosenPosition {
            position,
            event: *event,
        });
        product(frame, playable, depth + 1, used | bit, current, board, config, out);
        current.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NoteEvent;
    use crate::normalize::normalize;
    use crate::tuning::Tuning;

    fn note(pitch: u8, start: f64) -> NoteEvent {
        NoteEvent {
            pitch,
            start_beat: start,
            duration_beats: 0.25,
            velocity: 90,
        }
    }

    fn standard() -> Fretboard {
        Fretboard::new(Tuning::preset("STANDARD").unwrap(), 0, 24, None)
    }

    fn run(events: &[NoteEvent], config: &MapperConfig, board: &Fretboard) -> Vec<MappedFrame> {
        let mut diag = Diagnostics::new();
        let frames = normalize(events, config, board, &mut diag);
        map_frames(&frames, board, config, &mut diag)
    }

    #[test]
    fn test_open_string_wins_for_low_e() {
        let config = MapperConfig::default();
        let mapped = run(&[note(40, 0.0)], &config, &standard());
        let chosen = mapped[0].as_chosen().unwrap();
        assert_eq!(chosen.positions[0].position.string, 5);
        assert_eq!(chosen.positions[0].position.fret, 0);
    }

    #[test]
    fn test_every_position_sounds_its_pitch() {
        let config = MapperConfig::default();
        let board = standard();
        let events: Vec<NoteEvent> = [60u8, 64, 67, 59, 55, 62]
            .iter()
            .enumerate()
            .map(|(i, &p)| note(p, i as f64 * 0.5))
            .collect();
        for frame in run(&events, &config, &board) {
            let chosen = frame.as_chosen().unwrap();
            for c in &chosen.positions {
                assert_eq!(board.pitch_at(c.position), c.event.pitch);
            }
        }
    }

    #[test]
    fn test_chord_strings_are_distinct() {
        let config = MapperConfig::default();
        // An open E major chord's worth of pitches, all at once.
        let events = vec![note(40, 0.0), note(47, 0.0), note(52, 0.0), note(56, 0.0)];
        let mapped = run(&events, &config, &standard());
        let chosen = mapped[0].as_chosen().unwrap();
        let mut strings: Vec<u8> = chosen.positions.iter().map(|c| c.position.string).collect();
        strings.sort_unstable();
        strings.dedup();
        assert_eq!(strings.len(), chosen.positions.len());
    }

    #[test]
    fn test_unplayable_chromatic_cluster_becomes_rest() {
        let config = MapperConfig::default();
        // C4, C#4, D4 together: no distinct-string shape fits under a
        // four-fret hand on a standard guitar.
        let events = [
            note(64, 0.0),
            note(60, 0.5),
            note(61, 0.5),
            note(62, 0.5),
            note(64, 1.0),
        ];
        let mapped = run(&events, &config, &standard());
        assert_eq!(mapped.len(), 3);
        assert!(mapped[0].as_chosen().is_some());
        assert!(matches!(mapped[1], MappedFrame::Rest { .. }));
        assert!(mapped[2].as_chosen().is_some());
    }

    #[test]
    fn test_single_string_scale_walks_up_one_string() {
        let config = MapperConfig {
            single_string: Some(3), // 1-based: the G string
            ..Default::default()
        };
        let board = Fretboard::new(
            Tuning::preset("STANDARD").unwrap(),
            0,
            24,
            config.single_string_index(),
        );
        // C4 D4 E4 F4 G4, a quarter-beat apart.
        let events: Vec<NoteEvent> = [60u8, 62, 64, 65, 67]
            .iter()
            .enumerate()
            .map(|(i, &p)| note(p, i as f64 * 0.25))
            .collect();
        let mapped = run(&events, &config, &board);
        let positions: Vec<(u8, u8)> = mapped
            .iter()
            .map(|m| {
                let c = m.as_chosen().unwrap();
                (c.positions[0].position.string, c.positions[0].position.fret)
            })
            .collect();
        assert_eq!(positions, vec![(2, 5), (2, 7), (2, 9), (2, 10), (2, 12)]);
    }

    #[test]
    fn test_determinism() {
        let config = MapperConfig::default();
        let board = standard();
        let events: Vec<NoteEvent> = (0..24)
            .map(|i| note(52 + (i * 5 % 24) as u8, i as f64 * 0.25))
            .collect();
        let first = run(&events, &config, &board);
        let second = run(&events, &config, &board);
        assert_eq!(first, second);
    }

    #[test]
    fn test_higher_fret_penalty_never_raises_max_fret() {
        let board = standard();
        let events: Vec<NoteEvent> = [55u8, 59, 62, 64, 60, 57]
            .iter()
            .enumerate()
            .map(|(i, &p)| note(p, i as f64 * 0.5))
            .collect();

        let max_fret_used = |mapped: &[MappedFrame]| {
            mapped
                .iter()
                .filter_map(|m| m.as_chosen())
                .map(|c| c.signature.max_fret)
                .max()
                .unwrap_or(0)
        };

        let mut previous = None;
        for penalty in [0.0, 2.0, 5.0, 20.0, 100.0] {
            let config = MapperConfig {
                high_fret_penalty: penalty,
                ..Default::default()
            };
            let reached = max_fret_used(&run(&events, &config, &board));
            if let Some(prev) = previous {
                assert!(reached <= prev, "max fret rose from {prev} to {reached}");
            }
            previous = Some(reached);
        }
    }
}
