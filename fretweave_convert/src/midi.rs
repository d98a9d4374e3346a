// Standard MIDI File input and output.
//
// Reading walks every track, pairs note-on with note-off FIFO per pitch,
// and converts tick times to beats via the file's ticks-per-beat. Tempo
// and time-signature metas land on the Song. Notes still sounding when a
// track ends are closed at the track's final tick.
//
// Writing mirrors the reader: SMF Format 1 (multi-track), a tempo track
// first, then one track per song track. Uses the `midly` crate both ways.

use crate::error::ConvertError;
use crate::song::{Song, TimeSignature, Track};
use fretweave_core::event::NoteEvent;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::collections::BTreeMap;
use std::path::Path;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Fallback when a file reports zero ticks per beat.
const DEFAULT_TICKS_PER_BEAT: f64 = 480.0;

/// Duration given to notes left hanging at the end of a track.
const HANGING_NOTE_BEATS: f64 = 0.25;

/// Read a MIDI file. `track` selects one track (1-based) or all.
pub fn read_midi(path: &Path, track: Option<usize>) -> Result<Song, ConvertError> {
    let bytes = std::fs::read(path)?;
    let smf = Smf::parse(&bytes)?;

    let ticks_per_beat = match smf.header.timing {
        Timing::Metrical(t) if t.as_int() > 0 => t.as_int() as f64,
        Timing::Metrical(_) => DEFAULT_TICKS_PER_BEAT,
        Timing::Timecode(..) => {
            return Err(ConvertError::parse(1, 1, "SMPTE timecode timing is not supported"));
        }
    };

    let selected: Vec<&[TrackEvent]> = match track {
        None => smf.tracks.iter().map(|t| t.as_slice()).collect(),
        Some(n) => {
            if n == 0 || n > smf.tracks.len() {
                return Err(ConvertError::InvalidTrack {
                    selected: n,
                    available: smf.tracks.len(),
                });
            }
            vec![smf.tracks[n - 1].as_slice()]
        }
    };

    let mut song = Song::default();

    // Tempo and meter can live on any track (commonly track 0, which the
    // selection may have skipped), so scan them all.
    for events in smf.tracks.iter() {
        for event in events.iter() {
            match event.kind {
                TrackEventKind::Meta(MetaMessage::Tempo(us_per_beat)) => {
                    song.tempo_bpm = 60_000_000.0 / us_per_beat.as_int() as f64;
                }
                TrackEventKind::Meta(MetaMessage::TimeSignature(num, den_pow2, _, _)) => {
                    song.time_signature = TimeSignature {
                        numerator: num,
                        denominator: 1u8 << den_pow2,
                    };
                }
                _ => {}
            }
        }
    }

    for events in selected {
        let mut track_out = Track::default();
        // FIFO of sounding notes per pitch: (start_beat, velocity).
        let mut active: BTreeMap<u8, Vec<(f64, u8)>> = BTreeMap::new();
        let mut tick: u64 = 0;

        for event in events {
            tick += event.delta.as_int() as u64;
            let beat = tick as f64 / ticks_per_beat;

            if let TrackEventKind::Midi { message, .. } = event.kind {
                match message {
                    MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                        active
                            .entry(key.as_int())
                            .or_default()
                            .push((beat, vel.as_int()));
                    }
                    MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                        let sounding = active.entry(key.as_int()).or_default();
                        if !sounding.is_empty() {
                            let (start, velocity) = sounding.remove(0);
                            track_out.events.push(NoteEvent {
                                pitch: key.as_int(),
                                start_beat: start,
                                duration_beats: beat - start,
                                velocity,
                            });
                        }
                    }
                    _ => {}
                }
            }
        }

        // Close anything still sounding at the end of the track.
        let end_beat = tick as f64 / ticks_per_beat;
        for (pitch, sounding) in active {
            for (start, velocity) in sounding {
                let duration = end_beat - start;
                track_out.events.push(NoteEvent {
                    pitch,
                    start_beat: start,
                    duration_beats: if duration > 0.0 { duration } else { HANGING_NOTE_BEATS },
                    velocity,
                });
            }
        }

        if !track_out.events.is_empty() {
            track_out.events.sort_by(|a, b| {
                a.start_beat
                    .partial_cmp(&b.start_beat)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.pitch.cmp(&b.pitch))
            });
            song.tracks.push(track_out);
        }
    }

    Ok(song)
}

/// Write a Song as an SMF Format 1 file.
pub fn write_midi(song: &Song, path: &Path) -> Result<(), ConvertError> {
    let smf = song_to_smf(song);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    std::fs::write(path, &buf)?;
    Ok(())
}

/// Build the in-memory SMF.
fn song_to_smf(song: &Song) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo and meter.
    let mut tempo_track: Vec<TrackEvent<'static>> = Vec::new();
    let tempo_microseconds = (60_000_000.0 / song.tempo_bpm).round() as u32;
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    let den_pow2 = song.time_signature.denominator.max(1).ilog2() as u8;
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TimeSignature(
            song.time_signature.numerator,
            den_pow2,
            24,
            8,
        )),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    for track_data in &song.tracks {
        let mut track: Vec<TrackEvent<'static>> = Vec::new();

        // Steel-string acoustic guitar.
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::ProgramChange {
                    program: u7::new(25),
                },
            },
        });

        // Flatten events to an absolute-tick timeline; offs sort before
        // ons at the same tick so re-struck notes do not cancel.
        let mut timeline: Vec<(u32, u8, u8, u8)> = Vec::new(); // (tick, kind, pitch, vel)
        for event in &track_data.events {
            let on = (event.start_beat * TICKS_PER_QUARTER as f64).round() as u32;
            let off = (event.end_beat() * TICKS_PER_QUARTER as f64).round() as u32;
            timeline.push((on, 1, event.pitch, event.velocity));
            timeline.push((off.max(on + 1), 0, event.pitch, 0));
        }
        timeline.sort_unstable();

        let mut last_tick: u32 = 0;
        for (tick, kind, pitch, vel) in timeline {
            let delta = tick - last_tick;
            let message = if kind == 1 {
                MidiMessage::NoteOn {
                    key: u7::new(pitch.min(127)),
                    vel: u7::new(vel.clamp(1, 127)),
                }
            } else {
                MidiMessage::NoteOff {
                    key: u7::new(pitch.min(127)),
                    vel: u7::new(0),
                }
            };
            track.push(TrackEvent {
                delta: u28::new(delta),
                kind: TrackEventKind::Midi {
                    channel: u4::new(0),
                    message,
                },
            });
            last_tick = tick;
        }

        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(track);
    }

    smf
}
