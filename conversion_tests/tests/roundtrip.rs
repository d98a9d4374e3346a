// Round-trip tests across the format boundary.
//
// Render to text, parse back, and compare against the original events.
// ASCII tab reconstructs rhythm from column spacing, so beat positions
// are compared under the quantisation grid rather than exactly.

use conversion_tests::{line, note, run_mapper};
use fretweave_convert::midi::{read_midi, write_midi};
use fretweave_convert::song::{Song, Track};
use fretweave_convert::tab_parse::parse_tab;
use fretweave_convert::tab_render::render_tab;
use fretweave_convert::vex::{generate_vex, parse_vex};
use fretweave_core::config::MapperConfig;
use fretweave_core::fretboard::Fretboard;
use fretweave_core::tuning::Tuning;

fn song_of(events: Vec<fretweave_core::event::NoteEvent>) -> Song {
    Song {
        tracks: vec![Track { events }],
        ..Default::default()
    }
}

/// Render a song to tab text with the default pipeline.
fn to_tab(song: &Song, config: &MapperConfig, width: usize) -> String {
    let board = Fretboard::from_config(config).unwrap();
    let run = run_mapper(&song.merged_events(), config);
    render_tab(song, &run.mapped, &run.labels, &board, config, width)
}

/// E4, G4, B4 on the beat grid survive a tab round trip: pitches exactly,
/// beats within an eighth.
#[test]
fn tab_roundtrip_restores_pitches_and_beats() {
    let config = MapperConfig::default();
    let events = vec![
        note(64, 0.0, 0.5),
        note(67, 0.5, 0.5),
        note(71, 1.0, 0.5),
    ];
    let tab = to_tab(&song_of(events.clone()), &config, 40);

    let parsed = parse_tab(&tab, &config, false).unwrap();
    let restored = &parsed.song.tracks[0].events;
    assert_eq!(restored.len(), events.len());
    for (original, back) in events.iter().zip(restored) {
        assert_eq!(original.pitch, back.pitch);
        assert!(
            (original.start_beat - back.start_beat).abs() <= 0.125,
            "beat {} came back as {}",
            original.start_beat,
            back.start_beat
        );
    }
}

/// A longer in-range melody: the pitch sequence survives exactly and the
/// beats survive up to the grid.
#[test]
fn tab_roundtrip_longer_melody() {
    let config = MapperConfig::default();
    let events = line(&[52, 55, 57, 59, 60, 62, 64, 60, 59, 55], 0.5, 0.5);
    let tab = to_tab(&song_of(events.clone()), &config, 40);

    let parsed = parse_tab(&tab, &config, false).unwrap();
    let restored = &parsed.song.tracks[0].events;
    let original_pitches: Vec<u8> = events.iter().map(|e| e.pitch).collect();
    let restored_pitches: Vec<u8> = restored.iter().map(|e| e.pitch).collect();
    assert_eq!(original_pitches, restored_pitches);
    for (original, back) in events.iter().zip(restored) {
        assert!((original.start_beat - back.start_beat).abs() <= config.quantization_resolution);
    }
}

/// Rendering is byte-for-byte deterministic.
#[test]
fn tab_rendering_is_deterministic() {
    let config = MapperConfig::default();
    let events = line(&[45, 52, 57, 60, 64, 59, 55, 50], 0.25, 0.25);
    let song = song_of(events);
    assert_eq!(to_tab(&song, &config, 40), to_tab(&song, &config, 40));
}

/// The rendered header carries tempo and meter back through the parser.
#[test]
fn tab_roundtrip_carries_metadata() {
    let config = MapperConfig::default();
    let mut song = song_of(vec![note(60, 0.0, 0.5)]);
    song.tempo_bpm = 96.0;
    song.title = "Morning".to_string();
    let tab = to_tab(&song, &config, 40);

    let parsed = parse_tab(&tab, &config, false).unwrap();
    assert_eq!(parsed.song.tempo_bpm, 96.0);
    assert_eq!(parsed.song.title, "Morning");
    assert_eq!(parsed.song.time_signature.to_string(), "4/4");
}

/// A capo'd render stays capo-relative, and parsing with the same capo
/// restores the sounding pitches.
#[test]
fn tab_roundtrip_with_capo() {
    let config = MapperConfig {
        capo: 2,
        ..Default::default()
    };
    // F#2 is the capo'd open low string.
    let events = vec![note(42, 0.0, 0.5), note(49, 0.5, 0.5)];
    let tab = to_tab(&song_of(events.clone()), &config, 40);

    let parsed = parse_tab(&tab, &config, false).unwrap();
    let restored: Vec<u8> = parsed.song.tracks[0].events.iter().map(|e| e.pitch).collect();
    assert_eq!(restored, vec![42, 49]);
}

/// VexTab carries positions explicitly, so pitches round-trip exactly.
#[test]
fn vex_roundtrip() {
    let config = MapperConfig::default();
    let events = line(&[60, 62, 64], 0.5, 0.5);
    let song = song_of(events.clone());
    let run = run_mapper(&song.merged_events(), &config);

    let vex = generate_vex(&song, &run.mapped);
    let restored = parse_vex(&vex, &Tuning::preset("STANDARD").unwrap()).unwrap();
    let pitches: Vec<u8> = restored.tracks[0].events.iter().map(|e| e.pitch).collect();
    assert_eq!(pitches, vec![60, 62, 64]);
}

/// MIDI events survive a write/read cycle on disk.
#[test]
fn midi_roundtrip_on_disk() {
    let path = std::env::temp_dir().join(format!(
        "fretweave_midi_roundtrip_{}.mid",
        std::process::id()
    ));

    let events = vec![
        note(60, 0.0, 0.5),
        note(64, 0.5, 0.5),
        note(67, 1.0, 1.0),
    ];
    let mut song = song_of(events.clone());
    song.tempo_bpm = 90.0;
    write_midi(&song, &path).unwrap();

    let restored = read_midi(&path, None).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(restored.tempo_bpm.round(), 90.0);
    assert_eq!(restored.tracks.len(), 1);
    let back = &restored.tracks[0].events;
    assert_eq!(back.len(), events.len());
    for (original, back) in events.iter().zip(back) {
        assert_eq!(original.pitch, back.pitch);
        assert!((original.start_beat - back.start_beat).abs() < 1e-6);
        assert!((original.duration_beats - back.duration_beats).abs() < 0.01);
    }
}

/// Track selection picks one track and rejects out-of-range numbers.
#[test]
fn midi_track_selection() {
    let path = std::env::temp_dir().join(format!(
        "fretweave_midi_tracks_{}.mid",
        std::process::id()
    ));

    let song = Song {
        tracks: vec![
            Track {
                events: vec![note(60, 0.0, 0.5)],
            },
            Track {
                events: vec![note(72, 0.0, 0.5)],
            },
        ],
        ..Default::default()
    };
    write_midi(&song, &path).unwrap();

    // File tracks: tempo track + two note tracks. Track 3 is the second
    // note track.
    let selected = read_midi(&path, Some(3)).unwrap();
    assert_eq!(selected.tracks.len(), 1);
    assert_eq!(selected.tracks[0].events[0].pitch, 72);

    assert!(read_midi(&path, Some(9)).is_err());
    std::fs::remove_file(&path).ok();
}
