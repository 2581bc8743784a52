use std::env;

use log::info;
use midi_roll::{
    playback::{PlaybackClock, PlaybackUpdate, SilentEngine},
    sequence::event::beats_to_duration,
    session::MidiSession,
    settings::{LayoutSettings, PlaybackSettings},
};

fn main() {
    env_logger::init();

    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("Usage: roll <file.mid> [scroll steps]");
            return;
        }
    };
    let steps: u64 = env::args()
        .nth(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(100);

    let session = MidiSession::open_or_empty(&path, LayoutSettings::default());

    for (i, track) in session.tracks().iter().enumerate() {
        println!(
            "Track {} ({}): {} notes, keys {} to {}, {:.2} beats",
            i,
            track.name.as_deref().unwrap_or("unnamed"),
            track.notes.len(),
            track.range.lowest,
            track.range.highest,
            track.length_beats
        );
        for (note, rect) in track.notes.iter().zip(session.layout(i)).take(8) {
            println!(
                "    key {:3} {:8.3} -> {:8.3}   x {:10.1} y {:6.1} w {:8.1}",
                note.key, note.start, note.end, rect.x, rect.y, rect.width
            );
        }
    }

    let settings = PlaybackSettings::default();
    println!(
        "{:.2} beats, plays for {:?}",
        session.end_beat(),
        beats_to_duration(
            session.tempo_changes(),
            session.end_beat(),
            settings.default_tempo
        )
    );

    let sequencer = session.sequencer(settings.default_tempo);
    let mut clock = PlaybackClock::new(sequencer, SilentEngine::new(), settings);
    let updates = clock.subscribe();
    clock.on_scroll_tick(move |position| {
        if position % 25 == 0 {
            info!("Scrolled {} steps", position);
        }
    });

    if let Err(e) = clock.play() {
        eprintln!("{}", e);
        return;
    }

    if let Some(interval) = clock.scroll_interval() {
        println!("Scrolling one step every {:?}", interval);
    }

    while clock.scroll_position() < steps && clock.wait_tick() {
        for update in updates.try_iter() {
            if let PlaybackUpdate::TempoChanged { tempo, interval } = update {
                println!("Tempo changed to {:.1} bpm, now every {:?}", tempo, interval);
            }
        }
    }
    clock.stop();

    for update in updates.try_iter() {
        println!("{:?}", update);
    }
}
