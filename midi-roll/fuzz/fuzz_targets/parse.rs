#![no_main]

use libfuzzer_sys::fuzz_target;

use midi_roll::{
    io::MIDIFile,
    pipe,
    sequence::{conversion::events_to_notes, event::channel_events, until_error},
};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let cursor = Cursor::new(data);
    if let Ok(file) = MIDIFile::open_from_stream(cursor, None) {
        let ppq = file.ppq();
        for track in file.iter_all_tracks() {
            let notes = pipe!(track|>until_error(|_| {})|>channel_events()|>events_to_notes(ppq));
            for note in notes {
                assert!(note.end >= note.start);
            }
        }
    }
});
