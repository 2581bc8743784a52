#![no_main]

use libfuzzer_sys::fuzz_target;

use midi_roll::sequence::{
    conversion::reconstruct_notes,
    event::{ChannelEvent, ChannelEventKind},
    note::pitch_range,
};

// Every four bytes are a kind selector followed by up to three message bytes
fuzz_target!(|data: &[u8]| {
    let events: Vec<ChannelEvent> = data
        .chunks(4)
        .enumerate()
        .map(|(i, chunk)| {
            let kind = match chunk[0] % 3 {
                0 => ChannelEventKind::NoteOn,
                1 => ChannelEventKind::NoteOff,
                _ => ChannelEventKind::Other,
            };
            let tick = if chunk[0] & 0x80 == 0 { Some(i as u64) } else { None };
            ChannelEvent::new(chunk[1..].to_vec(), tick, kind)
        })
        .collect();

    let notes = reconstruct_notes(&events, Some(data.len() as u16));
    assert_eq!(notes, reconstruct_notes(&events, Some(data.len() as u16)));
    pitch_range(&notes).span();
});
