use std::borrow::Borrow;

use log::debug;

use crate::{
    notes::Note,
    sequence::event::{beat_divisor, ChannelEvent, ChannelEventKind},
};

/// Position given to events that carry no tick.
pub const MISSING_POSITION_BEATS: f64 = 1.0;

// ==============
// Helper structs
// ==============

/// Start positions of the notes that are currently held, indexed by key.
struct OpenNoteTable {
    starts: [Option<f64>; 256],
    open: usize,
}

impl OpenNoteTable {
    fn new() -> Self {
        Self {
            starts: [None; 256],
            open: 0,
        }
    }

    /// Opens a note, replacing the start of a note already held on the key.
    #[inline(always)]
    fn open(&mut self, key: u8, start: f64) {
        if self.starts[key as usize].replace(start).is_none() {
            self.open += 1;
        }
    }

    #[inline(always)]
    fn close(&mut self, key: u8, end: f64) -> Option<Note> {
        let start = self.starts[key as usize].take()?;
        self.open -= 1;
        Some(Note::new(key, start, end))
    }
}

/// Iterator returned by [`events_to_notes`].
pub struct EventsToNotes<I> {
    iter: I,
    divisor: f64,
    note_on_status: Option<u8>,
    note_off_status: Option<u8>,
    table: OpenNoteTable,
    finished: bool,
}

impl<I> EventsToNotes<I> {
    fn position(&self, tick: Option<u64>) -> f64 {
        match tick {
            Some(tick) => tick as f64 / self.divisor,
            None => MISSING_POSITION_BEATS,
        }
    }

    fn process(&mut self, event: &ChannelEvent) -> Option<Note> {
        let status = event.status()?;

        // The first event of each kind decides which status byte means what
        // for the rest of the pass
        match event.kind {
            ChannelEventKind::NoteOn if self.note_on_status.is_none() => {
                self.note_on_status = Some(status);
            }
            ChannelEventKind::NoteOff if self.note_off_status.is_none() => {
                self.note_off_status = Some(status);
            }
            _ => {}
        }

        let key = event.key()?;
        let position = self.position(event.tick);

        if Some(status) == self.note_on_status {
            match event.velocity() {
                Some(0) => self.table.close(key, position),
                _ => {
                    self.table.open(key, position);
                    None
                }
            }
        } else if Some(status) == self.note_off_status {
            self.table.close(key, position)
        } else {
            None
        }
    }
}

impl<T: Borrow<ChannelEvent>, I: Iterator<Item = T>> Iterator for EventsToNotes<I> {
    type Item = Note;

    fn next(&mut self) -> Option<Note> {
        if self.finished {
            return None;
        }

        while let Some(event) = self.iter.next() {
            if let Some(note) = self.process(event.borrow()) {
                return Some(note);
            }
        }

        self.finished = true;
        if self.table.open > 0 {
            debug!(
                "Dropping {} notes that were never released",
                self.table.open
            );
        }
        None
    }
}

/// Takes a stream of channel events and pairs note ons with the events that
/// release them, yielding notes in the order they end.
///
/// Positions are converted from ticks to beats with `ticks_per_beat`, a
/// missing or zero resolution leaves them as they are. Notes that are still
/// held when the stream ends are dropped.
pub fn events_to_notes<T: Borrow<ChannelEvent>, I: Iterator<Item = T>>(
    iter: I,
    ticks_per_beat: Option<u16>,
) -> EventsToNotes<I> {
    EventsToNotes {
        iter,
        divisor: beat_divisor(ticks_per_beat),
        note_on_status: None,
        note_off_status: None,
        table: OpenNoteTable::new(),
        finished: false,
    }
}

/// Reconstructs all notes of a track at once.
pub fn reconstruct_notes(events: &[ChannelEvent], ticks_per_beat: Option<u16>) -> Vec<Note> {
    events_to_notes(events.iter(), ticks_per_beat).collect()
}

#[cfg(test)]
mod tests {
    use crate::{
        events::Event,
        notes::Note,
        pipe,
        sequence::{
            conversion::{events_to_notes, reconstruct_notes},
            event::{channel_events, ChannelEvent, ChannelEventKind},
            to_vec,
        },
    };

    #[test]
    fn pairs_note_on_with_note_off() {
        let events = vec![
            ChannelEvent::note_on(0, 60, 100, 0),
            ChannelEvent::note_off(0, 60, 64, 480),
        ];

        assert_eq!(
            reconstruct_notes(&events, Some(480)),
            vec![Note::new(60, 0.0, 1.0)]
        );
    }

    #[test]
    fn zero_velocity_note_on_releases_like_note_off() {
        let with_note_off = vec![
            ChannelEvent::note_on(0, 64, 90, 96),
            ChannelEvent::note_off(0, 64, 0, 192),
        ];
        let with_zero_velocity = vec![
            ChannelEvent::note_on(0, 64, 90, 96),
            ChannelEvent::note_on(0, 64, 0, 192),
        ];

        let expected = vec![Note::new(64, 1.0, 2.0)];
        assert_eq!(reconstruct_notes(&with_note_off, Some(96)), expected);
        assert_eq!(reconstruct_notes(&with_zero_velocity, Some(96)), expected);
    }

    #[test]
    fn unreleased_notes_are_dropped() {
        let events = vec![
            ChannelEvent::note_on(0, 60, 100, 0),
            ChannelEvent::note_on(0, 62, 100, 10),
            ChannelEvent::note_off(0, 62, 0, 20),
        ];

        assert_eq!(
            reconstruct_notes(&events, None),
            vec![Note::new(62, 10.0, 20.0)]
        );
    }

    #[test]
    fn reopening_a_held_key_restarts_the_note() {
        let events = vec![
            ChannelEvent::note_on(0, 60, 100, 0),
            ChannelEvent::note_on(0, 60, 100, 240),
            ChannelEvent::note_off(0, 60, 0, 480),
            ChannelEvent::note_off(0, 60, 0, 960),
        ];

        assert_eq!(
            reconstruct_notes(&events, Some(480)),
            vec![Note::new(60, 0.5, 1.0)]
        );
    }

    #[test]
    fn notes_come_out_in_release_order() {
        let events = vec![
            ChannelEvent::note_on(0, 60, 100, 0),
            ChannelEvent::note_on(0, 64, 100, 1),
            ChannelEvent::note_off(0, 64, 0, 2),
            ChannelEvent::note_off(0, 60, 0, 3),
        ];

        let keys: Vec<u8> = reconstruct_notes(&events, None)
            .iter()
            .map(|n| n.key)
            .collect();
        assert_eq!(keys, vec![64, 60]);
    }

    #[test]
    fn reconstruction_is_repeatable() {
        let events = vec![
            ChannelEvent::note_on(0, 60, 100, 0),
            ChannelEvent::note_off(0, 60, 0, 5),
            ChannelEvent::note_on(0, 61, 100, 5),
            ChannelEvent::note_on(0, 61, 0, 9),
        ];

        assert_eq!(
            reconstruct_notes(&events, Some(2)),
            reconstruct_notes(&events, Some(2))
        );
    }

    #[test]
    fn status_bytes_come_from_the_first_events() {
        // Once channel 0 defines note on, note ons on other channels are
        // neither note on nor note off for this pass
        let events = vec![
            ChannelEvent::note_on(0, 60, 100, 0),
            ChannelEvent::note_on(1, 62, 100, 1),
            ChannelEvent::note_off(0, 60, 0, 2),
            ChannelEvent::note_off(1, 62, 0, 3),
        ];

        assert_eq!(
            reconstruct_notes(&events, None),
            vec![Note::new(60, 0.0, 2.0)]
        );
    }

    #[test]
    fn malformed_events_are_tolerated() {
        let events = vec![
            ChannelEvent::new(vec![0x90], Some(0), ChannelEventKind::NoteOn),
            ChannelEvent::new(vec![0x90, 60], None, ChannelEventKind::NoteOn),
            ChannelEvent::new(vec![0xB0, 7, 100], Some(1), ChannelEventKind::Other),
            ChannelEvent::new(vec![], Some(2), ChannelEventKind::NoteOff),
            ChannelEvent::note_on(0, 60, 0, 3),
        ];

        // A note on without velocity opens a note, a missing tick is beat 1
        assert_eq!(
            reconstruct_notes(&events, Some(0)),
            vec![Note::new(60, 1.0, 3.0)]
        );
    }

    #[test]
    fn empty_events_do_not_decide_status_bytes() {
        let events = vec![
            ChannelEvent::new(vec![], Some(0), ChannelEventKind::NoteOff),
            ChannelEvent::new(vec![], Some(0), ChannelEventKind::NoteOn),
            ChannelEvent::note_on(0, 60, 100, 0),
            ChannelEvent::note_off(0, 60, 0, 2),
        ];

        assert_eq!(
            reconstruct_notes(&events, None),
            vec![Note::new(60, 0.0, 2.0)]
        );
    }

    #[test]
    fn converts_parsed_events() {
        let events = vec![
            Event::new_delta_note_on_event(0u64, 0, 60, 100),
            Event::new_delta_tempo_event(0u64, 500_000),
            Event::new_delta_note_on_event(480u64, 0, 62, 100),
            Event::new_delta_note_off_event(480u64, 0, 60, 64),
            Event::new_delta_note_on_event(0u64, 0, 62, 0),
        ];

        let notes = pipe! {
            events.into_iter()
            |>channel_events()
            |>events_to_notes(Some(480))
            |>to_vec()
        };

        assert_eq!(
            notes,
            vec![Note::new(60, 0.0, 2.0), Note::new(62, 1.0, 2.0)]
        );
    }
}
