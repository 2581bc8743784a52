use crate::{
    events::{Event, MIDIEvent, MIDIEventEnum},
    num::MIDINum,
};

use super::Delta;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelEventKind {
    NoteOn,
    NoteOff,
    Other,
}

/// A channel voice message at an absolute position in its track.
///
/// `data` holds the whole message, status byte first, so `data[1]` is the
/// key of a note message and `data[2]` its velocity. Events built by hand may
/// be shorter than a well formed message, or have no known position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub data: Vec<u8>,
    pub tick: Option<u64>,
    pub kind: ChannelEventKind,
}

impl ChannelEvent {
    pub fn new(data: Vec<u8>, tick: Option<u64>, kind: ChannelEventKind) -> Self {
        Self { data, tick, kind }
    }

    /// A note on message. A velocity of 0 is still classified as note on.
    pub fn note_on(channel: u8, key: u8, velocity: u8, tick: u64) -> Self {
        Self::new(
            vec![0x90 | (channel & 0x0F), key, velocity],
            Some(tick),
            ChannelEventKind::NoteOn,
        )
    }

    pub fn note_off(channel: u8, key: u8, velocity: u8, tick: u64) -> Self {
        Self::new(
            vec![0x80 | (channel & 0x0F), key, velocity],
            Some(tick),
            ChannelEventKind::NoteOff,
        )
    }

    /// The status byte, `None` for an empty message.
    #[inline(always)]
    pub fn status(&self) -> Option<u8> {
        self.data.first().copied()
    }

    /// The key of a note message, `None` if the message is too short to carry one.
    #[inline(always)]
    pub fn key(&self) -> Option<u8> {
        self.data.get(1).copied()
    }

    #[inline(always)]
    pub fn velocity(&self) -> Option<u8> {
        self.data.get(2).copied()
    }
}

fn classify(event: &Event) -> ChannelEventKind {
    match event {
        Event::NoteOn(_) => ChannelEventKind::NoteOn,
        Event::NoteOff(_) => ChannelEventKind::NoteOff,
        _ => ChannelEventKind::Other,
    }
}

/// Iterator returned by [`channel_events`].
pub struct ChannelEvents<D: MIDINum, I> {
    iter: I,
    time: D,
}

impl<D: MIDINum, E: MIDIEventEnum, I: Iterator<Item = Delta<D, E>>> Iterator
    for ChannelEvents<D, I>
{
    type Item = ChannelEvent;

    fn next(&mut self) -> Option<ChannelEvent> {
        for e in self.iter.by_ref() {
            self.time += e.delta;
            if let Some(data) = e.voice_bytes() {
                let tick: u64 = self.time.midi_num_into();
                return Some(ChannelEvent::new(
                    data,
                    Some(tick),
                    classify(e.as_event()),
                ));
            }
        }
        None
    }
}

/// Takes a parsed track and keeps only its channel voice messages, with the
/// delta times accumulated into absolute tick positions.
pub fn channel_events<D: MIDINum, E: MIDIEventEnum, I: Iterator<Item = Delta<D, E>>>(
    iter: I,
) -> ChannelEvents<D, I> {
    ChannelEvents {
        iter,
        time: D::zero(),
    }
}
