use std::ops::{Deref, DerefMut};

use crate::{
    events::{Event, MIDIDelta, MIDIEvent, MIDIEventEnum},
    num::MIDINum,
};

/// An event preceded by the time since the previous event in its track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta<D: MIDINum, E> {
    pub delta: D,
    pub event: E,
}

impl<D: MIDINum, E> MIDIDelta<D> for Delta<D, E> {
    #[inline(always)]
    fn delta(&self) -> D {
        self.delta
    }

    #[inline(always)]
    fn delta_mut(&mut self) -> &mut D {
        &mut self.delta
    }
}

impl<D: MIDINum, E> Delta<D, E> {
    #[inline(always)]
    pub fn new(delta: D, event: E) -> Self {
        Self { delta, event }
    }
}

impl<D: MIDINum, E> Deref for Delta<D, E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.event
    }
}

impl<D: MIDINum, E> DerefMut for Delta<D, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.event
    }
}

impl<D: MIDINum, E: MIDIEventEnum> MIDIEvent for Delta<D, E> {
    fn key(&self) -> Option<u8> {
        self.event.key()
    }

    fn key_mut(&mut self) -> Option<&mut u8> {
        self.event.key_mut()
    }

    fn channel(&self) -> Option<u8> {
        self.event.channel()
    }

    fn channel_mut(&mut self) -> Option<&mut u8> {
        self.event.channel_mut()
    }

    fn voice_bytes(&self) -> Option<Vec<u8>> {
        self.event.voice_bytes()
    }
}

impl<D: MIDINum, E: MIDIEventEnum> MIDIEventEnum for Delta<D, E> {
    #[inline(always)]
    fn as_event(&self) -> &Event {
        self.event.as_event()
    }

    #[inline(always)]
    fn as_event_mut(&mut self) -> &mut Event {
        self.event.as_event_mut()
    }
}

/// Sums the deltas of a track, giving its length in ticks.
pub fn track_length<'a, D: MIDINum + 'a, E: 'a>(
    events: impl IntoIterator<Item = &'a Delta<D, E>>,
) -> D {
    let mut length = D::zero();
    for event in events {
        length += event.delta;
    }
    length
}
