use crate::num::MIDINum;
pub use event::Event;
pub use events::*;

mod event;
mod events;

pub trait MIDIEvent: std::fmt::Debug {
    fn key(&self) -> Option<u8>;
    fn key_mut(&mut self) -> Option<&mut u8>;

    fn channel(&self) -> Option<u8>;
    fn channel_mut(&mut self) -> Option<&mut u8>;

    /// The raw bytes of the event if it is a channel voice message, status byte first.
    fn voice_bytes(&self) -> Option<Vec<u8>>;
}

pub trait MIDIEventEnum: MIDIEvent {
    fn as_event(&self) -> &Event;
    fn as_event_mut(&mut self) -> &mut Event;
}

pub trait MIDIDelta<D: MIDINum> {
    fn delta(&self) -> D;
    fn delta_mut(&mut self) -> &mut D;

    #[inline(always)]
    fn set_delta(&mut self, delta: D) {
        *self.delta_mut() = delta;
    }
}

impl MIDIEventEnum for Event {
    fn as_event(&self) -> &Event {
        self
    }

    fn as_event_mut(&mut self) -> &mut Event {
        self
    }
}

/// A trait that describes an event that is always connected to a channel
pub trait VoiceEvent {
    fn channel(&self) -> u8;
    fn channel_mut(&mut self) -> &mut u8;
}

/// A trait that describes an event that is always connected to a key
pub trait KeyEvent: VoiceEvent {
    fn key(&self) -> u8;
    fn key_mut(&mut self) -> &mut u8;
}

/// A channel voice message that can be turned back into its wire bytes.
pub trait VoiceMessage: VoiceEvent {
    /// The high nibble of the status byte, e.g. `0x90` for note on.
    const KIND: u8;

    #[inline(always)]
    fn status(&self) -> u8 {
        Self::KIND | (self.channel() & 0x0F)
    }

    fn message_bytes(&self) -> Vec<u8>;
}
