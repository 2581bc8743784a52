use crate::sequence::event::Delta;

use super::event::Event;
use super::{KeyEvent, MIDIEvent, MIDINum, VoiceEvent, VoiceMessage};
use derive::{MIDIEvent, NewEvent};

#[derive(Debug, Clone, PartialEq, Copy)]
pub enum TextEventKind {
    TextEvent = 1,
    CopyrightNotice = 2,
    TrackName = 3,
    InstrumentName = 4,
    Lyric = 5,
    Marker = 6,
    CuePoint = 7,
    ProgramName = 8,
    DeviceName = 9,
    Undefined = 10,
    MetaEvent = 0x7F,
}

impl TextEventKind {
    /// Maps a meta event type byte to its text kind. Anything that isn't a
    /// known text meta event is reported as `Undefined`.
    pub fn from_val(val: u8) -> TextEventKind {
        match val {
            1 => TextEventKind::TextEvent,
            2 => TextEventKind::CopyrightNotice,
            3 => TextEventKind::TrackName,
            4 => TextEventKind::InstrumentName,
            5 => TextEventKind::Lyric,
            6 => TextEventKind::Marker,
            7 => TextEventKind::CuePoint,
            8 => TextEventKind::ProgramName,
            9 => TextEventKind::DeviceName,
            0x7F => TextEventKind::MetaEvent,
            _ => TextEventKind::Undefined,
        }
    }
}

/// A note on message. A velocity of 0 is kept as-is rather than being
/// rewritten into a note off, so consumers can tell the two apart.
#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
#[voice]
pub struct NoteOnEvent {
    #[channel]
    pub channel: u8,
    #[key]
    pub key: u8,
    pub velocity: u8,
}

impl VoiceMessage for NoteOnEvent {
    const KIND: u8 = 0x90;

    fn message_bytes(&self) -> Vec<u8> {
        vec![self.status(), self.key, self.velocity]
    }
}

#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
#[voice]
pub struct NoteOffEvent {
    #[channel]
    pub channel: u8,
    #[key]
    pub key: u8,
    pub velocity: u8,
}

impl VoiceMessage for NoteOffEvent {
    const KIND: u8 = 0x80;

    fn message_bytes(&self) -> Vec<u8> {
        vec![self.status(), self.key, self.velocity]
    }
}

#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
#[voice]
pub struct PolyphonicKeyPressureEvent {
    #[channel]
    pub channel: u8,
    #[key]
    pub key: u8,
    pub velocity: u8,
}

impl VoiceMessage for PolyphonicKeyPressureEvent {
    const KIND: u8 = 0xA0;

    fn message_bytes(&self) -> Vec<u8> {
        vec![self.status(), self.key, self.velocity]
    }
}

#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
#[voice]
pub struct ControlChangeEvent {
    #[channel]
    pub channel: u8,
    pub controller: u8,
    pub value: u8,
}

impl VoiceMessage for ControlChangeEvent {
    const KIND: u8 = 0xB0;

    fn message_bytes(&self) -> Vec<u8> {
        vec![self.status(), self.controller, self.value]
    }
}

#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
#[voice]
pub struct ProgramChangeEvent {
    #[channel]
    pub channel: u8,
    pub program: u8,
}

impl VoiceMessage for ProgramChangeEvent {
    const KIND: u8 = 0xC0;

    fn message_bytes(&self) -> Vec<u8> {
        vec![self.status(), self.program]
    }
}

#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
#[voice]
pub struct ChannelPressureEvent {
    #[channel]
    pub channel: u8,
    pub pressure: u8,
}

impl VoiceMessage for ChannelPressureEvent {
    const KIND: u8 = 0xD0;

    fn message_bytes(&self) -> Vec<u8> {
        vec![self.status(), self.pressure]
    }
}

#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
#[voice]
pub struct PitchWheelChangeEvent {
    #[channel]
    pub channel: u8,
    pub pitch: i16,
}

impl VoiceMessage for PitchWheelChangeEvent {
    const KIND: u8 = 0xE0;

    fn message_bytes(&self) -> Vec<u8> {
        let value = self.pitch + 8192;
        vec![
            self.status(),
            (value & 0x7F) as u8,
            ((value >> 7) & 0x7F) as u8,
        ]
    }
}

/// A sysex packet (`F0`) or escape sequence (`F7`), without the length prefix.
#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
pub struct SystemExclusiveEvent {
    pub status: u8,
    pub data: Vec<u8>,
}

/// System common and real-time messages (`F1`..`FE`, except sysex and meta).
#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
pub struct SystemCommonEvent {
    pub status: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
pub struct TextEvent {
    pub kind: TextEventKind,
    pub bytes: Vec<u8>,
}

impl TextEvent {
    /// The text decoded lossily, MIDI files don't declare an encoding.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Set tempo meta event, in microseconds per quarter note.
#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
pub struct TempoEvent {
    pub tempo: u32,
}

impl TempoEvent {
    /// The tempo in beats per minute. A zero tempo has no meaningful bpm.
    pub fn bpm(&self) -> Option<f64> {
        if self.tempo == 0 {
            None
        } else {
            Some(60_000_000.0 / self.tempo as f64)
        }
    }
}

/// The end of track meta event. Its delta holds any rest left at the end
/// of the track.
#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
pub struct EndOfTrackEvent {}

/// Any other meta event, kept as its type byte and payload.
#[derive(Debug, MIDIEvent, Clone, NewEvent, PartialEq)]
pub struct MetaEvent {
    pub kind: u8,
    pub bytes: Vec<u8>,
}
