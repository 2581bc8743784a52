use super::events::*;
use super::MIDIEvent;

use derive::EventImpl;

#[derive(EventImpl, Debug, PartialEq)]
pub enum Event {
    #[key]
    #[channel]
    #[voice]
    NoteOn(NoteOnEvent),
    #[key]
    #[channel]
    #[voice]
    NoteOff(NoteOffEvent),
    #[key]
    #[channel]
    #[voice]
    PolyphonicKeyPressure(Box<PolyphonicKeyPressureEvent>),
    #[channel]
    #[voice]
    ControlChange(Box<ControlChangeEvent>),
    #[channel]
    #[voice]
    ProgramChange(Box<ProgramChangeEvent>),
    #[channel]
    #[voice]
    ChannelPressure(Box<ChannelPressureEvent>),
    #[channel]
    #[voice]
    PitchWheelChange(Box<PitchWheelChangeEvent>),
    SystemExclusive(Box<SystemExclusiveEvent>),
    SystemCommon(Box<SystemCommonEvent>),
    Text(Box<TextEvent>),
    Tempo(Box<TempoEvent>),
    Meta(Box<MetaEvent>),
    EndOfTrack(EndOfTrackEvent),
}

impl Event {
    /// The tempo carried by the event in microseconds per quarter note, if it is a tempo event
    pub fn inner_tempo(&self) -> Option<u32> {
        match self {
            Event::Tempo(e) => Some(e.tempo),
            _ => None,
        }
    }

    /// The track name, if this is a track name text event
    pub fn track_name(&self) -> Option<String> {
        match self {
            Event::Text(e) if e.kind == TextEventKind::TrackName => Some(e.text()),
            _ => None,
        }
    }
}
