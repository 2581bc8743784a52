use crate::{events::*, sequence::event::Delta};

use super::{errors::MIDIParseError, readers::TrackReader};

/// Decodes the events of a single `MTrk` chunk.
///
/// The end of track meta event is yielded as the last event. Any error is
/// yielded once and ends the iteration.
pub struct TrackParser<T: TrackReader> {
    reader: T,
    pushback: Option<u8>,
    prev_command: Option<u8>,
    ended: bool,
}

impl<T: TrackReader> TrackParser<T> {
    pub fn new(reader: T) -> Self {
        Self {
            reader,
            pushback: None,
            prev_command: None,
            ended: false,
        }
    }

    fn read(&mut self) -> Result<u8, MIDIParseError> {
        if let Some(p) = self.pushback.take() {
            return Ok(p);
        }
        self.reader.read()
    }

    fn read_fast(&mut self) -> Result<u8, MIDIParseError> {
        self.reader.read()
    }

    fn read_var_length(&mut self) -> Result<u64, MIDIParseError> {
        let mut n: u64 = 0;
        // Variable length quantities are at most 4 bytes long
        for _ in 0..4 {
            let byte = self.read()?;
            n = (n << 7) | (byte & 0x7F) as u64;
            if (byte & 0x80) == 0 {
                return Ok(n);
            }
        }
        Err(self.corrupt())
    }

    fn read_data(&mut self, size: u64) -> Result<Vec<u8>, MIDIParseError> {
        let mut data = Vec::new();
        for _ in 0..size {
            data.push(self.read_fast()?);
        }
        data.shrink_to_fit();
        Ok(data)
    }

    fn corrupt(&self) -> MIDIParseError {
        MIDIParseError::CorruptEvent {
            track_number: self.reader.track_number(),
            position: self.reader.pos(),
        }
    }
}

impl<T: TrackReader> Iterator for TrackParser<T> {
    type Item = Result<Delta<u64, Event>, MIDIParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        macro_rules! check {
            ($val:expr) => {
                match $val {
                    Ok(v) => v,
                    Err(e) => {
                        self.ended = true;
                        return Some(Err(e));
                    }
                }
            };
        }

        macro_rules! assert_len {
            ($size:expr) => {
                if check!(self.read_var_length()) != $size {
                    let err = self.corrupt();
                    check!(Err(err))
                }
            };
        }

        macro_rules! ret {
            ($val:expr) => {
                Some(Ok($val))
            };
        }

        if self.ended {
            return None;
        }

        let delta = check!(self.read_var_length());
        let mut command = check!(self.read());
        if command < 0x80 {
            // Running status, the byte we just read is the first data byte
            self.pushback = Some(command);
            command = match self.prev_command {
                Some(prev) => prev,
                None => {
                    let err = self.corrupt();
                    check!(Err(err))
                }
            };
        }

        let comm = command & 0xF0;
        if comm != 0xF0 {
            self.prev_command = Some(command);
        } else if command <= 0xF7 {
            // Sysex and system common messages cancel running status
            self.prev_command = None;
        }

        let channel = command & 0x0F;
        match comm {
            0x80 => {
                let key = check!(self.read());
                let vel = check!(self.read_fast());
                ret!(Event::new_delta_note_off_event(delta, channel, key, vel))
            }
            0x90 => {
                let key = check!(self.read());
                let vel = check!(self.read_fast());
                ret!(Event::new_delta_note_on_event(delta, channel, key, vel))
            }
            0xA0 => {
                let key = check!(self.read());
                let vel = check!(self.read_fast());
                ret!(Event::new_delta_polyphonic_key_pressure_event(
                    delta, channel, key, vel
                ))
            }
            0xB0 => {
                let controller = check!(self.read());
                let value = check!(self.read_fast());
                ret!(Event::new_delta_control_change_event(
                    delta, channel, controller, value
                ))
            }
            0xC0 => {
                let program = check!(self.read());
                ret!(Event::new_delta_program_change_event(
                    delta, channel, program
                ))
            }
            0xD0 => {
                let pressure = check!(self.read());
                ret!(Event::new_delta_channel_pressure_event(
                    delta, channel, pressure
                ))
            }
            0xE0 => {
                let var1 = check!(self.read());
                let var2 = check!(self.read_fast());
                ret!(Event::new_delta_pitch_wheel_change_event(
                    delta,
                    channel,
                    ((((var2 & 0x7F) as i16) << 7) | (var1 & 0x7F) as i16) - 8192
                ))
            }
            _ => match command {
                0xF0 | 0xF7 => {
                    let size = check!(self.read_var_length());
                    let data = check!(self.read_data(size));
                    ret!(Event::new_delta_system_exclusive_event(
                        delta, command, data
                    ))
                }
                0xFF => {
                    let kind = check!(self.read());
                    match kind {
                        0x01..=0x0A | 0x7F => {
                            let size = check!(self.read_var_length());
                            let data = check!(self.read_data(size));
                            ret!(Event::new_delta_text_event(
                                delta,
                                TextEventKind::from_val(kind),
                                data
                            ))
                        }
                        0x2F => {
                            assert_len!(0);
                            self.ended = true;
                            ret!(Event::new_delta_end_of_track_event(delta))
                        }
                        0x51 => {
                            assert_len!(3);
                            let mut tempo: u32 = 0;
                            for _ in 0..3 {
                                tempo = (tempo << 8) | check!(self.read_fast()) as u32;
                            }
                            ret!(Event::new_delta_tempo_event(delta, tempo))
                        }
                        _ => {
                            let size = check!(self.read_var_length());
                            let data = check!(self.read_data(size));
                            ret!(Event::new_delta_meta_event(delta, kind, data))
                        }
                    }
                }
                0xF2 => {
                    let data = check!(self.read_data(2));
                    ret!(Event::new_delta_system_common_event(delta, command, data))
                }
                0xF1 | 0xF3 => {
                    let data = check!(self.read_data(1));
                    ret!(Event::new_delta_system_common_event(delta, command, data))
                }
                _ => ret!(Event::new_delta_system_common_event(
                    delta,
                    command,
                    Vec::new()
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        events::{Event, TextEventKind},
        io::{FullRamTrackReader, MIDIParseError, TrackParser},
        pipe,
        sequence::{event::Delta, to_vec_result},
    };

    fn parse(bytes: Vec<u8>) -> Result<Vec<Delta<u64, Event>>, MIDIParseError> {
        let parser = TrackParser::new(FullRamTrackReader::new_from_vec(bytes));
        pipe!(parser|>to_vec_result())
    }

    #[test]
    fn running_status_reuses_previous_command() {
        let events = parse(vec![
            0x00, 0x91, 0x3C, 0x64, // note on, channel 1
            0x60, 0x3C, 0x00, // running status note on, velocity 0
            0x00, 0x3E, 0x50, // running status note on
            0x81, 0x00, 0x81, 0x3E, 0x40, // note off after 128 ticks
            0x00, 0xFF, 0x2F, 0x00,
        ])
        .unwrap();

        let expected = vec![
            Event::new_delta_note_on_event(0u64, 1, 0x3C, 0x64),
            Event::new_delta_note_on_event(0x60u64, 1, 0x3C, 0x00),
            Event::new_delta_note_on_event(0u64, 1, 0x3E, 0x50),
            Event::new_delta_note_off_event(128u64, 1, 0x3E, 0x40),
            Event::new_delta_end_of_track_event(0u64),
        ];

        assert_eq!(events, expected);
    }

    #[test]
    fn parses_meta_and_sysex_events() {
        let events = parse(vec![
            0x00, 0xFF, 0x03, 0x04, b'L', b'e', b'a', b'd', // track name
            0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, // tempo 500000
            0x00, 0xF0, 0x03, 0x7E, 0x7F, 0xF7, // sysex
            0x00, 0xFF, 0x58, 0x04, 0x04, 0x02, 0x18, 0x08, // time signature
            0x00, 0xFF, 0x2F, 0x00,
        ])
        .unwrap();

        assert_eq!(events.len(), 5);
        assert_eq!(
            events[0].event,
            Event::new_text_event(TextEventKind::TrackName, b"Lead".to_vec())
        );
        assert_eq!(events[0].track_name().as_deref(), Some("Lead"));
        assert_eq!(events[1].inner_tempo(), Some(500_000));
        assert_eq!(
            events[2].event,
            Event::new_system_exclusive_event(0xF0, vec![0x7E, 0x7F, 0xF7])
        );
        assert_eq!(
            events[3].event,
            Event::new_meta_event(0x58, vec![0x04, 0x02, 0x18, 0x08])
        );
    }

    #[test]
    fn end_of_track_keeps_its_delta() {
        let mut parser = TrackParser::new(FullRamTrackReader::new_from_vec(vec![
            0x00, 0x90, 0x3C, 0x64, //
            0x8B, 0x20, 0xFF, 0x2F, 0x00, // end of track 1440 ticks later
            0x00, 0x90, 0x3C, 0x00, // never read
        ]));

        assert!(parser.next().unwrap().is_ok());
        assert_eq!(
            parser.next().unwrap().unwrap(),
            Event::new_delta_end_of_track_event(1440u64)
        );
        assert!(parser.next().is_none());
    }

    #[test]
    fn missing_end_of_track_is_an_error() {
        let result = parse(vec![0x00, 0x90, 0x3C, 0x64, 0x10]);
        assert!(matches!(
            result,
            Err(MIDIParseError::UnexpectedTrackEnd { .. })
        ));
    }

    #[test]
    fn running_status_without_command_is_corrupt() {
        let result = parse(vec![0x00, 0x3C, 0x64]);
        assert_eq!(
            result.unwrap_err(),
            MIDIParseError::CorruptEvent {
                track_number: None,
                position: 2,
            }
        );
    }

    #[test]
    fn iteration_stops_after_error() {
        let mut parser = TrackParser::new(FullRamTrackReader::new_from_vec(vec![0x00, 0x90]));
        assert!(parser.next().unwrap().is_err());
        assert!(parser.next().is_none());
    }
}
