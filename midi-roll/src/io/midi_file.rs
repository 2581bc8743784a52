use std::{fs::File, io::Read, path::Path};

use crate::{events::Event, sequence::event::Delta};

use super::{
    errors::{MIDILoadError, MIDIParseError},
    readers::{MIDIReader, RAMReader},
    track_parser::TrackParser,
};

#[derive(Debug, Clone, Copy)]
struct TrackPos {
    pos: u64,
    len: u32,
}

/// A standard MIDI file with its track chunks located but not yet parsed.
#[derive(Debug)]
pub struct MIDIFile<T: MIDIReader> {
    reader: T,
    track_positions: Vec<TrackPos>,

    format: u16,
    division: u16,
}

fn bytes_to_val(bytes: &[u8]) -> u32 {
    let mut num: u32 = 0;
    for b in bytes.iter().take(4) {
        num = (num << 8) + *b as u32;
    }

    num
}

impl<T: MIDIReader> MIDIFile<T> {
    fn new_from_reader(
        reader: T,
        mut read_progress: Option<&mut dyn FnMut(u32)>,
    ) -> Result<Self, MIDILoadError> {
        fn read_header<T: MIDIReader>(
            reader: &T,
            pos: u64,
            text: &'static str,
        ) -> Result<u32, MIDILoadError> {
            let bytes = reader.read_bytes(pos, 8)?;

            let (header, len) = bytes.split_at(4);

            if header != text.as_bytes() {
                return Err(MIDILoadError::CorruptChunks {
                    expected: text,
                    position: pos,
                });
            }

            Ok(bytes_to_val(len))
        }

        let mut pos = 0u64;

        let header_len = read_header(&reader, pos, "MThd")?;
        pos += 8;
        if header_len < 6 {
            return Err(MIDILoadError::CorruptChunks {
                expected: "MThd",
                position: 0,
            });
        }

        let (format, division) = {
            let header_data = reader.read_bytes(pos, 6)?;
            let (format_bytes, rest) = header_data.split_at(2);
            let (_, division_bytes) = rest.split_at(2);
            (
                bytes_to_val(format_bytes) as u16,
                bytes_to_val(division_bytes) as u16,
            )
        };
        // Longer headers are allowed, the extra bytes are skipped
        pos += header_len as u64;

        let mut track_count = 0;
        let mut track_positions = Vec::<TrackPos>::new();
        while pos < reader.len() {
            let len = read_header(&reader, pos, "MTrk")?;
            pos += 8;
            track_count += 1;
            track_positions.push(TrackPos { len, pos });
            pos += len as u64;

            if let Some(progress) = read_progress.as_mut() {
                progress(track_count);
            }
        }

        track_positions.shrink_to_fit();
        Ok(MIDIFile {
            reader,
            division,
            format,
            track_positions,
        })
    }

    pub fn open_track_reader(&self, track: u32) -> Result<T::TrackReader, MIDILoadError> {
        let pos = self.track_positions.get(track as usize).ok_or(
            MIDILoadError::TrackOutOfRange {
                track,
                track_count: self.track_count(),
            },
        )?;
        Ok(self
            .reader
            .open_reader(Some(track), pos.pos, pos.len as u64))
    }

    pub fn iter_track(
        &self,
        track: u32,
    ) -> Result<impl Iterator<Item = Result<Delta<u64, Event>, MIDIParseError>>, MIDILoadError>
    {
        let reader = self.open_track_reader(track)?;
        Ok(TrackParser::new(reader))
    }

    pub fn iter_all_tracks(
        &self,
    ) -> impl Iterator<Item = impl Iterator<Item = Result<Delta<u64, Event>, MIDIParseError>>> + '_
    {
        self.track_positions
            .iter()
            .enumerate()
            .map(move |(i, pos)| {
                TrackParser::new(
                    self.reader
                        .open_reader(Some(i as u32), pos.pos, pos.len as u64),
                )
            })
    }

    /// The raw division word of the header.
    pub fn division(&self) -> u16 {
        self.division
    }

    /// Ticks per quarter note. `None` for SMPTE timed files (division with
    /// the top bit set) and for a zero division.
    pub fn ppq(&self) -> Option<u16> {
        if self.division & 0x8000 != 0 || self.division == 0 {
            None
        } else {
            Some(self.division)
        }
    }

    pub fn format(&self) -> u16 {
        self.format
    }

    pub fn track_count(&self) -> usize {
        self.track_positions.len()
    }
}

impl MIDIFile<RAMReader> {
    /// Reads the whole file into memory. The file handle is closed before
    /// this returns.
    pub fn open(
        filename: impl AsRef<Path>,
        read_progress: Option<&mut dyn FnMut(u32)>,
    ) -> Result<Self, MIDILoadError> {
        let reader = {
            let file = File::open(filename)?;
            RAMReader::new(file)?
        };

        MIDIFile::new_from_reader(reader, read_progress)
    }

    pub fn open_from_stream<S: Read>(
        stream: S,
        read_progress: Option<&mut dyn FnMut(u32)>,
    ) -> Result<Self, MIDILoadError> {
        let reader = RAMReader::new(stream)?;

        MIDIFile::new_from_reader(reader, read_progress)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, MIDILoadError> {
        let reader = RAMReader::from_bytes(bytes)?;

        MIDIFile::new_from_reader(reader, None)
    }
}
