use std::{fmt::Debug, io::Read, sync::Arc};

use super::errors::{MIDILoadError, MIDIParseError};

/// The maximum length allowed for a memory loaded MIDI file.
const MAX_FILE_LENGTH: u64 = 2147483648;

/// A whole MIDI file held in memory.
///
/// The source is read to the end and dropped on construction, so no file
/// handle outlives the load.
#[derive(Debug, Clone)]
pub struct RAMReader {
    bytes: Arc<Vec<u8>>,
}

impl RAMReader {
    pub fn new<T: Read>(mut reader: T) -> Result<RAMReader, MIDILoadError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        RAMReader::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<RAMReader, MIDILoadError> {
        let length = bytes.len() as u64;
        if length > MAX_FILE_LENGTH {
            return Err(MIDILoadError::FileTooBig { length });
        }

        Ok(RAMReader {
            bytes: Arc::new(bytes),
        })
    }
}

pub trait MIDIReader: Debug {
    type TrackReader: TrackReader;

    fn read_bytes(&self, pos: u64, count: usize) -> Result<&[u8], MIDILoadError>;

    fn len(&self) -> u64;

    fn open_reader(&self, track_number: Option<u32>, start: u64, len: u64) -> Self::TrackReader;
}

impl MIDIReader for RAMReader {
    type TrackReader = FullRamTrackReader;

    fn read_bytes(&self, pos: u64, count: usize) -> Result<&[u8], MIDILoadError> {
        let end = pos + count as u64;
        if end > self.len() {
            return Err(MIDILoadError::UnexpectedFileEnd { position: pos });
        }

        Ok(&self.bytes[pos as usize..end as usize])
    }

    fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn open_reader(&self, track_number: Option<u32>, start: u64, len: u64) -> FullRamTrackReader {
        // A chunk header may claim more bytes than the file holds, the parser
        // reports that as an unexpected track end instead of reading past it.
        let start = (start as usize).min(self.bytes.len());
        let end = (start + len as usize).min(self.bytes.len());
        FullRamTrackReader {
            bytes: self.bytes.clone(),
            track_number,
            start,
            pos: start,
            end,
            expected_end: start as u64 + len,
        }
    }
}

pub trait TrackReader {
    fn read(&mut self) -> Result<u8, MIDIParseError>;

    /// Absolute position of the next byte in the file
    fn pos(&self) -> u64;

    fn track_number(&self) -> Option<u32>;
}

#[derive(Debug)]
pub struct FullRamTrackReader {
    bytes: Arc<Vec<u8>>,
    track_number: Option<u32>,
    start: usize,
    pos: usize,
    end: usize,
    expected_end: u64,
}

impl FullRamTrackReader {
    pub fn new(bytes: Arc<Vec<u8>>, pos: usize, end: usize) -> FullRamTrackReader {
        let end = end.min(bytes.len());
        FullRamTrackReader {
            bytes,
            track_number: None,
            start: pos,
            pos,
            end,
            expected_end: end as u64,
        }
    }

    pub fn new_from_vec(bytes: Vec<u8>) -> FullRamTrackReader {
        let len = bytes.len();
        FullRamTrackReader::new(Arc::new(bytes), 0, len)
    }
}

impl TrackReader for FullRamTrackReader {
    #[inline(always)]
    fn read(&mut self) -> Result<u8, MIDIParseError> {
        if self.pos >= self.end {
            return Err(MIDIParseError::UnexpectedTrackEnd {
                track_number: self.track_number,
                track_start: self.start as u64,
                expected_track_end: self.expected_end,
            });
        }
        let b = self.bytes[self.pos];
        self.pos += 1;
        Ok(b)
    }

    fn pos(&self) -> u64 {
        self.pos as u64
    }

    fn track_number(&self) -> Option<u32> {
        self.track_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_reader_stops_at_chunk_end() {
        let reader = RAMReader::from_bytes(vec![1, 2, 3, 4, 5]).unwrap();
        let mut track = reader.open_reader(Some(2), 1, 2);

        assert_eq!(track.read().unwrap(), 2);
        assert_eq!(track.read().unwrap(), 3);
        assert_eq!(
            track.read().unwrap_err(),
            MIDIParseError::UnexpectedTrackEnd {
                track_number: Some(2),
                track_start: 1,
                expected_track_end: 3,
            }
        );
    }

    #[test]
    fn truncated_chunk_is_clamped_to_file() {
        let reader = RAMReader::from_bytes(vec![1, 2, 3]).unwrap();
        let mut track = reader.open_reader(None, 2, 100);

        assert_eq!(track.read().unwrap(), 3);
        assert!(track.read().is_err());
        assert!(reader.read_bytes(2, 4).is_err());
    }
}
