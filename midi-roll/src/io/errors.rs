use thiserror::Error;

#[derive(Debug, Error)]
pub enum MIDILoadError {
    #[error("Corrupt chunks: expected {expected} header at position {position:#06x}")]
    CorruptChunks {
        expected: &'static str,
        position: u64,
    },
    #[error("Unexpected end of file at position {position:#06x}")]
    UnexpectedFileEnd { position: u64 },
    #[error("File is too big to be loaded ({length} bytes)")]
    FileTooBig { length: u64 },
    #[error("Track {track} does not exist, the file has {track_count} tracks")]
    TrackOutOfRange { track: u32, track_count: usize },
    #[error("Filesystem error: {0}")]
    FilesystemError(#[from] std::io::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MIDIParseError {
    #[error("{}", describe_corrupt_event(.track_number, .position))]
    CorruptEvent {
        track_number: Option<u32>,
        position: u64,
    },
    #[error("{}", describe_track_end(.track_number, .track_start, .expected_track_end))]
    UnexpectedTrackEnd {
        track_number: Option<u32>,
        track_start: u64,
        expected_track_end: u64,
    },
}

fn describe_corrupt_event(track_number: &Option<u32>, position: &u64) -> String {
    match track_number {
        Some(track_number) => {
            format!("Corrupt event (track {track_number}, position: {position:#06x})")
        }
        None => format!("Corrupt event (position: {position:#06x})"),
    }
}

fn describe_track_end(
    track_number: &Option<u32>,
    track_start: &u64,
    expected_end: &u64,
) -> String {
    match track_number {
        Some(track_number) => format!(
            "Unexpected track end (track {track_number}, track start: {track_start:#06x}, expected end: {expected_end:#06x})"
        ),
        None => format!(
            "Unexpected track end (track start: {track_start:#06x}, expected end: {expected_end:#06x})"
        ),
    }
}
