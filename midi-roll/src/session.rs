use std::path::Path;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::{
    io::{MIDIFile, MIDILoadError, MIDIReader},
    layout::{layout_notes, track_width, NoteRect},
    notes::Note,
    pipe,
    playback::TempoMapSequencer,
    sequence::{
        conversion::events_to_notes,
        event::{
            beat_divisor, channel_events, merge_tempo_changes, tempo_changes, track_length,
            TempoChange,
        },
        note::{pitch_range, PitchRange},
        to_vec, until_error,
    },
    settings::LayoutSettings,
};

/// The notes of one track, ready to be laid out.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackNotes {
    pub name: Option<String>,
    pub notes: Vec<Note>,
    pub range: PitchRange,
    /// Position of the end of track event, in beats.
    pub length_beats: f64,
}

struct LoadedTrack {
    notes: TrackNotes,
    tempo_changes: Vec<TempoChange>,
}

fn load_track<T: MIDIReader>(
    file: &MIDIFile<T>,
    track: u32,
    ticks_per_beat: Option<u16>,
) -> Result<LoadedTrack, MIDILoadError> {
    let parser = file.iter_track(track)?;
    let events = pipe!(parser|>until_error(|e| warn!("Track {} is cut short: {}", track, e))|>to_vec());

    let name = events.iter().find_map(|e| e.track_name());
    let tempo_changes = tempo_changes(&events, ticks_per_beat);
    let length_beats = track_length(&events) as f64 / beat_divisor(ticks_per_beat);

    let notes = pipe! {
        events.into_iter()
        |>channel_events()
        |>events_to_notes(ticks_per_beat)
        |>to_vec()
    };
    let range = pitch_range(&notes);

    debug!(
        "Track {}: {} notes, keys {} to {}, {} beats long",
        track,
        notes.len(),
        range.lowest,
        range.highest,
        length_beats
    );

    Ok(LoadedTrack {
        notes: TrackNotes {
            name,
            notes,
            range,
            length_beats,
        },
        tempo_changes,
    })
}

/// Everything needed to show and play one MIDI file.
#[derive(Debug, Clone)]
pub struct MidiSession {
    tracks: Vec<TrackNotes>,
    tempo_changes: Vec<TempoChange>,
    ticks_per_beat: Option<u16>,
    layout: LayoutSettings,
}

impl Default for MidiSession {
    fn default() -> Self {
        Self::empty(LayoutSettings::default())
    }
}

impl MidiSession {
    /// A session without any tracks.
    pub fn empty(layout: LayoutSettings) -> Self {
        Self {
            tracks: Vec::new(),
            tempo_changes: Vec::new(),
            ticks_per_beat: None,
            layout,
        }
    }

    pub fn open(path: impl AsRef<Path>, layout: LayoutSettings) -> Result<Self, MIDILoadError> {
        let path = path.as_ref();
        let file = MIDIFile::open(path, None)?;
        info!(
            "Loaded {} with {} tracks",
            path.display(),
            file.track_count()
        );
        Self::from_file(&file, layout)
    }

    /// Like [`open`](Self::open), but a file that can't be loaded gives an
    /// empty session.
    pub fn open_or_empty(path: impl AsRef<Path>, layout: LayoutSettings) -> Self {
        let path = path.as_ref();
        match Self::open(path, layout) {
            Ok(session) => session,
            Err(e) => {
                warn!("Could not load {}: {}", path.display(), e);
                Self::empty(layout)
            }
        }
    }

    /// Reconstructs the notes of every track, one track per worker.
    pub fn from_file<T: MIDIReader + Sync>(
        file: &MIDIFile<T>,
        layout: LayoutSettings,
    ) -> Result<Self, MIDILoadError> {
        let ticks_per_beat = file.ppq();

        let loaded = (0..file.track_count() as u32)
            .into_par_iter()
            .map(|track| load_track(file, track, ticks_per_beat))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tracks = Vec::with_capacity(loaded.len());
        let mut tempo_tracks = Vec::with_capacity(loaded.len());
        for track in loaded {
            tracks.push(track.notes);
            tempo_tracks.push(track.tempo_changes);
        }

        Ok(Self {
            tracks,
            tempo_changes: merge_tempo_changes(tempo_tracks),
            ticks_per_beat,
            layout,
        })
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn tracks(&self) -> &[TrackNotes] {
        &self.tracks
    }

    pub fn track(&self, track: usize) -> Option<&TrackNotes> {
        self.tracks.get(track)
    }

    /// The notes of a track in the order they end. Empty for tracks that
    /// don't exist.
    pub fn notes(&self, track: usize) -> &[Note] {
        self.track(track).map(|t| t.notes.as_slice()).unwrap_or(&[])
    }

    pub fn pitch_range(&self, notes: &[Note]) -> PitchRange {
        pitch_range(notes)
    }

    pub fn layout(&self, track: usize) -> Vec<NoteRect> {
        match self.track(track) {
            Some(t) => layout_notes(&t.notes, t.range, &self.layout),
            None => Vec::new(),
        }
    }

    pub fn track_width(&self, track: usize) -> f64 {
        self.track(track)
            .map(|t| track_width(t.length_beats, self.layout.note_zoom))
            .unwrap_or(0.0)
    }

    /// The tempo map of the whole file.
    pub fn tempo_changes(&self) -> &[TempoChange] {
        &self.tempo_changes
    }

    pub fn ticks_per_beat(&self) -> Option<u16> {
        self.ticks_per_beat
    }

    /// Where the longest track ends, in beats.
    pub fn end_beat(&self) -> f64 {
        self.tracks
            .iter()
            .fold(0.0, |end, t| end.max(t.length_beats))
    }

    pub fn layout_settings(&self) -> &LayoutSettings {
        &self.layout
    }

    /// A silent sequencer following this file's tempo map.
    pub fn sequencer(&self, default_bpm: f64) -> TempoMapSequencer {
        TempoMapSequencer::new(self.tempo_changes.clone(), default_bpm)
    }
}
