use std::{
    path::Path,
    time::{Duration, Instant},
};

use log::{info, warn};

use crate::{
    io::MIDIFile,
    pipe,
    sequence::{
        event::{beat_at, merge_tempo_changes, tempo_at, tempo_changes, TempoChange},
        to_vec, until_error,
    },
};

use super::EngineError;

/// Plays back the events of a loaded file.
pub trait Sequencer {
    /// Replaces the loaded events with the ones of a MIDI file.
    fn load_file(&mut self, path: &Path) -> Result<(), EngineError>;
    fn play(&mut self);
    fn stop(&mut self);
    fn rewind(&mut self);

    /// The tempo at the current playback position, in beats per minute.
    fn tempo(&self) -> f64;
    fn tempo_changes(&self) -> &[TempoChange];
}

/// What an audio engine sends to its output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputSource {
    /// The sampler playing the loaded instrument.
    Sampler,
    /// The sampler through a reverb. A mix of 0 is fully dry, 1 fully wet.
    SamplerWithReverb { dry_wet_mix: f64 },
}

/// The sound output that a sequencer drives.
pub trait AudioEngine {
    /// Routes `source` to the output. Takes effect on the next start.
    fn set_output(&mut self, source: OutputSource);
    fn start(&mut self) -> Result<(), EngineError>;
    fn stop(&mut self);
    fn load_instrument(&mut self, name: &str) -> Result<(), EngineError>;
}

/// A sequencer that produces no sound and follows a tempo map using the wall
/// clock.
#[derive(Debug, Clone)]
pub struct TempoMapSequencer {
    changes: Vec<TempoChange>,
    default_bpm: f64,
    started: Option<Instant>,
    played: Duration,
}

impl TempoMapSequencer {
    pub fn new(changes: Vec<TempoChange>, default_bpm: f64) -> Self {
        Self {
            changes,
            default_bpm,
            started: None,
            played: Duration::ZERO,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.started.is_some()
    }

    /// Time spent playing since the last rewind.
    pub fn elapsed(&self) -> Duration {
        match self.started {
            Some(started) => self.played + started.elapsed(),
            None => self.played,
        }
    }

    /// The current playback position in beats.
    pub fn position(&self) -> f64 {
        beat_at(&self.changes, self.elapsed(), self.default_bpm)
    }
}

impl Sequencer for TempoMapSequencer {
    /// Loads the tempo map of every track of the file and rewinds.
    fn load_file(&mut self, path: &Path) -> Result<(), EngineError> {
        let file = MIDIFile::open(path, None).map_err(|e| EngineError::FileLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let ticks_per_beat = file.ppq();

        let tracks = file
            .iter_all_tracks()
            .enumerate()
            .map(|(track, parser)| {
                let events = pipe!(parser|>until_error(|e| warn!("Track {} is cut short: {}", track, e))|>to_vec());
                tempo_changes(&events, ticks_per_beat)
            })
            .collect();
        self.changes = merge_tempo_changes(tracks);

        info!(
            "Sequencing {} with {} tempo changes",
            path.display(),
            self.changes.len()
        );
        self.rewind();
        Ok(())
    }

    fn play(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.played += started.elapsed();
        }
    }

    fn rewind(&mut self) {
        self.played = Duration::ZERO;
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn tempo(&self) -> f64 {
        tempo_at(&self.changes, self.position(), self.default_bpm)
    }

    fn tempo_changes(&self) -> &[TempoChange] {
        &self.changes
    }
}

/// An audio engine without any output.
#[derive(Debug, Clone, Default)]
pub struct SilentEngine {
    running: bool,
    instrument: Option<String>,
    output: Option<OutputSource>,
}

impl SilentEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn instrument(&self) -> Option<&str> {
        self.instrument.as_deref()
    }

    pub fn output(&self) -> Option<OutputSource> {
        self.output
    }
}

impl AudioEngine for SilentEngine {
    fn set_output(&mut self, source: OutputSource) {
        self.output = Some(source);
    }

    fn start(&mut self) -> Result<(), EngineError> {
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn load_instrument(&mut self, name: &str) -> Result<(), EngineError> {
        self.instrument = Some(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::{
        io::two_track_file,
        playback::{
            AudioEngine, EngineError, OutputSource, Sequencer, SilentEngine, TempoMapSequencer,
        },
        sequence::event::TempoChange,
    };

    #[test]
    fn tempo_map_sequencer_reports_the_first_tempo() {
        let mut sequencer = TempoMapSequencer::new(
            vec![TempoChange::new(0.0, 90.0), TempoChange::new(1000.0, 180.0)],
            120.0,
        );

        assert_eq!(sequencer.tempo(), 90.0);
        sequencer.play();
        assert!(sequencer.is_playing());
        assert_eq!(sequencer.tempo(), 90.0);
        sequencer.stop();
        assert!(!sequencer.is_playing());

        sequencer.rewind();
        assert_eq!(sequencer.elapsed().as_secs_f64(), 0.0);
        assert_eq!(sequencer.tempo_changes().len(), 2);
    }

    #[test]
    fn empty_tempo_map_uses_the_default() {
        let sequencer = TempoMapSequencer::new(Vec::new(), 100.0);
        assert_eq!(sequencer.tempo(), 100.0);
    }

    #[test]
    fn silent_engine_records_its_state() {
        let mut engine = SilentEngine::new();
        assert_eq!(engine.output(), None);
        engine.set_output(OutputSource::SamplerWithReverb { dry_wet_mix: 0.2 });
        engine.load_instrument("Piano").unwrap();
        engine.start().unwrap();
        assert!(engine.is_running());
        assert_eq!(engine.instrument(), Some("Piano"));
        assert_eq!(
            engine.output(),
            Some(OutputSource::SamplerWithReverb { dry_wet_mix: 0.2 })
        );
        engine.stop();
        assert!(!engine.is_running());
    }

    #[test]
    fn load_file_reads_the_tempo_map() {
        let path = std::env::temp_dir().join("midi-roll-sequencer-load.mid");
        std::fs::write(&path, two_track_file()).unwrap();

        let mut sequencer = TempoMapSequencer::new(Vec::new(), 100.0);
        sequencer.load_file(&path).unwrap();

        assert_eq!(
            sequencer.tempo_changes(),
            &[TempoChange::new(0.0, 120.0), TempoChange::new(4.0, 60.0)][..]
        );
        assert_eq!(sequencer.tempo(), 120.0);
        assert_eq!(sequencer.elapsed().as_secs_f64(), 0.0);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn load_file_reports_missing_files() {
        let mut sequencer = TempoMapSequencer::new(vec![TempoChange::new(0.0, 90.0)], 100.0);
        let result = sequencer.load_file(Path::new("/nonexistent/song.mid"));

        assert!(matches!(result, Err(EngineError::FileLoad { .. })));
        assert_eq!(sequencer.tempo_changes().len(), 1);
    }
}
