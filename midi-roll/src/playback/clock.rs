use std::time::{Duration, Instant};

use crossbeam_channel::{tick, unbounded, Receiver, Sender};
use log::{error, info, trace, warn};

use crate::settings::{PlaybackSettings, DEFAULT_TEMPO};

use super::{AudioEngine, PlaybackError, Sequencer};

/// Scroll steps per second that one beat per second at the reference zoom
/// of 10000 pixels per beat is tuned to.
pub const REFERENCE_SCROLL_RATE: f64 = 20.0 + 8.0 / 10.0 + 1.0 / 30.0;
pub const SCROLL_NORMALIZATION: f64 = 1.0 / REFERENCE_SCROLL_RATE;

/// Seconds between two scroll steps at `bpm` and `note_zoom` pixels per
/// beat. Unusable tempos fall back to the default tempo.
pub fn scroll_interval_secs(bpm: f64, note_zoom: f64) -> f64 {
    let bpm = if bpm.is_finite() && bpm > 0.0 {
        bpm
    } else {
        DEFAULT_TEMPO
    };
    SCROLL_NORMALIZATION * (10_000.0 / note_zoom) * (60.0 / bpm)
}

/// Like [`scroll_interval_secs`], `None` when the zoom makes the interval
/// negative, infinite or NaN.
pub fn scroll_interval(bpm: f64, note_zoom: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(scroll_interval_secs(bpm, note_zoom)).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Sent to subscribers whenever the clock changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackUpdate {
    Started { tempo: f64, interval: Duration },
    Scrolled { position: u64 },
    TempoChanged { tempo: f64, interval: Duration },
    Stopped { position: u64 },
}

struct Timer {
    ticks: Receiver<Instant>,
    /// The tempo the interval was computed from.
    tempo: f64,
    interval: Duration,
}

/// Scrolls a piano roll in time with a sequencer.
///
/// While playing, a repeating timer fires once per scroll step. The owner
/// drives the clock with [`poll`](Self::poll) or
/// [`wait_tick`](Self::wait_tick), and each tick moves the scroll position
/// one step. When the sequencer's tempo no longer matches the tempo the
/// timer was set up with, the timer is replaced with one for the new tempo.
pub struct PlaybackClock<S: Sequencer, A: AudioEngine> {
    sequencer: S,
    engine: A,
    settings: PlaybackSettings,
    timer: Option<Timer>,
    position: u64,
    subscribers: Vec<Sender<PlaybackUpdate>>,
    scroll_callbacks: Vec<Box<dyn FnMut(u64) + Send>>,
}

impl<S: Sequencer, A: AudioEngine> PlaybackClock<S, A> {
    pub fn new(sequencer: S, engine: A, settings: PlaybackSettings) -> Self {
        Self {
            sequencer,
            engine,
            settings,
            timer: None,
            position: 0,
            subscribers: Vec::new(),
            scroll_callbacks: Vec::new(),
        }
    }

    fn publish(&mut self, update: PlaybackUpdate) {
        self.subscribers.retain(|s| s.send(update).is_ok());
    }

    fn arm(&self, tempo: f64) -> Result<Timer, PlaybackError> {
        let zoom = self.settings.note_zoom;
        let interval =
            scroll_interval(tempo, zoom).ok_or(PlaybackError::InvalidScrollInterval { zoom })?;
        Ok(Timer {
            ticks: tick(interval),
            tempo,
            interval,
        })
    }

    fn initial_tempo(&self) -> f64 {
        self.sequencer
            .tempo_changes()
            .first()
            .map(|change| change.bpm)
            .unwrap_or(self.settings.default_tempo)
    }

    /// Wires the engine's output, starts the engine and the sequencer, and
    /// starts scrolling from the beginning of the track.
    ///
    /// An instrument that fails to load is logged and playback goes on
    /// without sound. If the engine fails to start the clock stays stopped.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        if self.timer.is_some() {
            return Ok(());
        }

        let timer = self.arm(self.initial_tempo())?;

        self.engine.set_output(self.settings.output());
        if let Err(e) = self.engine.load_instrument(&self.settings.instrument) {
            warn!("{}, playing without sound", e);
        }
        if let Err(e) = self.engine.start() {
            error!("{}", e);
            return Err(e.into());
        }
        self.sequencer.play();

        info!(
            "Playing at {} bpm, scrolling every {:?}",
            timer.tempo, timer.interval
        );

        let update = PlaybackUpdate::Started {
            tempo: timer.tempo,
            interval: timer.interval,
        };
        self.position = 0;
        self.timer = Some(timer);
        self.publish(update);
        Ok(())
    }

    /// Stops the sequencer and the engine and cancels the timer. Does
    /// nothing when already stopped.
    pub fn stop(&mut self) {
        if self.timer.take().is_none() {
            return;
        }

        self.sequencer.stop();
        self.engine.stop();
        info!("Stopped at scroll position {}", self.position);

        let position = self.position;
        self.publish(PlaybackUpdate::Stopped { position });
    }

    pub fn rewind(&mut self) {
        self.sequencer.rewind();
        self.position = 0;
    }

    /// Moves the scroll position one step and follows tempo changes.
    pub fn on_tick(&mut self) {
        let captured = match &self.timer {
            Some(timer) => timer.tempo,
            None => return,
        };

        self.position += 1;
        let position = self.position;
        for callback in self.scroll_callbacks.iter_mut() {
            callback(position);
        }
        self.publish(PlaybackUpdate::Scrolled { position });

        let live = self.sequencer.tempo();
        if live == captured || self.sequencer.tempo_changes().len() <= 1 {
            return;
        }

        trace!("Tempo changed from {} to {} bpm, re-arming", captured, live);
        match self.arm(live) {
            Ok(timer) => {
                let update = PlaybackUpdate::TempoChanged {
                    tempo: timer.tempo,
                    interval: timer.interval,
                };
                self.timer = Some(timer);
                self.publish(update);
            }
            Err(e) => {
                error!("{}", e);
                self.stop();
            }
        }
    }

    /// Handles every tick that is due without blocking, returning how many
    /// there were.
    pub fn poll(&mut self) -> usize {
        let mut count = 0;
        while let Some(Ok(_)) = self.timer.as_ref().map(|t| t.ticks.try_recv()) {
            self.on_tick();
            count += 1;
        }
        count
    }

    /// Blocks until the next tick and handles it. Returns false when the
    /// clock is stopped.
    pub fn wait_tick(&mut self) -> bool {
        let next = match &self.timer {
            Some(timer) => timer.ticks.recv(),
            None => return false,
        };

        match next {
            Ok(_) => {
                self.on_tick();
                true
            }
            Err(_) => false,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<PlaybackUpdate> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Registers a callback that receives the scroll position after every
    /// step.
    pub fn on_scroll_tick(&mut self, callback: impl FnMut(u64) + Send + 'static) {
        self.scroll_callbacks.push(Box::new(callback));
    }

    /// Number of scroll steps taken since playback started.
    pub fn scroll_position(&self) -> u64 {
        self.position
    }

    /// Horizontal offset of the track, one pixel to the left per step.
    pub fn scroll_offset(&self) -> f64 {
        -(self.position as f64)
    }

    /// The current interval between scroll steps, or the one playback would
    /// start with when stopped.
    pub fn scroll_interval(&self) -> Option<Duration> {
        match &self.timer {
            Some(timer) => Some(timer.interval),
            None => scroll_interval(self.initial_tempo(), self.settings.note_zoom),
        }
    }

    /// The tempo the current interval was computed from.
    pub fn tempo(&self) -> Option<f64> {
        self.timer.as_ref().map(|t| t.tempo)
    }

    pub fn state(&self) -> PlaybackState {
        if self.timer.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        }
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_some()
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    pub fn sequencer(&self) -> &S {
        &self.sequencer
    }

    pub fn sequencer_mut(&mut self) -> &mut S {
        &mut self.sequencer
    }

    pub fn engine(&self) -> &A {
        &self.engine
    }
}

impl<S: Sequencer, A: AudioEngine> Drop for PlaybackClock<S, A> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        path::Path,
        sync::{Arc, Mutex},
    };

    use crate::{
        playback::{
            scroll_interval, scroll_interval_secs, AudioEngine, EngineError, OutputSource,
            PlaybackClock, PlaybackError, PlaybackState, PlaybackUpdate, Sequencer,
            SCROLL_NORMALIZATION,
        },
        sequence::event::TempoChange,
        settings::PlaybackSettings,
    };

    struct MockSequencer {
        tempo: f64,
        changes: Vec<TempoChange>,
        playing: bool,
    }

    impl MockSequencer {
        fn new(changes: Vec<TempoChange>) -> Self {
            Self {
                tempo: changes.first().map(|c| c.bpm).unwrap_or(120.0),
                changes,
                playing: false,
            }
        }
    }

    impl Sequencer for MockSequencer {
        fn load_file(&mut self, path: &Path) -> Result<(), EngineError> {
            Err(EngineError::FileLoad {
                path: path.display().to_string(),
                reason: "not supported".to_string(),
            })
        }

        fn play(&mut self) {
            self.playing = true;
        }

        fn stop(&mut self) {
            self.playing = false;
        }

        fn rewind(&mut self) {}

        fn tempo(&self) -> f64 {
            self.tempo
        }

        fn tempo_changes(&self) -> &[TempoChange] {
            &self.changes
        }
    }

    #[derive(Default)]
    struct MockEngine {
        fail_start: bool,
        fail_instrument: bool,
        running: bool,
        output: Option<OutputSource>,
        started_with: Option<OutputSource>,
    }

    impl AudioEngine for MockEngine {
        fn set_output(&mut self, source: OutputSource) {
            self.output = Some(source);
        }

        fn start(&mut self) -> Result<(), EngineError> {
            if self.fail_start {
                return Err(EngineError::Start("no output device".to_string()));
            }
            self.running = true;
            self.started_with = self.output;
            Ok(())
        }

        fn stop(&mut self) {
            self.running = false;
        }

        fn load_instrument(&mut self, name: &str) -> Result<(), EngineError> {
            if self.fail_instrument {
                return Err(EngineError::InstrumentLoad {
                    name: name.to_string(),
                    reason: "missing sound font".to_string(),
                });
            }
            Ok(())
        }
    }

    fn clock(
        changes: Vec<TempoChange>,
        engine: MockEngine,
    ) -> PlaybackClock<MockSequencer, MockEngine> {
        PlaybackClock::new(
            MockSequencer::new(changes),
            engine,
            PlaybackSettings::default(),
        )
    }

    #[test]
    fn interval_follows_tempo_and_zoom() {
        let at_120 = scroll_interval_secs(120.0, 50_000.0);
        assert_eq!(at_120, SCROLL_NORMALIZATION * (10_000.0 / 50_000.0) * 0.5);
        assert!((scroll_interval_secs(240.0, 50_000.0) * 2.0 - at_120).abs() < 1e-15);
        assert_eq!(scroll_interval_secs(0.0, 50_000.0), at_120);
        assert_eq!(scroll_interval_secs(f64::NAN, 50_000.0), at_120);
        assert_eq!(scroll_interval(120.0, 0.0), None);
        assert_eq!(scroll_interval(120.0, -1.0), None);
    }

    #[test]
    fn play_uses_the_first_tempo_change() {
        let mut clock = clock(vec![TempoChange::new(0.0, 240.0)], MockEngine::default());
        let updates = clock.subscribe();

        clock.play().unwrap();

        let interval = scroll_interval(240.0, 50_000.0).unwrap();
        assert_eq!(clock.state(), PlaybackState::Playing);
        assert_eq!(clock.tempo(), Some(240.0));
        assert_eq!(clock.scroll_interval(), Some(interval));
        assert!(clock.sequencer().playing);
        assert!(clock.engine().running);
        assert_eq!(
            updates.try_recv(),
            Ok(PlaybackUpdate::Started {
                tempo: 240.0,
                interval
            })
        );
    }

    #[test]
    fn play_wires_the_output_before_starting() {
        let mut clock = clock(Vec::new(), MockEngine::default());
        clock.play().unwrap();
        assert_eq!(
            clock.engine().started_with,
            Some(OutputSource::SamplerWithReverb { dry_wet_mix: 0.2 })
        );

        let mut dry = PlaybackClock::new(
            MockSequencer::new(Vec::new()),
            MockEngine::default(),
            PlaybackSettings::default().with_reverb_mix(0.0),
        );
        dry.play().unwrap();
        assert_eq!(dry.engine().started_with, Some(OutputSource::Sampler));
    }

    #[test]
    fn play_without_tempo_changes_uses_the_default_tempo() {
        let mut clock = clock(Vec::new(), MockEngine::default());
        clock.play().unwrap();
        assert_eq!(clock.tempo(), Some(120.0));
    }

    #[test]
    fn engine_start_failure_stays_stopped() {
        let engine = MockEngine {
            fail_start: true,
            ..Default::default()
        };
        let mut clock = clock(Vec::new(), engine);

        let result = clock.play();

        assert!(matches!(result, Err(PlaybackError::Engine(EngineError::Start(_)))));
        assert_eq!(clock.state(), PlaybackState::Stopped);
        assert!(!clock.sequencer().playing);
        assert!(!clock.wait_tick());
    }

    #[test]
    fn instrument_failure_still_plays() {
        let engine = MockEngine {
            fail_instrument: true,
            ..Default::default()
        };
        let mut clock = clock(Vec::new(), engine);

        clock.play().unwrap();
        assert!(clock.is_playing());
    }

    #[test]
    fn ticks_scroll_and_notify() {
        let mut clock = clock(Vec::new(), MockEngine::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_callback = seen.clone();
        clock.on_scroll_tick(move |position| seen_by_callback.lock().unwrap().push(position));

        clock.play().unwrap();
        let updates = clock.subscribe();
        clock.on_tick();
        clock.on_tick();

        assert_eq!(clock.scroll_position(), 2);
        assert_eq!(clock.scroll_offset(), -2.0);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
        assert_eq!(
            updates.try_recv(),
            Ok(PlaybackUpdate::Scrolled { position: 1 })
        );
    }

    #[test]
    fn single_tempo_change_never_re_arms() {
        let mut clock = clock(vec![TempoChange::new(0.0, 120.0)], MockEngine::default());
        clock.play().unwrap();
        let before = clock.scroll_interval();

        clock.sequencer_mut().tempo = 60.0;
        clock.on_tick();

        assert_eq!(clock.tempo(), Some(120.0));
        assert_eq!(clock.scroll_interval(), before);
    }

    #[test]
    fn tempo_change_re_arms_the_timer() {
        let mut clock = clock(
            vec![TempoChange::new(0.0, 120.0), TempoChange::new(4.0, 60.0)],
            MockEngine::default(),
        );
        clock.play().unwrap();
        let updates = clock.subscribe();

        clock.sequencer_mut().tempo = 60.0;
        clock.on_tick();

        let interval = scroll_interval(60.0, 50_000.0).unwrap();
        assert_eq!(clock.tempo(), Some(60.0));
        assert_eq!(clock.scroll_interval(), Some(interval));
        assert_eq!(
            updates.try_iter().last(),
            Some(PlaybackUpdate::TempoChanged {
                tempo: 60.0,
                interval
            })
        );
    }

    #[test]
    fn stop_cancels_the_timer() {
        let mut clock = clock(Vec::new(), MockEngine::default());
        clock.play().unwrap();
        let updates = clock.subscribe();

        clock.stop();
        clock.on_tick();

        assert_eq!(clock.state(), PlaybackState::Stopped);
        assert!(!clock.sequencer().playing);
        assert!(!clock.engine().running);
        assert_eq!(clock.scroll_position(), 0);
        assert_eq!(clock.poll(), 0);
        assert!(!clock.wait_tick());
        assert_eq!(
            updates.try_recv(),
            Ok(PlaybackUpdate::Stopped { position: 0 })
        );
    }

    #[test]
    fn timer_drives_the_clock() {
        let mut clock = PlaybackClock::new(
            MockSequencer::new(Vec::new()),
            MockEngine::default(),
            PlaybackSettings::default().with_note_zoom(1e9),
        );
        clock.play().unwrap();

        assert!(clock.wait_tick());
        assert!(clock.scroll_position() >= 1);
    }
}
