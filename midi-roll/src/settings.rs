use crate::playback::OutputSource;

/// Horizontal zoom, in pixels per beat, used unless configured otherwise.
pub const DEFAULT_NOTE_ZOOM: f64 = 50_000.0;
/// Tempo used when a file has no tempo events.
pub const DEFAULT_TEMPO: f64 = 120.0;
pub const DEFAULT_INSTRUMENT: &str = "UprightPianoKW-20190703";
pub const DEFAULT_TRACK_HEIGHT: f64 = 200.0;
pub const DEFAULT_REVERB_MIX: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    pub note_zoom: f64,
    pub default_tempo: f64,
    /// Name of the instrument the audio engine loads before playing.
    pub instrument: String,
    /// Dry/wet mix of the reverb the sampler plays through, 0 for no reverb.
    pub reverb_mix: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            note_zoom: DEFAULT_NOTE_ZOOM,
            default_tempo: DEFAULT_TEMPO,
            instrument: DEFAULT_INSTRUMENT.to_string(),
            reverb_mix: DEFAULT_REVERB_MIX,
        }
    }
}

impl PlaybackSettings {
    pub fn with_note_zoom(mut self, note_zoom: f64) -> Self {
        self.note_zoom = note_zoom;
        self
    }

    pub fn with_default_tempo(mut self, default_tempo: f64) -> Self {
        self.default_tempo = default_tempo;
        self
    }

    pub fn with_instrument(mut self, instrument: impl Into<String>) -> Self {
        self.instrument = instrument.into();
        self
    }

    pub fn with_reverb_mix(mut self, reverb_mix: f64) -> Self {
        self.reverb_mix = reverb_mix;
        self
    }

    /// The output the audio engine is wired to before playing.
    pub fn output(&self) -> OutputSource {
        if self.reverb_mix > 0.0 {
            OutputSource::SamplerWithReverb {
                dry_wet_mix: self.reverb_mix.min(1.0),
            }
        } else {
            OutputSource::Sampler
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutSettings {
    pub track_height: f64,
    pub note_zoom: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            track_height: DEFAULT_TRACK_HEIGHT,
            note_zoom: DEFAULT_NOTE_ZOOM,
        }
    }
}

impl LayoutSettings {
    pub fn with_track_height(mut self, track_height: f64) -> Self {
        self.track_height = track_height;
        self
    }

    pub fn with_note_zoom(mut self, note_zoom: f64) -> Self {
        self.note_zoom = note_zoom;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let playback = PlaybackSettings::default()
            .with_note_zoom(100.0)
            .with_instrument("Strings");
        assert_eq!(playback.note_zoom, 100.0);
        assert_eq!(playback.default_tempo, DEFAULT_TEMPO);
        assert_eq!(playback.instrument, "Strings");
        assert_eq!(
            playback.output(),
            OutputSource::SamplerWithReverb { dry_wet_mix: 0.2 }
        );
        assert_eq!(
            playback.clone().with_reverb_mix(0.0).output(),
            OutputSource::Sampler
        );
        assert_eq!(
            playback.with_reverb_mix(3.0).output(),
            OutputSource::SamplerWithReverb { dry_wet_mix: 1.0 }
        );

        let layout = LayoutSettings::default().with_track_height(50.0);
        assert_eq!(layout.track_height, 50.0);
        assert_eq!(layout.note_zoom, DEFAULT_NOTE_ZOOM);
    }
}
