use std::time::Duration;

use crate::{
    events::MIDIEventEnum,
    num::MIDINum,
};

use super::Delta;

/// Tempo assumed by MIDI files until their first tempo event.
pub const MIDI_DEFAULT_BPM: f64 = 120.0;

/// A tempo change at a position in beats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TempoChange {
    pub beat: f64,
    pub bpm: f64,
}

impl TempoChange {
    pub fn new(beat: f64, bpm: f64) -> Self {
        Self { beat, bpm }
    }
}

/// The number to divide tick positions by to get beats. Files without a
/// usable ticks per beat resolution are treated as already being in beats.
#[inline(always)]
pub fn beat_divisor(ticks_per_beat: Option<u16>) -> f64 {
    match ticks_per_beat {
        Some(ticks) if ticks > 0 => ticks as f64,
        _ => 1.0,
    }
}

fn usable_bpm(bpm: f64) -> Option<f64> {
    if bpm.is_finite() && bpm > 0.0 {
        Some(bpm)
    } else {
        None
    }
}

/// Collects the tempo events of a track, positioned in beats.
///
/// Tempo events with a tempo of 0 are skipped.
pub fn tempo_changes<'a, D: MIDINum + 'a, E: MIDIEventEnum + 'a>(
    events: impl IntoIterator<Item = &'a Delta<D, E>>,
    ticks_per_beat: Option<u16>,
) -> Vec<TempoChange> {
    let divisor = beat_divisor(ticks_per_beat);
    let mut time = D::zero();
    let mut changes = Vec::new();

    for e in events {
        time += e.delta;
        if let Some(bpm) = e.as_event().inner_tempo().and_then(|tempo| {
            if tempo == 0 {
                None
            } else {
                Some(60_000_000.0 / tempo as f64)
            }
        }) {
            let tick: f64 = time.midi_num_into();
            changes.push(TempoChange::new(tick / divisor, bpm));
        }
    }

    changes
}

/// Merges the tempo changes of several tracks into one map ordered by
/// position. Changes at the same position keep their track order.
pub fn merge_tempo_changes(tracks: Vec<Vec<TempoChange>>) -> Vec<TempoChange> {
    let mut merged: Vec<TempoChange> = tracks.into_iter().flatten().collect();
    merged.sort_by(|a, b| {
        a.beat
            .partial_cmp(&b.beat)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    merged
}

/// The tempo in effect at `beat`.
pub fn tempo_at(changes: &[TempoChange], beat: f64, default_bpm: f64) -> f64 {
    let mut bpm = usable_bpm(default_bpm).unwrap_or(MIDI_DEFAULT_BPM);
    for change in changes {
        if change.beat > beat {
            break;
        }
        bpm = change.bpm;
    }
    bpm
}

/// The beat reached after playing for `elapsed` from the start.
pub fn beat_at(changes: &[TempoChange], elapsed: Duration, default_bpm: f64) -> f64 {
    let elapsed = elapsed.as_secs_f64();
    let mut bpm = usable_bpm(default_bpm).unwrap_or(MIDI_DEFAULT_BPM);
    let mut last_beat = 0.0;
    let mut time = 0.0;

    for change in changes {
        let beats = (change.beat - last_beat).max(0.0);
        let segment = beats * 60.0 / bpm;
        if time + segment > elapsed {
            break;
        }
        time += segment;
        last_beat = change.beat.max(last_beat);
        bpm = change.bpm;
    }

    last_beat + (elapsed - time) * bpm / 60.0
}

/// The wall clock time it takes to play up to `beat`.
pub fn beats_to_duration(changes: &[TempoChange], beat: f64, default_bpm: f64) -> Duration {
    let mut bpm = usable_bpm(default_bpm).unwrap_or(MIDI_DEFAULT_BPM);
    let mut last_beat = 0.0;
    let mut time = 0.0;

    for change in changes {
        if change.beat > beat {
            break;
        }
        time += (change.beat - last_beat).max(0.0) * 60.0 / bpm;
        last_beat = change.beat.max(last_beat);
        bpm = change.bpm;
    }

    time += (beat - last_beat).max(0.0) * 60.0 / bpm;
    Duration::from_secs_f64(time)
}
