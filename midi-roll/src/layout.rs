use crate::{notes::MIDINote, sequence::note::PitchRange, settings::LayoutSettings};

/// Where a note is drawn inside its track, in pixels from the top left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
}

/// Maps notes to rectangles in a track of `settings.track_height` pixels.
///
/// Every key of `range` gets an equal share of the height, with the highest
/// key at the top. Notes outside the range are laid out on the same scale,
/// which puts them above or below the track.
pub fn layout_notes<N: MIDINote>(
    notes: &[N],
    range: PitchRange,
    settings: &LayoutSettings,
) -> Vec<NoteRect> {
    let note_height = settings.track_height / range.span() as f64;
    let max_y = settings.track_height - note_height;

    notes
        .iter()
        .map(|note| {
            let level = note.key() as f64 - range.lowest as f64;
            NoteRect {
                x: note.start() * settings.note_zoom,
                y: max_y - level * note_height,
                width: note.duration() * settings.note_zoom,
                height: note_height,
                corner_radius: note_height * 0.5,
            }
        })
        .collect()
}

/// Width of a track that ends at `end_beat`.
#[inline(always)]
pub fn track_width(end_beat: f64, note_zoom: f64) -> f64 {
    end_beat * note_zoom
}
