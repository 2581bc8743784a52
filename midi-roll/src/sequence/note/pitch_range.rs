use crate::notes::Note;

/// The lowest and highest key used by a list of notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PitchRange {
    pub lowest: u8,
    pub highest: u8,
}

impl PitchRange {
    pub fn new(lowest: u8, highest: u8) -> Self {
        Self { lowest, highest }
    }

    /// Number of keys in the range, both ends included.
    #[inline(always)]
    pub fn span(&self) -> u32 {
        (self.highest as u32).saturating_sub(self.lowest as u32) + 1
    }
}

/// Finds the range of keys covered by `notes`.
///
/// Lists with fewer than two notes get the range `0..=0`, even when the only
/// note is on a different key.
pub fn pitch_range(notes: &[Note]) -> PitchRange {
    if notes.len() < 2 {
        return PitchRange::default();
    }

    let mut lowest = u8::MAX;
    let mut highest = u8::MIN;
    for note in notes {
        lowest = lowest.min(note.key);
        highest = highest.max(note.key);
    }

    PitchRange { lowest, highest }
}

#[cfg(test)]
mod tests {
    use crate::{
        notes::Note,
        sequence::note::{pitch_range, PitchRange},
    };

    #[test]
    fn small_lists_get_the_degenerate_range() {
        assert_eq!(pitch_range(&[]), PitchRange::new(0, 0));
        assert_eq!(pitch_range(&[Note::new(72, 0.0, 1.0)]), PitchRange::new(0, 0));
        assert_eq!(PitchRange::default().span(), 1);
    }

    #[test]
    fn range_covers_lowest_to_highest() {
        let notes = vec![
            Note::new(64, 0.0, 1.0),
            Note::new(40, 1.0, 2.0),
            Note::new(72, 2.0, 3.0),
        ];

        let range = pitch_range(&notes);
        assert_eq!(range, PitchRange::new(40, 72));
        assert_eq!(range.span(), 33);
    }
}
