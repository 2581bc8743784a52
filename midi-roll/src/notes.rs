/// Common accessors for notes positioned in beats.
pub trait MIDINote {
    fn start(&self) -> f64;
    fn end(&self) -> f64;
    fn key(&self) -> u8;

    #[inline(always)]
    fn duration(&self) -> f64 {
        self.end() - self.start()
    }
}

/// A note reconstructed from a note on and the event that released it.
///
/// `start` and `end` are in beats, with `end >= start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub key: u8,
    pub start: f64,
    pub end: f64,
}

impl Note {
    pub fn new(key: u8, start: f64, end: f64) -> Self {
        Self { key, start, end }
    }

    #[inline(always)]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl MIDINote for Note {
    #[inline(always)]
    fn start(&self) -> f64 {
        self.start
    }

    #[inline(always)]
    fn end(&self) -> f64 {
        self.end
    }

    #[inline(always)]
    fn key(&self) -> u8 {
        self.key
    }
}
