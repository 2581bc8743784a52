mod pitch_range;

pub use pitch_range::*;
