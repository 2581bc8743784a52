mod channel_events;
mod delta;
mod tempo;

pub use channel_events::*;
pub use delta::*;
pub use tempo::*;
