mod clock;
mod engine;
mod errors;

pub use clock::*;
pub use engine::*;
pub use errors::*;
