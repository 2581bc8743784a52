use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Failed to load instrument \"{name}\": {reason}")]
    InstrumentLoad { name: String, reason: String },
    #[error("Failed to load \"{path}\" into the sequencer: {reason}")]
    FileLoad { path: String, reason: String },
    #[error("Failed to start the audio engine: {0}")]
    Start(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlaybackError {
    #[error("{0}")]
    Engine(#[from] EngineError),
    #[error("A note zoom of {zoom} does not give a usable scroll interval")]
    InvalidScrollInterval { zoom: f64 },
}
