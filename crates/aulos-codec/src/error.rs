//! Error types for codec sessions.

use std::io;

use thiserror::Error;

/// Errors that can occur while setting up or driving a codec session.
///
/// Streaming transfers themselves report failure through their boolean
/// return per the adapter contract; this type covers the setup chain and the
/// internal helpers behind that surface.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("no supported audio track found")]
    NoAudioTrack,

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("total stream length unknown")]
    UnknownLength,

    #[error("seek failed: {0}")]
    SeekFailed(String),

    #[error("engine error: {0}")]
    Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type for codec session operations.
pub type CodecResult<T> = Result<T, CodecError>;
