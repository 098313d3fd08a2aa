use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModemError {
    #[error("Payload exceeds 255 bytes")]
    PayloadTooLong,

    #[error("Payload contains non-ASCII characters")]
    NonAsciiPayload,

    #[error("Bit value must be 0 or 1, got {0}")]
    InvalidBitValue(u8),

    #[error("Preamble and sync word not found")]
    SyncNotFound,

    #[error("Receive timed out")]
    Timeout,

    #[error("Audio source error: {0}")]
    AudioSource(String),
}

pub type Result<T> = std::result::Result<T, ModemError>;
