use std::fmt;

/// Reasons a frame or message body was rejected.
#[derive(Debug)]
pub enum ProtocolError {
    /// Binary frame shorter than the 4-byte length prefix.
    MissingLengthPrefix { len: usize },
    /// Length prefix was negative.
    NegativeHeaderLength(i32),
    /// Length prefix points past the end of the buffer.
    HeaderOutOfBounds { header_len: usize, available: usize },
    /// Header text contains a code point that does not fit in one byte.
    NonLatin1Header(char),
    /// Header or text frame is not a valid `{type, content}` object.
    Json(serde_json::Error),
    /// Message content does not match what its type requires.
    InvalidContent { kind: String, reason: String },
    /// A message type that needs a binary payload arrived without one.
    MissingPayload(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::MissingLengthPrefix { len } => {
                write!(f, "binary frame of {} bytes has no length prefix", len)
            }
            ProtocolError::NegativeHeaderLength(len) => {
                write!(f, "negative header length {}", len)
            }
            ProtocolError::HeaderOutOfBounds { header_len, available } => write!(
                f,
                "header length {} exceeds the {} bytes left in the frame",
                header_len, available
            ),
            ProtocolError::NonLatin1Header(c) => {
                write!(f, "header character {:?} is outside Latin-1", c)
            }
            ProtocolError::Json(e) => write!(f, "message is not a valid JSON object: {}", e),
            ProtocolError::InvalidContent { kind, reason } => {
                write!(f, "invalid '{}' content: {}", kind, reason)
            }
            ProtocolError::MissingPayload(kind) => {
                write!(f, "'{}' message arrived without a payload", kind)
            }
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        ProtocolError::Json(e)
    }
}

/// Top-level error type for the viewer core.
///
/// None of these are fatal: the worst outcome of any of them is a
/// spectrogram that fails to update.
#[derive(Debug)]
pub enum ViewerError {
    /// Malformed or truncated frame; the frame is dropped.
    Protocol(ProtocolError),
    /// The renderer cannot hold the requested data; the load is aborted.
    Capability { required: usize, available: usize, what: &'static str },
    /// A load was requested without any input selected.
    Input(String),
    /// Reading input data failed.
    Io(std::io::Error),
}

impl fmt::Display for ViewerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::Protocol(e) => write!(f, "protocol error: {}", e),
            ViewerError::Capability { required, available, what } => write!(
                f,
                "spectrogram needs {} {} but the renderer supports only {}",
                required, what, available
            ),
            ViewerError::Input(msg) => write!(f, "input error: {}", msg),
            ViewerError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::Protocol(e) => Some(e),
            ViewerError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProtocolError> for ViewerError {
    fn from(e: ProtocolError) -> Self {
        ViewerError::Protocol(e)
    }
}

impl From<std::io::Error> for ViewerError {
    fn from(e: std::io::Error) -> Self {
        ViewerError::Io(e)
    }
}

/// Convenience alias so callers can write `Result<T>` instead of `Result<T, ViewerError>`.
pub type Result<T> = std::result::Result<T, ViewerError>;
