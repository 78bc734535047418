/// Errors raised while appending or reading a message payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("unexpected end of message: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    #[error("string of {len} bytes exceeds capacity {capacity}")]
    StringTooLong { len: usize, capacity: usize },

    #[error("list of {len} elements does not fit a 16-bit count")]
    ListTooLong { len: usize },

    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,

    #[error("frame of {len} bytes exceeds the transport limit")]
    FrameTooLarge { len: usize },

    #[error("transport i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by generated dispatchers and send stubs.
///
/// Everything except a transport failure concerns a single frame: the caller may drop that
/// frame and keep the connection.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("empty frame (missing opcode byte)")]
    EmptyFrame,

    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    #[error("opcode {opcode:#04x}: {extra} trailing bytes after payload")]
    TrailingBytes { opcode: u8, extra: usize },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl DispatchError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DispatchError::Transport(_))
    }
}
