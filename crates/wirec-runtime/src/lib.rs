//! Runtime support for code generated by `wirec`.
//!
//! Generated message records implement [`Wire`]; generated dispatchers and clients move frames
//! through a [`Transport`] and store inbound values in [`Mailbox`] slots. A frame is one opcode
//! byte followed by the payload, with no frame-level length; transports delimit frames.

mod error;
mod frame;
mod mailbox;
mod string;
mod transport;
mod wire;

pub use error::{DispatchError, TransportError, WireError};
pub use frame::{
    broadcast_frame, encode_frame, read_payload, send_frame, serve, split_frame, ClientId,
};
pub use mailbox::Mailbox;
pub use string::BoundedString;
pub use transport::{FramedStream, MemoryTransport, Transport, MAX_FRAME_LEN};
pub use wire::{decode, encode, MessageBuilder, MessageReader, Wire};
