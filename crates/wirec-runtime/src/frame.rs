use std::fmt;

use log::{trace, warn};

use crate::error::{DispatchError, WireError};
use crate::transport::Transport;
use crate::wire::{MessageBuilder, MessageReader, Wire};

/// Identity of the peer a server-side frame arrived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u32);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// Splits a frame into its opcode byte and payload.
pub fn split_frame(frame: &[u8]) -> Result<(u8, &[u8]), DispatchError> {
    frame
        .split_first()
        .map(|(opcode, payload)| (*opcode, payload))
        .ok_or(DispatchError::EmptyFrame)
}

pub fn encode_frame<M: Wire>(opcode: u8, message: &M) -> Result<MessageBuilder, WireError> {
    let mut out = MessageBuilder::with_opcode(opcode);
    message.append(&mut out)?;
    Ok(out)
}

/// Appends `opcode` and `message` into one frame and hands it to `peer` without waiting.
pub fn send_frame<T, M>(peer: &mut T, opcode: u8, message: &M) -> Result<(), DispatchError>
where
    T: Transport + ?Sized,
    M: Wire,
{
    let out = encode_frame(opcode, message)?;
    trace!("send opcode={opcode:#04x} len={}", out.len());
    peer.send(out.as_bytes())?;
    Ok(())
}

/// Encodes one frame and sends it to every peer, skipping (and logging) peers that fail.
///
/// Returns the number of peers that accepted the frame. Only an encoding failure is an error.
pub fn broadcast_frame<'a, T, M, I>(peers: I, opcode: u8, message: &M) -> Result<usize, WireError>
where
    T: Transport + ?Sized + 'a,
    M: Wire,
    I: IntoIterator<Item = &'a mut T>,
{
    let out = encode_frame(opcode, message)?;
    let mut accepted = 0;
    for peer in peers {
        match peer.send(out.as_bytes()) {
            Ok(()) => accepted += 1,
            Err(err) => warn!("broadcast opcode={opcode:#04x} skipped a peer: {err}"),
        }
    }
    Ok(accepted)
}

/// Decodes a whole payload; bytes left over after the message are an error.
pub fn read_payload<M: Wire>(opcode: u8, payload: &[u8]) -> Result<M, DispatchError> {
    let mut input = MessageReader::new(payload);
    let mut message = M::default();
    message.read(&mut input)?;
    if !input.is_empty() {
        return Err(DispatchError::TrailingBytes {
            opcode,
            extra: input.remaining(),
        });
    }
    Ok(message)
}

/// Feeds every frame currently available on `peer` to `dispatch`.
///
/// Frame-level failures are logged and the frame is dropped; a transport failure ends the loop.
/// Returns the number of frames dispatched successfully.
pub fn serve<T, F>(peer: &mut T, mut dispatch: F) -> Result<usize, DispatchError>
where
    T: Transport + ?Sized,
    F: FnMut(&mut T, &[u8]) -> Result<(), DispatchError>,
{
    let mut handled = 0;
    while let Some(frame) = peer.receive()? {
        match dispatch(&mut *peer, &frame) {
            Ok(()) => handled += 1,
            Err(err) if err.is_recoverable() => {
                warn!("dropping frame of {} bytes: {err}", frame.len());
            }
            Err(err) => return Err(err),
        }
    }
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;

    #[test]
    fn split_frame_rejects_empty_input() {
        assert!(matches!(split_frame(&[]), Err(DispatchError::EmptyFrame)));
        let (opcode, payload) = split_frame(&[3, 1, 2]).expect("split");
        assert_eq!(opcode, 3);
        assert_eq!(payload, &[1, 2]);
    }

    #[test]
    fn send_frame_prefixes_opcode() {
        let (mut a, mut b) = MemoryTransport::pair();
        send_frame(&mut a, 0x81, &7u32).expect("send");
        assert_eq!(b.receive().expect("recv"), Some(vec![0x81, 0, 0, 0, 7]));
    }

    #[test]
    fn broadcast_skips_closed_peers() {
        let (a, mut a_far) = MemoryTransport::pair();
        let (b, b_far) = MemoryTransport::pair();
        b_far.close();
        let mut peers = vec![a, b];
        let accepted = broadcast_frame(peers.iter_mut(), 0x82, &1u8).expect("broadcast");
        assert_eq!(accepted, 1);
        assert_eq!(a_far.receive().expect("recv"), Some(vec![0x82, 1]));
    }

    #[test]
    fn read_payload_rejects_trailing_bytes() {
        let err = read_payload::<u8>(4, &[1, 2]).expect_err("trailing");
        assert!(matches!(
            err,
            DispatchError::TrailingBytes { opcode: 4, extra: 1 }
        ));
        assert_eq!(read_payload::<u8>(4, &[1]).expect("exact"), 1);
    }

    #[test]
    fn serve_drops_bad_frames_and_keeps_going() {
        let (mut a, mut b) = MemoryTransport::pair();
        a.send(&[1]).expect("send");
        a.send(&[]).expect("send");
        a.send(&[1]).expect("send");
        let handled = serve(&mut b, |_, frame| {
            let (opcode, _) = split_frame(frame)?;
            if opcode == 1 {
                Ok(())
            } else {
                Err(DispatchError::UnknownOpcode(opcode))
            }
        })
        .expect("serve");
        assert_eq!(handled, 2);
    }
}
