//! The transport seam used by generated send stubs and dispatchers.
//!
//! A transport moves whole frames. Generated code never looks past the leading opcode byte of
//! a frame, so delimiting frames on the underlying channel is entirely the transport's job.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::TransportError;

pub trait Transport {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;

    /// Returns the next complete frame, or `None` when nothing is available yet.
    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).send(frame)
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).receive()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        (**self).send(frame)
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).receive()
    }
}

type Queue = Arc<Mutex<VecDeque<Vec<u8>>>>;

/// In-process loopback: frames sent on one end are received, in order, on the other.
#[derive(Debug)]
pub struct MemoryTransport {
    inbox: Queue,
    outbox: Queue,
    closed: Arc<AtomicBool>,
}

impl MemoryTransport {
    pub fn pair() -> (Self, Self) {
        let a: Queue = Arc::default();
        let b: Queue = Arc::default();
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                inbox: Arc::clone(&a),
                outbox: Arc::clone(&b),
                closed: Arc::clone(&closed),
            },
            Self {
                inbox: b,
                outbox: a,
                closed,
            },
        )
    }

    /// Closes both ends. Frames already queued can still be received.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Number of frames waiting to be received on this end.
    pub fn pending(&self) -> usize {
        self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(frame.to_vec());
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let next = self
            .inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(frame) => Ok(Some(frame)),
            None if self.closed.load(Ordering::SeqCst) => Err(TransportError::Closed),
            None => Ok(None),
        }
    }
}

/// Largest frame a [`FramedStream`] carries; the `u16` length prefix counts itself.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize - 2;

const PREFIX_LEN: usize = 2;
const READ_CHUNK: usize = 4096;

/// Frames over a byte stream with a big-endian `u16` length prefix that includes the two
/// prefix bytes.
///
/// `receive` returns `Ok(None)` when a non-blocking stream reports `WouldBlock`; on a blocking
/// stream it waits for the next complete frame.
#[derive(Debug)]
pub struct FramedStream<S> {
    stream: S,
    buf: Vec<u8>,
}

impl<S: Read + Write> FramedStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: Vec::new(),
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    fn take_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.buf.len() < PREFIX_LEN {
            return Ok(None);
        }
        let total = usize::from(u16::from_be_bytes([self.buf[0], self.buf[1]]));
        if total < PREFIX_LEN {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("frame length prefix {total} is shorter than the prefix itself"),
            )));
        }
        if self.buf.len() < total {
            return Ok(None);
        }
        let frame = self.buf[PREFIX_LEN..total].to_vec();
        self.buf.drain(..total);
        Ok(Some(frame))
    }
}

impl<S: Read + Write> Transport for FramedStream<S> {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if frame.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge { len: frame.len() });
        }
        let total = (frame.len() + PREFIX_LEN) as u16;
        self.stream.write_all(&total.to_be_bytes())?;
        self.stream.write_all(frame)?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(frame) = self.take_frame()? {
                return Ok(Some(frame));
            }
            match self.stream.read(&mut chunk) {
                Ok(0) if self.buf.is_empty() => return Err(TransportError::Closed),
                Ok(0) => {
                    return Err(TransportError::Io(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended inside a frame",
                    )))
                }
                Ok(n) => self.buf.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Byte pipe that yields at most `chunk` bytes per read and `WouldBlock` when drained.
    #[derive(Default)]
    struct Pipe {
        data: VecDeque<u8>,
        chunk: usize,
    }

    impl Read for Pipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() {
                return Err(io::ErrorKind::WouldBlock.into());
            }
            let n = buf.len().min(self.chunk).min(self.data.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.data.pop_front().unwrap_or_default();
            }
            Ok(n)
        }
    }

    impl Write for Pipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn memory_pair_is_fifo_in_both_directions() {
        let (mut a, mut b) = MemoryTransport::pair();
        a.send(&[1, 2]).expect("send");
        a.send(&[3]).expect("send");
        b.send(&[9]).expect("send");
        assert_eq!(b.pending(), 2);
        assert_eq!(b.receive().expect("recv"), Some(vec![1, 2]));
        assert_eq!(b.receive().expect("recv"), Some(vec![3]));
        assert_eq!(b.receive().expect("recv"), None);
        assert_eq!(a.receive().expect("recv"), Some(vec![9]));
    }

    #[test]
    fn closed_memory_pair_drains_then_reports_closed() {
        let (mut a, mut b) = MemoryTransport::pair();
        a.send(&[7]).expect("send");
        a.close();
        assert!(matches!(a.send(&[8]), Err(TransportError::Closed)));
        assert_eq!(b.receive().expect("recv"), Some(vec![7]));
        assert!(matches!(b.receive(), Err(TransportError::Closed)));
    }

    #[test]
    fn framed_stream_reassembles_split_frames() {
        let mut framed = FramedStream::new(Pipe {
            chunk: 3,
            ..Pipe::default()
        });
        framed.send(&[1, 0, 0, 0, 5]).expect("send");
        framed.send(&[2]).expect("send");
        assert_eq!(&framed.get_ref().data.iter().copied().collect::<Vec<_>>()[..2], &[0, 7]);

        assert_eq!(framed.receive().expect("recv"), Some(vec![1, 0, 0, 0, 5]));
        assert_eq!(framed.receive().expect("recv"), Some(vec![2]));
        assert_eq!(framed.receive().expect("recv"), None);
    }

    #[test]
    fn framed_stream_rejects_oversized_frames() {
        let mut framed = FramedStream::new(Pipe::default());
        let frame = vec![0u8; MAX_FRAME_LEN + 1];
        assert!(matches!(
            framed.send(&frame),
            Err(TransportError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn framed_stream_rejects_impossible_prefix() {
        let mut pipe = Pipe {
            chunk: 16,
            ..Pipe::default()
        };
        pipe.data.extend([0u8, 1, 9]);
        let mut framed = FramedStream::new(pipe);
        assert!(matches!(framed.receive(), Err(TransportError::Io(_))));
    }
}
