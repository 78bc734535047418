//! Primitive codecs shared by every generated message.
//!
//! All multi-byte integers travel big-endian. Lists carry a `u16` element count and strings a
//! `u16` byte length, so every `read` knows exactly where its payload ends without relying on
//! the end of the buffer.

use crate::error::WireError;

/// Growable output buffer that generated `append` routines write into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageBuilder {
    buf: Vec<u8>,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a frame whose first byte is `opcode`.
    pub fn with_opcode(opcode: u8) -> Self {
        let mut out = Self::new();
        out.put_u8(opcode);
        out
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a received payload.
#[derive(Debug, Clone)]
pub struct MessageReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MessageReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(WireError::UnexpectedEof {
                needed: n,
                remaining,
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_u16(&mut self) -> Result<u16, WireError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn get_u32(&mut self) -> Result<u32, WireError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// A value with a symmetric binary encoding.
///
/// `read` overwrites `self` and returns the number of bytes it consumed, which is always the
/// number of bytes `append` wrote for an equal value. Callers chain that count to locate
/// whatever follows in the buffer.
pub trait Wire: Default {
    fn append(&self, out: &mut MessageBuilder) -> Result<(), WireError>;

    fn read(&mut self, input: &mut MessageReader<'_>) -> Result<usize, WireError>;
}

impl Wire for u8 {
    fn append(&self, out: &mut MessageBuilder) -> Result<(), WireError> {
        out.put_u8(*self);
        Ok(())
    }

    fn read(&mut self, input: &mut MessageReader<'_>) -> Result<usize, WireError> {
        *self = input.get_u8()?;
        Ok(1)
    }
}

impl Wire for u16 {
    fn append(&self, out: &mut MessageBuilder) -> Result<(), WireError> {
        out.put_u16(*self);
        Ok(())
    }

    fn read(&mut self, input: &mut MessageReader<'_>) -> Result<usize, WireError> {
        *self = input.get_u16()?;
        Ok(2)
    }
}

impl Wire for u32 {
    fn append(&self, out: &mut MessageBuilder) -> Result<(), WireError> {
        out.put_u32(*self);
        Ok(())
    }

    fn read(&mut self, input: &mut MessageReader<'_>) -> Result<usize, WireError> {
        *self = input.get_u32()?;
        Ok(4)
    }
}

impl Wire for i32 {
    fn append(&self, out: &mut MessageBuilder) -> Result<(), WireError> {
        out.put_bytes(&self.to_be_bytes());
        Ok(())
    }

    fn read(&mut self, input: &mut MessageReader<'_>) -> Result<usize, WireError> {
        let b = input.take(4)?;
        *self = i32::from_be_bytes([b[0], b[1], b[2], b[3]]);
        Ok(4)
    }
}

impl Wire for bool {
    fn append(&self, out: &mut MessageBuilder) -> Result<(), WireError> {
        out.put_u8(u8::from(*self));
        Ok(())
    }

    fn read(&mut self, input: &mut MessageReader<'_>) -> Result<usize, WireError> {
        *self = input.get_u8()? != 0;
        Ok(1)
    }
}

impl<T: Wire> Wire for Vec<T> {
    fn append(&self, out: &mut MessageBuilder) -> Result<(), WireError> {
        let count =
            u16::try_from(self.len()).map_err(|_| WireError::ListTooLong { len: self.len() })?;
        out.put_u16(count);
        for item in self {
            item.append(out)?;
        }
        Ok(())
    }

    fn read(&mut self, input: &mut MessageReader<'_>) -> Result<usize, WireError> {
        let count = input.get_u16()?;
        let mut len = 2;
        self.clear();
        self.reserve(usize::from(count).min(input.remaining()));
        for _ in 0..count {
            let mut item = T::default();
            len += item.read(input)?;
            self.push(item);
        }
        Ok(len)
    }
}

pub fn encode<T: Wire>(value: &T) -> Result<Vec<u8>, WireError> {
    let mut out = MessageBuilder::new();
    value.append(&mut out)?;
    Ok(out.into_bytes())
}

/// Decodes one value from the front of `bytes`, returning it with the bytes consumed.
pub fn decode<T: Wire>(bytes: &[u8]) -> Result<(T, usize), WireError> {
    let mut input = MessageReader::new(bytes);
    let mut value = T::default();
    let len = value.read(&mut input)?;
    Ok((value, len))
}
