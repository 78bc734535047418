use std::fmt;
use std::ops::Deref;

use crate::error::WireError;
use crate::wire::{MessageBuilder, MessageReader, Wire};

/// A UTF-8 string holding at most `N` bytes.
///
/// On the wire it is a `u16` byte length followed by the bytes, so a reader does not need the
/// writer's capacity. A reader built with a smaller capacity rejects the longer string rather
/// than resizing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoundedString<const N: usize> {
    value: String,
}

impl<const N: usize> BoundedString<N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_new(value: impl Into<String>) -> Result<Self, WireError> {
        let value = value.into();
        if value.len() > N {
            return Err(WireError::StringTooLong {
                len: value.len(),
                capacity: N,
            });
        }
        Ok(Self { value })
    }

    /// Keeps the longest prefix of `value` that fits and ends on a character boundary.
    pub fn truncated(value: &str) -> Self {
        let mut end = value.len().min(N);
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        Self {
            value: value[..end].to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl<const N: usize> Deref for BoundedString<N> {
    type Target = str;

    fn deref(&self) -> &str {
        &self.value
    }
}

impl<const N: usize> AsRef<str> for BoundedString<N> {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl<const N: usize> fmt::Display for BoundedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl<const N: usize> TryFrom<&str> for BoundedString<N> {
    type Error = WireError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl<const N: usize> TryFrom<String> for BoundedString<N> {
    type Error = WireError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl<const N: usize> PartialEq<str> for BoundedString<N> {
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl<const N: usize> PartialEq<&str> for BoundedString<N> {
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

impl<const N: usize> Wire for BoundedString<N> {
    fn append(&self, out: &mut MessageBuilder) -> Result<(), WireError> {
        let len = u16::try_from(self.value.len()).map_err(|_| WireError::StringTooLong {
            len: self.value.len(),
            capacity: usize::from(u16::MAX),
        })?;
        out.put_u16(len);
        out.put_bytes(self.value.as_bytes());
        Ok(())
    }

    fn read(&mut self, input: &mut MessageReader<'_>) -> Result<usize, WireError> {
        let len = usize::from(input.get_u16()?);
        if len > N {
            return Err(WireError::StringTooLong { len, capacity: N });
        }
        let bytes = input.take(len)?;
        let s = std::str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)?;
        self.value.clear();
        self.value.push_str(s);
        Ok(2 + len)
    }
}
