// Copyright (c) Microsoft. All rights reserved.

use bytes::Bytes;

use crate::{utf8, ByteBuf, DecodeError, EncodeError, Source};

/// Strings are prefixed with a two-byte big-endian length and are encoded as utf-8.
///
/// A `ByteStr` always holds valid MQTT UTF-8 of at most 65535 bytes.
///
/// Ref: 1.5.3 UTF-8 encoded strings
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ByteStr(Bytes);

impl ByteStr {
    pub const MAX_LEN: usize = 65_535;

    pub fn new(s: impl Into<String>) -> Result<Self, EncodeError> {
        let s = s.into();
        if s.len() > Self::MAX_LEN {
            return Err(EncodeError::StringTooLarge(s.len()));
        }

        let _ = utf8::validate(s.as_bytes())?;
        Ok(ByteStr(Bytes::from(s)))
    }

    pub fn as_str(&self) -> &str {
        // Validated on construction
        unsafe { std::str::from_utf8_unchecked(&self.0) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Size on the wire, length prefix included.
    pub(crate) fn encoded_len(&self) -> usize {
        std::mem::size_of::<u16>() + self.0.len()
    }

    pub(crate) fn decode(src: &mut Source) -> Result<Self, DecodeError> {
        let bytes = src.try_get_binary()?;
        let _ = utf8::validate_with(&bytes, src.options().strict_utf8)?;
        Ok(ByteStr(bytes))
    }

    pub(crate) fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        dst.try_put_binary(&self.0)
    }
}

impl AsRef<str> for ByteStr {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::ops::Deref for ByteStr {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl std::fmt::Debug for ByteStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

impl std::fmt::Display for ByteStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

impl PartialEq<str> for ByteStr {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<'a> PartialEq<&'a str> for ByteStr {
    fn eq(&self, other: &&'a str) -> bool {
        self.as_str() == *other
    }
}

impl std::convert::TryFrom<&str> for ByteStr {
    type Error = EncodeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        ByteStr::new(s)
    }
}

impl std::convert::TryFrom<String> for ByteStr {
    type Error = EncodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ByteStr::new(s)
    }
}
