// Copyright (c) Microsoft. All rights reserved.

//! Byte sinks for encoding and the byte source for decoding.

use std::io::Write;

use bytes::{Buf, Bytes, BytesMut};

use crate::{varint, ByteStr, DecodeError, DecodeOptions, EncodeError, PacketIdentifier};

/// A sink that encoders write into.
///
/// Fallible so that fixed-capacity sinks can report [`EncodeError::InsufficientBuffer`] instead of panicking.
pub trait ByteBuf {
    fn try_put_u8(&mut self, n: u8) -> Result<(), EncodeError> {
        self.try_put_slice(&n.to_be_bytes())
    }

    fn try_put_u16_be(&mut self, n: u16) -> Result<(), EncodeError> {
        self.try_put_slice(&n.to_be_bytes())
    }

    fn try_put_u32_be(&mut self, n: u32) -> Result<(), EncodeError> {
        self.try_put_slice(&n.to_be_bytes())
    }

    fn try_put_packet_identifier(
        &mut self,
        packet_identifier: PacketIdentifier,
    ) -> Result<(), EncodeError> {
        self.try_put_u16_be(packet_identifier.get())
    }

    /// Binary data: a two-byte big-endian length followed by the bytes.
    ///
    /// Ref: 5.0: 1.5.6 Binary Data
    fn try_put_binary(&mut self, src: &[u8]) -> Result<(), EncodeError> {
        let len: u16 = src
            .len()
            .try_into()
            .map_err(|_| EncodeError::BinaryTooLarge(src.len()))?;
        self.try_put_u16_be(len)?;
        self.try_put_slice(src)
    }

    fn try_put_slice(&mut self, src: &[u8]) -> Result<(), EncodeError>;
}

/// Counts the bytes written to it. Used to size a packet body before its fixed header is written.
#[derive(Debug, Default)]
pub struct ByteCounter(usize);

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl ByteBuf for ByteCounter {
    fn try_put_slice(&mut self, src: &[u8]) -> Result<(), EncodeError> {
        self.0 += src.len();
        Ok(())
    }
}

/// Writes into a caller-owned slice, tracking how much of it has been filled.
#[derive(Debug)]
pub struct SliceBuf<'a> {
    buf: &'a mut [u8],
    filled: usize,
}

impl<'a> SliceBuf<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        SliceBuf { buf, filled: 0 }
    }

    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    pub fn filled_len(&self) -> usize {
        self.filled
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.filled
    }
}

impl ByteBuf for SliceBuf<'_> {
    fn try_put_slice(&mut self, src: &[u8]) -> Result<(), EncodeError> {
        let dst = self.buf[self.filled..]
            .get_mut(..src.len())
            .ok_or(EncodeError::InsufficientBuffer)?;
        dst.copy_from_slice(src);
        self.filled += src.len();
        Ok(())
    }
}

impl ByteBuf for BytesMut {
    fn try_put_slice(&mut self, src: &[u8]) -> Result<(), EncodeError> {
        self.extend_from_slice(src);
        Ok(())
    }
}

impl ByteBuf for Vec<u8> {
    fn try_put_slice(&mut self, src: &[u8]) -> Result<(), EncodeError> {
        self.extend_from_slice(src);
        Ok(())
    }
}

/// Writes straight through to a stream.
///
/// A failed write leaves the stream holding a partial packet. Use [`crate::ControlPacket::write_to`]
/// when that matters.
#[derive(Debug)]
pub struct WriteBuf<W> {
    inner: W,
    written: usize,
}

impl<W> WriteBuf<W>
where
    W: Write,
{
    pub fn new(inner: W) -> Self {
        WriteBuf { inner, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W> ByteBuf for WriteBuf<W>
where
    W: Write,
{
    fn try_put_slice(&mut self, src: &[u8]) -> Result<(), EncodeError> {
        self.inner.write_all(src)?;
        self.written += src.len();
        Ok(())
    }
}

/// The body of a single packet, consumed front to back by the packet decoders.
///
/// Every read is bounds-checked and reports [`DecodeError::IncompletePacket`] when the body runs out.
/// Strings, binary data and payloads are handed out as [`Bytes`] slices of the original buffer without copying.
#[derive(Clone, Debug)]
pub struct Source {
    bytes: Bytes,
    options: DecodeOptions,
}

impl Source {
    pub fn new(bytes: impl Into<Bytes>, options: DecodeOptions) -> Self {
        Source {
            bytes: bytes.into(),
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Retains the range n.. in self, and returns a new `Source` for the range 0..n
    pub(crate) fn split_to(&mut self, n: usize) -> Result<Source, DecodeError> {
        Ok(Source {
            bytes: self.try_get_bytes(n)?,
            options: self.options,
        })
    }

    pub(crate) fn try_get_bytes(&mut self, n: usize) -> Result<Bytes, DecodeError> {
        if self.bytes.len() < n {
            return Err(DecodeError::IncompletePacket);
        }

        Ok(self.bytes.split_to(n))
    }

    /// Everything left in the body. Used for PUBLISH payloads, whose length is implied by the remaining length.
    pub(crate) fn take_remaining(&mut self) -> Bytes {
        self.bytes.split_to(self.bytes.len())
    }

    pub(crate) fn try_get_u8(&mut self) -> Result<u8, DecodeError> {
        if self.bytes.is_empty() {
            return Err(DecodeError::IncompletePacket);
        }

        Ok(self.bytes.get_u8())
    }

    pub(crate) fn try_get_u16_be(&mut self) -> Result<u16, DecodeError> {
        if self.bytes.len() < std::mem::size_of::<u16>() {
            return Err(DecodeError::IncompletePacket);
        }

        Ok(self.bytes.get_u16())
    }

    pub(crate) fn try_get_u32_be(&mut self) -> Result<u32, DecodeError> {
        if self.bytes.len() < std::mem::size_of::<u32>() {
            return Err(DecodeError::IncompletePacket);
        }

        Ok(self.bytes.get_u32())
    }

    pub(crate) fn try_get_packet_identifier(&mut self) -> Result<PacketIdentifier, DecodeError> {
        let n = self.try_get_u16_be()?;
        PacketIdentifier::new(n).ok_or(DecodeError::ZeroPacketIdentifier)
    }

    pub(crate) fn try_get_varint(&mut self) -> Result<usize, DecodeError> {
        let mut src = &self.bytes[..];
        let value = varint::decode(&mut src)?;
        let consumed = self.bytes.len() - src.len();
        self.bytes.advance(consumed);
        Ok(value)
    }

    pub(crate) fn try_get_binary(&mut self) -> Result<Bytes, DecodeError> {
        let len = self.try_get_u16_be()?;
        self.try_get_bytes(len.into())
    }

    pub(crate) fn try_get_str(&mut self) -> Result<ByteStr, DecodeError> {
        ByteStr::decode(self)
    }
}
