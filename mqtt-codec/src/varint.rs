// Copyright (c) Microsoft. All rights reserved.

//! Variable byte integers.
//!
//! These numbers are encoded with a variable-length scheme that uses the MSB of each byte as a continuation bit,
//! least significant group first. They carry the remaining length of every packet,
//! and in 5.0 also property lengths and subscription identifiers.
//!
//! Ref:
//! - 3.1.1: 2.2.3 Remaining Length
//! - 5.0:   1.5.5 Variable Byte Integer

use std::io::Read;

use crate::{ByteBuf, DecodeError, EncodeError};

/// The largest value that fits in four octets.
pub const MAX: usize = 0x0FFF_FFFF;

const MAX_LEN: usize = 4;

/// The number of octets `value` occupies on the wire, or 0 if it is too large to be encoded at all.
pub fn encoded_len(value: usize) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x001F_FFFF => 3,
        0x0020_0000..=MAX => 4,
        _ => 0,
    }
}

/// Decodes a variable byte integer from the front of `src`, advancing it past the consumed octets.
///
/// Longer-than-necessary encodings are accepted.
pub fn decode(src: &mut &[u8]) -> Result<usize, DecodeError> {
    let mut result = 0_usize;
    let mut num_bytes_read = 0_usize;

    loop {
        let (&encoded_byte, rest) = src.split_first().ok_or(DecodeError::IncompletePacket)?;
        *src = rest;

        result |= usize::from(encoded_byte & 0x7F) << (num_bytes_read * 7);
        num_bytes_read += 1;

        if encoded_byte & 0x80 == 0 {
            return Ok(result);
        }

        if num_bytes_read == MAX_LEN {
            return Err(DecodeError::MalformedVariableByteInteger);
        }
    }
}

/// Reads a variable byte integer from a stream one octet at a time.
///
/// Returns the value and the number of octets consumed. Never reads past the last octet of the integer.
pub fn read<R>(reader: &mut R) -> Result<(usize, usize), DecodeError>
where
    R: Read,
{
    let mut result = 0_usize;
    let mut num_bytes_read = 0_usize;

    loop {
        let mut encoded_byte = [0_u8; 1];
        reader.read_exact(&mut encoded_byte)?;
        let encoded_byte = encoded_byte[0];

        result |= usize::from(encoded_byte & 0x7F) << (num_bytes_read * 7);
        num_bytes_read += 1;

        if encoded_byte & 0x80 == 0 {
            return Ok((result, num_bytes_read));
        }

        if num_bytes_read == MAX_LEN {
            return Err(DecodeError::MalformedVariableByteInteger);
        }
    }
}

pub fn encode<B>(value: usize, dst: &mut B) -> Result<(), EncodeError>
where
    B: ByteBuf,
{
    if value > MAX {
        return Err(EncodeError::RemainingLengthTooHigh(value));
    }

    let mut item = value;
    loop {
        #[allow(clippy::cast_possible_truncation)]
        let mut encoded_byte = (item & 0x7F) as u8;

        item >>= 7;

        if item > 0 {
            encoded_byte |= 0x80;
        }

        dst.try_put_u8(encoded_byte)?;

        if item == 0 {
            return Ok(());
        }
    }
}
