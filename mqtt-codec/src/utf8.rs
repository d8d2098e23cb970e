// Copyright (c) Microsoft. All rights reserved.

//! The extra restrictions MQTT places on UTF-8 encoded strings.
//!
//! Ref:
//! - 3.1.1: 1.5.3 UTF-8 encoded strings
//! - 5.0:   1.5.4 UTF-8 Encoded String

use crate::ReasonCode;

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Utf8Error {
    #[error("string is not well-formed UTF-8 after byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },
    #[error("string contains a null character at byte {index}")]
    NullCharacter { index: usize },
    #[error("string contains the surrogate U+{code_point:04X} at byte {index}")]
    SurrogateCodePoint { code_point: u32, index: usize },
    #[error("string contains the non-character U+{code_point:04X} at byte {index}")]
    NonCharacter { code_point: u32, index: usize },
    #[error("string contains the control character U+{code_point:04X} at byte {index}")]
    ControlCharacter { code_point: u32, index: usize },
}

impl Utf8Error {
    pub fn reason_code(self) -> ReasonCode {
        ReasonCode::MalformedPacket
    }
}

/// Checks `bytes` against the rules every MQTT string must follow.
pub fn validate(bytes: &[u8]) -> Result<&str, Utf8Error> {
    validate_with(bytes, false)
}

/// Like [`validate`], but also rejects control characters other than tab, LF and CR.
pub fn validate_strict(bytes: &[u8]) -> Result<&str, Utf8Error> {
    validate_with(bytes, true)
}

/// Reports the first violation in `bytes`, in byte order.
pub fn validate_with(bytes: &[u8], strict: bool) -> Result<&str, Utf8Error> {
    match std::str::from_utf8(bytes) {
        Ok(s) => {
            check_chars(s, strict)?;
            Ok(s)
        }

        Err(err) => {
            let (valid, rest) = bytes.split_at(err.valid_up_to());
            if let Ok(valid) = std::str::from_utf8(valid) {
                check_chars(valid, strict)?;
            }

            let index = valid.len();
            Err(match encoded_surrogate(rest) {
                Some(code_point) => Utf8Error::SurrogateCodePoint { code_point, index },
                None => Utf8Error::InvalidUtf8 { valid_up_to: index },
            })
        }
    }
}

fn check_chars(s: &str, strict: bool) -> Result<(), Utf8Error> {
    for (index, c) in s.char_indices() {
        let code_point = u32::from(c);

        if c == '\0' {
            return Err(Utf8Error::NullCharacter { index });
        }

        if is_non_character(code_point) {
            return Err(Utf8Error::NonCharacter { code_point, index });
        }

        if strict && is_disallowed_control(c) {
            return Err(Utf8Error::ControlCharacter { code_point, index });
        }
    }

    Ok(())
}

/// U+FDD0..=U+FDEF and the last two code points of every plane, except U+10FFFF.
fn is_non_character(code_point: u32) -> bool {
    (0xFDD0..=0xFDEF).contains(&code_point)
        || ((code_point & 0xFFFE) == 0xFFFE && code_point != 0x0010_FFFF)
}

fn is_disallowed_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r')
}

/// `str::from_utf8` rejects encoded surrogates as ill-formed, so recognize the three-byte pattern here
/// to report them as such.
fn encoded_surrogate(bytes: &[u8]) -> Option<u32> {
    match *bytes {
        [0xED, second @ 0xA0..=0xBF, third @ 0x80..=0xBF, ..] => {
            Some(0xD000 | (u32::from(second & 0x3F) << 6) | u32::from(third & 0x3F))
        }
        _ => None,
    }
}
