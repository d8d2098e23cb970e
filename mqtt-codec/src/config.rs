// Copyright (c) Microsoft. All rights reserved.

use crate::DecodeError;

/// Knobs that tighten decoding beyond what the protocol strictly requires.
///
/// The default decodes anything a conforming peer may send.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DecodeOptions {
    /// Also reject C0 and C1 control characters (other than tab, LF and CR) in strings.
    pub strict_utf8: bool,

    /// Reject packets whose total size, fixed header included, exceeds this many octets.
    /// Checked as soon as the fixed header is known, before the body is buffered.
    pub maximum_packet_size: Option<usize>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_strict_utf8(mut self, strict_utf8: bool) -> Self {
        self.strict_utf8 = strict_utf8;
        self
    }

    #[must_use]
    pub fn with_maximum_packet_size(mut self, maximum_packet_size: usize) -> Self {
        self.maximum_packet_size = Some(maximum_packet_size);
        self
    }

    pub(crate) fn check_packet_size(self, size: usize) -> Result<(), DecodeError> {
        match self.maximum_packet_size {
            Some(maximum) if size > maximum => {
                tracing::debug!(size, maximum, "rejecting oversized packet");
                Err(DecodeError::PacketTooLarge { size, maximum })
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packet_size_limit() {
        let options = DecodeOptions::new();
        options.check_packet_size(usize::MAX).unwrap();

        let options = DecodeOptions::new().with_maximum_packet_size(16);
        options.check_packet_size(16).unwrap();
        match options.check_packet_size(17) {
            Err(DecodeError::PacketTooLarge { size: 17, maximum: 16 }) => (),
            result => panic!("{:?}", result),
        }
    }
}
