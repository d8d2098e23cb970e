// Copyright (c) Microsoft. All rights reserved.

/*!
 * Binary codec for MQTT 3.1.1 and 5.0 control packets.
 *
 * Every packet starts with a [`FixedHeader`] that names the packet type and the number of octets that follow it.
 * [`codec::decode_frame`] and [`codec::read_frame`] split exactly that many octets off a buffer or a stream,
 * and the version-specific modules [`v3`] and [`v5`] turn them into typed packets.
 * Encoding runs the other way: the body is sized with a [`ByteCounter`] first so the remaining length can be written up front.
 *
 * The [`ControlPacket`] trait ties both directions together for in-memory buffers, caller-owned slices and byte streams.
 *
 * Ref:
 * - <https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/mqtt-v3.1.1.html>
 * - <https://docs.oasis-open.org/mqtt/mqtt/v5.0/mqtt-v5.0.html>
 */

#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::default_trait_access,
    clippy::large_enum_variant,
    clippy::let_and_return,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::struct_excessive_bools,
    clippy::too_many_lines
)]

macro_rules! define_u8_code {
    (
        $(#[$meta:meta])*
        $ty:ident,
        $error_variant:ident,
        $($variant:ident = $value:expr ,)*
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        pub enum $ty {
            $($variant),*
        }

        impl std::convert::TryFrom<u8> for $ty {
            type Error = $crate::DecodeError;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                Ok(match code {
                    $($value => $ty::$variant ,)*
                    code => return Err($crate::DecodeError::$error_variant(code)),
                })
            }
        }

        impl From<$ty> for u8 {
            fn from(code: $ty) -> Self {
                match code {
                    $($ty::$variant => $value ,)*
                }
            }
        }
    };
}

pub mod buffer;
pub use buffer::{ByteBuf, ByteCounter, SliceBuf, Source, WriteBuf};

mod byte_str;
pub use byte_str::ByteStr;

pub mod codec;
pub use codec::{Connect, ControlPacket};

mod config;
pub use config::DecodeOptions;

mod error;
pub use error::{reason_code_of, DecodeError, EncodeError, PacketError};

pub mod fixed_header;
pub use fixed_header::{FixedHeader, FixedHeaderError, PacketType};

mod reason_code;
pub use reason_code::ReasonCode;

pub mod topic;

pub mod utf8;

pub mod v3;

pub mod v5;

pub mod varint;

const PROTOCOL_NAME: &[u8] = b"MQTT";

define_u8_code! {
    /// The protocol level sent in CONNECT.
    ///
    /// Ref:
    /// - 3.1.1: 3.1.2.2 Protocol Level
    /// - 5.0:   3.1.2.2 Protocol Version
    #[allow(non_camel_case_types)]
    ProtocolVersion,
    UnrecognizedProtocolVersion,
    V3_1_1 = 0x04,
    V5 = 0x05,
}

#[allow(clippy::doc_markdown)] // clippy thinks "ClientId" is a Rust ident and should be in backticks.
/// The client ID
///
/// Ref:
/// - 3.1.1:
///   - 3.1.3.1 Client Identifier
///   - 3.1.2.4 Clean Session
/// - 5.0:
///   - 3.1.3.1 Client Identifier (ClientID)
///   - 3.1.2.4 Clean Start
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClientId {
    ServerGenerated,
    IdWithCleanSession(ByteStr),
    IdWithExistingSession(ByteStr),
}

/// A packet identifier. Two-byte unsigned integer that cannot be zero.
///
/// Ref:
/// - 3.1.1: 2.3.1 Packet Identifier
/// - 5.0:   2.2.1 Packet Identifier
#[derive(Clone, Copy, Debug, Eq, Ord, Hash, PartialEq, PartialOrd)]
pub struct PacketIdentifier(u16);

impl PacketIdentifier {
    /// Returns the largest value that is a valid packet identifier.
    pub const fn max_value() -> Self {
        PacketIdentifier(u16::MAX)
    }

    /// Convert the given raw packet identifier into this type.
    pub fn new(raw: u16) -> Option<Self> {
        match raw {
            0 => None,
            raw => Some(PacketIdentifier(raw)),
        }
    }

    /// Get the raw packet identifier.
    pub fn get(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for PacketIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::ops::Add<u16> for PacketIdentifier {
    type Output = Self;

    fn add(self, other: u16) -> Self::Output {
        PacketIdentifier(match self.0.wrapping_add(other) {
            0 => 1,
            value => value,
        })
    }
}

impl std::ops::AddAssign<u16> for PacketIdentifier {
    fn add_assign(&mut self, other: u16) {
        *self = *self + other;
    }
}

define_u8_code! {
    /// The level of reliability for a publication
    ///
    /// Ref:
    /// - 3.1.1: 4.3 Quality of Service levels and protocol flows
    /// - 5.0:   4.3 Quality of Service levels and protocol flows
    QoS,
    UnrecognizedQoS,
    AtMostOnce = 0x00,
    AtLeastOnce = 0x01,
    ExactlyOnce = 0x02,
}

/// The QoS of a PUBLISH, together with the packet identifier and DUP flag that only QoS 1 and 2 carry.
///
/// Ref:
/// - 3.1.1: 3.3.1 Fixed header, 3.3.2.2 Packet Identifier
/// - 5.0:   3.3.1 PUBLISH Fixed Header, 3.3.2.2 Packet Identifier
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PacketIdentifierDupQoS {
    AtMostOnce,
    AtLeastOnce(PacketIdentifier, bool),
    ExactlyOnce(PacketIdentifier, bool),
}

impl PacketIdentifierDupQoS {
    pub fn qos(self) -> QoS {
        match self {
            PacketIdentifierDupQoS::AtMostOnce => QoS::AtMostOnce,
            PacketIdentifierDupQoS::AtLeastOnce(_, _) => QoS::AtLeastOnce,
            PacketIdentifierDupQoS::ExactlyOnce(_, _) => QoS::ExactlyOnce,
        }
    }

    pub fn packet_identifier(self) -> Option<PacketIdentifier> {
        match self {
            PacketIdentifierDupQoS::AtMostOnce => None,
            PacketIdentifierDupQoS::AtLeastOnce(id, _)
            | PacketIdentifierDupQoS::ExactlyOnce(id, _) => Some(id),
        }
    }

    pub fn dup(self) -> bool {
        match self {
            PacketIdentifierDupQoS::AtMostOnce => false,
            PacketIdentifierDupQoS::AtLeastOnce(_, dup)
            | PacketIdentifierDupQoS::ExactlyOnce(_, dup) => dup,
        }
    }

    /// The flags nibble of a PUBLISH fixed header.
    pub(crate) fn flags(self, retain: bool) -> u8 {
        let flags = match self {
            PacketIdentifierDupQoS::AtMostOnce => 0x00,
            PacketIdentifierDupQoS::AtLeastOnce(_, true) => 0x0A,
            PacketIdentifierDupQoS::AtLeastOnce(_, false) => 0x02,
            PacketIdentifierDupQoS::ExactlyOnce(_, true) => 0x0C,
            PacketIdentifierDupQoS::ExactlyOnce(_, false) => 0x04,
        };
        if retain {
            flags | 0x01
        } else {
            flags
        }
    }

    pub(crate) fn decode(header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        match header.qos() {
            QoS::AtMostOnce if header.dup() => Err(DecodeError::PublishDupAtMostOnce),
            QoS::AtMostOnce => Ok(PacketIdentifierDupQoS::AtMostOnce),
            QoS::AtLeastOnce => Ok(PacketIdentifierDupQoS::AtLeastOnce(
                src.try_get_packet_identifier()?,
                header.dup(),
            )),
            QoS::ExactlyOnce => Ok(PacketIdentifierDupQoS::ExactlyOnce(
                src.try_get_packet_identifier()?,
                header.dup(),
            )),
        }
    }

    pub(crate) fn encode<B>(self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        match self.packet_identifier() {
            Some(packet_identifier) => dst.try_put_packet_identifier(packet_identifier),
            None => Ok(()),
        }
    }
}

/// Metadata about a packet
trait PacketMeta: Sized {
    /// The packet type for this kind of packet
    const PACKET_TYPE: PacketType;

    /// Decodes this packet from the given body. `src` holds exactly the octets covered by the header's remaining length.
    fn decode(header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError>;

    /// Encodes the variable header and payload corresponding to this packet into the given buffer.
    /// The fixed header is written separately by [`codec::encode_packet`].
    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf;

    /// The flags nibble of the fixed header. Only PUBLISH varies it.
    fn flags(&self) -> u8 {
        Self::PACKET_TYPE.expected_flags().unwrap_or_default()
    }
}
