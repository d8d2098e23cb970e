// Copyright (c) Microsoft. All rights reserved.

//! The first one to five octets of every packet.
//!
//! Ref:
//! - 3.1.1: 2.2 Fixed header
//! - 5.0:   2.1 Structure of an MQTT Control Packet

use std::io::Read;

use crate::{varint, ByteBuf, DecodeError, EncodeError, ProtocolVersion, QoS, ReasonCode};

/// Ref:
/// - 3.1.1: 2.2.1 MQTT Control Packet type
/// - 5.0:   2.1.2 MQTT Control Packet type
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PacketType {
    Connect = 1,
    ConnAck = 2,
    Publish = 3,
    PubAck = 4,
    PubRec = 5,
    PubRel = 6,
    PubComp = 7,
    Subscribe = 8,
    SubAck = 9,
    Unsubscribe = 10,
    UnsubAck = 11,
    PingReq = 12,
    PingResp = 13,
    Disconnect = 14,
    Auth = 15,
}

impl PacketType {
    pub fn from_nibble(value: u8, version: ProtocolVersion) -> Result<Self, FixedHeaderError> {
        Ok(match value {
            0 => return Err(FixedHeaderError::ReservedPacketType),
            1 => PacketType::Connect,
            2 => PacketType::ConnAck,
            3 => PacketType::Publish,
            4 => PacketType::PubAck,
            5 => PacketType::PubRec,
            6 => PacketType::PubRel,
            7 => PacketType::PubComp,
            8 => PacketType::Subscribe,
            9 => PacketType::SubAck,
            10 => PacketType::Unsubscribe,
            11 => PacketType::UnsubAck,
            12 => PacketType::PingReq,
            13 => PacketType::PingResp,
            14 => PacketType::Disconnect,
            15 if version == ProtocolVersion::V5 => PacketType::Auth,
            packet_type => {
                return Err(FixedHeaderError::UnrecognizedPacketType {
                    packet_type,
                    version,
                })
            }
        })
    }

    pub fn nibble(self) -> u8 {
        self as u8
    }

    pub fn is_valid_for(self, version: ProtocolVersion) -> bool {
        self != PacketType::Auth || version == ProtocolVersion::V5
    }

    /// The only flags value this packet type may carry, or `None` for PUBLISH whose flags carry DUP, QoS and RETAIN.
    ///
    /// Ref:
    /// - 3.1.1: 2.2.2 Flags
    /// - 5.0:   2.1.3 Flags
    pub fn expected_flags(self) -> Option<u8> {
        match self {
            PacketType::Publish => None,
            PacketType::PubRel | PacketType::Subscribe | PacketType::Unsubscribe => Some(0b0010),
            _ => Some(0b0000),
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PacketType::Connect => "CONNECT",
            PacketType::ConnAck => "CONNACK",
            PacketType::Publish => "PUBLISH",
            PacketType::PubAck => "PUBACK",
            PacketType::PubRec => "PUBREC",
            PacketType::PubRel => "PUBREL",
            PacketType::PubComp => "PUBCOMP",
            PacketType::Subscribe => "SUBSCRIBE",
            PacketType::SubAck => "SUBACK",
            PacketType::Unsubscribe => "UNSUBSCRIBE",
            PacketType::UnsubAck => "UNSUBACK",
            PacketType::PingReq => "PINGREQ",
            PacketType::PingResp => "PINGRESP",
            PacketType::Disconnect => "DISCONNECT",
            PacketType::Auth => "AUTH",
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FixedHeaderError {
    #[error("packet type 0 is reserved")]
    ReservedPacketType,
    #[error("packet type {packet_type} is not defined for protocol version {version:?}")]
    UnrecognizedPacketType {
        packet_type: u8,
        version: ProtocolVersion,
    },
    #[error("invalid flags 0x{flags:X} for {packet_type}")]
    InvalidFlags { packet_type: PacketType, flags: u8 },
    #[error("PUBLISH has QoS bits set to {0}")]
    InvalidQoS(u8),
    #[error("remaining length {0} is too high to be encoded")]
    RemainingLengthTooHigh(usize),
}

impl FixedHeaderError {
    pub fn reason_code(self) -> ReasonCode {
        match self {
            FixedHeaderError::ReservedPacketType
            | FixedHeaderError::UnrecognizedPacketType { .. }
            | FixedHeaderError::InvalidFlags { .. } => ReasonCode::ProtocolError,
            FixedHeaderError::InvalidQoS(_) => ReasonCode::MalformedPacket,
            FixedHeaderError::RemainingLengthTooHigh(_) => ReasonCode::PacketTooLarge,
        }
    }
}

/// A decoded or about-to-be-encoded fixed header.
///
/// Only constructed through validation, so the type, flags and remaining length are always consistent with each other
/// and with the protocol version.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedHeader {
    version: ProtocolVersion,
    packet_type: PacketType,
    flags: u8,
    remaining_length: usize,
    dup: bool,
    qos: QoS,
    retain: bool,
}

impl FixedHeader {
    /// The most octets a fixed header can occupy.
    pub const MAX_LEN: usize = 5;

    pub fn new(
        packet_type: PacketType,
        flags: u8,
        remaining_length: usize,
        version: ProtocolVersion,
    ) -> Result<Self, FixedHeaderError> {
        if flags > 0x0F {
            return Err(FixedHeaderError::InvalidFlags { packet_type, flags });
        }

        if remaining_length > varint::MAX {
            return Err(FixedHeaderError::RemainingLengthTooHigh(remaining_length));
        }

        let mut header = Self::from_first_byte((packet_type.nibble() << 4) | flags, version)?;
        header.remaining_length = remaining_length;
        Ok(header)
    }

    /// Decodes a fixed header from the front of `src`, advancing it past the header.
    pub fn decode(src: &mut &[u8], version: ProtocolVersion) -> Result<Self, DecodeError> {
        let (&first_byte, rest) = src.split_first().ok_or(DecodeError::IncompletePacket)?;
        *src = rest;

        let mut header = Self::from_first_byte(first_byte, version)?;
        header.remaining_length = varint::decode(src)?;
        Ok(header)
    }

    /// Reads a fixed header from a stream without reading past it.
    ///
    /// Returns the header and the number of octets it occupied.
    pub fn read<R>(reader: &mut R, version: ProtocolVersion) -> Result<(Self, usize), DecodeError>
    where
        R: Read,
    {
        let mut first_byte = [0_u8; 1];
        reader.read_exact(&mut first_byte)?;

        let mut header = Self::from_first_byte(first_byte[0], version)?;
        let (remaining_length, len) = varint::read(reader)?;
        header.remaining_length = remaining_length;
        Ok((header, 1 + len))
    }

    /// Re-validates before writing, so a header the peer would reject is never emitted.
    pub fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        let header = Self::new(self.packet_type, self.flags, self.remaining_length, self.version)?;
        dst.try_put_u8(header.first_byte())?;
        varint::encode(header.remaining_length, dst)
    }

    /// Type and flags are validated before the remaining length is looked at.
    fn from_first_byte(first_byte: u8, version: ProtocolVersion) -> Result<Self, FixedHeaderError> {
        let packet_type = PacketType::from_nibble(first_byte >> 4, version)?;
        let flags = first_byte & 0x0F;

        let (dup, qos, retain) = match packet_type.expected_flags() {
            None => {
                let qos = match (flags & 0b0110) >> 1 {
                    0 => QoS::AtMostOnce,
                    1 => QoS::AtLeastOnce,
                    2 => QoS::ExactlyOnce,
                    qos => return Err(FixedHeaderError::InvalidQoS(qos)),
                };
                (flags & 0b1000 != 0, qos, flags & 0b0001 != 0)
            }

            Some(expected) if flags == expected => (false, QoS::AtMostOnce, false),

            Some(_) => return Err(FixedHeaderError::InvalidFlags { packet_type, flags }),
        };

        Ok(FixedHeader {
            version,
            packet_type,
            flags,
            remaining_length: 0,
            dup,
            qos,
            retain,
        })
    }

    pub fn first_byte(&self) -> u8 {
        (self.packet_type.nibble() << 4) | self.flags
    }

    /// Size on the wire.
    pub fn encoded_len(&self) -> usize {
        1 + varint::encoded_len(self.remaining_length)
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn packet_type(&self) -> PacketType {
        self.packet_type
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn remaining_length(&self) -> usize {
        self.remaining_length
    }

    /// PUBLISH only. Always `false` for other packet types.
    pub fn dup(&self) -> bool {
        self.dup
    }

    /// PUBLISH only. Always [`QoS::AtMostOnce`] for other packet types.
    pub fn qos(&self) -> QoS {
        self.qos
    }

    /// PUBLISH only. Always `false` for other packet types.
    pub fn retain(&self) -> bool {
        self.retain
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn decode_v5(bytes: &[u8]) -> Result<FixedHeader, DecodeError> {
        let mut src = bytes;
        FixedHeader::decode(&mut src, ProtocolVersion::V5)
    }

    #[test]
    fn decode_ok() {
        let header = decode_v5(&[0x30, 0x11]).unwrap();
        assert_eq!(header.packet_type(), PacketType::Publish);
        assert_eq!(header.remaining_length(), 0x11);
        assert_eq!(header.qos(), QoS::AtMostOnce);
        assert!(!header.dup() && !header.retain());
        assert_eq!(header.encoded_len(), 2);

        let header = decode_v5(&[0x3D, 0x80, 0x01]).unwrap();
        assert_eq!(header.qos(), QoS::ExactlyOnce);
        assert!(header.dup() && header.retain());
        assert_eq!(header.remaining_length(), 0x80);

        let header = decode_v5(&[0x82, 0x05]).unwrap();
        assert_eq!(header.packet_type(), PacketType::Subscribe);

        let header = decode_v5(&[0xF0, 0x00]).unwrap();
        assert_eq!(header.packet_type(), PacketType::Auth);
    }

    #[test]
    fn decode_rejects_reserved_type() {
        match decode_v5(&[0x00, 0x00]) {
            Err(DecodeError::InvalidFixedHeader(FixedHeaderError::ReservedPacketType)) => (),
            result => panic!("{:?}", result),
        }
    }

    #[test]
    fn decode_rejects_auth_in_v3() {
        let mut src = &[0xF0, 0x00][..];
        match FixedHeader::decode(&mut src, ProtocolVersion::V3_1_1) {
            Err(DecodeError::InvalidFixedHeader(FixedHeaderError::UnrecognizedPacketType {
                packet_type: 15,
                version: ProtocolVersion::V3_1_1,
            })) => (),
            result => panic!("{:?}", result),
        }
    }

    #[test]
    fn decode_rejects_wrong_flags() {
        // SUBSCRIBE must carry 0b0010
        let err = decode_v5(&[0x80, 0x05]).unwrap_err();
        match &err {
            DecodeError::InvalidFixedHeader(FixedHeaderError::InvalidFlags {
                packet_type: PacketType::Subscribe,
                flags: 0,
            }) => (),
            err => panic!("{:?}", err),
        }
        assert_eq!(err.reason_code(), ReasonCode::ProtocolError);

        for first_byte in &[0x61_u8, 0xA0, 0xC2, 0x28, 0xE8] {
            match decode_v5(&[*first_byte, 0x00]) {
                Err(DecodeError::InvalidFixedHeader(FixedHeaderError::InvalidFlags { .. })) => (),
                result => panic!("0x{:02X}: {:?}", first_byte, result),
            }
        }
    }

    #[test]
    fn decode_rejects_qos_3() {
        let err = decode_v5(&[0x36, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidFixedHeader(FixedHeaderError::InvalidQoS(3))
        ));
        assert_eq!(err.reason_code(), ReasonCode::MalformedPacket);
    }

    #[test]
    fn decode_rejects_malformed_remaining_length() {
        match decode_v5(&[0x10, 0x80, 0x80, 0x80, 0x80, 0x01]) {
            Err(DecodeError::MalformedVariableByteInteger) => (),
            result => panic!("{:?}", result),
        }
    }

    #[test]
    fn decode_incomplete() {
        assert!(matches!(decode_v5(&[]), Err(DecodeError::IncompletePacket)));
        assert!(matches!(decode_v5(&[0x30]), Err(DecodeError::IncompletePacket)));
        assert!(matches!(decode_v5(&[0x30, 0xFF]), Err(DecodeError::IncompletePacket)));
    }

    #[test]
    fn encode_validates() {
        let header = FixedHeader::new(PacketType::PubRel, 0b0010, 2, ProtocolVersion::V3_1_1).unwrap();
        let mut dst = vec![];
        header.encode(&mut dst).unwrap();
        assert_eq!(dst, [0x62_u8, 0x02]);

        assert_eq!(
            FixedHeader::new(PacketType::PubRel, 0, 2, ProtocolVersion::V5),
            Err(FixedHeaderError::InvalidFlags {
                packet_type: PacketType::PubRel,
                flags: 0
            })
        );
        assert_eq!(
            FixedHeader::new(PacketType::Auth, 0, 0, ProtocolVersion::V3_1_1),
            Err(FixedHeaderError::UnrecognizedPacketType {
                packet_type: 15,
                version: ProtocolVersion::V3_1_1
            })
        );
        assert_eq!(
            FixedHeader::new(PacketType::Publish, 0, varint::MAX + 1, ProtocolVersion::V5),
            Err(FixedHeaderError::RemainingLengthTooHigh(varint::MAX + 1))
        );
    }

    #[test]
    fn packet_type_display() {
        assert_eq!(PacketType::UnsubAck.to_string(), "UNSUBACK");
        assert_eq!(PacketType::Auth.nibble(), 15);
    }

    proptest! {
        #[test]
        fn stream_and_buffer_decode_agree(bytes in proptest::collection::vec(any::<u8>(), 0..8)) {
            let mut src = &bytes[..];
            let from_buffer = FixedHeader::decode(&mut src, ProtocolVersion::V5)
                .map(|header| (header, bytes.len() - src.len()));

            let mut reader = &bytes[..];
            let from_stream = FixedHeader::read(&mut reader, ProtocolVersion::V5);

            match (from_buffer, from_stream) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                (Err(a), Err(b)) => prop_assert_eq!(a.to_string(), b.to_string()),
                (a, b) => prop_assert!(false, "{:?} != {:?}", a, b),
            }
        }

        #[test]
        fn encode_then_decode(
            packet_type in 1_u8..=15,
            flags in 0_u8..=0x0F,
            remaining_length in 0..=varint::MAX,
        ) {
            let packet_type = PacketType::from_nibble(packet_type, ProtocolVersion::V5).unwrap();
            if let Ok(header) = FixedHeader::new(packet_type, flags, remaining_length, ProtocolVersion::V5) {
                let mut encoded = vec![];
                header.encode(&mut encoded).unwrap();
                prop_assert_eq!(encoded.len(), header.encoded_len());

                let mut src = &encoded[..];
                prop_assert_eq!(FixedHeader::decode(&mut src, ProtocolVersion::V5).unwrap(), header);
                prop_assert!(src.is_empty());
            }
        }
    }
}
