// Copyright (c) Microsoft. All rights reserved.

//! The four acknowledgements of the PUBLISH flows. They share a layout and differ only in their packet type.

use super::{Properties, PropertyId};
use crate::{
    ByteBuf, DecodeError, EncodeError, FixedHeader, PacketIdentifier, PacketMeta, PacketType,
    ReasonCode, Source,
};

const ACK_PROPERTIES: &[PropertyId] = &[PropertyId::ReasonString, PropertyId::UserProperty];

/// Remaining length of an ack that carries only its packet identifier. The reason code is then Success.
const PACKET_IDENTIFIER_ONLY: usize = 2;

/// Remaining length of an ack that carries a reason code but no property block.
const WITHOUT_PROPERTIES: usize = 3;

macro_rules! define_ack {
    (
        $(#[$meta:meta])*
        $ty:ident,
        $packet_type:expr,
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub struct $ty {
            pub packet_identifier: PacketIdentifier,
            pub reason_code: ReasonCode,
            pub properties: Properties,
        }

        impl $ty {
            /// A successful acknowledgement without properties.
            pub fn new(packet_identifier: PacketIdentifier) -> Self {
                $ty {
                    packet_identifier,
                    reason_code: ReasonCode::Success,
                    properties: Properties::new(),
                }
            }
        }

        impl PacketMeta for $ty {
            const PACKET_TYPE: PacketType = $packet_type;

            fn decode(header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
                let (packet_identifier, reason_code, properties) = decode_ack(header, src)?;
                Ok($ty {
                    packet_identifier,
                    reason_code,
                    properties,
                })
            }

            fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
            where
                B: ByteBuf,
            {
                encode_ack(
                    Self::PACKET_TYPE,
                    self.packet_identifier,
                    self.reason_code,
                    &self.properties,
                    dst,
                )
            }
        }
    };
}

define_ack! {
    /// Ref: 3.4 PUBACK – Publish acknowledgement
    PubAck,
    PacketType::PubAck,
}

define_ack! {
    /// Ref: 3.5 PUBREC – Publish received (QoS 2 delivery part 1)
    PubRec,
    PacketType::PubRec,
}

define_ack! {
    /// Ref: 3.6 PUBREL – Publish release (QoS 2 delivery part 2)
    PubRel,
    PacketType::PubRel,
}

define_ack! {
    /// Ref: 3.7 PUBCOMP – Publish complete (QoS 2 delivery part 3)
    PubComp,
    PacketType::PubComp,
}

fn decode_ack(
    header: &FixedHeader,
    src: &mut Source,
) -> Result<(PacketIdentifier, ReasonCode, Properties), DecodeError> {
    let packet_identifier = src.try_get_packet_identifier()?;

    let (reason_code, properties) = match header.remaining_length() {
        PACKET_IDENTIFIER_ONLY => (ReasonCode::Success, Properties::new()),
        WITHOUT_PROPERTIES => (
            ReasonCode::decode_for(header.packet_type(), src)?,
            Properties::new(),
        ),
        _ => (
            ReasonCode::decode_for(header.packet_type(), src)?,
            Properties::decode(src, ACK_PROPERTIES)?,
        ),
    };

    Ok((packet_identifier, reason_code, properties))
}

/// Writes the shortest form that preserves the reason code and properties.
fn encode_ack<B>(
    packet_type: PacketType,
    packet_identifier: PacketIdentifier,
    reason_code: ReasonCode,
    properties: &Properties,
    dst: &mut B,
) -> Result<(), EncodeError>
where
    B: ByteBuf,
{
    dst.try_put_packet_identifier(packet_identifier)?;

    if reason_code == ReasonCode::Success && properties.is_empty() {
        return Ok(());
    }

    reason_code.encode_for(packet_type, dst)?;

    if !properties.is_empty() {
        properties.encode(ACK_PROPERTIES, dst)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v5::tests::{decode_v5, roundtrip};
    use crate::v5::{Packet, PropertyValue};
    use crate::ByteStr;

    fn id(raw: u16) -> PacketIdentifier {
        PacketIdentifier::new(raw).unwrap()
    }

    #[test]
    fn success_without_properties_is_two_bytes() {
        assert_eq!(roundtrip(&Packet::PubAck(PubAck::new(id(5)))), &b"\x40\x02\x00\x05"[..]);
        assert_eq!(roundtrip(&Packet::PubRec(PubRec::new(id(5)))), &b"\x50\x02\x00\x05"[..]);
        assert_eq!(roundtrip(&Packet::PubRel(PubRel::new(id(5)))), &b"\x62\x02\x00\x05"[..]);
        assert_eq!(roundtrip(&Packet::PubComp(PubComp::new(id(5)))), &b"\x70\x02\x00\x05"[..]);
    }

    #[test]
    fn reason_code_without_properties() {
        let packet = Packet::PubRec(PubRec {
            packet_identifier: id(0x0102),
            reason_code: ReasonCode::NoMatchingSubscribers,
            properties: Properties::new(),
        });
        assert_eq!(roundtrip(&packet), &b"\x50\x03\x01\x02\x10"[..]);

        let packet = Packet::PubComp(PubComp {
            packet_identifier: id(9),
            reason_code: ReasonCode::PacketIdentifierNotFound,
            properties: Properties::new(),
        });
        assert_eq!(roundtrip(&packet), &b"\x70\x03\x00\x09\x92"[..]);
    }

    #[test]
    fn reason_code_and_properties() {
        let mut properties = Properties::new();
        properties
            .push(
                PropertyId::ReasonString,
                PropertyValue::Utf8String(ByteStr::new("quota").unwrap()),
            )
            .unwrap();

        let packet = Packet::PubAck(PubAck {
            packet_identifier: id(1),
            reason_code: ReasonCode::QuotaExceeded,
            properties,
        });
        assert_eq!(
            roundtrip(&packet),
            &b"\x40\x0C\x00\x01\x97\x08\x1F\x00\x05quota"[..]
        );

        // Success is still written out when properties follow it.
        let mut properties = Properties::new();
        properties
            .insert(crate::v5::Property::user_property(
                ByteStr::new("k").unwrap(),
                ByteStr::new("v").unwrap(),
            ))
            .unwrap();
        let packet = Packet::PubAck(PubAck {
            packet_identifier: id(1),
            reason_code: ReasonCode::Success,
            properties,
        });
        assert_eq!(
            roundtrip(&packet),
            &b"\x40\x0B\x00\x01\x00\x07\x26\x00\x01k\x00\x01v"[..]
        );
    }

    #[test]
    fn explicit_empty_property_block_is_accepted() {
        assert_eq!(
            decode_v5(b"\x40\x04\x00\x01\x00\x00").unwrap(),
            Packet::PubAck(PubAck::new(id(1)))
        );
    }

    #[test]
    fn reason_codes_are_not_checked_against_packet_type() {
        // Granted QoS 1 has no meaning in PUBACK but is passed through.
        assert_eq!(
            decode_v5(b"\x40\x03\x00\x01\x01").unwrap(),
            Packet::PubAck(PubAck {
                packet_identifier: id(1),
                reason_code: ReasonCode::GrantedQoS1,
                properties: Properties::new(),
            })
        );
    }

    #[test]
    fn truncated_and_invalid() {
        assert!(matches!(decode_v5(b"\x40\x01\x00"), Err(DecodeError::IncompletePacket)));
        assert!(matches!(
            decode_v5(b"\x40\x02\x00\x00"),
            Err(DecodeError::ZeroPacketIdentifier)
        ));
        assert!(matches!(
            decode_v5(b"\x40\x04\x00\x01\x00\x05"),
            Err(DecodeError::IncompletePacket)
        ));
        assert!(matches!(
            decode_v5(b"\x60\x02\x00\x01"),
            Err(DecodeError::InvalidFixedHeader(_))
        ));
    }

    #[test]
    fn property_not_allowed_in_ack() {
        // Content Type (0x03)
        assert!(matches!(
            decode_v5(b"\x40\x08\x00\x01\x00\x04\x03\x00\x01a"),
            Err(DecodeError::Property(crate::v5::PropertyError::NotAllowed(
                PropertyId::ContentType
            )))
        ));
    }
}
