// Copyright (c) Microsoft. All rights reserved.

use super::{Properties, PropertyId};
use crate::{
    ByteBuf, DecodeError, EncodeError, FixedHeader, PacketIdentifier, PacketMeta, PacketType,
    ReasonCode, Source,
};

const UNSUBACK_PROPERTIES: &[PropertyId] = &[PropertyId::ReasonString, PropertyId::UserProperty];

/// Ref: 3.11 UNSUBACK – Unsubscribe acknowledgement
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnsubAck {
    pub packet_identifier: PacketIdentifier,
    pub properties: Properties,
    pub reason_codes: Vec<ReasonCode>,
}

impl PacketMeta for UnsubAck {
    const PACKET_TYPE: PacketType = PacketType::UnsubAck;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let packet_identifier = src.try_get_packet_identifier()?;

        let properties = Properties::decode(src, UNSUBACK_PROPERTIES)?;

        let mut reason_codes = Vec::with_capacity(src.len());
        while !src.is_empty() {
            reason_codes.push(ReasonCode::decode_for(Self::PACKET_TYPE, src)?);
        }

        if reason_codes.is_empty() {
            return Err(DecodeError::NoTopics);
        }

        Ok(UnsubAck {
            packet_identifier,
            properties,
            reason_codes,
        })
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        if self.reason_codes.is_empty() {
            return Err(EncodeError::NoTopics);
        }

        dst.try_put_packet_identifier(self.packet_identifier)?;

        self.properties.encode(UNSUBACK_PROPERTIES, dst)?;

        for reason_code in &self.reason_codes {
            reason_code.encode_for(Self::PACKET_TYPE, dst)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v5::tests::{decode_v5, roundtrip};
    use crate::v5::Packet;
    use crate::ControlPacket;

    #[test]
    fn unsuback() {
        let packet = Packet::UnsubAck(UnsubAck {
            packet_identifier: PacketIdentifier::new(3).unwrap(),
            properties: Properties::new(),
            reason_codes: vec![ReasonCode::Success, ReasonCode::NoSubscriptionExisted],
        });
        assert_eq!(roundtrip(&packet), &b"\xB0\x05\x00\x03\x00\x00\x11"[..]);
    }

    #[test]
    fn no_reason_codes() {
        assert!(matches!(decode_v5(b"\xB0\x03\x00\x03\x00"), Err(DecodeError::NoTopics)));

        let packet = Packet::UnsubAck(UnsubAck {
            packet_identifier: PacketIdentifier::new(3).unwrap(),
            properties: Properties::new(),
            reason_codes: vec![],
        });
        assert!(matches!(packet.to_bytes(), Err(EncodeError::NoTopics)));
    }
}
