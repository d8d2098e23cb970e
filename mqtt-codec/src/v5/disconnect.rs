// Copyright (c) Microsoft. All rights reserved.

use super::{Properties, PropertyId};
use crate::{
    ByteBuf, DecodeError, EncodeError, FixedHeader, PacketMeta, PacketType, ReasonCode, Source,
};

const DISCONNECT_PROPERTIES: &[PropertyId] = &[
    PropertyId::SessionExpiryInterval,
    PropertyId::ReasonString,
    PropertyId::UserProperty,
    PropertyId::ServerReference,
];

/// Ref: 3.14 DISCONNECT – Disconnect notification
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Disconnect {
    pub reason_code: ReasonCode,
    pub properties: Properties,
}

impl Default for Disconnect {
    /// Normal disconnection, without properties.
    fn default() -> Self {
        Disconnect {
            reason_code: ReasonCode::NORMAL_DISCONNECTION,
            properties: Properties::new(),
        }
    }
}

impl PacketMeta for Disconnect {
    const PACKET_TYPE: PacketType = PacketType::Disconnect;

    fn decode(header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        // A remaining length of 0 is a normal disconnection, 1 carries only the reason code.
        let (reason_code, properties) = match header.remaining_length() {
            0 => (ReasonCode::NORMAL_DISCONNECTION, Properties::new()),
            1 => (
                ReasonCode::decode_for(Self::PACKET_TYPE, src)?,
                Properties::new(),
            ),
            _ => (
                ReasonCode::decode_for(Self::PACKET_TYPE, src)?,
                Properties::decode(src, DISCONNECT_PROPERTIES)?,
            ),
        };

        Ok(Disconnect {
            reason_code,
            properties,
        })
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        if self.reason_code == ReasonCode::NORMAL_DISCONNECTION && self.properties.is_empty() {
            return Ok(());
        }

        self.reason_code.encode_for(Self::PACKET_TYPE, dst)?;

        if !self.properties.is_empty() {
            self.properties.encode(DISCONNECT_PROPERTIES, dst)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v5::tests::{decode_v5, roundtrip};
    use crate::v5::{Packet, PropertyValue};

    #[test]
    fn normal_disconnection_is_empty() {
        assert_eq!(roundtrip(&Packet::Disconnect(Disconnect::default())), &b"\xE0\x00"[..]);
        assert_eq!(
            decode_v5(b"\xE0\x00").unwrap(),
            Packet::Disconnect(Disconnect::default())
        );
        assert_eq!(
            decode_v5(b"\xE0\x01\x00").unwrap(),
            Packet::Disconnect(Disconnect::default())
        );
    }

    #[test]
    fn reason_code_and_properties() {
        let packet = Packet::Disconnect(Disconnect {
            reason_code: ReasonCode::SessionTakenOver,
            properties: Properties::new(),
        });
        assert_eq!(roundtrip(&packet), &b"\xE0\x01\x8E"[..]);

        let mut properties = Properties::new();
        properties
            .push(PropertyId::SessionExpiryInterval, PropertyValue::FourByteInteger(0))
            .unwrap();
        let packet = Packet::Disconnect(Disconnect {
            reason_code: ReasonCode::DisconnectWithWillMessage,
            properties,
        });
        assert_eq!(
            roundtrip(&packet),
            &b"\xE0\x07\x04\x05\x11\x00\x00\x00\x00"[..]
        );
    }

    #[test]
    fn truncated_property_block() {
        assert!(matches!(
            decode_v5(b"\xE0\x02\x00\x03"),
            Err(DecodeError::IncompletePacket)
        ));
    }
}
