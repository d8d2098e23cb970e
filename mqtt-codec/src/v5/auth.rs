// Copyright (c) Microsoft. All rights reserved.

use super::{Properties, PropertyId};
use crate::{
    ByteBuf, DecodeError, EncodeError, FixedHeader, PacketMeta, PacketType, ReasonCode, Source,
};

const AUTH_PROPERTIES: &[PropertyId] = &[
    PropertyId::AuthenticationMethod,
    PropertyId::AuthenticationData,
    PropertyId::ReasonString,
    PropertyId::UserProperty,
];

/// Ref: 3.15 AUTH – Authentication exchange
///
/// The reason code is one of Success, Continue Authentication and Re-authenticate.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Auth {
    pub reason_code: ReasonCode,
    pub properties: Properties,
}

impl PacketMeta for Auth {
    const PACKET_TYPE: PacketType = PacketType::Auth;

    fn decode(header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let (reason_code, properties) = match header.remaining_length() {
            0 => return Err(DecodeError::EmptyAuth),
            1 => (
                ReasonCode::decode_for(Self::PACKET_TYPE, src)?,
                Properties::new(),
            ),
            _ => (
                ReasonCode::decode_for(Self::PACKET_TYPE, src)?,
                Properties::decode(src, AUTH_PROPERTIES)?,
            ),
        };

        Ok(Auth {
            reason_code,
            properties,
        })
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        self.reason_code.encode_for(Self::PACKET_TYPE, dst)?;

        if !self.properties.is_empty() {
            self.properties.encode(AUTH_PROPERTIES, dst)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::v5::tests::{decode_v5, roundtrip};
    use crate::v5::{Packet, PropertyValue};
    use crate::{ByteStr, ControlPacket};

    #[test]
    fn auth() {
        let packet = Packet::Auth(Auth {
            reason_code: ReasonCode::Success,
            properties: Properties::new(),
        });
        assert_eq!(roundtrip(&packet), &b"\xF0\x01\x00"[..]);

        let mut properties = Properties::new();
        properties
            .push(
                PropertyId::AuthenticationMethod,
                PropertyValue::Utf8String(ByteStr::new("SCRAM").unwrap()),
            )
            .unwrap();
        properties
            .push(
                PropertyId::AuthenticationData,
                PropertyValue::BinaryData(Bytes::from_static(b"\x01\x02")),
            )
            .unwrap();
        let packet = Packet::Auth(Auth {
            reason_code: ReasonCode::ContinueAuthentication,
            properties,
        });
        assert_eq!(
            roundtrip(&packet),
            &b"\xF0\x0F\x18\x0D\x15\x00\x05SCRAM\x16\x00\x02\x01\x02"[..]
        );
    }

    #[test]
    fn empty_auth() {
        let err = decode_v5(b"\xF0\x00").unwrap_err();
        assert!(matches!(err, DecodeError::EmptyAuth));
        assert_eq!(err.reason_code(), ReasonCode::MalformedPacket);
    }

    #[test]
    fn reason_code_not_allowed() {
        let err = decode_v5(b"\xF0\x01\x87").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::ReasonCodeNotAllowed {
                packet_type: PacketType::Auth,
                reason_code: ReasonCode::NotAuthorized,
            }
        ));
        assert_eq!(err.reason_code(), ReasonCode::ProtocolError);

        let packet = Packet::Auth(Auth {
            reason_code: ReasonCode::NotAuthorized,
            properties: Properties::new(),
        });
        assert!(matches!(
            packet.to_bytes(),
            Err(EncodeError::ReasonCodeNotAllowed { .. })
        ));
    }

    #[test]
    fn auth_is_not_a_v3_packet() {
        let mut src = Bytes::from_static(b"\xF0\x01\x00");
        assert!(matches!(
            crate::v3::Packet::decode_from(&mut src, crate::DecodeOptions::default()),
            Err(DecodeError::InvalidFixedHeader(
                crate::FixedHeaderError::UnrecognizedPacketType { packet_type: 15, .. }
            ))
        ));
    }
}
