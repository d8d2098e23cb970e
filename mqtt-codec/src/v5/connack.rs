// Copyright (c) Microsoft. All rights reserved.

use super::{Properties, PropertyId};
use crate::{
    ByteBuf, DecodeError, EncodeError, FixedHeader, PacketMeta, PacketType, ReasonCode, Source,
};

const CONNACK_PROPERTIES: &[PropertyId] = &[
    PropertyId::SessionExpiryInterval,
    PropertyId::ReceiveMaximum,
    PropertyId::MaximumQoS,
    PropertyId::RetainAvailable,
    PropertyId::MaximumPacketSize,
    PropertyId::AssignedClientIdentifier,
    PropertyId::TopicAliasMaximum,
    PropertyId::ReasonString,
    PropertyId::UserProperty,
    PropertyId::WildcardSubscriptionAvailable,
    PropertyId::SubscriptionIdentifierAvailable,
    PropertyId::SharedSubscriptionAvailable,
    PropertyId::ServerKeepAlive,
    PropertyId::ResponseInformation,
    PropertyId::ServerReference,
    PropertyId::AuthenticationMethod,
    PropertyId::AuthenticationData,
];

/// Ref: 3.2 CONNACK – Acknowledge connection request
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnAck {
    pub session_present: bool,
    pub reason_code: ReasonCode,
    pub properties: Properties,
}

impl PacketMeta for ConnAck {
    const PACKET_TYPE: PacketType = PacketType::ConnAck;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let flags = src.try_get_u8()?;
        let session_present = match flags {
            0x00 => false,
            0x01 => true,
            flags => return Err(DecodeError::UnrecognizedConnAckFlags(flags)),
        };

        let reason_code = ReasonCode::decode_for(Self::PACKET_TYPE, src)?;

        let properties = Properties::decode(src, CONNACK_PROPERTIES)?;

        Ok(ConnAck {
            session_present,
            reason_code,
            properties,
        })
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        dst.try_put_u8(u8::from(self.session_present))?;
        self.reason_code.encode_for(Self::PACKET_TYPE, dst)?;
        self.properties.encode(CONNACK_PROPERTIES, dst)
    }
}
