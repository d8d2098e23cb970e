// Copyright (c) Microsoft. All rights reserved.

use super::{Properties, PropertyId};
use crate::{
    ByteBuf, DecodeError, EncodeError, FixedHeader, PacketIdentifier, PacketMeta, PacketType,
    ReasonCode, Source,
};

const SUBACK_PROPERTIES: &[PropertyId] = &[PropertyId::ReasonString, PropertyId::UserProperty];

/// Ref: 3.9 SUBACK – Subscribe acknowledgement
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubAck {
    pub packet_identifier: PacketIdentifier,
    pub properties: Properties,

    /// One per topic filter of the SUBSCRIBE, in the same order. [`ReasonCode::GRANTED_QOS_0`] and
    /// [`ReasonCode::GrantedQoS1`]/[`ReasonCode::GrantedQoS2`] report the granted QoS.
    pub reason_codes: Vec<ReasonCode>,
}

impl PacketMeta for SubAck {
    const PACKET_TYPE: PacketType = PacketType::SubAck;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let packet_identifier = src.try_get_packet_identifier()?;

        let properties = Properties::decode(src, SUBACK_PROPERTIES)?;

        let mut reason_codes = Vec::with_capacity(src.len());
        while !src.is_empty() {
            reason_codes.push(ReasonCode::decode_for(Self::PACKET_TYPE, src)?);
        }

        if reason_codes.is_empty() {
            return Err(DecodeError::NoTopics);
        }

        Ok(SubAck {
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

        self.properties.encode(SUBACK_PROPERTIES, dst)?;

        for reason_code in &self.reason_codes {
            reason_code.encode_for(Self::PACKET_TYPE, dst)?;
        }

        Ok(())
    }
}
