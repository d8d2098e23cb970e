// Copyright (c) Microsoft. All rights reserved.

use bytes::Bytes;

use super::{Properties, PropertyId};
use crate::topic::{validate_topic_name, TopicError};
use crate::{
    ByteBuf, ByteStr, DecodeError, EncodeError, FixedHeader, PacketIdentifierDupQoS, PacketMeta,
    PacketType, Source,
};

const PUBLISH_PROPERTIES: &[PropertyId] = &[
    PropertyId::PayloadFormatIndicator,
    PropertyId::MessageExpiryInterval,
    PropertyId::TopicAlias,
    PropertyId::ResponseTopic,
    PropertyId::CorrelationData,
    PropertyId::UserProperty,
    PropertyId::SubscriptionIdentifier,
    PropertyId::ContentType,
];

/// Ref: 3.3 PUBLISH – Publish message
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Publish {
    pub topic_name: ByteStr,
    pub packet_identifier_dup_qos: PacketIdentifierDupQoS,
    pub retain: bool,
    pub properties: Properties,
    pub payload: Bytes,
}

impl Publish {
    /// An empty topic name is only allowed when a Topic Alias stands in for it.
    fn check_topic_name(&self) -> Result<(), TopicError> {
        if self.topic_name.is_empty() && self.properties.contains(PropertyId::TopicAlias) {
            Ok(())
        } else {
            validate_topic_name(&self.topic_name)
        }
    }
}

impl PacketMeta for Publish {
    const PACKET_TYPE: PacketType = PacketType::Publish;

    fn decode(header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let topic_name = src.try_get_str()?;

        let packet_identifier_dup_qos = PacketIdentifierDupQoS::decode(header, src)?;

        let properties = Properties::decode(src, PUBLISH_PROPERTIES)?;

        let payload = src.take_remaining();

        let publish = Publish {
            topic_name,
            packet_identifier_dup_qos,
            retain: header.retain(),
            properties,
            payload,
        };
        publish
            .check_topic_name()
            .map_err(DecodeError::InvalidTopicName)?;

        Ok(publish)
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        self.check_topic_name()
            .map_err(EncodeError::InvalidTopicName)?;

        self.topic_name.encode(dst)?;
        self.packet_identifier_dup_qos.encode(dst)?;
        self.properties.encode(PUBLISH_PROPERTIES, dst)?;
        dst.try_put_slice(&self.payload)
    }

    fn flags(&self) -> u8 {
        self.packet_identifier_dup_qos.flags(self.retain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v5::tests::{decode_v5, roundtrip};
    use crate::v5::{Packet, PropertyValue};
    use crate::codec::decode_frame;
    use crate::{ControlPacket, DecodeOptions, PacketIdentifier, ProtocolVersion, QoS, ReasonCode};

    fn publish(topic_name: &str, packet_identifier_dup_qos: PacketIdentifierDupQoS) -> Publish {
        Publish {
            topic_name: ByteStr::new(topic_name).unwrap(),
            packet_identifier_dup_qos,
            retain: false,
            properties: Properties::new(),
            payload: Bytes::from_static(b"hello"),
        }
    }

    #[test]
    fn qos0_remaining_length() {
        let packet = Packet::Publish(publish("test/topic", PacketIdentifierDupQoS::AtMostOnce));
        let bytes = packet.to_bytes().unwrap();

        // topic length prefix, topic, empty property block, payload
        let remaining_length = 2 + "test/topic".len() + 1 + "hello".len();
        assert_eq!(bytes[0], 0x30);
        assert_eq!(usize::from(bytes[1]), remaining_length);
        assert_eq!(bytes.len(), 2 + remaining_length);

        let mut src = bytes.clone();
        let (header, _) = decode_frame(&mut src, ProtocolVersion::V5, DecodeOptions::default())
            .unwrap();
        assert_eq!(header.packet_type(), PacketType::Publish);
        assert_eq!(header.flags(), 0x00);
        assert_eq!(header.remaining_length(), remaining_length);

        let mut src = bytes;
        let decoded = Packet::decode_from(&mut src, DecodeOptions::default()).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn qos1_and_qos2() {
        let id = PacketIdentifier::new(0x1234).unwrap();

        let mut packet = publish("a/b", PacketIdentifierDupQoS::AtLeastOnce(id, true));
        packet.retain = true;
        assert_eq!(
            roundtrip(&Packet::Publish(packet)),
            &b"\x3B\x0D\x00\x03a/b\x12\x34\x00hello"[..]
        );

        let mut packet = publish("a/b", PacketIdentifierDupQoS::ExactlyOnce(id, false));
        packet
            .properties
            .push(PropertyId::SubscriptionIdentifier, PropertyValue::VariableByteInteger(200))
            .unwrap();
        packet
            .properties
            .push(PropertyId::SubscriptionIdentifier, PropertyValue::VariableByteInteger(7))
            .unwrap();
        packet
            .properties
            .push(PropertyId::PayloadFormatIndicator, PropertyValue::Byte(1))
            .unwrap();
        roundtrip(&Packet::Publish(packet.clone()));
        assert_eq!(packet.packet_identifier_dup_qos.qos(), QoS::ExactlyOnce);
    }

    #[test]
    fn empty_payload() {
        let mut packet = publish("a", PacketIdentifierDupQoS::AtMostOnce);
        packet.payload = Bytes::new();
        assert_eq!(roundtrip(&Packet::Publish(packet)), &b"\x30\x04\x00\x01a\x00"[..]);
    }

    #[test]
    fn wildcard_in_topic_name() {
        let err = decode_v5(b"\x30\x06\x00\x03a/#\x00").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidTopicName(TopicError::WildcardInTopicName)));
        assert_eq!(err.reason_code(), ReasonCode::TopicNameInvalid);

        assert!(matches!(
            Packet::Publish(publish("a/+", PacketIdentifierDupQoS::AtMostOnce)).to_bytes(),
            Err(EncodeError::InvalidTopicName(TopicError::WildcardInTopicName))
        ));
    }

    #[test]
    fn empty_topic_name_needs_topic_alias() {
        assert!(matches!(
            decode_v5(b"\x30\x03\x00\x00\x00"),
            Err(DecodeError::InvalidTopicName(TopicError::Empty))
        ));

        let mut packet = publish("", PacketIdentifierDupQoS::AtMostOnce);
        packet
            .properties
            .push(PropertyId::TopicAlias, PropertyValue::TwoByteInteger(3))
            .unwrap();
        assert_eq!(
            roundtrip(&Packet::Publish(packet)),
            &b"\x30\x0B\x00\x00\x03\x23\x00\x03hello"[..]
        );
    }

    #[test]
    fn dup_with_qos0() {
        let err = decode_v5(b"\x38\x04\x00\x01a\x00").unwrap_err();
        assert!(matches!(err, DecodeError::PublishDupAtMostOnce));
        assert_eq!(err.reason_code(), ReasonCode::ProtocolError);
    }

    #[test]
    fn zero_packet_identifier() {
        assert!(matches!(
            decode_v5(b"\x32\x06\x00\x01a\x00\x00\x00"),
            Err(DecodeError::ZeroPacketIdentifier)
        ));
    }

    #[test]
    fn qos3() {
        let err = decode_v5(b"\x36\x04\x00\x01a\x00").unwrap_err();
        assert_eq!(err.reason_code(), ReasonCode::MalformedPacket);
    }
}
