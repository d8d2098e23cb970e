// Copyright (c) Microsoft. All rights reserved.

use super::{Properties, PropertyId};
use crate::topic::validate_topic_filter;
use crate::{
    ByteBuf, ByteStr, DecodeError, EncodeError, FixedHeader, PacketIdentifier, PacketMeta,
    PacketType, Source,
};

const UNSUBSCRIBE_PROPERTIES: &[PropertyId] = &[PropertyId::UserProperty];

/// Ref: 3.10 UNSUBSCRIBE – Unsubscribe request
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unsubscribe {
    pub packet_identifier: PacketIdentifier,
    pub properties: Properties,
    pub unsubscribe_from: Vec<ByteStr>,
}

impl PacketMeta for Unsubscribe {
    const PACKET_TYPE: PacketType = PacketType::Unsubscribe;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let packet_identifier = src.try_get_packet_identifier()?;

        let properties = Properties::decode(src, UNSUBSCRIBE_PROPERTIES)?;

        let mut unsubscribe_from = vec![];
        while !src.is_empty() {
            let topic_filter = src.try_get_str()?;
            validate_topic_filter(&topic_filter).map_err(DecodeError::InvalidTopicFilter)?;
            unsubscribe_from.push(topic_filter);
        }

        if unsubscribe_from.is_empty() {
            return Err(DecodeError::NoTopics);
        }

        Ok(Unsubscribe {
            packet_identifier,
            properties,
            unsubscribe_from,
        })
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        if self.unsubscribe_from.is_empty() {
            return Err(EncodeError::NoTopics);
        }

        dst.try_put_packet_identifier(self.packet_identifier)?;

        self.properties.encode(UNSUBSCRIBE_PROPERTIES, dst)?;

        for topic_filter in &self.unsubscribe_from {
            validate_topic_filter(topic_filter).map_err(EncodeError::InvalidTopicFilter)?;
            topic_filter.encode(dst)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::TopicError;
    use crate::v5::tests::{decode_v5, roundtrip};
    use crate::v5::{Packet, Property};

    #[test]
    fn unsubscribe() {
        let mut properties = Properties::new();
        properties
            .insert(Property::user_property(
                ByteStr::new("reason").unwrap(),
                ByteStr::new("idle").unwrap(),
            ))
            .unwrap();

        let packet = Packet::Unsubscribe(Unsubscribe {
            packet_identifier: PacketIdentifier::new(3).unwrap(),
            properties,
            unsubscribe_from: vec![ByteStr::new("a/+").unwrap(), ByteStr::new("#").unwrap()],
        });
        roundtrip(&packet);

        let packet = Packet::Unsubscribe(Unsubscribe {
            packet_identifier: PacketIdentifier::new(3).unwrap(),
            properties: Properties::new(),
            unsubscribe_from: vec![ByteStr::new("a").unwrap()],
        });
        assert_eq!(roundtrip(&packet), &b"\xA2\x06\x00\x03\x00\x00\x01a"[..]);
    }

    #[test]
    fn no_topics() {
        assert!(matches!(decode_v5(b"\xA2\x03\x00\x01\x00"), Err(DecodeError::NoTopics)));
    }

    #[test]
    fn invalid_topic_filter() {
        assert!(matches!(
            decode_v5(b"\xA2\x0A\x00\x01\x00\x00\x05a/#/b"),
            Err(DecodeError::InvalidTopicFilter(TopicError::InvalidMultiLevelWildcard))
        ));
        assert!(matches!(
            decode_v5(b"\xA2\x05\x00\x01\x00\x00\x00"),
            Err(DecodeError::InvalidTopicFilter(TopicError::Empty))
        ));
    }
}
