// Copyright (c) Microsoft. All rights reserved.

use super::{Properties, PropertyError, PropertyId};
use crate::topic::validate_topic_filter;
use crate::{
    ByteBuf, ByteStr, DecodeError, EncodeError, FixedHeader, PacketIdentifier, PacketMeta,
    PacketType, QoS, Source,
};

const SUBSCRIBE_PROPERTIES: &[PropertyId] =
    &[PropertyId::SubscriptionIdentifier, PropertyId::UserProperty];

mod subscription_options {
    pub(super) const MAXIMUM_QOS: u8 = 0b0000_0011;
    pub(super) const NO_LOCAL: u8 = 0b0000_0100;
    pub(super) const RETAIN_AS_PUBLISHED: u8 = 0b0000_1000;
    pub(super) const RETAIN_HANDLING: u8 = 0b0011_0000;
    pub(super) const RESERVED: u8 = 0b1100_0000;
}

/// Ref: 3.8 SUBSCRIBE - Subscribe to topics
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subscribe {
    pub packet_identifier: PacketIdentifier,
    pub properties: Properties,
    pub subscribe_to: Vec<SubscribeTo>,
}

/// A subscription request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscribeTo {
    pub topic_filter: ByteStr,
    pub maximum_qos: QoS,
    pub no_local: bool,
    pub retain_as_published: bool,
    pub retain_handling: RetainHandling,
}

impl SubscribeTo {
    /// A subscription with default options.
    pub fn new(topic_filter: ByteStr, maximum_qos: QoS) -> Self {
        SubscribeTo {
            topic_filter,
            maximum_qos,
            no_local: false,
            retain_as_published: false,
            retain_handling: RetainHandling::Send,
        }
    }

    fn options(&self) -> u8 {
        let mut options = u8::from(self.maximum_qos);
        if self.no_local {
            options |= subscription_options::NO_LOCAL;
        }
        if self.retain_as_published {
            options |= subscription_options::RETAIN_AS_PUBLISHED;
        }
        options | (u8::from(self.retain_handling) << 4)
    }
}

define_u8_code! {
    /// Ref: 3.8.3.1 Subscription Options
    RetainHandling,
    UnrecognizedRetainHandling,
    Send = 0x00,
    SendOnlyIfSubscriptionDoesNotCurrentlyExist = 0x01,
    DoNotSend = 0x02,
}

/// The Subscription Identifier is repeatable in PUBLISH but may appear only once in SUBSCRIBE.
fn check_subscription_identifier(properties: &Properties) -> Result<(), PropertyError> {
    if properties.get_all(PropertyId::SubscriptionIdentifier).nth(1).is_some() {
        return Err(PropertyError::Duplicate(PropertyId::SubscriptionIdentifier));
    }

    Ok(())
}

impl PacketMeta for Subscribe {
    const PACKET_TYPE: PacketType = PacketType::Subscribe;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let packet_identifier = src.try_get_packet_identifier()?;

        let properties = Properties::decode(src, SUBSCRIBE_PROPERTIES)?;
        check_subscription_identifier(&properties)?;

        let mut subscribe_to = vec![];

        // The subscriptions fill the rest of the body.
        while !src.is_empty() {
            let topic_filter = src.try_get_str()?;
            validate_topic_filter(&topic_filter).map_err(DecodeError::InvalidTopicFilter)?;

            let options = src.try_get_u8()?;

            if options & subscription_options::RESERVED != 0 {
                return Err(DecodeError::SubscriptionOptionsReservedSet);
            }

            let maximum_qos = QoS::try_from(options & subscription_options::MAXIMUM_QOS)?;

            let no_local = options & subscription_options::NO_LOCAL != 0;

            let retain_as_published = options & subscription_options::RETAIN_AS_PUBLISHED != 0;

            let retain_handling =
                RetainHandling::try_from((options & subscription_options::RETAIN_HANDLING) >> 4)?;

            subscribe_to.push(SubscribeTo {
                topic_filter,
                maximum_qos,
                no_local,
                retain_as_published,
                retain_handling,
            });
        }

        if subscribe_to.is_empty() {
            return Err(DecodeError::NoTopics);
        }

        Ok(Subscribe {
            packet_identifier,
            properties,
            subscribe_to,
        })
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        if self.subscribe_to.is_empty() {
            return Err(EncodeError::NoTopics);
        }

        check_subscription_identifier(&self.properties)?;

        dst.try_put_packet_identifier(self.packet_identifier)?;

        self.properties.encode(SUBSCRIBE_PROPERTIES, dst)?;

        for subscribe_to in &self.subscribe_to {
            validate_topic_filter(&subscribe_to.topic_filter)
                .map_err(EncodeError::InvalidTopicFilter)?;
            subscribe_to.topic_filter.encode(dst)?;
            dst.try_put_u8(subscribe_to.options())?;
        }

        Ok(())
    }
}
