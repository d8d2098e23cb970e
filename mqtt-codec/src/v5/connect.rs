// Copyright (c) Microsoft. All rights reserved.

use std::time::Duration;

use bytes::Bytes;

use super::{Properties, PropertyId};
use crate::codec::{
    client_id_from, connect_flags, decode_connect_flags, decode_connect_start, encode_client_id,
    encode_connect_flags, encode_connect_start, encode_keep_alive, will_qos,
};
use crate::topic::validate_topic_name;
use crate::{
    ByteBuf, ByteStr, ClientId, DecodeError, EncodeError, FixedHeader, PacketMeta, PacketType,
    ProtocolVersion, QoS, Source,
};

const CONNECT_PROPERTIES: &[PropertyId] = &[
    PropertyId::SessionExpiryInterval,
    PropertyId::ReceiveMaximum,
    PropertyId::MaximumPacketSize,
    PropertyId::TopicAliasMaximum,
    PropertyId::RequestResponseInformation,
    PropertyId::RequestProblemInformation,
    PropertyId::UserProperty,
    PropertyId::AuthenticationMethod,
    PropertyId::AuthenticationData,
];

const WILL_PROPERTIES: &[PropertyId] = &[
    PropertyId::WillDelayInterval,
    PropertyId::PayloadFormatIndicator,
    PropertyId::MessageExpiryInterval,
    PropertyId::ContentType,
    PropertyId::ResponseTopic,
    PropertyId::CorrelationData,
    PropertyId::UserProperty,
];

/// Ref: 3.1 CONNECT – Client requests a connection to a Server
#[derive(Clone, Eq, PartialEq)]
pub struct Connect {
    pub client_id: ClientId,
    pub keep_alive: Duration,
    pub properties: Properties,
    pub will: Option<Publication>,
    pub username: Option<ByteStr>,
    pub password: Option<Bytes>,
}

/// The will message of a CONNECT.
///
/// Ref: 3.1.3.2 Will Properties, 3.1.3.3 Will Topic, 3.1.3.4 Will Payload
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Publication {
    pub topic_name: ByteStr,
    pub qos: QoS,
    pub retain: bool,
    pub properties: Properties,
    pub payload: Bytes,
}

impl Connect {
    /// Decodes everything after the protocol name and level.
    pub(crate) fn decode_rest(src: &mut Source) -> Result<Self, DecodeError> {
        let flags = decode_connect_flags(src)?;

        let keep_alive = Duration::from_secs(u64::from(src.try_get_u16_be()?));

        let properties = Properties::decode(src, CONNECT_PROPERTIES)?;

        let client_id = client_id_from(src.try_get_str()?, flags);

        let will = if flags & connect_flags::WILL == 0 {
            None
        } else {
            let properties = Properties::decode(src, WILL_PROPERTIES)?;

            let topic_name = src.try_get_str()?;
            validate_topic_name(&topic_name).map_err(DecodeError::InvalidTopicName)?;

            let payload = src.try_get_binary()?;

            Some(Publication {
                topic_name,
                qos: will_qos(flags)?,
                retain: flags & connect_flags::WILL_RETAIN != 0,
                properties,
                payload,
            })
        };

        let username = if flags & connect_flags::USERNAME == 0 {
            None
        } else {
            Some(src.try_get_str()?)
        };

        let password = if flags & connect_flags::PASSWORD == 0 {
            None
        } else {
            Some(src.try_get_binary()?)
        };

        Ok(Connect {
            client_id,
            keep_alive,
            properties,
            will,
            username,
            password,
        })
    }
}

impl std::fmt::Debug for Connect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connect")
            .field("client_id", &self.client_id)
            .field("keep_alive", &self.keep_alive)
            .field("properties", &self.properties)
            .field("will", &self.will)
            .field("username", &self.username)
            .finish()
    }
}

impl PacketMeta for Connect {
    const PACKET_TYPE: PacketType = PacketType::Connect;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let protocol_version = decode_connect_start(src)?;
        if protocol_version != ProtocolVersion::V5 {
            return Err(DecodeError::UnrecognizedProtocolVersion(
                protocol_version.into(),
            ));
        }

        Self::decode_rest(src)
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        let Connect {
            client_id,
            keep_alive,
            properties,
            will,
            username,
            password,
        } = self;

        encode_connect_start(ProtocolVersion::V5, dst)?;

        dst.try_put_u8(encode_connect_flags(
            client_id,
            will.as_ref().map(|will| (will.qos, will.retain)),
            username.is_some(),
            password.is_some(),
        ))?;

        encode_keep_alive(*keep_alive, dst)?;

        properties.encode(CONNECT_PROPERTIES, dst)?;

        encode_client_id(client_id, dst)?;

        if let Some(will) = will {
            will.properties.encode(WILL_PROPERTIES, dst)?;
            validate_topic_name(&will.topic_name).map_err(EncodeError::InvalidTopicName)?;
            will.topic_name.encode(dst)?;
            dst.try_put_binary(&will.payload)?;
        }

        if let Some(username) = username {
            username.encode(dst)?;
        }

        if let Some(password) = password {
            dst.try_put_binary(password)?;
        }

        Ok(())
    }
}
