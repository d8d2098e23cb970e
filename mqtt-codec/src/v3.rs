// Copyright (c) Microsoft. All rights reserved.

/*!
 * MQTT 3.1.1 packets.
 *
 * These carry no properties, and CONNACK and SUBACK use one-octet return codes instead of reason codes.
 *
 * Ref: <https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/mqtt-v3.1.1.html>
 */

use std::time::Duration;

use bytes::Bytes;

use crate::codec::{
    client_id_from, connect_flags, decode_connect_flags, decode_connect_start, encode_client_id,
    encode_connect_flags, encode_connect_start, encode_keep_alive, encode_packet, will_qos,
};
use crate::topic::{validate_topic_filter, validate_topic_name};
use crate::{
    ByteBuf, ByteStr, ClientId, ControlPacket, DecodeError, EncodeError, FixedHeader,
    PacketIdentifier, PacketIdentifierDupQoS, PacketMeta, PacketType, ProtocolVersion, QoS,
    Source,
};

pub const PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion::V3_1_1;

/// The return code for a connection attempt
///
/// Ref: 3.2.2.3 Connect Return code
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectReturnCode {
    Accepted { session_present: bool },
    Refused(ConnectionRefusedReason),
}

/// The reason the connection was refused by the server
///
/// Ref: 3.2.2.3 Connect Return code
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectionRefusedReason {
    UnacceptableProtocolVersion,
    IdentifierRejected,
    ServerUnavailable,
    BadUserNameOrPassword,
    NotAuthorized,
    Other(u8),
}

impl ConnectReturnCode {
    fn from(code: u8, session_present: bool) -> Self {
        match code {
            0x00 => ConnectReturnCode::Accepted { session_present },
            0x01 => {
                ConnectReturnCode::Refused(ConnectionRefusedReason::UnacceptableProtocolVersion)
            }
            0x02 => ConnectReturnCode::Refused(ConnectionRefusedReason::IdentifierRejected),
            0x03 => ConnectReturnCode::Refused(ConnectionRefusedReason::ServerUnavailable),
            0x04 => ConnectReturnCode::Refused(ConnectionRefusedReason::BadUserNameOrPassword),
            0x05 => ConnectReturnCode::Refused(ConnectionRefusedReason::NotAuthorized),
            code => ConnectReturnCode::Refused(ConnectionRefusedReason::Other(code)),
        }
    }

    fn session_present(self) -> bool {
        match self {
            ConnectReturnCode::Accepted { session_present } => session_present,
            ConnectReturnCode::Refused(_) => false,
        }
    }
}

impl From<ConnectReturnCode> for u8 {
    fn from(code: ConnectReturnCode) -> Self {
        match code {
            ConnectReturnCode::Accepted { .. } => 0x00,
            ConnectReturnCode::Refused(ConnectionRefusedReason::UnacceptableProtocolVersion) => {
                0x01
            }
            ConnectReturnCode::Refused(ConnectionRefusedReason::IdentifierRejected) => 0x02,
            ConnectReturnCode::Refused(ConnectionRefusedReason::ServerUnavailable) => 0x03,
            ConnectReturnCode::Refused(ConnectionRefusedReason::BadUserNameOrPassword) => 0x04,
            ConnectReturnCode::Refused(ConnectionRefusedReason::NotAuthorized) => 0x05,
            ConnectReturnCode::Refused(ConnectionRefusedReason::Other(code)) => code,
        }
    }
}

/// An MQTT 3.1.1 packet
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Packet {
    /// Ref: 3.2 CONNACK – Acknowledge connection request
    ConnAck(ConnAck),

    /// Ref: 3.1 CONNECT – Client requests a connection to a Server
    Connect(Connect),

    /// Ref: 3.14 DISCONNECT - Disconnect notification
    Disconnect(Disconnect),

    /// Ref: 3.12 PINGREQ – PING request
    PingReq(PingReq),

    /// Ref: 3.13 PINGRESP – PING response
    PingResp(PingResp),

    /// Ref: 3.4 PUBACK – Publish acknowledgement
    PubAck(PubAck),

    /// Ref: 3.7 PUBCOMP – Publish complete (QoS 2 publish received, part 3)
    PubComp(PubComp),

    /// 3.3 PUBLISH – Publish message
    Publish(Publish),

    /// Ref: 3.5 PUBREC – Publish received (QoS 2 publish received, part 1)
    PubRec(PubRec),

    /// Ref: 3.6 PUBREL – Publish release (QoS 2 publish received, part 2)
    PubRel(PubRel),

    /// Ref: 3.9 SUBACK – Subscribe acknowledgement
    SubAck(SubAck),

    /// Ref: 3.8 SUBSCRIBE - Subscribe to topics
    Subscribe(Subscribe),

    /// Ref: 3.11 UNSUBACK – Unsubscribe acknowledgement
    UnsubAck(UnsubAck),

    /// Ref: 3.10 UNSUBSCRIBE – Unsubscribe from topics
    Unsubscribe(Unsubscribe),
}

/// Ref: 3.2 CONNACK – Acknowledge connection request
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnAck {
    pub return_code: ConnectReturnCode,
}

impl PacketMeta for ConnAck {
    const PACKET_TYPE: PacketType = PacketType::ConnAck;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let connack_flags = src.try_get_u8()?;
        let session_present = match connack_flags {
            0x00 => false,
            0x01 => true,
            connack_flags => {
                return Err(DecodeError::UnrecognizedConnAckFlags(connack_flags));
            }
        };

        let return_code = ConnectReturnCode::from(src.try_get_u8()?, session_present);

        Ok(ConnAck { return_code })
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        dst.try_put_u8(u8::from(self.return_code.session_present()))?;
        dst.try_put_u8(self.return_code.into())
    }
}

/// Ref: 3.1 CONNECT – Client requests a connection to a Server
#[derive(Clone, Eq, PartialEq)]
pub struct Connect {
    pub client_id: ClientId,
    pub keep_alive: Duration,
    pub will: Option<Publication>,
    pub username: Option<ByteStr>,
    pub password: Option<Bytes>,
}

/// The will message of a CONNECT.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Publication {
    pub topic_name: ByteStr,
    pub qos: QoS,
    pub retain: bool,
    pub payload: Bytes,
}

impl Connect {
    /// Decodes everything after the protocol name and level.
    pub(crate) fn decode_rest(src: &mut Source) -> Result<Self, DecodeError> {
        let flags = decode_connect_flags(src)?;

        if flags & connect_flags::PASSWORD != 0 && flags & connect_flags::USERNAME == 0 {
            return Err(DecodeError::ConnectPasswordWithoutUsername);
        }

        let keep_alive = Duration::from_secs(u64::from(src.try_get_u16_be()?));

        let client_id = src.try_get_str()?;
        if client_id.is_empty() && flags & connect_flags::CLEAN_START == 0 {
            return Err(DecodeError::ConnectZeroLengthIdWithExistingSession);
        }
        let client_id = client_id_from(client_id, flags);

        let will = if flags & connect_flags::WILL == 0 {
            None
        } else {
            let topic_name = src.try_get_str()?;
            validate_topic_name(&topic_name).map_err(DecodeError::InvalidTopicName)?;

            let payload = src.try_get_binary()?;

            Some(Publication {
                topic_name,
                qos: will_qos(flags)?,
                retain: flags & connect_flags::WILL_RETAIN != 0,
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
            will,
            username,
            password,
        })
    }
}

impl std::fmt::Debug for Connect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connect")
            .field("username", &self.username)
            .field("will", &self.will)
            .field("client_id", &self.client_id)
            .field("keep_alive", &self.keep_alive)
            .finish()
    }
}

impl PacketMeta for Connect {
    const PACKET_TYPE: PacketType = PacketType::Connect;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let protocol_version = decode_connect_start(src)?;
        if protocol_version != PROTOCOL_VERSION {
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
            will,
            username,
            password,
        } = self;

        if password.is_some() && username.is_none() {
            return Err(EncodeError::ConnectPasswordWithoutUsername);
        }

        if matches!(client_id, ClientId::IdWithExistingSession(id) if id.is_empty()) {
            return Err(EncodeError::ConnectZeroLengthIdWithExistingSession);
        }

        encode_connect_start(PROTOCOL_VERSION, dst)?;

        dst.try_put_u8(encode_connect_flags(
            client_id,
            will.as_ref().map(|will| (will.qos, will.retain)),
            username.is_some(),
            password.is_some(),
        ))?;

        encode_keep_alive(*keep_alive, dst)?;

        encode_client_id(client_id, dst)?;

        if let Some(will) = will {
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

macro_rules! define_empty_packet {
    (
        $(#[$meta:meta])*
        $ty:ident,
        $packet_type:expr,
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq)]
        pub struct $ty;

        impl PacketMeta for $ty {
            const PACKET_TYPE: PacketType = $packet_type;

            fn decode(_header: &FixedHeader, _src: &mut Source) -> Result<Self, DecodeError> {
                Ok($ty)
            }

            fn encode<B>(&self, _dst: &mut B) -> Result<(), EncodeError>
            where
                B: ByteBuf,
            {
                Ok(())
            }
        }
    };
}

define_empty_packet! {
    /// Ref: 3.14 DISCONNECT - Disconnect notification
    Disconnect,
    PacketType::Disconnect,
}

define_empty_packet! {
    /// Ref: 3.12 PINGREQ – PING request
    PingReq,
    PacketType::PingReq,
}

define_empty_packet! {
    /// Ref: 3.13 PINGRESP – PING response
    PingResp,
    PacketType::PingResp,
}

/// The packets whose body is nothing but a packet identifier.
macro_rules! define_packet_identifier_only {
    (
        $(#[$meta:meta])*
        $ty:ident,
        $packet_type:expr,
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq)]
        pub struct $ty {
            pub packet_identifier: PacketIdentifier,
        }

        impl PacketMeta for $ty {
            const PACKET_TYPE: PacketType = $packet_type;

            fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
                let packet_identifier = src.try_get_packet_identifier()?;

                Ok($ty { packet_identifier })
            }

            fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
            where
                B: ByteBuf,
            {
                dst.try_put_packet_identifier(self.packet_identifier)
            }
        }
    };
}

define_packet_identifier_only! {
    /// Ref: 3.4 PUBACK – Publish acknowledgement
    PubAck,
    PacketType::PubAck,
}

define_packet_identifier_only! {
    /// Ref: 3.5 PUBREC – Publish received (QoS 2 publish received, part 1)
    PubRec,
    PacketType::PubRec,
}

define_packet_identifier_only! {
    /// Ref: 3.6 PUBREL – Publish release (QoS 2 publish received, part 2)
    PubRel,
    PacketType::PubRel,
}

define_packet_identifier_only! {
    /// Ref: 3.7 PUBCOMP – Publish complete (QoS 2 publish received, part 3)
    PubComp,
    PacketType::PubComp,
}

define_packet_identifier_only! {
    /// Ref: 3.11 UNSUBACK – Unsubscribe acknowledgement
    UnsubAck,
    PacketType::UnsubAck,
}

/// 3.3 PUBLISH – Publish message
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Publish {
    pub packet_identifier_dup_qos: PacketIdentifierDupQoS,
    pub retain: bool,
    pub topic_name: ByteStr,
    pub payload: Bytes,
}

impl PacketMeta for Publish {
    const PACKET_TYPE: PacketType = PacketType::Publish;

    fn decode(header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let topic_name = src.try_get_str()?;
        validate_topic_name(&topic_name).map_err(DecodeError::InvalidTopicName)?;

        let packet_identifier_dup_qos = PacketIdentifierDupQoS::decode(header, src)?;

        let payload = src.take_remaining();

        Ok(Publish {
            packet_identifier_dup_qos,
            retain: header.retain(),
            topic_name,
            payload,
        })
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        validate_topic_name(&self.topic_name).map_err(EncodeError::InvalidTopicName)?;

        self.topic_name.encode(dst)?;
        self.packet_identifier_dup_qos.encode(dst)?;
        dst.try_put_slice(&self.payload)
    }

    fn flags(&self) -> u8 {
        self.packet_identifier_dup_qos.flags(self.retain)
    }
}

/// Ref: 3.9.3 Payload
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubAckQos {
    Success(QoS),
    Failure,
}

impl TryFrom<u8> for SubAckQos {
    type Error = DecodeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0x00 => Ok(SubAckQos::Success(QoS::AtMostOnce)),
            0x01 => Ok(SubAckQos::Success(QoS::AtLeastOnce)),
            0x02 => Ok(SubAckQos::Success(QoS::ExactlyOnce)),
            0x80 => Ok(SubAckQos::Failure),
            code => Err(DecodeError::UnrecognizedSubAckReturnCode(code)),
        }
    }
}

impl From<SubAckQos> for u8 {
    fn from(qos: SubAckQos) -> Self {
        match qos {
            SubAckQos::Success(qos) => qos.into(),
            SubAckQos::Failure => 0x80,
        }
    }
}

/// Ref: 3.9 SUBACK – Subscribe acknowledgement
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubAck {
    pub packet_identifier: PacketIdentifier,
    pub qos: Vec<SubAckQos>,
}

impl PacketMeta for SubAck {
    const PACKET_TYPE: PacketType = PacketType::SubAck;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let packet_identifier = src.try_get_packet_identifier()?;

        // One return code per remaining octet.
        let qos = src
            .take_remaining()
            .iter()
            .map(|&code| SubAckQos::try_from(code))
            .collect::<Result<Vec<_>, _>>()?;

        if qos.is_empty() {
            return Err(DecodeError::NoTopics);
        }

        Ok(SubAck {
            packet_identifier,
            qos,
        })
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        if self.qos.is_empty() {
            return Err(EncodeError::NoTopics);
        }

        dst.try_put_packet_identifier(self.packet_identifier)?;

        for &qos in &self.qos {
            dst.try_put_u8(qos.into())?;
        }

        Ok(())
    }
}

/// A subscription request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubscribeTo {
    pub topic_filter: ByteStr,
    pub qos: QoS,
}

/// Ref: 3.8 SUBSCRIBE - Subscribe to topics
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Subscribe {
    pub packet_identifier: PacketIdentifier,
    pub subscribe_to: Vec<SubscribeTo>,
}

impl PacketMeta for Subscribe {
    const PACKET_TYPE: PacketType = PacketType::Subscribe;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let packet_identifier = src.try_get_packet_identifier()?;

        let mut subscribe_to = vec![];

        while !src.is_empty() {
            let topic_filter = src.try_get_str()?;
            validate_topic_filter(&topic_filter).map_err(DecodeError::InvalidTopicFilter)?;

            // Everything above the QoS bits is reserved.
            let options = src.try_get_u8()?;
            if options & 0b1111_1100 != 0 {
                return Err(DecodeError::SubscriptionOptionsReservedSet);
            }
            let qos = QoS::try_from(options)?;

            subscribe_to.push(SubscribeTo { topic_filter, qos });
        }

        if subscribe_to.is_empty() {
            return Err(DecodeError::NoTopics);
        }

        Ok(Subscribe {
            packet_identifier,
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

        dst.try_put_packet_identifier(self.packet_identifier)?;

        for SubscribeTo { topic_filter, qos } in &self.subscribe_to {
            validate_topic_filter(topic_filter).map_err(EncodeError::InvalidTopicFilter)?;
            topic_filter.encode(dst)?;
            dst.try_put_u8((*qos).into())?;
        }

        Ok(())
    }
}

/// Ref: 3.10 UNSUBSCRIBE – Unsubscribe from topics
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unsubscribe {
    pub packet_identifier: PacketIdentifier,
    pub unsubscribe_from: Vec<ByteStr>,
}

impl PacketMeta for Unsubscribe {
    const PACKET_TYPE: PacketType = PacketType::Unsubscribe;

    fn decode(_header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        let packet_identifier = src.try_get_packet_identifier()?;

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

        for topic_filter in &self.unsubscribe_from {
            validate_topic_filter(topic_filter).map_err(EncodeError::InvalidTopicFilter)?;
            topic_filter.encode(dst)?;
        }

        Ok(())
    }
}

/// Decodes the body of a packet whose fixed header has already been decoded.
pub fn decode(header: &FixedHeader, src: &mut Source) -> Result<Packet, DecodeError> {
    let packet = match header.packet_type() {
        PacketType::ConnAck => Packet::ConnAck(ConnAck::decode(header, src)?),
        PacketType::Connect => Packet::Connect(Connect::decode(header, src)?),
        PacketType::Disconnect => Packet::Disconnect(Disconnect::decode(header, src)?),
        PacketType::PingReq => Packet::PingReq(PingReq::decode(header, src)?),
        PacketType::PingResp => Packet::PingResp(PingResp::decode(header, src)?),
        PacketType::PubAck => Packet::PubAck(PubAck::decode(header, src)?),
        PacketType::PubComp => Packet::PubComp(PubComp::decode(header, src)?),
        PacketType::Publish => Packet::Publish(Publish::decode(header, src)?),
        PacketType::PubRec => Packet::PubRec(PubRec::decode(header, src)?),
        PacketType::PubRel => Packet::PubRel(PubRel::decode(header, src)?),
        PacketType::SubAck => Packet::SubAck(SubAck::decode(header, src)?),
        PacketType::Subscribe => Packet::Subscribe(Subscribe::decode(header, src)?),
        PacketType::UnsubAck => Packet::UnsubAck(UnsubAck::decode(header, src)?),
        PacketType::Unsubscribe => Packet::Unsubscribe(Unsubscribe::decode(header, src)?),
        packet_type @ PacketType::Auth => {
            return Err(DecodeError::InvalidFixedHeader(
                crate::FixedHeaderError::UnrecognizedPacketType {
                    packet_type: packet_type.nibble(),
                    version: PROTOCOL_VERSION,
                },
            ));
        }
    };

    if !src.is_empty() {
        return Err(DecodeError::TrailingGarbage);
    }

    Ok(packet)
}

pub fn encode<B>(packet: &Packet, dst: &mut B) -> Result<(), EncodeError>
where
    B: ByteBuf,
{
    match packet {
        Packet::ConnAck(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::Connect(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::Disconnect(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::PingReq(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::PingResp(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::PubAck(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::PubComp(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::Publish(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::PubRec(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::PubRel(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::SubAck(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::Subscribe(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::UnsubAck(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
        Packet::Unsubscribe(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
    }
}

impl ControlPacket for Packet {
    const PROTOCOL_VERSION: ProtocolVersion = PROTOCOL_VERSION;

    fn packet_type(&self) -> PacketType {
        match self {
            Packet::ConnAck(_) => PacketType::ConnAck,
            Packet::Connect(_) => PacketType::Connect,
            Packet::Disconnect(_) => PacketType::Disconnect,
            Packet::PingReq(_) => PacketType::PingReq,
            Packet::PingResp(_) => PacketType::PingResp,
            Packet::PubAck(_) => PacketType::PubAck,
            Packet::PubComp(_) => PacketType::PubComp,
            Packet::Publish(_) => PacketType::Publish,
            Packet::PubRec(_) => PacketType::PubRec,
            Packet::PubRel(_) => PacketType::PubRel,
            Packet::SubAck(_) => PacketType::SubAck,
            Packet::Subscribe(_) => PacketType::Subscribe,
            Packet::UnsubAck(_) => PacketType::UnsubAck,
            Packet::Unsubscribe(_) => PacketType::Unsubscribe,
        }
    }

    fn decode_body(header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        decode(header, src)
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        encode(self, dst)
    }
}
