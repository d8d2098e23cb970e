// Copyright (c) Microsoft. All rights reserved.

/*!
 * MQTT 5.0 packets.
 *
 * Ref: <https://docs.oasis-open.org/mqtt/mqtt/v5.0/mqtt-v5.0.html>
 */

use crate::codec::encode_packet;
use crate::{
    ByteBuf, ControlPacket, DecodeError, EncodeError, FixedHeader, PacketMeta, PacketType,
    ProtocolVersion, Source,
};

mod property;
pub use property::{
    Properties, Property, PropertyError, PropertyId, PropertySpec, PropertyType, PropertyValue,
};

mod auth;
pub use auth::Auth;

mod connack;
pub use connack::ConnAck;

mod connect;
pub use connect::{Connect, Publication};

mod disconnect;
pub use disconnect::Disconnect;

mod ping;
pub use ping::{PingReq, PingResp};

mod puback;
pub use puback::{PubAck, PubComp, PubRec, PubRel};

mod publish;
pub use publish::Publish;

mod suback;
pub use suback::SubAck;

mod subscribe;
pub use subscribe::{RetainHandling, Subscribe, SubscribeTo};

mod unsuback;
pub use unsuback::UnsubAck;

mod unsubscribe;
pub use unsubscribe::Unsubscribe;

pub const PROTOCOL_VERSION: ProtocolVersion = ProtocolVersion::V5;

/// An MQTT 5.0 packet
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Packet {
    /// Ref: 3.15 AUTH - Authentication exchange
    Auth(Auth),

    /// Ref: 3.2 CONNACK - Connect acknowledgement
    ConnAck(ConnAck),

    /// Ref: 3.1 CONNECT - Connection Request
    Connect(Connect),

    /// Ref: 3.14 DISCONNECT - Disconnect notification
    Disconnect(Disconnect),

    /// Ref: 3.12 PINGREQ - PING request
    PingReq(PingReq),

    /// Ref: 3.13 PINGRESP - PING response
    PingResp(PingResp),

    /// Ref: 3.4 PUBACK - Publish acknowledgement
    PubAck(PubAck),

    /// Ref: 3.7 PUBCOMP - Publish complete (QoS 2 delivery part 3)
    PubComp(PubComp),

    /// Ref: 3.3 PUBLISH - Publish message
    Publish(Publish),

    /// Ref: 3.5 PUBREC - Publish received (QoS 2 delivery part 1)
    PubRec(PubRec),

    /// Ref: 3.6 PUBREL - Publish release (QoS 2 delivery part 2)
    PubRel(PubRel),

    /// Ref: 3.9 SUBACK - Subscribe acknowledgement
    SubAck(SubAck),

    /// Ref: 3.8 SUBSCRIBE - Subscribe request
    Subscribe(Subscribe),

    /// Ref: 3.11 UNSUBACK - Unsubscribe acknowledgement
    UnsubAck(UnsubAck),

    /// Ref: 3.10 UNSUBSCRIBE - Unsubscribe request
    Unsubscribe(Unsubscribe),
}

/// Decodes the body of a packet whose fixed header has already been decoded.
pub fn decode(header: &FixedHeader, src: &mut Source) -> Result<Packet, DecodeError> {
    let packet = match header.packet_type() {
        PacketType::Auth => Packet::Auth(Auth::decode(header, src)?),
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
        Packet::Auth(packet) => encode_packet(packet, PROTOCOL_VERSION, dst),
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
            Packet::Auth(_) => PacketType::Auth,
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

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::{DecodeOptions, PacketIdentifier, ReasonCode};

    /// Encodes `packet`, decodes it back through both the buffer and the stream path, and returns the encoded bytes.
    pub(super) fn roundtrip(packet: &Packet) -> Bytes {
        let bytes = packet.to_bytes().unwrap();
        assert_eq!(packet.encoded_len().unwrap(), bytes.len());

        let mut src = bytes.clone();
        let decoded = Packet::decode_from(&mut src, DecodeOptions::default()).unwrap();
        assert_eq!(&decoded, packet);
        assert!(src.is_empty());

        let mut reader = &bytes[..];
        let decoded = Packet::read_from(&mut reader, DecodeOptions::default()).unwrap();
        assert_eq!(&decoded, packet);
        assert!(reader.is_empty());

        bytes
    }

    pub(super) fn decode_v5(bytes: &'static [u8]) -> Result<Packet, DecodeError> {
        let mut src = Bytes::from_static(bytes);
        Packet::decode_from(&mut src, DecodeOptions::default())
    }

    #[test]
    fn trailing_garbage() {
        // PINGREQ with a one-byte body
        assert!(matches!(decode_v5(b"\xC0\x01\x00"), Err(DecodeError::TrailingGarbage)));

        // PUBACK with a complete property block and one extra byte
        assert!(matches!(
            decode_v5(b"\x40\x05\x00\x01\x00\x00\xFF"),
            Err(DecodeError::TrailingGarbage)
        ));
    }

    #[test]
    fn packet_type_matches_encoded_header() {
        let packets = vec![
            Packet::PingReq(PingReq),
            Packet::PingResp(PingResp),
            Packet::PubRel(PubRel::new(PacketIdentifier::new(1).unwrap())),
            Packet::Disconnect(Disconnect::default()),
            Packet::Auth(Auth {
                reason_code: ReasonCode::ReAuthenticate,
                properties: Properties::new(),
            }),
        ];

        for packet in packets {
            let bytes = packet.to_bytes().unwrap();
            assert_eq!(bytes[0] >> 4, packet.packet_type().nibble());
        }
    }
}
