// Copyright (c) Microsoft. All rights reserved.

//! Framing: splitting packets off buffers and streams, and writing them back out.

use std::io::{Read, Write};
use std::time::Duration;

use bytes::{Buf, Bytes, BytesMut};

use crate::{
    v3, v5, ByteBuf, ByteCounter, ByteStr, ClientId, DecodeError, DecodeOptions, EncodeError,
    FixedHeader, PacketMeta, PacketType, ProtocolVersion, QoS, SliceBuf, Source, PROTOCOL_NAME,
};

/// Splits the next complete packet off the front of `src`.
///
/// Returns the fixed header and a [`Source`] over exactly the packet's body.
/// If `src` does not hold a complete packet yet, `src` is left untouched and [`DecodeError::IncompletePacket`] is returned,
/// so the caller can append more bytes and try again.
pub fn decode_frame(
    src: &mut Bytes,
    version: ProtocolVersion,
    options: DecodeOptions,
) -> Result<(FixedHeader, Source), DecodeError> {
    let (header, header_len) = {
        let mut peek = &src[..];
        let header = FixedHeader::decode(&mut peek, version)?;
        (header, src.len() - peek.len())
    };

    let frame_len = header_len + header.remaining_length();
    options.check_packet_size(frame_len)?;

    if src.len() < frame_len {
        return Err(DecodeError::IncompletePacket);
    }

    tracing::trace!(
        packet_type = %header.packet_type(),
        remaining_length = header.remaining_length(),
        "decoded fixed header"
    );

    src.advance(header_len);
    let body = src.split_to(header.remaining_length());
    Ok((header, Source::new(body, options)))
}

/// Reads the next packet from a stream.
///
/// Consumes exactly the octets of one packet. The body is read incrementally,
/// so a lying remaining length cannot make this allocate more than the stream actually delivers.
pub fn read_frame<R>(
    reader: &mut R,
    version: ProtocolVersion,
    options: DecodeOptions,
) -> Result<(FixedHeader, Source), DecodeError>
where
    R: Read,
{
    let (header, header_len) = FixedHeader::read(reader, version)?;
    options.check_packet_size(header_len + header.remaining_length())?;

    tracing::trace!(
        packet_type = %header.packet_type(),
        remaining_length = header.remaining_length(),
        "read fixed header"
    );

    let mut body = Vec::new();
    let _ = reader
        .by_ref()
        .take(header.remaining_length() as u64)
        .read_to_end(&mut body)?;
    if body.len() < header.remaining_length() {
        return Err(DecodeError::IncompletePacket);
    }

    Ok((header, Source::new(body, options)))
}

/// Writes the fixed header and then the body of `packet`.
///
/// The body is encoded twice: once into a [`ByteCounter`] to learn the remaining length, and once for real.
pub(crate) fn encode_packet<T, B>(
    packet: &T,
    version: ProtocolVersion,
    dst: &mut B,
) -> Result<(), EncodeError>
where
    T: PacketMeta,
    B: ByteBuf,
{
    let mut counter = ByteCounter::new();
    packet.encode(&mut counter)?;

    let header = FixedHeader::new(T::PACKET_TYPE, packet.flags(), counter.len(), version)?;

    tracing::trace!(
        packet_type = %T::PACKET_TYPE,
        remaining_length = counter.len(),
        "encoding packet"
    );

    header.encode(dst)?;
    packet.encode(dst)
}

/// A control packet of a single protocol version.
///
/// Implementors provide body decoding and whole-packet encoding.
/// The provided methods apply them to buffers, slices and streams.
pub trait ControlPacket: Sized {
    const PROTOCOL_VERSION: ProtocolVersion;

    fn packet_type(&self) -> PacketType;

    /// Decodes the packet whose fixed header is `header` from its body.
    /// Fails with [`DecodeError::TrailingGarbage`] if `src` is not fully consumed.
    fn decode_body(header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError>;

    /// Encodes the whole packet, fixed header included.
    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf;

    /// Decodes one packet from the front of `src`. See [`decode_frame`] for what happens when `src` is incomplete.
    fn decode_from(src: &mut Bytes, options: DecodeOptions) -> Result<Self, DecodeError> {
        let (header, mut body) = decode_frame(src, Self::PROTOCOL_VERSION, options)?;
        Self::decode_body(&header, &mut body)
    }

    /// Decodes one packet from the front of `src` and returns it with the number of octets it occupied.
    ///
    /// Only the packet's own octets are copied, once, and its strings and payloads are slices of that copy.
    fn decode_slice(src: &[u8], options: DecodeOptions) -> Result<(Self, usize), DecodeError> {
        let mut peek = src;
        let header = FixedHeader::decode(&mut peek, Self::PROTOCOL_VERSION)?;
        let frame_len = src.len() - peek.len() + header.remaining_length();

        let frame = src.get(..frame_len).unwrap_or(src);
        let mut bytes = Bytes::copy_from_slice(frame);
        let packet = Self::decode_from(&mut bytes, options)?;
        Ok((packet, frame.len() - bytes.len()))
    }

    /// Reads one packet from a stream, consuming exactly its octets.
    fn read_from<R>(reader: &mut R, options: DecodeOptions) -> Result<Self, DecodeError>
    where
        R: Read,
    {
        let (header, mut body) = read_frame(reader, Self::PROTOCOL_VERSION, options)?;
        Self::decode_body(&header, &mut body)
    }

    /// Size on the wire, fixed header included.
    fn encoded_len(&self) -> Result<usize, EncodeError> {
        let mut counter = ByteCounter::new();
        self.encode(&mut counter)?;
        Ok(counter.len())
    }

    /// Encodes into a caller-owned slice and returns the number of octets written.
    /// Nothing is written if the packet does not fit.
    fn encode_to_slice(&self, dst: &mut [u8]) -> Result<usize, EncodeError> {
        if self.encoded_len()? > dst.len() {
            return Err(EncodeError::InsufficientBuffer);
        }

        let mut buf = SliceBuf::new(dst);
        self.encode(&mut buf)?;
        Ok(buf.filled_len())
    }

    fn to_bytes(&self) -> Result<Bytes, EncodeError> {
        let mut dst = BytesMut::with_capacity(self.encoded_len()?);
        self.encode(&mut dst)?;
        Ok(dst.freeze())
    }

    /// Encodes into memory first, so a packet that fails to encode never reaches the stream half-written.
    fn write_to<W>(&self, writer: &mut W) -> Result<(), EncodeError>
    where
        W: Write,
    {
        let bytes = self.to_bytes()?;
        writer.write_all(&bytes)?;
        Ok(())
    }
}

/// A CONNECT of either protocol version.
///
/// The protocol version of a connection is only known once the first CONNECT's variable header has been read,
/// so servers decode the first packet with this type and pick [`v3`] or [`v5`] for the rest of the connection.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Connect {
    V3(v3::Connect),
    V5(v5::Connect),
}

impl Connect {
    pub fn protocol_version(&self) -> ProtocolVersion {
        match self {
            Connect::V3(_) => ProtocolVersion::V3_1_1,
            Connect::V5(_) => ProtocolVersion::V5,
        }
    }

    pub fn decode(header: &FixedHeader, src: &mut Source) -> Result<Self, DecodeError> {
        if header.packet_type() != PacketType::Connect {
            return Err(DecodeError::ExpectedConnect(header.packet_type()));
        }

        let connect = match decode_connect_start(src)? {
            ProtocolVersion::V3_1_1 => Connect::V3(v3::Connect::decode_rest(src)?),
            ProtocolVersion::V5 => Connect::V5(v5::Connect::decode_rest(src)?),
        };

        if !src.is_empty() {
            return Err(DecodeError::TrailingGarbage);
        }

        tracing::debug!(protocol_version = ?connect.protocol_version(), "decoded CONNECT");

        Ok(connect)
    }

    /// The header is decoded under 5.0 rules. CONNECT's fixed header is identical in both versions.
    pub fn decode_from(src: &mut Bytes, options: DecodeOptions) -> Result<Self, DecodeError> {
        let (header, mut body) = decode_frame(src, ProtocolVersion::V5, options)?;
        Self::decode(&header, &mut body)
    }

    pub fn read_from<R>(reader: &mut R, options: DecodeOptions) -> Result<Self, DecodeError>
    where
        R: Read,
    {
        let (header, mut body) = read_frame(reader, ProtocolVersion::V5, options)?;
        Self::decode(&header, &mut body)
    }

    pub fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        match self {
            Connect::V3(connect) => encode_packet(connect, ProtocolVersion::V3_1_1, dst),
            Connect::V5(connect) => encode_packet(connect, ProtocolVersion::V5, dst),
        }
    }
}

/// Decodes the protocol name and level that begin every CONNECT.
///
/// The name is checked first, so a 3.1 client ("MQIsdp") is rejected for its name rather than its level.
pub(crate) fn decode_connect_start(src: &mut Source) -> Result<ProtocolVersion, DecodeError> {
    let protocol_name = src.try_get_str()?;
    if protocol_name.as_bytes() != PROTOCOL_NAME {
        return Err(DecodeError::UnrecognizedProtocolName(
            protocol_name.as_str().to_owned(),
        ));
    }

    let protocol_level = src.try_get_u8()?;
    Ok(ProtocolVersion::try_from(protocol_level)?)
}

pub(crate) fn encode_connect_start<B>(version: ProtocolVersion, dst: &mut B) -> Result<(), EncodeError>
where
    B: ByteBuf,
{
    dst.try_put_binary(PROTOCOL_NAME)?;
    dst.try_put_u8(version.into())
}

/// Bits of the CONNECT flags octet.
///
/// Ref:
/// - 3.1.1: 3.1.2.3 Connect Flags
/// - 5.0:   3.1.2.3 Connect Flags
pub(crate) mod connect_flags {
    pub(crate) const USERNAME: u8 = 0b1000_0000;
    pub(crate) const PASSWORD: u8 = 0b0100_0000;
    pub(crate) const WILL_RETAIN: u8 = 0b0010_0000;
    pub(crate) const WILL_QOS: u8 = 0b0001_1000;
    pub(crate) const WILL: u8 = 0b0000_0100;
    pub(crate) const CLEAN_START: u8 = 0b0000_0010;
    pub(crate) const RESERVED: u8 = 0b0000_0001;
}

pub(crate) fn decode_connect_flags(src: &mut Source) -> Result<u8, DecodeError> {
    let flags = src.try_get_u8()?;

    if flags & connect_flags::RESERVED != 0 {
        return Err(DecodeError::ConnectReservedSet);
    }

    if flags & connect_flags::WILL == 0
        && flags & (connect_flags::WILL_QOS | connect_flags::WILL_RETAIN) != 0
    {
        return Err(DecodeError::ConnectWillFlagsWithoutWill);
    }

    Ok(flags)
}

pub(crate) fn will_qos(flags: u8) -> Result<QoS, DecodeError> {
    QoS::try_from((flags & connect_flags::WILL_QOS) >> 3)
}

pub(crate) fn encode_connect_flags(
    client_id: &ClientId,
    will: Option<(QoS, bool)>,
    has_username: bool,
    has_password: bool,
) -> u8 {
    let mut flags = match client_id {
        ClientId::ServerGenerated | ClientId::IdWithCleanSession(_) => connect_flags::CLEAN_START,
        ClientId::IdWithExistingSession(_) => 0,
    };

    if let Some((qos, retain)) = will {
        flags |= connect_flags::WILL | (u8::from(qos) << 3);
        if retain {
            flags |= connect_flags::WILL_RETAIN;
        }
    }

    if has_username {
        flags |= connect_flags::USERNAME;
    }

    if has_password {
        flags |= connect_flags::PASSWORD;
    }

    flags
}

/// Pairs a decoded client identifier with the clean start flag.
///
/// An empty identifier with clean start is [`ClientId::ServerGenerated`]. Without clean start it stays
/// [`ClientId::IdWithExistingSession`] with an empty id, which 5.0 permits.
pub(crate) fn client_id_from(client_id: ByteStr, connect_flags: u8) -> ClientId {
    if connect_flags & connect_flags::CLEAN_START == 0 {
        ClientId::IdWithExistingSession(client_id)
    } else if client_id.is_empty() {
        ClientId::ServerGenerated
    } else {
        ClientId::IdWithCleanSession(client_id)
    }
}

pub(crate) fn encode_client_id<B>(client_id: &ClientId, dst: &mut B) -> Result<(), EncodeError>
where
    B: ByteBuf,
{
    match client_id {
        ClientId::ServerGenerated => dst.try_put_binary(&[]),
        ClientId::IdWithCleanSession(id) if id.is_empty() => {
            Err(EncodeError::ConnectZeroLengthIdWithCleanSession)
        }
        ClientId::IdWithCleanSession(id) | ClientId::IdWithExistingSession(id) => id.encode(dst),
    }
}

pub(crate) fn encode_keep_alive<B>(keep_alive: Duration, dst: &mut B) -> Result<(), EncodeError>
where
    B: ByteBuf,
{
    let keep_alive_secs = u16::try_from(keep_alive.as_secs())
        .map_err(|_| EncodeError::KeepAliveTooHigh(keep_alive))?;
    dst.try_put_u16_be(keep_alive_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v5::Properties;

    fn v5_connect() -> v5::Connect {
        v5::Connect {
            client_id: ClientId::IdWithCleanSession(ByteStr::new("sensor-1").unwrap()),
            keep_alive: Duration::from_secs(30),
            properties: Properties::new(),
            will: None,
            username: None,
            password: None,
        }
    }

    fn v3_connect() -> v3::Connect {
        v3::Connect {
            client_id: ClientId::IdWithExistingSession(ByteStr::new("sensor-1").unwrap()),
            keep_alive: Duration::from_secs(60),
            will: None,
            username: Some(ByteStr::new("user").unwrap()),
            password: None,
        }
    }

    #[test]
    fn connect_detects_protocol_version() {
        let mut src = v5::Packet::Connect(v5_connect()).to_bytes().unwrap();
        assert_eq!(
            Connect::decode_from(&mut src, DecodeOptions::default()).unwrap(),
            Connect::V5(v5_connect())
        );
        assert!(src.is_empty());

        let mut src = v3::Packet::Connect(v3_connect()).to_bytes().unwrap();
        assert_eq!(
            Connect::decode_from(&mut src, DecodeOptions::default()).unwrap(),
            Connect::V3(v3_connect())
        );

        let mut dst = vec![];
        Connect::V3(v3_connect()).encode(&mut dst).unwrap();
        let mut reader = &dst[..];
        let connect = Connect::read_from(&mut reader, DecodeOptions::default()).unwrap();
        assert_eq!(connect.protocol_version(), ProtocolVersion::V3_1_1);
        assert!(reader.is_empty());
    }

    #[test]
    fn connect_rejects_old_protocol_name() {
        let mut src = Bytes::from_static(b"\x10\x0C\x00\x06MQIsdp\x03\x02\x00\x3C");
        let err = Connect::decode_from(&mut src, DecodeOptions::default()).unwrap_err();
        match &err {
            DecodeError::UnrecognizedProtocolName(name) => assert_eq!(name, "MQIsdp"),
            err => panic!("{:?}", err),
        }
        assert_eq!(err.reason_code(), crate::ReasonCode::ProtocolError);
    }

    #[test]
    fn connect_rejects_unknown_level() {
        let mut src = Bytes::from_static(b"\x10\x0A\x00\x04MQTT\x06\x02\x00\x3C");
        let err = Connect::decode_from(&mut src, DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DecodeError::UnrecognizedProtocolVersion(6)));
        assert_eq!(err.reason_code(), crate::ReasonCode::UnsupportedProtocolVersion);
    }

    #[test]
    fn connect_requires_connect() {
        let mut src = Bytes::from_static(b"\xC0\x00");
        assert!(matches!(
            Connect::decode_from(&mut src, DecodeOptions::default()),
            Err(DecodeError::ExpectedConnect(PacketType::PingReq))
        ));
    }

    #[test]
    fn decode_frame_leaves_incomplete_input_untouched() {
        let full = v5::Packet::Connect(v5_connect()).to_bytes().unwrap();

        for len in 0..full.len() {
            let mut src = full.slice(..len);
            match decode_frame(&mut src, ProtocolVersion::V5, DecodeOptions::default()) {
                Err(DecodeError::IncompletePacket) => (),
                result => panic!("{}: {:?}", len, result),
            }
            assert_eq!(src.len(), len);
        }

        let mut src = BytesMut::from(&full[..]);
        src.extend_from_slice(b"\xC0\x00");
        let mut src = src.freeze();
        let (header, body) =
            decode_frame(&mut src, ProtocolVersion::V5, DecodeOptions::default()).unwrap();
        assert_eq!(header.packet_type(), PacketType::Connect);
        assert_eq!(body.len(), header.remaining_length());
        assert_eq!(&src[..], b"\xC0\x00");
    }

    #[test]
    fn maximum_packet_size_is_checked_before_the_body_arrives() {
        // Header announces 100 bytes of body, none of which have arrived.
        let mut src = Bytes::from_static(b"\x30\x64");
        let options = DecodeOptions::default().with_maximum_packet_size(64);
        match decode_frame(&mut src, ProtocolVersion::V5, options) {
            Err(DecodeError::PacketTooLarge {
                size: 102,
                maximum: 64,
            }) => (),
            result => panic!("{:?}", result),
        }

        let mut reader = &b"\x30\x64"[..];
        match read_frame(&mut reader, ProtocolVersion::V5, options) {
            Err(DecodeError::PacketTooLarge { .. }) => (),
            result => panic!("{:?}", result),
        }
    }

    #[test]
    fn read_frame_truncated_body() {
        let mut reader = &b"\x30\x05\x00\x01a"[..];
        match read_frame(&mut reader, ProtocolVersion::V5, DecodeOptions::default()) {
            Err(DecodeError::IncompletePacket) => (),
            result => panic!("{:?}", result),
        }
    }

    #[test]
    fn encode_to_slice() {
        let packet = v5::Packet::Connect(v5_connect());
        let len = packet.encoded_len().unwrap();

        let mut small = vec![0_u8; len - 1];
        assert!(matches!(
            packet.encode_to_slice(&mut small),
            Err(EncodeError::InsufficientBuffer)
        ));
        assert!(small.iter().all(|&b| b == 0));

        let mut exact = vec![0_u8; len + 3];
        assert_eq!(packet.encode_to_slice(&mut exact).unwrap(), len);
        assert_eq!(exact[..len], packet.to_bytes().unwrap()[..]);

        let (decoded, consumed) = v5::Packet::decode_slice(&exact, DecodeOptions::default()).unwrap();
        assert_eq!(decoded, packet);
        assert_eq!(consumed, len);
    }

    #[test]
    fn decode_slice_copies_only_the_first_packet() {
        let mut src = v5::Packet::Connect(v5_connect()).to_bytes().unwrap().to_vec();
        let len = src.len();
        src.extend_from_slice(b"\xC0\x00\xC0");

        let (packet, consumed) = v5::Packet::decode_slice(&src, DecodeOptions::default()).unwrap();
        assert_eq!(packet, v5::Packet::Connect(v5_connect()));
        assert_eq!(consumed, len);

        let (packet, consumed) =
            v5::Packet::decode_slice(&src[len..], DecodeOptions::default()).unwrap();
        assert_eq!(packet, v5::Packet::PingReq(v5::PingReq));
        assert_eq!(consumed, 2);

        assert!(matches!(
            v5::Packet::decode_slice(&src[len + 2..], DecodeOptions::default()),
            Err(DecodeError::IncompletePacket)
        ));
        assert!(matches!(
            v5::Packet::decode_slice(&src[..len - 1], DecodeOptions::default()),
            Err(DecodeError::IncompletePacket)
        ));

        let options = DecodeOptions::default().with_maximum_packet_size(4);
        assert!(matches!(
            v5::Packet::decode_slice(&src[..3], options),
            Err(DecodeError::PacketTooLarge { .. })
        ));
    }

    #[test]
    fn write_to_stream() {
        let mut out = vec![];
        v3::Packet::PingReq(v3::PingReq).write_to(&mut out).unwrap();
        v3::Packet::Disconnect(v3::Disconnect).write_to(&mut out).unwrap();
        assert_eq!(out, [0xC0_u8, 0x00, 0xE0, 0x00]);

        let mut reader = &out[..];
        assert_eq!(
            v3::Packet::read_from(&mut reader, DecodeOptions::default()).unwrap(),
            v3::Packet::PingReq(v3::PingReq)
        );
        assert_eq!(
            v3::Packet::read_from(&mut reader, DecodeOptions::default()).unwrap(),
            v3::Packet::Disconnect(v3::Disconnect)
        );
        assert!(matches!(
            v3::Packet::read_from(&mut reader, DecodeOptions::default()),
            Err(DecodeError::IncompletePacket)
        ));

        let mut buf = crate::WriteBuf::new(Vec::new());
        v3::Packet::PingReq(v3::PingReq).encode(&mut buf).unwrap();
        assert_eq!(buf.written(), 2);
        assert_eq!(buf.into_inner(), [0xC0_u8, 0x00]);
    }
}
