// Copyright (c) Microsoft. All rights reserved.

use crate::{ByteBuf, DecodeError, EncodeError, FixedHeader, PacketMeta, PacketType, Source};

/// Ref: 3.12 PINGREQ – PING request
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PingReq;

/// Ref: 3.13 PINGRESP – PING response
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PingResp;

impl PacketMeta for PingReq {
    const PACKET_TYPE: PacketType = PacketType::PingReq;

    fn decode(_header: &FixedHeader, _src: &mut Source) -> Result<Self, DecodeError> {
        Ok(PingReq)
    }

    fn encode<B>(&self, _dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        Ok(())
    }
}

impl PacketMeta for PingResp {
    const PACKET_TYPE: PacketType = PacketType::PingResp;

    fn decode(_header: &FixedHeader, _src: &mut Source) -> Result<Self, DecodeError> {
        Ok(PingResp)
    }

    fn encode<B>(&self, _dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::v5::tests::roundtrip;
    use crate::v5::Packet;

    #[test]
    fn ping() {
        assert_eq!(roundtrip(&Packet::PingReq(PingReq)), &b"\xC0\x00"[..]);
        assert_eq!(roundtrip(&Packet::PingResp(PingResp)), &b"\xD0\x00"[..]);
    }
}
