// Copyright (c) Microsoft. All rights reserved.

use crate::{ByteBuf, DecodeError, EncodeError, PacketType, Source};

define_u8_code! {
    /// The result of an operation, carried by 5.0 acknowledgements, DISCONNECT and AUTH.
    ///
    /// Values below 0x80 indicate success, 0x80 and above indicate failure.
    ///
    /// Ref: 5.0: 2.4 Reason Code
    ReasonCode,
    UnrecognizedReasonCode,
    Success = 0x00,
    GrantedQoS1 = 0x01,
    GrantedQoS2 = 0x02,
    DisconnectWithWillMessage = 0x04,
    NoMatchingSubscribers = 0x10,
    NoSubscriptionExisted = 0x11,
    ContinueAuthentication = 0x18,
    ReAuthenticate = 0x19,
    UnspecifiedError = 0x80,
    MalformedPacket = 0x81,
    ProtocolError = 0x82,
    ImplementationSpecificError = 0x83,
    UnsupportedProtocolVersion = 0x84,
    ClientIdentifierNotValid = 0x85,
    BadUserNameOrPassword = 0x86,
    NotAuthorized = 0x87,
    ServerUnavailable = 0x88,
    ServerBusy = 0x89,
    Banned = 0x8A,
    ServerShuttingDown = 0x8B,
    BadAuthenticationMethod = 0x8C,
    KeepAliveTimeout = 0x8D,
    SessionTakenOver = 0x8E,
    TopicFilterInvalid = 0x8F,
    TopicNameInvalid = 0x90,
    PacketIdentifierInUse = 0x91,
    PacketIdentifierNotFound = 0x92,
    ReceiveMaximumExceeded = 0x93,
    TopicAliasInvalid = 0x94,
    PacketTooLarge = 0x95,
    MessageRateTooHigh = 0x96,
    QuotaExceeded = 0x97,
    AdministrativeAction = 0x98,
    PayloadFormatInvalid = 0x99,
    RetainNotSupported = 0x9A,
    QoSNotSupported = 0x9B,
    UseAnotherServer = 0x9C,
    ServerMoved = 0x9D,
    SharedSubscriptionsNotSupported = 0x9E,
    ConnectionRateExceeded = 0x9F,
    MaximumConnectTime = 0xA0,
    SubscriptionIdentifiersNotSupported = 0xA1,
    WildcardSubscriptionsNotSupported = 0xA2,
}

impl ReasonCode {
    /// 0x00 in DISCONNECT.
    pub const NORMAL_DISCONNECTION: ReasonCode = ReasonCode::Success;

    /// 0x00 in SUBACK.
    pub const GRANTED_QOS_0: ReasonCode = ReasonCode::Success;

    pub fn is_error(self) -> bool {
        u8::from(self) >= 0x80
    }

    /// Whether this code may appear in a packet of the given type.
    ///
    /// Only AUTH is checked against its table. Every other packet type accepts any defined reason code.
    pub fn is_allowed_in(self, packet_type: PacketType) -> bool {
        match packet_type {
            PacketType::Auth => matches!(
                self,
                ReasonCode::Success | ReasonCode::ContinueAuthentication | ReasonCode::ReAuthenticate
            ),
            _ => true,
        }
    }

    pub(crate) fn decode_for(packet_type: PacketType, src: &mut Source) -> Result<Self, DecodeError> {
        let reason_code = ReasonCode::try_from(src.try_get_u8()?)?;
        if !reason_code.is_allowed_in(packet_type) {
            return Err(DecodeError::ReasonCodeNotAllowed {
                packet_type,
                reason_code,
            });
        }

        Ok(reason_code)
    }

    pub(crate) fn encode_for<B>(self, packet_type: PacketType, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        if !self.is_allowed_in(packet_type) {
            return Err(EncodeError::ReasonCodeNotAllowed {
                packet_type,
                reason_code: self,
            });
        }

        dst.try_put_u8(self.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(ReasonCode::try_from(0x87).unwrap(), ReasonCode::NotAuthorized);
        assert_eq!(u8::from(ReasonCode::WildcardSubscriptionsNotSupported), 0xA2);
        assert_eq!(ReasonCode::NORMAL_DISCONNECTION, ReasonCode::Success);

        for code in &[0x03_u8, 0x12, 0x7F, 0xA3, 0xFF] {
            match ReasonCode::try_from(*code) {
                Err(DecodeError::UnrecognizedReasonCode(c)) => assert_eq!(c, *code),
                result => panic!("{:?}", result),
            }
        }

        assert!(!ReasonCode::GrantedQoS2.is_error());
        assert!(ReasonCode::UnspecifiedError.is_error());
    }

    #[test]
    fn auth_only_allows_its_own_codes() {
        assert!(ReasonCode::ContinueAuthentication.is_allowed_in(PacketType::Auth));
        assert!(!ReasonCode::NotAuthorized.is_allowed_in(PacketType::Auth));

        let mut src = Source::new(&b"\x87"[..], Default::default());
        match ReasonCode::decode_for(PacketType::Auth, &mut src) {
            Err(DecodeError::ReasonCodeNotAllowed {
                packet_type: PacketType::Auth,
                reason_code: ReasonCode::NotAuthorized,
            }) => (),
            result => panic!("{:?}", result),
        }

        let mut dst = vec![];
        assert!(matches!(
            ReasonCode::BadAuthenticationMethod.encode_for(PacketType::Auth, &mut dst),
            Err(EncodeError::ReasonCodeNotAllowed { .. })
        ));
        assert!(dst.is_empty());
    }

    #[test]
    fn other_packet_types_are_not_checked() {
        // These pairings are meaningless on the wire but are passed through unchanged.
        assert!(ReasonCode::ReAuthenticate.is_allowed_in(PacketType::PubAck));
        assert!(ReasonCode::GrantedQoS2.is_allowed_in(PacketType::Disconnect));
        assert!(ReasonCode::ServerMoved.is_allowed_in(PacketType::SubAck));

        let mut src = Source::new(&b"\x18"[..], Default::default());
        assert_eq!(
            ReasonCode::decode_for(PacketType::UnsubAck, &mut src).unwrap(),
            ReasonCode::ContinueAuthentication
        );
    }
}
