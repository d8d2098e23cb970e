// Copyright (c) Microsoft. All rights reserved.

use std::borrow::Cow;
use std::time::Duration;

use crate::fixed_header::{FixedHeaderError, PacketType};
use crate::topic::TopicError;
use crate::utf8::Utf8Error;
use crate::v5::PropertyError;
use crate::ReasonCode;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    // Framing
    #[error("packet is truncated")]
    IncompletePacket,
    #[error("variable byte integer has a continuation bit set on its fourth octet")]
    MalformedVariableByteInteger,
    #[error(transparent)]
    InvalidFixedHeader(#[from] FixedHeaderError),
    #[error("packet has trailing garbage")]
    TrailingGarbage,
    #[error("packet of {size} bytes exceeds the maximum packet size of {maximum} bytes")]
    PacketTooLarge { size: usize, maximum: usize },
    #[error("I/O error")]
    Io(#[source] std::io::Error),

    // Content
    #[error("invalid string: {0}")]
    InvalidString(#[from] Utf8Error),
    #[error("invalid topic name: {0}")]
    InvalidTopicName(#[source] TopicError),
    #[error("invalid topic filter: {0}")]
    InvalidTopicFilter(#[source] TopicError),
    #[error(transparent)]
    Property(#[from] PropertyError),

    // Packet rules
    #[error("the reserved bit of the CONNECT flags is set")]
    ConnectReservedSet,
    #[error("CONNECT has the password flag set without the user name flag")]
    ConnectPasswordWithoutUsername,
    #[error("CONNECT has will QoS or will retain set without the will flag")]
    ConnectWillFlagsWithoutWill,
    #[error("a zero length client_id was received without the clean session flag set")]
    ConnectZeroLengthIdWithExistingSession,
    #[error("AUTH packet has a remaining length of zero")]
    EmptyAuth,
    #[error("expected CONNECT but received {0}")]
    ExpectedConnect(PacketType),
    #[error("expected at least one topic but there were none")]
    NoTopics,
    #[error("PUBLISH packet has DUP flag set and QoS 0")]
    PublishDupAtMostOnce,
    #[error("reason code {reason_code:?} is not allowed in {packet_type}")]
    ReasonCodeNotAllowed {
        packet_type: PacketType,
        reason_code: ReasonCode,
    },
    #[error("the reserved bits of the subscription options are set")]
    SubscriptionOptionsReservedSet,
    #[error("could not parse CONNACK flags 0x{0:02X}")]
    UnrecognizedConnAckFlags(u8),
    #[error("unrecognized property identifier 0x{0:02X}")]
    UnrecognizedPropertyIdentifier(u8),
    #[error("unexpected protocol name {0:?}")]
    UnrecognizedProtocolName(String),
    #[error("unexpected protocol version {0}")]
    UnrecognizedProtocolVersion(u8),
    #[error("could not parse QoS 0x{0:02X}")]
    UnrecognizedQoS(u8),
    #[error("unrecognized reason code 0x{0:02X}")]
    UnrecognizedReasonCode(u8),
    #[error("unrecognized retain handling 0x{0:02X}")]
    UnrecognizedRetainHandling(u8),
    #[error("could not parse SUBACK return code 0x{0:02X}")]
    UnrecognizedSubAckReturnCode(u8),
    #[error("packet identifier is 0")]
    ZeroPacketIdentifier,
}

impl DecodeError {
    /// The reason code a 5.0 peer should be sent when a packet is rejected with this error.
    pub fn reason_code(&self) -> ReasonCode {
        #[allow(clippy::match_same_arms)]
        match self {
            DecodeError::IncompletePacket
            | DecodeError::MalformedVariableByteInteger
            | DecodeError::TrailingGarbage
            | DecodeError::InvalidString(_)
            | DecodeError::ConnectReservedSet
            | DecodeError::ConnectWillFlagsWithoutWill
            | DecodeError::EmptyAuth
            | DecodeError::SubscriptionOptionsReservedSet
            | DecodeError::UnrecognizedConnAckFlags(_)
            | DecodeError::UnrecognizedQoS(_)
            | DecodeError::UnrecognizedReasonCode(_)
            | DecodeError::UnrecognizedRetainHandling(_)
            | DecodeError::UnrecognizedSubAckReturnCode(_) => ReasonCode::MalformedPacket,

            DecodeError::InvalidFixedHeader(err) => err.reason_code(),

            DecodeError::PacketTooLarge { .. } => ReasonCode::PacketTooLarge,

            DecodeError::Io(_) => ReasonCode::UnspecifiedError,

            DecodeError::InvalidTopicName(_) => ReasonCode::TopicNameInvalid,
            DecodeError::InvalidTopicFilter(_) => ReasonCode::TopicFilterInvalid,

            DecodeError::Property(err) => err.reason_code(),

            DecodeError::ConnectPasswordWithoutUsername
            | DecodeError::ExpectedConnect(_)
            | DecodeError::NoTopics
            | DecodeError::PublishDupAtMostOnce
            | DecodeError::ReasonCodeNotAllowed { .. }
            | DecodeError::UnrecognizedPropertyIdentifier(_)
            | DecodeError::UnrecognizedProtocolName(_)
            | DecodeError::ZeroPacketIdentifier => ReasonCode::ProtocolError,

            DecodeError::ConnectZeroLengthIdWithExistingSession => {
                ReasonCode::ClientIdentifierNotValid
            }

            DecodeError::UnrecognizedProtocolVersion(_) => ReasonCode::UnsupportedProtocolVersion,
        }
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(err: std::io::Error) -> Self {
        // A stream that ends mid-packet is the same condition as a buffer that ends mid-packet.
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            DecodeError::IncompletePacket
        } else {
            DecodeError::Io(err)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("insufficient buffer")]
    InsufficientBuffer,
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    InvalidFixedHeader(#[from] FixedHeaderError),
    #[error("keep-alive {0:?} is too high")]
    KeepAliveTooHigh(Duration),
    #[error("remaining length {0} is too high to be encoded")]
    RemainingLengthTooHigh(usize),
    #[error("string of length {0} is too large to be encoded")]
    StringTooLarge(usize),
    #[error("binary data of length {0} is too large to be encoded")]
    BinaryTooLarge(usize),
    #[error("invalid string: {0}")]
    InvalidString(#[from] Utf8Error),
    #[error("invalid topic name: {0}")]
    InvalidTopicName(#[source] TopicError),
    #[error("invalid topic filter: {0}")]
    InvalidTopicFilter(#[source] TopicError),
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error("reason code {reason_code:?} is not allowed in {packet_type}")]
    ReasonCodeNotAllowed {
        packet_type: PacketType,
        reason_code: ReasonCode,
    },
    #[error("expected at least one topic but there were none")]
    NoTopics,
    #[error("CONNECT has a password but no user name")]
    ConnectPasswordWithoutUsername,
    #[error("a zero length client_id cannot resume an existing session")]
    ConnectZeroLengthIdWithExistingSession,
    #[error("a zero length client_id with a clean session must be ServerGenerated")]
    ConnectZeroLengthIdWithCleanSession,
}

impl EncodeError {
    /// The reason code to report when a packet could not be produced because of this error.
    pub fn reason_code(&self) -> ReasonCode {
        match self {
            EncodeError::InsufficientBuffer
            | EncodeError::Io(_)
            | EncodeError::KeepAliveTooHigh(_) => ReasonCode::UnspecifiedError,

            EncodeError::InvalidFixedHeader(err) => err.reason_code(),

            EncodeError::RemainingLengthTooHigh(_)
            | EncodeError::StringTooLarge(_)
            | EncodeError::BinaryTooLarge(_) => ReasonCode::PacketTooLarge,

            EncodeError::InvalidString(_) => ReasonCode::MalformedPacket,

            EncodeError::InvalidTopicName(_) => ReasonCode::TopicNameInvalid,
            EncodeError::InvalidTopicFilter(_) => ReasonCode::TopicFilterInvalid,

            EncodeError::Property(err) => err.reason_code(),

            EncodeError::ReasonCodeNotAllowed { .. }
            | EncodeError::NoTopics
            | EncodeError::ConnectPasswordWithoutUsername => ReasonCode::ProtocolError,

            EncodeError::ConnectZeroLengthIdWithExistingSession
            | EncodeError::ConnectZeroLengthIdWithCleanSession => {
                ReasonCode::ClientIdentifierNotValid
            }
        }
    }
}

/// A failure that carries the reason code it should be reported with.
///
/// Higher layers wrap whatever went wrong in a `PacketError` to override the code [`reason_code_of`] would otherwise pick.
#[derive(Debug)]
pub struct PacketError {
    reason_code: ReasonCode,
    context: Option<Cow<'static, str>>,
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl PacketError {
    pub fn new<E>(reason_code: ReasonCode, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        PacketError {
            reason_code,
            context: None,
            source: source.into(),
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<Cow<'static, str>>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn reason_code(&self) -> ReasonCode {
        self.reason_code
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn into_source(self) -> Box<dyn std::error::Error + Send + Sync + 'static> {
        self.source
    }
}

impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.context {
            Some(context) => write!(f, "{} ({:?})", context, self.reason_code),
            None => write!(f, "packet rejected with {:?}", self.reason_code),
        }
    }
}

impl std::error::Error for PacketError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.source)
    }
}

impl From<DecodeError> for PacketError {
    fn from(err: DecodeError) -> Self {
        PacketError::new(err.reason_code(), err)
    }
}

impl From<EncodeError> for PacketError {
    fn from(err: EncodeError) -> Self {
        PacketError::new(err.reason_code(), err)
    }
}

/// Picks the reason code to report for an arbitrary failure.
///
/// A [`PacketError`] anywhere in the source chain wins. Otherwise the outermost error this crate knows how to classify decides,
/// and anything unrecognized is [`ReasonCode::UnspecifiedError`].
pub fn reason_code_of(err: &(dyn std::error::Error + 'static)) -> ReasonCode {
    let chain = || std::iter::successors(Some(err), |err| err.source());

    if let Some(err) = chain().find_map(|err| err.downcast_ref::<PacketError>()) {
        return err.reason_code();
    }

    chain()
        .find_map(classify)
        .unwrap_or(ReasonCode::UnspecifiedError)
}

fn classify(err: &(dyn std::error::Error + 'static)) -> Option<ReasonCode> {
    if let Some(err) = err.downcast_ref::<DecodeError>() {
        Some(err.reason_code())
    } else if let Some(err) = err.downcast_ref::<EncodeError>() {
        Some(err.reason_code())
    } else if let Some(err) = err.downcast_ref::<FixedHeaderError>() {
        Some(err.reason_code())
    } else if let Some(err) = err.downcast_ref::<PropertyError>() {
        Some(err.reason_code())
    } else if let Some(err) = err.downcast_ref::<Utf8Error>() {
        Some(err.reason_code())
    } else {
        None
    }
}
