// Copyright (c) Microsoft. All rights reserved.

//! Properties carried in the variable header of 5.0 packets, and in the will of CONNECT.
//!
//! Each property identifier has a fixed wire type and is either repeatable or allowed at most once.
//! A property block is a variable byte integer length followed by that many octets of identifier-value pairs,
//! kept in wire order.
//!
//! Ref: 2.2.2 Properties

use bytes::Bytes;

use crate::{varint, ByteBuf, ByteStr, DecodeError, EncodeError, ReasonCode, Source};

define_u8_code! {
    /// Ref: 2.2.2.2 Property
    PropertyId,
    UnrecognizedPropertyIdentifier,
    PayloadFormatIndicator = 0x01,
    MessageExpiryInterval = 0x02,
    ContentType = 0x03,
    ResponseTopic = 0x08,
    CorrelationData = 0x09,
    SubscriptionIdentifier = 0x0B,
    SessionExpiryInterval = 0x11,
    AssignedClientIdentifier = 0x12,
    ServerKeepAlive = 0x13,
    AuthenticationMethod = 0x15,
    AuthenticationData = 0x16,
    RequestProblemInformation = 0x17,
    WillDelayInterval = 0x18,
    RequestResponseInformation = 0x19,
    ResponseInformation = 0x1A,
    ServerReference = 0x1C,
    ReasonString = 0x1F,
    ReceiveMaximum = 0x21,
    TopicAliasMaximum = 0x22,
    TopicAlias = 0x23,
    MaximumQoS = 0x24,
    RetainAvailable = 0x25,
    UserProperty = 0x26,
    MaximumPacketSize = 0x27,
    WildcardSubscriptionAvailable = 0x28,
    SubscriptionIdentifierAvailable = 0x29,
    SharedSubscriptionAvailable = 0x2A,
}

/// How a property value is represented on the wire.
///
/// Ref: 1.5 Data representation
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PropertyType {
    Byte,
    TwoByteInteger,
    FourByteInteger,
    VariableByteInteger,
    Utf8String,
    Utf8StringPair,
    BinaryData,
}

/// The registry entry for a property identifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PropertySpec {
    pub value_type: PropertyType,
    pub repeatable: bool,
}

impl PropertyId {
    pub fn spec(self) -> PropertySpec {
        let (value_type, repeatable) = match self {
            PropertyId::PayloadFormatIndicator => (PropertyType::Byte, false),
            PropertyId::MessageExpiryInterval => (PropertyType::FourByteInteger, false),
            PropertyId::ContentType => (PropertyType::Utf8String, false),
            PropertyId::ResponseTopic => (PropertyType::Utf8String, false),
            PropertyId::CorrelationData => (PropertyType::BinaryData, false),
            PropertyId::SubscriptionIdentifier => (PropertyType::VariableByteInteger, true),
            PropertyId::SessionExpiryInterval => (PropertyType::FourByteInteger, false),
            PropertyId::AssignedClientIdentifier => (PropertyType::Utf8String, false),
            PropertyId::ServerKeepAlive => (PropertyType::TwoByteInteger, false),
            PropertyId::AuthenticationMethod => (PropertyType::Utf8String, false),
            PropertyId::AuthenticationData => (PropertyType::BinaryData, false),
            PropertyId::RequestProblemInformation => (PropertyType::Byte, false),
            PropertyId::WillDelayInterval => (PropertyType::FourByteInteger, false),
            PropertyId::RequestResponseInformation => (PropertyType::Byte, false),
            PropertyId::ResponseInformation => (PropertyType::Utf8String, false),
            PropertyId::ServerReference => (PropertyType::Utf8String, false),
            PropertyId::ReasonString => (PropertyType::Utf8String, false),
            PropertyId::ReceiveMaximum => (PropertyType::TwoByteInteger, false),
            PropertyId::TopicAliasMaximum => (PropertyType::TwoByteInteger, false),
            PropertyId::TopicAlias => (PropertyType::TwoByteInteger, false),
            PropertyId::MaximumQoS => (PropertyType::Byte, false),
            PropertyId::RetainAvailable => (PropertyType::Byte, false),
            PropertyId::UserProperty => (PropertyType::Utf8StringPair, true),
            PropertyId::MaximumPacketSize => (PropertyType::FourByteInteger, false),
            PropertyId::WildcardSubscriptionAvailable => (PropertyType::Byte, false),
            PropertyId::SubscriptionIdentifierAvailable => (PropertyType::Byte, false),
            PropertyId::SharedSubscriptionAvailable => (PropertyType::Byte, false),
        };

        PropertySpec {
            value_type,
            repeatable,
        }
    }

    /// Checks the value's wire type, and for the properties with a restricted range, the value itself.
    fn check_value(self, value: &PropertyValue) -> Result<(), PropertyError> {
        let expected = self.spec().value_type;
        let actual = value.value_type();
        if expected != actual {
            return Err(PropertyError::TypeMismatch {
                property: self,
                expected,
                actual,
            });
        }

        let invalid = match (self, value) {
            (
                PropertyId::PayloadFormatIndicator
                | PropertyId::RequestProblemInformation
                | PropertyId::RequestResponseInformation
                | PropertyId::MaximumQoS
                | PropertyId::RetainAvailable
                | PropertyId::WildcardSubscriptionAvailable
                | PropertyId::SubscriptionIdentifierAvailable
                | PropertyId::SharedSubscriptionAvailable,
                PropertyValue::Byte(value),
            ) if *value > 1 => Some(u32::from(*value)),

            (PropertyId::ReceiveMaximum | PropertyId::TopicAlias, PropertyValue::TwoByteInteger(0))
            | (PropertyId::MaximumPacketSize, PropertyValue::FourByteInteger(0))
            | (PropertyId::SubscriptionIdentifier, PropertyValue::VariableByteInteger(0)) => Some(0),

            (_, PropertyValue::VariableByteInteger(value))
                if usize::try_from(*value).map_or(true, |value| value > varint::MAX) =>
            {
                Some(*value)
            }

            _ => None,
        };

        match invalid {
            Some(value) => Err(PropertyError::InvalidValue {
                property: self,
                value,
            }),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum PropertyError {
    #[error("duplicate property {0:?}")]
    Duplicate(PropertyId),
    #[error("property {0:?} is not allowed in this packet")]
    NotAllowed(PropertyId),
    #[error("property {property:?} takes a {expected:?} value, not a {actual:?} value")]
    TypeMismatch {
        property: PropertyId,
        expected: PropertyType,
        actual: PropertyType,
    },
    #[error("property {property:?} set to invalid value {value}")]
    InvalidValue { property: PropertyId, value: u32 },
}

impl PropertyError {
    pub fn reason_code(self) -> ReasonCode {
        ReasonCode::ProtocolError
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PropertyValue {
    Byte(u8),
    TwoByteInteger(u16),
    FourByteInteger(u32),
    VariableByteInteger(u32),
    Utf8String(ByteStr),
    Utf8StringPair(ByteStr, ByteStr),
    BinaryData(Bytes),
}

impl PropertyValue {
    pub fn value_type(&self) -> PropertyType {
        match self {
            PropertyValue::Byte(_) => PropertyType::Byte,
            PropertyValue::TwoByteInteger(_) => PropertyType::TwoByteInteger,
            PropertyValue::FourByteInteger(_) => PropertyType::FourByteInteger,
            PropertyValue::VariableByteInteger(_) => PropertyType::VariableByteInteger,
            PropertyValue::Utf8String(_) => PropertyType::Utf8String,
            PropertyValue::Utf8StringPair(_, _) => PropertyType::Utf8StringPair,
            PropertyValue::BinaryData(_) => PropertyType::BinaryData,
        }
    }

    /// Any of the integer types, widened.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            PropertyValue::Byte(value) => Some((*value).into()),
            PropertyValue::TwoByteInteger(value) => Some((*value).into()),
            PropertyValue::FourByteInteger(value) | PropertyValue::VariableByteInteger(value) => {
                Some(*value)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Utf8String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_str_pair(&self) -> Option<(&str, &str)> {
        match self {
            PropertyValue::Utf8StringPair(name, value) => Some((name.as_str(), value.as_str())),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PropertyValue::BinaryData(value) => Some(value),
            _ => None,
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            PropertyValue::Byte(_) => 1,
            PropertyValue::TwoByteInteger(_) => 2,
            PropertyValue::FourByteInteger(_) => 4,
            PropertyValue::VariableByteInteger(value) => varint::encoded_len(*value as usize),
            PropertyValue::Utf8String(value) => value.encoded_len(),
            PropertyValue::Utf8StringPair(name, value) => name.encoded_len() + value.encoded_len(),
            PropertyValue::BinaryData(value) => 2 + value.len(),
        }
    }

    fn decode(value_type: PropertyType, src: &mut Source) -> Result<Self, DecodeError> {
        Ok(match value_type {
            PropertyType::Byte => PropertyValue::Byte(src.try_get_u8()?),
            PropertyType::TwoByteInteger => PropertyValue::TwoByteInteger(src.try_get_u16_be()?),
            PropertyType::FourByteInteger => PropertyValue::FourByteInteger(src.try_get_u32_be()?),
            PropertyType::VariableByteInteger => {
                let value = src.try_get_varint()?;
                PropertyValue::VariableByteInteger(
                    u32::try_from(value).map_err(|_| DecodeError::MalformedVariableByteInteger)?,
                )
            }
            PropertyType::Utf8String => PropertyValue::Utf8String(src.try_get_str()?),
            PropertyType::Utf8StringPair => {
                let name = src.try_get_str()?;
                let value = src.try_get_str()?;
                PropertyValue::Utf8StringPair(name, value)
            }
            PropertyType::BinaryData => PropertyValue::BinaryData(src.try_get_binary()?),
        })
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        match self {
            PropertyValue::Byte(value) => dst.try_put_u8(*value),
            PropertyValue::TwoByteInteger(value) => dst.try_put_u16_be(*value),
            PropertyValue::FourByteInteger(value) => dst.try_put_u32_be(*value),
            PropertyValue::VariableByteInteger(value) => varint::encode(*value as usize, dst),
            PropertyValue::Utf8String(value) => value.encode(dst),
            PropertyValue::Utf8StringPair(name, value) => {
                name.encode(dst)?;
                value.encode(dst)
            }
            PropertyValue::BinaryData(value) => dst.try_put_binary(value),
        }
    }
}

/// A property identifier with a value of the matching type.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Property {
    id: PropertyId,
    value: PropertyValue,
}

impl Property {
    pub fn new(id: PropertyId, value: PropertyValue) -> Result<Self, PropertyError> {
        id.check_value(&value)?;
        Ok(Property { id, value })
    }

    pub fn user_property(name: ByteStr, value: ByteStr) -> Self {
        Property {
            id: PropertyId::UserProperty,
            value: PropertyValue::Utf8StringPair(name, value),
        }
    }

    pub fn id(&self) -> PropertyId {
        self.id
    }

    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    pub fn into_value(self) -> PropertyValue {
        self.value
    }

    // Identifiers are variable byte integers on the wire, but every defined one fits in a single octet.
    fn decode(src: &mut Source) -> Result<Self, DecodeError> {
        let id = PropertyId::try_from(src.try_get_u8()?)?;
        let value = PropertyValue::decode(id.spec().value_type, src)?;
        Ok(Property::new(id, value)?)
    }

    fn encode<B>(&self, dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        dst.try_put_u8(self.id.into())?;
        self.value.encode(dst)
    }
}

/// The properties of one packet, in wire order.
///
/// Non-repeatable properties appear at most once.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Properties(Vec<Property>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.0.iter()
    }

    /// Appends a property, rejecting a second occurrence of a non-repeatable one.
    pub fn insert(&mut self, property: Property) -> Result<(), PropertyError> {
        if !property.id.spec().repeatable && self.contains(property.id) {
            return Err(PropertyError::Duplicate(property.id));
        }

        self.0.push(property);
        Ok(())
    }

    /// Shorthand for [`Property::new`] followed by [`Properties::insert`].
    pub fn push(&mut self, id: PropertyId, value: PropertyValue) -> Result<(), PropertyError> {
        self.insert(Property::new(id, value)?)
    }

    pub fn contains(&self, id: PropertyId) -> bool {
        self.0.iter().any(|property| property.id == id)
    }

    /// The first value for `id`.
    pub fn get(&self, id: PropertyId) -> Option<&PropertyValue> {
        self.get_all(id).next()
    }

    pub fn get_all(&self, id: PropertyId) -> impl Iterator<Item = &PropertyValue> + '_ {
        self.0
            .iter()
            .filter(move |property| property.id == id)
            .map(|property| &property.value)
    }

    pub fn user_properties(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.get_all(PropertyId::UserProperty)
            .filter_map(PropertyValue::as_str_pair)
    }

    fn body_len(&self) -> usize {
        self.0
            .iter()
            .map(|property| 1 + property.value.encoded_len())
            .sum()
    }

    /// Size on the wire, length prefix included.
    pub fn encoded_len(&self) -> usize {
        let body_len = self.body_len();
        varint::encoded_len(body_len) + body_len
    }

    /// Decodes a property block, rejecting any identifier not in `allowed`.
    pub(crate) fn decode(src: &mut Source, allowed: &[PropertyId]) -> Result<Self, DecodeError> {
        let len = src.try_get_varint()?;
        let mut block = src.split_to(len)?;

        let mut properties = Properties::new();
        while !block.is_empty() {
            let property = Property::decode(&mut block)?;
            if !allowed.contains(&property.id) {
                return Err(PropertyError::NotAllowed(property.id).into());
            }
            properties.insert(property)?;
        }

        Ok(properties)
    }

    pub(crate) fn encode<B>(&self, allowed: &[PropertyId], dst: &mut B) -> Result<(), EncodeError>
    where
        B: ByteBuf,
    {
        if let Some(property) = self.0.iter().find(|property| !allowed.contains(&property.id)) {
            return Err(PropertyError::NotAllowed(property.id).into());
        }

        varint::encode(self.body_len(), dst)?;
        for property in &self.0 {
            property.encode(dst)?;
        }

        Ok(())
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
