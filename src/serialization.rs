//! Serializer and deserializer capabilities, plus the default JSON pair.
//!
//! Structured payloads travel through the client as [`serde_json::Value`], so
//! any format that can render a value tree can plug in behind these traits
//! without the client knowing about it.

use crate::error::BoxError;
use serde_json::Value;
use std::io::Read;

/// Text encoding used for serialized request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// UTF-16, little endian, without a byte order mark.
    Utf16Le,
    /// UTF-16, big endian, without a byte order mark.
    Utf16Be,
}

impl Encoding {
    /// The charset label, as used in a `Content-Type` parameter.
    pub fn charset(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Utf16Le => "utf-16le",
            Encoding::Utf16Be => "utf-16be",
        }
    }

    /// Encodes `text` into bytes.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            Encoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        }
    }
}

/// Renders a request payload as text.
///
/// # Examples
///
/// ```
/// use courier::{BoxError, Encoding, Serializer};
/// use serde_json::Value;
///
/// struct PlainText;
///
/// impl Serializer for PlainText {
///     fn serialize(&self, value: &Value, _encoding: Encoding) -> Result<String, BoxError> {
///         Ok(value.to_string())
///     }
///
///     fn media_type(&self) -> Option<&str> {
///         None
///     }
/// }
/// ```
pub trait Serializer: Send + Sync {
    /// Serializes `value` into text that will later be encoded with `encoding`.
    fn serialize(&self, value: &Value, encoding: Encoding) -> Result<String, BoxError>;

    /// The media type of the produced text, if the format declares one.
    fn media_type(&self) -> Option<&str>;
}

/// Reads a response body into a value tree.
pub trait Deserializer: Send + Sync {
    /// Deserializes the whole body available from `reader`.
    fn deserialize(&self, reader: &mut dyn Read) -> Result<Value, BoxError>;

    /// The media type this deserializer accepts, sent as the `Accept` header.
    fn media_type(&self) -> Option<&str>;
}

/// JSON serializer, used by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn serialize(&self, value: &Value, _encoding: Encoding) -> Result<String, BoxError> {
        Ok(serde_json::to_string(value)?)
    }

    fn media_type(&self) -> Option<&str> {
        Some("application/json")
    }
}

/// JSON deserializer, used by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDeserializer;

impl Deserializer for JsonDeserializer {
    fn deserialize(&self, reader: &mut dyn Read) -> Result<Value, BoxError> {
        Ok(serde_json::from_reader(reader)?)
    }

    fn media_type(&self) -> Option<&str> {
        Some("application/json")
    }
}
