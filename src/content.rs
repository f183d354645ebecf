//! Content negotiation for request bodies.

use crate::error::{Error, Result};
use crate::serialization::{Encoding, Serializer};
use bytes::Bytes;
use http::HeaderValue;
use serde_json::Value;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const OCTET_STREAM: &str = "application/octet-stream";

/// How the request payload should be put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    /// No body.
    #[default]
    None,
    /// Payload serialized to text by the effective serializer.
    String,
    /// Forms parameters, URL-encoded.
    Forms,
    /// Raw bytes.
    ByteArray,
    /// Serialized like [`ContentKind::String`].
    Stream,
}

/// The request payload, before negotiation.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A structured value, rendered by a serializer.
    Value(Value),
    /// Raw bytes, sent as-is.
    Bytes(Bytes),
}

impl Payload {
    fn describe(&self) -> &'static str {
        match self {
            Payload::Value(_) => "a structured value",
            Payload::Bytes(_) => "raw bytes",
        }
    }
}

/// A negotiated request body together with its media type.
#[derive(Debug)]
pub(crate) struct OutboundContent {
    pub(crate) body: Bytes,
    pub(crate) content_type: HeaderValue,
}

/// Turns a payload into a transport-ready body according to `kind`.
///
/// Returns `Ok(None)` when there is nothing to send.
pub(crate) fn negotiate(
    kind: ContentKind,
    serializer: &dyn Serializer,
    payload: Option<&Payload>,
    forms: &[(String, String)],
    encoding: Encoding,
) -> Result<Option<OutboundContent>> {
    match (kind, payload) {
        (ContentKind::None, _) => Ok(None),
        (ContentKind::String | ContentKind::Stream, None) => Ok(None),
        (ContentKind::String | ContentKind::Stream, Some(Payload::Value(value))) => {
            let text = serializer
                .serialize(value, encoding)
                .map_err(|e| Error::SerializationFailed(e.to_string()))?;
            let content_type = match serializer.media_type() {
                Some(media_type) => HeaderValue::try_from(media_type).map_err(|e| {
                    Error::ConfigurationError(format!("Invalid media type: {}", e))
                })?,
                None => {
                    HeaderValue::try_from(format!("text/plain; charset={}", encoding.charset()))
                        .map_err(|e| {
                            Error::ConfigurationError(format!("Invalid media type: {}", e))
                        })?
                }
            };
            Ok(Some(OutboundContent {
                body: Bytes::from(encoding.encode(&text)),
                content_type,
            }))
        }
        (ContentKind::Forms, _) => {
            let encoded = serde_urlencoded::to_string(forms)
                .map_err(|e| Error::SerializationFailed(e.to_string()))?;
            Ok(Some(OutboundContent {
                body: Bytes::from(encoded),
                content_type: HeaderValue::from_static(FORM_URLENCODED),
            }))
        }
        (ContentKind::ByteArray, None) => Ok(None),
        (ContentKind::ByteArray, Some(Payload::Bytes(bytes))) => Ok(Some(OutboundContent {
            body: bytes.clone(),
            content_type: HeaderValue::from_static(OCTET_STREAM),
        })),
        (kind, Some(payload)) => Err(Error::UnsupportedContentKind {
            kind,
            payload: payload.describe(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::JsonSerializer;
    use serde_json::json;

    struct Untyped;

    impl Serializer for Untyped {
        fn serialize(
            &self,
            value: &Value,
            _encoding: Encoding,
        ) -> std::result::Result<String, crate::BoxError> {
            Ok(value.to_string())
        }

        fn media_type(&self) -> Option<&str> {
            None
        }
    }

    fn json_content(
        kind: ContentKind,
        payload: Option<&Payload>,
        forms: &[(String, String)],
    ) -> Result<Option<OutboundContent>> {
        negotiate(kind, &JsonSerializer, payload, forms, Encoding::Utf8)
    }

    #[test]
    fn test_no_content() {
        let payload = Payload::Value(json!({"id": 1}));
        assert!(json_content(ContentKind::None, Some(&payload), &[])
            .unwrap()
            .is_none());
        assert!(json_content(ContentKind::String, None, &[]).unwrap().is_none());
        assert!(json_content(ContentKind::Stream, None, &[]).unwrap().is_none());
        assert!(json_content(ContentKind::ByteArray, None, &[]).unwrap().is_none());
    }

    #[test]
    fn test_serialized_content_uses_serializer_media_type() {
        let payload = Payload::Value(json!({"id": 42, "data": "DATA"}));
        let content = json_content(ContentKind::String, Some(&payload), &[])
            .unwrap()
            .unwrap();
        assert_eq!(content.content_type, "application/json");
        assert_eq!(&content.body[..], br#"{"data":"DATA","id":42}"#);
    }

    #[test]
    fn test_serialized_content_without_media_type_falls_back_to_text() {
        let payload = Payload::Value(json!("hi"));
        let content = negotiate(
            ContentKind::Stream,
            &Untyped,
            Some(&payload),
            &[],
            Encoding::Utf16Le,
        )
        .unwrap()
        .unwrap();
        assert_eq!(content.content_type, "text/plain; charset=utf-16le");
        assert_eq!(content.body.to_vec(), Encoding::Utf16Le.encode("\"hi\""));
    }

    #[test]
    fn test_forms_preserve_order_and_duplicates() {
        let forms = vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "x y".to_string()),
            ("b".to_string(), "3".to_string()),
        ];
        let ignored = Payload::Value(json!({"ignored": true}));
        let content = json_content(ContentKind::Forms, Some(&ignored), &forms)
            .unwrap()
            .unwrap();
        assert_eq!(content.content_type, FORM_URLENCODED);
        assert_eq!(&content.body[..], b"b=2&a=x+y&b=3");
    }

    #[test]
    fn test_byte_array() {
        let payload = Payload::Bytes(Bytes::from_static(&[0, 1, 2, 255]));
        let content = json_content(ContentKind::ByteArray, Some(&payload), &[])
            .unwrap()
            .unwrap();
        assert_eq!(content.content_type, OCTET_STREAM);
        assert_eq!(&content.body[..], &[0, 1, 2, 255]);
    }

    #[test]
    fn test_mismatched_payload_is_unsupported() {
        let value = Payload::Value(json!([1, 2]));
        let err = json_content(ContentKind::ByteArray, Some(&value), &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedContentKind {
                kind: ContentKind::ByteArray,
                ..
            }
        ));

        let bytes = Payload::Bytes(Bytes::from_static(b"raw"));
        let err = json_content(ContentKind::String, Some(&bytes), &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedContentKind {
                kind: ContentKind::String,
                payload: "raw bytes"
            }
        ));
    }
}
