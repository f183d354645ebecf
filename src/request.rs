//! Declarative request description.

use crate::content::{ContentKind, Payload};
use crate::serialization::{Deserializer, Serializer};
use crate::uri::QueryParams;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The HTTP verbs a request can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpVerb {
    /// `GET`
    #[default]
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// WebDAV `COPY`
    Copy,
}

impl TryFrom<HttpVerb> for Method {
    type Error = http::method::InvalidMethod;

    fn try_from(verb: HttpVerb) -> Result<Self, Self::Error> {
        Ok(match verb {
            HttpVerb::Get => Method::GET,
            HttpVerb::Post => Method::POST,
            HttpVerb::Put => Method::PUT,
            HttpVerb::Delete => Method::DELETE,
            HttpVerb::Head => Method::HEAD,
            HttpVerb::Patch => Method::PATCH,
            HttpVerb::Copy => Method::from_bytes(b"COPY")?,
        })
    }
}

/// Everything needed to execute one HTTP call.
///
/// A descriptor is handed to one of the client's execution methods by value;
/// the client reads it and never changes it. Cloning a descriptor and
/// executing both copies performs two independent calls.
///
/// # Examples
///
/// ```
/// use courier::{ContentKind, HttpVerb, RequestDescriptor};
/// use serde_json::json;
///
/// let request = RequestDescriptor::new(HttpVerb::Put, "items/42")
///     .with_header("x-trace", "abc")?
///     .with_query_param("notify", "true")
///     .with_content(&json!({"id": 42, "data": "DATA"}))?;
///
/// assert_eq!(request.content_kind, ContentKind::String);
/// # Ok::<(), courier::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct RequestDescriptor {
    /// The HTTP verb.
    pub verb: HttpVerb,

    /// The route, relative to the client's base address. Empty means the base address itself.
    pub route: String,

    /// Headers for this call. They override the client's default headers.
    pub headers: HeaderMap,

    /// Query parameters, written to the URI in insertion order.
    pub query_params: QueryParams,

    /// Forms parameters, used when `content_kind` is [`ContentKind::Forms`].
    pub forms_params: Vec<(String, String)>,

    /// How the payload goes on the wire.
    pub content_kind: ContentKind,

    /// Serializer used instead of the client default.
    pub serializer: Option<Arc<dyn Serializer>>,

    /// Deserializer used instead of the client default.
    pub deserializer: Option<Arc<dyn Deserializer>>,

    /// The request payload.
    pub payload: Option<Payload>,

    /// Cancels the call when triggered.
    pub cancellation: CancellationToken,
}

impl RequestDescriptor {
    /// Creates a descriptor with the given verb and route and nothing else.
    pub fn new(verb: HttpVerb, route: impl Into<String>) -> Self {
        Self {
            verb,
            route: route.into(),
            ..Default::default()
        }
    }

    /// Adds a header, replacing any previous value for the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, crate::Error> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter, replacing any previous value for the same key.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key, value);
        self
    }

    /// Adds multiple query parameters.
    pub fn with_query_params(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.query_params.extend(params);
        self
    }

    /// Appends a forms parameter and switches the content kind to [`ContentKind::Forms`].
    ///
    /// The same key may be added several times.
    pub fn with_form_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.forms_params.push((key.into(), value.into()));
        self.content_kind = ContentKind::Forms;
        self
    }

    /// Sets a serializable payload, sent as [`ContentKind::String`].
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be represented as a JSON value tree.
    pub fn with_content<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, crate::Error> {
        let value = serde_json::to_value(body)
            .map_err(|e| crate::Error::SerializationFailed(e.to_string()))?;
        self.payload = Some(Payload::Value(value));
        self.content_kind = ContentKind::String;
        Ok(self)
    }

    /// Sets a raw byte payload, sent as [`ContentKind::ByteArray`].
    pub fn with_bytes(mut self, bytes: impl Into<Bytes>) -> Self {
        self.payload = Some(Payload::Bytes(bytes.into()));
        self.content_kind = ContentKind::ByteArray;
        self
    }

    /// Overrides the content kind.
    pub fn with_content_kind(mut self, kind: ContentKind) -> Self {
        self.content_kind = kind;
        self
    }

    /// Serializes the payload with `serializer` instead of the client default.
    pub fn serialize_with(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Deserializes the response with `deserializer` instead of the client default.
    pub fn deserialize_with(mut self, deserializer: Arc<dyn Deserializer>) -> Self {
        self.deserializer = Some(deserializer);
        self
    }

    /// Ties the call to a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("verb", &self.verb)
            .field("route", &self.route)
            .field("headers", &self.headers)
            .field("query_params", &self.query_params)
            .field("forms_params", &self.forms_params)
            .field("content_kind", &self.content_kind)
            .field("serializer", &self.serializer.is_some())
            .field("deserializer", &self.deserializer.is_some())
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}
