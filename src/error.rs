//! Error types for HTTP calls.
//!
//! Every failure a call can produce is one variant of [`Error`]. Callers tell
//! "never reached the server" ([`Error::Connection`]) apart from "the server
//! answered with an error" ([`Error::Protocol`]) by variant, and can recover the
//! correlation id, URI and method from either.

use crate::content::ContentKind;
use http::{HeaderMap, Method, StatusCode};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Boxed error returned by serializer and deserializer implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The main error type for HTTP calls.
///
/// # Examples
///
/// ```no_run
/// use courier::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// match client.get::<serde_json::Value>("endpoint").await {
///     Ok(response) => println!("Success: {:?}", response.data),
///     Err(Error::Protocol(err)) => {
///         eprintln!("HTTP error {}: {:?}", err.status, err.body);
///     }
///     Err(Error::Connection { cause, elapsed, .. }) => {
///         eprintln!("No response after {:?}: {}", elapsed, cause);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No HTTP response was obtained (DNS, TCP, TLS, timeout or cancellation).
    ///
    /// The originating cause is kept in `cause`. The client never retries.
    #[error("Failed to get a response from server ({method} {uri}): {cause}")]
    Connection {
        /// Correlation id shared with the telemetry events of this call
        request_id: Uuid,
        /// The request URI
        uri: Url,
        /// The request method
        method: Method,
        /// Time spent waiting on the transport
        elapsed: Duration,
        /// The underlying failure
        #[source]
        cause: ConnectionCause,
    },

    /// The server returned a non-2xx HTTP status code.
    #[error(transparent)]
    Protocol(Box<ProtocolError>),

    /// The content kind cannot carry the supplied payload.
    ///
    /// This is a programming error detected before any network activity.
    #[error("Content kind {kind:?} cannot carry {payload}")]
    UnsupportedContentKind {
        /// The declared content kind
        kind: ContentKind,
        /// Description of the payload that was supplied
        payload: &'static str,
    },

    /// The base address, route and query did not form an absolute URI.
    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    /// The request method is not a valid HTTP token.
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(#[from] http::method::InvalidMethod),

    /// Invalid configuration was provided.
    ///
    /// This indicates a problem with how the client or request was configured,
    /// such as a missing base address or an invalid header value.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The serializer could not render the request payload.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// The deserializer could not turn a successful response body into the requested type.
    #[error("Failed to deserialize response (status {status}): {error}")]
    DeserializationFailed {
        /// Correlation id of the call
        request_id: Uuid,
        /// The HTTP status code
        status: StatusCode,
        /// The deserializer's error message
        error: String,
    },

    /// A successful response body could not be read to completion.
    #[error("Failed to read response body ({method} {uri}): {cause}")]
    ReadBody {
        /// Correlation id of the call
        request_id: Uuid,
        /// The request URI
        uri: Url,
        /// The request method
        method: Method,
        /// The underlying failure
        #[source]
        cause: ConnectionCause,
    },
}

/// Why a transport wait ended without a usable result.
#[derive(thiserror::Error, Debug)]
pub enum ConnectionCause {
    /// The transport reported an error (connect, TLS, timeout, I/O).
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The call's cancellation token fired.
    #[error("request was cancelled")]
    Cancelled,
}

impl ConnectionCause {
    /// Returns `true` if the transport gave up because of a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConnectionCause::Transport(e) if e.is_timeout())
    }

    /// Returns `true` if the call was cancelled by its token.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConnectionCause::Cancelled)
    }
}

/// A non-success HTTP response, with everything needed to diagnose it.
#[derive(thiserror::Error, Debug)]
#[error("HTTP error {status} ({method} {uri}): {}", .body.as_deref().unwrap_or(""))]
pub struct ProtocolError {
    /// Correlation id of the call
    pub request_id: Uuid,
    /// The HTTP status code
    pub status: StatusCode,
    /// The reason phrase for the status, if known
    pub reason: Option<String>,
    /// The request URI
    pub uri: Url,
    /// The request method
    pub method: Method,
    /// The headers that were sent with the request
    pub request_headers: HeaderMap,
    /// The drained response body; `None` only when it could not be read
    pub body: Option<String>,
    /// Failure raised while draining the body, if any
    #[source]
    pub source: Option<ConnectionCause>,
}

impl From<ProtocolError> for Error {
    fn from(err: ProtocolError) -> Self {
        Error::Protocol(Box::new(err))
    }
}

impl Error {
    /// Returns the correlation id of the call that failed, if the failure
    /// happened after dispatch began.
    pub fn request_id(&self) -> Option<Uuid> {
        match self {
            Error::Connection { request_id, .. }
            | Error::DeserializationFailed { request_id, .. }
            | Error::ReadBody { request_id, .. } => Some(*request_id),
            Error::Protocol(err) => Some(err.request_id),
            _ => None,
        }
    }

    /// Returns the request URI, if known.
    pub fn uri(&self) -> Option<&Url> {
        match self {
            Error::Connection { uri, .. } | Error::ReadBody { uri, .. } => Some(uri),
            Error::Protocol(err) => Some(&err.uri),
            _ => None,
        }
    }

    /// Returns the request method, if known.
    pub fn method(&self) -> Option<&Method> {
        match self {
            Error::Connection { method, .. } | Error::ReadBody { method, .. } => Some(method),
            Error::Protocol(err) => Some(&err.method),
            _ => None,
        }
    }

    /// Returns the HTTP status code if a response was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Protocol(err) => Some(err.status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the drained error body of a non-2xx response.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Error::Protocol(err) => err.body.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if the server was never reached.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Returns `true` if the server answered with a non-2xx status.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol(_))
    }
}

/// A specialized `Result` type for HTTP calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol_error(status: StatusCode, body: Option<&str>) -> ProtocolError {
        ProtocolError {
            request_id: Uuid::new_v4(),
            status,
            reason: status.canonical_reason().map(str::to_string),
            uri: Url::parse("http://api.test/items/5").unwrap(),
            method: Method::GET,
            request_headers: HeaderMap::new(),
            body: body.map(str::to_string),
            source: None,
        }
    }

    #[test]
    fn test_protocol_error_display() {
        let error: Error = protocol_error(StatusCode::NOT_FOUND, Some("not found")).into();
        assert_eq!(
            error.to_string(),
            "HTTP error 404 Not Found (GET http://api.test/items/5): not found"
        );
    }

    #[test]
    fn test_protocol_error_accessors() {
        let inner = protocol_error(StatusCode::BAD_REQUEST, Some("bad"));
        let id = inner.request_id;
        let error: Error = inner.into();

        assert!(error.is_protocol());
        assert!(!error.is_connection());
        assert_eq!(error.request_id(), Some(id));
        assert_eq!(error.status(), Some(StatusCode::BAD_REQUEST));
        assert_eq!(error.response_body(), Some("bad"));
        assert_eq!(error.method(), Some(&Method::GET));
        assert_eq!(error.uri().map(Url::as_str), Some("http://api.test/items/5"));
    }

    #[test]
    fn test_connection_error_cancelled() {
        let error = Error::Connection {
            request_id: Uuid::new_v4(),
            uri: Url::parse("http://api.test/").unwrap(),
            method: Method::POST,
            elapsed: Duration::from_millis(5),
            cause: ConnectionCause::Cancelled,
        };

        assert!(error.is_connection());
        assert_eq!(error.status(), None);
        assert_eq!(
            error.to_string(),
            "Failed to get a response from server (POST http://api.test/): request was cancelled"
        );
        match &error {
            Error::Connection { cause, .. } => {
                assert!(cause.is_cancelled());
                assert!(!cause.is_timeout());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_structural_errors_have_no_call_context() {
        let error = Error::UnsupportedContentKind {
            kind: ContentKind::ByteArray,
            payload: "a structured value",
        };
        assert_eq!(error.request_id(), None);
        assert_eq!(error.uri(), None);
        assert_eq!(
            error.to_string(),
            "Content kind ByteArray cannot carry a structured value"
        );

        let error: Error = Url::parse("not a uri").unwrap_err().into();
        assert!(matches!(error, Error::InvalidUri(_)));
    }
}
