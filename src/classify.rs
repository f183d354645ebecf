//! Splits transport responses into readable bodies and protocol errors.

use crate::dispatch::{CallContext, Dispatched};
use crate::error::{ConnectionCause, Error, ProtocolError, Result};
use bytes::{Bytes, BytesMut};
use futures::Stream;
use http::{HeaderMap, Method, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

/// The unread body of a successful response.
///
/// Nothing has been consumed when a `BodyStream` is handed out, so reading it
/// to the end reproduces the bytes sent by the server. Dropping it releases the
/// underlying connection. Reads stop with [`Error::ReadBody`] if the call's
/// cancellation token fires.
///
/// # Examples
///
/// ```no_run
/// use courier::{Client, HttpVerb, RequestDescriptor};
///
/// # async fn example() -> Result<(), courier::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// let mut body = client
///     .execute_stream(RequestDescriptor::new(HttpVerb::Get, "exports/latest"))
///     .await?;
///
/// let mut total = 0;
/// while let Some(chunk) = body.chunk().await? {
///     total += chunk.len();
/// }
/// println!("Downloaded {} bytes", total);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct BodyStream {
    response: reqwest::Response,
    context: CallContext,
    cancellation: CancellationToken,
}

impl BodyStream {
    /// The HTTP status of the response.
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// The correlation id of the call.
    pub fn request_id(&self) -> Uuid {
        self.context.request_id
    }

    /// The request URI.
    pub fn uri(&self) -> &Url {
        &self.context.uri
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.context.method
    }

    /// Time spent waiting for the response head.
    pub fn latency(&self) -> Duration {
        self.context.elapsed
    }

    /// Reads the next chunk of the body, or `None` at the end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadBody`] if the transport fails or the call is cancelled.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>> {
        let outcome = tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(ConnectionCause::Cancelled),
            chunk = self.response.chunk() => chunk.map_err(ConnectionCause::from),
        };
        outcome.map_err(|cause| Error::ReadBody {
            request_id: self.context.request_id,
            uri: self.context.uri.clone(),
            method: self.context.method.clone(),
            cause,
        })
    }

    /// Reads the whole remaining body into memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadBody`] if the transport fails or the call is cancelled.
    pub async fn bytes(mut self) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = self.chunk().await? {
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }

    /// Converts the body into a [`Stream`] of chunks.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes>> {
        futures::stream::try_unfold(self, |mut body| async move {
            let chunk = body.chunk().await?;
            Ok::<_, Error>(chunk.map(|chunk| (chunk, body)))
        })
    }
}

/// Returns the body of a 2xx response, or a [`ProtocolError`] for anything else.
///
/// The body of a failed response is drained eagerly. Failures while draining
/// are recorded in the error instead of being returned on their own.
pub(crate) async fn classify(
    dispatched: Dispatched,
    cancellation: &CancellationToken,
) -> Result<BodyStream> {
    let Dispatched { response, context } = dispatched;
    let status = response.status();

    if status.is_success() {
        return Ok(BodyStream {
            response,
            context,
            cancellation: cancellation.clone(),
        });
    }

    let (body, source) = match drain(response, cancellation).await {
        Ok(text) => (Some(text), None),
        Err(cause) => (None, Some(cause)),
    };

    if status.is_client_error() {
        tracing::error!(
            status = status.as_u16(),
            response = body.as_deref().unwrap_or_default(),
            request_id = %context.request_id,
            "Client error (4xx)"
        );
    } else if status.is_server_error() {
        tracing::warn!(
            status = status.as_u16(),
            response = body.as_deref().unwrap_or_default(),
            request_id = %context.request_id,
            "Server error (5xx)"
        );
    }

    Err(ProtocolError {
        request_id: context.request_id,
        status,
        reason: status.canonical_reason().map(str::to_string),
        uri: context.uri,
        method: context.method,
        request_headers: context.request_headers,
        body,
        source,
    }
    .into())
}

async fn drain(
    response: reqwest::Response,
    cancellation: &CancellationToken,
) -> std::result::Result<String, ConnectionCause> {
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Err(ConnectionCause::Cancelled),
        text = response.text() => text.map_err(ConnectionCause::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn dispatched(status: u16, body: &'static str) -> Dispatched {
        let response = http::Response::builder()
            .status(status)
            .body(body)
            .unwrap();
        let mut request_headers = HeaderMap::new();
        request_headers.insert("x-trace", "abc".parse().unwrap());
        Dispatched {
            response: reqwest::Response::from(response),
            context: CallContext {
                request_id: Uuid::new_v4(),
                uri: Url::parse("http://api.test/items/5").unwrap(),
                method: Method::GET,
                request_headers,
                elapsed: Duration::from_millis(3),
            },
        }
    }

    #[tokio::test]
    async fn test_success_body_is_returned_unread() {
        let body = classify(dispatched(200, "hello world"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(body.status(), StatusCode::OK);
        assert_eq!(body.latency(), Duration::from_millis(3));
        assert_eq!(&body.bytes().await.unwrap()[..], b"hello world");
    }

    #[tokio::test]
    async fn test_success_body_as_stream() {
        let body = classify(dispatched(201, "chunked"), &CancellationToken::new())
            .await
            .unwrap();
        let chunks: Vec<Bytes> = body.into_stream().try_collect().await.unwrap();
        assert_eq!(chunks.concat(), b"chunked");
    }

    #[tokio::test]
    async fn test_failure_drains_body_into_protocol_error() {
        let call = dispatched(404, "not found");
        let request_id = call.context.request_id;
        let err = classify(call, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            Error::Protocol(err) => {
                assert_eq!(err.request_id, request_id);
                assert_eq!(err.status, StatusCode::NOT_FOUND);
                assert_eq!(err.reason.as_deref(), Some("Not Found"));
                assert_eq!(err.body.as_deref(), Some("not found"));
                assert_eq!(err.method, Method::GET);
                assert_eq!(err.uri.as_str(), "http://api.test/items/5");
                assert_eq!(err.request_headers["x-trace"], "abc");
                assert!(err.source.is_none());
            }
            other => panic!("Expected Protocol error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_error_body_is_kept_as_empty_text() {
        let err = classify(dispatched(503, ""), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(err.response_body(), Some(""));
    }

    #[tokio::test]
    async fn test_cancelled_drain_is_absorbed() {
        let token = CancellationToken::new();
        token.cancel();
        let err = classify(dispatched(500, "boom"), &token).await.unwrap_err();
        match err {
            Error::Protocol(err) => {
                assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
                assert!(err.body.is_none());
                assert!(matches!(err.source, Some(ConnectionCause::Cancelled)));
            }
            other => panic!("Expected Protocol error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_read_fails_with_read_body() {
        let token = CancellationToken::new();
        let body = classify(dispatched(200, "data"), &token).await.unwrap();
        token.cancel();
        let err = body.bytes().await.unwrap_err();
        assert!(matches!(
            err,
            Error::ReadBody {
                cause: ConnectionCause::Cancelled,
                ..
            }
        ));
    }
}
