//! Sends one request over the transport and reports its lifecycle.

use crate::content::OutboundContent;
use crate::error::{ConnectionCause, Error, Result};
use crate::serialization::Deserializer;
use crate::telemetry::{Telemetry, TelemetryEvent};
use http::header::{ACCEPT, ACCEPT_CHARSET, ACCEPT_LANGUAGE, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

/// Identity of one call, carried from dispatch to the caller's result.
#[derive(Debug, Clone)]
pub(crate) struct CallContext {
    pub(crate) request_id: Uuid,
    pub(crate) uri: Url,
    pub(crate) method: Method,
    pub(crate) request_headers: HeaderMap,
    pub(crate) elapsed: Duration,
}

/// A response obtained from the transport, not yet classified.
#[derive(Debug)]
pub(crate) struct Dispatched {
    pub(crate) response: reqwest::Response,
    pub(crate) context: CallContext,
}

/// Owns the transport and the state shared by every outbound request.
#[derive(Debug, Clone)]
pub(crate) struct Dispatcher {
    pub(crate) http_client: reqwest::Client,
    pub(crate) default_headers: HeaderMap,
    pub(crate) accept_language: HeaderValue,
    pub(crate) timeout: Option<Duration>,
    pub(crate) telemetry: Telemetry,
}

impl Dispatcher {
    /// Sends one request and waits for the response head.
    ///
    /// Fails with [`Error::Connection`] when no response is obtained, including
    /// when `cancellation` fires first.
    pub(crate) async fn send(
        &self,
        method: Method,
        uri: Url,
        content: Option<OutboundContent>,
        deserializer: &dyn Deserializer,
        headers: &HeaderMap,
        cancellation: &CancellationToken,
    ) -> Result<Dispatched> {
        let mut request = reqwest::Request::new(method.clone(), uri.clone());
        let outbound = request.headers_mut();

        if let Some(media_type) = deserializer.media_type() {
            let accept = HeaderValue::try_from(media_type)
                .map_err(|e| Error::ConfigurationError(format!("Invalid media type: {}", e)))?;
            outbound.insert(ACCEPT, accept);
        }
        outbound.insert(ACCEPT_LANGUAGE, self.accept_language.clone());
        outbound.insert(ACCEPT_CHARSET, HeaderValue::from_static("utf-8"));
        outbound.extend(self.default_headers.clone());
        outbound.extend(headers.clone());

        if let Some(content) = content {
            outbound.insert(CONTENT_TYPE, content.content_type);
            *request.body_mut() = Some(content.body.into());
        }

        if let Some(timeout) = self.timeout {
            *request.timeout_mut() = Some(timeout);
        }

        let request_headers = request.headers().clone();
        let request_id = Uuid::new_v4();

        tracing::debug!(
            method = %method,
            url = %uri,
            request_id = %request_id,
            "Executing HTTP request"
        );

        let started = Instant::now();
        self.telemetry.emit(&TelemetryEvent::SendingRequest {
            request_id,
            uri: &uri,
            method: &method,
        });

        let outcome = tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(ConnectionCause::Cancelled),
            result = self.http_client.execute(request) => result.map_err(ConnectionCause::from),
        };
        let elapsed = started.elapsed();

        match outcome {
            Ok(response) => {
                let status = response.status();

                tracing::info!(
                    status = status.as_u16(),
                    latency_ms = elapsed.as_millis(),
                    request_id = %request_id,
                    "Received HTTP response"
                );

                self.telemetry.emit(&TelemetryEvent::ReceivedResponse {
                    request_id,
                    uri: &uri,
                    method: &method,
                    status,
                    reason: status.canonical_reason(),
                    elapsed,
                });

                Ok(Dispatched {
                    response,
                    context: CallContext {
                        request_id,
                        uri,
                        method,
                        request_headers,
                        elapsed,
                    },
                })
            }
            Err(cause) => {
                tracing::warn!(
                    error = %cause,
                    method = %method,
                    url = %uri,
                    latency_ms = elapsed.as_millis(),
                    request_id = %request_id,
                    "Failed to get a response from server"
                );

                self.telemetry.emit(&TelemetryEvent::Failed {
                    request_id,
                    uri: &uri,
                    method: &method,
                    error: &cause,
                    elapsed,
                });

                Err(Error::Connection {
                    request_id,
                    uri,
                    method,
                    elapsed,
                    cause,
                })
            }
        }
    }
}

/// Two-letter language of the process locale, for `Accept-Language`.
///
/// Reads `LC_ALL`, `LC_MESSAGES` and `LANG` in that order and falls back to
/// `en` when none names a language.
pub(crate) fn system_language() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find_map(|value| language_of(&value))
        .unwrap_or_else(|| "en".to_string())
}

fn language_of(locale: &str) -> Option<String> {
    let language = locale.split(['_', '.', '@', '-']).next()?;
    if language.len() != 2 || !language.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(language.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_of_locale() {
        assert_eq!(language_of("fr_FR.UTF-8").as_deref(), Some("fr"));
        assert_eq!(language_of("DE").as_deref(), Some("de"));
        assert_eq!(language_of("pt-BR").as_deref(), Some("pt"));
        assert_eq!(language_of("C"), None);
        assert_eq!(language_of("POSIX"), None);
        assert_eq!(language_of(""), None);
    }

    #[test]
    fn test_system_language_is_two_letters() {
        let language = system_language();
        assert_eq!(language.len(), 2);
        assert!(language.chars().all(|c| c.is_ascii_lowercase()));
    }
}
