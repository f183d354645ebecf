//! Request lifecycle notifications.
//!
//! Every call emits [`TelemetryEvent::SendingRequest`] followed by exactly one
//! of [`TelemetryEvent::ReceivedResponse`] or [`TelemetryEvent::Failed`]. All
//! events of a call carry the same `request_id`.
//!
//! Listeners run inline on the calling task. A panicking listener is caught at
//! the emission site and logged; it never changes the outcome of the call.

use crate::error::ConnectionCause;
use http::{Method, StatusCode};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// A lifecycle notification for one call.
#[derive(Debug)]
pub enum TelemetryEvent<'a> {
    /// The request is about to be handed to the transport.
    SendingRequest {
        /// Correlation id of the call
        request_id: Uuid,
        /// The request URI
        uri: &'a Url,
        /// The request method
        method: &'a Method,
    },

    /// The transport returned a response (of any status).
    ReceivedResponse {
        /// Correlation id of the call
        request_id: Uuid,
        /// The request URI
        uri: &'a Url,
        /// The request method
        method: &'a Method,
        /// The response status
        status: StatusCode,
        /// The reason phrase for the status, if known
        reason: Option<&'a str>,
        /// Time spent waiting on the transport
        elapsed: Duration,
    },

    /// The transport failed before a response was obtained.
    Failed {
        /// Correlation id of the call
        request_id: Uuid,
        /// The request URI
        uri: &'a Url,
        /// The request method
        method: &'a Method,
        /// The originating failure
        error: &'a ConnectionCause,
        /// Time spent waiting on the transport
        elapsed: Duration,
    },
}

impl TelemetryEvent<'_> {
    /// The correlation id shared by all events of a call.
    pub fn request_id(&self) -> Uuid {
        match self {
            TelemetryEvent::SendingRequest { request_id, .. }
            | TelemetryEvent::ReceivedResponse { request_id, .. }
            | TelemetryEvent::Failed { request_id, .. } => *request_id,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            TelemetryEvent::SendingRequest { .. } => "sending_request",
            TelemetryEvent::ReceivedResponse { .. } => "received_response",
            TelemetryEvent::Failed { .. } => "failed",
        }
    }
}

/// Receives lifecycle notifications.
///
/// Implemented for any `Fn(&TelemetryEvent<'_>) + Send + Sync` closure.
///
/// # Examples
///
/// ```no_run
/// use courier::{Client, TelemetryEvent};
///
/// # fn example() -> Result<(), courier::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .listener(|event: &TelemetryEvent<'_>| {
///         if let TelemetryEvent::ReceivedResponse { status, elapsed, .. } = event {
///             println!("{} in {:?}", status, elapsed);
///         }
///     })
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub trait TelemetryListener: Send + Sync {
    /// Called for every event of every call made by the client.
    fn on_event(&self, event: &TelemetryEvent<'_>);
}

impl<F> TelemetryListener for F
where
    F: Fn(&TelemetryEvent<'_>) + Send + Sync,
{
    fn on_event(&self, event: &TelemetryEvent<'_>) {
        self(event)
    }
}

/// The set of registered listeners.
#[derive(Clone, Default)]
pub(crate) struct Telemetry {
    listeners: Vec<Arc<dyn TelemetryListener>>,
}

impl Telemetry {
    pub(crate) fn subscribe(&mut self, listener: Arc<dyn TelemetryListener>) {
        self.listeners.push(listener);
    }

    /// Delivers `event` to every listener, isolating each one.
    pub(crate) fn emit(&self, event: &TelemetryEvent<'_>) {
        for listener in &self.listeners {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event)));
            if delivered.is_err() {
                tracing::warn!(
                    request_id = %event.request_id(),
                    event = event.name(),
                    "Telemetry listener panicked; ignoring"
                );
            }
        }
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
