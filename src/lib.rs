//! # Courier - a declarative HTTP client
//!
//! Courier turns a declarative request description (verb, route, headers,
//! query parameters, body) into an HTTP call against a base server address.
//! It negotiates how the body is serialized and how the response is read,
//! classifies every failure into one of a few well-formed error kinds, and
//! notifies listeners around every call. It is built on top of `reqwest`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use courier::{Client, HttpVerb, RequestDescriptor};
//! use serde::{Deserialize, Serialize};
//! use std::time::Duration;
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//!     email: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), courier::Error> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")?
//!         .timeout(Duration::from_secs(30))
//!         .build()?;
//!
//!     // Typed result
//!     let user = client.get::<User>("users/123").await?;
//!     println!("User: {} ({:?})", user.data.name, user.latency);
//!
//!     // Full descriptor
//!     let request = RequestDescriptor::new(HttpVerb::Post, "users")
//!         .with_query_param("notify", "true")
//!         .with_content(&CreateUser {
//!             name: "Alice".to_string(),
//!             email: "alice@example.com".to_string(),
//!         })?;
//!     let created = client.execute_as::<User>(request).await?;
//!     println!("Created user with ID: {}", created.data.id);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Call shapes
//!
//! Every call goes through the same pipeline and differs only in how a
//! successful body is consumed:
//!
//! - [`Client::execute`] - reads and discards the body
//! - [`Client::execute_as`] - deserializes the body into `T`
//! - [`Client::execute_bytes`] - returns the body as [`bytes::Bytes`]
//! - [`Client::execute_stream`] - returns the unread [`BodyStream`]
//!
//! ## Error Handling
//!
//! ```no_run
//! use courier::{Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().base_url("https://api.example.com")?.build()?;
//! match client.get::<serde_json::Value>("endpoint").await {
//!     Ok(response) => println!("Success: {:?}", response.data),
//!     Err(Error::Protocol(err)) => {
//!         eprintln!("HTTP error {} from {} {}", err.status, err.method, err.uri);
//!         eprintln!("  Body: {:?}", err.body);
//!     }
//!     Err(Error::Connection { cause, request_id, .. }) => {
//!         eprintln!("Request {} never got a response: {}", request_id, cause);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The client never retries.
//!
//! ## Telemetry
//!
//! Listeners receive [`TelemetryEvent::SendingRequest`] and then either
//! [`TelemetryEvent::ReceivedResponse`] or [`TelemetryEvent::Failed`] for each
//! call, all carrying the same correlation id. The crate also logs through
//! `tracing`; install a subscriber to see those records.

mod classify;
mod client;
mod content;
mod dispatch;
mod error;
mod request;
mod response;
mod serialization;
mod telemetry;
mod uri;

pub use classify::BodyStream;
pub use client::{Client, ClientBuilder};
pub use content::{ContentKind, Payload};
pub use error::{BoxError, ConnectionCause, Error, ProtocolError, Result};
pub use request::{HttpVerb, RequestDescriptor};
pub use response::Response;
pub use serialization::{Deserializer, Encoding, JsonDeserializer, JsonSerializer, Serializer};
pub use telemetry::{TelemetryEvent, TelemetryListener};
pub use uri::QueryParams;
pub use tokio_util::sync::CancellationToken;
