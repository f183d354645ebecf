//! HTTP client with pluggable content negotiation and lifecycle telemetry.
//!
//! The [`Client`] type is the main entry point for making HTTP requests.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    classify::{classify, BodyStream},
    content::negotiate,
    dispatch::{system_language, Dispatcher},
    request::{HttpVerb, RequestDescriptor},
    serialization::{Deserializer, Encoding, JsonDeserializer, JsonSerializer, Serializer},
    telemetry::{Telemetry, TelemetryListener},
    uri::{build_uri, normalize_base},
    Error, Response, Result,
};
use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// An HTTP client bound to one base server address.
///
/// The client is cheap to clone and safe to share between tasks. Its
/// configuration is read-only while calls are in flight: changing default
/// headers, the encoding or the listeners requires `&mut Client`, and only
/// affects this handle (clones made earlier keep their own copy).
///
/// # Examples
///
/// ```no_run
/// use courier::{Client, HttpVerb, RequestDescriptor, Response};
/// use serde::{Deserialize, Serialize};
/// use std::time::Duration;
///
/// #[derive(Serialize)]
/// struct PostRequest {
///     id: u32,
///     data: String,
/// }
///
/// #[derive(Deserialize)]
/// struct PostResponse {
///     id: u32,
///     #[serde(rename = "responseData")]
///     response_data: String,
/// }
///
/// # async fn example() -> Result<(), courier::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .timeout(Duration::from_secs(30))
///     .build()?;
///
/// let request = RequestDescriptor::new(HttpVerb::Put, "PutTest/complex")
///     .with_content(&PostRequest { id: 42, data: "DATA".to_string() })?;
/// let response: Response<PostResponse> = client.execute_as(request).await?;
/// println!("{} -> {}", response.data.id, response.data.response_data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Clone)]
struct ClientInner {
    base_url: String,
    dispatcher: Dispatcher,
    serializer: Arc<dyn Serializer>,
    deserializer: Arc<dyn Deserializer>,
    encoding: Encoding,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use courier::Client;
    ///
    /// # async fn example() -> Result<(), courier::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://api.example.com")?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The base address, always ending with `/`.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Headers sent with every request.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.inner.dispatcher.default_headers
    }

    /// Mutable access to the headers sent with every request.
    pub fn default_headers_mut(&mut self) -> &mut HeaderMap {
        &mut Arc::make_mut(&mut self.inner).dispatcher.default_headers
    }

    /// The encoding used for serialized request bodies.
    pub fn encoding(&self) -> Encoding {
        self.inner.encoding
    }

    /// Changes the encoding used for serialized request bodies.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        Arc::make_mut(&mut self.inner).encoding = encoding;
    }

    /// Registers a listener for the lifecycle events of every later call.
    pub fn subscribe(&mut self, listener: impl TelemetryListener + 'static) {
        Arc::make_mut(&mut self.inner)
            .dispatcher
            .telemetry
            .subscribe(Arc::new(listener));
    }

    /// Executes a request and discards the response body.
    ///
    /// The body is still read to the end so the connection can be reused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if no response was obtained and
    /// [`Error::Protocol`] for a non-2xx status.
    pub async fn execute(&self, request: RequestDescriptor) -> Result<Response<()>> {
        let (body, _) = self.send(request).await?;
        let (status, headers) = (body.status(), body.headers().clone());
        let (latency, request_id) = (body.latency(), body.request_id());
        body.bytes().await?;
        Ok(Response::new((), status, headers, latency, request_id))
    }

    /// Executes a request and deserializes the response body into `T`.
    ///
    /// An empty body is read as JSON `null`, so `Option<T>` yields `None` and
    /// `()` succeeds without invoking the deserializer. Use `Option<T>` when
    /// the server may answer with no body (`HEAD`, `204`); a plain struct
    /// fails with [`Error::DeserializationFailed`] in that case.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`Client::execute`], returns
    /// [`Error::DeserializationFailed`] if the body does not match `T`.
    pub async fn execute_as<T>(&self, request: RequestDescriptor) -> Result<Response<T>>
    where
        T: DeserializeOwned,
    {
        let (body, deserializer) = self.send(request).await?;
        let (status, headers) = (body.status(), body.headers().clone());
        let (latency, request_id) = (body.latency(), body.request_id());
        let raw = body.bytes().await?;

        let value = if raw.is_empty() {
            Ok(Value::Null)
        } else {
            let mut reader: &[u8] = &raw;
            deserializer.deserialize(&mut reader)
        };

        match value.and_then(|value| Ok(serde_json::from_value::<T>(value)?)) {
            Ok(data) => Ok(Response::new(data, status, headers, latency, request_id)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_response = %String::from_utf8_lossy(&raw),
                    request_id = %request_id,
                    "Failed to deserialize response"
                );

                Err(Error::DeserializationFailed {
                    request_id,
                    status,
                    error: e.to_string(),
                })
            }
        }
    }

    /// Executes a request and returns the whole response body as bytes.
    ///
    /// # Errors
    ///
    /// Same as [`Client::execute`].
    pub async fn execute_bytes(&self, request: RequestDescriptor) -> Result<Response<Bytes>> {
        let (body, _) = self.send(request).await?;
        let (status, headers) = (body.status(), body.headers().clone());
        let (latency, request_id) = (body.latency(), body.request_id());
        let data = body.bytes().await?;
        Ok(Response::new(data, status, headers, latency, request_id))
    }

    /// Executes a request and hands the unread response body to the caller.
    ///
    /// # Errors
    ///
    /// Same as [`Client::execute`].
    pub async fn execute_stream(&self, request: RequestDescriptor) -> Result<BodyStream> {
        let (body, _) = self.send(request).await?;
        Ok(body)
    }

    /// Negotiates content, dispatches and classifies one call.
    async fn send(
        &self,
        request: RequestDescriptor,
    ) -> Result<(BodyStream, Arc<dyn Deserializer>)> {
        let RequestDescriptor {
            verb,
            route,
            headers,
            query_params,
            forms_params,
            content_kind,
            serializer,
            deserializer,
            payload,
            cancellation,
        } = request;

        let serializer = serializer.unwrap_or_else(|| self.inner.serializer.clone());
        let deserializer = deserializer.unwrap_or_else(|| self.inner.deserializer.clone());
        let method = Method::try_from(verb)?;

        let content = negotiate(
            content_kind,
            serializer.as_ref(),
            payload.as_ref(),
            &forms_params,
            self.inner.encoding,
        )?;
        let uri = build_uri(&self.inner.base_url, &route, &query_params)?;

        let dispatched = self
            .inner
            .dispatcher
            .send(
                method,
                uri,
                content,
                deserializer.as_ref(),
                &headers,
                &cancellation,
            )
            .await?;
        let body = classify(dispatched, &cancellation).await?;

        Ok((body, deserializer))
    }

    /// Makes a GET request to the specified route.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use courier::Client;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct User { name: String }
    ///
    /// # async fn example() -> Result<(), courier::Error> {
    /// let client = Client::builder()
    ///     .base_url("https://api.example.com")?
    ///     .build()?;
    ///
    /// let user: courier::Response<User> = client.get("users/123").await?;
    /// println!("User: {}", user.data.name);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get<Res>(&self, route: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.execute_as(RequestDescriptor::new(HttpVerb::Get, route))
            .await
    }

    /// Makes a POST request to the specified route with a serialized body.
    pub async fn post<Req, Res>(&self, route: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let request = RequestDescriptor::new(HttpVerb::Post, route).with_content(body)?;
        self.execute_as(request).await
    }

    /// Makes a PUT request to the specified route with a serialized body.
    pub async fn put<Req, Res>(&self, route: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let request = RequestDescriptor::new(HttpVerb::Put, route).with_content(body)?;
        self.execute_as(request).await
    }

    /// Makes a DELETE request to the specified route.
    pub async fn delete<Res>(&self, route: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.execute_as(RequestDescriptor::new(HttpVerb::Delete, route))
            .await
    }

    /// Makes a PATCH request to the specified route with a serialized body.
    pub async fn patch<Req, Res>(
        &self,
        route: impl Into<String>,
        body: &Req,
    ) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let request = RequestDescriptor::new(HttpVerb::Patch, route).with_content(body)?;
        self.execute_as(request).await
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url)
            .field("default_headers", &self.inner.dispatcher.default_headers)
            .field("encoding", &self.inner.encoding)
            .field("telemetry", &self.inner.dispatcher.telemetry)
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use courier::{ClientBuilder, Encoding};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), courier::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com/v1")?
///     .timeout(Duration::from_secs(30))
///     .encoding(Encoding::Utf8)
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
///
/// assert_eq!(client.base_url(), "https://api.example.com/v1/");
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    serializer: Arc<dyn Serializer>,
    deserializer: Arc<dyn Deserializer>,
    encoding: Encoding,
    accept_language: Option<String>,
    http_client: Option<reqwest::Client>,
    telemetry: Telemetry,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with JSON content and UTF-8 encoding.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            timeout: None,
            serializer: Arc::new(JsonSerializer),
            deserializer: Arc::new(JsonDeserializer),
            encoding: Encoding::default(),
            accept_language: None,
            http_client: None,
            telemetry: Telemetry::default(),
        }
    }

    /// Sets the base address for all requests.
    ///
    /// A trailing `/` is added if missing, and routes are appended to it as-is.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the request timeout.
    ///
    /// A request that times out fails with [`Error::Connection`].
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the serializer used when a request does not override it.
    pub fn serializer(mut self, serializer: impl Serializer + 'static) -> Self {
        self.serializer = Arc::new(serializer);
        self
    }

    /// Sets the deserializer used when a request does not override it.
    pub fn deserializer(mut self, deserializer: impl Deserializer + 'static) -> Self {
        self.deserializer = Arc::new(deserializer);
        self
    }

    /// Sets the encoding used for serialized request bodies.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the `Accept-Language` value.
    ///
    /// By default the language of the process locale is used.
    pub fn accept_language(mut self, language: impl Into<String>) -> Self {
        self.accept_language = Some(language.into());
        self
    }

    /// Uses an existing `reqwest::Client` as the transport.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Registers a lifecycle listener.
    pub fn listener(mut self, listener: impl TelemetryListener + 'static) -> Self {
        self.telemetry.subscribe(Arc::new(listener));
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or if the client
    /// configuration is invalid.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder().build().map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?,
        };

        let language = self.accept_language.unwrap_or_else(system_language);
        let accept_language = HeaderValue::try_from(language).map_err(|e| {
            Error::ConfigurationError(format!("Invalid Accept-Language value: {}", e))
        })?;

        Ok(Client {
            inner: Arc::new(ClientInner {
                base_url: normalize_base(base_url.as_str()),
                dispatcher: Dispatcher {
                    http_client,
                    default_headers: self.default_headers,
                    accept_language,
                    timeout: self.timeout,
                    telemetry: self.telemetry,
                },
                serializer: self.serializer,
                deserializer: self.deserializer,
                encoding: self.encoding,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_base_url() {
        let err = Client::builder().build().unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
    }

    #[test]
    fn test_base_url_is_normalized() {
        let client = Client::builder()
            .base_url("http://api.test/v1")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://api.test/v1/");

        let client = Client::builder()
            .base_url("http://api.test")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://api.test/");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            Client::builder().base_url("not a url"),
            Err(Error::InvalidUri(_))
        ));
    }

    #[test]
    fn test_default_header_mutation_is_copy_on_write() {
        let mut client = Client::builder()
            .base_url("http://api.test")
            .unwrap()
            .default_header("x-tenant", "a")
            .unwrap()
            .build()
            .unwrap();
        let earlier = client.clone();

        client
            .default_headers_mut()
            .insert("x-tenant", HeaderValue::from_static("b"));
        client.set_encoding(Encoding::Utf16Be);

        assert_eq!(client.default_headers()["x-tenant"], "b");
        assert_eq!(earlier.default_headers()["x-tenant"], "a");
        assert_eq!(client.encoding(), Encoding::Utf16Be);
        assert_eq!(earlier.encoding(), Encoding::Utf8);
    }

    #[test]
    fn test_invalid_accept_language_is_rejected() {
        let err = Client::builder()
            .base_url("http://api.test")
            .unwrap()
            .accept_language("fr\n")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)));
    }
}
