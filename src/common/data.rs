use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use url::Url;

/// A record of one completed HTTP request received by a `MockServer`.
///
/// Entries are created once per request, after its body has been received completely,
/// and never change afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RequestLogEntry {
    url: Url,
    method: String,
    body: String,
}

impl RequestLogEntry {
    pub(crate) fn new(url: Url, method: String, body: String) -> Self {
        Self { url, method, body }
    }

    /// The absolute URL of the request, reconstructed from the `Host` header and the
    /// request target (e.g. `http://127.0.0.1:8080/search?q=1`).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The path component of the request URL. Requests to the server root always
    /// have the path `/`.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// The HTTP method exactly as it was sent by the client (e.g. `GET`).
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The request body decoded as UTF-8. Invalid byte sequences are replaced with
    /// `U+FFFD`. Requests without a body have an empty string here.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Deserializes the request body from JSON.
    ///
    /// **Example**:
    /// ```
    /// use mumbo::RequestLogEntry;
    /// use serde_json::Value;
    ///
    /// fn assert_payload(entry: &RequestLogEntry) {
    ///     let payload: Value = entry.json_body().unwrap();
    ///     assert_eq!(payload["test"], "object");
    /// }
    /// ```
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

impl fmt::Display for RequestLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// The response a mock route answers with.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MockedResponse {
    pub status_code: u16,
    pub body: Option<String>,
}

impl MockedResponse {
    /// A response with the given status code and no body.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            body: None,
        }
    }

    /// Sets the response body. The body is written to the client verbatim.
    pub fn with_body<S: Into<String>>(mut self, body: S) -> Self {
        self.body = Some(body.into());
        self
    }

    /// A response with the given status code and the JSON serialization of `body`.
    ///
    /// **Example**:
    /// ```
    /// use mumbo::MockedResponse;
    /// use serde_json::json;
    ///
    /// let response = MockedResponse::json(200, &json!({"test": "response"})).unwrap();
    /// assert_eq!(response.body.as_deref(), Some(r#"{"test":"response"}"#));
    /// ```
    pub fn json<T: Serialize + ?Sized>(status_code: u16, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(status_code).with_body(serde_json::to_string(body)?))
    }
}

/// Produces the response for a matched mock route.
///
/// A producer is called once for every request its route matches, so it can return a
/// different response each time. Every `Fn() -> MockedResponse` closure is a producer.
///
/// Producers are called while the server holds its internal state lock and must not call
/// back into the `MockServer` they are registered on.
pub trait ResponseProducer {
    fn produce(&self) -> MockedResponse;
}

impl<F> ResponseProducer for F
where
    F: Fn() -> MockedResponse,
{
    fn produce(&self) -> MockedResponse {
        (self)()
    }
}
