use std::fmt;
use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::ApiError;

pub const HTTP_NO_CONTENT: u16 = 204;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(String),
    Multipart(Vec<FormPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Moves one request over the wire.
///
/// Implementations only report failures of the exchange itself; status codes
/// are interpreted by [`ApiClient`].
pub trait Transport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse, ApiError>>;
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'_, Result<HttpResponse, ApiError>> {
        (**self).send(request)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

pub struct ApiClient<T> {
    transport: T,
    base_url: String,
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a request and decodes the response body as `R`.
    ///
    /// `Ok(None)` means the service answered 204 No Content. Any other
    /// success must decode; non-success statuses become [`ApiError::Remote`].
    pub async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Option<R>, ApiError> {
        let response = self.exchange(method, path, body).await?;
        if response.status == HTTP_NO_CONTENT {
            return Ok(None);
        }

        serde_json::from_str(&response.body)
            .map(Some)
            .map_err(|e| ApiError::Decode(format!("{} {}: {}", method, path, e)))
    }

    pub async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.send_json(Method::Get, path, RequestBody::Empty).await
    }

    /// Like [`ApiClient::request`] but a 204 is an error.
    pub async fn send_json<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<R, ApiError> {
        self.request(method, path, body)
            .await?
            .ok_or_else(|| ApiError::Decode(format!("{} {} returned no content", method, path)))
    }

    /// Sends a request whose response body is not needed.
    pub async fn execute(&self, method: Method, path: &str) -> Result<(), ApiError> {
        self.exchange(method, path, RequestBody::Empty)
            .await
            .map(|_| ())
    }

    async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<HttpResponse, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("{} {}", method, url);

        let response = self
            .transport
            .send(HttpRequest {
                method,
                url: url.clone(),
                body,
            })
            .await
            .inspect_err(|err| log::error!("{} {} failed: {}", method, url, err))?;

        if !response.is_success() {
            let err = remote_error(&response);
            log::warn!("{} {} returned {}: {}", method, url, response.status, err);
            return Err(err);
        }
        Ok(response)
    }
}

/// Prefers the service's `detail` message over the status text.
fn remote_error(response: &HttpResponse) -> ApiError {
    let detail = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|body| body.detail)
        .and_then(|detail| match detail {
            serde_json::Value::String(text) => Some(text),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| {
            if response.status_text.is_empty() {
                format!("HTTP {}", response.status)
            } else {
                response.status_text.clone()
            }
        });

    ApiError::Remote {
        status: response.status,
        detail,
    }
}
