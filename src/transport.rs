// HTTP transport: a blocking reqwest client behind a small trait so the
// client logic can be driven by a scripted double in tests.

use reqwest::blocking::{multipart, Client};
use reqwest::Method;
use std::fs::File;
use std::time::Duration;
use zeroize::Zeroizing;

use crate::error::TransportError;

pub const APP_ID_HEADER: &str = "X-App-Id";
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A fully resolved API request.
#[derive(Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Zeroizing<Vec<u8>>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// One HTTP round trip per call. Implementations return the response body
/// verbatim regardless of status code; only failing to get a body at all
/// is an error.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<String, TransportError>;

    /// POST `file` as the single multipart field `field` to `url`.
    fn upload(
        &self,
        url: &str,
        field: &str,
        file_name: &str,
        file: File,
    ) -> Result<String, TransportError>;
}

/// `Transport` backed by `reqwest::blocking`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(format!("instamojo-tool/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<String, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .body(request.body.to_vec());
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let res = builder.send()?;
        tracing::debug!(status = %res.status(), url = %request.url, "response received");
        Ok(res.text()?)
    }

    fn upload(
        &self,
        url: &str,
        field: &str,
        file_name: &str,
        file: File,
    ) -> Result<String, TransportError> {
        let part = multipart::Part::reader(file).file_name(file_name.to_string());
        let form = multipart::Form::new().part(field.to_string(), part);

        let res = self.client.post(url).multipart(form).send()?;
        tracing::debug!(status = %res.status(), url, "upload response received");
        Ok(res.text()?)
    }
}
