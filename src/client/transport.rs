//! Outbound HTTP transport
//!
//! One [`Transport`] implementation talks to the real platform over
//! `reqwest`; tests substitute their own. The transport is credential-free:
//! callers that need auth attach a bearer token before handing the request
//! over.

use async_trait::async_trait;
use http::Method;
use serde::Deserialize;
use serde_json::Value;

use crate::config::BotConfig;
use crate::error::{Error, PlatformError, Result};

/// One outbound request to the platform.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// API path, e.g. `/im/v1/messages`
    pub path: String,
    /// URL query parameters
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
    /// Form-data fields
    pub form: Vec<(String, String)>,
    /// Multipart file parts
    pub files: Vec<FilePart>,
    /// Whether a bearer token must be injected before sending
    pub auth: bool,
    pub(crate) bearer: Option<String>,
}

/// One file in a multipart upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name
    pub name: String,
    /// File name reported to the platform
    pub file_name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl ApiRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: Vec::new(),
            body: None,
            form: Vec::new(),
            files: Vec::new(),
            auth: true,
            bearer: None,
        }
    }

    /// Build a GET request for `path`.
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    /// Build a POST request for `path`.
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    /// Append a query parameter.
    pub fn query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Set the JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a form-data field.
    pub fn form_field<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Attach a file, switching the request to multipart.
    pub fn file<N: Into<String>, F: Into<String>>(mut self, name: N, file_name: F, bytes: Vec<u8>) -> Self {
        self.files.push(FilePart {
            name: name.into(),
            file_name: file_name.into(),
            bytes,
        });
        self
    }

    /// Mark the request as not requiring a bearer token (token-issuance
    /// endpoints only).
    pub fn unauthenticated(mut self) -> Self {
        self.auth = false;
        self
    }

    /// The bearer token injected for this request, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }
}

/// Parsed platform response envelope.
///
/// Every endpoint answers `{code, msg, data}`; the token-issuance endpoints
/// additionally carry their payload beside `code`/`msg` rather than under
/// `data`, so unrecognized top-level fields are retained in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    /// Response code; 0 means success
    #[serde(default)]
    pub code: i64,
    /// Error message, empty on success
    #[serde(default)]
    pub msg: String,
    /// Response payload
    #[serde(default)]
    pub data: Value,
    /// Top-level fields outside the standard envelope
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ApiResponse {
    /// Parse an envelope from a JSON value.
    pub fn parse(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Succeed with the envelope, or surface a non-zero `code` as a
    /// [`PlatformError`].
    pub fn ok(self) -> Result<Self> {
        if self.code != 0 {
            return Err(PlatformError {
                code: self.code,
                msg: self.msg,
            }
            .into());
        }
        Ok(self)
    }

    /// String field beside the standard envelope.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.extra.get(name).and_then(Value::as_str)
    }

    /// Unsigned integer field beside the standard envelope.
    pub fn u64_field(&self, name: &str) -> Option<u64> {
        self.extra.get(name).and_then(Value::as_u64)
    }
}

/// Outbound request execution seam.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute the request and parse the response envelope.
    ///
    /// A non-zero envelope `code` is NOT an error at this layer; callers
    /// decide whether it means [`PlatformError`] or a credential failure.
    async fn request(&self, req: ApiRequest) -> Result<ApiResponse>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport for the configured base URL.
    pub fn new(config: &BotConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url_trimmed(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, req: ApiRequest) -> Result<ApiResponse> {
        let url = format!("{}{}", self.base_url, req.path);
        let mut builder = self.http.request(req.method.clone(), &url);

        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(token) = &req.bearer {
            builder = builder.bearer_auth(token);
        }

        if !req.files.is_empty() {
            let mut form = reqwest::multipart::Form::new();
            for (key, value) in &req.form {
                form = form.text(key.clone(), value.clone());
            }
            for file in &req.files {
                form = form.part(
                    file.name.clone(),
                    reqwest::multipart::Part::bytes(file.bytes.clone())
                        .file_name(file.file_name.clone()),
                );
            }
            builder = builder.multipart(form);
        } else if !req.form.is_empty() {
            builder = builder.form(&req.form);
        } else if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        serde_json::from_slice::<ApiResponse>(&bytes).map_err(|e| {
            Error::internal(format!(
                "unparseable platform response (HTTP {status}): {e}"
            ))
        })
    }
}
