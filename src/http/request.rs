// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! API request descriptor and parameter values

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{Serialize, Serializer};

use super::response::BaseResponse;
use super::DEFAULT_FILE_CONTENT_TYPE;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How parameters of a non-GET request are encoded into the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    /// `application/x-www-form-urlencoded`
    #[default]
    Form,
    /// Whole parameter map as one JSON object
    Json,
    /// `multipart/form-data`, byte and file values become file parts
    Multipart,
}

/// A single request parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Plain value (string, number, bool, nested JSON)
    Value(serde_json::Value),
    /// In-memory file content
    Bytes(Bytes),
    /// File on disk, read when the body is built
    File(PathBuf),
}

impl Param {
    /// Whether this value is sent as a file part in multipart bodies
    pub fn is_file(&self) -> bool {
        matches!(self, Param::Bytes(_) | Param::File(_))
    }
}

/// Strings render bare, everything else in its JSON form.
impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Value(serde_json::Value::String(s)) => f.write_str(s),
            Param::Value(v) => write!(f, "{}", v),
            Param::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Param::File(p) => write!(f, "{}", p.display()),
        }
    }
}

impl Serialize for Param {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Param::Value(v) => v.serialize(serializer),
            Param::Bytes(b) => serializer.collect_seq(b.iter()),
            Param::File(p) => p.serialize(serializer),
        }
    }
}

impl From<serde_json::Value> for Param {
    fn from(value: serde_json::Value) -> Self {
        Param::Value(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Value(serde_json::Value::String(value.to_string()))
    }
}

impl From<String> for Param {
    fn from(value: String) -> Self {
        Param::Value(serde_json::Value::String(value))
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Value(value.into())
    }
}

impl From<u64> for Param {
    fn from(value: u64) -> Self {
        Param::Value(value.into())
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Param::Value(value.into())
    }
}

impl From<bool> for Param {
    fn from(value: bool) -> Self {
        Param::Value(value.into())
    }
}

impl From<Vec<u8>> for Param {
    fn from(value: Vec<u8>) -> Self {
        Param::Bytes(Bytes::from(value))
    }
}

impl From<Bytes> for Param {
    fn from(value: Bytes) -> Self {
        Param::Bytes(value)
    }
}

impl From<PathBuf> for Param {
    fn from(value: PathBuf) -> Self {
        Param::File(value)
    }
}

/// Describes one API call: where it goes, what it carries and how the
/// response body is turned into `R`.
pub struct ApiRequest<R = BaseResponse> {
    /// Request method
    pub method: Method,
    /// Request URL, rewritten in place when GET parameters are appended
    pub url: String,
    /// Request headers
    pub headers: HeaderMap,
    /// Request parameters
    pub params: BTreeMap<String, Param>,
    /// Body encoding for non-GET requests
    pub body_kind: BodyKind,
    /// Content type of multipart file parts
    pub content_type: String,
    /// File name of multipart file parts
    pub file_name: Option<String>,
    /// Desired read timeout
    pub timeout: Duration,
    /// Do not follow redirects and skip the cookie jar
    pub no_redirect: bool,
    response: PhantomData<fn() -> R>,
}

impl<R> ApiRequest<R> {
    /// Create a new request with arbitrary method
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            params: BTreeMap::new(),
            body_kind: BodyKind::default(),
            content_type: DEFAULT_FILE_CONTENT_TYPE.to_string(),
            file_name: None,
            timeout: DEFAULT_TIMEOUT,
            no_redirect: false,
            response: PhantomData,
        }
    }

    /// Create a new GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a new POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Set a header
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Add a parameter, replacing any previous value for the key
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Param>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Add several parameters
    pub fn params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Param>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Encode parameters as a JSON object body
    pub fn json_body(mut self) -> Self {
        self.body_kind = BodyKind::Json;
        self
    }

    /// Encode parameters as a multipart body, naming file parts `file_name`
    pub fn multipart(mut self, file_name: impl Into<String>, content_type: impl Into<String>) -> Self {
        self.body_kind = BodyKind::Multipart;
        self.file_name = Some(file_name.into());
        self.content_type = content_type.into();
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return 3xx responses as-is and send no stored cookies
    pub fn no_redirect(mut self) -> Self {
        self.no_redirect = true;
        self
    }

    /// Change the declared response type
    pub fn response_type<S>(self) -> ApiRequest<S> {
        ApiRequest {
            method: self.method,
            url: self.url,
            headers: self.headers,
            params: self.params,
            body_kind: self.body_kind,
            content_type: self.content_type,
            file_name: self.file_name,
            timeout: self.timeout,
            no_redirect: self.no_redirect,
            response: PhantomData,
        }
    }

    /// Check whether this is a GET request
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Append GET parameters to the URL. Returns the resulting URL.
    ///
    /// Every call appends again, so a reused descriptor accumulates
    /// duplicate pairs.
    pub fn resolve_url(&mut self) -> &str {
        if self.is_get() && !self.params.is_empty() {
            self.url = append_query(&self.url, &self.params);
        }
        &self.url
    }

    /// Parameters rendered as strings, in key order
    pub fn string_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect()
    }
}

impl<R> fmt::Debug for ApiRequest<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .field("body_kind", &self.body_kind)
            .field("timeout", &self.timeout)
            .field("no_redirect", &self.no_redirect)
            .finish()
    }
}

/// Append parameters to `url` as a literal query string.
///
/// A URL that already contains `=` is assumed to carry a query and gets `&`,
/// otherwise `?`. Values are not percent-encoded.
pub fn append_query(url: &str, params: &BTreeMap<String, Param>) -> String {
    if params.is_empty() {
        return url.to_string();
    }

    let mut out = String::from(url);
    out.push(if url.contains('=') { '&' } else { '?' });

    let pairs = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    out.push_str(&pairs);
    out
}
