// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Typed API responses and download streams

use std::fmt;
use std::path::Path;

use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{Error, ErrorContext, Result};

/// A response type an [`ApiRequest`](super::ApiRequest) can declare.
///
/// Every response keeps the raw body text it was built from. Status codes are
/// carried, never interpreted.
pub trait ApiResponse: Sized + Send + 'static {
    /// Build the response from the status and full body text
    fn from_body(status: StatusCode, body: String) -> Result<Self>;

    /// Raw body text as received
    fn raw_body(&self) -> &str;
}

/// Generic response: the body is kept verbatim, nothing is decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseResponse {
    /// Response status code
    pub status: StatusCode,
    /// Response body
    pub raw_body: String,
}

impl BaseResponse {
    /// Create a response from a status and body
    pub fn new(status: StatusCode, raw_body: impl Into<String>) -> Self {
        Self {
            status,
            raw_body: raw_body.into(),
        }
    }

    /// Check if status is success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if status is redirect (3xx)
    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }
}

impl ApiResponse for BaseResponse {
    fn from_body(status: StatusCode, body: String) -> Result<Self> {
        Ok(Self::new(status, body))
    }

    fn raw_body(&self) -> &str {
        &self.raw_body
    }
}

/// Response whose body is decoded as JSON into `T`
#[derive(Debug, Clone)]
pub struct JsonResponse<T> {
    /// Response status code
    pub status: StatusCode,
    /// Decoded body
    pub data: T,
    /// Body text the data was decoded from
    pub raw_body: String,
}

impl<T> JsonResponse<T> {
    /// Consume the response, keeping only the decoded data
    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T> std::ops::Deref for JsonResponse<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T: DeserializeOwned + Send + 'static> ApiResponse for JsonResponse<T> {
    fn from_body(status: StatusCode, body: String) -> Result<Self> {
        match serde_json::from_str(&body) {
            Ok(data) => Ok(Self {
                status,
                data,
                raw_body: body,
            }),
            Err(e) => Err(Error::decode(e, body)),
        }
    }

    fn raw_body(&self) -> &str {
        &self.raw_body
    }
}

/// Unbuffered response body of a download
pub struct FileResponse {
    /// Response status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Final URL (after redirects)
    pub url: Url,
    stream: BoxStream<'static, Result<Bytes>>,
}

impl FileResponse {
    /// Wrap a transport response without reading its body
    pub(crate) fn new(response: reqwest::Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
            stream: response.bytes_stream().map_err(Error::from).boxed(),
        }
    }

    /// Build from an arbitrary byte stream
    pub fn from_stream(
        status: StatusCode,
        url: Url,
        stream: BoxStream<'static, Result<Bytes>>,
    ) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            url,
            stream,
        }
    }

    /// Content length announced by the server
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }

    /// Get content type
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Take the body stream
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes>> {
        self.stream
    }

    /// Read the whole body into memory
    pub async fn bytes(self) -> Result<Bytes> {
        let chunks: Vec<Bytes> = self.stream.try_collect().await?;
        Ok(chunks.concat().into())
    }

    /// Stream the body into a file, returning the number of bytes written
    pub async fn save_to(mut self, path: impl AsRef<Path>) -> Result<u64> {
        let path = path.as_ref();
        let mut file = tokio::fs::File::create(path)
            .await
            .context(format!("failed to create {}", path.display()))?;
        let mut written = 0u64;

        while let Some(chunk) = self.stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::debug!(path = %path.display(), bytes = written, "Download saved");
        Ok(written)
    }
}

impl fmt::Debug for FileResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileResponse")
            .field("status", &self.status)
            .field("url", &self.url.as_str())
            .finish_non_exhaustive()
    }
}
