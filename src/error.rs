// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for the dispatcher
//!
//! Transport failures are reported as-is; there is no separate timeout kind
//! and no classification by HTTP status.

use thiserror::Error;

/// Result type alias for dispatcher operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failed (connect, TLS, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Response body was not valid JSON for the declared response type
    #[error("Failed to decode response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// Request body could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (multipart file parts, saving downloads)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Worker task running an asynchronous send failed
    #[error("Dispatch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error annotated with what was being attempted
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a decode error keeping the offending body
    pub fn decode(source: serde_json::Error, body: impl Into<String>) -> Self {
        Error::Decode {
            source,
            body: body.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Innermost error, looking through any added context
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if the transport gave up waiting
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Error::Http(e) if e.is_timeout())
    }

    /// Check if this is a transport-level failure
    pub fn is_network(&self) -> bool {
        matches!(self.root(), Error::Http(_))
    }

    /// Check if the body arrived but could not be decoded
    pub fn is_decode(&self) -> bool {
        matches!(self.root(), Error::Decode { .. })
    }

    /// Raw body of a decode failure
    pub fn body(&self) -> Option<&str> {
        match self.root() {
            Error::Decode { body, .. } => Some(body),
            _ => None,
        }
    }

    /// URL of a transport failure, if reqwest recorded one
    pub fn url(&self) -> Option<&url::Url> {
        match self.root() {
            Error::Http(e) => e.url(),
            _ => None,
        }
    }
}

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    /// Wrap the error with a message, keeping it as the source
    fn context(self, msg: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Context {
            context: msg.into(),
            source: Box::new(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_keeps_body() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = Error::decode(source, "{oops");

        assert!(err.is_decode());
        assert!(!err.is_network());
        assert!(!err.is_timeout());
        assert_eq!(err.body(), Some("{oops"));
    }

    #[test]
    fn test_context_prefixes_message() {
        let result: std::result::Result<(), Error> = Err(Error::config("bad proxy"));
        let err = result.context("building transport").unwrap_err();

        assert_eq!(
            err.to_string(),
            "building transport: Configuration error: bad proxy"
        );
        assert!(matches!(err.root(), Error::Config(_)));
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "Configuration error: bad proxy");
    }

    #[test]
    fn test_predicates_look_through_context() {
        let source = serde_json::from_str::<serde_json::Value>("[").unwrap_err();
        let result: std::result::Result<(), Error> = Err(Error::decode(source, "["));
        let err = result.context("decoding sync reply").unwrap_err();

        assert!(err.is_decode());
        assert_eq!(err.body(), Some("["));
    }
}
