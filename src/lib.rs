// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # wxdispatch - HTTP dispatcher for web-bot API clients
//!
//! Sends API requests described by [`ApiRequest`] and keeps cookie state per
//! host between them, the way the WeChat web endpoints expect.
//!
//! ## Features
//!
//! - GET parameters appended as a literal query string
//! - Form, JSON and multipart request bodies
//! - Host-keyed cookie store, mirrored to the push host
//! - Per-request read timeouts with cached alternate transports
//! - Async, spawned and blocking sends; streaming downloads
//! - Typed responses decoded from JSON, raw body always kept
//!
//! ## Example
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use wxdispatch::{ApiRequest, Dispatcher, JsonResponse};
//!
//! #[derive(Debug, Deserialize)]
//! struct InitResponse {
//!     #[serde(rename = "Count")]
//!     count: u32,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::new()?;
//!
//!     let mut request = ApiRequest::<JsonResponse<InitResponse>>::post(
//!         "https://wx.qq.com/cgi-bin/mmwebwx-bin/webwxinit",
//!     )
//!     .param("BaseRequest", serde_json::json!({"Uin": 0, "Sid": "", "Skey": ""}))
//!     .json_body();
//!
//!     let response = dispatcher.send(&mut request).await?;
//!     println!("{} contacts, session ticket {:?}", response.count, dispatcher.cookie("webwx_data_ticket"));
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;

// Re-exports for convenience

// Errors
pub use error::{Error, ErrorContext, Result};

// Dispatch
pub use http::{BlockingDispatcher, Dispatcher, DispatcherConfig, Pending, TransportConfig};

// Requests and responses
pub use http::{append_query, ApiRequest, BodyKind, Param};
pub use http::{ApiResponse, BaseResponse, FileResponse, JsonResponse};

// Cookies
pub use http::{Cookie, CookieStore, MemoryCookieStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
