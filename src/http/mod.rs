// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP dispatch layer
//!
//! Builds transport requests from [`ApiRequest`] descriptors, keeps the
//! host-keyed cookie state and turns response bodies into typed responses.

mod body;
mod cookie;
mod dispatcher;
mod request;
mod response;
mod transport;

pub use cookie::{Cookie, CookieStore, MemoryCookieStore};
pub use dispatcher::{BlockingDispatcher, Dispatcher, DispatcherConfig, Pending};
pub use request::{append_query, ApiRequest, BodyKind, Param};
pub use response::{ApiResponse, BaseResponse, FileResponse, JsonResponse};
pub use transport::TransportConfig;

/// Default user agent string
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Host that receives a copy of every cookie set elsewhere
pub const DEFAULT_MIRROR_HOST: &str = "webpush.web.wechat.com";

/// Content type of JSON request bodies
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Content type used for multipart file parts unless the request declares one
pub const DEFAULT_FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Common HTTP headers
pub mod headers {
    pub const CONTENT_TYPE: &str = "content-type";
    pub const SET_COOKIE: &str = "set-cookie";
}
