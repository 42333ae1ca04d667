// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request dispatcher

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use reqwest::header::HeaderMap;
use tokio::task::JoinHandle;
use url::Url;

use super::body;
use super::cookie::{Cookie, CookieStore, MemoryCookieStore};
use super::request::ApiRequest;
use super::response::{ApiResponse, FileResponse};
use super::transport::{TransportConfig, TransportPool};
use super::{headers, DEFAULT_MIRROR_HOST};
use crate::error::{Error, Result};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Default transport settings
    pub transport: TransportConfig,
    /// Host that also receives every cookie set by another host
    pub mirror_host: Option<String>,
    /// How many longer-timeout transports to keep around
    pub alternate_transports: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            mirror_host: Some(DEFAULT_MIRROR_HOST.to_string()),
            alternate_transports: 4,
        }
    }
}

impl DispatcherConfig {
    /// Create a new dispatcher config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set transport settings
    pub fn transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Set the cookie mirror host
    pub fn mirror_host(mut self, host: impl Into<String>) -> Self {
        self.mirror_host = Some(host.into());
        self
    }

    /// Keep cookies only under the host that set them
    pub fn no_mirror(mut self) -> Self {
        self.mirror_host = None;
        self
    }

    /// Set the alternate transport cache size
    pub fn alternate_transports(mut self, count: usize) -> Self {
        self.alternate_transports = count;
        self
    }
}

struct Inner {
    config: DispatcherConfig,
    store: Arc<dyn CookieStore>,
    transports: TransportPool,
}

/// Sends [`ApiRequest`]s and keeps the cookie state between them.
///
/// Cloning is cheap; clones share the cookie store and transports.
///
/// # Example
///
/// ```rust,no_run
/// use wxdispatch::{ApiRequest, BaseResponse, Dispatcher};
///
/// #[tokio::main]
/// async fn main() -> wxdispatch::Result<()> {
///     let dispatcher = Dispatcher::new()?;
///     let mut request = ApiRequest::<BaseResponse>::get("https://login.wx.qq.com/jslogin")
///         .param("appid", "wx782c26e4c19acffb")
///         .param("fun", "new");
///
///     let response = dispatcher.send(&mut request).await?;
///     println!("{}", response.raw_body);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    /// Create a dispatcher with default configuration and an empty cookie store
    pub fn new() -> Result<Self> {
        Self::with_config(DispatcherConfig::default())
    }

    /// Create a dispatcher with custom configuration and an empty cookie store
    pub fn with_config(config: DispatcherConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryCookieStore::new()))
    }

    /// Create a dispatcher reading and writing cookies through `store`
    pub fn with_store(config: DispatcherConfig, store: Arc<dyn CookieStore>) -> Result<Self> {
        let transports = TransportPool::new(
            config.transport.clone(),
            store.clone(),
            config.alternate_transports,
        )?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                store,
                transports,
            }),
        })
    }

    /// Get dispatcher configuration
    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    /// Get the cookie store
    pub fn cookie_store(&self) -> &Arc<dyn CookieStore> {
        &self.inner.store
    }

    /// Send a request and read the full response.
    ///
    /// GET parameters are appended to `request.url` in place. Cookies set by
    /// the response are stored before the body is decoded.
    pub async fn send<R: ApiResponse>(&self, request: &mut ApiRequest<R>) -> Result<R> {
        let response = self.execute(request).await?;
        let status = response.status();
        let url = response.url().clone();

        self.store_cookies(&url, response.headers());

        let body = response.text().await?;
        tracing::debug!(%status, body = %body, "Response");

        R::from_body(status, body)
    }

    /// Send a request on a runtime worker task.
    ///
    /// In-flight requests are independent and complete in no particular
    /// order. Must be called from within a Tokio runtime.
    pub fn spawn<R: ApiResponse>(&self, mut request: ApiRequest<R>) -> Pending<R> {
        let dispatcher = self.clone();
        Pending {
            handle: tokio::spawn(async move { dispatcher.send(&mut request).await }),
        }
    }

    /// Send a request and hand back the body as an unbuffered byte stream
    pub async fn download<R>(&self, request: &mut ApiRequest<R>) -> Result<FileResponse> {
        let response = self.execute(request).await?;
        Ok(FileResponse::new(response))
    }

    /// Every stored cookie, across all hosts
    pub fn cookies(&self) -> Vec<Cookie> {
        self.inner.store.all()
    }

    /// Value of the first cookie named `name`, ignoring case
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies()
            .into_iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.value)
    }

    async fn execute<R>(&self, request: &mut ApiRequest<R>) -> Result<reqwest::Response> {
        let transport = self.inner.transports.select(request.timeout)?;
        let url = Url::parse(request.resolve_url())?;
        tracing::debug!(method = %request.method, url = %url, "Request");

        let mut builder = transport
            .client(request.no_redirect)
            .request(request.method.clone(), url)
            .headers(request.headers.clone());

        if !request.is_get() {
            builder = body::apply(builder, request).await?;
        }

        Ok(builder.send().await?)
    }

    /// Store response cookies under the responding host and the mirror host
    fn store_cookies(&self, url: &Url, response_headers: &HeaderMap) {
        let cookies = Cookie::parse_all(response_headers.get_all(headers::SET_COOKIE), url);
        if cookies.is_empty() {
            return;
        }
        let Some(host) = url.host_str() else {
            return;
        };

        tracing::trace!(host, count = cookies.len(), "Storing cookies");
        if let Some(ref mirror) = self.inner.config.mirror_host {
            if mirror != host {
                self.inner.store.upsert(mirror, cookies.clone());
            }
        }
        self.inner.store.upsert(host, cookies);
    }
}

/// Result of [`Dispatcher::spawn`], resolves once the request completes
#[must_use = "the response is lost unless the pending send is awaited"]
pub struct Pending<R> {
    handle: JoinHandle<Result<R>>,
}

impl<R> Pending<R> {
    /// Check whether the request has completed
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<R> Future for Pending<R> {
    type Output = Result<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|joined| joined.map_err(Error::from).and_then(|result| result))
    }
}

/// Dispatcher for synchronous callers; blocks the calling thread.
///
/// Owns a private single-threaded runtime, so it must not be used from
/// inside another Tokio runtime.
pub struct BlockingDispatcher {
    dispatcher: Dispatcher,
    runtime: tokio::runtime::Runtime,
}

impl BlockingDispatcher {
    /// Create a blocking dispatcher with default configuration
    pub fn new() -> Result<Self> {
        Self::with_store(DispatcherConfig::default(), Arc::new(MemoryCookieStore::new()))
    }

    /// Create a blocking dispatcher reading and writing cookies through `store`
    pub fn with_store(config: DispatcherConfig, store: Arc<dyn CookieStore>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self {
            dispatcher: Dispatcher::with_store(config, store)?,
            runtime,
        })
    }

    /// The async dispatcher sharing this one's state
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Send a request, waiting for the full response
    pub fn send<R: ApiResponse>(&self, request: &mut ApiRequest<R>) -> Result<R> {
        self.runtime.block_on(self.dispatcher.send(request))
    }

    /// Download the response body into `path`, returning the bytes written
    pub fn download_to<R>(&self, request: &mut ApiRequest<R>, path: impl AsRef<Path>) -> Result<u64> {
        self.runtime.block_on(async {
            let file = self.dispatcher.download(request).await?;
            file.save_to(path).await
        })
    }

    /// Every stored cookie, across all hosts
    pub fn cookies(&self) -> Vec<Cookie> {
        self.dispatcher.cookies()
    }

    /// Value of the first cookie named `name`, ignoring case
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.dispatcher.cookie(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn set_cookie_headers(values: &[&'static str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &value in values {
            map.append(headers::SET_COOKIE, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_cookies_mirrored_to_secondary_host() {
        let dispatcher = Dispatcher::new().unwrap();
        let url = Url::parse("https://wx2.qq.com/cgi-bin/mmwebwx-bin/webwxinit").unwrap();
        dispatcher.store_cookies(&url, &set_cookie_headers(&["wxsid=s1", "wxuin=42"]));

        let store = dispatcher.cookie_store();
        assert_eq!(store.get("wx2.qq.com").len(), 2);
        assert_eq!(store.get(DEFAULT_MIRROR_HOST).len(), 2);
        assert_eq!(store.get(DEFAULT_MIRROR_HOST)[0].host, "wx2.qq.com");
    }

    #[test]
    fn test_mirror_host_not_duplicated() {
        let store = Arc::new(MemoryCookieStore::new());
        let dispatcher = Dispatcher::with_store(DispatcherConfig::default(), store.clone()).unwrap();
        let url = Url::parse(&format!("https://{}/cgi-bin/synccheck", DEFAULT_MIRROR_HOST)).unwrap();
        dispatcher.store_cookies(&url, &set_cookie_headers(&["webwx_data_ticket=t"]));

        assert_eq!(store.hosts(), vec![DEFAULT_MIRROR_HOST.to_string()]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_no_mirror() {
        let store = Arc::new(MemoryCookieStore::new());
        let config = DispatcherConfig::default().no_mirror();
        let dispatcher = Dispatcher::with_store(config, store.clone()).unwrap();
        let url = Url::parse("https://wx.qq.com/").unwrap();
        dispatcher.store_cookies(&url, &set_cookie_headers(&["a=1"]));

        assert_eq!(store.hosts(), vec!["wx.qq.com".to_string()]);
    }

    #[test]
    fn test_no_cookie_headers_leaves_store_alone() {
        let store = Arc::new(MemoryCookieStore::new());
        store.upsert("wx.qq.com", vec![Cookie::new("keep", "me")]);
        let dispatcher = Dispatcher::with_store(DispatcherConfig::default(), store.clone()).unwrap();

        let url = Url::parse("https://wx.qq.com/").unwrap();
        dispatcher.store_cookies(&url, &HeaderMap::new());
        assert_eq!(dispatcher.cookie("keep").as_deref(), Some("me"));
    }

    #[test]
    fn test_cookie_lookup_ignores_case() {
        let store = Arc::new(MemoryCookieStore::new());
        store.upsert("wx.qq.com", vec![Cookie::new("webwx_data_ticket", "T1")]);
        let dispatcher = Dispatcher::with_store(DispatcherConfig::default(), store).unwrap();

        for name in ["webwx_data_ticket", "WEBWX_DATA_TICKET", "WebWx_Data_Ticket"] {
            assert_eq!(dispatcher.cookie(name).as_deref(), Some("T1"));
        }
        assert!(dispatcher.cookie("missing").is_none());
    }
}
