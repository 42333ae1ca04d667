// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Transport construction and timeout-based selection

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::tls;
use reqwest::{Client, ClientBuilder};

use super::cookie::{CookieStore, HostJar};
use super::DEFAULT_USER_AGENT;
use crate::error::{Error, Result};

/// Extra read time granted on top of what a request asks for
pub const TIMEOUT_SLACK: Duration = Duration::from_secs(1);

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User agent string
    pub user_agent: String,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Read timeout (None = wait forever)
    pub read_timeout: Option<Duration>,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Default headers
    pub default_headers: HeaderMap,
    /// Accept invalid certificates (dangerous!)
    pub accept_invalid_certs: bool,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Highest TLS version to negotiate
    pub max_tls_version: Option<tls::Version>,
    /// Send the SNI extension
    pub tls_sni: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: None,
            max_redirects: 10,
            default_headers: HeaderMap::new(),
            accept_invalid_certs: false,
            proxy: None,
            max_tls_version: None,
            tls_sni: true,
        }
    }
}

impl TransportConfig {
    /// Create a new transport config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set read timeout
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Add a default header; invalid names or values are ignored
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.default_headers.insert(name, value);
        }
        self
    }

    /// Accept invalid TLS certificates
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Settings for old endpoints that only speak TLS 1.0 and break on SNI.
    ///
    /// Needs the `native-tls` feature; rustls refuses TLS 1.0.
    pub fn legacy_tls() -> Self {
        Self {
            max_tls_version: Some(tls::Version::TLS_1_0),
            tls_sni: false,
            ..Default::default()
        }
    }

    fn builder(&self) -> Result<ClientBuilder> {
        let mut builder = Client::builder()
            .user_agent(&self.user_agent)
            .connect_timeout(self.connect_timeout)
            .default_headers(self.default_headers.clone())
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .tls_sni(self.tls_sni);

        if let Some(timeout) = self.read_timeout {
            builder = builder.read_timeout(timeout);
        }

        if let Some(version) = self.max_tls_version {
            builder = builder.max_tls_version(version);
        }

        if let Some(ref proxy_url) = self.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::config(format!("Invalid proxy URL: {}", e)))?,
            );
        }

        Ok(builder)
    }
}

/// A configured transport in its two flavors
#[derive(Clone)]
pub(crate) struct Transport {
    read_timeout: Option<Duration>,
    /// Follows redirects and replays stored cookies
    with_cookies: Client,
    /// Neither follows redirects nor sends cookies
    bare: Client,
}

impl Transport {
    pub(crate) fn build(config: &TransportConfig, store: Arc<dyn CookieStore>) -> Result<Self> {
        let with_cookies = config
            .builder()?
            .redirect(Policy::limited(config.max_redirects))
            .cookie_provider(Arc::new(HostJar::new(store)))
            .build()?;

        let bare = config.builder()?.redirect(Policy::none()).build()?;

        Ok(Self {
            read_timeout: config.read_timeout,
            with_cookies,
            bare,
        })
    }

    pub(crate) fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Client for a request, by its redirect setting
    pub(crate) fn client(&self, no_redirect: bool) -> &Client {
        if no_redirect {
            &self.bare
        } else {
            &self.with_cookies
        }
    }

    /// Whether this transport waits longer than `wanted`
    fn covers(&self, wanted: Duration) -> bool {
        self.read_timeout.map_or(true, |t| t > wanted)
    }
}

/// Default transport plus a bounded cache of longer-timeout alternates
pub(crate) struct TransportPool {
    config: TransportConfig,
    store: Arc<dyn CookieStore>,
    default: Transport,
    alternates: Mutex<VecDeque<Transport>>,
    capacity: usize,
}

impl TransportPool {
    pub(crate) fn new(config: TransportConfig, store: Arc<dyn CookieStore>, capacity: usize) -> Result<Self> {
        let default = Transport::build(&config, store.clone())?;
        Ok(Self {
            config,
            store,
            default,
            alternates: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        })
    }

    /// Pick a transport whose read timeout exceeds `wanted`
    pub(crate) fn select(&self, wanted: Duration) -> Result<Transport> {
        if self.default.covers(wanted) {
            return Ok(self.default.clone());
        }

        let mut alternates = self.alternates.lock();
        if let Some(pos) = alternates.iter().position(|t| t.covers(wanted)) {
            if let Some(found) = alternates.remove(pos) {
                alternates.push_front(found.clone());
                return Ok(found);
            }
        }

        let config = self.config.clone().read_timeout(Some(wanted + TIMEOUT_SLACK));
        let transport = Transport::build(&config, self.store.clone())?;
        tracing::trace!(read_timeout = ?transport.read_timeout(), "Built alternate transport");

        if self.capacity > 0 {
            alternates.push_front(transport.clone());
            alternates.truncate(self.capacity);
        }
        Ok(transport)
    }

    #[cfg(test)]
    pub(crate) fn cached(&self) -> usize {
        self.alternates.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::MemoryCookieStore;

    fn pool(read_timeout: Option<Duration>, capacity: usize) -> TransportPool {
        let config = TransportConfig::default().read_timeout(read_timeout);
        TransportPool::new(config, Arc::new(MemoryCookieStore::new()), capacity).unwrap()
    }

    #[test]
    fn test_unset_default_timeout_is_always_used() {
        let pool = pool(None, 2);
        let transport = pool.select(Duration::from_secs(600)).unwrap();
        assert_eq!(transport.read_timeout(), None);
        assert_eq!(pool.cached(), 0);
    }

    #[test]
    fn test_longer_default_timeout_is_used() {
        let pool = pool(Some(Duration::from_secs(30)), 2);
        let transport = pool.select(Duration::from_secs(10)).unwrap();
        assert_eq!(transport.read_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(pool.cached(), 0);
    }

    #[test]
    fn test_alternate_built_with_slack_and_reused() {
        let pool = pool(Some(Duration::from_secs(10)), 2);

        let first = pool.select(Duration::from_secs(25)).unwrap();
        assert_eq!(first.read_timeout(), Some(Duration::from_secs(26)));
        assert_eq!(pool.cached(), 1);

        let again = pool.select(Duration::from_secs(25)).unwrap();
        assert_eq!(again.read_timeout(), Some(Duration::from_secs(26)));
        assert_eq!(pool.cached(), 1);

        // 26s alternate still covers a 20s request
        pool.select(Duration::from_secs(20)).unwrap();
        assert_eq!(pool.cached(), 1);
    }

    #[test]
    fn test_equal_default_timeout_needs_alternate() {
        let pool = pool(Some(Duration::from_secs(10)), 2);
        let transport = pool.select(Duration::from_secs(10)).unwrap();
        assert_eq!(transport.read_timeout(), Some(Duration::from_secs(11)));
    }

    #[test]
    fn test_alternate_cache_is_bounded() {
        let pool = pool(Some(Duration::from_secs(1)), 2);
        for secs in [5, 10, 15] {
            pool.select(Duration::from_secs(secs)).unwrap();
        }
        assert_eq!(pool.cached(), 2);

        let pool = pool_without_cache();
        pool.select(Duration::from_secs(5)).unwrap();
        assert_eq!(pool.cached(), 0);
    }

    fn pool_without_cache() -> TransportPool {
        pool(Some(Duration::from_secs(1)), 0)
    }

    #[test]
    fn test_invalid_proxy_is_config_error() {
        let config = TransportConfig::default().proxy("not a url at all");
        let result = Transport::build(&config, Arc::new(MemoryCookieStore::new()));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
