// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Host-keyed cookie storage
//!
//! Cookies are grouped by the host whose response set them. A write for a host
//! replaces everything previously stored for it.

use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use dashmap::DashMap;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use url::Url;

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Host whose response set the cookie
    pub host: String,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    pub secure: bool,
    /// HttpOnly flag
    pub http_only: bool,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            host: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Set the source host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp < Utc::now())
    }

    /// Parse a Set-Cookie header value received from `url`
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Cookie::new(name, value.trim());
        cookie.host = url.host_str().unwrap_or("").to_string();

        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let val = val.trim();
                match attr.trim().to_lowercase().as_str() {
                    "path" => cookie.path = val.to_string(),
                    "expires" => {
                        if let Some(expires) = parse_expires(val) {
                            cookie.expires = Some(expires);
                        }
                    }
                    "max-age" => {
                        if let Ok(secs) = val.parse::<i64>() {
                            cookie.expires = Some(expires_after(secs));
                        }
                    }
                    _ => {}
                }
            } else {
                match part.to_lowercase().as_str() {
                    "secure" => cookie.secure = true,
                    "httponly" => cookie.http_only = true,
                    _ => {}
                }
            }
        }

        Some(cookie)
    }

    /// Parse every Set-Cookie value of a response
    pub fn parse_all<'a>(headers: impl IntoIterator<Item = &'a HeaderValue>, url: &Url) -> Vec<Self> {
        headers
            .into_iter()
            .filter_map(|h| h.to_str().ok())
            .filter_map(|h| Cookie::parse(h, url))
            .filter(|c| !c.is_expired())
            .collect()
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Expiry `secs` seconds from now, saturating at the representable range
fn expires_after(secs: i64) -> DateTime<Utc> {
    chrono::Duration::try_seconds(secs)
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(if secs < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

/// Parse an Expires attribute, RFC 2822 or the dashed Netscape form
fn parse_expires(val: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(val, "%a, %d-%b-%Y %H:%M:%S GMT")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Storage the dispatcher reads cookies from and writes them to.
///
/// Implementations must tolerate concurrent calls from in-flight requests.
pub trait CookieStore: Send + Sync {
    /// All cookies stored for `host`
    fn get(&self, host: &str) -> Vec<Cookie>;

    /// Replace the cookies stored for `host`
    fn upsert(&self, host: &str, cookies: Vec<Cookie>);

    /// Every stored cookie, across all hosts
    fn all(&self) -> Vec<Cookie>;
}

/// Thread-safe in-memory cookie storage
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieStore {
    /// Cookies stored by host
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl MemoryCookieStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    /// Clear cookies for a specific host
    pub fn clear_host(&self, host: &str) {
        self.cookies.remove(host);
    }

    /// Hosts that currently have cookies
    pub fn hosts(&self) -> Vec<String> {
        self.cookies.iter().map(|e| e.key().clone()).collect()
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Export the store as JSON, keyed by host
    pub fn to_json(&self) -> serde_json::Result<String> {
        let snapshot: std::collections::BTreeMap<String, Vec<Cookie>> = self
            .cookies
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        serde_json::to_string(&snapshot)
    }

    /// Import a store previously exported with [`to_json`](Self::to_json)
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let snapshot: std::collections::BTreeMap<String, Vec<Cookie>> = serde_json::from_str(json)?;
        let store = MemoryCookieStore::new();
        for (host, cookies) in snapshot {
            store.upsert(&host, cookies);
        }
        Ok(store)
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, host: &str) -> Vec<Cookie> {
        self.cookies
            .get(host)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    fn upsert(&self, host: &str, cookies: Vec<Cookie>) {
        self.cookies.insert(host.to_string(), cookies);
    }

    fn all(&self) -> Vec<Cookie> {
        self.cookies
            .iter()
            .flat_map(|e| e.value().clone())
            .collect()
    }
}

/// Transport-side cookie hook: loads every stored cookie for the target host
/// and ignores what the transport would save.
pub(crate) struct HostJar {
    store: Arc<dyn CookieStore>,
}

impl HostJar {
    pub(crate) fn new(store: Arc<dyn CookieStore>) -> Self {
        Self { store }
    }

    /// Cookie header for `url`, if the host has live cookies
    pub(crate) fn header_for(&self, url: &Url) -> Option<String> {
        let host = url.host_str()?;
        let cookies = self.store.get(host);
        let value = cookies
            .iter()
            .filter(|c| !c.is_expired())
            .map(Cookie::to_header_value)
            .collect::<Vec<_>>()
            .join("; ");

        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

impl reqwest::cookie::CookieStore for HostJar {
    fn set_cookies(&self, _cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &Url) {}

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self.header_for(url)?;
        HeaderValue::from_str(&header).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let url = Url::parse("https://wx.qq.com/cgi-bin/mmwebwx-bin/webwxnewloginpage").unwrap();
        let header = "wxsid=abc123; Domain=wx.qq.com; Path=/; Secure; HttpOnly";
        let cookie = Cookie::parse(header, &url).unwrap();

        assert_eq!(cookie.name, "wxsid");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.host, "wx.qq.com");
        assert_eq!(cookie.path, "/");
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn test_expires_formats() {
        let url = Url::parse("https://wx.qq.com/").unwrap();
        let dashed = Cookie::parse("wxuin=1; Expires=Thu, 18-Jan-2018 20:41:01 GMT", &url).unwrap();
        let rfc = Cookie::parse("wxuin=1; Expires=Thu, 18 Jan 2018 20:41:01 GMT", &url).unwrap();

        assert!(dashed.is_expired());
        assert_eq!(dashed.expires, rfc.expires);
        assert!(Cookie::parse("wxuin=1; Expires=soon", &url).unwrap().expires.is_none());
    }

    #[test]
    fn test_max_age_out_of_range_saturates() {
        let url = Url::parse("https://wx.qq.com/").unwrap();

        for header in ["wxuin=1; Max-Age=99999999999999", "wxuin=1; Max-Age=9223372036854775807"] {
            let cookie = Cookie::parse(header, &url).unwrap();
            assert_eq!(cookie.expires, Some(DateTime::<Utc>::MAX_UTC));
            assert!(!cookie.is_expired());
        }

        for header in ["wxuin=1; Max-Age=-99999999999999", "wxuin=1; Max-Age=-9223372036854775808"] {
            let cookie = Cookie::parse(header, &url).unwrap();
            assert_eq!(cookie.expires, Some(DateTime::<Utc>::MIN_UTC));
            assert!(cookie.is_expired());
        }
    }

    #[test]
    fn test_cookie_parsing_rejects_garbage() {
        let url = Url::parse("https://wx.qq.com/").unwrap();
        assert!(Cookie::parse("no-equals-sign", &url).is_none());
        assert!(Cookie::parse("=value", &url).is_none());
    }

    #[test]
    fn test_parse_all_drops_expired() {
        let url = Url::parse("https://wx.qq.com/").unwrap();
        let headers = vec![
            HeaderValue::from_static("wxuin=1; Max-Age=3600"),
            HeaderValue::from_static("old=1; Max-Age=-1"),
        ];
        let cookies = Cookie::parse_all(&headers, &url);
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "wxuin");
    }

    #[test]
    fn test_upsert_replaces_host() {
        let store = MemoryCookieStore::new();
        store.upsert("wx.qq.com", vec![Cookie::new("a", "1"), Cookie::new("b", "2")]);
        store.upsert("wx.qq.com", vec![Cookie::new("c", "3")]);

        let cookies = store.get("wx.qq.com");
        assert_eq!(cookies.len(), 1);
        assert_eq!(cookies[0].name, "c");
        assert!(store.get("other.host").is_empty());
    }

    #[test]
    fn test_json_roundtrip() {
        let store = MemoryCookieStore::new();
        store.upsert("wx.qq.com", vec![Cookie::new("wxsid", "s").host("wx.qq.com")]);

        let restored = MemoryCookieStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(restored.get("wx.qq.com"), store.get("wx.qq.com"));
        assert_eq!(restored.hosts(), vec!["wx.qq.com".to_string()]);
    }

    #[test]
    fn test_host_jar_header() {
        let store = Arc::new(MemoryCookieStore::new());
        store.upsert("wx.qq.com", vec![Cookie::new("a", "1"), Cookie::new("b", "2")]);
        let jar = HostJar::new(store);

        let url = Url::parse("https://wx.qq.com/cgi-bin/x").unwrap();
        assert_eq!(jar.header_for(&url).as_deref(), Some("a=1; b=2"));

        let other = Url::parse("https://file.wx.qq.com/").unwrap();
        assert!(jar.header_for(&other).is_none());
    }

    #[test]
    fn test_concurrent_upserts() {
        let store = Arc::new(MemoryCookieStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for n in 0..100 {
                        store.upsert(&format!("host{}", i % 2), vec![Cookie::new("n", n.to_string())]);
                        let _ = store.all();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 2);
    }
}
