use std::collections::HashSet;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::AppError;

/// Short opaque identifier for the calling client, used to deduplicate likes.
///
/// Derived from the `X-Forwarded-For` header (falling back to the peer
/// address) by base64-encoding the raw string and keeping the first 12
/// characters. Trivially spoofable; this is a dedup key, not a security
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFingerprint(pub String);

pub fn derive_fingerprint(address: &str) -> String {
    let encoded = STANDARD.encode(address.as_bytes());
    encoded.chars().take(12).collect()
}

impl<S: Send + Sync> FromRequestParts<S> for ClientFingerprint {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let address = match forwarded {
            Some(value) => value,
            None => parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0.ip().to_string())
                .ok_or_else(|| AppError::Internal("no peer address on request".into()))?,
        };

        Ok(ClientFingerprint(derive_fingerprint(&address)))
    }
}

/// The set of posts this browser has marked as liked, read from the
/// `liked_<id>=1` cookies it carries. This is deliberately the cookie and not
/// the likes table: the rendered heart state follows the browser, the count
/// follows the database.
#[derive(Debug, Clone, Default)]
pub struct LikedCookies(HashSet<i64>);

impl LikedCookies {
    pub fn is_liked(&self, post_id: i64) -> bool {
        self.0.contains(&post_id)
    }

    /// Builds the set directly, mainly for feed assembly in tests.
    pub fn from_ids(ids: &[i64]) -> Self {
        LikedCookies(ids.iter().copied().collect())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for LikedCookies {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut liked = HashSet::new();
        for (name, value) in cookies(parts) {
            if value != "1" {
                continue;
            }
            if let Some(id) = name.strip_prefix("liked_") {
                if let Ok(id) = id.parse::<i64>() {
                    liked.insert(id);
                }
            }
        }
        Ok(LikedCookies(liked))
    }
}

/// Theme preference from the `theme` cookie; absent or unknown means "follow
/// the system".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    Auto,
}

impl Theme {
    /// Value for the page's `data-theme` attribute; empty when auto.
    pub fn attr_value(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Auto => "",
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Theme {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let theme = cookies(parts)
            .into_iter()
            .find(|(name, _)| name == "theme")
            .map(|(_, value)| match value.as_str() {
                "light" => Theme::Light,
                "dark" => Theme::Dark,
                _ => Theme::Auto,
            })
            .unwrap_or_default();
        Ok(theme)
    }
}

/// Parses every Cookie header into (name, value) pairs.
fn cookies(parts: &Parts) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for header in parts.headers.get_all(header::COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for pair in raw.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                out.push((name.to_string(), value.to_string()));
            }
        }
    }
    out
}
