//! Client identity used as the rate-limit key.

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};

use crate::state::AppState;

const UNKNOWN_CLIENT: &str = "unknown";

/// Network-origin identifier for the caller.
///
/// Resolution order: first `x-forwarded-for` entry, `x-real-ip`, socket peer
/// address, then `"unknown"`. Forwarded headers are skipped when the
/// deployment is not behind a trusted proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> Self {
        let forwarded = trust_forwarded
            .then(|| forwarded_for(headers).or_else(|| header_value(headers, "x-real-ip")))
            .flatten();

        let id = forwarded
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());
        ClientId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientId::resolve(
            &parts.headers,
            peer,
            state.config.trust_forwarded_headers,
        ))
    }
}
