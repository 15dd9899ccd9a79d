//! PAC script served to the browser extension.
//!
//! Hosts under the configured domain suffix go through one upstream proxy,
//! picked by slot; everything else connects directly.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail};
use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::debug;

use crate::state::AppState;

pub const PAC_CONTENT_TYPE: &str = "application/x-ns-proxy-autoconfig";

/// One `host:port` proxy endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub host: String,
    pub port: u16,
}

impl FromStr for Upstream {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (host, port) = raw
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("expected host:port"))?;
        let host = host.trim();
        if host.is_empty() || host.contains(char::is_whitespace) || host.contains('"') {
            bail!("invalid proxy host '{host}'");
        }
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| anyhow!("invalid proxy port '{port}'"))?;
        if port == 0 {
            bail!("proxy port cannot be 0");
        }
        Ok(Upstream {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub domain_suffix: String,
    pub upstreams: Vec<Upstream>,
}

impl ProxySettings {
    pub fn new(domain_suffix: impl Into<String>, upstreams: Vec<Upstream>) -> Self {
        let domain_suffix = domain_suffix.into();
        Self {
            domain_suffix: domain_suffix.trim().trim_start_matches('.').to_string(),
            upstreams,
        }
    }

    /// Upstream for a slot; slots wrap around the list.
    pub fn upstream_for(&self, slot: usize) -> Option<&Upstream> {
        if self.upstreams.is_empty() {
            None
        } else {
            self.upstreams.get(slot % self.upstreams.len())
        }
    }

    /// Renders `FindProxyForURL` for the given slot.
    pub fn render_pac(&self, slot: usize) -> String {
        let Some(upstream) = self.upstream_for(slot) else {
            return "function FindProxyForURL(url, host) {\n  return \"DIRECT\";\n}\n".to_string();
        };
        let suffix = &self.domain_suffix;
        format!(
            "function FindProxyForURL(url, host) {{\n  \
             if (host === \"{suffix}\" || dnsDomainIs(host, \".{suffix}\")) {{\n    \
             return \"PROXY {upstream}\";\n  \
             }}\n  \
             return \"DIRECT\";\n\
             }}\n"
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct PacQuery {
    #[serde(default)]
    pub slot: usize,
}

/// GET /proxy.pac?slot=N
pub async fn handle_pac(
    State(state): State<AppState>,
    Query(query): Query<PacQuery>,
) -> impl IntoResponse {
    let upstream = state
        .proxy
        .upstream_for(query.slot)
        .map(ToString::to_string)
        .unwrap_or_else(|| "DIRECT".to_string());
    debug!("Serving PAC for slot {} via {}", query.slot, upstream);
    (
        [(header::CONTENT_TYPE, PAC_CONTENT_TYPE)],
        state.proxy.render_pac(query.slot),
    )
}
