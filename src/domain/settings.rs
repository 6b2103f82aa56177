//! Tunnel settings handed to the core.
//!
//! Settings are read from the desktop application's preference file, which
//! is either an already structured [`TunnelSettings`] document or a Flutter
//! shared-preferences map with `flutter.*` keys.

use crate::domain::error::RostovError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// File the desktop application keeps its preferences in
pub const PREFERENCES_FILE_NAME: &str = "shared_preferences.json";

/// Settings passed to the core when it starts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelSettings {
    pub region: String,
    pub log_level: String,
    pub connection_test_url: String,
    pub block_ads: bool,
    pub bypass_lan: bool,
    pub allow_connection_from_lan: bool,
    pub remote_dns_address: String,
    pub remote_dns_domain_strategy: DomainStrategy,
    pub direct_dns_address: String,
    pub direct_dns_domain_strategy: DomainStrategy,
    pub ipv6_mode: DomainStrategy,
    pub enable_dns_routing: bool,
    pub resolve_destination: bool,
    /// Seconds between outbound URL tests
    pub url_test_interval: u64,
    pub enable_clash_api: bool,
    pub clash_api_port: u16,
    pub tls_tricks: TlsTricks,
    pub inbound: InboundOptions,
}

/// How domain names are resolved to addresses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStrategy {
    #[default]
    AsIs,
    PreferIpv4,
    PreferIpv6,
    Ipv4Only,
    Ipv6Only,
}

impl FromStr for DomainStrategy {
    type Err = RostovError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "as_is" | "asis" | "as-is" => Ok(Self::AsIs),
            "prefer_ipv4" | "prefer-ipv4" | "ipv4_prefer" => Ok(Self::PreferIpv4),
            "prefer_ipv6" | "prefer-ipv6" | "ipv6_prefer" => Ok(Self::PreferIpv6),
            "ipv4_only" | "force_ipv4" | "ipv4" => Ok(Self::Ipv4Only),
            "ipv6_only" | "force_ipv6" | "ipv6" => Ok(Self::Ipv6Only),
            other => Err(RostovError::Settings(format!("unknown domain strategy '{}'", other))),
        }
    }
}

/// TLS handshake obfuscation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsTricks {
    pub enable_fragment: bool,
    /// Fragment size range in bytes, e.g. `10-30`
    pub fragment_size: String,
    /// Pause between fragments in milliseconds, e.g. `2-8`
    pub fragment_sleep: String,
    pub mixed_sni_case: bool,
    pub enable_padding: bool,
    pub padding_size: String,
}

/// Inbound listener options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundOptions {
    pub enable_tun: bool,
    pub enable_tun_service: bool,
    pub set_system_proxy: bool,
    pub strict_route: bool,
    pub mixed_port: u16,
    pub mtu: u32,
    pub tun_stack: String,
}

/// TUN related command line overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TunOverrides {
    pub enable_tun: bool,
    pub disable_tun: bool,
    pub mtu: u32,
    pub set_system_proxy: bool,
}

impl Default for TunnelSettings {
    fn default() -> Self {
        Self {
            region: "other".to_string(),
            log_level: "warn".to_string(),
            connection_test_url: "http://cp.cloudflare.com".to_string(),
            block_ads: false,
            bypass_lan: false,
            allow_connection_from_lan: false,
            remote_dns_address: "udp://1.1.1.1".to_string(),
            remote_dns_domain_strategy: DomainStrategy::AsIs,
            direct_dns_address: "1.1.1.1".to_string(),
            direct_dns_domain_strategy: DomainStrategy::AsIs,
            ipv6_mode: DomainStrategy::AsIs,
            enable_dns_routing: false,
            resolve_destination: false,
            url_test_interval: 600,
            enable_clash_api: true,
            clash_api_port: 16756,
            tls_tricks: TlsTricks::default(),
            inbound: InboundOptions::default(),
        }
    }
}

impl Default for TlsTricks {
    fn default() -> Self {
        Self {
            enable_fragment: false,
            fragment_size: "10-30".to_string(),
            fragment_sleep: "2-8".to_string(),
            mixed_sni_case: false,
            enable_padding: false,
            padding_size: "1-1500".to_string(),
        }
    }
}

impl Default for InboundOptions {
    fn default() -> Self {
        Self {
            enable_tun: false,
            enable_tun_service: false,
            set_system_proxy: false,
            strict_route: true,
            mixed_port: 12334,
            mtu: 9000,
            tun_stack: "mixed".to_string(),
        }
    }
}

impl TunnelSettings {
    /// Read settings from a preference file.
    ///
    /// A missing or malformed file yields the defaults.
    pub fn read_at(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("No preferences at {}: {}", path.display(), e);
                return Self::default();
            }
        };
        Self::from_json(&content).unwrap_or_else(|| {
            warn!("Malformed preferences at {}, using defaults", path.display());
            Self::default()
        })
    }

    /// Parse a preference document, `None` when it is not valid JSON
    pub fn from_json(content: &str) -> Option<Self> {
        if let Ok(settings) = serde_json::from_str::<TunnelSettings>(content) {
            if settings.has_live_fields() {
                return Some(settings);
            }
        }

        let raw: Map<String, Value> = serde_json::from_str(content).ok()?;
        let mut settings = Self::default();
        settings.apply_flutter_prefs(&raw);
        Some(settings)
    }

    // A flutter map deserializes into the defaults; only a document that
    // set a field itself counts as structured.
    fn has_live_fields(&self) -> bool {
        *self != Self::default()
    }

    /// Apply `flutter.*` keys on top of the current values.
    ///
    /// Keys that are absent, empty or of the wrong type leave the current
    /// value alone.
    pub fn apply_flutter_prefs(&mut self, raw: &Map<String, Value>) {
        if let Some(v) = string_pref(raw, "flutter.region") {
            self.region = v.to_lowercase();
        }
        if let Some(v) = bool_pref(raw, "flutter.bypass-lan") {
            self.bypass_lan = v;
        }
        if let Some(v) = bool_pref(raw, "flutter.allow-connection-from-lan") {
            self.allow_connection_from_lan = v;
        }
        if let Some(v) = string_pref(raw, "flutter.service-mode") {
            if v.eq_ignore_ascii_case("system-proxy") {
                self.inbound.set_system_proxy = true;
            }
        }

        // DNS
        if let Some(v) = string_pref(raw, "flutter.remote-dns-address") {
            self.remote_dns_address = v;
        }
        if let Some(v) = string_pref(raw, "flutter.direct-dns-address") {
            self.direct_dns_address = v;
        }
        if let Some(v) = strategy_pref(raw, "flutter.remote-dns-domain-strategy") {
            self.remote_dns_domain_strategy = v;
        }
        if let Some(v) = strategy_pref(raw, "flutter.direct-dns-domain-strategy") {
            self.direct_dns_domain_strategy = v;
        }
        if let Some(v) = strategy_pref(raw, "flutter.ipv6-mode") {
            self.ipv6_mode = v;
        }

        // Routing
        if let Some(v) = bool_pref(raw, "flutter.enable-dns-routing") {
            self.enable_dns_routing = v;
        }
        if let Some(v) = bool_pref(raw, "flutter.resolve-destination") {
            self.resolve_destination = v;
        }
        if let Some(v) = bool_pref(raw, "flutter.strict-route") {
            self.inbound.strict_route = v;
        }
        if let Some(v) = bool_pref(raw, "flutter.block-ads") {
            self.block_ads = v;
        }

        if let Some(v) = string_pref(raw, "flutter.connection-test-url") {
            self.connection_test_url = if v.starts_with("http://") || v.starts_with("https://") {
                v
            } else {
                format!("http://{}", v)
            };
        }
        if let Some(n) = int_pref(raw, "flutter.url-test-interval") {
            if let Ok(seconds) = u64::try_from(n) {
                if seconds > 0 {
                    self.url_test_interval = seconds;
                }
            }
        }

        // TLS tricks
        if let Some(v) = bool_pref(raw, "flutter.enable-tls-fragment") {
            self.tls_tricks.enable_fragment = v;
        }
        if let Some(v) = string_pref(raw, "flutter.tls-fragment-size") {
            self.tls_tricks.fragment_size = v;
        }
        if let Some(v) = string_pref(raw, "flutter.tls-fragment-sleep") {
            self.tls_tricks.fragment_sleep = v;
        }
        if let Some(v) = bool_pref(raw, "flutter.enable-tls-mixed-sni-case") {
            self.tls_tricks.mixed_sni_case = v;
        }
        if let Some(v) = bool_pref(raw, "flutter.enable-tls-padding") {
            self.tls_tricks.enable_padding = v;
        }
        if let Some(v) = string_pref(raw, "flutter.tls-padding-size") {
            self.tls_tricks.padding_size = v;
        }

        // Clash API; port 0 is not a usable listener
        if let Some(port) = int_pref(raw, "flutter.clash-api-port").and_then(|n| u16::try_from(n).ok()) {
            if port > 0 {
                self.clash_api_port = port;
            }
        }
        if let Some(v) = bool_pref(raw, "flutter.enable-clash-api") {
            self.enable_clash_api = v;
        }

        if let Some(v) = string_pref(raw, "flutter.log-level") {
            self.log_level = v;
        }
    }

    /// Apply TUN overrides given on the command line
    pub fn apply_overrides(&mut self, overrides: &TunOverrides) {
        if overrides.enable_tun {
            self.inbound.enable_tun = true;
            self.inbound.enable_tun_service = false;
            if overrides.mtu > 0 {
                self.inbound.mtu = overrides.mtu;
            }
            self.inbound.set_system_proxy = false;
        } else if overrides.disable_tun {
            self.inbound.enable_tun = false;
            self.inbound.set_system_proxy = overrides.set_system_proxy;
        } else if overrides.set_system_proxy {
            self.inbound.set_system_proxy = true;
        }
    }
}

fn string_pref(raw: &Map<String, Value>, key: &str) -> Option<String> {
    let value = raw.get(key)?.as_str()?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn bool_pref(raw: &Map<String, Value>, key: &str) -> Option<bool> {
    match raw.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

/// Integer from a JSON number (fractions truncated) or a numeric string
fn int_pref(raw: &Map<String, Value>, key: &str) -> Option<i64> {
    match raw.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn strategy_pref(raw: &Map<String, Value>, key: &str) -> Option<DomainStrategy> {
    let value = string_pref(raw, key)?;
    match value.parse::<DomainStrategy>() {
        Ok(strategy) => Some(strategy),
        Err(e) => {
            warn!("Ignoring {}: {}", key, e);
            None
        }
    }
}
