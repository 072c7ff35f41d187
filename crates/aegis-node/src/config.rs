use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which verification gate the node runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifierMode {
    /// Simulated verifier with injectable failure rates.
    Mock,
    /// Trust-minimized verifier (not yet implemented; fails fast).
    Real,
}

/// Configuration for an Aegis claim node.
///
/// Invalid configuration aborts startup — it is never caught per-request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Node display name.
    pub name: String,
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
    /// API server settings.
    pub api: ApiConfig,
    /// Transit status resolution settings.
    pub transit: TransitConfig,
    /// Verification gate settings.
    pub verification: VerificationConfig,
    /// Attestation latency simulation settings.
    pub attestation: AttestationLatencyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Listen address for the HTTP API.
    pub listen_addr: String,
    /// Port for the HTTP API.
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitConfig {
    /// Upstream status provider base URL. Empty = synthetic only.
    pub upstream_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Gate selection, fixed at composition time.
    pub mode: VerifierMode,
    /// Probability the verification provider is unavailable.
    pub unavailable_rate: f64,
    /// Probability the data is reported tampered.
    pub tamper_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttestationLatencyConfig {
    /// Minimum simulated consensus latency in milliseconds.
    pub min_latency_ms: u64,
    /// Maximum simulated consensus latency in milliseconds.
    pub max_latency_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "aegis-node".into(),
            log_level: "info".into(),
            api: ApiConfig::default(),
            transit: TransitConfig::default(),
            verification: VerificationConfig::default(),
            attestation: AttestationLatencyConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            upstream_url: String::new(),
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            mode: VerifierMode::Mock,
            unavailable_rate: 0.02,
            tamper_rate: 0.01,
        }
    }
}

impl Default for AttestationLatencyConfig {
    fn default() -> Self {
        Self {
            min_latency_ms: 1000,
            max_latency_ms: 2000,
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the node must not start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (label, rate) in [
            ("verification.unavailable_rate", self.verification.unavailable_rate),
            ("verification.tamper_rate", self.verification.tamper_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) || rate.is_nan() {
                anyhow::bail!("{label} must be within 0.0..=1.0, got {rate}");
            }
        }
        if self.attestation.min_latency_ms > self.attestation.max_latency_ms {
            anyhow::bail!(
                "attestation.min_latency_ms ({}) exceeds max_latency_ms ({})",
                self.attestation.min_latency_ms,
                self.attestation.max_latency_ms
            );
        }
        Ok(())
    }
}
