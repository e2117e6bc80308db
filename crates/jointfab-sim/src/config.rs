//! Simulator configuration loading from file and environment variables.

use jointfab_types::{EndpointId, FabricId, FabricIndex, NodeId, VendorId, ROOT_PUBLIC_KEY_LEN};
use jointfab_verifier::memory::VendorVerdict;
use jointfab_verifier::VerifierConfig;
use serde::{Deserialize, Deserializer};
use std::fmt;
use thiserror::Error;

/// Top-level simulator configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Remote read tunables handed to the verifier.
    #[serde(default)]
    pub verifier: VerifierConfig,

    /// The world the verification runs against.
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "jointfab_verifier=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Byte string written as hex in the configuration file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexBytes({})", hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        hex::decode(&compact)
            .map(HexBytes)
            .map_err(serde::de::Error::custom)
    }
}

/// One entry of the local fabric table.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalFabricConfig {
    pub fabric_index: FabricIndex,
    pub fabric_id: FabricId,
    pub vendor_id: VendorId,
    pub root_public_key: HexBytes,
}

/// One fabric descriptor as reported by the remote administrator.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFabricConfig {
    pub fabric_index: FabricIndex,
    pub fabric_id: FabricId,
    pub vendor_id: VendorId,
    #[serde(default)]
    pub node_id: NodeId,
    #[serde(default)]
    pub label: String,
    pub root_public_key: HexBytes,
}

/// One operational certificate entry as reported by the remote administrator.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteNocConfig {
    pub fabric_index: FabricIndex,
    pub noc: HexBytes,
    #[serde(default)]
    pub icac: Option<HexBytes>,
}

/// Attribute values served by the simulated remote administrator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Value of the AdministratorFabricIndex attribute; absent means null.
    #[serde(default)]
    pub administrator_fabric_index: Option<FabricIndex>,
    pub fabrics: Vec<RemoteFabricConfig>,
    pub trusted_root_certificates: Vec<HexBytes>,
    pub nocs: Vec<RemoteNocConfig>,
}

/// The simulated world: local fabric table, triggering session and peer.
///
/// Missing keys fall back to the built-in demo world, in which local fabric 1
/// and remote fabric 3 are the same fabric and verification succeeds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Endpoint hosting the administrator cluster on the peer.
    pub admin_endpoint_id: EndpointId,
    /// Local fabric the triggering command arrived on.
    pub accessing_fabric_index: FabricIndex,
    pub session_id: u16,
    pub peer_node_id: NodeId,
    pub vendor_verdict: VendorVerdict,
    pub local_fabrics: Vec<LocalFabricConfig>,
    pub peer: PeerConfig,
}

const DEMO_FABRIC_ID: FabricId = FabricId(0x2A);
const DEMO_VENDOR_ID: VendorId = VendorId(0xFFF1);
const DEMO_REMOTE_INDEX: FabricIndex = FabricIndex(3);

fn demo_root_key() -> HexBytes {
    let mut key = vec![0x11; ROOT_PUBLIC_KEY_LEN];
    key[0] = 0x04;
    HexBytes(key)
}

fn demo_certificate(tag: u8) -> HexBytes {
    HexBytes(vec![0x15, 0x30, 0x01, 0x08, tag])
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            administrator_fabric_index: Some(DEMO_REMOTE_INDEX),
            fabrics: vec![RemoteFabricConfig {
                fabric_index: DEMO_REMOTE_INDEX,
                fabric_id: DEMO_FABRIC_ID,
                vendor_id: DEMO_VENDOR_ID,
                node_id: NodeId(0x01),
                label: "jf-admin".to_string(),
                root_public_key: demo_root_key(),
            }],
            trusted_root_certificates: vec![demo_certificate(0xAA)],
            nocs: vec![RemoteNocConfig {
                fabric_index: DEMO_REMOTE_INDEX,
                noc: demo_certificate(0xBB),
                icac: Some(demo_certificate(0xCC)),
            }],
        }
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            admin_endpoint_id: EndpointId(1),
            accessing_fabric_index: FabricIndex(1),
            session_id: 1,
            peer_node_id: NodeId(0x01),
            vendor_verdict: VendorVerdict::Accept,
            local_fabrics: vec![LocalFabricConfig {
                fabric_index: FabricIndex(1),
                fabric_id: DEMO_FABRIC_ID,
                vendor_id: DEMO_VENDOR_ID,
                root_public_key: demo_root_key(),
            }],
            peer: PeerConfig::default(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `JOINTFAB_LOG_LEVEL` overrides `logging.level`
/// - `JOINTFAB_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_overrides(&mut config, |name| std::env::var(name).ok());
    Ok(config)
}

fn apply_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(level) = var("JOINTFAB_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("JOINTFAB_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}
