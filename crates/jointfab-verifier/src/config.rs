//! Verifier configuration.

use jointfab_types::EndpointId;
use serde::Deserialize;

/// Tunables for the remote reads issued by the verifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VerifierConfig {
    /// Endpoint hosting the peer's operational credentials cluster.
    #[serde(default = "default_credentials_endpoint")]
    pub credentials_endpoint: EndpointId,

    /// Whether list reads are fabric-filtered.
    #[serde(default = "default_fabric_filtered")]
    pub fabric_filtered_reads: bool,
}

fn default_credentials_endpoint() -> EndpointId {
    EndpointId::ROOT
}

fn default_fabric_filtered() -> bool {
    true
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            credentials_endpoint: default_credentials_endpoint(),
            fabric_filtered_reads: default_fabric_filtered(),
        }
    }
}
