//! Builds the in-memory world described by a [`ScenarioConfig`] and runs one
//! verification against it.

use crate::config::{Config, ScenarioConfig};
use jointfab_types::SecureSession;
use jointfab_verifier::memory::{
    LocalExchange, MemoryFabricTable, RecordingEndpointRegistry, ScriptedPeer,
    StaticVendorIdVerifier,
};
use jointfab_verifier::{
    verify_administrator, Collaborators, FabricDescriptor, FabricEntry, NocEntry, TrustReport,
};
use std::rc::Rc;

/// Collaborators and exchange of one simulated verification.
pub struct World {
    pub exchange: Rc<LocalExchange>,
    pub peer: Rc<ScriptedPeer>,
    pub fabrics: Rc<MemoryFabricTable>,
    pub vendor: Rc<StaticVendorIdVerifier>,
    pub registry: Rc<RecordingEndpointRegistry>,
}

impl World {
    pub fn from_scenario(scenario: &ScenarioConfig) -> Self {
        let fabrics = MemoryFabricTable::new(
            scenario
                .local_fabrics
                .iter()
                .map(|fabric| {
                    FabricEntry::new(
                        fabric.fabric_index,
                        fabric.fabric_id,
                        fabric.vendor_id,
                        fabric.root_public_key.as_slice(),
                    )
                })
                .collect(),
        );

        let peer = ScriptedPeer::new();
        peer.set_admin_fabric_index(scenario.peer.administrator_fabric_index);
        peer.set_fabrics(
            scenario
                .peer
                .fabrics
                .iter()
                .map(|fabric| FabricDescriptor {
                    root_public_key: fabric.root_public_key.0.clone(),
                    vendor_id: fabric.vendor_id,
                    fabric_id: fabric.fabric_id,
                    node_id: fabric.node_id,
                    label: fabric.label.clone(),
                    fabric_index: fabric.fabric_index,
                })
                .collect(),
        );
        peer.set_trusted_roots(
            scenario
                .peer
                .trusted_root_certificates
                .iter()
                .map(|cert| cert.0.clone())
                .collect(),
        );
        peer.set_nocs(
            scenario
                .peer
                .nocs
                .iter()
                .map(|entry| NocEntry {
                    noc: entry.noc.0.clone(),
                    icac: entry.icac.as_ref().map(|icac| icac.0.clone()),
                    fabric_index: entry.fabric_index,
                })
                .collect(),
        );

        let session = SecureSession {
            session_id: scenario.session_id,
            peer_node_id: scenario.peer_node_id,
            fabric_index: scenario.accessing_fabric_index,
        };

        Self {
            exchange: Rc::new(LocalExchange::new(session)),
            peer: Rc::new(peer),
            fabrics: Rc::new(fabrics),
            vendor: Rc::new(StaticVendorIdVerifier::new(scenario.vendor_verdict)),
            registry: Rc::new(RecordingEndpointRegistry::default()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            reader: self.peer.clone(),
            fabrics: self.fabrics.clone(),
            vendor_id_verifier: self.vendor.clone(),
            endpoint_registry: self.registry.clone(),
        }
    }
}

/// Runs the configured scenario to completion.
///
/// Must be awaited from within a `tokio::task::LocalSet`.
pub async fn run_scenario(config: &Config) -> TrustReport {
    let world = World::from_scenario(&config.scenario);
    tracing::info!(
        admin_endpoint_id = %config.scenario.admin_endpoint_id,
        accessing_fabric_index = %config.scenario.accessing_fabric_index,
        local_fabrics = config.scenario.local_fabrics.len(),
        "running joint trust scenario"
    );
    verify_administrator(
        &world.exchange,
        config.scenario.admin_endpoint_id,
        world.collaborators(),
        config.verifier.clone(),
    )
    .await
}
