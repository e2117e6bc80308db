#![allow(dead_code)]

use jointfab_types::{
    EndpointId, FabricId, FabricIndex, NodeId, SecureSession, TrustError, VendorId,
    ROOT_PUBLIC_KEY_LEN,
};
use jointfab_verifier::memory::{
    LocalExchange, MemoryFabricTable, RecordingEndpointRegistry, ScriptedPeer,
    StaticVendorIdVerifier, VendorVerdict,
};
use jointfab_verifier::{
    AdministratorInfo, AdministratorTrustVerifier, Collaborators, FabricDescriptor, FabricEntry,
    NocEntry, VerifierConfig,
};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::task::LocalSet;

pub const ADMIN_ENDPOINT: EndpointId = EndpointId(5);
pub const REMOTE_ADMIN_INDEX: FabricIndex = FabricIndex(3);
pub const LOCAL_ADMIN_INDEX: FabricIndex = FabricIndex(2);
pub const OTHER_LOCAL_INDEX: FabricIndex = FabricIndex(1);
pub const ADMIN_FABRIC_ID: FabricId = FabricId(42);
pub const ADMIN_VENDOR_ID: VendorId = VendorId(0xFFF1);

/// Uncompressed-point shaped key filled with `fill`.
pub fn root_key(fill: u8) -> Vec<u8> {
    let mut key = vec![fill; ROOT_PUBLIC_KEY_LEN];
    key[0] = 0x04;
    key
}

pub fn session(fabric_index: FabricIndex) -> SecureSession {
    SecureSession {
        session_id: 0x1234,
        peer_node_id: NodeId(0xAB),
        fabric_index,
    }
}

pub fn rcac() -> Vec<u8> {
    vec![0x15, 0x30, 0x01, 0x08, 0xAA]
}

pub fn noc() -> Vec<u8> {
    vec![0x15, 0x30, 0x01, 0x08, 0xBB]
}

pub fn icac() -> Vec<u8> {
    vec![0x15, 0x30, 0x01, 0x08, 0xCC]
}

pub fn admin_descriptor() -> FabricDescriptor {
    FabricDescriptor {
        root_public_key: root_key(0x11),
        vendor_id: ADMIN_VENDOR_ID,
        fabric_id: ADMIN_FABRIC_ID,
        node_id: NodeId(0xAB),
        label: "jf-admin".to_string(),
        fabric_index: REMOTE_ADMIN_INDEX,
    }
}

pub fn admin_noc_entry() -> NocEntry {
    NocEntry {
        noc: noc(),
        icac: Some(icac()),
        fabric_index: REMOTE_ADMIN_INDEX,
    }
}

/// In-memory world: local fabric 2 is `(42, K)`, the peer reports remote
/// index 3 for the same fabric, and the command arrived on local fabric 2.
pub struct Fixture {
    pub exchange: Rc<LocalExchange>,
    pub peer: Rc<ScriptedPeer>,
    pub fabrics: Rc<MemoryFabricTable>,
    pub vendor: Rc<StaticVendorIdVerifier>,
    pub registry: Rc<RecordingEndpointRegistry>,
    pub endpoint: EndpointId,
}

impl Fixture {
    pub fn new() -> Self {
        Self::accessed_on(LOCAL_ADMIN_INDEX)
    }

    pub fn accessed_on(accessing: FabricIndex) -> Self {
        let fabrics = MemoryFabricTable::new(vec![
            FabricEntry::new(OTHER_LOCAL_INDEX, FabricId(7), VendorId(0xFFF2), root_key(0x22)),
            FabricEntry::new(LOCAL_ADMIN_INDEX, ADMIN_FABRIC_ID, ADMIN_VENDOR_ID, root_key(0x11)),
        ]);

        let peer = ScriptedPeer::new();
        peer.set_admin_fabric_index(Some(REMOTE_ADMIN_INDEX));
        peer.set_fabrics(vec![
            FabricDescriptor {
                root_public_key: root_key(0x99),
                vendor_id: VendorId(0xFFF3),
                fabric_id: FabricId(99),
                node_id: NodeId(0x01),
                label: "other".to_string(),
                fabric_index: FabricIndex(1),
            },
            admin_descriptor(),
        ]);
        peer.set_trusted_roots(vec![rcac()]);
        peer.set_nocs(vec![
            NocEntry {
                noc: vec![0x01],
                icac: None,
                fabric_index: FabricIndex(1),
            },
            admin_noc_entry(),
        ]);

        Self {
            exchange: Rc::new(LocalExchange::new(session(accessing))),
            peer: Rc::new(peer),
            fabrics: Rc::new(fabrics),
            vendor: Rc::new(StaticVendorIdVerifier::new(VendorVerdict::Accept)),
            registry: Rc::new(RecordingEndpointRegistry::default()),
            endpoint: ADMIN_ENDPOINT,
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

    /// Builds a verifier whose completions are pushed into `sink`.
    pub fn verifier(&self, sink: &Completions) -> AdministratorTrustVerifier {
        let sink = sink.clone();
        AdministratorTrustVerifier::new(
            &self.exchange,
            self.endpoint,
            self.collaborators(),
            VerifierConfig::default(),
            move |result| sink.borrow_mut().push(result),
        )
    }

    /// Runs one verification to the end on a fresh `LocalSet`.
    pub async fn run(&self) -> Finished {
        let completions = Completions::default();
        let verifier = self.verifier(&completions);
        let info = LocalSet::new().run_until(verifier.run()).await;
        Finished {
            completions: completions.take(),
            info,
        }
    }
}

pub type Completions = Rc<RefCell<Vec<Result<(), TrustError>>>>;

pub struct Finished {
    pub completions: Vec<Result<(), TrustError>>,
    pub info: AdministratorInfo,
}

impl Finished {
    /// The single completion; panics if the callback fired zero or several times.
    pub fn result(&self) -> Result<(), TrustError> {
        assert_eq!(
            self.completions.len(),
            1,
            "completion must fire exactly once, got {:?}",
            self.completions
        );
        self.completions[0]
    }
}

/// Installs a test subscriber once so failures come with logs.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("jointfab_verifier=debug")
        .try_init();
}
