//! In-memory collaborators.
//!
//! Used by the simulator and the integration tests. Asynchronous answers
//! are delivered on a later scheduler turn through `spawn_local`, so these
//! types must be driven from within a `tokio::task::LocalSet`.

use crate::attribute::{
    AttributeReader, AttributeValue, FabricDescriptor, NocEntry, ReadCallback, ReadError,
};
use crate::exchange::{AdminEndpointRegistry, ExchangeContext};
use crate::fabric::{FabricDirectory, FabricEntry};
use crate::info::AdministratorInfo;
use crate::vendor::{SessionGetter, VendorIdCallback, VendorIdError, VendorIdVerifier};
use jointfab_types::{
    clusters, AttributeId, AttributePath, ClusterId, EndpointId, FabricId, FabricIndex,
    RootPublicKey, SecureSession, VendorId,
};
use serde::Deserialize;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// Local fabric table backed by a vector.
#[derive(Debug, Default)]
pub struct MemoryFabricTable {
    entries: RefCell<Vec<FabricEntry>>,
    exact_lookup: Cell<bool>,
}

impl MemoryFabricTable {
    pub fn new(entries: Vec<FabricEntry>) -> Self {
        Self {
            entries: RefCell::new(entries),
            exact_lookup: Cell::new(true),
        }
    }

    pub fn insert(&self, entry: FabricEntry) {
        self.entries.borrow_mut().push(entry);
    }

    pub fn remove(&self, index: FabricIndex) {
        self.entries
            .borrow_mut()
            .retain(|entry| entry.fabric_index() != index);
    }

    /// Makes `find_by_root_key_and_id` always miss, like a directory that
    /// only matches identical key objects.
    pub fn disable_exact_lookup(&self) {
        self.exact_lookup.set(false);
    }
}

impl FabricDirectory for MemoryFabricTable {
    fn find_by_index(&self, index: FabricIndex) -> Option<FabricEntry> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.fabric_index() == index)
            .cloned()
    }

    fn find_by_root_key_and_id(
        &self,
        key: &RootPublicKey,
        fabric_id: FabricId,
    ) -> Option<FabricEntry> {
        if !self.exact_lookup.get() {
            return None;
        }
        self.entries
            .borrow()
            .iter()
            .find(|entry| {
                entry.fabric_id() == fabric_id
                    && entry.fetch_root_public_key().ok().as_ref() == Some(key)
            })
            .cloned()
    }

    fn fabrics(&self) -> Vec<FabricEntry> {
        self.entries.borrow().clone()
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Answer(Result<AttributeValue, ReadError>),
    Refuse(ReadError),
}

/// A read issued against a [`ScriptedPeer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssuedRead {
    pub path: AttributePath,
    pub session: SecureSession,
    pub fabric_filtered: bool,
}

type ReadHook = Box<dyn Fn(&AttributePath)>;

/// Remote peer that answers attribute reads from a script.
///
/// Attributes are keyed by cluster and attribute id; the endpoint is only
/// recorded. Unscripted attributes answer `ReadError::Unsupported`.
#[derive(Default)]
pub struct ScriptedPeer {
    script: RefCell<HashMap<(ClusterId, AttributeId), Scripted>>,
    issued: RefCell<Vec<IssuedRead>>,
    hook: RefCell<Option<ReadHook>>,
}

impl ScriptedPeer {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, cluster: ClusterId, attribute: AttributeId, scripted: Scripted) {
        self.script
            .borrow_mut()
            .insert((cluster, attribute), scripted);
    }

    pub fn set_admin_fabric_index(&self, index: Option<FabricIndex>) {
        self.answer(
            clusters::joint_fabric_administrator::ID,
            clusters::joint_fabric_administrator::ADMINISTRATOR_FABRIC_INDEX,
            Ok(AttributeValue::AdministratorFabricIndex(index)),
        );
    }

    pub fn set_fabrics(&self, fabrics: Vec<FabricDescriptor>) {
        self.answer(
            clusters::operational_credentials::ID,
            clusters::operational_credentials::FABRICS,
            Ok(AttributeValue::Fabrics(fabrics.into_iter().map(Ok).collect())),
        );
    }

    pub fn set_trusted_roots(&self, roots: Vec<Vec<u8>>) {
        self.answer(
            clusters::operational_credentials::ID,
            clusters::operational_credentials::TRUSTED_ROOT_CERTIFICATES,
            Ok(AttributeValue::TrustedRootCertificates(
                roots.into_iter().map(Ok).collect(),
            )),
        );
    }

    pub fn set_nocs(&self, nocs: Vec<NocEntry>) {
        self.answer(
            clusters::operational_credentials::ID,
            clusters::operational_credentials::NOCS,
            Ok(AttributeValue::Nocs(nocs.into_iter().map(Ok).collect())),
        );
    }

    /// Scripts an asynchronous answer (value or error) for one attribute.
    pub fn answer(
        &self,
        cluster: ClusterId,
        attribute: AttributeId,
        answer: Result<AttributeValue, ReadError>,
    ) {
        self.set(cluster, attribute, Scripted::Answer(answer));
    }

    /// Makes the read of one attribute fail synchronously.
    pub fn refuse(&self, cluster: ClusterId, attribute: AttributeId, error: ReadError) {
        self.set(cluster, attribute, Scripted::Refuse(error));
    }

    /// Installs a hook run whenever a read is issued.
    pub fn on_read(&self, hook: impl Fn(&AttributePath) + 'static) {
        *self.hook.borrow_mut() = Some(Box::new(hook));
    }

    pub fn issued_reads(&self) -> Vec<IssuedRead> {
        self.issued.borrow().clone()
    }
}

impl AttributeReader for ScriptedPeer {
    fn read_attribute(
        &self,
        session: &SecureSession,
        path: AttributePath,
        fabric_filtered: bool,
        on_complete: ReadCallback,
    ) -> Result<(), ReadError> {
        self.issued.borrow_mut().push(IssuedRead {
            path,
            session: *session,
            fabric_filtered,
        });
        if let Some(hook) = self.hook.borrow().as_ref() {
            hook(&path);
        }

        let scripted = self
            .script
            .borrow()
            .get(&(path.cluster, path.attribute))
            .cloned();
        let answer = match scripted {
            Some(Scripted::Refuse(error)) => return Err(error),
            Some(Scripted::Answer(answer)) => answer,
            None => Err(ReadError::Unsupported(path)),
        };

        tokio::task::spawn_local(async move {
            tokio::task::yield_now().await;
            on_complete(answer);
        });
        Ok(())
    }
}

/// Verdict returned by a [`StaticVendorIdVerifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VendorVerdict {
    #[default]
    Accept,
    Reject,
    FailToStart,
}

/// One call seen by a [`StaticVendorIdVerifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VendorIdCall {
    /// Vendor id found in the administrator info at call time.
    pub vendor_id: Option<VendorId>,
    /// Session returned by the getter when the answer was produced.
    pub session: Option<SecureSession>,
}

/// Vendor-ID verifier with a fixed verdict.
///
/// The session getter is evaluated when the answer is produced, not when
/// the verification starts; a missing session fails the verification.
#[derive(Debug, Default)]
pub struct StaticVendorIdVerifier {
    verdict: Cell<VendorVerdict>,
    calls: Rc<RefCell<Vec<VendorIdCall>>>,
}

impl StaticVendorIdVerifier {
    pub fn new(verdict: VendorVerdict) -> Self {
        Self {
            verdict: Cell::new(verdict),
            calls: Rc::default(),
        }
    }

    pub fn set_verdict(&self, verdict: VendorVerdict) {
        self.verdict.set(verdict);
    }

    pub fn calls(&self) -> Vec<VendorIdCall> {
        self.calls.borrow().clone()
    }
}

impl VendorIdVerifier for StaticVendorIdVerifier {
    fn verify_vendor_id(
        &self,
        session: SessionGetter,
        info: &AdministratorInfo,
        on_complete: VendorIdCallback,
    ) -> Result<(), VendorIdError> {
        let vendor_id = info.admin_vendor_id();
        let slot = {
            let mut calls = self.calls.borrow_mut();
            calls.push(VendorIdCall {
                vendor_id,
                session: None,
            });
            calls.len() - 1
        };

        let verdict = self.verdict.get();
        if verdict == VendorVerdict::FailToStart {
            return Err(VendorIdError::NotStarted("verifier busy".to_string()));
        }

        let calls = Rc::clone(&self.calls);
        tokio::task::spawn_local(async move {
            tokio::task::yield_now().await;
            let current = session();
            if let Some(call) = calls.borrow_mut().get_mut(slot) {
                call.session = current;
            }
            let result = match (current, verdict, vendor_id) {
                (None, _, _) => Err(VendorIdError::SessionUnavailable),
                (Some(_), VendorVerdict::Accept, Some(_)) => Ok(()),
                (Some(_), _, Some(vendor_id)) => Err(VendorIdError::Rejected(vendor_id)),
                (Some(_), _, None) => Err(VendorIdError::NotStarted(
                    "administrator vendor id missing".to_string(),
                )),
            };
            on_complete(result);
        });
        Ok(())
    }
}

/// Exchange whose session can be torn down on demand.
#[derive(Debug)]
pub struct LocalExchange {
    session: Cell<Option<SecureSession>>,
    accessing_fabric_index: FabricIndex,
}

impl LocalExchange {
    pub fn new(session: SecureSession) -> Self {
        Self {
            session: Cell::new(Some(session)),
            accessing_fabric_index: session.fabric_index,
        }
    }

    /// Simulates a transport reset: the session is gone from now on.
    pub fn invalidate(&self) {
        self.session.set(None);
    }

    /// Moves the exchange onto another session, as after a re-establishment
    /// with a different peer.
    pub fn replace_session(&self, session: SecureSession) {
        self.session.set(Some(session));
    }
}

impl ExchangeContext for LocalExchange {
    fn current_session(&self) -> Option<SecureSession> {
        self.session.get()
    }

    fn accessing_fabric_index(&self) -> FabricIndex {
        self.accessing_fabric_index
    }
}

/// Registry that remembers the last published endpoint.
#[derive(Debug, Default)]
pub struct RecordingEndpointRegistry {
    endpoint: Cell<Option<EndpointId>>,
}

impl RecordingEndpointRegistry {
    pub fn peer_admin_endpoint(&self) -> Option<EndpointId> {
        self.endpoint.get()
    }
}

impl AdminEndpointRegistry for RecordingEndpointRegistry {
    fn set_peer_admin_endpoint(&self, endpoint: EndpointId) {
        self.endpoint.set(Some(endpoint));
    }
}
