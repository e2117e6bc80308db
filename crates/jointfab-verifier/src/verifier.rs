//! Administrator trust verification.
//!
//! [`AdministratorTrustVerifier`] confirms that a remote administrator is the
//! same legal identity the local node already knows through its own fabric,
//! and that the administrator's vendor id is authentic, before it is granted
//! joint-fabric administrative rights.
//!
//! The stage handlers live on [`TrustStages`]; the generic
//! [`StageSequencer`] drives them in order and fires the owner's completion
//! callback exactly once.

use crate::attribute::attributes::{AdministratorFabricIndex, Fabrics, Nocs, TrustedRootCertificates};
use crate::attribute::{start_read, AttributeReader, PendingRead, ReadError, RemoteAttribute};
use crate::config::VerifierConfig;
use crate::exchange::{AdminEndpointRegistry, ExchangeContext};
use crate::fabric::{resolve_fabric, FabricDirectory};
use crate::info::AdministratorInfo;
use crate::sequencer::{StageSequencer, StageStep, StagedProcess};
use crate::stage::Stage;
use crate::vendor::{SessionGetter, VendorIdError, VendorIdVerifier};
use jointfab_types::{
    EndpointId, FabricIndex, Outcome, RootPublicKey, SecureSession, TrustError,
};
use std::fmt;
use std::rc::{Rc, Weak};
use tokio::sync::oneshot;
use tracing::Instrument;

/// External services a verification calls into.
#[derive(Clone)]
pub struct Collaborators {
    pub reader: Rc<dyn AttributeReader>,
    pub fabrics: Rc<dyn FabricDirectory>,
    pub vendor_id_verifier: Rc<dyn VendorIdVerifier>,
    pub endpoint_registry: Rc<dyn AdminEndpointRegistry>,
}

/// Stage handlers of the administrator trust verification.
pub struct TrustStages {
    exchange: Weak<dyn ExchangeContext>,
    accessing_fabric_index: FabricIndex,
    info: AdministratorInfo,
    collaborators: Collaborators,
    config: VerifierConfig,
}

impl TrustStages {
    pub fn info(&self) -> &AdministratorInfo {
        &self.info
    }

    pub fn accessing_fabric_index(&self) -> FabricIndex {
        self.accessing_fabric_index
    }

    fn live_session(&self) -> Option<SecureSession> {
        self.exchange.upgrade()?.current_session()
    }

    fn store_endpoint_id(&mut self) -> Outcome {
        let endpoint = self.info.admin_endpoint_id();
        if !endpoint.is_valid() {
            tracing::warn!(%endpoint, "administrator endpoint id is invalid");
            return Outcome::InvalidAdministratorEndpointId;
        }
        self.collaborators
            .endpoint_registry
            .set_peer_admin_endpoint(endpoint);
        Outcome::Success
    }

    fn begin_fabric_index_resolution(&mut self) -> StageStep<'_> {
        let Some(session) = self.live_session() else {
            tracing::warn!("exchange is no longer valid, cannot read administrator fabric index");
            return StageStep::Ready(Outcome::ReadAdminFabricIndexFailed);
        };

        let read = match start_read::<AdministratorFabricIndex>(
            &*self.collaborators.reader,
            &session,
            self.info.admin_endpoint_id(),
            false,
        ) {
            Ok(read) => read,
            Err(error) => {
                tracing::warn!(%error, "failed to issue administrator fabric index read");
                return StageStep::Ready(Outcome::ReadAdminFabricIndexFailed);
            }
        };

        StageStep::Pending(Box::pin(async move {
            match self.resolve_commissioner_fabric(session, read).await {
                Ok(()) => Outcome::Success,
                Err(outcome) => outcome,
            }
        }))
    }

    /// Four sequential reads: the remote administrator fabric index, then
    /// the fabric descriptors, trusted roots and NOCs for that index. All of
    /// them go over `session`.
    async fn resolve_commissioner_fabric(
        &mut self,
        session: SecureSession,
        read: PendingRead<AdministratorFabricIndex>,
    ) -> Result<(), Outcome> {
        let path = read.path();
        let remote_index = match read.response().await {
            Ok(Some(index)) if index.is_valid() => index,
            Ok(Some(index)) => {
                tracing::warn!(%index, "administrator fabric index out of range");
                return Err(Outcome::InvalidAdministratorFabricIndex);
            }
            Ok(None) => {
                tracing::warn!("administrator fabric index is null");
                return Err(Outcome::ReadAdminFabricIndexFailed);
            }
            Err(error) => {
                tracing::warn!(%path, %error, "reading administrator fabric index failed");
                return Err(Outcome::ReadAdminFabricIndexFailed);
            }
        };
        self.info
            .set_admin_fabric_index(remote_index)
            .map_err(invariant_violation)?;

        self.resolve_local_fabric(&session, remote_index).await?;
        self.harvest_root_certificate(&session).await?;
        self.harvest_operational_certificates(&session, remote_index)
            .await
    }

    async fn resolve_local_fabric(
        &mut self,
        session: &SecureSession,
        remote_index: FabricIndex,
    ) -> Result<(), Outcome> {
        // Any failure of the descriptor list itself is internal.
        let descriptors = self
            .issue::<Fabrics>(session, Outcome::InternalError)?
            .response()
            .await
            .map_err(|error| list_read_failure::<Fabrics>(error, Outcome::InternalError))?;

        let mut matched = None;
        for entry in descriptors {
            let descriptor = entry.map_err(list_entry_failure::<Fabrics>)?;
            if descriptor.fabric_index == remote_index {
                matched = Some(descriptor);
                break;
            }
        }
        let Some(descriptor) = matched else {
            tracing::warn!(%remote_index, "no remote fabric descriptor for administrator fabric index");
            return Err(Outcome::InvalidAdministratorFabricIndex);
        };

        let key = RootPublicKey::try_from(descriptor.root_public_key.as_slice()).map_err(|error| {
            tracing::warn!(%error, "remote fabric descriptor carries a malformed root public key");
            Outcome::InternalError
        })?;

        let Some(local) = resolve_fabric(&*self.collaborators.fabrics, &key, descriptor.fabric_id)
        else {
            tracing::warn!(
                fabric_id = %descriptor.fabric_id,
                root_key = %key.fingerprint(),
                "administrator fabric is not known locally"
            );
            return Err(Outcome::InvalidAdministratorFabricIndex);
        };

        tracing::debug!(
            %remote_index,
            local_index = %local.fabric_index(),
            "resolved administrator fabric"
        );
        self.info
            .set_local_admin_fabric_index(local.fabric_index())
            .map_err(invariant_violation)
    }

    async fn harvest_root_certificate(&mut self, session: &SecureSession) -> Result<(), Outcome> {
        let roots = self
            .issue::<TrustedRootCertificates>(session, Outcome::ReadAdminFabricIndexFailed)?
            .response()
            .await
            .map_err(|error| {
                list_read_failure::<TrustedRootCertificates>(
                    error,
                    Outcome::ReadAdminFabricIndexFailed,
                )
            })?;

        let rcac = match roots.into_iter().next() {
            None => {
                tracing::warn!("remote trusted root certificate list is empty");
                return Err(Outcome::InvalidAdministratorFabricIndex);
            }
            Some(entry) => entry.map_err(list_entry_failure::<TrustedRootCertificates>)?,
        };
        if rcac.is_empty() {
            tracing::warn!("remote trusted root certificate is empty");
            return Err(Outcome::InternalError);
        }

        self.info.set_admin_rcac(rcac);
        Ok(())
    }

    async fn harvest_operational_certificates(
        &mut self,
        session: &SecureSession,
        remote_index: FabricIndex,
    ) -> Result<(), Outcome> {
        let nocs = self
            .issue::<Nocs>(session, Outcome::ReadAdminFabricIndexFailed)?
            .response()
            .await
            .map_err(|error| list_read_failure::<Nocs>(error, Outcome::ReadAdminFabricIndexFailed))?;

        let mut matched = None;
        for entry in nocs {
            let entry = entry.map_err(list_entry_failure::<Nocs>)?;
            if entry.fabric_index == remote_index {
                matched = Some(entry);
                break;
            }
        }
        let Some(entry) = matched else {
            tracing::warn!(%remote_index, "no remote NOC for administrator fabric index");
            return Err(Outcome::InvalidAdministratorFabricIndex);
        };

        if entry.noc.is_empty() {
            tracing::warn!("remote NOC is empty");
            return Err(Outcome::InternalError);
        }
        let icac = match entry.icac {
            Some(icac) if icac.is_empty() => {
                tracing::warn!("remote ICAC is present but empty");
                return Err(Outcome::InternalError);
            }
            Some(icac) => icac,
            None => Vec::new(),
        };

        tracing::debug!(
            rcac_len = self.info.admin_rcac().len(),
            noc_len = entry.noc.len(),
            icac_len = icac.len(),
            "harvested administrator certificates"
        );
        self.info.set_admin_noc(entry.noc);
        self.info.set_admin_icac(icac);
        Ok(())
    }

    /// Issues one list read on `session` after checking that the exchange
    /// still carries that very session. `transport` is the outcome for a
    /// read that cannot be issued.
    fn issue<A: RemoteAttribute>(
        &self,
        session: &SecureSession,
        transport: Outcome,
    ) -> Result<PendingRead<A>, Outcome> {
        match self.live_session() {
            Some(current) if current == *session => {}
            Some(current) => {
                tracing::warn!(
                    attribute = A::NAME,
                    session_id = session.session_id,
                    current_session_id = current.session_id,
                    "exchange moved to another session, not issuing read"
                );
                return Err(Outcome::ReadAdminFabricIndexFailed);
            }
            None => {
                tracing::warn!(attribute = A::NAME, "exchange is no longer valid, not issuing read");
                return Err(Outcome::ReadAdminFabricIndexFailed);
            }
        }
        start_read::<A>(
            &*self.collaborators.reader,
            session,
            self.config.credentials_endpoint,
            self.config.fabric_filtered_reads,
        )
        .map_err(|error| list_read_failure::<A>(error, transport))
    }

    fn begin_vendor_id_verification(&mut self) -> StageStep<'_> {
        if let Err(outcome) = self.parse_administrator_info() {
            return StageStep::Ready(outcome);
        }

        let exchange = self.exchange.clone();
        let session: SessionGetter =
            Box::new(move || exchange.upgrade().and_then(|exchange| exchange.current_session()));
        let (tx, rx) = oneshot::channel();

        let started = self.collaborators.vendor_id_verifier.verify_vendor_id(
            session,
            &self.info,
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        if let Err(error) = started {
            tracing::warn!(%error, "vendor id verification could not start");
            return StageStep::Ready(Outcome::VendorIdVerificationFailed);
        }

        StageStep::Pending(Box::pin(async move {
            match rx.await.unwrap_or(Err(VendorIdError::Abandoned)) {
                Ok(()) => Outcome::Success,
                Err(error) => {
                    tracing::warn!(%error, "vendor id verification failed");
                    Outcome::VendorIdVerificationFailed
                }
            }
        }))
    }

    /// Fills vendor id, fabric id and root key from the resolved local fabric.
    fn parse_administrator_info(&mut self) -> Result<(), Outcome> {
        let local_index = self.info.local_admin_fabric_index();
        if !local_index.is_valid() {
            tracing::warn!(%local_index, "administrator fabric was never resolved");
            return Err(Outcome::InvalidAdministratorFabricIndex);
        }
        let Some(fabric) = self.collaborators.fabrics.find_by_index(local_index) else {
            tracing::warn!(%local_index, "resolved administrator fabric is gone");
            return Err(Outcome::InvalidAdministratorFabricIndex);
        };

        self.info
            .set_admin_vendor_id(fabric.vendor_id())
            .map_err(invariant_violation)?;
        self.info
            .set_admin_fabric_id(fabric.fabric_id())
            .map_err(invariant_violation)?;

        let key = fabric.fetch_root_public_key().map_err(invariant_violation)?;
        self.info
            .set_root_public_key(key)
            .map_err(invariant_violation)?;

        if self.info.admin_rcac().is_empty() || self.info.admin_noc().is_empty() {
            return Err(invariant_violation("administrator certificates were not harvested"));
        }

        tracing::debug!(
            vendor_id = %fabric.vendor_id(),
            fabric_id = %fabric.fabric_id(),
            root_key = %key.fingerprint(),
            "parsed administrator info"
        );
        Ok(())
    }

    fn cross_check_administrator_ids(&self) -> Outcome {
        let Some(accessing) = self
            .collaborators
            .fabrics
            .find_by_index(self.accessing_fabric_index)
        else {
            tracing::error!(
                accessing_fabric_index = %self.accessing_fabric_index,
                "accessing fabric missing from the local fabric table, cannot cross-check"
            );
            return Outcome::InternalError;
        };
        let Some(admin_fabric_id) = self.info.admin_fabric_id() else {
            return invariant_violation("administrator fabric id was never parsed");
        };

        if accessing.fabric_id() != admin_fabric_id {
            tracing::warn!(
                accessing_fabric_id = %accessing.fabric_id(),
                %admin_fabric_id,
                "administrator fabric id does not match the accessing fabric"
            );
            return Outcome::AdministratorIdMismatched;
        }

        let accessing_key = match accessing.fetch_root_public_key() {
            Ok(key) => key,
            Err(error) => {
                tracing::error!(
                    accessing_fabric_index = %self.accessing_fabric_index,
                    %error,
                    "accessing fabric root public key is malformed, cannot cross-check"
                );
                return Outcome::InternalError;
            }
        };
        let Some(admin_key) = self.info.root_public_key() else {
            return invariant_violation("administrator root public key was never parsed");
        };
        if accessing_key.as_bytes().len() != admin_key.as_bytes().len() {
            return invariant_violation("root public key lengths differ");
        }

        if accessing_key != *admin_key {
            tracing::warn!(
                accessing_root_key = %accessing_key.fingerprint(),
                admin_root_key = %admin_key.fingerprint(),
                "administrator root public key does not match the accessing fabric"
            );
            return Outcome::AdministratorIdMismatched;
        }

        Outcome::Success
    }
}

impl StagedProcess for TrustStages {
    type Stage = Stage;

    fn perform_stage(&mut self, stage: Stage) -> StageStep<'_> {
        match stage {
            Stage::StoringEndpointId => StageStep::Ready(self.store_endpoint_id()),
            Stage::ReadingCommissionerAdminFabricIndex => self.begin_fabric_index_resolution(),
            Stage::PerformingVendorIdVerification => self.begin_vendor_id_verification(),
            Stage::CrossCheckingAdministratorIds => {
                StageStep::Ready(self.cross_check_administrator_ids())
            }
            Stage::Complete => StageStep::Ready(Outcome::Success),
            Stage::Idle | Stage::Error => {
                StageStep::Ready(invariant_violation(format_args!("{stage} dispatched")))
            }
        }
    }
}

fn invariant_violation(error: impl fmt::Display) -> Outcome {
    tracing::error!(%error, "administrator info invariant violated");
    Outcome::InternalError
}

/// A list read that failed as a whole: undecodable payloads are internal
/// errors, anything else maps to `transport`.
fn list_read_failure<A: RemoteAttribute>(error: ReadError, transport: Outcome) -> Outcome {
    tracing::warn!(attribute = A::NAME, %error, "remote list read failed");
    match error {
        ReadError::Decode(_) | ReadError::UnexpectedType(_) => Outcome::InternalError,
        _ => transport,
    }
}

fn list_entry_failure<A: RemoteAttribute>(error: ReadError) -> Outcome {
    tracing::warn!(attribute = A::NAME, %error, "failed to decode remote list entry");
    Outcome::InternalError
}

/// Owner-facing handle of one joint trust verification.
///
/// Created per commissioning attempt, bound to one in-flight command, driven
/// to completion once, then dropped.
pub struct AdministratorTrustVerifier {
    sequencer: StageSequencer<TrustStages>,
}

impl AdministratorTrustVerifier {
    /// Binds a verifier to `exchange`. The accessing fabric index is captured
    /// now; afterwards only a weak reference to the exchange is kept.
    pub fn new<E: ExchangeContext + 'static>(
        exchange: &Rc<E>,
        admin_endpoint_id: EndpointId,
        collaborators: Collaborators,
        config: VerifierConfig,
        on_completion: impl FnOnce(Result<(), TrustError>) + 'static,
    ) -> Self {
        let accessing_fabric_index = exchange.accessing_fabric_index();
        let exchange: Weak<E> = Rc::downgrade(exchange);
        let exchange: Weak<dyn ExchangeContext> = exchange;

        let stages = TrustStages {
            exchange,
            accessing_fabric_index,
            info: AdministratorInfo::new(admin_endpoint_id),
            collaborators,
            config,
        };
        let sequencer = StageSequencer::new(
            stages,
            Box::new(move |result| {
                if result.is_ok() {
                    tracing::info!("administrator trust verified");
                }
                on_completion(result);
            }),
        );
        Self { sequencer }
    }

    pub fn info(&self) -> &AdministratorInfo {
        self.sequencer.process().info()
    }

    pub fn current_stage(&self) -> Stage {
        self.sequencer.current_stage()
    }

    /// Starts the verification and returns immediately; the result arrives
    /// through the completion callback.
    ///
    /// Must be called from within a `tokio::task::LocalSet`.
    pub fn verify_trust(self) {
        tokio::task::spawn_local(async move {
            self.run().await;
        });
    }

    /// Drives the verification to completion in place and returns the
    /// accumulated administrator info.
    pub async fn run(mut self) -> AdministratorInfo {
        let span = tracing::info_span!(
            "joint_trust_verification",
            endpoint_id = %self.info().admin_endpoint_id(),
            accessing_fabric_index = %self.sequencer.process().accessing_fabric_index(),
        );
        self.sequencer.start().instrument(span).await;
        self.sequencer.into_process().info
    }
}

/// Result of [`verify_administrator`].
#[derive(Debug)]
pub struct TrustReport {
    pub result: Result<(), TrustError>,
    pub info: AdministratorInfo,
}

/// Runs one verification to completion and returns its result together with
/// the administrator info it accumulated.
pub async fn verify_administrator<E: ExchangeContext + 'static>(
    exchange: &Rc<E>,
    admin_endpoint_id: EndpointId,
    collaborators: Collaborators,
    config: VerifierConfig,
) -> TrustReport {
    let (tx, rx) = oneshot::channel();
    let verifier = AdministratorTrustVerifier::new(
        exchange,
        admin_endpoint_id,
        collaborators,
        config,
        move |result| {
            let _ = tx.send(result);
        },
    );
    let info = verifier.run().await;
    let result = rx.await.unwrap_or(Err(TrustError::Internal));
    TrustReport { result, info }
}
