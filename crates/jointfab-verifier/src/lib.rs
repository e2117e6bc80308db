//! Joint-fabric administrator trust verification.
//!
//! Before a remote administrator is granted control over a device through a
//! joint fabric, the device confirms two things:
//!
//! 1. The administrator is the same legal identity the device already knows
//!    through the fabric the triggering command arrived on (same fabric id,
//!    byte-identical root public key).
//! 2. The administrator's claimed vendor id is independently verifiable.
//!
//! The work is split into stages driven by a generic [`StageSequencer`]:
//!
//! | Stage | Kind | Does |
//! |-------|------|------|
//! | `StoringEndpointId` | sync | validates and publishes the admin endpoint |
//! | `ReadingCommissionerAdminFabricIndex` | async | four sequential remote reads resolving the admin fabric and harvesting RCAC/NOC/ICAC |
//! | `PerformingVendorIdVerification` | async | fills vendor/fabric id and root key, runs the vendor-ID sub-protocol |
//! | `CrossCheckingAdministratorIds` | sync | compares against the accessing fabric |
//!
//! Any failure aborts the whole verification; the owner's completion
//! callback fires exactly once with `Ok(())` or a [`TrustError`].
//!
//! # Usage
//!
//! ```rust,ignore
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     let verifier = AdministratorTrustVerifier::new(
//!         &exchange,
//!         EndpointId(1),
//!         collaborators,
//!         VerifierConfig::default(),
//!         |result| tracing::info!(?result, "joint trust verification finished"),
//!     );
//!     verifier.verify_trust();
//! }).await;
//! ```

pub mod attribute;
mod config;
mod exchange;
mod fabric;
mod info;
pub mod memory;
mod sequencer;
mod stage;
mod vendor;
mod verifier;

pub use attribute::{
    start_read, AttributeReader, AttributeValue, FabricDescriptor, NocEntry, PendingRead,
    ReadCallback, ReadError, RemoteAttribute,
};
pub use config::VerifierConfig;
pub use exchange::{AdminEndpointRegistry, ExchangeContext};
pub use fabric::{resolve_fabric, FabricDirectory, FabricEntry};
pub use info::{AdministratorInfo, InfoError};
pub use jointfab_types::{Outcome, TrustError};
pub use sequencer::{
    Advance, CompletionCallback, StageChain, StageSequencer, StageStep, StagedProcess,
};
pub use stage::Stage;
pub use vendor::{SessionGetter, VendorIdCallback, VendorIdError, VendorIdVerifier};
pub use verifier::{
    verify_administrator, AdministratorTrustVerifier, Collaborators, TrustReport, TrustStages,
};
