//! Vendor-ID verification sub-protocol boundary.

use crate::info::AdministratorInfo;
use jointfab_types::{SecureSession, VendorId};

/// Errors reported by a vendor-ID verifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VendorIdError {
    /// The verification could not be started.
    #[error("vendor id verification could not start: {0}")]
    NotStarted(String),

    /// The session was gone when the verifier needed it.
    #[error("secure session unavailable for vendor id verification")]
    SessionUnavailable,

    /// The claimed vendor id is not authentic.
    #[error("vendor id {0} could not be verified")]
    Rejected(VendorId),

    /// The continuation was dropped without ever being invoked.
    #[error("vendor id verification abandoned before completion")]
    Abandoned,
}

/// Re-derives the session from the exchange each time it is called.
pub type SessionGetter = Box<dyn Fn() -> Option<SecureSession>>;

/// Continuation invoked exactly once with the verification result.
pub type VendorIdCallback = Box<dyn FnOnce(Result<(), VendorIdError>)>;

/// Confirms that an administrator's claimed vendor id is authentic.
pub trait VendorIdVerifier {
    /// Starts a verification. `Ok(())` means `on_complete` will be invoked
    /// exactly once; `Err` means nothing was started.
    ///
    /// `session` must be called at the point of use, never cached.
    fn verify_vendor_id(
        &self,
        session: SessionGetter,
        info: &AdministratorInfo,
        on_complete: VendorIdCallback,
    ) -> Result<(), VendorIdError>;
}
