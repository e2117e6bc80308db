//! Stage and verification outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of one verification stage, or of the whole verification.
///
/// `Pending` means an asynchronous operation was started and its completion
/// will arrive later; it is never a terminal outcome. Every other value
/// except `Success` terminates the verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Pending,
    InternalError,
    InvalidAdministratorEndpointId,
    ReadAdminFabricIndexFailed,
    InvalidAdministratorFabricIndex,
    VendorIdVerificationFailed,
    AdministratorIdMismatched,
}

impl Outcome {
    /// Returns the canonical string label for this outcome.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Pending => "PENDING",
            Self::InternalError => "INTERNAL_ERROR",
            Self::InvalidAdministratorEndpointId => "INVALID_ADMINISTRATOR_ENDPOINT_ID",
            Self::ReadAdminFabricIndexFailed => "READ_ADMIN_FABRIC_INDEX_FAILED",
            Self::InvalidAdministratorFabricIndex => "INVALID_ADMINISTRATOR_FABRIC_INDEX",
            Self::VendorIdVerificationFailed => "VENDOR_ID_VERIFICATION_FAILED",
            Self::AdministratorIdMismatched => "ADMINISTRATOR_ID_MISMATCHED",
        }
    }

    /// Everything except `Pending` is terminal for the stage that produced it.
    pub fn is_terminal(self) -> bool {
        self != Self::Pending
    }

    /// Converts a terminal outcome into the owner-facing result.
    ///
    /// `Pending` is not a result; it maps to `TrustError::Internal`.
    pub fn into_result(self) -> Result<(), TrustError> {
        match self {
            Self::Success => Ok(()),
            other => Err(TrustError::try_from(other).unwrap_or(TrustError::Internal)),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a joint trust verification.
///
/// Each variant is produced by exactly one logical step of the verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrustError {
    /// A local invariant was violated or local state was malformed.
    #[error("internal error during administrator trust verification")]
    Internal,

    /// The administrator endpoint id supplied by the caller is invalid.
    #[error("invalid administrator endpoint id")]
    InvalidAdministratorEndpointId,

    /// The remote administrator fabric index could not be read.
    #[error("failed to read the remote administrator fabric index")]
    ReadAdminFabricIndexFailed,

    /// The remote administrator fabric index does not resolve to a local fabric.
    #[error("administrator fabric index does not resolve to a known fabric")]
    InvalidAdministratorFabricIndex,

    /// The administrator's vendor id could not be verified.
    #[error("administrator vendor id verification failed")]
    VendorIdVerificationFailed,

    /// The administrator is not the identity that sent the command.
    #[error("administrator identity does not match the accessing fabric")]
    AdministratorIdMismatched,
}

impl TrustError {
    /// Returns the outcome this error was produced from.
    pub fn outcome(self) -> Outcome {
        match self {
            Self::Internal => Outcome::InternalError,
            Self::InvalidAdministratorEndpointId => Outcome::InvalidAdministratorEndpointId,
            Self::ReadAdminFabricIndexFailed => Outcome::ReadAdminFabricIndexFailed,
            Self::InvalidAdministratorFabricIndex => Outcome::InvalidAdministratorFabricIndex,
            Self::VendorIdVerificationFailed => Outcome::VendorIdVerificationFailed,
            Self::AdministratorIdMismatched => Outcome::AdministratorIdMismatched,
        }
    }
}

impl From<TrustError> for Outcome {
    fn from(error: TrustError) -> Self {
        error.outcome()
    }
}

impl TryFrom<Outcome> for TrustError {
    type Error = Outcome;

    /// Fails for the non-error outcomes `Success` and `Pending`.
    fn try_from(outcome: Outcome) -> Result<Self, Self::Error> {
        match outcome {
            Outcome::InternalError => Ok(Self::Internal),
            Outcome::InvalidAdministratorEndpointId => Ok(Self::InvalidAdministratorEndpointId),
            Outcome::ReadAdminFabricIndexFailed => Ok(Self::ReadAdminFabricIndexFailed),
            Outcome::InvalidAdministratorFabricIndex => Ok(Self::InvalidAdministratorFabricIndex),
            Outcome::VendorIdVerificationFailed => Ok(Self::VendorIdVerificationFailed),
            Outcome::AdministratorIdMismatched => Ok(Self::AdministratorIdMismatched),
            Outcome::Success | Outcome::Pending => Err(outcome),
        }
    }
}
