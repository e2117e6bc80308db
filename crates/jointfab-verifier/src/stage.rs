//! Stages of a joint trust verification.

use crate::sequencer::StageChain;
use std::fmt;

/// One step of the administrator trust verification.
///
/// Stages run in a fixed linear order:
/// `Idle → StoringEndpointId → ReadingCommissionerAdminFabricIndex →
/// PerformingVendorIdVerification → CrossCheckingAdministratorIds → Complete`.
/// `Error` is a pseudo-stage that is never dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    StoringEndpointId,
    ReadingCommissionerAdminFabricIndex,
    PerformingVendorIdVerification,
    CrossCheckingAdministratorIds,
    Complete,
    Error,
}

impl Stage {
    /// Returns the stage that follows `self`.
    ///
    /// Total: `Complete` and `Error` have no successor and yield `Error`.
    pub fn successor(self) -> Stage {
        match self {
            Self::Idle => Self::StoringEndpointId,
            Self::StoringEndpointId => Self::ReadingCommissionerAdminFabricIndex,
            Self::ReadingCommissionerAdminFabricIndex => Self::PerformingVendorIdVerification,
            Self::PerformingVendorIdVerification => Self::CrossCheckingAdministratorIds,
            Self::CrossCheckingAdministratorIds => Self::Complete,
            Self::Complete | Self::Error => Self::Error,
        }
    }

    /// Returns the canonical string label for this stage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::StoringEndpointId => "STORING_ENDPOINT_ID",
            Self::ReadingCommissionerAdminFabricIndex => "READING_COMMISSIONER_ADMIN_FABRIC_INDEX",
            Self::PerformingVendorIdVerification => "PERFORMING_VENDOR_ID_VERIFICATION",
            Self::CrossCheckingAdministratorIds => "CROSS_CHECKING_ADMINISTRATOR_IDS",
            Self::Complete => "COMPLETE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StageChain for Stage {
    const IDLE: Self = Stage::Idle;
    const COMPLETE: Self = Stage::Complete;
    const ERROR: Self = Stage::Error;

    fn successor(self) -> Self {
        Stage::successor(self)
    }
}
