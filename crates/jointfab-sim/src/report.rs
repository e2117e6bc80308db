//! JSON report printed by the simulator.

use jointfab_types::{
    EndpointId, FabricId, FabricIndex, Outcome, RootPublicKey, VendorId,
};
use jointfab_verifier::{AdministratorInfo, TrustReport};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Report {
    /// Outcome name, `SUCCESS` when the administrator is trusted.
    pub result: &'static str,
    pub administrator: AdministratorReport,
}

/// What the verification learned about the administrator, certificates hex
/// encoded. Empty strings mean the buffer was never filled.
#[derive(Debug, Serialize)]
pub struct AdministratorReport {
    pub endpoint_id: EndpointId,
    pub admin_fabric_index: Option<FabricIndex>,
    pub local_admin_fabric_index: FabricIndex,
    pub fabric_id: Option<FabricId>,
    pub vendor_id: Option<VendorId>,
    pub root_public_key: Option<RootPublicKey>,
    pub rcac: String,
    pub noc: String,
    pub icac: String,
}

impl Report {
    pub fn succeeded(&self) -> bool {
        self.result == Outcome::Success.as_str()
    }
}

impl From<&AdministratorInfo> for AdministratorReport {
    fn from(info: &AdministratorInfo) -> Self {
        Self {
            endpoint_id: info.admin_endpoint_id(),
            admin_fabric_index: info.admin_fabric_index(),
            local_admin_fabric_index: info.local_admin_fabric_index(),
            fabric_id: info.admin_fabric_id(),
            vendor_id: info.admin_vendor_id(),
            root_public_key: info.root_public_key().copied(),
            rcac: hex::encode(info.admin_rcac()),
            noc: hex::encode(info.admin_noc()),
            icac: hex::encode(info.admin_icac()),
        }
    }
}

impl From<&TrustReport> for Report {
    fn from(report: &TrustReport) -> Self {
        let outcome = match report.result {
            Ok(()) => Outcome::Success,
            Err(error) => error.outcome(),
        };
        Self {
            result: outcome.as_str(),
            administrator: AdministratorReport::from(&report.info),
        }
    }
}
