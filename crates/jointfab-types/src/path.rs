//! Attribute addressing for remote reads.

use crate::EndpointId;
use std::fmt;

/// Cluster identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterId(pub u32);

/// Attribute identifier within a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeId(pub u32);

/// Concrete path of one attribute on one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributePath {
    pub endpoint: EndpointId,
    pub cluster: ClusterId,
    pub attribute: AttributeId,
}

impl AttributePath {
    pub fn new(endpoint: EndpointId, cluster: ClusterId, attribute: AttributeId) -> Self {
        Self {
            endpoint,
            cluster,
            attribute,
        }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/0x{:04X}/0x{:04X}",
            self.endpoint, self.cluster.0, self.attribute.0
        )
    }
}

/// Cluster and attribute ids of the attributes the verifier reads.
pub mod clusters {
    /// Joint fabric administrator cluster, hosted on the administrator endpoint.
    pub mod joint_fabric_administrator {
        use crate::{AttributeId, ClusterId};

        pub const ID: ClusterId = ClusterId(0x0753);
        pub const ADMINISTRATOR_FABRIC_INDEX: AttributeId = AttributeId(0x0000);
    }

    /// Operational credentials cluster, hosted on the root endpoint.
    pub mod operational_credentials {
        use crate::{AttributeId, ClusterId};

        pub const ID: ClusterId = ClusterId(0x003E);
        pub const NOCS: AttributeId = AttributeId(0x0000);
        pub const FABRICS: AttributeId = AttributeId(0x0001);
        pub const TRUSTED_ROOT_CERTIFICATES: AttributeId = AttributeId(0x0004);
    }
}
