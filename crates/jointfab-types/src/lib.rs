//! Shared types, error definitions, and constants for joint-fabric
//! administrator trust verification.
//!
//! This crate provides the identifiers exchanged between the verifier and
//! its collaborators (fabric indices, fabric/vendor/node ids, endpoint ids),
//! the fixed-size root public key, the secure session handle, attribute
//! paths, and the `Outcome`/`TrustError` taxonomy.
//!
//! No crate in the workspace depends on anything *except* `jointfab-types`
//! for cross-cutting type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

mod key;
mod outcome;
mod path;

pub use key::{KeyLengthError, RootPublicKey, ROOT_PUBLIC_KEY_LEN};
pub use outcome::{Outcome, TrustError};
pub use path::{clusters, AttributeId, AttributePath, ClusterId};

/// Index of a fabric inside one node's fabric table.
///
/// Indices are local to the node that assigned them: the same administrative
/// domain usually has different indices on different nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FabricIndex(pub u8);

impl FabricIndex {
    /// Marker for "no fabric resolved yet".
    pub const UNDEFINED: FabricIndex = FabricIndex(0);
    /// Smallest assignable index.
    pub const MIN: FabricIndex = FabricIndex(1);
    /// Largest assignable index. `255` is reserved.
    pub const MAX: FabricIndex = FabricIndex(254);

    /// Returns `true` if the index lies within the assignable range.
    pub fn is_valid(self) -> bool {
        self >= Self::MIN && self <= Self::MAX
    }
}

impl fmt::Display for FabricIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 64-bit identifier of an administrative domain, shared by every node in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FabricId(pub u64);

impl fmt::Display for FabricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

/// Vendor identifier claimed by a fabric's administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(pub u16);

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

/// Operational node identifier within a fabric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

/// Endpoint number on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(pub u16);

impl EndpointId {
    /// The root endpoint, which hosts the operational credentials cluster.
    pub const ROOT: EndpointId = EndpointId(0);
    /// Sentinel for "no endpoint".
    pub const INVALID: EndpointId = EndpointId(0xFFFF);

    /// Returns `true` unless this is [`EndpointId::INVALID`].
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to an established secure session with a peer.
///
/// The handle is a value: holding one does not keep the session alive, and
/// the transport rejects reads issued on a session that has since closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SecureSession {
    /// Local session identifier.
    pub session_id: u16,
    /// Operational node id of the peer.
    pub peer_node_id: NodeId,
    /// Fabric the session was established on.
    pub fabric_index: FabricIndex,
}
