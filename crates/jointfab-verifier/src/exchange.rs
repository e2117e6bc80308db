//! The in-flight command exchange and the admin endpoint registry.

use jointfab_types::{EndpointId, FabricIndex, SecureSession};

/// The command exchange a verification was started from.
///
/// The verifier holds only a `Weak` reference to it and upgrades at every
/// use; the exchange may go away at any time (peer disconnect, transport
/// reset).
pub trait ExchangeContext {
    /// Secure session the command arrived on, if it is still usable.
    fn current_session(&self) -> Option<SecureSession>;

    /// Local fabric index the command arrived on.
    fn accessing_fabric_index(&self) -> FabricIndex;
}

/// Process-wide record of the peer's joint fabric administrator endpoint.
pub trait AdminEndpointRegistry {
    fn set_peer_admin_endpoint(&self, endpoint: EndpointId);
}
