//! Remote attribute reads over an existing secure session.
//!
//! The [`AttributeReader`] collaborator issues one read and reports the
//! result through a one-shot continuation. [`start_read`] bridges that
//! continuation to a future: the continuation owns nothing but the sending
//! half of a oneshot channel, so a verifier dropped while a read is in
//! flight leaves nothing dangling.

use jointfab_types::{
    clusters, AttributeId, AttributePath, ClusterId, EndpointId, FabricId, FabricIndex, NodeId,
    SecureSession, VendorId,
};
use std::marker::PhantomData;
use tokio::sync::oneshot;

/// Errors reported by a remote attribute read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// The transport failed or the read timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// No usable secure session.
    #[error("secure session unavailable")]
    SessionUnavailable,

    /// The response, or one list entry of it, could not be decoded.
    #[error("failed to decode attribute data: {0}")]
    Decode(String),

    /// The peer answered with a value of a different attribute type.
    #[error("attribute {0} returned an unexpected value type")]
    UnexpectedType(AttributePath),

    /// The peer does not expose the attribute.
    #[error("attribute {0} is not supported by the peer")]
    Unsupported(AttributePath),

    /// The continuation was dropped without ever being invoked.
    #[error("read abandoned before completion")]
    Abandoned,
}

/// One entry of the remote `Fabrics` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricDescriptor {
    /// Raw root public key as sent by the peer; not yet length-checked.
    pub root_public_key: Vec<u8>,
    pub vendor_id: VendorId,
    pub fabric_id: FabricId,
    pub node_id: NodeId,
    pub label: String,
    pub fabric_index: FabricIndex,
}

/// One entry of the remote `NOCs` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NocEntry {
    pub noc: Vec<u8>,
    /// `None` when the chain has no intermediate certificate.
    pub icac: Option<Vec<u8>>,
    pub fabric_index: FabricIndex,
}

/// Decoded attribute payloads. List entries decode independently, so an
/// error can appear part-way through a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Nullable administrator fabric index.
    AdministratorFabricIndex(Option<FabricIndex>),
    Fabrics(Vec<Result<FabricDescriptor, ReadError>>),
    TrustedRootCertificates(Vec<Result<Vec<u8>, ReadError>>),
    Nocs(Vec<Result<NocEntry, ReadError>>),
}

/// Continuation invoked exactly once with the read result.
pub type ReadCallback = Box<dyn FnOnce(Result<AttributeValue, ReadError>)>;

/// Issues single-attribute reads over a secure session.
pub trait AttributeReader {
    /// Starts one read. `Ok(())` means the read is in flight and
    /// `on_complete` will be invoked exactly once; `Err` means nothing was
    /// started and `on_complete` is dropped.
    fn read_attribute(
        &self,
        session: &SecureSession,
        path: AttributePath,
        fabric_filtered: bool,
        on_complete: ReadCallback,
    ) -> Result<(), ReadError>;
}

/// Typed view of one readable attribute.
pub trait RemoteAttribute {
    const NAME: &'static str;
    const CLUSTER: ClusterId;
    const ATTRIBUTE: AttributeId;
    type Value;

    fn path(endpoint: EndpointId) -> AttributePath {
        AttributePath::new(endpoint, Self::CLUSTER, Self::ATTRIBUTE)
    }

    /// Returns `None` if `value` belongs to a different attribute.
    fn extract(value: AttributeValue) -> Option<Self::Value>;
}

/// Marker types for the attributes the verifier reads.
pub mod attributes {
    use super::*;

    pub struct AdministratorFabricIndex;
    pub struct Fabrics;
    pub struct TrustedRootCertificates;
    pub struct Nocs;

    impl RemoteAttribute for AdministratorFabricIndex {
        const NAME: &'static str = "AdministratorFabricIndex";
        const CLUSTER: ClusterId = clusters::joint_fabric_administrator::ID;
        const ATTRIBUTE: AttributeId =
            clusters::joint_fabric_administrator::ADMINISTRATOR_FABRIC_INDEX;
        type Value = Option<FabricIndex>;

        fn extract(value: AttributeValue) -> Option<Self::Value> {
            match value {
                AttributeValue::AdministratorFabricIndex(index) => Some(index),
                _ => None,
            }
        }
    }

    impl RemoteAttribute for Fabrics {
        const NAME: &'static str = "Fabrics";
        const CLUSTER: ClusterId = clusters::operational_credentials::ID;
        const ATTRIBUTE: AttributeId = clusters::operational_credentials::FABRICS;
        type Value = Vec<Result<FabricDescriptor, ReadError>>;

        fn extract(value: AttributeValue) -> Option<Self::Value> {
            match value {
                AttributeValue::Fabrics(list) => Some(list),
                _ => None,
            }
        }
    }

    impl RemoteAttribute for TrustedRootCertificates {
        const NAME: &'static str = "TrustedRootCertificates";
        const CLUSTER: ClusterId = clusters::operational_credentials::ID;
        const ATTRIBUTE: AttributeId = clusters::operational_credentials::TRUSTED_ROOT_CERTIFICATES;
        type Value = Vec<Result<Vec<u8>, ReadError>>;

        fn extract(value: AttributeValue) -> Option<Self::Value> {
            match value {
                AttributeValue::TrustedRootCertificates(list) => Some(list),
                _ => None,
            }
        }
    }

    impl RemoteAttribute for Nocs {
        const NAME: &'static str = "NOCs";
        const CLUSTER: ClusterId = clusters::operational_credentials::ID;
        const ATTRIBUTE: AttributeId = clusters::operational_credentials::NOCS;
        type Value = Vec<Result<NocEntry, ReadError>>;

        fn extract(value: AttributeValue) -> Option<Self::Value> {
            match value {
                AttributeValue::Nocs(list) => Some(list),
                _ => None,
            }
        }
    }
}

/// A read that has been issued and not yet answered.
#[must_use = "a pending read does nothing unless awaited"]
pub struct PendingRead<A: RemoteAttribute> {
    path: AttributePath,
    rx: oneshot::Receiver<Result<AttributeValue, ReadError>>,
    _attribute: PhantomData<A>,
}

impl<A: RemoteAttribute> PendingRead<A> {
    pub fn path(&self) -> AttributePath {
        self.path
    }

    /// Waits for the continuation and converts the value to `A::Value`.
    pub async fn response(self) -> Result<A::Value, ReadError> {
        let value = self.rx.await.map_err(|_| ReadError::Abandoned)??;
        A::extract(value).ok_or(ReadError::UnexpectedType(self.path))
    }
}

/// Issues a typed read of `A` on `endpoint`.
pub fn start_read<A: RemoteAttribute>(
    reader: &dyn AttributeReader,
    session: &SecureSession,
    endpoint: EndpointId,
    fabric_filtered: bool,
) -> Result<PendingRead<A>, ReadError> {
    let path = A::path(endpoint);
    let (tx, rx) = oneshot::channel();

    tracing::debug!(
        attribute = A::NAME,
        %path,
        fabric_filtered,
        session_id = session.session_id,
        "issuing remote attribute read"
    );
    reader.read_attribute(
        session,
        path,
        fabric_filtered,
        Box::new(move |result| {
            // The receiver is gone only if the verifier was dropped.
            let _ = tx.send(result);
        }),
    )?;

    Ok(PendingRead {
        path,
        rx,
        _attribute: PhantomData,
    })
}
