//! Local fabric table access.

use jointfab_types::{FabricId, FabricIndex, KeyLengthError, RootPublicKey, VendorId};

/// Snapshot of one entry of the local fabric table.
///
/// The root public key is kept as stored; [`FabricEntry::fetch_root_public_key`]
/// validates its length on every fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FabricEntry {
    fabric_index: FabricIndex,
    fabric_id: FabricId,
    vendor_id: VendorId,
    root_public_key: Vec<u8>,
}

impl FabricEntry {
    pub fn new(
        fabric_index: FabricIndex,
        fabric_id: FabricId,
        vendor_id: VendorId,
        root_public_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            fabric_index,
            fabric_id,
            vendor_id,
            root_public_key: root_public_key.into(),
        }
    }

    pub fn fabric_index(&self) -> FabricIndex {
        self.fabric_index
    }

    pub fn fabric_id(&self) -> FabricId {
        self.fabric_id
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    /// Returns the root public key, failing if the stored key does not have
    /// the fixed key length.
    pub fn fetch_root_public_key(&self) -> Result<RootPublicKey, KeyLengthError> {
        RootPublicKey::try_from(self.root_public_key.as_slice())
    }
}

/// Read access to the local fabric table.
pub trait FabricDirectory {
    fn find_by_index(&self, index: FabricIndex) -> Option<FabricEntry>;

    /// Exact lookup by root public key and fabric id.
    fn find_by_root_key_and_id(&self, key: &RootPublicKey, fabric_id: FabricId)
        -> Option<FabricEntry>;

    /// All entries, in table order.
    fn fabrics(&self) -> Vec<FabricEntry>;
}

/// Resolves a (root key, fabric id) pair to a local fabric.
///
/// Tries the directory's exact lookup first, then falls back to scanning
/// every entry and comparing fabric id and then key bytes. Entries whose
/// stored key is malformed are skipped.
pub fn resolve_fabric(
    directory: &dyn FabricDirectory,
    key: &RootPublicKey,
    fabric_id: FabricId,
) -> Option<FabricEntry> {
    if let Some(entry) = directory.find_by_root_key_and_id(key, fabric_id) {
        return Some(entry);
    }

    tracing::debug!(%fabric_id, "exact fabric lookup missed, scanning fabric table");
    directory.fabrics().into_iter().find(|entry| {
        if entry.fabric_id() != fabric_id {
            return false;
        }
        match entry.fetch_root_public_key() {
            Ok(candidate) => candidate.as_bytes() == key.as_bytes(),
            Err(error) => {
                tracing::warn!(
                    fabric_index = %entry.fabric_index(),
                    %error,
                    "skipping fabric with malformed root public key"
                );
                false
            }
        }
    })
}
