//! Administrator information accumulated across verification stages.

use jointfab_types::{EndpointId, FabricId, FabricIndex, RootPublicKey, VendorId};

/// Errors raised when a write-once field is written a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InfoError {
    #[error("administrator field `{0}` is already set")]
    AlreadySet(&'static str),
}

/// Scratch record owned by one verifier for its whole lifetime.
///
/// Identity fields are write-once. Certificate buffers are replaced wholesale
/// on assignment; the linear stage order guarantees they are written by the
/// harvesting stage only.
#[derive(Debug, Clone)]
pub struct AdministratorInfo {
    admin_endpoint_id: EndpointId,
    admin_fabric_index: Option<FabricIndex>,
    local_admin_fabric_index: FabricIndex,
    admin_fabric_id: Option<FabricId>,
    admin_vendor_id: Option<VendorId>,
    root_public_key: Option<RootPublicKey>,
    admin_rcac: Vec<u8>,
    admin_noc: Vec<u8>,
    admin_icac: Vec<u8>,
}

impl AdministratorInfo {
    pub fn new(admin_endpoint_id: EndpointId) -> Self {
        Self {
            admin_endpoint_id,
            admin_fabric_index: None,
            local_admin_fabric_index: FabricIndex::UNDEFINED,
            admin_fabric_id: None,
            admin_vendor_id: None,
            root_public_key: None,
            admin_rcac: Vec::new(),
            admin_noc: Vec::new(),
            admin_icac: Vec::new(),
        }
    }

    pub fn admin_endpoint_id(&self) -> EndpointId {
        self.admin_endpoint_id
    }

    /// Fabric index as reported by the remote administrator.
    pub fn admin_fabric_index(&self) -> Option<FabricIndex> {
        self.admin_fabric_index
    }

    /// Index of the matching fabric in the local fabric table, or
    /// [`FabricIndex::UNDEFINED`] until resolved.
    pub fn local_admin_fabric_index(&self) -> FabricIndex {
        self.local_admin_fabric_index
    }

    pub fn admin_fabric_id(&self) -> Option<FabricId> {
        self.admin_fabric_id
    }

    pub fn admin_vendor_id(&self) -> Option<VendorId> {
        self.admin_vendor_id
    }

    pub fn root_public_key(&self) -> Option<&RootPublicKey> {
        self.root_public_key.as_ref()
    }

    pub fn admin_rcac(&self) -> &[u8] {
        &self.admin_rcac
    }

    pub fn admin_noc(&self) -> &[u8] {
        &self.admin_noc
    }

    /// Empty when the administrator has no intermediate certificate.
    pub fn admin_icac(&self) -> &[u8] {
        &self.admin_icac
    }

    pub(crate) fn set_admin_fabric_index(&mut self, index: FabricIndex) -> Result<(), InfoError> {
        set_once(&mut self.admin_fabric_index, index, "admin_fabric_index")
    }

    pub(crate) fn set_local_admin_fabric_index(
        &mut self,
        index: FabricIndex,
    ) -> Result<(), InfoError> {
        if self.local_admin_fabric_index != FabricIndex::UNDEFINED {
            return Err(InfoError::AlreadySet("local_admin_fabric_index"));
        }
        self.local_admin_fabric_index = index;
        Ok(())
    }

    pub(crate) fn set_admin_fabric_id(&mut self, fabric_id: FabricId) -> Result<(), InfoError> {
        set_once(&mut self.admin_fabric_id, fabric_id, "admin_fabric_id")
    }

    pub(crate) fn set_admin_vendor_id(&mut self, vendor_id: VendorId) -> Result<(), InfoError> {
        set_once(&mut self.admin_vendor_id, vendor_id, "admin_vendor_id")
    }

    pub(crate) fn set_root_public_key(&mut self, key: RootPublicKey) -> Result<(), InfoError> {
        set_once(&mut self.root_public_key, key, "root_public_key")
    }

    pub(crate) fn set_admin_rcac(&mut self, rcac: Vec<u8>) {
        self.admin_rcac = rcac;
    }

    pub(crate) fn set_admin_noc(&mut self, noc: Vec<u8>) {
        self.admin_noc = noc;
    }

    pub(crate) fn set_admin_icac(&mut self, icac: Vec<u8>) {
        self.admin_icac = icac;
    }
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<(), InfoError> {
    if slot.is_some() {
        return Err(InfoError::AlreadySet(field));
    }
    *slot = Some(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jointfab_types::ROOT_PUBLIC_KEY_LEN;

    #[test]
    fn new_record_is_empty() {
        let info = AdministratorInfo::new(EndpointId(5));
        assert_eq!(info.admin_endpoint_id(), EndpointId(5));
        assert_eq!(info.admin_fabric_index(), None);
        assert_eq!(info.local_admin_fabric_index(), FabricIndex::UNDEFINED);
        assert!(info.root_public_key().is_none());
        assert!(info.admin_rcac().is_empty());
        assert!(info.admin_noc().is_empty());
        assert!(info.admin_icac().is_empty());
    }

    #[test]
    fn identity_fields_are_write_once() {
        let mut info = AdministratorInfo::new(EndpointId(1));
        info.set_admin_fabric_index(FabricIndex(3)).unwrap();
        assert_eq!(
            info.set_admin_fabric_index(FabricIndex(4)),
            Err(InfoError::AlreadySet("admin_fabric_index"))
        );
        assert_eq!(info.admin_fabric_index(), Some(FabricIndex(3)));

        info.set_local_admin_fabric_index(FabricIndex(2)).unwrap();
        assert!(info.set_local_admin_fabric_index(FabricIndex(2)).is_err());

        let key = RootPublicKey::try_from([4u8; ROOT_PUBLIC_KEY_LEN].as_slice()).unwrap();
        info.set_root_public_key(key).unwrap();
        assert!(info.set_root_public_key(key).is_err());

        info.set_admin_fabric_id(FabricId(42)).unwrap();
        assert!(info.set_admin_fabric_id(FabricId(43)).is_err());
        assert_eq!(info.admin_fabric_id(), Some(FabricId(42)));
    }

    #[test]
    fn certificate_buffers_replace_on_assignment() {
        let mut info = AdministratorInfo::new(EndpointId(1));
        info.set_admin_noc(vec![1, 2, 3]);
        info.set_admin_noc(vec![9]);
        assert_eq!(info.admin_noc(), &[9]);
    }
}
