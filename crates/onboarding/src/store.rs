//! The vendor persistence seam.
//!
//! The wizard never talks to a transport directly; it goes through
//! [`VendorStore`].  `vendor-client` implements it over HTTP and
//! `vendor-registry` implements it in-process.

use async_trait::async_trait;

use crate::draft::VendorDraft;
use crate::listing::VendorFilter;
use crate::record::{VendorListing, VendorRecord};

pub const VENDOR_ID_PREFIX: &str = "VENDOR";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store understood the request and declined it (constraint
    /// violation, validation on the server, ...).  The message is meant for
    /// the user as-is.
    #[error("{0}")]
    Rejected(String),
    #[error("vendor {0} not found")]
    NotFound(String),
    /// The request never produced an application-level answer.
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait VendorStore: Send + Sync {
    async fn list(&self) -> Result<VendorListing, StoreError>;
    async fn get(&self, vendor_id: &str) -> Result<VendorRecord, StoreError>;
    async fn create(&self, draft: &VendorDraft) -> Result<VendorRecord, StoreError>;
    async fn update(&self, vendor_id: &str, draft: &VendorDraft)
    -> Result<VendorRecord, StoreError>;
    async fn delete(&self, vendor_id: &str) -> Result<(), StoreError>;
    /// Identifier the next `create` will assign.  Does not reserve it.
    async fn next_identifier(&self) -> Result<String, StoreError>;
    async fn export_csv(&self, filter: &VendorFilter) -> Result<Vec<u8>, StoreError>;
}

pub fn format_vendor_id(sequence: u64) -> String {
    format!("{VENDOR_ID_PREFIX}{sequence:03}")
}

/// Numeric tail of a `VENDOR###` identifier.
pub fn vendor_sequence(vendor_id: &str) -> Option<u64> {
    let digits = vendor_id.trim().strip_prefix(VENDOR_ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_ids_are_zero_padded() {
        assert_eq!(format_vendor_id(1), "VENDOR001");
        assert_eq!(format_vendor_id(42), "VENDOR042");
        assert_eq!(format_vendor_id(1234), "VENDOR1234");
    }

    #[test]
    fn vendor_sequence_parses_tail() {
        assert_eq!(vendor_sequence("VENDOR001"), Some(1));
        assert_eq!(vendor_sequence("VENDOR1234"), Some(1234));
        assert_eq!(vendor_sequence("VENDOR"), None);
        assert_eq!(vendor_sequence("VENDOR-12"), None);
        assert_eq!(vendor_sequence("SUPPLIER001"), None);
    }
}
