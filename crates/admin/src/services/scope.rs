//! Per-identity visibility over the record snapshot.

use pkl_monitor_core::{Identity, VendorRecord};

/// Records `identity` may see, in snapshot order.
///
/// The elevated identity sees everything. A scoped identity sees only
/// records of its bound district; a district with no records yields an
/// empty list.
#[must_use]
pub fn scope<'a>(records: &'a [VendorRecord], identity: &Identity) -> Vec<&'a VendorRecord> {
    match identity {
        Identity::Elevated { .. } => records.iter().collect(),
        Identity::Scoped { .. } => records.iter().filter(|r| identity.can_see(r)).collect(),
    }
}
