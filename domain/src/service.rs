use crate::entity::StorageUsage;

pub struct QuotaGate;

impl QuotaGate {
    pub fn is_allowed(used_units: u64, quota_units: u64) -> bool {
        used_units < quota_units
    }

    pub fn allows(usage: &StorageUsage) -> bool {
        Self::is_allowed(usage.used_units, usage.quota_units)
    }
}
