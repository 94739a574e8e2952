//! Quota Adapter - 配额闸门实现

mod in_memory_quota_gate;

pub use in_memory_quota_gate::{AllowAllQuotaGate, InMemoryQuotaGate};
