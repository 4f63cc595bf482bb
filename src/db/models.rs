use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::serial::SerialRange;

/// One completed allocation batch, immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Auto-incrementing identifier, assigned by the store
    pub id: u64,
    /// ISO-8601 creation instant, local clock
    pub timestamp: String,
    pub part_name: String,
    pub vendor_name: String,
    /// Opaque year label; never parsed as a number
    pub year: String,
    pub location: String,
    pub quantity: u32,
    /// Inclusive zero-padded range, e.g. "0001-0005"
    pub serial_range: String,
}

/// Input for a session append; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub part_name: String,
    pub vendor_name: String,
    pub year: String,
    pub location: String,
    pub quantity: u32,
    pub serial_range: String,
}

/// Result of an atomic batch allocation.
#[derive(Debug, Clone)]
pub struct BatchAllocation {
    pub session_id: u64,
    pub range: SerialRange,
    /// Year counter value after this allocation
    pub year_count: u64,
}

/// Composite history read: not atomic across the three queries, which
/// is acceptable under the single-writer deployment model.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    pub total_count: u64,
    pub year_counts: BTreeMap<String, u64>,
    pub sessions: Vec<SessionRecord>,
}
