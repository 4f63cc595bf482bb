//! Storage layer: durable session log and per-year serial counters.

pub mod migrate;
pub mod models;
pub mod storage;

pub use models::{BatchAllocation, HistorySnapshot, NewSession, SessionRecord};
pub use storage::{LabelStore, StorageError, StorageResult};
