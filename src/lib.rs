//! QR Label Server - sequential serial numbers for inventory labels
//!
//! Allocates per-year serial number blocks, renders each serial into a
//! scannable QR label, and keeps a durable append-only log of every
//! allocation batch.
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/      # configuration, state, errors, HTTP server
//! ├── db/        # redb storage: session log + year counters + migration
//! ├── serial/    # serial number formatting and range allocation
//! ├── labels/    # QR label rendering (text, filename, PNG)
//! ├── api/       # HTTP routes and handlers
//! └── utils/     # logging
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod labels;
pub mod serial;
pub mod utils;

pub use crate::core::{Config, Server, ServerError, ServerState};
pub use crate::db::{LabelStore, SessionRecord, StorageError};
pub use crate::serial::{SerialAllocator, SerialRange};

/// Load `.env` before anything reads the environment.
pub fn setup_environment() {
    let _ = dotenv::dotenv();
}
