//! Pico Storage - the filesystem area shared by the host app and the tunnel extension.
//!
//! Both processes resolve the same group-scoped root and find the engine
//! logs, the geo rule datasets and the active engine config at fixed
//! subpaths below it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use pico_storage::{GroupContainer, SharedStorage};
//!
//! fn main() -> pico_storage::Result<()> {
//!     let storage = SharedStorage::open(&GroupContainer::new("group.me.lsong.picovpn"))?;
//!     let report = storage.ensure_ready()?;
//!     if !report.is_complete() {
//!         eprintln!("running degraded: {:?}", report.degraded);
//!     }
//!
//!     storage.write_config(br#"{"outbounds":[]}"#)?;
//!     println!("config at {}", storage.config_path().display());
//!     Ok(())
//! }
//! ```

pub mod atomic;
pub mod error;
pub mod paths;
pub mod storage;

// Re-export main types at crate root
pub use atomic::atomic_write;
pub use error::{Result, StorageError};
pub use paths::{FixedRoot, GroupContainer, RootResolver, SharedPaths};
pub use storage::{DegradedFeature, SharedStorage, StorageReport};
