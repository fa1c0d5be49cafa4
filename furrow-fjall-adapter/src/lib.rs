//! Persistent version store for furrow, backed by the fjall LSM-tree engine.
//!
//! ```rust,ignore
//! use furrow::migrator::Migrator;
//! use furrow_fjall_adapter::FjallVersionStore;
//!
//! let store = FjallVersionStore::with_config()
//!     .db_path("/var/lib/app/migrations")
//!     .build();
//!
//! let migrator = Migrator::builder().version_store(store).build();
//! migrator.migrate(&steps)?;
//! ```

mod builder;
mod config;
mod store;
mod wrapper;

pub use builder::*;
pub use config::*;
pub use store::*;
pub use wrapper::{decode_version, encode_version, VersionKeyError, VersionKeyResult, VERSION_KEY_LEN};
