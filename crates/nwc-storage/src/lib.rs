//! NWC Storage - key-value persistence.
//!
//! The authorization engine treats durable storage as an external
//! collaborator reached through the [`KvStore`] trait: byte values grouped
//! under string namespaces.
//!
//! Two backends ship with the crate:
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`MemoryKvStore`] | tests, ephemeral deployments |
//! | [`FileKvStore`] | single-node deployments; one file per key, atomic replace |
//!
//! # Example
//!
//! ```
//! use nwc_storage::{KvStore, MemoryKvStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> nwc_storage::StorageResult<()> {
//! let store = MemoryKvStore::new();
//! store.set("nwc:config", "relay", b"nostrclient".to_vec()).await?;
//! assert_eq!(store.get("nwc:config", "relay").await?, Some(b"nostrclient".to_vec()));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::arithmetic_side_effects))]

pub mod error;
pub mod file;
pub mod kv;

pub use error::{StorageError, StorageResult};
pub use file::FileKvStore;
pub use kv::{KvStore, MemoryKvStore};
