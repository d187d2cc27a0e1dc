//! # kccp_cache
//!
//! Reconciliation engine for the caching proxy.
//!
//! The proxy keeps every cached file under a cache root and records its
//! metadata in a manifest (`cached.json`). This crate keeps the two
//! consistent and moves cache state between machines:
//!
//! - [`verify_cache`]: compare on-disk sizes against the manifest
//! - [`merge_cache`]: import a bundle (zip with manifest + content)
//! - [`create_diff`]: export what changed since a baseline as a bundle
//! - [`clear_invalidated`]: delete files flagged as untrustworthy
//!
//! ## Example
//!
//! ```rust,ignore
//! use kccp_cache::{CacheConfig, ManifestStore, merge_cache};
//!
//! let config = CacheConfig::from_file("kccp.json")?;
//! let mut store = ManifestStore::open(config.cache_location())?;
//!
//! let report = merge_cache(&mut store, "backup.zip").await?;
//! println!("{report}");
//! ```

pub mod archive;
mod config;
mod diff;
mod entry;
mod error;
pub mod manifest;
mod merge;
pub mod progress;
mod resolution;
mod store;
mod sweep;
mod verify;

pub use archive::{BundleReader, BundleWriter, LocatedManifest};
pub use config::CacheConfig;
pub use diff::{DiffReport, create_diff, is_bundle, load_baseline};
pub use entry::{CacheEntry, LastModified, Version};
pub use error::CacheError;
pub use manifest::{CacheManifest, MANIFEST_FILE};
pub use merge::{MergeReport, merge_cache};
pub use resolution::Resolution;
pub use store::ManifestStore;
pub use sweep::{SweepReport, clear_invalidated};
pub use verify::{VERIFY_CONCURRENCY, VerifyOutcome, VerifyReport, check_file, verify_cache};
