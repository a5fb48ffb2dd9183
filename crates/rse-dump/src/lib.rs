//! # rse-dump
//!
//! Feed transport for the RSE catalog synchronizer.
//!
//! - [`DumpCache`] mirrors the systems dump to a local file, re-downloading
//!   once the copy is older than its TTL.
//! - [`load_dump`] parses the cached dump, JSON array or JSON lines.
//! - [`fetch_beacon_names`] reads the navigation beacon CSV.

pub mod beacons;
pub mod cache;
mod error;
pub mod http;
pub mod loader;

pub use beacons::{BeaconLayout, fetch_beacon_names, parse_beacon_csv};
pub use cache::{DumpCache, FetchOutcome};
pub use error::DumpError;
pub use loader::{load_dump, parse_dump, read_dump};
