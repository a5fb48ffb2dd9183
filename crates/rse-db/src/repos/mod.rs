//! Repository modules for catalog persistence.
//!
//! Each module adds methods to `CatalogDb` via `impl CatalogDb` blocks.

pub mod duplicates;
pub mod status;
pub mod systems;
