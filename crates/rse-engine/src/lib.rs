//! # rse-engine
//!
//! The synchronization engine for the RSE catalog.
//!
//! - [`filter`]: exclusion lists and admission of dump records
//! - [`resolver`]: the resolver boundary and the known-systems table
//! - [`pipeline`]: bounded-concurrency resolution into a lazy stream
//! - [`writer`]: the single batch-committing writer task
//! - [`reconcile`]: delta planning against the catalog's active rows
//! - [`sync`]: full-build, incremental and beacon runs

pub mod error;
pub mod filter;
pub mod pipeline;
pub mod reconcile;
pub mod resolver;
pub mod sync;
pub mod writer;

pub use error::{EngineError, ResolveError};
pub use filter::{Admission, ExclusionList, ExclusionMatcher, FilterEngine, FilterOutcome};
pub use pipeline::{PipelineSettings, ResolutionPipeline, ResolvedStream};
pub use reconcile::{ActiveSet, DeltaPlan};
pub use resolver::{IdentityLookup, ProceduralNames, Resolver, TableResolver};
pub use sync::{SyncOutcome, SyncSettings, Synchronizer};
pub use writer::{BatchSender, BatchWriter, CommitHook, WriteBatch, WriteStats, WriterHandle, WriterSettings};
