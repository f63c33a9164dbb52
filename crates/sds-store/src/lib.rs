//! SDS Store - Sequential Data Store Engine
//!
//! The store backend contract a client talks to, and an in-process engine
//! implementing it. Streams hold typed events indexed by a timestamp key;
//! reads come back as sparse or default-filled windows and as per-interval
//! summaries.
//!
//! Key Features:
//! - Create-or-get types and create-or-update streams
//! - All-or-nothing batch ingestion with last-write-wins keys
//! - Sparse and filled window reads, single and bulk
//! - Interval summaries that keep empty intervals distinct from zeros
//! - Role trustee access control and community discovery
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

pub mod backend;
pub mod engine;
pub mod registry;
pub mod series;
pub mod summary;
pub mod window;

pub use backend::{StoreBackend, StoreStats};
pub use engine::MemoryStore;
pub use registry::{Namespace, StreamEntry};
pub use series::Series;
pub use summary::{AggregateFunction, SummaryAccumulator};
pub use window::zero_filled;
