//! SDS Sample - Time Series Stream Lifecycle
//!
//! End-to-end walk through a sequential data store: define types, create
//! streams, write tank readings, read them back as sparse and filled
//! windows, bulk windows and summaries, optionally share a stream with a
//! community, then remove everything the run created.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

pub mod data;
pub mod lifecycle;
pub mod session;

pub use lifecycle::{
    Coordinator, Phase, QueryResults, RunMode, RunReport, SharingResults, TeardownPlan,
    TeardownReport,
};
pub use session::{connect, coordinator};
