//! SDS Backend - Store Backend Abstraction
//!
//! Defines the capability set a sequential data store exposes to clients:
//! type and stream provisioning, event ingestion, window and summary reads,
//! access control and community discovery. The client treats any backend as
//! an opaque implementation of this trait.
//!
//! Key Features:
//! - Async operations for non-blocking transports
//! - Idempotent create-or-get / create-or-update provisioning
//! - Sparse and default-filled window reads, single and bulk
//! - Incremental access control patches
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sds_common::{
    AccessControlList, AclPatch, Event, Result, Role, Stream, StreamReference, SummaryInterval,
    TypeDefinition, WindowMode,
};
use std::collections::BTreeMap;

// =============================================================================
// Store Backend Trait
// =============================================================================

/// Pluggable sequential data store interface.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    /// Return the type registered under the definition's name, registering
    /// the definition if none exists.
    async fn get_or_create_type(
        &self,
        namespace: &str,
        definition: &TypeDefinition,
    ) -> Result<TypeDefinition>;

    /// Get a registered type.
    async fn get_type(&self, namespace: &str, name: &str) -> Result<TypeDefinition>;

    /// Delete a type no stream references.
    async fn delete_type(&self, namespace: &str, name: &str) -> Result<()>;

    // -------------------------------------------------------------------------
    // Streams
    // -------------------------------------------------------------------------

    /// Create a stream, or update the description and type of an existing one.
    async fn create_or_update_stream(&self, namespace: &str, stream: &Stream) -> Result<Stream>;

    /// Get a stream.
    async fn get_stream(&self, namespace: &str, id: &str) -> Result<Stream>;

    /// Delete a stream together with its events and access control list.
    async fn delete_stream(&self, namespace: &str, id: &str) -> Result<()>;

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    /// Insert or overwrite events by key. Returns the number of events
    /// accepted.
    async fn insert_values(&self, namespace: &str, stream_id: &str, events: &[Event])
        -> Result<usize>;

    /// Read the events of one stream within `[start, end]`.
    async fn get_window_values(
        &self,
        namespace: &str,
        stream_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mode: WindowMode,
    ) -> Result<Vec<Event>>;

    /// Read several streams over the same window in one call.
    async fn get_streams_window(
        &self,
        namespace: &str,
        stream_ids: &[String],
        mode: WindowMode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BTreeMap<String, Vec<Event>>>;

    /// Resolve a stream self link to its most recent event.
    async fn get_last_value_url(&self, self_link: &str) -> Result<Option<Event>>;

    /// Aggregate numeric properties over `interval_count` equal sub-intervals.
    async fn get_summaries(
        &self,
        namespace: &str,
        stream_id: &str,
        properties: Option<&[String]>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_count: usize,
    ) -> Result<Vec<SummaryInterval>>;

    // -------------------------------------------------------------------------
    // Access Control
    // -------------------------------------------------------------------------

    /// Apply an incremental patch to a stream's role trustee list.
    async fn patch_access_control(
        &self,
        namespace: &str,
        stream_id: &str,
        patch: &AclPatch,
    ) -> Result<()>;

    /// Get a stream's access control list.
    async fn get_access_control(&self, namespace: &str, stream_id: &str)
        -> Result<AccessControlList>;

    // -------------------------------------------------------------------------
    // Roles and Communities
    // -------------------------------------------------------------------------

    /// List the tenant's roles.
    async fn get_roles(&self) -> Result<Vec<Role>>;

    /// Find streams shared with a community whose identifier contains `query`.
    async fn get_community_streams(
        &self,
        community_id: &str,
        query: &str,
    ) -> Result<Vec<StreamReference>>;
}

// =============================================================================
// Store Statistics
// =============================================================================

/// Counters of store operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub types_created: u64,
    pub types_deleted: u64,
    pub streams_created: u64,
    pub streams_updated: u64,
    pub streams_deleted: u64,
    pub events_written: u64,
    pub queries_executed: u64,
}
