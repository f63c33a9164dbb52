//! SDS Engine - In-Process Sequential Data Store
//!
//! `MemoryStore` implements the store backend contract in memory. Namespaces
//! are created implicitly by the first provisioning call that names them;
//! reads against an unknown namespace fail with `NotFound`.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::backend::{StoreBackend, StoreStats};
use crate::registry::{Namespace, StreamOutcome, TypeOutcome};
use crate::summary::summarize;
use crate::window::{check_range, window_values};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sds_common::{
    AccessControlList, AclPatch, Community, Event, Result, Role, SdsError, Stream,
    StreamReference, SummaryInterval, TypeDefinition, WindowMode, COMMUNITY_MEMBER_ROLE_TYPE_ID,
};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

/// Base URL of self links when none is configured.
pub const DEFAULT_BASE_URL: &str = "memory://sds";

// =============================================================================
// Memory Store
// =============================================================================

/// In-memory store backend.
pub struct MemoryStore {
    base_url: String,
    latency: Option<Duration>,
    namespaces: RwLock<HashMap<String, Namespace>>,
    roles: RwLock<Vec<Role>>,
    communities: RwLock<HashMap<String, Community>>,
    stats: RwLock<StoreStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            latency: None,
            namespaces: RwLock::new(HashMap::new()),
            roles: RwLock::new(Vec::new()),
            communities: RwLock::new(HashMap::new()),
            stats: RwLock::new(StoreStats::default()),
        }
    }

    /// Root stream self links at `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Delay every call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seed a community together with its member role.
    pub fn with_community(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        self.add_community(Community {
            id: id.clone(),
            name: name.into(),
        });
        self.add_role(Role::community_member(format!("{}-member", id), id));
        self
    }

    pub fn add_role(&self, role: Role) {
        let mut roles = self.roles.write();
        roles.retain(|r| r.id != role.id);
        roles.push(role);
    }

    pub fn add_community(&self, community: Community) {
        self.communities
            .write()
            .insert(community.id.clone(), community);
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Snapshot of the operation counters.
    pub fn stats(&self) -> StoreStats {
        self.stats.read().clone()
    }

    /// Self link of a stream.
    pub fn self_link(&self, namespace: &str, stream_id: &str) -> String {
        format!(
            "{}/Namespaces/{}/Streams/{}",
            self.base_url, namespace, stream_id
        )
    }

    /// Split a self link into namespace and stream identifiers.
    fn parse_self_link<'a>(&self, self_link: &'a str) -> Result<(&'a str, &'a str)> {
        let malformed = || SdsError::InvalidArgument(format!("malformed self link {}", self_link));

        let path = self_link
            .strip_prefix(self.base_url.as_str())
            .and_then(|rest| rest.strip_prefix("/Namespaces/"))
            .ok_or_else(malformed)?;

        let mut segments = path.split('/');
        match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(ns), Some("Streams"), Some(id), None) if !ns.is_empty() && !id.is_empty() => {
                Ok((ns, id))
            }
            _ => Err(malformed()),
        }
    }

    // -------------------------------------------------------------------------
    // Namespace Access
    // -------------------------------------------------------------------------

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn read_namespace<T>(
        &self,
        namespace: &str,
        f: impl FnOnce(&Namespace) -> Result<T>,
    ) -> Result<T> {
        let namespaces = self.namespaces.read();
        let ns = namespaces
            .get(namespace)
            .ok_or_else(|| SdsError::NotFound(format!("namespace {}", namespace)))?;
        f(ns)
    }

    fn write_namespace<T>(
        &self,
        namespace: &str,
        f: impl FnOnce(&mut Namespace) -> Result<T>,
    ) -> Result<T> {
        let mut namespaces = self.namespaces.write();
        let ns = namespaces
            .get_mut(namespace)
            .ok_or_else(|| SdsError::NotFound(format!("namespace {}", namespace)))?;
        f(ns)
    }

    fn provision_namespace<T>(
        &self,
        namespace: &str,
        f: impl FnOnce(&mut Namespace) -> Result<T>,
    ) -> Result<T> {
        sds_common::types::validate_identifier("namespace", namespace)?;
        let mut namespaces = self.namespaces.write();
        f(namespaces.entry(namespace.to_string()).or_default())
    }

    fn record_query(&self) {
        self.stats.write().queries_executed += 1;
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Store Backend Implementation
// =============================================================================

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn get_or_create_type(
        &self,
        namespace: &str,
        definition: &TypeDefinition,
    ) -> Result<TypeDefinition> {
        self.simulate_latency().await;
        let (registered, outcome) =
            self.provision_namespace(namespace, |ns| ns.get_or_create_type(definition))?;

        if outcome == TypeOutcome::Created {
            self.stats.write().types_created += 1;
        }
        debug!(namespace, type_id = %registered.name, ?outcome, "type provisioned");
        Ok(registered)
    }

    async fn get_type(&self, namespace: &str, name: &str) -> Result<TypeDefinition> {
        self.simulate_latency().await;
        self.read_namespace(namespace, |ns| ns.get_type(name).cloned())
    }

    async fn delete_type(&self, namespace: &str, name: &str) -> Result<()> {
        self.simulate_latency().await;
        self.write_namespace(namespace, |ns| ns.delete_type(name))?;
        self.stats.write().types_deleted += 1;
        debug!(namespace, type_id = name, "type deleted");
        Ok(())
    }

    async fn create_or_update_stream(&self, namespace: &str, stream: &Stream) -> Result<Stream> {
        self.simulate_latency().await;
        let (stored, outcome) =
            self.provision_namespace(namespace, |ns| ns.create_or_update_stream(stream))?;

        {
            let mut stats = self.stats.write();
            match outcome {
                StreamOutcome::Created => stats.streams_created += 1,
                StreamOutcome::Updated => stats.streams_updated += 1,
                StreamOutcome::Unchanged => {}
            }
        }
        debug!(namespace, stream_id = %stored.id, ?outcome, "stream provisioned");
        Ok(stored)
    }

    async fn get_stream(&self, namespace: &str, id: &str) -> Result<Stream> {
        self.simulate_latency().await;
        self.read_namespace(namespace, |ns| ns.stream(id).map(|e| e.stream.clone()))
    }

    async fn delete_stream(&self, namespace: &str, id: &str) -> Result<()> {
        self.simulate_latency().await;
        let removed = self.write_namespace(namespace, |ns| ns.delete_stream(id))?;
        self.stats.write().streams_deleted += 1;
        debug!(
            namespace,
            stream_id = id,
            events = removed.series.len(),
            "stream deleted"
        );
        Ok(())
    }

    async fn insert_values(
        &self,
        namespace: &str,
        stream_id: &str,
        events: &[Event],
    ) -> Result<usize> {
        self.simulate_latency().await;
        let inserted = self.write_namespace(namespace, |ns| ns.insert_values(stream_id, events))?;
        self.stats.write().events_written += inserted as u64;
        debug!(namespace, stream_id, inserted, "events inserted");
        Ok(inserted)
    }

    async fn get_window_values(
        &self,
        namespace: &str,
        stream_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mode: WindowMode,
    ) -> Result<Vec<Event>> {
        check_range(start, end)?;
        self.simulate_latency().await;
        let events = self.read_namespace(namespace, |ns| {
            let (entry, definition) = ns.stream_with_type(stream_id)?;
            window_values(&entry.series, definition, start, end, mode)
        })?;
        self.record_query();
        debug!(namespace, stream_id, ?mode, count = events.len(), "window read");
        Ok(events)
    }

    async fn get_streams_window(
        &self,
        namespace: &str,
        stream_ids: &[String],
        mode: WindowMode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BTreeMap<String, Vec<Event>>> {
        check_range(start, end)?;
        self.simulate_latency().await;
        let result = self.read_namespace(namespace, |ns| {
            stream_ids
                .iter()
                .map(|id| {
                    let (entry, definition) = ns.stream_with_type(id)?;
                    let events = window_values(&entry.series, definition, start, end, mode)?;
                    Ok((id.clone(), events))
                })
                .collect::<Result<BTreeMap<_, _>>>()
        })?;
        self.record_query();
        debug!(namespace, streams = result.len(), ?mode, "bulk window read");
        Ok(result)
    }

    async fn get_last_value_url(&self, self_link: &str) -> Result<Option<Event>> {
        let (namespace, stream_id) = self.parse_self_link(self_link)?;
        self.simulate_latency().await;
        let last = self.read_namespace(namespace, |ns| {
            Ok(ns.stream(stream_id)?.series.last().cloned())
        })?;
        self.record_query();
        debug!(namespace, stream_id, found = last.is_some(), "last value read");
        Ok(last)
    }

    async fn get_summaries(
        &self,
        namespace: &str,
        stream_id: &str,
        properties: Option<&[String]>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_count: usize,
    ) -> Result<Vec<SummaryInterval>> {
        check_range(start, end)?;
        self.simulate_latency().await;
        let intervals = self.read_namespace(namespace, |ns| {
            let (entry, definition) = ns.stream_with_type(stream_id)?;
            summarize(&entry.series, definition, properties, start, end, interval_count)
        })?;
        self.record_query();
        debug!(namespace, stream_id, intervals = intervals.len(), "summaries read");
        Ok(intervals)
    }

    async fn patch_access_control(
        &self,
        namespace: &str,
        stream_id: &str,
        patch: &AclPatch,
    ) -> Result<()> {
        self.simulate_latency().await;
        self.write_namespace(namespace, |ns| ns.stream_mut(stream_id)?.acl.apply(patch))?;
        debug!(namespace, stream_id, operations = patch.0.len(), "access control patched");
        Ok(())
    }

    async fn get_access_control(
        &self,
        namespace: &str,
        stream_id: &str,
    ) -> Result<AccessControlList> {
        self.simulate_latency().await;
        self.read_namespace(namespace, |ns| Ok(ns.stream(stream_id)?.acl.clone()))
    }

    async fn get_roles(&self) -> Result<Vec<Role>> {
        self.simulate_latency().await;
        Ok(self.roles.read().clone())
    }

    async fn get_community_streams(
        &self,
        community_id: &str,
        query: &str,
    ) -> Result<Vec<StreamReference>> {
        self.simulate_latency().await;
        if !self.communities.read().contains_key(community_id) {
            return Err(SdsError::NotFound(format!("community {}", community_id)));
        }

        let member_roles: Vec<String> = self
            .roles
            .read()
            .iter()
            .filter(|r| {
                r.role_type_id == COMMUNITY_MEMBER_ROLE_TYPE_ID
                    && r.community_id.as_deref() == Some(community_id)
            })
            .map(|r| r.id.clone())
            .collect();
        let query = query.to_lowercase();

        let namespaces = self.namespaces.read();
        let mut found: Vec<StreamReference> = namespaces
            .iter()
            .flat_map(|(namespace, ns)| ns.streams().map(move |entry| (namespace, entry)))
            .filter(|(_, entry)| entry.stream.id.to_lowercase().contains(&query))
            .filter(|(_, entry)| member_roles.iter().any(|r| entry.acl.allows_role_read(r)))
            .map(|(namespace, entry)| StreamReference {
                id: entry.stream.id.clone(),
                namespace_id: namespace.clone(),
                type_id: entry.stream.type_id.clone(),
                self_link: self.self_link(namespace, &entry.stream.id),
            })
            .collect();
        drop(namespaces);

        found.sort_by(|a, b| (&a.namespace_id, &a.id).cmp(&(&b.namespace_id, &b.id)));
        debug!(community_id, matches = found.len(), "community streams searched");
        Ok(found)
    }
}

// =============================================================================
// Tests
// =============================================================================
