//! SDS Client Services
//!
//! Resource-oriented views over a client session. Each service borrows the
//! session and forwards to the backend through its request policy.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::SdsClient;
use chrono::{DateTime, Utc};
use sds_common::access::find_role;
use sds_common::{
    AccessControlList, AclPatch, Event, Result, Role, Stream, StreamReference, SummaryInterval,
    TypeDefinition, WindowMode,
};
use std::collections::BTreeMap;

// =============================================================================
// Types Service
// =============================================================================

/// Type registry operations.
pub struct TypesService<'a> {
    client: &'a SdsClient,
}

impl<'a> TypesService<'a> {
    pub(crate) fn new(client: &'a SdsClient) -> Self {
        Self { client }
    }

    pub async fn get_or_create_type(
        &self,
        namespace: &str,
        definition: &TypeDefinition,
    ) -> Result<TypeDefinition> {
        let backend = self.client.backend();
        self.client
            .request("get_or_create_type", move || {
                backend.get_or_create_type(namespace, definition)
            })
            .await
    }

    pub async fn get_type(&self, namespace: &str, name: &str) -> Result<TypeDefinition> {
        let backend = self.client.backend();
        self.client
            .request("get_type", move || backend.get_type(namespace, name))
            .await
    }

    pub async fn delete_type(&self, namespace: &str, name: &str) -> Result<()> {
        let backend = self.client.backend();
        self.client
            .request("delete_type", move || backend.delete_type(namespace, name))
            .await
    }
}

// =============================================================================
// Streams Service
// =============================================================================

/// Stream registry, data and access control operations.
pub struct StreamsService<'a> {
    client: &'a SdsClient,
}

impl<'a> StreamsService<'a> {
    pub(crate) fn new(client: &'a SdsClient) -> Self {
        Self { client }
    }

    pub async fn create_or_update_stream(&self, namespace: &str, stream: &Stream) -> Result<Stream> {
        let backend = self.client.backend();
        self.client
            .request("create_or_update_stream", move || {
                backend.create_or_update_stream(namespace, stream)
            })
            .await
    }

    pub async fn get_stream(&self, namespace: &str, id: &str) -> Result<Stream> {
        let backend = self.client.backend();
        self.client
            .request("get_stream", move || backend.get_stream(namespace, id))
            .await
    }

    pub async fn delete_stream(&self, namespace: &str, id: &str) -> Result<()> {
        let backend = self.client.backend();
        self.client
            .request("delete_stream", move || backend.delete_stream(namespace, id))
            .await
    }

    pub async fn insert_values(
        &self,
        namespace: &str,
        stream_id: &str,
        events: &[Event],
    ) -> Result<usize> {
        let backend = self.client.backend();
        self.client
            .request("insert_values", move || {
                backend.insert_values(namespace, stream_id, events)
            })
            .await
    }

    /// Window read under the session's default mode.
    pub async fn get_window_values(
        &self,
        namespace: &str,
        stream_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        self.get_window_values_with_mode(namespace, stream_id, start, end, self.client.window_mode())
            .await
    }

    pub async fn get_window_values_with_mode(
        &self,
        namespace: &str,
        stream_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mode: WindowMode,
    ) -> Result<Vec<Event>> {
        let backend = self.client.backend();
        self.client
            .request("get_window_values", move || {
                backend.get_window_values(namespace, stream_id, start, end, mode)
            })
            .await
    }

    /// Bulk window read; `None` uses the session's default mode.
    pub async fn get_streams_window(
        &self,
        namespace: &str,
        stream_ids: &[String],
        mode: Option<WindowMode>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BTreeMap<String, Vec<Event>>> {
        let mode = mode.unwrap_or_else(|| self.client.window_mode());
        let backend = self.client.backend();
        self.client
            .request("get_streams_window", move || {
                backend.get_streams_window(namespace, stream_ids, mode, start, end)
            })
            .await
    }

    pub async fn get_last_value_url(&self, self_link: &str) -> Result<Option<Event>> {
        let backend = self.client.backend();
        self.client
            .request("get_last_value_url", move || backend.get_last_value_url(self_link))
            .await
    }

    pub async fn get_summaries(
        &self,
        namespace: &str,
        stream_id: &str,
        properties: Option<&[String]>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_count: usize,
    ) -> Result<Vec<SummaryInterval>> {
        let backend = self.client.backend();
        self.client
            .request("get_summaries", move || {
                backend.get_summaries(namespace, stream_id, properties, start, end, interval_count)
            })
            .await
    }

    pub async fn patch_access_control(
        &self,
        namespace: &str,
        stream_id: &str,
        patch: &AclPatch,
    ) -> Result<()> {
        let backend = self.client.backend();
        self.client
            .request("patch_access_control", move || {
                backend.patch_access_control(namespace, stream_id, patch)
            })
            .await
    }

    pub async fn get_access_control(
        &self,
        namespace: &str,
        stream_id: &str,
    ) -> Result<AccessControlList> {
        let backend = self.client.backend();
        self.client
            .request("get_access_control", move || {
                backend.get_access_control(namespace, stream_id)
            })
            .await
    }
}

// =============================================================================
// Roles Service
// =============================================================================

/// Tenant role operations.
pub struct RolesService<'a> {
    client: &'a SdsClient,
}

impl<'a> RolesService<'a> {
    pub(crate) fn new(client: &'a SdsClient) -> Self {
        Self { client }
    }

    pub async fn get_roles(&self) -> Result<Vec<Role>> {
        let backend = self.client.backend();
        self.client
            .request("get_roles", move || backend.get_roles())
            .await
    }

    /// The role of `role_type_id` belonging to a community; `NotFound` when
    /// the tenant has none.
    pub async fn find_role(&self, role_type_id: &str, community_id: &str) -> Result<Role> {
        let roles = self.get_roles().await?;
        find_role(&roles, role_type_id, community_id).cloned()
    }
}

// =============================================================================
// Communities Service
// =============================================================================

/// Community discovery operations.
pub struct CommunitiesService<'a> {
    client: &'a SdsClient,
}

impl<'a> CommunitiesService<'a> {
    pub(crate) fn new(client: &'a SdsClient) -> Self {
        Self { client }
    }

    pub async fn get_community_streams(
        &self,
        community_id: &str,
        query: &str,
    ) -> Result<Vec<StreamReference>> {
        let backend = self.client.backend();
        self.client
            .request("get_community_streams", move || {
                backend.get_community_streams(community_id, query)
            })
            .await
    }
}
