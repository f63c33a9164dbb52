//! End-to-end lifecycle tests for the SDS sample
//!
//! Runs the full sequence against an in-process store, including runs where
//! a store call fails part way, and checks nothing is left behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sds_client::{ClientConfig, SdsClient};
use sds_common::{
    AccessControlList, AclPatch, Event, Result, Role, SdsError, Stream, StreamReference,
    SummaryInterval, TypeDefinition, WindowMode,
};
use sds_sample::data::{STREAM_PRESSURE, STREAM_TANK_1, TYPE_PRESSURE_TEMP_TIME, TYPE_VALUE_TIME};
use sds_sample::{Coordinator, Phase, RunMode};
use sds_store::{MemoryStore, StoreBackend};
use std::collections::BTreeMap;
use std::sync::Arc;

const NS: &str = "samples";

/// Delegates to a memory store but rejects every insert into one stream.
struct FailingInserts {
    inner: Arc<MemoryStore>,
    stream_id: &'static str,
}

#[async_trait]
impl StoreBackend for FailingInserts {
    async fn get_or_create_type(&self, namespace: &str, definition: &TypeDefinition) -> Result<TypeDefinition> {
        self.inner.get_or_create_type(namespace, definition).await
    }

    async fn get_type(&self, namespace: &str, name: &str) -> Result<TypeDefinition> {
        self.inner.get_type(namespace, name).await
    }

    async fn delete_type(&self, namespace: &str, name: &str) -> Result<()> {
        self.inner.delete_type(namespace, name).await
    }

    async fn create_or_update_stream(&self, namespace: &str, stream: &Stream) -> Result<Stream> {
        self.inner.create_or_update_stream(namespace, stream).await
    }

    async fn get_stream(&self, namespace: &str, id: &str) -> Result<Stream> {
        self.inner.get_stream(namespace, id).await
    }

    async fn delete_stream(&self, namespace: &str, id: &str) -> Result<()> {
        self.inner.delete_stream(namespace, id).await
    }

    async fn insert_values(&self, namespace: &str, stream_id: &str, events: &[Event]) -> Result<usize> {
        if stream_id == self.stream_id {
            return Err(SdsError::TypeMismatch(format!("insert into {} rejected", stream_id)));
        }
        self.inner.insert_values(namespace, stream_id, events).await
    }

    async fn get_window_values(
        &self,
        namespace: &str,
        stream_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mode: WindowMode,
    ) -> Result<Vec<Event>> {
        self.inner.get_window_values(namespace, stream_id, start, end, mode).await
    }

    async fn get_streams_window(
        &self,
        namespace: &str,
        stream_ids: &[String],
        mode: WindowMode,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<BTreeMap<String, Vec<Event>>> {
        self.inner.get_streams_window(namespace, stream_ids, mode, start, end).await
    }

    async fn get_last_value_url(&self, self_link: &str) -> Result<Option<Event>> {
        self.inner.get_last_value_url(self_link).await
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
        self.inner
            .get_summaries(namespace, stream_id, properties, start, end, interval_count)
            .await
    }

    async fn patch_access_control(&self, namespace: &str, stream_id: &str, patch: &AclPatch) -> Result<()> {
        self.inner.patch_access_control(namespace, stream_id, patch).await
    }

    async fn get_access_control(&self, namespace: &str, stream_id: &str) -> Result<AccessControlList> {
        self.inner.get_access_control(namespace, stream_id).await
    }

    async fn get_roles(&self) -> Result<Vec<Role>> {
        self.inner.get_roles().await
    }

    async fn get_community_streams(&self, community_id: &str, query: &str) -> Result<Vec<StreamReference>> {
        self.inner.get_community_streams(community_id, query).await
    }
}

fn client(store: Arc<dyn StoreBackend>) -> SdsClient {
    SdsClient::new(store, ClientConfig::default())
}

async fn assert_nothing_left(store: &MemoryStore) {
    for id in [STREAM_PRESSURE, STREAM_TANK_1] {
        assert!(matches!(store.get_stream(NS, id).await, Err(SdsError::NotFound(_))));
    }
    for name in [TYPE_VALUE_TIME, TYPE_PRESSURE_TEMP_TIME] {
        assert!(matches!(store.get_type(NS, name).await, Err(SdsError::NotFound(_))));
    }
}

#[tokio::test]
async fn test_full_run_with_community() {
    let store = Arc::new(MemoryStore::new().with_community("operators", "Plant Operators"));
    let report = Coordinator::new(client(store.clone()), NS)
        .with_community(Some("operators".to_string()))
        .with_mode(RunMode::Test)
        .run()
        .await
        .unwrap();

    assert!(report.succeeded());
    assert_eq!(report.phase_reached, Phase::Shared);
    assert!(report.teardown.is_clean());

    let sharing = report.results.unwrap().sharing.unwrap();
    assert_eq!(sharing.role_id, "operators-member");
    assert_eq!(sharing.community_streams.len(), 1);
    assert_eq!(sharing.community_streams[0].id, STREAM_PRESSURE);
    assert_eq!(sharing.last_value.and_then(|e| e.number("value")), Some(390.0));

    assert_nothing_left(&store).await;
    assert_eq!(store.stats().types_created, 2);
    assert_eq!(store.stats().streams_deleted, 5);
}

#[tokio::test]
async fn test_failed_ingestion_still_tears_down() {
    let memory = Arc::new(MemoryStore::new());
    let failing = Arc::new(FailingInserts {
        inner: memory.clone(),
        stream_id: STREAM_TANK_1,
    });

    let err = Coordinator::new(client(failing.clone()), NS)
        .with_mode(RunMode::Test)
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, SdsError::TypeMismatch(_)));
    assert_nothing_left(&memory).await;

    // A second run over the same store starts clean.
    let report = Coordinator::new(client(failing), NS).run().await.unwrap();
    assert!(!report.succeeded());
    assert_eq!(report.phase_reached, Phase::StreamsProvisioned);
    assert_eq!(report.phase, Phase::TornDown);
    assert!(report.teardown.is_clean());
    assert_eq!(report.teardown.streams_deleted.len(), 5);
    assert_nothing_left(&memory).await;
}

#[tokio::test]
async fn test_missing_community_role_fails_the_run() {
    let store = Arc::new(MemoryStore::new());
    let report = Coordinator::new(client(store.clone()), NS)
        .with_community(Some("nobody".to_string()))
        .run()
        .await
        .unwrap();

    assert!(matches!(report.error, Some(SdsError::NotFound(_))));
    assert_eq!(report.phase_reached, Phase::Queried);
    assert!(report.teardown.is_clean());
    assert_nothing_left(&store).await;
}
