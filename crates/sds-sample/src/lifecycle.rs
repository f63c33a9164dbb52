//! SDS Sample Lifecycle
//!
//! Drives one sample run: provision types and streams, ingest the tank data,
//! query it back, optionally share a stream with a community, and always
//! tear down what the run may have created.
//!
//! Every resource is registered with the teardown plan before the call that
//! creates it, so a call that fails half way is still cleaned up. Teardown
//! deletes streams before types, logs each failure and moves on.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::data::{self, TankReading};
use chrono::{DateTime, Utc};
use sds_client::SdsClient;
use sds_common::{
    AccessControlEntry, AclPatch, Event, Result, SdsError, Stream, StreamReference,
    SummaryInterval, TypeDefinition, WindowMode, COMMUNITY_MEMBER_ROLE_TYPE_ID,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, warn};

// =============================================================================
// Phases
// =============================================================================

/// Progress of a run. Phases only move forward; a failure jumps to
/// `TornDown`, which every run ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Phase {
    #[default]
    Init,
    TypesProvisioned,
    StreamsProvisioned,
    DataIngested,
    Queried,
    Shared,
    TornDown,
}

/// How a forward failure is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// The failure is logged and recorded in the report.
    #[default]
    Standard,
    /// The failure is returned to the caller once teardown has run.
    Test,
}

// =============================================================================
// Teardown Plan
// =============================================================================

/// Resources a run may have created, released in one pass.
#[derive(Debug)]
pub struct TeardownPlan {
    namespace: String,
    streams: Vec<String>,
    types: Vec<String>,
    executed: bool,
}

impl TeardownPlan {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            streams: Vec::new(),
            types: Vec::new(),
            executed: false,
        }
    }

    pub fn register_stream(&mut self, id: &str) {
        if !self.streams.iter().any(|s| s == id) {
            self.streams.push(id.to_string());
        }
    }

    pub fn register_type(&mut self, name: &str) {
        if !self.types.iter().any(|t| t == name) {
            self.types.push(name.to_string());
        }
    }

    pub fn streams(&self) -> &[String] {
        &self.streams
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// Delete every registered stream, then every registered type. Failures
    /// are logged and recorded, never returned.
    pub async fn execute(mut self, client: &SdsClient) -> TeardownReport {
        self.executed = true;
        let mut report = TeardownReport::default();

        info!(namespace = %self.namespace, streams = self.streams.len(), "deleting streams");
        for id in &self.streams {
            match client.streams().delete_stream(&self.namespace, id).await {
                Ok(()) => report.streams_deleted.push(id.clone()),
                Err(e) => {
                    warn!(stream_id = %id, error = %e, "stream cleanup failed");
                    report.failures.push((format!("stream {}", id), e));
                }
            }
        }

        info!(namespace = %self.namespace, types = self.types.len(), "deleting types");
        for name in self.types.iter().rev() {
            match client.types().delete_type(&self.namespace, name).await {
                Ok(()) => report.types_deleted.push(name.clone()),
                Err(e) => {
                    warn!(type_id = %name, error = %e, "type cleanup failed");
                    report.failures.push((format!("type {}", name), e));
                }
            }
        }

        report
    }
}

impl Drop for TeardownPlan {
    fn drop(&mut self) {
        if !self.executed && !(self.streams.is_empty() && self.types.is_empty()) {
            warn!(
                namespace = %self.namespace,
                streams = ?self.streams,
                types = ?self.types,
                "teardown plan dropped without running; resources may be left behind"
            );
        }
    }
}

/// Outcome of a teardown pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeardownReport {
    pub streams_deleted: Vec<String>,
    pub types_deleted: Vec<String>,
    /// Resource description and the error its deletion raised.
    pub failures: Vec<(String, SdsError)>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// =============================================================================
// Run Results
// =============================================================================

/// Everything the query phase read back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResults {
    pub pressure_sparse: Vec<Event>,
    pub tank_sparse: Vec<Event>,
    pub pressure_filled: Vec<Event>,
    pub tank_filled: Vec<Event>,
    pub summaries: Vec<SummaryInterval>,
    pub bulk: BTreeMap<String, Vec<Event>>,
    pub sharing: Option<SharingResults>,
}

/// Results of the community sharing steps.
#[derive(Debug, Clone, PartialEq)]
pub struct SharingResults {
    pub role_id: String,
    pub community_streams: Vec<StreamReference>,
    pub last_value: Option<Event>,
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Last phase completed before teardown.
    pub phase_reached: Phase,
    /// Phase the run ended in.
    pub phase: Phase,
    pub results: Option<QueryResults>,
    pub teardown: TeardownReport,
    pub error: Option<SdsError>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Runs the sample sequence against one namespace.
pub struct Coordinator {
    client: SdsClient,
    namespace: String,
    community: Option<String>,
    mode: RunMode,
}

impl Coordinator {
    pub fn new(client: SdsClient, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            community: None,
            mode: RunMode::Standard,
        }
    }

    /// Share the pressure stream with this community after querying.
    pub fn with_community(mut self, community: Option<String>) -> Self {
        self.community = community;
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run every phase, then tear down. In test mode a forward failure is
    /// returned after teardown; otherwise it is recorded in the report.
    pub async fn run(self) -> Result<RunReport> {
        let mut plan = TeardownPlan::new(self.namespace.clone());
        let mut phase = Phase::Init;

        let outcome = self.forward(&mut plan, &mut phase).await;
        if let Err(e) = &outcome {
            error!(?phase, error = %e, "sample run failed");
        }

        let phase_reached = phase;
        let teardown = plan.execute(&self.client).await;
        phase = Phase::TornDown;
        info!(
            ?phase_reached,
            streams = teardown.streams_deleted.len(),
            types = teardown.types_deleted.len(),
            failures = teardown.failures.len(),
            "cleanup finished"
        );

        match outcome {
            Ok(results) => Ok(RunReport {
                phase_reached,
                phase,
                results: Some(results),
                teardown,
                error: None,
            }),
            Err(e) if self.mode == RunMode::Test => Err(e),
            Err(e) => Ok(RunReport {
                phase_reached,
                phase,
                results: None,
                teardown,
                error: Some(e),
            }),
        }
    }

    async fn forward(&self, plan: &mut TeardownPlan, phase: &mut Phase) -> Result<QueryResults> {
        let tank_1 = data::tank_1_readings()?;
        let tank_2 = data::tank_2_readings()?;

        self.provision_types(plan).await?;
        *phase = Phase::TypesProvisioned;

        self.provision_streams(plan).await?;
        *phase = Phase::StreamsProvisioned;

        self.ingest(&tank_1, &tank_2).await?;
        *phase = Phase::DataIngested;

        let mut results = self.query(&tank_1, &tank_2).await?;
        *phase = Phase::Queried;

        if let Some(community) = &self.community {
            results.sharing = Some(self.share(community).await?);
            *phase = Phase::Shared;
        }

        Ok(results)
    }

    async fn provision_types(&self, plan: &mut TeardownPlan) -> Result<()> {
        for definition in [data::value_time_type(), data::pressure_temp_time_type()] {
            info!(type_id = %definition.name, "creating type");
            self.create_type(plan, &definition).await?;
        }
        Ok(())
    }

    async fn create_type(&self, plan: &mut TeardownPlan, definition: &TypeDefinition) -> Result<()> {
        plan.register_type(&definition.name);
        self.client
            .types()
            .get_or_create_type(&self.namespace, definition)
            .await?;
        Ok(())
    }

    async fn provision_streams(&self, plan: &mut TeardownPlan) -> Result<()> {
        let streams = [
            Stream::new(data::STREAM_PRESSURE, data::TYPE_VALUE_TIME)
                .with_description("A stream for pressure data of tank1"),
            Stream::new(data::STREAM_TEMPERATURE, data::TYPE_VALUE_TIME)
                .with_description("A stream for temperature data of tank1"),
            Stream::new(data::STREAM_TANK_1, data::TYPE_PRESSURE_TEMP_TIME)
                .with_description("A stream for data of tank1s"),
            Stream::new(data::STREAM_TANK_2, data::TYPE_PRESSURE_TEMP_TIME)
                .with_description("A stream for data of tank2"),
            Stream::new(data::STREAM_VESSEL, data::TYPE_PRESSURE_TEMP_TIME).with_description(""),
        ];

        for stream in &streams {
            info!(stream_id = %stream.id, type_id = %stream.type_id, "creating stream");
            plan.register_stream(&stream.id);
            self.client
                .streams()
                .create_or_update_stream(&self.namespace, stream)
                .await?;
        }
        Ok(())
    }

    async fn ingest(&self, tank_1: &[TankReading], tank_2: &[TankReading]) -> Result<()> {
        let batches = [
            (data::STREAM_PRESSURE, data::pressure_events(tank_1)),
            (data::STREAM_TEMPERATURE, data::temperature_events(tank_1)),
            (data::STREAM_TANK_1, data::tank_events(tank_1)),
            (data::STREAM_TANK_2, data::tank_events(tank_2)),
            (data::STREAM_VESSEL, data::tank_events(tank_1)),
        ];

        let streams = self.client.streams();
        for (stream_id, events) in &batches {
            if let Some(first) = events.first() {
                info!(stream_id, event = %to_json(first), "sending events");
            }
            let inserted = streams
                .insert_values(&self.namespace, stream_id, events)
                .await?;
            info!(stream_id, inserted, "events written");
        }
        Ok(())
    }

    async fn query(&self, tank_1: &[TankReading], tank_2: &[TankReading]) -> Result<QueryResults> {
        let (first, last) = span(tank_1)?;
        let streams = self.client.streams();

        info!(%first, %last, mode = ?self.client.window_mode(), "reading windows");
        let pressure_sparse = streams
            .get_window_values(&self.namespace, data::STREAM_PRESSURE, first, last)
            .await?;
        report_window_record("pressure", &pressure_sparse);
        let tank_sparse = streams
            .get_window_values(&self.namespace, data::STREAM_TANK_1, first, last)
            .await?;
        report_window_record("tank", &tank_sparse);

        // Later reads of the run return every property, stored defaults included.
        let filled_session = self.client.with_window_mode(WindowMode::Filled);
        let filled = filled_session.streams();
        info!("reading windows with default values");
        let pressure_filled = filled
            .get_window_values(&self.namespace, data::STREAM_PRESSURE, first, last)
            .await?;
        report_window_record("pressure", &pressure_filled);
        let tank_filled = filled
            .get_window_values(&self.namespace, data::STREAM_TANK_1, first, last)
            .await?;
        report_window_record("tank", &tank_filled);

        info!("getting data summary");
        let summaries = filled
            .get_summaries(&self.namespace, data::STREAM_TANK_1, None, first, last, 1)
            .await?;
        info!(summaries = %to_json(&summaries), "data summary");

        let (bulk_first, bulk_last) = span(tank_2)?;
        let bulk_ids = vec![
            data::STREAM_VESSEL.to_string(),
            data::STREAM_TANK_2.to_string(),
        ];
        info!(streams = ?bulk_ids, "getting bulk call results");
        let bulk = filled
            .get_streams_window(&self.namespace, &bulk_ids, None, bulk_first, bulk_last)
            .await?;
        for (stream_id, events) in &bulk {
            info!(stream_id = %stream_id, events = %to_json(events), "bulk results");
        }

        Ok(QueryResults {
            pressure_sparse,
            tank_sparse,
            pressure_filled,
            tank_filled,
            summaries,
            bulk,
            sharing: None,
        })
    }

    async fn share(&self, community: &str) -> Result<SharingResults> {
        info!(community, "getting tenant roles");
        let role = self
            .client
            .roles()
            .find_role(COMMUNITY_MEMBER_ROLE_TYPE_ID, community)
            .await?;
        info!(role_id = %role.id, "sharing stream to community");

        let patch = AclPatch::append(AccessControlEntry::role_read(role.id.clone()));
        self.client
            .streams()
            .patch_access_control(&self.namespace, data::STREAM_PRESSURE, &patch)
            .await?;

        info!(community, "searching the community");
        let community_streams = self
            .client
            .communities()
            .get_community_streams(community, data::STREAM_PRESSURE)
            .await?;
        let ids: Vec<&str> = community_streams.iter().map(|r| r.id.as_str()).collect();
        info!(community, streams = ?ids, "community streams found");
        let found = community_streams.first().ok_or_else(|| {
            SdsError::NotFound(format!(
                "stream {} in community {}",
                data::STREAM_PRESSURE,
                community
            ))
        })?;

        let last_value = self
            .client
            .streams()
            .get_last_value_url(&found.self_link)
            .await?;
        match &last_value {
            Some(event) => info!(event = %to_json(event), "retrieved last value"),
            None => info!(stream_id = %found.id, "stream holds no events"),
        }

        Ok(SharingResults {
            role_id: role.id,
            community_streams,
            last_value,
        })
    }
}

/// Log the second record of a window read.
fn report_window_record(label: &str, events: &[Event]) {
    match events.get(1) {
        Some(event) => info!(label, event = %to_json(event), "window record [1]"),
        None => info!(label, count = events.len(), "window holds fewer than two records"),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unencodable: {}>", e))
}

fn span(readings: &[TankReading]) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    data::time_span(readings)
        .ok_or_else(|| SdsError::InvalidArgument("no readings to query".to_string()))
}

// =============================================================================
// Tests
// =============================================================================
