//! Integration tests for the in-process store
//!
//! Exercises the store through the backend trait object the way a client
//! sees it: provisioning, ingestion, window and summary reads.

use chrono::{DateTime, Duration, Utc};
use sds_common::{Event, PropertyDefinition, SdsError, Stream, TypeCode, TypeDefinition, WindowMode};
use sds_store::{MemoryStore, StoreBackend};
use std::sync::Arc;

const NS: &str = "samples";

fn tank_type() -> TypeDefinition {
    TypeDefinition::new("Pressure_Temp_Time")
        .with_property(PropertyDefinition::value("pressure", TypeCode::Double))
        .with_property(PropertyDefinition::value("temperature", TypeCode::Double))
        .with_property(PropertyDefinition::key("time"))
}

fn base() -> DateTime<Utc> {
    DateTime::from_timestamp(1_484_173_283, 430_000_000).expect("valid timestamp")
}

fn reading(minutes: i64, pressure: f64, temperature: f64) -> Event {
    Event::new()
        .with("pressure", pressure)
        .with("temperature", temperature)
        .with("time", base() + Duration::minutes(minutes))
}

async fn store_with(streams: &[&str]) -> Arc<dyn StoreBackend> {
    let store: Arc<dyn StoreBackend> = Arc::new(MemoryStore::new());
    store
        .get_or_create_type(NS, &tank_type())
        .await
        .expect("create type");
    for id in streams {
        store
            .create_or_update_stream(NS, &Stream::new(*id, "Pressure_Temp_Time"))
            .await
            .expect("create stream");
    }
    store
}

#[tokio::test]
async fn test_sparse_read_is_ordered_and_deduplicated() {
    let store = store_with(&["Tank1"]).await;
    store
        .insert_values(NS, "Tank1", &[reading(2, 3.0, 30.0), reading(0, 1.0, 10.0), reading(1, 2.0, 20.0)])
        .await
        .expect("store call");
    store
        .insert_values(NS, "Tank1", &[reading(1, 9.0, 90.0)])
        .await
        .expect("store call");

    let events = store
        .get_window_values(NS, "Tank1", base(), base() + Duration::minutes(2), WindowMode::Sparse)
        .await
        .expect("store call");

    let pressures: Vec<f64> = events.iter().filter_map(|e| e.number("pressure")).collect();
    assert_eq!(pressures, vec![1.0, 9.0, 3.0]);
    let times: Vec<DateTime<Utc>> = events.iter().filter_map(|e| e.timestamp("time")).collect();
    assert!(times.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn test_filled_returns_every_property() {
    let store = store_with(&["Tank1"]).await;
    store
        .insert_values(NS, "Tank1", &[reading(1, 1.0, 10.0), reading(3, 0.0, 0.0)])
        .await
        .expect("store call");

    let start = base();
    let end = base() + Duration::minutes(5);
    let sparse = store
        .get_window_values(NS, "Tank1", start, end, WindowMode::Sparse)
        .await
        .expect("store call");
    let filled = store
        .get_window_values(NS, "Tank1", start, end, WindowMode::Filled)
        .await
        .expect("store call");

    assert_eq!(sparse.len(), 2);
    assert_eq!(filled.len(), 4);
    assert!(filled.contains(&sparse[0]));
    assert_eq!(sparse[1].len(), 1);
    assert_eq!(filled[2].number("pressure"), Some(0.0));
    for (sparse, filled) in sparse.iter().zip(&filled[1..]) {
        assert_eq!(sparse.timestamp("time"), filled.timestamp("time"));
    }
    for event in &filled {
        assert!(event.contains("pressure"));
        assert!(event.contains("temperature"));
        assert!(event.contains("time"));
    }
}

#[tokio::test]
async fn test_bulk_window_keyed_by_stream() {
    let store = store_with(&["Tank1", "Tank2"]).await;
    store
        .insert_values(NS, "Tank1", &[reading(0, 1.0, 10.0), reading(0, 2.0, 20.0)])
        .await
        .expect("store call");
    store
        .insert_values(NS, "Tank2", &[reading(1, 5.0, 50.0)])
        .await
        .expect("store call");

    let ids = vec!["Tank1".to_string(), "Tank2".to_string()];
    let result = store
        .get_streams_window(NS, &ids, WindowMode::Sparse, base(), base() + Duration::minutes(1))
        .await
        .expect("store call");

    assert_eq!(result.len(), 2);
    assert_eq!(result["Tank1"].len(), 1);
    assert_eq!(result["Tank1"][0].number("pressure"), Some(2.0));
    assert_eq!(result["Tank2"][0].number("pressure"), Some(5.0));
}

#[tokio::test]
async fn test_bulk_filled_window_fills_each_stream() {
    let store = store_with(&["Tank1", "Tank2"]).await;
    store
        .insert_values(NS, "Tank1", &[reading(0, 1.0, 10.0), reading(2, 3.0, 30.0)])
        .await
        .expect("insert Tank1");
    store
        .insert_values(NS, "Tank2", &[reading(1, 5.0, 50.0)])
        .await
        .expect("insert Tank2");

    let start = base();
    let end = base() + Duration::minutes(2);
    let ids = vec!["Tank1".to_string(), "Tank2".to_string()];
    let result = store
        .get_streams_window(NS, &ids, WindowMode::Filled, start, end)
        .await
        .expect("bulk window");

    let tank_1 = &result["Tank1"];
    assert_eq!(tank_1.len(), 2);
    assert_eq!(tank_1[0].number("pressure"), Some(1.0));
    assert_eq!(tank_1[1].number("pressure"), Some(3.0));

    let tank_2 = &result["Tank2"];
    assert_eq!(tank_2.len(), 3);
    assert_eq!(tank_2[0].timestamp("time"), Some(start));
    assert_eq!(tank_2[0].number("pressure"), Some(0.0));
    assert_eq!(tank_2[1].number("pressure"), Some(5.0));
    assert_eq!(tank_2[2].timestamp("time"), Some(end));
    assert_eq!(tank_2[2].number("temperature"), Some(0.0));
}

#[tokio::test]
async fn test_failed_batch_leaves_stream_untouched() {
    let store = store_with(&["Tank1"]).await;
    let bad = Event::new().with("pressure", 1.0).with("time", base());
    let err = store
        .insert_values(NS, "Tank1", &[reading(0, 1.0, 10.0), bad])
        .await
        .expect_err("batch should be rejected");
    assert!(matches!(err, SdsError::TypeMismatch(_)));

    let events = store
        .get_window_values(NS, "Tank1", base(), base(), WindowMode::Sparse)
        .await
        .expect("store call");
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_summaries_count_zero_readings() {
    let store = store_with(&["Tank1"]).await;
    let temperatures = [91.0, 0.0, 93.0, 92.0, 0.0, 92.0, 92.2, 0.0];
    let events: Vec<Event> = temperatures
        .iter()
        .enumerate()
        .map(|(i, t)| reading(i as i64, 100.0, *t))
        .collect();
    store
        .insert_values(NS, "Tank1", &events)
        .await
        .expect("insert");

    let summaries = store
        .get_summaries(NS, "Tank1", None, base(), base() + Duration::minutes(7), 1)
        .await
        .expect("store call");
    let temperature = &summaries[0].summaries["temperature"];
    assert_eq!(temperature.count, 8);
    assert_eq!(temperature.minimum, Some(0.0));
}

#[tokio::test]
async fn test_teardown_order() {
    let store = store_with(&["Tank1"]).await;
    assert!(matches!(
        store.delete_type(NS, "Pressure_Temp_Time").await,
        Err(SdsError::Conflict(_))
    ));
    store.delete_stream(NS, "Tank1").await.expect("delete stream");
    store
        .delete_type(NS, "Pressure_Temp_Time")
        .await
        .expect("delete type");
    assert!(matches!(
        store.get_stream(NS, "Tank1").await,
        Err(SdsError::NotFound(_))
    ));
}
