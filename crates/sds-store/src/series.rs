//! SDS Series - Event Storage
//!
//! Time-ordered event storage for a single stream. Events are keyed by the
//! value of their type's key property, so iteration is always in key order
//! and re-inserting a key overwrites the previous event.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use chrono::{DateTime, Utc};
use sds_common::{Event, Result, SdsError, TypeDefinition};
use std::collections::BTreeMap;

// =============================================================================
// Series
// =============================================================================

/// Events of one stream indexed by key.
#[derive(Debug, Clone, Default)]
pub struct Series {
    events: BTreeMap<DateTime<Utc>, Event>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a batch against the type and insert it. Nothing is written
    /// when any event is rejected.
    pub fn insert(&mut self, definition: &TypeDefinition, events: &[Event]) -> Result<usize> {
        let normalized = events
            .iter()
            .enumerate()
            .map(|(i, event)| {
                normalize(definition, event).map_err(|e| match e {
                    SdsError::TypeMismatch(msg) => {
                        SdsError::TypeMismatch(format!("event {}: {}", i, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let count = normalized.len();
        for (key, event) in normalized {
            self.events.insert(key, event);
        }
        Ok(count)
    }

    /// Events with keys in `[start, end]`, in key order.
    pub fn range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = (&DateTime<Utc>, &Event)> {
        (start <= end)
            .then(|| self.events.range(start..=end))
            .into_iter()
            .flatten()
    }

    pub fn get(&self, key: &DateTime<Utc>) -> Option<&Event> {
        self.events.get(key)
    }

    pub fn contains_key(&self, key: &DateTime<Utc>) -> bool {
        self.events.contains_key(key)
    }

    /// The event with the greatest key.
    pub fn last(&self) -> Option<&Event> {
        self.events.values().next_back()
    }

    /// The time range covered by the stored events.
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = *self.events.keys().next()?;
        let last = *self.events.keys().next_back()?;
        Some((first, last))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Check an event against a type and convert its values to the declared
/// value types. Returns the event's key alongside the converted event.
pub fn normalize(definition: &TypeDefinition, event: &Event) -> Result<(DateTime<Utc>, Event)> {
    if let Some(unknown) = event.names().find(|n| definition.property(n).is_none()) {
        return Err(SdsError::TypeMismatch(format!(
            "property {} is not declared by type {}",
            unknown, definition.name
        )));
    }

    let mut normalized = Event::new();
    let mut key = None;

    for property in &definition.properties {
        let value = event.get(&property.name).ok_or_else(|| {
            SdsError::TypeMismatch(format!("missing property {}", property.name))
        })?;
        let value = property.type_code.coerce(value).ok_or_else(|| {
            SdsError::TypeMismatch(format!(
                "property {} expects {}, got {:?}",
                property.name, property.type_code, value
            ))
        })?;
        if property.is_key {
            key = value.as_timestamp();
        }
        normalized.set(property.name.clone(), value);
    }

    let key = key.ok_or_else(|| {
        SdsError::TypeMismatch(format!("type {} has no timestamp key", definition.name))
    })?;
    Ok((key, normalized))
}

// =============================================================================
// Tests
// =============================================================================
