//! SDS Registry - Namespace Type and Stream Registries
//!
//! The contents of one namespace: registered types and the streams that
//! reference them, each stream owning its series and access control list.
//! Every operation here is synchronous; the engine holds the namespace lock
//! around each call.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::series::Series;
use sds_common::types::validate_identifier;
use sds_common::{AccessControlList, Event, Result, SdsError, Stream, TypeDefinition};
use std::collections::HashMap;

// =============================================================================
// Stream Entry
// =============================================================================

/// A stream together with its data and sharing metadata.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub stream: Stream,
    pub series: Series,
    pub acl: AccessControlList,
}

impl StreamEntry {
    fn new(stream: Stream) -> Self {
        Self {
            stream,
            series: Series::new(),
            acl: AccessControlList::default(),
        }
    }
}

/// Outcome of a type registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOutcome {
    Created,
    Existing,
}

/// Outcome of a stream create-or-update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Created,
    Updated,
    Unchanged,
}

// =============================================================================
// Namespace
// =============================================================================

/// Types and streams of one namespace.
#[derive(Debug, Default)]
pub struct Namespace {
    types: HashMap<String, TypeDefinition>,
    streams: HashMap<String, StreamEntry>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Types
    // -------------------------------------------------------------------------

    /// Register a type, or return the compatible type already registered
    /// under its name.
    pub fn get_or_create_type(
        &mut self,
        definition: &TypeDefinition,
    ) -> Result<(TypeDefinition, TypeOutcome)> {
        validate_identifier("type", &definition.name)?;
        definition.validate()?;

        if let Some(existing) = self.types.get(&definition.name) {
            if !existing.is_compatible_with(definition) {
                return Err(SdsError::SchemaConflict(format!(
                    "type {} is registered with a different property set",
                    definition.name
                )));
            }
            return Ok((existing.clone(), TypeOutcome::Existing));
        }

        self.types
            .insert(definition.name.clone(), definition.clone());
        Ok((definition.clone(), TypeOutcome::Created))
    }

    pub fn get_type(&self, name: &str) -> Result<&TypeDefinition> {
        self.types
            .get(name)
            .ok_or_else(|| SdsError::NotFound(format!("type {}", name)))
    }

    /// Delete a type that no stream references.
    pub fn delete_type(&mut self, name: &str) -> Result<()> {
        if !self.types.contains_key(name) {
            return Err(SdsError::NotFound(format!("type {}", name)));
        }

        let mut referencing: Vec<&str> = self
            .streams
            .values()
            .filter(|e| e.stream.type_id == name)
            .map(|e| e.stream.id.as_str())
            .collect();
        if !referencing.is_empty() {
            referencing.sort_unstable();
            return Err(SdsError::Conflict(format!(
                "type {} is referenced by streams {}",
                name,
                referencing.join(", ")
            )));
        }

        self.types.remove(name);
        Ok(())
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    // -------------------------------------------------------------------------
    // Streams
    // -------------------------------------------------------------------------

    /// Create a stream or update the description and type of an existing one.
    pub fn create_or_update_stream(&mut self, stream: &Stream) -> Result<(Stream, StreamOutcome)> {
        stream.validate()?;
        if !self.types.contains_key(&stream.type_id) {
            return Err(SdsError::NotFound(format!(
                "type {} referenced by stream {}",
                stream.type_id, stream.id
            )));
        }

        let Some(entry) = self.streams.get_mut(&stream.id) else {
            self.streams
                .insert(stream.id.clone(), StreamEntry::new(stream.clone()));
            return Ok((stream.clone(), StreamOutcome::Created));
        };

        if entry.stream == *stream {
            return Ok((entry.stream.clone(), StreamOutcome::Unchanged));
        }
        if entry.stream.type_id != stream.type_id && !entry.series.is_empty() {
            return Err(SdsError::Conflict(format!(
                "stream {} holds {} events of type {}",
                stream.id,
                entry.series.len(),
                entry.stream.type_id
            )));
        }

        entry.stream = stream.clone();
        Ok((entry.stream.clone(), StreamOutcome::Updated))
    }

    pub fn stream(&self, id: &str) -> Result<&StreamEntry> {
        self.streams
            .get(id)
            .ok_or_else(|| SdsError::NotFound(format!("stream {}", id)))
    }

    pub fn stream_mut(&mut self, id: &str) -> Result<&mut StreamEntry> {
        self.streams
            .get_mut(id)
            .ok_or_else(|| SdsError::NotFound(format!("stream {}", id)))
    }

    /// A stream together with the definition of its type.
    pub fn stream_with_type(&self, id: &str) -> Result<(&StreamEntry, &TypeDefinition)> {
        let entry = self.stream(id)?;
        let definition = self.get_type(&entry.stream.type_id)?;
        Ok((entry, definition))
    }

    pub fn delete_stream(&mut self, id: &str) -> Result<StreamEntry> {
        self.streams
            .remove(id)
            .ok_or_else(|| SdsError::NotFound(format!("stream {}", id)))
    }

    pub fn streams(&self) -> impl Iterator<Item = &StreamEntry> {
        self.streams.values()
    }

    // -------------------------------------------------------------------------
    // Data
    // -------------------------------------------------------------------------

    /// Validate and insert a batch into a stream.
    pub fn insert_values(&mut self, stream_id: &str, events: &[Event]) -> Result<usize> {
        let entry = self
            .streams
            .get_mut(stream_id)
            .ok_or_else(|| SdsError::NotFound(format!("stream {}", stream_id)))?;
        let definition = self.types.get(&entry.stream.type_id).ok_or_else(|| {
            SdsError::NotFound(format!(
                "type {} referenced by stream {}",
                entry.stream.type_id, stream_id
            ))
        })?;
        entry.series.insert(definition, events)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use sds_common::{PropertyDefinition, TypeCode};

    fn value_time() -> TypeDefinition {
        TypeDefinition::new("Value_Time")
            .with_property(PropertyDefinition::value("value", TypeCode::Double))
            .with_property(PropertyDefinition::key("time"))
    }

    fn value_event(value: f64) -> Event {
        let time = DateTime::<Utc>::from_timestamp(1_484_173_283, 0).expect("valid timestamp");
        Event::new().with("value", value).with("time", time)
    }

    #[test]
    fn test_get_or_create_type_is_idempotent() {
        let mut ns = Namespace::new();
        let (first, outcome) = ns.get_or_create_type(&value_time()).expect("create type");
        assert_eq!(outcome, TypeOutcome::Created);

        let (second, outcome) = ns.get_or_create_type(&value_time()).expect("get type");
        assert_eq!(outcome, TypeOutcome::Existing);
        assert_eq!(first, second);
        assert_eq!(ns.type_count(), 1);
    }

    #[test]
    fn test_incompatible_type_conflicts() {
        let mut ns = Namespace::new();
        ns.get_or_create_type(&value_time()).expect("create type");

        let changed = TypeDefinition::new("Value_Time")
            .with_property(PropertyDefinition::value("value", TypeCode::Int64))
            .with_property(PropertyDefinition::key("time"));
        assert!(matches!(
            ns.get_or_create_type(&changed),
            Err(SdsError::SchemaConflict(_))
        ));
    }

    #[test]
    fn test_invalid_type_rejected() {
        let mut ns = Namespace::new();
        let keyless = TypeDefinition::new("Keyless")
            .with_property(PropertyDefinition::value("value", TypeCode::Double));
        assert!(matches!(
            ns.get_or_create_type(&keyless),
            Err(SdsError::InvalidArgument(_))
        ));
        assert_eq!(ns.type_count(), 0);
    }

    #[test]
    fn test_stream_create_update() {
        let mut ns = Namespace::new();
        let missing = ns.create_or_update_stream(&Stream::new("Tank1", "Value_Time"));
        assert!(matches!(missing, Err(SdsError::NotFound(_))));

        ns.get_or_create_type(&value_time()).expect("create type");
        let stream = Stream::new("Tank1", "Value_Time");
        let (_, outcome) = ns.create_or_update_stream(&stream).expect("create stream");
        assert_eq!(outcome, StreamOutcome::Created);
        let (_, outcome) = ns.create_or_update_stream(&stream).expect("repeat");
        assert_eq!(outcome, StreamOutcome::Unchanged);

        let described = stream.clone().with_description("tank one");
        let (updated, outcome) = ns.create_or_update_stream(&described).expect("update");
        assert_eq!(outcome, StreamOutcome::Updated);
        assert_eq!(updated.description.as_deref(), Some("tank one"));
    }

    #[test]
    fn test_retyping_stream_with_events_conflicts() {
        let mut ns = Namespace::new();
        ns.get_or_create_type(&value_time()).expect("create type");
        let other = TypeDefinition::new("Other")
            .with_property(PropertyDefinition::value("reading", TypeCode::Double))
            .with_property(PropertyDefinition::key("time"));
        ns.get_or_create_type(&other).expect("create type");

        ns.create_or_update_stream(&Stream::new("Tank1", "Value_Time"))
            .expect("create stream");
        ns.create_or_update_stream(&Stream::new("Tank1", "Other"))
            .expect("retyping an empty stream is allowed");
        ns.create_or_update_stream(&Stream::new("Tank1", "Value_Time"))
            .expect("retype back");

        ns.insert_values("Tank1", &[value_event(1.0)]).expect("insert");
        assert!(matches!(
            ns.create_or_update_stream(&Stream::new("Tank1", "Other")),
            Err(SdsError::Conflict(_))
        ));
    }

    #[test]
    fn test_delete_type_in_use() {
        let mut ns = Namespace::new();
        ns.get_or_create_type(&value_time()).expect("create type");
        ns.create_or_update_stream(&Stream::new("Tank1", "Value_Time"))
            .expect("create stream");

        assert!(matches!(ns.delete_type("Value_Time"), Err(SdsError::Conflict(_))));
        ns.delete_stream("Tank1").expect("delete stream");
        ns.delete_type("Value_Time").expect("delete type");
        assert!(matches!(ns.delete_type("Value_Time"), Err(SdsError::NotFound(_))));
        assert!(matches!(ns.delete_stream("Tank1"), Err(SdsError::NotFound(_))));
    }
}
