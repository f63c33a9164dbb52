//! SDS Window - Window Query Engine
//!
//! Range reads over a stream's series under the two fill policies.
//!
//! Sparse reads return the stored events inside `[start, end]` with every
//! non-key property that holds its type's zero value left out; the record
//! and its key are always kept. Filled reads return every property, and return one record per sampling position, where the sampling
//! positions are the stored keys in range plus both window boundaries. A
//! boundary without a stored event comes back with every non-key property set
//! to its type's zero value; the key keeps the boundary timestamp.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::series::Series;
use chrono::{DateTime, Utc};
use sds_common::{Event, Result, SdsError, TypeDefinition, WindowMode};

/// Reject windows whose start lies after their end.
pub fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start > end {
        return Err(SdsError::InvalidRange { start, end });
    }
    Ok(())
}

/// Read `[start, end]` from a series.
pub fn window_values(
    series: &Series,
    definition: &TypeDefinition,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    mode: WindowMode,
) -> Result<Vec<Event>> {
    check_range(start, end)?;

    let mut events: Vec<Event> = series.range(start, end).map(|(_, e)| e.clone()).collect();

    if mode == WindowMode::Sparse {
        for event in &mut events {
            suppress_defaults(definition, event);
        }
        return Ok(events);
    }

    if !series.contains_key(&start) {
        events.insert(0, zero_filled(definition, start));
    }
    if end != start && !series.contains_key(&end) {
        events.push(zero_filled(definition, end));
    }
    Ok(events)
}

/// Drop the non-key properties of `event` that hold their zero value.
fn suppress_defaults(definition: &TypeDefinition, event: &mut Event) {
    for property in definition.value_properties() {
        if event.get(&property.name) == Some(&property.type_code.zero_value()) {
            event.remove(&property.name);
        }
    }
}

/// A record at `at` whose non-key properties hold their zero values.
pub fn zero_filled(definition: &TypeDefinition, at: DateTime<Utc>) -> Event {
    let mut event = Event::new();
    for property in &definition.properties {
        if property.is_key {
            event.set(property.name.clone(), at);
        } else {
            event.set(property.name.clone(), property.type_code.zero_value());
        }
    }
    event
}

// =============================================================================
// Tests
// =============================================================================
