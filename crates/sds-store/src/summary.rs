//! SDS Summary - Interval Aggregation
//!
//! Aggregate functions and per-interval summaries over a stream's numeric
//! properties. A window is split into equal-width sub-intervals, half-open
//! except the last one which also includes the window end.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use crate::series::Series;
use crate::window::check_range;
use chrono::{DateTime, Utc};
use sds_common::utils::split_interval;
use sds_common::{PropertySummary, Result, SdsError, SummaryInterval, TypeDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Aggregate Function
// =============================================================================

/// Aggregation function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Mean,
    First,
    Last,
    StdDev,
}

impl AggregateFunction {
    /// Apply the aggregation to a set of values.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }

        Some(match self {
            Self::Count => values.len() as f64,
            Self::Sum => values.iter().sum(),
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Self::First => *values.first()?,
            Self::Last => *values.last()?,
            Self::StdDev => {
                let mean = Self::Mean.apply(values)?;
                let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
                (sum_sq / values.len() as f64).sqrt()
            }
        })
    }
}

// =============================================================================
// Summary Accumulator
// =============================================================================

/// Collects the samples of one property within one interval.
#[derive(Debug, Default)]
pub struct SummaryAccumulator {
    values: Vec<f64>,
}

impl SummaryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample in key order.
    pub fn add(&mut self, value: f64) {
        self.values.push(value);
    }

    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Summarize the samples; an empty accumulator has no statistics.
    pub fn finish(&self) -> PropertySummary {
        PropertySummary {
            count: self.values.len(),
            minimum: AggregateFunction::Min.apply(&self.values),
            maximum: AggregateFunction::Max.apply(&self.values),
            mean: AggregateFunction::Mean.apply(&self.values),
            total: AggregateFunction::Sum.apply(&self.values),
            first: AggregateFunction::First.apply(&self.values),
            last: AggregateFunction::Last.apply(&self.values),
            standard_deviation: AggregateFunction::StdDev.apply(&self.values),
        }
    }
}

// =============================================================================
// Summaries
// =============================================================================

/// Choose the properties to summarize. `None` selects every non-key numeric
/// property; named properties must exist and be numeric.
pub fn resolve_properties(
    definition: &TypeDefinition,
    properties: Option<&[String]>,
) -> Result<Vec<String>> {
    let Some(names) = properties else {
        return Ok(definition
            .numeric_properties()
            .map(|p| p.name.clone())
            .collect());
    };

    names
        .iter()
        .map(|name| match definition.property(name) {
            Some(p) if p.is_key => Err(SdsError::InvalidArgument(format!(
                "key property {} cannot be summarized",
                name
            ))),
            Some(p) if p.type_code.is_numeric() => Ok(name.clone()),
            Some(p) => Err(SdsError::InvalidArgument(format!(
                "property {} of type {} is not numeric",
                name, p.type_code
            ))),
            None => Err(SdsError::InvalidArgument(format!(
                "property {} is not declared by type {}",
                name, definition.name
            ))),
        })
        .collect()
}

/// Summarize `[start, end]` split into `interval_count` sub-intervals.
pub fn summarize(
    series: &Series,
    definition: &TypeDefinition,
    properties: Option<&[String]>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    interval_count: usize,
) -> Result<Vec<SummaryInterval>> {
    if interval_count < 1 {
        return Err(SdsError::InvalidArgument(
            "interval count must be at least 1".to_string(),
        ));
    }
    check_range(start, end)?;
    let properties = resolve_properties(definition, properties)?;

    let intervals = split_interval(start, end, interval_count);
    let last_index = intervals.len() - 1;

    let summaries = intervals
        .into_iter()
        .enumerate()
        .map(|(i, (interval_start, interval_end))| {
            let mut accumulators: BTreeMap<&str, SummaryAccumulator> = properties
                .iter()
                .map(|p| (p.as_str(), SummaryAccumulator::new()))
                .collect();

            let closed = i == last_index;
            let events = series
                .range(interval_start, interval_end)
                .filter(|(key, _)| closed || **key < interval_end);

            for (_, event) in events {
                for (name, accumulator) in accumulators.iter_mut() {
                    if let Some(value) = event.number(name) {
                        accumulator.add(value);
                    }
                }
            }

            SummaryInterval {
                start: interval_start,
                end: interval_end,
                summaries: accumulators
                    .into_iter()
                    .map(|(name, acc)| (name.to_string(), acc.finish()))
                    .collect(),
            }
        })
        .collect();

    Ok(summaries)
}

// =============================================================================
// Tests
// =============================================================================
