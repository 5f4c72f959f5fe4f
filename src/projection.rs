//! Boundary between observed data and projections.
//!
//! The projected part of a series is recognized in two ways:
//! - it is NAN padded, and the last observed value marks the boundary
//!   (`last_observed_index`), or
//! - the observed series and the projected one coincide up to the boundary
//!   (`first_divergent_index`, e.g. the mean and the upper bound of the deaths).

use crate::MetricTable;
use log::debug;

/// Last index whose value is not NAN, scanning from the end.
/// None for an empty or all NAN series.
pub fn last_observed_index(values: &[f64]) -> Option<usize> {
    debug!("last_observed_index over {} values", values.len());
    values.iter().rposition(|v| !v.is_nan())
}

/// First index where the two series differ; NAN differs from everything.
/// None when they coincide everywhere. If one is a strict prefix of the other,
/// the length of the shorter one is the first divergent index.
pub fn first_divergent_index(a: &[f64], b: &[f64]) -> Option<usize> {
    debug!("first_divergent_index over {} and {} values", a.len(), b.len());
    match a.iter().zip(b.iter()).position(|(x, y)| x != y) {
        Some(i) => Some(i),
        None if a.len() != b.len() => Some(a.len().min(b.len())),
        None => None,
    }
}

/// Drops the projected rows when projections are not wanted.
/// Returns the boundary still to be marked on the chart, if any.
pub fn cut_projections<const N: usize>(
    table: &mut MetricTable<N>,
    boundary: Option<usize>,
    projections: bool,
) -> Option<usize> {
    match boundary {
        Some(i) if !projections => {
            table.truncate(i);
            None
        }
        Some(i) if i < table.len() => Some(i),
        _ => None,
    }
}
