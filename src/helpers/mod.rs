//! Reportable helpers
//!
//! Callers supply an ordered list of helpers; the integration engine may
//! append its own (for example to cache delayed terms) while preparing. Only
//! the caller's helpers are reported back, and they always form a prefix of
//! the final helper list.

use crate::model::Helper;

/// Names of the first `n_reportable` helpers, in declaration order.
///
/// # Panics
///
/// Panics if `n_reportable` exceeds `all_helpers.len()`.
pub fn helper_names(all_helpers: &[Helper], n_reportable: usize) -> Vec<String> {
    all_helpers[..n_reportable]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Tracks how many helpers belong to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HelperRegistry {
    reportable: usize,
}

impl HelperRegistry {
    /// Record the caller-supplied helpers, before any engine-side additions
    pub fn new(helpers: &[Helper]) -> Self {
        Self {
            reportable: helpers.len(),
        }
    }

    /// Number of reportable helpers
    pub fn len(&self) -> usize {
        self.reportable
    }

    pub fn is_empty(&self) -> bool {
        self.reportable == 0
    }

    pub fn names(&self, all_helpers: &[Helper]) -> Vec<String> {
        helper_names(all_helpers, self.reportable)
    }

    /// The reportable prefix of the engine's helper values, or `None` if the
    /// engine reported fewer values than there are reportable helpers
    pub fn values(&self, all_values: &[f64]) -> Option<Vec<f64>> {
        all_values.get(..self.reportable).map(<[f64]>::to_vec)
    }

    /// Whether `after` still starts with the names of `before`'s reportable prefix
    pub fn prefix_preserved(&self, before: &[Helper], after: &[Helper]) -> bool {
        after.len() >= self.reportable
            && before[..self.reportable]
                .iter()
                .zip(after)
                .all(|(a, b)| a.name == b.name)
    }
}
