use ndarray::{Array2, ArrayView2};

use crate::model::config::ConfigError;

/// Immutable table of pose assignments, one candidate per row. Entry
/// `[j, k]` is the view index candidate `j` pairs with pose slot `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewpointCandidateTable {
    rows: Array2<usize>,
}

impl ViewpointCandidateTable {
    /// Builds the table from raw signed indices (as stored in `.npy`),
    /// rejecting anything outside `[0, num_views)`.
    pub fn from_raw(raw: ArrayView2<'_, i64>) -> Result<Self, ConfigError> {
        let (n_candidates, num_views) = raw.dim();
        if n_candidates == 0 || num_views == 0 {
            return Err(ConfigError::EmptyCandidateTable);
        }
        let mut rows = Array2::<usize>::zeros((n_candidates, num_views));
        for ((row, column), &value) in raw.indexed_iter() {
            if value < 0 || value as usize >= num_views {
                return Err(ConfigError::CandidateIndex {
                    row,
                    column,
                    value,
                    num_views,
                });
            }
            rows[[row, column]] = value as usize;
        }
        Ok(Self { rows })
    }

    pub fn num_candidates(&self) -> usize {
        self.rows.nrows()
    }

    pub fn num_views(&self) -> usize {
        self.rows.ncols()
    }

    pub fn assignments(&self) -> ArrayView2<'_, usize> {
        self.rows.view()
    }

    pub fn expect_views(&self, expected: usize) -> Result<(), ConfigError> {
        if self.num_views() != expected {
            return Err(ConfigError::CandidateViews {
                expected,
                actual: self.num_views(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/candidates.rs"]
mod tests;
