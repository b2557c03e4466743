use tracing::debug;

use crate::domain::types::LocationId;
use crate::error::DataError;

const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Symmetric travel distances (miles) between locations, read-only once built.
#[derive(Debug, Clone)]
pub struct DistanceIndex {
    size: usize,
    data: Vec<f64>,
}

impl DistanceIndex {
    /// Builds the index from a table where either triangle may be blank.
    ///
    /// For every unordered pair at least one of the two cells must hold a
    /// value; if both do, they must agree. The diagonal is always zero.
    pub fn from_cells(cells: &[Vec<Option<f64>>], expected: usize) -> Result<Self, DataError> {
        if cells.len() != expected {
            return Err(DataError::MatrixShape {
                rows: cells.len(),
                expected,
            });
        }

        let cell = |i: usize, j: usize| cells[i].get(j).copied().flatten();
        let mut data = vec![0.0; expected * expected];

        for i in 0..expected {
            for j in (i + 1)..expected {
                let value = match (cell(i, j), cell(j, i)) {
                    (Some(a), Some(b)) if (a - b).abs() > SYMMETRY_TOLERANCE => {
                        return Err(DataError::AsymmetricDistance(i, j))
                    }
                    (Some(a), _) | (None, Some(a)) => a,
                    (None, None) => return Err(DataError::MissingDistance(i, j)),
                };
                if !value.is_finite() || value < 0.0 {
                    return Err(DataError::InvalidDistance(i, j));
                }
                data[i * expected + j] = value;
                data[j * expected + i] = value;
            }
        }

        debug!("Distance index built for {} locations", expected);
        Ok(Self {
            size: expected,
            data,
        })
    }

    /// Builds the index from a dense square matrix.
    pub fn from_matrix(rows: &[Vec<f64>]) -> Result<Self, DataError> {
        let cells: Vec<Vec<Option<f64>>> = rows
            .iter()
            .map(|row| row.iter().map(|&d| Some(d)).collect())
            .collect();
        Self::from_cells(&cells, rows.len())
    }

    /// Distance between two locations, in either order.
    ///
    /// Panics if either location is outside the index; locations are
    /// checked against the address book before planning.
    pub fn distance(&self, from: LocationId, to: LocationId) -> f64 {
        assert!(
            from < self.size && to < self.size,
            "location out of range: {from}, {to} (size {})",
            self.size
        );
        self.data[from * self.size + to]
    }

    pub fn size(&self) -> usize {
        self.size
    }
}
