// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::CpdError;

/// Memory layout of a flat count buffer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemoryLayout {
    /// Row-major: sample `t` occupies `values[t * d..(t + 1) * d]`.
    #[default]
    CContiguous,
    /// Column-major: symbol `k` occupies `values[k * n..(k + 1) * n]`.
    FContiguous,
}

/// Zero-copy view over an `n × d` matrix of nonnegative counts.
///
/// Rows are time samples, columns are categories. A strictly categorical
/// sequence is a one-hot matrix; aggregated data may hold any count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountMatrixView<'a> {
    values: &'a [u32],
    pub n: usize,
    pub d: usize,
    pub layout: MemoryLayout,
}

impl<'a> CountMatrixView<'a> {
    /// Constructs a validated view. Empty signals and shape mismatches are
    /// rejected here so detectors never re-validate.
    pub fn new(
        values: &'a [u32],
        n: usize,
        d: usize,
        layout: MemoryLayout,
    ) -> Result<Self, CpdError> {
        if n == 0 {
            return Err(CpdError::invalid_input("n must be >= 1"));
        }
        if d == 0 {
            return Err(CpdError::invalid_input("d must be >= 1"));
        }

        let expected_len = n
            .checked_mul(d)
            .ok_or_else(|| CpdError::invalid_input("n*d overflow while validating shape"))?;
        if values.len() != expected_len {
            return Err(CpdError::invalid_input(format!(
                "value length mismatch: got {}, expected {expected_len} (n={n}, d={d})",
                values.len()
            )));
        }

        Ok(Self {
            values,
            n,
            d,
            layout,
        })
    }

    /// Count of symbol `k` at sample `t`.
    ///
    /// Panics when `t >= n` or `k >= d`.
    pub fn get(&self, t: usize, k: usize) -> u32 {
        assert!(
            t < self.n && k < self.d,
            "count index out of bounds: t={t}, k={k}, n={}, d={}",
            self.n,
            self.d
        );
        match self.layout {
            MemoryLayout::CContiguous => self.values[t * self.d + k],
            MemoryLayout::FContiguous => self.values[k * self.n + t],
        }
    }

    /// Sum of all counts in sample `t`.
    pub fn row_total(&self, t: usize) -> u64 {
        (0..self.d).map(|k| u64::from(self.get(t, k))).sum()
    }

    /// True when every row holds counts in `{0, 1}` with at most one nonzero.
    pub fn is_one_hot(&self) -> bool {
        (0..self.n).all(|t| self.row_total(t) <= 1)
    }

    pub fn values(&self) -> &'a [u32] {
        self.values
    }
}

/// Owned row-major count matrix with validating constructors.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "CountMatrixWire"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountMatrix {
    values: Vec<u32>,
    n: usize,
    d: usize,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct CountMatrixWire {
    values: Vec<u32>,
    n: usize,
    d: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<CountMatrixWire> for CountMatrix {
    type Error = CpdError;

    fn try_from(wire: CountMatrixWire) -> Result<Self, Self::Error> {
        Self::from_vec(wire.values, wire.n, wire.d)
    }
}

impl CountMatrix {
    /// Takes ownership of a row-major buffer.
    pub fn from_vec(values: Vec<u32>, n: usize, d: usize) -> Result<Self, CpdError> {
        CountMatrixView::new(&values, n, d, MemoryLayout::CContiguous)?;
        Ok(Self { values, n, d })
    }

    /// Builds a matrix from equally sized rows.
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, CpdError> {
        let Some(first) = rows.first() else {
            return Err(CpdError::invalid_input("n must be >= 1"));
        };
        let d = first.as_ref().len();
        let mut values = Vec::with_capacity(rows.len().saturating_mul(d));
        for (t, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != d {
                return Err(CpdError::invalid_input(format!(
                    "ragged rows: row {t} has {} symbols, expected {d}",
                    row.len()
                )));
            }
            values.extend_from_slice(row);
        }
        Self::from_vec(values, rows.len(), d)
    }

    /// Converts signed row-major data, rejecting negative or oversized counts.
    pub fn from_i64(values: &[i64], n: usize, d: usize) -> Result<Self, CpdError> {
        let mut counts = Vec::with_capacity(values.len());
        for (idx, &value) in values.iter().enumerate() {
            let count = u32::try_from(value).map_err(|_| {
                let (t, k) = (idx / d.max(1), idx % d.max(1));
                if value < 0 {
                    CpdError::invalid_input(format!(
                        "counts must be non-negative; got value={value} at t={t}, k={k}"
                    ))
                } else {
                    CpdError::invalid_input(format!(
                        "count exceeds u32::MAX; got value={value} at t={t}, k={k}"
                    ))
                }
            })?;
            counts.push(count);
        }
        Self::from_vec(counts, n, d)
    }

    /// One-hot encodes a label sequence over `n_symbols` categories.
    pub fn from_labels(labels: &[usize], n_symbols: usize) -> Result<Self, CpdError> {
        if n_symbols == 0 {
            return Err(CpdError::invalid_input("d must be >= 1"));
        }
        let len = labels
            .len()
            .checked_mul(n_symbols)
            .ok_or_else(|| CpdError::invalid_input("n*d overflow while one-hot encoding"))?;
        let mut values = vec![0u32; len];
        for (t, &label) in labels.iter().enumerate() {
            if label >= n_symbols {
                return Err(CpdError::invalid_input(format!(
                    "label {label} at t={t} is out of range for n_symbols={n_symbols}"
                )));
            }
            values[t * n_symbols + label] = 1;
        }
        Self::from_vec(values, labels.len(), n_symbols)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn d(&self) -> usize {
        self.d
    }

    pub fn view(&self) -> CountMatrixView<'_> {
        CountMatrixView {
            values: &self.values,
            n: self.n,
            d: self.d,
            layout: MemoryLayout::CContiguous,
        }
    }
}
