// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{CpdError, Diagnostics};

/// Path entry marking "no predecessor" at index 0.
pub const PATH_SENTINEL: usize = usize::MAX;

/// Back-pointer vector of an optimal segmentation.
///
/// Entry `t` is the start of the last segment in the optimal segmentation of
/// `[0, t)`; entry 0 is [`PATH_SENTINEL`]. Every other entry is strictly less
/// than its position, so following the chain from `n` always reaches 0.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "ChangePointPathWire"))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangePointPath {
    entries: Vec<usize>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct ChangePointPathWire {
    entries: Vec<usize>,
}

#[cfg(feature = "serde")]
impl TryFrom<ChangePointPathWire> for ChangePointPath {
    type Error = CpdError;

    fn try_from(wire: ChangePointPathWire) -> Result<Self, Self::Error> {
        Self::from_entries(wire.entries)
    }
}

impl ChangePointPath {
    /// Validates and wraps raw back-pointers.
    pub fn from_entries(entries: Vec<usize>) -> Result<Self, CpdError> {
        if entries.len() < 2 {
            return Err(CpdError::invalid_input(format!(
                "path must cover at least one sample; got {} entries",
                entries.len()
            )));
        }
        if entries[0] != PATH_SENTINEL {
            return Err(CpdError::invalid_input(format!(
                "path[0] must be the sentinel; got {}",
                entries[0]
            )));
        }
        for (t, &tau) in entries.iter().enumerate().skip(1) {
            if tau >= t {
                return Err(CpdError::invalid_input(format!(
                    "invalid path: predecessor tau={tau} is not < t={t}"
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Number of samples covered (`len - 1`).
    pub fn n(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.entries
    }

    /// Start of the last segment ending at `t`, `None` at the sentinel.
    pub fn predecessor(&self, t: usize) -> Option<usize> {
        match self.entries.get(t).copied() {
            Some(PATH_SENTINEL) | None => None,
            Some(tau) => Some(tau),
        }
    }

    /// Segment end indices of the optimal segmentation of `[0, n)`, in
    /// increasing order, terminal `n` included.
    pub fn breakpoints(&self) -> Vec<usize> {
        let n = self.n();
        let mut reverse = vec![n];
        let mut cursor = self.entries[n];
        while cursor != PATH_SENTINEL && cursor > 0 {
            reverse.push(cursor);
            cursor = self.entries[cursor];
        }
        reverse.reverse();
        reverse
    }

    /// Interior change points (breakpoints without the terminal `n`).
    pub fn change_points(&self) -> Vec<usize> {
        let mut breakpoints = self.breakpoints();
        breakpoints.pop();
        breakpoints
    }

    /// Integer array with `-1` as the sentinel.
    pub fn to_signed(&self) -> Vec<i64> {
        self.entries
            .iter()
            .map(|&tau| {
                if tau == PATH_SENTINEL {
                    -1
                } else {
                    // entries index an allocated Vec, so they fit in i64
                    tau as i64
                }
            })
            .collect()
    }

    pub fn into_entries(self) -> Vec<usize> {
        self.entries
    }
}

/// Checks the breakpoint contract: non-empty, strictly increasing, positive,
/// terminal `n` last.
pub fn validate_breakpoints(n: usize, breakpoints: &[usize]) -> Result<(), CpdError> {
    let Some(&last) = breakpoints.last() else {
        return Err(CpdError::invalid_input("breakpoints must not be empty"));
    };
    if last != n {
        return Err(CpdError::invalid_input(format!(
            "last breakpoint must equal n={n}; got {last}"
        )));
    }
    if breakpoints[0] == 0 {
        return Err(CpdError::invalid_input("breakpoints must be > 0"));
    }
    if let Some(window) = breakpoints.windows(2).find(|w| w[0] >= w[1]) {
        return Err(CpdError::invalid_input(format!(
            "breakpoints must be strictly increasing; got {} then {}",
            window[0], window[1]
        )));
    }
    Ok(())
}

/// Half-open `[start, end)` segments described by validated breakpoints.
pub fn segments_from_breakpoints(breakpoints: &[usize]) -> Vec<(usize, usize)> {
    let mut start = 0;
    breakpoints
        .iter()
        .map(|&end| {
            let segment = (start, end);
            start = end;
            segment
        })
        .collect()
}

/// Full output of an offline segmentation run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "OfflineChangePointResultWire"))]
#[derive(Clone, Debug, PartialEq)]
pub struct OfflineChangePointResult {
    pub breakpoints: Vec<usize>,
    pub change_points: Vec<usize>,
    pub path: ChangePointPath,
    /// `sum_of_costs[t]` is the minimal penalized cost of `[0, t)`.
    pub sum_of_costs: Vec<f64>,
    /// Minimal penalized cost of the whole signal.
    pub objective: f64,
    pub diagnostics: Diagnostics,
}

/// Serialized form; derived fields are checked against the path on load.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct OfflineChangePointResultWire {
    breakpoints: Vec<usize>,
    change_points: Vec<usize>,
    path: ChangePointPath,
    sum_of_costs: Vec<f64>,
    diagnostics: Diagnostics,
}

#[cfg(feature = "serde")]
impl TryFrom<OfflineChangePointResultWire> for OfflineChangePointResult {
    type Error = CpdError;

    fn try_from(wire: OfflineChangePointResultWire) -> Result<Self, Self::Error> {
        let result = Self::new(wire.path, wire.sum_of_costs, wire.diagnostics)?;
        if result.breakpoints != wire.breakpoints || result.change_points != wire.change_points {
            return Err(CpdError::invalid_input(format!(
                "breakpoints {:?} / change_points {:?} do not match the path; expected {:?} / {:?}",
                wire.breakpoints, wire.change_points, result.breakpoints, result.change_points
            )));
        }
        Ok(result)
    }
}

impl OfflineChangePointResult {
    pub fn new(
        path: ChangePointPath,
        sum_of_costs: Vec<f64>,
        diagnostics: Diagnostics,
    ) -> Result<Self, CpdError> {
        if sum_of_costs.len() != path.len() {
            return Err(CpdError::invalid_input(format!(
                "sum_of_costs length {} does not match path length {}",
                sum_of_costs.len(),
                path.len()
            )));
        }
        if sum_of_costs[0] != 0.0 {
            return Err(CpdError::invalid_input(format!(
                "sum_of_costs[0] must be 0; got {}",
                sum_of_costs[0]
            )));
        }

        let breakpoints = path.breakpoints();
        validate_breakpoints(path.n(), &breakpoints)?;
        let change_points = path.change_points();
        let objective = sum_of_costs[path.n()];

        Ok(Self {
            breakpoints,
            change_points,
            path,
            sum_of_costs,
            objective,
            diagnostics,
        })
    }

    pub fn segments(&self) -> Vec<(usize, usize)> {
        segments_from_breakpoints(&self.breakpoints)
    }
}
