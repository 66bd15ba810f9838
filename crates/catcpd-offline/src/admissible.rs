// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use catcpd_core::CpdError;

/// Candidate last-changepoint indices still able to start an optimal final
/// segment, kept strictly increasing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdmissibleSet {
    indices: Vec<usize>,
}

impl Default for AdmissibleSet {
    fn default() -> Self {
        Self::new()
    }
}

impl AdmissibleSet {
    /// A set holding only index 0.
    pub fn new() -> Self {
        Self { indices: vec![0] }
    }

    /// A set holding only index 0, with room reserved for `capacity` members.
    ///
    /// Allocation failure is reported as [`CpdError::ResourceLimit`].
    pub fn try_with_capacity(capacity: usize) -> Result<Self, CpdError> {
        let mut indices = Vec::new();
        indices.try_reserve_exact(capacity.max(1)).map_err(|err| {
            CpdError::resource_limit(format!(
                "failed to allocate admissible set of {capacity} entries: {err}"
            ))
        })?;
        indices.push(0);
        Ok(Self { indices })
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.indices
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Appends an index larger than every member.
    pub fn push(&mut self, index: usize) {
        assert!(
            self.indices.last().is_none_or(|&last| last < index),
            "admissible indices must be strictly increasing; got {index} after {:?}",
            self.indices.last()
        );
        self.indices.push(index);
    }

    /// Scans members in order, keeping those for which `keep` returns `true`.
    ///
    /// `keep` receives the scan position, the member scanned just before this
    /// one (whether or not it was kept), and the member itself. Returns the
    /// number of removed members. On error the unscanned tail is kept.
    pub fn try_retain_scan<E, F>(&mut self, mut keep: F) -> Result<usize, E>
    where
        F: FnMut(usize, Option<usize>, usize) -> Result<bool, E>,
    {
        let len = self.indices.len();
        let mut write = 0;
        let mut previous = None;

        for read in 0..len {
            let index = self.indices[read];
            match keep(read, previous, index) {
                Ok(true) => {
                    self.indices[write] = index;
                    write += 1;
                }
                Ok(false) => {}
                Err(err) => {
                    self.indices.copy_within(read.., write);
                    self.indices.truncate(write + (len - read));
                    return Err(err);
                }
            }
            previous = Some(index);
        }

        self.indices.truncate(write);
        Ok(len - write)
    }
}

#[cfg(test)]
mod tests {
    use super::AdmissibleSet;
    use catcpd_core::CpdError;

    fn set_of(indices: &[usize]) -> AdmissibleSet {
        let mut set = AdmissibleSet::new();
        for &index in indices {
            set.push(index);
        }
        set
    }

    #[test]
    fn new_set_holds_origin_only() {
        let set = AdmissibleSet::new();
        assert_eq!(set.as_slice(), &[0]);
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
        assert_eq!(
            AdmissibleSet::try_with_capacity(0).expect("small reservation succeeds"),
            set
        );
    }

    #[test]
    fn oversized_reservation_is_a_resource_limit() {
        let err = AdmissibleSet::try_with_capacity(usize::MAX)
            .expect_err("reservation past isize::MAX bytes must fail");
        assert!(matches!(err, CpdError::ResourceLimit(_)));
        assert!(err.to_string().contains("admissible set"));
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    fn push_rejects_non_increasing_index() {
        let mut set = set_of(&[2]);
        set.push(2);
    }

    #[test]
    fn retain_scan_reports_previous_scanned_member_even_when_removed() {
        let mut set = set_of(&[1, 2, 3, 4]);
        let mut seen = vec![];

        let removed = set
            .try_retain_scan::<(), _>(|position, previous, index| {
                seen.push((position, previous, index));
                Ok(index % 2 == 0)
            })
            .expect("infallible keep");

        assert_eq!(removed, 2);
        assert_eq!(set.as_slice(), &[0, 2, 4]);
        assert_eq!(
            seen,
            vec![
                (0, None, 0),
                (1, Some(0), 1),
                (2, Some(1), 2),
                (3, Some(2), 3),
                (4, Some(3), 4),
            ]
        );
    }

    #[test]
    fn retain_scan_error_keeps_unscanned_tail() {
        let mut set = set_of(&[1, 2, 3, 4]);
        let err = set
            .try_retain_scan(|_, _, index| match index {
                1 => Ok(false),
                3 => Err("stop"),
                _ => Ok(true),
            })
            .expect_err("keep error should propagate");

        assert_eq!(err, "stop");
        assert_eq!(set.as_slice(), &[0, 2, 3, 4]);
    }

    #[test]
    fn iter_visits_members_in_order() {
        let set = set_of(&[3, 7]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 3, 7]);
    }
}
