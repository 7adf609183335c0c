//! Dense remapping of sparse external identifiers.
//!
//! Several source formats number vertices and cells with arbitrary,
//! possibly non-contiguous integers. [`DenseIdMap`] builds a deterministic
//! bijection from the identifiers actually referenced by surviving elements
//! onto `0..N`, assigning indices in ascending external-id order. Ids present
//! in the source but never referenced are simply not inserted and therefore
//! never emitted.

use std::collections::BTreeMap;

/// Bijection from external identifiers to dense zero-based indices.
///
/// Indices are assigned in ascending order of the external identifier, so
/// the mapping is reproducible regardless of insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DenseIdMap {
    map: BTreeMap<u64, usize>,
}

impl DenseIdMap {
    /// Build a map over the given identifiers. Duplicates collapse.
    pub fn from_ids<I: IntoIterator<Item = u64>>(ids: I) -> Self {
        let mut map: BTreeMap<u64, usize> = ids.into_iter().map(|id| (id, 0)).collect();
        for (index, slot) in map.values_mut().enumerate() {
            *slot = index;
        }
        Self { map }
    }

    /// Dense index assigned to `id`, or `None` if it was never referenced.
    pub fn index_of(&self, id: u64) -> Option<usize> {
        self.map.get(&id).copied()
    }

    /// Number of mapped identifiers.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate `(external id, dense index)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, usize)> + '_ {
        self.map.iter().map(|(&id, &index)| (id, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn assigns_ascending_dense_indices() {
        let map = DenseIdMap::from_ids([42, 7, 1000, 7]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.index_of(7), Some(0));
        assert_eq!(map.index_of(42), Some(1));
        assert_eq!(map.index_of(1000), Some(2));
        assert_eq!(map.index_of(8), None);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = DenseIdMap::from_ids([3, 1, 2]);
        let b = DenseIdMap::from_ids([2, 3, 1]);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn dense_ascending_bijection(ids in prop::collection::vec(0u64..10_000, 0..200)) {
            let map = DenseIdMap::from_ids(ids.iter().copied());
            let pairs: Vec<_> = map.iter().collect();
            // Indices cover 0..len exactly once, in ascending id order.
            for (expected, window) in pairs.windows(2).enumerate() {
                prop_assert!(window[0].0 < window[1].0);
                prop_assert_eq!(window[0].1, expected);
            }
            if let Some(&(_, last)) = pairs.last() {
                prop_assert_eq!(last, map.len() - 1);
            }
            for &id in &ids {
                prop_assert!(map.index_of(id).is_some());
            }
        }
    }
}
