// Copyright (c) 2024 <Wei Li>.
//
// This source code is licensed under the GNU license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::slice;

use crate::util::bit_vec::{BitIter, BitVec, Idx};

const SMALL_SET_CAPACITY: usize = 32;

pub trait PointsToSet<T> {
    type Iter<'a>: Iterator<Item = T>
    where
        Self: 'a;

    fn new() -> Self;
    fn clear(&mut self);
    fn count(&self) -> usize;
    fn contains(&self, elem: T) -> bool;
    fn is_empty(&self) -> bool;
    fn superset(&self, other: &Self) -> bool;
    fn intersects(&self, other: &Self) -> bool;
    fn insert(&mut self, elem: T) -> bool;
    fn union(&mut self, other: &Self) -> bool;
    fn iter<'a>(&'a self) -> Self::Iter<'a>;
}

/// Hybrid implementation of points to set,
/// which uses an explicit array for small sets, and a bit vector for large sets.
///
/// Equality is set equality: two sets built in different insertion orders, or
/// one small and one large, compare equal when they hold the same elements.
#[derive(Clone)]
pub struct HybridPointsToSet<T> {
    points_to: HybridSet<T>,
}

impl<T: Idx> fmt::Debug for HybridPointsToSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.points_to.fmt(f)
    }
}

impl<T: Idx> Default for HybridPointsToSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Idx> PartialEq for HybridPointsToSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.count() == other.count() && self.superset(other)
    }
}

impl<T: Idx> Eq for HybridPointsToSet<T> {}

impl<'a, T: Idx> IntoIterator for &'a HybridPointsToSet<T> {
    type Item = T;
    type IntoIter = HybridIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Idx> FromIterator<T> for HybridPointsToSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for elem in iter {
            set.insert(elem);
        }
        set
    }
}

impl<T: Idx> PointsToSet<T> for HybridPointsToSet<T> {
    fn new() -> Self {
        HybridPointsToSet {
            points_to: HybridSet::new(),
        }
    }

    fn clear(&mut self) {
        self.points_to.clear();
    }

    fn count(&self) -> usize {
        self.points_to.count()
    }

    fn contains(&self, elem: T) -> bool {
        self.points_to.contains(elem)
    }

    fn is_empty(&self) -> bool {
        self.points_to.is_empty()
    }

    /// Is `self` is a superset of `other`?
    fn superset(&self, other: &HybridPointsToSet<T>) -> bool {
        self.points_to.superset(&other.points_to)
    }

    /// Do the two sets share at least one element?
    fn intersects(&self, other: &HybridPointsToSet<T>) -> bool {
        self.points_to.intersects(&other.points_to)
    }

    /// Adds `elem` to this set, returns true if n was not already in this set.
    fn insert(&mut self, elem: T) -> bool {
        self.points_to.insert(elem)
    }

    fn union(&mut self, other: &HybridPointsToSet<T>) -> bool {
        self.points_to.union(&other.points_to)
    }

    type Iter<'a> = HybridIter<'a, T>;
    fn iter(&self) -> HybridIter<'_, T> {
        self.points_to.iter()
    }
}

#[derive(Clone)]
pub enum HybridSet<T> {
    SmallSet(Vec<T>),
    LargeSet(BitVec<T>),
}

impl<T: Idx> fmt::Debug for HybridSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SmallSet(s) => f.debug_set().entries(s.iter()).finish(),
            Self::LargeSet(s) => s.fmt(f),
        }
    }
}

impl<T: Idx> HybridSet<T> {
    pub fn new() -> Self {
        HybridSet::SmallSet(Vec::new())
    }

    pub fn clear(&mut self) {
        match self {
            HybridSet::SmallSet(small) => small.clear(),
            HybridSet::LargeSet(_) => *self = HybridSet::SmallSet(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            HybridSet::SmallSet(small) => small.len(),
            HybridSet::LargeSet(large) => large.count(),
        }
    }

    pub fn contains(&self, elem: T) -> bool {
        match self {
            HybridSet::SmallSet(small) => small.contains(&elem),
            HybridSet::LargeSet(large) => large.contains(elem),
        }
    }

    pub fn superset(&self, other: &HybridSet<T>) -> bool {
        match (self, other) {
            (HybridSet::LargeSet(self_large), HybridSet::LargeSet(other_large)) => {
                self_large.superset(other_large)
            }
            _ => other.iter().all(|elem| self.contains(elem)),
        }
    }

    pub fn intersects(&self, other: &HybridSet<T>) -> bool {
        match (self, other) {
            (HybridSet::LargeSet(self_large), HybridSet::LargeSet(other_large)) => {
                self_large.intersects(other_large)
            }
            // Probe the large side with the elements of the small one.
            (HybridSet::LargeSet(_), HybridSet::SmallSet(_)) => {
                other.iter().any(|elem| self.contains(elem))
            }
            _ => self.iter().any(|elem| other.contains(elem)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            HybridSet::SmallSet(small) => small.is_empty(),
            HybridSet::LargeSet(large) => large.is_empty(),
        }
    }

    /// Adds `elem` to this set, returns true if n was not already in this set.
    pub fn insert(&mut self, elem: T) -> bool {
        match self {
            HybridSet::SmallSet(small) if small.contains(&elem) => false,
            HybridSet::SmallSet(small) if small.len() < SMALL_SET_CAPACITY => {
                small.push(elem);
                true
            }
            HybridSet::SmallSet(small) => {
                // Full: migrate to a bit vector.
                let mut large = BitVec::new_empty();
                for elem in small.iter() {
                    large.insert(*elem);
                }
                let changed = large.insert(elem);
                *self = HybridSet::LargeSet(large);
                changed
            }
            HybridSet::LargeSet(large) => large.insert(elem),
        }
    }

    pub fn iter(&self) -> HybridIter<'_, T> {
        match self {
            HybridSet::SmallSet(small) => HybridIter::SmallIter(small.iter()),
            HybridSet::LargeSet(large) => HybridIter::LargeIter(large.iter()),
        }
    }

    pub fn union(&mut self, other: &HybridSet<T>) -> bool {
        match self {
            HybridSet::LargeSet(self_large) => match other {
                HybridSet::LargeSet(other_large) => self_large.union(other_large),
                HybridSet::SmallSet(other_small) => {
                    let mut changed = false;
                    for elem in other_small.iter() {
                        changed |= self_large.insert(*elem);
                    }
                    changed
                }
            },
            HybridSet::SmallSet(self_small) => match other {
                HybridSet::LargeSet(other_large) => {
                    let mut self_large = BitVec::new_empty();
                    for elem in self_small.iter() {
                        self_large.insert(*elem);
                    }
                    let changed = self_large.union(other_large);
                    *self = HybridSet::LargeSet(self_large);
                    changed
                }
                HybridSet::SmallSet(other_small) => {
                    let mut changed = false;
                    for &elem in other_small.iter() {
                        changed |= self.insert(elem);
                    }
                    changed
                }
            },
        }
    }
}

pub enum HybridIter<'a, T: Idx> {
    SmallIter(slice::Iter<'a, T>),
    LargeIter(BitIter<'a, T>),
}

impl<'a, T: Idx> Iterator for HybridIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        match self {
            HybridIter::SmallIter(small) => small.next().copied(),
            HybridIter::LargeIter(large) => large.next(),
        }
    }
}

#[cfg(test)]
mod test {
    use rand::Rng;
    use std::collections::HashSet;

    use crate::pts_set::points_to::{HybridPointsToSet, HybridSet, PointsToSet, SMALL_SET_CAPACITY};

    fn random_set(len: usize) -> HashSet<u32> {
        let mut rng = rand::thread_rng();
        let mut set = HashSet::new();
        while set.len() < len {
            set.insert(rng.gen_range(1..1000));
        }
        set
    }

    fn to_pts(set: &HashSet<u32>) -> HybridPointsToSet<u32> {
        set.iter().copied().collect()
    }

    #[test]
    fn small_set_stays_small() {
        let rand_set = random_set(8);
        let small_set = to_pts(&rand_set);
        assert_eq!(small_set.count(), 8);
        assert!(matches!(small_set.points_to, HybridSet::SmallSet(_)));
        assert_eq!(small_set.iter().collect::<HashSet<_>>(), rand_set);
        let mut again = small_set.clone();
        assert!(!again.insert(*rand_set.iter().next().unwrap()));
        assert_eq!(again.count(), 8);
    }

    #[test]
    fn large_set_migrates_to_bit_vector() {
        let rand_set = random_set(SMALL_SET_CAPACITY + 3);
        let large_set = to_pts(&rand_set);
        assert_eq!(large_set.count(), SMALL_SET_CAPACITY + 3);
        assert!(matches!(large_set.points_to, HybridSet::LargeSet(_)));
        assert_eq!(large_set.iter().collect::<HashSet<_>>(), rand_set);
        assert!(rand_set.iter().all(|x| large_set.contains(*x)));
    }

    #[test]
    fn union_across_representations() {
        let rand_small = random_set(8);
        let rand_large = random_set(SMALL_SET_CAPACITY + 3);
        let expected = rand_small.union(&rand_large).copied().collect::<HashSet<_>>();

        let mut small_first = to_pts(&rand_small);
        small_first.union(&to_pts(&rand_large));
        assert_eq!(small_first.iter().collect::<HashSet<_>>(), expected);
        assert!(small_first.superset(&to_pts(&rand_small)));
        assert!(small_first.superset(&to_pts(&rand_large)));

        let mut large_first = to_pts(&rand_large);
        large_first.union(&to_pts(&rand_small));
        assert_eq!(large_first, small_first);
    }

    #[test]
    fn equality_ignores_order_and_representation() {
        let a: HybridPointsToSet<u32> = [5, 1, 9].into_iter().collect();
        let b: HybridPointsToSet<u32> = [9, 5, 1].into_iter().collect();
        assert_eq!(a, b);

        let rand_set = random_set(SMALL_SET_CAPACITY + 1);
        let large = to_pts(&rand_set);
        let mut sorted = rand_set.iter().copied().collect::<Vec<_>>();
        sorted.sort_unstable();
        let mut rebuilt = HybridPointsToSet::new();
        for x in sorted.into_iter().rev() {
            rebuilt.insert(x);
        }
        assert_eq!(large, rebuilt);
        assert_ne!(a, large);
    }

    #[test]
    fn intersects_test() {
        let rand_small = random_set(8);
        let mut rand_large = random_set(SMALL_SET_CAPACITY + 3);
        let small = to_pts(&rand_small);
        let disjoint: HybridPointsToSet<u32> = [1000, 1001].into_iter().collect();
        assert!(!small.intersects(&disjoint));
        assert!(!disjoint.intersects(&small));

        rand_large.insert(*rand_small.iter().next().unwrap());
        let large = to_pts(&rand_large);
        assert!(small.intersects(&large));
        assert!(large.intersects(&small));
        assert!(large.intersects(&large));
        assert!(!HybridPointsToSet::<u32>::new().intersects(&large));
    }
}
