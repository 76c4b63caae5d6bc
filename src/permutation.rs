use std::fmt;
use std::ops::Index;

use itertools::Itertools;
use thiserror::Error;

/// Error type for constructing or applying a [`Permutation`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PermutationError {
    /// The input had out of bounds values.
    /// This could also be consider a `NotSurjective` error, but is differentiated for convenience.
    #[error("permutation image out of bounds")]
    OutOfBounds,
    /// The input had duplicate values.
    #[error("permutation is not injective")]
    NotInjective,
    /// The input did not cover all values.
    #[error("permutation is not surjective")]
    NotSurjective,
    /// The items were defined for different domains (different number of points).
    #[error("permutation degree does not match the target")]
    DifferentDegree,
}

/// A permutation of the points `0..n`.
///
/// Point `i` is mapped to `perm[i]`; when used as a vertex relabeling rule, vertex `i` of a graph becomes vertex `perm[i]`.
///
/// Arbitrary permutations can be constructed directly via [`Permutation::try_from`], which checks the bijection constraints.
///
/// [`Eq`] is implemented to check that both the degree (number of points) and mappings are equivalent.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Permutation(Vec<usize>);
impl Permutation {
    /// Returns the identity permutation on `0..degree`.
    pub fn identity(degree: usize) -> Self {
        Self((0..degree).collect())
    }
    /// Wraps a mapping that is already known to be a bijection.
    pub(crate) fn from_raw(map: Vec<usize>) -> Self {
        debug_assert!(Self::try_from(map.clone()).is_ok());
        Self(map)
    }
    /// Builds a permutation on `0..degree` from a list of cycles.
    /// Each cycle `[a, b, c]` maps `a -> b -> c -> a`; points not mentioned are fixed.
    /// Fails if a point is out of bounds or appears twice.
    pub fn from_cycles(degree: usize, cycles: &[&[usize]]) -> Result<Self, PermutationError> {
        let mut map: Vec<usize> = (0..degree).collect();
        let mut seen = vec![false; degree];
        for cycle in cycles {
            for &p in cycle.iter() {
                if p >= degree { return Err(PermutationError::OutOfBounds); }
                if seen[p] { return Err(PermutationError::NotInjective); }
                seen[p] = true;
            }
            for (&a, &b) in cycle.iter().circular_tuple_windows() {
                map[a] = b;
            }
        }
        Ok(Self(map))
    }

    /// Returns the number of points the permutation is defined over, being `0..degree()`.
    pub fn degree(&self) -> usize {
        self.0.len()
    }
    /// Returns the image of `point`.
    pub fn apply(&self, point: usize) -> usize {
        self.0[point]
    }
    /// Iterates over all the output values of the permutation.
    /// To get the input values as well, wrap it in `enumerate()`.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(i, &v)| i == v)
    }
    /// Returns the smallest point that is not fixed, if any.
    pub fn first_moved(&self) -> Option<usize> {
        self.0.iter().enumerate().position(|(i, &v)| i != v)
    }
    /// Iterates (in ascending order) over the points that are not fixed.
    pub fn moved_points(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().filter(|(i, v)| i != *v).map(|(i, _)| i)
    }
    pub fn fixes(&self, point: usize) -> bool {
        self.0[point] == point
    }

    pub fn inverse(&self) -> Self {
        let mut inv = vec![0; self.0.len()];
        for (i, &v) in self.0.iter().enumerate() {
            inv[v] = i;
        }
        Self(inv)
    }
    /// Composes left to right: the result applies `self` first, then `next`.
    ///
    /// # Panics
    ///
    /// Panics if the two permutations have different degrees.
    pub fn then(&self, next: &Self) -> Self {
        assert_eq!(self.degree(), next.degree(), "composing permutations of different degree");
        Self(self.0.iter().map(|&v| next.0[v]).collect())
    }

    /// Returns the non-trivial cycles, each starting at its smallest point, ordered by that point.
    pub fn cycles(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.degree()];
        let mut res = vec![];
        for start in 0..self.degree() {
            if seen[start] || self.fixes(start) { continue }
            let mut cycle = vec![];
            let mut p = start;
            while !seen[p] {
                seen[p] = true;
                cycle.push(p);
                p = self.0[p];
            }
            res.push(cycle);
        }
        res
    }
}
impl Index<usize> for Permutation {
    type Output = usize;
    fn index(&self, index: usize) -> &usize {
        &self.0[index]
    }
}
impl TryFrom<Vec<usize>> for Permutation {
    type Error = PermutationError;
    fn try_from(val: Vec<usize>) -> Result<Self, Self::Error> {
        let mut flags = vec![false; val.len()];
        for &v in val.iter() {
            if v >= val.len() { return Err(PermutationError::OutOfBounds); }
            if flags[v] { return Err(PermutationError::NotInjective); }
            flags[v] = true;
        }
        if flags.into_iter().any(|v| !v) { return Err(PermutationError::NotSurjective); }
        Ok(Self(val))
    }
}
impl fmt::Debug for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
/// Cycle notation, e.g. `(0 1)(2 4 3)`; the identity is written `()`.
impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cycles = self.cycles();
        if cycles.is_empty() { return write!(f, "()"); }
        for cycle in cycles {
            write!(f, "({})", cycle.iter().join(" "))?;
        }
        Ok(())
    }
}

#[test]
fn test_try_from() {
    assert_eq!(Permutation::try_from(vec![2, 0, 1]).unwrap().as_slice(), &[2, 0, 1]);
    assert_eq!(Permutation::try_from(vec![0, 3, 1]), Err(PermutationError::OutOfBounds));
    assert_eq!(Permutation::try_from(vec![0, 0, 1]), Err(PermutationError::NotInjective));
    assert!(Permutation::try_from(vec![]).unwrap().is_identity());
}
#[test]
fn test_compose_inverse() {
    let a = Permutation::try_from(vec![1, 2, 0, 3]).unwrap();
    let b = Permutation::try_from(vec![0, 1, 3, 2]).unwrap();
    let ab = a.then(&b);
    for x in 0..4 {
        assert_eq!(ab[x], b[a[x]]);
    }
    assert!(a.then(&a.inverse()).is_identity());
    assert!(a.inverse().then(&a).is_identity());
    assert_eq!(a.first_moved(), Some(0));
    assert_eq!(b.first_moved(), Some(2));
    assert_eq!(b.moved_points().collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(Permutation::identity(4).first_moved(), None);
}
#[test]
fn test_cycles() {
    let p = Permutation::from_cycles(6, &[&[0, 1], &[2, 4, 3]]).unwrap();
    assert_eq!(p.as_slice(), &[1, 0, 4, 2, 3, 5]);
    assert_eq!(p.cycles(), vec![vec![0, 1], vec![2, 4, 3]]);
    assert_eq!(p.to_string(), "(0 1)(2 4 3)");
    assert_eq!(Permutation::identity(3).to_string(), "()");
    assert_eq!(Permutation::from_cycles(3, &[&[0, 1], &[1, 2]]), Err(PermutationError::NotInjective));
    assert_eq!(Permutation::from_cycles(3, &[&[0, 3]]), Err(PermutationError::OutOfBounds));
}
#[test]
#[should_panic]
fn test_compose_mismatch() {
    Permutation::identity(3).then(&Permutation::identity(4));
}
