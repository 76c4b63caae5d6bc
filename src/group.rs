//! Permutation groups given by generating sets.
//!
//! Groups are never enumerated. Queries go through orbits with Schreier transversals and
//! a stabilizer chain: the order of a group is the product of the orbit lengths along the chain,
//! and membership is decided by sifting a permutation through it.

use std::collections::{BTreeMap, BTreeSet};

use log::trace;

use crate::permutation::Permutation;

/// The orbit of a base point, with a transversal: for every orbit point `y`, a group element mapping the base to `y`.
#[derive(Debug, Clone)]
pub struct Orbit {
    base: usize,
    points: Vec<usize>,
    transversal: BTreeMap<usize, Permutation>,
}
impl Orbit {
    pub fn base(&self) -> usize {
        self.base
    }
    /// The orbit points, in the breadth-first order they were reached (starting with the base).
    pub fn points(&self) -> &[usize] {
        &self.points
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn contains(&self, point: usize) -> bool {
        self.transversal.contains_key(&point)
    }
    /// Returns the recorded group element mapping the base to `point`, or `None` if `point` is not in the orbit.
    pub fn representative(&self, point: usize) -> Option<&Permutation> {
        self.transversal.get(&point)
    }
}

fn degree_of(generators: &[Permutation], fallback: usize) -> usize {
    let degree = generators.first().map(Permutation::degree).unwrap_or(fallback);
    assert!(generators.iter().all(|g| g.degree() == degree), "generators of mixed degree");
    degree
}

/// Computes the orbit of `point` under the group generated by `generators`, closing over the generators and their inverses.
///
/// With no generators the orbit is just `{point}`.
pub fn orbit(generators: &[Permutation], point: usize) -> Orbit {
    let degree = degree_of(generators, point + 1);
    assert!(point < degree, "point {} outside the domain 0..{}", point, degree);
    let moves: Vec<Permutation> = generators.iter().cloned().chain(generators.iter().map(Permutation::inverse)).collect();

    let mut transversal = BTreeMap::new();
    transversal.insert(point, Permutation::identity(degree));
    let mut points = vec![point];
    let mut next = 0;
    while next < points.len() {
        let x = points[next];
        next += 1;
        for m in moves.iter() {
            let y = m[x];
            if transversal.contains_key(&y) { continue }
            let rep = transversal[&x].then(m);
            transversal.insert(y, rep);
            points.push(y);
        }
    }
    Orbit { base: point, points, transversal }
}

/// Computes the orbit partition of `0..degree`; each orbit is sorted, and orbits are ordered by their smallest point.
pub fn orbits(generators: &[Permutation], degree: usize) -> Vec<Vec<usize>> {
    let mut seen = vec![false; degree];
    let mut res = vec![];
    for p in 0..degree {
        if seen[p] { continue }
        let mut o = if generators.is_empty() { vec![p] } else { orbit(generators, p).points };
        o.sort_unstable();
        for &q in o.iter() {
            seen[q] = true;
        }
        res.push(o);
    }
    res
}

/// Reduces a generating set without changing the group it generates.
///
/// Every kept generator is indexed by its first moved point `i` and the image of `i`; a generator colliding with
/// an already kept `h` is replaced by `g * h^-1`, which fixes `i` and thus moves on to a later slot.
/// At most `n(n-1)/2` generators survive, and identities are dropped.
fn sims_filter(generators: impl IntoIterator<Item = Permutation>) -> Vec<Permutation> {
    let mut table: BTreeMap<(usize, usize), Permutation> = BTreeMap::new();
    for mut g in generators {
        while let Some(i) = g.first_moved() {
            let j = g[i];
            match table.get(&(i, j)) {
                Some(h) => g = g.then(&h.inverse()),
                None => {
                    table.insert((i, j), g);
                    break;
                }
            }
        }
    }
    table.into_values().collect()
}

/// Schreier generators of the stabilizer of `orbit.base()`: `u_x * g * u_{g(x)}^-1` for every orbit point `x` and generator `g`.
fn schreier_generators(generators: &[Permutation], orbit: &Orbit) -> Vec<Permutation> {
    let mut res = BTreeSet::new();
    for &x in orbit.points() {
        let u = &orbit.transversal[&x];
        for g in generators {
            let s = u.then(g).then(&orbit.transversal[&g[x]].inverse());
            if !s.is_identity() {
                res.insert(s);
            }
        }
    }
    sims_filter(res)
}

/// Returns a generating set for the subgroup fixing `point`.
///
/// # Panics
///
/// Panics if no generator moves `point`, since its stabilizer is then the whole group.
pub fn stabilizer(generators: &[Permutation], point: usize) -> Vec<Permutation> {
    let orbit = orbit(generators, point);
    assert!(orbit.len() >= 2, "stabilizer requested at point {} which has a trivial orbit", point);
    schreier_generators(generators, &orbit)
}

/// Computes the order of the group generated by `generators`; the empty set generates the trivial group.
///
/// # Panics
///
/// Panics if the order does not fit in a `u128`.
pub fn order(generators: &[Permutation]) -> u128 {
    StabilizerChain::new(generators).order()
}

/// Checks if `permutation` is an element of the group generated by `generators`.
pub fn member(generators: &[Permutation], permutation: &Permutation) -> bool {
    if permutation.is_identity() { return true; }
    StabilizerChain::new(generators).contains(permutation)
}

#[derive(Debug, Clone)]
struct Level {
    orbit: Orbit,
    generators: Vec<Permutation>,
}

/// A stabilizer chain `G = G_0 >= G_1 >= ... >= G_k = 1`, where `G_{i+1}` fixes the base points `b_0..=b_i`.
///
/// Each level stores the generators of `G_i` and the orbit of `b_i` under them.
/// The base point of a level is the smallest point moved by that level's generators.
#[derive(Debug, Clone)]
pub struct StabilizerChain {
    levels: Vec<Level>,
}
impl StabilizerChain {
    pub fn new(generators: &[Permutation]) -> Self {
        let mut levels = vec![];
        let mut current = sims_filter(generators.iter().cloned());
        while let Some(base) = current.iter().filter_map(Permutation::first_moved).min() {
            let orbit = orbit(&current, base);
            let next = schreier_generators(&current, &orbit);
            trace!("chain level {}: base {}, orbit length {}, {} generators", levels.len(), base, orbit.len(), current.len());
            levels.push(Level { orbit, generators: current });
            current = next;
        }
        Self { levels }
    }
    /// The base points, one per level.
    pub fn base(&self) -> Vec<usize> {
        self.levels.iter().map(|l| l.orbit.base()).collect()
    }
    pub fn orbit_lengths(&self) -> Vec<usize> {
        self.levels.iter().map(|l| l.orbit.len()).collect()
    }
    /// Number of levels (the length of the base).
    pub fn depth(&self) -> usize {
        self.levels.len()
    }
    /// Generators of the subgroup at `level` (level 0 is the whole group), or `None` past the last level.
    pub fn generators(&self, level: usize) -> Option<&[Permutation]> {
        self.levels.get(level).map(|l| l.generators.as_slice())
    }

    /// # Panics
    ///
    /// Panics if the order does not fit in a `u128`.
    pub fn order(&self) -> u128 {
        self.levels.iter().fold(1u128, |acc, l| {
            acc.checked_mul(l.orbit.len() as u128).unwrap_or_else(|| panic!("group order overflows u128"))
        })
    }
    /// Sifts `permutation` through the chain; it is a member exactly when it sifts down to the identity.
    pub fn contains(&self, permutation: &Permutation) -> bool {
        let mut h = permutation.clone();
        for level in self.levels.iter() {
            if level.generators[0].degree() != h.degree() { return false; }
            match level.orbit.representative(h[level.orbit.base()]) {
                None => return false,
                Some(u) => h = h.then(&u.inverse()),
            }
        }
        h.is_identity()
    }
}

#[cfg(test)]
fn cyc(degree: usize, cycles: &[&[usize]]) -> Permutation {
    Permutation::from_cycles(degree, cycles).unwrap()
}

#[test]
fn test_orbit_transversal() {
    let gens = [cyc(5, &[&[0, 1]]), cyc(5, &[&[0, 1, 2]])];
    let o = orbit(&gens, 0);
    assert_eq!(o.base(), 0);
    assert_eq!(o.points().iter().copied().collect::<BTreeSet<_>>(), [0, 1, 2].iter().copied().collect());
    for &y in o.points() {
        assert_eq!(o.representative(y).unwrap()[0], y);
    }
    assert!(!o.contains(3));
    assert!(o.representative(4).is_none());

    let fixed = orbit(&gens, 4);
    assert_eq!(fixed.points(), &[4]);
    assert!(orbit(&[], 2).representative(2).unwrap().is_identity());
}
#[test]
fn test_orbits() {
    let gens = [cyc(6, &[&[0, 2]]), cyc(6, &[&[2, 4], &[1, 5]])];
    assert_eq!(orbits(&gens, 6), vec![vec![0, 2, 4], vec![1, 5], vec![3]]);
    assert_eq!(orbits(&[], 2), vec![vec![0], vec![1]]);
}
#[test]
fn test_stabilizer() {
    let s4 = [cyc(4, &[&[0, 1, 2, 3]]), cyc(4, &[&[0, 1]])];
    let stab = stabilizer(&s4, 0);
    assert!(stab.iter().all(|g| g.fixes(0)));
    assert_eq!(order(&stab), 6);
}
#[test]
#[should_panic]
fn test_stabilizer_of_fixed_point() {
    stabilizer(&[cyc(3, &[&[0, 1]])], 2);
}
#[test]
fn test_order() {
    assert_eq!(order(&[]), 1);
    assert_eq!(order(&[Permutation::identity(4)]), 1);
    assert_eq!(order(&[cyc(5, &[&[0, 1, 2, 3, 4]])]), 5);
    assert_eq!(order(&[cyc(5, &[&[0, 1, 2, 3, 4]]), cyc(5, &[&[0, 1]])]), 120);
    assert_eq!(order(&[cyc(4, &[&[0, 1, 2, 3]]), cyc(4, &[&[0, 2]])]), 8);
    assert_eq!(order(&[cyc(4, &[&[0, 1, 2]]), cyc(4, &[&[1, 2, 3]])]), 12);
    // two independent transpositions generate a Klein four-group
    assert_eq!(order(&[cyc(4, &[&[0, 1]]), cyc(4, &[&[2, 3]]), cyc(4, &[&[0, 1]])]), 4);
}
#[test]
fn test_member() {
    // automorphisms of the path 0-1-2-3
    let gens = [cyc(4, &[&[0, 3], &[1, 2]])];
    assert!(member(&gens, &Permutation::identity(4)));
    assert!(member(&gens, &gens[0]));
    assert!(!member(&gens, &cyc(4, &[&[1, 2]])));
    assert!(!member(&[], &cyc(4, &[&[1, 2]])));

    let a4 = [cyc(4, &[&[0, 1, 2]]), cyc(4, &[&[1, 2, 3]])];
    assert!(member(&a4, &cyc(4, &[&[0, 1], &[2, 3]])));
    assert!(!member(&a4, &cyc(4, &[&[0, 1]])));
    assert!(!member(&a4, &Permutation::from_cycles(5, &[&[0, 1, 2]]).unwrap()));
}
#[test]
fn test_chain() {
    let s4 = [cyc(4, &[&[0, 1, 2, 3]]), cyc(4, &[&[0, 1]])];
    let chain = StabilizerChain::new(&s4);
    assert_eq!(chain.base(), vec![0, 1, 2]);
    assert_eq!(chain.orbit_lengths(), vec![4, 3, 2]);
    assert_eq!(chain.depth(), 3);
    assert_eq!(chain.order(), 24);
    assert!(chain.generators(0).is_some());
    assert!(chain.generators(3).is_none());
    assert!(chain.generators(1).unwrap().iter().all(|g| g.fixes(0)));
}
#[test]
fn test_sims_filter_bound() {
    use itertools::Itertools;

    let all: Vec<Permutation> = (0..5).permutations(5).map(|p| Permutation::try_from(p).unwrap()).collect();
    let reduced = sims_filter(all.iter().cloned());
    assert!(reduced.len() <= 10);
    assert!(reduced.iter().all(|g| !g.is_identity()));
    assert_eq!(order(&reduced), 120);
    assert_eq!(order(&all), 120);
}
