//! Color refinement (1-dimensional Weisfeiler-Leman stabilization).
//!
//! A [`Partition`] assigns every vertex of a [`DisjointUnion`] a color.
//! [`refine`] repeatedly splits color cells whose members disagree on their neighbor signature
//! (the multiset of their neighbors' colors) until no cell splits anymore.
//! The result is the coarsest stable coloring that refines the input coloring, and it is an isomorphism invariant.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use itertools::Itertools;
use log::{debug, trace};

use crate::config::RefineStrategy;
use crate::graph::DisjointUnion;

/// Integer color class id.
pub type Color = usize;

/// Neighbor signature of a vertex: `(color, count)` pairs sorted by color.
type Signature = Vec<(Color, usize)>;

/// Mints fresh colors; ids handed out are never reused within one refinement run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorAllocator {
    next: Color,
}
impl ColorAllocator {
    /// Returns an allocator whose first color is `next`.
    pub fn starting_at(next: Color) -> Self {
        Self { next }
    }
    pub fn mint(&mut self) -> Color {
        let res = self.next;
        self.next += 1;
        res
    }
    pub fn peek(&self) -> Color {
        self.next
    }
}

/// A coloring of the vertices `0..len()` of a disjoint union, viewed as color cells.
///
/// Invariant: every vertex lies in exactly one cell, namely `cell(color(v))`.
/// Within a cell, members keep the order they were inserted in; cells built by [`Self::from_colors`] are in ascending vertex order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    color_of: Vec<Color>,
    cells: BTreeMap<Color, Vec<usize>>,
    allocator: ColorAllocator,
}
impl Partition {
    /// Builds a partition from per-vertex colors; fresh colors will be allocated above the largest one present.
    pub fn from_colors(colors: Vec<Color>) -> Self {
        let mut cells: BTreeMap<Color, Vec<usize>> = BTreeMap::new();
        for (v, &c) in colors.iter().enumerate() {
            cells.entry(c).or_default().push(v);
        }
        let next = colors.iter().max().map(|&c| c + 1).unwrap_or(0);
        Self { color_of: colors, cells, allocator: ColorAllocator::starting_at(next) }
    }
    /// Returns a partition with every vertex in a single cell of color 0.
    pub fn unit(len: usize) -> Self {
        Self::from_colors(vec![0; len])
    }

    /// Number of vertices colored.
    pub fn len(&self) -> usize {
        self.color_of.len()
    }
    pub fn is_empty(&self) -> bool {
        self.color_of.is_empty()
    }
    pub fn color(&self, vert: usize) -> Color {
        self.color_of[vert]
    }
    pub fn colors(&self) -> &[Color] {
        &self.color_of
    }
    pub fn cell(&self, color: Color) -> Option<&[usize]> {
        self.cells.get(&color).map(Vec::as_slice)
    }
    /// Iterates over the cells in ascending color order.
    pub fn cells(&self) -> impl Iterator<Item = (Color, &[usize])> {
        self.cells.iter().map(|(&c, cell)| (c, cell.as_slice()))
    }
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
    /// The multiset of cell sizes, sorted ascending.
    pub fn cell_sizes(&self) -> Vec<usize> {
        self.cells.values().map(Vec::len).sorted().collect()
    }
    /// Checks if every cell is a singleton.
    pub fn is_discrete(&self) -> bool {
        self.cells.values().all(|cell| cell.len() == 1)
    }
    /// Checks if both partitions have the same cells, ignoring the color ids and member order.
    pub fn same_cells(&self, other: &Self) -> bool {
        let normalize = |p: &Self| p.cells.values().map(|cell| cell.iter().copied().sorted().collect::<Vec<_>>()).collect::<BTreeSet<_>>();
        self.len() == other.len() && normalize(self) == normalize(other)
    }

    /// Splits the cell of `color` into `groups`; the first group keeps `color` and every other one gets a fresh color.
    /// Returns the fresh colors in group order.
    fn split(&mut self, color: Color, mut groups: Vec<Vec<usize>>) -> Vec<Color> {
        debug_assert_eq!(groups.iter().map(Vec::len).sum::<usize>(), self.cells[&color].len());
        let rest = groups.split_off(1);
        let mut fresh = Vec::with_capacity(rest.len());
        for group in rest {
            let new = self.allocator.mint();
            for &v in group.iter() {
                self.color_of[v] = new;
            }
            self.cells.insert(new, group);
            fresh.push(new);
        }
        if let Some(kept) = groups.pop() {
            self.cells.insert(color, kept);
        }
        fresh
    }
}

/// Groups `members` by `key`, in order of first appearance; members keep their relative order within a group.
pub(crate) fn group_in_order<K: Ord>(members: &[usize], key: impl Fn(usize) -> K) -> Vec<Vec<usize>> {
    let mut index: BTreeMap<K, usize> = BTreeMap::new();
    let mut groups: Vec<Vec<usize>> = vec![];
    for &v in members {
        let k = key(v);
        match index.get(&k) {
            Some(&g) => groups[g].push(v),
            None => {
                index.insert(k, groups.len());
                groups.push(vec![v]);
            }
        }
    }
    groups
}

fn signature(union: &DisjointUnion, colors: &[Color], vert: usize) -> Signature {
    union.neighbors(vert).iter().map(|&u| colors[u]).sorted().dedup_with_count().map(|(n, c)| (c, n)).collect()
}

/// Refines `partition` to the coarsest stable partition over the adjacency of `union`.
///
/// Both strategies reach the same cells; color ids may differ between them.
/// Refining an already stable partition returns it unchanged.
pub fn refine(union: &DisjointUnion, partition: Partition, strategy: RefineStrategy) -> Partition {
    assert_eq!(union.len(), partition.len(), "partition does not color the whole union");
    let before = partition.cell_count();
    let res = match strategy {
        RefineStrategy::FullRescan => refine_full_rescan(union, partition),
        RefineStrategy::Worklist => refine_worklist(union, partition),
    };
    debug!("refined {} vertices from {} to {} cells ({:?})", union.len(), before, res.cell_count(), strategy);
    res
}

fn refine_full_rescan(union: &DisjointUnion, mut partition: Partition) -> Partition {
    let mut pass = 0;
    loop {
        pass += 1;
        let signatures: Vec<Signature> = (0..union.len()).map(|v| signature(union, &partition.color_of, v)).collect();
        let colors: Vec<Color> = partition.cells.keys().copied().collect();
        let mut splits = 0;
        for color in colors {
            let cell = &partition.cells[&color];
            if cell.len() <= 1 { continue }
            let groups = group_in_order(cell, |v| &signatures[v]);
            if groups.len() > 1 {
                splits += groups.len() - 1;
                partition.split(color, groups);
            }
        }
        trace!("pass {}: {} new cells", pass, splits);
        if splits == 0 { return partition; }
    }
}

fn refine_worklist(union: &DisjointUnion, mut partition: Partition) -> Partition {
    let mut queue: VecDeque<Color> = partition.cells.keys().copied().collect();
    let mut queued: BTreeSet<Color> = queue.iter().copied().collect();

    while let Some(splitter) = queue.pop_front() {
        queued.remove(&splitter);
        let mut hits: BTreeMap<usize, usize> = BTreeMap::new();
        for &w in partition.cells[&splitter].iter() {
            for &u in union.neighbors(w) {
                *hits.entry(u).or_default() += 1;
            }
        }
        let touched: BTreeSet<Color> = hits.keys().map(|&u| partition.color_of[u]).collect();

        for color in touched {
            let cell = &partition.cells[&color];
            if cell.len() <= 1 { continue }
            let groups = group_in_order(cell, |v| hits.get(&v).copied().unwrap_or(0));
            if groups.len() < 2 { continue }

            let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
            let fresh = partition.split(color, groups);
            if queued.contains(&color) {
                for c in fresh {
                    queue.push_back(c);
                    queued.insert(c);
                }
            } else {
                // the largest part can be skipped: its counts follow from the others
                let largest = sizes.iter().position_max().unwrap_or(0);
                let parts = std::iter::once(color).chain(fresh);
                for (k, c) in parts.enumerate() {
                    if k == largest { continue }
                    queue.push_back(c);
                    queued.insert(c);
                }
            }
        }
    }
    partition
}

#[cfg(test)]
fn grid_3x3() -> crate::graph::Graph {
    crate::graph::Graph::from_edges(9, &[(0,1), (1,2), (3,4), (4,5), (6,7), (7,8), (0,3), (3,6), (1,4), (4,7), (2,5), (5,8)]).unwrap()
}
#[cfg(test)]
fn cells_of(p: &Partition) -> Vec<Vec<usize>> {
    p.cells().map(|(_, cell)| cell.iter().copied().sorted().collect()).sorted().collect()
}

#[test]
fn test_refine_grid() {
    let g = grid_3x3();
    let u = DisjointUnion::new([&g]);
    for &strategy in &[RefineStrategy::FullRescan, RefineStrategy::Worklist] {
        let p = refine(&u, Partition::unit(9), strategy);
        assert_eq!(cells_of(&p), vec![vec![0, 2, 6, 8], vec![1, 3, 5, 7], vec![4]]);

        let p = refine(&u, Partition::from_colors(vec![1, 0, 2, 0, 0, 0, 2, 0, 2]), strategy);
        assert_eq!(cells_of(&p), vec![vec![0], vec![1, 3], vec![2, 6], vec![4], vec![5, 7], vec![8]]);
    }
}
#[test]
fn test_refine_deterministic_colors() {
    // path 0-1-2-3: vertex 0 is seen first, so the ends keep color 0
    let g = crate::graph::Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
    let u = DisjointUnion::new([&g]);
    let p = refine(&u, Partition::unit(4), RefineStrategy::FullRescan);
    assert_eq!(p.colors(), &[0, 1, 1, 0]);
    assert_eq!(p.cell(0), Some(&[0, 3][..]));
    assert_eq!(p.cell(1), Some(&[1, 2][..]));
    assert_eq!(p.cell(2), None);
}
#[test]
fn test_refine_idempotent() {
    let g = grid_3x3();
    let u = DisjointUnion::new([&g]);
    for &strategy in &[RefineStrategy::FullRescan, RefineStrategy::Worklist] {
        let once = refine(&u, Partition::unit(9), strategy);
        let twice = refine(&u, once.clone(), strategy);
        assert_eq!(once, twice);
    }
}
#[test]
fn test_triangle_does_not_split() {
    let g = crate::graph::Graph::from_edges(3, &[(0, 1), (1, 2), (0, 2)]).unwrap();
    let u = DisjointUnion::new([&g]);
    let p = refine(&u, Partition::unit(3), RefineStrategy::FullRescan);
    assert_eq!(p.cell_count(), 1);
    assert!(!p.is_discrete());
}
#[test]
fn test_star_splits_center() {
    let g = crate::graph::Graph::from_edges(4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
    let u = DisjointUnion::new([&g]);
    let degrees = (0..4).map(|v| u.degree(v)).collect();
    let p = refine(&u, Partition::from_colors(degrees), RefineStrategy::FullRescan);
    assert_eq!(p.cell_sizes(), vec![1, 3]);
    assert_eq!(p.cell(3), Some(&[0][..]));
    assert_eq!(p.cell(1), Some(&[1, 2, 3][..]));
}
#[test]
fn test_strategies_agree_on_union() {
    let a = grid_3x3();
    let b = crate::graph::Graph::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 3)]).unwrap();
    let u = DisjointUnion::new([&a, &b]);
    let degrees: Vec<_> = (0..u.len()).map(|v| u.degree(v)).collect();
    let full = refine(&u, Partition::from_colors(degrees.clone()), RefineStrategy::FullRescan);
    let work = refine(&u, Partition::from_colors(degrees), RefineStrategy::Worklist);
    assert!(full.same_cells(&work));
}
#[test]
fn test_allocator() {
    let mut a = ColorAllocator::starting_at(3);
    assert_eq!(a.mint(), 3);
    assert_eq!(a.mint(), 4);
    assert_eq!(a.peek(), 5);
    assert_eq!(Partition::from_colors(vec![2, 7]).allocator.peek(), 8);
    assert_eq!(Partition::from_colors(vec![]).allocator.peek(), 0);
}
