//! Sorting a collection of graphs into isomorphism classes.
//!
//! All graphs are refined together, starting from their degrees, so that colors are comparable across graphs.
//! Graphs whose per-color vertex counts differ cannot be isomorphic. Graphs sharing a discrete count
//! (every color used once) are isomorphic outright; the rest of each bucket is settled pairwise by branching search.

use std::collections::BTreeMap;

use log::debug;

use crate::config::SearchConfig;
use crate::graph::{DisjointUnion, GraphView};
use crate::refine::{group_in_order, refine, Color, Partition};
use crate::search::{AutomorphismGroup, Search};

/// Number of vertices of one graph holding each color of a joint stable coloring.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ColorSignature(BTreeMap<Color, usize>);
impl ColorSignature {
    fn of(partition: &Partition, union: &DisjointUnion, graph: usize) -> Self {
        let mut counts = BTreeMap::new();
        for v in union.vertices_of(graph) {
            *counts.entry(partition.color(v)).or_default() += 1;
        }
        Self(counts)
    }
    /// Checks if every color occurs exactly once.
    pub fn is_discrete(&self) -> bool {
        self.0.values().all(|&n| n == 1)
    }
    pub fn count(&self, color: Color) -> usize {
        self.0.get(&color).copied().unwrap_or(0)
    }
    pub fn iter(&self) -> impl Iterator<Item = (Color, usize)> + '_ {
        self.0.iter().map(|(&c, &n)| (c, n))
    }
}

/// How membership of an [`EquivalenceClass`] was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Certificate {
    /// The members share a discrete stable coloring, which already fixes the isomorphism.
    ColorRefinement,
    /// The members come from a bucket with a balanced, non-discrete stable coloring, settled pairwise by branching search.
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceClass {
    /// Graph indices, ascending.
    pub members: Vec<usize>,
    pub certificate: Certificate,
}

/// Outcome of one pairwise branching search between two graphs of a balanced bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairVerdict {
    pub first: usize,
    pub second: usize,
    pub isomorphic: bool,
}

#[derive(Debug, Clone)]
pub struct Classification {
    classes: Vec<EquivalenceClass>,
    verdicts: Vec<PairVerdict>,
    signatures: Vec<ColorSignature>,
    class_of: Vec<usize>,
}
impl Classification {
    /// The classes, ordered by their smallest member.
    pub fn classes(&self) -> &[EquivalenceClass] {
        &self.classes
    }
    /// Every pairwise search performed, in the order it ran.
    pub fn verdicts(&self) -> &[PairVerdict] {
        &self.verdicts
    }
    pub fn signature(&self, graph: usize) -> &ColorSignature {
        &self.signatures[graph]
    }
    /// Index into [`Self::classes`] of the class holding `graph`.
    pub fn class_of(&self, graph: usize) -> usize {
        self.class_of[graph]
    }
    pub fn are_equivalent(&self, a: usize, b: usize) -> bool {
        self.class_of[a] == self.class_of[b]
    }
}

/// Sorts graphs into isomorphism classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    search: Search,
}
impl Classifier {
    pub fn new(config: SearchConfig) -> Self {
        Self { search: Search::new(config) }
    }

    pub fn classify<G: GraphView>(&self, graphs: &[G]) -> Classification {
        let union = DisjointUnion::new(graphs.iter());
        let degrees = (0..union.len()).map(|v| union.degree(v)).collect();
        let stable = refine(&union, Partition::from_colors(degrees), self.search.config().refine_strategy);
        let signatures: Vec<ColorSignature> = (0..graphs.len()).map(|g| ColorSignature::of(&stable, &union, g)).collect();

        let indices: Vec<usize> = (0..graphs.len()).collect();
        let buckets = group_in_order(&indices, |g| &signatures[g]);
        debug!("{} graphs in {} buckets after refining into {} colors", graphs.len(), buckets.len(), stable.cell_count());

        let mut classes = vec![];
        let mut verdicts = vec![];
        for bucket in buckets {
            if signatures[bucket[0]].is_discrete() {
                classes.push(EquivalenceClass { members: bucket, certificate: Certificate::ColorRefinement });
                continue;
            }
            debug!("resolving undecided bucket {:?}", bucket);
            for members in self.resolve(graphs, &bucket, &mut verdicts) {
                classes.push(EquivalenceClass { members, certificate: Certificate::Search });
            }
        }
        classes.sort_by_key(|c| c.members[0]);

        let mut class_of = vec![0; graphs.len()];
        for (k, class) in classes.iter().enumerate() {
            for &g in class.members.iter() {
                class_of[g] = k;
            }
        }
        Classification { classes, verdicts, signatures, class_of }
    }

    /// Splits a bucket of balanced graphs: each graph not yet placed opens a class and pulls in every later unplaced graph isomorphic to it.
    fn resolve<G: GraphView>(&self, graphs: &[G], bucket: &[usize], verdicts: &mut Vec<PairVerdict>) -> Vec<Vec<usize>> {
        let mut placed = vec![false; bucket.len()];
        let mut res = vec![];
        for (k, &first) in bucket.iter().enumerate() {
            if placed[k] { continue }
            placed[k] = true;
            let mut class = vec![first];
            for (l, &second) in bucket.iter().enumerate().skip(k + 1) {
                if placed[l] { continue }
                let isomorphic = self.search.are_isomorphic(&graphs[first], &graphs[second]);
                verdicts.push(PairVerdict { first, second, isomorphic });
                if isomorphic {
                    placed[l] = true;
                    class.push(second);
                }
            }
            res.push(class);
        }
        res
    }

    /// Computes the automorphism group of the first member of every class, in class order.
    pub fn automorphisms<G: GraphView>(&self, graphs: &[G], classification: &Classification) -> Vec<AutomorphismGroup> {
        classification.classes().iter().map(|c| self.search.automorphisms(&graphs[c.members[0]])).collect()
    }
}

/// Classifies `graphs` with the default configuration.
pub fn classify<G: GraphView>(graphs: &[G]) -> Classification {
    Classifier::default().classify(graphs)
}

#[cfg(test)]
use crate::graph::Graph;

#[test]
fn test_two_paths() {
    let a = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
    let b = Graph::from_edges(4, &[(3, 1), (1, 0), (0, 2)]).unwrap();
    let c = classify(&[a, b]);
    assert_eq!(c.classes(), &[EquivalenceClass { members: vec![0, 1], certificate: Certificate::Search }]);
    assert!(c.are_equivalent(0, 1));
    assert_eq!(c.signature(0), c.signature(1));
    assert_eq!(c.signature(0).iter().map(|(_, n)| n).collect::<Vec<_>>(), vec![2, 2]);
}
#[test]
fn test_discrete_bucket() {
    // a path 0-1-2-3-4-5 with a pendant on vertex 2 refines to a discrete coloring
    let a = Graph::from_edges(7, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (2, 6)]).unwrap();
    let b = Graph::from_edges(7, &[(6, 5), (5, 4), (4, 3), (3, 2), (2, 1), (4, 0)]).unwrap();
    let c = classify(&[a, b]);
    assert!(c.signature(0).is_discrete());
    assert_eq!(c.classes(), &[EquivalenceClass { members: vec![0, 1], certificate: Certificate::ColorRefinement }]);
    assert!(c.verdicts().is_empty());
}
#[test]
fn test_cycle_vs_path_plus_isolated() {
    let cycle = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
    let other = Graph::from_edges(4, &[(1, 2), (2, 3)]).unwrap();
    let c = classify(&[cycle, other]);
    assert_eq!(c.classes().len(), 2);
    assert!(!c.are_equivalent(0, 1));
    assert_ne!(c.signature(0), c.signature(1));
}
#[test]
fn test_balanced_but_not_isomorphic() {
    // two triangles versus a hexagon: both 2-regular on six vertices, so refinement cannot tell them apart
    let triangles = Graph::from_edges(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]).unwrap();
    let hexagon = Graph::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]).unwrap();
    let hexagon2 = Graph::from_edges(6, &[(0, 2), (2, 4), (4, 1), (1, 3), (3, 5), (5, 0)]).unwrap();
    let graphs = [triangles, hexagon, hexagon2];
    let c = classify(&graphs);
    assert_eq!(c.signature(0), c.signature(1));
    assert_eq!(c.classes(), &[
        EquivalenceClass { members: vec![0], certificate: Certificate::Search },
        EquivalenceClass { members: vec![1, 2], certificate: Certificate::Search },
    ]);
    assert_eq!(c.verdicts(), &[
        PairVerdict { first: 0, second: 1, isomorphic: false },
        PairVerdict { first: 0, second: 2, isomorphic: false },
        PairVerdict { first: 1, second: 2, isomorphic: true },
    ]);
    assert_eq!(c.class_of(2), 1);

    let groups = Classifier::default().automorphisms(&graphs, &c);
    assert_eq!(groups.iter().map(AutomorphismGroup::order).collect::<Vec<_>>(), vec![72, 12]);
}
#[test]
fn test_mixed_orders() {
    let graphs = [Graph::with_order(3), Graph::with_order(2), Graph::with_order(3), Graph::new()];
    let c = classify(&graphs);
    let members: Vec<_> = c.classes().iter().map(|c| c.members.clone()).collect();
    assert_eq!(members, vec![vec![0, 2], vec![1], vec![3]]);
}
