use std::ops::Range;
use std::{fmt, mem};

use superslice::Ext;
use thiserror::Error;

use crate::permutation::{Permutation, PermutationError};

/// Error type for adding an edge to a [`Graph`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GraphEdgeError {
    /// One of the vertices was invalid (out of bounds).
    #[error("edge endpoint out of bounds")]
    OutOfBounds,
    /// The requested edge is forms a loop.
    #[error("edge forms a loop")]
    FormsLoop,
    /// The edge already existed.
    #[error("edge already exists")]
    AlreadyExisted,
}

/// Read-only view of a finite simple undirected graph, as consumed by the algorithms in this crate.
///
/// Vertices are labeled `0..order()`.
/// Adjacency must be symmetric and free of loops and duplicates; this is not checked.
pub trait GraphView {
    /// Returns the graph order, the number of vertices.
    fn order(&self) -> usize;
    /// Returns the neighbors of `vert`, sorted ascending.
    fn neighbors(&self, vert: usize) -> &[usize];
    fn degree(&self, vert: usize) -> usize {
        self.neighbors(vert).len()
    }
}

/// Represents the adjacency list of a vertex in a [`Graph`].
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Adjacency<'a>(&'a [usize]);
impl<'a> Adjacency<'a> {
    /// Iterates over the neighbors in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + 'a {
        let adj: &'a [usize] = self.0;
        adj.iter().copied()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn contains(&self, dest: usize) -> bool {
        !self.0.equal_range(&dest).is_empty()
    }
    pub fn as_slice(&self) -> &'a [usize] {
        self.0
    }
}
impl fmt::Debug for Adjacency<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            [a, b @ ..] => {
                write!(f, "{{{}", a)?;
                for e in b {
                    write!(f, ", {}", e)?;
                }
                write!(f, "}}")
            }
            [] => write!(f, "{{}}"),
        }
    }
}

/// A (simple) graph.
///
/// Simple graphs use undirected, unweighted edges and forbid multi-edges and loops.
///
/// This type implements [`Eq`] to test equivalence as a labeled graph (not isomorphic equivalence).
/// If you want to compare graphs based on isomorphism, use [`Self::get_isomorphism`].
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Default)]
pub struct Graph(Vec<Vec<usize>>);
impl Graph {
    /// Returns a new, empty graph.
    pub fn new() -> Self {
        Self(vec![])
    }
    /// Returns a disconnected graph with the specified number of vertices (labeled `0..order`).
    /// This is equivalent to repeatedly calling [`Self::add_vertex`].
    pub fn with_order(order: usize) -> Self {
        Self(vec![vec![]; order])
    }
    /// Builds a graph with the specified order from a list of edges, failing on the first invalid edge.
    pub fn from_edges(order: usize, edges: &[(usize, usize)]) -> Result<Self, GraphEdgeError> {
        let mut g = Self::with_order(order);
        for &(a, b) in edges {
            g.add_edge(a, b)?;
        }
        Ok(g)
    }
    /// Returns the graph order, the number of vertices.
    pub fn order(&self) -> usize {
        self.0.len()
    }
    /// Checks if this is an empty graph (no vertices).
    pub fn is_empty(&self) -> bool {
        self.order() == 0
    }
    pub fn edge_count(&self) -> usize {
        self.0.iter().map(Vec::len).sum::<usize>() / 2
    }
    /// Removes all edges from the graph, but leaves the vertices.
    pub fn clear_edges(&mut self) {
        for n in self.0.iter_mut() {
            n.clear();
        }
    }

    /// Adds a new (disconnected) vertex to the graph and returns its index (used for other operations).
    /// The returned indices simply start at 0 and increment by 1; they are only returned for convenience.
    pub fn add_vertex(&mut self) -> usize {
        self.0.push(vec![]);
        self.0.len() - 1
    }
    /// Adds an (undirected) edge `a <-> b`.
    /// Fails if either vertex is invalid (out of bounds), if such an edge already exists, or if this would create a loop.
    pub fn add_edge(&mut self, a: usize, b: usize) -> Result<(), GraphEdgeError> {
        if a >= self.order() || b >= self.order() { return Err(GraphEdgeError::OutOfBounds); }
        if a == b { return Err(GraphEdgeError::FormsLoop); }
        if self.has_edge(a, b) { return Err(GraphEdgeError::AlreadyExisted); }
        let pos = self.0[a].upper_bound(&b);
        self.0[a].insert(pos, b);
        let pos = self.0[b].upper_bound(&a);
        self.0[b].insert(pos, a);
        Ok(())
    }
    /// Checks whether the edge `a <-> b` exists; out of bounds vertices have no edges.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency(a).map(|adj| adj.contains(b)).unwrap_or(false)
    }

    /// Gets the adjacency list for the specified vertex.
    /// Returns `None` if the vertex index is invalid.
    pub fn adjacency(&self, vert: usize) -> Option<Adjacency> {
        self.0.get(vert).map(|e| Adjacency(e))
    }
    /// Iterates through all the vertices in order, as if by calling [`Self::adjacency`] repeatedly.
    /// To get the vertex index as well, you can wrap this in `enumerate()`.
    pub fn adjacencies(&self) -> impl Iterator<Item = Adjacency> {
        self.0.iter().map(|e| Adjacency(e))
    }

    /// Applies the permutation to the current graph, moving vertex `v` to `permutation[v]`.
    /// Fails if the graph and permutation have different orders.
    pub fn apply_permutation(&mut self, permutation: &Permutation) -> Result<(), PermutationError> {
        if permutation.degree() != self.order() { return Err(PermutationError::DifferentDegree); }
        let old = mem::take(&mut self.0);
        self.0 = vec![vec![]; old.len()];
        for (v, new) in permutation.iter().zip(old) {
            self.0[v] = new;
        }
        for n in self.0.iter_mut() {
            for v in n.iter_mut() {
                *v = permutation[*v];
            }
            n.sort_unstable();
        }
        Ok(())
    }
    /// Checks if relabeling by `permutation` maps this graph onto itself.
    /// A permutation of the wrong degree is never an automorphism.
    pub fn is_automorphism(&self, permutation: &Permutation) -> bool {
        if permutation.degree() != self.order() { return false; }
        self.0.iter().enumerate().all(|(a, adj)| {
            adj.len() == self.0[permutation[a]].len() && adj.iter().all(|&b| self.has_edge(permutation[a], permutation[b]))
        })
    }

    /// Checks if this graph is isomorphic to another graph.
    /// If they are isomorphic, returns a permutation such that applying it to this graph yields the other graph.
    /// If they are not isomorphic, returns `None`.
    pub fn get_isomorphism(&self, other: &Self) -> Option<Permutation> {
        crate::search::Search::default().find_isomorphism(self, other)
    }
}
impl GraphView for Graph {
    fn order(&self) -> usize {
        Graph::order(self)
    }
    fn neighbors(&self, vert: usize) -> &[usize] {
        &self.0[vert]
    }
}
impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.adjacencies()).finish()
    }
}

/// Identity of a vertex within a [`DisjointUnion`]: the index of its source graph and its label there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VertexId {
    pub graph: usize,
    pub label: usize,
}

/// The disjoint union of several graphs, flattened to a single vertex multiset.
///
/// Vertices get global indices `0..len()`, assigned graph by graph in label order,
/// and every global index remembers the [`VertexId`] it came from.
#[derive(Debug, Clone)]
pub struct DisjointUnion {
    ids: Vec<VertexId>,
    offsets: Vec<usize>,
    adjacency: Vec<Vec<usize>>,
}
impl DisjointUnion {
    pub fn new<'a, G, I>(graphs: I) -> Self
    where G: GraphView + 'a, I: IntoIterator<Item = &'a G>
    {
        let mut ids = vec![];
        let mut offsets = vec![0];
        let mut adjacency = vec![];
        for (graph, g) in graphs.into_iter().enumerate() {
            let offset = ids.len();
            for label in 0..g.order() {
                ids.push(VertexId { graph, label });
                adjacency.push(g.neighbors(label).iter().map(|&u| offset + u).collect());
            }
            offsets.push(ids.len());
        }
        Self { ids, offsets, adjacency }
    }
    /// Total number of vertices over all graphs.
    pub fn len(&self) -> usize {
        self.ids.len()
    }
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
    pub fn graph_count(&self) -> usize {
        self.offsets.len() - 1
    }
    pub fn id(&self, vert: usize) -> VertexId {
        self.ids[vert]
    }
    pub fn index_of(&self, id: VertexId) -> usize {
        let res = self.offsets[id.graph] + id.label;
        debug_assert!(res < self.offsets[id.graph + 1]);
        res
    }
    /// Global indices of the vertices contributed by `graph`.
    pub fn vertices_of(&self, graph: usize) -> Range<usize> {
        self.offsets[graph]..self.offsets[graph + 1]
    }
    /// Neighbors of `vert` as global indices; these always lie in the same source graph.
    pub fn neighbors(&self, vert: usize) -> &[usize] {
        &self.adjacency[vert]
    }
    pub fn degree(&self, vert: usize) -> usize {
        self.adjacency[vert].len()
    }
}

#[test]
fn test_edges() {
    let mut g = Graph::with_order(4);
    assert_eq!(g.add_edge(0, 2), Ok(()));
    assert_eq!(g.add_edge(0, 1), Ok(()));
    assert_eq!(g.add_edge(1, 0), Err(GraphEdgeError::AlreadyExisted));
    assert_eq!(g.add_edge(3, 3), Err(GraphEdgeError::FormsLoop));
    assert_eq!(g.add_edge(3, 4), Err(GraphEdgeError::OutOfBounds));
    assert_eq!(g.adjacency(0).unwrap().iter().collect::<Vec<_>>(), vec![1, 2]);
    assert!(g.has_edge(2, 0));
    assert!(!g.has_edge(2, 1));
    assert!(!g.has_edge(7, 1));
    assert_eq!(g.edge_count(), 2);
    assert_eq!(GraphView::degree(&g, 0), 2);
    assert_eq!(format!("{:?}", g), "[{1, 2}, {0}, {0}, {}]");
    assert_eq!(g.add_vertex(), 4);
    g.clear_edges();
    assert_eq!(g, Graph::with_order(5));
}
#[test]
fn test_apply_permutation() {
    let mut g = Graph::from_edges(5, &[(0, 1), (0, 2), (1, 2), (1, 4), (2, 3), (3, 4)]).unwrap();
    let g2 = Graph::from_edges(5, &[(2, 1), (2, 4), (1, 4), (0, 1), (3, 4), (0, 3)]).unwrap();
    assert_ne!(g, g2);
    let p = Permutation::try_from(vec![2, 1, 4, 3, 0]).unwrap();
    g.apply_permutation(&p).unwrap();
    assert_eq!(g, g2);
    assert_eq!(g.apply_permutation(&Permutation::identity(4)), Err(PermutationError::DifferentDegree));
}
#[test]
fn test_is_automorphism() {
    let path = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
    assert!(path.is_automorphism(&Permutation::identity(4)));
    assert!(path.is_automorphism(&Permutation::from_cycles(4, &[&[0, 3], &[1, 2]]).unwrap()));
    assert!(!path.is_automorphism(&Permutation::from_cycles(4, &[&[1, 2]]).unwrap()));
    assert!(!path.is_automorphism(&Permutation::identity(3)));
}
#[test]
fn test_disjoint_union() {
    let a = Graph::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
    let b = Graph::from_edges(2, &[(0, 1)]).unwrap();
    let u = DisjointUnion::new([&a, &b]);
    assert_eq!(u.len(), 5);
    assert_eq!(u.graph_count(), 2);
    assert_eq!(u.vertices_of(1), 3..5);
    assert_eq!(u.id(4), VertexId { graph: 1, label: 1 });
    assert_eq!(u.index_of(VertexId { graph: 1, label: 0 }), 3);
    assert_eq!(u.neighbors(1), &[0, 2]);
    assert_eq!(u.neighbors(3), &[4]);
    assert_eq!(u.degree(2), 1);
}
