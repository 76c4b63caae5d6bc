//! Individualization-refinement search.
//!
//! The search always works on the disjoint union of two graphs, side A (graph 0) and side B (graph 1);
//! automorphisms are found by pairing a graph with a copy of itself.
//! A search node is a candidate mapping: committed pairs `(d[k], i[k])` with `d[k]` from side A and `i[k]` from side B,
//! plus the remaining uncommitted vertices. Every node stabilizes the coloring in which pair `k` holds the exclusive
//! color `k + 1` and all uncommitted vertices hold color 0, then prunes, stops at a bijection, or branches by pairing one
//! more vertex `x` of side A with every candidate `y` of the same color on side B.

use log::{debug, trace};

use crate::config::SearchConfig;
use crate::graph::{DisjointUnion, GraphView, VertexId};
use crate::group::{self, StabilizerChain};
use crate::permutation::Permutation;
use crate::refine::{refine, Color, Partition};

const SIDE_A: usize = 0;
const SIDE_B: usize = 1;

/// Classification of a stable partition of a two-sided union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// Some cell has different counts on the two sides; no bijection extends the current mapping.
    Unbalanced,
    /// Every cell holds exactly one vertex per side.
    Bijection,
    /// Balanced, with the given cell being the first one holding at least two vertices per side.
    Undecided(Color),
}

/// Automorphism group of a graph, given by generators.
#[derive(Debug, Clone)]
pub struct AutomorphismGroup {
    degree: usize,
    generators: Vec<Permutation>,
    chain: StabilizerChain,
}
impl AutomorphismGroup {
    fn new(degree: usize, generators: Vec<Permutation>) -> Self {
        let chain = StabilizerChain::new(&generators);
        Self { degree, generators, chain }
    }
    /// The number of vertices the automorphisms act on.
    pub fn degree(&self) -> usize {
        self.degree
    }
    pub fn generators(&self) -> &[Permutation] {
        &self.generators
    }
    pub fn into_generators(self) -> Vec<Permutation> {
        self.generators
    }
    /// Returns the group order.
    pub fn order(&self) -> u128 {
        self.chain.order()
    }
    /// Checks if `permutation` is one of the automorphisms.
    pub fn contains(&self, permutation: &Permutation) -> bool {
        permutation.degree() == self.degree && (permutation.is_identity() || self.chain.contains(permutation))
    }
    /// Returns the vertex orbits (sets of mutually symmetric vertices).
    pub fn orbits(&self) -> Vec<Vec<usize>> {
        group::orbits(&self.generators, self.degree)
    }
    pub fn chain(&self) -> &StabilizerChain {
        &self.chain
    }
}

/// Branching search with a fixed configuration.
///
/// Each call builds its own union and per-call coloring state, so a `Search` can be shared freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct Search {
    config: SearchConfig,
}
impl Search {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Counts the isomorphisms from `a` to `b`.
    pub fn count_isomorphisms<G: GraphView>(&self, a: &G, b: &G) -> u128 {
        let union = DisjointUnion::new([a, b]);
        let res = Node::root(&union, self.config).count(None);
        debug!("{} isomorphisms between graphs of order {} and {}", res, a.order(), b.order());
        res
    }
    /// Checks if `a` and `b` are isomorphic, stopping at the first bijection found.
    pub fn are_isomorphic<G: GraphView>(&self, a: &G, b: &G) -> bool {
        if a.order() != b.order() { return false; }
        let union = DisjointUnion::new([a, b]);
        Node::root(&union, self.config).count(Some(1)) > 0
    }
    /// Finds an isomorphism from `a` to `b`: vertex `v` of `a` corresponds to vertex `res[v]` of `b`.
    pub fn find_isomorphism<G: GraphView>(&self, a: &G, b: &G) -> Option<Permutation> {
        if a.order() != b.order() { return None; }
        let union = DisjointUnion::new([a, b]);
        Node::root(&union, self.config).first_bijection()
    }
    /// Computes a generating set of the automorphism group of `g`, and with it the group order.
    pub fn automorphisms<G: GraphView>(&self, g: &G) -> AutomorphismGroup {
        let union = DisjointUnion::new([g, g]);
        let mut generators = vec![];
        Node::root(&union, self.config).generate(&mut generators);
        let res = AutomorphismGroup::new(g.order(), generators);
        debug!("automorphism group of order {} from {} generators on {} vertices", res.order(), res.generators.len(), g.order());
        res
    }
}

/// One candidate mapping `(d, i, other)` over a two-sided union; children own their own copies of all three.
struct Node<'a> {
    union: &'a DisjointUnion,
    config: SearchConfig,
    d: Vec<usize>,
    i: Vec<usize>,
    other: Vec<usize>,
}
impl<'a> Node<'a> {
    fn root(union: &'a DisjointUnion, config: SearchConfig) -> Self {
        debug_assert_eq!(union.graph_count(), 2);
        Self { union, config, d: vec![], i: vec![], other: (0..union.len()).collect() }
    }
    /// Commits the pair `(x, y)`; `other` is filtered into a fresh vector.
    fn child(&self, x: usize, y: usize) -> Self {
        let mut d = self.d.clone();
        let mut i = self.i.clone();
        d.push(x);
        i.push(y);
        let other = self.other.iter().copied().filter(|&v| v != x && v != y).collect();
        Self { union: self.union, config: self.config, d, i, other }
    }

    fn side(&self, vert: usize) -> usize {
        self.union.id(vert).graph
    }
    fn label(&self, vert: usize) -> usize {
        self.union.id(vert).label
    }
    fn depth(&self) -> usize {
        self.d.len()
    }

    /// Colors pair `k` with `k + 1` and everything uncommitted with 0, then refines.
    fn stabilize(&self) -> Partition {
        assert_eq!(self.d.len(), self.i.len(), "committed pairs out of step");
        debug_assert_eq!(self.d.len() + self.i.len() + self.other.len(), self.union.len());
        let mut colors = vec![0; self.union.len()];
        for (k, (&x, &y)) in self.d.iter().zip(self.i.iter()).enumerate() {
            colors[x] = k + 1;
            colors[y] = k + 1;
        }
        refine(self.union, Partition::from_colors(colors), self.config.refine_strategy)
    }
    fn shape(&self, partition: &Partition) -> Shape {
        let mut undecided = None;
        for (color, cell) in partition.cells() {
            let a = cell.iter().filter(|&&v| self.side(v) == SIDE_A).count();
            if 2 * a != cell.len() { return Shape::Unbalanced; }
            if a > 1 && undecided.is_none() {
                undecided = Some(color);
            }
        }
        match undecided {
            Some(color) => Shape::Undecided(color),
            None => Shape::Bijection,
        }
    }
    /// Splits the branching cell into its side A and side B members, each in cell order.
    fn branching_cell(&self, partition: &Partition, color: Color) -> (Vec<usize>, Vec<usize>) {
        let cell = partition.cell(color).unwrap_or(&[]);
        assert!(cell.len() >= 4, "balanced partition without a cell of at least four vertices");
        cell.iter().copied().partition(|&v| self.side(v) == SIDE_A)
    }
    /// Reads off the label mapping of a bijection partition: side A label `v` maps to side B label `res[v]`.
    fn bijection(&self, partition: &Partition) -> Permutation {
        let n = self.union.vertices_of(SIDE_A).len();
        let mut map = vec![0; n];
        for (_, cell) in partition.cells() {
            let (a, b) = if self.side(cell[0]) == SIDE_A { (cell[0], cell[1]) } else { (cell[1], cell[0]) };
            map[self.label(a)] = self.label(b);
        }
        Permutation::from_raw(map)
    }

    /// Counts the bijections extending this node, stopping early once `limit` is reached.
    fn count(&self, limit: Option<u128>) -> u128 {
        let partition = self.stabilize();
        let shape = self.shape(&partition);
        trace!("count: depth {}, {:?}", self.depth(), shape);
        match shape {
            Shape::Unbalanced => 0,
            Shape::Bijection => 1,
            Shape::Undecided(color) => {
                let (xs, ys) = self.branching_cell(&partition, color);
                let x = xs[0];
                let mut total = 0;
                for y in ys {
                    total += self.child(x, y).count(limit.map(|l| l - total));
                    if limit.map_or(false, |l| total >= l) { break }
                }
                total
            }
        }
    }
    /// Returns the mapping of the first bijection reached depth first, if any.
    fn first_bijection(&self) -> Option<Permutation> {
        let partition = self.stabilize();
        match self.shape(&partition) {
            Shape::Unbalanced => None,
            Shape::Bijection => Some(self.bijection(&partition)),
            Shape::Undecided(color) => {
                let (xs, ys) = self.branching_cell(&partition, color);
                ys.into_iter().find_map(|y| self.child(xs[0], y).first_bijection())
            }
        }
    }

    /// Checks if every committed pair maps a label to the same label, i.e. the node lies on the identity path.
    fn is_trivial(&self) -> bool {
        self.d.iter().zip(self.i.iter()).all(|(&x, &y)| self.label(x) == self.label(y))
    }
    /// Adds automorphism generators found below this node to `generators`.
    ///
    /// Nodes on the identity path explore every branch, so that each orbit of the pointwise stabilizer of the committed
    /// labels gets a representative. Any other node stops at its first non-identity automorphism and returns `true`.
    fn generate(&self, generators: &mut Vec<Permutation>) -> bool {
        let partition = self.stabilize();
        let shape = self.shape(&partition);
        trace!("generate: depth {}, {:?}, {} generators so far", self.depth(), shape, generators.len());
        match shape {
            Shape::Unbalanced => false,
            Shape::Bijection => {
                let automorphism = self.bijection(&partition);
                if automorphism.is_identity() { return false; }
                if self.config.membership_filter && group::member(generators, &automorphism) {
                    trace!("skipping generated automorphism {}", automorphism);
                } else {
                    debug!("found automorphism {}", automorphism);
                    generators.push(automorphism);
                }
                true
            }
            Shape::Undecided(color) => {
                let (xs, mut ys) = self.branching_cell(&partition, color);
                let x = xs[0];
                let trivial = self.is_trivial();
                if trivial {
                    // try the twin of x first, so the identity path is followed before any sibling
                    let twin = self.union.index_of(VertexId { graph: SIDE_B, label: self.label(x) });
                    if let Some(pos) = ys.iter().position(|&y| y == twin) {
                        let twin = ys.remove(pos);
                        ys.insert(0, twin);
                    }
                }
                let mut found = false;
                for y in ys {
                    if trivial && self.config.orbit_pruning && self.known_image(generators, x, y) {
                        trace!("pruned candidate {} for {}", self.label(y), self.label(x));
                        continue;
                    }
                    if self.child(x, y).generate(generators) {
                        found = true;
                        if !trivial { break }
                    }
                }
                found
            }
        }
    }
    /// Checks if the generators fixing every committed label already map `x` to `y`.
    fn known_image(&self, generators: &[Permutation], x: usize, y: usize) -> bool {
        let (x, y) = (self.label(x), self.label(y));
        if x == y { return false; }
        let fixing: Vec<Permutation> = generators.iter().filter(|g| self.d.iter().all(|&v| g.fixes(self.label(v)))).cloned().collect();
        !fixing.is_empty() && group::orbit(&fixing, x).contains(y)
    }
}

/// Counts the isomorphisms from `a` to `b` with the default configuration.
pub fn count_isomorphisms<G: GraphView>(a: &G, b: &G) -> u128 {
    Search::default().count_isomorphisms(a, b)
}
/// Checks if `a` and `b` are isomorphic with the default configuration.
pub fn are_isomorphic<G: GraphView>(a: &G, b: &G) -> bool {
    Search::default().are_isomorphic(a, b)
}
/// Computes the automorphism group of `g` with the default configuration.
pub fn automorphisms<G: GraphView>(g: &G) -> AutomorphismGroup {
    Search::default().automorphisms(g)
}

#[cfg(test)]
use crate::graph::Graph;
#[cfg(test)]
fn all_configs() -> Vec<SearchConfig> {
    use crate::config::RefineStrategy;
    let mut res = vec![];
    for &strategy in &[RefineStrategy::FullRescan, RefineStrategy::Worklist] {
        for &pruning in &[true, false] {
            for &filter in &[true, false] {
                res.push(SearchConfig::default().with_refine_strategy(strategy).with_orbit_pruning(pruning).with_membership_filter(filter));
            }
        }
    }
    res
}
#[cfg(test)]
fn petersen() -> Graph {
    Graph::from_edges(10, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (0, 5), (1, 6), (2, 7), (3, 8), (4, 9), (5, 7), (7, 9), (9, 6), (6, 8), (8, 5)]).unwrap()
}
#[cfg(test)]
fn cube() -> Graph {
    Graph::from_edges(8, &[(0, 1), (1, 3), (3, 2), (2, 0), (4, 5), (5, 7), (7, 6), (6, 4), (0, 4), (1, 5), (2, 6), (3, 7)]).unwrap()
}

#[test]
fn test_triangle() {
    let g = Graph::from_edges(3, &[(0, 1), (1, 2), (0, 2)]).unwrap();
    for config in all_configs() {
        let aut = Search::new(config).automorphisms(&g);
        assert_eq!(aut.order(), 6);
        assert!(aut.generators().iter().all(|p| g.is_automorphism(p)));
    }
    assert_eq!(count_isomorphisms(&g, &g), 6);
}
#[test]
fn test_star() {
    let g = Graph::from_edges(4, &[(0, 1), (0, 2), (0, 3)]).unwrap();
    let aut = automorphisms(&g);
    assert_eq!(aut.order(), 6);
    assert!(aut.generators().iter().all(|p| p.fixes(0)));
    assert_eq!(aut.orbits(), vec![vec![0], vec![1, 2, 3]]);
}
#[test]
fn test_known_orders() {
    let cases: Vec<(Graph, u128)> = vec![
        (Graph::new(), 1),
        (Graph::with_order(1), 1),
        (Graph::with_order(4), 24),
        (Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap(), 2),
        (Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap(), 8),
        (Graph::from_edges(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]).unwrap(), 24),
        (Graph::from_edges(6, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)]).unwrap(), 72),
        (Graph::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]).unwrap(), 12),
        (cube(), 48),
        (petersen(), 120),
    ];
    for (g, expected) in cases {
        for config in all_configs() {
            let aut = Search::new(config).automorphisms(&g);
            assert_eq!(aut.order(), expected, "{:?} with {:?}", g, config);
            assert!(aut.generators().iter().all(|p| g.is_automorphism(p) && !p.is_identity()));
        }
    }
}
#[test]
fn test_asymmetric() {
    // smallest asymmetric tree: a path 0-1-2-3-4-5 with a leaf 6 on vertex 2
    let g = Graph::from_edges(7, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (2, 6)]).unwrap();
    let aut = automorphisms(&g);
    assert_eq!(aut.order(), 1);
    assert!(aut.generators().is_empty());
    assert!(aut.contains(&Permutation::identity(7)));
}
#[test]
fn test_count_matches_order() {
    for g in [cube(), petersen()] {
        assert_eq!(count_isomorphisms(&g, &g), automorphisms(&g).order());
    }
}
#[test]
fn test_isomorphism() {
    let g = petersen();
    let p = Permutation::try_from(vec![3, 9, 0, 5, 1, 8, 2, 7, 4, 6]).unwrap();
    let mut h = g.clone();
    h.apply_permutation(&p).unwrap();
    assert!(are_isomorphic(&g, &h));

    let iso = g.get_isomorphism(&h).unwrap();
    let mut gg = g.clone();
    gg.apply_permutation(&iso).unwrap();
    assert_eq!(gg, h);

    // the 5-prism has the Petersen graph's order and degrees but is not isomorphic to it
    let prism = Graph::from_edges(10, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (5, 6), (6, 7), (7, 8), (8, 9), (9, 5), (0, 5), (1, 6), (2, 7), (3, 8), (4, 9)]).unwrap();
    assert!(!are_isomorphic(&g, &prism));
    assert_eq!(count_isomorphisms(&g, &prism), 0);
    assert!(g.get_isomorphism(&prism).is_none());
    assert!(!are_isomorphic(&g, &Graph::with_order(9)));
}
#[test]
fn test_member_scenario() {
    let path = Graph::from_edges(4, &[(0, 1), (1, 2), (2, 3)]).unwrap();
    let aut = automorphisms(&path);
    assert!(aut.contains(&Permutation::identity(4)));
    for g in aut.generators() {
        assert!(aut.contains(g));
    }
    let swap = Permutation::from_cycles(4, &[&[1, 2]]).unwrap();
    assert!(!path.is_automorphism(&swap));
    assert!(!aut.contains(&swap));
    assert!(!aut.contains(&Permutation::identity(5)));
}
#[test]
#[should_panic]
fn test_unbalanced_pairs() {
    let g = Graph::with_order(2);
    let union = DisjointUnion::new([&g, &g]);
    let mut node = Node::root(&union, SearchConfig::default());
    node.d.push(0);
    node.stabilize();
}
