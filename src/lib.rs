#![forbid(unsafe_code)]

//! Graphiti-IR is a crate for deciding isomorphism and computing automorphism groups of finite simple graphs.
//!
//! It was inspired by [Nauty and Traces](https://pallini.di.uniroma1.it/), and follows the same
//! individualization-refinement scheme on a much smaller scale:
//!
//! - [`refine`] computes the coarsest stable coloring of a vertex set (color refinement / 1-dimensional Weisfeiler-Leman).
//! - [`search`] individualizes vertex pairs and re-refines, counting isomorphisms or collecting automorphism generators.
//! - [`group`] answers order and membership queries on the automorphism group through a stabilizer chain,
//!   without ever enumerating the group.
//! - [`classify`] sorts a collection of graphs into isomorphism classes.
//!
//! Everything runs in memory and single-threaded; every call owns its scratch state, so nothing leaks between calls.
//!
//! ```
//! use graphiti_ir::{automorphisms, classify, Graph};
//!
//! let triangle = Graph::from_edges(3, &[(0, 1), (1, 2), (2, 0)]).unwrap();
//! assert_eq!(automorphisms(&triangle).order(), 6);
//!
//! let path = Graph::from_edges(3, &[(0, 1), (1, 2)]).unwrap();
//! let classes = classify(&[triangle.clone(), path, triangle]);
//! assert!(classes.are_equivalent(0, 2));
//! assert!(!classes.are_equivalent(0, 1));
//! ```
//!
//! **Note: this crate is *not* a rust port of Nauty and Traces.**
//! It computes no canonical forms, and handles neither directed, weighted nor multi-edge graphs.

pub mod classify;
pub mod config;
pub mod graph;
pub mod group;
pub mod permutation;
pub mod refine;
pub mod search;

pub use classify::{classify, Certificate, Classification, Classifier, ColorSignature, EquivalenceClass, PairVerdict};
pub use config::{RefineStrategy, SearchConfig};
pub use graph::{Adjacency, DisjointUnion, Graph, GraphEdgeError, GraphView, VertexId};
pub use group::{member, order, orbit, orbits, stabilizer, Orbit, StabilizerChain};
pub use permutation::{Permutation, PermutationError};
pub use refine::{refine, Color, ColorAllocator, Partition};
pub use search::{are_isomorphic, automorphisms, count_isomorphisms, AutomorphismGroup, Search};
