/// Strategy used to drive color refinement to its fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefineStrategy {
    /// Recompute every neighbor signature and rescan every cell until a full pass splits nothing.
    #[default]
    FullRescan,
    /// Only revisit the cells touched by a queue of splitter colors.
    Worklist,
}

/// Tuning knobs for [`Search`](crate::search::Search) and [`Classifier`](crate::classify::Classifier).
///
/// None of the options change results, only how much work is done to get them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(default))]
pub struct SearchConfig {
    pub refine_strategy: RefineStrategy,
    /// Skip branches whose target vertex is already known to be in the orbit of the individualized vertex.
    pub orbit_pruning: bool,
    /// Only keep a discovered automorphism as a generator if it is not already generated by the previous ones.
    pub membership_filter: bool,
}
impl Default for SearchConfig {
    fn default() -> Self {
        Self { refine_strategy: RefineStrategy::FullRescan, orbit_pruning: true, membership_filter: true }
    }
}
impl SearchConfig {
    pub fn with_refine_strategy(mut self, refine_strategy: RefineStrategy) -> Self {
        self.refine_strategy = refine_strategy;
        self
    }
    pub fn with_orbit_pruning(mut self, orbit_pruning: bool) -> Self {
        self.orbit_pruning = orbit_pruning;
        self
    }
    pub fn with_membership_filter(mut self, membership_filter: bool) -> Self {
        self.membership_filter = membership_filter;
        self
    }
}

#[test]
fn test_builder() {
    let c = SearchConfig::default().with_refine_strategy(RefineStrategy::Worklist).with_orbit_pruning(false);
    assert_eq!(c.refine_strategy, RefineStrategy::Worklist);
    assert!(!c.orbit_pruning);
    assert!(c.membership_filter);
    assert_eq!(SearchConfig::default().refine_strategy, RefineStrategy::FullRescan);
}
