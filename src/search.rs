pub use frontier::Frontier;

use {
    num::{One, Zero},
    std::{
        collections::{HashMap, HashSet},
        hash::Hash,
        ops::Add,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
    },
    thiserror::Error,
    tracing::{debug, trace},
};

mod frontier;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum SearchError {
    /// The starting configuration was rejected before any expansion took place
    #[error("invalid search instance: {0}")]
    InvalidInstance(String),

    /// `pop_min` or `peek_min` was called on an empty frontier
    #[error("the frontier is empty")]
    EmptyFrontier,

    /// The frontier was exhausted without reaching a goal
    #[error("no path from the start to a goal exists")]
    NoPathFound,

    /// An external caller signalled cancellation between loop iterations
    #[error("the search was cancelled")]
    Cancelled,

    /// The expansion budget ran out before a goal was popped
    #[error("the expansion budget was exhausted after {0} expansions")]
    BudgetExceeded(u64),
}

/// A cloneable handle for requesting that a running search stop at its next loop iteration.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Optional limits on a search run.
///
/// An expansion is the closing of one popped non-goal vertex, so a goal that surfaces within the
/// budget still succeeds. Both limits are checked once per loop iteration and report through
/// their own `SearchError` variants rather than masquerading as exhaustion.
#[derive(Clone, Debug, Default)]
pub struct SearchOptions {
    pub max_expansions: Option<u64>,
    pub cancel: Option<CancelToken>,
}

pub struct InformedSearchState<V: Clone + Eq + Hash, C: Clone + Ord> {
    frontier: Frontier<V, C>,
    cost_so_far: HashMap<V, C>,
    closed: HashSet<V>,
    neighbors: Vec<V>,
}

impl<V: Clone + Eq + Hash, C: Clone + Ord> InformedSearchState<V, C> {
    fn clear(&mut self) {
        self.frontier.clear();
        self.cost_so_far.clear();
        self.closed.clear();
        self.neighbors.clear();
    }
}

impl<V: Clone + Eq + Hash, C: Clone + Ord> Default for InformedSearchState<V, C> {
    fn default() -> Self {
        Self {
            frontier: Default::default(),
            cost_so_far: Default::default(),
            closed: Default::default(),
            neighbors: Default::default(),
        }
    }
}

pub fn zero_heuristic<S: InformedSearch + ?Sized>(_search: &S, _vertex: &S::Vertex) -> S::Cost {
    S::Cost::zero()
}

/// An implementation of https://en.wikipedia.org/wiki/A*_search_algorithm over an implicit graph
/// with unit-cost edges, doubling as https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm when run
/// with `zero_heuristic`.
///
/// The driver owns the best-known cost per visited vertex, the closed set, and the frontier; the
/// implementor supplies the start vertex, the goal and validity contracts, neighbor expansion,
/// and a non-negative cost-to-go estimate. An admissible estimate (one that never overstates the
/// true remaining cost) makes the returned cost minimal.
pub trait InformedSearch {
    type Vertex: Clone + Eq + Hash;
    type Cost: Add<Self::Cost, Output = Self::Cost> + Clone + One + Ord + Sized + Zero;

    fn start(&self) -> &Self::Vertex;
    fn is_goal(&self, vertex: &Self::Vertex) -> bool;
    fn heuristic(&self, vertex: &Self::Vertex) -> Self::Cost;
    fn neighbors(&self, vertex: &Self::Vertex, neighbors: &mut Vec<Self::Vertex>);

    /// Rejects a malformed starting configuration before the search begins.
    fn validate(&self) -> Result<(), SearchError> {
        Ok(())
    }

    /// Invoked once per popped vertex with its path cost and its priority at pop time, before the
    /// goal test. The default does nothing; the driver itself never prints.
    fn observe_pop(&mut self, _vertex: &Self::Vertex, _cost: &Self::Cost, _priority: &Self::Cost) {}

    fn run_internal<F: Fn(&Self, &Self::Vertex) -> Self::Cost>(
        &mut self,
        state: &mut InformedSearchState<Self::Vertex, Self::Cost>,
        options: &SearchOptions,
        heuristic: F,
    ) -> Result<Self::Cost, SearchError> {
        self.validate()?;
        state.clear();

        let start: Self::Vertex = self.start().clone();
        let start_priority: Self::Cost = heuristic(self, &start);

        state.cost_so_far.insert(start.clone(), Self::Cost::zero());
        state.frontier.upsert(start, start_priority);

        let mut expansions: u64 = 0_u64;

        while !state.frontier.is_empty() {
            let (current, priority): (Self::Vertex, Self::Cost) = state.frontier.pop_min()?;

            if options
                .cancel
                .as_ref()
                .map_or(false, CancelToken::is_cancelled)
            {
                debug!(expansions, "search cancelled");

                return Err(SearchError::Cancelled);
            }

            let cost: Self::Cost = state.cost_so_far[&current].clone();

            self.observe_pop(&current, &cost, &priority);

            if self.is_goal(&current) {
                debug!(expansions, "goal reached");

                return Ok(cost);
            }

            if options
                .max_expansions
                .map_or(false, |max_expansions| expansions >= max_expansions)
            {
                debug!(expansions, "expansion budget exhausted");

                return Err(SearchError::BudgetExceeded(expansions));
            }

            expansions += 1_u64;
            state.closed.insert(current.clone());
            self.neighbors(&current, &mut state.neighbors);

            trace!(
                expansions,
                frontier = state.frontier.len(),
                successors = state.neighbors.len(),
                "expanded vertex"
            );

            for neighbor in state.neighbors.drain(..) {
                if state.closed.contains(&neighbor) {
                    continue;
                }

                let tentative: Self::Cost = cost.clone() + Self::Cost::one();

                if state
                    .cost_so_far
                    .get(&neighbor)
                    .map_or(true, |best| tentative < *best)
                {
                    let neighbor_priority: Self::Cost =
                        tentative.clone() + heuristic(self, &neighbor);

                    state.cost_so_far.insert(neighbor.clone(), tentative);
                    state.frontier.upsert(neighbor, neighbor_priority);
                }
            }
        }

        debug!(expansions, "frontier exhausted");

        Err(SearchError::NoPathFound)
    }

    fn run_a_star_internal(
        &mut self,
        state: &mut InformedSearchState<Self::Vertex, Self::Cost>,
        options: &SearchOptions,
    ) -> Result<Self::Cost, SearchError> {
        self.run_internal(state, options, Self::heuristic)
    }

    fn run_a_star(&mut self) -> Result<Self::Cost, SearchError> {
        self.run_a_star_internal(&mut InformedSearchState::default(), &SearchOptions::default())
    }

    fn run_a_star_with_options(
        &mut self,
        options: &SearchOptions,
    ) -> Result<Self::Cost, SearchError> {
        self.run_a_star_internal(&mut InformedSearchState::default(), options)
    }

    fn run_dijkstra_internal(
        &mut self,
        state: &mut InformedSearchState<Self::Vertex, Self::Cost>,
        options: &SearchOptions,
    ) -> Result<Self::Cost, SearchError> {
        self.run_internal(state, options, zero_heuristic::<Self>)
    }

    fn run_dijkstra(&mut self) -> Result<Self::Cost, SearchError> {
        self.run_dijkstra_internal(&mut InformedSearchState::default(), &SearchOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashMap};

    /// A corridor of cells `0..length` with unit steps between adjacent cells, an optional
    /// impassable cell, and the exact remaining distance as the estimate.
    struct CorridorSearch {
        length: u32,
        wall: Option<u32>,
        start: u32,
        pops: u32,
    }

    impl CorridorSearch {
        fn new(length: u32) -> Self {
            Self {
                length,
                wall: None,
                start: 0_u32,
                pops: 0_u32,
            }
        }
    }

    impl InformedSearch for CorridorSearch {
        type Vertex = u32;
        type Cost = u32;

        fn start(&self) -> &Self::Vertex {
            &self.start
        }

        fn is_goal(&self, vertex: &Self::Vertex) -> bool {
            *vertex == self.length - 1_u32
        }

        fn heuristic(&self, vertex: &Self::Vertex) -> Self::Cost {
            self.length - 1_u32 - *vertex
        }

        fn neighbors(&self, vertex: &Self::Vertex, neighbors: &mut Vec<Self::Vertex>) {
            neighbors.clear();
            neighbors.extend(
                [vertex.checked_sub(1_u32), vertex.checked_add(1_u32)]
                    .into_iter()
                    .flatten()
                    .filter(|cell| *cell < self.length && Some(*cell) != self.wall),
            );
        }

        fn validate(&self) -> Result<(), SearchError> {
            if self.start < self.length {
                Ok(())
            } else {
                Err(SearchError::InvalidInstance(format!(
                    "start cell {} is outside the corridor",
                    self.start
                )))
            }
        }

        fn observe_pop(
            &mut self,
            _vertex: &Self::Vertex,
            _cost: &Self::Cost,
            _priority: &Self::Cost,
        ) {
            self.pops += 1_u32;
        }
    }

    /// A fixed directed graph with per-vertex estimates, for exercising the decrease-key path:
    /// the estimates are chosen so the longer route to a vertex surfaces first and the shorter
    /// route must lower its pending priority.
    struct FixedGraphSearch {
        start: char,
        goal: char,
        edges: HashMap<char, Vec<char>>,
        estimates: HashMap<char, u32>,
    }

    impl InformedSearch for FixedGraphSearch {
        type Vertex = char;
        type Cost = u32;

        fn start(&self) -> &Self::Vertex {
            &self.start
        }

        fn is_goal(&self, vertex: &Self::Vertex) -> bool {
            *vertex == self.goal
        }

        fn heuristic(&self, vertex: &Self::Vertex) -> Self::Cost {
            self.estimates.get(vertex).copied().unwrap_or(0_u32)
        }

        fn neighbors(&self, vertex: &Self::Vertex, neighbors: &mut Vec<Self::Vertex>) {
            neighbors.clear();

            if let Some(successors) = self.edges.get(vertex) {
                neighbors.extend(successors.iter().copied());
            }
        }
    }

    #[test]
    fn test_run_a_star_finds_the_shortest_path() {
        assert_eq!(CorridorSearch::new(6_u32).run_a_star(), Ok(5_u32));
    }

    #[test]
    fn test_run_a_star_pops_once_per_closed_vertex() {
        let mut corridor: CorridorSearch = CorridorSearch::new(6_u32);

        corridor.run_a_star().unwrap();

        // The exact estimate walks straight down the corridor
        assert_eq!(corridor.pops, 6_u32);
    }

    #[test]
    fn test_run_dijkstra_agrees_with_run_a_star() {
        assert_eq!(
            CorridorSearch::new(9_u32).run_dijkstra(),
            CorridorSearch::new(9_u32).run_a_star()
        );
    }

    #[test]
    fn test_unreachable_goal_reports_no_path() {
        let mut corridor: CorridorSearch = CorridorSearch::new(6_u32);

        corridor.wall = Some(3_u32);

        assert_eq!(corridor.run_a_star(), Err(SearchError::NoPathFound));
    }

    #[test]
    fn test_invalid_instance_is_rejected_before_expansion() {
        let mut corridor: CorridorSearch = CorridorSearch::new(4_u32);

        corridor.start = 7_u32;

        assert_eq!(
            corridor.run_a_star(),
            Err(SearchError::InvalidInstance(
                "start cell 7 is outside the corridor".into()
            ))
        );
        assert_eq!(corridor.pops, 0_u32);
    }

    #[test]
    fn test_expansion_budget_is_reported_distinctly() {
        let options: SearchOptions = SearchOptions {
            max_expansions: Some(2_u64),
            ..Default::default()
        };

        assert_eq!(
            CorridorSearch::new(8_u32).run_a_star_with_options(&options),
            Err(SearchError::BudgetExceeded(2_u64))
        );
    }

    #[test]
    fn test_goal_within_budget_still_succeeds() {
        let options: SearchOptions = SearchOptions {
            max_expansions: Some(5_u64),
            ..Default::default()
        };

        assert_eq!(
            CorridorSearch::new(6_u32).run_a_star_with_options(&options),
            Ok(5_u32)
        );
    }

    #[test]
    fn test_cancellation_is_observed_after_the_first_pop() {
        let cancel: CancelToken = CancelToken::new();

        cancel.cancel();

        let options: SearchOptions = SearchOptions {
            cancel: Some(cancel),
            ..Default::default()
        };

        assert_eq!(
            CorridorSearch::new(6_u32).run_a_star_with_options(&options),
            Err(SearchError::Cancelled)
        );
    }

    #[test]
    fn test_shorter_path_found_later_lowers_the_pending_priority() {
        // Routes to 'c': via 'b' at cost 2, and via 'd'/'e' at cost 3. The estimates delay 'b'
        // until after 'e' has enqueued 'c' at the longer cost, so reaching 'c' through 'b' has to
        // lower a pending priority rather than insert a fresh vertex.
        let mut graph: FixedGraphSearch = FixedGraphSearch {
            start: 'a',
            goal: 'g',
            edges: [
                ('a', vec!['b', 'd']),
                ('b', vec!['c']),
                ('d', vec!['e']),
                ('e', vec!['c']),
                ('c', vec!['g']),
            ]
            .into_iter()
            .collect(),
            estimates: [('b', 10_u32), ('c', 10_u32)].into_iter().collect(),
        };

        assert_eq!(graph.run_a_star(), Ok(3_u32));
    }
}
