//! Backtracking search over propagated domains.
//!
//! The solver enforces node consistency, then arc consistency, then runs a depth-first search
//! that picks variables by minimum remaining values (ties broken by highest degree, then by
//! definition order) and tries values in least-constraining order. Each tentative extension is
//! checked against the whole assignment before recursing, and undone before the next value is
//! tried.

use std::cmp::Reverse;
use std::collections::HashMap;

use instant::{Duration, Instant};
use log::{debug, info, trace};

use crate::error::CrosswordError;
use crate::propagate::{
    ac3, enforce_node_consistency, revise, Arc, ArcConsistencyFailure, ArcConsistencyResult,
    Domains,
};
use crate::puzzle::{Puzzle, Variable, VariableId, WordId};
use crate::INTERRUPT_FREQUENCY;

/// A partial mapping from variables to chosen words. Each variable appears at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    /// An empty assignment for a puzzle with the given number of variables.
    pub fn new(variable_count: usize) -> Assignment {
        Assignment {
            words: vec![None; variable_count],
            assigned_count: 0,
        }
    }

    pub fn get(&self, variable_id: VariableId) -> Option<WordId> {
        self.words[variable_id]
    }

    pub fn contains(&self, variable_id: VariableId) -> bool {
        self.words[variable_id].is_some()
    }

    /// Assign a word, returning the word previously assigned to this variable, if any.
    pub fn insert(&mut self, variable_id: VariableId, word_id: WordId) -> Option<WordId> {
        let previous = self.words[variable_id].replace(word_id);
        if previous.is_none() {
            self.assigned_count += 1;
        }
        previous
    }

    /// Unassign a variable entirely.
    pub fn remove(&mut self, variable_id: VariableId) -> Option<WordId> {
        let previous = self.words[variable_id].take();
        if previous.is_some() {
            self.assigned_count -= 1;
        }
        previous
    }

    pub fn len(&self) -> usize {
        self.assigned_count
    }

    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    /// Does every variable have a word?
    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.words.len()
    }

    /// Assigned `(variable, word)` pairs in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (VariableId, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(variable_id, word_id)| word_id.map(|word_id| (variable_id, word_id)))
    }

    /// Resolve ids against the puzzle, yielding each assigned variable with its word.
    pub fn entries<'p>(
        &'p self,
        puzzle: &'p Puzzle,
    ) -> impl Iterator<Item = (&'p Variable, &'p str)> + 'p {
        self.iter().map(move |(variable_id, word_id)| {
            (puzzle.variable(variable_id), puzzle.word(word_id).string.as_str())
        })
    }
}

/// Optional bounds on how long a search may run. Exceeding one aborts the search, which is
/// reported separately from proving that no fill exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub time_limit: Option<Duration>,
    pub max_states: Option<u64>,
}

impl SearchLimits {
    /// Convert a time limit given in (possibly fractional) seconds. Negative, NaN and
    /// unrepresentably large values are rejected.
    pub fn time_limit_from_secs(secs: f64) -> Result<Duration, CrosswordError> {
        Duration::try_from_secs_f64(secs)
            .map_err(|source| CrosswordError::TimeLimit { secs, source })
    }
}

/// Run-time configuration for a `Solver`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverConfig {
    pub limits: SearchLimits,

    /// After each consistent extension, re-run AC-3 on a snapshot of the domains with the chosen
    /// variable fixed, and reject the value if that wipes out a domain.
    pub maintain_arc_consistency: bool,
}

/// A struct tracking statistics about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: u64,
    pub backtracks: u64,
    pub consistency_checks: u64,
    pub revisions: u64,
    pub propagation_duration: Duration,
    pub search_duration: Duration,
    pub duration: Duration,
}

/// Why a search was stopped before it finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    TimeLimit,
    StateLimit,
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillFailure {
    /// Propagation emptied this variable's domain, so the search never ran.
    Unsatisfiable { variable: VariableId },

    /// The search tried every candidate without finding a fill.
    Exhausted,

    /// A `SearchLimits` bound was hit before the search finished.
    Aborted(AbortReason),
}

/// Choose the unassigned variable with the fewest remaining values, preferring the one with the
/// most neighbors, then the lowest id.
pub fn select_unassigned_variable(
    puzzle: &Puzzle,
    domains: &Domains,
    assignment: &Assignment,
) -> Option<VariableId> {
    // `min_by_key` keeps the first of equal elements, so ids break the last tie.
    puzzle
        .variable_ids()
        .filter(|&variable_id| !assignment.contains(variable_id))
        .min_by_key(|&variable_id| {
            (
                domains.len(variable_id),
                Reverse(puzzle.neighbors(variable_id).len()),
            )
        })
}

/// Return the domain of `variable_id` ordered by how many candidates each word would rule out
/// across the unassigned neighbors, fewest first. Ties keep ascending word id order.
pub fn order_domain_values(
    puzzle: &Puzzle,
    domains: &Domains,
    variable_id: VariableId,
    assignment: &Assignment,
) -> Vec<WordId> {
    // For each unassigned neighbor: our cell index, the neighbor's domain size, and how many of
    // its remaining words place each letter in the shared cell.
    let crossings: Vec<(usize, usize, HashMap<char, usize>)> = puzzle
        .neighbors(variable_id)
        .iter()
        .filter(|&&neighbor_id| !assignment.contains(neighbor_id))
        .filter_map(|&neighbor_id| {
            let (cell_idx, neighbor_cell_idx) = puzzle.overlap(variable_id, neighbor_id)?;
            let mut glyph_counts: HashMap<char, usize> = HashMap::new();
            for word_id in domains.iter(neighbor_id) {
                if let Some(glyph) = puzzle.word(word_id).glyph(neighbor_cell_idx) {
                    *glyph_counts.entry(glyph).or_insert(0) += 1;
                }
            }
            Some((cell_idx, domains.len(neighbor_id), glyph_counts))
        })
        .collect();

    let mut scored: Vec<(usize, WordId)> = domains
        .iter(variable_id)
        .map(|word_id| {
            let word = puzzle.word(word_id);
            let eliminated: usize = crossings
                .iter()
                .map(|(cell_idx, option_count, glyph_counts)| {
                    let compatible = word
                        .glyph(*cell_idx)
                        .and_then(|glyph| glyph_counts.get(&glyph))
                        .copied()
                        .unwrap_or(0);
                    option_count - compatible
                })
                .sum();
            (eliminated, word_id)
        })
        .collect();

    scored.sort_unstable();
    scored.into_iter().map(|(_, word_id)| word_id).collect()
}

/// Check the entire assignment: every word must fit its variable's length, and every pair of
/// assigned crossing variables must agree on the shared cell.
///
/// This re-checks everything on every call. Only the newest variable's crossings can have
/// changed, so a delta check would give the same answers faster if it's ever needed.
pub fn consistent(puzzle: &Puzzle, assignment: &Assignment) -> bool {
    for (variable_id, word_id) in assignment.iter() {
        if puzzle.word(word_id).len() != puzzle.variable(variable_id).length {
            return false;
        }
    }

    for (variable_id, word_id) in assignment.iter() {
        let word = puzzle.word(word_id);

        for &neighbor_id in puzzle.neighbors(variable_id) {
            let Some(neighbor_word_id) = assignment.get(neighbor_id) else {
                continue;
            };
            if let Some((cell_idx, neighbor_cell_idx)) = puzzle.overlap(variable_id, neighbor_id) {
                if word.glyph(cell_idx) != puzzle.word(neighbor_word_id).glyph(neighbor_cell_idx) {
                    return false;
                }
            }
        }
    }

    true
}

/// Marker for a search stopped by `SearchLimits`.
#[derive(Debug)]
struct SearchAborted(AbortReason);

/// Per-run state for the recursive search.
struct Search<'a> {
    puzzle: &'a Puzzle,
    config: &'a SolverConfig,
    deadline: Option<Instant>,
    // Frames entered so far; the clock is read on every `INTERRUPT_FREQUENCY`th one.
    calls: u64,
    statistics: Statistics,
}

impl<'a> Search<'a> {
    fn new(puzzle: &'a Puzzle, config: &'a SolverConfig, start: Instant) -> Search<'a> {
        Search {
            puzzle,
            config,
            deadline: config.limits.time_limit.map(|limit| start + limit),
            calls: 0,
            statistics: Statistics::default(),
        }
    }

    fn check_limits(&mut self) -> Result<(), SearchAborted> {
        let call = self.calls;
        self.calls += 1;

        if let Some(max_states) = self.config.limits.max_states {
            if self.statistics.states >= max_states {
                return Err(SearchAborted(AbortReason::StateLimit));
            }
        }
        if let Some(deadline) = self.deadline {
            if call % INTERRUPT_FREQUENCY == 0 && Instant::now() >= deadline {
                return Err(SearchAborted(AbortReason::TimeLimit));
            }
        }
        Ok(())
    }

    /// Propagate the choice of `word_id` for `variable_id` into a fresh copy of the domains.
    /// Returns `None` if that empties any domain.
    fn infer(
        &self,
        variable_id: VariableId,
        word_id: WordId,
        assignment: &Assignment,
        domains: &Domains,
    ) -> Option<Domains> {
        let mut snapshot = domains.clone();
        snapshot.restrict(variable_id, word_id);

        let arcs: Vec<Arc> = self
            .puzzle
            .neighbors(variable_id)
            .iter()
            .filter(|&&neighbor_id| !assignment.contains(neighbor_id))
            .map(|&neighbor_id| (neighbor_id, variable_id))
            .collect();

        ac3(self.puzzle, &mut snapshot, Some(arcs)).ok().map(|_| snapshot)
    }

    /// Extend `assignment` depth-first until it's complete. On `Ok(false)` or `Err`, the
    /// assignment is returned to the state it was in when this was called.
    fn backtrack(
        &mut self,
        assignment: &mut Assignment,
        domains: &Domains,
    ) -> Result<bool, SearchAborted> {
        if assignment.is_complete() {
            return Ok(true);
        }
        self.check_limits()?;

        let Some(variable_id) = select_unassigned_variable(self.puzzle, domains, assignment) else {
            return Ok(true);
        };

        for word_id in order_domain_values(self.puzzle, domains, variable_id, assignment) {
            trace!(
                "trying {} for {}",
                self.puzzle.word(word_id).string,
                self.puzzle.variable(variable_id)
            );
            assignment.insert(variable_id, word_id);
            self.statistics.consistency_checks += 1;

            if consistent(self.puzzle, assignment) {
                self.statistics.states += 1;

                let result = if self.config.maintain_arc_consistency {
                    match self.infer(variable_id, word_id, assignment, domains) {
                        Some(snapshot) => self.backtrack(assignment, &snapshot),
                        None => Ok(false),
                    }
                } else {
                    self.backtrack(assignment, domains)
                };

                match result {
                    Ok(true) => return Ok(true),
                    Ok(false) => {}
                    Err(aborted) => {
                        assignment.remove(variable_id);
                        return Err(aborted);
                    }
                }
            }

            assignment.remove(variable_id);
        }

        self.statistics.backtracks += 1;
        Ok(false)
    }
}

/// Solves a crossword by constraint propagation followed by backtracking search.
pub struct Solver<'a> {
    puzzle: &'a Puzzle,
    domains: Domains,
    config: SolverConfig,
    statistics: Statistics,
}

impl<'a> Solver<'a> {
    /// Create a solver where every variable's domain is the whole dictionary.
    pub fn new(puzzle: &'a Puzzle) -> Solver<'a> {
        Solver::with_config(puzzle, SolverConfig::default())
    }

    pub fn with_config(puzzle: &'a Puzzle, config: SolverConfig) -> Solver<'a> {
        Solver {
            puzzle,
            domains: Domains::new(puzzle),
            config,
            statistics: Statistics::default(),
        }
    }

    pub fn puzzle(&self) -> &Puzzle {
        self.puzzle
    }

    pub fn domains(&self) -> &Domains {
        &self.domains
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn enforce_node_consistency(&mut self) {
        enforce_node_consistency(self.puzzle, &mut self.domains);
    }

    pub fn revise(&mut self, x: VariableId, y: VariableId) -> bool {
        revise(self.puzzle, &mut self.domains, x, y)
    }

    pub fn ac3(&mut self, arcs: Option<Vec<Arc>>) -> ArcConsistencyResult {
        ac3(self.puzzle, &mut self.domains, arcs)
    }

    pub fn select_unassigned_variable(&self, assignment: &Assignment) -> Option<VariableId> {
        select_unassigned_variable(self.puzzle, &self.domains, assignment)
    }

    pub fn order_domain_values(
        &self,
        variable_id: VariableId,
        assignment: &Assignment,
    ) -> Vec<WordId> {
        order_domain_values(self.puzzle, &self.domains, variable_id, assignment)
    }

    pub fn consistent(&self, assignment: &Assignment) -> bool {
        consistent(self.puzzle, assignment)
    }

    /// Node consistency followed by AC-3. A variable left with no words after the length filter
    /// fails here too, without waiting for a revision to notice it.
    pub fn propagate(&mut self) -> ArcConsistencyResult {
        self.enforce_node_consistency();

        if let Some(variable) = self.puzzle.variable_ids().find(|&id| self.domains.is_empty(id)) {
            debug!("no words of the right length for {}", self.puzzle.variable(variable));
            return Err(ArcConsistencyFailure { variable });
        }

        self.ac3(None)
    }

    /// Search from the given partial assignment over the current domains. Returns the completed
    /// assignment, or `None` if there is none (or the configured limits were hit).
    pub fn backtrack(&mut self, mut assignment: Assignment) -> Option<Assignment> {
        let mut search = Search::new(self.puzzle, &self.config, Instant::now());
        let found = search.backtrack(&mut assignment, &self.domains);
        let statistics = search.statistics;
        self.absorb(&statistics);

        match found {
            Ok(true) => Some(assignment),
            _ => None,
        }
    }

    /// Enforce node consistency, then arc consistency, then backtrack. Returns `None` when no
    /// fill exists; use `fill` to tell that apart from hitting a limit.
    pub fn solve(&mut self) -> Option<Assignment> {
        self.fill().ok().map(|success| success.assignment)
    }

    /// Same pipeline as `solve`, reporting statistics and why a fill wasn't found.
    pub fn fill(&mut self) -> Result<FillSuccess, FillFailure> {
        let start = Instant::now();
        info!(
            "filling {} variables from {} words",
            self.puzzle.variables().len(),
            self.puzzle.words().len()
        );

        let propagation = self.propagate();
        self.statistics.propagation_duration = start.elapsed();

        match propagation {
            Ok(success) => self.statistics.revisions += success.revisions as u64,
            Err(ArcConsistencyFailure { variable }) => {
                self.statistics.duration = start.elapsed();
                info!("propagation proved the puzzle unsatisfiable; skipping search");
                return Err(FillFailure::Unsatisfiable { variable });
            }
        }

        let search_start = Instant::now();
        let mut search = Search::new(self.puzzle, &self.config, start);
        let mut assignment = Assignment::new(self.puzzle.variables().len());
        let found = search.backtrack(&mut assignment, &self.domains);
        let statistics = search.statistics;
        self.absorb(&statistics);
        self.statistics.search_duration = search_start.elapsed();
        self.statistics.duration = start.elapsed();

        match found {
            Ok(true) => {
                info!("found a fill after {} states", self.statistics.states);
                Ok(FillSuccess {
                    statistics: self.statistics.clone(),
                    assignment,
                })
            }
            Ok(false) => {
                info!("search exhausted after {} states", self.statistics.states);
                Err(FillFailure::Exhausted)
            }
            Err(SearchAborted(reason)) => {
                info!("search aborted ({:?}) after {} states", reason, self.statistics.states);
                Err(FillFailure::Aborted(reason))
            }
        }
    }

    fn absorb(&mut self, search: &Statistics) {
        self.statistics.states += search.states;
        self.statistics.backtracks += search.backtracks;
        self.statistics.consistency_checks += search.consistency_checks;
    }
}

/// Search for a valid fill for the given puzzle.
pub fn find_fill(puzzle: &Puzzle, config: SolverConfig) -> Result<FillSuccess, FillFailure> {
    Solver::with_config(puzzle, config).fill()
}
