//! Node and arc consistency over per-variable word domains.
//!
//! A domain is a `BitSet` of word ids into the puzzle's dictionary. Every variable owns its own
//! set, and the only mutation this module performs on a set is removal, so domain sizes are
//! non-increasing across every call here.

use std::collections::HashSet;

use bit_set::BitSet;
use log::{debug, trace};

use crate::puzzle::{Puzzle, VariableId, WordId};

/// An ordered pair of crossing variables `(x, y)`, meaning "make `x` consistent with `y`".
pub type Arc = (VariableId, VariableId);

/// The current candidate words for every variable, indexed by `VariableId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    sets: Vec<BitSet>,
}

impl Domains {
    /// Give every variable its own copy of the full dictionary.
    pub fn new(puzzle: &Puzzle) -> Domains {
        let word_count = puzzle.words().len();
        let mut full = BitSet::with_capacity(word_count);
        for word_id in 0..word_count {
            full.insert(word_id);
        }

        Domains {
            sets: puzzle.variable_ids().map(|_| full.clone()).collect(),
        }
    }

    pub fn len(&self, variable_id: VariableId) -> usize {
        self.sets[variable_id].len()
    }

    pub fn is_empty(&self, variable_id: VariableId) -> bool {
        self.sets[variable_id].is_empty()
    }

    pub fn contains(&self, variable_id: VariableId, word_id: WordId) -> bool {
        self.sets[variable_id].contains(word_id)
    }

    /// The remaining word ids for a variable, in ascending order.
    pub fn iter(&self, variable_id: VariableId) -> impl Iterator<Item = WordId> + '_ {
        self.sets[variable_id].iter()
    }

    /// Current domain size of every variable.
    pub fn sizes(&self) -> Vec<usize> {
        self.sets.iter().map(|set| set.len()).collect()
    }

    /// Shrink a variable's domain to the single given word, or to nothing if the word was
    /// already eliminated.
    pub fn restrict(&mut self, variable_id: VariableId, word_id: WordId) {
        let keep = self.sets[variable_id].contains(word_id);
        self.sets[variable_id].clear();
        if keep {
            self.sets[variable_id].insert(word_id);
        }
    }

    fn remove_all(&mut self, variable_id: VariableId, word_ids: &[WordId]) {
        for &word_id in word_ids {
            self.sets[variable_id].remove(word_id);
        }
    }
}

/// Result from a successful call to `ac3`, reporting how many revisions shrank a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    pub revisions: usize,
}

/// Result from a failed call to `ac3`, naming the variable whose domain was wiped out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArcConsistencyFailure {
    pub variable: VariableId,
}

pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Remove every word whose length differs from its variable's length.
pub fn enforce_node_consistency(puzzle: &Puzzle, domains: &mut Domains) {
    for variable_id in puzzle.variable_ids() {
        let length = puzzle.variable(variable_id).length;
        let wrong_length: Vec<WordId> = domains
            .iter(variable_id)
            .filter(|&word_id| puzzle.word(word_id).len() != length)
            .collect();

        domains.remove_all(variable_id, &wrong_length);
    }
}

/// Make `x` arc consistent with `y`: drop every word for `x` whose letter at the shared cell
/// doesn't appear at that cell in any of `y`'s remaining words. A no-op for variables that don't
/// cross. Returns whether `x`'s domain changed; `y`'s domain is never touched.
pub fn revise(puzzle: &Puzzle, domains: &mut Domains, x: VariableId, y: VariableId) -> bool {
    let Some((x_cell, y_cell)) = puzzle.overlap(x, y) else {
        return false;
    };

    // Which letters can `y` still place in the shared cell?
    let supported: HashSet<char> = domains
        .iter(y)
        .filter_map(|word_id| puzzle.word(word_id).glyph(y_cell))
        .collect();

    let unsupported: Vec<WordId> = domains
        .iter(x)
        .filter(|&word_id| {
            !puzzle
                .word(word_id)
                .glyph(x_cell)
                .map_or(false, |glyph| supported.contains(&glyph))
        })
        .collect();

    if unsupported.is_empty() {
        return false;
    }

    trace!(
        "revise {} against {}: removed {} words",
        puzzle.variable(x),
        puzzle.variable(y),
        unsupported.len()
    );
    domains.remove_all(x, &unsupported);
    true
}

/// Establish arc consistency with AC-3. The worklist starts from `arcs` if given, otherwise from
/// every ordered pair of crossing variables, and is processed as a stack. Whenever `x` shrinks,
/// each `(z, x)` for the other neighbors `z` of `x` is pushed again; `(y, x)` is left out since
/// `y` is what `x` was just made consistent with.
pub fn ac3(puzzle: &Puzzle, domains: &mut Domains, arcs: Option<Vec<Arc>>) -> ArcConsistencyResult {
    let mut worklist: Vec<Arc> = arcs.unwrap_or_else(|| puzzle.arcs());
    let mut revisions = 0;

    while let Some((x, y)) = worklist.pop() {
        if !revise(puzzle, domains, x, y) {
            continue;
        }
        revisions += 1;

        if domains.is_empty(x) {
            debug!("arc consistency emptied the domain of {}", puzzle.variable(x));
            return Err(ArcConsistencyFailure { variable: x });
        }

        worklist.extend(
            puzzle
                .neighbors(x)
                .iter()
                .filter(|&&z| z != y)
                .map(|&z| (z, x)),
        );
    }

    debug!("arc consistency reached after {} revisions", revisions);
    Ok(ArcConsistencySuccess { revisions })
}
