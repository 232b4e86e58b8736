//! Fill a crossword grid from a word list by treating each slot as a constraint-satisfaction
//! variable: length filtering, AC-3 arc consistency, then backtracking with MRV/degree variable
//! selection and least-constraining-value ordering.

pub mod error;
pub mod propagate;
pub mod puzzle;
pub mod render;
pub mod search;

#[cfg(test)]
mod test_util;

pub use error::CrosswordError;
pub use propagate::{ac3, enforce_node_consistency, revise, Arc, Domains};
pub use puzzle::{Direction, GridCoord, Puzzle, Variable, VariableId, Word, WordId};
pub use render::{letter_grid, render_grid, render_image};
pub use search::{
    find_fill, AbortReason, Assignment, FillFailure, FillSuccess, SearchLimits, Solver,
    SolverConfig, Statistics,
};

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// The expected maximum number of slots crossing any one slot.
pub const MAX_CROSSINGS: usize = MAX_SLOT_LENGTH;

/// How many search states we visit between checks of the time limit.
pub const INTERRUPT_FREQUENCY: u64 = 64;
