//! Shared fixtures and proptest strategies for the unit tests.

use proptest::prelude::*;

use crate::puzzle::{Puzzle, VariableId};
use crate::search::Assignment;

/// Build a puzzle from structure rows (`_` = fillable) and a word list.
pub(crate) fn template(rows: &[&str], words: &[&str]) -> Puzzle {
    Puzzle::from_template(&rows.join("\n"), &words.join("\n")).expect("bad test template")
}

fn arb_structure() -> impl Strategy<Value = Vec<Vec<bool>>> {
    (1usize..=4, 1usize..=4).prop_flat_map(|(height, width)| {
        prop::collection::vec(prop::collection::vec(prop::bool::weighted(0.75), width), height)
    })
}

/// Small random grids over a two-letter alphabet, so that crossings are often but not always
/// satisfiable.
pub(crate) fn arb_puzzle() -> impl Strategy<Value = Puzzle> {
    (arb_structure(), prop::collection::vec("[AB]{1,4}", 0..12))
        .prop_map(|(structure, words)| Puzzle::new(structure, words).unwrap())
}

/// A random puzzle together with a random partial assignment over it. Words are picked from the
/// whole dictionary, so lengths and crossings are frequently wrong.
pub(crate) fn arb_partial_assignment() -> impl Strategy<Value = (Puzzle, Assignment)> {
    arb_puzzle()
        .prop_flat_map(|puzzle| {
            let variable_count = puzzle.variables().len();
            let word_count = puzzle.words().len();
            let choices = if word_count == 0 {
                Just(vec![None; variable_count]).boxed()
            } else {
                prop::collection::vec(prop::option::of(0..word_count), variable_count).boxed()
            };
            (Just(puzzle), choices)
        })
        .prop_map(|(puzzle, choices)| {
            let mut assignment = Assignment::new(puzzle.variables().len());
            for (variable_id, word_id) in choices.into_iter().enumerate() {
                if let Some(word_id) = word_id {
                    assignment.insert(variable_id, word_id);
                }
            }
            (puzzle, assignment)
        })
}

/// Random grids with a planted fill: every cell gets a random letter and the word list contains
/// the word each variable spells, plus some noise.
pub(crate) fn arb_planted_puzzle() -> impl Strategy<Value = Puzzle> {
    arb_structure()
        .prop_flat_map(|structure| {
            let height = structure.len();
            let width = structure[0].len();
            let letters = prop::collection::vec(
                prop::collection::vec(prop::char::range('A', 'C'), width),
                height,
            );
            (Just(structure), letters, prop::collection::vec("[A-C]{2,4}", 0..8))
        })
        .prop_map(|(structure, letters, noise)| {
            let shape = Puzzle::new(structure.clone(), Vec::<String>::new()).unwrap();
            let planted: Vec<String> = shape
                .variables()
                .iter()
                .map(|variable| variable.cells().map(|(row, col)| letters[row][col]).collect())
                .collect();

            Puzzle::new(structure, planted.into_iter().chain(noise)).unwrap()
        })
}

/// Write every assigned word into a letter grid, cell by cell. Returns false if a word's length
/// differs from its variable's or two words put different letters in the same cell. Independent
/// of the overlap table, so it can be used to check `consistent`.
pub(crate) fn agrees_cell_by_cell(puzzle: &Puzzle, assignment: &Assignment) -> bool {
    let mut letters = vec![vec![None; puzzle.width()]; puzzle.height()];

    for (variable, word) in assignment.entries(puzzle) {
        if word.chars().count() != variable.length {
            return false;
        }
        for ((row, col), glyph) in variable.cells().zip(word.chars()) {
            match letters[row][col] {
                Some(existing) if existing != glyph => return false,
                _ => letters[row][col] = Some(glyph),
            }
        }
    }

    true
}

/// Exhaustively decide whether any complete, consistent assignment exists, ignoring all
/// heuristics. Only suitable for tiny puzzles.
pub(crate) fn brute_force_exists(puzzle: &Puzzle) -> bool {
    fn extend(puzzle: &Puzzle, chosen: &mut Vec<usize>) -> bool {
        let variable_id: VariableId = chosen.len();
        if variable_id == puzzle.variables().len() {
            return true;
        }
        let length = puzzle.variable(variable_id).length;

        for word_id in 0..puzzle.words().len() {
            if puzzle.word(word_id).len() != length {
                continue;
            }
            let word = puzzle.word(word_id);
            let fits = chosen.iter().enumerate().all(|(other_id, &other_word)| {
                match puzzle.overlap(variable_id, other_id) {
                    Some((i, j)) => word.glyph(i) == puzzle.word(other_word).glyph(j),
                    None => true,
                }
            });
            if fits {
                chosen.push(word_id);
                if extend(puzzle, chosen) {
                    return true;
                }
                chosen.pop();
            }
        }

        false
    }

    extend(puzzle, &mut vec![])
}
