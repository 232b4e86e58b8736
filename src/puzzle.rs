use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug, Display, Formatter};
use std::fs;
use std::ops::Range;
use std::path::Path;

use log::debug;
use smallvec::{smallvec, SmallVec};

use crate::error::CrosswordError;
use crate::{MAX_CROSSINGS, MAX_SLOT_LENGTH};

/// An identifier for a given variable, based on its index in the Puzzle's `variables` field.
pub type VariableId = usize;

/// An identifier for a given word, based on its index in the Puzzle's `words` field.
pub type WordId = usize;

/// Zero-indexed row and column for a cell in the grid, where row 0 is the top row.
pub type GridCoord = (usize, usize);

/// The character used for a fillable cell in a structure file. Anything else is a wall.
pub const FILLABLE_CELL: char = '_';

/// Direction that a variable is facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Across,
    Down,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// A fillable slot in the grid. Two variables are equal iff origin, direction and length all
/// match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub origin: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl Variable {
    pub fn new(origin: GridCoord, direction: Direction, length: usize) -> Variable {
        Variable { origin, direction, length }
    }

    /// The grid coordinate of the `cell_idx`th letter of this variable.
    pub fn cell(&self, cell_idx: usize) -> GridCoord {
        let (row, col) = self.origin;
        match self.direction {
            Direction::Across => (row, col + cell_idx),
            Direction::Down => (row + cell_idx, col),
        }
    }

    /// Generate the coords for each cell of this variable.
    pub fn cells(&self) -> impl Iterator<Item = GridCoord> + '_ {
        (0..self.length).map(move |cell_idx| self.cell(cell_idx))
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) {} : {}",
            self.origin.0, self.origin.1, self.direction, self.length
        )
    }
}

/// A dictionary entry, stored both as the original string and as a list of chars so that
/// positional comparisons don't need to re-walk UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub string: String,
    pub glyphs: SmallVec<[char; MAX_SLOT_LENGTH]>,
}

impl Word {
    fn new(string: String) -> Word {
        let glyphs = string.chars().collect();
        Word { string, glyphs }
    }

    /// Length in chars, which is what a variable's length is compared against.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// The char at the given position, if the word is long enough to have one.
    pub fn glyph(&self, cell_idx: usize) -> Option<char> {
        self.glyphs.get(cell_idx).copied()
    }
}

/// An immutable crossword: the grid structure, the variables derived from it, the overlaps
/// between those variables and the dictionary the variables are filled from.
#[derive(Clone)]
pub struct Puzzle {
    width: usize,
    height: usize,
    structure: Vec<Vec<bool>>,
    variables: Vec<Variable>,
    overlaps: HashMap<(VariableId, VariableId), (usize, usize)>,
    neighbors: Vec<SmallVec<[VariableId; MAX_CROSSINGS]>>,
    words: Vec<Word>,
}

impl Debug for Puzzle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Puzzle")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("variables", &self.variables)
            .field("overlaps", &self.overlaps.len())
            .field("words", &(["(", &self.words.len().to_string(), " entries)"].join("")))
            .finish()
    }
}

impl Puzzle {
    /// Build a puzzle from a rectangular grid (`true` = fillable) and a word list. Words are
    /// trimmed and uppercased; blank and duplicate entries are dropped, keeping the first
    /// occurrence so that word ids follow the input order.
    pub fn new<I, S>(structure: Vec<Vec<bool>>, words: I) -> Result<Puzzle, CrosswordError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let height = structure.len();
        let width = structure.first().map(|row| row.len()).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(CrosswordError::EmptyStructure);
        }
        if let Some((row, found)) = structure
            .iter()
            .map(|cells| cells.len())
            .enumerate()
            .find(|&(_, found)| found != width)
        {
            return Err(CrosswordError::RaggedRow { row, expected: width, found });
        }

        let mut variables = find_runs(&structure, Direction::Across);
        variables.extend(find_runs(&structure, Direction::Down));

        let (overlaps, neighbors) = build_overlaps(width, height, &variables);

        let mut seen: HashSet<String> = HashSet::new();
        let words: Vec<Word> = words
            .into_iter()
            .filter_map(|word| {
                let word = word.as_ref().trim().to_uppercase();
                if word.is_empty() || !seen.insert(word.clone()) {
                    None
                } else {
                    Some(Word::new(word))
                }
            })
            .collect();

        debug!(
            "built {}x{} puzzle with {} variables, {} overlaps and {} words",
            width,
            height,
            variables.len(),
            overlaps.len() / 2,
            words.len()
        );

        Ok(Puzzle {
            width,
            height,
            structure,
            variables,
            overlaps,
            neighbors,
            words,
        })
    }

    /// Parse a structure template, where `_` marks a fillable cell and any other char is a
    /// wall, and a newline-separated word list.
    pub fn from_template(structure: &str, words: &str) -> Result<Puzzle, CrosswordError> {
        let mut lines: Vec<&str> = structure
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        while lines.last().map_or(false, |line| line.trim().is_empty()) {
            lines.pop();
        }
        let first_content = lines
            .iter()
            .position(|line| !line.trim().is_empty())
            .unwrap_or(lines.len());

        let grid: Vec<Vec<bool>> = lines[first_content..]
            .iter()
            .map(|line| line.chars().map(|c| c == FILLABLE_CELL).collect())
            .collect();

        Puzzle::new(grid, words.lines())
    }

    /// Load a structure file and a word-list file from disk.
    pub fn from_files(
        structure_path: impl AsRef<Path>,
        words_path: impl AsRef<Path>,
    ) -> Result<Puzzle, CrosswordError> {
        let structure_path = structure_path.as_ref();
        let words_path = words_path.as_ref();

        let structure = fs::read_to_string(structure_path)
            .map_err(|source| CrosswordError::io(structure_path, source))?;
        let words = fs::read_to_string(words_path)
            .map_err(|source| CrosswordError::io(words_path, source))?;

        Puzzle::from_template(&structure, &words)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Is the cell at `(row, col)` fillable? Panics if the coordinate is outside the grid.
    pub fn is_fillable(&self, (row, col): GridCoord) -> bool {
        self.structure[row][col]
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, variable_id: VariableId) -> &Variable {
        &self.variables[variable_id]
    }

    pub fn variable_ids(&self) -> Range<VariableId> {
        0..self.variables.len()
    }

    /// Look up the id of a variable by value.
    pub fn variable_id(&self, variable: &Variable) -> Option<VariableId> {
        self.variables.iter().position(|candidate| candidate == variable)
    }

    /// The offsets of the shared cell within `x` and within `y` respectively, or `None` if the
    /// two variables don't cross.
    pub fn overlap(&self, x: VariableId, y: VariableId) -> Option<(usize, usize)> {
        self.overlaps.get(&(x, y)).copied()
    }

    /// Every ordered pair of crossing variables, in definition order.
    pub fn arcs(&self) -> Vec<(VariableId, VariableId)> {
        self.variable_ids()
            .flat_map(|x| self.neighbors[x].iter().map(move |&y| (x, y)))
            .collect()
    }

    /// All variables crossing the given one, in definition order.
    pub fn neighbors(&self, variable_id: VariableId) -> &[VariableId] {
        &self.neighbors[variable_id]
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn word(&self, word_id: WordId) -> &Word {
        &self.words[word_id]
    }
}

/// Collect the maximal runs of fillable cells of length >= 2 in the given direction, scanning
/// row by row for across and column by column for down.
fn find_runs(structure: &[Vec<bool>], direction: Direction) -> Vec<Variable> {
    let height = structure.len();
    let width = structure[0].len();

    let (lines, line_len) = match direction {
        Direction::Across => (height, width),
        Direction::Down => (width, height),
    };
    let coord = |line: usize, idx: usize| match direction {
        Direction::Across => (line, idx),
        Direction::Down => (idx, line),
    };

    let mut result = vec![];

    for line in 0..lines {
        let mut run_start: Option<usize> = None;

        for idx in 0..=line_len {
            let fillable = idx < line_len && {
                let (row, col) = coord(line, idx);
                structure[row][col]
            };

            match (fillable, run_start) {
                (true, None) => run_start = Some(idx),
                (false, Some(start)) => {
                    if idx - start > 1 {
                        result.push(Variable::new(coord(line, start), direction, idx - start));
                    }
                    run_start = None;
                }
                _ => {}
            }
        }
    }

    result
}

type OverlapMap = HashMap<(VariableId, VariableId), (usize, usize)>;

/// Build the symmetric overlap map and per-variable neighbor lists from a map of which
/// variables occupy each cell.
fn build_overlaps(
    width: usize,
    height: usize,
    variables: &[Variable],
) -> (OverlapMap, Vec<SmallVec<[VariableId; MAX_CROSSINGS]>>) {
    // (variable id, cell index within variable)
    let mut entries_by_cell: HashMap<GridCoord, SmallVec<[(VariableId, usize); 2]>> =
        HashMap::new();

    for (variable_id, variable) in variables.iter().enumerate() {
        for (cell_idx, (row, col)) in variable.cells().enumerate() {
            assert!(
                row < height && col < width,
                "variable {} has a cell outside the grid",
                variable
            );
            entries_by_cell
                .entry((row, col))
                .or_insert_with(|| smallvec![])
                .push((variable_id, cell_idx));
        }
    }

    let mut overlaps: OverlapMap = HashMap::new();
    let mut neighbors: Vec<SmallVec<[VariableId; MAX_CROSSINGS]>> =
        variables.iter().map(|_| smallvec![]).collect();

    for entries in entries_by_cell.values() {
        match entries.as_slice() {
            [_] => {}
            &[(x, x_cell), (y, y_cell)] => {
                let first = overlaps.insert((x, y), (x_cell, y_cell));
                let second = overlaps.insert((y, x), (y_cell, x_cell));
                assert!(
                    first.is_none() && second.is_none(),
                    "variables {} and {} share more than one cell",
                    variables[x],
                    variables[y]
                );
                neighbors[x].push(y);
                neighbors[y].push(x);
            }
            _ => panic!("More than two variables crossing in cell?"),
        }
    }

    for variable_neighbors in &mut neighbors {
        variable_neighbors.sort_unstable();
    }

    (overlaps, neighbors)
}
