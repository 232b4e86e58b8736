use std::fs;
use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::error::CrosswordError;
use crate::puzzle::Puzzle;
use crate::search::Assignment;

/// The character drawn for a wall cell.
pub const BLOCK: char = '█';

/// Side length of one grid cell in a rendered image, in pixels.
pub const CELL_SIZE: u32 = 100;

/// Width of the dark border around every fillable cell.
pub const CELL_BORDER: u32 = 2;

const LETTER_SCALE: f32 = 80.0;

const WALL: Rgb<u8> = Rgb([0, 0, 0]);
const PAPER: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

/// Place every assigned word's chars at its variable's cells. Unassigned fillable cells and walls
/// are `None`.
pub fn letter_grid(puzzle: &Puzzle, assignment: &Assignment) -> Vec<Vec<Option<char>>> {
    let mut letters = vec![vec![None; puzzle.width()]; puzzle.height()];

    for (variable, word) in assignment.entries(puzzle) {
        for ((row, col), glyph) in variable.cells().zip(word.chars()) {
            letters[row][col] = Some(glyph);
        }
    }

    letters
}

/// Turn the given puzzle and assignment into a rendered string, one line per row.
pub fn render_grid(puzzle: &Puzzle, assignment: &Assignment) -> String {
    letter_grid(puzzle, assignment)
        .iter()
        .enumerate()
        .map(|(row, letters)| {
            letters
                .iter()
                .enumerate()
                .map(|(col, letter)| {
                    if puzzle.is_fillable((row, col)) {
                        letter.unwrap_or(' ')
                    } else {
                        BLOCK
                    }
                })
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Draw the grid as an image: walls and cell borders in black, fillable cells in white and each
/// assigned letter centred in its cell. Without a font the cells are left blank.
pub fn render_image(
    puzzle: &Puzzle,
    assignment: &Assignment,
    font: Option<&FontVec>,
) -> RgbImage {
    let width = puzzle.width() as u32 * CELL_SIZE;
    let height = puzzle.height() as u32 * CELL_SIZE;
    let interior = CELL_SIZE - 2 * CELL_BORDER;
    let scale = PxScale::from(LETTER_SCALE);

    let mut image = RgbImage::from_pixel(width, height, WALL);

    for (row, letters) in letter_grid(puzzle, assignment).into_iter().enumerate() {
        for (col, letter) in letters.into_iter().enumerate() {
            if !puzzle.is_fillable((row, col)) {
                continue;
            }

            let left = (col as u32 * CELL_SIZE + CELL_BORDER) as i32;
            let top = (row as u32 * CELL_SIZE + CELL_BORDER) as i32;
            let cell = Rect::at(left, top).of_size(interior, interior);
            draw_filled_rect_mut(&mut image, cell, PAPER);

            if let (Some(letter), Some(font)) = (letter, font) {
                let text = letter.to_string();
                let (text_width, text_height) = text_size(scale, font, &text);
                let x = left + (interior as i32 - text_width as i32) / 2;
                let y = top + (interior as i32 - text_height as i32) / 2;
                draw_text_mut(&mut image, INK, x, y, scale, font, &text);
            }
        }
    }

    image
}

/// Does this path's extension name an image format we can write?
pub fn is_image_path(path: impl AsRef<Path>) -> bool {
    ImageFormat::from_path(path).is_ok()
}

/// Read a TrueType or OpenType font for `render_image`.
pub fn load_font(path: impl AsRef<Path>) -> Result<FontVec, CrosswordError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| CrosswordError::io(path, source))?;

    FontVec::try_from_vec(bytes).map_err(|source| CrosswordError::Font {
        path: path.to_path_buf(),
        source,
    })
}

/// Save a rendered image, picking the format from the path's extension.
pub fn save_image(image: &RgbImage, path: impl AsRef<Path>) -> Result<(), CrosswordError> {
    let path = path.as_ref();
    image.save(path).map_err(|source| CrosswordError::Image {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::{
        is_image_path, letter_grid, load_font, render_grid, render_image, save_image, CELL_BORDER,
        CELL_SIZE,
    };
    use crate::error::CrosswordError;
    use crate::search::{Assignment, Solver};
    use crate::test_util::template;

    #[test]
    fn test_render_solved_grid() {
        let puzzle = template(&["___", "#_#"], &["cat", "dog", "ox"]);
        let assignment = Solver::new(&puzzle).solve().expect("Failed to find a fill");

        assert_eq!(render_grid(&puzzle, &assignment), "DOG\n█X█");
    }

    #[test]
    fn test_render_partial_assignment_leaves_blanks() {
        let puzzle = template(&["___", "#_#"], &["cat", "dog", "ox"]);
        let mut assignment = Assignment::new(2);
        assignment.insert(0, 0);

        assert_eq!(render_grid(&puzzle, &assignment), "CAT\n█ █");
        assert_eq!(
            letter_grid(&puzzle, &assignment),
            vec![
                vec![Some('C'), Some('A'), Some('T')],
                vec![None, None, None],
            ]
        );
    }

    #[test]
    fn test_render_image_has_one_square_per_cell() {
        let puzzle = template(&["___", "#_#"], &["cat", "dog", "ox"]);
        let assignment = Solver::new(&puzzle).solve().expect("Failed to find a fill");

        let image = render_image(&puzzle, &assignment, None);

        assert_eq!(image.dimensions(), (3 * CELL_SIZE, 2 * CELL_SIZE));

        let black = Rgb([0, 0, 0]);
        let white = Rgb([255, 255, 255]);
        let middle = CELL_SIZE / 2;
        // Fillable cells are white inside a black border.
        assert_eq!(*image.get_pixel(CELL_SIZE + middle, middle), white);
        assert_eq!(*image.get_pixel(CELL_SIZE + middle, CELL_SIZE + middle), white);
        assert_eq!(*image.get_pixel(CELL_SIZE, middle), black);
        assert_eq!(*image.get_pixel(CELL_SIZE + CELL_BORDER, middle), white);
        // Walls are solid black.
        assert_eq!(*image.get_pixel(middle, CELL_SIZE + middle), black);
        assert_eq!(*image.get_pixel(2 * CELL_SIZE + middle, CELL_SIZE + middle), black);
    }

    #[test]
    fn test_saved_image_keeps_its_dimensions() {
        let puzzle = template(&["__", "__"], &["at", "to", "ta"]);
        let image = render_image(&puzzle, &Assignment::new(4), None);
        let path = std::env::temp_dir().join("crossword-render-test.png");

        save_image(&image, &path).unwrap();
        let reloaded = image::open(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!((reloaded.width(), reloaded.height()), (2 * CELL_SIZE, 2 * CELL_SIZE));
    }

    #[test]
    fn test_image_paths_are_chosen_by_extension() {
        assert!(is_image_path("out.png"));
        assert!(is_image_path("out.JPG"));
        assert!(!is_image_path("out.txt"));
        assert!(!is_image_path("out"));
    }

    #[test]
    fn test_load_font_reports_bad_files() {
        let missing = load_font("/nonexistent/font.ttf").unwrap_err();
        assert!(matches!(missing, CrosswordError::Io { .. }));

        let manifest = concat!(env!("CARGO_MANIFEST_DIR"), "/Cargo.toml");
        let not_a_font = load_font(manifest).unwrap_err();
        assert!(matches!(not_a_font, CrosswordError::Font { .. }));
        assert!(not_a_font.to_string().ends_with("Cargo.toml"));
    }
}
