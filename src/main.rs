use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use log::{debug, warn, LevelFilter};

use crossword::render::{is_image_path, load_font, render_image, save_image};
use crossword::{
    find_fill, render_grid, Assignment, CrosswordError, Puzzle, SearchLimits, SolverConfig,
};

/// Fill a crossword structure with words from a word list.
#[derive(Parser)]
#[command(name = "generate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Grid structure file; `_` marks a fillable cell.
    structure: PathBuf,

    /// Word list, one word per line.
    words: PathBuf,

    /// Also write the filled grid to this file. Image extensions such as `.png` get a drawn
    /// grid; anything else gets the text rendering.
    output: Option<PathBuf>,

    /// Font used to draw letters when `output` is an image.
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Give up after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    time_limit: Option<f64>,

    /// Give up after exploring this many search states.
    #[arg(long)]
    max_states: Option<u64>,

    /// Maintain arc consistency after every assignment.
    #[arg(long)]
    inference: bool,

    /// Log more (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn solver_config(&self) -> Result<SolverConfig, CrosswordError> {
        Ok(SolverConfig {
            limits: SearchLimits {
                time_limit: self.time_limit.map(SearchLimits::time_limit_from_secs).transpose()?,
                max_states: self.max_states,
            },
            maintain_arc_consistency: self.inference,
        })
    }
}

fn save(
    cli: &Cli,
    puzzle: &Puzzle,
    assignment: &Assignment,
    output: &Path,
) -> Result<(), CrosswordError> {
    if is_image_path(output) {
        let font = cli.font.as_ref().map(load_font).transpose()?;
        if font.is_none() {
            warn!("no --font given, so {} will have empty cells", output.display());
        }
        save_image(&render_image(puzzle, assignment, font.as_ref()), output)
    } else {
        fs::write(output, render_grid(puzzle, assignment) + "\n").map_err(|source| {
            CrosswordError::Write {
                path: output.to_path_buf(),
                source,
            }
        })
    }
}

fn main() -> Result<(), CrosswordError> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = cli.solver_config()?;
    let puzzle = Puzzle::from_files(&cli.structure, &cli.words)?;

    match find_fill(&puzzle, config) {
        Ok(success) => {
            debug!("{:?}", success.statistics);

            println!("{}", render_grid(&puzzle, &success.assignment));

            if let Some(output) = &cli.output {
                save(&cli, &puzzle, &success.assignment, output)?;
            }

            Ok(())
        }
        Err(failure) => {
            debug!("{:?}", failure);
            println!("No solution.");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use instant::Duration;

    use super::Cli;
    use crossword::CrosswordError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(["generate", "structure.txt", "words.txt"].iter().chain(args))
            .expect("bad command line")
    }

    #[test]
    fn test_flags_map_onto_solver_config() {
        let config = parse(&["--time-limit", "2.5", "--max-states", "10", "--inference"])
            .solver_config()
            .unwrap();

        assert_eq!(config.limits.time_limit, Some(Duration::from_millis(2500)));
        assert_eq!(config.limits.max_states, Some(10));
        assert!(config.maintain_arc_consistency);
        assert_eq!(parse(&[]).solver_config().unwrap(), Default::default());
    }

    #[test]
    fn test_unrepresentable_time_limit_is_an_error() {
        for value in ["inf", "1e300", "NaN"] {
            let result = parse(&["--time-limit", value]).solver_config();

            assert!(
                matches!(result, Err(CrosswordError::TimeLimit { .. })),
                "{} was accepted",
                value
            );
        }
    }
}
