//! Command-line interface for thai-segmenter
//!
//! Usage:
//!   thai-segmenter clean   [-i FILE] [-o FILE] [--stats]
//!   thai-segmenter sentseg [-i FILE] [-o FILE] [--stats]
//!   thai-segmenter tokenize [-i FILE] [-o FILE] [-c N] [--stats]
//!   thai-segmenter tokpos  [-i FILE] [-o FILE] [-c N] [--stats]

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, Metadata, Record};
use serde::Serialize;

use thai_segmenter::tasks::{CleanOptions, LineCleaner, LineProcessor};
use thai_segmenter::{Order, Segmenter, SegmenterConfig};

#[derive(Parser)]
#[command(name = "thai-segmenter")]
#[command(about = "Thai Segmentation utilities")]
#[command(version)]
struct Cli {
    /// Log resource loading (-v) and decoder details (-vv) to stderr
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InOut {
    /// Input file (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print counters as JSON to stderr at the end
    #[arg(long)]
    stats: bool,
}

#[derive(Args)]
struct Model {
    /// Segmenter configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Decode with the trigram model
    #[arg(long)]
    trigram: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean input from non-thai and blank lines
    Clean {
        #[command(flatten)]
        io: InOut,

        /// Don't filter blank/empty lines
        #[arg(long)]
        keep_blanks: bool,

        /// Keep lines not containing any thai characters
        #[arg(long)]
        keep_non_thai: bool,

        /// Input has no `<source>` header lines
        #[arg(long)]
        no_source_headers: bool,

        /// Don't fold whitespace runs into a single blank
        #[arg(long)]
        no_normalize_whitespaces: bool,
    },

    /// Sentence segmentize input lines
    Sentseg {
        #[command(flatten)]
        io: InOut,

        #[command(flatten)]
        model: Model,
    },

    /// Tokenize input lines
    Tokenize {
        #[command(flatten)]
        io: InOut,

        #[command(flatten)]
        model: Model,

        /// Only process this tab-separated column (1 == first column)
        #[arg(short = 'c', long, short_alias = 'f', alias = "field", value_parser = clap::value_parser!(u32).range(1..))]
        column: Option<u32>,
    },

    /// Tokenize and POS-tag input lines
    Tokpos {
        #[command(flatten)]
        io: InOut,

        #[command(flatten)]
        model: Model,

        /// Only process this tab-separated column (1 == first column)
        #[arg(short = 'c', long, short_alias = 'f', alias = "field", value_parser = clap::value_parser!(u32).range(1..))]
        column: Option<u32>,
    },
}

/// Plain stderr logger
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn open_input(path: Option<&Path>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    })
}

fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

fn print_stats<T: Serialize>(summary: &T) -> CliResult {
    eprintln!("{}", serde_json::to_string(summary)?);
    Ok(())
}

fn load_segmenter(model: &Model) -> Result<Segmenter, thai_segmenter::Error> {
    let config = match &model.config {
        Some(path) => SegmenterConfig::from_file(path)?,
        None => SegmenterConfig::default(),
    };
    let segmenter = Segmenter::from_config(&config)?;
    Ok(if model.trigram {
        segmenter.with_order(Order::Trigram)
    } else {
        segmenter
    })
}

fn cmd_clean(io: &InOut, options: CleanOptions) -> CliResult {
    let input = open_input(io.input.as_deref())?;
    let mut out = open_output(io.output.as_deref())?;
    let mut cleaner = LineCleaner::new(options);

    for line in input.lines() {
        if let Some(cleaned) = cleaner.clean_line(&line?) {
            writeln!(out, "{}", cleaned)?;
        }
    }
    out.flush()?;

    if io.stats {
        print_stats(&cleaner.summary())?;
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum LineTask {
    Sentences,
    Tokens,
    TaggedTokens,
}

fn cmd_lines(io: &InOut, model: &Model, column: Option<u32>, task: LineTask) -> CliResult {
    let segmenter = load_segmenter(model)?;
    let input = open_input(io.input.as_deref())?;
    let mut out = open_output(io.output.as_deref())?;

    let mut processor = LineProcessor::new(&segmenter)
        .with_column(column.map(|c| c as usize - 1))
        .with_headers(true);

    for line in input.lines() {
        let line = line?;
        let produced = match task {
            LineTask::Sentences => processor.sentence_segment_line(&line)?,
            LineTask::Tokens => processor.tokenize_line(&line)?,
            LineTask::TaggedTokens => processor.tokenize_and_tag_line(&line)?,
        };
        for text in produced {
            writeln!(out, "{}", text)?;
        }
    }
    out.flush()?;

    if io.stats {
        print_stats(&processor.summary())?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Clean {
            io,
            keep_blanks,
            keep_non_thai,
            no_source_headers,
            no_normalize_whitespaces,
        } => cmd_clean(
            io,
            CleanOptions {
                skip_headers: !no_source_headers,
                filter_blank: !keep_blanks,
                filter_non_thai: !keep_non_thai,
                normalize_whitespace: !no_normalize_whitespaces,
            },
        ),
        Commands::Sentseg { io, model } => cmd_lines(io, model, None, LineTask::Sentences),
        Commands::Tokenize { io, model, column } => {
            cmd_lines(io, model, *column, LineTask::Tokens)
        }
        Commands::Tokpos { io, model, column } => {
            cmd_lines(io, model, *column, LineTask::TaggedTokens)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_of(args: &[&str]) -> Option<u32> {
        match Cli::try_parse_from(args.iter().copied()).map(|cli| cli.command) {
            Ok(Commands::Tokenize { column, .. }) | Ok(Commands::Tokpos { column, .. }) => column,
            _ => None,
        }
    }

    #[test]
    fn test_column_flags() {
        assert_eq!(column_of(&["thai-segmenter", "tokenize", "-c", "2"]), Some(2));
        assert_eq!(column_of(&["thai-segmenter", "tokenize", "-f", "3"]), Some(3));
        assert_eq!(column_of(&["thai-segmenter", "tokpos", "--field", "1"]), Some(1));
        assert!(Cli::try_parse_from(["thai-segmenter", "tokpos", "-f", "0"]).is_err());
    }
}
