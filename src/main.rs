use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use either::Either;
use log::debug;
use thiserror::Error;

use axdag::Dag;
use axir::conf::parse_conf;
use axir::lower::lower_module;
use axir::parser::parse_module;
use axmiso::enumerate::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_INPUT, Enumerator};
use axmiso::parser::{MisoInstr, parse_miso};
use axmiso::select::Selector;
use axmiso::synth::synthesize_area;

/// Instruction-set extension explorer over block-structured dataflow DAGs.
#[derive(Parser)]
#[command(name = "axion", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Enumerate MISO candidate instructions as canonical RPN keys
    Enum {
        /// Input program
        source: PathBuf,

        /// Write keys here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Largest input count of a candidate
        #[arg(long, default_value_t = DEFAULT_MAX_INPUT)]
        max_input: usize,

        /// Deepest operand chain of a candidate
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
    /// Tile a program against an instruction library and report its cost
    Isel {
        /// Input program
        source: PathBuf,

        /// Instruction library, one canonical key per line
        miso: PathBuf,

        /// Optional per-block weights, `name = weight` per line
        conf: Option<PathBuf>,
    },
    /// Estimate the total area of an instruction set
    Area {
        /// Instruction library, one canonical key per line
        miso: PathBuf,
    },
}

#[derive(Debug, Error)]
enum Failure {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("{path}: parse failed")]
    Source { path: String },
    #[error("{path}: {source}")]
    Miso {
        path: String,
        source: axmiso::parser::ParseError,
    },
    #[error("{path}: {source}")]
    Conf {
        path: String,
        source: axir::conf::ConfError,
    },
    #[error("{path}: expected {expected} weight entries, found {found}")]
    WeightCount {
        path: String,
        expected: usize,
        found: usize,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            eprintln!("error: {}", failure);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Failure> {
    match command {
        Command::Enum {
            source,
            output,
            max_input,
            max_depth,
        } => {
            let mut dags = load_dags(&source)?;
            let mut enumerator = Enumerator::new(max_input, max_depth);
            for dag in &mut dags {
                enumerator.enumerate(dag);
            }
            debug!("{} unique instructions", enumerator.keys().len());

            let mut sink = match &output {
                Some(path) => Either::Right(fs::File::create(path).map_err(|source| {
                    Failure::Io {
                        path: path.display().to_string(),
                        source,
                    }
                })?),
                None => Either::Left(std::io::stdout()),
            };
            let sink_name = output
                .as_deref()
                .map_or_else(|| "<stdout>".to_string(), |p| p.display().to_string());
            for key in enumerator.keys() {
                writeln!(sink, "{}", key).map_err(|source| Failure::Io {
                    path: sink_name.clone(),
                    source,
                })?;
            }
        }

        Command::Isel { source, miso, conf } => {
            let mut dags = load_dags(&source)?;
            let instrs = load_miso(&miso)?;

            let mut selector = Selector::new();
            for instr in &instrs {
                selector.add_instr(&instr.dag, instr.root);
            }

            let weights = match &conf {
                Some(path) => {
                    let text = read(path)?;
                    let entries = parse_conf(&text).map_err(|source| Failure::Conf {
                        path: path.display().to_string(),
                        source,
                    })?;
                    if entries.len() != dags.len() {
                        return Err(Failure::WeightCount {
                            path: path.display().to_string(),
                            expected: dags.len(),
                            found: entries.len(),
                        });
                    }
                    entries.into_iter().map(|(_, weight)| weight).collect()
                }
                None => vec![1u64; dags.len()],
            };

            let mut total = 0u64;
            for (dag, weight) in dags.iter_mut().zip(weights) {
                total += selector.select(dag) * weight;
            }
            println!("STA: {}", total);
        }

        Command::Area { miso } => {
            let instrs = load_miso(&miso)?;
            let area = synthesize_area(instrs.iter().map(|instr| &instr.dag));
            println!("Area: {}", area);
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, Failure> {
    fs::read_to_string(path).map_err(|source| Failure::Io {
        path: path.display().to_string(),
        source,
    })
}

fn load_dags(path: &Path) -> Result<Vec<Dag>, Failure> {
    let src = read(path)?;
    let module = match parse_module(&src) {
        Ok(module) => module,
        Err(reports) => {
            let mut colors = ColorGenerator::new();
            let color = colors.next();
            for report in &reports {
                Report::build(ReportKind::Error, report.span.clone())
                    .with_message(&report.message)
                    .with_label(
                        Label::new(report.span.clone())
                            .with_message("the error occurred here")
                            .with_color(color),
                    )
                    .finish()
                    .eprint(Source::from(src.as_str()))
                    .unwrap();
            }
            return Err(Failure::Source {
                path: path.display().to_string(),
            });
        }
    };
    let dags = lower_module(&module);
    debug!("lowered {} blocks from {}", dags.len(), path.display());
    Ok(dags)
}

fn load_miso(path: &Path) -> Result<Vec<MisoInstr>, Failure> {
    let text = read(path)?;
    parse_miso(&text).map_err(|source| Failure::Miso {
        path: path.display().to_string(),
        source,
    })
}
