use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use sm83_opgen::{compile, CompilerConfig, CostStyle, Strictness};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Compile an SM83 opcode table into interpreter dispatch arms"
)]
struct Opts {
    /// JSON compiler configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Render malformed records as compile_error! arms instead of aborting
    #[arg(long)]
    lenient: bool,
    /// How conditional branch costs are rendered
    #[arg(long, value_enum)]
    cost_style: Option<CostStyleArg>,
    /// Write arms to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,
    /// Opcode table, or `-` for stdin
    #[arg(value_name = "TABLE")]
    input: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CostStyleArg {
    Pair,
    NotTaken,
}

impl From<CostStyleArg> for CostStyle {
    fn from(arg: CostStyleArg) -> Self {
        match arg {
            CostStyleArg::Pair => CostStyle::Pair,
            CostStyleArg::NotTaken => CostStyle::NotTaken,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let opts = Opts::parse();
    let mut cfg = match &opts.config {
        Some(path) => CompilerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => CompilerConfig::default(),
    };
    if opts.lenient {
        cfg.strictness = Strictness::Lenient;
    }
    if let Some(style) = opts.cost_style {
        cfg.cost_style = style.into();
    }

    let summary = match (opts.input.as_str(), &opts.out) {
        ("-", None) => compile(io::stdin().lock(), io::stdout().lock(), &cfg)?,
        ("-", Some(out)) => compile(io::stdin().lock(), BufWriter::new(File::create(out)?), &cfg)?,
        (path, out) => {
            let input = BufReader::new(
                File::open(path).with_context(|| format!("opening table {path}"))?,
            );
            match out {
                Some(out) => compile(input, BufWriter::new(File::create(out)?), &cfg)?,
                None => compile(input, io::stdout().lock(), &cfg)?,
            }
        }
    };

    if summary.diagnostics > 0 {
        eprintln!(
            "warning: {} record(s) rendered as diagnostics; review the output before use",
            summary.diagnostics
        );
    }
    Ok(())
}
