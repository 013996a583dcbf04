use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use std::io;
use std::path::{Path, PathBuf};

use sm83_opgen::{compile, CompilerConfig, Strictness};
use sm83_optable::{family_stats, load_table, Entry};

#[derive(Parser, Debug)]
#[command(author, version, about = "SM83 opcode table inspector", long_about=None)]
struct Cli {
    /// JSON compiler configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Opcode table path
    #[arg(value_name = "TABLE")]
    input: PathBuf,
    /// Subcommand
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// One line per opcode: instruction, cycles, addressing modes
    List {
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Include the generated arm
        #[arg(long)]
        arms: bool,
        /// Write output to file instead of stdout
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Per-family opcode counts and cycle totals
    Families {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Compile the table to a sink and report the outcome
    Check {
        /// Count diagnostics instead of stopping at the first error
        #[arg(long)]
        lenient: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat { Text, Json }

fn render_list(entries: &[Entry], arms: bool) -> String {
    use std::fmt::Write as _;
    let mut buf = String::new();
    for e in entries {
        let _ = write!(buf, "{:#04x}  ", e.opcode);
        match &e.instruction {
            None => { let _ = write!(buf, "{:<14} {:<6}", "<reserved>", "1"); }
            Some(ins) => {
                let cycles = e.cycles.map(|c| c.to_string()).unwrap_or_default();
                let modes: Vec<String> = e.operands.iter()
                    .map(|o| o.mode.map(|m| format!("{m:?}")).unwrap_or_else(|| o.text.clone()))
                    .collect();
                let _ = write!(buf, "{ins:<14} {cycles:<6} {}", modes.join(", "));
            }
        }
        if arms { let _ = write!(buf, "\n      {}", e.arm); }
        buf.push('\n');
    }
    buf
}

fn load_config(path: Option<&Path>) -> Result<CompilerConfig> {
    match path {
        Some(path) => CompilerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(CompilerConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::List { format, arms, out } => {
            let entries = load_table(&cli.input, &cfg)?;
            let text = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&entries)?,
                OutputFormat::Text => render_list(&entries, arms),
            };
            if let Some(path) = out { std::fs::write(path, text)?; } else { print!("{}", text); }
        }
        Command::Families { format } => {
            let report = family_stats(&load_table(&cli.input, &cfg)?);
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Text => {
                    println!("{:<20} {:>5} {:>5} {:>7}", "family", "count", "cond", "cycles");
                    for f in &report.families {
                        println!("{:<20} {:>5} {:>5} {:>7}", f.family, f.count, f.conditional, f.cycles);
                    }
                    println!("{} opcodes, {} reserved", report.opcodes, report.reserved);
                }
            }
        }
        Command::Check { lenient } => {
            if lenient { cfg.strictness = Strictness::Lenient; }
            let input = io::BufReader::new(std::fs::File::open(&cli.input)?);
            let summary = compile(input, io::sink(), &cfg)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            anyhow::ensure!(summary.complete, "table does not cover every opcode");
            anyhow::ensure!(summary.diagnostics == 0, "{} record(s) could not be compiled", summary.diagnostics);
        }
    }

    Ok(())
}
