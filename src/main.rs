use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use yomi_dict::config::Config;
use yomi_dict::{read_source, write_line, write_package, Dictionary, Encoder, OutputFormat};

#[derive(Parser)]
#[command(name = "yomi-dict", version, about = "Build and query binary reading → candidate dictionaries")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (defaults to ./yomi-dict.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a `reading /cand1/cand2/` source file into a packaged dictionary.
    Build {
        input: PathBuf,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Array identifier for C / Rust output.
        #[arg(long)]
        symbol: Option<String>,
        /// Fail if any source line is skipped.
        #[arg(long)]
        strict: bool,
    },
    /// Look readings up in a binary dictionary.
    Lookup {
        dict: PathBuf,
        #[arg(required = true)]
        readings: Vec<String>,
    },
    /// Print every entry of a binary dictionary in source format.
    ///
    /// A trailing empty candidate is printed as `//` and is dropped if the
    /// output is built again; such entries are reported as warnings.
    Dump {
        dict: PathBuf,
        /// Check every record and the sort order first.
        #[arg(long)]
        verify: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let fallback = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .init();

    match cli.command {
        Command::Build {
            input,
            output,
            format,
            symbol,
            strict,
        } => {
            let mut cfg = Config::load(cli.config.as_deref())?;
            if let Some(format) = format {
                cfg.output.format = format;
            }
            if let Some(symbol) = symbol {
                cfg.output.symbol = symbol;
            }
            cfg.source.strict |= strict;
            build(&cfg, &input, output.as_deref())
        }
        Command::Lookup { dict, readings } => lookup(&dict, &readings),
        Command::Dump { dict, verify } => dump(&dict, verify),
    }
}

fn build(cfg: &Config, input: &Path, output: Option<&Path>) -> anyhow::Result<()> {
    let file = File::open(input).with_context(|| format!("opening {}", input.display()))?;
    let parsed = read_source(BufReader::new(file))
        .with_context(|| format!("reading {}", input.display()))?;

    for warning in &parsed.warnings {
        tracing::warn!(text = %warning.text, "{}: skipping {}", input.display(), warning);
    }
    if cfg.source.strict && !parsed.warnings.is_empty() {
        bail!(
            "{}: {} line(s) skipped in strict mode",
            input.display(),
            parsed.warnings.len()
        );
    }

    let mut encoder = Encoder::new();
    for entry in parsed.entries {
        encoder.push(entry)?;
    }
    let dict = encoder.finish()?;
    tracing::info!(
        entries = dict.entry_count(),
        bytes = dict.byte_len(),
        "built dictionary from {}",
        input.display()
    );

    let source_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let opts = cfg.package_options(source_name);

    match output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            write_package(&dict, &opts, BufWriter::new(file))
                .with_context(|| format!("writing {}", path.display()))?;
        }
        None => write_package(&dict, &opts, io::stdout().lock())?,
    }
    Ok(())
}

fn load(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn lookup(path: &Path, readings: &[String]) -> anyhow::Result<()> {
    let bytes = load(path)?;
    let dict = Dictionary::new(&bytes).with_context(|| format!("loading {}", path.display()))?;
    let mut out = io::stdout().lock();

    for reading in readings {
        let records = dict.lookup(reading)?;
        if records.is_empty() {
            eprintln!("{reading}: not found");
            continue;
        }
        for record in records {
            write_line(&mut out, record.reading(), record.candidates())?;
        }
    }
    Ok(())
}

fn dump(path: &Path, verify: bool) -> anyhow::Result<()> {
    let bytes = load(path)?;
    let dict = Dictionary::new(&bytes).with_context(|| format!("loading {}", path.display()))?;
    if verify {
        dict.verify()
            .with_context(|| format!("verifying {}", path.display()))?;
        tracing::info!(entries = dict.len(), "dictionary verified");
    }

    let mut out = BufWriter::new(io::stdout().lock());
    let mut lossy = 0usize;
    for record in dict.iter() {
        let record = record?;
        if !write_line(&mut out, record.reading(), record.candidates())? {
            tracing::warn!(
                slot = record.slot(),
                "entry {:?} does not survive a rebuild",
                record.reading()
            );
            lossy += 1;
        }
    }
    out.flush()?;
    if lossy > 0 {
        tracing::warn!(entries = lossy, "dump is not a faithful source");
    }
    Ok(())
}
