//! krds - Convert e-reader data store files to JSON
//!
//! This tool decodes reader data store files (`.yjr`, `.yjf`, `.azw3r`,
//! `.azw3f`, `.mbp1`, `.mbs`) and writes their contents as JSON next to the
//! input, as `<input>.json`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use krds_core::{DecoderConfig, Map, ReaderDataStore, TimeZoneMode, FILE_EXTENSIONS};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Convert reader data store files to JSON
#[derive(Parser, Debug)]
#[command(name = "krds")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// File to convert (.azw3f, .azw3r, .mbp1, .mbs, .yjf, .yjr), or a
    /// directory to search for such files
    input: PathBuf,

    /// Output path (single file only; default: <input>.json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Render timestamps in UTC instead of local time
    #[arg(long)]
    utc: bool,

    /// Maximum nesting depth of named objects
    #[arg(long, default_value_t = krds_core::store::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Fail on unconsumed bytes after the last entry
    #[arg(long)]
    strict: bool,

    /// Decode only - don't write any output
    #[arg(long, conflicts_with = "stdout")]
    dry_run: bool,

    /// Print JSON to standard output instead of writing a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,
}

impl Cli {
    fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig::new()
            .max_depth(self.max_depth)
            .time_zone(if self.utc {
                TimeZoneMode::Utc
            } else {
                TimeZoneMode::Local
            })
            .strict_trailing(self.strict)
    }
}

/// Per-run conversion counters
#[derive(Default)]
struct ConversionStats {
    converted: usize,
    failed: usize,
    diagnostics: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    if cli.input.is_dir() {
        process_directory(&cli, &cli.input)
    } else {
        process_single_file(&cli, &cli.input)
    }
}

/// Convert one file, failing the process on any decode error
fn process_single_file(cli: &Cli, file: &Path) -> Result<()> {
    if !file.exists() {
        bail!("File does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    let store = ReaderDataStore::with_config(cli.decoder_config());
    let output = cli.output.clone().unwrap_or_else(|| output_path(file));
    convert(cli, &store, file, &output)?;
    Ok(())
}

/// Convert every reader data store file below a directory
fn process_directory(cli: &Cli, directory: &Path) -> Result<()> {
    if cli.output.is_some() {
        bail!("--output cannot be used with a directory input");
    }

    info!("Scanning directory: {}", directory.display());

    let store = ReaderDataStore::with_config(cli.decoder_config());
    let mut stats = ConversionStats::default();

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if !is_store_file(path) {
            trace!("Skipping: {}", path.display());
            continue;
        }

        match convert(cli, &store, path, &output_path(path)) {
            Ok(diagnostics) => {
                stats.converted += 1;
                stats.diagnostics += diagnostics;
            }
            Err(e) => {
                // Log error but continue with other files
                warn!("Error converting {}: {:#}", path.display(), e);
                stats.failed += 1;
            }
        }
    }

    info!(
        "Summary: {} converted, {} failed, {} diagnostics",
        stats.converted, stats.failed, stats.diagnostics
    );

    if stats.failed > 0 {
        bail!("{} file(s) failed to convert", stats.failed);
    }
    Ok(())
}

/// Decode `input` and write it to `output`; returns the diagnostic count
fn convert(
    cli: &Cli,
    store: &ReaderDataStore,
    input: &Path,
    output: &Path,
) -> Result<usize> {
    if !cli.stdout {
        println!("Decoding {}", input.display());
    }

    let data = fs::read(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    trace!("Read {} bytes from {}", data.len(), input.display());

    let decoded = store
        .decode(&data)
        .map_err(|err| decode_failure(input, err))?;
    debug!(
        "Decoded {} top-level entries from {}",
        decoded.entries().len(),
        input.display()
    );
    for diagnostic in decoded.diagnostics() {
        debug!("{}: {}", input.display(), diagnostic);
    }
    let diagnostics = decoded.diagnostics().len();
    let entries = decoded.into_entries();

    if cli.dry_run {
        println!("Would write: {}", output.display());
    } else if cli.stdout {
        println!("{}", render_json(&entries)?);
    } else {
        let json = render_json(&entries)?;
        fs::write(output, json)
            .with_context(|| format!("Failed to write file: {}", output.display()))?;
        println!("Completed conversion to {}", output.display());
    }

    Ok(diagnostics)
}

/// Adds the input path and, where known, the failing byte offset
fn decode_failure(input: &Path, err: krds_core::Error) -> anyhow::Error {
    let context = match err.offset() {
        Some(offset) => format!(
            "Failed to decode {} at byte offset {offset}",
            input.display()
        ),
        None if err.is_schema_error() => format!(
            "Failed to decode {}: unexpected structure layout",
            input.display()
        ),
        None => format!("Failed to decode: {}", input.display()),
    };
    anyhow::Error::new(err).context(context)
}

/// Pretty-print with four-space indentation
fn render_json(entries: &Map) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries
        .serialize(&mut serializer)
        .context("Failed to serialize JSON")?;
    String::from_utf8(buf).context("Serialized JSON is not UTF-8")
}

/// `<input>.json`, keeping the original extension
fn output_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

/// Matches the reader data store extensions, case-insensitively
fn is_store_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FILE_EXTENSIONS.iter().any(|ext| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
