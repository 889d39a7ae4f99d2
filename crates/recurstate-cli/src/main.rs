//! `recurstate` CLI -- decode, encode, expand, and verify MAPI appointment
//! recurrence state blobs from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Decode a blob to pretty-printed JSON (hex text on stdin)
//! cat blob.hex | recurstate decode --hex
//!
//! # Decode a raw blob file
//! recurstate decode -i blob.bin
//!
//! # Re-encode a decoded pattern back into a blob, as hex text
//! recurstate decode -i blob.bin | recurstate encode --hex
//!
//! # List the concrete instances for January 2024
//! recurstate expand -i blob.bin --from 2024-01-01 --to 2024-02-01
//!
//! # Check that a blob survives decode -> encode byte for byte
//! recurstate verify -i blob.bin
//! ```

use std::fs;
use std::io::{self, Read, Write};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};

use occurrence_engine::expand::{expand, OccurrenceSource};
use recurstate_core::{decode, encode, RecurrencePattern};

#[derive(Parser)]
#[command(
    name = "recurstate",
    version,
    about = "MAPI appointment recurrence state blob tool"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a recurrence blob to pretty-printed JSON
    Decode {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Treat the input as hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
    },
    /// Encode a JSON pattern back into a recurrence blob
    Encode {
        /// Input JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Emit hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
    },
    /// Expand a blob into its concrete occurrences
    Expand {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// Treat the input as hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
        /// Window start date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Window end date, exclusive (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Decode then re-encode a blob and compare the bytes
    Verify {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Treat the input as hex text instead of raw bytes
        #[arg(long)]
        hex: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Decode { input, output, hex } => {
            let blob = read_blob(input.as_deref(), hex)?;
            let pattern = decode(&blob).context("Failed to decode recurrence blob")?;
            let json = serde_json::to_string_pretty(&pattern)?;
            write_output(output.as_deref(), &json)?;
        }
        Commands::Encode { input, output, hex } => {
            let json = read_input(input.as_deref())?;
            let pattern: RecurrencePattern =
                serde_json::from_str(&json).context("Failed to parse pattern JSON")?;
            let blob = encode(&pattern).context("Failed to encode pattern")?;
            if hex {
                write_output(output.as_deref(), &format_hex(&blob))?;
            } else {
                write_binary(output.as_deref(), &blob)?;
            }
        }
        Commands::Expand {
            input,
            output,
            hex,
            from,
            to,
            json,
        } => {
            let blob = read_blob(input.as_deref(), hex)?;
            let pattern = decode(&blob).context("Failed to decode recurrence blob")?;
            let occurrences = expand(&pattern, from.map(day_start), to.map(day_start))
                .context("Failed to expand pattern")?;

            if json {
                let rendered = serde_json::to_string_pretty(&occurrences)?;
                write_output(output.as_deref(), &rendered)?;
            } else {
                let mut lines: Vec<String> = Vec::with_capacity(occurrences.len() + 1);
                for occurrence in &occurrences {
                    let source = match occurrence.source {
                        OccurrenceSource::Series => "series".to_string(),
                        OccurrenceSource::Exception(index) => format!("exception {}", index),
                    };
                    let mut line = format!(
                        "{}  {}  {}",
                        occurrence.start.format("%Y-%m-%d %H:%M"),
                        occurrence.end.format("%Y-%m-%d %H:%M"),
                        source
                    );
                    if let Some(subject) = &occurrence.overrides.subject {
                        line.push_str("  ");
                        line.push_str(subject);
                    }
                    lines.push(line);
                }
                lines.push(format!("{} occurrence(s)", occurrences.len()));
                write_output(output.as_deref(), &(lines.join("\n") + "\n"))?;
            }
        }
        Commands::Verify { input, hex } => {
            let blob = read_blob(input.as_deref(), hex)?;
            let pattern = decode(&blob).context("Failed to decode recurrence blob")?;
            let reencoded = encode(&pattern).context("Failed to re-encode pattern")?;
            println!("input:      {} bytes", blob.len());
            println!("re-encoded: {} bytes", reencoded.len());
            if blob == reencoded {
                println!("round-trip: byte-identical");
            } else {
                bail!(
                    "Round-trip mismatch at byte offset {}",
                    first_mismatch(&blob, &reencoded)
                );
            }
        }
    }

    Ok(())
}

/// Midnight UTC of a window date.
fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn first_mismatch(a: &[u8], b: &[u8]) -> usize {
    a.iter()
        .zip(b.iter())
        .position(|(x, y)| x != y)
        .unwrap_or_else(|| a.len().min(b.len()))
}

/// Read blob input, optionally as whitespace-tolerant hex text.
fn read_blob(path: Option<&str>, hex: bool) -> Result<Vec<u8>> {
    let raw = read_bytes(path)?;
    if hex {
        parse_hex(&raw)
    } else {
        Ok(raw)
    }
}

fn read_bytes(path: Option<&str>) -> Result<Vec<u8>> {
    match path {
        Some(path) => fs::read(path).with_context(|| format!("Failed to read file: {}", path)),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn parse_hex(raw: &[u8]) -> Result<Vec<u8>> {
    let text: String = std::str::from_utf8(raw)
        .context("Hex input is not valid UTF-8")?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    // ASCII-only keeps the byte offsets below on char boundaries.
    if !text.is_ascii() {
        bail!("Hex input contains non-ASCII characters");
    }
    if text.len() % 2 != 0 {
        bail!("Hex input has an odd number of digits");
    }
    (0..text.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&text[i..i + 2], 16)
                .with_context(|| format!("Invalid hex byte at offset {}", i))
        })
        .collect()
}

fn format_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{:02x}", byte)).collect()
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}

fn write_binary(path: Option<&str>, bytes: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, bytes).with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            io::stdout()
                .write_all(bytes)
                .context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
