//! Renders a serialized dictionary as a file another program can embed.

use std::io::{self, Write};

use serde::Deserialize;

use crate::encoder::DictBuffer;

/// Output flavour for a built dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raw dictionary bytes.
    Binary,
    /// A C header defining a `const unsigned char` array.
    #[default]
    C,
    /// A Rust source file defining a `pub static` byte array.
    Rust,
}

/// How to package a dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptions {
    pub format: OutputFormat,
    /// Array identifier. Upper-cased for Rust output.
    pub symbol: String,
    /// Bytes written per line of the array literal.
    pub bytes_per_line: usize,
    /// Name of the source file, recorded in the generated comment.
    pub source_name: String,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::C,
            symbol: "embedded_skk_dict".to_string(),
            bytes_per_line: 16,
            source_name: "<stdin>".to_string(),
        }
    }
}

/// Writes `dict` to `out` in the requested format.
pub fn write_package<W: Write>(
    dict: &DictBuffer,
    opts: &PackageOptions,
    mut out: W,
) -> io::Result<()> {
    match opts.format {
        OutputFormat::Binary => out.write_all(dict.as_bytes())?,
        OutputFormat::C => {
            write_banner(dict, opts, &mut out)?;
            writeln!(out, "const unsigned char {}[] = {{", opts.symbol)?;
            write_bytes(dict.as_bytes(), opts.bytes_per_line, &mut out)?;
            writeln!(out, "}};")?;
        }
        OutputFormat::Rust => {
            write_banner(dict, opts, &mut out)?;
            writeln!(
                out,
                "pub static {}: [u8; {}] = [",
                opts.symbol.to_uppercase(),
                dict.byte_len()
            )?;
            write_bytes(dict.as_bytes(), opts.bytes_per_line, &mut out)?;
            writeln!(out, "];")?;
        }
    }
    out.flush()
}

fn write_banner<W: Write>(
    dict: &DictBuffer,
    opts: &PackageOptions,
    out: &mut W,
) -> io::Result<()> {
    writeln!(
        out,
        "// Generated from {} by {}",
        opts.source_name,
        env!("CARGO_PKG_NAME")
    )?;
    writeln!(out, "// Total entries: {}", dict.entry_count())?;
    writeln!(out, "// Data size: {} bytes", dict.byte_len())?;
    writeln!(out)
}

/// `0x..,` literals, `per_line` to a line, each line indented four spaces.
fn write_bytes<W: Write>(bytes: &[u8], per_line: usize, out: &mut W) -> io::Result<()> {
    for chunk in bytes.chunks(per_line.max(1)) {
        out.write_all(b"    ")?;
        for byte in chunk {
            write!(out, "0x{byte:02x},")?;
        }
        out.write_all(b"\n")?;
    }
    Ok(())
}
