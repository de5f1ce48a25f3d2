//! Build configuration for the `yomi-dict` tool.
//!
//! [`Config::load`] layers, lowest priority first: the built-in defaults, an
//! explicit config file (or `yomi-dict.toml` in the working directory when
//! none is given), and `YOMI_DICT_*` environment variables such as
//! `YOMI_DICT_OUTPUT__SYMBOL`. [`Config::defaults`] returns the built-in
//! defaults without touching the filesystem.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::package::{OutputFormat, PackageOptions};

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[output]
format         = "c"
symbol         = "embedded_skk_dict"
bytes_per_line = 16

[source]
strict = false
"#;

/// Config file picked up from the working directory when no path is given.
pub const LOCAL_CONFIG_FILE: &str = "yomi-dict.toml";

const ENV_PREFIX: &str = "YOMI_DICT";

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

/// `[output]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_bytes_per_line")]
    pub bytes_per_line: usize,
}

fn default_symbol() -> String { "embedded_skk_dict".to_string() }
fn default_bytes_per_line() -> usize { 16 }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            symbol: default_symbol(),
            bytes_per_line: default_bytes_per_line(),
        }
    }
}

/// `[source]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    /// Fail the build on any skipped source line.
    #[serde(default)]
    pub strict: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Loads the layered configuration. An explicit `path` must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => {
                if !path.exists() {
                    bail!("config file {} does not exist", path.display());
                }
                config::File::from(path).required(true)
            }
            None => config::File::from(PathBuf::from(LOCAL_CONFIG_FILE)).required(false),
        };

        let cfg: Self = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
            .context("invalid configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.output.bytes_per_line == 0 {
            bail!("output.bytes_per_line must be at least 1");
        }
        if self.output.symbol.is_empty() {
            bail!("output.symbol must not be empty");
        }
        Ok(())
    }

    /// Packaging options for a dictionary built from `source_name`.
    pub fn package_options(&self, source_name: impl Into<String>) -> PackageOptions {
        PackageOptions {
            format: self.output.format,
            symbol: self.output.symbol.clone(),
            bytes_per_line: self.output.bytes_per_line,
            source_name: source_name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_load() {
        let cfg = Config::defaults();
        assert_eq!(cfg.output.format, OutputFormat::C);
        assert_eq!(cfg.output.symbol, "embedded_skk_dict");
        assert_eq!(cfg.output.bytes_per_line, 16);
        assert!(!cfg.source.strict);
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[output]\nformat = \"rust\"\nsymbol = \"dict\"\n\n[source]\nstrict = true").unwrap();

        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.output.format, OutputFormat::Rust);
        assert_eq!(cfg.output.symbol, "dict");
        // Untouched keys keep their defaults.
        assert_eq!(cfg.output.bytes_per_line, 16);
        assert!(cfg.source.strict);
    }

    #[test]
    fn zero_bytes_per_line_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[output]\nbytes_per_line = 0").unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn missing_explicit_file_is_error() {
        let err = Config::load(Some(Path::new("/nonexistent/yomi-dict.toml"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn package_options_carry_output_section() {
        let opts = Config::defaults().package_options("dict.txt");
        assert_eq!(opts.symbol, "embedded_skk_dict");
        assert_eq!(opts.source_name, "dict.txt");
        assert_eq!(opts.format, OutputFormat::C);
    }
}
