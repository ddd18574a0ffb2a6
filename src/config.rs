use anyhow::{bail, Context, Result};
use std::path::Path;

pub const DEFAULT_LOG_FILTER: &str = "pdfpages=info";

/// Runtime settings shared by CLI commands and the MCP server.
#[derive(Debug, Clone)]
pub struct Config {
    /// `tracing` filter directive, e.g. "pdfpages=debug"
    pub log_filter: String,
    /// Replace output files that already exist
    pub overwrite: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            overwrite: false,
        }
    }
}

impl Config {
    /// Check that writing `output` would not clobber `input` or, unless
    /// overwriting is enabled, any existing file.
    pub fn check_output<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<()> {
        let input = input.as_ref();
        let output = output.as_ref();

        if same_file(input, output)? {
            bail!(
                "Refusing to overwrite the input file {}; choose a different output",
                input.display()
            );
        }
        self.check_new_file(output)
    }

    pub fn check_new_file<P: AsRef<Path>>(&self, output: P) -> Result<()> {
        let output = output.as_ref();
        if output.exists() && !self.overwrite {
            bail!(
                "Output file {} already exists (use --force to replace it)",
                output.display()
            );
        }
        Ok(())
    }
}

fn same_file(a: &Path, b: &Path) -> Result<bool> {
    if !b.exists() {
        return Ok(false);
    }
    let a = a
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", a.display()))?;
    let b = b
        .canonicalize()
        .with_context(|| format!("Failed to resolve path: {}", b.display()))?;
    Ok(a == b)
}
