pub mod analyze;
pub mod personas;

pub use analyze::{analyze, AnalyzeArgs};
pub use personas::personas;

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Read journal text from a file, or from stdin when the path is `-`.
pub fn read_text(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read text from stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))
    }
}
