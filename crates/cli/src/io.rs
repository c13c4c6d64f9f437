//! Font path expansion.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use glob::glob;

/// Expand font arguments. Arguments with wildcards are globbed; anything else
/// is taken as a literal path. Duplicates keep their first position.
pub fn expand_fonts(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for input in inputs {
        let matches = if is_pattern(input) {
            let matches: Vec<PathBuf> = glob(input)
                .with_context(|| format!("Failed to glob pattern: {input}"))?
                .filter_map(Result::ok)
                .collect();
            if matches.is_empty() {
                bail!("No fonts match {input}");
            }
            matches
        } else {
            vec![PathBuf::from(input)]
        };
        for path in matches {
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    if paths.is_empty() {
        bail!("No fonts given");
    }
    Ok(paths)
}

fn is_pattern(input: &str) -> bool {
    input.contains(['*', '?', '['])
}
