use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Fail when `output` names one of `inputs`.
pub fn ensure_not_an_input(output: &Path, inputs: &[&Path]) -> Result<()> {
    let target = comparable(output)?;
    for input in inputs {
        if comparable(input)? == target {
            bail!(
                "refusing to overwrite input {}: choose a different --output",
                input.display()
            );
        }
    }
    Ok(())
}

/// Existing paths resolve through the filesystem; others are made absolute and cleaned
/// lexically.
fn comparable(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return path
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", path.display()));
    }
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("failed to read the working directory")?
            .join(path)
    };
    let mut clean = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other),
        }
    }
    Ok(clean)
}
