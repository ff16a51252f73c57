use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Accept only `.tsv` and `.csv` paths. Existence is left to the loader,
/// which reports a missing file itself.
pub fn validate_tsv_or_csv_extension(path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") => {}
        _ => anyhow::bail!("File must have a .tsv or .csv extension: {}", path.display()),
    }
    Ok(())
}

/// Field delimiter implied by the file extension, if any.
pub fn delimiter_for_path(path: &Path) -> Option<char> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .as_deref()
    {
        Some("tsv") => Some('\t'),
        Some("csv") => Some(','),
        _ => None,
    }
}

pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))
}
