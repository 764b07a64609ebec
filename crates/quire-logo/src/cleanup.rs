//! Removal of LaTeX compiler intermediates and previous logo outputs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extensions of files LaTeX leaves next to its output.
pub const INTERMEDIATE_EXTENSIONS: &[&str] = &["aux", "log", "dvi", "out"];

/// Extensions of the files a logo build produces.
pub const OUTPUT_EXTENSIONS: &[&str] = &["pdf", "svg"];

/// Remove the intermediates of `basename` in `dir`.
///
/// Missing files are ignored. Returns the paths that were deleted.
pub fn remove_intermediates(dir: &Path, basename: &str) -> Vec<PathBuf> {
    remove_with_extensions(dir, basename, INTERMEDIATE_EXTENSIONS)
}

/// Remove the `.pdf` and `.svg` of `basename` left by an earlier build.
///
/// Missing files are ignored. Returns the paths that were deleted.
pub fn remove_outputs(dir: &Path, basename: &str) -> Vec<PathBuf> {
    remove_with_extensions(dir, basename, OUTPUT_EXTENSIONS)
}

fn remove_with_extensions(dir: &Path, basename: &str, extensions: &[&str]) -> Vec<PathBuf> {
    let mut removed = Vec::new();

    for ext in extensions {
        let path = dir.join(format!("{basename}.{ext}"));
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }

    removed
}

/// Remove stray intermediates anywhere under `dir`.
///
/// Only files sitting next to a `.tex` source with the same stem are touched,
/// so unrelated `.log` or `.out` files survive.
pub fn sweep_intermediates(dir: &Path) -> io::Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !INTERMEDIATE_EXTENSIONS.contains(&ext) {
            continue;
        }

        if !path.with_extension("tex").exists() {
            continue;
        }

        fs::remove_file(path)?;
        removed.push(path.to_path_buf());
    }

    removed.sort();
    Ok(removed)
}
