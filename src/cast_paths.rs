//! Purpose: Resolve which cast file the CLI operates on.
//! Exports: `resolve_cast_target`, `CAST_EXTENSION`.
//! Role: Keeps working-directory discovery out of the core store.
//! Invariants: An explicit `--file` is used as given and never searched for.
//! Invariants: Discovery succeeds only when exactly one `*.cast` file exists.

use std::fs;
use std::path::{Path, PathBuf};

use clicast::core::{Error, ErrorKind};

pub(crate) const CAST_EXTENSION: &str = "cast";

pub(crate) fn resolve_cast_target(file: Option<PathBuf>, dir: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(file) = file {
        return Ok(file);
    }

    let search_dir = dir.unwrap_or_else(|| Path::new("."));
    let mut candidates = list_cast_files(search_dir)?;
    match candidates.len() {
        0 => Err(Error::new(ErrorKind::NoTarget)
            .with_message("there is no cast file")
            .with_path(search_dir)
            .with_hint("To create a new one, specify the name with --file.")),
        1 => {
            let name = candidates.remove(0);
            Ok(match dir {
                Some(dir) => dir.join(name),
                None => name,
            })
        }
        count => {
            let names = candidates
                .iter()
                .map(|name| name.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            Err(Error::new(ErrorKind::AmbiguousTarget)
                .with_message(format!("there are {count} cast files: {names}"))
                .with_path(search_dir)
                .with_hint("Specify which one to modify with --file."))
        }
    }
}

// Returns bare file names, sorted for stable diagnostics. Dotfiles are skipped.
fn list_cast_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(dir).map_err(|err| Error::io(dir, err))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| Error::io(dir, err))?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let is_cast = path.extension().and_then(|ext| ext.to_str()) == Some(CAST_EXTENSION);
        if is_cast && !hidden && path.is_file() {
            names.push(PathBuf::from(entry.file_name()));
        }
    }
    names.sort();
    Ok(names)
}
