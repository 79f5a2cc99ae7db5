//! File handling for the CLI
//!
//! Both output documents are rendered before anything is written, and each
//! file is written to a temporary sibling and renamed into place, so a
//! failed run leaves no half-written output behind. If a rename fails, the
//! outputs already moved into place by that call are removed again; a file
//! they replaced is not restored.

use std::fs;
use std::path::{Path, PathBuf};

use trackerdb_compiler::CompileOutput;
use trackerdb_core::to_pretty_json;

pub struct Rendered {
    pub database: String,
    pub orphans: String,
}

pub fn read_text(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path.display(), e))
}

/// Refuse to write `output` over `other`, which is either the input
/// database or another output.
pub fn ensure_distinct(other: &Path, output: &Path) -> Result<(), String> {
    let same = match (fs::canonicalize(other), fs::canonicalize(output)) {
        (Ok(a), Ok(b)) => a == b,
        _ => other == output,
    };
    if same {
        return Err(format!(
            "Output '{}' would overwrite '{}'",
            output.display(),
            other.display()
        ));
    }
    Ok(())
}

pub fn render(output: &CompileOutput) -> Result<Rendered, String> {
    let database =
        to_pretty_json(&output.database).map_err(|e| format!("Failed to serialize database: {}", e))?;
    let orphans =
        to_pretty_json(&output.orphans).map_err(|e| format!("Failed to serialize unmatched rules: {}", e))?;
    Ok(Rendered { database, orphans })
}

/// Write every `(path, contents)` pair, or none of them.
pub fn write_all(files: &[(&Path, &str)]) -> Result<(), String> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());

    for &(path, contents) in files {
        let tmp = temp_path(path);
        if let Err(e) = write_file(&tmp, contents) {
            discard(&staged);
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        staged.push((tmp, path));
    }

    for (done, (tmp, path)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(tmp, path) {
            discard(&staged[done..]);
            for (_, written) in &staged[..done] {
                let _ = fs::remove_file(written);
            }
            return Err(format!("Failed to write '{}': {}", path.display(), e));
        }
    }

    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
    }
    fs::write(path, contents).map_err(|e| format!("Failed to write '{}': {}", path.display(), e))
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
