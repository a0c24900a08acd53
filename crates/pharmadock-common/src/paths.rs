//! Resolution of client-supplied relative paths against a served root.

use std::path::{Component, Path, PathBuf};

use crate::error::{PharmaDockError, Result};

/// Join `relative` onto `root`, refusing anything that could leave `root`
/// (absolute paths, drive prefixes, `..` components).
pub fn resolve_under(root: &Path, relative: &str) -> Result<PathBuf> {
    let candidate = Path::new(relative);
    let mut resolved = root.to_path_buf();

    for component in candidate.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(PharmaDockError::InvalidPath(relative.to_string()));
            }
        }
    }

    if resolved == root {
        return Err(PharmaDockError::InvalidPath(relative.to_string()));
    }
    Ok(resolved)
}

/// Lower-cased extension including the dot, e.g. `".sdf"`.
pub fn extension_of(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}
