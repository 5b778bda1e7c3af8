use std::path::Path;

use crate::{Result, ToolkitError};

/// Fails with [`ToolkitError::MissingFile`] when `path` does not exist.
pub fn require(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        tracing::error!(path = %path.display(), "required file missing");
        Err(ToolkitError::MissingFile {
            path: path.to_path_buf(),
        })
    }
}

/// Checks each path in order and stops at the first missing one.
pub fn require_all<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Result<()> {
    paths.into_iter().try_for_each(require)
}
