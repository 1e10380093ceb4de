use crate::error::{EvalError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Fail fast when the circuit template is missing.
pub fn check_template(template_dir: &Path) -> Result<()> {
    if !template_dir.is_dir() {
        return Err(EvalError::config(format!(
            "Template directory not found: {}",
            template_dir.display()
        )));
    }
    Ok(())
}

/// Directory name for one trial: `<base>_<suffix>_<index>`.
pub fn trial_dir_name(base: &str, suffix: &str, index: u64) -> String {
    format!("{}_{}_{}", base, suffix, index)
}

/// An isolated copy of the circuit template for a single trial.
///
/// Every file operation of the trial goes through `path()`; the process
/// working directory is never changed, so trials with distinct indices do not
/// interfere with each other.
#[derive(Debug)]
pub struct TrialWorkspace {
    path: PathBuf,
    delete_after: bool,
    released: bool,
}

impl TrialWorkspace {
    /// Create `<root>/<base>_<suffix>_<index>` as a fresh copy of `template_dir`.
    ///
    /// A stale directory with the same name is removed first, never merged.
    pub fn acquire(
        template_dir: &Path,
        root: &Path,
        base: &str,
        suffix: &str,
        index: u64,
        delete_after: bool,
    ) -> Result<Self> {
        check_template(template_dir)?;

        let path = root.join(trial_dir_name(base, suffix, index));
        if path.exists() {
            tracing::debug!("Removing stale workspace {}", path.display());
            fs::remove_dir_all(&path).map_err(|e| EvalError::workspace(&path, e))?;
        }

        if let Err(e) = copy_tree(template_dir, &path) {
            // Kept trials stay behind for inspection; disposable ones must not.
            if delete_after && path.exists() {
                let _ = fs::remove_dir_all(&path);
            }
            return Err(e);
        }

        Ok(Self {
            path,
            delete_after,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a path relative to the workspace.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path.join(relative)
    }

    /// Display name used in log messages.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Finish the trial, deleting the directory if configured to.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        if self.delete_after {
            fs::remove_dir_all(&self.path).map_err(|e| EvalError::workspace(&self.path, e))?;
            tracing::debug!("Removed workspace {}", self.path.display());
        }
        Ok(())
    }
}

impl Drop for TrialWorkspace {
    fn drop(&mut self) {
        // Reached only when an evaluation bails out before release().
        if !self.released && self.delete_after && self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

/// Recursively copy `src` into a new directory `dst`, following symlinks.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            EvalError::workspace(path, std::io::Error::other(e.to_string()))
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| EvalError::workspace(entry.path(), std::io::Error::other(e.to_string())))?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| EvalError::workspace(&target, e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| EvalError::workspace(&target, e))?;
        }
    }
    Ok(())
}
